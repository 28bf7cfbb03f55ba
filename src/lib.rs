//! Grid Snake rules engine.
//!
//! [`session::GameSession`] owns a snake, food, power-ups and score, and
//! advances them one tick at a time from buffered directional input. The
//! rules (grid size, scoring, speed progression, power-up effects) come from
//! an [`config::EngineConfig`]. The `renderer`, `ui`, `keys` and
//! `terminal_runtime` modules are a ratatui front end over session snapshots.

pub mod collision;
pub mod config;
pub mod error;
pub mod food;
pub mod grid;
pub mod high_score;
pub mod input;
pub mod keys;
pub mod powerup;
pub mod renderer;
pub mod score;
pub mod session;
pub mod snake;
pub mod terminal_runtime;
pub mod ui;
