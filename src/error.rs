use std::io;

use thiserror::Error;

use crate::food::FoodKind;
use crate::powerup::PowerUpKind;

/// Rejected engine configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: u16, height: u16 },
    #[error("a snake of length {length} does not fit on a {width}x{height} grid")]
    SnakeDoesNotFit { length: usize, width: u16, height: u16 },
    #[error("base speed must be positive and finite, got {0}")]
    InvalidBaseSpeed(f32),
    #[error("speed cap {cap} is below the base speed {base}")]
    SpeedCapBelowBase { cap: f32, base: f32 },
    #[error("speed increment must be non-negative and finite, got {0}")]
    InvalidSpeedIncrement(f32),
    #[error("food scoring table is empty")]
    EmptyScoringTable,
    #[error("food kind {0:?} can spawn but has no points entry")]
    MissingFoodPoints(FoodKind),
    #[error("food kind weights must not all be zero")]
    ZeroFoodWeights,
    #[error("power-up probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("power-ups are enabled but max_active is 0")]
    ZeroPowerUpCap,
    #[error("power-ups are enabled but the effect table is empty")]
    EmptyEffectTable,
    #[error("power-up weights must not all be zero")]
    ZeroPowerUpWeights,
    #[error("power-up kind `{0}` is listed more than once")]
    DuplicatePowerUp(PowerUpKind),
    #[error("timed power-up `{0}` has a zero duration")]
    ZeroEffectDuration(PowerUpKind),
    #[error("collectible power-up lifetime must be positive")]
    ZeroCollectibleLifetime,
}

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
