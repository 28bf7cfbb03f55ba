use std::collections::HashSet;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::collision::{CollisionResolver, DeathReason};
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::food::{Food, FoodKindPolicy, FoodSpawner};
use crate::grid::{Cell, GridWorld};
use crate::input::{Command, Direction, GameInput};
use crate::powerup::{
    ActiveEffect, EffectTable, EffectTarget, Modifiers, PowerUp, PowerUpEffect, PowerUpKind,
    PowerUpManager, SpawnCadence, SpawnSettings,
};
use crate::score::ScoreTracker;
use crate::snake::Snake;

/// Current high-level gameplay state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    Paused,
    GameOver,
}

/// Immutable view of a session handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub snake_body: Vec<Cell>,
    pub direction: Direction,
    /// `None` only while the board has no free cell left.
    pub food: Option<Food>,
    pub power_ups: Vec<PowerUp>,
    pub active_effects: Vec<ActiveEffect>,
    pub invincible: bool,
    pub score: u32,
    pub high_score: u32,
    pub multiplier: u32,
    pub speed: f32,
    pub level: u32,
    pub status: GameStatus,
    pub death_reason: Option<DeathReason>,
    pub tick: u64,
    #[serde(with = "crate::config::seconds")]
    pub elapsed: Duration,
    pub grid: GridWorld,
}

/// Complete mutable game state for one session.
#[derive(Debug)]
pub struct GameSession {
    pub snake: Snake,
    pub food: Option<Food>,
    config: EngineConfig,
    resolver: CollisionResolver,
    food_spawner: FoodSpawner,
    power_ups: PowerUpManager,
    score: ScoreTracker,
    modifiers: Modifiers,
    status: GameStatus,
    death_reason: Option<DeathReason>,
    level: u32,
    tick_count: u64,
    elapsed: Duration,
    rng: StdRng,
}

impl GameSession {
    /// Validates `config` and starts a session. Uses `config.seed` when set,
    /// entropy otherwise.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Creates a deterministic session for tests and reproducible simulations.
    pub fn new_with_seed(config: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let snake = Snake::new(
            config.start_cell(),
            config.snake.direction,
            config.snake.initial_length,
            config.snake.base_speed,
        );
        let power_ups = if config.power_ups.enabled {
            PowerUpManager::new(
                EffectTable::from_rules(&config.power_ups.effects),
                SpawnSettings {
                    probability: config.power_ups.probability,
                    cadence: config.power_ups.cadence,
                    max_active: config.power_ups.max_active,
                    collectible_lifetime: config.power_ups.collectible_lifetime,
                },
            )
        } else {
            PowerUpManager::disabled()
        };

        let mut session = Self {
            snake,
            food: None,
            resolver: CollisionResolver::new(config.grid, config.boundary),
            food_spawner: FoodSpawner::new(config.food.kind_selection),
            power_ups,
            score: ScoreTracker::new(config.food.points.clone()),
            modifiers: Modifiers::default(),
            status: GameStatus::Playing,
            death_reason: None,
            level: 1,
            tick_count: 0,
            elapsed: Duration::ZERO,
            config,
            rng,
        };
        session.ensure_food();
        info!(
            width = session.config.grid.width,
            height = session.config.grid.height,
            "session started"
        );
        Ok(session)
    }

    /// Seeds the high score, e.g. from a persisted value.
    #[must_use]
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.score = self.score.with_high_score(high_score);
        self
    }

    /// Replaces the food kind policy. Takes effect from the next spawn.
    pub fn set_food_policy(&mut self, policy: impl FoodKindPolicy + 'static) {
        self.food_spawner = FoodSpawner::with_policy(policy);
    }

    /// Registers a custom effect under `kind`, replacing any configured one.
    pub fn register_effect(
        &mut self,
        kind: PowerUpKind,
        effect: impl PowerUpEffect + 'static,
        duration: Duration,
        weight: u32,
    ) {
        self.power_ups
            .table_mut()
            .register(kind, effect, duration, weight);
    }

    /// Advances simulation by one gameplay tick of length `dt`.
    #[instrument(level = "trace", skip_all)]
    pub fn tick(&mut self, dt: Duration) -> SessionSnapshot {
        if self.status != GameStatus::Playing {
            return self.snapshot();
        }

        self.tick_count += 1;
        self.elapsed += dt;
        let now = self.elapsed;
        self.expire_power_ups(now);

        let direction = self.snake.turn();
        let proposed = self.snake.propose_head(direction);
        let collision = self.resolver.resolve(
            &self.snake,
            proposed,
            self.modifiers.is_invincible(),
            self.food.as_ref(),
            self.power_ups.positions(),
        );

        if let Some(reason) = collision.fatal {
            self.game_over(reason);
            return self.snapshot();
        }

        if !collision.is_stalled(&self.snake) {
            if collision.ate_food {
                self.snake.queue_growth(self.config.food.growth_per_food);
            }
            let grow = self.snake.pending_growth() > 0;
            self.snake.commit_move(collision.head, grow);
        }

        if collision.ate_food {
            self.eat_food(now);
        }
        if collision.power_up {
            self.collect_power_up(collision.head, now);
        }

        self.spawn_power_up(SpawnCadence::PerTick, now);
        self.ensure_food();
        self.snapshot()
    }

    /// Buffers a direction for the next processed tick. Reversals are ignored,
    /// as is any direction after game over.
    pub fn set_direction(&mut self, direction: Direction) {
        if self.status != GameStatus::GameOver {
            self.snake.buffer_direction(direction);
        }
    }

    /// Applies a session command. Commands that do not fit the current state
    /// are ignored.
    pub fn command(&mut self, command: Command) -> GameStatus {
        self.status = match (command, self.status) {
            (Command::Pause | Command::TogglePause, GameStatus::Playing) => GameStatus::Paused,
            (Command::Resume | Command::TogglePause, GameStatus::Paused) => GameStatus::Playing,
            (Command::Restart, GameStatus::GameOver) => {
                self.restart();
                GameStatus::Playing
            }
            (_, status) => status,
        };
        self.status
    }

    /// Applies one external input event.
    pub fn apply_input(&mut self, input: GameInput) {
        match input {
            GameInput::Direction(direction) => self.set_direction(direction),
            GameInput::Command(command) => {
                let _ = self.command(command);
            }
            GameInput::Quit => {}
        }
    }

    /// Applies the effect of `kind` as if a power-up had just been collected.
    pub fn activate_power_up(&mut self, kind: &PowerUpKind) {
        let mut target = EffectTarget {
            snake: &mut self.snake,
            score: &mut self.score,
            modifiers: &mut self.modifiers,
        };
        self.power_ups.apply_effect(kind, self.elapsed, &mut target);
    }

    /// Builds a renderable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            snake_body: self.snake.segments().copied().collect(),
            direction: self.snake.direction(),
            food: self.food,
            power_ups: self.power_ups.collectibles().to_vec(),
            active_effects: self.power_ups.active_effects().to_vec(),
            invincible: self.modifiers.is_invincible(),
            score: self.score.score(),
            high_score: self.score.high_score(),
            multiplier: self.score.multiplier(),
            speed: self.snake.speed(),
            level: self.level,
            status: self.status,
            death_reason: self.death_reason,
            tick: self.tick_count,
            elapsed: self.elapsed,
            grid: self.config.grid,
        }
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> &ScoreTracker {
        &self.score
    }

    #[must_use]
    pub fn power_ups(&self) -> &PowerUpManager {
        &self.power_ups
    }

    #[must_use]
    pub fn is_invincible(&self) -> bool {
        self.modifiers.is_invincible()
    }

    fn eat_food(&mut self, now: Duration) {
        let Some(food) = self.food.take() else {
            return;
        };

        self.score.on_food_eaten(food.kind);

        let progression = self.config.speed_progression;
        if progression.every_n_foods > 0
            && self.score.foods_eaten() % progression.every_n_foods == 0
        {
            self.snake
                .increase_speed(progression.increment, self.config.snake.speed_cap);
            self.level += 1;
        }

        self.ensure_food();
        self.spawn_power_up(SpawnCadence::PerFoodEaten, now);
    }

    fn collect_power_up(&mut self, cell: Cell, now: Duration) {
        let Some(power_up) = self.power_ups.collect_at(cell) else {
            return;
        };

        let mut target = EffectTarget {
            snake: &mut self.snake,
            score: &mut self.score,
            modifiers: &mut self.modifiers,
        };
        self.power_ups.apply_effect(&power_up.kind, now, &mut target);
    }

    fn expire_power_ups(&mut self, now: Duration) {
        let mut target = EffectTarget {
            snake: &mut self.snake,
            score: &mut self.score,
            modifiers: &mut self.modifiers,
        };
        let _ = self.power_ups.expire_if_due(now, &mut target);
    }

    fn spawn_power_up(&mut self, trigger: SpawnCadence, now: Duration) {
        let occupied = self.occupied_by_snake_and_food();
        let _ = self.power_ups.maybe_spawn(
            trigger,
            now,
            self.config.grid,
            &mut self.rng,
            &occupied,
        );
    }

    /// Spawns food when none is on the board or the current one overlaps the
    /// snake or a power-up.
    fn ensure_food(&mut self) {
        if let Some(food) = self.food {
            let overlaps = self.snake.occupies(food.position)
                || self.power_ups.positions().any(|cell| cell == food.position);
            if !overlaps {
                return;
            }
            warn!(x = food.position.x, y = food.position.y, "food overlapped, respawning");
        }

        let mut occupied: HashSet<Cell> = self.snake.segments().copied().collect();
        occupied.extend(self.power_ups.positions());
        self.food = self
            .food_spawner
            .spawn(self.config.grid, &mut self.rng, &occupied);
    }

    fn occupied_by_snake_and_food(&self) -> HashSet<Cell> {
        let mut occupied: HashSet<Cell> = self.snake.segments().copied().collect();
        occupied.extend(self.food.map(|food| food.position));
        occupied
    }

    fn game_over(&mut self, reason: DeathReason) {
        self.status = GameStatus::GameOver;
        self.death_reason = Some(reason);
        self.score.record_game_over();
        info!(
            ?reason,
            score = self.score.score(),
            high_score = self.score.high_score(),
            "game over"
        );
    }

    fn restart(&mut self) {
        self.snake.reset();
        self.power_ups.clear();
        self.modifiers = Modifiers::default();
        self.score.reset();
        self.food = None;
        self.death_reason = None;
        self.level = 1;
        self.tick_count = 0;
        self.elapsed = Duration::ZERO;
        self.ensure_food();
        info!(high_score = self.score.high_score(), "session restarted");
    }
}
