use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigLoadError};
use crate::food::{FoodKind, KindSelection};
use crate::grid::{BoundaryPolicy, Cell, GridWorld};
use crate::input::Direction;
use crate::powerup::{EffectSpec, PowerUpKind, PowerUpRule, SpawnCadence};

/// Default board width in cells.
pub const DEFAULT_GRID_WIDTH: u16 = 20;

/// Default board height in cells.
pub const DEFAULT_GRID_HEIGHT: u16 = 20;

/// Shortest tick interval the terminal shell will schedule.
pub const MIN_TICK_INTERVAL_MS: u64 = 16;

/// Starting snake layout and speed limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeSettings {
    pub initial_length: usize,
    /// Head cell at session start; derived from the grid when absent.
    pub start: Option<Cell>,
    pub direction: Direction,
    /// Ticks per second at session start.
    pub base_speed: f32,
    pub speed_cap: f32,
}

impl Default for SnakeSettings {
    fn default() -> Self {
        Self {
            initial_length: 3,
            start: None,
            direction: Direction::Right,
            base_speed: 10.0,
            speed_cap: 20.0,
        }
    }
}

/// Base speed raised by `increment` after every `every_n_foods` foods.
/// `every_n_foods == 0` disables progression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProgression {
    pub increment: f32,
    pub every_n_foods: u32,
}

impl Default for SpeedProgression {
    fn default() -> Self {
        Self {
            increment: 0.5,
            every_n_foods: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodSettings {
    pub kind_selection: KindSelection,
    /// Base points per food kind, before the score multiplier.
    pub points: HashMap<FoodKind, u32>,
    pub growth_per_food: u32,
}

impl Default for FoodSettings {
    fn default() -> Self {
        Self {
            kind_selection: KindSelection::default(),
            points: HashMap::from([(FoodKind::Normal, 10), (FoodKind::Bonus, 20)]),
            growth_per_food: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpSettings {
    pub enabled: bool,
    /// Chance of a spawn per draw.
    pub probability: f64,
    pub cadence: SpawnCadence,
    /// Maximum collectibles on the board at once.
    pub max_active: usize,
    /// How long an uncollected power-up stays on the board.
    #[serde(with = "seconds")]
    pub collectible_lifetime: Duration,
    pub effects: Vec<PowerUpRule>,
}

impl Default for PowerUpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.01,
            cadence: SpawnCadence::PerTick,
            max_active: 1,
            collectible_lifetime: Duration::from_secs(10),
            effects: vec![
                timed(PowerUpKind::SPEED, EffectSpec::SpeedBoost { amount: 5.0 }),
                timed(PowerUpKind::SCORE, EffectSpec::FlatScore { points: 5 }),
                timed(PowerUpKind::INVINCIBILITY, EffectSpec::Invincibility),
            ],
        }
    }
}

fn timed(kind: &str, effect: EffectSpec) -> PowerUpRule {
    PowerUpRule {
        kind: PowerUpKind::new(kind),
        effect,
        duration: Duration::from_secs(5),
        weight: 1,
    }
}

/// Complete rule set for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridWorld,
    pub boundary: BoundaryPolicy,
    pub snake: SnakeSettings,
    pub speed_progression: SpeedProgression,
    pub food: FoodSettings,
    pub power_ups: PowerUpSettings,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridWorld::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT),
            boundary: BoundaryPolicy::Wrap,
            snake: SnakeSettings::default(),
            speed_progression: SpeedProgression::default(),
            food: FoodSettings::default(),
            power_ups: PowerUpSettings::default(),
            seed: None,
        }
    }
}

/// Built-in rule sets.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum Ruleset {
    /// Speed, score and invincibility power-ups spawning at 1% per tick.
    #[default]
    Classic,
    /// No power-ups; speed rises by 2 every 5 foods.
    Plain,
    /// Normal and bonus food with an even chance.
    BonusFood,
    /// 5-point food, 10% power-up chance per food eaten, double score.
    DoublePoints,
    /// A single 50-point power-up spawning at 5% per tick.
    Jackpot,
}

impl Ruleset {
    #[must_use]
    pub fn config(self) -> EngineConfig {
        let base = EngineConfig::default();
        match self {
            Self::Classic => base,
            Self::Plain => EngineConfig {
                snake: SnakeSettings {
                    speed_cap: 60.0,
                    ..SnakeSettings::default()
                },
                speed_progression: SpeedProgression {
                    increment: 2.0,
                    every_n_foods: 5,
                },
                power_ups: PowerUpSettings {
                    enabled: false,
                    ..PowerUpSettings::default()
                },
                ..base
            },
            Self::BonusFood => EngineConfig {
                snake: SnakeSettings {
                    speed_cap: 40.0,
                    ..SnakeSettings::default()
                },
                speed_progression: SpeedProgression {
                    increment: 2.0,
                    every_n_foods: 5,
                },
                food: FoodSettings {
                    kind_selection: KindSelection::Weighted {
                        normal: 1,
                        bonus: 1,
                    },
                    ..FoodSettings::default()
                },
                power_ups: PowerUpSettings {
                    enabled: false,
                    ..PowerUpSettings::default()
                },
                ..base
            },
            Self::DoublePoints => EngineConfig {
                food: FoodSettings {
                    points: HashMap::from([(FoodKind::Normal, 5)]),
                    ..FoodSettings::default()
                },
                speed_progression: SpeedProgression {
                    increment: 0.0,
                    every_n_foods: 0,
                },
                power_ups: PowerUpSettings {
                    probability: 0.1,
                    cadence: SpawnCadence::PerFoodEaten,
                    collectible_lifetime: Duration::from_secs(30),
                    effects: vec![
                        timed(PowerUpKind::SPEED, EffectSpec::SpeedBoost { amount: 2.0 }),
                        timed(
                            PowerUpKind::DOUBLE_SCORE,
                            EffectSpec::ScoreMultiplier { factor: 2 },
                        ),
                        timed(PowerUpKind::INVINCIBILITY, EffectSpec::Invincibility),
                    ],
                    ..PowerUpSettings::default()
                },
                ..base
            },
            Self::Jackpot => EngineConfig {
                snake: SnakeSettings {
                    speed_cap: 30.0,
                    ..SnakeSettings::default()
                },
                speed_progression: SpeedProgression {
                    increment: 0.5,
                    every_n_foods: 1,
                },
                power_ups: PowerUpSettings {
                    probability: 0.05,
                    effects: vec![timed(
                        PowerUpKind::SCORE,
                        EffectSpec::FlatScore { points: 50 },
                    )],
                    ..PowerUpSettings::default()
                },
                ..base
            },
        }
    }
}

impl EngineConfig {
    /// Loads and validates a JSON configuration file. Missing fields take
    /// their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Head cell the snake starts on.
    #[must_use]
    pub fn start_cell(&self) -> Cell {
        self.snake.start.unwrap_or_else(|| {
            let length = i32::try_from(self.snake.initial_length).unwrap_or(i32::MAX);
            let width = i32::from(self.grid.width);
            Cell::new(
                (width / 4).max(length - 1).min(width - 1),
                i32::from(self.grid.height) / 2,
            )
        })
    }

    /// Checks every setting, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let GridWorld { width, height } = self.grid;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        self.validate_snake()?;
        self.validate_food()?;
        if self.power_ups.enabled {
            self.validate_power_ups()?;
        }
        Ok(())
    }

    fn validate_snake(&self) -> Result<(), ConfigError> {
        let snake = &self.snake;
        let doesnt_fit = ConfigError::SnakeDoesNotFit {
            length: snake.initial_length,
            width: self.grid.width,
            height: self.grid.height,
        };
        if snake.initial_length == 0 {
            return Err(doesnt_fit);
        }

        let head = self.start_cell();
        let (dx, dy) = snake.direction.opposite().delta();
        let Ok(last) = i32::try_from(snake.initial_length - 1) else {
            return Err(doesnt_fit);
        };
        let tail = Cell::new(head.x + dx * last, head.y + dy * last);
        if !self.grid.in_bounds(head) || !self.grid.in_bounds(tail) {
            return Err(doesnt_fit);
        }

        if !snake.base_speed.is_finite() || snake.base_speed <= 0.0 {
            return Err(ConfigError::InvalidBaseSpeed(snake.base_speed));
        }
        if snake.speed_cap.is_nan() || snake.speed_cap < snake.base_speed {
            return Err(ConfigError::SpeedCapBelowBase {
                cap: snake.speed_cap,
                base: snake.base_speed,
            });
        }
        let increment = self.speed_progression.increment;
        if !increment.is_finite() || increment < 0.0 {
            return Err(ConfigError::InvalidSpeedIncrement(increment));
        }
        Ok(())
    }

    fn validate_food(&self) -> Result<(), ConfigError> {
        if self.food.points.is_empty() {
            return Err(ConfigError::EmptyScoringTable);
        }

        let kinds = self.food.kind_selection.possible_kinds();
        if kinds.is_empty() {
            return Err(ConfigError::ZeroFoodWeights);
        }
        if let Some(kind) = kinds
            .into_iter()
            .find(|kind| !self.food.points.contains_key(kind))
        {
            return Err(ConfigError::MissingFoodPoints(kind));
        }
        Ok(())
    }

    fn validate_power_ups(&self) -> Result<(), ConfigError> {
        let power_ups = &self.power_ups;
        if !(0.0..=1.0).contains(&power_ups.probability) {
            return Err(ConfigError::InvalidProbability(power_ups.probability));
        }
        if power_ups.max_active == 0 {
            return Err(ConfigError::ZeroPowerUpCap);
        }
        if power_ups.effects.is_empty() {
            return Err(ConfigError::EmptyEffectTable);
        }
        if power_ups.effects.iter().all(|rule| rule.weight == 0) {
            return Err(ConfigError::ZeroPowerUpWeights);
        }
        if power_ups.collectible_lifetime.is_zero() {
            return Err(ConfigError::ZeroCollectibleLifetime);
        }

        let mut seen = HashSet::new();
        for rule in &power_ups.effects {
            if !seen.insert(&rule.kind) {
                return Err(ConfigError::DuplicatePowerUp(rule.kind.clone()));
            }
            let instant = matches!(rule.effect, EffectSpec::FlatScore { .. });
            if !instant && rule.duration.is_zero() {
                return Err(ConfigError::ZeroEffectDuration(rule.kind.clone()));
            }
        }
        Ok(())
    }
}

/// Serde adapter encoding a [`Duration`] as fractional seconds.
pub mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
