use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Cell, GridWorld};
use crate::score::ScoreTracker;
use crate::snake::Snake;

/// Name of a power-up kind. The set is open: any name with an entry in the
/// [`EffectTable`] is a valid kind.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerUpKind(String);

impl PowerUpKind {
    pub const SPEED: &'static str = "speed";
    pub const DOUBLE_SCORE: &'static str = "double_score";
    pub const INVINCIBILITY: &'static str = "invincibility";
    pub const SCORE: &'static str = "score";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rule changes held by active effects: invincibility grants and score
/// multiplier factors.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    invincibility: u32,
    multipliers: Vec<u32>,
}

impl Modifiers {
    #[must_use]
    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0
    }

    /// Largest active multiplier factor, 1 when none is active.
    #[must_use]
    pub fn multiplier(&self) -> u32 {
        self.multipliers.iter().copied().max().unwrap_or(1)
    }

    /// Adds an active factor and returns the resulting multiplier.
    pub fn grant_multiplier(&mut self, factor: u32) -> u32 {
        self.multipliers.push(factor);
        self.multiplier()
    }

    /// Drops one active `factor` and returns the resulting multiplier.
    pub fn revoke_multiplier(&mut self, factor: u32) -> u32 {
        if let Some(index) = self.multipliers.iter().position(|&held| held == factor) {
            self.multipliers.swap_remove(index);
        }
        self.multiplier()
    }

    pub fn grant_invincibility(&mut self) {
        self.invincibility = self.invincibility.saturating_add(1);
    }

    pub fn revoke_invincibility(&mut self) {
        self.invincibility = self.invincibility.saturating_sub(1);
    }
}

/// Session state a power-up effect may mutate.
pub struct EffectTarget<'a> {
    pub snake: &'a mut Snake,
    pub score: &'a mut ScoreTracker,
    pub modifiers: &'a mut Modifiers,
}

/// Apply/revert pair registered for a power-up kind.
pub trait PowerUpEffect: fmt::Debug {
    fn apply(&self, target: &mut EffectTarget<'_>);

    fn revert(&self, target: &mut EffectTarget<'_>);

    /// Instant effects fire once on collection and are never tracked as active.
    fn is_instant(&self) -> bool {
        false
    }
}

/// Built-in effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EffectSpec {
    /// Temporary additive speed boost, in ticks per second.
    SpeedBoost { amount: f32 },
    /// Multiplies food points while active.
    ScoreMultiplier { factor: u32 },
    /// Suppresses wall and self collisions while active.
    Invincibility,
    /// One-off flat score bonus.
    FlatScore { points: u32 },
}

impl PowerUpEffect for EffectSpec {
    fn apply(&self, target: &mut EffectTarget<'_>) {
        match *self {
            Self::SpeedBoost { amount } => target.snake.add_speed_boost(amount),
            Self::ScoreMultiplier { factor } => {
                let multiplier = target.modifiers.grant_multiplier(factor);
                target.score.set_multiplier(multiplier);
            }
            Self::Invincibility => target.modifiers.grant_invincibility(),
            Self::FlatScore { points } => target.score.on_powerup_collected(points),
        }
    }

    fn revert(&self, target: &mut EffectTarget<'_>) {
        match *self {
            Self::SpeedBoost { amount } => target.snake.remove_speed_boost(amount),
            Self::ScoreMultiplier { factor } => {
                let multiplier = target.modifiers.revoke_multiplier(factor);
                target.score.set_multiplier(multiplier);
            }
            Self::Invincibility => target.modifiers.revoke_invincibility(),
            Self::FlatScore { .. } => {}
        }
    }

    fn is_instant(&self) -> bool {
        matches!(self, Self::FlatScore { .. })
    }
}

/// Configured power-up kind: its effect, how long the effect lasts, and its
/// relative spawn weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpRule {
    pub kind: PowerUpKind,
    pub effect: EffectSpec,
    #[serde(with = "crate::config::seconds")]
    pub duration: Duration,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// When spawn draws happen.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCadence {
    #[default]
    PerTick,
    PerFoodEaten,
}

#[derive(Debug)]
struct EffectEntry {
    kind: PowerUpKind,
    effect: Box<dyn PowerUpEffect>,
    duration: Duration,
    weight: u32,
}

/// Mapping from power-up kind to its effect.
#[derive(Debug, Default)]
pub struct EffectTable {
    entries: Vec<EffectEntry>,
}

impl EffectTable {
    #[must_use]
    pub fn from_rules(rules: &[PowerUpRule]) -> Self {
        let mut table = Self::default();
        for rule in rules {
            table.register(rule.kind.clone(), rule.effect, rule.duration, rule.weight);
        }
        table
    }

    /// Registers `effect` under `kind`, replacing any previous entry.
    pub fn register(
        &mut self,
        kind: PowerUpKind,
        effect: impl PowerUpEffect + 'static,
        duration: Duration,
        weight: u32,
    ) {
        self.entries.retain(|entry| entry.kind != kind);
        self.entries.push(EffectEntry {
            kind,
            effect: Box::new(effect),
            duration,
            weight,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, kind: &PowerUpKind) -> Option<&EffectEntry> {
        self.entries.iter().find(|entry| &entry.kind == kind)
    }

    fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&EffectEntry> {
        let total: u64 = self.entries.iter().map(|entry| u64::from(entry.weight)).sum();
        if total == 0 {
            return None;
        }

        let mut roll = rng.gen_range(0..total);
        for entry in &self.entries {
            let weight = u64::from(entry.weight);
            if roll < weight {
                return Some(entry);
            }
            roll -= weight;
        }
        None
    }
}

/// Collectible power-up lying on the board.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub position: Cell,
    /// Session time at which the collectible disappears.
    #[serde(with = "crate::config::seconds")]
    pub expires_at: Duration,
}

/// Effect applied by a collected power-up, reverted at its deadline.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    #[serde(with = "crate::config::seconds")]
    pub expires_at: Duration,
}

/// Spawn tuning for the [`PowerUpManager`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSettings {
    pub probability: f64,
    pub cadence: SpawnCadence,
    pub max_active: usize,
    pub collectible_lifetime: Duration,
}

/// Owns collectible power-ups and the effects they have applied.
#[derive(Debug)]
pub struct PowerUpManager {
    table: EffectTable,
    settings: SpawnSettings,
    collectibles: Vec<PowerUp>,
    active: Vec<ActiveEffect>,
}

impl PowerUpManager {
    #[must_use]
    pub fn new(table: EffectTable, settings: SpawnSettings) -> Self {
        Self {
            table,
            settings,
            collectibles: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Manager that never spawns anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(
            EffectTable::default(),
            SpawnSettings {
                probability: 0.0,
                cadence: SpawnCadence::PerTick,
                max_active: 0,
                collectible_lifetime: Duration::ZERO,
            },
        )
    }

    pub fn table_mut(&mut self) -> &mut EffectTable {
        &mut self.table
    }

    /// Runs one spawn draw if `trigger` matches the configured cadence.
    ///
    /// Skips the draw while the collectible cap is reached. The new power-up
    /// avoids `occupied` and every other collectible.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &mut self,
        trigger: SpawnCadence,
        now: Duration,
        grid: GridWorld,
        rng: &mut R,
        occupied: &HashSet<Cell>,
    ) -> Option<PowerUp> {
        if trigger != self.settings.cadence
            || self.collectibles.len() >= self.settings.max_active
            || self.table.is_empty()
            || !rng.gen_bool(self.settings.probability)
        {
            return None;
        }

        let kind = self.table.choose(rng)?.kind.clone();
        let mut excluding = occupied.clone();
        excluding.extend(self.positions());
        let Some(position) = grid.random_cell(rng, &excluding) else {
            debug!(%kind, "no free cell for power-up, skipping spawn");
            return None;
        };

        let power_up = PowerUp {
            kind,
            position,
            expires_at: now + self.settings.collectible_lifetime,
        };
        debug!(kind = %power_up.kind, x = position.x, y = position.y, "power-up spawned");
        self.collectibles.push(power_up.clone());
        Some(power_up)
    }

    /// Removes and returns the collectible at `cell`, if any.
    pub fn collect_at(&mut self, cell: Cell) -> Option<PowerUp> {
        let index = self
            .collectibles
            .iter()
            .position(|power_up| power_up.position == cell)?;
        Some(self.collectibles.remove(index))
    }

    /// Applies the effect registered for `kind`.
    ///
    /// Collecting a kind whose effect is still active only pushes its
    /// deadline back; the effect is not applied a second time.
    pub fn apply_effect(&mut self, kind: &PowerUpKind, now: Duration, target: &mut EffectTarget<'_>) {
        let Some(entry) = self.table.get(kind) else {
            debug!(%kind, "collected power-up has no registered effect");
            return;
        };

        if entry.effect.is_instant() {
            entry.effect.apply(target);
            debug!(%kind, "instant power-up applied");
            return;
        }

        let expires_at = now + entry.duration;
        if let Some(active) = self.active.iter_mut().find(|active| &active.kind == kind) {
            active.expires_at = expires_at;
            debug!(%kind, "power-up effect refreshed");
            return;
        }

        entry.effect.apply(target);
        self.active.push(ActiveEffect {
            kind: kind.clone(),
            expires_at,
        });
        debug!(%kind, "power-up effect applied");
    }

    /// Removes timed-out collectibles and reverts every effect whose deadline
    /// has passed. Returns the kinds whose effects were reverted.
    ///
    /// Reverted effects are dropped from the active list, so repeated calls
    /// never revert twice.
    pub fn expire_if_due(&mut self, now: Duration, target: &mut EffectTarget<'_>) -> Vec<PowerUpKind> {
        self.collectibles.retain(|power_up| {
            let keep = now < power_up.expires_at;
            if !keep {
                debug!(kind = %power_up.kind, "uncollected power-up timed out");
            }
            keep
        });

        let (due, pending): (Vec<ActiveEffect>, Vec<ActiveEffect>) = self
            .active
            .drain(..)
            .partition(|active| now >= active.expires_at);
        self.active = pending;

        let mut reverted = Vec::with_capacity(due.len());
        for active in due {
            if let Some(entry) = self.table.get(&active.kind) {
                entry.effect.revert(target);
            }
            debug!(kind = %active.kind, "power-up effect expired");
            reverted.push(active.kind);
        }
        reverted
    }

    /// Drops every collectible and active effect without reverting.
    pub fn clear(&mut self) {
        self.collectibles.clear();
        self.active.clear();
    }

    #[must_use]
    pub fn collectibles(&self) -> &[PowerUp] {
        &self.collectibles
    }

    #[must_use]
    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active
    }

    /// Cells occupied by collectibles.
    pub fn positions(&self) -> impl Iterator<Item = Cell> + '_ {
        self.collectibles.iter().map(|power_up| power_up.position)
    }
}
