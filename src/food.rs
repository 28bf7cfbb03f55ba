use std::collections::HashSet;
use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Cell, GridWorld};

/// Food type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Normal,
    Bonus,
}

/// Food entity currently active on the board.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub position: Cell,
    pub kind: FoodKind,
}

impl Food {
    /// Creates a normal food at `position`.
    #[must_use]
    pub fn normal(position: Cell) -> Self {
        Self {
            position,
            kind: FoodKind::Normal,
        }
    }

    /// Creates a bonus food at `position`.
    #[must_use]
    pub fn bonus(position: Cell) -> Self {
        Self {
            position,
            kind: FoodKind::Bonus,
        }
    }
}

/// Chooses the kind of each newly spawned food.
pub trait FoodKindPolicy {
    fn choose(&mut self, rng: &mut dyn RngCore) -> FoodKind;
}

impl<F> FoodKindPolicy for F
where
    F: FnMut(&mut dyn RngCore) -> FoodKind,
{
    fn choose(&mut self, rng: &mut dyn RngCore) -> FoodKind {
        self(rng)
    }
}

/// Configurable kind selection.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum KindSelection {
    /// Every food has the same kind.
    Fixed { kind: FoodKind },
    /// Weighted draw between normal and bonus food.
    Weighted { normal: u32, bonus: u32 },
}

impl Default for KindSelection {
    fn default() -> Self {
        Self::Fixed {
            kind: FoodKind::Normal,
        }
    }
}

impl KindSelection {
    /// Kinds this selection can ever produce.
    #[must_use]
    pub fn possible_kinds(self) -> Vec<FoodKind> {
        match self {
            Self::Fixed { kind } => vec![kind],
            Self::Weighted { normal, bonus } => {
                let mut kinds = Vec::with_capacity(2);
                if normal > 0 {
                    kinds.push(FoodKind::Normal);
                }
                if bonus > 0 {
                    kinds.push(FoodKind::Bonus);
                }
                kinds
            }
        }
    }
}

impl FoodKindPolicy for KindSelection {
    fn choose(&mut self, rng: &mut dyn RngCore) -> FoodKind {
        match *self {
            Self::Fixed { kind } => kind,
            Self::Weighted { normal, bonus } => {
                let total = normal.saturating_add(bonus);
                if total == 0 || rng.gen_range(0..total) < normal {
                    FoodKind::Normal
                } else {
                    FoodKind::Bonus
                }
            }
        }
    }
}

/// Places food on free cells.
pub struct FoodSpawner {
    policy: Box<dyn FoodKindPolicy>,
}

impl fmt::Debug for FoodSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoodSpawner").finish_non_exhaustive()
    }
}

impl FoodSpawner {
    #[must_use]
    pub fn new(selection: KindSelection) -> Self {
        Self::with_policy(selection)
    }

    /// Builds a spawner around a custom kind policy.
    #[must_use]
    pub fn with_policy(policy: impl FoodKindPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Spawns food on a cell outside `excluding`.
    ///
    /// Returns `None` when no free cell exists; the caller retries on a later tick.
    pub fn spawn<R: RngCore>(
        &mut self,
        grid: GridWorld,
        rng: &mut R,
        excluding: &HashSet<Cell>,
    ) -> Option<Food> {
        let Some(position) = grid.random_cell(rng, excluding) else {
            debug!(occupied = excluding.len(), "no free cell for food, deferring spawn");
            return None;
        };

        let kind = self.policy.choose(rng);
        debug!(x = position.x, y = position.y, ?kind, "food spawned");
        Some(Food { position, kind })
    }
}
