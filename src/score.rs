use std::collections::HashMap;

use crate::food::FoodKind;

/// Score, high score and the active score multiplier for one session.
#[derive(Debug, Clone)]
pub struct ScoreTracker {
    score: u32,
    high_score: u32,
    multiplier: u32,
    foods_eaten: u32,
    points: HashMap<FoodKind, u32>,
}

impl ScoreTracker {
    /// Creates a tracker awarding `points` per food kind.
    #[must_use]
    pub fn new(points: HashMap<FoodKind, u32>) -> Self {
        Self {
            score: 0,
            high_score: 0,
            multiplier: 1,
            foods_eaten: 0,
            points,
        }
    }

    /// Seeds the high score, e.g. from a persisted value.
    #[must_use]
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    /// Awards the points for `kind` under the current multiplier.
    /// Returns the points gained.
    pub fn on_food_eaten(&mut self, kind: FoodKind) -> u32 {
        let gained = self.projected_points(kind);
        self.foods_eaten = self.foods_eaten.saturating_add(1);
        self.add(gained);
        gained
    }

    /// Adds a flat power-up bonus, unaffected by the multiplier.
    pub fn on_powerup_collected(&mut self, bonus: u32) {
        self.add(bonus);
    }

    /// Folds the final score into the high score.
    pub fn record_game_over(&mut self) {
        self.high_score = self.high_score.max(self.score);
    }

    pub fn set_multiplier(&mut self, multiplier: u32) {
        self.multiplier = multiplier.max(1);
    }

    /// Clears the running score; the high score survives.
    pub fn reset(&mut self) {
        self.score = 0;
        self.multiplier = 1;
        self.foods_eaten = 0;
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    #[must_use]
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    #[must_use]
    pub fn foods_eaten(&self) -> u32 {
        self.foods_eaten
    }

    /// Points currently granted for eating `kind`, multiplier included.
    #[must_use]
    pub fn projected_points(&self, kind: FoodKind) -> u32 {
        self.points
            .get(&kind)
            .copied()
            .unwrap_or(0)
            .saturating_mul(self.multiplier)
    }

    fn add(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.high_score = self.high_score.max(self.score);
    }
}
