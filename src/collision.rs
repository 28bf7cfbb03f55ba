use serde::{Deserialize, Serialize};

use crate::food::Food;
use crate::grid::{BoundaryPolicy, Cell, GridWorld};
use crate::snake::Snake;

/// Why a session ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathReason {
    WallCollision,
    SelfCollision,
}

/// Everything one proposed move runs into.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Collision {
    /// Cell the head actually lands on; differs from the proposed cell only
    /// when an out-of-bounds move is survived.
    pub head: Cell,
    pub out_of_bounds: bool,
    pub self_collision: bool,
    /// Set when the move ends the session.
    pub fatal: Option<DeathReason>,
    pub ate_food: bool,
    pub power_up: bool,
}

impl Collision {
    /// True when the head stays where it is (clamped against a wall).
    #[must_use]
    pub fn is_stalled(&self, snake: &Snake) -> bool {
        self.head == snake.head()
    }
}

/// Evaluates proposed moves against the board.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    grid: GridWorld,
    boundary: BoundaryPolicy,
}

impl CollisionResolver {
    #[must_use]
    pub fn new(grid: GridWorld, boundary: BoundaryPolicy) -> Self {
        Self { grid, boundary }
    }

    /// Checks `proposed` against walls, the body, food and power-ups, in that order.
    ///
    /// The body is the one before this move: the tail counts only when the snake
    /// grows this tick, since otherwise it is vacated by the same move.
    /// Food and power-ups are only reported when the move is survived.
    pub fn resolve(
        &self,
        snake: &Snake,
        proposed: Cell,
        invincible: bool,
        food: Option<&Food>,
        mut power_up_cells: impl Iterator<Item = Cell>,
    ) -> Collision {
        let out_of_bounds = !self.grid.in_bounds(proposed);
        let head = if out_of_bounds {
            self.grid.resolve(proposed, self.boundary)
        } else {
            proposed
        };

        let food_here = food.is_some_and(|food| food.position == head);
        let growing = snake.pending_growth() > 0 || food_here;
        let self_collision = head != snake.head() && body_blocks(snake, head, growing);

        let fatal = if invincible {
            None
        } else if out_of_bounds {
            Some(DeathReason::WallCollision)
        } else if self_collision {
            Some(DeathReason::SelfCollision)
        } else {
            None
        };

        let alive = fatal.is_none();
        Collision {
            head,
            out_of_bounds,
            self_collision,
            fatal,
            ate_food: alive && food_here,
            power_up: alive && power_up_cells.any(|cell| cell == head),
        }
    }
}

fn body_blocks(snake: &Snake, cell: Cell, growing: bool) -> bool {
    let considered = if growing {
        snake.len()
    } else {
        snake.len().saturating_sub(1)
    };
    snake.segments().take(considered).any(|segment| *segment == cell)
}

#[cfg(test)]
mod tests {
    use std::iter;

    use crate::food::Food;
    use crate::grid::{BoundaryPolicy, Cell, GridWorld};
    use crate::input::Direction;
    use crate::snake::Snake;

    use super::{CollisionResolver, DeathReason};

    fn resolver(boundary: BoundaryPolicy) -> CollisionResolver {
        CollisionResolver::new(GridWorld::new(10, 10), boundary)
    }

    /// Square loop whose head is about to step onto its own tail.
    fn tail_chaser() -> Snake {
        Snake::from_segments(
            vec![
                Cell::new(2, 2),
                Cell::new(3, 2),
                Cell::new(3, 3),
                Cell::new(2, 3),
            ],
            Direction::Left,
        )
    }

    #[test]
    fn out_of_bounds_is_fatal() {
        let snake = Snake::new(Cell::new(9, 5), Direction::Right, 3, 10.0);

        let collision = resolver(BoundaryPolicy::Wrap).resolve(
            &snake,
            Cell::new(10, 5),
            false,
            None,
            iter::empty(),
        );

        assert!(collision.out_of_bounds);
        assert_eq!(collision.fatal, Some(DeathReason::WallCollision));
    }

    #[test]
    fn invincible_head_wraps_around() {
        let snake = Snake::new(Cell::new(9, 5), Direction::Right, 3, 10.0);

        let collision = resolver(BoundaryPolicy::Wrap).resolve(
            &snake,
            Cell::new(10, 5),
            true,
            None,
            iter::empty(),
        );

        assert_eq!(collision.fatal, None);
        assert_eq!(collision.head, Cell::new(0, 5));
    }

    #[test]
    fn invincible_head_clamps_and_stalls() {
        let snake = Snake::new(Cell::new(9, 5), Direction::Right, 3, 10.0);

        let collision = resolver(BoundaryPolicy::Clamp).resolve(
            &snake,
            Cell::new(10, 5),
            true,
            None,
            iter::empty(),
        );

        assert_eq!(collision.head, Cell::new(9, 5));
        assert!(collision.is_stalled(&snake));
        assert!(!collision.self_collision);
    }

    #[test]
    fn vacating_tail_is_not_a_collision() {
        let snake = tail_chaser();

        let collision = resolver(BoundaryPolicy::Wrap).resolve(
            &snake,
            Cell::new(2, 3),
            false,
            None,
            iter::empty(),
        );

        assert!(!collision.self_collision);
        assert_eq!(collision.fatal, None);
    }

    #[test]
    fn tail_is_a_collision_while_growing() {
        let mut snake = tail_chaser();
        snake.queue_growth(1);

        let collision = resolver(BoundaryPolicy::Wrap).resolve(
            &snake,
            Cell::new(2, 3),
            false,
            None,
            iter::empty(),
        );

        assert_eq!(collision.fatal, Some(DeathReason::SelfCollision));
    }

    #[test]
    fn food_and_power_up_are_reported_on_survived_moves() {
        let snake = Snake::new(Cell::new(5, 5), Direction::Right, 3, 10.0);
        let food = Food::normal(Cell::new(6, 5));

        let collision = resolver(BoundaryPolicy::Wrap).resolve(
            &snake,
            Cell::new(6, 5),
            false,
            Some(&food),
            iter::once(Cell::new(1, 1)),
        );
        assert!(collision.ate_food);
        assert!(!collision.power_up);

        let collision = resolver(BoundaryPolicy::Wrap).resolve(
            &snake,
            Cell::new(5, 4),
            false,
            Some(&food),
            iter::once(Cell::new(5, 4)),
        );
        assert!(!collision.ate_food);
        assert!(collision.power_up);
    }
}
