use std::collections::VecDeque;

use crate::grid::Cell;
use crate::input::{Direction, direction_change_is_valid};

/// Base speed used by snakes built without an explicit speed, in ticks per second.
pub const DEFAULT_BASE_SPEED: f32 = 10.0;

/// Mutable snake state and movement buffering behavior.
#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Cell>,
    direction: Direction,
    buffered_direction: Direction,
    next_buffered_direction: Option<Direction>,
    pending_growth: u32,
    base_speed: f32,
    speed_boost: f32,
    initial_body: Vec<Cell>,
    initial_direction: Direction,
    initial_speed: f32,
}

impl Snake {
    /// Creates a straight snake of `length` cells with its head at `head`,
    /// trailing away from `direction`.
    #[must_use]
    pub fn new(head: Cell, direction: Direction, length: usize, base_speed: f32) -> Self {
        let (dx, dy) = direction.opposite().delta();
        let segments = (0..length.max(1))
            .map(|index| {
                let step = i32::try_from(index).unwrap_or(i32::MAX);
                Cell::new(head.x + dx * step, head.y + dy * step)
            })
            .collect();

        Self::from_segments(segments, direction).with_base_speed(base_speed)
    }

    /// Creates a snake from explicit body segments (front is head).
    ///
    /// # Panics
    ///
    /// Panics when `segments` is empty.
    #[must_use]
    pub fn from_segments(segments: Vec<Cell>, direction: Direction) -> Self {
        assert!(!segments.is_empty(), "snake needs at least one segment");

        Self {
            body: segments.iter().copied().collect(),
            direction,
            buffered_direction: direction,
            next_buffered_direction: None,
            pending_growth: 0,
            base_speed: DEFAULT_BASE_SPEED,
            speed_boost: 0.0,
            initial_body: segments,
            initial_direction: direction,
            initial_speed: DEFAULT_BASE_SPEED,
        }
    }

    /// Sets the base speed, also used as the speed restored by [`Snake::reset`].
    #[must_use]
    pub fn with_base_speed(mut self, base_speed: f32) -> Self {
        self.base_speed = base_speed;
        self.initial_speed = base_speed;
        self
    }

    /// Buffers the next direction, supporting a two-deep queue for quick turns.
    ///
    /// When no turn is queued yet, the direction is stored as the primary
    /// buffered direction, rejecting direct reversals of the current direction.
    /// When a turn is already queued, a second direction is stored with
    /// last-input-wins semantics, rejecting reversals of the queued direction.
    pub fn buffer_direction(&mut self, direction: Direction) {
        if self.buffered_direction == self.direction {
            if !direction_change_is_valid(self.direction, direction) {
                return;
            }
            self.buffered_direction = direction;
        } else {
            if !direction_change_is_valid(self.buffered_direction, direction) {
                return;
            }
            self.next_buffered_direction = Some(direction);
        }
    }

    /// Promotes the buffered intent to the current direction and returns it.
    pub fn turn(&mut self) -> Direction {
        self.direction = self.buffered_direction;
        if let Some(next) = self.next_buffered_direction.take() {
            self.buffered_direction = next;
        }
        self.direction
    }

    /// Returns the head cell one step in `direction`.
    ///
    /// A reversal of the current direction is ignored and the current
    /// direction is used instead.
    #[must_use]
    pub fn propose_head(&self, direction: Direction) -> Cell {
        let direction = if direction_change_is_valid(self.direction, direction) {
            direction
        } else {
            self.direction
        };
        self.head().offset(direction.delta())
    }

    /// Moves the head to `new_head`. Keeps the tail when `grow` is set,
    /// consuming one queued growth segment.
    pub fn commit_move(&mut self, new_head: Cell, grow: bool) {
        self.body.push_front(new_head);
        if grow {
            self.pending_growth = self.pending_growth.saturating_sub(1);
        } else {
            let _ = self.body.pop_back();
        }
    }

    /// Queues `segments` of growth for the following moves.
    pub fn queue_growth(&mut self, segments: u32) {
        self.pending_growth = self.pending_growth.saturating_add(segments);
    }

    #[must_use]
    pub fn pending_growth(&self) -> u32 {
        self.pending_growth
    }

    /// Raises the base speed by `delta`, saturating at `cap`.
    pub fn increase_speed(&mut self, delta: f32, cap: f32) {
        self.base_speed = (self.base_speed + delta).min(cap).max(self.base_speed);
    }

    /// Adds a temporary speed boost on top of the base speed.
    pub fn add_speed_boost(&mut self, delta: f32) {
        self.speed_boost += delta;
    }

    /// Removes a boost previously added with [`Snake::add_speed_boost`].
    pub fn remove_speed_boost(&mut self, delta: f32) {
        self.speed_boost = (self.speed_boost - delta).max(0.0);
    }

    /// Current speed in ticks per second, boosts included.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.base_speed + self.speed_boost
    }

    #[must_use]
    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    /// Restores the initial body, direction and speed.
    pub fn reset(&mut self) {
        self.body.clear();
        self.body.extend(self.initial_body.iter().copied());
        self.direction = self.initial_direction;
        self.buffered_direction = self.initial_direction;
        self.next_buffered_direction = None;
        self.pending_growth = 0;
        self.base_speed = self.initial_speed;
        self.speed_boost = 0.0;
    }

    /// Returns the current head position.
    #[must_use]
    pub fn head(&self) -> Cell {
        *self
            .body
            .front()
            .expect("snake body must always contain at least one segment")
    }

    /// Returns the current tail position.
    #[must_use]
    pub fn tail(&self) -> Cell {
        *self
            .body
            .back()
            .expect("snake body must always contain at least one segment")
    }

    /// Returns true if any segment occupies `cell`.
    #[must_use]
    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Returns true if the head overlaps any non-head segment.
    #[must_use]
    pub fn head_overlaps_body(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|segment| *segment == head)
    }

    /// Returns current segment count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true when there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns the current movement direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Iterates over body segments from head to tail.
    pub fn segments(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::Cell;
    use crate::input::Direction;

    use super::Snake;

    fn advance(snake: &mut Snake) {
        let direction = snake.turn();
        let head = snake.propose_head(direction);
        let grow = snake.pending_growth() > 0;
        snake.commit_move(head, grow);
    }

    #[test]
    fn new_snake_trails_behind_its_head() {
        let snake = Snake::new(Cell::new(5, 10), Direction::Right, 3, 10.0);
        let segments: Vec<Cell> = snake.segments().copied().collect();

        assert_eq!(
            segments,
            vec![Cell::new(5, 10), Cell::new(4, 10), Cell::new(3, 10)]
        );
    }

    #[test]
    fn snake_moves_one_cell_per_tick() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Right, 3, 10.0);

        advance(&mut snake);

        assert_eq!(snake.head(), Cell::new(6, 5));
        assert_eq!(snake.tail(), Cell::new(4, 5));
        assert_eq!(snake.len(), 3);
    }

    #[test]
    fn growth_keeps_previous_tail_once() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Right, 3, 10.0);

        snake.queue_growth(1);
        advance(&mut snake);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.pending_growth(), 0);

        advance(&mut snake);
        assert_eq!(snake.len(), 4);
    }

    #[test]
    fn propose_head_ignores_reversal() {
        let snake = Snake::new(Cell::new(5, 5), Direction::Up, 3, 10.0);

        assert_eq!(snake.propose_head(Direction::Down), Cell::new(5, 4));
        assert_eq!(snake.propose_head(Direction::Left), Cell::new(4, 5));
    }

    #[test]
    fn direction_buffer_rejects_reverse() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Up, 3, 10.0);

        snake.buffer_direction(Direction::Down);
        advance(&mut snake);

        assert_eq!(snake.direction(), Direction::Up);
        assert_eq!(snake.head(), Cell::new(5, 4));
    }

    #[test]
    fn direction_buffer_two_deep_queue() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Down, 1, 10.0);

        snake.buffer_direction(Direction::Right);
        snake.buffer_direction(Direction::Up);

        advance(&mut snake);
        assert_eq!(snake.head(), Cell::new(6, 5));

        advance(&mut snake);
        assert_eq!(snake.head(), Cell::new(6, 4));
    }

    #[test]
    fn direction_buffer_rejects_reversal_of_queued_direction() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Down, 1, 10.0);

        snake.buffer_direction(Direction::Right);
        snake.buffer_direction(Direction::Left);

        assert!(snake.next_buffered_direction.is_none());
    }

    #[test]
    fn speed_increase_saturates_at_cap() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Right, 3, 10.0);

        for _ in 0..30 {
            snake.increase_speed(0.5, 20.0);
        }

        assert!((snake.base_speed() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn speed_boost_is_reverted_exactly() {
        let mut snake = Snake::new(Cell::new(5, 5), Direction::Right, 3, 10.0);

        snake.add_speed_boost(5.0);
        assert!((snake.speed() - 15.0).abs() < f32::EPSILON);

        snake.increase_speed(0.5, 20.0);
        snake.remove_speed_boost(5.0);
        assert!((snake.speed() - 10.5).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut snake = Snake::new(Cell::new(5, 10), Direction::Right, 3, 10.0);
        snake.buffer_direction(Direction::Down);
        snake.queue_growth(2);
        advance(&mut snake);
        snake.increase_speed(2.0, 20.0);
        snake.add_speed_boost(5.0);

        snake.reset();

        assert_eq!(snake.head(), Cell::new(5, 10));
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.direction(), Direction::Right);
        assert_eq!(snake.pending_growth(), 0);
        assert!((snake.speed() - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn head_overlap_is_detected_after_commit() {
        let mut snake = Snake::from_segments(
            vec![
                Cell::new(2, 2),
                Cell::new(1, 2),
                Cell::new(1, 3),
                Cell::new(2, 3),
                Cell::new(3, 3),
            ],
            Direction::Down,
        );

        snake.commit_move(Cell::new(2, 3), false);

        assert!(snake.head_overlaps_body());
    }
}
