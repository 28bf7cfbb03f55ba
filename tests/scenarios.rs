use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snake_engine::collision::DeathReason;
use snake_engine::config::{EngineConfig, Ruleset};
use snake_engine::food::Food;
use snake_engine::grid::{Cell, GridWorld};
use snake_engine::input::{Command, Direction, GameInput};
use snake_engine::powerup::{EffectSpec, PowerUpKind};
use snake_engine::session::{GameSession, GameStatus};
use snake_engine::snake::Snake;

const DT: Duration = Duration::from_millis(100);

fn board(width: u16, height: u16) -> EngineConfig {
    let mut config = Ruleset::Plain.config();
    config.grid = GridWorld::new(width, height);
    config
}

fn three_long_snake() -> Snake {
    Snake::from_segments(
        vec![Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)],
        Direction::Right,
    )
}

#[test]
fn eating_grows_the_snake_and_scores() {
    let mut state = GameSession::new_with_seed(board(10, 10), 42).expect("valid config");
    state.snake = three_long_snake();
    state.food = Some(Food::normal(Cell::new(6, 5)));

    let snapshot = state.tick(DT);

    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.snake_body.len(), 4);
    assert_eq!(snapshot.snake_body[0], Cell::new(6, 5));
    assert_eq!(snapshot.score, 10);
    let food = snapshot.food.expect("new food spawned");
    assert!(!snapshot.snake_body.contains(&food.position));
}

#[test]
fn leaving_the_board_ends_the_game() {
    let mut state = GameSession::new_with_seed(board(10, 10), 42).expect("valid config");
    state.snake = Snake::new(Cell::new(9, 5), Direction::Right, 3, 10.0);
    state.food = Some(Food::normal(Cell::new(0, 0)));

    let snapshot = state.tick(DT);

    assert_eq!(snapshot.status, GameStatus::GameOver);
    assert_eq!(snapshot.death_reason, Some(DeathReason::WallCollision));
    assert_eq!(snapshot.snake_body[0], Cell::new(9, 5));
}

#[test]
fn invincible_snake_wraps_around_the_board() {
    let mut state =
        GameSession::new_with_seed(Ruleset::Classic.config(), 42).expect("valid config");
    state.snake = Snake::new(Cell::new(19, 10), Direction::Right, 3, 10.0);
    state.food = Some(Food::normal(Cell::new(0, 0)));
    state.activate_power_up(&PowerUpKind::new(PowerUpKind::INVINCIBILITY));

    let snapshot = state.tick(DT);

    assert_eq!(snapshot.status, GameStatus::Playing);
    assert!(snapshot.invincible);
    assert_eq!(snapshot.snake_body[0], Cell::new(0, 10));
    assert_eq!(snapshot.snake_body.len(), 3);
}

#[test]
fn restart_resets_the_score_but_keeps_the_high_score() {
    let mut config = board(10, 10);
    config.snake.start = Some(Cell::new(1, 5));
    config.snake.initial_length = 1;
    let mut state = GameSession::new_with_seed(config, 7).expect("valid config");

    for _ in 0..5 {
        let head = state.snake.head();
        state.food = Some(Food::normal(Cell::new(head.x + 1, head.y)));
        state.tick(DT);
    }
    assert_eq!(state.score().score(), 50);

    for _ in 0..20 {
        if state.status() == GameStatus::GameOver {
            break;
        }
        state.food = Some(Food::normal(Cell::new(0, 0)));
        state.tick(DT);
    }
    assert_eq!(state.status(), GameStatus::GameOver);

    state.apply_input(GameInput::Command(Command::Restart));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.high_score, 50);
    assert_eq!(snapshot.snake_body, vec![Cell::new(1, 5)]);
    assert_eq!(snapshot.level, 1);
    assert_eq!(snapshot.death_reason, None);
}

#[test]
fn food_waits_for_a_free_cell_on_a_full_board() {
    let mut config = board(3, 1);
    config.snake.start = Some(Cell::new(1, 0));
    config.snake.initial_length = 2;
    let mut state = GameSession::new_with_seed(config, 17).expect("valid config");
    state.food = Some(Food::normal(Cell::new(2, 0)));

    let snapshot = state.tick(DT);
    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.snake_body.len(), 3);
    assert_eq!(snapshot.food, None);
    assert_eq!(snapshot.score, 10);

    state.snake = Snake::from_segments(vec![Cell::new(2, 0)], Direction::Left);
    let snapshot = state.tick(DT);

    assert_eq!(snapshot.status, GameStatus::Playing);
    let food = snapshot.food.expect("food placed once a cell is free");
    assert!(!snapshot.snake_body.contains(&food.position));
}

#[test]
fn bonus_food_scores_its_own_points() {
    let mut config = Ruleset::BonusFood.config();
    config.grid = GridWorld::new(10, 10);
    let mut state = GameSession::new_with_seed(config, 21).expect("valid config");
    state.snake = three_long_snake();
    state.food = Some(Food::bonus(Cell::new(6, 5)));

    let snapshot = state.tick(DT);

    assert_eq!(snapshot.score, 20);
    assert_eq!(snapshot.snake_body.len(), 4);
}

#[test]
fn reversing_into_the_body_is_ignored() {
    let mut state = GameSession::new_with_seed(board(10, 10), 3).expect("valid config");
    state.snake = three_long_snake();
    state.food = Some(Food::normal(Cell::new(0, 0)));

    state.set_direction(Direction::Left);
    let snapshot = state.tick(DT);

    assert_eq!(snapshot.status, GameStatus::Playing);
    assert_eq!(snapshot.direction, Direction::Right);
    assert_eq!(snapshot.snake_body[0], Cell::new(6, 5));
}

#[test]
fn quick_turns_are_applied_on_consecutive_ticks() {
    let mut state = GameSession::new_with_seed(board(10, 10), 3).expect("valid config");
    state.snake = three_long_snake();
    state.food = Some(Food::normal(Cell::new(0, 0)));

    state.set_direction(Direction::Up);
    state.set_direction(Direction::Left);
    state.tick(DT);
    assert_eq!(state.snake.head(), Cell::new(5, 4));

    state.tick(DT);
    assert_eq!(state.snake.head(), Cell::new(4, 4));
}

#[test]
fn length_only_changes_on_the_tick_food_is_eaten() {
    let mut state = GameSession::new_with_seed(board(10, 10), 11).expect("valid config");
    state.snake = three_long_snake();
    state.food = Some(Food::normal(Cell::new(0, 0)));

    state.tick(DT);
    assert_eq!(state.snake.len(), 3);

    let head = state.snake.head();
    state.food = Some(Food::normal(Cell::new(head.x + 1, head.y)));
    state.tick(DT);
    assert_eq!(state.snake.len(), 4);

    state.food = Some(Food::normal(Cell::new(0, 0)));
    state.tick(DT);
    assert_eq!(state.snake.len(), 4);
}

#[test]
fn body_segments_stay_adjacent_while_turning() {
    let mut state = GameSession::new_with_seed(board(10, 10), 13).expect("valid config");
    state.snake = three_long_snake();

    for direction in [
        Direction::Up,
        Direction::Up,
        Direction::Left,
        Direction::Left,
        Direction::Down,
        Direction::Left,
    ] {
        let head = state.snake.head();
        state.food = Some(Food::normal(head.offset(direction.delta())));
        state.set_direction(direction);
        let snapshot = state.tick(DT);

        assert_eq!(snapshot.status, GameStatus::Playing);
        assert!(
            snapshot
                .snake_body
                .windows(2)
                .all(|pair| pair[0].manhattan(pair[1]) == 1)
        );
        assert!(!state.snake.head_overlaps_body());
    }
    assert_eq!(state.snake.len(), 9);
}

#[test]
fn food_never_lands_on_the_snake_or_a_power_up() {
    let mut config = Ruleset::Classic.config();
    config.grid = GridWorld::new(8, 8);
    config.power_ups.probability = 0.5;
    config.power_ups.max_active = 3;
    let mut state = GameSession::new_with_seed(config, 99).expect("valid config");
    let mut steering = StdRng::seed_from_u64(5);
    let directions = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    for _ in 0..2_000 {
        if state.status() == GameStatus::GameOver {
            state.command(Command::Restart);
        }
        state.set_direction(directions[steering.gen_range(0..directions.len())]);
        let snapshot = state.tick(DT);

        let Some(food) = snapshot.food else {
            continue;
        };
        assert!(!snapshot.snake_body.contains(&food.position));
        assert!(
            snapshot
                .power_ups
                .iter()
                .all(|power_up| power_up.position != food.position)
        );
        assert!(snapshot.power_ups.len() <= 3);
    }
}

#[test]
fn timed_effects_revert_exactly_once() {
    let mut state = GameSession::new_with_seed(board(10, 10), 5).expect("valid config");
    state.register_effect(
        PowerUpKind::new(PowerUpKind::SPEED),
        EffectSpec::SpeedBoost { amount: 5.0 },
        Duration::from_millis(250),
        1,
    );
    state.food = Some(Food::normal(Cell::new(0, 0)));
    state.activate_power_up(&PowerUpKind::new(PowerUpKind::SPEED));
    assert!((state.snake.speed() - 15.0).abs() < f32::EPSILON);

    for _ in 0..3 {
        state.food = Some(Food::normal(Cell::new(0, 0)));
        state.tick(DT);
    }
    assert!((state.snake.speed() - 10.0).abs() < f32::EPSILON);
    assert!(state.power_ups().active_effects().is_empty());

    state.food = Some(Food::normal(Cell::new(0, 0)));
    state.tick(DT);
    assert!((state.snake.speed() - 10.0).abs() < f32::EPSILON);
}
