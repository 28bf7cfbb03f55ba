use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Block;

use crate::food::FoodKind;
use crate::grid::{Cell, GridWorld};
use crate::input::Direction;
use crate::session::{GameStatus, SessionSnapshot};
use crate::ui::hud::{HudInfo, render_hud};
use crate::ui::menu::{render_game_over_menu, render_pause_menu};

/// Terminal columns per grid cell; two keeps cells roughly square.
pub const CELL_COLUMNS: u16 = 2;

const GLYPH_SNAKE_HEAD_UP: &str = "▲▲";
const GLYPH_SNAKE_HEAD_DOWN: &str = "▼▼";
const GLYPH_SNAKE_HEAD_LEFT: &str = "◀◀";
const GLYPH_SNAKE_HEAD_RIGHT: &str = "▶▶";
const GLYPH_SNAKE_BODY: &str = "██";
const GLYPH_FOOD: &str = "()";
const GLYPH_POWER_UP: &str = "<>";

const COLOR_SNAKE_HEAD: Color = Color::White;
const COLOR_SNAKE_BODY: Color = Color::Green;
const COLOR_SNAKE_INVINCIBLE: Color = Color::Yellow;
const COLOR_FOOD: Color = Color::Red;
const COLOR_BONUS_FOOD: Color = Color::Magenta;
const COLOR_POWER_UP: Color = Color::Cyan;
const COLOR_BORDER: Color = Color::DarkGray;

/// Renders the full game frame from a session snapshot.
pub fn render(frame: &mut Frame<'_>, snapshot: &SessionSnapshot, hud_info: &HudInfo<'_>) {
    let area = frame.area();
    let play_area = render_hud(frame, area, snapshot, hud_info);

    let block = Block::bordered().border_style(Style::new().fg(COLOR_BORDER));
    let inner = block.inner(play_area);
    frame.render_widget(block, play_area);

    render_food(frame, inner, snapshot);
    render_power_ups(frame, inner, snapshot);
    render_snake(frame, inner, snapshot);

    match snapshot.status {
        GameStatus::Paused => render_pause_menu(frame, play_area),
        GameStatus::GameOver => render_game_over_menu(frame, play_area, snapshot, hud_info),
        GameStatus::Playing => {}
    }
}

fn render_food(frame: &mut Frame<'_>, inner: Rect, snapshot: &SessionSnapshot) {
    let Some(food) = snapshot.food else {
        return;
    };
    let Some((x, y)) = logical_to_terminal(inner, snapshot.grid, food.position) else {
        return;
    };

    let color = match food.kind {
        FoodKind::Normal => COLOR_FOOD,
        FoodKind::Bonus => COLOR_BONUS_FOOD,
    };
    frame
        .buffer_mut()
        .set_string(x, y, GLYPH_FOOD, Style::new().fg(color));
}

fn render_power_ups(frame: &mut Frame<'_>, inner: Rect, snapshot: &SessionSnapshot) {
    let buffer = frame.buffer_mut();
    for power_up in &snapshot.power_ups {
        let Some((x, y)) = logical_to_terminal(inner, snapshot.grid, power_up.position) else {
            continue;
        };
        buffer.set_string(
            x,
            y,
            GLYPH_POWER_UP,
            Style::new()
                .fg(COLOR_POWER_UP)
                .add_modifier(Modifier::BOLD),
        );
    }
}

fn render_snake(frame: &mut Frame<'_>, inner: Rect, snapshot: &SessionSnapshot) {
    let body_color = if snapshot.invincible {
        COLOR_SNAKE_INVINCIBLE
    } else {
        COLOR_SNAKE_BODY
    };

    let buffer = frame.buffer_mut();
    // Tail first so the head wins where segments overlap.
    for (index, segment) in snapshot.snake_body.iter().enumerate().rev() {
        let Some((x, y)) = logical_to_terminal(inner, snapshot.grid, *segment) else {
            continue;
        };

        if index == 0 {
            buffer.set_string(
                x,
                y,
                head_glyph(snapshot.direction),
                Style::new()
                    .fg(COLOR_SNAKE_HEAD)
                    .bg(body_color)
                    .add_modifier(Modifier::BOLD),
            );
        } else {
            buffer.set_string(x, y, GLYPH_SNAKE_BODY, Style::new().fg(body_color));
        }
    }
}

fn head_glyph(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => GLYPH_SNAKE_HEAD_UP,
        Direction::Down => GLYPH_SNAKE_HEAD_DOWN,
        Direction::Left => GLYPH_SNAKE_HEAD_LEFT,
        Direction::Right => GLYPH_SNAKE_HEAD_RIGHT,
    }
}

fn logical_to_terminal(inner: Rect, grid: GridWorld, cell: Cell) -> Option<(u16, u16)> {
    if !grid.in_bounds(cell) {
        return None;
    }

    let x_offset = u16::try_from(cell.x).ok()?.checked_mul(CELL_COLUMNS)?;
    let y_offset = u16::try_from(cell.y).ok()?;

    let x = inner.x.saturating_add(x_offset);
    let y = inner.y.saturating_add(y_offset);
    if x.saturating_add(CELL_COLUMNS) > inner.right() || y >= inner.bottom() {
        return None;
    }

    Some((x, y))
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;

    use crate::grid::{Cell, GridWorld};

    use super::logical_to_terminal;

    #[test]
    fn cells_map_to_double_width_columns() {
        let inner = Rect::new(1, 1, 20, 10);
        let grid = GridWorld::new(10, 10);

        assert_eq!(logical_to_terminal(inner, grid, Cell::new(0, 0)), Some((1, 1)));
        assert_eq!(logical_to_terminal(inner, grid, Cell::new(3, 2)), Some((7, 3)));
        assert_eq!(logical_to_terminal(inner, grid, Cell::new(9, 9)), Some((19, 10)));
    }

    #[test]
    fn cells_outside_the_area_are_skipped() {
        let inner = Rect::new(0, 0, 10, 4);
        let grid = GridWorld::new(10, 10);

        assert_eq!(logical_to_terminal(inner, grid, Cell::new(5, 0)), None);
        assert_eq!(logical_to_terminal(inner, grid, Cell::new(0, 4)), None);
        assert_eq!(logical_to_terminal(inner, grid, Cell::new(-1, 0)), None);
    }
}
