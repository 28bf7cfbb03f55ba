use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::session::SessionSnapshot;

const SEPARATOR: &str = " │ ";
const HUD_MARGIN_X: u16 = 1;
const COLOR_VALUE: Color = Color::White;
const COLOR_MUTED: Color = Color::DarkGray;
const COLOR_ACCENT: Color = Color::Yellow;
const COLOR_EFFECT: Color = Color::Cyan;

/// Supplemental values displayed by the HUD rows.
#[derive(Debug, Clone)]
pub struct HudInfo<'a> {
    /// Name of the active rule set.
    pub ruleset: &'a str,
    /// Best score before the current game started.
    pub previous_high_score: u32,
}

/// Renders the two-line HUD and returns the remaining play area above it.
#[must_use]
pub fn render_hud(
    frame: &mut Frame<'_>,
    area: Rect,
    snapshot: &SessionSnapshot,
    info: &HudInfo<'_>,
) -> Rect {
    let [play_area, score_area, status_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let score_area = inset_horizontal(score_area, HUD_MARGIN_X);
    let status_area = inset_horizontal(status_area, HUD_MARGIN_X);

    frame.render_widget(
        Paragraph::new(top_info_line(
            snapshot,
            info.previous_high_score,
            usize::from(score_area.width),
        ))
        .alignment(Alignment::Right)
        .style(Style::default().fg(COLOR_MUTED)),
        score_area,
    );

    let [rules_area, effects_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(status_area);
    frame.render_widget(
        Paragraph::new(Line::from(format!(
            "{} {}x{}",
            info.ruleset, snapshot.grid.width, snapshot.grid.height
        )))
        .alignment(Alignment::Left)
        .style(Style::default().fg(COLOR_MUTED)),
        rules_area,
    );
    frame.render_widget(
        Paragraph::new(bottom_info_line(snapshot, usize::from(effects_area.width)))
            .alignment(Alignment::Right)
            .style(Style::default().fg(COLOR_MUTED)),
        effects_area,
    );

    play_area
}

fn inset_horizontal(area: Rect, margin: u16) -> Rect {
    let total_margin = margin.saturating_mul(2);
    Rect {
        x: area.x.saturating_add(margin),
        y: area.y,
        width: area.width.saturating_sub(total_margin),
        height: area.height,
    }
}

fn top_info_line(
    snapshot: &SessionSnapshot,
    previous_high_score: u32,
    available_width: usize,
) -> Line<'static> {
    let compact = top_info_width(snapshot) > available_width;
    let labels = if compact {
        ["L", "V", "S", "H"]
    } else {
        ["Length", "Level", "Score", "Hi"]
    };
    let values = [
        snapshot.snake_body.len().to_string(),
        snapshot.level.to_string(),
        snapshot.score.to_string(),
        snapshot.high_score.to_string(),
    ];
    let new_high_score = snapshot.score > previous_high_score;

    let mut spans = Vec::with_capacity(values.len() * 3);
    for (index, (label, value)) in labels.into_iter().zip(values).enumerate() {
        if index > 0 {
            spans.push(Span::raw(SEPARATOR));
        }
        let highlight = new_high_score && index >= 2;
        let color = if highlight { COLOR_ACCENT } else { COLOR_VALUE };
        spans.push(Span::raw(format!("{label}: ")));
        spans.push(Span::styled(value, Style::default().fg(color)));
    }

    Line::from(spans)
}

fn top_info_width(snapshot: &SessionSnapshot) -> usize {
    format!(
        "Length: {}{SEPARATOR}Level: {}{SEPARATOR}Score: {}{SEPARATOR}Hi: {}",
        snapshot.snake_body.len(),
        snapshot.level,
        snapshot.score,
        snapshot.high_score
    )
    .width()
}

fn bottom_info_line(snapshot: &SessionSnapshot, available_width: usize) -> Line<'static> {
    let mut spans = vec![
        Span::raw("speed: "),
        Span::styled(
            format!("{:.1}", snapshot.speed),
            Style::default().fg(COLOR_VALUE),
        ),
    ];
    if snapshot.multiplier > 1 {
        spans.push(Span::raw(SEPARATOR));
        spans.push(Span::styled(
            format!("x{}", snapshot.multiplier),
            Style::default().fg(COLOR_ACCENT),
        ));
    }

    let mut used: usize = spans.iter().map(|span| span.content.width()).sum();
    for effect in &snapshot.active_effects {
        let remaining = effect.expires_at.saturating_sub(snapshot.elapsed);
        let text = effect_label(effect.kind.as_str(), remaining);
        let needed = SEPARATOR.width() + text.width();
        if used + needed > available_width {
            break;
        }
        used += needed;
        spans.push(Span::raw(SEPARATOR));
        spans.push(Span::styled(text, Style::default().fg(COLOR_EFFECT)));
    }

    Line::from(spans)
}

fn effect_label(kind: &str, remaining: Duration) -> String {
    format!("{kind} {:.1}s", remaining.as_secs_f32())
}
