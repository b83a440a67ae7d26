use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Rectangle},
        Block, Borders, Paragraph,
    },
    Frame,
};

use crate::{game::Game, hits::HandSlot, target::MAX_DAMAGE_STAGE};

const HUD_HEIGHT: u16 = 1;

/// Where the playing field goes inside the full terminal area.
pub fn arena_area(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HUD_HEIGHT), Constraint::Min(0)])
        .split(area)[1]
}

/// Frame rows grow downward, canvas rows grow upward.
pub fn flip_y(y: f64, height: f64) -> f64 {
    height - y
}

/// Target colour for a damage stage, yellow through to red.
pub fn stage_color(stage: u32) -> Color {
    let stage = stage.clamp(1, MAX_DAMAGE_STAGE);
    let t = (stage - 1) as f64 / (MAX_DAMAGE_STAGE - 1) as f64;
    let green = (220.0 * (1.0 - t)) as u8;
    Color::Rgb(255, green, 40)
}

fn hand_color(slot: HandSlot) -> Color {
    match slot {
        HandSlot::Right => Color::Cyan,
        HandSlot::Left => Color::Blue,
    }
}

pub fn render_round(game: &Game, frame_size: (u32, u32), f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HUD_HEIGHT), Constraint::Min(0)])
        .split(area);

    let session = game.session();
    let hud = Line::from(vec![
        Span::styled(
            format!("Time: {:.1}s", session.remaining.as_secs_f64()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("Targets Hit: {}", session.hit_count),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("Stage {}", game.target().damage_stage()),
            Style::default().fg(stage_color(game.target().damage_stage())),
        ),
    ]);
    f.render_widget(Paragraph::new(hud), chunks[0]);

    let (w, h) = (frame_size.0 as f64, frame_size.1 as f64);
    let marker_radius = game.marker_radius();

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::NONE))
        .marker(Marker::Braille)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(|ctx| {
            if let Some(r) = game.target().rect() {
                ctx.draw(&Rectangle {
                    x: r.x,
                    y: flip_y(r.bottom(), h),
                    width: r.width,
                    height: r.height,
                    color: stage_color(game.target().damage_stage()),
                });
            }
            for (slot, state) in game.hands().iter() {
                if let Some(p) = state.current {
                    ctx.draw(&Circle {
                        x: p.x,
                        y: flip_y(p.y, h),
                        radius: marker_radius,
                        color: hand_color(slot),
                    });
                }
            }
        });
    f.render_widget(canvas, chunks[1]);
}
