pub mod arena;
pub mod leaderboard;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{app::App, vision::HandSource};

pub const ACCENT: Color = Color::Rgb(251, 198, 64);

/// Render the current screen and remember where the arena went.
pub fn draw<H: HandSource>(app: &mut App<H>, f: &mut Frame) {
    let area = f.area();
    let screen = screen::current_screen(app.game.state());
    screen.render(&app.game, app.frame_size, f, area);
    app.arena = Some(arena::arena_area(area));
}

/// Vertically centred block of lines.
pub(crate) fn centered_lines(f: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        chunks[1],
    );
}

pub(crate) fn hint(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    ))
}

pub(crate) fn heading(text: &str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}
