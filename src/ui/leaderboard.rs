use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{
    leaderboard::{HighScoreEntry, LeaderboardTable, MAX_ENTRIES},
    session::RoundLength,
    ui::ACCENT,
};

/// One ranked row; empty slots render as dashes.
pub fn present_row(rank: usize, entry: Option<&HighScoreEntry>) -> Row<'static> {
    match entry {
        Some(e) => Row::new(vec![
            Cell::from(format!("{}.", rank)),
            Cell::from(e.name.clone()),
            Cell::from(e.score.to_string()),
        ])
        .style(Style::default().fg(ACCENT)),
        None => Row::new(vec![
            Cell::from(format!("{}.", rank)),
            Cell::from("---"),
            Cell::from(""),
        ])
        .style(Style::default().fg(Color::DarkGray)),
    }
}

fn column(table: &LeaderboardTable, len: RoundLength) -> Table<'static> {
    let entries = table.entries(len);
    let rows = (0..MAX_ENTRIES).map(|i| present_row(i + 1, entries.get(i)));

    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(6),
        ],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} Seconds", len.secs()))
            .title_alignment(Alignment::Center),
    )
}

pub fn render_leaderboard(table: &LeaderboardTable, f: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(MAX_ENTRIES as u16 + 2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new("Leaderboard")
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, rows[0]);

    let constraints: Vec<Constraint> = RoundLength::ALL
        .iter()
        .map(|_| Constraint::Ratio(1, RoundLength::ALL.len() as u32))
        .collect();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .horizontal_margin(2)
        .spacing(4)
        .constraints(constraints)
        .split(rows[1]);

    for (len, area) in RoundLength::ALL.iter().zip(cols.iter()) {
        f.render_widget(column(table, *len), *area);
    }

    let back = Paragraph::new("(b)ack (q)uit")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Left);
    f.render_widget(back, rows[3]);
}
