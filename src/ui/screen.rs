use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    game::{Game, GameState},
    leaderboard::MAX_NAME_LEN,
    session::RoundLength,
    ui::{arena, centered_lines, heading, hint, leaderboard::render_leaderboard, ACCENT},
};

/// A UI Screen boundary: renders one game state
pub trait Screen {
    fn render(&self, game: &Game, frame_size: (u32, u32), f: &mut Frame, area: Rect);
}

pub struct TitleScreen;

impl Screen for TitleScreen {
    fn render(&self, _game: &Game, _frame_size: (u32, u32), f: &mut Frame, area: Rect) {
        centered_lines(
            f,
            area,
            vec![
                heading("V I B E B O X", ACCENT),
                Line::from(""),
                Line::from("Start Game (s)"),
                Line::from("Leaderboard (l)"),
                Line::from(""),
                hint("(q)uit"),
            ],
        );
    }
}

pub struct SelectDurationScreen;

impl Screen for SelectDurationScreen {
    fn render(&self, _game: &Game, _frame_size: (u32, u32), f: &mut Frame, area: Rect) {
        let mut lines = vec![heading("Select Duration", ACCENT), Line::from("")];
        lines.extend(
            RoundLength::ALL
                .iter()
                .map(|len| Line::from(format!("({}) {}", len.menu_char(), len))),
        );
        lines.push(Line::from(""));
        lines.push(hint("(q)uit"));
        centered_lines(f, area, lines);
    }
}

pub struct RoundScreen;

impl Screen for RoundScreen {
    fn render(&self, game: &Game, frame_size: (u32, u32), f: &mut Frame, area: Rect) {
        arena::render_round(game, frame_size, f, area);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, game: &Game, _frame_size: (u32, u32), f: &mut Frame, area: Rect) {
        let session = game.session();
        let best = session
            .selected
            .and_then(|len| game.leaderboard().table().best(len))
            .unwrap_or(0);
        let length = session
            .selected
            .map(|l| l.to_string())
            .unwrap_or_default();

        let mut lines = vec![
            heading("Time's Up!", Color::Rgb(255, 165, 0)),
            Line::from(""),
            Line::from(Span::styled(
                format!("Score: {}", session.final_score),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("High Score ({}): {}", length, best)),
            Line::from(""),
        ];
        if session.new_high_score {
            lines.push(heading("NEW HIGH SCORE!", Color::Green));
            lines.push(hint("Enter to save / (r) restart / (q)uit"));
        } else {
            lines.push(hint("Enter to continue / (r) restart / (q)uit"));
        }
        centered_lines(f, area, lines);
    }
}

pub struct NameEntryScreen;

impl Screen for NameEntryScreen {
    fn render(&self, game: &Game, _frame_size: (u32, u32), f: &mut Frame, area: Rect) {
        let name = game.name().as_str();
        let pad = MAX_NAME_LEN.saturating_sub(name.width());
        centered_lines(
            f,
            area,
            vec![
                heading("New High Score!", Color::Green),
                Line::from(format!("Score: {}", game.session().final_score)),
                Line::from(""),
                Line::from(vec![
                    Span::raw("Enter Name: "),
                    Span::styled(
                        format!("{}_{}", name, " ".repeat(pad)),
                        Style::default()
                            .fg(ACCENT)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                hint(&format!(
                    "({}/{} chars, Enter to save, Esc to quit)",
                    game.name().len(),
                    MAX_NAME_LEN
                )),
            ],
        );
    }
}

pub struct LeaderboardScreen;

impl Screen for LeaderboardScreen {
    fn render(&self, game: &Game, _frame_size: (u32, u32), f: &mut Frame, area: Rect) {
        render_leaderboard(game.leaderboard().table(), f, area);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: GameState) -> Box<dyn Screen> {
    match state {
        GameState::Title => Box::new(TitleScreen),
        GameState::SelectDuration => Box::new(SelectDurationScreen),
        GameState::Round => Box::new(RoundScreen),
        GameState::ShowResults => Box::new(ResultsScreen),
        GameState::GetName => Box::new(NameEntryScreen),
        GameState::Leaderboard => Box::new(LeaderboardScreen),
    }
}
