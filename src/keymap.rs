use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Command, GameState};
use crate::session::RoundLength;

/// Translate a key press into the command it means on the current screen.
///
/// `q` quits everywhere except name entry, where it is just a letter and
/// Esc quits instead. Ctrl-C always quits.
pub fn command_for(state: GameState, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match state {
        GameState::GetName => match key.code {
            KeyCode::Enter => Some(Command::Confirm),
            KeyCode::Backspace => Some(Command::Backspace),
            KeyCode::Esc => Some(Command::Quit),
            KeyCode::Char(c) => Some(Command::Char(c)),
            _ => None,
        },
        _ if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) => Some(Command::Quit),
        GameState::Title => match key.code {
            KeyCode::Char('s') => Some(Command::Start),
            KeyCode::Char('l') => Some(Command::ViewLeaderboard),
            _ => None,
        },
        GameState::SelectDuration => match key.code {
            KeyCode::Char(c) => RoundLength::from_menu_char(c).map(Command::Choose),
            _ => None,
        },
        GameState::Round => None,
        GameState::ShowResults => match key.code {
            KeyCode::Enter => Some(Command::Confirm),
            KeyCode::Char('r') => Some(Command::Restart),
            _ => None,
        },
        GameState::Leaderboard => match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => Some(Command::Back),
            _ => None,
        },
    }
}
