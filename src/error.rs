use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failures the game recovers from (persistence, malformed records) plus the
/// one it cannot (no input device at startup).
#[derive(Debug)]
pub enum GameError {
    PersistenceRead { path: PathBuf, source: io::Error },
    PersistenceWrite { path: PathBuf, source: io::Error },
    MalformedRecord { key: String, reason: String },
    InputDeviceUnavailable(String),
}

impl GameError {
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        GameError::MalformedRecord {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the session engine logs and carries on from.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GameError::InputDeviceUnavailable(_))
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::PersistenceRead { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            GameError::PersistenceWrite { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            GameError::MalformedRecord { key, reason } => {
                write!(f, "malformed leaderboard record under '{}': {}", key, reason)
            }
            GameError::InputDeviceUnavailable(what) => {
                write!(f, "input device unavailable: {}", what)
            }
        }
    }
}

impl Error for GameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GameError::PersistenceRead { source, .. } | GameError::PersistenceWrite { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
