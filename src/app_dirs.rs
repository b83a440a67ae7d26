use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("vibebox"),
            )
        } else {
            ProjectDirs::from("", "", "vibebox").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn leaderboard_path() -> PathBuf {
        Self::in_state_dir("high_scores.json")
    }

    pub fn history_path() -> PathBuf {
        Self::in_state_dir("rounds.csv")
    }

    pub fn log_path() -> PathBuf {
        Self::in_state_dir("vibebox.log")
    }

    fn in_state_dir(file: &str) -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join(file))
            .unwrap_or_else(|| PathBuf::from(file))
    }
}
