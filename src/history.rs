use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::error::GameError;
use crate::game::RoundSummary;

#[derive(Debug, Serialize)]
struct RoundRow {
    date: String,
    duration_secs: u64,
    score: u32,
    new_high_score: bool,
}

/// Append-only CSV log of finished rounds.
#[derive(Debug, Clone)]
pub struct RoundLog {
    path: PathBuf,
}

impl RoundLog {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn record(&self, summary: &RoundSummary) -> Result<(), GameError> {
        let write_err = |source: std::io::Error| GameError::PersistenceWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(write_err)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        writer
            .serialize(RoundRow {
                date: Local::now().format("%c").to_string(),
                duration_secs: summary.length.secs(),
                score: summary.score,
                new_high_score: summary.new_high_score,
            })
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }
}
