//! Persisted high-score tables, one ranked list per round length.
//!
//! On disk the table is a JSON object keyed by the round length in seconds:
//!
//! ```json
//! { "30": [ { "name": "ABC", "score": 42 } ], "60": [] }
//! ```
//!
//! Loading is forgiving: records that fail validation are skipped one at a
//! time, so a single bad entry never costs the rest of the table.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GameError;
use crate::session::RoundLength;

pub const MAX_ENTRIES: usize = 5;
pub const MAX_NAME_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Local>>,
}

impl HighScoreEntry {
    pub fn new(name: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            score,
            recorded_at: None,
        }
    }

    /// Validate one persisted record.
    fn from_value(key: &str, value: &Value) -> Result<Self, GameError> {
        let obj = value
            .as_object()
            .ok_or_else(|| GameError::malformed(key, format!("not an object: {}", value)))?;

        let name = match obj.get("name") {
            Some(Value::String(s)) => s.chars().take(MAX_NAME_LEN).collect::<String>(),
            Some(other) => return Err(GameError::malformed(key, format!("bad name {}", other))),
            None => return Err(GameError::malformed(key, "missing name")),
        };

        let score = match obj.get("score") {
            // floats keep their whole part
            Some(Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            }),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            Some(_) => None,
            None => return Err(GameError::malformed(key, "missing score")),
        }
        .and_then(|s| u32::try_from(s).ok())
        .ok_or_else(|| GameError::malformed(key, format!("invalid score in {}", value)))?;

        let recorded_at = obj
            .get("recorded_at")
            .and_then(|v| serde_json::from_value::<DateTime<Local>>(v.clone()).ok());

        Ok(Self {
            name,
            score,
            recorded_at,
        })
    }
}

/// Ranked entries for every supported round length, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardTable {
    lists: BTreeMap<RoundLength, Vec<HighScoreEntry>>,
}

impl Default for LeaderboardTable {
    fn default() -> Self {
        Self {
            lists: RoundLength::ALL.iter().map(|&len| (len, Vec::new())).collect(),
        }
    }
}

impl LeaderboardTable {
    pub fn entries(&self, len: RoundLength) -> &[HighScoreEntry] {
        self.lists.get(&len).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn best(&self, len: RoundLength) -> Option<u32> {
        self.entries(len).first().map(|e| e.score)
    }

    /// A score earns a slot if the list has room or it beats the current last place.
    pub fn qualifies(&self, len: RoundLength, score: u32) -> bool {
        let entries = self.entries(len);
        entries.len() < MAX_ENTRIES || entries.last().map_or(true, |last| score > last.score)
    }

    /// Append, stable sort best-first, and truncate. Equal scores keep insertion order.
    pub fn insert(&mut self, len: RoundLength, entry: HighScoreEntry) {
        let list = self.lists.entry(len).or_default();
        list.push(entry);
        list.sort_by(|a, b| b.score.cmp(&a.score));
        list.truncate(MAX_ENTRIES);
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        let map = self
            .lists
            .iter()
            .map(|(len, entries)| Ok((len.key(), serde_json::to_value(entries)?)))
            .collect::<Result<Map<String, Value>, serde_json::Error>>()?;
        Ok(Value::Object(map))
    }

    /// Build a table from parsed JSON, skipping whatever does not validate.
    /// Returns the skipped problems alongside the table.
    pub fn from_json(root: &Value) -> (Self, Vec<GameError>) {
        let mut table = Self::default();
        let mut problems = Vec::new();

        let Some(obj) = root.as_object() else {
            problems.push(GameError::malformed("<root>", "expected an object"));
            return (table, problems);
        };

        for (key, value) in obj {
            let Some(len) = RoundLength::from_key(key) else {
                problems.push(GameError::malformed(key.as_str(), "unknown round length"));
                continue;
            };
            let Some(records) = value.as_array() else {
                problems.push(GameError::malformed(key.as_str(), "expected a list"));
                continue;
            };

            let valid = records
                .iter()
                .filter_map(|rec| match HighScoreEntry::from_value(key, rec) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        problems.push(e);
                        None
                    }
                })
                .sorted_by(|a, b| b.score.cmp(&a.score))
                .take(MAX_ENTRIES)
                .collect();

            table.lists.insert(len, valid);
        }

        (table, problems)
    }
}

/// Where the table lives between runs.
pub trait LeaderboardStore {
    fn load(&self) -> LeaderboardTable;
    fn save(&self, table: &LeaderboardTable) -> Result<(), GameError>;
}

#[derive(Debug, Clone)]
pub struct FileLeaderboardStore {
    path: PathBuf,
}

impl FileLeaderboardStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Value>, GameError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(GameError::PersistenceRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| GameError::PersistenceRead {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })
    }

    fn write_err(&self, source: io::Error) -> GameError {
        GameError::PersistenceWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl LeaderboardStore for FileLeaderboardStore {
    fn load(&self) -> LeaderboardTable {
        match self.read() {
            Ok(Some(root)) => {
                let (table, problems) = LeaderboardTable::from_json(&root);
                for p in problems {
                    tracing::warn!("{}", p);
                }
                table
            }
            Ok(None) => {
                tracing::info!(
                    "no high score file at {}, starting empty",
                    self.path.display()
                );
                LeaderboardTable::default()
            }
            Err(e) => {
                tracing::error!("{}; using empty high scores", e);
                LeaderboardTable::default()
            }
        }
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn save(&self, table: &LeaderboardTable) -> Result<(), GameError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
            }
        }
        let data = table
            .to_json()
            .and_then(|root| serde_json::to_vec_pretty(&root))
            .map_err(|e| self.write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(|e| self.write_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.write_err(e)
        })
    }
}

/// The in-memory table plus the store it is mirrored to. The table is
/// authoritative: a failed save is logged and play continues.
pub struct Leaderboard {
    table: LeaderboardTable,
    store: Box<dyn LeaderboardStore>,
}

impl Leaderboard {
    pub fn load(store: Box<dyn LeaderboardStore>) -> Self {
        let table = store.load();
        Self { table, store }
    }

    pub fn table(&self) -> &LeaderboardTable {
        &self.table
    }

    pub fn qualifies(&self, len: RoundLength, score: u32) -> bool {
        self.table.qualifies(len, score)
    }

    /// Insert and persist the whole table. Returns whether the save succeeded.
    pub fn commit(&mut self, len: RoundLength, name: &str, score: u32) -> bool {
        let entry = HighScoreEntry {
            name: name.chars().take(MAX_NAME_LEN).collect(),
            score,
            recorded_at: Some(Local::now()),
        };
        self.table.insert(len, entry);

        match self.store.save(&self.table) {
            Ok(()) => {
                tracing::info!("saved {} for {} with {}", name, len, score);
                true
            }
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }
}
