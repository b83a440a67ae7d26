use std::time::{Duration, Instant};

/// Supported round lengths. Persisted keys are the length in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
pub enum RoundLength {
    #[strum(serialize = "30s")]
    Short,
    #[strum(serialize = "60s")]
    Long,
}

impl RoundLength {
    pub const ALL: [RoundLength; 2] = [RoundLength::Short, RoundLength::Long];

    pub fn secs(self) -> u64 {
        match self {
            RoundLength::Short => 30,
            RoundLength::Long => 60,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.secs())
    }

    pub fn key(self) -> String {
        self.secs().to_string()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|len| len.key() == key)
    }

    /// Menu key used to pick this length
    pub fn menu_char(self) -> char {
        match self {
            RoundLength::Short => '1',
            RoundLength::Long => '2',
        }
    }

    pub fn from_menu_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|len| len.menu_char() == c)
    }
}

/// Counters and clock for the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSession {
    pub selected: Option<RoundLength>,
    pub started_at: Option<Instant>,
    pub remaining: Duration,
    pub hit_count: u32,
    pub final_score: u32,
    pub new_high_score: bool,
}

impl GameSession {
    pub fn clear(&mut self) {
        *self = GameSession::default();
    }

    pub fn start_round(&mut self, len: RoundLength, now: Instant) {
        self.selected = Some(len);
        self.started_at = Some(now);
        self.remaining = len.duration();
        self.hit_count = 0;
        self.final_score = 0;
    }

    /// Recompute the remaining time; clamps at zero.
    pub fn advance_clock(&mut self, now: Instant) -> Duration {
        if let (Some(len), Some(start)) = (self.selected, self.started_at) {
            self.remaining = len
                .duration()
                .saturating_sub(now.saturating_duration_since(start));
        }
        self.remaining
    }

    pub fn time_is_up(&self) -> bool {
        self.started_at.is_some() && self.remaining.is_zero()
    }
}
