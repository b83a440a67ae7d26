use std::time::Instant;

use ratatui::layout::Rect as Area;

use crate::game::{FrameOutcome, Flow, Game, GameState, Regime};
use crate::history::RoundLog;
use crate::keymap::command_for;
use crate::runtime::GameEvent;
use crate::vision::{HandSource, VisionFrame};

/// Host-side state around the engine: where hands come from, where rounds
/// are logged, and where the arena was last drawn.
pub struct App<H: HandSource> {
    pub game: Game,
    pub hands: H,
    pub round_log: Option<RoundLog>,
    /// Terminal area the arena occupied on the last draw
    pub arena: Option<Area>,
    pub frame_size: (u32, u32),
    feed_lost: bool,
}

impl<H: HandSource> App<H> {
    pub fn new(game: Game, hands: H, frame_size: (u32, u32)) -> Self {
        Self {
            game,
            hands,
            round_log: None,
            arena: None,
            frame_size,
            feed_lost: false,
        }
    }

    pub fn with_round_log(mut self, log: RoundLog) -> Self {
        self.round_log = Some(log);
        self
    }

    /// Feed one runtime event through. In the polling regime every event
    /// is followed by a frame.
    pub fn on_event(&mut self, event: GameEvent, now: Instant) -> Flow {
        let polling = self.game.regime() == Regime::Polling;

        match event {
            GameEvent::Key(key) => {
                if let Some(cmd) = command_for(self.game.state(), key) {
                    if self.game.handle(cmd, now) == Flow::Quit {
                        return Flow::Quit;
                    }
                }
            }
            GameEvent::Pointer { column, row } => self.on_pointer(column, row),
            GameEvent::Resize | GameEvent::Tick => {}
        }

        if polling {
            self.advance_frame(now);
        }
        Flow::Continue
    }

    /// Pull a frame from the tracker and run it through the engine. Frames
    /// are only consumed during a round. A missing frame leaves everything as
    /// it was, unless the tracker is gone for good, in which case the round
    /// keeps running on empty frames until time is up.
    pub fn advance_frame(&mut self, now: Instant) -> Option<FrameOutcome> {
        if self.game.state() != GameState::Round {
            return None;
        }
        let frame = match self.hands.read_frame() {
            Some(frame) => frame,
            None if self.hands.is_exhausted() => {
                if !self.feed_lost {
                    tracing::warn!("hand tracker closed, no more hands this session");
                    self.feed_lost = true;
                }
                VisionFrame::empty(self.frame_size.0, self.frame_size.1)
            }
            None => return None,
        };
        self.frame_size = (frame.width, frame.height);
        let outcome = self.game.tick(&frame, now);

        if let (Some(summary), Some(log)) = (outcome.finished, &self.round_log) {
            if let Err(e) = log.record(&summary) {
                tracing::warn!("could not log round: {}", e);
            }
        }
        Some(outcome)
    }

    fn on_pointer(&mut self, column: u16, row: u16) {
        let Some(area) = self.arena else {
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }
        let x = (column.saturating_sub(area.x) as f64 + 0.5) / area.width as f64;
        let y = (row.saturating_sub(area.y) as f64 + 0.5) / area.height as f64;
        self.hands.on_pointer(x, y);
    }
}
