//! The session engine: six screens sequenced by an explicit transition
//! table, with per-frame hit detection while a round is running.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::hits::{Hands, Hit, HitDetector};
use crate::leaderboard::Leaderboard;
use crate::name_input::NameInput;
use crate::session::{GameSession, RoundLength};
use crate::target::Target;
use crate::vision::VisionFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GameState {
    Title,
    SelectDuration,
    Round,
    ShowResults,
    GetName,
    Leaderboard,
}

/// How the host loop waits for input in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Bounded wait, then advance a frame whether or not a command came in
    Polling,
    /// Block until one command arrives; clock and hand tracking are frozen
    Blocking,
}

impl GameState {
    pub fn regime(self) -> Regime {
        match self {
            GameState::ShowResults | GameState::GetName => Regime::Blocking,
            _ => Regime::Polling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    ViewLeaderboard,
    Choose(RoundLength),
    Confirm,
    Restart,
    Back,
    Char(char),
    Backspace,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Command(Command),
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    None,
    ClearSession,
    StartRound(RoundLength),
    FinishRound,
    ClearName,
    CommitName,
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: GameState,
    pub action: EntryAction,
}

/// Session facts some rows of the table depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guards {
    pub new_high_score: bool,
    pub name_empty: bool,
    pub selected: Option<RoundLength>,
}

fn to(to: GameState, action: EntryAction) -> Option<Transition> {
    Some(Transition { to, action })
}

/// The state table. `None` means the trigger is ignored in `from`.
pub fn transition(from: GameState, trigger: Trigger, guards: Guards) -> Option<Transition> {
    use Command::*;
    use GameState::*;

    match (from, trigger) {
        (Title, Trigger::Command(Start)) => to(SelectDuration, EntryAction::ClearSession),
        (Title, Trigger::Command(ViewLeaderboard)) => to(Leaderboard, EntryAction::None),
        (SelectDuration, Trigger::Command(Choose(len))) => to(Round, EntryAction::StartRound(len)),
        (Round, Trigger::TimeUp) => to(ShowResults, EntryAction::FinishRound),
        (ShowResults, Trigger::Command(Confirm)) if guards.new_high_score => {
            to(GetName, EntryAction::ClearName)
        }
        (ShowResults, Trigger::Command(Confirm)) => to(Title, EntryAction::ClearSession),
        (ShowResults, Trigger::Command(Restart)) => guards
            .selected
            .and_then(|len| to(Round, EntryAction::StartRound(len))),
        (Leaderboard, Trigger::Command(Back)) => to(Title, EntryAction::ClearSession),
        (GetName, Trigger::Command(Confirm)) if guards.name_empty => {
            to(Title, EntryAction::Discard)
        }
        (GetName, Trigger::Command(Confirm)) => to(Leaderboard, EntryAction::CommitName),
        _ => None,
    }
}

/// Summary of a round that just ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub length: RoundLength,
    pub score: u32,
    pub new_high_score: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameOutcome {
    pub hit: Option<Hit>,
    pub finished: Option<RoundSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything one play session mutates, owned in one place.
pub struct Game {
    state: GameState,
    session: GameSession,
    target: Target,
    hands: Hands,
    detector: HitDetector,
    marker_radius: f64,
    name: NameInput,
    leaderboard: Leaderboard,
    rng: StdRng,
}

impl Game {
    pub fn new(config: &Config, leaderboard: Leaderboard) -> Self {
        Self {
            state: GameState::Title,
            session: GameSession::default(),
            target: Target::new(config.target_size),
            hands: Hands::default(),
            detector: HitDetector::new(config.collision_radius(), config.cooldown()),
            marker_radius: config.marker_radius,
            name: NameInput::default(),
            leaderboard,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic target placement, for tests and replays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn regime(&self) -> Regime {
        self.state.regime()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn hands(&self) -> &Hands {
        &self.hands
    }

    /// Radius of the drawn hand marker; hits use a larger radius.
    pub fn marker_radius(&self) -> f64 {
        self.marker_radius
    }

    pub fn name(&self) -> &NameInput {
        &self.name
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    fn guards(&self) -> Guards {
        Guards {
            new_high_score: self.session.new_high_score,
            name_empty: self.name.is_empty(),
            selected: self.session.selected,
        }
    }

    /// Apply one discrete command. Quit is honoured in every state.
    pub fn handle(&mut self, cmd: Command, now: Instant) -> Flow {
        match (self.state, cmd) {
            (_, Command::Quit) => {
                tracing::info!("quit requested in {}", self.state);
                return Flow::Quit;
            }
            (GameState::GetName, Command::Char(c)) => {
                self.name.push(c);
            }
            (GameState::GetName, Command::Backspace) => self.name.backspace(),
            _ => {
                self.fire(Trigger::Command(cmd), now);
            }
        }
        Flow::Continue
    }

    /// Advance one captured frame. Only a running round does anything here.
    pub fn tick(&mut self, frame: &VisionFrame, now: Instant) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();
        if self.state != GameState::Round {
            return outcome;
        }

        // first frame of the round, or the frame shrank under the target
        if !self.target.fits_in(frame.width, frame.height) {
            self.target.relocate(frame.width, frame.height, &mut self.rng);
        }
        self.session.advance_clock(now);
        self.hands.sample(frame.strike_positions());

        if let Some(rect) = self.target.rect() {
            if let Some(hit) = self.detector.detect(&mut self.hands, rect, now) {
                self.target.register_hit();
                self.session.hit_count = self.session.hit_count.saturating_add(1);
                self.target.relocate(frame.width, frame.height, &mut self.rng);
                tracing::info!(
                    "target hit by {} hand, {} so far",
                    hit.slot,
                    self.session.hit_count
                );
                outcome.hit = Some(hit);
            }
        }

        if self.session.time_is_up() && self.fire(Trigger::TimeUp, now) {
            outcome.finished = self.session.selected.map(|length| RoundSummary {
                length,
                score: self.session.final_score,
                new_high_score: self.session.new_high_score,
            });
        }
        outcome
    }

    fn fire(&mut self, trigger: Trigger, now: Instant) -> bool {
        match transition(self.state, trigger, self.guards()) {
            Some(t) => {
                self.enter(t, now);
                true
            }
            None => false,
        }
    }

    fn enter(&mut self, t: Transition, now: Instant) {
        if t.action == EntryAction::CommitName {
            if let Some(len) = self.session.selected {
                self.leaderboard
                    .commit(len, self.name.as_str(), self.session.final_score);
            }
        }

        // nothing from the previous screen survives an entry
        self.hands.reset();
        self.target.reset();
        self.name.clear();
        self.session.new_high_score = false;

        match t.action {
            EntryAction::ClearSession => self.session.clear(),
            EntryAction::Discard => {
                tracing::info!("empty name, high score discarded");
                self.session.clear();
            }
            EntryAction::StartRound(len) => {
                tracing::info!("starting {} round", len);
                self.session.start_round(len, now);
            }
            EntryAction::FinishRound => {
                self.session.final_score = self.session.hit_count;
                if let Some(len) = self.session.selected {
                    self.session.new_high_score =
                        self.leaderboard.qualifies(len, self.session.final_score);
                }
                tracing::info!(
                    "time's up, final score {} (high score: {})",
                    self.session.final_score,
                    self.session.new_high_score
                );
            }
            EntryAction::None | EntryAction::ClearName | EntryAction::CommitName => {}
        }

        tracing::debug!("{} -> {}", self.state, t.to);
        self.state = t.to;
    }

    #[cfg(test)]
    pub(crate) fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::hits::HandSlot;
    use crate::leaderboard::{FileLeaderboardStore, HighScoreEntry, LeaderboardStore, LeaderboardTable};
    use crate::vision::{Detection, Landmark, HAND_LANDMARKS, MIDDLE_MCP};
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    const W: u32 = 1280;
    const H: u32 = 720;

    fn game_in(dir: &TempDir) -> Game {
        let store = FileLeaderboardStore::with_path(dir.path().join("high_scores.json"));
        Game::new(&Config::default(), Leaderboard::load(Box::new(store))).with_seed(11)
    }

    fn hand(label: &str, at: Point) -> Detection {
        let mut landmarks = vec![None; HAND_LANDMARKS];
        landmarks[MIDDLE_MCP] = Some(Landmark {
            x: at.x / W as f64,
            y: at.y / H as f64,
        });
        Detection {
            label: label.to_string(),
            landmarks,
        }
    }

    fn frame(hands: Vec<Detection>) -> VisionFrame {
        VisionFrame {
            width: W,
            height: H,
            hands,
        }
    }

    fn start_round(game: &mut Game, len: RoundLength, now: Instant) {
        game.handle(Command::Start, now);
        game.handle(Command::Choose(len), now);
        assert_eq!(game.state(), GameState::Round);
    }

    /// A frame with the right fist on the middle of the current target.
    fn punch(game: &Game) -> VisionFrame {
        let r = game.target().rect().unwrap();
        frame(vec![hand(
            "Right",
            Point::new(r.x + r.width / 2.0, r.y + r.height / 2.0),
        )])
    }

    #[test]
    fn test_transition_table() {
        let g = Guards {
            new_high_score: false,
            name_empty: true,
            selected: Some(RoundLength::Short),
        };
        let cmd = |c| Trigger::Command(c);

        assert_matches!(
            transition(GameState::Title, cmd(Command::Start), g),
            Some(Transition { to: GameState::SelectDuration, .. })
        );
        assert_matches!(
            transition(GameState::Title, cmd(Command::ViewLeaderboard), g),
            Some(Transition { to: GameState::Leaderboard, .. })
        );
        assert_eq!(
            transition(GameState::SelectDuration, cmd(Command::Choose(RoundLength::Long)), g),
            Some(Transition {
                to: GameState::Round,
                action: EntryAction::StartRound(RoundLength::Long)
            })
        );
        assert_matches!(
            transition(GameState::Round, Trigger::TimeUp, g),
            Some(Transition { to: GameState::ShowResults, action: EntryAction::FinishRound })
        );
        assert_matches!(
            transition(GameState::ShowResults, cmd(Command::Confirm), g),
            Some(Transition { to: GameState::Title, .. })
        );
        assert_matches!(
            transition(
                GameState::ShowResults,
                cmd(Command::Confirm),
                Guards { new_high_score: true, ..g }
            ),
            Some(Transition { to: GameState::GetName, .. })
        );
        assert_eq!(
            transition(GameState::ShowResults, cmd(Command::Restart), g),
            Some(Transition {
                to: GameState::Round,
                action: EntryAction::StartRound(RoundLength::Short)
            })
        );
        assert_matches!(
            transition(GameState::Leaderboard, cmd(Command::Back), g),
            Some(Transition { to: GameState::Title, .. })
        );
        assert_matches!(
            transition(GameState::GetName, cmd(Command::Confirm), g),
            Some(Transition { to: GameState::Title, action: EntryAction::Discard })
        );
        assert_matches!(
            transition(
                GameState::GetName,
                cmd(Command::Confirm),
                Guards { name_empty: false, ..g }
            ),
            Some(Transition { to: GameState::Leaderboard, action: EntryAction::CommitName })
        );
    }

    #[test]
    fn test_unlisted_triggers_are_ignored() {
        let g = Guards {
            new_high_score: true,
            name_empty: false,
            selected: None,
        };
        assert_eq!(transition(GameState::Title, Trigger::TimeUp, g), None);
        assert_eq!(
            transition(GameState::Round, Trigger::Command(Command::Confirm), g),
            None
        );
        assert_eq!(
            transition(GameState::Leaderboard, Trigger::Command(Command::Start), g),
            None
        );
        assert_eq!(
            transition(GameState::ShowResults, Trigger::Command(Command::Restart), g),
            None
        );
    }

    #[test]
    fn test_regimes() {
        assert_eq!(GameState::Round.regime(), Regime::Polling);
        assert_eq!(GameState::Title.regime(), Regime::Polling);
        assert_eq!(GameState::ShowResults.regime(), Regime::Blocking);
        assert_eq!(GameState::GetName.regime(), Regime::Blocking);
    }

    #[test]
    fn test_quit_from_every_state() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let now = Instant::now();
        assert_eq!(game.handle(Command::Quit, now), Flow::Quit);
        start_round(&mut game, RoundLength::Short, now);
        assert_eq!(game.handle(Command::Quit, now), Flow::Quit);
        assert_eq!(game.state(), GameState::Round);
    }

    #[test]
    fn test_first_round_frame_places_target() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        assert!(!game.target().is_placed());

        game.tick(&frame(vec![]), t0);
        let rect = game.target().rect().unwrap();
        assert!(rect.contained_in(W as f64, H as f64));
        assert_eq!(game.target().damage_stage(), 1);
    }

    #[test]
    fn test_smaller_frame_moves_target_back_inside() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0);
        game.target_mut().place_at(Point::new(1000.0, 400.0));

        let small = VisionFrame::empty(640, 480);
        let out = game.tick(&small, t0 + Duration::from_millis(30));

        assert!(out.hit.is_none());
        assert!(game.target().rect().unwrap().contained_in(640.0, 480.0));
        assert_eq!(game.target().hits_this_round(), 0);
        assert_eq!(game.session().hit_count, 0);
    }

    #[test]
    fn test_hit_near_corner_registers_and_relocates() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0);
        game.target_mut().place_at(Point::new(100.0, 100.0));

        let out = game.tick(&frame(vec![hand("Right", Point::new(95.0, 95.0))]), t0);

        assert_matches!(out.hit, Some(Hit { slot: HandSlot::Right, .. }));
        assert_eq!(game.session().hit_count, 1);
        assert_eq!(game.target().hits_this_round(), 1);
        assert_eq!(game.target().damage_stage(), 1);
        assert!(game.target().rect().unwrap().contained_in(W as f64, H as f64));
    }

    #[test]
    fn test_one_hit_per_frame_with_both_hands_on_target() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0);

        let r = game.target().rect().unwrap();
        let c = Point::new(r.x + 10.0, r.y + 10.0);
        let out = game.tick(&frame(vec![hand("Left", c), hand("Right", c)]), t0);

        assert_matches!(out.hit, Some(Hit { slot: HandSlot::Right, .. }));
        assert_eq!(game.session().hit_count, 1);
    }

    #[test]
    fn test_cooldown_spans_relocations() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0);

        let f = punch(&game);
        assert!(game.tick(&f, t0).hit.is_some());
        let f = punch(&game);
        assert!(game.tick(&f, t0 + Duration::from_millis(150)).hit.is_none());
        let f = punch(&game);
        assert!(game.tick(&f, t0 + Duration::from_millis(250)).hit.is_some());
        assert_eq!(game.session().hit_count, 2);
    }

    #[test]
    fn test_damage_stage_follows_round_hits() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Long, t0);
        game.tick(&frame(vec![]), t0);

        for i in 1..=12u64 {
            let f = punch(&game);
            game.tick(&f, t0 + Duration::from_millis(300 * i));
        }
        assert_eq!(game.session().hit_count, 12);
        assert_eq!(game.target().damage_stage(), 3);
    }

    #[test]
    fn test_round_ends_when_time_runs_out() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Long, t0);
        game.tick(&frame(vec![]), t0);
        let f = punch(&game);
        game.tick(&f, t0 + Duration::from_secs(1));

        let out = game.tick(&frame(vec![]), t0 + Duration::from_secs(59));
        assert!(out.finished.is_none());
        assert_eq!(game.session().remaining, Duration::from_secs(1));

        let out = game.tick(&frame(vec![]), t0 + Duration::from_secs(60));
        assert_eq!(game.state(), GameState::ShowResults);
        assert_eq!(game.session().remaining, Duration::ZERO);
        assert_eq!(game.session().final_score, 1);
        assert_eq!(
            out.finished,
            Some(RoundSummary {
                length: RoundLength::Long,
                score: 1,
                new_high_score: true
            })
        );
    }

    #[test]
    fn test_ticks_outside_round_are_idle() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let now = Instant::now();
        let f = frame(vec![hand("Right", Point::new(10.0, 10.0))]);
        assert_eq!(game.tick(&f, now), FrameOutcome::default());
        assert_eq!(game.hands(), &Hands::default());
        assert!(!game.target().is_placed());
    }

    #[test]
    fn test_entering_a_state_resets_round_state() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0);
        let f = punch(&game);
        game.tick(&f, t0);
        assert!(game.hands().get(HandSlot::Right).last_hit.is_some());

        game.tick(&frame(vec![]), t0 + Duration::from_secs(30));
        assert_eq!(game.state(), GameState::ShowResults);
        assert_eq!(game.hands(), &Hands::default());
        assert!(!game.target().is_placed());
        assert_eq!(game.target().hits_this_round(), 0);
        assert_eq!(game.target().damage_stage(), 1);

        // restart keeps the length and zeroes the counters
        game.handle(Command::Restart, t0 + Duration::from_secs(31));
        assert_eq!(game.state(), GameState::Round);
        assert_eq!(game.session().selected, Some(RoundLength::Short));
        assert_eq!(game.session().hit_count, 0);
        assert_eq!(game.session().remaining, Duration::from_secs(30));
    }

    #[test]
    fn test_high_score_flow_commits_and_persists() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0);
        let f = punch(&game);
        game.tick(&f, t0);
        game.tick(&frame(vec![]), t0 + Duration::from_secs(30));
        assert!(game.session().new_high_score);

        game.handle(Command::Confirm, t0);
        assert_eq!(game.state(), GameState::GetName);
        assert!(game.name().is_empty());
        for c in "JO".chars() {
            game.handle(Command::Char(c), t0);
        }
        game.handle(Command::Char('X'), t0);
        game.handle(Command::Backspace, t0);
        game.handle(Command::Confirm, t0);

        assert_eq!(game.state(), GameState::Leaderboard);
        assert!(game.name().is_empty());
        let entries = game.leaderboard().table().entries(RoundLength::Short);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "JO");
        assert_eq!(entries[0].score, 1);

        let on_disk = FileLeaderboardStore::with_path(dir.path().join("high_scores.json")).load();
        assert_eq!(&on_disk, game.leaderboard().table());

        game.handle(Command::Back, t0);
        assert_eq!(game.state(), GameState::Title);
    }

    #[test]
    fn test_empty_name_discards() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        game.tick(&frame(vec![]), t0 + Duration::from_secs(30));
        game.handle(Command::Confirm, t0);
        assert_eq!(game.state(), GameState::GetName);

        game.handle(Command::Confirm, t0);
        assert_eq!(game.state(), GameState::Title);
        assert!(game
            .leaderboard()
            .table()
            .entries(RoundLength::Short)
            .is_empty());
        assert_eq!(game.session(), &GameSession::default());
    }

    #[test]
    fn test_non_qualifying_score_returns_to_title() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("high_scores.json");
        let mut table = LeaderboardTable::default();
        for s in [50, 40, 30, 20, 10] {
            table.insert(RoundLength::Short, HighScoreEntry::new("P", s));
        }
        FileLeaderboardStore::with_path(&path).save(&table).unwrap();

        let mut game = game_in(&dir);
        let t0 = Instant::now();
        start_round(&mut game, RoundLength::Short, t0);
        let out = game.tick(&frame(vec![]), t0 + Duration::from_secs(30));
        assert_matches!(out.finished, Some(RoundSummary { new_high_score: false, score: 0, .. }));

        game.handle(Command::Confirm, t0);
        assert_eq!(game.state(), GameState::Title);
    }

    #[test]
    fn test_chars_outside_name_entry_do_nothing() {
        let dir = tempdir().unwrap();
        let mut game = game_in(&dir);
        let now = Instant::now();
        game.handle(Command::Char('a'), now);
        game.handle(Command::Backspace, now);
        assert_eq!(game.state(), GameState::Title);
        assert!(game.name().is_empty());
    }
}
