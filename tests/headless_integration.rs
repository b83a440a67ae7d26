use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use vibebox::app::App;
use vibebox::config::Config;
use vibebox::game::{Flow, Game, GameState, Regime};
use vibebox::history::RoundLog;
use vibebox::leaderboard::{FileLeaderboardStore, Leaderboard};
use vibebox::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use vibebox::session::RoundLength;
use vibebox::vision::{HandSource, LandmarkStream, PointerHands};

fn key(code: KeyCode) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Headless session using the internal runtime without a TTY: the pointer
// chases the target for a whole short round, then the score is saved.
#[test]
fn headless_round_is_played_and_saved() {
    let dir = tempdir().unwrap();
    let board_path = dir.path().join("high_scores.json");
    let cfg = Config::default();

    let store = FileLeaderboardStore::with_path(&board_path);
    let game = Game::new(&cfg, Leaderboard::load(Box::new(store))).with_seed(11);
    let mut app = App::new(
        game,
        PointerHands::new(cfg.frame_width, cfg.frame_height),
        (cfg.frame_width, cfg.frame_height),
    )
    .with_round_log(RoundLog::with_path(dir.path().join("rounds.csv")));

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(key(KeyCode::Char('s'))).unwrap();
    tx.send(key(KeyCode::Char('1'))).unwrap();

    let t0 = Instant::now();
    let mut now = t0;
    for _ in 0..500u32 {
        let event = match app.game.regime() {
            Regime::Polling => runner.step(),
            Regime::Blocking => break,
        };
        // aim at the current target before the frame is taken
        if let Some(r) = app.game.target().rect() {
            app.hands.on_pointer(
                (r.x + r.width / 2.0) / cfg.frame_width as f64,
                (r.y + r.height / 2.0) / cfg.frame_height as f64,
            );
        }
        now += Duration::from_millis(250);
        assert_eq!(app.on_event(event, now), Flow::Continue);
    }

    assert_eq!(app.game.state(), GameState::ShowResults);
    let score = app.game.session().final_score;
    assert!(score > 0, "the pointer should have landed hits");
    assert!(app.game.session().new_high_score);

    for ev in [
        key(KeyCode::Enter),
        key(KeyCode::Char('A')),
        key(KeyCode::Char('C')),
        key(KeyCode::Char('E')),
        key(KeyCode::Enter),
    ] {
        tx.send(ev).unwrap();
    }
    while app.game.state() != GameState::Leaderboard {
        let event = runner.wait().expect("scripted keys");
        app.on_event(event, now);
    }

    let best = app.game.leaderboard().table().entries(RoundLength::Short)[0].clone();
    assert_eq!(best.name, "ACE");
    assert_eq!(best.score, score);

    // a fresh load sees what was written
    let reloaded = Leaderboard::load(Box::new(FileLeaderboardStore::with_path(&board_path)));
    assert_eq!(reloaded.table().best(RoundLength::Short), Some(score));
    assert!(dir.path().join("rounds.csv").exists());

    tx.send(key(KeyCode::Char('b'))).unwrap();
    let event = runner.step();
    app.on_event(event, now);
    assert_eq!(app.game.state(), GameState::Title);

    assert_eq!(app.on_event(key(KeyCode::Char('q')), now), Flow::Quit);
}

#[test]
fn headless_round_ends_by_time_without_hits() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let store = FileLeaderboardStore::with_path(dir.path().join("hs.json"));
    let game = Game::new(&cfg, Leaderboard::load(Box::new(store)));
    let mut app = App::new(
        game,
        PointerHands::new(cfg.frame_width, cfg.frame_height),
        (cfg.frame_width, cfg.frame_height),
    );

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let t0 = Instant::now();
    app.on_event(key(KeyCode::Char('s')), t0);
    app.on_event(key(KeyCode::Char('2')), t0);
    assert_eq!(app.game.state(), GameState::Round);

    for step in 1..=70u64 {
        if let GameEvent::Tick = runner.step() {
            app.on_event(GameEvent::Tick, t0 + Duration::from_secs(step));
        }
        if app.game.state() != GameState::Round {
            break;
        }
    }

    assert_eq!(app.game.state(), GameState::ShowResults);
    assert_eq!(app.game.session().final_score, 0);
    // any score earns a slot while the list has room
    assert!(app.game.session().new_high_score);

    // an empty name throws the score away
    app.on_event(key(KeyCode::Enter), t0 + Duration::from_secs(71));
    assert_eq!(app.game.state(), GameState::GetName);
    app.on_event(key(KeyCode::Enter), t0 + Duration::from_secs(72));
    assert_eq!(app.game.state(), GameState::Title);
    assert_eq!(app.game.leaderboard().table().best(RoundLength::Long), None);
    assert!(!dir.path().join("hs.json").exists());
}

// A recorded feed read from a file runs dry long before the round is over.
// Menus must not eat its frames, and the clock must keep going once it ends.
#[test]
fn headless_file_feed_reaching_eof_still_ends_round() {
    let dir = tempdir().unwrap();
    let cfg = Config::default();
    let store = FileLeaderboardStore::with_path(dir.path().join("hs.json"));
    let game = Game::new(&cfg, Leaderboard::load(Box::new(store))).with_seed(3);

    let feed: String = (0..50)
        .map(|_| "{\"width\":640,\"height\":480,\"hands\":[]}\n")
        .collect();
    let stream = LandmarkStream::spawn(std::io::Cursor::new(feed), cfg.frame_width, cfg.frame_height);
    let mut app = App::new(game, stream, (cfg.frame_width, cfg.frame_height));

    let t0 = Instant::now();
    for i in 0..20u64 {
        app.on_event(GameEvent::Tick, t0 + Duration::from_millis(i));
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!app.hands.is_exhausted(), "title screen must not drain the feed");

    app.on_event(key(KeyCode::Char('s')), t0);
    app.on_event(key(KeyCode::Char('1')), t0);
    assert_eq!(app.game.state(), GameState::Round);
    assert_eq!(app.frame_size, (640, 480));
    assert!(app.game.target().rect().unwrap().contained_in(640.0, 480.0));

    for step in 1..=200u64 {
        app.on_event(GameEvent::Tick, t0 + Duration::from_secs(step));
        if app.game.state() != GameState::Round {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    assert!(app.hands.is_exhausted());
    assert_eq!(app.game.state(), GameState::ShowResults);
    assert_eq!(app.game.session().final_score, 0);
    assert_eq!(app.game.session().remaining, Duration::ZERO);
}
