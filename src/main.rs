use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin, stdout, BufReader},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};
use tracing::Level;
use vibebox::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    error::GameError,
    game::{Flow, Game, Regime},
    history::RoundLog,
    leaderboard::{FileLeaderboardStore, Leaderboard, LeaderboardTable, MAX_ENTRIES},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::RoundLength,
    ui,
    vision::{HandSource, LandmarkStream, PointerHands},
};

/// punch targets with your fists, tracked by a camera or driven by the mouse
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A gesture-controlled target punching game. Hand landmarks come from an external tracker as JSON lines; without one the mouse pointer plays the right fist."
)]
pub struct Cli {
    /// JSON-lines landmark feed (file or FIFO, `-` for stdin); mouse play when omitted
    #[clap(short = 'l', long)]
    landmarks: Option<PathBuf>,

    /// leaderboard file to read and write
    #[clap(long)]
    leaderboard: Option<PathBuf>,

    /// milliseconds to wait for input before advancing a frame
    #[clap(long)]
    poll_ms: Option<u64>,

    /// per-hand cooldown between hits, in milliseconds
    #[clap(long)]
    cooldown_ms: Option<u64>,

    /// where to write the log
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,

    /// print the leaderboard and exit
    #[clap(long)]
    print_scores: bool,
}

impl Cli {
    /// Apply command line overrides on top of the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(ms) = self.poll_ms {
            cfg.poll_timeout_ms = ms;
        }
        if let Some(ms) = self.cooldown_ms {
            cfg.cooldown_ms = ms;
        }
        cfg
    }

    fn leaderboard_path(&self) -> PathBuf {
        self.leaderboard
            .clone()
            .unwrap_or_else(AppDirs::leaderboard_path)
    }

    fn landmarks_from_stdin(&self) -> bool {
        self.landmarks.as_deref() == Some(Path::new("-"))
    }
}

fn init_logging(path: &Path, verbose: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

fn format_scores(table: &LeaderboardTable) -> String {
    let mut out = String::new();
    for len in RoundLength::ALL {
        out.push_str(&format!("{} Seconds\n", len.secs()));
        let entries = table.entries(len);
        for rank in 0..MAX_ENTRIES {
            match entries.get(rank) {
                Some(e) => out.push_str(&format!("{}. {} - {}\n", rank + 1, e.name, e.score)),
                None => out.push_str(&format!("{}. ---\n", rank + 1)),
            }
        }
    }
    out
}

fn open_hands(cli: &Cli, cfg: &Config) -> Result<Box<dyn HandSource>, GameError> {
    let (w, h) = (cfg.frame_width, cfg.frame_height);
    match &cli.landmarks {
        None => Ok(Box::new(PointerHands::new(w, h))),
        Some(_) if cli.landmarks_from_stdin() => Ok(Box::new(LandmarkStream::spawn(
            BufReader::new(stdin()),
            w,
            h,
        ))),
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                GameError::InputDeviceUnavailable(format!("{}: {}", path.display(), e))
            })?;
            Ok(Box::new(LandmarkStream::spawn(BufReader::new(file), w, h)))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(e) = init_logging(&log_path, cli.verbose) {
        eprintln!("logging disabled, cannot open {}: {}", log_path.display(), e);
    }

    let cfg = cli.apply(FileConfigStore::new().load());
    let store = FileLeaderboardStore::with_path(cli.leaderboard_path());
    let leaderboard = Leaderboard::load(Box::new(store));

    if cli.print_scores {
        print!("{}", format_scores(leaderboard.table()));
        return Ok(());
    }

    // The landmark feed may own stdin, in which case crossterm falls back to /dev/tty.
    let interactive = if cli.landmarks_from_stdin() {
        stdout().is_tty()
    } else {
        stdin().is_tty()
    };
    if !interactive {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let hands = match open_hands(&cli, &cfg) {
        Ok(h) => h,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, e.to_string()).exit();
        }
    };

    tracing::info!(?cfg, "starting");

    let game = Game::new(&cfg, leaderboard);
    let mut app = App::new(game, hands, (cfg.frame_width, cfg.frame_height))
        .with_round_log(RoundLog::with_path(AppDirs::history_path()));
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(cfg.poll_timeout()),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen,
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        tracing::error!("session aborted: {}", e);
    }
    tracing::info!("exiting");
    res
}

fn start_tui<B, H, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App<H>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    H: HandSource,
    E: EventSource,
    T: Ticker,
{
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let event = match app.game.regime() {
            Regime::Polling => runner.step(),
            Regime::Blocking => match runner.wait() {
                Some(ev) => ev,
                None => break,
            },
        };

        if app.on_event(event, Instant::now()) == Flow::Quit {
            break;
        }
    }

    Ok(())
}
