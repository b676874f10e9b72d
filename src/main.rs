use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use jabs::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    keymap::{command_for, Command},
    logging,
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::Session,
    signal::{CompletionSignal, Silent, TerminalBell},
    trainer::Trainer,
    wake_lock::{CommandWakeLock, NoWakeLock, WakeLock},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};

/// boxing combo round timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs up to five three-minute rounds, each showing a random boxing combination that has not come up yet in the session. Rings the terminal bell when a round ends and keeps the display awake while a round is running."
)]
pub struct Cli {
    /// do not ring the bell when a round ends
    #[clap(short = 'm', long)]
    mute: bool,

    /// let the display sleep while a round is running
    #[clap(long)]
    no_keep_awake: bool,

    /// seed for the combination draws, for repeatable sessions
    #[clap(long)]
    seed: Option<u64>,

    /// log file (default: ~/.local/state/jabs/jabs.log); filter with JABS_LOG
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// remember --mute and --no-keep-awake as the new defaults
    #[clap(long)]
    save_config: bool,
}

/// Effective settings: stored defaults, with command line flags on top
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    mute: bool,
    keep_awake: bool,
    inhibitor: Option<Vec<String>>,
}

impl Settings {
    fn resolve(cli: &Cli, cfg: &Config) -> Self {
        Self {
            mute: cfg.mute || cli.mute,
            keep_awake: cfg.keep_awake && !cli.no_keep_awake,
            inhibitor: cfg.inhibitor.clone(),
        }
    }

    fn to_config(&self) -> Config {
        Config {
            mute: self.mute,
            keep_awake: self.keep_awake,
            inhibitor: self.inhibitor.clone(),
        }
    }

    fn wake_lock(&self) -> Box<dyn WakeLock> {
        if !self.keep_awake {
            return Box::new(NoWakeLock);
        }
        match self
            .inhibitor
            .clone()
            .or_else(CommandWakeLock::platform_command)
        {
            Some(command) => Box::new(CommandWakeLock::new(command)),
            None => Box::new(NoWakeLock),
        }
    }

    fn signal(&self) -> Box<dyn CompletionSignal> {
        if self.mute {
            Box::new(Silent)
        } else {
            Box::new(TerminalBell::stdout())
        }
    }
}

fn build_trainer(settings: &Settings, seed: Option<u64>) -> Trainer {
    let session = seed.map(Session::seeded).unwrap_or_default();
    Trainer::new(session, settings.wake_lock(), settings.signal())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        logging::init(&path);
    }

    let store = FileConfigStore::new();
    let settings = Settings::resolve(&cli, &store.load());
    if cli.save_config {
        match store.save(&settings.to_config()) {
            Ok(()) => info!(path = %store.path().display(), "saved config"),
            Err(e) => warn!("could not save config: {}", e),
        }
    }
    info!(?settings, seed = ?cli.seed, "starting");

    let mut trainer = build_trainer(&settings, cli.seed);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());
    let result = start_tui(&mut terminal, &mut trainer, &mut runner);
    trainer.teardown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    trainer: &mut Trainer,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        let snapshot = trainer.snapshot();
        terminal.draw(|f| f.render_widget(&snapshot, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {
                trainer.on_tick();
            }
            AppEvent::Resize => {}
            AppEvent::Visibility(visibility) => trainer.on_visibility(visibility),
            AppEvent::Key(key) => match command_for(key, &snapshot) {
                Some(Command::Quit) => break,
                Some(Command::Intent(intent)) => {
                    trainer.dispatch(intent);
                }
                None => {}
            },
        }
    }

    Ok(())
}
