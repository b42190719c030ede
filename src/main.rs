//! dbnav - browse PostgreSQL schemas and table data from the terminal
//!
//! This is the main entry point. The actual logic is in the library modules
//! for better testability.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use dbnav::app::App;
use dbnav::config::{load_settings, resolve_target};
use dbnav::db::ConnectionRegistry;
use dbnav::db::postgres::PostgresSource;
use dbnav::dispatch::{Action, AppEvent, Dispatcher};
use dbnav::logging::{self, LogConfig, LogLevel};
use dbnav::ui::render::render;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "dbnav", version, about)]
struct Cli {
    /// postgres:// URL or the name of a saved connection profile
    target: String,

    /// Log verbosity (overrides config.toml)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Write logs to this file (overrides config.toml)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run a statement right after connecting
    #[arg(short, long)]
    execute: Option<String>,
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings().context("loading settings")?;
    let log_config = LogConfig {
        level: cli.log_level.unwrap_or(settings.log.level),
        file: cli.log_file.clone().or_else(|| settings.log.file.clone()),
    };
    logging::init(&log_config).context("initializing logging")?;

    let config = resolve_target(&cli.target)
        .with_context(|| format!("resolving connection {}", cli.target))?;
    let (source, mut lost_rx) = PostgresSource::connect(&config, &settings)
        .await
        .with_context(|| format!("connecting to {}", config.name))?;

    let registry = Arc::new(ConnectionRegistry::new());
    registry.connect(config.name.clone(), source).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(Arc::clone(&registry), tx);

    let mut app = App::new(&settings);
    let mut terminal = setup_terminal().context("setting up terminal")?;

    let (width, height) = crossterm::terminal::size().context("reading terminal size")?;
    app.handle_event(AppEvent::Resize(width, height))?;
    let action = app.set_connection(&config.name);
    dispatcher.dispatch(action);
    if let Some(sql) = &cli.execute {
        let action = app.execute_sql(sql);
        dispatcher.dispatch(action);
    }

    let outcome = run(&mut terminal, &mut app, &mut dispatcher, &mut rx, &mut lost_rx).await;
    restore_terminal(&mut terminal).context("restoring terminal")?;
    registry.disconnect(&config.name).await;
    outcome
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    dispatcher: &mut Dispatcher<PostgresSource>,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    lost_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK_INTERVAL);

    while app.running {
        terminal.draw(|frame| render(frame, &*app))?;

        let event = tokio::select! {
            maybe = events.next() => match maybe {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Some(Ok(Event::Resize(w, h))) => AppEvent::Resize(w, h),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("reading terminal events"),
                None => break,
            },
            Some(event) = rx.recv() => event,
            Some(reason) = lost_rx.recv() => AppEvent::ConnectionLost(reason),
            _ = tick.tick() => AppEvent::Tick,
        };

        match app.handle_event(event)? {
            Action::Quit => break,
            Action::None => {}
            action => {
                dispatcher.dispatch(action);
            }
        }
    }
    Ok(())
}

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}
