mod action;
mod app;
mod assembler;
mod backend;
mod chart;
mod command;
mod config;
mod dispatcher;
mod history;
mod keymap;
mod keypad;
mod markdown;
mod mascot;
mod presenter;
mod session;
mod solve;
mod ui;
mod ui_state;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arboard::Clipboard;
use clap::Parser;
use crossterm::{
    event::{self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use action::Action;
use app::App;
use backend::{GeminiSolver, OfflineSolver, Solver};
use config::{Config, SolverConfig};
use dispatcher::Dispatcher;
use ui::draw;
use ui_state::Screen;

/// Benny, a terminal calculator that explains its answers.
#[derive(Parser, Debug)]
#[command(name = "benny", version, about)]
struct Args {
    /// Never call the remote model; every problem gets the offline answer
    #[arg(long, short = 'o')]
    offline: bool,

    /// Model name, overrides BENNY_MODEL
    #[arg(long)]
    model: Option<String>,

    /// API base URL, overrides BENNY_API_BASE
    #[arg(long)]
    api_base: Option<String>,

    /// Log file (default: benny-calc.log in the temp directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<PathBuf>) {
    // The terminal belongs to the UI, so logs go to a file or nowhere
    let path = path.unwrap_or_else(|| std::env::temp_dir().join("benny-calc.log"));
    let Ok(file) = File::create(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("BENNY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.clone());

    let runtime = tokio::runtime::Runtime::new()?;

    let mut config = Config::default();
    config.solver = SolverConfig::from_env();
    if let Some(model) = args.model {
        config.solver.model = model;
    }
    if let Some(base) = args.api_base {
        config.solver.base_url = base;
    }

    let (solver, label): (Arc<dyn Solver>, String) = if args.offline {
        (Arc::new(OfflineSolver), "offline".to_string())
    } else {
        if !config.solver.has_api_key() {
            tracing::warn!("API_KEY is not set, every request will fall back");
        }
        let label = config.solver.model.clone();
        (Arc::new(GeminiSolver::new(config.solver.clone())), label)
    };
    tracing::info!(solver = %label, "starting benny");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Dispatcher::new(solver), runtime.handle().clone(), label);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "terminal loop failed");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn read_clipboard() -> Option<String> {
    let mut clipboard = Clipboard::new().ok()?;
    clipboard.get_text().ok()
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    let poll_interval = Duration::from_millis(app.config.tick_rate_ms);

    loop {
        app.tick();

        terminal.draw(|frame| draw(frame, app))?;

        if event::poll(poll_interval)? {
            let action = match event::read()? {
                Event::Key(key) => match keymap::map_key(app.ui.screen, app.ui.focus, key) {
                    Some(Action::PasteClipboard) => read_clipboard().map(Action::Paste),
                    other => other,
                },
                Event::Paste(text) if app.ui.screen == Screen::Calculator => Some(Action::Paste(text)),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => Some(Action::ScrollUp),
                    MouseEventKind::ScrollDown => Some(Action::ScrollDown),
                    _ => None,
                },
                _ => None,
            };

            if let Some(action) = action {
                app.apply(action);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
