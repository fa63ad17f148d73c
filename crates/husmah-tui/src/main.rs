//! Husmah Admin - a terminal dashboard for HUSMAH ENGINEERING staff.
//!
//! Staff sign in, manage the project portfolio and, as superadmins, decide
//! who else may use the dashboard. Sessions last 30 minutes and are offered
//! an extension when the user has gone quiet near the end.

mod app;
mod forms;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::prompt::TerminalRenewalPrompt;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the cache directory
const LOG_FILE_NAME: &str = "husmah-admin.log";

const USAGE: &str = "\
Usage: husmah-admin [OPTION]

Options:
  --login    Sign in from the command line, then open the dashboard
  --logout   Clear the saved session and stored password
  --help     Show this message

Environment:
  HUSMAH_API_BASE_URL  Backend base URL (default http://localhost:5001)
  HUSMAH_CLOUD_NAME    Image host cloud name
  HUSMAH_EMAIL         Prefill the login email
  HUSMAH_PASSWORD      Prefill the login password
  RUST_LOG             Log filter (default warn)";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the TUI, so logs go to a file in `log_dir`.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);
    if matches!(command, Some("--help") | Some("-h")) {
        println!("{}", USAGE);
        return Ok(());
    }

    // Create app
    let mut app = App::new()?;

    let log_dir = app
        .config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("."));
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: cannot create {}: {}", log_dir.display(), e);
    }
    let _log_guard = init_tracing(&log_dir);
    info!("Husmah admin starting");

    match command {
        Some("--login") => app.login_interactive().await?,
        Some("--logout") => {
            app.forget_login();
            println!("Signed out.");
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown option: {}\n\n{}", other, USAGE);
            return Ok(());
        }
        None => {}
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Resume a saved session or show the login form
    app.resume_session().await;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

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
        eprintln!("Error: {}", e);
    }

    info!("Husmah admin shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow timers to run
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            let event = event::read()?;

            // Any input counts as activity
            if matches!(
                event,
                Event::Key(_) | Event::Mouse(_) | Event::Paste(_) | Event::Resize(_, _)
            ) {
                app.session.pulse();
            }

            if let Event::Key(key) = event {
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    // Handle input
                    if handle_input(app, key).await? {
                        return Ok(());
                    }
                }
            }
        }

        // Fire due session timers; the renewal prompt takes over the screen
        let clock = Arc::clone(app.session.store().clock());
        if let Some(event) = app.session.poll(&mut TerminalRenewalPrompt::new(terminal, clock)) {
            app.on_session_event(event);
        }

        // Expiry notifications and the debounced email check
        app.check_background_tasks();
        app.tick().await;

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
