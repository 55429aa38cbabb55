//! zooloo - terminal client for the application authentication service.
//!
//! Runs a keyboard-driven TUI by default. A few flags run one-shot session
//! commands instead (`--status`, `--login`, `--logout`).

mod app;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zooloo_core::{AuthClient, Config, CredentialStore, Credentials, SessionManager, SessionState};

use app::{App, AppState, ENV_LOGIN, ENV_PASSWORD};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "zooloo.log";

const USAGE: &str = "\
Usage: zooloo [COMMAND] [--ephemeral]

Commands:
  (none)        Start the terminal UI
  --status      Validate the stored session and print the current user
  --login       Log in from the command line (password is prompted)
  --logout      Log out and clear stored credentials
  --help        Show this message

Options:
  --ephemeral   Keep credentials in memory only for this run

Environment:
  ZOOLOO_ENDPOINT   Full service URL (overrides config)
  ZOOLOO_HOST       Host used to build http://<host>/rest.php
  ZOOLOO_LOGIN      Prefill the login field
  ZOOLOO_PASSWORD   Prefill the password field
  RUST_LOG          Log filter (default: warn)";

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tui,
    Status,
    Login,
    Logout,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct CliOptions {
    command: Command,
    ephemeral: bool,
}

fn parse_args<I, S>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut command = Command::Tui;
    let mut ephemeral = false;

    for arg in args {
        let next = match arg.as_ref() {
            "--ephemeral" => {
                ephemeral = true;
                continue;
            }
            "--status" => Command::Status,
            "--login" => Command::Login,
            "--logout" => Command::Logout,
            "--help" | "-h" => Command::Help,
            other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
        };
        if command != Command::Tui && command != next {
            anyhow::bail!("Only one command may be given\n\n{}", USAGE);
        }
        command = next;
    }

    Ok(CliOptions { command, ephemeral })
}

// ============================================================================
// Setup
// ============================================================================

/// Initialize the tracing subscriber for logging.
///
/// The TUI owns the terminal, so in that mode logs go to a file in the cache
/// directory. One-shot commands log to stderr.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir.and_then(|dir| std::fs::create_dir_all(dir).ok().map(|_| dir)) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn build_session(config: &Config, ephemeral: bool) -> Result<Arc<SessionManager>> {
    let store = if ephemeral {
        CredentialStore::in_memory()
    } else {
        config.open_store()?
    };
    let client = AuthClient::with_timeout(config.endpoint_url(), store, config.request_timeout())
        .context("Failed to create HTTP client")?;
    Ok(Arc::new(SessionManager::new(client)))
}

/// Close the session channel once all background tasks released their handles.
fn shutdown_session(session: Arc<SessionManager>) {
    match Arc::try_unwrap(session) {
        Ok(session) => session.shutdown(),
        Err(_) => warn!("Session still in use at exit"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let options = parse_args(std::env::args().skip(1))?;
    if options.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {:#}. Using defaults.", e);
        Config::default()
    });
    config.apply_env();

    let log_dir = match options.command {
        Command::Tui => config.cache_dir().ok(),
        _ => None,
    };
    let _log_guard = init_tracing(log_dir.as_deref());
    info!(endpoint = %config.endpoint_url(), ephemeral = options.ephemeral, "zooloo starting");

    let session = build_session(&config, options.ephemeral)?;

    let result = match options.command {
        Command::Status => cli_status(&session).await,
        Command::Login => cli_login(&mut config, &session).await,
        Command::Logout => cli_logout(&session).await,
        Command::Tui | Command::Help => run_tui(config, Arc::clone(&session)).await,
    };

    shutdown_session(session);
    info!("zooloo shutting down");
    result
}

// ============================================================================
// One-shot commands
// ============================================================================

async fn cli_status(session: &SessionManager) -> Result<()> {
    println!("Endpoint: {}", session.client().endpoint());

    match session.init().await {
        SessionState::Authenticated { user, expires_at } => {
            println!("Authenticated as {} ({})", user.display_name(), user.login);
            if let Some(expires_at) = expires_at {
                println!("Session expires at {}", expires_at.to_rfc3339());
            }
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        SessionState::Unauthenticated | SessionState::Unknown => {
            println!("Not logged in");
        }
    }
    Ok(())
}

async fn cli_login(config: &mut Config, session: &SessionManager) -> Result<()> {
    let login = match std::env::var(ENV_LOGIN) {
        Ok(login) => login,
        Err(_) => prompt_login(config.last_login.as_deref())?,
    };
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let credentials = Credentials::new(login, password)
        .normalized()
        .context("Please fill in all fields")?;

    let response = session.login(&credentials).await?;
    let name = response
        .user
        .as_ref()
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| credentials.login.clone());
    println!("Logged in as {}", name);

    config.last_login = Some(credentials.login);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

fn prompt_login(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Login [{}]: ", last),
        None => print!("Login: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();

    Ok(match (line.is_empty(), default) {
        (true, Some(last)) => last.to_string(),
        _ => line.to_string(),
    })
}

async fn cli_logout(session: &SessionManager) -> Result<()> {
    session.logout().await;
    println!("Logged out");
    Ok(())
}

// ============================================================================
// TUI
// ============================================================================

async fn run_tui(config: Config, session: Arc<SessionManager>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, session);
    app.start_session_check();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Let an in-flight logout or login settle, bounded by the request timeout
    let limit = app.config.request_timeout();
    app.finish_pending_tasks(limit).await;

    // Release the app's session handle before the caller shuts it down
    drop(app);

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pick up session changes and completed background tasks
        app.sync_session();
        app.check_background_tasks();

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
