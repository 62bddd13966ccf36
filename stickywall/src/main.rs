//! `stickywall`: live sticky-note task board for the terminal.
//!
//! Runs against a `stickywall-server` when a backend URL is configured,
//! otherwise fully offline with in-memory accounts and notes.
//!
//! ```bash
//! # Offline
//! cargo run --bin stickywall
//!
//! # Against a local server
//! cargo run --bin stickywall -- --backend-url ws://127.0.0.1:9400/ws
//!
//! # Or via environment variables
//! STICKYWALL_BACKEND_URL=ws://127.0.0.1:9400/ws cargo run --bin stickywall
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_appender::non_blocking::WorkerGuard;

use stickywall::app::App;
use stickywall::auth::memory::MemoryIdentity;
use stickywall::auth::{AuthGate, IdentityService};
use stickywall::board::Board;
use stickywall::config::{CliArgs, ClientConfig};
use stickywall::remote::RemoteBackend;
use stickywall::store::DocumentStore;
use stickywall::store::memory::MemoryStore;
use stickywall::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load configuration: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file; the terminal belongs to ratatui.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("stickywall starting");

    let (remote, notice) = match &config.backend_url {
        Some(url) => match RemoteBackend::connect(url.as_str(), config.connect_timeout).await {
            Ok(backend) => {
                tracing::info!(url = backend.url(), "using remote backend");
                (Some(Arc::new(backend)), None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "falling back to offline mode");
                (None, Some(format!("Could not reach backend, running offline ({e})")))
            }
        },
        None => (None, None),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = if let Some(backend) = remote {
        let app = build_app(Arc::clone(&backend), backend, &config);
        run_app(&mut terminal, app, &config, notice).await
    } else {
        let app = build_app(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryIdentity::new()),
            &config,
        );
        run_app(&mut terminal, app, &config, notice).await
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("stickywall exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("stickywall.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn build_app<S: DocumentStore, I: IdentityService>(
    store: Arc<S>,
    identity: Arc<I>,
    config: &ClientConfig,
) -> App<S, I> {
    let board = Board::new(store).with_sort_order(config.sort_order);
    App::new(AuthGate::new(identity), board).with_date_format(config.date_format.clone())
}

/// Main application loop.
async fn run_app<S: DocumentStore, I: IdentityService>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App<S, I>,
    config: &ClientConfig,
    notice: Option<String>,
) -> io::Result<()> {
    app.notice = notice;

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Apply whatever snapshots arrived since the last frame.
        app.poll();

        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(action) = app.handle_key_event(key) {
                app.perform(action).await;
            }
        }

        if app.should_quit {
            app.shutdown();
            return Ok(());
        }
    }
}
