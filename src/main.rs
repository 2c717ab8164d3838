//! A structural browser for Python syntax trees.
//!
//! Run the binary with a `.py` file to explore its tree; move the cursor
//! with `h`/`j`/`k`/`l` and fold nodes with `t` or a click.
//! Run with `--dump` to print the tree JSON instead.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Terminal};

use crate::app::{
    backend::{self, spawn_backend, Route},
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
};
use crate::core::context::{AstContext, GlobalContext};
use crate::ui::{
    layout::AppLayout,
    theme::Theme,
    tree_widget::{tree_block, TreeWidget},
};

/// Module shown when no file is given.
const SAMPLE: &str = "a = 10\nb = a + 4\nc = \"hello world\"\n";

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Browse the syntax tree of a Python module")]
struct Cli {
    /// Python file to open (defaults to a small built-in sample).
    file: Option<PathBuf>,

    /// Print the current tree as JSON and exit.
    #[arg(long)]
    dump: bool,

    /// Transition duration in milliseconds (overrides the config file).
    #[arg(long = "duration-ms")]
    duration_ms: Option<u64>,

    /// Write the default config file and exit.
    #[arg(long = "init-config")]
    init_config: bool,
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    if cli.init_config {
        let path = config::AppConfig::default().save()?;
        println!("{}", path.display());
        return Ok(());
    }

    // ── build the backend context ─────────────────────────────
    let (title, source) = match &cli.file {
        Some(path) => (
            path.display().to_string(),
            std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        None => ("sample".to_string(), SAMPLE.to_string()),
    };
    let mut ctx = GlobalContext::new(AstContext::from_source(&source)?);
    tracing::debug!(%title, bytes = source.len(), "parsed module");

    if cli.dump {
        println!("{}", backend::serve(&mut ctx, &Route::GetCurrent));
        return Ok(());
    }

    let mut user_config = config::AppConfig::load();
    if let Some(ms) = cli.duration_ms {
        user_config.animation_ms = ms;
    }
    let tick_rate = Duration::from_millis(user_config.tick_ms);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(term_backend)?;

    // ── async channels ────────────────────────────────────────
    let (backend_handle, mut responses) = spawn_backend(ctx);
    let mut events = spawn_event_reader(tick_rate);
    let registry = handler::frontend_actions()?;

    let mut state = AppState::new(backend_handle, user_config);
    state.request_tree();

    // ── event loop ────────────────────────────────────────────
    loop {
        terminal.draw(|frame| {
            state.terminal_area = frame.area();
            let layout = AppLayout::from_area(frame.area());

            let sampled = state.diagram.frame(Instant::now());
            let tree_widget =
                TreeWidget::new(&sampled, state.diagram.rows()).block(tree_block(&title));
            frame.render_stateful_widget(tree_widget, layout.tree_area, &mut state.tree_state);

            let status = match &state.status_message {
                Some(message) => Paragraph::new(message.as_str()).style(Theme::error_style()),
                None => Paragraph::new(state.config.status_bar_hint())
                    .style(Theme::status_bar_style()),
            };
            frame.render_widget(status, layout.status_area);
        })?;

        tokio::select! {
            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m),
                    // Redraw only; ticks keep transitions moving.
                    AppEvent::Resize | AppEvent::Tick => {}
                }
            }

            Some(response) = responses.recv() => {
                handler::handle_response(&mut state, &registry, response, Instant::now());
                // Drain everything already queued before redrawing.
                while let Ok(response) = responses.try_recv() {
                    handler::handle_response(&mut state, &registry, response, Instant::now());
                }
            }

            else => break,
        }

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
