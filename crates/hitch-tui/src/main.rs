//! Hitch - pick a running host process and start the launcher against it.
//!
//! The interactive mode renders the candidate list published by
//! `hitch-core` and forwards selection and drag intents back into it. The
//! `list` and `launch` subcommands run the same core without a terminal UI.

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        EventStream, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use hitch_core::config::{Config, Directories};
use hitch_core::scan::CycleOutcome;
use hitch_core::{CoreUpdate, Orchestrator, ProcessId};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod cli;
mod colors;
mod render;

use app::App;
use cli::{Cli, Commands};

/// Set up logging. The TUI owns the terminal, so it logs to a file; the
/// headless commands log to stderr.
fn setup_logging(debug_flag: bool, headless: bool) {
    let level = if debug_flag || cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if headless {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(false))
            .with(filter)
            .init();
        return;
    }

    let log_dir = std::env::temp_dir();
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("hitch-{timestamp}.log");

    #[cfg(unix)]
    {
        let symlink_path = log_dir.join("hitch.log");
        let _ = std::fs::remove_file(&symlink_path);
        let _ = std::os::unix::fs::symlink(log_dir.join(&log_filename), &symlink_path);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    std::mem::forget(guard);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(
        cli.debug,
        cli.command.as_ref().is_some_and(Commands::is_headless),
    );

    let dirs = Directories::new()?;
    let config_path = cli.config.unwrap_or_else(|| dirs.config_file.clone());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match cli.command {
        Some(Commands::List { json }) => list_candidates(&config, &dirs, json).await?,
        Some(Commands::Launch { pid }) => launch_headless(&config, &dirs, pid).await?,
        Some(Commands::Tui) | None => run_tui(&config, &dirs).await?,
    }

    Ok(())
}

async fn run_tui(config: &Config, dirs: &Directories) -> Result<()> {
    let (mut orchestrator, mut updates) = Orchestrator::new(config, dirs)?;
    let mut app = App::new(orchestrator.close_on_complete());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    orchestrator.start();
    let result = event_loop(&mut terminal, &mut app, &mut orchestrator, &mut updates).await;
    orchestrator.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    orchestrator: &mut Orchestrator,
    updates: &mut UnboundedReceiver<CoreUpdate>,
) -> Result<()> {
    let mut event_stream = EventStream::new();
    let mut needs_render = true;

    loop {
        if needs_render {
            terminal.draw(|f| render::ui(f, app))?;
            needs_render = false;
        }

        tokio::select! {
            Some(update) = updates.recv() => {
                tracing::debug!("Core update: {:?}", update);
                app.handle_update(update);
                needs_render = true;
            }

            Some(event_result) = event_stream.next() => {
                let event = match event_result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::error!("Event stream error: {}", e);
                        continue;
                    }
                };

                let intent = match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        app.handle_key(key.code, key.modifiers)
                    }
                    Event::Mouse(mouse) => app.handle_mouse(mouse.kind),
                    Event::FocusLost => app.handle_focus_lost(),
                    Event::Resize(..) => None,
                    _ => continue,
                };
                needs_render = true;

                if let Some(intent) = intent
                    && let Err(e) = orchestrator.handle_intent(intent)
                {
                    tracing::warn!("Intent {:?} rejected: {}", intent, e);
                    app.status_message = Some(e.to_string());
                }
            }

            else => break,
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

async fn list_candidates(config: &Config, dirs: &Directories, json: bool) -> Result<()> {
    let (orchestrator, _updates) = Orchestrator::new(config, dirs)?;

    if orchestrator.scan_once().await == CycleOutcome::Failed {
        bail!("Process scan failed");
    }
    let snapshot = orchestrator.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&*snapshot.candidates)?);
        return Ok(());
    }

    if snapshot.candidates.is_empty() {
        println!("No candidates found.");
        return Ok(());
    }

    for candidate in snapshot.candidates.iter() {
        println!("  {:<8} {}", candidate.process_id, candidate.display_title);
    }
    Ok(())
}

async fn launch_headless(config: &Config, dirs: &Directories, pid: ProcessId) -> Result<()> {
    let (orchestrator, _updates) = Orchestrator::new(config, dirs)?;

    println!("Launching against PID {pid}...");
    let report = orchestrator.launch(pid)?.await?;

    match (&report.script, report.spawned) {
        (Some(script), true) => {
            println!("Launcher started from {}", script.display());
            Ok(())
        }
        (Some(script), false) => bail!("Launcher script {} failed to start", script.display()),
        (None, _) => bail!("Launcher script could not be written"),
    }
}
