//! map-toc - A terminal table of contents for web map layers
//!
//! Opens a map document and shows its layer tree with a toolbar that is
//! recomposed from the current selection on every frame.

mod action;
mod app;
mod component;
mod components;
mod config;
mod error;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::tui::Tui;
use anyhow::Result;
use crossterm::event::Event;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log to `logs/map-toc.log`. The terminal belongs to the TUI, so nothing
/// is written to stdout.
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = PathBuf::from("logs");
    if fs::create_dir_all(&logs_dir).is_err() {
        return None;
    }

    let log_path = logs_dir.join("map-toc.log");
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n{}\nSession started: {}\n{}",
            separator,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            separator
        );
    }

    let file_appender = tracing_appender::rolling::never(&logs_dir, "map-toc.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,map_toc=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Some(guard)
}

fn main() -> Result<()> {
    let _log_guard = setup_logging();
    let map_path = std::env::args().nth(1).map(PathBuf::from);
    info!(map = ?map_path, "Starting map-toc");

    // Setup terminal
    let mut tui = Tui::new()?.with_tick_rate(Duration::from_millis(250));
    tui.enter()?;

    let mut app = App::new(map_path);
    let result = app.init().and_then(|_| run_app(&mut tui, &mut app));

    // Cleanup terminal
    tui.exit()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    info!("map-toc exited");
    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        tui.draw(|frame| {
            let area = frame.area();
            if let Err(e) = app.draw(frame, area) {
                tracing::error!(error = %e, "Draw failed");
            }
        })?;

        if let Some(event) = tui.next_event()? {
            let action = match event {
                Event::Key(key) => app.handle_key_event(key)?,
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                _ => None,
            };

            // An action may produce a follow-up action
            let mut current_action = action;
            while let Some(a) = current_action {
                current_action = app.update(a)?;
            }
        } else {
            app.update(Action::Tick)?;
        }
    }

    Ok(())
}
