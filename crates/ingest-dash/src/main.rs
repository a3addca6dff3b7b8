//! `ingest-dash`: terminal dashboard for a record-ingestion backend.
//!
//! # Usage
//!
//! ```
//! ingest-dash --url http://127.0.0.1:8000
//! ingest-dash --config ~/.config/ingest-dash.toml --source orders
//! ```

mod app;
mod client;
mod config;
mod export;
mod ui;
mod views;

use std::{fs::OpenOptions, io, path::Path, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::ApiClient;
use config::{Args, Settings};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let settings = Settings::load(Args::parse())?;

  // The terminal is ours, so logs only go to a file when one is configured.
  if let Some(path) = &settings.log_file {
    init_logging(path)?;
  }

  let client = ApiClient::new(settings.api)?;
  let url = client.base_url().to_string();
  tracing::info!(%url, page_size = settings.page_size, "starting ingest-dash");

  let mut app = App::new(client, settings.export_dir, settings.page_size);
  app.start(settings.start_source);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app, &url).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  if let Err(e) = &run_result {
    tracing::error!(error = %e, "event loop failed");
  }
  run_result
}

fn init_logging(path: &Path) -> Result<()> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<ApiClient>,
  url: &str,
) -> Result<()> {
  loop {
    // Fold finished requests into the views before drawing.
    app.pump();
    terminal
      .draw(|f| ui::draw(f, app, url))
      .context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key) {
          break;
        }
      }
      // Resizes and everything else just redraw on the next iteration.
      _ => {}
    }
  }

  Ok(())
}
