//! TUI rendering: orchestrates all panes.

pub mod dashboard;
pub mod demo;
pub mod icons;
pub mod records;
pub mod schema;
pub mod sources;
pub mod visualize;

use chrono::Local;
use icons::Icon;
use ingest_core::backend::IngestBackend;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Screen, View};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<B: IngestBackend + 'static>(f: &mut Frame, app: &App<B>, backend_url: &str) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(1), // nav
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app, backend_url);
  draw_nav(f, rows[1], app);
  draw_body(f, rows[2], app);
  draw_status(f, rows[3], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<B: IngestBackend + 'static>(f: &mut Frame, area: Rect, app: &App<B>, backend_url: &str) {
  let date = Local::now().format("%Y-%m-%d %H:%M").to_string();
  let busy = if app.is_busy() { "  ⟳" } else { "" };

  let left = Span::styled(
    format!(" ingest-dash  {backend_url}{busy}"),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Navigation ───────────────────────────────────────────────────────────────

fn draw_nav<B: IngestBackend + 'static>(f: &mut Frame, area: Rect, app: &App<B>) {
  let current = app.screen();
  let source = app.view.source_id();

  let mut spans = Vec::new();
  for screen in Screen::ALL {
    let per_source = !Screen::TOP_LEVEL.contains(&screen);
    // Per-source entries only make sense while a source is open.
    if per_source && source.is_none() {
      continue;
    }
    let style = if screen == current {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled(
      format!(" {} {} ", Icon::from(screen).glyph(), screen.title()),
      style,
    ));
    spans.push(Span::raw(" "));
  }
  if let Some(source) = source {
    spans.push(Span::styled(
      format!(" {} {source}", Icon::Dot.glyph()),
      Style::default().fg(Color::Yellow),
    ));
  }
  f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<B: IngestBackend + 'static>(f: &mut Frame, area: Rect, app: &App<B>) {
  match &app.view {
    View::Dashboard(v) => dashboard::draw(f, area, v),
    View::Sources(v) => sources::draw(f, area, v),
    View::Demo(d) => demo::draw(f, area, d),
    View::Records(v) => records::draw(f, area, v),
    View::Schema(v) => schema::draw(f, area, v),
    View::Visualize(v) => visualize::draw(f, area, v),
  }
}

/// A bordered pane with a title; returns the inner area.
pub(crate) fn pane(f: &mut Frame, area: Rect, title: &str) -> Rect {
  let block = Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  inner
}

/// Dimmed one-line hint, e.g. "Loading…".
pub(crate) fn hint(f: &mut Frame, area: Rect, text: &str) {
  f.render_widget(
    Paragraph::new(text.to_string()).style(Style::default().fg(Color::DarkGray)),
    area,
  );
}

pub(crate) fn error_text(f: &mut Frame, area: Rect, text: &str) {
  f.render_widget(
    Paragraph::new(text.to_string())
      .style(Style::default().fg(Color::Red))
      .wrap(ratatui::widgets::Wrap { trim: false }),
    area,
  );
}

/// A `width` × `height` rectangle centred in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<B: IngestBackend + 'static>(f: &mut Frame, area: Rect, app: &App<B>) {
  let (mode_label, hints) = match &app.view {
    View::Dashboard(v) if v.upload.is_open() => ("UPLOAD", "Type path  Tab switch field  Enter upload  Esc cancel"),
    View::Dashboard(_) => ("NORMAL", "↑↓/jk file  p process  u upload  r reload  Tab screen  q quit"),
    View::Sources(v) if v.modal.is_some() => ("DELETE", "F5/^R backup  type source id  Enter delete  Esc close"),
    View::Sources(v) if v.filter_active => ("SEARCH", "Type to filter  Esc cancel  Enter keep"),
    View::Sources(_) => ("NORMAL", "↑↓/jk move  Enter records  s schema  v visualize  b backup  d delete  / search"),
    View::Demo(_) => ("DEMO", "Enter records  s schema  v visualize  Tab screen  q quit"),
    View::Records(v) if v.inspected.is_some() => ("INSPECT", "↑↓/jk scroll  w download  Esc close"),
    View::Records(_) => ("RECORDS", "↑↓ move  n/p page  + size  Enter inspect  w download  Esc back"),
    View::Schema(_) => ("SCHEMA", "↑↓/jk scroll  e records  v visualize  r reload  Esc back"),
    View::Visualize(_) => ("VISUALIZE", "e records  s schema  r reload  Esc back"),
  };

  let notice = match &app.view {
    View::Sources(v) => v.notice.as_deref(),
    _ => None,
  };
  let status = if !app.status_msg.is_empty() {
    app.status_msg.as_str()
  } else {
    notice.unwrap_or(hints)
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}
