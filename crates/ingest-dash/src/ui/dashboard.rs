//! Dashboard: totals, ingestion sparkline, test files and upload.

use ingest_core::model::format_timestamp;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Sparkline},
};

use super::{error_text, hint, icons::Icon, pane};
use crate::views::{
  Phase,
  dashboard::{DashboardView, IngestStatus, UploadField},
};

pub fn draw(f: &mut Frame, area: Rect, view: &DashboardView) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(4), // stats
      Constraint::Length(7), // sparkline
      Constraint::Min(6),    // files + upload
    ])
    .split(area);

  draw_stats(f, rows[0], view);
  draw_sparkline(f, rows[1], view);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(rows[2]);
  draw_test_files(f, cols[0], view);
  draw_upload(f, cols[1], view);
}

/// A small bordered box with a title and one big value.
pub(crate) fn stat(f: &mut Frame, area: Rect, title: &str, value: String) {
  let inner = pane(f, area, title);
  f.render_widget(
    Paragraph::new(value).style(
      Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
  );
}

fn draw_stats(f: &mut Frame, area: Rect, view: &DashboardView) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 4); 4])
    .split(area);

  let totals = view.totals();
  let ready = view.phase == Phase::Ready;
  let shown = |n: String| if ready { n } else { "—".to_string() };

  stat(f, cols[0], "Sources", shown(totals.sources.to_string()));
  stat(f, cols[1], "Total Records", shown(totals.records.to_string()));
  stat(f, cols[2], "Total Chunks", shown(totals.chunks.to_string()));
  let last = totals.last_ingest.map(|t| t.to_rfc3339());
  stat(f, cols[3], "Last Upload", format_timestamp(last.as_deref()));
}

fn draw_sparkline(f: &mut Frame, area: Rect, view: &DashboardView) {
  let inner = pane(f, area, "Ingestion sparkline (last sources)");
  if let Phase::Failed(e) = &view.phase {
    return error_text(f, inner, &format!("Failed to load sources: {e}"));
  }
  let series = view.spark_series();
  if series.is_empty() {
    return hint(f, inner, "No sources yet");
  }
  f.render_widget(
    Sparkline::default()
      .data(series.as_slice())
      .style(Style::default().fg(Color::Cyan)),
    inner,
  );
}

fn draw_test_files(f: &mut Frame, area: Rect, view: &DashboardView) {
  let inner = pane(f, area, "Process server-side test file");
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(1), Constraint::Length(2)])
    .split(inner);

  if view.test_files.is_empty() {
    hint(f, rows[0], "No test files available");
  } else {
    let items: Vec<ListItem> = view
      .test_files
      .iter()
      .map(|file| {
        ListItem::new(Line::from(vec![
          Span::raw(format!("{} {}", Icon::Dot.glyph(), file.name)),
          Span::styled(
            format!("  ({:.1} KB)", file.size_kib()),
            Style::default().fg(Color::DarkGray),
          ),
        ]))
      })
      .collect();
    let mut state = ListState::default();
    state.select(view.selected);
    f.render_stateful_widget(
      List::new(items).highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      ),
      rows[0],
      &mut state,
    );
  }

  if let Some(status) = &view.status {
    let color = match status {
      IngestStatus::Error(_) => Color::Red,
      IngestStatus::Starting(_) | IngestStatus::Uploading(_) => Color::Yellow,
      IngestStatus::Started(_) | IngestStatus::Uploaded(_) => Color::Green,
    };
    f.render_widget(
      Paragraph::new(status.message().to_string())
        .style(Style::default().fg(color))
        .wrap(ratatui::widgets::Wrap { trim: true }),
      rows[1],
    );
  }
}

fn draw_upload(f: &mut Frame, area: Rect, view: &DashboardView) {
  let inner = pane(f, area, "Upload local file");
  let form = &view.upload;
  if !form.is_open() {
    return hint(f, inner, "Press u to upload a file from this machine.");
  }

  let field = |label: &str, value: &str, focused: bool| {
    let style = if focused {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
      Span::styled(format!("{label:<11}"), Style::default().fg(Color::DarkGray)),
      Span::styled(format!("{value}{cursor}"), style),
    ])
  };

  let lines = vec![
    field("path", &form.path, form.focus == Some(UploadField::Path)),
    field("source id", &form.source_id, form.focus == Some(UploadField::SourceId)),
    Line::from(""),
    Line::from(Span::styled(
      format!("uploads as source_id={}", form.effective_source_id()),
      Style::default().fg(Color::DarkGray),
    )),
  ];
  f.render_widget(
    Paragraph::new(lines).block(Block::default().borders(Borders::NONE)),
    inner,
  );
}
