//! Summary charts: chunk types, top fields, schema evolution, token cloud.

use ingest_core::summary::{Provenance, SchemaPoint, SummaryView, VisualizeSummary};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{BarChart, LineGauge, Paragraph, Sparkline, Wrap},
};

use super::{error_text, hint, pane};
use crate::views::visualize::{VisualizeState, VisualizeView};

pub fn draw(f: &mut Frame, area: Rect, view: &VisualizeView) {
  let title = format!("Visualize: {}", view.source_id);
  match &view.state {
    VisualizeState::Loading => {
      let inner = pane(f, area, &title);
      hint(f, inner, "Loading summary…")
    }
    VisualizeState::Sampling { error } => {
      let inner = pane(f, area, &title);
      hint(f, inner, &format!("Summary unavailable ({error}); sampling records…"))
    }
    VisualizeState::NoData { error } => {
      let inner = pane(f, area, &title);
      let text = match error {
        Some(e) => format!("No data available: {e}"),
        None => "No data available".to_string(),
      };
      error_text(f, inner, &text)
    }
    VisualizeState::Ready(summary) => draw_summary(f, area, &title, summary),
  }
}

/// Label for the summary's provenance; empty for precomputed summaries.
pub fn provenance_label(provenance: Provenance) -> String {
  match provenance {
    Provenance::Precomputed => String::new(),
    Provenance::Approximate { sample_size } => {
      format!("approximate ({sample_size} records sampled)")
    }
  }
}

fn draw_summary(f: &mut Frame, area: Rect, title: &str, view: &SummaryView) {
  let label = provenance_label(view.provenance);
  let title = if label.is_empty() {
    title.to_string()
  } else {
    format!("{title}  {label}")
  };
  let inner = pane(f, area, &title);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(inner);
  let left = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(cols[0]);
  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(7), Constraint::Min(3)])
    .split(cols[1]);

  let summary = &view.summary;
  draw_chunk_types(f, left[0], summary);
  draw_top_fields(f, left[1], summary);
  draw_schema_evolution(f, right[0], summary);
  draw_token_cloud(f, right[1], summary);
}

fn draw_chunk_types(f: &mut Frame, area: Rect, summary: &VisualizeSummary) {
  let inner = pane(f, area, "Chunk types");
  let shares = summary.chunk_shares();
  if shares.is_empty() {
    return hint(f, inner, "No chunk data");
  }
  for (i, (kind, count, share)) in shares.iter().enumerate().take(inner.height as usize) {
    let row = Rect {
      y: inner.y + i as u16,
      height: 1,
      ..inner
    };
    f.render_widget(
      LineGauge::default()
        .label(format!("{kind:<10}{count:>7}"))
        .ratio(share.clamp(0.0, 1.0))
        .filled_style(Style::default().fg(Color::Cyan)),
      row,
    );
  }
}

fn draw_top_fields(f: &mut Frame, area: Rect, summary: &VisualizeSummary) {
  let inner = pane(f, area, "Top fields");
  if summary.top_fields.is_empty() {
    return hint(f, inner, "No field data");
  }
  let pairs: Vec<(&str, u64)> = summary
    .top_fields
    .iter()
    .map(|fc| (fc.field.as_str(), fc.count))
    .collect();
  f.render_widget(
    BarChart::default()
      .direction(Direction::Horizontal)
      .bar_width(1)
      .bar_gap(0)
      .bar_style(Style::default().fg(Color::Green))
      .value_style(Style::default().fg(Color::White))
      .data(&pairs[..]),
    inner,
  );
}

fn draw_schema_evolution(f: &mut Frame, area: Rect, summary: &VisualizeSummary) {
  let inner = pane(f, area, "Schema evolution (fields per version)");
  let series = summary.field_count_series();
  if series.is_empty() {
    return hint(f, inner, "No schema history");
  }
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(1), Constraint::Length(1)])
    .split(inner);
  f.render_widget(
    Sparkline::default()
      .data(series.as_slice())
      .style(Style::default().fg(Color::Magenta)),
    rows[0],
  );
  let first = summary.schema_history.first();
  let last = summary.schema_history.last();
  let label = |p: Option<&SchemaPoint>| p.and_then(|p| p.version_label.clone()).unwrap_or_default();
  hint(
    f,
    rows[1],
    &format!(
      "{} → {}  ({} versions)",
      label(first),
      label(last),
      series.len()
    ),
  );
}

/// Style for a token weighted in `0.0..=1.0`.
fn emphasis(weight: f64) -> Style {
  if weight >= 0.66 {
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD)
  } else if weight >= 0.33 {
    Style::default().fg(Color::Cyan)
  } else {
    Style::default().fg(Color::DarkGray)
  }
}

fn draw_token_cloud(f: &mut Frame, area: Rect, summary: &VisualizeSummary) {
  let inner = pane(f, area, "Token cloud");
  let cloud = summary.token_cloud();
  if cloud.is_empty() {
    return hint(f, inner, "No token data");
  }
  let spans: Vec<Span> = cloud
    .iter()
    .flat_map(|(token, weight)| [Span::styled(token.to_string(), emphasis(*weight)), Span::raw("  ")])
    .collect();
  f.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }), inner);
}
