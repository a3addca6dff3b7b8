//! Offline demo screen.

use ingest_core::demo::DemoData;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{dashboard::stat, pane};

pub fn draw(f: &mut Frame, area: Rect, demo: &DemoData) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(2), // intro
      Constraint::Length(4), // stats
      Constraint::Min(0),    // samples
    ])
    .split(area);

  f.render_widget(
    Paragraph::new(vec![
      Line::from("Demo mode: a local dataset, no backend needed."),
      Line::from(Span::styled(
        "Enter opens the demo records, s its schema, v its charts.",
        Style::default().fg(Color::DarkGray),
      )),
    ]),
    rows[0],
  );

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 3); 3])
    .split(rows[1]);
  stat(f, cols[0], "Demo Source", demo.source.source_id.clone());
  stat(f, cols[1], "Records", demo.source.record_count.to_string());
  stat(f, cols[2], "Chunks", demo.source.chunks.to_string());

  let body = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(30), Constraint::Length(28)])
    .split(rows[2]);

  let inner = pane(f, body[0], "Sample records");
  let lines: Vec<Line> = demo
    .records
    .iter()
    .enumerate()
    .take(inner.height as usize)
    .map(|(i, r)| {
      Line::from(vec![
        Span::styled(format!("{:<10}", r.display_id(i)), Style::default().fg(Color::Cyan)),
        Span::raw(r.preview(inner.width.saturating_sub(10) as usize)),
      ])
    })
    .collect();
  f.render_widget(Paragraph::new(lines), inner);

  let inner = pane(f, body[1], "Top fields");
  let lines: Vec<Line> = demo
    .summary
    .top_fields
    .iter()
    .map(|fc| Line::from(format!("{:<16}{:>6}", fc.field, fc.count)))
    .collect();
  f.render_widget(Paragraph::new(lines), inner);
}
