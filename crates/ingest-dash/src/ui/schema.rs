//! Schema screen: latest fields, version history, and the last diff.

use ingest_core::schema::{SchemaDiff, SchemaSnapshot};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{error_text, hint, pane};
use crate::views::schema::{Part, SchemaView};

pub fn draw(f: &mut Frame, area: Rect, view: &SchemaView) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(area);
  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(cols[1]);

  draw_latest(f, cols[0], view);
  draw_history(f, right[0], view);
  draw_diff(f, right[1], view);
}

fn draw_latest(f: &mut Frame, area: Rect, view: &SchemaView) {
  let title = match view.latest.loaded().and_then(|s| s.version) {
    Some(v) => format!("Schema: {}  v{v}", view.source_id),
    None => format!("Schema: {}", view.source_id),
  };
  let inner = pane(f, area, &title);

  let snapshot = match &view.latest {
    Part::Loading => return hint(f, inner, "Loading schema…"),
    Part::Failed(e) => return error_text(f, inner, &format!("Failed to load schema: {e}")),
    Part::Loaded(s) => s,
  };
  let Some(fields) = &snapshot.fields else {
    return hint(f, inner, "Schema has no readable field list");
  };
  if fields.is_empty() {
    return hint(f, inner, "Schema has no fields");
  }

  let mut lines = vec![Line::from(Span::styled(
    format!("{:<28}{:<12}{}", "field", "type", "presence"),
    Style::default()
      .fg(Color::Yellow)
      .add_modifier(Modifier::BOLD),
  ))];
  lines.extend(fields.iter().map(|field| {
    Line::from(vec![
      Span::raw(format!("{:<28}", field.name)),
      Span::styled(
        format!("{:<12}", field.kind.as_deref().unwrap_or("")),
        Style::default().fg(Color::Cyan),
      ),
      Span::styled(
        field.presence.map(|p| p.to_string()).unwrap_or_default(),
        Style::default().fg(Color::DarkGray),
      ),
    ])
  }));
  f.render_widget(Paragraph::new(lines).scroll((view.scroll, 0)), inner);
}

/// One history row: `v<version>  <created_at>  <n> fields`. Entries without
/// a version number are labelled by position.
pub fn history_line(index: usize, snapshot: &SchemaSnapshot) -> String {
  let version = snapshot
    .version
    .map_or_else(|| format!("#{}", index + 1), |v| format!("v{v}"));
  let fields = snapshot
    .displayed_field_count()
    .map_or_else(|| "?".to_string(), |n| n.to_string());
  format!(
    "{version:<6}{:<22}{fields} fields",
    snapshot.created_at.as_deref().unwrap_or("—")
  )
}

fn draw_history(f: &mut Frame, area: Rect, view: &SchemaView) {
  let inner = pane(f, area, "History");
  let history = match &view.history {
    Part::Loading => return hint(f, inner, "Loading history…"),
    Part::Failed(e) => return error_text(f, inner, &format!("Failed to load history: {e}")),
    Part::Loaded(h) => h,
  };
  if history.is_empty() {
    return hint(f, inner, "No schema history");
  }
  let lines: Vec<Line> = history
    .iter()
    .enumerate()
    .map(|(i, s)| Line::from(history_line(i, s)))
    .collect();
  f.render_widget(Paragraph::new(lines), inner);
}

fn draw_diff(f: &mut Frame, area: Rect, view: &SchemaView) {
  let inner = pane(f, area, "Diff (last two versions)");
  let Some(diff) = &view.diff else {
    return match view.history.error() {
      Some(_) => hint(f, inner, "History unavailable"),
      None => hint(f, inner, "Loading…"),
    };
  };
  f.render_widget(Paragraph::new(diff_lines(diff)), inner);
}

fn diff_lines(diff: &SchemaDiff) -> Vec<Line<'static>> {
  if diff.is_empty() {
    return vec![Line::from(Span::styled(
      "No field changes",
      Style::default().fg(Color::DarkGray),
    ))];
  }
  let added = diff.added.iter().map(|f| {
    Line::from(Span::styled(format!("+ {f}"), Style::default().fg(Color::Green)))
  });
  let removed = diff.removed.iter().map(|f| {
    Line::from(Span::styled(format!("- {f}"), Style::default().fg(Color::Red)))
  });
  added.chain(removed).collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn reduced_history_entries_still_render() {
    let full: SchemaSnapshot =
      serde_json::from_value(json!({ "version": 3, "fields": ["a", "b"], "created_at": "2024-05-01" }))
        .unwrap();
    let reduced: SchemaSnapshot =
      serde_json::from_value(json!({ "field_count": 7, "created_at": "2024-05-02" })).unwrap();
    let bare = SchemaSnapshot::default();

    assert!(history_line(0, &full).starts_with("v3"));
    assert!(history_line(0, &full).ends_with("2 fields"));
    assert!(history_line(1, &reduced).starts_with("#2"));
    assert!(history_line(1, &reduced).ends_with("7 fields"));
    assert!(history_line(2, &bare).ends_with("? fields"));
  }

  #[test]
  fn diff_lists_added_before_removed() {
    let diff = SchemaDiff {
      added:   vec!["c".into()],
      removed: vec!["a".into()],
    };
    let lines = diff_lines(&diff);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].to_string(), "+ c");
    assert_eq!(lines[1].to_string(), "- a");
  }
}
