//! Record table with the inspect panel.
//!
//! Only the rows inside the viewport are built; the page can hold any number
//! of records without slowing the frame down.

use ingest_core::{model::Record, schema::RAW_COLUMN};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Row, Table, Wrap},
};
use serde_json::Value;

use super::{error_text, hint, pane};
use crate::views::{
  Phase,
  records::{PREVIEW_CHARS, RecordsView},
};

/// Width given to each schema column.
const COLUMN_WIDTH: u16 = 18;
const ID_WIDTH: u16 = 14;

pub fn draw(f: &mut Frame, area: Rect, view: &RecordsView) {
  let (table_area, inspect_area) = if view.inspected.is_some() {
    let cols = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
      .split(area);
    (cols[0], Some(cols[1]))
  } else {
    (area, None)
  };

  let title = format!(
    "Records: {}  page {}  limit {}  ({} shown)",
    view.source_id,
    view.page,
    view.limit,
    view.records.len()
  );
  let inner = pane(f, table_area, &title);
  draw_table(f, inner, view);

  if let Some(area) = inspect_area {
    draw_inspect(f, area, view);
  }
}

fn draw_table(f: &mut Frame, area: Rect, view: &RecordsView) {
  match &view.phase {
    Phase::Idle | Phase::Loading => return hint(f, area, "Loading records…"),
    Phase::Failed(e) => return error_text(f, area, &format!("Failed to load records: {e}")),
    Phase::Ready if view.records.is_empty() => return hint(f, area, "No records on this page"),
    Phase::Ready => {}
  }

  let columns = view.columns();
  let raw = columns.len() == 1 && columns[0] == RAW_COLUMN;
  let fit = (area.width.saturating_sub(ID_WIDTH) / COLUMN_WIDTH).max(1) as usize;
  let shown: Vec<&str> = columns.iter().take(fit).map(String::as_str).collect();

  let mut header: Vec<String> = vec!["id".into()];
  header.extend(shown.iter().map(|c| c.to_string()));
  let header = Row::new(header).style(
    Style::default()
      .fg(Color::Yellow)
      .add_modifier(Modifier::BOLD),
  );

  let height = area.height.saturating_sub(1) as usize;
  let range = view.visible_range(height);
  let rows: Vec<Row> = view.records[range.clone()]
    .iter()
    .zip(range)
    .map(|(record, i)| {
      let mut cells = vec![record.display_id(i)];
      if raw {
        cells.push(record.preview(PREVIEW_CHARS));
      } else {
        cells.extend(shown.iter().map(|c| cell_text(record, c)));
      }
      let row = Row::new(cells);
      if i == view.cursor {
        row.style(
          Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
        )
      } else {
        row
      }
    })
    .collect();

  let mut widths = vec![Constraint::Length(ID_WIDTH)];
  if raw {
    widths.push(Constraint::Min(10));
  } else {
    widths.extend(shown.iter().map(|_| Constraint::Length(COLUMN_WIDTH)));
  }
  f.render_widget(Table::new(rows, widths).header(header), area);
}

/// One cell: strings unquoted, anything else as compact JSON, blank if
/// the field is missing.
fn cell_text(record: &Record, column: &str) -> String {
  match record.0.get(column) {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

fn draw_inspect(f: &mut Frame, area: Rect, view: &RecordsView) {
  let Some((index, record)) = view.inspected_record() else {
    return;
  };
  let inner = pane(f, area, &format!("Record {}", record.display_id(index)));
  let lines: Vec<Line> = match record.to_pretty_json() {
    Ok(text) => text.lines().map(|l| Line::from(l.to_string())).collect(),
    Err(e) => vec![Line::from(Span::styled(e.to_string(), Style::default().fg(Color::Red)))],
  };
  f.render_widget(
    Paragraph::new(lines)
      .wrap(Wrap { trim: false })
      .scroll((view.inspect_scroll, 0)),
    inner,
  );
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn cells_unquote_strings_and_blank_missing() {
    let r: Record = serde_json::from_value(json!({ "a": "x", "b": 2, "c": null })).unwrap();
    assert_eq!(cell_text(&r, "a"), "x");
    assert_eq!(cell_text(&r, "b"), "2");
    assert_eq!(cell_text(&r, "c"), "");
    assert_eq!(cell_text(&r, "zzz"), "");
  }
}
