//! Source table and the delete-confirmation modal.

use ingest_core::{
  model::{Source, format_timestamp},
  workflow::{BackupState, DeleteStep, DeleteWorkflow},
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
};

use super::{centered, error_text, hint, pane};
use crate::views::{Phase, sources::SourcesView};

const HEADER: [&str; 5] = ["Source ID", "Last Ingest", "Records", "Schema v", "Chunks"];

/// Display cells for one source row.
pub fn row_cells(source: &Source) -> [String; 5] {
  [
    source.source_id.clone(),
    format_timestamp(source.last_ingest.as_deref()),
    source.record_count.to_string(),
    source
      .schema_version
      .map_or_else(|| "—".to_string(), |v| v.to_string()),
    source.chunks.to_string(),
  ]
}

pub fn draw(f: &mut Frame, area: Rect, view: &SourcesView) {
  let filtered = view.filtered();
  let title = if view.filter_active || !view.filter.is_empty() {
    format!("Sources ({}/{})", filtered.len(), view.sources.len())
  } else {
    format!("Sources ({})", view.sources.len())
  };
  let mut inner = pane(f, area, &title);

  match &view.phase {
    Phase::Idle | Phase::Loading => return hint(f, inner, "Loading sources…"),
    Phase::Failed(e) => return error_text(f, inner, &format!("Failed to load sources: {e}")),
    Phase::Ready if view.sources.is_empty() => return hint(f, inner, "No sources found"),
    Phase::Ready => {}
  }

  if (view.filter_active || !view.filter.is_empty()) && inner.height > 2 {
    let filter_area = Rect {
      y: inner.y + inner.height - 1,
      height: 1,
      ..inner
    };
    inner.height -= 1;
    let text = if view.filter_active {
      format!("/{}_", view.filter)
    } else {
      format!("/{}", view.filter)
    };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Yellow)), filter_area);
  }

  let header = Row::new(HEADER).style(
    Style::default()
      .fg(Color::Yellow)
      .add_modifier(Modifier::BOLD),
  );
  let rows: Vec<Row> = filtered
    .iter()
    .enumerate()
    .map(|(i, source)| {
      let row = Row::new(row_cells(source));
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

  // Keep the cursor row on screen.
  let body_rows = inner.height.saturating_sub(1) as usize;
  let skip = (view.cursor + 1).saturating_sub(body_rows);
  let rows: Vec<Row> = rows.into_iter().skip(skip).collect();

  let table = Table::new(rows, [
    Constraint::Min(20),
    Constraint::Length(20),
    Constraint::Length(10),
    Constraint::Length(9),
    Constraint::Length(8),
  ])
  .header(header);
  f.render_widget(table, inner);

  if let Some(wf) = &view.modal {
    draw_modal(f, area, wf);
  }
}

fn draw_modal(f: &mut Frame, area: Rect, wf: &DeleteWorkflow) {
  let rect = centered(area, 76, 16);
  f.render_widget(Clear, rect);

  let title = match wf.step() {
    DeleteStep::Start => " Delete dataset: backup required ",
    DeleteStep::Backed => " Backup command ",
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  let inner = block.inner(rect);
  f.render_widget(block, rect);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(2), // description
      Constraint::Min(3),    // command
      Constraint::Length(1), // input
      Constraint::Length(2), // footer
    ])
    .split(inner);

  let description = match wf.step() {
    DeleteStep::Start => format!(
      "You are about to delete dataset {}. Generate the backup command (F5) and run it first.",
      wf.target()
    ),
    DeleteStep::Backed => "Run this command on the database host, then type the source id to enable deletion.".into(),
  };
  f.render_widget(Paragraph::new(description).wrap(Wrap { trim: true }), rows[0]);

  let command = match wf.backup() {
    BackupState::NotRequested => Paragraph::new("No backup command yet.").style(Style::default().fg(Color::DarkGray)),
    BackupState::Pending => Paragraph::new("Requesting backup command…").style(Style::default().fg(Color::DarkGray)),
    BackupState::Ready(cmd) => {
      let mut lines = vec![Line::from(Span::styled(
        cmd.command.clone(),
        Style::default().fg(Color::Green),
      ))];
      if let Some(path) = &cmd.backup_path {
        lines.push(Line::from(Span::styled(
          format!("suggested path: {path}"),
          Style::default().fg(Color::DarkGray),
        )));
      }
      Paragraph::new(lines)
    }
    BackupState::Failed(e) => Paragraph::new(e.clone()).style(Style::default().fg(Color::Red)),
  };
  f.render_widget(
    command
      .wrap(Wrap { trim: false })
      .block(Block::default().borders(Borders::TOP)),
    rows[1],
  );

  let typed_style = if wf.can_delete() {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::White)
  };
  f.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled("confirm: ", Style::default().fg(Color::DarkGray)),
      Span::styled(format!("{}_", wf.confirmation()), typed_style),
    ])),
    rows[2],
  );

  let footer = match (wf.last_error(), wf.authorize_delete()) {
    (Some(e), _) => Span::styled(format!("Delete failed: {e}"), Style::default().fg(Color::Red)),
    (None, Ok(_)) => Span::styled("Enter deletes the dataset", Style::default().fg(Color::Red)),
    (None, Err(reason)) => Span::styled(reason.to_string(), Style::default().fg(Color::DarkGray)),
  };
  f.render_widget(Paragraph::new(Line::from(footer)).wrap(Wrap { trim: true }), rows[3]);
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn missing_fields_render_as_dash() {
    let source: Source = serde_json::from_value(json!({ "source_id": "s2" })).unwrap();
    assert_eq!(row_cells(&source), ["s2", "—", "0", "—", "0"]);
  }
}
