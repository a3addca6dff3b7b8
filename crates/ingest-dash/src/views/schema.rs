//! Latest schema, version history, and the diff of the last two versions.

use ingest_core::{
  demo::{DemoData, is_demo},
  schema::{SchemaDiff, SchemaSnapshot},
};

use super::{Fetch, Job, Reply, Ticket, Tickets};

/// One independently fetched half of the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Part<T> {
  Loading,
  Loaded(T),
  Failed(String),
}

impl<T> Part<T> {
  pub fn loaded(&self) -> Option<&T> {
    match self {
      Self::Loaded(v) => Some(v),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Failed(e) => Some(e.as_str()),
      _ => None,
    }
  }
}

pub struct SchemaView {
  pub source_id: String,
  pub latest:    Part<SchemaSnapshot>,
  pub history:   Part<Vec<SchemaSnapshot>>,
  /// Set once history has loaded.
  pub diff:      Option<SchemaDiff>,
  pub scroll:    u16,
  ticket:        Option<Ticket>,
}

impl SchemaView {
  pub fn new(source_id: impl Into<String>) -> Self {
    Self {
      source_id: source_id.into(),
      latest:    Part::Loading,
      history:   Part::Loading,
      diff:      None,
      scroll:    0,
      ticket:    None,
    }
  }

  pub fn load(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    self.diff = None;
    self.scroll = 0;

    if is_demo(&self.source_id) {
      let demo = DemoData::now();
      self.history = Part::Loaded(demo.history());
      self.latest = Part::Loaded(demo.schema);
      self.diff = Some(SchemaDiff::default());
      self.ticket = None;
      return Vec::new();
    }

    let ticket = tickets.issue();
    self.ticket = Some(ticket);
    self.latest = Part::Loading;
    self.history = Part::Loading;
    vec![
      Job::new(ticket, Fetch::Schema(self.source_id.clone())),
      Job::new(ticket, Fetch::SchemaHistory(self.source_id.clone())),
    ]
  }

  pub fn apply(&mut self, ticket: Ticket, reply: Reply) -> bool {
    if self.ticket != Some(ticket) {
      tracing::debug!(source = %self.source_id, "discarding stale schema reply");
      return false;
    }
    match reply {
      Reply::Schema(Ok(schema)) => self.latest = Part::Loaded(schema),
      Reply::Schema(Err(e)) => self.latest = Part::Failed(e.to_string()),
      Reply::SchemaHistory(Ok(history)) => {
        self.diff = Some(SchemaDiff::of_history(&history));
        self.history = Part::Loaded(history);
      }
      Reply::SchemaHistory(Err(e)) => self.history = Part::Failed(e.to_string()),
      _ => return false,
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use ingest_core::ApiError;
  use serde_json::json;

  use super::*;

  fn snapshot(v: serde_json::Value) -> SchemaSnapshot { serde_json::from_value(v).unwrap() }

  #[test]
  fn history_diff_is_computed_on_arrival() {
    let mut tickets = Tickets::default();
    let mut view = SchemaView::new("s1");
    let jobs = view.load(&mut tickets);
    assert_eq!(jobs.len(), 2);
    let t = jobs[0].ticket;

    view.apply(
      t,
      Reply::SchemaHistory(Ok(vec![
        snapshot(json!({ "fields": { "a": 1, "b": 1 } })),
        snapshot(json!({ "fields": { "b": 1, "c": 1 } })),
      ])),
    );
    let diff = view.diff.as_ref().unwrap();
    assert_eq!(diff.added, ["c"]);
    assert_eq!(diff.removed, ["a"]);
    assert_eq!(view.latest, Part::Loading);
  }

  #[test]
  fn failures_are_isolated() {
    let mut tickets = Tickets::default();
    let mut view = SchemaView::new("s1");
    let t = view.load(&mut tickets)[0].ticket;

    view.apply(t, Reply::Schema(Err(ApiError::Transport("refused".into()))));
    view.apply(t, Reply::SchemaHistory(Ok(vec![snapshot(json!({ "fields": ["a"] }))])));

    assert_eq!(view.latest.error(), Some("network error: refused"));
    assert_eq!(view.history.loaded().map(Vec::len), Some(1));
    assert_eq!(view.diff, Some(SchemaDiff::default()));
  }

  #[test]
  fn history_failure_leaves_diff_unset() {
    let mut tickets = Tickets::default();
    let mut view = SchemaView::new("s1");
    let t = view.load(&mut tickets)[0].ticket;
    view.apply(t, Reply::SchemaHistory(Err(ApiError::Transport("x".into()))));
    assert!(view.diff.is_none());
    assert!(view.history.error().is_some());
  }

  #[test]
  fn demo_schema_is_local() {
    let mut tickets = Tickets::default();
    let mut view = SchemaView::new("demo_local");
    assert!(view.load(&mut tickets).is_empty());
    assert_eq!(view.history.loaded().map(Vec::len), Some(1));
    assert_eq!(view.diff, Some(SchemaDiff::default()));
    assert_eq!(
      view.latest.loaded().and_then(|s| s.version),
      Some(1)
    );
  }

  #[test]
  fn replies_for_another_ticket_are_ignored() {
    let mut tickets = Tickets::default();
    let mut view = SchemaView::new("s1");
    let stale = view.load(&mut tickets)[0].ticket;
    view.load(&mut tickets);
    assert!(!view.apply(stale, Reply::Schema(Ok(SchemaSnapshot::default()))));
    assert_eq!(view.latest, Part::Loading);
  }
}
