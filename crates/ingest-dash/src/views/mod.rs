//! Per-screen state machines.
//!
//! Views never touch the network. They describe the backend calls they need
//! as [`Job`]s; the app spawns them and feeds each [`Reply`] back, tagged with
//! the [`Ticket`] it was issued under. A view applies a reply only if the
//! ticket is still its current one for that load, so results that arrive
//! after the source, page or screen changed are dropped.

pub mod dashboard;
pub mod records;
pub mod schema;
pub mod sources;
pub mod visualize;

use std::time::Duration;

use ingest_core::{
  ApiResult,
  backend::PageRequest,
  model::{BackupCommand, DeleteOutcome, IngestStarted, Record, Source, TestFile, UploadFile},
  schema::SchemaSnapshot,
  summary::VisualizeSummary,
};

// ─── Tickets ──────────────────────────────────────────────────────────────────

/// Identifies one generation of a view's load. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Monotonic ticket source shared by every view.
#[derive(Debug, Default)]
pub struct Tickets {
  next: u64,
}

impl Tickets {
  pub fn issue(&mut self) -> Ticket {
    self.next += 1;
    Ticket(self.next)
  }
}

// ─── Jobs and replies ─────────────────────────────────────────────────────────

/// A backend call a view wants made.
#[derive(Debug, Clone)]
pub enum Fetch {
  Sources,
  /// Re-list sources once after `delay` (post-ingest refresh).
  SourcesAfter(Duration),
  TestFiles,
  ProcessFile(String),
  Upload(UploadFile),
  RecordsSchema(String),
  Records(String, PageRequest),
  Schema(String),
  SchemaHistory(String),
  Summary(String),
  SummarySample(String),
  Backup(String),
  Delete(String),
}

#[derive(Debug, Clone)]
pub struct Job {
  pub ticket: Ticket,
  pub fetch:  Fetch,
}

impl Job {
  pub fn new(ticket: Ticket, fetch: Fetch) -> Self { Self { ticket, fetch } }
}

/// The outcome of a [`Fetch`], one variant per fetch kind.
#[derive(Debug, Clone)]
pub enum Reply {
  Sources(ApiResult<Vec<Source>>),
  TestFiles(ApiResult<Vec<TestFile>>),
  Processed(ApiResult<IngestStarted>),
  Uploaded(ApiResult<IngestStarted>),
  RecordsSchema(ApiResult<SchemaSnapshot>),
  Records(ApiResult<Vec<Record>>),
  Schema(ApiResult<SchemaSnapshot>),
  SchemaHistory(ApiResult<Vec<SchemaSnapshot>>),
  /// `Ok(None)`: the backend has no summary for the source.
  Summary(ApiResult<Option<VisualizeSummary>>),
  SummarySample(ApiResult<Vec<Record>>),
  Backup(ApiResult<BackupCommand>),
  Deleted(ApiResult<DeleteOutcome>),
}

/// A reply on its way back to the view that asked for it.
#[derive(Debug, Clone)]
pub struct Msg {
  pub ticket: Ticket,
  pub reply:  Reply,
}

/// Coarse load state shared by the data views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Loading,
  Ready,
  Failed(String),
}

impl Phase {
  pub fn is_loading(&self) -> bool { matches!(self, Self::Loading) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tickets_are_unique_and_increasing() {
    let mut t = Tickets::default();
    let a = t.issue();
    let b = t.issue();
    assert_ne!(a, b);
    assert!(b.0 > a.0);
  }
}
