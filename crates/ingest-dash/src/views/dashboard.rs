//! Landing screen: totals over all sources, server-side test files and local
//! upload.
//!
//! A successful process or upload schedules exactly one delayed re-list of
//! the sources so the new dataset shows up; there is no repeating poll.

use std::{path::Path, time::Duration};

use ingest_core::{
  ApiResult,
  model::{IngestStarted, Source, SourceTotals, TestFile, UploadFile, default_source_hint},
};

use super::{Fetch, Job, Phase, Reply, Ticket, Tickets};

/// Delay before re-listing sources after `POST /process-file`.
pub const PROCESS_REFRESH_DELAY: Duration = Duration::from_secs(3);
/// Delay before re-listing sources after `POST /upload`.
pub const UPLOAD_REFRESH_DELAY: Duration = Duration::from_secs(2);
/// Sources plotted in the ingestion sparkline.
pub const SPARK_SOURCES: usize = 10;

/// Progress of the last process/upload action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
  Starting(String),
  Started(String),
  Uploading(String),
  Uploaded(String),
  Error(String),
}

impl IngestStatus {
  pub fn message(&self) -> &str {
    match self {
      Self::Starting(m) | Self::Started(m) | Self::Uploading(m) | Self::Uploaded(m) | Self::Error(m) => m,
    }
  }

  pub fn is_error(&self) -> bool { matches!(self, Self::Error(_)) }
}

/// Which upload prompt field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadField {
  Path,
  SourceId,
}

/// The local-upload prompt.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
  pub path:      String,
  /// Optional; defaults to the file name up to its first `.`.
  pub source_id: String,
  pub focus:     Option<UploadField>,
}

impl UploadForm {
  pub fn is_open(&self) -> bool { self.focus.is_some() }

  pub fn open(&mut self) {
    self.path.clear();
    self.source_id.clear();
    self.focus = Some(UploadField::Path);
  }

  pub fn close(&mut self) { self.focus = None; }

  pub fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Some(UploadField::Path) => Some(UploadField::SourceId),
      Some(UploadField::SourceId) => Some(UploadField::Path),
      None => None,
    };
  }

  fn field(&mut self) -> Option<&mut String> {
    match self.focus? {
      UploadField::Path => Some(&mut self.path),
      UploadField::SourceId => Some(&mut self.source_id),
    }
  }

  pub fn push_char(&mut self, c: char) {
    if let Some(f) = self.field() {
      f.push(c);
    }
  }

  pub fn pop_char(&mut self) {
    if let Some(f) = self.field() {
      f.pop();
    }
  }

  /// Source id the upload will land in, as shown next to the prompt.
  pub fn effective_source_id(&self) -> String {
    if !self.source_id.trim().is_empty() {
      return self.source_id.trim().to_string();
    }
    file_name_of(&self.path).map(default_source_hint).unwrap_or_default()
  }

  /// Read the chosen file into an upload.
  pub fn read(&self) -> std::io::Result<UploadFile> {
    let path = Path::new(self.path.trim());
    let bytes = std::fs::read(path)?;
    let file_name = file_name_of(self.path.trim()).unwrap_or_default().to_string();
    let source_id = Some(self.source_id.trim().to_string()).filter(|s| !s.is_empty());
    Ok(UploadFile { file_name, bytes, source_id })
  }
}

fn file_name_of(path: &str) -> Option<&str> {
  Path::new(path).file_name().and_then(|n| n.to_str())
}

pub struct DashboardView {
  pub phase:      Phase,
  pub sources:    Vec<Source>,
  pub test_files: Vec<TestFile>,
  /// Index into `test_files`.
  pub selected:   Option<usize>,
  pub status:     Option<IngestStatus>,
  pub upload:     UploadForm,
  load_ticket:    Option<Ticket>,
  action_ticket:  Option<Ticket>,
  refresh_ticket: Option<Ticket>,
}

impl DashboardView {
  pub fn new() -> Self {
    Self {
      phase:          Phase::Idle,
      sources:        Vec::new(),
      test_files:     Vec::new(),
      selected:       None,
      status:         None,
      upload:         UploadForm::default(),
      load_ticket:    None,
      action_ticket:  None,
      refresh_ticket: None,
    }
  }

  pub fn load(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let ticket = tickets.issue();
    self.load_ticket = Some(ticket);
    self.phase = Phase::Loading;
    vec![Job::new(ticket, Fetch::Sources), Job::new(ticket, Fetch::TestFiles)]
  }

  pub fn totals(&self) -> SourceTotals { SourceTotals::of(&self.sources) }

  /// Record counts of the last [`SPARK_SOURCES`] sources.
  pub fn spark_series(&self) -> Vec<u64> {
    let skip = self.sources.len().saturating_sub(SPARK_SOURCES);
    self.sources[skip..].iter().map(|s| s.record_count).collect()
  }

  pub fn selected_file(&self) -> Option<&TestFile> {
    self.selected.and_then(|i| self.test_files.get(i))
  }

  pub fn select_next(&mut self) {
    if self.test_files.is_empty() {
      return;
    }
    let last = self.test_files.len() - 1;
    self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
  }

  pub fn select_prev(&mut self) {
    if self.test_files.is_empty() {
      return;
    }
    self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
  }

  // ── Actions ───────────────────────────────────────────────────────────────

  /// Ask the backend to ingest the selected test file.
  pub fn process_selected(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let Some(name) = self.selected_file().map(|f| f.name.clone()) else {
      self.status = Some(IngestStatus::Error("Select a test file first".into()));
      return Vec::new();
    };
    let ticket = tickets.issue();
    self.action_ticket = Some(ticket);
    self.status = Some(IngestStatus::Starting(format!("Starting processing {name}…")));
    tracing::info!(file = %name, "processing test file");
    vec![Job::new(ticket, Fetch::ProcessFile(name))]
  }

  /// Submit the upload prompt.
  pub fn submit_upload(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let file = match self.upload.read() {
      Ok(file) => file,
      Err(e) => {
        self.status = Some(IngestStatus::Error(format!("Cannot read {}: {e}", self.upload.path.trim())));
        return Vec::new();
      }
    };
    self.upload.close();
    let ticket = tickets.issue();
    self.action_ticket = Some(ticket);
    self.status = Some(IngestStatus::Uploading(format!("Uploading {}…", file.file_name)));
    tracing::info!(file = %file.file_name, source = %file.source_id(), "uploading file");
    vec![Job::new(ticket, Fetch::Upload(file))]
  }

  // ── Replies ───────────────────────────────────────────────────────────────

  pub fn apply(&mut self, ticket: Ticket, reply: Reply, tickets: &mut Tickets) -> Vec<Job> {
    let current = Some(ticket);
    match reply {
      Reply::Sources(result) if current == self.load_ticket => {
        match result {
          Ok(sources) => {
            self.sources = sources;
            self.phase = Phase::Ready;
          }
          Err(e) => {
            self.sources.clear();
            self.phase = Phase::Failed(e.to_string());
          }
        }
        Vec::new()
      }
      Reply::Sources(result) if current == self.refresh_ticket => {
        self.refresh_ticket = None;
        match result {
          Ok(sources) => self.sources = sources,
          Err(e) => tracing::warn!(error = %e, "post-ingest refresh failed"),
        }
        Vec::new()
      }
      Reply::TestFiles(result) if current == self.load_ticket => {
        match result {
          Ok(files) => {
            self.selected = (!files.is_empty()).then_some(0);
            self.test_files = files;
          }
          Err(e) => {
            tracing::warn!(error = %e, "test files unavailable");
            self.test_files.clear();
            self.selected = None;
          }
        }
        Vec::new()
      }
      Reply::Processed(result) if current == self.action_ticket => {
        self.finish_action(result, None, PROCESS_REFRESH_DELAY, tickets)
      }
      Reply::Uploaded(result) if current == self.action_ticket => {
        let hint = self.upload.effective_source_id();
        self.finish_action(result, Some(hint), UPLOAD_REFRESH_DELAY, tickets)
      }
      _ => {
        tracing::debug!("discarding stale dashboard reply");
        Vec::new()
      }
    }
  }

  fn finish_action(
    &mut self,
    result: ApiResult<IngestStarted>,
    fallback_source: Option<String>,
    delay: Duration,
    tickets: &mut Tickets,
  ) -> Vec<Job> {
    let uploaded = fallback_source.is_some();
    self.action_ticket = None;
    match result {
      Ok(started) => {
        let source = started.source_id.or(fallback_source).unwrap_or_default();
        self.status = Some(if uploaded {
          IngestStatus::Uploaded(format!("Uploaded as source_id={source}"))
        } else {
          IngestStatus::Started(format!("Processing started for source_id={source}"))
        });
        let ticket = tickets.issue();
        self.refresh_ticket = Some(ticket);
        vec![Job::new(ticket, Fetch::SourcesAfter(delay))]
      }
      Err(e) => {
        self.status = Some(IngestStatus::Error(e.to_string()));
        Vec::new()
      }
    }
  }
}

impl Default for DashboardView {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use ingest_core::ApiError;
  use serde_json::json;

  use super::*;

  fn files(names: &[&str]) -> Vec<TestFile> {
    names
      .iter()
      .map(|n| serde_json::from_value(json!({ "name": n, "size": 2048 })).unwrap())
      .collect()
  }

  fn loaded() -> (DashboardView, Tickets) {
    let mut tickets = Tickets::default();
    let mut view = DashboardView::new();
    let jobs = view.load(&mut tickets);
    assert_eq!(jobs.len(), 2);
    let t = jobs[0].ticket;
    view.apply(t, Reply::TestFiles(Ok(files(&["a.csv", "b.json"]))), &mut tickets);
    (view, tickets)
  }

  #[test]
  fn first_test_file_is_preselected() {
    let (mut view, _) = loaded();
    assert_eq!(view.selected_file().map(|f| f.name.as_str()), Some("a.csv"));
    view.select_next();
    view.select_next();
    assert_eq!(view.selected, Some(1));
  }

  #[test]
  fn sparkline_uses_last_ten_sources() {
    let mut view = DashboardView::new();
    view.sources = (0..15u64)
      .map(|i| serde_json::from_value(json!({ "source_id": format!("s{i}"), "record_count": i })).unwrap())
      .collect();
    assert_eq!(view.spark_series(), (5..15).collect::<Vec<u64>>());
  }

  #[test]
  fn processing_schedules_one_delayed_refresh() {
    let (mut view, mut tickets) = loaded();
    let jobs = view.process_selected(&mut tickets);
    assert!(matches!(&jobs[0].fetch, Fetch::ProcessFile(n) if n == "a.csv"));
    assert!(matches!(view.status, Some(IngestStatus::Starting(_))));

    let started = IngestStarted {
      source_id: Some("a".into()),
      ..Default::default()
    };
    let refresh = view.apply(jobs[0].ticket, Reply::Processed(Ok(started)), &mut tickets);
    assert!(matches!(
      refresh.as_slice(),
      [Job { fetch: Fetch::SourcesAfter(d), .. }] if *d == PROCESS_REFRESH_DELAY
    ));
    assert_eq!(view.status.as_ref().map(IngestStatus::message), Some("Processing started for source_id=a"));

    let src = serde_json::from_value(json!({ "source_id": "a", "record_count": 3 })).unwrap();
    assert!(view.apply(refresh[0].ticket, Reply::Sources(Ok(vec![src])), &mut tickets).is_empty());
    assert_eq!(view.totals().records, 3);
  }

  #[test]
  fn process_without_selection_is_an_error() {
    let mut tickets = Tickets::default();
    let mut view = DashboardView::new();
    assert!(view.process_selected(&mut tickets).is_empty());
    assert!(view.status.as_ref().is_some_and(IngestStatus::is_error));
  }

  #[test]
  fn process_failure_schedules_nothing() {
    let (mut view, mut tickets) = loaded();
    let t = view.process_selected(&mut tickets)[0].ticket;
    let err = ApiError::Rejected("invalid file name".into());
    assert!(view.apply(t, Reply::Processed(Err(err)), &mut tickets).is_empty());
    assert_eq!(view.status, Some(IngestStatus::Error("invalid file name".into())));
  }

  #[test]
  fn upload_reads_file_and_falls_back_to_name_hint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.2024.csv");
    std::fs::File::create(&path).unwrap().write_all(b"a,b\n1,2\n").unwrap();

    let (mut view, mut tickets) = loaded();
    view.upload.open();
    for c in path.to_string_lossy().chars() {
      view.upload.push_char(c);
    }
    assert_eq!(view.upload.effective_source_id(), "sales");

    let jobs = view.submit_upload(&mut tickets);
    let Fetch::Upload(file) = &jobs[0].fetch else {
      panic!("expected an upload job");
    };
    assert_eq!(file.file_name, "sales.2024.csv");
    assert_eq!(file.bytes, b"a,b\n1,2\n");
    assert_eq!(file.source_id, None);

    let refresh = view.apply(jobs[0].ticket, Reply::Uploaded(Ok(IngestStarted::default())), &mut tickets);
    assert!(matches!(
      refresh.as_slice(),
      [Job { fetch: Fetch::SourcesAfter(d), .. }] if *d == UPLOAD_REFRESH_DELAY
    ));
    assert_eq!(view.status, Some(IngestStatus::Uploaded("Uploaded as source_id=sales".into())));
  }

  #[test]
  fn unreadable_upload_is_reported_without_request() {
    let mut tickets = Tickets::default();
    let mut view = DashboardView::new();
    view.upload.open();
    for c in "/definitely/not/here.csv".chars() {
      view.upload.push_char(c);
    }
    assert!(view.submit_upload(&mut tickets).is_empty());
    assert!(view.status.as_ref().is_some_and(IngestStatus::is_error));
  }
}
