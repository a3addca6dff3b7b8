//! Application state machine and event dispatcher.
//!
//! Exactly one view is mounted at a time. Views hand back [`Job`]s; the app
//! spawns each on the tokio runtime and the result comes back as a [`Msg`]
//! on an unbounded channel, which the event loop drains between frames.
//! Replacing the mounted view is the unmount: its tickets are never matched
//! again, so late replies are dropped.

use std::{path::PathBuf, sync::Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ingest_core::{
  backend::IngestBackend,
  demo::{DEMO_SOURCE_ID, DemoData},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
  export,
  views::{
    Fetch, Job, Msg, Reply, Tickets,
    dashboard::DashboardView,
    records::RecordsView,
    schema::SchemaView,
    sources::SourcesView,
    visualize::{VisualizeView, sample_page},
  },
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Dashboard,
  Sources,
  Demo,
  Records,
  Schema,
  Visualize,
}

impl Screen {
  /// Screens reachable with Tab; the rest need a source.
  pub const TOP_LEVEL: [Screen; 3] = [Screen::Dashboard, Screen::Sources, Screen::Demo];

  pub const ALL: [Screen; 6] = [
    Screen::Dashboard,
    Screen::Sources,
    Screen::Demo,
    Screen::Records,
    Screen::Schema,
    Screen::Visualize,
  ];

  pub fn title(self) -> &'static str {
    match self {
      Self::Dashboard => "Dashboard",
      Self::Sources => "Sources",
      Self::Demo => "Demo",
      Self::Records => "Records",
      Self::Schema => "Schema",
      Self::Visualize => "Visualize",
    }
  }
}

/// The mounted view.
pub enum View {
  Dashboard(DashboardView),
  Sources(SourcesView),
  Demo(DemoData),
  Records(RecordsView),
  Schema(SchemaView),
  Visualize(VisualizeView),
}

impl View {
  pub fn screen(&self) -> Screen {
    match self {
      Self::Dashboard(_) => Screen::Dashboard,
      Self::Sources(_) => Screen::Sources,
      Self::Demo(_) => Screen::Demo,
      Self::Records(_) => Screen::Records,
      Self::Schema(_) => Screen::Schema,
      Self::Visualize(_) => Screen::Visualize,
    }
  }

  /// The source a per-source view is showing.
  pub fn source_id(&self) -> Option<&str> {
    match self {
      Self::Records(v) => Some(&v.source_id),
      Self::Schema(v) => Some(&v.source_id),
      Self::Visualize(v) => Some(&v.source_id),
      _ => None,
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<B> {
  pub view:       View,
  /// Where Esc returns to from a per-source view.
  pub back:       Screen,
  /// One-line status message shown in the status bar.
  pub status_msg: String,
  pub export_dir: PathBuf,
  pub page_size:  u32,
  backend:        Arc<B>,
  tickets:        Tickets,
  tx:             UnboundedSender<Msg>,
  rx:             UnboundedReceiver<Msg>,
  /// Spawned jobs whose reply has not been applied yet.
  in_flight:      usize,
}

impl<B: IngestBackend + 'static> App<B> {
  pub fn new(backend: B, export_dir: PathBuf, page_size: u32) -> Self {
    let (tx, rx) = unbounded_channel();
    Self {
      view: View::Demo(DemoData::now()),
      back: Screen::Sources,
      status_msg: String::new(),
      export_dir,
      page_size,
      backend: Arc::new(backend),
      tickets: Tickets::default(),
      tx,
      rx,
      in_flight: 0,
    }
  }

  #[cfg(test)]
  pub fn backend(&self) -> &B { &self.backend }

  pub fn screen(&self) -> Screen { self.view.screen() }

  pub fn is_busy(&self) -> bool { self.in_flight > 0 }

  /// Mount the first view: the record view for `source`, else the dashboard.
  pub fn start(&mut self, source: Option<String>) {
    match source {
      Some(source) => self.open_source(Screen::Records, source),
      None => self.navigate(Screen::Dashboard),
    }
  }

  // ── Mounting ──────────────────────────────────────────────────────────────

  /// Mount a top-level screen.
  pub fn navigate(&mut self, screen: Screen) {
    let jobs = match screen {
      Screen::Dashboard => {
        let mut v = DashboardView::new();
        let jobs = v.load(&mut self.tickets);
        self.view = View::Dashboard(v);
        jobs
      }
      Screen::Sources => {
        let mut v = SourcesView::new();
        let jobs = v.load(&mut self.tickets);
        self.view = View::Sources(v);
        jobs
      }
      Screen::Demo => {
        self.view = View::Demo(DemoData::now());
        Vec::new()
      }
      Screen::Records | Screen::Schema | Screen::Visualize => {
        match self.view.source_id().map(str::to_string) {
          Some(source) => return self.open_source(screen, source),
          None => return,
        }
      }
    };
    self.status_msg.clear();
    self.spawn(jobs);
  }

  /// Mount a per-source view.
  pub fn open_source(&mut self, screen: Screen, source_id: String) {
    tracing::debug!(screen = screen.title(), source = %source_id, "opening view");
    let jobs = match screen {
      Screen::Records => {
        let mut v = RecordsView::new(source_id, self.page_size);
        let jobs = v.load(&mut self.tickets);
        self.view = View::Records(v);
        jobs
      }
      Screen::Schema => {
        let mut v = SchemaView::new(source_id);
        let jobs = v.load(&mut self.tickets);
        self.view = View::Schema(v);
        jobs
      }
      Screen::Visualize => {
        let mut v = VisualizeView::new(source_id);
        let jobs = v.load(&mut self.tickets);
        self.view = View::Visualize(v);
        jobs
      }
      other => return self.navigate(other),
    };
    self.status_msg.clear();
    self.spawn(jobs);
  }

  fn go_back(&mut self) {
    let back = self.back;
    self.navigate(back);
  }

  // ── Jobs ──────────────────────────────────────────────────────────────────

  fn spawn(&mut self, jobs: Vec<Job>) {
    for job in jobs {
      self.in_flight += 1;
      let backend = Arc::clone(&self.backend);
      let tx = self.tx.clone();
      tokio::spawn(async move {
        let reply = run_job(backend.as_ref(), job.fetch).await;
        // The receiver only goes away when the app is shutting down.
        let _ = tx.send(Msg {
          ticket: job.ticket,
          reply,
        });
      });
    }
  }

  /// Route a reply to the mounted view. Views drop replies whose ticket is
  /// not current.
  pub fn apply(&mut self, msg: Msg) {
    self.in_flight = self.in_flight.saturating_sub(1);
    let Msg { ticket, reply } = msg;
    let jobs = match &mut self.view {
      View::Dashboard(v) => v.apply(ticket, reply, &mut self.tickets),
      View::Sources(v) => v.apply(ticket, reply, &mut self.tickets),
      View::Records(v) => {
        v.apply(ticket, reply);
        Vec::new()
      }
      View::Schema(v) => {
        v.apply(ticket, reply);
        Vec::new()
      }
      View::Visualize(v) => v.apply(ticket, reply),
      View::Demo(_) => Vec::new(),
    };
    self.spawn(jobs);
  }

  /// Apply every reply that has already arrived. Returns whether any did.
  pub fn pump(&mut self) -> bool {
    let mut applied = false;
    while let Ok(msg) = self.rx.try_recv() {
      self.apply(msg);
      applied = true;
    }
    applied
  }

  /// Wait until every spawned job, including follow-ups, has been applied.
  #[cfg(test)]
  pub async fn settle(&mut self) {
    while self.in_flight > 0 {
      match self.rx.recv().await {
        Some(msg) => self.apply(msg),
        None => break,
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    // Text entry owns the keyboard.
    if self.handle_text_key(key) {
      return true;
    }

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab => self.cycle_screen(1),
      KeyCode::BackTab => self.cycle_screen(-1),
      _ => match self.screen() {
        Screen::Dashboard => self.handle_dashboard_key(key),
        Screen::Sources => self.handle_sources_key(key),
        Screen::Demo => self.handle_demo_key(key),
        Screen::Records => self.handle_records_key(key),
        Screen::Schema | Screen::Visualize => self.handle_detail_key(key),
      },
    }
    true
  }

  fn cycle_screen(&mut self, step: isize) {
    let tops = Screen::TOP_LEVEL;
    let current = tops
      .iter()
      .position(|s| *s == self.screen())
      .unwrap_or_else(|| tops.iter().position(|s| *s == self.back).unwrap_or(0));
    let next = (current as isize + step).rem_euclid(tops.len() as isize) as usize;
    self.navigate(tops[next]);
  }

  /// Keys for an active text field. Returns `false` if none is active.
  fn handle_text_key(&mut self, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match &mut self.view {
      View::Dashboard(v) if v.upload.is_open() => {
        match key.code {
          KeyCode::Esc => v.upload.close(),
          KeyCode::Tab => v.upload.toggle_focus(),
          KeyCode::Backspace => v.upload.pop_char(),
          KeyCode::Enter => {
            let jobs = v.submit_upload(&mut self.tickets);
            self.spawn(jobs);
          }
          KeyCode::Char(c) => v.upload.push_char(c),
          _ => {}
        }
        true
      }
      View::Sources(v) if v.modal.is_some() => {
        match key.code {
          KeyCode::Esc => v.close_modal(),
          KeyCode::F(5) => {
            let jobs = v.request_backup(&mut self.tickets);
            self.spawn(jobs);
          }
          KeyCode::Char('r') if ctrl => {
            let jobs = v.request_backup(&mut self.tickets);
            self.spawn(jobs);
          }
          KeyCode::Enter => {
            let jobs = v.confirm_delete(&mut self.tickets);
            self.spawn(jobs);
          }
          KeyCode::Backspace => {
            if let Some(wf) = v.modal.as_mut() {
              wf.pop_char();
            }
          }
          KeyCode::Char(c) if !ctrl => {
            if let Some(wf) = v.modal.as_mut() {
              wf.push_char(c);
            }
          }
          _ => {}
        }
        true
      }
      View::Sources(v) if v.filter_active => {
        match key.code {
          KeyCode::Esc => v.end_filter(false),
          KeyCode::Enter => v.end_filter(true),
          KeyCode::Backspace => v.pop_filter(),
          KeyCode::Char(c) => v.push_filter(c),
          _ => {}
        }
        true
      }
      _ => false,
    }
  }

  fn handle_dashboard_key(&mut self, key: KeyEvent) {
    let View::Dashboard(v) = &mut self.view else { return };
    let jobs = match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        v.select_next();
        Vec::new()
      }
      KeyCode::Up | KeyCode::Char('k') => {
        v.select_prev();
        Vec::new()
      }
      KeyCode::Char('p') | KeyCode::Enter => v.process_selected(&mut self.tickets),
      KeyCode::Char('u') => {
        v.upload.open();
        Vec::new()
      }
      KeyCode::Char('r') => v.load(&mut self.tickets),
      _ => Vec::new(),
    };
    self.spawn(jobs);
  }

  fn handle_sources_key(&mut self, key: KeyEvent) {
    let View::Sources(v) = &mut self.view else { return };
    let screen = match key.code {
      KeyCode::Enter | KeyCode::Char('l') => Some(Screen::Records),
      KeyCode::Char('s') => Some(Screen::Schema),
      KeyCode::Char('v') => Some(Screen::Visualize),
      _ => None,
    };
    if let Some(screen) = screen {
      if let Some(source) = v.cursor_source().map(|s| s.source_id.clone()) {
        self.back = Screen::Sources;
        self.open_source(screen, source);
      }
      return;
    }

    let jobs = match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        v.cursor_down();
        Vec::new()
      }
      KeyCode::Up | KeyCode::Char('k') => {
        v.cursor_up();
        Vec::new()
      }
      KeyCode::Char('/') => {
        v.start_filter();
        Vec::new()
      }
      KeyCode::Char('b') => v.backup_selected(&mut self.tickets),
      KeyCode::Char('d') => {
        v.open_delete();
        Vec::new()
      }
      KeyCode::Char('r') => v.load(&mut self.tickets),
      _ => Vec::new(),
    };
    self.spawn(jobs);
  }

  fn handle_demo_key(&mut self, key: KeyEvent) {
    let screen = match key.code {
      KeyCode::Enter | KeyCode::Char('l') => Screen::Records,
      KeyCode::Char('s') => Screen::Schema,
      KeyCode::Char('v') => Screen::Visualize,
      _ => return,
    };
    self.back = Screen::Demo;
    self.open_source(screen, DEMO_SOURCE_ID.to_string());
  }

  fn handle_records_key(&mut self, key: KeyEvent) {
    let View::Records(v) = &mut self.view else { return };

    if v.inspected.is_some() {
      match key.code {
        KeyCode::Esc | KeyCode::Enter => v.close_inspect(),
        KeyCode::Down | KeyCode::Char('j') => v.inspect_scroll = v.inspect_scroll.saturating_add(1),
        KeyCode::Up | KeyCode::Char('k') => v.inspect_scroll = v.inspect_scroll.saturating_sub(1),
        KeyCode::Char('w') => self.download_cursor_record(),
        _ => {}
      }
      return;
    }

    let jobs = match key.code {
      KeyCode::Esc | KeyCode::Char('h') => return self.go_back(),
      KeyCode::Down | KeyCode::Char('j') => {
        v.cursor_down();
        Vec::new()
      }
      KeyCode::Up | KeyCode::Char('k') => {
        v.cursor_up();
        Vec::new()
      }
      KeyCode::PageDown => {
        v.cursor_by(10);
        Vec::new()
      }
      KeyCode::PageUp => {
        v.cursor_by(-10);
        Vec::new()
      }
      KeyCode::Char('n') | KeyCode::Right => v.next_page(&mut self.tickets),
      KeyCode::Char('p') | KeyCode::Left => v.prev_page(&mut self.tickets),
      KeyCode::Char('+') => v.cycle_limit(&mut self.tickets),
      KeyCode::Char('r') => v.load(&mut self.tickets),
      KeyCode::Enter => {
        v.inspect();
        Vec::new()
      }
      KeyCode::Char('w') => {
        self.download_cursor_record();
        Vec::new()
      }
      KeyCode::Char('s') => return self.switch_source_view(Screen::Schema),
      KeyCode::Char('v') => return self.switch_source_view(Screen::Visualize),
      _ => Vec::new(),
    };
    self.spawn(jobs);
  }

  /// Schema and visualize views.
  fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Char('h') => self.go_back(),
      KeyCode::Char('r') => {
        let jobs = match &mut self.view {
          View::Schema(v) => v.load(&mut self.tickets),
          View::Visualize(v) => v.load(&mut self.tickets),
          _ => Vec::new(),
        };
        self.spawn(jobs);
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if let View::Schema(v) = &mut self.view {
          v.scroll = v.scroll.saturating_add(1);
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if let View::Schema(v) = &mut self.view {
          v.scroll = v.scroll.saturating_sub(1);
        }
      }
      KeyCode::Char('e') => self.switch_source_view(Screen::Records),
      KeyCode::Char('s') => self.switch_source_view(Screen::Schema),
      KeyCode::Char('v') => self.switch_source_view(Screen::Visualize),
      _ => {}
    }
  }

  fn switch_source_view(&mut self, screen: Screen) {
    if screen == self.screen() {
      return;
    }
    if let Some(source) = self.view.source_id().map(str::to_string) {
      self.open_source(screen, source);
    }
  }

  // ── Download ──────────────────────────────────────────────────────────────

  fn download_cursor_record(&mut self) {
    let View::Records(v) = &self.view else { return };
    let picked = v.inspected_record().or_else(|| v.cursor_record());
    let Some((index, record)) = picked else {
      self.status_msg = "No record selected".into();
      return;
    };
    self.status_msg = match export::save_record(&self.export_dir, &v.source_id, index, record) {
      Ok(path) => format!("Saved {}", path.display()),
      Err(e) => {
        tracing::warn!(error = %e, "record export failed");
        format!("Download failed: {e:#}")
      }
    };
  }
}

// ─── Job runner ───────────────────────────────────────────────────────────────

/// Perform one backend call.
async fn run_job<B: IngestBackend>(backend: &B, fetch: Fetch) -> Reply {
  match fetch {
    Fetch::Sources => Reply::Sources(backend.list_sources().await),
    Fetch::SourcesAfter(delay) => {
      tokio::time::sleep(delay).await;
      Reply::Sources(backend.list_sources().await)
    }
    Fetch::TestFiles => Reply::TestFiles(backend.list_test_files().await),
    Fetch::ProcessFile(name) => Reply::Processed(backend.process_test_file(&name).await),
    Fetch::Upload(file) => Reply::Uploaded(backend.upload_file(file).await),
    Fetch::RecordsSchema(source) => Reply::RecordsSchema(backend.schema(&source).await),
    Fetch::Records(source, page) => Reply::Records(backend.records(&source, page).await),
    Fetch::Schema(source) => Reply::Schema(backend.schema(&source).await),
    Fetch::SchemaHistory(source) => Reply::SchemaHistory(backend.schema_history(&source).await),
    Fetch::Summary(source) => Reply::Summary(backend.visualize_summary(&source).await),
    Fetch::SummarySample(source) => {
      Reply::SummarySample(backend.records(&source, sample_page()).await)
    }
    Fetch::Backup(source) => Reply::Backup(backend.create_backup(&source).await),
    Fetch::Delete(source) => Reply::Deleted(backend.delete_dataset(&source).await),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use ingest_core::{
    ApiError, ApiResult, ErrorBody,
    backend::PageRequest,
    model::{BackupCommand, DeleteOutcome, IngestStarted, Record, Source, TestFile, UploadFile},
    schema::SchemaSnapshot,
    summary::VisualizeSummary,
  };
  use serde_json::json;

  use super::*;
  use crate::views::{Phase, visualize::VisualizeState};

  /// Records every call as `"<op> <arg>"` and serves canned data.
  #[derive(Default)]
  struct Recording {
    calls:           Mutex<Vec<String>>,
    sources:         Vec<Source>,
    summary_missing: bool,
  }

  impl Recording {
    fn with_sources(ids: &[&str]) -> Self {
      Self {
        sources: ids
          .iter()
          .map(|id| {
            serde_json::from_value(json!({
              "source_id": id, "record_count": 10, "chunks": 2, "schema_version": 1
            }))
            .unwrap()
          })
          .collect(),
        ..Default::default()
      }
    }

    fn log(&self, call: String) { self.calls.lock().unwrap().push(call); }

    fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }

    fn count(&self, prefix: &str) -> usize {
      self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
  }

  impl IngestBackend for Recording {
    async fn list_sources(&self) -> ApiResult<Vec<Source>> {
      self.log("sources".into());
      Ok(self.sources.clone())
    }

    async fn visualize_summary<'a>(
      &'a self,
      source_id: &'a str,
    ) -> ApiResult<Option<VisualizeSummary>> {
      self.log(format!("summary {source_id}"));
      if self.summary_missing {
        return Err(ApiError::Status {
          status: 404,
          body:   ErrorBody::Json(json!({ "detail": "not found" })),
        });
      }
      Ok(Some(VisualizeSummary::default()))
    }

    async fn schema<'a>(&'a self, source_id: &'a str) -> ApiResult<SchemaSnapshot> {
      self.log(format!("schema {source_id}"));
      Ok(serde_json::from_value(json!({ "fields": ["source", "page"] })).unwrap())
    }

    async fn schema_history<'a>(&'a self, source_id: &'a str) -> ApiResult<Vec<SchemaSnapshot>> {
      self.log(format!("history {source_id}"));
      Ok(Vec::new())
    }

    async fn records<'a>(&'a self, source_id: &'a str, page: PageRequest) -> ApiResult<Vec<Record>> {
      self.log(format!("records {source_id} {} {}", page.limit, page.page));
      let records = (0..3)
        .map(|i| {
          serde_json::from_value(json!({ "source": source_id, "page": page.page, "n": i })).unwrap()
        })
        .collect();
      Ok(records)
    }

    async fn create_backup<'a>(&'a self, source_id: &'a str) -> ApiResult<BackupCommand> {
      self.log(format!("backup {source_id}"));
      Ok(BackupCommand {
        command:     format!("mongodump --collection data_{source_id}"),
        backup_path: None,
      })
    }

    async fn delete_dataset<'a>(&'a self, source_id: &'a str) -> ApiResult<DeleteOutcome> {
      self.log(format!("delete {source_id}"));
      Ok(DeleteOutcome::default())
    }

    async fn list_test_files(&self) -> ApiResult<Vec<TestFile>> {
      self.log("test-files".into());
      Ok(Vec::new())
    }

    async fn process_test_file<'a>(&'a self, filename: &'a str) -> ApiResult<IngestStarted> {
      self.log(format!("process {filename}"));
      Ok(IngestStarted::default())
    }

    async fn upload_file(&self, file: UploadFile) -> ApiResult<IngestStarted> {
      self.log(format!("upload {}", file.file_name));
      Ok(IngestStarted::default())
    }
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn type_text(app: &mut App<Recording>, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
  }

  async fn app_on_sources(ids: &[&str]) -> App<Recording> {
    let mut app = App::new(Recording::with_sources(ids), PathBuf::from("."), 100);
    app.navigate(Screen::Sources);
    app.settle().await;
    app
  }

  #[tokio::test]
  async fn sources_row_shows_counters() {
    let app = app_on_sources(&["s1"]).await;
    let View::Sources(v) = &app.view else { panic!("sources not mounted") };
    assert_eq!(v.phase, Phase::Ready);
    let rows: Vec<_> = v.filtered().into_iter().map(crate::ui::sources::row_cells).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "s1");
    assert_eq!(rows[0][2..], ["10", "1", "2"]);
  }

  #[tokio::test]
  async fn demo_ids_never_reach_the_backend() {
    let mut app = App::new(Recording::default(), PathBuf::from("."), 100);
    for source in ["demo_local", "DEMO", "Demo-2"] {
      for screen in [Screen::Records, Screen::Schema, Screen::Visualize] {
        app.open_source(screen, source.to_string());
        app.settle().await;
      }
    }
    assert!(app.backend().calls().is_empty(), "{:?}", app.backend().calls());

    app.open_source(Screen::Records, "demo_local".into());
    let View::Records(v) = &app.view else { panic!("records not mounted") };
    assert_eq!(v.records.len(), 24);
  }

  #[tokio::test]
  async fn confirmed_delete_issues_exactly_one_request() {
    let mut app = app_on_sources(&["s1"]).await;
    app.handle_key(key(KeyCode::Char('d')));
    app.handle_key(key(KeyCode::F(5)));
    app.settle().await;
    type_text(&mut app, "s1");
    app.handle_key(key(KeyCode::Enter));
    app.settle().await;

    assert_eq!(app.backend().count("delete"), 1);
    assert_eq!(app.backend().calls().last().map(String::as_str), Some("sources"));
    let View::Sources(v) = &app.view else { panic!("sources not mounted") };
    assert!(v.modal.is_none());
  }

  #[tokio::test]
  async fn mismatched_confirmation_never_deletes() {
    let mut app = app_on_sources(&["s1"]).await;
    app.handle_key(key(KeyCode::Char('b')));
    app.settle().await;
    for typed in ["S1", " s1", "s"] {
      let View::Sources(v) = &mut app.view else { panic!("sources not mounted") };
      v.modal.as_mut().unwrap().set_confirmation(typed);
      app.handle_key(key(KeyCode::Enter));
      app.settle().await;
    }
    assert_eq!(app.backend().count("delete"), 0);
  }

  #[tokio::test]
  async fn delete_before_backup_is_refused() {
    let mut app = app_on_sources(&["s1"]).await;
    app.handle_key(key(KeyCode::Char('d')));
    type_text(&mut app, "s1");
    app.handle_key(key(KeyCode::Enter));
    app.settle().await;
    assert_eq!(app.backend().count("delete"), 0);
    assert_eq!(app.backend().count("backup"), 0);
  }

  #[tokio::test]
  async fn superseded_source_results_are_dropped() {
    let mut app = App::new(Recording::default(), PathBuf::from("."), 50);
    app.open_source(Screen::Records, "s1".into());
    app.open_source(Screen::Records, "s2".into());
    app.settle().await;

    let View::Records(v) = &app.view else { panic!("records not mounted") };
    assert_eq!(v.phase, Phase::Ready);
    assert!(v.records.iter().all(|r| r.0.get("source") == Some(&json!("s2"))));
    assert_eq!(app.backend().count("records s1 50 0"), 1);
  }

  #[tokio::test]
  async fn paging_requests_next_page_and_clamps_at_zero() {
    let mut app = App::new(Recording::default(), PathBuf::from("."), 100);
    app.open_source(Screen::Records, "s1".into());
    app.settle().await;
    app.handle_key(key(KeyCode::Char('p')));
    app.handle_key(key(KeyCode::Char('n')));
    app.settle().await;

    assert_eq!(app.backend().count("records s1 100 0"), 1);
    assert_eq!(app.backend().count("records s1 100 1"), 1);
    let View::Records(v) = &app.view else { panic!("records not mounted") };
    assert_eq!(v.page, 1);
  }

  #[tokio::test]
  async fn missing_summary_samples_two_hundred_records() {
    let backend = Recording {
      summary_missing: true,
      ..Default::default()
    };
    let mut app = App::new(backend, PathBuf::from("."), 100);
    app.open_source(Screen::Visualize, "s1".into());
    app.settle().await;

    assert_eq!(app.backend().calls(), ["summary s1", "records s1 200 0"]);
    let View::Visualize(v) = &app.view else { panic!("visualize not mounted") };
    let VisualizeState::Ready(summary) = &v.state else { panic!("no summary: {:?}", v.state) };
    assert!(summary.is_approximate());
    assert_eq!(summary.summary.top_fields.len(), 3);
  }

  #[tokio::test]
  async fn download_writes_the_cursor_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::new(Recording::default(), dir.path().to_path_buf(), 100);
    app.open_source(Screen::Records, "s1".into());
    app.settle().await;
    app.handle_key(key(KeyCode::Char('j')));
    app.handle_key(key(KeyCode::Char('w')));

    let written = std::fs::read_to_string(dir.path().join("s1_record_1.json")).unwrap();
    assert!(written.contains("\"n\": 1"));
    assert!(app.status_msg.starts_with("Saved"));
  }

  #[tokio::test]
  async fn tab_cycles_top_level_screens() {
    let mut app = App::new(Recording::default(), PathBuf::from("."), 100);
    app.start(None);
    assert_eq!(app.screen(), Screen::Dashboard);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.screen(), Screen::Sources);
    app.handle_key(key(KeyCode::BackTab));
    app.handle_key(key(KeyCode::BackTab));
    assert_eq!(app.screen(), Screen::Demo);
    app.settle().await;
  }
}
