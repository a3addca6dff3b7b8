//! Paginated record table for one source.
//!
//! `Idle → Loading → Ready | Failed`, re-entering `Loading` whenever the page
//! or page size changes. Schema and records are fetched independently; a
//! schema failure only degrades the column list.

use std::{cell::Cell, ops::Range};

use ingest_core::{
  backend::PageRequest,
  demo::{DemoData, is_demo},
  model::Record,
  schema::{SchemaSnapshot, columns},
};

use super::{Fetch, Job, Phase, Reply, Ticket, Tickets};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Page sizes offered by the size toggle.
pub const PAGE_SIZES: [u32; 4] = [25, 50, 100, 200];
/// Characters of compact JSON shown per row.
pub const PREVIEW_CHARS: usize = 120;

pub struct RecordsView {
  pub source_id:      String,
  pub page:           u32,
  pub limit:          u32,
  pub phase:          Phase,
  pub records:        Vec<Record>,
  /// Latest schema, if it could be fetched; drives the column list.
  pub schema:         Option<SchemaSnapshot>,
  /// Record cursor within the current page.
  pub cursor:         usize,
  /// Index of the record open in the inspect panel.
  pub inspected:      Option<usize>,
  pub inspect_scroll: u16,
  /// First materialised row; adjusted while rendering.
  offset:             Cell<usize>,
  ticket:             Option<Ticket>,
}

impl RecordsView {
  pub fn new(source_id: impl Into<String>, limit: u32) -> Self {
    Self {
      source_id: source_id.into(),
      page: 0,
      limit,
      phase: Phase::Idle,
      records: Vec::new(),
      schema: None,
      cursor: 0,
      inspected: None,
      inspect_scroll: 0,
      offset: Cell::new(0),
      ticket: None,
    }
  }

  pub fn is_demo(&self) -> bool { is_demo(&self.source_id) }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// (Re)load the current page. Demo sources are filled in place and need no
  /// jobs.
  pub fn load(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    self.records.clear();
    self.schema = None;
    self.inspected = None;
    self.cursor = 0;
    self.offset.set(0);

    if self.is_demo() {
      let demo = DemoData::now();
      self.schema = Some(demo.record_schema());
      self.records = demo.records;
      self.ticket = None;
      self.phase = Phase::Ready;
      return Vec::new();
    }

    let ticket = tickets.issue();
    self.ticket = Some(ticket);
    self.phase = Phase::Loading;
    tracing::debug!(source = %self.source_id, page = self.page, limit = self.limit, "loading records");
    vec![
      Job::new(ticket, Fetch::RecordsSchema(self.source_id.clone())),
      Job::new(
        ticket,
        Fetch::Records(self.source_id.clone(), PageRequest {
          limit: self.limit,
          page:  self.page,
        }),
      ),
    ]
  }

  /// Apply a reply. Returns `false` if it was stale or not meant for this
  /// view.
  pub fn apply(&mut self, ticket: Ticket, reply: Reply) -> bool {
    if self.ticket != Some(ticket) {
      tracing::debug!(source = %self.source_id, "discarding stale records reply");
      return false;
    }
    match reply {
      Reply::RecordsSchema(Ok(schema)) => self.schema = Some(schema),
      Reply::RecordsSchema(Err(e)) => {
        tracing::warn!(source = %self.source_id, error = %e, "schema unavailable");
        self.schema = None;
      }
      Reply::Records(Ok(records)) => {
        self.records = records;
        self.phase = Phase::Ready;
      }
      Reply::Records(Err(e)) => {
        self.records.clear();
        self.phase = Phase::Failed(e.to_string());
      }
      _ => return false,
    }
    true
  }

  pub fn columns(&self) -> Vec<String> { columns(self.schema.as_ref()) }

  // ── Pagination ────────────────────────────────────────────────────────────

  /// Always enabled: the total page count is unknown.
  pub fn next_page(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    self.page += 1;
    self.load(tickets)
  }

  /// Clamped at page 0; staying on page 0 does not reload.
  pub fn prev_page(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let page = self.page.saturating_sub(1);
    if page == self.page {
      return Vec::new();
    }
    self.page = page;
    self.load(tickets)
  }

  pub fn set_limit(&mut self, limit: u32, tickets: &mut Tickets) -> Vec<Job> {
    if limit == self.limit || limit == 0 {
      return Vec::new();
    }
    self.limit = limit;
    self.load(tickets)
  }

  /// Step to the next entry of [`PAGE_SIZES`].
  pub fn cycle_limit(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let next = PAGE_SIZES
      .iter()
      .copied()
      .find(|&s| s > self.limit)
      .unwrap_or(PAGE_SIZES[0]);
    self.set_limit(next, tickets)
  }

  // ── Cursor and window ─────────────────────────────────────────────────────

  pub fn cursor_down(&mut self) {
    if self.cursor + 1 < self.records.len() {
      self.cursor += 1;
    }
  }

  pub fn cursor_up(&mut self) { self.cursor = self.cursor.saturating_sub(1); }

  pub fn cursor_by(&mut self, delta: isize) {
    let last = self.records.len().saturating_sub(1);
    self.cursor = self.cursor.saturating_add_signed(delta).min(last);
  }

  /// Rows to materialise for a viewport of `height` rows. Only these rows
  /// are ever built, whatever the page length.
  pub fn visible_range(&self, height: usize) -> Range<usize> {
    let total = self.records.len();
    let offset = scroll_offset(self.offset.get(), self.cursor, height, total);
    self.offset.set(offset);
    offset..(offset + height).min(total)
  }

  // ── Inspect / download ────────────────────────────────────────────────────

  pub fn inspect(&mut self) {
    if self.cursor < self.records.len() {
      self.inspected = Some(self.cursor);
      self.inspect_scroll = 0;
    }
  }

  pub fn close_inspect(&mut self) { self.inspected = None; }

  pub fn inspected_record(&self) -> Option<(usize, &Record)> {
    let i = self.inspected?;
    self.records.get(i).map(|r| (i, r))
  }

  pub fn cursor_record(&self) -> Option<(usize, &Record)> {
    self.records.get(self.cursor).map(|r| (self.cursor, r))
  }
}

/// Keep `cursor` inside `[offset, offset + height)`, moving `prev` as little
/// as possible.
pub fn scroll_offset(prev: usize, cursor: usize, height: usize, total: usize) -> usize {
  if height == 0 || total == 0 {
    return 0;
  }
  let offset = prev.min(total.saturating_sub(height));
  if cursor < offset {
    cursor
  } else if cursor >= offset + height {
    cursor + 1 - height
  } else {
    offset
  }
}
