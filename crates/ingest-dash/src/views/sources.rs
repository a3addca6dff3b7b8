//! Source list with backup and guarded delete.
//!
//! The list is fuzzy-filterable. Backup and delete run through the
//! [`DeleteWorkflow`] owned by the open modal; closing the modal drops the
//! workflow and forgets any pending backup or delete reply.

use std::collections::HashMap;

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use ingest_core::{
  ApiResult,
  model::{BackupCommand, DeleteOutcome, Source},
  workflow::DeleteWorkflow,
};

use super::{Fetch, Job, Phase, Reply, Ticket, Tickets};

/// What an in-flight backup/delete request was for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
  Backup(String),
  Delete(String),
}

impl Action {
  fn target(&self) -> &str {
    match self {
      Action::Backup(target) | Action::Delete(target) => target,
    }
  }
}

pub struct SourcesView {
  pub phase:         Phase,
  pub sources:       Vec<Source>,
  pub filter:        String,
  pub filter_active: bool,
  /// Cursor within the filtered list.
  pub cursor:        usize,
  /// The delete-confirmation modal, when open.
  pub modal:         Option<DeleteWorkflow>,
  /// Outcome of the last action, for the status bar.
  pub notice:        Option<String>,
  list_ticket:       Option<Ticket>,
  /// Every backup/delete request still awaiting its reply.
  pending:           HashMap<Ticket, Action>,
}

impl SourcesView {
  pub fn new() -> Self {
    Self {
      phase:         Phase::Idle,
      sources:       Vec::new(),
      filter:        String::new(),
      filter_active: false,
      cursor:        0,
      modal:         None,
      notice:        None,
      list_ticket:   None,
      pending:       HashMap::new(),
    }
  }

  pub fn load(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let ticket = tickets.issue();
    self.list_ticket = Some(ticket);
    self.phase = Phase::Loading;
    vec![Job::new(ticket, Fetch::Sources)]
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Sources matching the current filter, in backend order.
  pub fn filtered(&self) -> Vec<&Source> {
    if self.filter.is_empty() {
      return self.sources.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .sources
      .iter()
      .filter(|s| matcher.fuzzy_match(&s.source_id, &self.filter).is_some())
      .collect()
  }

  pub fn cursor_source(&self) -> Option<&Source> {
    self.filtered().get(self.cursor).copied()
  }

  pub fn cursor_down(&mut self) {
    if self.cursor + 1 < self.filtered().len() {
      self.cursor += 1;
    }
  }

  pub fn cursor_up(&mut self) { self.cursor = self.cursor.saturating_sub(1); }

  pub fn start_filter(&mut self) {
    self.filter_active = true;
    self.filter.clear();
    self.cursor = 0;
  }

  pub fn push_filter(&mut self, c: char) {
    self.filter.push(c);
    self.cursor = 0;
  }

  pub fn pop_filter(&mut self) {
    self.filter.pop();
    self.cursor = 0;
  }

  pub fn end_filter(&mut self, keep: bool) {
    self.filter_active = false;
    if !keep {
      self.filter.clear();
    }
    self.cursor = 0;
  }

  // ── Backup and delete ─────────────────────────────────────────────────────

  /// Backup action on the row under the cursor. On success the modal opens
  /// directly at the backed step.
  pub fn backup_selected(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let Some(target) = self.cursor_source().map(|s| s.source_id.clone()) else {
      return Vec::new();
    };
    self.notice = Some(format!("Requesting backup command for {target}…"));
    self.issue(tickets, Action::Backup(target))
  }

  /// Delete action on the row under the cursor: open the modal at the start
  /// step. Nothing is sent yet.
  pub fn open_delete(&mut self) {
    if let Some(target) = self.cursor_source().map(|s| s.source_id.clone()) {
      self.modal = Some(DeleteWorkflow::open(target));
      self.pending.clear();
    }
  }

  /// Generate (or, once backed, refresh) the backup command from the modal.
  pub fn request_backup(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let Some(wf) = self.modal.as_mut() else {
      return Vec::new();
    };
    let target = wf.request_backup().to_string();
    self.issue(tickets, Action::Backup(target))
  }

  /// Confirm the delete. A refused gate issues nothing and leaves the modal
  /// untouched; the reason goes to the status line.
  pub fn confirm_delete(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    let Some(wf) = self.modal.as_mut() else {
      return Vec::new();
    };
    match wf.authorize_delete().map(str::to_string) {
      Ok(target) => {
        wf.delete_started();
        tracing::info!(source = %target, "deleting dataset");
        self.notice = Some(format!("Deleting {target}…"));
        self.issue(tickets, Action::Delete(target))
      }
      Err(rejected) => {
        tracing::debug!(source = %wf.target(), %rejected, "delete refused client-side");
        self.notice = Some(rejected.to_string());
        Vec::new()
      }
    }
  }

  /// Close the modal, discarding the workflow and any pending reply.
  pub fn close_modal(&mut self) {
    self.modal = None;
    self.pending.clear();
  }

  fn issue(&mut self, tickets: &mut Tickets, action: Action) -> Vec<Job> {
    let ticket = tickets.issue();
    let fetch = match &action {
      Action::Backup(target) => Fetch::Backup(target.clone()),
      Action::Delete(target) => Fetch::Delete(target.clone()),
    };
    self.pending.insert(ticket, action);
    vec![Job::new(ticket, fetch)]
  }

  // ── Replies ───────────────────────────────────────────────────────────────

  /// Apply a reply; a successful delete asks for the list again.
  pub fn apply(&mut self, ticket: Ticket, reply: Reply, tickets: &mut Tickets) -> Vec<Job> {
    match reply {
      Reply::Sources(result) if self.list_ticket == Some(ticket) => {
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
        self.cursor = self.cursor.min(self.filtered().len().saturating_sub(1));
        Vec::new()
      }
      Reply::Backup(result) => self.apply_backup(ticket, result),
      Reply::Deleted(result) => self.apply_delete(ticket, result, tickets),
      _ => {
        tracing::debug!("discarding stale sources reply");
        Vec::new()
      }
    }
  }

  fn take_action(&mut self, ticket: Ticket) -> Option<Action> {
    let action = self.pending.remove(&ticket);
    if action.is_none() {
      tracing::debug!("discarding stale action reply");
    }
    action
  }

  fn apply_backup(&mut self, ticket: Ticket, result: ApiResult<BackupCommand>) -> Vec<Job> {
    let Some(Action::Backup(target)) = self.take_action(ticket) else {
      return Vec::new();
    };
    let modal = self.modal.as_mut().filter(|wf| wf.target() == target);
    match (result, modal) {
      (Ok(command), Some(wf)) => {
        wf.backup_succeeded(command);
        self.notice = None;
      }
      (Ok(command), None) => {
        self.modal = Some(DeleteWorkflow::with_backup(target, command));
        self.notice = None;
      }
      (Err(e), Some(wf)) => wf.backup_failed(e.to_string()),
      (Err(e), None) => {
        tracing::warn!(source = %target, error = %e, "backup command failed");
        self.notice = Some(format!("Backup failed: {e}"));
      }
    }
    Vec::new()
  }

  fn apply_delete(
    &mut self,
    ticket: Ticket,
    result: ApiResult<DeleteOutcome>,
    tickets: &mut Tickets,
  ) -> Vec<Job> {
    let Some(Action::Delete(target)) = self.take_action(ticket) else {
      return Vec::new();
    };
    match result {
      Ok(outcome) => {
        tracing::info!(source = %target, moved_to = ?outcome.moved_to, "dataset deleted");
        if self.modal.as_ref().is_some_and(|wf| wf.target() == target) {
          self.modal = None;
        }
        // Duplicate deletes and backup refreshes for a dataset that is gone
        // have nothing left to report.
        self.pending.retain(|_, action| action.target() != target);
        self.notice = Some(match outcome.moved_to {
          Some(path) => format!("Deleted {target} (moved to {path})"),
          None => format!("Deleted {target}"),
        });
        self.load(tickets)
      }
      Err(e) => {
        tracing::warn!(source = %target, error = %e, "delete failed");
        if let Some(wf) = self.modal.as_mut().filter(|wf| wf.target() == target) {
          wf.delete_failed(e.to_string());
        }
        self.notice = Some(format!("Delete failed: {e}"));
        Vec::new()
      }
    }
  }
}

impl Default for SourcesView {
  fn default() -> Self { Self::new() }
}
