//! Guarded dataset deletion.
//!
//! A delete is authorised only after two independent steps: the backend
//! produced a backup command for the target (`Backed`), and the operator
//! typed the target's source id exactly. The workflow exists only while the
//! confirmation modal is open; dropping it discards everything.
//!
//! ```text
//! open ──► Start ──backup ok──► Backed
//!            ▲                    │
//!            └──── refresh ───────┘   (re-requests the backup)
//! ```

use thiserror::Error;

use crate::model::BackupCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
  /// No backup command on hand yet.
  Start,
  /// The backend returned a backup command for the target.
  Backed,
}

/// Progress of the most recent backup-command request.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupState {
  NotRequested,
  Pending,
  Ready(BackupCommand),
  /// Shown in place of the command text.
  Failed(String),
}

/// Why a delete attempt was refused before any request was issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteRejected {
  #[error("generate the backup command before deleting")]
  NotBackedUp,

  #[error("type the source id `{0}` exactly to confirm deletion")]
  ConfirmationMismatch(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteWorkflow {
  target:       String,
  step:         DeleteStep,
  backup:       BackupState,
  confirmation: String,
  last_error:   Option<String>,
}

impl DeleteWorkflow {
  /// Open the modal for `target` at [`DeleteStep::Start`].
  pub fn open(target: impl Into<String>) -> Self {
    Self {
      target:       target.into(),
      step:         DeleteStep::Start,
      backup:       BackupState::NotRequested,
      confirmation: String::new(),
      last_error:   None,
    }
  }

  /// Open the modal already at [`DeleteStep::Backed`], after a standalone
  /// backup request succeeded.
  pub fn with_backup(target: impl Into<String>, command: BackupCommand) -> Self {
    let mut wf = Self::open(target);
    wf.backup_succeeded(command);
    wf
  }

  pub fn target(&self) -> &str { &self.target }

  pub fn step(&self) -> DeleteStep { self.step }

  pub fn backup(&self) -> &BackupState { &self.backup }

  pub fn confirmation(&self) -> &str { &self.confirmation }

  pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

  // ── Backup ────────────────────────────────────────────────────────────

  /// Start (or restart, on refresh) a backup-command request. Returns the
  /// source id to request it for. Clears any earlier delete error.
  pub fn request_backup(&mut self) -> &str {
    self.step = DeleteStep::Start;
    self.backup = BackupState::Pending;
    self.last_error = None;
    &self.target
  }

  pub fn backup_succeeded(&mut self, command: BackupCommand) {
    self.step = DeleteStep::Backed;
    self.backup = BackupState::Ready(command);
  }

  /// Record a failed backup request. The step does not advance.
  pub fn backup_failed(&mut self, message: impl Into<String>) {
    self.backup = BackupState::Failed(message.into());
  }

  // ── Typed confirmation ────────────────────────────────────────────────

  pub fn push_char(&mut self, c: char) { self.confirmation.push(c); }

  pub fn pop_char(&mut self) { self.confirmation.pop(); }

  pub fn set_confirmation(&mut self, typed: impl Into<String>) {
    self.confirmation = typed.into();
  }

  // ── Delete ────────────────────────────────────────────────────────────

  /// Whether the delete action is enabled: backed up, and the typed text is
  /// byte-for-byte the target id (case-sensitive, untrimmed).
  pub fn can_delete(&self) -> bool { self.authorize_delete().is_ok() }

  /// Check the gate without changing any state. On success returns the
  /// source id to delete.
  pub fn authorize_delete(&self) -> Result<&str, DeleteRejected> {
    if self.step != DeleteStep::Backed {
      return Err(DeleteRejected::NotBackedUp);
    }
    if self.confirmation != self.target {
      return Err(DeleteRejected::ConfirmationMismatch(self.target.clone()));
    }
    Ok(&self.target)
  }

  /// A delete request for the target went out; the previous error no
  /// longer describes it.
  pub fn delete_started(&mut self) { self.last_error = None; }

  /// Record a failed delete; step, backup and typed text are kept so the
  /// operator can retry.
  pub fn delete_failed(&mut self, message: impl Into<String>) {
    self.last_error = Some(message.into());
  }
}
