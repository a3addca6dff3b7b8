//! Error types for `ingest-core`.
//!
//! [`ApiError`] is the uniform failure half of every backend call: the
//! gateway never panics and never lets a transport error escape, it folds
//! everything into one of these variants.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid file name {0:?}: must be a bare name without path separators")]
  InvalidFileName(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Backend failures ────────────────────────────────────────────────────────

/// The body of a non-2xx response: parsed JSON if possible, else raw text
/// (or the status phrase when the body was empty).
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
  Json(Value),
  Text(String),
}

impl ErrorBody {
  /// The `detail` or `error` string of a JSON body, if the backend sent one.
  pub fn detail(&self) -> Option<&str> {
    match self {
      Self::Json(v) => v
        .get("detail")
        .or_else(|| v.get("error"))
        .and_then(Value::as_str),
      Self::Text(_) => None,
    }
  }
}

impl fmt::Display for ErrorBody {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Json(v) => write!(f, "{v}"),
      Self::Text(t) => f.write_str(t),
    }
  }
}

/// Why a backend operation did not produce a payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
  /// The backend answered with a non-2xx status.
  #[error("HTTP {status}: {body}")]
  Status { status: u16, body: ErrorBody },

  /// No response reached us.
  #[error("network error: {0}")]
  Transport(String),

  /// A 2xx response whose body did not have the expected shape.
  #[error("unexpected response (HTTP {status}): {message}")]
  Decode { status: u16, message: String },

  /// Refused client-side before any request was issued.
  #[error("{0}")]
  Rejected(String),
}

impl ApiError {
  /// The HTTP status, when a response was received.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
      Self::Transport(_) | Self::Rejected(_) => None,
    }
  }

  pub fn is_not_found(&self) -> bool { self.status() == Some(404) }
}

/// Result shape of every [`crate::backend::IngestBackend`] operation.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn status_is_absent_for_transport_failures() {
    assert_eq!(ApiError::Transport("refused".into()).status(), None);
    assert_eq!(ApiError::Rejected("nope".into()).status(), None);
    let e = ApiError::Status {
      status: 404,
      body:   ErrorBody::Text("Not Found".into()),
    };
    assert_eq!(e.status(), Some(404));
    assert!(e.is_not_found());
  }

  #[test]
  fn json_body_is_displayed_verbatim() {
    let e = ApiError::Status {
      status: 400,
      body:   ErrorBody::Json(json!({ "detail": "Deletion requires confirm=1" })),
    };
    assert_eq!(
      e.to_string(),
      r#"HTTP 400: {"detail":"Deletion requires confirm=1"}"#
    );
  }

  #[test]
  fn detail_prefers_detail_then_error() {
    let body = ErrorBody::Json(json!({ "error": "boom" }));
    assert_eq!(body.detail(), Some("boom"));
    assert_eq!(ErrorBody::Text("x".into()).detail(), None);
  }
}
