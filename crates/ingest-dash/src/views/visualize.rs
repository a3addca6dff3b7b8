//! Summary charts for one source, with a sampled fallback.
//!
//! The precomputed summary is tried first. If it fails for any reason, up to
//! [`FALLBACK_SAMPLE_LIMIT`] raw records are fetched and field presence is
//! counted over them; that result is labelled approximate. If the sample is
//! empty or fails too, the view reports that no data is available.

use ingest_core::{
  backend::PageRequest,
  demo::{DemoData, is_demo},
  summary::{FALLBACK_SAMPLE_LIMIT, SummaryView, approximate_summary},
};

use super::{Fetch, Job, Reply, Ticket, Tickets};

#[derive(Debug, Clone, PartialEq)]
pub enum VisualizeState {
  Loading,
  /// Summary endpoint failed; waiting on the record sample.
  Sampling { error: String },
  Ready(SummaryView),
  /// Neither the summary nor a sample produced anything.
  NoData { error: Option<String> },
}

pub struct VisualizeView {
  pub source_id: String,
  pub state:     VisualizeState,
  ticket:        Option<Ticket>,
}

impl VisualizeView {
  pub fn new(source_id: impl Into<String>) -> Self {
    Self {
      source_id: source_id.into(),
      state:     VisualizeState::Loading,
      ticket:    None,
    }
  }

  pub fn load(&mut self, tickets: &mut Tickets) -> Vec<Job> {
    if is_demo(&self.source_id) {
      self.state = VisualizeState::Ready(SummaryView::precomputed(DemoData::now().summary));
      self.ticket = None;
      return Vec::new();
    }
    let ticket = tickets.issue();
    self.ticket = Some(ticket);
    self.state = VisualizeState::Loading;
    vec![Job::new(ticket, Fetch::Summary(self.source_id.clone()))]
  }

  /// Apply a reply; may ask for the fallback sample.
  pub fn apply(&mut self, ticket: Ticket, reply: Reply) -> Vec<Job> {
    if self.ticket != Some(ticket) {
      tracing::debug!(source = %self.source_id, "discarding stale summary reply");
      return Vec::new();
    }
    match reply {
      Reply::Summary(Ok(Some(summary))) => {
        self.state = VisualizeState::Ready(SummaryView::precomputed(summary));
        Vec::new()
      }
      Reply::Summary(Ok(None)) => {
        tracing::info!(source = %self.source_id, "backend has no summary");
        self.state = VisualizeState::NoData { error: None };
        Vec::new()
      }
      Reply::Summary(Err(e)) => {
        let error = e.to_string();
        tracing::info!(source = %self.source_id, %error, "summary unavailable, sampling records");
        self.state = VisualizeState::Sampling { error };
        vec![Job::new(ticket, Fetch::SummarySample(self.source_id.clone()))]
      }
      Reply::SummarySample(result) => {
        let error = match &self.state {
          VisualizeState::Sampling { error } => Some(error.clone()),
          _ => None,
        };
        let sample = result.unwrap_or_else(|e| {
          tracing::warn!(source = %self.source_id, error = %e, "fallback sample failed");
          Vec::new()
        });
        self.state = match approximate_summary(&sample) {
          Some(view) => VisualizeState::Ready(view),
          None => VisualizeState::NoData { error },
        };
        Vec::new()
      }
      _ => Vec::new(),
    }
  }
}

/// The page request used for the fallback sample.
pub fn sample_page() -> PageRequest {
  PageRequest {
    limit: FALLBACK_SAMPLE_LIMIT,
    page:  0,
  }
}

#[cfg(test)]
mod tests {
  use ingest_core::{
    ApiError, ErrorBody,
    model::Record,
    summary::{Provenance, VisualizeSummary},
  };
  use serde_json::json;

  use super::*;

  fn not_found() -> ApiError {
    ApiError::Status {
      status: 404,
      body:   ErrorBody::Json(json!({ "detail": "not found" })),
    }
  }

  fn started() -> (VisualizeView, Ticket) {
    let mut tickets = Tickets::default();
    let mut view = VisualizeView::new("s1");
    let jobs = view.load(&mut tickets);
    assert!(matches!(&jobs[0].fetch, Fetch::Summary(s) if s == "s1"));
    (view, jobs[0].ticket)
  }

  #[test]
  fn precomputed_summary_renders_directly() {
    let (mut view, t) = started();
    assert!(view.apply(t, Reply::Summary(Ok(Some(VisualizeSummary::default())))).is_empty());
    assert!(matches!(
      &view.state,
      VisualizeState::Ready(SummaryView { provenance: Provenance::Precomputed, .. })
    ));
  }

  #[test]
  fn missing_summary_body_is_no_data() {
    let (mut view, t) = started();
    assert!(view.apply(t, Reply::Summary(Ok(None))).is_empty());
    assert_eq!(view.state, VisualizeState::NoData { error: None });
  }

  #[test]
  fn not_found_falls_back_to_sample() {
    let (mut view, t) = started();
    let jobs = view.apply(t, Reply::Summary(Err(not_found())));
    assert_eq!(jobs.len(), 1);
    assert!(matches!(&jobs[0].fetch, Fetch::SummarySample(s) if s == "s1"));
    assert_eq!(sample_page().limit, 200);

    let sample: Vec<Record> = vec![
      serde_json::from_value(json!({ "a": 1, "b": 2 })).unwrap(),
      serde_json::from_value(json!({ "b": 3 })).unwrap(),
    ];
    view.apply(t, Reply::SummarySample(Ok(sample)));
    let VisualizeState::Ready(summary) = &view.state else {
      panic!("expected a summary, got {:?}", view.state);
    };
    assert!(summary.is_approximate());
    let fields: Vec<(&str, u64)> = summary
      .summary
      .top_fields
      .iter()
      .map(|f| (f.field.as_str(), f.count))
      .collect();
    assert_eq!(fields, [("b", 2), ("a", 1)]);
  }

  #[test]
  fn empty_sample_is_no_data_not_zero_chart() {
    let (mut view, t) = started();
    view.apply(t, Reply::Summary(Err(not_found())));
    view.apply(t, Reply::SummarySample(Ok(Vec::new())));
    assert_eq!(view.state, VisualizeState::NoData {
      error: Some(r#"HTTP 404: {"detail":"not found"}"#.into()),
    });
  }

  #[test]
  fn failing_sample_is_no_data() {
    let (mut view, t) = started();
    view.apply(t, Reply::Summary(Err(ApiError::Transport("down".into()))));
    view.apply(t, Reply::SummarySample(Err(ApiError::Transport("down".into()))));
    assert!(matches!(view.state, VisualizeState::NoData { .. }));
  }

  #[test]
  fn demo_summary_is_local() {
    let mut tickets = Tickets::default();
    let mut view = VisualizeView::new("DEMO");
    assert!(view.load(&mut tickets).is_empty());
    let VisualizeState::Ready(summary) = &view.state else {
      panic!("demo should render immediately");
    };
    assert_eq!(summary.summary.chunk_types.len(), 2);
    assert!(!summary.is_approximate());
  }
}
