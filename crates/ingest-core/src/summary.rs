//! Visualisation summaries: the backend's precomputed summary and the
//! approximate one derived from a sample of raw records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Record;

/// Maximum records requested when falling back to a sampled summary.
pub const FALLBACK_SAMPLE_LIMIT: u32 = 200;
/// Length of the top-fields table.
pub const TOP_FIELDS_LIMIT: usize = 30;
/// Tokens shown in the token cloud.
pub const TOKEN_CLOUD_LIMIT: usize = 60;

// ─── Wire shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkTypeCount {
  #[serde(rename = "type", default)]
  pub kind:  Option<String>,
  #[serde(default)]
  pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCount {
  pub field: String,
  #[serde(default)]
  pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaPoint {
  #[serde(default)]
  pub version_label: Option<String>,
  #[serde(default)]
  pub field_count:   u64,
  #[serde(default)]
  pub created_at:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCount {
  pub token: String,
  #[serde(default)]
  pub count: u64,
}

/// Summary statistics for one source, as served by `GET /visualize/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizeSummary {
  #[serde(default)]
  pub chunk_types:    Vec<ChunkTypeCount>,
  #[serde(default)]
  pub top_fields:     Vec<FieldCount>,
  #[serde(default)]
  pub schema_history: Vec<SchemaPoint>,
  #[serde(default)]
  pub top_tokens:     Vec<TokenCount>,
}

impl VisualizeSummary {
  /// `(label, count, share of total)` per chunk type.
  pub fn chunk_shares(&self) -> Vec<(&str, u64, f64)> {
    let total: u64 = self.chunk_types.iter().map(|c| c.count).sum();
    self
      .chunk_types
      .iter()
      .map(|c| {
        let share = if total == 0 { 0.0 } else { c.count as f64 / total as f64 };
        (c.kind.as_deref().unwrap_or("unknown"), c.count, share)
      })
      .collect()
  }

  /// Field count per schema version, oldest first.
  pub fn field_count_series(&self) -> Vec<u64> {
    self.schema_history.iter().map(|p| p.field_count).collect()
  }

  /// The first [`TOKEN_CLOUD_LIMIT`] tokens with a weight in `0.0..=1.0`
  /// relative to the most frequent one.
  pub fn token_cloud(&self) -> Vec<(&str, f64)> {
    let shown = &self.top_tokens[..self.top_tokens.len().min(TOKEN_CLOUD_LIMIT)];
    let max = shown.iter().map(|t| t.count).max().unwrap_or(0);
    shown
      .iter()
      .map(|t| {
        let weight = if max == 0 { 0.0 } else { t.count as f64 / max as f64 };
        (t.token.as_str(), weight)
      })
      .collect()
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Where a rendered summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
  /// Served by the backend's summary endpoint.
  Precomputed,
  /// Field presence counted over a sample of raw records. Chunk types,
  /// schema history and tokens cannot be derived and are left empty.
  Approximate { sample_size: usize },
}

/// A summary ready to render, labelled with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
  pub summary:    VisualizeSummary,
  pub provenance: Provenance,
}

impl SummaryView {
  pub fn precomputed(summary: VisualizeSummary) -> Self {
    Self {
      summary,
      provenance: Provenance::Precomputed,
    }
  }

  pub fn is_approximate(&self) -> bool {
    matches!(self.provenance, Provenance::Approximate { .. })
  }
}

/// Count, per field key, how many sampled records contain it; keep the
/// [`TOP_FIELDS_LIMIT`] most frequent, ties in first-seen order.
///
/// Returns `None` for an empty sample so callers can tell "no data" apart
/// from an all-zero chart.
pub fn approximate_summary(sample: &[Record]) -> Option<SummaryView> {
  if sample.is_empty() {
    return None;
  }

  let mut counts: Vec<FieldCount> = Vec::new();
  let mut slots: HashMap<&str, usize> = HashMap::new();
  for record in sample {
    for key in record.keys() {
      match slots.get(key) {
        Some(&i) => counts[i].count += 1,
        None => {
          slots.insert(key, counts.len());
          counts.push(FieldCount {
            field: key.to_string(),
            count: 1,
          });
        }
      }
    }
  }

  // Stable sort keeps first-seen order among equal counts.
  counts.sort_by(|a, b| b.count.cmp(&a.count));
  counts.truncate(TOP_FIELDS_LIMIT);

  Some(SummaryView {
    summary:    VisualizeSummary {
      top_fields: counts,
      ..VisualizeSummary::default()
    },
    provenance: Provenance::Approximate {
      sample_size: sample.len(),
    },
  })
}
