//! Offline demo dataset.
//!
//! Any source id whose lowercase form starts with [`DEMO_PREFIX`] is served
//! entirely from here; no view issues a backend call for it.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::{
  model::{Record, Source},
  schema::{FieldSpec, SchemaSnapshot},
  summary::{ChunkTypeCount, FieldCount, SchemaPoint, TokenCount, VisualizeSummary},
};

pub const DEMO_PREFIX: &str = "demo";
pub const DEMO_SOURCE_ID: &str = "demo_local";
pub const DEMO_RECORD_COUNT: usize = 24;

const NAMES: [&str; 4] = ["Alice", "Bob", "Carol", "Dave"];
const CATEGORIES: [&str; 3] = ["sales", "support", "engineering"];

/// Whether `source_id` names an offline demo dataset.
pub fn is_demo(source_id: &str) -> bool {
  source_id.to_lowercase().starts_with(DEMO_PREFIX)
}

/// The complete demo dataset, with timestamps relative to a fixed instant.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoData {
  pub source:  Source,
  pub records: Vec<Record>,
  pub schema:  SchemaSnapshot,
  pub summary: VisualizeSummary,
}

impl DemoData {
  pub fn now() -> Self { Self::at(Utc::now()) }

  pub fn at(now: DateTime<Utc>) -> Self {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let records = (0..DEMO_RECORD_COUNT).map(|i| demo_record(i, now)).collect();

    let fields = ["id", "name", "amount", "category"]
      .into_iter()
      .zip(["string", "string", "number", "string"])
      .map(|(name, kind)| FieldSpec {
        name:     name.to_string(),
        kind:     Some(kind.to_string()),
        presence: Some(DEMO_RECORD_COUNT as u64),
      })
      .collect();

    Self {
      source: Source {
        source_id:      DEMO_SOURCE_ID.to_string(),
        last_ingest:    Some(stamp.clone()),
        record_count:   DEMO_RECORD_COUNT as u64,
        schema_version: Some(1),
        chunks:         6,
      },
      records,
      schema: SchemaSnapshot {
        source_id:   Some(DEMO_SOURCE_ID.to_string()),
        version:     Some(1),
        fields:      Some(fields),
        field_count: None,
        created_at:  Some(stamp.clone()),
      },
      summary: VisualizeSummary {
        chunk_types:    vec![chunk("csv", 4), chunk("text", 2)],
        top_fields:     vec![
          field("id", 12),
          field("name", 11),
          field("amount", 9),
          field("category", 7),
        ],
        schema_history: vec![SchemaPoint {
          version_label: Some("v1".to_string()),
          field_count:   4,
          created_at:    Some(stamp),
        }],
        top_tokens:     vec![token("demo", 12), token("alice", 3), token("bob", 2)],
      },
    }
  }

  /// Schema for the record table: the first record's keys, in order.
  pub fn record_schema(&self) -> SchemaSnapshot {
    SchemaSnapshot {
      source_id: Some(self.source.source_id.clone()),
      fields: Some(
        self
          .records
          .first()
          .map(|r| r.keys().map(FieldSpec::named).collect())
          .unwrap_or_default(),
      ),
      ..SchemaSnapshot::default()
    }
  }

  /// Schema history: the single demo schema.
  pub fn history(&self) -> Vec<SchemaSnapshot> { vec![self.schema.clone()] }
}

fn demo_record(i: usize, now: DateTime<Utc>) -> Record {
  let id = format!("demo_{i}");
  let ts = now - Duration::hours(i as i64);
  let mut map = Map::new();
  map.insert("_id".into(), Value::String(id.clone()));
  map.insert("id".into(), Value::String(id));
  map.insert("name".into(), json!(NAMES[i % NAMES.len()]));
  map.insert("amount".into(), json!((i * 379 + 123) % 1000));
  map.insert("category".into(), json!(CATEGORIES[i % CATEGORIES.len()]));
  map.insert(
    "ts".into(),
    json!(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
  );
  Record(map)
}

fn chunk(kind: &str, count: u64) -> ChunkTypeCount {
  ChunkTypeCount {
    kind: Some(kind.to_string()),
    count,
  }
}

fn field(name: &str, count: u64) -> FieldCount {
  FieldCount {
    field: name.to_string(),
    count,
  }
}

fn token(text: &str, count: u64) -> TokenCount {
  TokenCount {
    token: text.to_string(),
    count,
  }
}
