//! Entities the backend serves and the dashboard renders.
//!
//! The dashboard only ever holds read-only copies of these; the backend owns
//! them. Unknown fields are ignored and missing counters default to zero.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The body of a successful response: parsed JSON, or the raw text when the
/// body was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
  Json(Value),
  Text(String),
}

impl Payload {
  /// Decode into `T`. A text body is offered to `T` as a JSON string.
  pub fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
    match self {
      Self::Json(v) => serde_json::from_value(v),
      Self::Text(t) => serde_json::from_value(Value::String(t)),
    }
  }
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// One ingested dataset with its summary counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub source_id:      String,
  #[serde(default)]
  pub last_ingest:    Option<String>,
  #[serde(default)]
  pub record_count:   u64,
  #[serde(default)]
  pub schema_version: Option<i64>,
  #[serde(default)]
  pub chunks:         u64,
}

/// Aggregate counters over a source list, as shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTotals {
  pub sources:     usize,
  pub records:     u64,
  pub chunks:      u64,
  pub last_ingest: Option<DateTime<Utc>>,
}

impl SourceTotals {
  pub fn of(sources: &[Source]) -> Self {
    Self {
      sources:     sources.len(),
      records:     sources.iter().map(|s| s.record_count).sum(),
      chunks:      sources.iter().map(|s| s.chunks).sum(),
      last_ingest: sources
        .iter()
        .filter_map(|s| s.last_ingest.as_deref().and_then(parse_timestamp))
        .max(),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One ingested item. Its shape depends on the source's schema and is not
/// known ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
  /// Best-effort identifier: `id`, then `_id`, then `#<index>`.
  ///
  /// Null and empty-string ids count as absent. A Mongo-style
  /// `{"$oid": "..."}` id renders as the inner string.
  pub fn display_id(&self, index: usize) -> String {
    ["id", "_id"]
      .into_iter()
      .find_map(|key| self.0.get(key).and_then(id_text))
      .unwrap_or_else(|| format!("#{index}"))
  }

  /// Compact JSON, cut to at most `max_chars` characters.
  pub fn preview(&self, max_chars: usize) -> String {
    serde_json::to_string(&self.0)
      .unwrap_or_default()
      .chars()
      .take(max_chars)
      .collect()
  }

  pub fn to_pretty_json(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(&self.0)?)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }
}

fn id_text(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) if s.is_empty() => None,
    Value::String(s) => Some(s.clone()),
    Value::Object(m) => Some(
      m.get("$oid")
        .and_then(Value::as_str)
        .map_or_else(|| value.to_string(), str::to_owned),
    ),
    other => Some(other.to_string()),
  }
}

// ─── Action payloads ─────────────────────────────────────────────────────────

/// A file the backend can ingest from its own test-files directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFile {
  pub name:  String,
  #[serde(default)]
  pub size:  u64,
  #[serde(default)]
  pub mtime: Option<f64>,
}

impl TestFile {
  pub fn size_kib(&self) -> f64 { self.size as f64 / 1024.0 }
}

/// The backup command the operator must run before deleting a dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawBackup")]
pub struct BackupCommand {
  pub command:     String,
  pub backup_path: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBackup {
  Described {
    command:               String,
    #[serde(default)]
    backup_path_suggested: Option<String>,
  },
  Plain(String),
  Other(Value),
}

impl From<RawBackup> for BackupCommand {
  fn from(raw: RawBackup) -> Self {
    match raw {
      RawBackup::Described { command, backup_path_suggested } => Self {
        command,
        backup_path: backup_path_suggested,
      },
      RawBackup::Plain(command) => Self { command, backup_path: None },
      RawBackup::Other(Value::Null) => Self {
        command:     String::new(),
        backup_path: None,
      },
      RawBackup::Other(v) => Self {
        command:     serde_json::to_string_pretty(&v).unwrap_or_default(),
        backup_path: None,
      },
    }
  }
}

/// Result of `DELETE /dataset`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeleteOutcome {
  #[serde(default)]
  pub status:   Option<String>,
  #[serde(default)]
  pub moved_to: Option<String>,
}

/// Acknowledgement of `POST /process-file` or `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestStarted {
  #[serde(default)]
  pub status:    Option<String>,
  #[serde(default, alias = "source")]
  pub source_id: Option<String>,
  #[serde(default)]
  pub filename:  Option<String>,
}

/// A local file to push through `POST /upload`.
#[derive(Debug, Clone)]
pub struct UploadFile {
  pub file_name: String,
  pub bytes:     Vec<u8>,
  /// Target source id; defaults to [`default_source_hint`] of `file_name`.
  pub source_id: Option<String>,
}

impl UploadFile {
  pub fn source_id(&self) -> String {
    self
      .source_id
      .clone()
      .filter(|s| !s.is_empty())
      .unwrap_or_else(|| default_source_hint(&self.file_name))
  }
}

/// The file name up to its first `.`, or the whole name if that is empty.
pub fn default_source_hint(file_name: &str) -> String {
  match file_name.split('.').next() {
    Some(stem) if !stem.is_empty() => stem.to_string(),
    _ => file_name.to_string(),
  }
}

/// Accept only a bare file name: no path separators, not `.`/`..`.
pub fn validate_bare_file_name(name: &str) -> Result<&str> {
  if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
    return Err(Error::InvalidFileName(name.to_string()));
  }
  Ok(name)
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Parse a backend timestamp: RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]`
/// (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
    return Some(t.with_timezone(&Utc));
  }
  ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
    .into_iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|n| n.and_utc())
}

/// Render a timestamp in local time; unparseable text is shown as-is and a
/// missing one as `—`.
pub fn format_timestamp(raw: Option<&str>) -> String {
  match raw.filter(|s| !s.is_empty()) {
    None => "—".to_string(),
    Some(raw) => parse_timestamp(raw).map_or_else(
      || raw.to_string(),
      |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    ),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  fn record(v: Value) -> Record { serde_json::from_value(v).unwrap() }

  #[test]
  fn display_id_prefers_id_then_underscore_id() {
    assert_eq!(record(json!({ "id": "a", "_id": "b" })).display_id(3), "a");
    assert_eq!(record(json!({ "_id": "b" })).display_id(3), "b");
    assert_eq!(record(json!({ "_id": { "$oid": "65f0" } })).display_id(0), "65f0");
    assert_eq!(record(json!({ "id": 42 })).display_id(0), "42");
  }

  #[test]
  fn display_id_falls_back_to_position() {
    assert_eq!(record(json!({ "name": "x" })).display_id(7), "#7");
    assert_eq!(record(json!({ "id": null, "_id": "" })).display_id(1), "#1");
  }

  #[test]
  fn preview_is_cut_on_char_boundary() {
    let r = record(json!({ "name": "ééééééééé" }));
    let p = r.preview(12);
    assert_eq!(p.chars().count(), 12);
    assert!(p.starts_with(r#"{"name":"é"#));
  }

  #[test]
  fn record_keys_keep_backend_order() {
    let r: Record = serde_json::from_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
    assert_eq!(r.keys().collect::<Vec<_>>(), ["z", "a", "m"]);
  }

  #[test]
  fn source_defaults_missing_counters() {
    let s: Source = serde_json::from_value(json!({
      "source_id": "s1",
      "last_ingest": null,
      "schema_version": null
    }))
    .unwrap();
    assert_eq!(s.record_count, 0);
    assert_eq!(s.chunks, 0);
    assert_eq!(s.schema_version, None);
  }

  #[test]
  fn totals_sum_counters_and_pick_latest_ingest() {
    let sources = vec![
      Source {
        source_id:      "a".into(),
        last_ingest:    Some("2024-03-01 10:00:00.123456".into()),
        record_count:   10,
        schema_version: Some(1),
        chunks:         2,
      },
      Source {
        source_id:      "b".into(),
        last_ingest:    Some("2024-03-02T08:00:00Z".into()),
        record_count:   5,
        schema_version: Some(3),
        chunks:         1,
      },
      Source {
        source_id:      "c".into(),
        last_ingest:    Some("not a date".into()),
        record_count:   0,
        schema_version: None,
        chunks:         0,
      },
    ];
    let totals = SourceTotals::of(&sources);
    assert_eq!(totals.sources, 3);
    assert_eq!(totals.records, 15);
    assert_eq!(totals.chunks, 3);
    assert_eq!(
      totals.last_ingest,
      Some(Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap())
    );
  }

  #[test]
  fn backup_command_accepts_object_or_text() {
    let described: BackupCommand = Payload::Json(json!({
      "command": "mongodump --archive=x.gz",
      "backup_path_suggested": "x.gz",
      "started_background": false
    }))
    .decode()
    .unwrap();
    assert_eq!(described.command, "mongodump --archive=x.gz");
    assert_eq!(described.backup_path.as_deref(), Some("x.gz"));

    let plain: BackupCommand = Payload::Text("run this".into()).decode().unwrap();
    assert_eq!(plain.command, "run this");
  }

  #[test]
  fn ingest_started_accepts_source_alias() {
    let s: IngestStarted = serde_json::from_value(json!({ "source": "x" })).unwrap();
    assert_eq!(s.source_id.as_deref(), Some("x"));
  }

  #[test]
  fn source_hint_strips_from_first_dot() {
    assert_eq!(default_source_hint("sales.2024.csv"), "sales");
    assert_eq!(default_source_hint("notes"), "notes");
    assert_eq!(default_source_hint(".env"), ".env");
  }

  #[test]
  fn upload_source_id_uses_hint_when_blank() {
    let mut f = UploadFile {
      file_name: "orders.json".into(),
      bytes:     vec![],
      source_id: None,
    };
    assert_eq!(f.source_id(), "orders");
    f.source_id = Some(String::new());
    assert_eq!(f.source_id(), "orders");
    f.source_id = Some("custom".into());
    assert_eq!(f.source_id(), "custom");
  }

  #[test]
  fn bare_file_names_only() {
    assert!(validate_bare_file_name("data.csv").is_ok());
    for bad in ["", ".", "..", "../etc/passwd", "dir/file.csv", r"dir\file.csv"] {
      assert!(validate_bare_file_name(bad).is_err(), "{bad:?} accepted");
    }
  }

  #[test]
  fn format_timestamp_fallbacks() {
    assert_eq!(format_timestamp(None), "—");
    assert_eq!(format_timestamp(Some("")), "—");
    assert_eq!(format_timestamp(Some("yesterday")), "yesterday");
    assert_eq!(format_timestamp(Some("2024-03-02T08:00:00Z")).len(), 19);
  }
}
