//! Schema snapshots, field-list normalisation, and the two-snapshot diff.
//!
//! The backend does not tag the shape of a schema's `fields`: it may be a
//! list of names, a list of `{name, ...}` descriptors, or a mapping keyed by
//! field name. [`normalize_fields`] is the one place that sniffs the shape;
//! everything downstream sees an ordered `Vec<FieldSpec>`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Column shown when no usable schema is available.
pub const RAW_COLUMN: &str = "_raw";

// ─── Fields ──────────────────────────────────────────────────────────────────

/// One field of a schema, in the backend's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
  pub name:     String,
  /// Inferred value type, e.g. `"string"`.
  pub kind:     Option<String>,
  /// Number of records the field was seen in.
  pub presence: Option<u64>,
}

impl FieldSpec {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name:     name.into(),
      kind:     None,
      presence: None,
    }
  }
}

/// Convert a raw `fields` value into an ordered field list.
///
/// Returns `None` when the value is neither a list nor a mapping. List items
/// that are neither a string nor an object with a string `name` are skipped.
pub fn normalize_fields(raw: &Value) -> Option<Vec<FieldSpec>> {
  match raw {
    Value::Array(items) => Some(items.iter().filter_map(listed_field).collect()),
    Value::Object(map) => Some(
      map
        .iter()
        .map(|(name, info)| described(name.clone(), info))
        .collect(),
    ),
    _ => None,
  }
}

fn listed_field(item: &Value) -> Option<FieldSpec> {
  match item {
    Value::String(name) => Some(FieldSpec::named(name.clone())),
    Value::Object(_) => {
      let name = item.get("name")?.as_str()?;
      Some(described(name.to_string(), item))
    }
    _ => None,
  }
}

fn described(name: String, info: &Value) -> FieldSpec {
  FieldSpec {
    name,
    kind: info.get("type").and_then(Value::as_str).map(str::to_owned),
    presence: info
      .get("presence")
      .or_else(|| info.get("count"))
      .and_then(Value::as_u64),
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A schema at one point in time: the latest schema, or one history entry.
///
/// History entries may be reduced to `{field_count, created_at}`, so every
/// attribute is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaSnapshot {
  #[serde(default)]
  pub source_id:   Option<String>,
  #[serde(default, deserialize_with = "lenient_int")]
  pub version:     Option<i64>,
  /// `None` when the backend sent no fields or an unrecognised shape.
  #[serde(default, deserialize_with = "lenient_fields")]
  pub fields:      Option<Vec<FieldSpec>>,
  #[serde(default)]
  pub field_count: Option<u64>,
  #[serde(default, deserialize_with = "lenient_text")]
  pub created_at:  Option<String>,
}

impl SchemaSnapshot {
  /// Field names in order; empty when the snapshot carries no field list.
  pub fn field_names(&self) -> Vec<&str> {
    self
      .fields
      .iter()
      .flatten()
      .map(|f| f.name.as_str())
      .collect()
  }

  /// Field count for display: the list's length, else the reduced
  /// `field_count`, else unknown.
  pub fn displayed_field_count(&self) -> Option<u64> {
    self
      .fields
      .as_ref()
      .map(|f| f.len() as u64)
      .or(self.field_count)
  }
}

fn lenient_fields<'de, D: Deserializer<'de>>(
  d: D,
) -> Result<Option<Vec<FieldSpec>>, D::Error> {
  let raw = Option::<Value>::deserialize(d)?;
  Ok(raw.as_ref().and_then(normalize_fields))
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
  Ok(match Option::<Value>::deserialize(d)? {
    Some(Value::Number(n)) => n.as_i64(),
    Some(Value::String(s)) => s.trim().trim_start_matches('v').parse().ok(),
    _ => None,
  })
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(match Option::<Value>::deserialize(d)? {
    None | Some(Value::Null) => None,
    Some(Value::String(s)) => Some(s),
    Some(other) => Some(other.to_string()),
  })
}

/// Column names for the record table.
///
/// No schema, or a schema whose fields could not be normalised, yields the
/// single opaque [`RAW_COLUMN`].
pub fn columns(schema: Option<&SchemaSnapshot>) -> Vec<String> {
  match schema.and_then(|s| s.fields.as_ref()) {
    Some(fields) => fields.iter().map(|f| f.name.clone()).collect(),
    None => vec![RAW_COLUMN.to_string()],
  }
}

// ─── Diff ────────────────────────────────────────────────────────────────────

/// Fields added and removed between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
  /// In the newer snapshot only, in the newer snapshot's order.
  pub added:   Vec<String>,
  /// In the older snapshot only, in the older snapshot's order.
  pub removed: Vec<String>,
}

impl SchemaDiff {
  pub fn between(older: &SchemaSnapshot, newer: &SchemaSnapshot) -> Self {
    let a = older.field_names();
    let b = newer.field_names();
    Self {
      added:   b
        .iter()
        .filter(|f| !a.contains(f))
        .map(|f| f.to_string())
        .collect(),
      removed: a
        .iter()
        .filter(|f| !b.contains(f))
        .map(|f| f.to_string())
        .collect(),
    }
  }

  /// Diff of the last two entries by position. Fewer than two entries give
  /// an empty diff.
  pub fn of_history(history: &[SchemaSnapshot]) -> Self {
    match history {
      [.., older, newer] => Self::between(older, newer),
      _ => Self::default(),
    }
  }

  pub fn is_empty(&self) -> bool { self.added.is_empty() && self.removed.is_empty() }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use serde_json::json;

  use super::*;

  fn snapshot(v: Value) -> SchemaSnapshot { serde_json::from_value(v).unwrap() }

  fn names(s: &SchemaSnapshot) -> Vec<&str> { s.field_names() }

  #[test]
  fn normalizes_name_list() {
    let s = snapshot(json!({ "fields": ["b", "a"] }));
    assert_eq!(names(&s), ["b", "a"]);
  }

  #[test]
  fn normalizes_descriptor_list_and_mixed_list() {
    let s = snapshot(json!({
      "fields": [{ "name": "x", "type": "int" }, "y", 3, { "type": "nameless" }]
    }));
    assert_eq!(names(&s), ["x", "y"]);
    assert_eq!(s.fields.as_ref().unwrap()[0].kind.as_deref(), Some("int"));
  }

  #[test]
  fn normalizes_keyed_mapping_in_order() {
    let s: SchemaSnapshot = serde_json::from_str(
      r#"{"version": 2, "fields": {"zeta": {"type": "string", "presence": 24}, "alpha": 1}}"#,
    )
    .unwrap();
    assert_eq!(names(&s), ["zeta", "alpha"]);
    let zeta = &s.fields.as_ref().unwrap()[0];
    assert_eq!(zeta.kind.as_deref(), Some("string"));
    assert_eq!(zeta.presence, Some(24));
    assert_eq!(s.version, Some(2));
  }

  #[test]
  fn unrecognised_fields_shape_is_none() {
    assert_eq!(snapshot(json!({ "fields": 7 })).fields, None);
    assert_eq!(snapshot(json!({ "fields": null })).fields, None);
    assert_eq!(snapshot(json!({})).fields, None);
  }

  #[test]
  fn tolerates_odd_scalar_attributes() {
    let s = snapshot(json!({ "version": "v3", "created_at": { "$date": 1 } }));
    assert_eq!(s.version, Some(3));
    assert_eq!(s.created_at.as_deref(), Some(r#"{"$date":1}"#));
  }

  #[test]
  fn columns_fall_back_to_raw() {
    assert_eq!(columns(None), [RAW_COLUMN]);
    assert_eq!(columns(Some(&snapshot(json!({ "demo": true })))), [RAW_COLUMN]);
    assert_eq!(
      columns(Some(&snapshot(json!({ "fields": [{ "name": "a" }, "b"] })))),
      ["a", "b"]
    );
    assert_eq!(
      columns(Some(&snapshot(json!({ "fields": { "k": {} } })))),
      ["k"]
    );
  }

  #[test]
  fn displayed_field_count_prefers_list() {
    assert_eq!(
      snapshot(json!({ "fields": ["a", "b"], "field_count": 9 })).displayed_field_count(),
      Some(2)
    );
    assert_eq!(
      snapshot(json!({ "field_count": 9 })).displayed_field_count(),
      Some(9)
    );
    assert_eq!(snapshot(json!({})).displayed_field_count(), None);
  }

  #[test]
  fn short_history_has_empty_diff() {
    assert!(SchemaDiff::of_history(&[]).is_empty());
    let one = [snapshot(json!({ "fields": { "a": 1 } }))];
    assert_eq!(SchemaDiff::of_history(&one), SchemaDiff::default());
  }

  #[test]
  fn diff_of_last_two_entries() {
    let history = [
      snapshot(json!({ "fields": { "a": 1, "b": 1 } })),
      snapshot(json!({ "fields": { "b": 1, "c": 1 } })),
    ];
    let diff = SchemaDiff::of_history(&history);
    assert_eq!(diff.added, ["c"]);
    assert_eq!(diff.removed, ["a"]);
  }

  #[test]
  fn diff_uses_position_not_timestamp() {
    let history = [
      snapshot(json!({ "fields": ["old"], "created_at": "2020-01-01" })),
      snapshot(json!({ "fields": ["x", "y"], "created_at": "2030-01-01" })),
      snapshot(json!({ "fields": ["y", "z"], "created_at": "2010-01-01" })),
    ];
    let diff = SchemaDiff::of_history(&history);
    assert_eq!(diff.added, ["z"]);
    assert_eq!(diff.removed, ["x"]);
  }

  #[test]
  fn diff_partitions_the_symmetric_difference() {
    let cases = [
      (json!(["a", "b", "c"]), json!(["c", "d", "a", "e"])),
      (json!([]), json!(["a"])),
      (json!(["a"]), json!([])),
      (json!(["a", "b"]), json!(["a", "b"])),
      (json!({ "p": 1, "q": 1 }), json!([{ "name": "q" }, "r"])),
    ];
    for (a, b) in cases {
      let older = snapshot(json!({ "fields": a }));
      let newer = snapshot(json!({ "fields": b }));
      let diff = SchemaDiff::between(&older, &newer);

      let a: BTreeSet<&str> = older.field_names().into_iter().collect();
      let b: BTreeSet<&str> = newer.field_names().into_iter().collect();
      let added: BTreeSet<&str> = diff.added.iter().map(String::as_str).collect();
      let removed: BTreeSet<&str> = diff.removed.iter().map(String::as_str).collect();

      let only_b: BTreeSet<&str> = b.difference(&a).copied().collect();
      let only_a: BTreeSet<&str> = a.difference(&b).copied().collect();
      let symmetric: BTreeSet<&str> = a.symmetric_difference(&b).copied().collect();
      let union: BTreeSet<&str> = added.union(&removed).copied().collect();

      assert_eq!(added, only_b);
      assert_eq!(removed, only_a);
      assert!(added.is_disjoint(&removed));
      assert_eq!(union, symmetric);
    }
  }

  #[test]
  fn reduced_history_entries_diff_as_empty_field_lists() {
    let history = [
      snapshot(json!({ "field_count": 3, "created_at": "x" })),
      snapshot(json!({ "fields": ["a"] })),
    ];
    assert_eq!(SchemaDiff::of_history(&history).added, ["a"]);
  }
}
