//! Local record download.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ingest_core::model::Record;

/// `{source_id}_record_{index}.json`, with path separators in the source id
/// replaced so the file always lands directly in the export directory.
pub fn record_file_name(source_id: &str, index: usize) -> String {
  let safe: String = source_id
    .chars()
    .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
    .collect();
  format!("{safe}_record_{index}.json")
}

/// Write one record as pretty JSON under `dir`. No network involved.
pub fn save_record(dir: &Path, source_id: &str, index: usize, record: &Record) -> Result<PathBuf> {
  let path = dir.join(record_file_name(source_id, index));
  let mut text = record.to_pretty_json().context("serialising record")?;
  text.push('\n');
  std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
  tracing::info!(path = %path.display(), "record exported");
  Ok(path)
}
