//! Command-line flags, the optional TOML config file, and their merge.
//!
//! Precedence: CLI flag, then environment (via clap's `env`), then the
//! config file, then the built-in default.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::{
  client::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
  views::records::DEFAULT_PAGE_SIZE,
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(name = "ingest-dash", about = "Terminal dashboard for the ingestion backend")]
pub struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Backend origin (default: http://127.0.0.1:8000).
  #[arg(long, env = "INGEST_URL")]
  pub url: Option<String>,

  /// Directory record downloads are written to (default: current directory).
  #[arg(long, env = "INGEST_EXPORT_DIR", value_name = "DIR")]
  pub export_dir: Option<PathBuf>,

  /// Records per page in the record view.
  #[arg(long)]
  pub page_size: Option<u32>,

  /// Write logs to this file. Without it, logging is off.
  #[arg(long, value_name = "FILE")]
  pub log_file: Option<PathBuf>,

  /// Open the record view for this source at startup.
  #[arg(long)]
  pub source: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
  pub url:          Option<String>,
  pub export_dir:   Option<PathBuf>,
  pub page_size:    Option<u32>,
  pub log_file:     Option<PathBuf>,
  pub timeout_secs: Option<u64>,
}

impl ConfigFile {
  pub fn read(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

// ─── Resolved settings ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Settings {
  pub api:          ApiConfig,
  pub export_dir:   PathBuf,
  pub page_size:    u32,
  pub log_file:     Option<PathBuf>,
  pub start_source: Option<String>,
}

impl Settings {
  /// Read the config file named by `args`, if any, and merge.
  pub fn load(args: Args) -> Result<Self> {
    let file = match &args.config {
      Some(path) => ConfigFile::read(path)?,
      None => ConfigFile::default(),
    };
    Ok(Self::merge(args, file))
  }

  pub fn merge(args: Args, file: ConfigFile) -> Self {
    let base_url = args
      .url
      .or(file.url)
      .filter(|u| !u.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout = file.timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs);

    Self {
      api:          ApiConfig { base_url, timeout },
      export_dir:   args
        .export_dir
        .or(file.export_dir)
        .unwrap_or_else(|| PathBuf::from(".")),
      page_size:    args
        .page_size
        .or(file.page_size)
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE),
      log_file:     args.log_file.or(file.log_file),
      start_source: args.source,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn defaults_without_flags_or_file() {
    let s = Settings::merge(Args::default(), ConfigFile::default());
    assert_eq!(s.api.base_url, "http://127.0.0.1:8000");
    assert_eq!(s.api.timeout, Duration::from_secs(30));
    assert_eq!(s.page_size, 100);
    assert_eq!(s.export_dir, PathBuf::from("."));
    assert!(s.log_file.is_none());
  }

  #[test]
  fn flags_override_file() {
    let args = Args::try_parse_from(["ingest-dash", "--url", "http://api:9000", "--page-size", "25"]).unwrap();
    let file = ConfigFile {
      url: Some("http://file:1".into()),
      page_size: Some(50),
      export_dir: Some("/tmp/out".into()),
      ..Default::default()
    };
    let s = Settings::merge(args, file);
    assert_eq!(s.api.base_url, "http://api:9000");
    assert_eq!(s.page_size, 25);
    assert_eq!(s.export_dir, PathBuf::from("/tmp/out"));
  }

  #[test]
  fn zero_page_size_falls_back() {
    let args = Args {
      page_size: Some(0),
      ..Default::default()
    };
    assert_eq!(Settings::merge(args, ConfigFile::default()).page_size, 100);
  }

  #[test]
  fn reads_toml_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "url = \"http://10.0.0.2:8000\"\npage_size = 200\ntimeout_secs = 5").unwrap();
    let args = Args {
      config: Some(f.path().to_path_buf()),
      ..Default::default()
    };
    let s = Settings::load(args).unwrap();
    assert_eq!(s.api.base_url, "http://10.0.0.2:8000");
    assert_eq!(s.api.timeout, Duration::from_secs(5));
    assert_eq!(s.page_size, 200);
  }

  #[test]
  fn malformed_file_is_an_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "page_size = \"lots\"").unwrap();
    assert!(ConfigFile::read(f.path()).is_err());
  }
}
