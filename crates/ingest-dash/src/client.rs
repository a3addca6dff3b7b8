//! Async HTTP client for the ingestion backend's REST API.
//!
//! Every call issues exactly one request and folds the outcome into an
//! [`ApiResult`]: non-2xx responses keep their status and body, transport
//! failures become [`ApiError::Transport`]. Nothing is retried.

use std::time::Duration;

use anyhow::{Context, Result};
use ingest_core::{
  ApiError, ApiResult, ErrorBody,
  backend::{IngestBackend, PageRequest},
  model::{
    BackupCommand, DeleteOutcome, IngestStarted, Payload, Record, Source, TestFile, UploadFile,
    validate_bare_file_name,
  },
  schema::SchemaSnapshot,
  summary::VisualizeSummary,
};
use reqwest::{Client, RequestBuilder, header::ACCEPT, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout:  DEFAULT_TIMEOUT,
    }
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Send `req` and split the response into status and payload.
  async fn send(&self, req: RequestBuilder) -> ApiResult<(u16, Payload)> {
    let resp = req
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = resp.status();
    let text = resp
      .text()
      .await
      .map_err(|e| ApiError::Transport(e.to_string()))?;
    let json = (!text.is_empty())
      .then(|| serde_json::from_str::<Value>(&text).ok())
      .flatten();

    if status.is_success() {
      let payload = match json {
        Some(v) => Payload::Json(v),
        None if text.is_empty() => Payload::Json(Value::Null),
        None => Payload::Text(text),
      };
      return Ok((status.as_u16(), payload));
    }

    let body = match json {
      Some(v) => ErrorBody::Json(v),
      None if !text.is_empty() => ErrorBody::Text(text),
      None => ErrorBody::Text(
        status
          .canonical_reason()
          .map_or_else(|| status.as_str().to_string(), str::to_string),
      ),
    };
    Err(ApiError::Status {
      status: status.as_u16(),
      body,
    })
  }

  async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
    let (status, payload) = self.send(req).await?;
    payload.decode().map_err(|e| ApiError::Decode {
      status,
      message: e.to_string(),
    })
  }

  /// Like [`Self::call`], but an empty or `null` body yields `T::default()`.
  async fn call_or_default<T: DeserializeOwned + Default>(&self, req: RequestBuilder) -> ApiResult<T> {
    Ok(self.call::<Option<T>>(req).await?.unwrap_or_default())
  }
}

impl IngestBackend for ApiClient {
  async fn list_sources(&self) -> ApiResult<Vec<Source>> {
    self.call_or_default(self.client.get(self.url("/sources"))).await
  }

  async fn visualize_summary<'a>(
    &'a self,
    source_id: &'a str,
  ) -> ApiResult<Option<VisualizeSummary>> {
    let req = self
      .client
      .get(self.url("/visualize/summary"))
      .query(&[("source_id", source_id)]);
    self.call(req).await
  }

  async fn schema<'a>(&'a self, source_id: &'a str) -> ApiResult<SchemaSnapshot> {
    let req = self.client.get(self.url("/schema")).query(&[("source_id", source_id)]);
    self.call_or_default(req).await
  }

  async fn schema_history<'a>(&'a self, source_id: &'a str) -> ApiResult<Vec<SchemaSnapshot>> {
    let req = self
      .client
      .get(self.url("/schema/history"))
      .query(&[("source_id", source_id)]);
    self.call_or_default(req).await
  }

  async fn records<'a>(&'a self, source_id: &'a str, page: PageRequest) -> ApiResult<Vec<Record>> {
    let req = self.client.get(self.url("/records")).query(&[
      ("source_id", source_id.to_string()),
      ("limit", page.limit.to_string()),
      ("page", page.page.to_string()),
    ]);
    self.call_or_default(req).await
  }

  async fn create_backup<'a>(&'a self, source_id: &'a str) -> ApiResult<BackupCommand> {
    let req = self.client.post(self.url("/backup")).query(&[("source_id", source_id)]);
    self.call(req).await
  }

  async fn delete_dataset<'a>(&'a self, source_id: &'a str) -> ApiResult<DeleteOutcome> {
    let req = self
      .client
      .delete(self.url("/dataset"))
      .query(&[("source_id", source_id), ("confirm", "1")]);
    self.call_or_default(req).await
  }

  async fn list_test_files(&self) -> ApiResult<Vec<TestFile>> {
    self.call_or_default(self.client.get(self.url("/test-files"))).await
  }

  async fn process_test_file<'a>(&'a self, filename: &'a str) -> ApiResult<IngestStarted> {
    let filename = validate_bare_file_name(filename).map_err(|e| ApiError::Rejected(e.to_string()))?;
    let req = self
      .client
      .post(self.url("/process-file"))
      .query(&[("filename", filename)]);
    self.call_or_default(req).await
  }

  async fn upload_file(&self, file: UploadFile) -> ApiResult<IngestStarted> {
    let source_id = file.source_id();
    let part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
    let form = multipart::Form::new()
      .part("file", part)
      .text("source_id", source_id);
    self
      .call_or_default(self.client.post(self.url("/upload")).multipart(form))
      .await
  }
}
