//! The `IngestBackend` trait: every operation the dashboard performs against
//! the ingestion service.
//!
//! The HTTP implementation lives in `ingest-dash`; tests substitute a
//! recording fake. Each call issues at most one request and resolves to an
//! [`ApiResult`]; implementations never panic on transport or decoding
//! failures and never retry.

use std::future::Future;

use crate::{
  ApiResult,
  model::{BackupCommand, DeleteOutcome, IngestStarted, Record, Source, TestFile, UploadFile},
  schema::SchemaSnapshot,
  summary::VisualizeSummary,
};

/// One page of records: `limit` records starting at page `page` (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub limit: u32,
  pub page:  u32,
}

pub trait IngestBackend: Send + Sync {
  /// `GET /sources`
  fn list_sources(&self) -> impl Future<Output = ApiResult<Vec<Source>>> + Send + '_;

  /// `GET /visualize/summary?source_id=`. `None` when the backend answers
  /// with an empty or `null` body.
  fn visualize_summary<'a>(
    &'a self,
    source_id: &'a str,
  ) -> impl Future<Output = ApiResult<Option<VisualizeSummary>>> + Send + 'a;

  /// `GET /schema?source_id=`
  fn schema<'a>(
    &'a self,
    source_id: &'a str,
  ) -> impl Future<Output = ApiResult<SchemaSnapshot>> + Send + 'a;

  /// `GET /schema/history?source_id=`, oldest first.
  fn schema_history<'a>(
    &'a self,
    source_id: &'a str,
  ) -> impl Future<Output = ApiResult<Vec<SchemaSnapshot>>> + Send + 'a;

  /// `GET /records?source_id=&limit=&page=`
  fn records<'a>(
    &'a self,
    source_id: &'a str,
    page: PageRequest,
  ) -> impl Future<Output = ApiResult<Vec<Record>>> + Send + 'a;

  /// `POST /backup?source_id=`
  fn create_backup<'a>(
    &'a self,
    source_id: &'a str,
  ) -> impl Future<Output = ApiResult<BackupCommand>> + Send + 'a;

  /// `DELETE /dataset?source_id=&confirm=1`
  fn delete_dataset<'a>(
    &'a self,
    source_id: &'a str,
  ) -> impl Future<Output = ApiResult<DeleteOutcome>> + Send + 'a;

  /// `GET /test-files`
  fn list_test_files(&self) -> impl Future<Output = ApiResult<Vec<TestFile>>> + Send + '_;

  /// `POST /process-file?filename=`. The name must be bare; anything else is
  /// rejected without a request.
  fn process_test_file<'a>(
    &'a self,
    filename: &'a str,
  ) -> impl Future<Output = ApiResult<IngestStarted>> + Send + 'a;

  /// `POST /upload` (multipart `file`, `source_id`).
  fn upload_file(
    &self,
    file: UploadFile,
  ) -> impl Future<Output = ApiResult<IngestStarted>> + Send + '_;
}
