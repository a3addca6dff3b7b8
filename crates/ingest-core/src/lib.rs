//! Core types and pure logic for the ingestion admin dashboard.
//!
//! No HTTP or terminal code lives here: the dashboard binary supplies the
//! HTTP [`backend::IngestBackend`] and tests supply a recording fake.

pub mod backend;
pub mod demo;
pub mod error;
pub mod model;
pub mod schema;
pub mod summary;
pub mod workflow;

pub use error::{ApiError, ApiResult, ErrorBody, Error, Result};
