//! Document storage using Apache OpenDAL.
//!
//! Uploaded documents and generated PDFs live under
//! `applications/{application_id}/...`. Backends:
//! - Local filesystem (development)
//! - S3-compatible buckets
//! - In-memory (tests)

mod error;
mod service;

pub use error::StorageError;
pub use service::{DocumentStore, StoredObject};
