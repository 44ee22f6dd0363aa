//! Core types for the movies-sync pipeline.
//!
//! This crate provides the foundational pieces shared by the source, the
//! sink and the orchestrator:
//!
//! - [`ChangeRecord`] - Raw joined projection of a film as extracted from the catalog
//! - [`FilmDocument`] - Denormalized, search-ready representation of a film
//! - [`DocumentBatch`] - Validated page of documents plus its bulk payload and watermark
//! - [`RetryPolicy`] - Capped exponential backoff around connectivity-sensitive calls
//! - [`ChangeSource`] - Trait implemented by change extractors
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── checkpoint          (cursor persistence, uses the watermark type)
//!    ├─── postgresql-source   (implements ChangeSource for PostgreSQL)
//!    └─── elasticsearch-sink  (consumes bulk payloads)
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use sync_core::{ChangeRecord, DocumentBatch};
//! use uuid::Uuid;
//!
//! let record = ChangeRecord {
//!     id: Some(Uuid::nil()),
//!     title: Some("The Star".to_string()),
//!     updated_at: Some(Utc.with_ymd_and_hms(2023, 5, 1, 10, 0, 0).unwrap()),
//!     ..Default::default()
//! };
//!
//! let batch = DocumentBatch::from_records(vec![record]).unwrap();
//! assert_eq!(batch.bulk_payload("movies").unwrap().lines().count(), 2);
//! ```

pub mod retry;
pub mod source;
pub mod transform;
pub mod types;

pub use retry::RetryPolicy;
pub use source::ChangeSource;
pub use transform::{DocumentBatch, IndexedFilm, TransformError};
pub use types::{ChangeRecord, Dimension, FilmDocument, PersonRef, PersonRole};
