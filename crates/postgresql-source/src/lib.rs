//! PostgreSQL change extraction for movies-sync
//!
//! Polls the `content` schema of the movies catalog for films changed after
//! a cursor, along three dimensions: the film row itself, its related
//! persons, and its related genres. Each page is returned as
//! [`sync_core::ChangeRecord`]s ordered by effective modification time.

mod client;
mod extractor;
pub mod queries;
mod row;

pub use client::{connect, is_connection_error};
pub use extractor::PostgresChangeSource;
pub use queries::ChangeQueries;

/// PostgreSQL source connection options
#[derive(Clone, Debug)]
pub struct SourceOpts {
    /// PostgreSQL connection URI
    pub source_uri: String,
    /// Schema holding the catalog tables
    pub schema: String,
}
