//! IndexSink trait definition.

use anyhow::Result;

/// What `ensure_index` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

/// How the cluster answered a bulk request.
///
/// Only the HTTP status is considered; per-item results inside a successful
/// response are not inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    Loaded,
    Rejected { status: u16 },
    /// The payload was empty and nothing was sent
    Skipped,
}

/// Trait for writing film documents to a search index.
///
/// The orchestrator is generic over this trait so tests can substitute an
/// in-memory recorder:
///
/// ```ignore
/// pub async fn run_cycle<S: IndexSink>(sink: &S, payload: &str) -> Result<()> {
///     sink.ensure_index().await?;
///     sink.load_bulk(payload).await?;
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait IndexSink: Send + Sync {
    /// Name of the target index, used in bulk action lines.
    fn index(&self) -> &str;

    /// Create the index with its mapping if it does not exist yet.
    ///
    /// Any non-success answer is taken to mean the index already exists.
    async fn ensure_index(&self) -> Result<IndexStatus>;

    /// Submit a newline-delimited bulk payload.
    ///
    /// A non-success status is logged and reported, not raised.
    async fn load_bulk(&self, payload: &str) -> Result<BulkOutcome>;
}
