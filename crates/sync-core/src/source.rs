//! ChangeSource trait definition.
//!
//! Implemented by the PostgreSQL extractor and by in-memory fakes in tests.
//! The orchestrator is generic over it, so all calls are statically
//! dispatched after monomorphization.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{ChangeRecord, Dimension};

/// Source of changed films, one page at a time.
#[async_trait]
pub trait ChangeSource: Send {
    /// Return at most `page_size` films changed along `dimension` after
    /// `since`, ordered by effective `updated_at` ascending.
    ///
    /// Fewer than `page_size` records (possibly none) means the dimension is
    /// exhausted for now.
    async fn extract(
        &mut self,
        dimension: Dimension,
        since: DateTime<Utc>,
        page_size: usize,
    ) -> anyhow::Result<Vec<ChangeRecord>>;
}
