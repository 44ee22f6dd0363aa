//! The sync loop.
//!
//! # Cycle
//!
//! ```text
//! RunningDimension(film) → RunningDimension(person) → RunningDimension(genre) → Sleeping
//!          ↑                                                                      │
//!          └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Within a dimension, pages are pulled until one comes back empty. Each
//! non-empty page is transformed, the index is ensured, the bulk payload is
//! loaded, and only then is the cursor moved to the page's last effective
//! timestamp. A crash between load and cursor write replays the page on
//! restart, which is harmless because documents are keyed by film id.
//!
//! All three dimensions read and write the same cursor key.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use checkpoint::{CheckpointStore, State, Watermark};
use elasticsearch_sink::{BulkOutcome, IndexSink};
use sync_core::{ChangeSource, Dimension, DocumentBatch};
use tracing::{debug, info, warn};

/// Knobs for [`MovieSync`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// State key holding the cursor
    pub state_key: String,
    pub page_size: usize,
    /// Pause between cycles
    pub interval: Duration,
    /// Cursor used when none is stored
    pub start_from: Watermark,
    /// Overwrite any stored cursor with `start_from` when seeding
    pub reset_cursor: bool,
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    RunningDimension(Dimension),
    Sleeping,
}

impl SyncState {
    pub fn start() -> Self {
        SyncState::RunningDimension(Dimension::Film)
    }

    pub fn next(self) -> Self {
        match self {
            SyncState::RunningDimension(dimension) => dimension
                .next()
                .map(SyncState::RunningDimension)
                .unwrap_or(SyncState::Sleeping),
            SyncState::Sleeping => SyncState::start(),
        }
    }
}

/// What one dimension pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSummary {
    pub dimension: Dimension,
    /// Non-empty pages loaded
    pub pages: usize,
    pub documents: usize,
    /// Pages the index answered with a non-success status
    pub rejected_pages: usize,
}

impl DimensionSummary {
    fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            pages: 0,
            documents: 0,
            rejected_pages: 0,
        }
    }
}

/// What one full cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub dimensions: Vec<DimensionSummary>,
    /// Cursor after the cycle
    pub cursor: Option<Watermark>,
}

impl CycleSummary {
    pub fn total_documents(&self) -> usize {
        self.dimensions.iter().map(|d| d.documents).sum()
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.dimensions {
            writeln!(
                f,
                "{:<8} pages={:<4} documents={:<6} rejected_pages={}",
                d.dimension.as_str(),
                d.pages,
                d.documents,
                d.rejected_pages
            )?;
        }
        match &self.cursor {
            Some(cursor) => write!(f, "cursor   {cursor}"),
            None => write!(f, "cursor   not set"),
        }
    }
}

/// The orchestrator: wires a change source, a search index and the
/// durable cursor together.
pub struct MovieSync<Src, Sink, Store>
where
    Src: ChangeSource,
    Sink: IndexSink,
    Store: CheckpointStore,
{
    source: Src,
    sink: Sink,
    state: State<Store>,
    settings: SyncSettings,
}

impl<Src, Sink, Store> MovieSync<Src, Sink, Store>
where
    Src: ChangeSource,
    Sink: IndexSink,
    Store: CheckpointStore,
{
    pub fn new(source: Src, sink: Sink, state: State<Store>, settings: SyncSettings) -> Self {
        Self {
            source,
            sink,
            state,
            settings,
        }
    }

    /// The stored cursor, if any.
    pub fn cursor(&self) -> Result<Option<Watermark>> {
        self.state.get_checkpoint(&self.settings.state_key)
    }

    pub fn state(&self) -> &State<Store> {
        &self.state
    }

    /// Decide the starting cursor and make sure it is stored.
    ///
    /// A stored cursor is kept unless `reset_cursor` is set. A missing one
    /// (first run, or an unreachable store) is replaced by `start_from`.
    pub async fn seed_cursor(&mut self) -> Result<Watermark> {
        let start = self.settings.start_from;
        let key = self.settings.state_key.clone();

        if self.settings.reset_cursor {
            info!(cursor = %start, "Resetting cursor");
            self.state.set_checkpoint(&key, &start).await?;
            return Ok(start);
        }

        match self.cursor()? {
            Some(cursor) => {
                info!(cursor = %cursor, "Resuming from stored cursor");
                Ok(cursor)
            }
            None => {
                info!(cursor = %start, "No stored cursor, starting from the configured timestamp");
                self.state.set_checkpoint(&key, &start).await?;
                Ok(start)
            }
        }
    }

    fn current_cursor(&self) -> Result<Watermark> {
        Ok(self.cursor()?.unwrap_or(self.settings.start_from))
    }

    /// Drain one dimension: page until the source returns nothing newer
    /// than the cursor.
    pub async fn run_dimension(&mut self, dimension: Dimension) -> Result<DimensionSummary> {
        let mut summary = DimensionSummary::new(dimension);

        loop {
            let cursor = self.current_cursor()?;
            let records = self
                .source
                .extract(dimension, cursor.timestamp(), self.settings.page_size)
                .await?;
            if records.is_empty() {
                debug!(%dimension, cursor = %cursor, "No more changes");
                break;
            }

            let batch = DocumentBatch::from_records(records)
                .with_context(|| format!("Failed to transform {dimension} changes"))?;
            let payload = batch.bulk_payload(self.sink.index())?;

            self.sink.ensure_index().await?;
            if let BulkOutcome::Rejected { status } = self.sink.load_bulk(&payload).await? {
                warn!(%dimension, status, "Bulk request rejected, cursor still advances");
                summary.rejected_pages += 1;
            }

            if let Some(last) = batch.last_effective_timestamp() {
                let next = Watermark::new(last);
                self.state
                    .set_checkpoint(&self.settings.state_key, &next)
                    .await?;
                debug!(%dimension, cursor = %next, "Cursor advanced");
            }

            summary.pages += 1;
            summary.documents += batch.len();
        }

        Ok(summary)
    }

    /// One pass over film, person and genre, in that order.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary> {
        info!("Start ETL cycle");
        let mut dimensions = Vec::with_capacity(Dimension::ALL.len());
        let mut phase = SyncState::start();

        while let SyncState::RunningDimension(dimension) = phase {
            let summary = self.run_dimension(dimension).await?;
            info!(
                %dimension,
                pages = summary.pages,
                documents = summary.documents,
                "Dimension synced"
            );
            dimensions.push(summary);
            phase = phase.next();
        }

        let summary = CycleSummary {
            dimensions,
            cursor: self.cursor()?,
        };
        info!(
            documents = summary.total_documents(),
            cursor = ?summary.cursor.map(|c| c.to_string()),
            "ETL cycle finished"
        );
        Ok(summary)
    }

    /// Cycle forever with the configured pause in between.
    ///
    /// Returns only on a non-retryable error.
    pub async fn run_forever(&mut self) -> Result<()> {
        self.seed_cursor().await?;
        loop {
            self.run_cycle().await?;
            info!("Sleeping {}s", self.settings.interval.as_secs());
            tokio::time::sleep(self.settings.interval).await;
        }
    }
}
