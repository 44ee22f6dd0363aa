//! In-memory stand-ins for the catalog and the search index.
//!
//! Used by the orchestrator's unit tests and the integration tests under
//! `tests/`. The fake catalog applies the same contract as the SQL queries:
//! strictly-after filter, ascending order, page limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use elasticsearch_sink::{BulkOutcome, IndexSink, IndexStatus};
use sync_core::{ChangeRecord, ChangeSource, Dimension};
use uuid::Uuid;

/// A film row as the change queries would return it.
pub fn film_record(id: u128, title: &str, updated_at: DateTime<Utc>) -> ChangeRecord {
    ChangeRecord {
        id: Some(Uuid::from_u128(id)),
        rating: Some(7.5),
        title: Some(title.to_string()),
        description: None,
        genres: Some(vec![Some("Drama".to_string())]),
        updated_at: Some(updated_at),
        ..Default::default()
    }
}

/// One `extract` call as seen by the fake catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractCall {
    pub dimension: Dimension,
    pub since: DateTime<Utc>,
    pub page_size: usize,
    pub returned: usize,
}

/// Catalog fake holding pre-shaped rows per dimension.
#[derive(Default)]
pub struct FakeCatalog {
    rows: HashMap<Dimension, Vec<ChangeRecord>>,
    calls: Arc<Mutex<Vec<ExtractCall>>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, dimension: Dimension, rows: Vec<ChangeRecord>) -> Self {
        self.rows.entry(dimension).or_default().extend(rows);
        self
    }

    /// Shared log of every `extract` call, in order.
    pub fn calls(&self) -> Arc<Mutex<Vec<ExtractCall>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ChangeSource for FakeCatalog {
    async fn extract(
        &mut self,
        dimension: Dimension,
        since: DateTime<Utc>,
        page_size: usize,
    ) -> anyhow::Result<Vec<ChangeRecord>> {
        let mut page: Vec<ChangeRecord> = self
            .rows
            .get(&dimension)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.updated_at.is_some_and(|at| at > since))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        page.sort_by_key(|r| (r.updated_at, r.id));
        page.truncate(page_size);

        self.calls
            .lock()
            .map_err(|_| anyhow::anyhow!("call log poisoned"))?
            .push(ExtractCall {
                dimension,
                since,
                page_size,
                returned: page.len(),
            });
        Ok(page)
    }
}

/// Search index fake that records every request.
#[derive(Clone)]
pub struct RecordingSink {
    index: String,
    outcome: BulkOutcome,
    ensure_calls: Arc<Mutex<usize>>,
    payloads: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new(index: &str) -> Self {
        Self {
            index: index.to_string(),
            outcome: BulkOutcome::Loaded,
            ensure_calls: Arc::new(Mutex::new(0)),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every bulk request with `outcome` instead of `Loaded`.
    pub fn answering(mut self, outcome: BulkOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.lock().map(|n| *n).unwrap_or_default()
    }
}

#[async_trait]
impl IndexSink for RecordingSink {
    fn index(&self) -> &str {
        &self.index
    }

    async fn ensure_index(&self) -> anyhow::Result<IndexStatus> {
        let mut calls = self
            .ensure_calls
            .lock()
            .map_err(|_| anyhow::anyhow!("counter poisoned"))?;
        *calls += 1;
        Ok(if *calls == 1 {
            IndexStatus::Created
        } else {
            IndexStatus::AlreadyExists
        })
    }

    async fn load_bulk(&self, payload: &str) -> anyhow::Result<BulkOutcome> {
        self.payloads
            .lock()
            .map_err(|_| anyhow::anyhow!("payload log poisoned"))?
            .push(payload.to_string());
        Ok(self.outcome)
    }
}
