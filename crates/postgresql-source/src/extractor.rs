//! The PostgreSQL [`ChangeSource`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sync_core::{ChangeRecord, ChangeSource, Dimension, RetryPolicy};
use tokio_postgres::Client;
use tracing::{debug, info};

use crate::client::{connect, is_connection_error};
use crate::queries::ChangeQueries;
use crate::row::record_from_row;
use crate::SourceOpts;

/// Pages changed films out of the catalog.
///
/// The client is opened lazily and cached. Before every page the cached
/// connection is checked with `SELECT 1`; a dead or missing connection is
/// re-established under the retry policy, so a database outage stalls the
/// sync instead of ending it.
pub struct PostgresChangeSource {
    uri: String,
    queries: ChangeQueries,
    policy: RetryPolicy,
    client: Option<Client>,
}

impl PostgresChangeSource {
    pub fn new(opts: SourceOpts, policy: RetryPolicy) -> Self {
        Self {
            uri: opts.source_uri,
            queries: ChangeQueries::new(&opts.schema),
            policy,
            client: None,
        }
    }

    async fn connection(&mut self) -> Result<&Client> {
        let healthy = match &self.client {
            Some(client) if !client.is_closed() => client.simple_query("SELECT 1").await.is_ok(),
            _ => false,
        };

        if !healthy {
            self.client = None;
            let uri = self.uri.clone();
            let client = self
                .policy
                .retry(is_connection_error, || {
                    let uri = uri.clone();
                    async move { connect(&uri).await }
                })
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!("Connected to PostgreSQL");
            self.client = Some(client);
        }

        self.client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("PostgreSQL client is not connected"))
    }
}

#[async_trait]
impl ChangeSource for PostgresChangeSource {
    async fn extract(
        &mut self,
        dimension: Dimension,
        since: DateTime<Utc>,
        page_size: usize,
    ) -> Result<Vec<ChangeRecord>> {
        let limit = i64::try_from(page_size).context("Page size does not fit in BIGINT")?;
        let sql = self.queries.for_dimension(dimension).to_string();
        let client = self.connection().await?;

        info!(%dimension, cursor = %since, "Extract last updates from {dimension}");
        let rows = client
            .query(sql.as_str(), &[&since, &limit])
            .await
            .with_context(|| format!("Change query for {dimension} failed"))?;
        debug!(%dimension, rows = rows.len(), "Change query returned");

        rows.iter()
            .map(|row| record_from_row(row).context("Failed to decode change row"))
            .collect()
    }
}
