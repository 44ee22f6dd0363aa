//! reqwest-based Elasticsearch client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use sync_core::RetryPolicy;
use tracing::{debug, error, info};

use crate::traits::{BulkOutcome, IndexSink, IndexStatus};
use crate::ElasticOpts;

/// Settings and mapping for the movies index.
pub const MOVIES_INDEX_MAPPING: &str = include_str!("movies_index.json");

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether a transport failure means the cluster could not be reached.
pub fn is_connection_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

pub struct ElasticsearchSink {
    client: Client,
    base_url: String,
    index: String,
    policy: RetryPolicy,
}

impl ElasticsearchSink {
    pub fn new(base_url: impl Into<String>, index: impl Into<String>, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
            policy,
        })
    }

    pub fn from_opts(opts: &ElasticOpts, policy: RetryPolicy) -> Result<Self> {
        Self::new(opts.base_url(), opts.index.clone(), policy)
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }
}

#[async_trait]
impl IndexSink for ElasticsearchSink {
    fn index(&self) -> &str {
        &self.index
    }

    async fn ensure_index(&self) -> Result<IndexStatus> {
        let url = self.index_url();
        debug!("Creating index at {url}");

        let response = self
            .policy
            .retry(is_connection_error, || {
                self.client
                    .put(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(MOVIES_INDEX_MAPPING)
                    .send()
            })
            .await
            .with_context(|| format!("Failed to create index '{}'", self.index))?;

        if response.status() == StatusCode::OK {
            info!(index = %self.index, "Index created");
            Ok(IndexStatus::Created)
        } else {
            info!(index = %self.index, status = response.status().as_u16(), "Index already exists");
            Ok(IndexStatus::AlreadyExists)
        }
    }

    async fn load_bulk(&self, payload: &str) -> Result<BulkOutcome> {
        if payload.is_empty() {
            debug!("Empty bulk payload, nothing to load");
            return Ok(BulkOutcome::Skipped);
        }

        let url = format!("{}/_bulk", self.index_url());
        let response = self
            .policy
            .retry(is_connection_error, || {
                self.client
                    .post(&url)
                    .header(CONTENT_TYPE, "application/x-ndjson")
                    .body(payload.to_owned())
                    .send()
            })
            .await
            .with_context(|| format!("Failed to load bulk payload into '{}'", self.index))?;

        let status = response.status();
        if status == StatusCode::OK {
            info!(index = %self.index, bytes = payload.len(), "Data loaded");
            Ok(BulkOutcome::Loaded)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(index = %self.index, status = status.as_u16(), "Data not loaded: {body}");
            Ok(BulkOutcome::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_valid_json() {
        let mapping: serde_json::Value = serde_json::from_str(MOVIES_INDEX_MAPPING).unwrap();
        assert_eq!(mapping["mappings"]["dynamic"], "strict");
        assert_eq!(mapping["mappings"]["properties"]["actors"]["type"], "nested");
    }

    #[test]
    fn test_mapping_covers_document_fields() {
        let mapping: serde_json::Value = serde_json::from_str(MOVIES_INDEX_MAPPING).unwrap();
        let mut mapped: Vec<&str> = mapping["mappings"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        mapped.sort_unstable();

        let document = sync_core::FilmDocument {
            id: uuid::Uuid::nil(),
            imdb_rating: None,
            genres: vec![],
            title: "t".to_string(),
            description: None,
            directors_names: vec![],
            actors_names: vec![],
            writers_names: vec![],
            directors: vec![],
            actors: vec![],
            writers: vec![],
        };
        let serialized = serde_json::to_value(&document).unwrap();
        let mut fields: Vec<&str> = serialized
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        fields.sort_unstable();

        assert_eq!(mapped, fields);
    }

    #[test]
    fn test_index_url_trims_trailing_slash() {
        let sink = ElasticsearchSink::new("http://es:9200/", "movies", RetryPolicy::new("Elasticsearch")).unwrap();
        assert_eq!(sink.index_url(), "http://es:9200/movies");
        assert_eq!(sink.index(), "movies");
    }

    #[tokio::test]
    async fn test_refused_connection_is_retryable() {
        let err = Client::new()
            .get("http://127.0.0.1:1/movies")
            .send()
            .await
            .unwrap_err();
        assert!(is_connection_error(&err), "{err}");
    }
}
