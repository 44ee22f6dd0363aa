//! Elasticsearch sink for movies-sync.
//!
//! Creates the movies index with its fixed mapping and ships bulk payloads
//! rendered by [`sync_core::DocumentBatch`]. Every HTTP call runs under a
//! [`sync_core::RetryPolicy`], so an unreachable cluster delays the sync
//! rather than failing it.

mod sink;
mod traits;

pub use sink::{is_connection_error, ElasticsearchSink, MOVIES_INDEX_MAPPING};
pub use traits::{BulkOutcome, IndexSink, IndexStatus};

/// Search index connection options
#[derive(Clone, Debug)]
pub struct ElasticOpts {
    pub host: String,
    pub port: u16,
    pub index: String,
}

impl ElasticOpts {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
