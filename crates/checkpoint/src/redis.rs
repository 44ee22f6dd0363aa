//! Redis-backed checkpoint storage.
//!
//! Each state entry is a plain string key in the selected database. Saving
//! issues a single MSET for the whole mapping; loading walks the keyspace
//! with SCAN and fetches each value.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use fred::error::{Error as RedisError, ErrorKind};
use fred::prelude::{
    ClientLike, EventInterface, FredResult, KeysInterface, Pool, ReconnectPolicy, Server,
    ServerConfig,
};
use fred::types::{Builder, Key};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};

use crate::store::{CheckpointStore, StateMap};

const SCAN_PAGE_SIZE: u32 = 100;

/// Connection settings for [`RedisStore`].
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub host: String,
    pub port: u16,
    pub database: u8,
    /// Per-command timeout; also bounds how long an unreachable server
    /// delays startup.
    pub command_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            command_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis implementation of CheckpointStore trait.
#[derive(Clone)]
pub struct RedisStore {
    client: Pool,
}

impl RedisStore {
    /// Build the client and start connecting.
    ///
    /// A server that is down at this point is not an error: the client keeps
    /// reconnecting in the background, and loads in the meantime return an
    /// empty state.
    pub async fn connect(config: RedisStoreConfig) -> FredResult<Self> {
        let command_timeout = config.command_timeout;
        let pool = Builder::default_centralized()
            .with_config(|redis_config| {
                redis_config.server = ServerConfig::Centralized {
                    server: Server::new(config.host.clone(), config.port),
                };
                redis_config.database = Some(config.database);
            })
            .with_connection_config(|connection| {
                connection.connection_timeout = command_timeout;
                connection.internal_command_timeout = command_timeout;
            })
            .with_performance_config(|performance| {
                performance.default_command_timeout = command_timeout;
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 10_000, 2))
            .build_pool(1)?;

        for client in pool.clients() {
            let mut error_rx = client.error_rx();
            tokio::spawn(async move {
                loop {
                    match error_rx.recv().await {
                        Ok((error, _)) => error!("Redis client error: {error}"),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        let _handles = pool.connect_pool();
        match pool.wait_for_connect().await {
            Ok(()) => debug!("Connected to Redis at {}:{}", config.host, config.port),
            Err(e) => warn!("Redis is not available yet: {e}"),
        }

        Ok(Self { client: pool })
    }

    async fn fetch_all(&self) -> FredResult<StateMap> {
        let mut state = StateMap::new();
        let mut cursor = "0".to_string();

        loop {
            let (next_cursor, keys): (String, Vec<Key>) = self
                .client
                .scan_page(cursor, "*", Some(SCAN_PAGE_SIZE), None)
                .await?;

            for key in keys {
                let Some(name) = key.as_str().map(str::to_string) else {
                    continue;
                };
                // A key can vanish between SCAN and GET.
                if let Some(value) = self.client.get::<Option<String>, _>(key).await? {
                    state.insert(name, value);
                }
            }

            cursor = next_cursor;
            if cursor == "0" {
                break;
            }
        }

        Ok(state)
    }
}

/// Whether a Redis failure means the server could not be reached.
pub fn is_connection_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::IO | ErrorKind::Timeout | ErrorKind::Canceled
    )
}

#[async_trait]
impl CheckpointStore for RedisStore {
    async fn save_state(&self, state: &StateMap) -> Result<()> {
        if state.is_empty() {
            return Ok(());
        }
        self.client.mset(state.clone()).await?;
        debug!("Saved {} state entries to Redis", state.len());
        Ok(())
    }

    async fn retrieve_state(&self) -> Result<StateMap> {
        match self.fetch_all().await {
            Ok(state) => Ok(state),
            Err(e) if is_connection_error(&e) => {
                warn!("Redis is not available, starting from empty state: {e}");
                Ok(StateMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}
