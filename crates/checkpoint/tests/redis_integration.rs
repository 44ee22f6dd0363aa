//! Redis store tests against a live server.
//!
//! The roundtrip test needs a Redis instance at `REDIS_TEST_HOST` (default
//! 127.0.0.1:6379) and runs with `cargo test -p checkpoint -- --ignored`.
//! The unreachable-server test runs by default.

use std::time::Duration;

use checkpoint::{CheckpointStore, RedisStore, RedisStoreConfig, State, StateMap};

fn test_config() -> RedisStoreConfig {
    let host = std::env::var("REDIS_TEST_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    RedisStoreConfig {
        host,
        port: 6379,
        database: 15,
        command_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
#[ignore]
async fn test_redis_store_roundtrip() {
    let store = RedisStore::connect(test_config()).await.unwrap();

    let mut state = State::load(store.clone()).await.unwrap();
    state.set("datetime_extract", "2023-05-01T10:00:00Z").await.unwrap();
    state.set("other", "value").await.unwrap();

    let loaded = store.retrieve_state().await.unwrap();
    assert_eq!(
        loaded.get("datetime_extract").map(String::as_str),
        Some("2023-05-01T10:00:00Z")
    );
    assert_eq!(loaded.get("other").map(String::as_str), Some("value"));
}

#[tokio::test]
async fn test_redis_store_unreachable_loads_empty() {
    let config = RedisStoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        database: 0,
        command_timeout: Duration::from_millis(200),
    };
    let store = RedisStore::connect(config).await.unwrap();

    assert_eq!(store.retrieve_state().await.unwrap(), StateMap::new());
}

#[tokio::test]
async fn test_redis_store_unreachable_save_fails() {
    let config = RedisStoreConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        database: 0,
        command_timeout: Duration::from_millis(200),
    };
    let store = RedisStore::connect(config).await.unwrap();

    let mut state = StateMap::new();
    state.insert("datetime_extract".to_string(), "2023-05-01T10:00:00Z".to_string());
    assert!(store.save_state(&state).await.is_err());
    assert!(store.save_state(&StateMap::new()).await.is_ok());
}
