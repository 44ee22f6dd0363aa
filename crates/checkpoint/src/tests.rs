//! Unit tests for the checkpoint crate.

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::{Checkpoint, CheckpointStore, FilesystemStore, MemoryStore, State, StateMap, Watermark};

fn watermark(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Watermark {
    Watermark::new(Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
}

// ============================================================================
// Watermark Tests
// ============================================================================

#[test]
fn test_watermark_parses_default_start() {
    let parsed = Watermark::parse("2000-01-01 00:00:01").unwrap();
    assert_eq!(parsed, watermark(2000, 1, 1, 0, 0, 1));
}

#[test]
fn test_watermark_parses_rfc3339() {
    let parsed = Watermark::parse("2023-05-01T10:00:00Z").unwrap();
    assert_eq!(parsed, watermark(2023, 5, 1, 10, 0, 0));

    let offset = Watermark::parse("2023-05-01T13:00:00+03:00").unwrap();
    assert_eq!(offset, watermark(2023, 5, 1, 10, 0, 0));
}

#[test]
fn test_watermark_parses_spaced_form_with_offset() {
    let parsed = Watermark::parse("2023-05-01 10:00:00.250000+00:00").unwrap();
    assert_eq!(
        parsed.timestamp(),
        Utc.with_ymd_and_hms(2023, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
    );
}

#[test]
fn test_watermark_naive_t_form_is_utc() {
    let parsed = Watermark::parse("2023-05-01T10:00:00").unwrap();
    assert_eq!(parsed, watermark(2023, 5, 1, 10, 0, 0));
}

#[test]
fn test_watermark_canonical_output() {
    assert_eq!(
        watermark(2023, 5, 1, 10, 0, 0).to_cli_string(),
        "2023-05-01T10:00:00Z"
    );

    let micros = Watermark::new(
        Utc.with_ymd_and_hms(2023, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::microseconds(123_456),
    );
    assert_eq!(micros.to_string(), "2023-05-01T10:00:00.123456Z");
    assert_eq!(Watermark::from_cli_string(&micros.to_string()).unwrap(), micros);
}

#[test]
fn test_watermark_rejects_garbage() {
    let err = Watermark::parse("yesterday").unwrap_err().to_string();
    assert!(err.contains("Invalid watermark 'yesterday'"));
    assert!("2023-13-01 00:00:00".parse::<Watermark>().is_err());
}

#[test]
fn test_watermark_ordering() {
    assert!(watermark(2023, 5, 1, 10, 0, 0) < watermark(2023, 5, 1, 10, 0, 1));
}

// ============================================================================
// State Tests
// ============================================================================

#[tokio::test]
async fn test_state_loads_existing_entries() {
    let store = MemoryStore::with_entries([("datetime_extract", "2023-05-01T10:00:00Z")]);
    let state = State::load(store).await.unwrap();

    assert_eq!(state.get("datetime_extract"), Some("2023-05-01T10:00:00Z"));
    assert_eq!(state.get("missing"), None);
}

#[tokio::test]
async fn test_state_set_persists_whole_mirror() {
    let store = MemoryStore::with_entries([("other", "kept")]);
    let mut state = State::load(store.clone()).await.unwrap();

    state.set("datetime_extract", "2023-05-01T10:00:00Z").await.unwrap();

    let saved = store.snapshot();
    assert_eq!(saved.get("other").map(String::as_str), Some("kept"));
    assert_eq!(
        saved.get("datetime_extract").map(String::as_str),
        Some("2023-05-01T10:00:00Z")
    );
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn test_state_reads_come_from_mirror() {
    let store = MemoryStore::new();
    let mut state = State::load(store.clone()).await.unwrap();
    state.set("k", "v1").await.unwrap();

    // An external write is not observed after load.
    store
        .save_state(&StateMap::from([("k".to_string(), "v2".to_string())]))
        .await
        .unwrap();

    assert_eq!(state.get("k"), Some("v1"));
}

#[tokio::test]
async fn test_state_unreachable_store_loads_empty() {
    let store = MemoryStore::with_entries([("k", "v")]);
    store.set_unreachable(true);

    let state = State::load(store).await.unwrap();
    assert!(state.entries().is_empty());
}

#[tokio::test]
async fn test_state_failed_save_keeps_mirror() {
    let store = MemoryStore::new();
    let mut state = State::load(store.clone()).await.unwrap();
    store.set_unreachable(true);

    assert!(state.set("k", "v").await.is_err());
    assert_eq!(state.get("k"), Some("v"));

    store.set_unreachable(false);
    state.set("other", "x").await.unwrap();
    assert_eq!(store.snapshot().get("k").map(String::as_str), Some("v"));
}

#[tokio::test]
async fn test_state_typed_checkpoint() {
    let mut state = State::load(MemoryStore::new()).await.unwrap();
    assert_eq!(state.get_checkpoint::<Watermark>("cursor").unwrap(), None);

    let mark = watermark(2023, 5, 1, 10, 0, 0);
    state.set_checkpoint("cursor", &mark).await.unwrap();
    assert_eq!(state.get_checkpoint::<Watermark>("cursor").unwrap(), Some(mark));
}

#[tokio::test]
async fn test_state_unreadable_checkpoint_is_an_error() {
    let store = MemoryStore::with_entries([("cursor", "not a time")]);
    let state = State::load(store).await.unwrap();

    let err = state.get_checkpoint::<Watermark>("cursor").unwrap_err();
    assert!(format!("{err:#}").contains("Stored watermark under 'cursor' is unreadable"));
}

// ============================================================================
// FilesystemStore Tests
// ============================================================================

#[tokio::test]
async fn test_filesystem_store_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path().join("state.json"));

    assert!(store.retrieve_state().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_filesystem_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");

    {
        let mut state = State::load(FilesystemStore::new(&path)).await.unwrap();
        state.set("datetime_extract", "2023-05-01T10:00:00Z").await.unwrap();
        state.set("other", "value").await.unwrap();
    }

    let reopened = State::load(FilesystemStore::new(&path)).await.unwrap();
    assert_eq!(reopened.get("datetime_extract"), Some("2023-05-01T10:00:00Z"));
    assert_eq!(reopened.get("other"), Some("value"));
    assert!(!dir.path().join("nested").join("state.json.tmp").exists());
}

#[tokio::test]
async fn test_filesystem_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let store = FilesystemStore::new(&path);
    assert!(store.retrieve_state().await.is_err());
}

// ============================================================================
// Redis error classification
// ============================================================================

#[test]
fn test_redis_connection_errors_are_detected() {
    use fred::error::{Error, ErrorKind};

    assert!(crate::is_connection_error(&Error::new(ErrorKind::IO, "refused")));
    assert!(crate::is_connection_error(&Error::new(ErrorKind::Timeout, "timed out")));
    assert!(!crate::is_connection_error(&Error::new(ErrorKind::Auth, "denied")));
}
