//! Cursor persistence for movies-sync
//!
//! Provides a small key/value state layer that survives restarts, plus the
//! checkpoint types stored in it.
//!
//! # Architecture
//!
//! - `CheckpointStore` abstracts the backing storage (whole-map load and save)
//! - `State` keeps an in-memory mirror and rewrites the full mapping on every set
//! - The `Checkpoint` trait describes values that round-trip through a state
//!   entry as text, such as the [`Watermark`] cursor
//!
//! ## Storage Backends
//!
//! - `RedisStore` - Keys in a Redis database (MSET/SCAN+GET)
//! - `FilesystemStore` - A single JSON document on disk
//! - `MemoryStore` - Process-local map, used by tests

mod filesystem;
mod memory;
mod redis;
mod state;
pub mod store;
mod watermark;

#[cfg(test)]
mod tests;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use redis::{is_connection_error, RedisStore, RedisStoreConfig};
pub use state::State;
pub use store::{CheckpointStore, StateMap};
pub use watermark::Watermark;

/// Trait for values that are persisted as a single state entry.
///
/// # Example
///
/// ```rust
/// use checkpoint::Checkpoint;
///
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct PageCounter(u64);
///
/// impl Checkpoint for PageCounter {
///     const KIND: &'static str = "page-counter";
///
///     fn to_cli_string(&self) -> String {
///         self.0.to_string()
///     }
///
///     fn from_cli_string(s: &str) -> anyhow::Result<Self> {
///         Ok(Self(s.trim().parse()?))
///     }
/// }
///
/// let counter = PageCounter::from_cli_string("42").unwrap();
/// assert_eq!(counter.to_cli_string(), "42");
/// ```
pub trait Checkpoint: Clone {
    /// Human-readable name used in error messages.
    const KIND: &'static str;

    /// Text form written to the store and printed by the CLI.
    ///
    /// The returned string must be accepted by `from_cli_string()`.
    fn to_cli_string(&self) -> String;

    /// Parse the stored or user-supplied text form.
    fn from_cli_string(s: &str) -> anyhow::Result<Self>
    where
        Self: Sized;
}
