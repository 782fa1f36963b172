//! SQLite-backed request/response history.
//!
//! This module provides the history [`Store`] and the content-addressed
//! [`CacheStore`] built on top of it, using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Filtered, sorted, paginated queries over recorded exchanges
//! - Case-insensitive substring search
//! - Retention by age, count, or date
//! - Content-addressed response bodies (SHA-256) with referential garbage collection
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod cache;
pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod prune;
pub mod query;
pub mod stats;
mod timestamp;

pub use cache::{CacheStats, CacheStore};
pub use connection::Store;
pub use entries::{Entry, ResponseBody};
pub use prune::{PruneOptions, PrunePolicy, PruneResult, PruneScope};
pub use query::{QueryOptions, SortField, SortOrder};
pub use stats::Stats;
