//! Core types and storage for reqlog.
//!
//! This crate provides:
//! - The request/response history store with SQLite backend
//! - The content-addressed response cache layered on it
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use store::{
    CacheStats, CacheStore, Entry, PruneOptions, PrunePolicy, PruneResult, PruneScope, QueryOptions, ResponseBody,
    SortField, SortOrder, Stats, Store,
};
