//! Content-addressed response cache.
//!
//! [`CacheStore`] adds a `response_cache` table to a [`Store`]: bodies are keyed
//! by their SHA-256 hash, so identical content occupies one row no matter how
//! often it is cached. Rows live as long as some history entry references them
//! through [`ResponseBody::CacheRef`]; [`CacheStore::prune_cache`] removes the
//! rest.

use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::Store;
use super::entries::ResponseBody;
use super::hash::compute_content_hash;
use super::timestamp;
use crate::Error;

/// Cache table size and cumulative lookup counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: u64,
    /// Sum of cached body sizes in bytes.
    pub total_size: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    /// `hits / (hits + misses)`, 0 when there were no lookups.
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// History store with a content-addressed response cache.
///
/// Dereferences to [`Store`], so every history operation is available. Both
/// tables share one connection: closing either closes both.
#[derive(Clone, Debug)]
pub struct CacheStore {
    store: Store,
    counters: Arc<Counters>,
}

impl Deref for CacheStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

impl CacheStore {
    /// Wrap an open store.
    pub fn new(store: Store) -> Self {
        Self { store, counters: Arc::default() }
    }

    /// Open a durable cache-enabled store at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::new(Store::open(path).await?))
    }

    /// Open a transient in-memory cache-enabled store.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Store::open_in_memory().await?))
    }

    /// Store `body` and return its content hash.
    ///
    /// Caching content that is already present bumps its access count and
    /// returns the existing hash.
    pub async fn cache_response(&self, body: &str) -> Result<String, Error> {
        let hash = compute_content_hash(body);
        let size = i64::try_from(body.len()).unwrap_or(i64::MAX);
        let body = body.to_string();
        let now = timestamp::encode(&Utc::now())?;

        let _guard = self.store.write_guard().await?;
        let key = hash.clone();
        self.store
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO response_cache (hash, body, size, created_at, access_count, last_accessed)
                    VALUES (?1, ?2, ?3, ?4, 1, ?4)
                    ON CONFLICT(hash) DO UPDATE SET
                        access_count = access_count + 1,
                        last_accessed = excluded.last_accessed",
                    params![key, body, size, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(hash = %hash, size, "cached response body");
        Ok(hash)
    }

    /// Get a cached body by hash.
    ///
    /// Hits bump the row's access count. Both hits and misses are counted, even
    /// though a miss fails with [`Error::NotFound`].
    pub async fn get_cached_response(&self, hash: &str) -> Result<String, Error> {
        if hash.is_empty() {
            return Err(Error::InvalidId);
        }
        let key = hash.to_string();
        let now = timestamp::encode(&Utc::now())?;

        let _guard = self.store.read_guard().await?;
        let body = self
            .store
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let body = conn
                    .query_row(
                        "UPDATE response_cache
                        SET access_count = access_count + 1, last_accessed = ?2
                        WHERE hash = ?1
                        RETURNING body",
                        params![key, now],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(body)
            })
            .await
            .map_err(Error::from)?;

        match body {
            Some(body) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(body)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(hash, "response cache miss");
                Err(Error::NotFound(hash.to_string()))
            }
        }
    }

    /// Resolve an entry's response body to its content.
    ///
    /// Inline bodies are returned as-is; cache references go through
    /// [`CacheStore::get_cached_response`].
    pub async fn resolve_body(&self, body: &ResponseBody) -> Result<String, Error> {
        match body {
            ResponseBody::Inline(content) => Ok(content.clone()),
            ResponseBody::CacheRef(hash) => self.get_cached_response(hash).await,
        }
    }

    /// Delete every cached body that no history entry references.
    ///
    /// Returns the number of deleted rows.
    pub async fn prune_cache(&self) -> Result<u64, Error> {
        let _guard = self.store.write_guard().await?;
        let deleted = self
            .store
            .conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM response_cache WHERE hash NOT IN (
                        SELECT response_cache_ref FROM entries WHERE response_cache_ref IS NOT NULL
                    )",
                    [],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(deleted, "pruned unreferenced cache entries");
        Ok(deleted)
    }

    /// Cache table size plus cumulative hit/miss counters.
    pub async fn cache_stats(&self) -> Result<CacheStats, Error> {
        let _guard = self.store.read_guard().await?;
        let (total, size) = self
            .store
            .conn
            .call(|conn| -> Result<(i64, i64), Error> {
                let totals = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM response_cache",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(totals)
            })
            .await
            .map_err(Error::from)?;

        let hit_count = self.counters.hits.load(Ordering::Relaxed);
        let miss_count = self.counters.misses.load(Ordering::Relaxed);
        let lookups = hit_count + miss_count;
        let hit_rate = if lookups > 0 { hit_count as f64 / lookups as f64 } else { 0.0 };

        Ok(CacheStats { total_entries: total as u64, total_size: size.max(0) as u64, hit_count, miss_count, hit_rate })
    }

    /// Delete every cached body and reset the hit/miss counters.
    pub async fn clear_cache(&self) -> Result<u64, Error> {
        let _guard = self.store.write_guard().await?;
        let deleted = self
            .store
            .conn
            .call(|conn| -> Result<u64, Error> { Ok(conn.execute("DELETE FROM response_cache", [])? as u64) })
            .await
            .map_err(Error::from)?;

        self.counters.hits.store(0, Ordering::Relaxed);
        self.counters.misses.store(0, Ordering::Relaxed);
        tracing::info!(deleted, "cleared response cache");
        Ok(deleted)
    }

    /// The underlying history store.
    pub fn store(&self) -> &Store {
        &self.store
    }
}
