//! Database connection management and store lifecycle.
//!
//! This module opens the SQLite database, applies the pragmas required for
//! concurrent access (WAL mode), runs migrations, and owns the open → closed
//! transition shared by every clone of a [`Store`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;
use crate::config::AppConfig;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// History store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Clones share the connection and the closed flag.
///
/// Mutating operations hold the lifecycle lock exclusively, read operations hold
/// it shared, so readers run concurrently while writers are serialized.
#[derive(Clone, Debug)]
pub struct Store {
    pub(crate) conn: Connection,
    closed: Arc<RwLock<bool>>,
}

impl Store {
    /// Open a durable store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, and runs any
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        let store = Self::init(conn).await?;
        tracing::debug!(path = %path.display(), "opened history store");
        Ok(store)
    }

    /// Open a transient in-memory store.
    ///
    /// Same pragmas and schema as a file-backed store; contents are lost when the
    /// store is closed or dropped.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open the store described by the application configuration.
    pub async fn open_with_config(config: &AppConfig) -> Result<Self, Error> {
        if config.in_memory {
            Self::open_in_memory().await
        } else {
            Self::open(&config.db_path).await
        }
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, closed: Arc::new(RwLock::new(false)) })
    }

    /// Close the store.
    ///
    /// Idempotent: closing an already closed store returns `Ok(())`. Once this
    /// returns, every other operation fails with [`Error::StoreClosed`].
    pub async fn close(&self) -> Result<(), Error> {
        let mut closed = self.closed.write().await;
        if *closed {
            return Ok(());
        }
        *closed = true;

        self.conn.clone().close().await.map_err(Error::from)?;
        tracing::info!("history store closed");
        Ok(())
    }

    /// Whether [`Store::close`] has completed.
    pub async fn is_closed(&self) -> bool {
        *self.closed.read().await
    }

    /// Shared hold for read operations; rejects a closed store.
    pub(crate) async fn read_guard(&self) -> Result<RwLockReadGuard<'_, bool>, Error> {
        let guard = self.closed.read().await;
        if *guard {
            return Err(Error::StoreClosed);
        }
        Ok(guard)
    }

    /// Exclusive hold for mutating operations; rejects a closed store.
    pub(crate) async fn write_guard(&self) -> Result<RwLockWriteGuard<'_, bool>, Error> {
        let guard = self.closed.write().await;
        if *guard {
            return Err(Error::StoreClosed);
        }
        Ok(guard)
    }
}
