//! Unified error types for reqlog.
//!
//! Every store operation returns one of these variants. Callers compare them with
//! `matches!` the same way they would compare sentinel values.

use tokio_rusqlite::rusqlite;

/// Unified error type for the history store and response cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No entry or cache row exists for the given key.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The key is structurally invalid (e.g., empty).
    #[error("INVALID_ID: id must not be empty")]
    InvalidId,

    /// The store has been closed.
    #[error("STORE_CLOSED: store is closed")]
    StoreClosed,

    /// A query option could not be interpreted.
    #[error("INVALID_OPTION: {0}")]
    InvalidOption(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A structured column could not be encoded or decoded.
    #[error("STORE_ERROR: {field}: {source}")]
    Serialization {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A stored timestamp could not be parsed.
    #[error("STORE_ERROR: invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
