//! History entry CRUD operations.
//!
//! Provides the [`Entry`] record and the functions for creating, reading,
//! replacing, and deleting it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::types::Value;
use tokio_rusqlite::rusqlite::{self, Row, params_from_iter};
use uuid::Uuid;

use super::connection::Store;
use super::timestamp;
use crate::Error;

/// Columns of the `entries` table, in the order [`Entry::to_values`] produces
/// and [`entry_from_row`] reads them.
pub(crate) const ENTRY_COLUMNS: &str = "id, timestamp, method, url, request_headers, request_body,
    response_status, response_status_text, response_headers, response_body, response_cache_ref,
    response_time_ms, response_size, collection_id, collection_name, request_id, request_name,
    environment, tags, notes, metadata, tests_passed, tests_failed";

const INSERT_ENTRY: &str = "INSERT INTO entries (
    id, timestamp, method, url, request_headers, request_body,
    response_status, response_status_text, response_headers, response_body, response_cache_ref,
    response_time_ms, response_size, collection_id, collection_name, request_id, request_name,
    environment, tags, notes, metadata, tests_passed, tests_failed
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
          ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)";

const UPDATE_ENTRY: &str = "UPDATE entries SET
    timestamp = ?2,
    method = ?3,
    url = ?4,
    request_headers = ?5,
    request_body = ?6,
    response_status = ?7,
    response_status_text = ?8,
    response_headers = ?9,
    response_body = ?10,
    response_cache_ref = ?11,
    response_time_ms = ?12,
    response_size = ?13,
    collection_id = ?14,
    collection_name = ?15,
    request_id = ?16,
    request_name = ?17,
    environment = ?18,
    tags = ?19,
    notes = ?20,
    metadata = ?21,
    tests_passed = ?22,
    tests_failed = ?23
WHERE id = ?1";

/// Response payload of a recorded exchange.
///
/// A body is either stored inline or as a reference to a row in the response
/// cache (see [`crate::CacheStore::cache_response`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    Inline(String),
    CacheRef(String),
}

impl ResponseBody {
    /// The cache hash, if this body is a cache reference.
    pub fn cache_ref(&self) -> Option<&str> {
        match self {
            ResponseBody::CacheRef(hash) => Some(hash),
            ResponseBody::Inline(_) => None,
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Inline(String::new())
    }
}

impl From<String> for ResponseBody {
    fn from(body: String) -> Self {
        ResponseBody::Inline(body)
    }
}

impl From<&str> for ResponseBody {
    fn from(body: &str) -> Self {
        ResponseBody::Inline(body.to_string())
    }
}

/// One recorded request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    /// Unique id. Assigned by [`Store::add`] when empty.
    pub id: String,
    pub timestamp: DateTime<Utc>,

    pub method: String,
    pub url: String,
    pub request_headers: BTreeMap<String, String>,
    pub request_body: String,

    pub response_status: i32,
    pub response_status_text: String,
    pub response_headers: BTreeMap<String, String>,
    pub response_body: ResponseBody,
    pub response_time_ms: i64,
    /// Response size in bytes.
    pub response_size: i64,

    pub collection_id: String,
    pub collection_name: String,
    pub request_id: String,
    pub request_name: String,
    pub environment: String,
    pub tags: Vec<String>,
    pub notes: String,
    pub metadata: BTreeMap<String, serde_json::Value>,

    pub tests_passed: u32,
    pub tests_failed: u32,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            id: String::new(),
            timestamp: Utc::now(),
            method: String::new(),
            url: String::new(),
            request_headers: BTreeMap::new(),
            request_body: String::new(),
            response_status: 0,
            response_status_text: String::new(),
            response_headers: BTreeMap::new(),
            response_body: ResponseBody::default(),
            response_time_ms: 0,
            response_size: 0,
            collection_id: String::new(),
            collection_name: String::new(),
            request_id: String::new(),
            request_name: String::new(),
            environment: String::new(),
            tags: Vec::new(),
            notes: String::new(),
            metadata: BTreeMap::new(),
            tests_passed: 0,
            tests_failed: 0,
        }
    }
}

impl Entry {
    /// A new entry for `method url`, timestamped now.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), ..Default::default() }
    }

    /// Whether the response status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.response_status)
    }

    /// Bind values for every column, in [`ENTRY_COLUMNS`] order.
    fn to_values(&self) -> Result<Vec<Value>, Error> {
        let (inline_body, cache_ref) = match &self.response_body {
            ResponseBody::Inline(body) => (Value::Text(body.clone()), Value::Null),
            ResponseBody::CacheRef(hash) => (Value::Null, Value::Text(hash.clone())),
        };

        Ok(vec![
            Value::Text(self.id.clone()),
            Value::Text(timestamp::encode(&self.timestamp)?),
            Value::Text(self.method.clone()),
            Value::Text(self.url.clone()),
            encode_json("request_headers", &self.request_headers, self.request_headers.is_empty())?,
            Value::Text(self.request_body.clone()),
            Value::Integer(i64::from(self.response_status)),
            Value::Text(self.response_status_text.clone()),
            encode_json("response_headers", &self.response_headers, self.response_headers.is_empty())?,
            inline_body,
            cache_ref,
            Value::Integer(self.response_time_ms),
            Value::Integer(self.response_size),
            Value::Text(self.collection_id.clone()),
            Value::Text(self.collection_name.clone()),
            Value::Text(self.request_id.clone()),
            Value::Text(self.request_name.clone()),
            Value::Text(self.environment.clone()),
            encode_json("tags", &self.tags, self.tags.is_empty())?,
            Value::Text(self.notes.clone()),
            encode_json("metadata", &self.metadata, self.metadata.is_empty())?,
            Value::Integer(i64::from(self.tests_passed)),
            Value::Integer(i64::from(self.tests_failed)),
        ])
    }
}

/// Structured columns are stored as JSON text, or NULL when empty.
fn encode_json<T: Serialize>(field: &'static str, value: &T, empty: bool) -> Result<Value, Error> {
    if empty {
        return Ok(Value::Null);
    }
    serde_json::to_string(value)
        .map(Value::Text)
        .map_err(|source| Error::Serialization { field, source })
}

fn decode_json<T: DeserializeOwned + Default>(field: &'static str, raw: Option<String>) -> Result<T, Error> {
    match raw {
        Some(text) if !text.is_empty() => {
            serde_json::from_str(&text).map_err(|source| Error::Serialization { field, source })
        }
        _ => Ok(T::default()),
    }
}

/// Decode a row selected with [`ENTRY_COLUMNS`].
pub(crate) fn entry_from_row(row: &Row<'_>) -> Result<Entry, Error> {
    let raw_timestamp: String = row.get(1)?;
    let inline_body: Option<String> = row.get(9)?;
    let cache_ref: Option<String> = row.get(10)?;
    let response_body = match cache_ref {
        Some(hash) => ResponseBody::CacheRef(hash),
        None => ResponseBody::Inline(inline_body.unwrap_or_default()),
    };

    Ok(Entry {
        id: row.get(0)?,
        timestamp: timestamp::decode(&raw_timestamp)?,
        method: row.get(2)?,
        url: row.get(3)?,
        request_headers: decode_json("request_headers", row.get(4)?)?,
        request_body: row.get(5)?,
        response_status: row.get(6)?,
        response_status_text: row.get(7)?,
        response_headers: decode_json("response_headers", row.get(8)?)?,
        response_body,
        response_time_ms: row.get(11)?,
        response_size: row.get(12)?,
        collection_id: row.get(13)?,
        collection_name: row.get(14)?,
        request_id: row.get(15)?,
        request_name: row.get(16)?,
        environment: row.get(17)?,
        tags: decode_json("tags", row.get(18)?)?,
        notes: row.get(19)?,
        metadata: decode_json("metadata", row.get(20)?)?,
        tests_passed: row.get(21)?,
        tests_failed: row.get(22)?,
    })
}

/// Run a select over [`ENTRY_COLUMNS`] and decode every row.
pub(crate) fn query_entries(conn: &rusqlite::Connection, sql: &str, values: Vec<Value>) -> Result<Vec<Entry>, Error> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(entry_from_row(row)?);
    }
    Ok(entries)
}

impl Store {
    /// Record an entry and return its id.
    ///
    /// An empty `entry.id` is replaced with a fresh UUID. Reusing an existing
    /// explicit id fails with a database constraint error.
    pub async fn add(&self, entry: &Entry) -> Result<String, Error> {
        let mut entry = entry.clone();
        if entry.id.is_empty() {
            entry.id = Uuid::new_v4().to_string();
        }
        let values = entry.to_values()?;

        let _guard = self.write_guard().await?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(INSERT_ENTRY, params_from_iter(values))?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(id = %entry.id, method = %entry.method, status = entry.response_status, "recorded entry");
        Ok(entry.id)
    }

    /// Get an entry by id.
    pub async fn get(&self, id: &str) -> Result<Entry, Error> {
        if id.is_empty() {
            return Err(Error::InvalidId);
        }
        let id = id.to_string();

        let _guard = self.read_guard().await?;
        self.conn
            .call(move |conn| -> Result<Entry, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
                query_entries(conn, &sql, vec![Value::Text(id.clone())])?
                    .into_iter()
                    .next()
                    .ok_or(Error::NotFound(id))
            })
            .await
            .map_err(Error::from)
    }

    /// Replace every field of the entry with `entry.id`.
    ///
    /// There is no partial merge: fields left at their defaults overwrite the
    /// stored values.
    pub async fn update(&self, entry: &Entry) -> Result<(), Error> {
        if entry.id.is_empty() {
            return Err(Error::InvalidId);
        }
        let id = entry.id.clone();
        let values = entry.to_values()?;

        let _guard = self.write_guard().await?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let changed = conn.execute(UPDATE_ENTRY, params_from_iter(values))?;
                if changed == 0 {
                    return Err(Error::NotFound(id));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an entry by id.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        if id.is_empty() {
            return Err(Error::InvalidId);
        }
        let id = id.to_string();

        let _guard = self.write_guard().await?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE id = ?1", params![id])?;
                if deleted == 0 {
                    return Err(Error::NotFound(id));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_test_entry() -> Entry {
        let mut entry = Entry::new("POST", "https://api.example.com/users");
        entry.request_headers.insert("Content-Type".into(), "application/json".into());
        entry.request_body = r#"{"name":"ada"}"#.into();
        entry.response_status = 201;
        entry.response_status_text = "201 Created".into();
        entry.response_headers.insert("Location".into(), "/users/7".into());
        entry.response_body = r#"{"id":7}"#.into();
        entry.response_time_ms = 42;
        entry.response_size = 8;
        entry.collection_id = "col-1".into();
        entry.collection_name = "Users API".into();
        entry.request_id = "req-1".into();
        entry.request_name = "Create user".into();
        entry.environment = "production".into();
        entry.tags = vec!["smoke".into(), "users".into()];
        entry.notes = "first run".into();
        entry.metadata.insert("runner".into(), serde_json::json!({"iteration": 1}));
        entry.tests_passed = 3;
        entry.tests_failed = 1;
        entry
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let store = Store::open_in_memory().await.unwrap();
        let entry = make_test_entry();

        let id = store.add(&entry).await.unwrap();
        let retrieved = store.get(&id).await.unwrap();

        assert_eq!(retrieved, Entry { id, ..entry });
    }

    #[tokio::test]
    async fn test_add_keeps_explicit_id() {
        let store = Store::open_in_memory().await.unwrap();
        let entry = Entry { id: "fixed-id".into(), ..Entry::new("GET", "https://example.com") };

        assert_eq!(store.add(&entry).await.unwrap(), "fixed-id");
        assert!(store.add(&entry).await.is_err());
    }

    #[tokio::test]
    async fn test_add_generates_unique_ids() {
        let store = Store::open_in_memory().await.unwrap();
        let entry = Entry::new("GET", "https://example.com");

        let mut ids = HashSet::new();
        for _ in 0..50 {
            ids.insert(store.add(&entry).await.unwrap());
        }
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_cache_ref_body_round_trip() {
        let store = Store::open_in_memory().await.unwrap();
        let entry = Entry { response_body: ResponseBody::CacheRef("ab".repeat(32)), ..Entry::new("GET", "/big") };

        let id = store.add(&entry).await.unwrap();
        let retrieved = store.get(&id).await.unwrap();
        assert_eq!(retrieved.response_body.cache_ref(), Some("ab".repeat(32).as_str()));
    }

    #[tokio::test]
    async fn test_get_invalid_and_missing() {
        let store = Store::open_in_memory().await.unwrap();
        assert!(matches!(store.get("").await, Err(Error::InvalidId)));
        assert!(matches!(store.get("nonexistent").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let store = Store::open_in_memory().await.unwrap();
        let id = store.add(&make_test_entry()).await.unwrap();

        let replacement = Entry {
            id: id.clone(),
            response_status: 500,
            notes: "retried".into(),
            ..Entry::new("PUT", "https://api.example.com/users/7")
        };
        store.update(&replacement).await.unwrap();

        let retrieved = store.get(&id).await.unwrap();
        assert_eq!(retrieved, replacement);
        assert!(retrieved.tags.is_empty());
        assert!(retrieved.request_headers.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = Store::open_in_memory().await.unwrap();
        let entry = Entry { id: "never-added".into(), ..make_test_entry() };
        assert!(matches!(store.update(&entry).await, Err(Error::NotFound(_))));
        assert!(matches!(store.update(&make_test_entry()).await, Err(Error::InvalidId)));
    }

    #[tokio::test]
    async fn test_unstorable_timestamp_rejected() {
        use chrono::TimeZone;

        let store = Store::open_in_memory().await.unwrap();
        let kept = store.add(&make_test_entry()).await.unwrap();
        let far_future = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();

        let entry = Entry { timestamp: far_future, ..Entry::new("GET", "/future") };
        assert!(matches!(store.add(&entry).await, Err(Error::InvalidOption(_))));

        let moved = Entry { id: kept.clone(), timestamp: far_future, ..make_test_entry() };
        assert!(matches!(store.update(&moved).await, Err(Error::InvalidOption(_))));

        // the store stays readable
        assert_eq!(store.get(&kept).await.unwrap().url, "https://api.example.com/users");
        assert_eq!(store.list(&crate::QueryOptions::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = Store::open_in_memory().await.unwrap();
        let id = store.add(&make_test_entry()).await.unwrap();

        store.delete(&id).await.unwrap();
        assert!(matches!(store.get(&id).await, Err(Error::NotFound(_))));
        assert!(matches!(store.delete(&id).await, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_response_body_serde_shape() {
        let json = serde_json::to_value(ResponseBody::CacheRef("abc".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "cache_ref", "value": "abc"}));
    }
}
