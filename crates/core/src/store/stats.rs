//! Aggregate statistics over the recorded history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite;

use super::connection::Store;
use super::timestamp;
use crate::Error;

/// Aggregate counters over the current entry set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_entries: u64,
    /// Sum of `response_size` in bytes.
    pub total_size: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    pub method_counts: BTreeMap<String, u64>,
    pub status_counts: BTreeMap<i32, u64>,
    /// Mean response time in milliseconds.
    pub avg_response_time: f64,
    /// Fraction of entries with a 2xx status; 0 when there are no entries.
    pub success_rate: f64,
    /// Entries per collection, keyed by collection name (or id when unnamed).
    pub collection_counts: BTreeMap<String, u64>,
}

fn grouped<K: rusqlite::types::FromSql + Ord>(
    conn: &rusqlite::Connection, sql: &str,
) -> Result<BTreeMap<K, u64>, Error> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, K>(0)?, row.get::<_, i64>(1)?)))?;
    let mut counts = BTreeMap::new();
    for row in rows {
        let (key, count) = row?;
        counts.insert(key, count as u64);
    }
    Ok(counts)
}

impl Store {
    /// Compute aggregate statistics.
    pub async fn stats(&self) -> Result<Stats, Error> {
        let _guard = self.read_guard().await?;
        self.conn
            .call(|conn| -> Result<Stats, Error> {
                let (total, size, oldest, newest, avg_time, successes): (
                    i64,
                    i64,
                    Option<String>,
                    Option<String>,
                    f64,
                    i64,
                ) = conn.query_row(
                    "SELECT
                        COUNT(*),
                        COALESCE(SUM(response_size), 0),
                        MIN(timestamp),
                        MAX(timestamp),
                        COALESCE(AVG(response_time_ms), 0.0),
                        COALESCE(SUM(CASE WHEN response_status BETWEEN 200 AND 299 THEN 1 ELSE 0 END), 0)
                    FROM entries",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
                )?;

                let success_rate = if total > 0 { successes as f64 / total as f64 } else { 0.0 };

                Ok(Stats {
                    total_entries: total as u64,
                    total_size: size.max(0) as u64,
                    oldest_entry: oldest.as_deref().map(timestamp::decode).transpose()?,
                    newest_entry: newest.as_deref().map(timestamp::decode).transpose()?,
                    method_counts: grouped(conn, "SELECT method, COUNT(*) FROM entries GROUP BY method")?,
                    status_counts: grouped(
                        conn,
                        "SELECT response_status, COUNT(*) FROM entries GROUP BY response_status",
                    )?,
                    avg_response_time: avg_time,
                    success_rate,
                    collection_counts: grouped(
                        conn,
                        "SELECT CASE WHEN collection_name != '' THEN collection_name ELSE collection_id END AS c,
                                COUNT(*)
                         FROM entries
                         WHERE collection_name != '' OR collection_id != ''
                         GROUP BY c",
                    )?,
                })
            })
            .await
            .map_err(Error::from)
    }
}
