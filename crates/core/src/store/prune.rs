//! Retention policies.
//!
//! A [`PrunePolicy`] names exactly one retention rule. [`PruneOptions`] is the
//! flat form accepted from callers and configuration; it resolves to a policy by
//! priority: age, then count, then date.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite::types::Value;
use tokio_rusqlite::rusqlite::{self, params_from_iter};

use super::connection::Store;
use super::query::Predicates;
use super::timestamp;
use crate::Error;

/// Filters restricting which entries a retention policy may delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneScope {
    pub collection_id: Option<String>,
    pub method: Option<String>,
    pub status_min: Option<i32>,
    pub status_max: Option<i32>,
}

impl PruneScope {
    fn predicates(&self) -> Predicates {
        let mut preds = Predicates::default();
        preds.eq_text("collection_id", self.collection_id.as_deref().filter(|v| !v.is_empty()));
        preds.eq_text("method", self.method.as_deref().filter(|v| !v.is_empty()));
        preds.status_range(self.status_min, self.status_max);
        preds
    }
}

/// A single retention rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PrunePolicy {
    /// Delete entries recorded more than `older_than` ago.
    ByAge { older_than: Duration, scope: PruneScope },
    /// Keep the newest `keep_last` entries, delete the rest.
    ByCount { keep_last: usize, scope: PruneScope },
    /// Delete entries recorded strictly before `before`.
    ByDate { before: DateTime<Utc>, scope: PruneScope },
}

/// Flat retention directive.
///
/// Only one rule is applied; see [`PruneOptions::policy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneOptions {
    /// Zero means unset.
    pub older_than: Duration,
    pub before: Option<DateTime<Utc>>,
    /// Zero means unset.
    pub keep_last: usize,
    pub collection_id: Option<String>,
    pub method: Option<String>,
    pub status_min: Option<i32>,
    pub status_max: Option<i32>,
}

impl PruneOptions {
    /// Resolve to a single policy: `older_than` wins over `keep_last`, which wins
    /// over `before`. Returns `None` when no rule is set.
    pub fn policy(&self) -> Option<PrunePolicy> {
        let scope = PruneScope {
            collection_id: self.collection_id.clone(),
            method: self.method.clone(),
            status_min: self.status_min,
            status_max: self.status_max,
        };

        if !self.older_than.is_zero() {
            Some(PrunePolicy::ByAge { older_than: self.older_than, scope })
        } else if self.keep_last > 0 {
            Some(PrunePolicy::ByCount { keep_last: self.keep_last, scope })
        } else {
            self.before.map(|before| PrunePolicy::ByDate { before, scope })
        }
    }
}

/// Outcome of a prune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneResult {
    pub deleted_count: u64,
    /// Sum of `response_size` over the deleted entries.
    pub freed_bytes: u64,
}

/// Rows selected for deletion, resolved before entering the connection thread.
enum Victims {
    Matching(Predicates),
    OldestBeyond { scope: Predicates, keep_last: usize },
}

impl Victims {
    fn plan(policy: &PrunePolicy, now: DateTime<Utc>) -> Self {
        match policy {
            PrunePolicy::ByAge { older_than, scope } => {
                // an age reaching past the earliest instant selects nothing
                let cutoff = chrono::Duration::from_std(*older_than)
                    .ok()
                    .and_then(|age| now.checked_sub_signed(age))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                let mut preds = scope.predicates();
                preds.push("timestamp < ?", Value::Text(timestamp::encode_bound(&cutoff)));
                Victims::Matching(preds)
            }
            PrunePolicy::ByDate { before, scope } => {
                let mut preds = scope.predicates();
                preds.push("timestamp < ?", Value::Text(timestamp::encode_bound(before)));
                Victims::Matching(preds)
            }
            PrunePolicy::ByCount { keep_last, scope } => {
                Victims::OldestBeyond { scope: scope.predicates(), keep_last: *keep_last }
            }
        }
    }

    fn delete(self, conn: &rusqlite::Connection) -> Result<PruneResult, Error> {
        match self {
            Victims::Matching(preds) => delete_where(conn, &preds.where_sql(), preds.into_params()),
            Victims::OldestBeyond { scope, keep_last } => {
                let scope_where = scope.where_sql();
                let mut params = scope.into_params();
                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM entries{scope_where}"),
                    params_from_iter(params.clone()),
                    |row| row.get(0),
                )?;
                let keep = i64::try_from(keep_last).unwrap_or(i64::MAX);
                if total <= keep {
                    return Ok(PruneResult::default());
                }

                params.push(Value::Integer(total - keep));
                let where_sql = format!(
                    " WHERE id IN (SELECT id FROM entries{scope_where} ORDER BY timestamp ASC, id ASC LIMIT ?)"
                );
                delete_where(conn, &where_sql, params)
            }
        }
    }
}

/// Sum sizes, then delete, every row matching `where_sql`.
fn delete_where(conn: &rusqlite::Connection, where_sql: &str, params: Vec<Value>) -> Result<PruneResult, Error> {
    let (count, freed): (i64, i64) = conn.query_row(
        &format!("SELECT COUNT(*), COALESCE(SUM(response_size), 0) FROM entries{where_sql}"),
        params_from_iter(params.clone()),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    if count == 0 {
        return Ok(PruneResult::default());
    }

    let deleted = conn.execute(&format!("DELETE FROM entries{where_sql}"), params_from_iter(params))?;
    Ok(PruneResult { deleted_count: deleted as u64, freed_bytes: freed.max(0) as u64 })
}

impl Store {
    /// Apply the retention rule selected by `opts`.
    ///
    /// A directive with no rule set is a no-op returning an empty result.
    pub async fn prune(&self, opts: &PruneOptions) -> Result<PruneResult, Error> {
        match opts.policy() {
            Some(policy) => self.prune_with(policy).await,
            None => {
                // still reject a closed store
                let _guard = self.write_guard().await?;
                Ok(PruneResult::default())
            }
        }
    }

    /// Apply a single retention policy.
    ///
    /// Freed bytes are summed and rows deleted in one transaction.
    pub async fn prune_with(&self, policy: PrunePolicy) -> Result<PruneResult, Error> {
        let victims = Victims::plan(&policy, Utc::now());

        let _guard = self.write_guard().await?;
        let result = self
            .conn
            .call(move |conn| -> Result<PruneResult, Error> {
                let tx = conn.transaction()?;
                let result = victims.delete(&tx)?;
                tx.commit()?;
                Ok(result)
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(
            ?policy,
            deleted = result.deleted_count,
            freed_bytes = result.freed_bytes,
            "pruned history"
        );
        Ok(result)
    }

    /// Delete every entry. Returns the number deleted.
    pub async fn clear(&self) -> Result<u64, Error> {
        let _guard = self.write_guard().await?;
        let deleted = self
            .conn
            .call(|conn| -> Result<u64, Error> { Ok(conn.execute("DELETE FROM entries", [])? as u64) })
            .await
            .map_err(Error::from)?;

        tracing::info!(deleted, "cleared history");
        Ok(deleted)
    }
}
