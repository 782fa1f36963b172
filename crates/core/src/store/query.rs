//! Filtered listing, counting, bulk deletion, and substring search.
//!
//! Filters are collected into a [`Predicates`] list: every clause is a fixed SQL
//! fragment with `?` placeholders, and every caller-supplied value is bound as a
//! parameter. Column names only ever come from [`SortField`].

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite::params_from_iter;
use tokio_rusqlite::rusqlite::types::Value;

use super::connection::Store;
use super::entries::{ENTRY_COLUMNS, Entry, query_entries};
use super::timestamp;
use crate::Error;

/// Columns that entries can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Timestamp,
    Method,
    Url,
    Status,
    ResponseTime,
    ResponseSize,
    Collection,
    Request,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::Timestamp => "timestamp",
            SortField::Method => "method",
            SortField::Url => "url",
            SortField::Status => "response_status",
            SortField::ResponseTime => "response_time_ms",
            SortField::ResponseSize => "response_size",
            SortField::Collection => "collection_name",
            SortField::Request => "request_name",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "timestamp" => Ok(SortField::Timestamp),
            "method" => Ok(SortField::Method),
            "url" => Ok(SortField::Url),
            "status" | "response_status" => Ok(SortField::Status),
            "response_time" | "response_time_ms" => Ok(SortField::ResponseTime),
            "response_size" | "size" => Ok(SortField::ResponseSize),
            "collection" | "collection_name" => Ok(SortField::Collection),
            "request" | "request_name" => Ok(SortField::Request),
            other => Err(Error::InvalidOption(format!("unknown sort field {other:?}"))),
        }
    }
}

/// Sort direction. Defaults to newest/largest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "" | "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidOption(format!("unknown sort order {other:?}"))),
        }
    }
}

/// Filter, sort, and pagination options for history queries.
///
/// Every field is optional; the default value (or an empty string) means "no
/// filter". All set filters are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub method: Option<String>,
    /// URL pattern with `*` as a wildcard. Other characters use SQL `LIKE` rules.
    pub url_pattern: Option<String>,
    /// Inclusive lower status bound.
    pub status_min: Option<i32>,
    /// Inclusive upper status bound.
    pub status_max: Option<i32>,
    pub collection_id: Option<String>,
    pub request_id: Option<String>,
    pub environment: Option<String>,
    /// Exclusive lower time bound.
    pub after: Option<DateTime<Utc>>,
    /// Exclusive upper time bound.
    pub before: Option<DateTime<Utc>>,
    /// Every listed tag must be present on the entry.
    pub tags: Vec<String>,
    /// Free-text query. Only read by [`Store::search`] callers; ignored by filters.
    pub search: Option<String>,
    /// Only entries with at least one failed test.
    pub only_failed: bool,
    /// Only entries with passing tests and no failures.
    pub only_passed: bool,
    /// Page size. `None` or zero means no limit.
    pub limit: Option<usize>,
    pub offset: usize,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Conjunctive list of parameterized predicates.
#[derive(Debug, Default, Clone)]
pub(crate) struct Predicates {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicates {
    /// Add a clause with one `?` placeholder bound to `value`.
    pub(crate) fn push(&mut self, clause: &str, value: Value) {
        self.clauses.push(clause.to_string());
        self.params.push(value);
    }

    /// Add a clause with no bound values.
    pub(crate) fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// Add a clause whose placeholders are bound to `values`, in order.
    pub(crate) fn push_many(&mut self, clause: String, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause);
        self.params.extend(values);
    }

    pub(crate) fn eq_text(&mut self, column: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(&format!("{column} = ?"), Value::Text(value.to_string()));
        }
    }

    pub(crate) fn status_range(&mut self, min: Option<i32>, max: Option<i32>) {
        if let Some(min) = min {
            self.push("response_status >= ?", Value::Integer(i64::from(min)));
        }
        if let Some(max) = max {
            self.push("response_status <= ?", Value::Integer(i64::from(max)));
        }
    }

    pub(crate) fn time_range(&mut self, after: Option<&DateTime<Utc>>, before: Option<&DateTime<Utc>>) {
        if let Some(after) = after {
            self.push("timestamp > ?", Value::Text(timestamp::encode_bound(after)));
        }
        if let Some(before) = before {
            self.push("timestamp < ?", Value::Text(timestamp::encode_bound(before)));
        }
    }

    /// ` WHERE a AND b`, or an empty string when there are no clauses.
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> Vec<Value> {
        self.params.clone()
    }

    pub(crate) fn into_params(self) -> Vec<Value> {
        self.params
    }
}

impl QueryOptions {
    /// Predicates for [`Store::list`] and [`Store::count`].
    pub(crate) fn predicates(&self) -> Predicates {
        let mut preds = Predicates::default();
        preds.eq_text("method", non_empty(&self.method));
        if let Some(pattern) = non_empty(&self.url_pattern) {
            preds.push("url LIKE ?", Value::Text(pattern.replace('*', "%")));
        }
        preds.status_range(self.status_min, self.status_max);
        preds.eq_text("collection_id", non_empty(&self.collection_id));
        preds.eq_text("request_id", non_empty(&self.request_id));
        preds.eq_text("environment", non_empty(&self.environment));
        preds.time_range(self.after.as_ref(), self.before.as_ref());
        for tag in self.tags.iter().filter(|t| !t.is_empty()) {
            preds.push(
                "EXISTS (SELECT 1 FROM json_each(entries.tags) WHERE json_each.value = ?)",
                Value::Text(tag.clone()),
            );
        }
        if self.only_failed {
            preds.push_raw("tests_failed > 0");
        }
        if self.only_passed {
            preds.push_raw("tests_passed > 0 AND tests_failed = 0");
        }
        preds
    }

    /// Reduced predicate set used by [`Store::delete_many`].
    pub(crate) fn bulk_delete_predicates(&self) -> Predicates {
        let mut preds = Predicates::default();
        preds.eq_text("method", non_empty(&self.method));
        preds.eq_text("collection_id", non_empty(&self.collection_id));
        preds.time_range(self.after.as_ref(), self.before.as_ref());
        preds
    }

    /// Predicates applied alongside the text match in [`Store::search`].
    fn search_predicates(&self) -> Predicates {
        let mut preds = Predicates::default();
        preds.eq_text("method", non_empty(&self.method));
        preds.eq_text("collection_id", non_empty(&self.collection_id));
        preds
    }

    fn order_sql(&self) -> String {
        let order = self.sort_order.keyword();
        format!(" ORDER BY {} {order}, id {order}", self.sort_by.column())
    }

    fn page_size(&self) -> Option<usize> {
        self.limit.filter(|&limit| limit > 0)
    }

    fn pagination(&self, params: &mut Vec<Value>) -> &'static str {
        let limit = self.page_size();
        if limit.is_none() && self.offset == 0 {
            return "";
        }
        params.push(Value::Integer(limit.map_or(-1, to_i64)));
        params.push(Value::Integer(to_i64(self.offset)));
        " LIMIT ? OFFSET ?"
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Columns matched by [`Store::search`].
const SEARCH_COLUMNS: &[&str] = &[
    "url",
    "method",
    "request_body",
    "response_body",
    "notes",
    "collection_name",
    "request_name",
    "environment",
];

/// `LIKE` pattern matching `query` literally anywhere in a value.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Store {
    /// List entries matching every filter in `opts`, sorted and paginated.
    pub async fn list(&self, opts: &QueryOptions) -> Result<Vec<Entry>, Error> {
        let preds = opts.predicates();
        let mut params = preds.params();
        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM entries{}{}", preds.where_sql(), opts.order_sql());
        sql.push_str(opts.pagination(&mut params));

        let _guard = self.read_guard().await?;
        self.conn
            .call(move |conn| query_entries(conn, &sql, params))
            .await
            .map_err(Error::from)
    }

    /// Count entries matching every filter in `opts`. Sort and pagination are
    /// ignored.
    pub async fn count(&self, opts: &QueryOptions) -> Result<u64, Error> {
        let preds = opts.predicates();
        let sql = format!("SELECT COUNT(*) FROM entries{}", preds.where_sql());
        let params = preds.into_params();

        let _guard = self.read_guard().await?;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries by method, collection, and time range.
    ///
    /// Other filters in `opts` are ignored. Returns the number of deleted
    /// entries; zero matches is not an error.
    pub async fn delete_many(&self, opts: &QueryOptions) -> Result<u64, Error> {
        let preds = opts.bulk_delete_predicates();
        let sql = format!("DELETE FROM entries{}", preds.where_sql());
        let params = preds.into_params();

        let _guard = self.write_guard().await?;
        let deleted = self
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(&sql, params_from_iter(params))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(deleted, "bulk deleted entries");
        Ok(deleted)
    }

    /// Case-insensitive substring search.
    ///
    /// Matches `query` against the URL, method, request body, inline response
    /// body, notes, collection name, request name, and environment, restricted by
    /// the method and collection filters of `opts`. Results are newest first and
    /// limited by `opts.limit`. Case folding is ASCII-only.
    pub async fn search(&self, query: &str, opts: &QueryOptions) -> Result<Vec<Entry>, Error> {
        let mut preds = opts.search_predicates();
        if !query.is_empty() {
            let pattern = contains_pattern(query);
            let clause = SEARCH_COLUMNS
                .iter()
                .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" OR ");
            preds.push_many(
                format!("({clause})"),
                SEARCH_COLUMNS.iter().map(|_| Value::Text(pattern.clone())),
            );
        }

        let mut sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries{} ORDER BY timestamp DESC, id DESC",
            preds.where_sql()
        );
        let mut params = preds.into_params();
        if let Some(limit) = opts.page_size() {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(to_i64(limit)));
        }

        let _guard = self.read_guard().await?;
        self.conn
            .call(move |conn| query_entries(conn, &sql, params))
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn entry(method: &str, url: &str, status: i32, minute: i64) -> Entry {
        Entry { response_status: status, timestamp: at(minute), ..Entry::new(method, url) }
    }

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        store.add(&entry("GET", "https://api.example.com/users", 200, 0)).await.unwrap();
        store.add(&entry("GET", "https://api.example.com/orders", 404, 1)).await.unwrap();
        store.add(&entry("POST", "https://api.example.com/users", 201, 2)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_method_filter() {
        let store = seeded_store().await;
        let opts = QueryOptions { method: Some("GET".into()), ..Default::default() };

        let entries = store.list(&opts).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.method == "GET"));
        assert_eq!(store.count(&opts).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_filters_conjunction() {
        let store = seeded_store().await;
        let opts = QueryOptions {
            method: Some("GET".into()),
            url_pattern: Some("*/users".into()),
            status_min: Some(200),
            status_max: Some(299),
            ..Default::default()
        };

        let entries = store.list(&opts).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://api.example.com/users");
        assert_eq!(entries[0].method, "GET");
    }

    #[tokio::test]
    async fn test_empty_strings_are_not_filters() {
        let store = seeded_store().await;
        let opts = QueryOptions { method: Some(String::new()), environment: Some(String::new()), ..Default::default() };
        assert_eq!(store.list(&opts).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_time_range_exclusive() {
        let store = seeded_store().await;
        let opts = QueryOptions { after: Some(at(0)), before: Some(at(2)), ..Default::default() };

        let entries = store.list(&opts).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, at(1));
    }

    #[tokio::test]
    async fn test_list_default_sort_newest_first() {
        let store = seeded_store().await;
        let entries = store.list(&QueryOptions::default()).await.unwrap();
        let stamps: Vec<_> = entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(2), at(1), at(0)]);
    }

    #[tokio::test]
    async fn test_list_sort_by_status_asc() {
        let store = seeded_store().await;
        let opts = QueryOptions { sort_by: SortField::Status, sort_order: SortOrder::Asc, ..Default::default() };
        let statuses: Vec<_> = store.list(&opts).await.unwrap().iter().map(|e| e.response_status).collect();
        assert_eq!(statuses, vec![200, 201, 404]);
    }

    #[tokio::test]
    async fn test_pagination_stable() {
        let store = Store::open_in_memory().await.unwrap();
        for minute in 0..10 {
            store.add(&entry("GET", "https://example.com", 200, minute)).await.unwrap();
        }

        let all = store.list(&QueryOptions::default()).await.unwrap();
        let first = store
            .list(&QueryOptions { limit: Some(3), offset: 0, ..Default::default() })
            .await
            .unwrap();
        let second = store
            .list(&QueryOptions { limit: Some(3), offset: 3, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        let joined: Vec<_> = first.iter().chain(second.iter()).map(|e| e.id.clone()).collect();
        let expected: Vec<_> = all.iter().take(6).map(|e| e.id.clone()).collect();
        assert_eq!(joined, expected);
    }

    #[tokio::test]
    async fn test_offset_without_limit() {
        let store = seeded_store().await;
        let entries = store.list(&QueryOptions { offset: 1, ..Default::default() }).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_limit_is_unlimited() {
        let store = seeded_store().await;
        let opts = QueryOptions { limit: Some(0), ..Default::default() };
        assert_eq!(store.list(&opts).await.unwrap().len(), 3);
        assert_eq!(store.search("", &opts).await.unwrap().len(), 3);

        let paged = QueryOptions { limit: Some(0), offset: 2, ..Default::default() };
        assert_eq!(store.list(&paged).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_bounds_beyond_storable_years() {
        let store = seeded_store().await;
        let far_future = Utc.with_ymd_and_hms(12_000, 1, 1, 0, 0, 0).unwrap();

        let before = QueryOptions { before: Some(far_future), ..Default::default() };
        assert_eq!(store.count(&before).await.unwrap(), 3);

        let after = QueryOptions { after: Some(far_future), ..Default::default() };
        assert_eq!(store.count(&after).await.unwrap(), 0);

        let since_dawn = QueryOptions { after: Some(DateTime::<Utc>::MIN_UTC), ..Default::default() };
        assert_eq!(store.count(&since_dawn).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_tags_and_test_outcomes() {
        let store = Store::open_in_memory().await.unwrap();
        let tagged = Entry { tags: vec!["smoke".into(), "auth".into()], tests_passed: 2, ..Entry::new("GET", "/a") };
        let failing = Entry { tags: vec!["smoke".into()], tests_passed: 1, tests_failed: 1, ..Entry::new("GET", "/b") };
        store.add(&tagged).await.unwrap();
        store.add(&failing).await.unwrap();
        store.add(&Entry::new("GET", "/c")).await.unwrap();

        let smoke = QueryOptions { tags: vec!["smoke".into()], ..Default::default() };
        assert_eq!(store.count(&smoke).await.unwrap(), 2);

        let both = QueryOptions { tags: vec!["smoke".into(), "auth".into()], ..Default::default() };
        assert_eq!(store.list(&both).await.unwrap()[0].url, "/a");

        let failed = QueryOptions { only_failed: true, ..Default::default() };
        assert_eq!(store.list(&failed).await.unwrap()[0].url, "/b");

        let passed = QueryOptions { only_passed: true, ..Default::default() };
        assert_eq!(store.list(&passed).await.unwrap()[0].url, "/a");
    }

    #[tokio::test]
    async fn test_list_empty_is_ok() {
        let store = Store::open_in_memory().await.unwrap();
        let opts = QueryOptions { environment: Some("nowhere".into()), ..Default::default() };
        assert!(store.list(&opts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_many_reduced_filters() {
        let store = seeded_store().await;
        // status filters are not part of bulk deletion
        let opts = QueryOptions { method: Some("GET".into()), status_min: Some(500), ..Default::default() };

        assert_eq!(store.delete_many(&opts).await.unwrap(), 2);
        assert_eq!(store.delete_many(&opts).await.unwrap(), 0);
        assert_eq!(store.count(&QueryOptions::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_many_time_range() {
        let store = seeded_store().await;
        let opts = QueryOptions { after: Some(at(0)), before: Some(at(2)), ..Default::default() };

        assert_eq!(store.delete_many(&opts).await.unwrap(), 1);
        let remaining = store.list(&QueryOptions::default()).await.unwrap();
        let stamps: Vec<_> = remaining.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(2), at(0)]);
    }

    #[tokio::test]
    async fn test_delete_many_by_collection() {
        let store = seeded_store().await;
        let billing = Entry { collection_id: "billing".into(), ..entry("GET", "https://api.example.com/invoices", 200, 3) };
        store.add(&billing).await.unwrap();
        let payment = Entry { collection_id: "billing".into(), ..entry("POST", "https://api.example.com/pay", 402, 4) };
        store.add(&payment).await.unwrap();

        let opts = QueryOptions { collection_id: Some("billing".into()), ..Default::default() };
        assert_eq!(store.delete_many(&opts).await.unwrap(), 2);
        assert_eq!(store.count(&QueryOptions::default()).await.unwrap(), 3);

        let scoped =
            QueryOptions { collection_id: Some("billing".into()), method: Some("GET".into()), ..Default::default() };
        assert_eq!(store.delete_many(&scoped).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_fields_case_insensitive() {
        let store = Store::open_in_memory().await.unwrap();
        let noted = Entry { notes: "Investigate TIMEOUT".into(), ..Entry::new("GET", "/health") };
        let body = Entry { response_body: "request timeout exceeded".into(), ..Entry::new("POST", "/jobs") };
        store.add(&noted).await.unwrap();
        store.add(&body).await.unwrap();
        store.add(&Entry::new("GET", "/users")).await.unwrap();

        let hits = store.search("timeout", &QueryOptions::default()).await.unwrap();
        assert_eq!(hits.len(), 2);

        let only_post = QueryOptions { method: Some("POST".into()), ..Default::default() };
        let hits = store.search("TIMEOUT", &only_post).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "/jobs");
    }

    #[tokio::test]
    async fn test_search_within_collection() {
        let store = Store::open_in_memory().await.unwrap();
        let inside = Entry { collection_id: "users".into(), ..Entry::new("GET", "/users/search") };
        store.add(&inside).await.unwrap();
        store.add(&Entry { collection_id: "admin".into(), ..Entry::new("GET", "/admin/users") }).await.unwrap();

        let opts = QueryOptions { collection_id: Some("users".into()), ..Default::default() };
        let hits = store.search("users", &opts).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "/users/search");
    }

    #[tokio::test]
    async fn test_search_empty_query_matches_everything() {
        let store = seeded_store().await;
        let hits = store.search("", &QueryOptions::default()).await.unwrap();
        let stamps: Vec<_> = hits.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(2), at(1), at(0)]);

        let get_only = QueryOptions { method: Some("GET".into()), ..Default::default() };
        assert_eq!(store.search("", &get_only).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let store = Store::open_in_memory().await.unwrap();
        store.add(&Entry::new("GET", "/discount/50%off")).await.unwrap();
        store.add(&Entry::new("GET", "/discount/50-off")).await.unwrap();

        let hits = store.search("50%", &QueryOptions::default()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "/discount/50%off");

        assert!(store.search("_", &QueryOptions::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_limit() {
        let store = seeded_store().await;
        let opts = QueryOptions { limit: Some(1), ..Default::default() };
        let hits = store.search("example", &opts).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].timestamp, at(2));
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("status".parse::<SortField>().unwrap(), SortField::Status);
        assert_eq!("".parse::<SortField>().unwrap(), SortField::Timestamp);
        assert!(matches!("id; DROP TABLE entries".parse::<SortField>(), Err(Error::InvalidOption(_))));
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("a_b%c"), "%a\\_b\\%c%");
    }
}
