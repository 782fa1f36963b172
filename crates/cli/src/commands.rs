//! Command definitions and implementations.
//!
//! Every command returns its result as pretty-printed JSON.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use reqlog_core::{AppConfig, CacheStore, PruneOptions, PruneResult, QueryOptions, SortField, SortOrder};
use serde::Serialize;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Inspect and maintain a request/response history store.
#[derive(Debug, Parser)]
#[command(name = "reqlog", version)]
pub struct Cli {
    /// Path to the history database (overrides REQLOG_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List recorded exchanges
    List(ListArgs),

    /// Show one recorded exchange
    Get {
        /// Entry id
        id: String,

        /// Resolve a cached response body to its content
        #[arg(long)]
        resolve: bool,
    },

    /// Case-insensitive substring search
    Search {
        /// Text to look for
        query: String,

        /// Restrict to one HTTP method
        #[arg(long)]
        method: Option<String>,

        /// Restrict to one collection id
        #[arg(long)]
        collection: Option<String>,

        /// Maximum number of results, 0 for no limit
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Aggregate statistics
    Stats,

    /// Delete entries by age, count, or date
    Prune(PruneArgs),

    /// Response cache statistics
    CacheStats,

    /// Delete cached bodies no entry references
    PruneCache,

    /// Apply the configured retention policy, then prune the cache
    Maintain,

    /// Delete every entry
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub method: Option<String>,

    /// URL pattern, `*` matches anything
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub status_min: Option<i32>,

    #[arg(long)]
    pub status_max: Option<i32>,

    /// Collection id
    #[arg(long)]
    pub collection: Option<String>,

    /// Request id
    #[arg(long)]
    pub request: Option<String>,

    #[arg(long)]
    pub environment: Option<String>,

    /// Only entries recorded after this RFC 3339 time
    #[arg(long)]
    pub after: Option<DateTime<Utc>>,

    /// Only entries recorded before this RFC 3339 time
    #[arg(long)]
    pub before: Option<DateTime<Utc>>,

    /// Required tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Only entries with failed tests
    #[arg(long, conflicts_with = "passed")]
    pub failed: bool,

    /// Only entries whose tests all passed
    #[arg(long)]
    pub passed: bool,

    /// Page size (defaults to the configured list limit, 0 for no limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// timestamp, method, url, status, response_time, response_size, collection, request
    #[arg(long, default_value = "timestamp")]
    pub sort_by: String,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,
}

impl ListArgs {
    fn to_options(&self, default_limit: usize) -> Result<QueryOptions> {
        let sort_by: SortField = self.sort_by.parse()?;
        Ok(QueryOptions {
            method: self.method.clone(),
            url_pattern: self.url.clone(),
            status_min: self.status_min,
            status_max: self.status_max,
            collection_id: self.collection.clone(),
            request_id: self.request.clone(),
            environment: self.environment.clone(),
            after: self.after,
            before: self.before,
            tags: self.tags.clone(),
            only_failed: self.failed,
            only_passed: self.passed,
            limit: Some(self.limit.unwrap_or(default_limit)),
            offset: self.offset,
            sort_by,
            sort_order: if self.asc { SortOrder::Asc } else { SortOrder::Desc },
            ..Default::default()
        })
    }
}

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Delete entries older than this many days
    #[arg(long)]
    pub older_than_days: Option<u64>,

    /// Keep only the newest N entries
    #[arg(long)]
    pub keep_last: Option<usize>,

    /// Delete entries recorded before this RFC 3339 time
    #[arg(long)]
    pub before: Option<DateTime<Utc>>,

    /// Only prune this collection id
    #[arg(long)]
    pub collection: Option<String>,

    /// Only prune this HTTP method
    #[arg(long)]
    pub method: Option<String>,
}

impl PruneArgs {
    fn to_options(&self) -> PruneOptions {
        PruneOptions {
            older_than: Duration::from_secs(self.older_than_days.unwrap_or(0).saturating_mul(SECONDS_PER_DAY)),
            before: self.before,
            keep_last: self.keep_last.unwrap_or(0),
            collection_id: self.collection.clone(),
            method: self.method.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct MaintainOutput {
    pruned: Option<PruneResult>,
    cache_pruned: Option<u64>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

/// Run `command` against `store`, returning JSON output.
pub async fn run(store: &CacheStore, config: &AppConfig, command: Command) -> Result<String> {
    match command {
        Command::List(args) => {
            let opts = args.to_options(config.default_list_limit)?;
            to_json(&store.list(&opts).await?)
        }
        Command::Get { id, resolve } => {
            let entry = store.get(&id).await?;
            if resolve {
                let body = store.resolve_body(&entry.response_body).await?;
                to_json(&serde_json::json!({ "entry": entry, "resolved_body": body }))
            } else {
                to_json(&entry)
            }
        }
        Command::Search { query, method, collection, limit } => {
            let opts = QueryOptions { method, collection_id: collection, limit, ..Default::default() };
            to_json(&store.search(&query, &opts).await?)
        }
        Command::Stats => to_json(&store.stats().await?),
        Command::Prune(args) => {
            if args.older_than_days.is_none() && args.keep_last.is_none() && args.before.is_none() {
                bail!("at least one of --older-than-days, --keep-last, or --before must be specified");
            }
            to_json(&store.prune(&args.to_options()).await?)
        }
        Command::CacheStats => to_json(&store.cache_stats().await?),
        Command::PruneCache => to_json(&serde_json::json!({ "deleted": store.prune_cache().await? })),
        Command::Maintain => {
            let pruned = match config.retention_policy() {
                Some(policy) => Some(store.prune_with(policy).await?),
                None => None,
            };
            let cache_pruned = if config.prune_cache_on_maintain { Some(store.prune_cache().await?) } else { None };
            to_json(&MaintainOutput { pruned, cache_pruned })
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear history without --yes");
            }
            to_json(&serde_json::json!({ "deleted": store.clear().await? }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqlog_core::{Entry, ResponseBody};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("reqlog").chain(args.iter().copied())).unwrap()
    }

    async fn seeded() -> CacheStore {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.add(&Entry { response_status: 200, ..Entry::new("GET", "/users") }).await.unwrap();
        store.add(&Entry { response_status: 500, ..Entry::new("POST", "/users") }).await.unwrap();
        store
    }

    #[test]
    fn test_parse_list() {
        let cli = parse(&["--db", "h.sqlite", "list", "--method", "GET", "--tag", "a", "--tag", "b", "--asc"]);
        assert_eq!(cli.db, Some(PathBuf::from("h.sqlite")));
        let Command::List(args) = cli.command else { panic!("expected list") };

        let opts = args.to_options(100).unwrap();
        assert_eq!(opts.method.as_deref(), Some("GET"));
        assert_eq!(opts.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(opts.sort_order, SortOrder::Asc);
        assert_eq!(opts.limit, Some(100));
    }

    #[test]
    fn test_list_rejects_unknown_sort() {
        let Command::List(args) = parse(&["list", "--sort-by", "nope"]).command else { panic!("expected list") };
        assert!(args.to_options(10).is_err());
    }

    #[test]
    fn test_prune_args_to_options() {
        let Command::Prune(args) = parse(&["prune", "--older-than-days", "2", "--collection", "c1"]).command else {
            panic!("expected prune")
        };
        let opts = args.to_options();
        assert_eq!(opts.older_than, Duration::from_secs(2 * SECONDS_PER_DAY));
        assert_eq!(opts.collection_id.as_deref(), Some("c1"));
        assert_eq!(opts.keep_last, 0);
    }

    #[tokio::test]
    async fn test_run_list_and_stats() {
        let store = seeded().await;
        let config = AppConfig::default();

        let listed = run(&store, &config, parse(&["list", "--method", "POST"]).command).await.unwrap();
        let entries: Vec<Entry> = serde_json::from_str(&listed).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response_status, 500);

        let stats = run(&store, &config, Command::Stats).await.unwrap();
        let stats: serde_json::Value = serde_json::from_str(&stats).unwrap();
        assert_eq!(stats["total_entries"], 2);
    }

    #[tokio::test]
    async fn test_run_list_zero_limit_lists_all() {
        let store = seeded().await;
        let config = AppConfig { default_list_limit: 1, ..Default::default() };

        let listed = run(&store, &config, parse(&["list"]).command).await.unwrap();
        assert_eq!(serde_json::from_str::<Vec<Entry>>(&listed).unwrap().len(), 1);

        let listed = run(&store, &config, parse(&["list", "--limit", "0"]).command).await.unwrap();
        assert_eq!(serde_json::from_str::<Vec<Entry>>(&listed).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_prune_requires_rule() {
        let store = seeded().await;
        let result = run(&store, &AppConfig::default(), parse(&["prune", "--collection", "c1"]).command).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_clear_requires_confirmation() {
        let store = seeded().await;
        let config = AppConfig::default();

        assert!(run(&store, &config, Command::Clear { yes: false }).await.is_err());
        run(&store, &config, Command::Clear { yes: true }).await.unwrap();
        assert_eq!(store.count(&QueryOptions::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_maintain() {
        let store = seeded().await;
        store.cache_response("orphan").await.unwrap();
        let referenced = store.cache_response("kept").await.unwrap();
        store
            .add(&Entry { response_body: ResponseBody::CacheRef(referenced), ..Entry::new("GET", "/big") })
            .await
            .unwrap();

        let config = AppConfig { retention_keep_last: Some(1), ..Default::default() };
        let output = run(&store, &config, Command::Maintain).await.unwrap();
        let output: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(output["pruned"]["deleted_count"], 2);
        // the referencing entry is the newest, so its body survives
        assert_eq!(output["cache_pruned"], 1);
        assert_eq!(store.cache_stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_run_get_resolves_cached_body() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let hash = store.cache_response("payload").await.unwrap();
        let id = store
            .add(&Entry { response_body: ResponseBody::CacheRef(hash), ..Entry::new("GET", "/p") })
            .await
            .unwrap();

        let output = run(&store, &AppConfig::default(), Command::Get { id, resolve: true }).await.unwrap();
        let output: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(output["resolved_body"], "payload");
    }
}
