//! Response cache
//!
//! Provides:
//! - `ResponseCache`, the key-value contract (Redis or in-process)
//! - `ArticleCache`, the typed cache-aside facade used by the services
//! - Key builders for article detail and list pages
//!
//! Cached payloads are advisory. Every failure here is logged and treated
//! as a miss so reads fall through to the database.

mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use crate::config::CacheConfig;
use crate::errors::Result;
use crate::metrics;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Key-value store holding serialized responses
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every key starting with `prefix`, returning how many went
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Typed cache-aside access for article payloads
#[derive(Clone)]
pub struct ArticleCache {
    backend: Arc<dyn ResponseCache>,
    article_ttl: Duration,
    list_ttl: Duration,
}

impl ArticleCache {
    pub fn new(backend: Arc<dyn ResponseCache>, config: &CacheConfig) -> Self {
        Self {
            backend,
            article_ttl: Duration::from_secs(config.article_ttl_secs),
            list_ttl: Duration::from_secs(config.list_ttl_secs),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend()
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    /// Cached detail payload of one article
    pub async fn get_article<T: DeserializeOwned>(&self, article_id: i64) -> Option<T> {
        self.get_json(&keys::article(article_id), "article").await
    }

    pub async fn put_article<T: Serialize + Sync>(&self, article_id: i64, payload: &T) {
        self.put_json(&keys::article(article_id), payload, self.article_ttl).await
    }

    /// Cached list page under a key built by [`keys::article_list`]
    pub async fn get_list<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_json(key, "article_list").await
    }

    pub async fn put_list<T: Serialize + Sync>(&self, key: &str, payload: &T) {
        self.put_json(key, payload, self.list_ttl).await
    }

    /// Drop the article's detail entry and the whole list namespace.
    ///
    /// Any mutation can move an article between pages or change its score,
    /// so list pages are never invalidated selectively.
    pub async fn invalidate_article(&self, article_id: i64) {
        let detail_key = keys::article(article_id);
        match self.backend.delete(&detail_key).await {
            Ok(removed) => metrics::record_cache_invalidation("article", u64::from(removed)),
            Err(e) => {
                metrics::record_cache_error("delete");
                warn!(key = %detail_key, error = %e, "Failed to invalidate article cache");
            }
        }

        self.invalidate_lists().await;
    }

    /// Drop every detail entry and every list page.
    ///
    /// Used when a change touches payloads of many articles at once, such
    /// as an author's display name or a removed account.
    pub async fn invalidate_all(&self) {
        match self.backend.delete_by_prefix(keys::ARTICLE_PREFIX).await {
            Ok(removed) => metrics::record_cache_invalidation("article", removed),
            Err(e) => {
                metrics::record_cache_error("delete_by_prefix");
                warn!(error = %e, "Failed to clear article cache");
            }
        }

        self.invalidate_lists().await;
    }

    /// Drop every cached list page
    pub async fn invalidate_lists(&self) {
        match self.backend.delete_by_prefix(keys::ARTICLE_LIST_PREFIX).await {
            Ok(removed) => {
                metrics::record_cache_invalidation("list", removed);
                debug!(removed, "Article list cache cleared");
            }
            Err(e) => {
                metrics::record_cache_error("delete_by_prefix");
                warn!(error = %e, "Failed to clear article list cache");
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str, namespace: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                metrics::record_cache_error("get");
                warn!(key = %key, error = %e, "Cache read failed, falling back to database");
                return None;
            }
        };

        let Some(raw) = raw else {
            metrics::record_cache(false, namespace);
            debug!(key = %key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                metrics::record_cache(true, namespace);
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                // unreadable entries are dropped so the next read repopulates
                metrics::record_cache_error("decode");
                warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                if let Err(e) = self.backend.delete(key).await {
                    warn!(key = %key, error = %e, "Failed to discard cache entry");
                }
                None
            }
        }
    }

    async fn put_json<T: Serialize + Sync>(&self, key: &str, payload: &T, ttl: Duration) {
        let raw = match serde_json::to_string(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache payload");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, raw, ttl).await {
            metrics::record_cache_error("set");
            warn!(key = %key, error = %e, "Failed to cache value, continuing without cache");
        }
    }
}

/// Cache key builder helpers
pub mod keys {
    /// Prefix of single-article entries
    pub const ARTICLE_PREFIX: &str = "article:";

    /// Prefix shared by every list page entry
    pub const ARTICLE_LIST_PREFIX: &str = "article_list:";

    /// Build an article detail key
    pub fn article(article_id: i64) -> String {
        format!("{}{}", ARTICLE_PREFIX, article_id)
    }

    /// Build a list page key: `article_list:{author_id|*}:{keyword}:{sort}:{page}:{size}`
    ///
    /// The keyword is percent-encoded so it can never contain the `:`
    /// separator; every segment stays positional.
    pub fn article_list(
        author_id: Option<i64>,
        keyword: Option<&str>,
        sort: &str,
        page: u64,
        size: u64,
    ) -> String {
        let author = author_id.map_or_else(|| "*".to_string(), |id| id.to_string());
        let keyword = urlencoding::encode(keyword.unwrap_or(""));

        format!(
            "{}{}:{}:{}:{}:{}",
            ARTICLE_LIST_PREFIX, author, keyword, sort, page, size
        )
    }
}
