//! Article list assembly
//!
//! Fetches one page of published articles, attaches engagement counters
//! and a hotness score to every row, and re-orders the page when the `hot`
//! sort is requested. Only the fetched page is rescored: `hot` ranks within
//! the newest-first window, it is not a global top-K.

use crate::auth::AuthUser;
use crate::cache::{keys, ArticleCache};
use crate::db::models::Article;
use crate::db::{ArticleOrder, ArticleQuery, Store};
use crate::errors::Result;
use crate::metrics;
use crate::ranking::{self, EngagementMetrics};
use crate::services::types::{clamp_page, clamp_page_size, ArticleSummary, Page, UserSummary};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Ordering requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Time,
    Oldest,
    Hot,
}

impl SortMode {
    /// Unknown or missing values fall back to `time`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("oldest") => SortMode::Oldest,
            Some("hot") => SortMode::Hot,
            _ => SortMode::Time,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Time => "time",
            SortMode::Oldest => "oldest",
            SortMode::Hot => "hot",
        }
    }

    fn store_order(&self) -> ArticleOrder {
        match self {
            SortMode::Oldest => ArticleOrder::OldestFirst,
            SortMode::Time | SortMode::Hot => ArticleOrder::NewestFirst,
        }
    }
}

/// Query string of `GET /api/articles`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub author_id: Option<i64>,
}

/// Normalized list request; also determines the cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub keyword: Option<String>,
    pub sort: SortMode,
    pub author_id: Option<i64>,
    pub page: u64,
    pub size: u64,
}

impl From<ListParams> for ListRequest {
    fn from(params: ListParams) -> Self {
        let keyword = params
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let size = clamp_page_size(params.size);

        Self {
            keyword,
            sort: SortMode::parse(params.sort_by.as_deref()),
            author_id: params.author_id,
            page: clamp_page(params.page, size),
            size,
        }
    }
}

impl ListRequest {
    pub fn cache_key(&self) -> String {
        keys::article_list(
            self.author_id,
            self.keyword.as_deref(),
            self.sort.as_str(),
            self.page,
            self.size,
        )
    }
}

/// Builds article list pages, cache-aside
#[derive(Clone)]
pub struct ListAssembler {
    store: Arc<dyn Store>,
    cache: ArticleCache,
}

impl ListAssembler {
    pub fn new(store: Arc<dyn Store>, cache: ArticleCache) -> Self {
        Self { store, cache }
    }

    /// Serve a list page from cache or assemble it, then overlay the
    /// caller's liked/favorited flags
    pub async fn list(
        &self,
        request: &ListRequest,
        caller: Option<&AuthUser>,
    ) -> Result<Page<ArticleSummary>> {
        let key = request.cache_key();

        let mut page = match self.cache.get_list::<Page<ArticleSummary>>(&key).await {
            Some(page) => page,
            None => {
                let page = self.assemble(request).await?;
                self.cache.put_list(&key, &page).await;
                page
            }
        };

        if let Some(caller) = caller {
            let flags = join_all(
                page.content
                    .iter()
                    .map(|item| interaction_flags(self.store.as_ref(), caller.user_id, item.id)),
            )
            .await;

            for (item, (liked, favorited)) in page.content.iter_mut().zip(flags) {
                item.liked = liked;
                item.favorited = favorited;
            }
        }

        Ok(page)
    }

    async fn assemble(&self, request: &ListRequest) -> Result<Page<ArticleSummary>> {
        let started = Instant::now();

        let query = ArticleQuery {
            keyword: request.keyword.clone(),
            author_id: request.author_id,
            order: request.sort.store_order(),
            page: request.page,
            size: request.size,
        };
        let slice = self.store.list_published(&query).await?;

        let store = self.store.as_ref();
        let author_ids: Vec<i64> = slice.items.iter().map(|a| a.author_id).collect();
        let authors = load_authors(store, &author_ids).await;
        let counters = join_all(slice.items.iter().map(|a| collect_metrics(store, a))).await;

        let now = Utc::now();
        let mut scored: Vec<(ArticleSummary, f64)> = slice
            .items
            .into_iter()
            .zip(counters)
            .map(|(article, metrics)| {
                let created_at = article.created_at.with_timezone(&Utc);
                let score = ranking::hotness_score(&metrics, Some(created_at), now);
                let author = authors.get(&article.author_id).cloned();
                (summarize(article, author, metrics, score, created_at), score)
            })
            .collect();

        if request.sort == SortMode::Hot {
            ranking::rank_by_score(&mut scored);
        }

        let content = scored.into_iter().map(|(summary, _)| summary).collect();
        let page = Page::new(content, request.page, request.size, slice.total);

        metrics::record_list_assembly(started.elapsed().as_secs_f64(), request.sort.as_str());
        debug!(
            sort = request.sort.as_str(),
            page = request.page,
            rows = page.content.len(),
            total = page.total_elements,
            "Assembled article list"
        );

        Ok(page)
    }
}

fn summarize(
    article: Article,
    author: Option<UserSummary>,
    metrics: EngagementMetrics,
    score: f64,
    created_at: DateTime<Utc>,
) -> ArticleSummary {
    ArticleSummary {
        id: article.id,
        title: article.title,
        summary: article.summary,
        cover_image_url: article.cover_image_url,
        author_id: article.author_id,
        author,
        created_at,
        updated_at: article.updated_at.with_timezone(&Utc),
        view_count: metrics.view_count,
        like_count: metrics.like_count,
        favorite_count: metrics.favorite_count,
        comment_count: metrics.comment_count,
        hot_score: ranking::round_score(score),
        liked: false,
        favorited: false,
    }
}

fn count_or_zero(result: Result<u64>, metric: &'static str, article_id: i64) -> u64 {
    match result {
        Ok(count) => count,
        Err(e) => {
            metrics::record_metric_fallback(metric);
            warn!(article_id, metric, error = %e, "Engagement count failed, using 0");
            0
        }
    }
}

/// Current counters of one article; a failed count reads as zero
pub(crate) async fn collect_metrics(store: &dyn Store, article: &Article) -> EngagementMetrics {
    let (likes, favorites, comments) = futures::join!(
        store.count_likes(article.id),
        store.count_favorites(article.id),
        store.count_comments(article.id),
    );

    EngagementMetrics {
        view_count: article.view_count.max(0) as u64,
        like_count: count_or_zero(likes, "like_count", article.id),
        favorite_count: count_or_zero(favorites, "favorite_count", article.id),
        comment_count: count_or_zero(comments, "comment_count", article.id),
    }
}

/// Whether `user_id` liked / favorited the article; lookups that fail read as `false`
pub(crate) async fn interaction_flags(store: &dyn Store, user_id: i64, article_id: i64) -> (bool, bool) {
    let (like, favorite) = futures::join!(
        store.find_like(user_id, article_id),
        store.find_favorite(user_id, article_id),
    );

    let liked = like.unwrap_or_else(|e| {
        warn!(article_id, user_id, error = %e, "Like lookup failed");
        None
    });
    let favorited = favorite.unwrap_or_else(|e| {
        warn!(article_id, user_id, error = %e, "Favorite lookup failed");
        None
    });

    (liked.is_some(), favorited.is_some())
}

/// Public summaries for the given user ids; a failed lookup yields none
pub(crate) async fn load_authors(store: &dyn Store, ids: &[i64]) -> HashMap<i64, UserSummary> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    match store.find_users(&unique).await {
        Ok(users) => users.iter().map(|u| (u.id, UserSummary::from(u))).collect(),
        Err(e) => {
            warn!(error = %e, "Author lookup failed");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse(None), SortMode::Time);
        assert_eq!(SortMode::parse(Some("hot")), SortMode::Hot);
        assert_eq!(SortMode::parse(Some(" Oldest ")), SortMode::Oldest);
        assert_eq!(SortMode::parse(Some("trending")), SortMode::Time);
    }

    #[test]
    fn test_request_normalization_and_key() {
        let request = ListRequest::from(ListParams {
            keyword: Some("  rust ".into()),
            sort_by: Some("hot".into()),
            page: Some(1),
            size: Some(500),
            author_id: Some(3),
        });

        assert_eq!(request.keyword.as_deref(), Some("rust"));
        assert_eq!(request.size, 100);
        assert_eq!(request.cache_key(), "article_list:3:rust:hot:1:100");

        let blank = ListRequest::from(ListParams {
            keyword: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(blank.keyword, None);
        assert_eq!(blank.cache_key(), "article_list:*::time:0:10");

        let far = ListRequest::from(ListParams {
            page: Some(u64::MAX),
            size: Some(20),
            ..Default::default()
        });
        assert_eq!(far.page, i64::MAX as u64 / 20);
    }
}
