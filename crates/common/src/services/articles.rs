//! Article service
//!
//! Detail reads are cache-aside on `article:{id}`. Every write goes to the
//! store first and then invalidates the article's detail entry and the whole
//! list namespace.

use crate::auth::AuthUser;
use crate::cache::ArticleCache;
use crate::db::models::Article;
use crate::db::{ArticleChanges, NewArticle, Store};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::services::listing::{collect_metrics, interaction_flags, ListAssembler, ListRequest};
use crate::services::types::{
    ArticleDetail, ArticleStats, ArticleSummary, DraftSummary, Page, UserSummary,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Body of `POST /api/articles`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ArticleInput {
    #[validate(length(min = 1, max = 150, message = "Title must be 1-150 characters"))]
    pub title: String,

    #[validate(length(max = 300, message = "Summary must be at most 300 characters"))]
    pub summary: Option<String>,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub cover_image_url: Option<String>,

    /// Defaults to a draft
    pub published: Option<bool>,
}

/// Body of `PUT /api/articles/{id}`; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ArticleUpdate {
    #[validate(length(min = 1, max = 150, message = "Title must be 1-150 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 300, message = "Summary must be at most 300 characters"))]
    pub summary: Option<String>,

    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,

    pub cover_image_url: Option<String>,

    pub published: Option<bool>,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, format!("{} must not be blank", field)));
    }
    Ok(())
}

/// Drafts are hidden from everyone but their author and bloggers
fn ensure_visible(article_id: i64, published: bool, author_id: i64, caller: Option<&AuthUser>) -> Result<()> {
    if published || caller.is_some_and(|c| c.can_manage(author_id)) {
        Ok(())
    } else {
        Err(AppError::ArticleNotFound { id: article_id })
    }
}

pub struct ArticleService {
    store: Arc<dyn Store>,
    cache: ArticleCache,
    listing: ListAssembler,
}

impl ArticleService {
    pub fn new(store: Arc<dyn Store>, cache: ArticleCache) -> Self {
        let listing = ListAssembler::new(store.clone(), cache.clone());
        Self { store, cache, listing }
    }

    /// Published articles matching the request
    pub async fn list(
        &self,
        request: &ListRequest,
        caller: Option<&AuthUser>,
    ) -> Result<Page<ArticleSummary>> {
        self.listing.list(request, caller).await
    }

    /// One article with counters; counts a view when it is published
    pub async fn detail(&self, id: i64, caller: Option<&AuthUser>) -> Result<ArticleDetail> {
        let mut detail = match self.cache.get_article::<ArticleDetail>(id).await {
            Some(cached) => {
                ensure_visible(id, cached.published, cached.author_id, caller)?;
                if cached.published {
                    self.record_view(id).await;
                }
                cached
            }
            None => {
                let mut article = self
                    .store
                    .find_article(id)
                    .await?
                    .ok_or(AppError::ArticleNotFound { id })?;

                ensure_visible(id, article.published, article.author_id, caller)?;
                if article.published && self.record_view(id).await {
                    article.view_count += 1;
                }

                let detail = self.build_detail(article).await;
                self.cache.put_article(id, &detail).await;
                detail
            }
        };

        if let Some(caller) = caller {
            let (liked, favorited) = interaction_flags(self.store.as_ref(), caller.user_id, id).await;
            detail.liked = liked;
            detail.favorited = favorited;
        }

        Ok(detail)
    }

    /// Best-effort view counter bump; view counts are exempt from invalidation
    async fn record_view(&self, id: i64) -> bool {
        match self.store.increment_view_count(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(article_id = id, error = %e, "Failed to increment view count");
                false
            }
        }
    }

    async fn build_detail(&self, article: Article) -> ArticleDetail {
        let store = self.store.as_ref();
        let (counters, author) = futures::join!(
            collect_metrics(store, &article),
            store.find_user(article.author_id),
        );

        let author = author.unwrap_or_else(|e| {
            warn!(article_id = article.id, error = %e, "Author lookup failed");
            None
        });

        ArticleDetail {
            id: article.id,
            title: article.title,
            summary: article.summary,
            content: article.content,
            cover_image_url: article.cover_image_url,
            author_id: article.author_id,
            author: author.as_ref().map(UserSummary::from),
            published: article.published,
            created_at: article.created_at.with_timezone(&Utc),
            updated_at: article.updated_at.with_timezone(&Utc),
            view_count: counters.view_count,
            like_count: counters.like_count,
            favorite_count: counters.favorite_count,
            comment_count: counters.comment_count,
            liked: false,
            favorited: false,
        }
    }

    async fn load_managed(&self, caller: &AuthUser, id: i64) -> Result<Article> {
        let article = self
            .store
            .find_article(id)
            .await?
            .ok_or(AppError::ArticleNotFound { id })?;

        caller.require_manage(article.author_id, "article")?;
        Ok(article)
    }

    /// Create an article; only bloggers publish on this platform
    pub async fn create(&self, caller: &AuthUser, input: ArticleInput) -> Result<Article> {
        if !caller.is_privileged() {
            return Err(AppError::Forbidden {
                message: "Only bloggers can write articles".to_string(),
            });
        }

        input.validate()?;
        require_text("title", &input.title)?;
        require_text("content", &input.content)?;

        let article = self
            .store
            .insert_article(NewArticle {
                title: input.title.trim().to_string(),
                summary: input.summary,
                content: input.content,
                cover_image_url: input.cover_image_url,
                author_id: caller.user_id,
                published: input.published.unwrap_or(false),
            })
            .await?;

        self.cache.invalidate_article(article.id).await;
        metrics::record_article_write("create");
        info!(article_id = article.id, author_id = caller.user_id, published = article.published, "Article created");

        Ok(article)
    }

    pub async fn update(&self, caller: &AuthUser, id: i64, input: ArticleUpdate) -> Result<Article> {
        input.validate()?;
        if let Some(ref title) = input.title {
            require_text("title", title)?;
        }
        if let Some(ref content) = input.content {
            require_text("content", content)?;
        }

        self.load_managed(caller, id).await?;

        let changes = ArticleChanges {
            title: input.title.map(|t| t.trim().to_string()),
            summary: input.summary,
            content: input.content,
            cover_image_url: input.cover_image_url,
            published: input.published,
        };
        let article = self
            .store
            .update_article(id, changes)
            .await?
            .ok_or(AppError::ArticleNotFound { id })?;

        self.cache.invalidate_article(id).await;
        metrics::record_article_write("update");
        info!(article_id = id, "Article updated");

        Ok(article)
    }

    pub async fn delete(&self, caller: &AuthUser, id: i64) -> Result<()> {
        self.load_managed(caller, id).await?;

        if !self.store.delete_article(id).await? {
            return Err(AppError::ArticleNotFound { id });
        }

        self.cache.invalidate_article(id).await;
        metrics::record_article_write("delete");
        info!(article_id = id, "Article deleted");

        Ok(())
    }

    pub async fn toggle_publish(&self, caller: &AuthUser, id: i64) -> Result<Article> {
        let current = self.load_managed(caller, id).await?;

        let changes = ArticleChanges {
            published: Some(!current.published),
            ..Default::default()
        };
        let article = self
            .store
            .update_article(id, changes)
            .await?
            .ok_or(AppError::ArticleNotFound { id })?;

        self.cache.invalidate_article(id).await;
        metrics::record_article_write("toggle_publish");
        info!(article_id = id, published = article.published, "Article publish state toggled");

        Ok(article)
    }

    /// The caller's own drafts; never cached
    pub async fn drafts(&self, caller: &AuthUser, page: u64, size: u64) -> Result<Page<DraftSummary>> {
        let slice = self.store.list_drafts(caller.user_id, page, size).await?;
        let content = slice.items.into_iter().map(DraftSummary::from).collect();
        Ok(Page::new(content, page, size, slice.total))
    }

    pub async fn stats(&self, id: i64) -> Result<ArticleStats> {
        let article = self
            .store
            .find_article(id)
            .await?
            .ok_or(AppError::ArticleNotFound { id })?;

        let counters = collect_metrics(self.store.as_ref(), &article).await;
        Ok(ArticleStats {
            view_count: counters.view_count,
            like_count: counters.like_count,
            favorite_count: counters.favorite_count,
            comment_count: counters.comment_count,
        })
    }
}
