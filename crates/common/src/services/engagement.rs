//! Likes, favorites and comments
//!
//! Each of these feeds the counters shown in list and detail views, so every
//! mutation invalidates the article's detail entry and all list pages.

use crate::auth::AuthUser;
use crate::cache::ArticleCache;
use crate::db::models::Article;
use crate::db::Store;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::services::listing::{collect_metrics, interaction_flags, load_authors};
use crate::services::types::{CommentView, FavoriteItem, InteractionState, Page};
use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Upper bound on ids accepted by the batch status lookup
pub const MAX_BATCH_IDS: usize = 100;

/// Body of `POST /api/comments`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    pub article_id: i64,

    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Like,
    Favorite,
}

impl Interaction {
    fn label(&self) -> &'static str {
        match self {
            Interaction::Like => "like",
            Interaction::Favorite => "favorite",
        }
    }
}

pub struct EngagementService {
    store: Arc<dyn Store>,
    cache: ArticleCache,
}

impl EngagementService {
    pub fn new(store: Arc<dyn Store>, cache: ArticleCache) -> Self {
        Self { store, cache }
    }

    async fn require_article(&self, id: i64) -> Result<Article> {
        self.store
            .find_article(id)
            .await?
            .ok_or(AppError::ArticleNotFound { id })
    }

    // ========================================================================
    // Likes & favorites
    // ========================================================================

    pub async fn toggle_like(&self, caller: &AuthUser, article_id: i64) -> Result<InteractionState> {
        self.toggle(caller, article_id, Interaction::Like).await
    }

    pub async fn toggle_favorite(&self, caller: &AuthUser, article_id: i64) -> Result<InteractionState> {
        self.toggle(caller, article_id, Interaction::Favorite).await
    }

    async fn toggle(&self, caller: &AuthUser, article_id: i64, kind: Interaction) -> Result<InteractionState> {
        self.require_article(article_id).await?;
        let user_id = caller.user_id;

        let existing = match kind {
            Interaction::Like => self.store.find_like(user_id, article_id).await?.map(|l| l.id),
            Interaction::Favorite => self.store.find_favorite(user_id, article_id).await?.map(|f| f.id),
        };

        let action = match existing {
            Some(record_id) => {
                match kind {
                    Interaction::Like => self.store.delete_like(record_id).await?,
                    Interaction::Favorite => self.store.delete_favorite(record_id).await?,
                };
                "removed"
            }
            None => {
                let inserted = match kind {
                    Interaction::Like => self.store.insert_like(user_id, article_id).await.map(|_| ()),
                    Interaction::Favorite => self.store.insert_favorite(user_id, article_id).await.map(|_| ()),
                };
                match inserted {
                    Ok(()) => {}
                    // a concurrent request created the same row; the outcome is identical
                    Err(AppError::Duplicate { .. }) => {
                        debug!(user_id, article_id, kind = kind.label(), "Concurrent toggle already applied");
                    }
                    Err(e) => return Err(e),
                }
                "added"
            }
        };

        self.cache.invalidate_article(article_id).await;
        metrics::record_interaction(kind.label(), action);
        info!(user_id, article_id, kind = kind.label(), action, "Interaction toggled");

        self.status(caller, article_id).await
    }

    /// Caller's liked/favorited flags and the article's counters
    pub async fn status(&self, caller: &AuthUser, article_id: i64) -> Result<InteractionState> {
        let article = self.require_article(article_id).await?;
        Ok(self.state_for(caller.user_id, &article).await)
    }

    async fn state_for(&self, user_id: i64, article: &Article) -> InteractionState {
        let store = self.store.as_ref();
        let (counters, (liked, favorited)) = futures::join!(
            collect_metrics(store, article),
            interaction_flags(store, user_id, article.id),
        );

        InteractionState {
            liked,
            favorited,
            like_count: counters.like_count,
            favorite_count: counters.favorite_count,
        }
    }

    /// Status for several articles at once; unknown ids are omitted
    pub async fn batch_status(
        &self,
        caller: &AuthUser,
        article_ids: &[i64],
    ) -> Result<BTreeMap<i64, InteractionState>> {
        if article_ids.len() > MAX_BATCH_IDS {
            return Err(AppError::validation(
                "article_ids",
                format!("At most {} ids per request", MAX_BATCH_IDS),
            ));
        }

        let mut ids = article_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut states = BTreeMap::new();
        for id in ids {
            if let Some(article) = self.store.find_article(id).await? {
                states.insert(id, self.state_for(caller.user_id, &article).await);
            }
        }

        Ok(states)
    }

    /// Articles the caller favorited, most recent favorite first
    pub async fn my_favorites(&self, caller: &AuthUser, page: u64, size: u64) -> Result<Page<FavoriteItem>> {
        let slice = self.store.list_favorites(caller.user_id, page, size).await?;
        let store = self.store.as_ref();

        let articles = join_all(slice.items.iter().map(|f| store.find_article(f.article_id))).await;

        let mut pairs = Vec::with_capacity(slice.items.len());
        for (favorite, article) in slice.items.into_iter().zip(articles) {
            match article? {
                Some(article) => pairs.push((favorite, article)),
                None => warn!(favorite_id = favorite.id, "Favorite points at a missing article"),
            }
        }

        let author_ids: Vec<i64> = pairs.iter().map(|(_, a)| a.author_id).collect();
        let authors = load_authors(store, &author_ids).await;
        let counters = join_all(pairs.iter().map(|(_, a)| collect_metrics(store, a))).await;

        let content = pairs
            .into_iter()
            .zip(counters)
            .map(|((favorite, article), counters)| FavoriteItem {
                article_id: article.id,
                title: article.title,
                summary: article.summary,
                cover_image_url: article.cover_image_url,
                author: authors.get(&article.author_id).cloned(),
                article_created_at: article.created_at.with_timezone(&Utc),
                favorited_at: favorite.created_at.with_timezone(&Utc),
                view_count: counters.view_count,
                like_count: counters.like_count,
                favorite_count: counters.favorite_count,
            })
            .collect();

        Ok(Page::new(content, page, size, slice.total))
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub async fn create_comment(&self, caller: &AuthUser, input: CommentInput) -> Result<CommentView> {
        input.validate()?;
        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::validation("content", "Comment must not be blank"));
        }

        self.require_article(input.article_id).await?;

        let comment = self
            .store
            .insert_comment(input.article_id, caller.user_id, content)
            .await?;

        self.cache.invalidate_article(comment.article_id).await;
        metrics::record_interaction("comment", "added");
        info!(comment_id = comment.id, article_id = comment.article_id, user_id = caller.user_id, "Comment created");

        let author = self.store.find_user(caller.user_id).await?;
        Ok(CommentView {
            id: comment.id,
            article_id: comment.article_id,
            user_id: comment.user_id,
            author: author.as_ref().map(Into::into),
            content: comment.content,
            created_at: comment.created_at.with_timezone(&Utc),
        })
    }

    /// Allowed for the commenter, the article's author and bloggers
    pub async fn delete_comment(&self, caller: &AuthUser, comment_id: i64) -> Result<()> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or(AppError::CommentNotFound { id: comment_id })?;

        let article_author = self
            .store
            .find_article(comment.article_id)
            .await?
            .map(|a| a.author_id);

        let allowed = caller.can_manage(comment.user_id)
            || article_author.is_some_and(|author| author == caller.user_id);
        if !allowed {
            return Err(AppError::Forbidden {
                message: "Not allowed to delete this comment".to_string(),
            });
        }

        if !self.store.delete_comment(comment_id).await? {
            return Err(AppError::CommentNotFound { id: comment_id });
        }

        self.cache.invalidate_article(comment.article_id).await;
        metrics::record_interaction("comment", "removed");
        info!(comment_id, article_id = comment.article_id, "Comment deleted");

        Ok(())
    }

    /// Comments of an article, oldest first
    pub async fn list_comments(&self, article_id: i64, page: u64, size: u64) -> Result<Page<CommentView>> {
        let slice = self.store.list_comments(article_id, page, size).await?;

        let user_ids: Vec<i64> = slice.items.iter().map(|c| c.user_id).collect();
        let authors = load_authors(self.store.as_ref(), &user_ids).await;

        let content = slice
            .items
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                article_id: c.article_id,
                user_id: c.user_id,
                author: authors.get(&c.user_id).cloned(),
                content: c.content,
                created_at: c.created_at.with_timezone(&Utc),
            })
            .collect();

        Ok(Page::new(content, page, size, slice.total))
    }
}
