//! Blogger-only account and content administration

use crate::auth::AuthUser;
use crate::cache::ArticleCache;
use crate::db::models::{Article, Role};
use crate::db::Store;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::services::accounts::{AccountService, RegisterInput};
use crate::services::articles::ArticleService;
use crate::services::listing::load_authors;
use crate::services::types::{AdminArticleRow, AdminUserView, Page};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Body of `PUT /api/admin/users/{id}/role`
#[derive(Debug, Clone, Deserialize)]
pub struct RoleChange {
    pub role: String,
}

pub struct AdminService {
    store: Arc<dyn Store>,
    cache: ArticleCache,
    accounts: Arc<AccountService>,
    articles: Arc<ArticleService>,
}

fn require_admin(caller: &AuthUser) -> Result<()> {
    if caller.is_privileged() {
        Ok(())
    } else {
        Err(AppError::Forbidden {
            message: "Administrator access required".to_string(),
        })
    }
}

impl AdminService {
    pub fn new(
        store: Arc<dyn Store>,
        cache: ArticleCache,
        accounts: Arc<AccountService>,
        articles: Arc<ArticleService>,
    ) -> Self {
        Self {
            store,
            cache,
            accounts,
            articles,
        }
    }

    /// Every account in registration order
    pub async fn list_users(&self, caller: &AuthUser, page: u64, size: u64) -> Result<Page<AdminUserView>> {
        require_admin(caller)?;
        let slice = self.store.list_users(page, size).await?;
        let content = slice.items.into_iter().map(AdminUserView::from).collect();
        Ok(Page::new(content, page, size, slice.total))
    }

    /// Takes effect at the user's next login
    pub async fn set_role(&self, caller: &AuthUser, user_id: i64, change: RoleChange) -> Result<AdminUserView> {
        require_admin(caller)?;
        let role = Role::parse(&change.role)
            .ok_or_else(|| AppError::validation("role", "Role must be BLOGGER or VIEWER"))?;

        if user_id == caller.user_id {
            return Err(AppError::validation("user_id", "You cannot change your own role"));
        }

        let user = self
            .store
            .update_user_role(user_id, role)
            .await?
            .ok_or(AppError::UserNotFound { id: user_id })?;

        metrics::record_admin_action("set_role");
        info!(user_id, ?role, admin_id = caller.user_id, "User role changed");
        Ok(AdminUserView::from(user))
    }

    /// Create an account that can author articles; a display name is required
    pub async fn create_blogger(&self, caller: &AuthUser, input: RegisterInput) -> Result<AdminUserView> {
        require_admin(caller)?;
        let has_name = input
            .display_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty());
        if !has_name {
            return Err(AppError::validation("display_name", "Display name is required"));
        }

        let user = self.accounts.create_account(input, Role::Blogger).await?;

        metrics::record_admin_action("create_blogger");
        info!(user_id = user.id, admin_id = caller.user_id, "Blogger account created");
        Ok(AdminUserView::from(user))
    }

    /// Remove an account together with everything it owns
    pub async fn delete_user(&self, caller: &AuthUser, user_id: i64) -> Result<()> {
        require_admin(caller)?;
        if user_id == caller.user_id {
            return Err(AppError::validation("user_id", "You cannot delete your own account"));
        }

        if !self.store.delete_user(user_id).await? {
            return Err(AppError::UserNotFound { id: user_id });
        }

        self.cache.invalidate_all().await;
        metrics::record_admin_action("delete_user");
        info!(user_id, admin_id = caller.user_id, "User deleted");
        Ok(())
    }

    /// All articles, drafts included, newest first
    pub async fn list_articles(&self, caller: &AuthUser, page: u64, size: u64) -> Result<Page<AdminArticleRow>> {
        require_admin(caller)?;
        let slice = self.store.list_all_articles(page, size).await?;

        let author_ids: Vec<i64> = slice.items.iter().map(|a| a.author_id).collect();
        let authors = load_authors(self.store.as_ref(), &author_ids).await;

        let content = slice
            .items
            .into_iter()
            .map(|article| AdminArticleRow {
                id: article.id,
                author: authors.get(&article.author_id).cloned(),
                title: article.title,
                summary: article.summary,
                author_id: article.author_id,
                published: article.published,
                view_count: article.view_count.max(0) as u64,
                created_at: article.created_at.with_timezone(&Utc),
                updated_at: article.updated_at.with_timezone(&Utc),
            })
            .collect();

        Ok(Page::new(content, page, size, slice.total))
    }

    pub async fn delete_article(&self, caller: &AuthUser, article_id: i64) -> Result<()> {
        require_admin(caller)?;
        self.articles.delete(caller, article_id).await
    }

    pub async fn toggle_publish(&self, caller: &AuthUser, article_id: i64) -> Result<Article> {
        require_admin(caller)?;
        self.articles.toggle_publish(caller, article_id).await
    }
}
