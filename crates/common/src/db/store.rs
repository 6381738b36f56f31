//! Storage abstractions
//!
//! Services depend on these traits rather than on a concrete database so
//! that the Postgres repository and the in-memory store are interchangeable.

use crate::db::models::*;
use crate::errors::Result;
use async_trait::async_trait;

/// Creation order used by article listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filter and paging for published article listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    /// Case-sensitive substring matched against title or summary
    pub keyword: Option<String>,
    pub author_id: Option<i64>,
    pub order: ArticleOrder,
    /// 0-based page index
    pub page: u64,
    pub size: u64,
}

/// One page of rows plus the total number of matching rows
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> PageSlice<T> {
    pub fn empty() -> Self {
        Self { items: Vec::new(), total: 0 }
    }
}

/// Fields supplied when an article is created
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub author_id: i64,
    pub published: bool,
}

/// Partial article update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

/// Fields supplied when an account is created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Profile edit; `None` leaves the column untouched, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub signature: Option<Option<String>>,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert_article(&self, article: NewArticle) -> Result<Article>;

    async fn find_article(&self, id: i64) -> Result<Option<Article>>;

    /// Apply changes and bump `updated_at`; `None` when the article is gone
    async fn update_article(&self, id: i64, changes: ArticleChanges) -> Result<Option<Article>>;

    /// Delete an article together with its comments, likes and favorites
    async fn delete_article(&self, id: i64) -> Result<bool>;

    async fn increment_view_count(&self, id: i64) -> Result<()>;

    async fn list_published(&self, query: &ArticleQuery) -> Result<PageSlice<Article>>;

    /// Unpublished articles of one author, most recently updated first
    async fn list_drafts(&self, author_id: i64, page: u64, size: u64) -> Result<PageSlice<Article>>;

    async fn count_published_by_author(&self, author_id: i64) -> Result<u64>;

    /// Every article, drafts included, newest first
    async fn list_all_articles(&self, page: u64, size: u64) -> Result<PageSlice<Article>>;
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn count_likes(&self, article_id: i64) -> Result<u64>;

    async fn count_favorites(&self, article_id: i64) -> Result<u64>;

    async fn count_comments(&self, article_id: i64) -> Result<u64>;

    async fn find_like(&self, user_id: i64, article_id: i64) -> Result<Option<ArticleLike>>;

    /// Fails with `AppError::Duplicate` when the pair already exists
    async fn insert_like(&self, user_id: i64, article_id: i64) -> Result<ArticleLike>;

    async fn delete_like(&self, id: i64) -> Result<bool>;

    async fn find_favorite(&self, user_id: i64, article_id: i64) -> Result<Option<Favorite>>;

    /// Fails with `AppError::Duplicate` when the pair already exists
    async fn insert_favorite(&self, user_id: i64, article_id: i64) -> Result<Favorite>;

    async fn delete_favorite(&self, id: i64) -> Result<bool>;

    /// A user's favorites, most recent first
    async fn list_favorites(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Favorite>>;

    async fn insert_comment(&self, article_id: i64, user_id: i64, content: String) -> Result<Comment>;

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;

    /// Comments of one article, oldest first
    async fn list_comments(&self, article_id: i64, page: u64, size: u64) -> Result<PageSlice<Comment>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Duplicate` on a username or email clash
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>>;

    /// All accounts in registration order
    async fn list_users(&self, page: u64, size: u64) -> Result<PageSlice<User>>;

    async fn update_user_role(&self, id: i64, role: Role) -> Result<Option<User>>;

    async fn update_user_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>>;

    /// Remove an account with its articles, comments, reactions, follows and messages
    async fn delete_user(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait FollowStore: Send + Sync {
    async fn find_follow(&self, follower_id: i64, following_id: i64) -> Result<Option<Follow>>;

    /// Fails with `AppError::Duplicate` when the edge already exists
    async fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<Follow>;

    async fn delete_follow(&self, id: i64) -> Result<bool>;

    /// Edges where `user_id` is the follower, most recent first
    async fn list_following(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Follow>>;

    /// Edges where `user_id` is being followed, most recent first
    async fn list_followers(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Follow>>;

    async fn count_following(&self, user_id: i64) -> Result<u64>;

    async fn count_followers(&self, user_id: i64) -> Result<u64>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message and move the pair's conversation to the top
    async fn insert_message(&self, sender_id: i64, receiver_id: i64, content: String) -> Result<Message>;

    async fn find_message(&self, id: i64) -> Result<Option<Message>>;

    /// Hide a message from both participants; `false` when already gone
    async fn recall_message(&self, id: i64) -> Result<bool>;

    /// Visible messages exchanged between two users, newest first
    async fn list_messages_between(
        &self,
        user_a: i64,
        user_b: i64,
        page: u64,
        size: u64,
    ) -> Result<PageSlice<Message>>;

    /// Conversations `user_id` takes part in, most recent activity first
    async fn list_conversations(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Conversation>>;

    /// Mark everything `sender_id` sent to `receiver_id` as read, returning how many changed
    async fn mark_read(&self, sender_id: i64, receiver_id: i64) -> Result<u64>;

    /// Unread visible messages addressed to `receiver_id`
    async fn count_unread(&self, receiver_id: i64) -> Result<u64>;

    async fn count_unread_from(&self, sender_id: i64, receiver_id: i64) -> Result<u64>;
}

/// Everything the services need from persistence
#[async_trait]
pub trait Store: ArticleStore + EngagementStore + UserStore + FollowStore + MessageStore {
    /// Connectivity check for readiness probes
    async fn ping(&self) -> Result<()>;
}
