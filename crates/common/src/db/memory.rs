//! In-memory store
//!
//! Mirrors the Postgres repository closely enough to drive the services in
//! tests and in local runs without a database. Counting failures can be
//! injected per article to exercise degraded paths.

use crate::db::models::*;
use crate::db::store::*;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
    likes: Vec<ArticleLike>,
    favorites: Vec<Favorite>,
    follows: Vec<Follow>,
    messages: Vec<Message>,
    conversations: Vec<Conversation>,
    failing_counts: HashSet<i64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Slice `rows` (already ordered) into one page
fn paginate<T: Clone>(rows: Vec<&T>, page: u64, size: u64) -> PageSlice<T> {
    let size = size.max(1);
    let total = rows.len() as u64;
    let offset = usize::try_from(page.saturating_mul(size)).unwrap_or(usize::MAX);
    let take = usize::try_from(size).unwrap_or(usize::MAX);
    let items = rows.into_iter().skip(offset).take(take).cloned().collect();
    PageSlice { items, total }
}

/// Thread-safe in-memory implementation of [`Store`]
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every like/favorite/comment count for `article_id` fail
    pub async fn fail_counts_for(&self, article_id: i64) {
        self.state.write().await.failing_counts.insert(article_id);
    }

    /// Override an article's creation time
    pub async fn set_created_at(&self, article_id: i64, created_at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        if let Some(article) = state.articles.iter_mut().find(|a| a.id == article_id) {
            article.created_at = created_at.into();
        }
    }

    /// Override an article's view count
    pub async fn set_view_count(&self, article_id: i64, view_count: i64) {
        let mut state = self.state.write().await;
        if let Some(article) = state.articles.iter_mut().find(|a| a.id == article_id) {
            article.view_count = view_count;
        }
    }

    /// Override a message's send time
    pub async fn set_message_created_at(&self, message_id: i64, created_at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == message_id) {
            message.created_at = created_at.into();
        }
    }

    async fn count_for(&self, article_id: i64, what: &str, count: impl Fn(&State) -> usize) -> Result<u64> {
        let state = self.state.read().await;
        if state.failing_counts.contains(&article_id) {
            return Err(AppError::Internal {
                message: format!("{} count unavailable for article {}", what, article_id),
            });
        }
        Ok(count(&state) as u64)
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn insert_article(&self, article: NewArticle) -> Result<Article> {
        let mut state = self.state.write().await;
        let created_at = now();
        let model = Article {
            id: state.next_id(),
            title: article.title,
            summary: article.summary,
            content: article.content,
            cover_image_url: article.cover_image_url,
            author_id: article.author_id,
            published: article.published,
            view_count: 0,
            created_at,
            updated_at: created_at,
        };
        state.articles.push(model.clone());
        Ok(model)
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>> {
        let state = self.state.read().await;
        Ok(state.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn update_article(&self, id: i64, changes: ArticleChanges) -> Result<Option<Article>> {
        let mut state = self.state.write().await;
        let Some(article) = state.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            article.title = title;
        }
        if let Some(summary) = changes.summary {
            article.summary = Some(summary);
        }
        if let Some(content) = changes.content {
            article.content = content;
        }
        if let Some(cover) = changes.cover_image_url {
            article.cover_image_url = Some(cover);
        }
        if let Some(published) = changes.published {
            article.published = published;
        }
        article.updated_at = now();

        Ok(Some(article.clone()))
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.articles.len();
        state.articles.retain(|a| a.id != id);
        if state.articles.len() == before {
            return Ok(false);
        }

        state.comments.retain(|c| c.article_id != id);
        state.likes.retain(|l| l.article_id != id);
        state.favorites.retain(|f| f.article_id != id);
        Ok(true)
    }

    async fn increment_view_count(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(article) = state.articles.iter_mut().find(|a| a.id == id) {
            article.view_count += 1;
        }
        Ok(())
    }

    async fn list_published(&self, query: &ArticleQuery) -> Result<PageSlice<Article>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Article> = state
            .articles
            .iter()
            .filter(|a| a.published)
            .filter(|a| query.author_id.map_or(true, |author| a.author_id == author))
            .filter(|a| match query.keyword.as_deref() {
                Some(keyword) => {
                    a.title.contains(keyword)
                        || a.summary.as_deref().is_some_and(|s| s.contains(keyword))
                }
                None => true,
            })
            .collect();

        match query.order {
            ArticleOrder::NewestFirst => {
                rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
            }
            ArticleOrder::OldestFirst => {
                rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)))
            }
        }

        Ok(paginate(rows, query.page, query.size))
    }

    async fn list_drafts(&self, author_id: i64, page: u64, size: u64) -> Result<PageSlice<Article>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Article> = state
            .articles
            .iter()
            .filter(|a| a.author_id == author_id && !a.published)
            .collect();
        rows.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)));

        Ok(paginate(rows, page, size))
    }

    async fn count_published_by_author(&self, author_id: i64) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .articles
            .iter()
            .filter(|a| a.author_id == author_id && a.published)
            .count() as u64)
    }

    async fn list_all_articles(&self, page: u64, size: u64) -> Result<PageSlice<Article>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Article> = state.articles.iter().collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(paginate(rows, page, size))
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn count_likes(&self, article_id: i64) -> Result<u64> {
        self.count_for(article_id, "Like", |s| {
            s.likes.iter().filter(|l| l.article_id == article_id).count()
        })
        .await
    }

    async fn count_favorites(&self, article_id: i64) -> Result<u64> {
        self.count_for(article_id, "Favorite", |s| {
            s.favorites.iter().filter(|f| f.article_id == article_id).count()
        })
        .await
    }

    async fn count_comments(&self, article_id: i64) -> Result<u64> {
        self.count_for(article_id, "Comment", |s| {
            s.comments.iter().filter(|c| c.article_id == article_id).count()
        })
        .await
    }

    async fn find_like(&self, user_id: i64, article_id: i64) -> Result<Option<ArticleLike>> {
        let state = self.state.read().await;
        Ok(state
            .likes
            .iter()
            .find(|l| l.user_id == user_id && l.article_id == article_id)
            .cloned())
    }

    async fn insert_like(&self, user_id: i64, article_id: i64) -> Result<ArticleLike> {
        let mut state = self.state.write().await;
        if state.likes.iter().any(|l| l.user_id == user_id && l.article_id == article_id) {
            return Err(AppError::Duplicate {
                message: "Like already exists".to_string(),
            });
        }

        let like = ArticleLike {
            id: state.next_id(),
            user_id,
            article_id,
            created_at: now(),
        };
        state.likes.push(like.clone());
        Ok(like)
    }

    async fn delete_like(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.likes.len();
        state.likes.retain(|l| l.id != id);
        Ok(state.likes.len() < before)
    }

    async fn find_favorite(&self, user_id: i64, article_id: i64) -> Result<Option<Favorite>> {
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.article_id == article_id)
            .cloned())
    }

    async fn insert_favorite(&self, user_id: i64, article_id: i64) -> Result<Favorite> {
        let mut state = self.state.write().await;
        if state.favorites.iter().any(|f| f.user_id == user_id && f.article_id == article_id) {
            return Err(AppError::Duplicate {
                message: "Favorite already exists".to_string(),
            });
        }

        let favorite = Favorite {
            id: state.next_id(),
            user_id,
            article_id,
            created_at: now(),
        };
        state.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn delete_favorite(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.favorites.len();
        state.favorites.retain(|f| f.id != id);
        Ok(state.favorites.len() < before)
    }

    async fn list_favorites(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Favorite>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Favorite> = state.favorites.iter().filter(|f| f.user_id == user_id).collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(paginate(rows, page, size))
    }

    async fn insert_comment(&self, article_id: i64, user_id: i64, content: String) -> Result<Comment> {
        let mut state = self.state.write().await;
        let comment = Comment {
            id: state.next_id(),
            article_id,
            user_id,
            content,
            created_at: now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() < before)
    }

    async fn list_comments(&self, article_id: i64, page: u64, size: u64) -> Result<PageSlice<Comment>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Comment> = state.comments.iter().filter(|c| c.article_id == article_id).collect();
        rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        Ok(paginate(rows, page, size))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Duplicate {
                message: "User already exists".to_string(),
            });
        }

        let model = User {
            id: state.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            signature: None,
            created_at: now(),
        };
        state.users.push(model.clone());
        Ok(model)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self, page: u64, size: u64) -> Result<PageSlice<User>> {
        let state = self.state.read().await;
        let mut rows: Vec<&User> = state.users.iter().collect();
        rows.sort_by_key(|u| u.id);

        Ok(paginate(rows, page, size))
    }

    async fn update_user_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        user.role = role;
        Ok(Some(user.clone()))
    }

    async fn update_user_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(display_name) = changes.display_name {
            user.display_name = Some(display_name);
        }
        if let Some(signature) = changes.signature {
            user.signature = signature;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Ok(false);
        }

        let authored: HashSet<i64> = state
            .articles
            .iter()
            .filter(|a| a.author_id == id)
            .map(|a| a.id)
            .collect();
        state.articles.retain(|a| a.author_id != id);
        state.comments.retain(|c| c.user_id != id && !authored.contains(&c.article_id));
        state.likes.retain(|l| l.user_id != id && !authored.contains(&l.article_id));
        state.favorites.retain(|f| f.user_id != id && !authored.contains(&f.article_id));
        state.follows.retain(|f| f.follower_id != id && f.following_id != id);
        state.messages.retain(|m| m.sender_id != id && m.receiver_id != id);
        state.conversations.retain(|c| c.user_low_id != id && c.user_high_id != id);
        Ok(true)
    }
}

#[async_trait]
impl FollowStore for MemoryStore {
    async fn find_follow(&self, follower_id: i64, following_id: i64) -> Result<Option<Follow>> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .find(|f| f.follower_id == follower_id && f.following_id == following_id)
            .cloned())
    }

    async fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<Follow> {
        let mut state = self.state.write().await;
        if state
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Err(AppError::Duplicate {
                message: "Follow already exists".to_string(),
            });
        }

        let follow = Follow {
            id: state.next_id(),
            follower_id,
            following_id,
            created_at: now(),
        };
        state.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state.follows.retain(|f| f.id != id);
        Ok(state.follows.len() < before)
    }

    async fn list_following(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Follow>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Follow> = state.follows.iter().filter(|f| f.follower_id == user_id).collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(paginate(rows, page, size))
    }

    async fn list_followers(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Follow>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Follow> = state.follows.iter().filter(|f| f.following_id == user_id).collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(paginate(rows, page, size))
    }

    async fn count_following(&self, user_id: i64) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.follows.iter().filter(|f| f.follower_id == user_id).count() as u64)
    }

    async fn count_followers(&self, user_id: i64) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.follows.iter().filter(|f| f.following_id == user_id).count() as u64)
    }
}

fn is_between(message: &Message, a: i64, b: i64) -> bool {
    (message.sender_id == a && message.receiver_id == b)
        || (message.sender_id == b && message.receiver_id == a)
}

fn is_unread(message: &Message) -> bool {
    message.read_at.is_none() && message.recalled_at.is_none()
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, sender_id: i64, receiver_id: i64, content: String) -> Result<Message> {
        let mut state = self.state.write().await;
        let message = Message {
            id: state.next_id(),
            sender_id,
            receiver_id,
            content,
            read_at: None,
            recalled_at: None,
            created_at: now(),
        };

        let (low, high) = (sender_id.min(receiver_id), sender_id.max(receiver_id));
        let existing = state
            .conversations
            .iter()
            .position(|c| c.user_low_id == low && c.user_high_id == high);
        match existing {
            Some(index) => state.conversations[index].last_message_at = message.created_at,
            None => {
                let conversation = Conversation {
                    id: state.next_id(),
                    user_low_id: low,
                    user_high_id: high,
                    last_message_at: message.created_at,
                    created_at: message.created_at,
                };
                state.conversations.push(conversation);
            }
        }

        state.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: i64) -> Result<Option<Message>> {
        let state = self.state.read().await;
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn recall_message(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        match state
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.recalled_at.is_none())
        {
            Some(message) => {
                message.recalled_at = Some(now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_messages_between(
        &self,
        user_a: i64,
        user_b: i64,
        page: u64,
        size: u64,
    ) -> Result<PageSlice<Message>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| is_between(m, user_a, user_b) && m.recalled_at.is_none())
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(paginate(rows, page, size))
    }

    async fn list_conversations(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Conversation>> {
        let state = self.state.read().await;
        let mut rows: Vec<&Conversation> = state
            .conversations
            .iter()
            .filter(|c| c.user_low_id == user_id || c.user_high_id == user_id)
            .collect();
        rows.sort_by(|a, b| (b.last_message_at, b.id).cmp(&(a.last_message_at, a.id)));

        Ok(paginate(rows, page, size))
    }

    async fn mark_read(&self, sender_id: i64, receiver_id: i64) -> Result<u64> {
        let mut state = self.state.write().await;
        let read_at = now();
        let mut changed = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == sender_id && m.receiver_id == receiver_id && is_unread(m))
        {
            message.read_at = Some(read_at);
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_unread(&self, receiver_id: i64) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.receiver_id == receiver_id && is_unread(m))
            .count() as u64)
    }

    async fn count_unread_from(&self, sender_id: i64, receiver_id: i64) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.sender_id == sender_id && m.receiver_id == receiver_id && is_unread(m))
            .count() as u64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    fn draft(author_id: i64, title: &str, published: bool) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            summary: Some(format!("about {}", title)),
            content: "body".to_string(),
            cover_image_url: None,
            author_id,
            published,
        }
    }

    fn account(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            role: Role::Viewer,
            display_name: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_list_published_filters_and_orders() {
        let store = MemoryStore::new();
        let a = store.insert_article(draft(1, "Rust ownership", true)).await.unwrap();
        let b = store.insert_article(draft(2, "Rust async", true)).await.unwrap();
        store.insert_article(draft(1, "Rust draft", false)).await.unwrap();
        store.set_created_at(a.id, Utc::now() - chrono::Duration::hours(2)).await;

        let query = ArticleQuery {
            keyword: Some("Rust".into()),
            author_id: None,
            order: ArticleOrder::NewestFirst,
            page: 0,
            size: 10,
        };
        let page = store.list_published(&query).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, b.id);
        assert_eq!(page.items[1].id, a.id);

        let by_author = ArticleQuery { author_id: Some(1), ..query };
        let page = store.list_published(&by_author).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, a.id);
    }

    #[tokio::test]
    async fn test_delete_article_cascades() {
        let store = MemoryStore::new();
        let article = store.insert_article(draft(1, "Doomed", true)).await.unwrap();
        store.insert_like(5, article.id).await.unwrap();
        store.insert_favorite(5, article.id).await.unwrap();
        store.insert_comment(article.id, 5, "nice".into()).await.unwrap();

        assert!(store.delete_article(article.id).await.unwrap());
        assert_eq!(store.count_likes(article.id).await.unwrap(), 0);
        assert_eq!(store.count_favorites(article.id).await.unwrap(), 0);
        assert_eq!(store.count_comments(article.id).await.unwrap(), 0);
        assert!(!store.delete_article(article.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_like_is_rejected() {
        let store = MemoryStore::new();
        store.insert_like(1, 10).await.unwrap();
        let err = store.insert_like(1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_page_far_past_the_end_is_empty() {
        let store = MemoryStore::new();
        store.insert_article(draft(1, "Only", true)).await.unwrap();

        let query = ArticleQuery {
            keyword: None,
            author_id: None,
            order: ArticleOrder::NewestFirst,
            page: u64::MAX,
            size: 100,
        };
        let page = store.list_published(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);

        let drafts = store.list_drafts(1, u64::MAX / 2, u64::MAX).await.unwrap();
        assert!(drafts.items.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_wildcards_match_literally() {
        let store = MemoryStore::new();
        let literal = store.insert_article(draft(1, "100% coverage", true)).await.unwrap();
        store.insert_article(draft(1, "1000 tests", true)).await.unwrap();
        store.insert_article(draft(1, "snake_case", true)).await.unwrap();
        store.insert_article(draft(1, "snakeXcase", true)).await.unwrap();

        let query = |keyword: &str| ArticleQuery {
            keyword: Some(keyword.to_string()),
            author_id: None,
            order: ArticleOrder::NewestFirst,
            page: 0,
            size: 10,
        };

        let percent = store.list_published(&query("100%")).await.unwrap();
        assert_eq!(percent.total, 1);
        assert_eq!(percent.items[0].id, literal.id);

        let underscore = store.list_published(&query("e_c")).await.unwrap();
        assert_eq!(underscore.total, 1);
        assert_eq!(underscore.items[0].title, "snake_case");
    }

    #[tokio::test]
    async fn test_delete_user_removes_owned_rows() {
        let store = MemoryStore::new();
        let author = store.insert_user(account("author")).await.unwrap();
        let reader = store.insert_user(account("reader")).await.unwrap();
        let article = store.insert_article(draft(author.id, "Theirs", true)).await.unwrap();
        store.insert_like(reader.id, article.id).await.unwrap();
        store.insert_comment(article.id, reader.id, "hi".into()).await.unwrap();
        store.insert_follow(reader.id, author.id).await.unwrap();
        store.insert_message(reader.id, author.id, "hello".into()).await.unwrap();

        assert!(store.delete_user(author.id).await.unwrap());
        assert!(store.find_article(article.id).await.unwrap().is_none());
        assert_eq!(store.count_comments(article.id).await.unwrap(), 0);
        assert_eq!(store.count_followers(author.id).await.unwrap(), 0);
        assert_eq!(store.list_conversations(reader.id, 0, 10).await.unwrap().total, 0);
        assert!(store.find_user(reader.id).await.unwrap().is_some());
        assert!(!store.delete_user(author.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_messages_share_one_conversation_per_pair() {
        let store = MemoryStore::new();
        store.insert_message(1, 2, "hi".into()).await.unwrap();
        let reply = store.insert_message(2, 1, "hey".into()).await.unwrap();
        store.insert_message(3, 1, "yo".into()).await.unwrap();

        let conversations = store.list_conversations(1, 0, 10).await.unwrap();
        assert_eq!(conversations.total, 2);

        let thread = store.list_messages_between(1, 2, 0, 10).await.unwrap();
        assert_eq!(thread.total, 2);
        assert_eq!(thread.items[0].id, reply.id);

        assert_eq!(store.count_unread(1).await.unwrap(), 2);
        assert_eq!(store.mark_read(2, 1).await.unwrap(), 1);
        assert_eq!(store.count_unread(1).await.unwrap(), 1);

        assert!(store.recall_message(reply.id).await.unwrap());
        assert!(!store.recall_message(reply.id).await.unwrap());
        assert_eq!(store.list_messages_between(2, 1, 0, 10).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_injected_count_failure() {
        let store = MemoryStore::new();
        store.fail_counts_for(3).await;
        assert_err!(store.count_likes(3).await);
        assert_eq!(store.count_likes(4).await.unwrap(), 0);
    }
}
