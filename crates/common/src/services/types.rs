//! Response payloads shared by the services
//!
//! List and detail payloads are cached as JSON, so they must not carry
//! anything specific to the caller; `liked` / `favorited` are filled in
//! after the cache read.

use crate::db::models::{Article, Message, Role, User};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page envelope returned by every paginated endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = if size == 0 { 0 } else { total_elements.div_ceil(size) };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Raw paging query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl PageParams {
    /// 0-based page and a size clamped to `1..=MAX_PAGE_SIZE`
    pub fn resolve(&self) -> (u64, u64) {
        let size = clamp_page_size(self.size);
        (clamp_page(self.page, size), size)
    }
}

pub fn clamp_page_size(size: Option<u64>) -> u64 {
    size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Cap the page index so that `page * size` still fits a SQL `OFFSET` (i64)
pub fn clamp_page(page: Option<u64>, size: u64) -> u64 {
    page.unwrap_or(0).min(i64::MAX as u64 / size.max(1))
}

/// Public identity of a user as embedded in other payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// One row of an article list page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub cover_image_url: Option<String>,
    pub author_id: i64,
    pub author: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
    /// Rounded to two decimals
    pub hot_score: f64,
    pub liked: bool,
    pub favorited: bool,
}

/// Full article as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub author_id: i64,
    pub author: Option<UserSummary>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
    pub liked: bool,
    pub favorited: bool,
}

/// Draft listing row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Article> for DraftSummary {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            summary: article.summary,
            content: article.content,
            cover_image_url: article.cover_image_url,
            published: article.published,
            created_at: article.created_at.with_timezone(&Utc),
            updated_at: article.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStats {
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

/// Caller's relation to one article plus its current counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub liked: bool,
    pub favorited: bool,
    pub like_count: u64,
    pub favorite_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub article_id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub cover_image_url: Option<String>,
    pub author: Option<UserSummary>,
    pub article_created_at: DateTime<Utc>,
    pub favorited_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub author: Option<UserSummary>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    /// Only present when the caller views their own profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub signature: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub article_count: u64,
    pub following_count: u64,
    pub followers_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub following_count: u64,
    pub followers_count: u64,
}

/// One side of a follow edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEntry {
    pub user: UserSummary,
    pub followed_at: DateTime<Utc>,
}

/// One direct message as seen by either participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            read: message.read_at.is_some(),
            read_at: message.read_at.map(|t| t.with_timezone(&Utc)),
            created_at: message.created_at.with_timezone(&Utc),
        }
    }
}

/// Conversation list row from the caller's point of view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationView {
    pub peer_id: i64,
    pub peer: Option<UserSummary>,
    /// Latest message that has not been recalled
    pub last_message: Option<MessageView>,
    pub last_message_at: DateTime<Utc>,
    /// Messages from the peer the caller has not read yet
    pub unread_count: u64,
}

/// Account row of the admin user listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AdminUserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            created_at: user.created_at.with_timezone(&Utc),
        }
    }
}

/// Article row of the admin listing; drafts included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminArticleRow {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub author_id: i64,
    pub author: Option<UserSummary>,
    pub published: bool,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2, 3], 0, 3, 7);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, 10, 0);
        assert_eq!(empty.total_pages, 0);

        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.content, vec![10, 20, 30]);
        assert_eq!(mapped.total_elements, 7);
    }

    #[test]
    fn test_page_params_clamp() {
        assert_eq!(PageParams::default().resolve(), (0, 10));
        assert_eq!(PageParams { page: Some(2), size: Some(0) }.resolve(), (2, 1));
        assert_eq!(PageParams { page: None, size: Some(5000) }.resolve(), (0, 100));
    }

    #[test]
    fn test_huge_page_keeps_offset_in_range() {
        let (page, size) = PageParams { page: Some(u64::MAX), size: Some(100) }.resolve();
        assert_eq!(size, 100);
        assert!(page.checked_mul(size).is_some_and(|offset| offset <= i64::MAX as u64));

        assert_eq!(clamp_page(Some(u64::MAX), 1), i64::MAX as u64);
        assert_eq!(clamp_page(Some(7), 10), 7);
    }
}
