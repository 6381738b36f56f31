//! Repository pattern for database operations
//!
//! Postgres-backed implementation of the store traits. Writes always go to
//! the primary. Reads whose results feed the response cache (article rows,
//! engagement counts, author lookups) also go to the primary; other reads
//! use the replica when one is configured.

use crate::db::models::*;
use crate::db::store::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, SqlErr, TransactionTrait,
};

/// Repository for data access operations
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Connection for reads that populate the response cache; these must
    /// observe the write that triggered the preceding invalidation
    fn cache_fill_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }
}

async fn fetch_page<E>(
    conn: &DatabaseConnection,
    select: Select<E>,
    page: u64,
    size: u64,
) -> Result<PageSlice<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let size = size.max(1);
    let page = page.min(i64::MAX as u64 / size);

    let paginator = select.paginate(conn, size);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page).await?;
    Ok(PageSlice { items, total })
}

/// `%keyword%` with LIKE metacharacters escaped by `\`
fn escape_like(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn contains_literal(keyword: &str) -> LikeExpr {
    LikeExpr::new(escape_like(keyword)).escape('\\')
}

/// Published articles matching the query, in the requested order
fn published_select(query: &ArticleQuery) -> Select<ArticleEntity> {
    let mut select = ArticleEntity::find().filter(ArticleColumn::Published.eq(true));

    if let Some(keyword) = query.keyword.as_deref() {
        select = select.filter(
            Condition::any()
                .add(ArticleColumn::Title.like(contains_literal(keyword)))
                .add(ArticleColumn::Summary.like(contains_literal(keyword))),
        );
    }

    if let Some(author_id) = query.author_id {
        select = select.filter(ArticleColumn::AuthorId.eq(author_id));
    }

    match query.order {
        ArticleOrder::NewestFirst => select
            .order_by_desc(ArticleColumn::CreatedAt)
            .order_by_desc(ArticleColumn::Id),
        ArticleOrder::OldestFirst => select
            .order_by_asc(ArticleColumn::CreatedAt)
            .order_by_asc(ArticleColumn::Id),
    }
}

/// Turn a unique-constraint failure into a conflict the caller can report
fn conflict_or(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Duplicate {
            message: format!("{} already exists", what),
        },
        _ => AppError::Database(err),
    }
}

// ============================================================================
// Article Operations
// ============================================================================

#[async_trait]
impl ArticleStore for Repository {
    async fn insert_article(&self, article: NewArticle) -> Result<Article> {
        let now = Utc::now();

        let model = ArticleActiveModel {
            title: Set(article.title),
            summary: Set(article.summary),
            content: Set(article.content),
            cover_image_url: Set(article.cover_image_url),
            author_id: Set(article.author_id),
            published: Set(article.published),
            view_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        model.insert(self.write_conn()).await.map_err(Into::into)
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>> {
        ArticleEntity::find_by_id(id)
            .one(self.cache_fill_conn())
            .await
            .map_err(Into::into)
    }

    async fn update_article(&self, id: i64, changes: ArticleChanges) -> Result<Option<Article>> {
        let Some(existing) = ArticleEntity::find_by_id(id).one(self.write_conn()).await? else {
            return Ok(None);
        };

        let mut active: ArticleActiveModel = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(summary) = changes.summary {
            active.summary = Set(Some(summary));
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(cover) = changes.cover_image_url {
            active.cover_image_url = Set(Some(cover));
        }
        if let Some(published) = changes.published {
            active.published = Set(published);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(self.write_conn()).await?;
        Ok(Some(updated))
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        // comments, likes and favorites go with it via ON DELETE CASCADE
        let result = ArticleEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn increment_view_count(&self, id: i64) -> Result<()> {
        ArticleEntity::update_many()
            .col_expr(
                ArticleColumn::ViewCount,
                Expr::col(ArticleColumn::ViewCount).add(1),
            )
            .filter(ArticleColumn::Id.eq(id))
            .exec(self.write_conn())
            .await?;
        Ok(())
    }

    async fn list_published(&self, query: &ArticleQuery) -> Result<PageSlice<Article>> {
        fetch_page(self.cache_fill_conn(), published_select(query), query.page, query.size).await
    }

    async fn list_drafts(&self, author_id: i64, page: u64, size: u64) -> Result<PageSlice<Article>> {
        let select = ArticleEntity::find()
            .filter(ArticleColumn::AuthorId.eq(author_id))
            .filter(ArticleColumn::Published.eq(false))
            .order_by_desc(ArticleColumn::UpdatedAt)
            .order_by_desc(ArticleColumn::Id);

        fetch_page(self.read_conn(), select, page, size).await
    }

    async fn count_published_by_author(&self, author_id: i64) -> Result<u64> {
        ArticleEntity::find()
            .filter(ArticleColumn::AuthorId.eq(author_id))
            .filter(ArticleColumn::Published.eq(true))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn list_all_articles(&self, page: u64, size: u64) -> Result<PageSlice<Article>> {
        let select = ArticleEntity::find()
            .order_by_desc(ArticleColumn::CreatedAt)
            .order_by_desc(ArticleColumn::Id);

        fetch_page(self.read_conn(), select, page, size).await
    }
}

// ============================================================================
// Engagement Operations
// ============================================================================

#[async_trait]
impl EngagementStore for Repository {
    async fn count_likes(&self, article_id: i64) -> Result<u64> {
        ArticleLikeEntity::find()
            .filter(ArticleLikeColumn::ArticleId.eq(article_id))
            .count(self.cache_fill_conn())
            .await
            .map_err(Into::into)
    }

    async fn count_favorites(&self, article_id: i64) -> Result<u64> {
        FavoriteEntity::find()
            .filter(FavoriteColumn::ArticleId.eq(article_id))
            .count(self.cache_fill_conn())
            .await
            .map_err(Into::into)
    }

    async fn count_comments(&self, article_id: i64) -> Result<u64> {
        CommentEntity::find()
            .filter(CommentColumn::ArticleId.eq(article_id))
            .count(self.cache_fill_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_like(&self, user_id: i64, article_id: i64) -> Result<Option<ArticleLike>> {
        // toggles read their own writes, so this goes to the primary
        ArticleLikeEntity::find()
            .filter(ArticleLikeColumn::UserId.eq(user_id))
            .filter(ArticleLikeColumn::ArticleId.eq(article_id))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn insert_like(&self, user_id: i64, article_id: i64) -> Result<ArticleLike> {
        let model = ArticleLikeActiveModel {
            user_id: Set(user_id),
            article_id: Set(article_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.write_conn())
            .await
            .map_err(|e| conflict_or(e, "Like"))
    }

    async fn delete_like(&self, id: i64) -> Result<bool> {
        let result = ArticleLikeEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_favorite(&self, user_id: i64, article_id: i64) -> Result<Option<Favorite>> {
        FavoriteEntity::find()
            .filter(FavoriteColumn::UserId.eq(user_id))
            .filter(FavoriteColumn::ArticleId.eq(article_id))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn insert_favorite(&self, user_id: i64, article_id: i64) -> Result<Favorite> {
        let model = FavoriteActiveModel {
            user_id: Set(user_id),
            article_id: Set(article_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.write_conn())
            .await
            .map_err(|e| conflict_or(e, "Favorite"))
    }

    async fn delete_favorite(&self, id: i64) -> Result<bool> {
        let result = FavoriteEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_favorites(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Favorite>> {
        let select = FavoriteEntity::find()
            .filter(FavoriteColumn::UserId.eq(user_id))
            .order_by_desc(FavoriteColumn::CreatedAt)
            .order_by_desc(FavoriteColumn::Id);

        fetch_page(self.read_conn(), select, page, size).await
    }

    async fn insert_comment(&self, article_id: i64, user_id: i64, content: String) -> Result<Comment> {
        let model = CommentActiveModel {
            article_id: Set(article_id),
            user_id: Set(user_id),
            content: Set(content),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.write_conn()).await.map_err(Into::into)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>> {
        CommentEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let result = CommentEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_comments(&self, article_id: i64, page: u64, size: u64) -> Result<PageSlice<Comment>> {
        let select = CommentEntity::find()
            .filter(CommentColumn::ArticleId.eq(article_id))
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id);

        fetch_page(self.read_conn(), select, page, size).await
    }
}

// ============================================================================
// User Operations
// ============================================================================

#[async_trait]
impl UserStore for Repository {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let model = UserActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role),
            display_name: Set(user.display_name),
            avatar_url: Set(user.avatar_url),
            signature: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.write_conn())
            .await
            .map_err(|e| conflict_or(e, "User"))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.cache_fill_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        UserEntity::find()
            .filter(UserColumn::Id.is_in(ids.iter().copied()))
            .all(self.cache_fill_conn())
            .await
            .map_err(Into::into)
    }

    async fn list_users(&self, page: u64, size: u64) -> Result<PageSlice<User>> {
        let select = UserEntity::find().order_by_asc(UserColumn::Id);
        fetch_page(self.read_conn(), select, page, size).await
    }

    async fn update_user_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        let Some(existing) = UserEntity::find_by_id(id).one(self.write_conn()).await? else {
            return Ok(None);
        };

        let mut active: UserActiveModel = existing.into();
        active.role = Set(role);
        Ok(Some(active.update(self.write_conn()).await?))
    }

    async fn update_user_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>> {
        let Some(existing) = UserEntity::find_by_id(id).one(self.write_conn()).await? else {
            return Ok(None);
        };

        let mut active: UserActiveModel = existing.into();
        if let Some(display_name) = changes.display_name {
            active.display_name = Set(Some(display_name));
        }
        if let Some(signature) = changes.signature {
            active.signature = Set(signature);
        }

        Ok(Some(active.update(self.write_conn()).await?))
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        // authored rows, reactions, follows and messages go via ON DELETE CASCADE
        let result = UserEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Follow Operations
// ============================================================================

#[async_trait]
impl FollowStore for Repository {
    async fn find_follow(&self, follower_id: i64, following_id: i64) -> Result<Option<Follow>> {
        FollowEntity::find()
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .filter(FollowColumn::FollowingId.eq(following_id))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<Follow> {
        let model = FollowActiveModel {
            follower_id: Set(follower_id),
            following_id: Set(following_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.write_conn())
            .await
            .map_err(|e| conflict_or(e, "Follow"))
    }

    async fn delete_follow(&self, id: i64) -> Result<bool> {
        let result = FollowEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_following(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Follow>> {
        let select = FollowEntity::find()
            .filter(FollowColumn::FollowerId.eq(user_id))
            .order_by_desc(FollowColumn::CreatedAt)
            .order_by_desc(FollowColumn::Id);

        fetch_page(self.read_conn(), select, page, size).await
    }

    async fn list_followers(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Follow>> {
        let select = FollowEntity::find()
            .filter(FollowColumn::FollowingId.eq(user_id))
            .order_by_desc(FollowColumn::CreatedAt)
            .order_by_desc(FollowColumn::Id);

        fetch_page(self.read_conn(), select, page, size).await
    }

    async fn count_following(&self, user_id: i64) -> Result<u64> {
        FollowEntity::find()
            .filter(FollowColumn::FollowerId.eq(user_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn count_followers(&self, user_id: i64) -> Result<u64> {
        FollowEntity::find()
            .filter(FollowColumn::FollowingId.eq(user_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }
}

// ============================================================================
// Message Operations
// ============================================================================

/// Messages between `a` and `b` in either direction
fn between(a: i64, b: i64) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(MessageColumn::SenderId.eq(a))
                .add(MessageColumn::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(MessageColumn::SenderId.eq(b))
                .add(MessageColumn::ReceiverId.eq(a)),
        )
}

// participants read their own sends right away, so messages stay on the primary
#[async_trait]
impl MessageStore for Repository {
    async fn insert_message(&self, sender_id: i64, receiver_id: i64, content: String) -> Result<Message> {
        let txn = self.write_conn().begin().await?;

        let message = MessageActiveModel {
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            content: Set(content),
            read_at: Set(None),
            recalled_at: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let conversation = ConversationActiveModel {
            user_low_id: Set(sender_id.min(receiver_id)),
            user_high_id: Set(sender_id.max(receiver_id)),
            last_message_at: Set(message.created_at),
            created_at: Set(message.created_at),
            ..Default::default()
        };
        ConversationEntity::insert(conversation)
            .on_conflict(
                OnConflict::columns([ConversationColumn::UserLowId, ConversationColumn::UserHighId])
                    .update_column(ConversationColumn::LastMessageAt)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;
        Ok(message)
    }

    async fn find_message(&self, id: i64) -> Result<Option<Message>> {
        MessageEntity::find_by_id(id)
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn recall_message(&self, id: i64) -> Result<bool> {
        let result = MessageEntity::update_many()
            .col_expr(MessageColumn::RecalledAt, Expr::value(Utc::now()))
            .filter(MessageColumn::Id.eq(id))
            .filter(MessageColumn::RecalledAt.is_null())
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_messages_between(
        &self,
        user_a: i64,
        user_b: i64,
        page: u64,
        size: u64,
    ) -> Result<PageSlice<Message>> {
        let select = MessageEntity::find()
            .filter(between(user_a, user_b))
            .filter(MessageColumn::RecalledAt.is_null())
            .order_by_desc(MessageColumn::CreatedAt)
            .order_by_desc(MessageColumn::Id);

        fetch_page(self.write_conn(), select, page, size).await
    }

    async fn list_conversations(&self, user_id: i64, page: u64, size: u64) -> Result<PageSlice<Conversation>> {
        let select = ConversationEntity::find()
            .filter(
                Condition::any()
                    .add(ConversationColumn::UserLowId.eq(user_id))
                    .add(ConversationColumn::UserHighId.eq(user_id)),
            )
            .order_by_desc(ConversationColumn::LastMessageAt)
            .order_by_desc(ConversationColumn::Id);

        fetch_page(self.write_conn(), select, page, size).await
    }

    async fn mark_read(&self, sender_id: i64, receiver_id: i64) -> Result<u64> {
        let result = MessageEntity::update_many()
            .col_expr(MessageColumn::ReadAt, Expr::value(Utc::now()))
            .filter(MessageColumn::SenderId.eq(sender_id))
            .filter(MessageColumn::ReceiverId.eq(receiver_id))
            .filter(MessageColumn::ReadAt.is_null())
            .filter(MessageColumn::RecalledAt.is_null())
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_unread(&self, receiver_id: i64) -> Result<u64> {
        MessageEntity::find()
            .filter(MessageColumn::ReceiverId.eq(receiver_id))
            .filter(MessageColumn::ReadAt.is_null())
            .filter(MessageColumn::RecalledAt.is_null())
            .count(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn count_unread_from(&self, sender_id: i64, receiver_id: i64) -> Result<u64> {
        MessageEntity::find()
            .filter(MessageColumn::SenderId.eq(sender_id))
            .filter(MessageColumn::ReceiverId.eq(receiver_id))
            .filter(MessageColumn::ReadAt.is_null())
            .filter(MessageColumn::RecalledAt.is_null())
            .count(self.write_conn())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl Store for Repository {
    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait, Value};
    use std::collections::BTreeMap;

    fn article(id: i64, title: &str) -> Article {
        let now = Utc::now();
        Article {
            id,
            title: title.to_string(),
            summary: None,
            content: "body".to_string(),
            cover_image_url: None,
            author_id: 1,
            published: true,
            view_count: 0,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn user(id: i64, display_name: &str) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            password_hash: "hash".to_string(),
            role: Role::Viewer,
            display_name: Some(display_name.to_string()),
            avatar_url: None,
            signature: None,
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    /// Primary and replica answering the same query differently
    fn split_pool(primary: MockDatabase, replica: MockDatabase) -> Repository {
        Repository::new(DbPool {
            primary: primary.into_connection(),
            replica: Some(replica.into_connection()),
        })
    }

    #[tokio::test]
    async fn test_article_rows_come_from_primary() {
        let repo = split_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![article(1, "Renamed")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![article(1, "Original")]]),
        );

        let found = repo.find_article(1).await.unwrap().unwrap();
        assert_eq!(found.title, "Renamed");
    }

    #[tokio::test]
    async fn test_list_page_and_counts_come_from_primary() {
        let repo = split_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(1)]])
                .append_query_results([vec![article(1, "Fresh")]])
                .append_query_results([vec![count_row(4)]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(0)]])
                .append_query_results([Vec::<Article>::new()])
                .append_query_results([vec![count_row(3)]]),
        );

        let query = ArticleQuery {
            keyword: None,
            author_id: None,
            order: ArticleOrder::NewestFirst,
            page: 0,
            size: 10,
        };
        let page = repo.list_published(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Fresh");

        assert_eq!(repo.count_likes(1).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_author_lookup_comes_from_primary() {
        let repo = split_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user(1, "New Name")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user(1, "Old Name")]]),
        );

        let users = repo.find_users(&[1]).await.unwrap();
        assert_eq!(users[0].display_name.as_deref(), Some("New Name"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rust"), "%rust%");
        assert_eq!(escape_like("100%"), "%100\\%%");
        assert_eq!(escape_like("snake_case"), "%snake\\_case%");
        assert_eq!(escape_like("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_keyword_filter_uses_escape_clause() {
        let query = ArticleQuery {
            keyword: Some("100%_off".into()),
            author_id: None,
            order: ArticleOrder::NewestFirst,
            page: 0,
            size: 10,
        };

        let statement = published_select(&query).build(DatabaseBackend::Postgres);
        assert!(statement.sql.contains("ESCAPE"), "{}", statement.sql);

        let values = statement.values.map(|v| v.0).unwrap_or_default();
        assert!(values.contains(&Value::from("%100\\%\\_off%")), "{:?}", values);
    }
}
