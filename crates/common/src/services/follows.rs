//! Follow relationships between users

use crate::auth::AuthUser;
use crate::db::models::Follow;
use crate::db::{PageSlice, Store};
use crate::errors::{AppError, Result};
use crate::services::listing::load_authors;
use crate::services::types::{FollowEntry, FollowStats, Page};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct FollowService {
    store: Arc<dyn Store>,
}

impl FollowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: i64) -> Result<()> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::UserNotFound { id: user_id }),
        }
    }

    pub async fn follow(&self, caller: &AuthUser, target_id: i64) -> Result<()> {
        if caller.user_id == target_id {
            return Err(AppError::validation("user_id", "You cannot follow yourself"));
        }
        self.require_user(target_id).await?;

        if self.store.find_follow(caller.user_id, target_id).await?.is_some() {
            return Err(AppError::Duplicate {
                message: "Already following this user".to_string(),
            });
        }

        self.store.insert_follow(caller.user_id, target_id).await?;
        info!(follower_id = caller.user_id, following_id = target_id, "User followed");
        Ok(())
    }

    pub async fn unfollow(&self, caller: &AuthUser, target_id: i64) -> Result<()> {
        let edge = self
            .store
            .find_follow(caller.user_id, target_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "Follow".to_string(),
                id: target_id.to_string(),
            })?;

        self.store.delete_follow(edge.id).await?;
        info!(follower_id = caller.user_id, following_id = target_id, "User unfollowed");
        Ok(())
    }

    pub async fn is_following(&self, caller: &AuthUser, target_id: i64) -> Result<bool> {
        Ok(self.store.find_follow(caller.user_id, target_id).await?.is_some())
    }

    /// Users that `user_id` follows, most recent first
    pub async fn following(&self, user_id: i64, page: u64, size: u64) -> Result<Page<FollowEntry>> {
        self.require_user(user_id).await?;
        let slice = self.store.list_following(user_id, page, size).await?;
        Ok(self.entries(slice, page, size, |f| f.following_id).await)
    }

    /// Users following `user_id`, most recent first
    pub async fn followers(&self, user_id: i64, page: u64, size: u64) -> Result<Page<FollowEntry>> {
        self.require_user(user_id).await?;
        let slice = self.store.list_followers(user_id, page, size).await?;
        Ok(self.entries(slice, page, size, |f| f.follower_id).await)
    }

    pub async fn stats(&self, user_id: i64) -> Result<FollowStats> {
        self.require_user(user_id).await?;
        let (following, followers) = futures::join!(
            self.store.count_following(user_id),
            self.store.count_followers(user_id),
        );

        Ok(FollowStats {
            following_count: following?,
            followers_count: followers?,
        })
    }

    async fn entries(
        &self,
        slice: PageSlice<Follow>,
        page: u64,
        size: u64,
        other: fn(&Follow) -> i64,
    ) -> Page<FollowEntry> {
        let ids: Vec<i64> = slice.items.iter().map(other).collect();
        let users = load_authors(self.store.as_ref(), &ids).await;

        let content = slice
            .items
            .iter()
            .filter_map(|edge| {
                users.get(&other(edge)).map(|user| FollowEntry {
                    user: user.clone(),
                    followed_at: edge.created_at.with_timezone(&Utc),
                })
            })
            .collect();

        Page::new(content, page, size, slice.total)
    }
}
