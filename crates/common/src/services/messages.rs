//! Direct messages between users
//!
//! Messages are never cached. A conversation row exists per pair of users
//! and only orders the conversation list; previews and unread counters are
//! read from the messages themselves so a recall is reflected immediately.

use crate::auth::AuthUser;
use crate::db::Store;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::services::listing::load_authors;
use crate::services::types::{ConversationView, MessageView, Page};
use chrono::{Duration, Utc};
use futures::future::try_join_all;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// How long after sending a message its sender may still recall it
pub const RECALL_WINDOW_SECS: i64 = 120;

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageInput {
    pub receiver_id: i64,

    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub content: String,
}

/// Body of `PUT /api/messages/read`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MarkReadInput {
    pub sender_id: i64,
}

pub struct MessageService {
    store: Arc<dyn Store>,
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: i64) -> Result<()> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::UserNotFound { id: user_id }),
        }
    }

    pub async fn send(&self, caller: &AuthUser, input: SendMessageInput) -> Result<MessageView> {
        let input = SendMessageInput {
            content: input.content.trim().to_string(),
            ..input
        };
        input.validate()?;

        if input.receiver_id == caller.user_id {
            return Err(AppError::validation("receiver_id", "You cannot message yourself"));
        }
        self.require_user(input.receiver_id).await?;

        let message = self
            .store
            .insert_message(caller.user_id, input.receiver_id, input.content)
            .await?;

        metrics::record_message("send");
        info!(message_id = message.id, sender_id = caller.user_id, receiver_id = input.receiver_id, "Message sent");
        Ok(MessageView::from(message))
    }

    /// Messages exchanged with `peer_id`, newest first
    pub async fn conversation(
        &self,
        caller: &AuthUser,
        peer_id: i64,
        page: u64,
        size: u64,
    ) -> Result<Page<MessageView>> {
        self.require_user(peer_id).await?;
        let slice = self
            .store
            .list_messages_between(caller.user_id, peer_id, page, size)
            .await?;

        let content = slice.items.into_iter().map(MessageView::from).collect();
        Ok(Page::new(content, page, size, slice.total))
    }

    /// The caller's conversations, most recent activity first
    pub async fn conversations(&self, caller: &AuthUser, page: u64, size: u64) -> Result<Page<ConversationView>> {
        let me = caller.user_id;
        let slice = self.store.list_conversations(me, page, size).await?;

        let peers: Vec<i64> = slice.items.iter().map(|c| c.peer_of(me)).collect();
        let users = load_authors(self.store.as_ref(), &peers).await;

        let store = self.store.as_ref();
        let details = try_join_all(peers.iter().map(|&peer| async move {
            let (latest, unread) = futures::join!(
                store.list_messages_between(me, peer, 0, 1),
                store.count_unread_from(peer, me),
            );
            Ok::<_, AppError>((latest?.items.into_iter().next(), unread?))
        }))
        .await?;

        let content = slice
            .items
            .iter()
            .zip(details)
            .map(|(conversation, (latest, unread_count))| {
                let peer_id = conversation.peer_of(me);
                ConversationView {
                    peer_id,
                    peer: users.get(&peer_id).cloned(),
                    last_message: latest.map(MessageView::from),
                    last_message_at: conversation.last_message_at.with_timezone(&Utc),
                    unread_count,
                }
            })
            .collect();

        Ok(Page::new(content, page, size, slice.total))
    }

    /// Mark everything `sender_id` sent to the caller as read
    pub async fn mark_read(&self, caller: &AuthUser, input: MarkReadInput) -> Result<u64> {
        let updated = self.store.mark_read(input.sender_id, caller.user_id).await?;
        if updated > 0 {
            metrics::record_message("read");
        }
        Ok(updated)
    }

    pub async fn unread_count(&self, caller: &AuthUser) -> Result<u64> {
        self.store.count_unread(caller.user_id).await
    }

    /// Recall one of the caller's own messages shortly after sending it
    pub async fn recall(&self, caller: &AuthUser, message_id: i64) -> Result<()> {
        let not_found = || AppError::NotFound {
            resource_type: "Message".to_string(),
            id: message_id.to_string(),
        };

        let message = self
            .store
            .find_message(message_id)
            .await?
            .filter(|m| m.recalled_at.is_none())
            .ok_or_else(not_found)?;

        if message.sender_id != caller.user_id {
            return Err(AppError::Forbidden {
                message: "Only the sender can recall a message".to_string(),
            });
        }

        let age = Utc::now() - message.created_at.with_timezone(&Utc);
        if age > Duration::seconds(RECALL_WINDOW_SECS) {
            return Err(AppError::validation(
                "message_id",
                format!("Messages can only be recalled within {} seconds", RECALL_WINDOW_SECS),
            ));
        }

        if !self.store.recall_message(message_id).await? {
            return Err(not_found());
        }

        metrics::record_message("recall");
        info!(message_id, sender_id = caller.user_id, "Message recalled");
        Ok(())
    }
}
