//! Application services
//!
//! Handlers stay thin: they extract the caller and parameters and delegate
//! here. Services talk to persistence only through [`Store`] and to the
//! response cache only through [`ArticleCache`].

mod accounts;
mod admin;
mod articles;
mod engagement;
mod follows;
mod listing;
mod messages;
mod types;

pub use accounts::{AccountService, LoginInput, ProfileUpdate, RegisterInput, DEFAULT_AVATAR_URL};
pub use admin::{AdminService, RoleChange};
pub use articles::{ArticleInput, ArticleService, ArticleUpdate};
pub use engagement::{CommentInput, EngagementService, MAX_BATCH_IDS};
pub use follows::FollowService;
pub use listing::{ListAssembler, ListParams, ListRequest, SortMode};
pub use messages::{MarkReadInput, MessageService, SendMessageInput, RECALL_WINDOW_SECS};
pub use types::*;

use crate::auth::JwtManager;
use crate::cache::ArticleCache;
use crate::db::Store;
use std::sync::Arc;

/// All services, cheap to clone into request state
#[derive(Clone)]
pub struct Services {
    pub articles: Arc<ArticleService>,
    pub engagement: Arc<EngagementService>,
    pub accounts: Arc<AccountService>,
    pub follows: Arc<FollowService>,
    pub messages: Arc<MessageService>,
    pub admin: Arc<AdminService>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, cache: ArticleCache, jwt: Arc<JwtManager>) -> Self {
        let accounts = Arc::new(AccountService::new(store.clone(), cache.clone(), jwt));
        let articles = Arc::new(ArticleService::new(store.clone(), cache.clone()));

        Self {
            engagement: Arc::new(EngagementService::new(store.clone(), cache.clone())),
            admin: Arc::new(AdminService::new(
                store.clone(),
                cache,
                accounts.clone(),
                articles.clone(),
            )),
            articles,
            accounts,
            follows: Arc::new(FollowService::new(store.clone())),
            messages: Arc::new(MessageService::new(store)),
        }
    }
}
