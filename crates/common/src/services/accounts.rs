//! Registration, login and profiles

use crate::auth::{hash_password, verify_password, AuthUser, JwtManager, MIN_PASSWORD_LENGTH};
use crate::cache::ArticleCache;
use crate::config::AuthConfig;
use crate::db::models::{Role, User};
use crate::db::{NewUser, ProfileChanges, Store};
use crate::errors::{AppError, Result};
use crate::services::types::{AuthResponse, UserProfile};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Avatar assigned to new accounts
pub const DEFAULT_AVATAR_URL: &str = "/uploads/images/default/avatar.jpg";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(max = 100))]
    pub display_name: Option<String>,
}

impl RegisterInput {
    /// Strip surrounding whitespace so length rules apply to the stored value
    fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            display_name: self
                .display_name
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `PUT /api/users/me`; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,

    /// A blank signature clears it
    #[validate(length(max = 200, message = "Signature must be at most 200 characters"))]
    pub signature: Option<String>,
}

pub struct AccountService {
    store: Arc<dyn Store>,
    cache: ArticleCache,
    jwt: Arc<JwtManager>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, cache: ArticleCache, jwt: Arc<JwtManager>) -> Self {
        Self { store, cache, jwt }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<AuthResponse> {
        let user = self.create_account(input, Role::Viewer).await?;
        info!(user_id = user.id, username = %user.username, "User registered");
        self.issue(user).await
    }

    /// Validate and store a new account with the given role
    pub(crate) async fn create_account(&self, input: RegisterInput, role: Role) -> Result<User> {
        let input = input.trimmed();
        input.validate()?;
        self.create_user(
            &input.username,
            &input.email,
            &input.password,
            role,
            input.display_name,
        )
        .await
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse> {
        input.validate()?;

        let user = self.store.find_user_by_username(input.username.trim()).await?;
        let user = match user {
            Some(user) if verify_password(&input.password, &user.password_hash) => user,
            _ => {
                warn!(username = %input.username, "Failed login attempt");
                return Err(AppError::Unauthorized {
                    message: "Invalid username or password".to_string(),
                });
            }
        };

        info!(user_id = user.id, "User logged in");
        self.issue(user).await
    }

    /// The caller's own profile, including e-mail
    pub async fn me(&self, caller: &AuthUser) -> Result<UserProfile> {
        let user = self.find(caller.user_id).await?;
        let email = user.email.clone();
        let mut profile = self.profile_of(user).await?;
        profile.email = Some(email);
        Ok(profile)
    }

    /// Public profile of any user
    pub async fn profile(&self, user_id: i64) -> Result<UserProfile> {
        let user = self.find(user_id).await?;
        self.profile_of(user).await
    }

    /// Edit the caller's display name and signature.
    ///
    /// Author summaries are embedded in cached article payloads, so the
    /// whole article cache is dropped afterwards.
    pub async fn update_profile(&self, caller: &AuthUser, input: ProfileUpdate) -> Result<UserProfile> {
        let input = ProfileUpdate {
            display_name: input.display_name.map(|d| d.trim().to_string()),
            signature: input.signature.map(|s| s.trim().to_string()),
        };
        input.validate()?;

        if input.display_name.as_deref() == Some("") {
            return Err(AppError::validation("display_name", "Display name must not be blank"));
        }

        let changes = ProfileChanges {
            display_name: input.display_name,
            signature: input.signature.map(|s| Some(s).filter(|s| !s.is_empty())),
        };
        let user = self
            .store
            .update_user_profile(caller.user_id, changes)
            .await?
            .ok_or(AppError::UserNotFound { id: caller.user_id })?;

        self.cache.invalidate_all().await;
        info!(user_id = user.id, "Profile updated");

        let email = user.email.clone();
        let mut profile = self.profile_of(user).await?;
        profile.email = Some(email);
        Ok(profile)
    }

    /// Create the configured blogger account unless it already exists
    pub async fn ensure_admin(&self, config: &AuthConfig) -> Result<()> {
        let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
            return Ok(());
        };

        if self.store.find_user_by_username(username).await?.is_some() {
            return Ok(());
        }

        let email = config
            .admin_email
            .clone()
            .unwrap_or_else(|| format!("{}@localhost", username));

        let user = self
            .create_user(username, &email, password, Role::Blogger, None)
            .await?;
        info!(user_id = user.id, username = %user.username, "Bootstrap blogger account created");
        Ok(())
    }

    async fn find(&self, user_id: i64) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound { id: user_id })
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
        display_name: Option<String>,
    ) -> Result<User> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }

        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(AppError::Duplicate {
                message: "Username already taken".to_string(),
            });
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Duplicate {
                message: "Email already registered".to_string(),
            });
        }

        let display_name = display_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| username.to_string());

        self.store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                role,
                display_name: Some(display_name),
                avatar_url: Some(DEFAULT_AVATAR_URL.to_string()),
            })
            .await
    }

    async fn issue(&self, user: User) -> Result<AuthResponse> {
        let token = self.jwt.generate_token(user.id, user.role)?;
        let email = user.email.clone();
        let mut profile = self.profile_of(user).await?;
        profile.email = Some(email);

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiration_secs(),
            user: profile,
        })
    }

    async fn profile_of(&self, user: User) -> Result<UserProfile> {
        let (articles, following, followers) = futures::join!(
            self.store.count_published_by_author(user.id),
            self.store.count_following(user.id),
            self.store.count_followers(user.id),
        );

        Ok(UserProfile {
            id: user.id,
            username: user.username,
            email: None,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            signature: user.signature,
            role: user.role,
            created_at: user.created_at.with_timezone(&Utc),
            article_count: articles?,
            following_count: following?,
            followers_count: followers?,
        })
    }
}
