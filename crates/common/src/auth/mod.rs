//! Authentication and authorization utilities
//!
//! Provides:
//! - Argon2id password hashing
//! - JWT token generation and validation
//! - Caller identity extraction (`AuthUser`, `MaybeAuthUser`)

use crate::db::models::Role;
use crate::errors::{AppError, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authenticated caller available to handlers and services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID (from `claims.sub`)
    pub user_id: i64,

    /// Role at the time the token was issued
    pub role: Role,
}

impl AuthUser {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Bloggers may manage any article or comment and read any draft
    pub fn is_privileged(&self) -> bool {
        self.role == Role::Blogger
    }

    /// True when the caller owns the resource or holds the privileged role
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.user_id == owner_id || self.is_privileged()
    }

    /// Require ownership or the privileged role
    pub fn require_manage(&self, owner_id: i64, what: &str) -> Result<()> {
        if self.can_manage(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Not allowed to modify this {}", what),
            })
        }
    }
}

/// Optional caller identity for public endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Role name
    pub role: Role,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Token lifetime in seconds
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: i64, role: Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e)
            })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::ExpiredToken
                    }
                    _ => AppError::InvalidToken,
                }
            })
    }

    /// Resolve a bearer token into a caller identity
    pub fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let claims = self.validate_token(token)?;
        let user_id = claims.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)?;
        Ok(AuthUser::new(user_id, claims.role))
    }
}

/// Hash a plaintext password using Argon2id with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a plaintext password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Extract the token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn bearer_from_parts(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
}

/// Axum extractor for a required caller identity
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let token = bearer_from_parts(parts).ok_or_else(|| AppError::Unauthorized {
            message: "Missing or malformed Authorization header".to_string(),
        })?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        jwt.authenticate(token)
    }
}

/// Axum extractor for an optional caller identity; bad tokens read as anonymous
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Some(token) = bearer_from_parts(parts) else {
            return Ok(MaybeAuthUser(None));
        };

        let jwt = Arc::<JwtManager>::from_ref(state);
        match jwt.authenticate(token) {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid token on public endpoint");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
        assert!(!verify_password("correct-horse", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("abc.def"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let token = manager.generate_token(42, Role::Blogger).unwrap();
        let user = manager.authenticate(&token).unwrap();

        assert_eq!(user.user_id, 42);
        assert_eq!(user.role, Role::Blogger);
        assert!(user.is_privileged());
    }

    #[test]
    fn test_jwt_rejects_foreign_signature() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);

        let token = issuer.generate_token(1, Role::Viewer).unwrap();
        assert!(matches!(verifier.authenticate(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let manager = JwtManager::new("test_secret", 0);
        let claims = JwtClaims {
            sub: "5".into(),
            role: Role::Viewer,
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        assert!(matches!(manager.validate_token(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn test_manage_permissions() {
        let viewer = AuthUser::new(3, Role::Viewer);
        assert!(viewer.can_manage(3));
        assert!(!viewer.can_manage(4));
        tokio_test::assert_err!(viewer.require_manage(4, "article"));

        let blogger = AuthUser::new(9, Role::Blogger);
        assert!(blogger.can_manage(4));
    }
}
