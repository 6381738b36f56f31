//! PostForge Common Library
//! 
//! Shared code for the PostForge blogging backend including:
//! - Database entities, store traits and the SeaORM repository
//! - Response cache abstraction (Redis / in-memory)
//! - Hotness ranking for article lists
//! - Article, engagement and account services
//! - Error types, configuration, authentication and metrics

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod ranking;
pub mod services;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, MemoryStore, Repository, Store};
pub use cache::{ArticleCache, MemoryCache, RedisCache, ResponseCache};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default page size for paginated endpoints
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound on page size accepted from clients
pub const MAX_PAGE_SIZE: u64 = 100;
