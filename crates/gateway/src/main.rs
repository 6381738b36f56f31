//! PostForge API Gateway
//!
//! The HTTP entry point of the blogging backend.
//! Handles:
//! - Authentication (JWT bearer tokens)
//! - Rate limiting
//! - Request routing to the article, engagement, account, follow, message
//!   and admin services
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

#[cfg(test)]
mod tests;

use axum::{
    extract::FromRef,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use postforge_common::{
    auth::JwtManager,
    cache::{ArticleCache, MemoryCache, RedisCache, ResponseCache},
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository, Store},
    metrics,
    services::Services,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub cache: ArticleCache,
    pub jwt: Arc<JwtManager>,
    pub services: Services,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn Store>, cache: ArticleCache) -> Self {
        let jwt = Arc::new(JwtManager::new(
            &config.auth.jwt_secret,
            config.auth.jwt_expiration_secs,
        ));
        let services = Services::new(store.clone(), cache.clone(), jwt.clone());

        Self {
            config,
            store,
            cache,
            jwt,
            services,
        }
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    let config = Arc::new(config);

    init_tracing(&config.observability);
    info!(
        version = postforge_common::VERSION,
        service = %config.observability.service_name,
        "Starting PostForge API Gateway"
    );

    init_metrics(&config.observability)?;

    // Database
    info!("Connecting to database...");
    let pool = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        pool.migrate().await?;
    }
    let store: Arc<dyn Store> = Arc::new(Repository::new(pool));

    // Response cache
    let cache = ArticleCache::new(connect_cache(&config).await, &config.cache);

    let state = AppState::new(config.clone(), store, cache);
    state.services.accounts.ensure_admin(&config.auth).await?;

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<()> {
    if config.metrics_port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .install()?;

    metrics::register_metrics();
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Redis when configured and reachable, otherwise an in-process cache
async fn connect_cache(config: &AppConfig) -> Arc<dyn ResponseCache> {
    let Some(redis) = &config.redis else {
        info!("No Redis configured, using in-process response cache");
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(redis).await {
        Ok(cache) => {
            info!("Connected to Redis response cache");
            Arc::new(cache)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, falling back to in-process response cache");
            Arc::new(MemoryCache::new())
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    use handlers::{accounts, admin, articles, comments, follows, health, interactions, messages};

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/auth/me", get(accounts::me))
        .route("/users/me", get(accounts::me).put(accounts::update_profile))
        .route("/users/{id}", get(accounts::profile))

        // Articles
        .route("/articles", get(articles::list).post(articles::create))
        .route("/articles/drafts", get(articles::drafts))
        .route(
            "/articles/{id}",
            get(articles::detail).put(articles::update).delete(articles::delete),
        )
        .route("/articles/{id}/stats", get(articles::stats))
        .route("/articles/{id}/toggle-publish", post(articles::toggle_publish))

        // Comments
        .route("/comments", post(comments::create))
        .route("/comments/{id}", delete(comments::delete))
        .route("/comments/by-article/{article_id}", get(comments::list))

        // Likes & favorites
        .route("/interact/like/{article_id}", post(interactions::toggle_like))
        .route("/interact/fav/{article_id}", post(interactions::toggle_favorite))
        .route("/interact/status/{article_id}", get(interactions::status))
        .route("/interact/batch-status", get(interactions::batch_status))
        .route("/interact/favorites", get(interactions::favorites))

        // Follows
        .route("/follows/{user_id}", post(follows::follow).delete(follows::unfollow))
        .route("/follows/{user_id}/is-following", get(follows::is_following))
        .route("/follows/{user_id}/following", get(follows::following))
        .route("/follows/{user_id}/followers", get(follows::followers))
        .route("/follows/{user_id}/stats", get(follows::stats))

        // Direct messages
        .route("/messages", post(messages::send))
        .route("/messages/with/{user_id}", get(messages::conversation))
        .route("/messages/conversations", get(messages::conversations))
        .route("/messages/read", put(messages::mark_read))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/messages/{id}", delete(messages::recall))

        // Administration
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/users/{id}/role", put(admin::set_role))
        .route("/admin/create-blogger", post(admin::create_blogger))
        .route("/admin/articles", get(admin::list_articles))
        .route("/admin/articles/{id}", delete(admin::delete_article))
        .route("/admin/articles/{id}/toggle-publish", post(admin::toggle_publish));

    let rate_limit = state.config.rate_limit.clone();
    let request_timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests.max(1);

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests));

    if rate_limit.enabled {
        let limit = middleware::rate_limit::create_rate_limiter(
            rate_limit.requests_per_second,
            rate_limit.burst,
        );
        router = router.layer(axum::middleware::from_fn(move |request, next| {
            middleware::rate_limit::rate_limit_middleware(request, next, limit.clone())
        }));
    }

    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
