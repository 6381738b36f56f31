//! Router-level tests over the in-memory store and cache

use super::*;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use postforge_common::{cache::MemoryCache, db::MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin-pw";

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        Self::with_config(config).await
    }

    async fn with_config(mut config: AppConfig) -> Self {
        config.auth.admin_username = Some("admin".to_string());
        config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let cache = ArticleCache::new(Arc::new(MemoryCache::new()), &config.cache);
        let config = Arc::new(config);
        let state = AppState::new(config.clone(), store, cache);
        state.services.accounts.ensure_admin(&config.auth).await.unwrap();

        Self {
            router: create_router(state),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "secret-pw",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn publish(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/articles",
                Some(token),
                json!({ "title": title, "content": "body", "published": true }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["cache"]["backend"], "memory");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;
    let (user_id, token) = app.register("carol").await;

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["role"], "viewer");
    assert_eq!(body["email"], "carol@example.com");

    let (status, body) = app.get(&format!("/api/users/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("email").is_none());

    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "carol", "password": "wrong-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "carol", "email": "other@example.com", "password": "secret-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_article_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.login("admin", ADMIN_PASSWORD).await;
    let (_, viewer) = app.register("dave").await;

    let (status, body) = app
        .post("/api/articles", Some(&viewer), json!({ "title": "Nope", "content": "x" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (status, body) = app
        .post("/api/articles", Some(&admin), json!({ "title": "", "content": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let id = app.publish(&admin, "Hello").await;

    let (status, body) = app.get("/api/articles?sort_by=hot", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_elements"], 1);
    assert_eq!(body["content"][0]["id"], id);
    assert!(body["content"][0]["hot_score"].as_f64().unwrap() > 0.0);

    let (status, body) = app.get(&format!("/api/articles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view_count"], 1);
    assert_eq!(body["author"]["username"], "admin");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/articles/{}", id),
            Some(&admin),
            Some(json!({ "title": "Hello again" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Hello again");

    let (_, body) = app.get(&format!("/api/articles/{}", id), None).await;
    assert_eq!(body["title"], "Hello again");

    let (status, body) = app
        .post(&format!("/api/articles/{}/toggle-publish", id), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["published"], false);

    let (status, _) = app.get(&format!("/api/articles/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/articles/drafts", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"][0]["id"], id);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/articles/{}", id), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/articles/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/api/articles/{}/stats", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ARTICLE_NOT_FOUND");
}

#[tokio::test]
async fn test_interactions_refresh_cached_lists() {
    let app = TestApp::new().await;
    let admin = app.login("admin", ADMIN_PASSWORD).await;
    let (_, viewer) = app.register("erin").await;
    let id = app.publish(&admin, "Popular").await;

    // warm the list cache
    let (_, body) = app.get("/api/articles", Some(&viewer)).await;
    assert_eq!(body["content"][0]["like_count"], 0);
    assert_eq!(body["content"][0]["liked"], false);

    let (status, body) = app
        .post(&format!("/api/interact/like/{}", id), Some(&viewer), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "liked": true, "favorited": false, "like_count": 1, "favorite_count": 0 }));

    let (_, body) = app.get("/api/articles", Some(&viewer)).await;
    assert_eq!(body["content"][0]["like_count"], 1);
    assert_eq!(body["content"][0]["liked"], true);

    let (_, body) = app.get("/api/articles", None).await;
    assert_eq!(body["content"][0]["liked"], false);

    let (status, _) = app
        .post(&format!("/api/interact/fav/{}", id), Some(&viewer), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .get(&format!("/api/interact/batch-status?article_ids={},9999", id), Some(&viewer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[id.to_string()]["favorited"], true);
    assert!(body.get("9999").is_none());

    let (status, body) = app.get("/api/interact/favorites", Some(&viewer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"][0]["article_id"], id);

    let (status, _) = app
        .post("/api/interact/like/9999", Some(&viewer), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(&format!("/api/interact/like/{}", id), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_comments() {
    let app = TestApp::new().await;
    let admin = app.login("admin", ADMIN_PASSWORD).await;
    let (_, viewer) = app.register("frank").await;
    let (_, other) = app.register("grace").await;
    let id = app.publish(&admin, "Discuss").await;

    let (status, body) = app
        .post("/api/comments", Some(&viewer), json!({ "article_id": id, "content": "First" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["id"].as_i64().unwrap();
    assert_eq!(body["author"]["username"], "frank");

    let (status, _) = app
        .post("/api/comments", Some(&viewer), json!({ "article_id": id, "content": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/articles/{}", id), None).await;
    assert_eq!(body["comment_count"], 1);

    let (status, body) = app.get(&format!("/api/comments/by-article/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"][0]["content"], "First");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/comments/{}", comment_id), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/comments/{}", comment_id), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get(&format!("/api/articles/{}", id), None).await;
    assert_eq!(body["comment_count"], 0);
}

#[tokio::test]
async fn test_follows() {
    let app = TestApp::new().await;
    let (heidi_id, heidi) = app.register("heidi").await;
    let (ivan_id, ivan) = app.register("ivan").await;

    let (status, _) = app
        .post(&format!("/api/follows/{}", ivan_id), Some(&heidi), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(&format!("/api/follows/{}", ivan_id), Some(&heidi), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(&format!("/api/follows/{}", heidi_id), Some(&heidi), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .get(&format!("/api/follows/{}/is-following", ivan_id), Some(&heidi))
        .await;
    assert_eq!(body["following"], true);

    let (_, body) = app.get(&format!("/api/follows/{}/stats", ivan_id), None).await;
    assert_eq!(body, json!({ "following_count": 0, "followers_count": 1 }));

    let (_, body) = app.get(&format!("/api/follows/{}/followers", ivan_id), None).await;
    assert_eq!(body["content"][0]["user"]["username"], "heidi");

    let (_, body) = app.get(&format!("/api/follows/{}/following", heidi_id), None).await;
    assert_eq!(body["content"][0]["user"]["username"], "ivan");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/follows/{}", ivan_id), Some(&heidi), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/follows/{}", ivan_id), Some(&ivan), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst = 1;
    let app = TestApp::with_config(config).await;

    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new().await;
    let (user_id, token) = app.register("gina").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users/me",
            Some(&token),
            Some(json!({ "display_name": " Gina ", "signature": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["display_name"], "Gina");
    assert_eq!(body["signature"], "hello");

    let (status, body) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["email"], "gina@example.com");

    let (status, body) = app
        .send(Method::PUT, "/api/users/me", Some(&token), Some(json!({ "display_name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "display_name");

    let (status, _) = app
        .send(Method::PUT, "/api/users/me", None, Some(json!({ "signature": "x" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_direct_messages() {
    let app = TestApp::new().await;
    let (hana_id, hana) = app.register("hana").await;
    let (ivan_id, ivan) = app.register("ivan").await;

    let (status, body) = app
        .post("/api/messages", Some(&hana), json!({ "receiver_id": ivan_id, "content": "hi ivan" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let first_id = body["id"].as_i64().unwrap();
    assert_eq!(body["read"], false);

    let (status, body) = app
        .post("/api/messages", Some(&hana), json!({ "receiver_id": hana_id, "content": "me" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "receiver_id");

    let (status, body) = app
        .post("/api/messages", Some(&hana), json!({ "receiver_id": 4242, "content": "anyone?" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");

    app.post("/api/messages", Some(&ivan), json!({ "receiver_id": hana_id, "content": "hey" }))
        .await;

    let (status, body) = app.get("/api/messages/unread-count", Some(&ivan)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (_, body) = app.get(&format!("/api/messages/with/{}", hana_id), Some(&ivan)).await;
    assert_eq!(body["total_elements"], 2);
    assert_eq!(body["content"][0]["content"], "hey");

    let (_, body) = app.get("/api/messages/conversations", Some(&ivan)).await;
    assert_eq!(body["content"][0]["peer_id"], hana_id);
    assert_eq!(body["content"][0]["unread_count"], 1);

    let (status, body) = app
        .send(Method::PUT, "/api/messages/read", Some(&ivan), Some(json!({ "sender_id": hana_id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
    let (_, body) = app.get("/api/messages/unread-count", Some(&ivan)).await;
    assert_eq!(body["count"], 0);

    let uri = format!("/api/messages/{}", first_id);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&ivan), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&hana), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&hana), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get(&format!("/api/messages/with/{}", ivan_id), Some(&hana)).await;
    assert_eq!(body["total_elements"], 1);

    let (status, _) = app.get("/api/messages/conversations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes() {
    let app = TestApp::new().await;
    let admin = app.login("admin", ADMIN_PASSWORD).await;
    let (jane_id, jane) = app.register("jane").await;

    let (status, _) = app.get("/api/admin/users", Some(&jane)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_elements"], 2);
    assert_eq!(body["content"][1]["email"], "jane@example.com");

    let role_uri = format!("/api/admin/users/{}/role", jane_id);
    let (status, _) = app
        .send(Method::PUT, &role_uri, Some(&admin), Some(json!({ "role": "superuser" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = app
        .send(Method::PUT, &role_uri, Some(&admin), Some(json!({ "role": "BLOGGER" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "blogger");

    // the old token still carries the viewer role
    let (status, _) = app
        .post("/api/articles", Some(&jane), json!({ "title": "Early", "content": "x" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let jane = app.login("jane", "secret-pw").await;
    let article_id = app.publish(&jane, "Promoted").await;

    let (status, body) = app
        .post(
            "/api/admin/create-blogger",
            Some(&admin),
            json!({ "username": "kim", "email": "kim@example.com", "password": "secret-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "display_name");

    let (status, body) = app
        .post(
            "/api/admin/create-blogger",
            Some(&admin),
            json!({
                "username": "kim",
                "email": "kim@example.com",
                "password": "secret-pw",
                "display_name": "Kim",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "blogger");

    let toggle_uri = format!("/api/admin/articles/{}/toggle-publish", article_id);
    let (status, body) = app.post(&toggle_uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["published"], false);

    let (_, body) = app.get("/api/admin/articles", Some(&admin)).await;
    assert_eq!(body["total_elements"], 1);
    assert_eq!(body["content"][0]["author"]["username"], "jane");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admin/users/{}", jane_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/api/admin/articles", Some(&admin)).await;
    assert_eq!(body["total_elements"], 0);
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admin/articles/{}", article_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
