//! API integration tests.
//!
//! The router runs against the in-memory store with the auth middleware in
//! place, so every request goes through the same path as in production.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use agora_api::{API_PREFIX, AppState, auth_middleware, router as api_router};
use agora_common::{
    Config, MemoryCache, SharedCache,
    config::{
        CacheConfig, DashboardConfig, DatabaseConfig, EmailConfig, LoggingConfig,
        NotificationConfig, QueueConfig, RedisConfig, ServerConfig,
    },
};
use agora_core::{
    JobService, Stores,
    testing::{MemoryStore, RecordingMailer, question_fixture, seeded_store, user_fixture},
};
use agora_db::entities::{
    question::ContentStatus,
    user::{UserRole, UserStatus},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            url: "https://agora.example.com".to_string(),
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://localhost".to_string(),
            prefix: "agora".to_string(),
        },
        cache: CacheConfig::default(),
        email: EmailConfig::default(),
        notification: NotificationConfig::default(),
        queue: QueueConfig::default(),
        dashboard: DashboardConfig {
            version_check_url: "http://127.0.0.1:9/version".to_string(),
            version_check_timeout_secs: 1,
        },
        logging: LoggingConfig::default(),
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    /// Owns the receiving end; enqueueing fails once it is dropped.
    jobs: JobService,
}

impl TestApp {
    async fn new() -> Self {
        let store = seeded_store();
        for (id, role, rank) in [
            ("author", UserRole::User, 100),
            ("reader", UserRole::User, 100),
            ("admin", UserRole::Admin, 1),
        ] {
            store.put_user(user_fixture(id, role, rank)).await;
        }

        let jobs = JobService::new(100);
        let cache: SharedCache = Arc::new(MemoryCache::new());
        let state = AppState::build(
            &Stores::memory(&store),
            cache,
            Arc::new(RecordingMailer::new()),
            jobs.sender(),
            &create_test_config(),
        );
        let router = Router::new()
            .nest(API_PREFIX, api_router())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);

        Self { router, store, jobs }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("{API_PREFIX}{path}")).method("GET");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, path: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(format!("{API_PREFIX}{path}"))
        .method(method)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_siteinfo_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.send(get("/siteinfo", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["reason"], "success");
    assert!(body["data"]["general"].is_object());
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = TestApp::new().await;

    let (status, _) = app.send(get("/nonexistent", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_question_requires_login() {
    let app = TestApp::new().await;
    let body = json!({ "title": "How do lifetimes work?", "content": "Explain please." });

    let (status, body) = app.send(send_json("POST", "/question", None, &body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_question_queues_jobs() {
    let mut app = TestApp::new().await;
    let body = json!({ "title": "How do lifetimes work?", "content": "Explain please." });

    let (status, body) = app
        .send(send_json("POST", "/question", Some("token-author"), &body))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], "author");
    let id = body["data"]["id"].as_str().unwrap();
    assert!(id.starts_with("101"));
    assert!(app.store.question(id).await.is_some());
    assert!(!app.jobs.take_queued().is_empty());
}

#[tokio::test]
async fn test_validation_errors_are_translated() {
    let app = TestApp::new().await;
    let body = json!({ "title": "Hi", "content": "x" });
    let request = Request::builder()
        .uri(format!("{API_PREFIX}/question"))
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer token-author")
        .header("Accept-Language", "zh-CN,zh;q=0.9")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "VALIDATION_ERROR");
    let fields = body["data"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["error_field"], "content");
    assert_eq!(fields[1]["error_field"], "title");
    assert_eq!(fields[1]["error_msg"], "长度不符合要求。");
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri(format!("{API_PREFIX}/answer"))
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer token-author")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_suspended_account_is_rejected() {
    let app = TestApp::new().await;
    let mut user = user_fixture("banned", UserRole::User, 100);
    user.status = UserStatus::Suspended;
    app.store.put_user(user).await;

    let (status, body) = app.send(get("/siteinfo", Some("token-banned"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "ACCOUNT_RESTRICTED");
    assert_eq!(body["data"]["type"], "suspended");
}

#[tokio::test]
async fn test_unknown_token_continues_anonymously() {
    let app = TestApp::new().await;
    app.store.put_question(question_fixture("101q1", "author")).await;

    let (status, body) = app
        .send(get("/question/info?id=101q1", Some("no-such-token")))
        .await;

    assert_eq!(status, StatusCode::OK);
    let actions = body["data"]["actions"].as_array().unwrap();
    assert!(actions.iter().all(|a| a["action"] != "edit"));
}

#[tokio::test]
async fn test_token_in_query_string() {
    let app = TestApp::new().await;
    app.store.put_question(question_fixture("101q1", "author")).await;

    let (status, body) = app
        .send(get("/question/info?id=101q1&Authorization=token-author", None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "101q1");
    let actions = body["data"]["actions"].as_array().unwrap();
    assert!(actions.iter().any(|a| a["action"] == "edit"));
    assert!(actions.iter().any(|a| a["action"] == "delete"));
}

#[tokio::test]
async fn test_vote_then_cancel() {
    let app = TestApp::new().await;
    app.store.put_question(question_fixture("101q1", "author")).await;

    let (status, body) = app
        .send(send_json(
            "POST",
            "/vote/up",
            Some("token-reader"),
            &json!({ "object_id": "101q1" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vote_count"], 1);
    assert_eq!(body["data"]["vote_status"], "up");

    let (status, body) = app
        .send(send_json(
            "POST",
            "/vote/up",
            Some("token-reader"),
            &json!({ "object_id": "101q1", "is_cancel": true }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vote_count"], 0);
    assert!(body["data"]["vote_status"].is_null());
}

#[tokio::test]
async fn test_admin_routes_require_staff() {
    let app = TestApp::new().await;

    let (status, _) = app.send(get("/admin/dashboard", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(get("/admin/dashboard", Some("token-reader"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_dashboard() {
    let app = TestApp::new().await;
    app.store.put_question(question_fixture("101q1", "author")).await;

    let (status, body) = app.send(get("/admin/dashboard", Some("token-admin"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["question_count"], 1);
    assert_eq!(body["data"]["smtp"], false);
    assert_eq!(body["data"]["remote_version"], "");
}

#[tokio::test]
async fn test_report_and_close_flow() {
    let app = TestApp::new().await;
    app.store.put_question(question_fixture("101q1", "author")).await;

    let (status, body) = app
        .send(send_json(
            "POST",
            "/report",
            Some("token-reader"),
            &json!({ "object_id": "101q1", "report_type": "duplicate" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let report_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(get("/admin/reports/page?status=pending", Some("token-admin")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let handle = json!({
        "id": report_id,
        "flagged_type": "needs_close",
        "flagged_content": "Duplicate of an older question",
    });
    let (status, body) = app
        .send(send_json("PUT", "/admin/report", Some("token-admin"), &handle))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let question = app.store.question("101q1").await.unwrap();
    assert_eq!(question.status, ContentStatus::Closed);
    assert_eq!(
        question.close_msg.as_deref(),
        Some("Duplicate of an older question")
    );
}

#[tokio::test]
async fn test_admin_siteinfo_roundtrip() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(get("/admin/siteinfo/unknown", Some("token-admin")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let general = json!({
        "name": "Agora",
        "site_url": "https://agora.example.com/",
        "contact_email": "admin@example.com",
    });
    let (status, body) = app
        .send(send_json(
            "PUT",
            "/admin/siteinfo/general",
            Some("token-admin"),
            &general,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["site_url"], "https://agora.example.com");

    let (status, body) = app
        .send(get("/admin/siteinfo/general", Some("token-admin")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Agora");
}

#[tokio::test]
async fn test_report_reasons_for_answers() {
    let app = TestApp::new().await;

    let (status, body) = app.send(get("/reasons?object_type=answer", None)).await;

    assert_eq!(status, StatusCode::OK);
    let reasons: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["reason_type"].as_str())
        .collect();
    assert!(reasons.contains(&"not_an_answer"));
}
