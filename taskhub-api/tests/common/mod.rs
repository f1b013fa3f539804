/// Common test utilities for integration tests
///
/// Provides shared infrastructure for driving the full router in-process:
/// - Test database setup (guarded on DATABASE_URL; tests skip without it)
/// - Request/response helpers
/// - Register/login shortcuts

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use tower::ServiceExt as _;
use uuid::Uuid;

/// Test context containing the database pool and a ready router
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context against the database in DATABASE_URL
    ///
    /// Returns None (and the test should return early) when DATABASE_URL
    /// is not set, so the integration suite is skipped on machines without
    /// a provisioned Postgres.
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping integration test");
            return None;
        };

        let db = PgPool::connect(&url)
            .await
            .expect("connect to test database");

        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "integration-test-secret-key-32-bytes!!".to_string(),
                expires_minutes: 60,
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(Self { db, app })
    }
}

/// Generates an email that won't collide across test runs
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

/// Password accepted by the strength validator
pub const TEST_PASSWORD: &str = "Password123!";

/// Sends a request through the router and returns (status, parsed body)
///
/// An empty body (e.g. from a 204) parses as Value::Null.
pub async fn send(
    ctx: &TestContext,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Registers a user and logs in, returning (user record, access token)
pub async fn register_and_login(ctx: &TestContext, email: &str) -> (Value, String) {
    let (status, user) = send(
        ctx,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": "Test User",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", user);

    let token = login(ctx, email).await;

    (user, token)
}

/// Logs in and returns the access token
pub async fn login(ctx: &TestContext, email: &str) -> String {
    let (status, body) = send(
        ctx,
        "POST",
        "/auth/login",
        None,
        Some(json!({
            "email": email,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "login failed: {}", body);

    body["accessToken"]
        .as_str()
        .expect("accessToken in login response")
        .to_string()
}

/// Creates a task and returns its JSON representation
pub async fn create_task(
    ctx: &TestContext,
    token: &str,
    title: &str,
    status: &str,
    labels: &[&str],
) -> Value {
    let labels: Vec<Value> = labels.iter().map(|name| json!({ "name": name })).collect();

    let (code, body) = send(
        ctx,
        "POST",
        "/tasks",
        Some(token),
        Some(json!({
            "title": title,
            "description": format!("{} description", title),
            "status": status,
            "labels": labels,
        })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED, "create task failed: {}", body);

    body
}
