/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation with a live session token
/// - Request/response helpers for exercising the router in-process

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

use taskdeck_api::app::{build_router, AppState};
use taskdeck_api::config::Config;
use taskdeck_api::email::Mailer;
use taskdeck_shared::auth::sessions;
use taskdeck_shared::db::migrations;
use taskdeck_shared::models::task::{CreateTask, Task};
use taskdeck_shared::models::user::{CreateUser, User};

/// Known plaintext for every user the test context creates
pub const TEST_PASSWORD: &str = "Horse-Battery-42";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh user and session
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Create the database on a fresh server, then connect
        migrations::ensure_database_exists(&config.database.url).await?;
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        // Create test user
        let user = User::create(
            &db,
            CreateUser {
                name: "Test User".to_string(),
                email: unique_email(),
                password: TEST_PASSWORD.to_string(),
                age: Some(30),
            },
        )
        .await?;

        // Issue a live session token
        let token = sessions::issue(&db, &config.jwt.secret, user.id).await?;

        // Build app with the mailer disabled
        let state = AppState::new(db.clone(), config.clone(), Mailer::disabled());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            token,
        })
    }

    /// Returns authorization header value for the context user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Creates a second user with its own live session
    pub async fn create_secondary_user(&self) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: "Other User".to_string(),
                email: unique_email(),
                password: TEST_PASSWORD.to_string(),
                age: None,
            },
        )
        .await?;

        let token = sessions::issue(&self.db, &self.config.jwt.secret, user.id).await?;
        Ok((user, token))
    }

    /// Cleans up test data (cascades to the user's tasks)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.user.id).await?;
        Ok(())
    }
}

/// Unique email per test run; the users table enforces uniqueness
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4())
}

/// Sends a JSON request through the router
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(auth) = auth {
        request = request.header("authorization", auth);
    }

    let request = request.body(Body::from(body.to_string())).unwrap();
    app.clone().call(request).await.unwrap()
}

/// Sends a bodyless request through the router
pub async fn send_empty(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);

    if let Some(auth) = auth {
        request = request.header("authorization", auth);
    }

    let request = request.body(Body::empty()).unwrap();
    app.clone().call(request).await.unwrap()
}

/// Reads a response body as JSON
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Reads a response body as raw bytes
pub async fn read_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Asserts a status, panicking with the body text on mismatch
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> Response<Body> {
    let status = response.status();
    if status != expected {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        panic!(
            "Expected {}, got {}: {}",
            expected,
            status,
            String::from_utf8_lossy(&body)
        );
    }
    response
}

/// Helper to create a task directly in the store
pub async fn create_test_task(
    ctx: &TestContext,
    description: &str,
    completed: bool,
) -> anyhow::Result<Task> {
    let task = Task::create(
        &ctx.db,
        ctx.user.id,
        CreateTask {
            description: description.to_string(),
            completed: Some(completed),
        },
    )
    .await?;

    Ok(task)
}

/// Builds a multipart body carrying one `avatar` field
///
/// Returns the content-type header value and the encoded body.
pub fn multipart_avatar(data: &[u8]) -> (String, Vec<u8>) {
    let boundary = format!("taskdeck-test-{}", Uuid::new_v4().simple());

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"avatar\"; filename=\"avatar.bin\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
