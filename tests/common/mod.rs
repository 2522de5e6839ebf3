#![allow(dead_code)]

use std::str::FromStr;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tower::ServiceExt;

use hireloop::api::{create_router, AppState};
use hireloop::config::Config;
use hireloop::db::{self, ProfileRepository, Role, SessionRepository, UserRepository};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Keeps the resume bucket alive for the test's duration
    pub storage_dir: TempDir,
}

/// Fresh app over a private in-memory database and temporary bucket.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let storage_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid sqlite url")
        .foreign_keys(true);
    // One long-lived connection: each in-memory connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Migrations failed");

    let mut config = Config {
        storage_dir: storage_dir.path().to_path_buf(),
        max_upload_bytes: 64 * 1024,
        ..Config::default()
    };
    customize(&mut config);

    let state = AppState::new(pool, config);
    let router = create_router(state.clone());

    TestApp {
        router,
        state,
        storage_dir,
    }
}

pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestApp {
    /// Insert an identity, a live session and (optionally) a profile directly,
    /// bypassing password hashing.
    pub async fn seed_user(&self, email: &str, role: Role, verified: bool) -> TestUser {
        let user = self.seed_identity(email, Some(role.as_str()), verified).await;
        ProfileRepository::ensure(&self.state.db, &user.id, email, None, role)
            .await
            .expect("Failed to create profile");
        user
    }

    /// Identity + session, no profile row.
    pub async fn seed_identity(
        &self,
        email: &str,
        role_claim: Option<&str>,
        verified: bool,
    ) -> TestUser {
        let user = UserRepository::create(
            &self.state.db,
            email,
            &[0u8; 32],
            &[0u8; 16],
            role_claim,
            verified,
        )
        .await
        .expect("Failed to create user");
        let session = SessionRepository::create(&self.state.db, &user.id, 1)
            .await
            .expect("Failed to create session");
        TestUser {
            id: user.id,
            token: session.token,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(json_request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(json_request(Method::POST, uri, token, Some(body)))
            .await
    }

    /// Raw response for a page navigation, so redirects can be inspected.
    pub async fn navigate(&self, uri: &str, token: Option<&str>) -> (StatusCode, Option<String>) {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .expect("Router failed");
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (response.status(), location)
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
