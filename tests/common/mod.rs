#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chirpy::cli::Platform;
use chirpy::{ServerConfig, create_app, db::Database};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";
pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

pub struct TestOptions {
    pub platform: Platform,
    pub filepath_root: PathBuf,
    pub login_attempts_per_minute: u32,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            platform: Platform::Dev,
            filepath_root: PathBuf::from("."),
            login_attempts_per_minute: 1000,
        }
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(TestOptions::default()).await
}

pub async fn create_test_app_with(options: TestOptions) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        polka_key: POLKA_KEY.to_string(),
        platform: options.platform,
        filepath_root: options.filepath_root,
        login_attempts_per_minute: options.login_attempts_per_minute,
    };
    TestApp {
        router: create_app(&config),
        db,
    }
}

/// Build a request with an optional JSON body and `Authorization` header value.
pub fn request(method: &str, uri: &str, authorization: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

impl TestApp {
    /// Send a request and return the status and body, parsed as JSON when possible.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .send(request(
                "POST",
                "/api/users",
                None,
                Some(json!({ "email": email, "password": password })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);
        body
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ))
        .await
    }

    /// Create a user and log in. Returns (user id, access token, refresh token).
    pub async fn signed_in_user(&self, email: &str) -> (String, String, String) {
        self.create_user(email, "correct horse battery staple").await;
        let (status, body) = self.login(email, "correct horse battery staple").await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        (
            body["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}
