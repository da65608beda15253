mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{bearer, create_test_app, request};
use serde_json::json;

#[tokio::test]
async fn test_healthz() {
    let app = create_test_app().await;

    let (status, body) = app.send(request("GET", "/api/healthz", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_create_user_success() {
    let app = create_test_app().await;

    let json = app.create_user("alice@example.com", "hunter22").await;

    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["is_chirpy_red"], false);
    assert!(uuid::Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
    assert!(json["created_at"].as_str().is_some());
    assert!(json["updated_at"].as_str().is_some());
    assert!(json.get("hashed_password").is_none());
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_create_user_stores_hash_not_password() {
    let app = create_test_app().await;
    app.create_user("alice@example.com", "hunter22").await;

    let user = app
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.hashed_password, "hunter22");
    assert!(user.hashed_password.starts_with("$argon2"));
}

#[tokio::test]
async fn test_create_user_empty_fields() {
    let app = create_test_app().await;

    for body in [
        json!({ "email": "", "password": "hunter22" }),
        json!({ "email": "   ", "password": "hunter22" }),
        json!({ "email": "alice@example.com", "password": "" }),
    ] {
        let (status, _) = app
            .send(request("POST", "/api/users", None, Some(body)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let app = create_test_app().await;
    app.create_user("alice@example.com", "hunter22").await;

    let (status, body) = app
        .send(request(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "alice@example.com", "password": "other" })),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_update_user() {
    let app = create_test_app().await;
    let (user_id, token, _) = app.signed_in_user("alice@example.com").await;

    let (status, body) = app
        .send(request(
            "PUT",
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({ "email": "alice@example.org", "password": "new-password" })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["email"], "alice@example.org");

    // Old credentials no longer work, new ones do.
    let (status, _) = app
        .login("alice@example.com", "correct horse battery staple")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("alice@example.org", "new-password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_user_requires_auth() {
    let app = create_test_app().await;
    let body = json!({ "email": "alice@example.org", "password": "new-password" });

    let (status, _) = app
        .send(request("PUT", "/api/users", None, Some(body.clone())))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(request(
            "PUT",
            "/api/users",
            Some("Bearer not-a-token"),
            Some(body),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_user_email_taken() {
    let app = create_test_app().await;
    app.create_user("bob@example.com", "hunter22").await;
    let (_, token, _) = app.signed_in_user("alice@example.com").await;

    let (status, _) = app
        .send(request(
            "PUT",
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({ "email": "bob@example.com", "password": "new-password" })),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_undecodable_bodies_are_bad_request() {
    let app = create_test_app().await;
    let (_, token, _) = app.signed_in_user("alice@example.com").await;
    let auth = bearer(&token);

    let cases = [
        ("POST", "/api/login", None, json!({ "email": "alice@example.com" })),
        ("POST", "/api/users", None, json!({ "email": 5, "password": "pw" })),
        ("PUT", "/api/users", Some(auth.as_str()), json!({ "email": "a@b.c" })),
        ("POST", "/api/chirps", Some(auth.as_str()), json!({ "text": "hello" })),
        ("POST", "/api/chirps", Some(auth.as_str()), json!({ "body": 42 })),
    ];

    for (method, uri, authorization, body) in cases {
        let (status, response) = app
            .send(request(method, uri, authorization, Some(body.clone())))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {} {}", method, uri, body);
        assert!(
            response["error"].as_str().is_some(),
            "{} {} gave {}",
            method,
            uri,
            response
        );
    }
}

#[tokio::test]
async fn test_body_without_json_content_type() {
    let app = create_test_app().await;

    let plain = Request::builder()
        .method("POST")
        .uri("/api/users")
        .body(Body::from(r#"{"email":"alice@example.com","password":"pw"}"#))
        .unwrap();
    let (status, body) = app.send(plain).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let broken = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
    let (status, body) = app.send(broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    assert!(
        app.db
            .users()
            .get_by_email("alice@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_update_deleted_user() {
    let app = create_test_app().await;
    let (_, token, _) = app.signed_in_user("alice@example.com").await;
    app.db.users().delete_all().await.unwrap();

    let (status, body) = app
        .send(request(
            "PUT",
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({ "email": "alice@example.org", "password": "new-password" })),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User no longer exists");
    assert!(
        app.db
            .users()
            .get_by_email("alice@example.org")
            .await
            .unwrap()
            .is_none()
    );
}
