mod common;

use axum::http::StatusCode;
use common::{POLKA_KEY, create_test_app, request};
use serde_json::json;

fn api_key() -> String {
    format!("ApiKey {}", POLKA_KEY)
}

fn upgrade_event(user_id: &str) -> serde_json::Value {
    json!({ "event": "user.upgraded", "data": { "user_id": user_id } })
}

#[tokio::test]
async fn test_upgrade_user() {
    let app = create_test_app().await;
    let (user_id, _, _) = app.signed_in_user("alice@example.com").await;

    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key()),
            Some(upgrade_event(&user_id)),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .login("alice@example.com", "correct horse battery staple")
        .await;
    assert_eq!(body["is_chirpy_red"], true);
}

#[tokio::test]
async fn test_other_events_are_ignored() {
    let app = create_test_app().await;
    let (user_id, _, _) = app.signed_in_user("alice@example.com").await;

    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key()),
            Some(json!({ "event": "user.payment_failed", "data": { "user_id": user_id } })),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let user = app
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_chirpy_red);
}

#[tokio::test]
async fn test_unknown_user() {
    let app = create_test_app().await;

    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key()),
            Some(upgrade_event(&uuid::Uuid::new_v4().to_string())),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_key_rejections() {
    let app = create_test_app().await;
    let (user_id, access_token, _) = app.signed_in_user("alice@example.com").await;
    let event = upgrade_event(&user_id);

    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            None,
            Some(event.clone()),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some("ApiKey wrong-key"),
            Some(event.clone()),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A user session is not a service credential, even with the right value.
    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some(&format!("Bearer {}", POLKA_KEY)),
            Some(event.clone()),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some(&format!("Bearer {}", access_token)),
            Some(event),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let user = app
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_chirpy_red);
}

#[tokio::test]
async fn test_malformed_event_body() {
    let app = create_test_app().await;

    let (status, body) = app
        .send(request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key()),
            Some(json!({ "event": "user.upgraded" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}
