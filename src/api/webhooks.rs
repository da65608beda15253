//! Payment provider webhook.
//!
//! - POST `/webhooks` - Receive account events from Polka (`Authorization: ApiKey`)

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, parse_uuid};
use super::json::ApiJson;
use crate::auth::{HasServiceKey, ServiceAuth};
use crate::db::Database;

/// The only event this service acts on.
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Clone)]
pub struct WebhooksState {
    pub db: Database,
    pub polka_key: Arc<str>,
}

impl HasServiceKey for WebhooksState {
    fn service_key(&self) -> &str {
        &self.polka_key
    }
}

pub fn router(state: WebhooksState) -> Router {
    Router::new()
        .route("/webhooks", post(polka_webhook))
        .with_state(state)
}

#[derive(Deserialize)]
struct WebhookRequest {
    event: String,
    data: WebhookData,
}

#[derive(Deserialize)]
struct WebhookData {
    user_id: String,
}

async fn polka_webhook(
    State(state): State<WebhooksState>,
    _service: ServiceAuth,
    ApiJson(payload): ApiJson<WebhookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = parse_uuid(&payload.data.user_id, "user ID")?;

    let upgraded = state
        .db
        .users()
        .upgrade_to_red(user_id)
        .await
        .db_err("Failed to upgrade user")?;

    if !upgraded {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");
    Ok(StatusCode::NO_CONTENT)
}
