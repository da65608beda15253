mod chirps;
mod error;
mod json;
mod tokens;
mod users;
mod webhooks;

use axum::{Router, http::header, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::auth::{Authenticator, RefreshTokenManager};
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;

pub use chirps::{MAX_CHIRP_LENGTH, clean_body, validate_chirp};
pub use error::{ApiError, ResultExt, parse_uuid};
pub use webhooks::USER_UPGRADED_EVENT;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    auth: Authenticator,
    polka_key: Arc<str>,
    rate_limit_config: Arc<RateLimitConfig>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        auth: auth.clone(),
    };

    let chirps_state = chirps::ChirpsState {
        db: db.clone(),
        auth: auth.clone(),
    };

    let tokens_state = tokens::TokensState {
        db: db.clone(),
        auth,
        refresh: RefreshTokenManager::new(db.tokens()),
        rate_limit_config,
    };

    let webhooks_state = webhooks::WebhooksState { db, polka_key };

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/users", users::router(users_state))
        .nest("/chirps", chirps::router(chirps_state))
        .nest("/polka", webhooks::router(webhooks_state))
        .merge(tokens::router(tokens_state))
}

async fn healthz() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "OK")
}
