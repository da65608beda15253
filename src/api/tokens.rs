//! Session endpoints.
//!
//! - POST `/login` - Check e-mail and password, issue an access and a refresh token
//! - POST `/refresh` - Exchange a refresh token for a new access token
//! - POST `/revoke` - Revoke a refresh token

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::error::{ApiError, ResultExt};
use super::json::ApiJson;
use super::users::UserResponse;
use crate::auth::{Authenticator, RefreshError, RefreshTokenManager, bearer_token};
use crate::db::{Database, TokenStore};
use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, access_token_ttl};
use crate::password::{PasswordError, verify_password_blocking};
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

/// Same message for unknown e-mail and wrong password.
const LOGIN_FAILED: &str = "Incorrect email or password";

#[derive(Clone)]
pub struct TokensState {
    pub db: Database,
    pub auth: Authenticator,
    pub refresh: RefreshTokenManager<TokenStore>,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

pub fn router(state: TokensState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    let session_router = Router::new()
        .route("/refresh", post(refresh))
        .route("/revoke", post(revoke))
        .with_state(state);

    Router::new().merge(login_router).merge(session_router)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
    /// Requested access token lifetime. Anything but an integer in range gets the default.
    #[serde(default)]
    expires_in_seconds: Option<serde_json::Value>,
}

impl LoginRequest {
    fn requested_ttl(&self) -> Option<i64> {
        self.expires_in_seconds.as_ref().and_then(|v| v.as_i64())
    }
}

#[derive(Serialize)]
struct LoginResponse {
    #[serde(flatten)]
    user: UserResponse,
    token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    token: String,
}

async fn login(
    State(state): State<TokensState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .get_by_email(payload.email.trim())
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized(LOGIN_FAILED))?;

    let ttl = access_token_ttl(payload.requested_ttl());

    match verify_password_blocking(user.hashed_password.clone(), payload.password).await {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::unauthorized(LOGIN_FAILED));
        }
        Err(e) => return Err(ApiError::internal_error("Failed to verify password", e)),
    }

    let access = state
        .auth
        .jwt()
        .generate_access_token(user.id, ttl)
        .internal_err("Failed to generate access token")?;

    let refresh_token = state
        .refresh
        .issue(user.id)
        .await
        .internal_err("Failed to issue refresh token")?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: UserResponse::from(user),
        token: access.token,
        refresh_token,
    }))
}

fn refresh_rejection(e: RefreshError, context: &str) -> ApiError {
    match e {
        RefreshError::NotFound | RefreshError::Expired | RefreshError::Revoked => {
            tracing::debug!(reason = %e, "{}", context);
            ApiError::unauthorized("Invalid refresh token")
        }
        RefreshError::TimeError | RefreshError::Store(_) => ApiError::internal_error(context, e),
    }
}

async fn refresh(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let user_id = state
        .refresh
        .exchange(token)
        .await
        .map_err(|e| refresh_rejection(e, "Refresh token exchange failed"))?;

    let access = state
        .auth
        .jwt()
        .generate_access_token(user_id, Duration::from_secs(ACCESS_TOKEN_DURATION_SECS))
        .internal_err("Failed to generate access token")?;

    Ok(Json(RefreshResponse {
        token: access.token,
    }))
}

async fn revoke(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers).map_err(|e| ApiError::bad_request(e.to_string()))?;

    match state.refresh.revoke(token).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RefreshError::NotFound) => Err(ApiError::not_found("Refresh token not found")),
        Err(e) => Err(ApiError::internal_error("Failed to revoke refresh token", e)),
    }
}
