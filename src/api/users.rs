//! User registration and credential updates.
//!
//! - POST `/` - Create a user
//! - PUT `/` - Change the logged-in user's e-mail and password

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, ResultExt};
use super::json::ApiJson;
use crate::auth::{Auth, Authenticator};
use crate::db::{Database, User, is_unique_violation};
use crate::impl_has_auth_backend;
use crate::password::hash_password_blocking;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub auth: Authenticator,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/", post(create_user).put(update_user))
        .with_state(state)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    email: String,
    password: String,
}

impl CredentialsRequest {
    /// Trimmed e-mail, after checking neither field is empty.
    fn validate(&self) -> Result<&str, ApiError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ApiError::bad_request("Email cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(ApiError::bad_request("Password cannot be empty"));
        }
        Ok(email)
    }
}

/// Public view of a user. Never includes the password hash.
#[derive(Serialize)]
pub(super) struct UserResponse {
    pub id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

async fn create_user(
    State(state): State<UsersState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.validate()?.to_string();

    let hashed = hash_password_blocking(payload.password)
        .await
        .internal_err("Failed to hash password")?;

    let user = match state.db.users().create(&email, &hashed).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn update_user(
    State(state): State<UsersState>,
    Auth(user_id): Auth,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.validate()?.to_string();

    // The token can outlive its user.
    if state
        .db
        .users()
        .get_by_id(user_id)
        .await
        .db_err("Failed to look up user")?
        .is_none()
    {
        return Err(ApiError::unauthorized("User no longer exists"));
    }

    let hashed = hash_password_blocking(payload.password)
        .await
        .internal_err("Failed to hash password")?;

    let user = match state
        .db
        .users()
        .update_credentials(user_id, &email, &hashed)
        .await
    {
        Ok(Some(user)) => user,
        // Deleted between the lookup and the update.
        Ok(None) => return Err(ApiError::unauthorized("User no longer exists")),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to update user", e)),
    };

    Ok(Json(UserResponse::from(user)))
}
