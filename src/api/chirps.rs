//! Chirp API endpoints.
//!
//! - POST `/` - Create a chirp (authenticated)
//! - GET `/` - List chirps, optionally filtered by author and sorted
//! - GET `/{chirp_id}` - Get a chirp
//! - DELETE `/{chirp_id}` - Soft-delete one of your own chirps

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, ResultExt, parse_uuid};
use super::json::ApiJson;
use crate::auth::{Auth, Authenticator};
use crate::db::{Chirp, ChirpOrder, Database};
use crate::impl_has_auth_backend;

/// Maximum chirp length, in characters.
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSORED: &str = "****";

#[derive(Clone)]
pub struct ChirpsState {
    pub db: Database,
    pub auth: Authenticator,
}

impl_has_auth_backend!(ChirpsState);

pub fn router(state: ChirpsState) -> Router {
    Router::new()
        .route("/", get(list_chirps).post(create_chirp))
        .route("/{chirp_id}", get(get_chirp).delete(delete_chirp))
        .with_state(state)
}

/// Replace profane words with `****`. Words are split on whitespace and re-joined with
/// single spaces.
pub fn clean_body(body: &str) -> String {
    body.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if PROFANE_WORDS.contains(&lower.as_str()) {
                CENSORED
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check length, then censor.
pub fn validate_chirp(body: &str) -> Result<String, ApiError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::bad_request("Chirp is too long"));
    }
    Ok(clean_body(body))
}

#[derive(Deserialize)]
struct CreateChirpRequest {
    body: String,
}

#[derive(Deserialize)]
struct ListChirpsQuery {
    author_id: Option<String>,
    sort: Option<String>,
}

#[derive(Serialize)]
struct ChirpResponse {
    id: Uuid,
    created_at: String,
    updated_at: String,
    body: String,
    user_id: Uuid,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

async fn create_chirp(
    State(state): State<ChirpsState>,
    Auth(user_id): Auth,
    ApiJson(payload): ApiJson<CreateChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = validate_chirp(&payload.body)?;

    let chirp = state
        .db
        .chirps()
        .create(user_id, &body)
        .await
        .db_err("Failed to create chirp")?;

    Ok((StatusCode::CREATED, Json(ChirpResponse::from(chirp))))
}

async fn list_chirps(
    State(state): State<ChirpsState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let author_id = match query.author_id.as_deref() {
        None | Some("") => None,
        Some(id) => Some(parse_uuid(id, "author ID")?),
    };

    let order = match query.sort.as_deref() {
        None | Some("") | Some("asc") => ChirpOrder::Asc,
        Some("desc") => ChirpOrder::Desc,
        Some(_) => return Err(ApiError::bad_request("Sort must be 'asc' or 'desc'")),
    };

    let chirps = state
        .db
        .chirps()
        .list(author_id, order)
        .await
        .db_err("Failed to list chirps")?;

    Ok(Json(
        chirps
            .into_iter()
            .map(ChirpResponse::from)
            .collect::<Vec<_>>(),
    ))
}

async fn get_chirp(
    State(state): State<ChirpsState>,
    Path(chirp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_uuid(&chirp_id, "chirp ID")?;

    let chirp = state
        .db
        .chirps()
        .get(chirp_id)
        .await
        .db_err("Failed to get chirp")?
        .filter(|c| c.deleted_at.is_none())
        .ok_or_else(|| ApiError::not_found("Chirp not found"))?;

    Ok(Json(ChirpResponse::from(chirp)))
}

async fn delete_chirp(
    State(state): State<ChirpsState>,
    Auth(user_id): Auth,
    Path(chirp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp_id = parse_uuid(&chirp_id, "chirp ID")?;

    let chirp = state
        .db
        .chirps()
        .get(chirp_id)
        .await
        .db_err("Failed to get chirp")?
        .filter(|c| c.deleted_at.is_none())
        .ok_or_else(|| ApiError::not_found("Chirp not found"))?;

    if chirp.user_id != user_id {
        return Err(ApiError::forbidden("You can only delete your own chirps"));
    }

    let deleted = state
        .db
        .chirps()
        .soft_delete(chirp_id, user_id)
        .await
        .db_err("Failed to delete chirp")?;

    // Lost a race with another delete of the same chirp.
    if !deleted {
        return Err(ApiError::not_found("Chirp not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_body_censors_profanity() {
        assert_eq!(
            clean_body("I had something interesting for breakfast"),
            "I had something interesting for breakfast"
        );
        assert_eq!(
            clean_body("I hear Mastodon is better than Chirpy. sharbert I need to migrate"),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(
            clean_body("I really need a kerfuffle to go to bed sooner, Fornax !"),
            "I really need a **** to go to bed sooner, **** !"
        );
        assert_eq!(clean_body("KERFUFFLE"), "****");
    }

    #[test]
    fn test_clean_body_only_matches_whole_words() {
        assert_eq!(clean_body("Sharbert! kerfuffles"), "Sharbert! kerfuffles");
    }

    #[test]
    fn test_clean_body_collapses_whitespace() {
        assert_eq!(clean_body("  hello   world  "), "hello world");
    }

    #[test]
    fn test_validate_chirp_length() {
        let exact = "a".repeat(MAX_CHIRP_LENGTH);
        assert_eq!(validate_chirp(&exact).unwrap(), exact);

        let too_long = "a".repeat(MAX_CHIRP_LENGTH + 1);
        assert!(matches!(
            validate_chirp(&too_long),
            Err(ApiError::BadRequest(msg)) if msg == "Chirp is too long"
        ));

        // Length counts characters, not bytes.
        let multibyte = "é".repeat(MAX_CHIRP_LENGTH);
        assert!(validate_chirp(&multibyte).is_ok());
    }
}
