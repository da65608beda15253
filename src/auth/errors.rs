//! Authentication rejection type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::header::HeaderError;
use crate::jwt::JwtError;

/// Why a request was turned away before reaching its handler.
#[derive(Debug)]
pub enum AuthRejection {
    /// The `Authorization` header is missing or unusable (400)
    Header(HeaderError),
    /// The access token did not validate (401, or 500 for internal failures)
    Token(JwtError),
    /// The service key did not match (401)
    InvalidApiKey,
}

impl AuthRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::Header(_) => StatusCode::BAD_REQUEST,
            AuthRejection::Token(e) if !e.is_rejection() => StatusCode::INTERNAL_SERVER_ERROR,
            AuthRejection::Token(_) | AuthRejection::InvalidApiKey => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthRejection::Header(HeaderError::Missing) => "Missing authorization header",
            AuthRejection::Header(_) => "Malformed authorization header",
            AuthRejection::Token(e) if !e.is_rejection() => "Internal server error",
            AuthRejection::Token(JwtError::Expired) => "Token has expired",
            AuthRejection::Token(_) => "Invalid token",
            AuthRejection::InvalidApiKey => "Invalid API key",
        }
    }
}

impl From<HeaderError> for AuthRejection {
    fn from(e: HeaderError) -> Self {
        AuthRejection::Header(e)
    }
}

impl From<JwtError> for AuthRejection {
    fn from(e: JwtError) -> Self {
        AuthRejection::Token(e)
    }
}

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRejection::Header(e) => write!(f, "{}", e),
            AuthRejection::Token(e) => write!(f, "{}", e),
            AuthRejection::InvalidApiKey => write!(f, "Invalid API key"),
        }
    }
}

impl std::error::Error for AuthRejection {}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication failed internally");
        } else {
            tracing::debug!(reason = %self, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
