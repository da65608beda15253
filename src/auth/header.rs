//! `Authorization` header parsing.
//!
//! Two schemes share one parser: `Bearer` for user access and refresh tokens, and
//! `ApiKey` for service credentials. A value presented under one scheme is never
//! accepted where the other is expected.

use axum::http::{HeaderMap, header::AUTHORIZATION};

/// Credential scheme expected in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScheme {
    /// End-user session token
    Bearer,
    /// Third-party service key
    ApiKey,
}

impl AuthScheme {
    /// Literal prefix, including the separating space. Matching is case-sensitive.
    pub fn prefix(self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer ",
            AuthScheme::ApiKey => "ApiKey ",
        }
    }
}

/// Pull the credential for `scheme` out of the `Authorization` header.
pub(crate) fn extract_credential(headers: &HeaderMap, scheme: AuthScheme) -> Result<&str, HeaderError> {
    let value = headers.get(AUTHORIZATION).ok_or(HeaderError::Missing)?;
    if value.is_empty() {
        return Err(HeaderError::Empty);
    }

    let value = value.to_str().map_err(|_| HeaderError::Malformed)?;
    let credential = value
        .strip_prefix(scheme.prefix())
        .ok_or(HeaderError::Malformed)?
        .trim_start_matches(' ');

    if credential.is_empty() {
        return Err(HeaderError::Malformed);
    }
    Ok(credential)
}

/// Extract a `Bearer` token.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, HeaderError> {
    extract_credential(headers, AuthScheme::Bearer)
}

/// Extract an `ApiKey` credential.
pub(crate) fn api_key(headers: &HeaderMap) -> Result<&str, HeaderError> {
    extract_credential(headers, AuthScheme::ApiKey)
}

/// Errors from `Authorization` header parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    Missing,
    Empty,
    Malformed,
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderError::Missing => write!(f, "Authorization header is missing"),
            HeaderError::Empty => write!(f, "Authorization header is empty"),
            HeaderError::Malformed => write!(f, "Authorization header is malformed"),
        }
    }
}

impl std::error::Error for HeaderError {}
