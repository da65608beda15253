//! Request authentication and the axum extractors built on it.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::errors::AuthRejection;
use super::header::{api_key, bearer_token};
use super::state::{HasAuthBackend, HasServiceKey};
use crate::jwt::JwtConfig;

/// Gate for protected routes: a bearer access token in, a user id out.
///
/// Only the signing keys are held, so one instance is shared by every router state.
#[derive(Clone)]
pub struct Authenticator {
    jwt: Arc<JwtConfig>,
}

impl Authenticator {
    pub fn new(jwt: Arc<JwtConfig>) -> Self {
        Self { jwt }
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Extract and validate the bearer token in `headers`.
    ///
    /// Header problems reject with 400 and token problems with 401. Each failure returns
    /// at once, so a rejected request never yields a user id.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthRejection> {
        let token = bearer_token(headers)?;
        let user_id = self.jwt.validate_access_token(token)?;
        Ok(user_id)
    }
}

/// Check an `ApiKey` credential against the expected service key.
pub(crate) fn authenticate_service(headers: &HeaderMap, expected: &str) -> Result<(), AuthRejection> {
    let key = api_key(headers)?;
    if !constant_time_eq(key.as_bytes(), expected.as_bytes()) {
        return Err(AuthRejection::InvalidApiKey);
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Extractor for endpoints that require a logged-in user.
///
/// Holds the id of the user the access token was issued to. A rejection short-circuits
/// before the handler body runs.
pub struct Auth(pub Uuid);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state.authenticator().authenticate(&parts.headers).map(Auth)
    }
}

/// Extractor for endpoints called by the payment provider with `Authorization: ApiKey`.
pub struct ServiceAuth;

impl<S> FromRequestParts<S> for ServiceAuth
where
    S: HasServiceKey + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_service(&parts.headers, state.service_key()).map(|()| ServiceAuth)
    }
}
