//! JWT access token generation and validation.
//!
//! Access tokens are stateless HS256 JWTs. Only the HMAC secret is needed to mint or
//! check them, and nothing about them is persisted.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Fixed `iss` claim for every token this service signs.
pub const ISSUER: &str = "chirpy";

/// The only algorithm accepted in a token header.
pub const PINNED_ALGORITHM: Algorithm = Algorithm::HS256;

/// Access token duration: 1 hour
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer, always [`ISSUER`]
    pub iss: String,
    /// Subject (user UUID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Pick the access token lifetime for a caller-requested number of seconds.
///
/// Anything missing or outside `1..=3600` falls back to the one hour default.
pub fn access_token_ttl(requested_secs: Option<i64>) -> Duration {
    match requested_secs {
        Some(secs) if (1..=ACCESS_TOKEN_DURATION_SECS as i64).contains(&secs) => {
            Duration::from_secs(secs as u64)
        }
        _ => Duration::from_secs(ACCESS_TOKEN_DURATION_SECS),
    }
}

/// Current Unix time in whole seconds.
pub fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Signing and verification keys derived from the process-wide secret.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Generate an access token for a user, valid for `ttl` (at least one second).
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<AccessTokenResult, JwtError> {
        let now = unix_now()?;
        let exp = now + ttl.as_secs().max(1);

        let claims = AccessClaims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(PINNED_ALGORITHM), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Validate an access token and return the user it was issued to.
    ///
    /// Checks run in a fixed order: header algorithm, signature and issuer, expiry,
    /// then the subject.
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, JwtError> {
        let header = jsonwebtoken::decode_header(token).map_err(JwtError::Decoding)?;
        if header.alg != PINNED_ALGORITHM {
            return Err(JwtError::AlgorithmNotAllowed(header.alg));
        }

        let mut validation = Validation::new(PINNED_ALGORITHM);
        validation.leeway = 0;
        // Expiry is checked below so that `now == exp` already counts as expired.
        validation.validate_exp = false;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
                .map_err(JwtError::Decoding)?;
        let claims = token_data.claims;

        if unix_now()? >= claims.exp {
            return Err(JwtError::Expired);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::MalformedSubject(claims.sub))
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Token is malformed, badly signed, or has the wrong issuer
    Decoding(jsonwebtoken::errors::Error),
    /// Header declares an algorithm other than HS256
    AlgorithmNotAllowed(Algorithm),
    /// Token is past its `exp`
    Expired,
    /// `sub` is not a UUID
    MalformedSubject(String),
    /// System time error
    TimeError,
}

impl JwtError {
    /// True for failures caused by the presented token rather than by this server.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, JwtError::Encoding(_) | JwtError::TimeError)
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Invalid token: {}", e),
            JwtError::AlgorithmNotAllowed(alg) => {
                write!(f, "Token algorithm {:?} is not allowed", alg)
            }
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::MalformedSubject(sub) => write!(f, "Token subject is not a user id: {}", sub),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}
