//! Bearer-token authentication.
//!
//! Two-token system: short-lived access tokens (1 hour, stateless JWTs) and long-lived
//! refresh tokens (60 days, opaque and database-tracked). Access tokens are sent as
//! `Authorization: Bearer`; the payment provider's webhook uses `Authorization: ApiKey`.

mod errors;
mod extractors;
mod header;
mod refresh;
mod state;

pub use errors::AuthRejection;
pub use extractors::{Auth, Authenticator, ServiceAuth};
pub use header::HeaderError;
pub(crate) use header::bearer_token;
pub use refresh::{RefreshError, RefreshTokenManager, RefreshTokenRecord, RefreshTokenStore};
pub use state::{HasAuthBackend, HasServiceKey};
