//! Opaque refresh tokens.
//!
//! A refresh token is 32 random bytes, hex-encoded, with its owner, expiry and
//! revocation state kept in a [`RefreshTokenStore`]. Tokens are never rotated on use;
//! one stays valid until it expires or is revoked.

use std::future::Future;

use rand::RngCore;
use uuid::Uuid;

use crate::jwt::unix_now;

/// Refresh token duration: 60 days
pub(crate) const REFRESH_TOKEN_DURATION_SECS: u64 = 60 * 24 * 60 * 60;

/// Number of random bytes in a refresh token.
pub(crate) const REFRESH_TOKEN_BYTES: usize = 32;

/// A persisted refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    /// Unix seconds
    pub expires_at: u64,
    /// Unix seconds, set once by revocation
    pub revoked_at: Option<u64>,
}

/// Persistence for refresh tokens.
///
/// Each manager operation makes exactly one call here, so races between exchange and
/// revoke are settled by the store's own commit order.
pub trait RefreshTokenStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert a new, unrevoked record.
    fn create(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: u64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Fetch a record by token.
    fn get(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<RefreshTokenRecord>, Self::Error>> + Send;

    /// Set `revoked_at` unless it is already set. Returns false if no record exists.
    fn revoke(
        &self,
        token: &str,
        revoked_at: u64,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Generate a new refresh token: 64 lowercase hex characters.
pub(crate) fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues, exchanges and revokes refresh tokens against a store.
#[derive(Clone)]
pub struct RefreshTokenManager<S> {
    store: S,
}

impl<S: RefreshTokenStore> RefreshTokenManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create and persist a refresh token for a user.
    pub async fn issue(&self, user_id: Uuid) -> Result<String, RefreshError> {
        let now = unix_now().map_err(|_| RefreshError::TimeError)?;
        let token = generate_refresh_token();
        self.store
            .create(&token, user_id, now + REFRESH_TOKEN_DURATION_SECS)
            .await
            .map_err(RefreshError::store)?;
        Ok(token)
    }

    /// Check a refresh token and return the user it belongs to.
    pub async fn exchange(&self, token: &str) -> Result<Uuid, RefreshError> {
        let record = self
            .store
            .get(token)
            .await
            .map_err(RefreshError::store)?
            .ok_or(RefreshError::NotFound)?;

        let now = unix_now().map_err(|_| RefreshError::TimeError)?;
        if now >= record.expires_at {
            return Err(RefreshError::Expired);
        }
        if record.revoked_at.is_some() {
            return Err(RefreshError::Revoked);
        }
        Ok(record.user_id)
    }

    /// Permanently revoke a refresh token. Revoking twice is not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshError> {
        let now = unix_now().map_err(|_| RefreshError::TimeError)?;
        let found = self
            .store
            .revoke(token, now)
            .await
            .map_err(RefreshError::store)?;
        if !found {
            return Err(RefreshError::NotFound);
        }
        Ok(())
    }
}

/// Errors from refresh token operations.
#[derive(Debug)]
pub enum RefreshError {
    NotFound,
    Expired,
    Revoked,
    /// System time error
    TimeError,
    /// The backing store failed
    Store(Box<dyn std::error::Error + Send + Sync>),
}

impl RefreshError {
    fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        RefreshError::Store(Box::new(e))
    }
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshError::NotFound => write!(f, "Refresh token not found"),
            RefreshError::Expired => write!(f, "Refresh token has expired"),
            RefreshError::Revoked => write!(f, "Refresh token has been revoked"),
            RefreshError::TimeError => write!(f, "System time error"),
            RefreshError::Store(e) => write!(f, "Refresh token store failed: {}", e),
        }
    }
}

impl std::error::Error for RefreshError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use std::collections::HashSet;

    async fn setup() -> (Database, RefreshTokenManager<crate::db::TokenStore>, Uuid) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.users().create("alice@example.com", "hash").await.unwrap();
        let manager = RefreshTokenManager::new(db.tokens());
        (db, manager, user.id)
    }

    #[test]
    fn test_token_format() {
        let token = generate_refresh_token();
        assert_eq!(token.len(), 64);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_no_collisions() {
        let tokens: HashSet<String> = (0..10_000).map(|_| generate_refresh_token()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[tokio::test]
    async fn test_issue_persists_record() {
        let (db, manager, user_id) = setup().await;

        let token = manager.issue(user_id).await.unwrap();
        assert_eq!(token.len(), 64);

        let record = db.tokens().get(&token).await.unwrap().unwrap();
        assert_eq!(record.user_id, user_id);
        assert_eq!(record.revoked_at, None);
        let now = unix_now().unwrap();
        let expected = now + REFRESH_TOKEN_DURATION_SECS;
        assert!(record.expires_at <= expected && record.expires_at + 5 >= expected);
    }

    #[tokio::test]
    async fn test_exchange_valid_token() {
        let (_db, manager, user_id) = setup().await;
        let token = manager.issue(user_id).await.unwrap();

        assert_eq!(manager.exchange(&token).await.unwrap(), user_id);
        // Not rotated: the same token keeps working.
        assert_eq!(manager.exchange(&token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_exchange_unknown_token() {
        let (_db, manager, _) = setup().await;
        assert!(matches!(
            manager.exchange(&generate_refresh_token()).await,
            Err(RefreshError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_exchange_revoked_token() {
        let (_db, manager, user_id) = setup().await;
        let token = manager.issue(user_id).await.unwrap();

        manager.revoke(&token).await.unwrap();
        assert!(matches!(
            manager.exchange(&token).await,
            Err(RefreshError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_exchange_expired_token() {
        let (db, manager, user_id) = setup().await;
        let token = generate_refresh_token();
        let now = unix_now().unwrap();
        db.tokens().create(&token, user_id, now - 1).await.unwrap();

        assert!(matches!(
            manager.exchange(&token).await,
            Err(RefreshError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_exchange_expires_exactly_at_expiry() {
        let (db, manager, user_id) = setup().await;
        let token = generate_refresh_token();
        let now = unix_now().unwrap();
        db.tokens().create(&token, user_id, now).await.unwrap();

        assert!(matches!(
            manager.exchange(&token).await,
            Err(RefreshError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (db, manager, user_id) = setup().await;
        let token = manager.issue(user_id).await.unwrap();

        manager.revoke(&token).await.unwrap();
        let first = db.tokens().get(&token).await.unwrap().unwrap().revoked_at;
        assert!(first.is_some());

        manager.revoke(&token).await.unwrap();
        let second = db.tokens().get(&token).await.unwrap().unwrap().revoked_at;
        assert_eq!(first, second, "Second revoke must not move revoked_at");
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let (_db, manager, _) = setup().await;
        assert!(matches!(
            manager.revoke(&generate_refresh_token()).await,
            Err(RefreshError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_revoke_leaves_other_tokens_alone() {
        let (_db, manager, user_id) = setup().await;
        let first = manager.issue(user_id).await.unwrap();
        let second = manager.issue(user_id).await.unwrap();

        manager.revoke(&first).await.unwrap();
        assert_eq!(manager.exchange(&second).await.unwrap(), user_id);
    }
}
