//! Refresh token storage.
//!
//! Rows are never deleted by the token lifecycle itself; revocation only stamps
//! `revoked_at`. Rows disappear only when their owner is deleted.

use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::NOW_RFC3339;
use crate::auth::{RefreshTokenRecord, RefreshTokenStore};

/// Store for refresh tokens.
#[derive(Clone)]
pub struct TokenStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    token: String,
    user_id: String,
    expires_at: i64,
    revoked_at: Option<i64>,
}

impl TryFrom<TokenRow> for RefreshTokenRecord {
    type Error = sqlx::Error;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            token: row.token,
            user_id: Uuid::parse_str(&row.user_id).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            expires_at: row.expires_at.max(0) as u64,
            revoked_at: row.revoked_at.map(|t| t.max(0) as u64),
        })
    }
}

impl TokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RefreshTokenStore for TokenStore {
    type Error = sqlx::Error;

    async fn create(&self, token: &str, user_id: Uuid, expires_at: u64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id.to_string())
            .bind(expires_at as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
        let row: Option<TokenRow> = sqlx::query_as(
            "SELECT token, user_id, expires_at, revoked_at FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RefreshTokenRecord::try_from).transpose()
    }

    async fn revoke(&self, token: &str, revoked_at: u64) -> Result<bool, sqlx::Error> {
        // COALESCE keeps the first revocation time, so a repeat revoke still matches the
        // row but changes nothing.
        let result = sqlx::query(&format!(
            "UPDATE refresh_tokens SET revoked_at = COALESCE(revoked_at, ?), updated_at = {} WHERE token = ?",
            NOW_RFC3339
        ))
        .bind(revoked_at as i64)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
