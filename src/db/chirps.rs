use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::NOW_RFC3339;

#[derive(Clone)]
pub struct ChirpStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ChirpRow {
    id: String,
    body: String,
    user_id: String,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl TryFrom<ChirpRow> for Chirp {
    type Error = sqlx::Error;

    fn try_from(row: ChirpRow) -> Result<Self, Self::Error> {
        let parse = |s: &str| Uuid::parse_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)));
        Ok(Self {
            id: parse(&row.id)?,
            body: row.body,
            user_id: parse(&row.user_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// Sort order for chirp listings, by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChirpOrder {
    #[default]
    Asc,
    Desc,
}

impl ChirpOrder {
    fn as_sql(self) -> &'static str {
        match self {
            ChirpOrder::Asc => "created_at ASC, rowid ASC",
            ChirpOrder::Desc => "created_at DESC, rowid DESC",
        }
    }
}

const CHIRP_COLUMNS: &str = "id, body, user_id, created_at, updated_at, deleted_at";

impl ChirpStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a chirp. The body is stored as given.
    pub async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, sqlx::Error> {
        let row: ChirpRow = sqlx::query_as(&format!(
            "INSERT INTO chirps (id, body, user_id) VALUES (?, ?, ?) RETURNING {}",
            CHIRP_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(body)
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    /// Get a chirp by ID, including soft-deleted ones.
    pub async fn get(&self, id: Uuid) -> Result<Option<Chirp>, sqlx::Error> {
        let row: Option<ChirpRow> =
            sqlx::query_as(&format!("SELECT {} FROM chirps WHERE id = ?", CHIRP_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Chirp::try_from).transpose()
    }

    /// List live chirps, optionally only those by one author.
    pub async fn list(
        &self,
        author_id: Option<Uuid>,
        order: ChirpOrder,
    ) -> Result<Vec<Chirp>, sqlx::Error> {
        let rows: Vec<ChirpRow> = match author_id {
            Some(author_id) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM chirps WHERE deleted_at IS NULL AND user_id = ? ORDER BY {}",
                    CHIRP_COLUMNS,
                    order.as_sql()
                ))
                .bind(author_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM chirps WHERE deleted_at IS NULL ORDER BY {}",
                    CHIRP_COLUMNS,
                    order.as_sql()
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Chirp::try_from).collect()
    }

    /// Soft-delete a chirp owned by `user_id`. Returns false if nothing matched.
    pub async fn soft_delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!(
            "UPDATE chirps SET deleted_at = {now}, updated_at = {now} WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
            now = NOW_RFC3339
        ))
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
