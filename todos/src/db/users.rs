use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use todos_core::pagination::cursor::{format_timestamp, parse_timestamp};
use uuid::Uuid;

use super::{is_unique_violation, StoreError};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a client gets to see of an account.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserView {
    pub uuid: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            uuid: user.uuid,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `StoreError::Duplicate` when the e-mail is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

const USER_COLUMNS: &str = "id, uuid, email, password_hash, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    email: String,
    password_hash: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: String| StoreError::Corrupt(format!("user {}: {what}: {e}", row.id));
        Ok(User {
            id: row.id,
            uuid: Uuid::parse_str(&row.uuid).map_err(|e| corrupt("uuid", e.to_string()))?,
            created_at: parse_timestamp(&row.created_at)
                .map_err(|e| corrupt("created_at", e.to_string()))?,
            updated_at: parse_timestamp(&row.updated_at)
                .map_err(|e| corrupt("updated_at", e.to_string()))?,
            email: row.email,
            password_hash: row.password_hash,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        // Insert and read back on the same connection.
        let mut tx = self.pool.begin().await?;

        let created_at = format_timestamp(&user.created_at);
        let inserted = sqlx::query(
            "INSERT INTO users (uuid, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&created_at)
        .bind(&created_at)
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate(format!("user {}", user.email)))
            }
            Err(e) => return Err(e.into()),
        };

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }
}
