//! SQLite persistence.
//!
//! Repositories are exposed as traits so services can be exercised against
//! wrappers in tests, the sqlx implementations live next to them.

pub mod todos;
pub mod users;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use thiserror::Error;
use todos_core::settings::database::DatabaseSettings;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("stored row is corrupt: {0}")]
    Corrupt(String),

    #[error("{0} already exists")]
    Duplicate(String),
}

pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.url)
        .await?;
    info!("Connected to database");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool, path: &str) -> Result<(), StoreError> {
    let migrator = Migrator::new(PathBuf::from(path)).await?;
    migrator.run(pool).await?;
    info!("Applied migrations from {}", path);
    Ok(())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
