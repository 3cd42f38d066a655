//! Database access layer
//!
//! Owns the SQLite connection pool and schema. All statements are
//! parameterized; no SQL is built from request text.

use crate::error::Result;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

pub mod researchers;

/// Open (creating if missing) the on-disk database.
///
/// Foreign key enforcement is switched on for every connection so the
/// `research_profiles.researcher_id` cascade holds even though deletes also
/// remove dependents explicitly.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Create the schema if absent. Safe to run on every startup.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS researchers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            field TEXT,
            institution TEXT,
            email TEXT,
            bio TEXT,
            citation_count INTEGER NOT NULL DEFAULT 0,
            publication_count INTEGER NOT NULL DEFAULT 0,
            photo TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS research_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            researcher_id INTEGER NOT NULL,
            platform TEXT NOT NULL,
            url TEXT NOT NULL,
            FOREIGN KEY (researcher_id) REFERENCES researchers(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh on-disk database in a temp directory, schema applied.
    pub async fn temp_pool() -> (SqlitePool, TempDir) {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let pool = connect(&dir.path().join("researchdir.db"))
            .await
            .expect("Should open temp database");
        init_schema(&pool).await.expect("Should create schema");
        (pool, dir)
    }
}
