//! Database initialization
//!
//! Opens (or creates) the SQLite database and brings the schema up to date.
//! Safe to run on every startup against an already-migrated database.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the database at `db_path`, creating it and its parent folder if
/// needed, then ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets readers proceed alongside the single writer; the busy timeout
    // makes concurrent writers queue instead of failing with SQLITE_BUSY.
    // Both are set per connection through the connect options.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    ensure_schema(&pool).await?;

    Ok(pool)
}

/// Create missing tables, add missing columns, run pending migrations
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_recipes_table(pool).await?;

    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    create_recipes_indexes(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the recipes table
///
/// `source_url` carries the UNIQUE constraint that makes concurrent imports
/// of one URL safe.
pub async fn create_recipes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            source_url TEXT NOT NULL UNIQUE,
            description TEXT,
            image_url TEXT,
            servings TEXT,
            prep_time TEXT,
            cook_time TEXT,
            total_time TEXT,
            ingredients TEXT,
            instructions TEXT,
            archived_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Indexes reference synced columns, so they are created after column sync
async fn create_recipes_indexes(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_recipes_archived_created ON recipes (archived_at, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
