//! Versioned schema migrations
//!
//! For changes column sync cannot express (data backfills, type changes).
//! Applied versions are recorded in `schema_version`; every migration must
//! be idempotent so a crash between the change and the version insert is
//! harmless.
//!
//! Never edit a released migration. Add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Latest schema version this code knows how to produce
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Latest applied version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: backfill empty list columns
///
/// Rows written before ingredients/instructions were stored as JSON arrays
/// may hold NULL or blank text. Normalize those to `[]`. Non-blank legacy
/// free text is left untouched and reads back as an empty list.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let ingredients = sqlx::query(
        "UPDATE recipes SET ingredients = '[]' WHERE ingredients IS NULL OR TRIM(ingredients) = ''",
    )
    .execute(pool)
    .await?
    .rows_affected();

    let instructions = sqlx::query(
        "UPDATE recipes SET instructions = '[]' WHERE instructions IS NULL OR TRIM(instructions) = ''",
    )
    .execute(pool)
    .await?
    .rows_affected();

    if ingredients + instructions > 0 {
        info!(
            "Backfilled {} ingredient and {} instruction list(s)",
            ingredients, instructions
        );
    }
    Ok(())
}
