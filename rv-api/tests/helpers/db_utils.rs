//! Database Test Utilities

use rv_common::db::init_database;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a file-backed test database with the full schema.
///
/// File-backed rather than in-memory so concurrent writers go through WAL
/// and the busy timeout like they do in production. Keep the returned
/// `TempDir` alive for the duration of the test.
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("recipes.db"))
        .await
        .expect("Should initialize test database");
    (dir, pool)
}

pub async fn count_recipes(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await
        .expect("Should count recipes")
}
