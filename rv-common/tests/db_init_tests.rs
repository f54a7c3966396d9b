//! Database initialization tests
//!
//! Covers first-run creation, reopening an existing database, and upgrading
//! a legacy recipes table in place.

use rv_common::db::init::{ensure_schema, init_database};
use rv_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn recipe_columns(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info('recipes') ORDER BY cid")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("recipes.db");

    let pool = init_database(&db_path).await.expect("init should succeed");

    assert!(db_path.exists(), "Database file was not created");
    assert_eq!(recipe_columns(&pool).await.len(), 14);
    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("recipes.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO recipes (title, source_url, ingredients, instructions) VALUES ('Pasta', 'https://example.com/pasta', '[]', '[]')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path)
        .await
        .expect("reopening an initialized database should succeed");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(recipe_columns(&pool2).await.len(), 14);

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(versions, 1, "migrations must not re-run");
}

#[tokio::test]
async fn test_ensure_schema_upgrades_legacy_table() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("legacy.db");
    let pool = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title VARCHAR(255) NOT NULL,
            source_url VARCHAR(2048) NOT NULL UNIQUE,
            description TEXT,
            image_url VARCHAR(2048),
            servings VARCHAR(64),
            prep_time VARCHAR(64),
            cook_time VARCHAR(64),
            total_time VARCHAR(64),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO recipes (title, source_url) VALUES ('Old', 'https://example.com/old')")
        .execute(&pool)
        .await
        .unwrap();

    ensure_schema(&pool).await.expect("upgrade should succeed");
    ensure_schema(&pool).await.expect("second run should be a no-op");

    let columns = recipe_columns(&pool).await;
    assert_eq!(columns.len(), 14);
    assert!(columns.iter().any(|c| c == "archived_at"));

    let (ingredients, archived_at): (Option<String>, Option<String>) =
        sqlx::query_as("SELECT ingredients, archived_at FROM recipes WHERE title = 'Old'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(ingredients.as_deref(), Some("[]"));
    assert!(archived_at.is_none(), "existing recipes stay active");
}

#[tokio::test]
async fn test_ensure_schema_adds_timestamp_to_populated_table() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("stampless.db");
    let pool = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            source_url TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO recipes (title, source_url) VALUES ('Old', 'https://example.com/old')")
        .execute(&pool)
        .await
        .unwrap();

    ensure_schema(&pool)
        .await
        .expect("adding updated_at to a table with rows should succeed");
    ensure_schema(&pool).await.expect("second run should be a no-op");

    assert_eq!(recipe_columns(&pool).await.len(), 14);

    let updated_at: Option<String> =
        sqlx::query_scalar("SELECT updated_at FROM recipes WHERE title = 'Old'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(updated_at.is_some(), "existing rows get a timestamp");
}
