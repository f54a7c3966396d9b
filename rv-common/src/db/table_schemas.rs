//! Table schema definitions
//!
//! Single source of truth for the columns each table must have. Columns
//! added here are created on the next startup by [`sync_all_table_schemas`].

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Recipes table schema
pub struct RecipesTableSchema;

impl TableSchema for RecipesTableSchema {
    fn table_name() -> &'static str {
        "recipes"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("title", "TEXT").not_null(),
            ColumnDefinition::new("source_url", "TEXT").not_null().unique(),
            ColumnDefinition::new("description", "TEXT"),
            ColumnDefinition::new("image_url", "TEXT"),
            ColumnDefinition::new("servings", "TEXT"),
            ColumnDefinition::new("prep_time", "TEXT"),
            ColumnDefinition::new("cook_time", "TEXT"),
            ColumnDefinition::new("total_time", "TEXT"),
            // JSON arrays of strings
            ColumnDefinition::new("ingredients", "TEXT"),
            ColumnDefinition::new("instructions", "TEXT"),
            // NULL while active
            ColumnDefinition::new("archived_at", "TIMESTAMP"),
            ColumnDefinition::new("created_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
            ColumnDefinition::new("updated_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
        ]
    }
}

/// Add missing columns to every known table
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    let added = SchemaSync::sync_table::<RecipesTableSchema>(pool).await?;

    if added > 0 {
        info!("Schema sync added {} column(s)", added);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn test_recipes_schema_definition() {
        let columns = RecipesTableSchema::expected_columns();

        assert_eq!(columns.len(), 14);
        assert!(columns.iter().any(|c| c.name == "id" && c.primary_key));
        assert!(columns.iter().any(|c| c.name == "source_url" && c.not_null && c.unique));
        assert!(columns.iter().any(|c| c.name == "archived_at" && !c.not_null));
    }

    #[tokio::test]
    async fn test_sync_upgrades_legacy_recipes_table() {
        let pool = setup_test_db().await;

        // Shape of tables created before archiving and structured lists existed
        sqlx::query(
            r#"
            CREATE TABLE recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                source_url TEXT NOT NULL UNIQUE,
                description TEXT,
                image_url TEXT,
                servings TEXT,
                prep_time TEXT,
                cook_time TEXT,
                total_time TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        sync_all_table_schemas(&pool).await.unwrap();

        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('recipes') ORDER BY cid")
                .fetch_all(&pool)
                .await
                .unwrap();

        assert_eq!(names.len(), 14);
        for expected in ["ingredients", "instructions", "archived_at"] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }
}
