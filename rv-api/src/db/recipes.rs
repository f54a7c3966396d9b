//! Recipe persistence
//!
//! All reads go through [`recipe_from_row`], which turns the JSON list
//! columns back into string sequences. Uniqueness of `source_url` is left to
//! the table constraint; a violation comes back as [`StoreError::DuplicateUrl`].

use chrono::Utc;
use rv_common::models::{decode_string_list, encode_string_list};
use rv_common::{Recipe, RecipeDraft, RecipePatch};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;

const SELECT_COLUMNS: &str = "id, title, source_url, description, image_url, servings, \
     prep_time, cook_time, total_time, ingredients, instructions, archived_at, created_at, updated_at";

/// Recipe store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Recipe not found: {0}")]
    NotFound(i64),

    /// The UNIQUE constraint on `source_url` rejected an insert
    #[error("Recipe already exists: {0}")]
    DuplicateUrl(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Which half of the collection to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipeScope {
    #[default]
    Active,
    Archived,
}

/// List filter
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub scope: RecipeScope,
    /// Case-insensitive substring of title or source URL
    pub search: Option<String>,
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe, sqlx::Error> {
    let ingredients: Option<String> = row.try_get("ingredients")?;
    let instructions: Option<String> = row.try_get("instructions")?;

    Ok(Recipe {
        id: row.try_get("id")?,
        source_url: row.try_get("source_url")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        servings: row.try_get("servings")?,
        prep_time: row.try_get("prep_time")?,
        cook_time: row.try_get("cook_time")?,
        total_time: row.try_get("total_time")?,
        ingredients: decode_string_list(ingredients.as_deref()),
        instructions: decode_string_list(instructions.as_deref()),
        archived_at: row.try_get("archived_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escape LIKE wildcards so the term matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Recipe>, StoreError> {
    let row = sqlx::query(&format!("SELECT {} FROM recipes WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(recipe_from_row).transpose()?)
}

pub async fn find_by_url(pool: &SqlitePool, source_url: &str) -> Result<Option<Recipe>, StoreError> {
    let row = sqlx::query(&format!("SELECT {} FROM recipes WHERE source_url = ?", SELECT_COLUMNS))
        .bind(source_url)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(recipe_from_row).transpose()?)
}

/// List recipes in one scope, newest first
pub async fn list(pool: &SqlitePool, filter: &RecipeFilter) -> Result<Vec<Recipe>, StoreError> {
    let scope_clause = match filter.scope {
        RecipeScope::Active => "archived_at IS NULL",
        RecipeScope::Archived => "archived_at IS NOT NULL",
    };
    let term = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut sql = format!("SELECT {} FROM recipes WHERE {}", SELECT_COLUMNS, scope_clause);
    if term.is_some() {
        sql.push_str(" AND (title LIKE ? ESCAPE '\\' OR source_url LIKE ? ESCAPE '\\')");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut query = sqlx::query(&sql);
    if let Some(term) = term {
        let pattern = like_pattern(term);
        query = query.bind(pattern.clone()).bind(pattern);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter()
        .map(recipe_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)
}

/// Insert a newly scraped recipe
pub async fn insert(
    pool: &SqlitePool,
    source_url: &str,
    draft: &RecipeDraft,
) -> Result<Recipe, StoreError> {
    let now = Utc::now();

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO recipes (
            title, source_url, description, image_url, servings, prep_time,
            cook_time, total_time, ingredients, instructions, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        SELECT_COLUMNS
    ))
    .bind(&draft.title)
    .bind(source_url)
    .bind(&draft.description)
    .bind(&draft.image_url)
    .bind(&draft.servings)
    .bind(&draft.prep_time)
    .bind(&draft.cook_time)
    .bind(&draft.total_time)
    .bind(encode_string_list(&draft.ingredients))
    .bind(encode_string_list(&draft.instructions))
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(recipe_from_row(&row)?),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!(url = %source_url, "Insert rejected by unique constraint");
            Err(StoreError::DuplicateUrl(source_url.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Merge a partial update into the stored recipe
pub async fn update(pool: &SqlitePool, id: i64, patch: RecipePatch) -> Result<Recipe, StoreError> {
    let mut recipe = find_by_id(pool, id).await?.ok_or(StoreError::NotFound(id))?;
    recipe.apply_patch(patch);

    let row = sqlx::query(&format!(
        r#"
        UPDATE recipes
        SET title = ?, description = ?, image_url = ?, servings = ?, prep_time = ?,
            cook_time = ?, total_time = ?, ingredients = ?, instructions = ?, updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        SELECT_COLUMNS
    ))
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.image_url)
    .bind(&recipe.servings)
    .bind(&recipe.prep_time)
    .bind(&recipe.cook_time)
    .bind(&recipe.total_time)
    .bind(encode_string_list(&recipe.ingredients))
    .bind(encode_string_list(&recipe.instructions))
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(recipe_from_row(&row)?),
        None => Err(StoreError::NotFound(id)),
    }
}

/// Archive or restore a recipe.
///
/// Only rows whose state actually changes are written, so repeating the
/// same call leaves `archived_at` and `updated_at` untouched.
pub async fn set_archived(pool: &SqlitePool, id: i64, archived: bool) -> Result<Recipe, StoreError> {
    let now = Utc::now();

    let changed = if archived {
        sqlx::query(
            "UPDATE recipes SET archived_at = ?, updated_at = ? WHERE id = ? AND archived_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?
    } else {
        sqlx::query(
            "UPDATE recipes SET archived_at = NULL, updated_at = ? WHERE id = ? AND archived_at IS NOT NULL",
        )
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?
    }
    .rows_affected();

    if changed == 0 {
        debug!(id, archived, "Archive state unchanged");
    }

    find_by_id(pool, id).await?.ok_or(StoreError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tomato"), "%tomato%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn test_default_filter_is_active_without_search() {
        let filter = RecipeFilter::default();
        assert_eq!(filter.scope, RecipeScope::Active);
        assert!(filter.search.is_none());
    }
}
