//! Recipe endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rv_common::i18n::t;
use rv_common::{Recipe, RecipePatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, Localized};
use super::lang::RequestLanguage;
use crate::db::{RecipeFilter, RecipeScope};
use crate::service::{parse_id, ImportOutcome, ServiceError};
use crate::AppState;

/// Query parameters for GET /api/recipes
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    /// `"true"` lists archived recipes; any other value lists active ones
    pub archived: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> RecipeFilter {
        let scope = match self.archived.as_deref() {
            Some("true") => RecipeScope::Archived,
            _ => RecipeScope::Active,
        };
        RecipeFilter {
            scope,
            search: self.q,
        }
    }
}

/// Response wrapper for single-recipe mutations
#[derive(Debug, Serialize)]
pub struct RecipeEnvelope {
    pub recipe: Recipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Recipe> for RecipeEnvelope {
    fn from(recipe: Recipe) -> Self {
        Self {
            recipe,
            message: None,
        }
    }
}

/// Report an extractor rejection as a localized 400 instead of axum's plain text
fn invalid_body(rejection: impl std::fmt::Display) -> ServiceError {
    ServiceError::InvalidBody(rejection.to_string())
}

/// GET /api/recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    RequestLanguage(lang): RequestLanguage,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let Query(query) = query.map_err(invalid_body).localized(lang)?;
    let recipes = state
        .recipes()
        .list(&query.into_filter())
        .await
        .localized(lang)?;
    Ok(Json(recipes))
}

/// GET /api/recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    RequestLanguage(lang): RequestLanguage,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    let id = parse_id(&id).localized(lang)?;
    let recipe = state.recipes().get(id).await.localized(lang)?;
    Ok(Json(recipe))
}

/// POST /api/recipes/import
///
/// Body `{"url": "..."}`. A body that is missing, not JSON, or has a
/// non-string `url` is treated as a missing URL.
pub async fn import_recipe(
    State(state): State<AppState>,
    RequestLanguage(lang): RequestLanguage,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let url = body
        .as_ref()
        .and_then(|Json(body)| body.get("url"))
        .and_then(Value::as_str);

    let outcome = state.recipes().import(url).await.localized(lang)?;

    let response = match outcome {
        ImportOutcome::Created(recipe) => {
            (StatusCode::CREATED, Json(RecipeEnvelope::from(recipe))).into_response()
        }
        ImportOutcome::AlreadySaved(recipe) => (
            StatusCode::OK,
            Json(RecipeEnvelope {
                recipe,
                message: Some(t("recipeAlreadySaved", lang)),
            }),
        )
            .into_response(),
    };
    Ok(response)
}

/// PUT /api/recipes/:id
pub async fn update_recipe(
    State(state): State<AppState>,
    RequestLanguage(lang): RequestLanguage,
    Path(id): Path<String>,
    patch: Result<Json<RecipePatch>, JsonRejection>,
) -> Result<Json<RecipeEnvelope>, ApiError> {
    let id = parse_id(&id).localized(lang)?;
    let Json(patch) = patch.map_err(invalid_body).localized(lang)?;
    let recipe = state.recipes().update(id, patch).await.localized(lang)?;
    Ok(Json(recipe.into()))
}

/// POST /api/recipes/:id/archive
pub async fn archive_recipe(
    State(state): State<AppState>,
    RequestLanguage(lang): RequestLanguage,
    Path(id): Path<String>,
) -> Result<Json<RecipeEnvelope>, ApiError> {
    let id = parse_id(&id).localized(lang)?;
    let recipe = state.recipes().archive(id).await.localized(lang)?;
    Ok(Json(recipe.into()))
}

/// POST /api/recipes/:id/unarchive
pub async fn unarchive_recipe(
    State(state): State<AppState>,
    RequestLanguage(lang): RequestLanguage,
    Path(id): Path<String>,
) -> Result<Json<RecipeEnvelope>, ApiError> {
    let id = parse_id(&id).localized(lang)?;
    let recipe = state.recipes().unarchive(id).await.localized(lang)?;
    Ok(Json(recipe.into()))
}

/// Build recipe routes
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipes", get(list_recipes))
        .route("/api/recipes/import", post(import_recipe))
        .route("/api/recipes/:id", get(get_recipe).put(update_recipe))
        .route("/api/recipes/:id/archive", post(archive_recipe))
        .route("/api/recipes/:id/unarchive", post(unarchive_recipe))
}
