//! rv-api library - Recipe Vault HTTP service
//!
//! Imports recipes from third-party pages, stores them in SQLite and serves
//! them back as JSON.

use axum::extract::DefaultBodyLimit;
use axum::http::{header::InvalidHeaderValue, HeaderValue, Method};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod scraper;
pub mod service;

use scraper::RecipeScraper;
use service::RecipeService;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Recipe page scraper
    pub scraper: Arc<dyn RecipeScraper>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, scraper: Arc<dyn RecipeScraper>) -> Self {
        Self { db, scraper }
    }

    /// Recipe operations bound to this state
    pub fn recipes(&self) -> RecipeService<'_> {
        RecipeService::new(&self.db, self.scraper.as_ref())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::recipe_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origin; `*` allows any origin
pub fn cors_layer(allow_origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    if allow_origin.trim() == "*" {
        Ok(layer.allow_origin(Any))
    } else {
        Ok(layer.allow_origin(HeaderValue::from_str(allow_origin.trim())?))
    }
}
