//! Recipe use cases
//!
//! Sits between the HTTP handlers and the store. The one piece of real logic
//! is import: validate the URL, short-circuit if it is already saved, scrape,
//! then insert. A concurrent import of the same URL can slip past the
//! existence check; the UNIQUE constraint catches it and the existing row is
//! returned instead.

use rv_common::{Recipe, RecipePatch};
use sqlx::SqlitePool;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::db::recipes::{self, RecipeFilter, StoreError};
use crate::scraper::RecipeScraper;

/// Why an import URL was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlProblem {
    Missing,
    Malformed,
}

impl fmt::Display for UrlProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlProblem::Missing => f.write_str("URL is required"),
            UrlProblem::Malformed => f.write_str("URL is malformed"),
        }
    }
}

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(UrlProblem),

    /// Holds the id as requested, which need not be numeric
    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Scrape failed: {0}")]
    ScrapeFailed(String),

    #[error("Recipe already exists: {0}")]
    DuplicateUrl(String),

    /// Request body or query string could not be read
    #[error("Invalid request: {0}")]
    InvalidBody(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id.to_string()),
            StoreError::DuplicateUrl(url) => ServiceError::DuplicateUrl(url),
            StoreError::Database(e) => ServiceError::Database(e),
        }
    }
}

/// Result of an import request
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// A new row was written
    Created(Recipe),
    /// The URL was already saved; nothing was written
    AlreadySaved(Recipe),
}

impl ImportOutcome {
    pub fn recipe(&self) -> &Recipe {
        match self {
            ImportOutcome::Created(recipe) | ImportOutcome::AlreadySaved(recipe) => recipe,
        }
    }
}

/// Validate and normalize an import URL
pub fn normalize_url(raw: Option<&str>) -> Result<Url, ServiceError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(ServiceError::InvalidUrl(UrlProblem::Missing));
    }
    Url::parse(raw).map_err(|e| {
        debug!("Rejecting import URL {:?}: {}", raw, e);
        ServiceError::InvalidUrl(UrlProblem::Malformed)
    })
}

/// Parse a path id; anything non-numeric cannot match a row
pub fn parse_id(raw: &str) -> Result<i64, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::NotFound(raw.to_string()))
}

/// Recipe operations over a pool and a scraper
#[derive(Clone, Copy)]
pub struct RecipeService<'a> {
    db: &'a SqlitePool,
    scraper: &'a dyn RecipeScraper,
}

impl<'a> RecipeService<'a> {
    pub fn new(db: &'a SqlitePool, scraper: &'a dyn RecipeScraper) -> Self {
        Self { db, scraper }
    }

    pub async fn list(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, ServiceError> {
        Ok(recipes::list(self.db, filter).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Recipe, ServiceError> {
        recipes::find_by_id(self.db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub async fn import(&self, raw_url: Option<&str>) -> Result<ImportOutcome, ServiceError> {
        let url = normalize_url(raw_url)?;
        let source_url = url.to_string();

        if let Some(existing) = recipes::find_by_url(self.db, &source_url).await? {
            debug!(id = existing.id, url = %source_url, "Recipe already saved");
            return Ok(ImportOutcome::AlreadySaved(existing));
        }

        let draft = self.scraper.scrape(&url).await.map_err(|e| {
            warn!(url = %source_url, "Scrape failed: {}", e);
            ServiceError::ScrapeFailed(e.to_string())
        })?;

        match recipes::insert(self.db, &source_url, &draft).await {
            Ok(recipe) => {
                info!(id = recipe.id, url = %source_url, "Imported recipe");
                Ok(ImportOutcome::Created(recipe))
            }
            Err(StoreError::DuplicateUrl(_)) => {
                // Lost a race with a concurrent import of the same URL
                match recipes::find_by_url(self.db, &source_url).await? {
                    Some(existing) => {
                        debug!(id = existing.id, url = %source_url, "Concurrent import resolved to existing row");
                        Ok(ImportOutcome::AlreadySaved(existing))
                    }
                    None => Err(ServiceError::DuplicateUrl(source_url)),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(&self, id: i64, patch: RecipePatch) -> Result<Recipe, ServiceError> {
        let recipe = recipes::update(self.db, id, patch).await?;
        debug!(id, "Updated recipe");
        Ok(recipe)
    }

    pub async fn archive(&self, id: i64) -> Result<Recipe, ServiceError> {
        Ok(recipes::set_archived(self.db, id, true).await?)
    }

    pub async fn unarchive(&self, id: i64) -> Result<Recipe, ServiceError> {
        Ok(recipes::set_archived(self.db, id, false).await?)
    }
}
