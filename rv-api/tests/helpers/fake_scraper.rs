//! Scripted scraper for tests

use async_trait::async_trait;
use rv_api::scraper::{RecipeScraper, ScrapeError};
use rv_common::RecipeDraft;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;
use url::Url;

/// Returns canned drafts keyed by URL; unknown URLs fail with `NoRecipe`
#[derive(Default)]
pub struct FakeScraper {
    drafts: HashMap<String, RecipeDraft>,
    failures: HashMap<String, u16>,
    barrier: Option<Barrier>,
    calls: AtomicUsize,
}

impl FakeScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipe(mut self, url: &str, draft: RecipeDraft) -> Self {
        self.drafts.insert(url.to_string(), draft);
        self
    }

    /// Make `url` fail with the given HTTP status
    pub fn with_http_failure(mut self, url: &str, status: u16) -> Self {
        self.failures.insert(url.to_string(), status);
        self
    }

    /// Hold every scrape until `parties` scrapes are in flight
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Barrier::new(parties));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeScraper for FakeScraper {
    async fn scrape(&self, url: &Url) -> Result<RecipeDraft, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        if let Some(status) = self.failures.get(url.as_str()) {
            return Err(ScrapeError::HttpStatus(*status));
        }

        self.drafts
            .get(url.as_str())
            .cloned()
            .ok_or(ScrapeError::NoRecipe)
    }
}

pub fn pasta_draft() -> RecipeDraft {
    RecipeDraft {
        title: "Pasta".to_string(),
        description: Some("Quick weeknight pasta".to_string()),
        image_url: None,
        servings: Some("2".to_string()),
        prep_time: Some("5 min".to_string()),
        cook_time: Some("10 min".to_string()),
        total_time: None,
        ingredients: vec!["200 g pasta".to_string(), "salt".to_string()],
        instructions: vec!["Boil water".to_string(), "Cook pasta".to_string()],
    }
}
