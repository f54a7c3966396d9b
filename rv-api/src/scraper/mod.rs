//! Recipe scraping
//!
//! The service only sees the [`RecipeScraper`] trait. [`HttpRecipeScraper`]
//! fetches the page over HTTP and reads its schema.org JSON-LD data.

pub mod extract;
pub mod http;

use async_trait::async_trait;
use rv_common::RecipeDraft;
use thiserror::Error;
use url::Url;

pub use http::HttpRecipeScraper;

/// Scrape failures
///
/// A scrape either yields a draft with a non-empty title or one of these.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Unsupported content type: {0}")]
    UnsupportedContent(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("No recipe data found on page")]
    NoRecipe,
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ScrapeError::HttpStatus(status.as_u16()),
            None => ScrapeError::Network(err.to_string()),
        }
    }
}

/// Turns a recipe page URL into a draft recipe
#[async_trait]
pub trait RecipeScraper: Send + Sync {
    async fn scrape(&self, url: &Url) -> Result<RecipeDraft, ScrapeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FixedScraper;

    #[async_trait]
    impl RecipeScraper for FixedScraper {
        async fn scrape(&self, url: &Url) -> Result<RecipeDraft, ScrapeError> {
            if url.path() == "/missing" {
                return Err(ScrapeError::NoRecipe);
            }
            Ok(RecipeDraft {
                title: "Fixed".to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_scraper_is_object_safe() {
        let scraper: Arc<dyn RecipeScraper> = Arc::new(FixedScraper);

        let url = Url::parse("https://example.com/soup").unwrap();
        assert_eq!(scraper.scrape(&url).await.unwrap().title, "Fixed");

        let url = Url::parse("https://example.com/missing").unwrap();
        assert!(matches!(scraper.scrape(&url).await, Err(ScrapeError::NoRecipe)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ScrapeError::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(
            ScrapeError::UnsupportedScheme("ftp".to_string()).to_string(),
            "Unsupported URL scheme: ftp"
        );
    }
}
