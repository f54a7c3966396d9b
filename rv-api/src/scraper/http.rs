//! HTTP-backed recipe scraper

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use rv_common::RecipeDraft;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{extract::extract_recipe, RecipeScraper, ScrapeError};

const USER_AGENT: &str = concat!("RecipeVault/", env!("CARGO_PKG_VERSION"));

/// Fetches recipe pages and reads their JSON-LD data
pub struct HttpRecipeScraper {
    http: Client,
}

impl HttpRecipeScraper {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(Policy::limited(8))
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_html(&content_type) {
            return Err(ScrapeError::UnsupportedContent(content_type));
        }

        Ok(response.text().await?)
    }
}

/// Missing content types are given the benefit of the doubt
fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

#[async_trait]
impl RecipeScraper for HttpRecipeScraper {
    async fn scrape(&self, url: &Url) -> Result<RecipeDraft, ScrapeError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::UnsupportedScheme(url.scheme().to_string()));
        }

        debug!(url = %url, "Fetching recipe page");
        let html = self.fetch_html(url).await?;

        let draft = extract_recipe(&html).ok_or(ScrapeError::NoRecipe)?;
        info!(
            url = %url,
            title = %draft.title,
            ingredients = draft.ingredients.len(),
            instructions = draft.instructions.len(),
            "Scraped recipe"
        );
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("TEXT/HTML"));
        assert!(is_html(""));
        assert!(!is_html("application/json"));
        assert!(!is_html("image/png"));
    }

    #[tokio::test]
    async fn test_rejects_non_http_schemes() {
        let scraper = HttpRecipeScraper::new(Duration::from_secs(1)).unwrap();
        let url = Url::parse("ftp://example.com/recipe").unwrap();

        let err = scraper.scrape(&url).await.unwrap_err();
        assert!(matches!(err, ScrapeError::UnsupportedScheme(s) if s == "ftp"));
    }
}
