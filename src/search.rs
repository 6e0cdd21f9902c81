//! News search through the SerpApi Google engine, restricted to the news tab.
//!
//! The client performs a single GET against `{base_url}/search.json` and maps
//! `news_results` into [`ArticleMetadata`] in the order the API ranked them.
//! There is no retry: any failure is returned to the caller, which treats it
//! as fatal.

use crate::models::{ArticleMetadata, NewsSearchResponse};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Search engine identifier sent as `engine`.
const ENGINE: &str = "google";
/// `tbm` value selecting the news tab.
const NEWS_TAB: &str = "nws";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn a query into ranked news results.
pub trait NewsSearch {
    /// Return up to `num_articles` results in ranking order.
    async fn search(
        &self,
        query: &str,
        num_articles: usize,
    ) -> Result<Vec<ArticleMetadata>, SearchError>;
}

/// SerpApi client for Google News-tab searches.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SerpApiClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

impl NewsSearch for SerpApiClient {
    #[instrument(level = "info", skip(self), fields(base_url = %self.base_url))]
    async fn search(
        &self,
        query: &str,
        num_articles: usize,
    ) -> Result<Vec<ArticleMetadata>, SearchError> {
        let url = format!("{}/search.json", self.base_url);
        let num = num_articles.to_string();

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("engine", ENGINE),
                ("q", query),
                ("tbm", NEWS_TAB),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<NewsSearchResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| body.clone());
            warn!(status = status.as_u16(), %message, "Search API call failed");
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: NewsSearchResponse = serde_json::from_str(&body)?;
        if let Some(err) = &parsed.error {
            // An error body with a 2xx status carries no results.
            warn!(error = %err, "Search API reported an error");
        }

        let articles: Vec<ArticleMetadata> = parsed
            .news_results
            .into_iter()
            .take(num_articles)
            .map(ArticleMetadata::from)
            .collect();

        info!(count = articles.len(), "Fetched news search results");
        let links: Vec<&str> = articles.iter().map(|a| a.link.as_str()).collect();
        debug!(?links, "Result links");
        Ok(articles)
    }
}
