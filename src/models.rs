//! Data models for search results, extracted articles, and run reports.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleMetadata`]: One news search hit (title, link, source, date, snippet)
//! - [`ExtractedArticle`]: A search hit with its scraped body text attached
//! - [`RunReport`]: Everything a single run produced, for the optional JSON output
//!
//! It also holds the wire shapes of the news-search API response
//! ([`NewsSearchResponse`], [`RawNewsResult`]), which are mapped into
//! [`ArticleMetadata`] by the search client.

use serde::{Deserialize, Serialize};

/// Metadata for one news search result.
///
/// Produced by the search client in the order the API returned them and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ArticleMetadata {
    /// The headline.
    pub title: String,
    /// URL of the article page.
    pub link: String,
    /// The publisher name (e.g. "Reuters").
    pub source: String,
    /// Free-form publication date as reported by the search API ("2 hours ago").
    pub published_date: String,
    /// Short excerpt shown on the results page.
    pub snippet: String,
}

/// An article whose body text was successfully extracted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractedArticle {
    /// The search metadata the article was found through.
    #[serde(flatten)]
    pub metadata: ArticleMetadata,
    /// The extracted, whitespace-trimmed main body text.
    pub full_text: String,
}

impl ExtractedArticle {
    pub fn new(metadata: ArticleMetadata, full_text: String) -> Self {
        Self {
            metadata,
            full_text,
        }
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}

/// Top-level news-search API response.
///
/// Only the fields the client reads are modelled; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct NewsSearchResponse {
    /// The news-tab results, absent when the query matched nothing.
    #[serde(default)]
    pub news_results: Vec<RawNewsResult>,
    /// Error message the API embeds in the body (bad key, quota exhausted, ...).
    pub error: Option<String>,
}

/// One entry of `news_results` as the API sends it.
///
/// Every field is optional on the wire; missing values map to empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct RawNewsResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    pub published: Option<String>,
    /// Some engines report the publication date here instead of `published`.
    pub date: Option<String>,
    pub snippet: Option<String>,
}

impl From<RawNewsResult> for ArticleMetadata {
    fn from(raw: RawNewsResult) -> Self {
        Self {
            title: raw.title.unwrap_or_default(),
            link: raw.link.unwrap_or_default(),
            source: raw.source.unwrap_or_default(),
            published_date: raw.published.or(raw.date).unwrap_or_default(),
            snippet: raw.snippet.unwrap_or_default(),
        }
    }
}

/// The record written by `--json-output-dir` after a successful run.
#[derive(Debug, Deserialize, Serialize)]
pub struct RunReport {
    /// The search query the run was made for.
    pub query: String,
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    /// Model identifier the prompt was sent to.
    pub model: String,
    /// The articles that went into the prompt, in prompt order.
    pub articles: Vec<ExtractedArticle>,
    /// The model's reply text.
    pub reply: String,
}
