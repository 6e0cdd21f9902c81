//! Fatal error taxonomy for a run.
//!
//! Every variant ends the process with exit code 1. Its `Display` text is the
//! message shown to the user, so it is printed as-is by `main`.

use crate::llm::LlmError;
use crate::search::SearchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsRagError {
    #[error("Search query cannot be empty.")]
    EmptyQuery,

    #[error("No news articles found for the given query.")]
    NoResults,

    #[error("An error occurred while fetching articles: {0}")]
    Search(#[from] SearchError),

    #[error("No articles were successfully retrieved. Exiting.")]
    NoArticlesExtracted,

    #[error("An error occurred while communicating with the LLM API: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NewsRagError {
    /// Extra guidance printed after the error message, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            NewsRagError::Llm(LlmError::Interface(_)) => Some(
                "Please ensure the configured endpoint speaks the OpenAI chat-completions API and that news_rag is up-to-date.",
            ),
            _ => None,
        }
    }
}
