//! The end-to-end run: search, extract, prompt, ask, present.
//!
//! Every stage runs once and strictly in order. User-facing progress goes to
//! the writer passed in (stdout in production), diagnostics go to `tracing`.

use crate::error::NewsRagError;
use crate::extract::{ArticleSource, Extraction};
use crate::llm::{AskAsync, ask_for_analysis};
use crate::models::{ArticleMetadata, ExtractedArticle};
use crate::outputs::console::display_reply;
use crate::prompt::build_prompt;
use crate::search::NewsSearch;
use crate::utils::truncate_for_log;
use std::io::Write;
use tracing::{debug, info, instrument, warn};

/// What a successful run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub articles: Vec<ExtractedArticle>,
    pub reply: String,
}

/// Limits for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Results requested from the search API.
    pub num_articles: usize,
    /// Successful extractions after which candidates stop being tried.
    pub max_articles: usize,
}

/// Extract candidates in ranking order until `max_articles` succeed.
///
/// Failures are skipped, never retried. Candidates after the last needed
/// success are not touched.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len(), max_articles = max_articles))]
pub async fn collect_articles<E, W>(
    candidates: Vec<ArticleMetadata>,
    extractor: &E,
    max_articles: usize,
    out: &mut W,
) -> Result<Vec<ExtractedArticle>, NewsRagError>
where
    E: ArticleSource,
    W: Write,
{
    let mut successful = Vec::new();

    for (idx, article) in candidates.into_iter().enumerate() {
        if successful.len() >= max_articles {
            break;
        }
        let idx = idx + 1;
        writeln!(out, "Attempting to extract content from Article {idx}: {}", article.link)?;

        match extractor.extract(&article.link).await {
            Extraction::Extracted(full_text) => {
                writeln!(out, "Successfully extracted Article {idx}")?;
                debug!(idx, preview = %truncate_for_log(&full_text, 120), "Article text");
                successful.push(ExtractedArticle::new(article, full_text));
            }
            Extraction::Failed { reason } => {
                if let Some(reason) = reason {
                    writeln!(out, "Failed to extract text from {}: {reason}", article.link)?;
                }
                writeln!(out, "Failed to extract Article {idx}, skipping.")?;
                warn!(idx, link = %article.link, "Skipping article");
            }
        }
    }

    info!(count = successful.len(), "Collected article texts");
    Ok(successful)
}

/// Run the whole pipeline for `query` and print the reply to `out`.
#[instrument(level = "info", skip(search, extractor, llm, out))]
pub async fn run<S, E, L, W>(
    query: &str,
    limits: RunLimits,
    search: &S,
    extractor: &E,
    llm: &L,
    out: &mut W,
) -> Result<RunOutcome, NewsRagError>
where
    S: NewsSearch,
    E: ArticleSource,
    L: AskAsync<Response = String>,
    W: Write,
{
    writeln!(out, "\nFetching up to {} news articles...\n", limits.num_articles)?;
    let candidates = search.search(query, limits.num_articles).await?;
    if candidates.is_empty() {
        return Err(NewsRagError::NoResults);
    }

    let articles = collect_articles(candidates, extractor, limits.max_articles, out).await?;
    match articles.len() {
        0 => return Err(NewsRagError::NoArticlesExtracted),
        n if n < limits.max_articles => {
            writeln!(out, "\nOnly {n} articles were successfully retrieved.\n")?;
        }
        n => writeln!(out, "\nSuccessfully retrieved {n} articles.\n")?,
    }

    let prompt = build_prompt(&articles);
    debug!(bytes = prompt.len(), "Built prompt");

    writeln!(out, "Sending data to the LLM for processing...\n")?;
    info!(model = llm.model(), "Requesting analysis");
    let reply = ask_for_analysis(llm, &prompt).await?;

    display_reply(out, &reply)?;
    Ok(RunOutcome { articles, reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FAILED_PLACEHOLDER;
    use crate::llm::LlmError;
    use crate::search::SearchError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const LIMITS: RunLimits = RunLimits {
        num_articles: 10,
        max_articles: 5,
    };

    struct FakeSearch {
        results: Result<Vec<ArticleMetadata>, u16>,
        calls: RefCell<usize>,
    }

    impl FakeSearch {
        fn returning(n: usize) -> Self {
            let results = (1..=n)
                .map(|i| ArticleMetadata {
                    title: format!("Title {i}"),
                    link: format!("https://news.example.com/{i}"),
                    source: "Wire".to_string(),
                    published_date: "today".to_string(),
                    snippet: String::new(),
                })
                .collect();
            Self {
                results: Ok(results),
                calls: RefCell::new(0),
            }
        }
    }

    impl NewsSearch for FakeSearch {
        async fn search(
            &self,
            _query: &str,
            num_articles: usize,
        ) -> Result<Vec<ArticleMetadata>, SearchError> {
            *self.calls.borrow_mut() += 1;
            match &self.results {
                Ok(results) => Ok(results.iter().take(num_articles).cloned().collect()),
                Err(status) => Err(SearchError::Api {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    /// Succeeds for every link except the listed failures.
    #[derive(Default)]
    struct FakeExtractor {
        failures: HashMap<String, Option<String>>,
        attempted: RefCell<Vec<String>>,
    }

    impl FakeExtractor {
        fn failing(links: &[(usize, Option<&str>)]) -> Self {
            Self {
                failures: links
                    .iter()
                    .map(|(i, reason)| {
                        (
                            format!("https://news.example.com/{i}"),
                            reason.map(str::to_string),
                        )
                    })
                    .collect(),
                attempted: RefCell::new(Vec::new()),
            }
        }
    }

    impl ArticleSource for FakeExtractor {
        async fn extract(&self, url: &str) -> Extraction {
            self.attempted.borrow_mut().push(url.to_string());
            match self.failures.get(url) {
                Some(reason) => Extraction::Failed {
                    reason: reason.clone(),
                },
                None => Extraction::Extracted(format!("Body of {url}")),
            }
        }
    }

    struct FakeLlm {
        reply: Result<String, ()>,
        prompts: RefCell<Vec<String>>,
    }

    impl FakeLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl AskAsync for FakeLlm {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, LlmError> {
            self.prompts.borrow_mut().push(text.to_string());
            self.reply.clone().map_err(|_| LlmError::NoChoices)
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    #[tokio::test]
    async fn test_three_articles_end_to_end() {
        let search = FakeSearch::returning(3);
        let extractor = FakeExtractor::default();
        let llm = FakeLlm::replying("Acme rose on strong guidance.");
        let mut out = Vec::new();

        let outcome = run("Acme Corp stock", LIMITS, &search, &extractor, &llm, &mut out)
            .await
            .unwrap();

        assert_eq!(outcome.articles.len(), 3);
        assert_eq!(outcome.reply, "Acme rose on strong guidance.");

        let prompts = llm.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Here are 3 news articles:\n\n"));
        assert!(prompts[0].contains("Article 3:\nTitle: Title 3\nContent: Body of https://news.example.com/3\n\n"));

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("\nFetching up to 10 news articles...\n"));
        assert!(printed.contains("Attempting to extract content from Article 1: https://news.example.com/1"));
        assert!(printed.contains("Successfully extracted Article 3"));
        assert!(printed.contains("\nOnly 3 articles were successfully retrieved.\n"));
        assert!(printed.contains("Sending data to the LLM for processing..."));
        assert!(printed.contains("--- LLM Response ---\n\nAcme rose on strong guidance.\n"));
        assert!(!printed.contains("fake-model"));
    }

    #[tokio::test]
    async fn test_stops_after_five_successes() {
        let search = FakeSearch::returning(10);
        let extractor = FakeExtractor::default();
        let llm = FakeLlm::replying("ok");
        let mut out = Vec::new();

        let outcome = run("q", LIMITS, &search, &extractor, &llm, &mut out).await.unwrap();

        assert_eq!(outcome.articles.len(), 5);
        assert_eq!(extractor.attempted.borrow().len(), 5);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("\nSuccessfully retrieved 5 articles.\n"));
        assert!(!printed.contains("Only"));
        assert!(!printed.contains("Article 6"));
    }

    #[tokio::test]
    async fn test_failures_are_skipped_in_order() {
        let search = FakeSearch::returning(10);
        let extractor = FakeExtractor::failing(&[(2, None), (4, Some("connection reset"))]);
        let mut out = Vec::new();

        let articles = collect_articles(
            search.results.clone().unwrap(),
            &extractor,
            5,
            &mut out,
        )
        .await
        .unwrap();

        let titles: Vec<_> = articles.iter().map(|a| a.title()).collect();
        assert_eq!(titles, vec!["Title 1", "Title 3", "Title 5", "Title 6", "Title 7"]);
        assert_eq!(extractor.attempted.borrow().len(), 7);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Failed to extract Article 2, skipping."));
        assert!(printed.contains(
            "Failed to extract text from https://news.example.com/4: connection reset"
        ));
        assert!(!printed.contains("Failed to extract text from https://news.example.com/2"));
        assert!(!printed.contains(FAILED_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_huge_article_limit_does_not_preallocate() {
        let search = FakeSearch::returning(2);
        let extractor = FakeExtractor::default();
        let mut out = Vec::new();

        let articles = collect_articles(
            search.results.clone().unwrap(),
            &extractor,
            usize::MAX,
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(extractor.attempted.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_no_results_never_extracts() {
        let search = FakeSearch::returning(0);
        let extractor = FakeExtractor::default();
        let llm = FakeLlm::replying("unused");
        let mut out = Vec::new();

        let err = run("q", LIMITS, &search, &extractor, &llm, &mut out).await.unwrap_err();

        assert!(matches!(err, NewsRagError::NoResults));
        assert_eq!(err.to_string(), "No news articles found for the given query.");
        assert!(extractor.attempted.borrow().is_empty());
        assert!(llm.prompts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_search_error_is_fatal() {
        let search = FakeSearch {
            results: Err(500),
            calls: RefCell::new(0),
        };
        let extractor = FakeExtractor::default();
        let llm = FakeLlm::replying("unused");
        let mut out = Vec::new();

        let err = run("q", LIMITS, &search, &extractor, &llm, &mut out).await.unwrap_err();
        assert!(matches!(err, NewsRagError::Search(_)));
        assert_eq!(*search.calls.borrow(), 1);
        assert!(extractor.attempted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_all_extractions_failing_is_fatal() {
        let search = FakeSearch::returning(2);
        let extractor = FakeExtractor::failing(&[(1, None), (2, None)]);
        let llm = FakeLlm::replying("unused");
        let mut out = Vec::new();

        let err = run("q", LIMITS, &search, &extractor, &llm, &mut out).await.unwrap_err();
        assert!(matches!(err, NewsRagError::NoArticlesExtracted));
        assert!(llm.prompts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_llm_error_is_fatal() {
        let search = FakeSearch::returning(1);
        let extractor = FakeExtractor::default();
        let llm = FakeLlm {
            reply: Err(()),
            prompts: RefCell::new(Vec::new()),
        };
        let mut out = Vec::new();

        let err = run("q", LIMITS, &search, &extractor, &llm, &mut out).await.unwrap_err();
        assert!(matches!(err, NewsRagError::Llm(LlmError::NoChoices)));
        let printed = String::from_utf8(out).unwrap();
        assert!(!printed.contains("Response ---"));
    }
}
