//! Article body extraction.
//!
//! Pages are downloaded with a plain GET and reduced to their main readable
//! text by a readability-style heuristic:
//!
//! 1. Every `<p>` with at least [`MIN_PARAGRAPH_CHARS`] characters credits its
//!    text length to its parent element, and half of it to its grandparent.
//!    `<body>` only collects credit from paragraphs directly under it and
//!    `<html>` never does.
//! 2. Each credited element's score is weighted by its tag and class/id names
//!    (`footer`/`nav`/`aside` and boilerplate-looking names are penalised,
//!    content-looking names boosted).
//! 3. The paragraphs of the best-scoring element become the article body,
//!    minus any nested inside boilerplate elements.
//!
//! Download and parse failures never escape this module; they are reported
//! as [`Extraction::Failed`] so the caller can skip the article.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Text reported for an article whose body could not be retrieved.
pub const FAILED_PLACEHOLDER: &str = "Content could not be retrieved.";

/// Paragraphs shorter than this do not count towards a container's score.
const MIN_PARAGRAPH_CHARS: usize = 25;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static UNLIKELY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)comment|footer|footnote|masthead|nav|sidebar|sponsor|share|social|promo|related|advert|\bads?\b|cookie|newsletter|subscribe|popup|menu|breadcrumb",
    )
    .unwrap()
});

static LIKELY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)article|body|content|entry|main|post|story|text").unwrap());

/// Outcome of extracting one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Non-empty, trimmed body text.
    Extracted(String),
    /// Nothing usable. `reason` is set when the download or parse raised an error,
    /// and is `None` when the page simply had no body text.
    Failed { reason: Option<String> },
}

impl Extraction {
    pub fn is_success(&self) -> bool {
        matches!(self, Extraction::Extracted(_))
    }

    /// The body text, or [`FAILED_PLACEHOLDER`] for a failure.
    pub fn text(&self) -> &str {
        match self {
            Extraction::Extracted(text) => text,
            Extraction::Failed { .. } => FAILED_PLACEHOLDER,
        }
    }

    fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Extraction::Failed { reason: None }
        } else {
            Extraction::Extracted(text.to_string())
        }
    }
}

/// Anything that can turn an article URL into its body text.
pub trait ArticleSource {
    async fn extract(&self, url: &str) -> Extraction;
}

/// Downloads pages over HTTP and runs the body-text heuristic on them.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    http: reqwest::Client,
}

impl ArticleExtractor {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn download(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let url = Url::parse(url)?;
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

impl ArticleSource for ArticleExtractor {
    #[instrument(level = "info", skip(self))]
    async fn extract(&self, url: &str) -> Extraction {
        match self.download(url).await {
            Ok(html) => {
                let extraction = Extraction::from_text(&extract_main_text(&html));
                if extraction.is_success() {
                    info!(bytes = extraction.text().len(), "Extracted article text");
                } else {
                    warn!(html_bytes = html.len(), "Page produced no article text");
                }
                extraction
            }
            Err(e) => {
                warn!(error = %e, "Article download failed");
                Extraction::Failed {
                    reason: Some(e.to_string()),
                }
            }
        }
    }
}

/// Extract the main body text of an HTML page.
///
/// Returns an empty string when the page has no paragraph text at all.
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut index: HashMap<_, usize> = HashMap::new();
    let mut candidates: Vec<(ElementRef, f64)> = Vec::new();

    for paragraph in document.select(&PARAGRAPH) {
        let len = normalize(&paragraph.text().collect::<String>()).chars().count();
        if len < MIN_PARAGRAPH_CHARS {
            continue;
        }

        for (depth, ancestor) in paragraph
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(2)
            .enumerate()
        {
            match ancestor.value().name() {
                "html" => continue,
                "body" if depth > 0 => continue,
                _ => {}
            }
            let slot = *index.entry(ancestor.id()).or_insert_with(|| {
                candidates.push((ancestor, 0.0));
                candidates.len() - 1
            });
            candidates[slot].1 += len as f64 / (depth + 1) as f64;
        }
    }

    let best = candidates
        .into_iter()
        .map(|(el, score)| (el, score * name_weight(&el)))
        .fold(None, |best: Option<(ElementRef, f64)>, (el, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((el, score)),
        });

    let paragraphs: Vec<String> = match best {
        Some((el, score)) => {
            debug!(tag = el.value().name(), score, "Selected content container");
            paragraph_texts(el.select(&PARAGRAPH), Some(el))
        }
        None => paragraph_texts(document.select(&PARAGRAPH), None),
    };

    paragraphs.iter().join("\n\n")
}

fn paragraph_texts<'a>(
    paragraphs: impl Iterator<Item = ElementRef<'a>>,
    container: Option<ElementRef<'a>>,
) -> Vec<String> {
    paragraphs
        .filter(|p| !inside_boilerplate(*p, container))
        .map(|p| normalize(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// True when `paragraph`, or an element between it and `container`, looks
/// like page chrome rather than article content.
fn inside_boilerplate(paragraph: ElementRef, container: Option<ElementRef>) -> bool {
    let stop = container.map(|c| c.id());
    std::iter::once(paragraph)
        .chain(paragraph.ancestors().filter_map(ElementRef::wrap))
        .take_while(|el| Some(el.id()) != stop)
        .any(|el| is_boilerplate(&el))
}

fn is_boilerplate(el: &ElementRef) -> bool {
    matches!(el.value().name(), "footer" | "nav" | "aside")
        || UNLIKELY.is_match(&id_and_class(el))
}

fn id_and_class(el: &ElementRef) -> String {
    let value = el.value();
    format!(
        "{} {}",
        value.attr("class").unwrap_or_default(),
        value.id().unwrap_or_default()
    )
}

fn name_weight(el: &ElementRef) -> f64 {
    let value = el.value();
    let names = id_and_class(el);

    let mut weight = 1.0;
    if matches!(value.name(), "footer" | "nav" | "aside") {
        weight *= 0.2;
    }
    if UNLIKELY.is_match(&names) {
        weight *= 0.2;
    }
    if LIKELY.is_match(&names) {
        weight *= 1.5;
    }
    if value.name() == "article" {
        weight *= 1.5;
    }
    weight
}

fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
