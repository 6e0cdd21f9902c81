//! # news_rag
//!
//! Search recent news for a query, scrape the article bodies, and ask an
//! OpenAI-compatible LLM to analyze them.
//!
//! ## Usage
//!
//! ```sh
//! news_rag "Acme Corp stock"
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline, every stage running once:
//! 1. **Configuration**: Resolve API keys (flag/env → config file → prompt) and the query
//! 2. **Search**: Fetch up to 10 ranked news results from SerpApi
//! 3. **Extraction**: Scrape result pages in order until 5 bodies are extracted
//! 4. **Analysis**: Send the articles in one prompt to the chat-completion API
//! 5. **Output**: Print the reply, optionally write a JSON report
//!
//! Any fatal condition prints its message and exits with status 1.

use chrono::Local;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod llm;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod search;
mod utils;

use cli::Cli;
use config::{AppConfig, Credentials, Settings, StdinPrompter, collect_query};
use error::NewsRagError;
use extract::ArticleExtractor;
use llm::{ChatCompletionClient, ChatSettings};
use models::RunReport;
use outputs::json;
use pipeline::RunLimits;
use search::SerpApiClient;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_rag starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.json_output_dir, "Parsed CLI arguments");

    let result = run_app(args).await;

    let elapsed = start_time.elapsed();
    match result {
        Ok(()) => {
            info!(?elapsed, "Execution complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{e}");
            if let Some(hint) = e.hint() {
                println!("{hint}");
            }
            error!(?elapsed, error = %e, "Execution failed");
            ExitCode::FAILURE
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn run_app(args: Cli) -> Result<(), NewsRagError> {
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let settings = Settings::resolve(&args, &config)?;

    let mut prompter = StdinPrompter;
    let credentials = Credentials::resolve(&args, &config, &mut prompter)?;
    let query = collect_query(args.query.as_deref(), &mut prompter)?;
    info!(%query, "Collected search query");

    // Early check: ensure the report dir is writable before spending API calls
    if let Some(dir) = &args.json_output_dir {
        ensure_writable_dir(dir).await.map_err(|e| {
            NewsRagError::Config(format!(
                "JSON output directory {} is not writable: {e}",
                dir.display()
            ))
        })?;
    }

    let mut http = reqwest::Client::builder();
    if let Some(user_agent) = &settings.user_agent {
        http = http.user_agent(user_agent);
    }
    let http = http
        .build()
        .map_err(|e| NewsRagError::Config(format!("cannot build HTTP client: {e}")))?;

    let search = SerpApiClient::new(
        http.clone(),
        &settings.serpapi_base_url,
        credentials.serpapi_api_key,
    );
    let extractor = ArticleExtractor::new(http.clone());
    let llm = ChatCompletionClient::new(
        http,
        &settings.openai_base_url,
        credentials.openai_api_key,
        ChatSettings {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
    );
    let limits = RunLimits {
        num_articles: settings.num_articles,
        max_articles: settings.max_articles,
    };

    let mut stdout = io::stdout();
    let outcome = pipeline::run(&query, limits, &search, &extractor, &llm, &mut stdout).await?;

    // ---- Optional JSON report ----
    if let Some(dir) = &args.json_output_dir {
        let now = Local::now();
        let report = RunReport {
            query,
            local_date: now.date_naive().to_string(),
            local_time: now.time().format("%H:%M:%S").to_string(),
            model: settings.model,
            articles: outcome.articles,
            reply: outcome.reply,
        };
        match json::write_report(&report, dir).await {
            Ok(path) => info!(path = %path.display(), "Wrote run report"),
            Err(e) => warn!(error = %e, "Failed to write run report"),
        }
    }

    Ok(())
}
