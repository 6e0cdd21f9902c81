//! Command-line interface definitions for news_rag.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! API keys can also be provided through environment variables; anything
//! still missing after the config file is asked for interactively.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news_rag application.
///
/// # Examples
///
/// ```sh
/// # Fully interactive: prompts for missing keys and the query
/// news_rag
///
/// # Query on the command line, keys from the environment
/// SERPAPI_API_KEY=... OPENAI_API_KEY=... news_rag "Acme Corp stock"
///
/// # Settings from a config file, run report written as JSON
/// news_rag -c ./news_rag.yaml -j ./reports "Acme Corp stock"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search query; prompted for when omitted
    pub query: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SerpApi API key
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Chat model to send the articles to (default: gpt-4)
    #[arg(long)]
    pub model: Option<String>,

    /// Number of search results to request (default: 10)
    #[arg(short, long)]
    pub num_articles: Option<usize>,

    /// Directory for a JSON report of the run
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,
}
