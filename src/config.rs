//! Configuration loading and resolution.
//!
//! Settings come from three layers, highest precedence first:
//!
//! 1. Command-line flags and their environment variables (see [`crate::cli`])
//! 2. The optional YAML config file (`--config`)
//! 3. Built-in defaults
//!
//! API keys add a final interactive layer: when no earlier source provides a
//! non-empty key, the user is prompted for it on stdin.

use crate::cli::Cli;
use crate::error::NewsRagError;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_NUM_ARTICLES: usize = 10;
pub const DEFAULT_MAX_ARTICLES: usize = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const SERPAPI_KEY_PROMPT: &str = "Enter your SerpApi API Key: ";
pub const OPENAI_KEY_PROMPT: &str = "Enter your OpenAI API Key: ";
pub const QUERY_PROMPT: &str = "Enter your search query for Google News: ";

/// Contents of the YAML config file. Every field is optional.
///
/// ```yaml
/// model: gpt-4o
/// num_articles: 8
/// openai_base_url: http://localhost:11434/v1
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub serpapi_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub num_articles: Option<usize>,
    pub max_articles: Option<usize>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub serpapi_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub user_agent: Option<String>,
}

impl AppConfig {
    /// Load a config file from disk.
    #[instrument(level = "info")]
    pub fn load(path: &Path) -> Result<Self, NewsRagError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NewsRagError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml(&raw)
            .map_err(|e| NewsRagError::Config(format!("{}: {e}", path.display())))?;
        info!("Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

/// Fully resolved, non-secret settings for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub num_articles: usize,
    pub max_articles: usize,
    pub max_tokens: u32,
    pub temperature: f64,
    pub serpapi_base_url: String,
    pub openai_base_url: String,
    pub user_agent: Option<String>,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &AppConfig) -> Result<Self, NewsRagError> {
        let settings = Self {
            model: cli
                .model
                .clone()
                .or_else(|| config.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            num_articles: cli
                .num_articles
                .or(config.num_articles)
                .unwrap_or(DEFAULT_NUM_ARTICLES),
            max_articles: config.max_articles.unwrap_or(DEFAULT_MAX_ARTICLES),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            serpapi_base_url: config
                .serpapi_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SERPAPI_BASE_URL.to_string()),
            openai_base_url: config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            user_agent: config.user_agent.clone(),
        };

        if settings.num_articles == 0 {
            return Err(NewsRagError::Config("num_articles must be at least 1".into()));
        }
        if settings.max_articles == 0 {
            return Err(NewsRagError::Config("max_articles must be at least 1".into()));
        }
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

/// Line-oriented interactive input.
pub trait Prompter {
    /// Show `label` and return the line the user typed, without its newline.
    fn prompt(&mut self, label: &str) -> io::Result<String>;
}

/// Prompts on stdout and reads from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(label.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// One place a secret can come from.
#[derive(Debug, Clone, Copy)]
pub enum SecretSource<'a> {
    /// A value already resolved by clap from a flag or environment variable.
    Flag(Option<&'a str>),
    /// A value from the config file.
    File(Option<&'a str>),
    /// Ask the user; always yields a value, possibly empty.
    Prompt(&'a str),
}

/// Walk `sources` in order and return the first non-empty value.
///
/// A prompt answer is trimmed and accepted even when blank. When no source
/// yields anything the result is an empty string.
pub fn resolve_secret<P: Prompter>(
    name: &str,
    sources: &[SecretSource<'_>],
    prompter: &mut P,
) -> io::Result<String> {
    for source in sources {
        let value = match source {
            SecretSource::Flag(v) | SecretSource::File(v) => v
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            SecretSource::Prompt(label) => Some(prompter.prompt(label)?.trim().to_string()),
        };
        if let Some(value) = value {
            debug!(name, source = source.kind(), "Resolved secret");
            return Ok(value);
        }
    }
    Ok(String::new())
}

impl SecretSource<'_> {
    fn kind(&self) -> &'static str {
        match self {
            SecretSource::Flag(_) => "flag_or_env",
            SecretSource::File(_) => "config_file",
            SecretSource::Prompt(_) => "prompt",
        }
    }
}

/// The two API keys a run needs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub serpapi_api_key: String,
    pub openai_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("serpapi_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn resolve<P: Prompter>(
        cli: &Cli,
        config: &AppConfig,
        prompter: &mut P,
    ) -> Result<Self, NewsRagError> {
        let serpapi_api_key = resolve_secret(
            "serpapi_api_key",
            &[
                SecretSource::Flag(cli.serpapi_api_key.as_deref()),
                SecretSource::File(config.serpapi_api_key.as_deref()),
                SecretSource::Prompt(SERPAPI_KEY_PROMPT),
            ],
            prompter,
        )?;
        let openai_api_key = resolve_secret(
            "openai_api_key",
            &[
                SecretSource::Flag(cli.openai_api_key.as_deref()),
                SecretSource::File(config.openai_api_key.as_deref()),
                SecretSource::Prompt(OPENAI_KEY_PROMPT),
            ],
            prompter,
        )?;
        Ok(Self {
            serpapi_api_key,
            openai_api_key,
        })
    }
}

/// Take the query from the command line, or ask for it.
///
/// Fails with [`NewsRagError::EmptyQuery`] when the trimmed query is empty.
pub fn collect_query<P: Prompter>(
    cli_query: Option<&str>,
    prompter: &mut P,
) -> Result<String, NewsRagError> {
    let query = match cli_query {
        Some(q) => q.trim().to_string(),
        None => prompter.prompt(QUERY_PROMPT)?.trim().to_string(),
    };
    if query.is_empty() {
        return Err(NewsRagError::EmptyQuery);
    }
    Ok(query)
}
