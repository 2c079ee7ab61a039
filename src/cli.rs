// src/cli.rs
use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Scrape social content for sentiment analysis.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Topic or keyword to search for
    pub topic: String,

    /// Maximum number of posts to collect from each source
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Sources to include in the scrape
    #[arg(long, value_enum, num_args = 1.., default_values_t = [SourceKind::Reddit])]
    pub sources: Vec<SourceKind>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Output path. Defaults to ./<topic>.<format>
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Per-source timeout in seconds; a source exceeding it counts as failed
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Bearer token for the Twitter recent-search API
    #[arg(long, env = "TWITTER_BEARER_TOKEN", hide_env_values = true)]
    pub twitter_bearer: Option<String>,

    /// Path to a file containing the Twitter bearer token
    #[arg(long)]
    pub twitter_token_file: Option<PathBuf>,

    /// Restrict Twitter search to a specific language (ISO code)
    #[arg(long)]
    pub twitter_language: Option<String>,

    /// Specific Facebook page handles to scrape
    #[arg(long, num_args = 1.., value_delimiter = ',', env = "FACEBOOK_PAGES")]
    pub facebook_pages: Option<Vec<String>>,

    /// Facebook Graph API access token
    #[arg(long, env = "FACEBOOK_ACCESS_TOKEN", hide_env_values = true)]
    pub facebook_token: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Reddit,
    Twitter,
    Facebook,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Reddit => "reddit",
            SourceKind::Twitter => "twitter",
            SourceKind::Facebook => "facebook",
        };
        f.write_str(s)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
