//! Sentiment Collector — Binary Entrypoint
//! Parses the CLI, builds the configured scrapers, runs one collection and
//! writes the result as JSON or CSV.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use sentiment_collector::cli::{Cli, OutputFormat, SourceKind};
use sentiment_collector::collector::Collector;
use sentiment_collector::output::{write_csv, write_json};
use sentiment_collector::scrapers::facebook::FacebookScraper;
use sentiment_collector::scrapers::reddit::RedditScraper;
use sentiment_collector::scrapers::twitter::TwitterScraper;
use sentiment_collector::scrapers::Scraper;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// Build one scraper per requested source. A source whose configuration is
/// missing is skipped with an error log; the run only aborts when nothing
/// could be configured at all.
fn build_scrapers(args: &Cli) -> Vec<Arc<dyn Scraper>> {
    let mut scrapers: Vec<Arc<dyn Scraper>> = Vec::new();
    let mut seen = HashSet::new();

    for source in &args.sources {
        if !seen.insert(*source) {
            continue;
        }
        let built: Result<Arc<dyn Scraper>> = match source {
            SourceKind::Reddit => RedditScraper::from_env().map(|s| Arc::new(s) as _),
            SourceKind::Twitter => {
                let language = args.twitter_language.clone();
                if let Some(path) = &args.twitter_token_file {
                    TwitterScraper::from_token_file(path, language).map(|s| Arc::new(s) as _)
                } else if let Some(bearer) = &args.twitter_bearer {
                    TwitterScraper::new(bearer.clone(), language).map(|s| Arc::new(s) as _)
                } else {
                    TwitterScraper::from_env(language).map(|s| Arc::new(s) as _)
                }
            }
            SourceKind::Facebook => build_facebook(args).map(|s| Arc::new(s) as _),
        };
        match built {
            Ok(scraper) => scrapers.push(scraper),
            Err(e) => error!(source = %source, error = ?e, "skipping source: configuration error"),
        }
    }

    scrapers
}

/// Pages and token resolve independently (flag or env each, via clap), so
/// the error names the piece that is actually missing.
fn build_facebook(args: &Cli) -> Result<FacebookScraper> {
    match (&args.facebook_pages, &args.facebook_token) {
        (Some(pages), Some(token)) => FacebookScraper::new(pages.clone(), token.clone()),
        (None, _) => Err(anyhow!(
            "missing Facebook pages (--facebook-pages or FACEBOOK_PAGES)"
        )),
        (_, None) => Err(anyhow!(
            "missing Facebook access token (--facebook-token or FACEBOOK_ACCESS_TOKEN)"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Cli::parse();

    let scrapers = build_scrapers(&args);
    if scrapers.is_empty() {
        bail!("no scrapers could be configured");
    }

    let mut collector = Collector::new(scrapers);
    if let Some(secs) = args.timeout_secs {
        collector = collector.with_timeout(Duration::from_secs(secs));
    }

    let report = collector.collect(&args.topic, args.limit).await;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", args.topic, args.format.extension())));
    match args.format {
        OutputFormat::Json => write_json(&report.posts, &path)?,
        OutputFormat::Csv => write_csv(&report.posts, &path)?,
    }

    info!(
        posts = report.posts.len(),
        errors = report.errors.len(),
        path = %path.display(),
        "collection finished"
    );

    Ok(())
}
