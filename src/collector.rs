// src/collector.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future::join_all;

use crate::scrapers::Scraper;
use crate::types::CollectionReport;

/// Observability sink for one collection run. Injected so the core carries
/// no process-wide logging state; the default forwards to `tracing`.
pub trait CollectObserver: Send + Sync {
    fn scraper_succeeded(&self, scraper: &str, posts: usize);
    fn scraper_failed(&self, scraper: &str, message: &str);
}

#[derive(Debug, Default)]
pub struct TracingObserver;

impl CollectObserver for TracingObserver {
    fn scraper_succeeded(&self, scraper: &str, posts: usize) {
        tracing::info!(scraper, posts, "scraper finished");
    }

    fn scraper_failed(&self, scraper: &str, message: &str) {
        tracing::warn!(scraper, %message, "scraper failed");
    }
}

/// Runs every configured scraper concurrently and merges the results.
///
/// One scraper failing never aborts the run and never cancels a sibling's
/// in-flight work; the failure becomes one entry in the report's `errors`.
/// Merge order is always scraper-configuration order, independent of which
/// task finishes first. Failed scrapers are not retried within one
/// `collect` call; re-invoke `collect` if a retry is wanted.
pub struct Collector {
    scrapers: Vec<Arc<dyn Scraper>>,
    observer: Arc<dyn CollectObserver>,
    timeout: Option<Duration>,
}

impl Collector {
    pub fn new(scrapers: Vec<Arc<dyn Scraper>>) -> Self {
        Self {
            scrapers,
            observer: Arc::new(TracingObserver),
            timeout: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CollectObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Per-scraper deadline. On expiry the scraper counts as failed
    /// (an error entry, not a truncated post list) while siblings run on.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn collect(&self, topic: &str, limit: usize) -> CollectionReport {
        // One task per scraper; `limit` applies per scraper, not globally.
        let tasks: Vec<_> = self
            .scrapers
            .iter()
            .map(|scraper| {
                let scraper = Arc::clone(scraper);
                let topic = topic.to_string();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    match timeout {
                        Some(deadline) => {
                            match tokio::time::timeout(deadline, scraper.fetch(&topic, limit)).await
                            {
                                Ok(outcome) => outcome,
                                Err(_) => Err(anyhow!("timed out after {deadline:?}")),
                            }
                        }
                        None => scraper.fetch(&topic, limit).await,
                    }
                })
            })
            .collect();

        // join_all preserves task order, which is configuration order.
        let outcomes = join_all(tasks).await;

        let mut report = CollectionReport::default();
        for (scraper, joined) in self.scrapers.iter().zip(outcomes) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => Err(anyhow!("task panicked: {join_err}")),
            };
            match outcome {
                Ok(mut posts) => {
                    self.observer.scraper_succeeded(scraper.name(), posts.len());
                    report.posts.append(&mut posts);
                }
                Err(e) => {
                    let message = format!("{} scraper failed: {e:#}", scraper.name());
                    self.observer.scraper_failed(scraper.name(), &message);
                    report.errors.push(message);
                }
            }
        }
        report
    }
}
