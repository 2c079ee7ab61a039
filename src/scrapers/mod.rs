// src/scrapers/mod.rs
//
// One module per source. Each scraper owns its credential validation
// (construction fails fast, before any network call) and its own raw wire
// schema, decoded with serde at the network boundary so normalization works
// on typed fields.

pub mod facebook;
pub mod reddit;
pub mod twitter;

use anyhow::Result;

use crate::types::Post;

/// Capability contract for one source.
///
/// `fetch` returns at most `limit` normalized posts for `topic` and must
/// stop issuing upstream requests once the bound is reached. A failure is a
/// single error outcome, distinguishable from a successful empty result.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<Post>>;
    fn name(&self) -> &'static str;
}
