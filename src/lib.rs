// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod cli;
pub mod collector;
pub mod output;
pub mod scrapers;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::collector::{CollectObserver, Collector, TracingObserver};
pub use crate::scrapers::Scraper;
pub use crate::types::{CollectionReport, MetaValue, Post};
