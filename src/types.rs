// src/types.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scalar metadata value. Sources report engagement counters and context
/// labels in different shapes; everything lands here as a plain scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Str(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Str(v)
    }
}

/// Normalized representation of one social post, source-agnostic.
///
/// Immutable after construction. `id` is unique per `(source, id)` only,
/// never globally. `metadata` holds source-specific counters; keys whose
/// upstream value was absent are omitted entirely, never stored as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub source: String,
    /// The search topic that produced this post (query echo, not extracted
    /// from content).
    pub topic: String,
    pub text: String,
    pub url: Option<String>,
    pub author: Option<String>,
    /// None when the source does not expose a reliable creation time.
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: BTreeMap<String, MetaValue>,
}

/// Result of one collection run: posts merged across scrapers in
/// configuration order, plus one message per scraper that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    pub posts: Vec<Post>,
    pub errors: Vec<String>,
}
