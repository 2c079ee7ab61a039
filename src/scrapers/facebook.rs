// src/scrapers/facebook.rs
use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::scrapers::Scraper;
use crate::types::{MetaValue, Post};

const GRAPH_URL: &str = "https://graph.facebook.com/v19.0";

const FEED_FIELDS: &str =
    "id,message,created_time,permalink_url,from,reactions.summary(true),comments.summary(true),shares";
const FEED_PAGE_SIZE: usize = 25;

/// Upstream feed pages fetched per configured page handle.
const PAGE_REQUEST_LIMIT: usize = 5;

// ---- Raw wire schema (Graph API page feed) ----

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    data: Vec<RawPagePost>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPagePost {
    id: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    permalink_url: Option<String>,
    #[serde(default)]
    from: Option<RawAuthor>,
    #[serde(default)]
    reactions: Option<Summarized>,
    #[serde(default)]
    comments: Option<Summarized>,
    #[serde(default)]
    shares: Option<ShareCount>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Summarized {
    #[serde(default)]
    summary: Option<Summary>,
}

#[derive(Debug, Clone, Deserialize)]
struct Summary {
    #[serde(default)]
    total_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ShareCount {
    #[serde(default)]
    count: Option<i64>,
}

/// Page-feed scraper over the Graph API. The feed endpoint has no topic
/// search, so posts are filtered by case-insensitive substring match on the
/// message, page by page, until the limit is reached.
#[derive(Debug)]
pub struct FacebookScraper {
    pages: Vec<String>,
    access_token: String,
    client: reqwest::Client,
    base_url: String,
}

impl FacebookScraper {
    pub fn new(pages: Vec<String>, access_token: impl Into<String>) -> Result<Self> {
        let pages: Vec<String> = pages
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if pages.is_empty() {
            return Err(anyhow!("at least one Facebook page must be configured"));
        }
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(anyhow!("empty access token for the Facebook scraper"));
        }
        Ok(Self {
            pages,
            access_token,
            client: reqwest::Client::new(),
            base_url: GRAPH_URL.to_string(),
        })
    }

    /// Point the scraper at an alternative Graph endpoint (local stub servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn feed_page(&self, url: &str, with_params: bool) -> Result<FeedResponse> {
        let mut req = self.client.get(url);
        if with_params {
            let params: [(&str, String); 3] = [
                ("fields", FEED_FIELDS.to_string()),
                ("limit", FEED_PAGE_SIZE.to_string()),
                ("access_token", self.access_token.clone()),
            ];
            req = req.query(&params);
        }
        let resp = req
            .send()
            .await
            .context("facebook feed request")?
            .error_for_status()
            .context("facebook feed response status")?;
        resp.json().await.context("decoding facebook feed response")
    }

    fn to_post(&self, raw: &RawPagePost, topic: &str, page: &str) -> Post {
        let created_at = raw.created_time.as_deref().and_then(parse_graph_time);

        let mut metadata = BTreeMap::new();
        if let Some(likes) = raw
            .reactions
            .as_ref()
            .and_then(|r| r.summary.as_ref())
            .and_then(|s| s.total_count)
        {
            metadata.insert("likes".to_string(), MetaValue::Int(likes));
        }
        if let Some(comments) = raw
            .comments
            .as_ref()
            .and_then(|c| c.summary.as_ref())
            .and_then(|s| s.total_count)
        {
            metadata.insert("comments".to_string(), MetaValue::Int(comments));
        }
        if let Some(shares) = raw.shares.as_ref().and_then(|s| s.count) {
            metadata.insert("shares".to_string(), MetaValue::Int(shares));
        }
        metadata.insert("page".to_string(), MetaValue::from(page));

        Post {
            id: raw.id.clone(),
            source: self.name().to_string(),
            topic: topic.to_string(),
            text: raw.message.clone().unwrap_or_default(),
            url: raw.permalink_url.clone(),
            author: raw.from.as_ref().and_then(|f| f.name.clone()),
            created_at,
            metadata,
        }
    }
}

/// Graph timestamps come as RFC 3339 or as "+0000"-style offsets.
fn parse_graph_time(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn matches_topic(message: &str, topic_lower: &str) -> bool {
    message.to_lowercase().contains(topic_lower)
}

#[async_trait]
impl Scraper for FacebookScraper {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let topic_lower = topic.to_lowercase();
        let mut posts = Vec::new();

        for page in &self.pages {
            let mut url = format!("{}/{}/posts", self.base_url, page);
            let mut with_params = true;

            for _ in 0..PAGE_REQUEST_LIMIT {
                let feed = self.feed_page(&url, with_params).await?;
                for raw in &feed.data {
                    let message = raw.message.as_deref().unwrap_or_default();
                    if !matches_topic(message, &topic_lower) {
                        continue;
                    }
                    posts.push(self.to_post(raw, topic, page));
                    if posts.len() >= limit {
                        return Ok(posts);
                    }
                }
                // `next` is a pre-signed absolute url.
                match feed.paging.and_then(|p| p.next) {
                    Some(next) if !next.is_empty() => {
                        url = next;
                        with_params = false;
                    }
                    _ => break,
                }
            }
        }

        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "facebook"
    }
}
