// src/scrapers/reddit.rs
use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::scrapers::Scraper;
use crate::types::{MetaValue, Post};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const SEARCH_URL: &str = "https://oauth.reddit.com/search";
const DEFAULT_USER_AGENT: &str = "sentiment-collector/0.1";

/// Reddit caps listing pages at 100 items.
const MAX_PAGE_SIZE: usize = 100;

/// Upstream listing pages followed per fetch. Bounds a server that keeps
/// handing out cursors while every item gets skipped in normalization.
const MAX_PAGES: usize = 10;

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self> {
        fn var(name: &str) -> Result<String> {
            std::env::var(name).map_err(|_| {
                anyhow!("missing environment variable {name} required for the Reddit scraper")
            })
        }
        Ok(Self {
            client_id: var("REDDIT_CLIENT_ID")?,
            client_secret: var("REDDIT_CLIENT_SECRET")?,
            username: var("REDDIT_USERNAME")?,
            password: var("REDDIT_PASSWORD")?,
            user_agent: std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
            ("user_agent", &self.user_agent),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("incomplete Reddit credentials: {}", missing.join(", ")))
        }
    }
}

// ---- Raw wire schema (search listing) ----

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawSubmission,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSubmission {
    #[serde(default)]
    id: Option<String>,
    /// Fullname, e.g. "t3_abc123". Fallback identifier when `id` is absent.
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    num_comments: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Forum-style scraper over Reddit's search API (password-grant OAuth).
#[derive(Debug)]
pub struct RedditScraper {
    credentials: RedditCredentials,
    client: reqwest::Client,
    token_url: String,
    search_url: String,
}

impl RedditScraper {
    pub fn new(credentials: RedditCredentials) -> Result<Self> {
        credentials.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(credentials.user_agent.clone())
            .build()
            .context("building Reddit http client")?;
        Ok(Self {
            credentials,
            client,
            token_url: TOKEN_URL.to_string(),
            search_url: SEARCH_URL.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(RedditCredentials::from_env()?)
    }

    /// Point the scraper at alternative endpoints (local stub servers).
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        search_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.search_url = search_url.into();
        self
    }

    async fn access_token(&self) -> Result<String> {
        let resp = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .context("reddit token request")?
            .error_for_status()
            .context("reddit token response status")?;
        let token: TokenResponse = resp.json().await.context("decoding reddit token response")?;
        Ok(token.access_token)
    }

    async fn search_page(
        &self,
        token: &str,
        topic: &str,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<Listing> {
        let mut query: Vec<(&str, String)> = vec![
            ("q", topic.to_string()),
            ("limit", page_size.to_string()),
            ("type", "link".to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }
        let resp = self
            .client
            .get(&self.search_url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .context("reddit search request")?
            .error_for_status()
            .context("reddit search response status")?;
        resp.json().await.context("decoding reddit search listing")
    }

    /// Normalize one submission. Returns None when the item carries no
    /// stable identifier (id, fullname, or url); the original fell back to
    /// a text prefix there, which collides across posts sharing a prefix,
    /// so such items are skipped instead.
    fn to_post(&self, raw: &RawSubmission, topic: &str) -> Option<Post> {
        let url = raw
            .url
            .clone()
            .or_else(|| raw.permalink.clone())
            .map(|u| {
                if u.starts_with("http") {
                    u
                } else {
                    format!("https://www.reddit.com{u}")
                }
            });

        let id = raw
            .id
            .clone()
            .or_else(|| raw.name.clone())
            .or_else(|| url.clone())?;

        // Richest text wins: selftext, then comment body, then title.
        let text = [&raw.selftext, &raw.body, &raw.title]
            .into_iter()
            .find_map(|f| f.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_string();

        let created_at = raw
            .created_utc
            .filter(|ts| ts.is_finite() && *ts >= 0.0)
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0));

        let mut metadata = BTreeMap::new();
        if let Some(score) = raw.score {
            metadata.insert("score".to_string(), MetaValue::Int(score));
        }
        if let Some(subreddit) = &raw.subreddit {
            metadata.insert("subreddit".to_string(), MetaValue::from(subreddit.clone()));
        }
        if let Some(num_comments) = raw.num_comments {
            metadata.insert("num_comments".to_string(), MetaValue::Int(num_comments));
        }

        Some(Post {
            id,
            source: self.name().to_string(),
            topic: topic.to_string(),
            text,
            url,
            author: raw.author.clone(),
            created_at,
            metadata,
        })
    }
}

#[async_trait]
impl Scraper for RedditScraper {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let token = self.access_token().await?;
        let page_size = limit.min(MAX_PAGE_SIZE);
        let mut posts = Vec::with_capacity(page_size);
        let mut after: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self
                .search_page(&token, topic, page_size, after.as_deref())
                .await?;
            for child in &page.data.children {
                if let Some(post) = self.to_post(&child.data, topic) {
                    posts.push(post);
                    if posts.len() >= limit {
                        return Ok(posts);
                    }
                }
            }
            match page.data.after {
                Some(cursor) if !cursor.is_empty() => after = Some(cursor),
                _ => break,
            }
        }

        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> RedditScraper {
        RedditScraper::new(RedditCredentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            username: "user".into(),
            password: "pass".into(),
            user_agent: "test-agent".into(),
        })
        .unwrap()
    }

    fn raw(json: &str) -> RawSubmission {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn incomplete_credentials_fail_construction() {
        let err = RedditScraper::new(RedditCredentials {
            client_id: "id".into(),
            client_secret: "".into(),
            username: "user".into(),
            password: "  ".into(),
            user_agent: "ua".into(),
        })
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("client_secret"));
        assert!(msg.contains("password"));
    }

    #[test]
    fn selftext_beats_title_and_permalink_is_absolutized() {
        let s = scraper();
        let post = s
            .to_post(
                &raw(r#"{"id":"abc","title":"A title","selftext":"The body","permalink":"/r/rust/comments/abc","author":"u1","created_utc":1700000000.0,"score":12,"subreddit":"rust","num_comments":3}"#),
                "rust",
            )
            .unwrap();
        assert_eq!(post.text, "The body");
        assert_eq!(
            post.url.as_deref(),
            Some("https://www.reddit.com/r/rust/comments/abc")
        );
        assert_eq!(post.metadata["score"], MetaValue::Int(12));
        assert_eq!(post.metadata["num_comments"], MetaValue::Int(3));
        assert!(post.created_at.is_some());
    }

    #[test]
    fn missing_timestamp_and_metrics_are_omitted() {
        let s = scraper();
        let post = s
            .to_post(&raw(r#"{"id":"abc","title":"Only a title"}"#), "rust")
            .unwrap();
        assert_eq!(post.text, "Only a title");
        assert!(post.created_at.is_none());
        assert!(post.metadata.is_empty());
    }

    #[test]
    fn item_without_stable_identifier_is_skipped() {
        let s = scraper();
        assert!(s
            .to_post(&raw(r#"{"title":"No id at all"}"#), "rust")
            .is_none());
        // A url alone is enough.
        let post = s
            .to_post(
                &raw(r#"{"title":"t","url":"https://example.test/x"}"#),
                "rust",
            )
            .unwrap();
        assert_eq!(post.id, "https://example.test/x");
    }

    #[test]
    fn normalization_is_idempotent() {
        let s = scraper();
        let item = raw(r#"{"id":"abc","selftext":"same","created_utc":1700000000.0,"score":1}"#);
        let a = s.to_post(&item, "rust").unwrap();
        let b = s.to_post(&item, "rust").unwrap();
        assert_eq!(a, b);
    }
}
