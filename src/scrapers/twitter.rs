// src/scrapers/twitter.rs
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::scrapers::Scraper;
use crate::types::{MetaValue, Post};

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const ENV_BEARER: &str = "TWITTER_BEARER_TOKEN";

/// The recent-search endpoint accepts 10..=100 results per page.
const MIN_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Upstream pages followed per fetch. Bounds a server that keeps handing
/// out a `next_token` alongside empty result pages.
const MAX_PAGES: usize = 10;

// ---- Raw wire schema (v2 recent search) ----

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawTweet>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTweet {
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Clone, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    retweet_count: Option<i64>,
    #[serde(default)]
    like_count: Option<i64>,
    #[serde(default)]
    reply_count: Option<i64>,
    #[serde(default)]
    quote_count: Option<i64>,
}

/// Microblog-style scraper over the Twitter v2 recent-search API.
#[derive(Debug)]
pub struct TwitterScraper {
    bearer: String,
    language: Option<String>,
    client: reqwest::Client,
    search_url: String,
}

impl TwitterScraper {
    pub fn new(bearer: impl Into<String>, language: Option<String>) -> Result<Self> {
        let bearer = bearer.into();
        if bearer.trim().is_empty() {
            return Err(anyhow!("empty bearer token for the Twitter scraper"));
        }
        let client = reqwest::Client::new();
        Ok(Self {
            bearer,
            language,
            client,
            search_url: SEARCH_URL.to_string(),
        })
    }

    pub fn from_env(language: Option<String>) -> Result<Self> {
        let bearer = std::env::var(ENV_BEARER).map_err(|_| {
            anyhow!("missing environment variable {ENV_BEARER} required for the Twitter scraper")
        })?;
        Self::new(bearer, language)
    }

    /// Read the bearer token from a file (one token, surrounding whitespace
    /// ignored). A missing file is a configuration error.
    pub fn from_token_file(path: impl AsRef<Path>, language: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let token = std::fs::read_to_string(path)
            .with_context(|| format!("Twitter token file not found: {}", path.display()))?;
        Self::new(token.trim().to_string(), language)
    }

    /// Point the scraper at an alternative endpoint (local stub servers).
    pub fn with_endpoint(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    fn query_for(&self, topic: &str) -> String {
        match &self.language {
            Some(lang) => format!("{topic} lang:{lang}"),
            None => topic.to_string(),
        }
    }

    async fn search_page(
        &self,
        topic: &str,
        page_size: usize,
        next_token: Option<&str>,
    ) -> Result<SearchResponse> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", self.query_for(topic)),
            ("max_results", page_size.to_string()),
            ("tweet.fields", "created_at,public_metrics,author_id".to_string()),
            ("expansions", "author_id".to_string()),
            ("user.fields", "username".to_string()),
        ];
        if let Some(token) = next_token {
            query.push(("next_token", token.to_string()));
        }
        let resp = self
            .client
            .get(&self.search_url)
            .bearer_auth(&self.bearer)
            .query(&query)
            .send()
            .await
            .context("twitter search request")?
            .error_for_status()
            .context("twitter search response status")?;
        resp.json().await.context("decoding twitter search response")
    }

    fn to_post(&self, raw: &RawTweet, usernames: &HashMap<&str, &str>, topic: &str) -> Post {
        let author = raw
            .author_id
            .as_deref()
            .and_then(|id| usernames.get(id))
            .map(|u| u.to_string());

        // Canonical status url; the i/web form resolves without a username.
        let url = match &author {
            Some(username) => format!("https://twitter.com/{username}/status/{}", raw.id),
            None => format!("https://twitter.com/i/web/status/{}", raw.id),
        };

        let created_at = raw
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let mut metadata = BTreeMap::new();
        if let Some(metrics) = &raw.public_metrics {
            if let Some(retweets) = metrics.retweet_count {
                metadata.insert("retweets".to_string(), MetaValue::Int(retweets));
            }
            if let Some(likes) = metrics.like_count {
                metadata.insert("likes".to_string(), MetaValue::Int(likes));
            }
            if let Some(replies) = metrics.reply_count {
                metadata.insert("replies".to_string(), MetaValue::Int(replies));
            }
            if let Some(quotes) = metrics.quote_count {
                metadata.insert("quotes".to_string(), MetaValue::Int(quotes));
            }
        }

        Post {
            id: raw.id.clone(),
            source: self.name().to_string(),
            topic: topic.to_string(),
            text: raw.text.clone().unwrap_or_default(),
            url: Some(url),
            author,
            created_at,
            metadata,
        }
    }
}

#[async_trait]
impl Scraper for TwitterScraper {
    async fn fetch(&self, topic: &str, limit: usize) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let page_size = limit.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        let mut posts = Vec::with_capacity(limit.min(MAX_PAGE_SIZE));
        let mut next_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self
                .search_page(topic, page_size, next_token.as_deref())
                .await?;
            let usernames: HashMap<&str, &str> = page
                .includes
                .users
                .iter()
                .map(|u| (u.id.as_str(), u.username.as_str()))
                .collect();
            for tweet in &page.data {
                posts.push(self.to_post(tweet, &usernames, topic));
                if posts.len() >= limit {
                    return Ok(posts);
                }
            }
            match page.meta.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> TwitterScraper {
        TwitterScraper::new("token", None).unwrap()
    }

    #[test]
    fn empty_bearer_fails_construction() {
        assert!(TwitterScraper::new("  ", None).is_err());
    }

    #[test]
    fn missing_token_file_fails_construction() {
        let err = TwitterScraper::from_token_file("/nonexistent/token.txt", None).unwrap_err();
        assert!(err.to_string().contains("token file not found"));
    }

    #[test]
    fn language_filter_lands_in_query() {
        let s = TwitterScraper::new("token", Some("cs".to_string())).unwrap();
        assert_eq!(s.query_for("tariffs"), "tariffs lang:cs");
        assert_eq!(scraper().query_for("tariffs"), "tariffs");
    }

    #[test]
    fn tweet_normalizes_with_author_lookup() {
        let raw: RawTweet = serde_json::from_str(
            r#"{"id":"99","text":"hi","author_id":"7","created_at":"2025-02-01T10:00:00.000Z",
                "public_metrics":{"retweet_count":1,"like_count":2,"reply_count":0,"quote_count":0}}"#,
        )
        .unwrap();
        let usernames = HashMap::from([("7", "alice")]);
        let post = scraper().to_post(&raw, &usernames, "tariffs");
        assert_eq!(post.author.as_deref(), Some("alice"));
        assert_eq!(post.url.as_deref(), Some("https://twitter.com/alice/status/99"));
        assert_eq!(post.metadata["retweets"], MetaValue::Int(1));
        assert_eq!(post.metadata["likes"], MetaValue::Int(2));
        assert!(post.created_at.is_some());
    }

    #[test]
    fn malformed_timestamp_is_dropped_not_zero_filled() {
        let raw: RawTweet =
            serde_json::from_str(r#"{"id":"99","text":"hi","created_at":"not-a-date"}"#).unwrap();
        let post = scraper().to_post(&raw, &HashMap::new(), "tariffs");
        assert!(post.created_at.is_none());
        assert_eq!(post.url.as_deref(), Some("https://twitter.com/i/web/status/99"));
        assert!(post.metadata.is_empty());
    }
}
