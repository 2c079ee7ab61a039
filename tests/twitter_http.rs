// tests/twitter_http.rs
use sentiment_collector::scrapers::twitter::TwitterScraper;
use sentiment_collector::scrapers::Scraper;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scraper_for(server: &MockServer) -> TwitterScraper {
    TwitterScraper::new("test-bearer", None)
        .unwrap()
        .with_endpoint(format!("{}/2/tweets/search/recent", server.uri()))
}

fn search_body(ids: &[&str], next_token: Option<&str>) -> serde_json::Value {
    json!({
        "data": ids.iter().map(|id| json!({
            "id": id,
            "text": format!("tweet {id}"),
            "author_id": "7",
            "created_at": "2025-02-01T10:00:00.000Z",
            "public_metrics": {
                "retweet_count": 1,
                "like_count": 2,
                "reply_count": 0,
                "quote_count": 0,
            }
        })).collect::<Vec<_>>(),
        "includes": { "users": [{ "id": "7", "username": "alice" }] },
        "meta": { "next_token": next_token },
    })
}

#[tokio::test]
async fn limit_truncates_without_further_upstream_calls() {
    let server = MockServer::start().await;

    // More tweets than the limit plus a next_token; `expect(1)` asserts the
    // token is never followed.
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_body(&["1", "2", "3"], Some("n2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let posts = scraper_for(&server).fetch("tariffs", 2).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "1");
    assert_eq!(posts[1].id, "2");
    assert_eq!(posts[0].source, "twitter");
    assert_eq!(posts[0].author.as_deref(), Some("alice"));
    assert_eq!(
        posts[0].url.as_deref(),
        Some("https://twitter.com/alice/status/1")
    );
}

#[tokio::test]
async fn pagination_follows_next_token_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param_is_missing("next_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_body(&["1", "2"], Some("n2"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("next_token", "n2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["3"], None)))
        .expect(1)
        .mount(&server)
        .await;

    let posts = scraper_for(&server).fetch("tariffs", 10).await.unwrap();

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn endless_next_token_with_empty_pages_is_bounded() {
    let server = MockServer::start().await;

    // Empty result pages that always carry a cursor must not loop forever.
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[], Some("again"))))
        .expect(10)
        .mount(&server)
        .await;

    let posts = scraper_for(&server).fetch("tariffs", 5).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn upstream_rejection_is_a_fetch_error_not_an_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = scraper_for(&server).fetch("tariffs", 2).await.unwrap_err();
    assert!(err.to_string().contains("search response status"));
}

#[tokio::test]
async fn limit_zero_makes_no_upstream_calls() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 and fail the fetch.
    let posts = scraper_for(&server).fetch("tariffs", 0).await.unwrap();
    assert!(posts.is_empty());
}
