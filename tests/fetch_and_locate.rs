//! Integration tests for the acquisition path: strategy fallback, feed
//! location and extraction, against a local mock HTTP server.

use newswire::config::{FetchConfig, LocatorConfig, StrategyConfig, Unwrap};
use newswire::feed::{locate, parse_feed, Fetcher, LocateError};
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Jornal Local</title>
  <item><title>Test</title><link>http://x/a</link></item>
</channel></rss>"#;

fn fetch_config(strategies: Vec<StrategyConfig>) -> FetchConfig {
    FetchConfig {
        retries: 0,
        retry_backoff_ms: 10,
        strategies,
        ..FetchConfig::default()
    }
}

#[test]
fn test_single_item_feed_is_extracted() {
    let outcome = parse_feed("<rss><channel><item><title>Test</title><link>http://x/a</link></item></channel></rss>");
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].title, "Test");
    assert_eq!(outcome.items[0].link, "http://x/a");
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn test_timed_out_strategy_falls_back_to_relay() {
    let server = MockServer::start().await;
    let target = format!("{}/slow/feed", server.uri());

    Mock::given(method("GET"))
        .and(path("/slow/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", target.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fetch_config(vec![
        StrategyConfig::direct(1),
        StrategyConfig::relay("local", &format!("{}/relay?url=", server.uri()), Unwrap::Text, 5),
    ]))
    .unwrap();

    let body = fetcher.fetch(&target).await.unwrap();
    assert_eq!(body, FEED);
    assert_eq!(parse_feed(&body).source, "Jornal Local");
}

#[tokio::test]
async fn test_every_strategy_failing_reports_the_last_cause() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fetch_config(vec![
        StrategyConfig::direct(2),
        StrategyConfig::relay("local", &format!("{}/relay?url=", server.uri()), Unwrap::Text, 2),
    ]))
    .unwrap();

    let failure = fetcher.fetch(&format!("{}/gone", server.uri())).await.unwrap_err();
    assert_eq!(failure.attempts, 2);
    assert!(failure.to_string().contains("404"), "{failure}");
}

#[tokio::test]
async fn test_locator_finds_feed_under_site_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fetch_config(vec![StrategyConfig::direct(5)])).unwrap();
    let candidates = LocatorConfig::default().candidates;

    let found = locate(&fetcher, &candidates, &server.uri()).await.unwrap();
    assert_eq!(found, format!("{}/feed/", server.uri()));

    let outcome = parse_feed(&fetcher.fetch(&found).await.unwrap());
    assert_eq!(outcome.items.len(), 1);
}

#[tokio::test]
async fn test_locator_gives_up_when_nothing_looks_like_a_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Portal</title></head><body>Sem feed aqui, só notícias.</body></html>"),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fetch_config(vec![StrategyConfig::direct(5)])).unwrap();
    let candidates = LocatorConfig::default().candidates;

    let err = locate(&fetcher, &candidates, &server.uri()).await.unwrap_err();
    assert!(matches!(err, LocateError::NotFound { tried: 7, .. }), "{err:?}");
}
