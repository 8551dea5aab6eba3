use crate::feed::fetcher::Fetcher;
use crate::util::validate_url;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

static FEED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(?:feed|rss|atom)(?:/|\.xml)?$").expect("FEED_PATH regex is valid")
});

static ALTERNATE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[rel~="alternate"][href]"#).expect("ALTERNATE_LINK selector is valid")
});

/// Errors that can occur while locating a site's feed.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Every candidate was fetched (or failed to fetch) without a feed marker.
    #[error("no feed found for {site} after {tried} candidates")]
    NotFound { site: String, tried: usize },
}

/// Finds the RSS/Atom feed of a site.
///
/// A URL that already looks like a feed (`/feed`, `/rss`, `/atom`, with an
/// optional trailing `/` or `.xml`) is returned as is. Otherwise each suffix in
/// `candidates` is appended to the site URL and fetched in order; the first body
/// carrying an `<rss`, `<feed` or `<channel` marker wins. As a last resort the
/// site root is scanned for a `<link rel="alternate">` pointing at a feed.
///
/// # Errors
///
/// [`LocateError::NotFound`] when no candidate produced a feed.
pub async fn locate(fetcher: &Fetcher, candidates: &[String], site_url: &str) -> Result<String, LocateError> {
    let site = Url::parse(site_url.trim()).map_err(|e| LocateError::InvalidUrl(format!("{site_url}: {e}")))?;
    if is_feed_url(&site) {
        return Ok(site_url.trim().to_owned());
    }

    let base = site_url.trim().trim_end_matches('/');
    let mut tried = 0;

    for suffix in candidates {
        let candidate = format!("{base}{suffix}");
        tried += 1;
        match fetcher.fetch(&candidate).await {
            Ok(body) if looks_like_feed(&body) => {
                tracing::info!(site = %site_url, feed = %candidate, "Located feed");
                return Ok(candidate);
            }
            Ok(_) => tracing::debug!(candidate = %candidate, "Candidate is not a feed"),
            Err(e) => tracing::debug!(candidate = %candidate, error = %e, "Candidate unreachable"),
        }
    }

    tried += 1;
    if let Some(advertised) = discover_from_root(fetcher, &site).await {
        match fetcher.fetch(&advertised).await {
            Ok(body) if looks_like_feed(&body) => {
                tracing::info!(site = %site_url, feed = %advertised, "Located feed via alternate link");
                return Ok(advertised);
            }
            Ok(_) => tracing::debug!(candidate = %advertised, "Advertised feed is not a feed"),
            Err(e) => tracing::debug!(candidate = %advertised, error = %e, "Advertised feed unreachable"),
        }
    }

    Err(LocateError::NotFound {
        site: site_url.to_owned(),
        tried,
    })
}

/// Whether the URL path already names a feed endpoint.
pub fn is_feed_url(url: &Url) -> bool {
    FEED_PATH.is_match(url.path())
}

/// Body sniffing; response headers are not trusted.
pub fn looks_like_feed(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("<rss") || lower.contains("<feed") || lower.contains("<channel")
}

async fn discover_from_root(fetcher: &Fetcher, site: &Url) -> Option<String> {
    let body = match fetcher.fetch(site.as_str()).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(site = %site, error = %e, "Site root unreachable");
            return None;
        }
    };
    let href = find_feed_link_in_html(&body, site)?;

    // A page may only point us at its own origin or at a public host.
    let parsed = Url::parse(&href).ok()?;
    if parsed.host_str() != site.host_str() {
        if let Err(e) = validate_url(&href) {
            tracing::warn!(site = %site, href = %href, error = %e, "Ignoring advertised feed URL");
            return None;
        }
    }
    Some(href)
}

/// First `<link rel="alternate">` with an RSS or Atom type, resolved against `base`.
fn find_feed_link_in_html(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&ALTERNATE_LINK)
        .filter(|link| {
            link.value()
                .attr("type")
                .map(|t| t.to_ascii_lowercase())
                .is_some_and(|t| t.contains("application/rss+xml") || t.contains("application/atom+xml"))
        })
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| resolve_url(href.trim(), base))
}

/// Resolves a potentially relative URL; only http(s) results are returned.
fn resolve_url(href: &str, base: &Url) -> Option<String> {
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchConfig, StrategyConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Site</title></channel></rss>"#;

    fn fetcher() -> Fetcher {
        Fetcher::new(FetchConfig {
            retries: 0,
            min_body_len: 10,
            strategies: vec![StrategyConfig::direct(5)],
            ..FetchConfig::default()
        })
        .unwrap()
    }

    fn candidates() -> Vec<String> {
        crate::config::LocatorConfig::default().candidates
    }

    #[test]
    fn test_feed_url_patterns() {
        for url in [
            "https://example.com/feed",
            "https://example.com/feed/",
            "https://example.com/esportes/feed/",
            "https://example.com/rss",
            "https://example.com/rss.xml",
            "https://example.com/ATOM.xml",
        ] {
            assert!(is_feed_url(&Url::parse(url).unwrap()), "{url}");
        }
        for url in ["https://example.com", "https://example.com/feeds/news", "https://example.com/rssfeed"] {
            assert!(!is_feed_url(&Url::parse(url).unwrap()), "{url}");
        }
    }

    #[test]
    fn test_feed_markers() {
        assert!(looks_like_feed("<?xml version='1.0'?><RSS version='2.0'>"));
        assert!(looks_like_feed("<feed xmlns=\"http://www.w3.org/2005/Atom\">"));
        assert!(!looks_like_feed("<!DOCTYPE html><html><body>Not found</body></html>"));
    }

    #[test]
    fn test_find_rss_link_in_html() {
        let html = r#"<html><head><link rel="alternate" type="application/rss+xml" href="/feed.xml"></head></html>"#;
        let base = Url::parse("https://example.com/blog").unwrap();
        assert_eq!(
            find_feed_link_in_html(html, &base).as_deref(),
            Some("https://example.com/feed.xml")
        );
    }

    #[test]
    fn test_find_atom_link_skips_non_feed_alternates() {
        let html = r#"<head>
            <link rel="alternate" hreflang="en" href="/en/">
            <link type="application/atom+xml" rel="alternate" href="//cdn.example.com/atom.xml">
        </head>"#;
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            find_feed_link_in_html(html, &base).as_deref(),
            Some("https://cdn.example.com/atom.xml")
        );
    }

    #[test]
    fn test_no_feed_link_in_html() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(find_feed_link_in_html("<html><body>hi</body></html>", &base), None);
        assert_eq!(resolve_url("javascript:alert(1)", &base), None);
    }

    #[tokio::test]
    async fn test_feed_url_returned_without_probing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .expect(0)
            .mount(&server)
            .await;

        let url = format!("{}/esportes/feed/", server.uri());
        assert_eq!(locate(&fetcher(), &candidates(), &url).await.unwrap(), url);
    }

    #[tokio::test]
    async fn test_second_candidate_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>this is a landing page, not a feed at all</body></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let found = locate(&fetcher(), &candidates(), &format!("{}/", server.uri()))
            .await
            .unwrap();
        assert_eq!(found, format!("{}/feed", server.uri()));
    }

    #[tokio::test]
    async fn test_alternate_link_is_last_resort() {
        let server = MockServer::start().await;
        let html = r#"<html><head><link rel="alternate" type="application/rss+xml" href="/noticias.xml"></head><body>home</body></html>"#;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/noticias.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let found = locate(&fetcher(), &candidates(), &server.uri()).await.unwrap();
        assert_eq!(found, format!("{}/noticias.xml", server.uri()));
    }

    #[tokio::test]
    async fn test_exhausted_candidates_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = locate(&fetcher(), &candidates(), &server.uri()).await.unwrap_err();
        match err {
            LocateError::NotFound { tried, .. } => assert_eq!(tried, candidates().len() + 1),
            e => panic!("Expected NotFound, got {e:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_site_url() {
        let err = locate(&fetcher(), &candidates(), "not a url").await.unwrap_err();
        assert!(matches!(err, LocateError::InvalidUrl(_)));
    }
}
