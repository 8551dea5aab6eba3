use crate::config::{FetchConfig, StrategyConfig, StrategyKind, Unwrap};
use encoding_rs::{Encoding, UTF_8};
use futures::StreamExt;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

const MAX_REDIRECTS: usize = 10;
const ACCEPT_VALUE: &str = "application/rss+xml, application/xml, text/xml, text/html, */*";

/// How far into the body we look for an in-document charset declaration.
const SNIFF_WINDOW: usize = 1024;

static DECLARED_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:encoding|charset)\s*=\s*["']?([a-z0-9._:-]+)"#)
        .expect("DECLARED_CHARSET regex is valid")
});

/// Why a single attempt (one strategy, one try) did not produce content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, redirect loop, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// Decoded body is too short to be a real document.
    #[error("Body too short ({len} chars)")]
    TooShort { len: usize },
    #[error("Response too large")]
    ResponseTooLarge,
    /// Relay answered, but its JSON envelope did not carry the content.
    #[error("Relay envelope unusable: {0}")]
    Envelope(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether another try with the same strategy could plausibly succeed.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout | FetchError::TooShort { .. } => true,
            FetchError::HttpStatus(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Every configured strategy failed for one target.
#[derive(Debug, Error)]
#[error("all {attempts} fetch strategies failed for {url}: {last}")]
pub struct FetchFailure {
    pub url: String,
    /// Number of strategies tried.
    pub attempts: usize,
    #[source]
    pub last: FetchError,
}

/// HTTP client that walks an ordered chain of fetch strategies.
///
/// The first strategy is normally a direct request; the rest relay the request
/// through public CORS proxies for origins that refuse direct access. Each
/// strategy gets its own timeout and a small number of retries before the next
/// one is tried.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Builds the underlying HTTP client from the fetch configuration.
    ///
    /// Decompression of gzip, deflate and brotli bodies is handled by the client.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let ad_hosts = config.ad_hosts.clone();
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if is_ad_host(attempt.url(), &ad_hosts) {
                // Hand the 3xx back to the caller, which ends the fetch quietly.
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(policy)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `url`, trying each strategy in order until one yields content.
    ///
    /// Returns the decoded body of the first successful strategy. A redirect into
    /// a blocklisted ad host counts as success with an empty body.
    ///
    /// # Errors
    ///
    /// [`FetchFailure`] once every strategy has failed; it carries the cause of
    /// the last attempt.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        let mut last = FetchError::InvalidUrl(url.to_string());
        let mut attempts = 0;

        for strategy in &self.config.strategies {
            attempts += 1;
            match self.fetch_via(strategy, url).await {
                Ok(body) => {
                    tracing::debug!(
                        url = %url,
                        strategy = %strategy.name,
                        bytes = body.len(),
                        "Fetched"
                    );
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        strategy = %strategy.name,
                        error = %e,
                        "Fetch strategy failed, trying next"
                    );
                    last = e;
                }
            }
        }

        Err(FetchFailure {
            url: url.to_string(),
            attempts,
            last,
        })
    }

    /// One strategy, with retries and exponential backoff for transient failures.
    async fn fetch_via(&self, strategy: &StrategyConfig, target: &str) -> Result<String, FetchError> {
        let request_url = request_url(strategy, target)?;
        let mut retry_count = 0;

        loop {
            match self.attempt(strategy, &request_url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && retry_count < self.config.retries => {
                    let delay = self.config.retry_backoff() * 2u32.pow(retry_count);
                    tracing::debug!(
                        url = %target,
                        strategy = %strategy.name,
                        attempt = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, strategy: &StrategyConfig, request_url: &Url) -> Result<String, FetchError> {
        let download = async {
            let response = self
                .client
                .get(request_url.clone())
                .header(ACCEPT, ACCEPT_VALUE)
                .send()
                .await?;

            let status = response.status();
            if status.is_redirection() {
                let target = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| response.url().join(loc).ok());
                if let Some(target) = target.filter(|t| is_ad_host(t, &self.config.ad_hosts)) {
                    tracing::info!(url = %request_url, redirect = %target, "Redirect into ad host, treating as empty");
                    return Ok(None);
                }
                return Err(FetchError::HttpStatus(status.as_u16()));
            }
            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let bytes = read_limited_bytes(response, self.config.max_body_bytes).await?;
            Ok::<_, FetchError>(Some(decode_body(&bytes, content_type.as_deref())))
        };

        let body = match tokio::time::timeout(strategy.timeout(), download).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout),
        };
        let Some(body) = body else {
            return Ok(String::new());
        };

        let body = match strategy.unwrap {
            Unwrap::Text => body,
            Unwrap::Json => unwrap_envelope(&body, &strategy.json_field)?,
        };

        let len = body.trim().chars().count();
        if len < self.config.min_body_len {
            return Err(FetchError::TooShort { len });
        }
        Ok(body)
    }
}

fn request_url(strategy: &StrategyConfig, target: &str) -> Result<Url, FetchError> {
    let raw = match strategy.kind {
        StrategyKind::Direct => target.to_string(),
        StrategyKind::Relay => {
            let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
            format!("{}{}", strategy.prefix, encoded)
        }
    };
    Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))
}

fn is_ad_host(url: &Url, ad_hosts: &[String]) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        ad_hosts
            .iter()
            .any(|ad| !ad.is_empty() && host.contains(&ad.to_ascii_lowercase()))
    })
}

fn unwrap_envelope(body: &str, field: &str) -> Result<String, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Envelope(e.to_string()))?;
    value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| FetchError::Envelope(format!("missing string field '{field}'")))
}

/// Decodes a body using the declared charset, falling back to UTF-8.
///
/// The `Content-Type` charset wins; otherwise the XML prolog `encoding=` or an
/// HTML `<meta charset>` in the first kilobyte is used. A BOM overrides both.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared_in = |text: &str| {
        DECLARED_CHARSET
            .captures(text)
            .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
    };
    let declared = content_type.and_then(declared_in).or_else(|| {
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_WINDOW)]);
        declared_in(&head)
    });

    let (text, encoding, had_errors) = declared.unwrap_or(UTF_8).decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Body contained undecodable bytes");
    }
    text.into_owned()
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
