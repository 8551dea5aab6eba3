//! Configuration file parser for `newswire.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::storage::{Category, Status};
use crate::util::validate_url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Fetch Strategies
// ============================================================================

/// How a strategy reaches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Plain GET against the target URL.
    #[default]
    Direct,
    /// GET against `prefix + percent-encoded target`.
    Relay,
}

/// How a relay wraps the upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unwrap {
    /// The relay passes the upstream body through untouched.
    #[default]
    Text,
    /// The relay answers with a JSON envelope; the body sits in `json_field`.
    Json,
}

/// One entry of the ordered fetch fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub name: String,
    pub kind: StrategyKind,
    /// Relay URL prefix, e.g. `https://corsproxy.io/?url=`.
    pub prefix: String,
    pub unwrap: Unwrap,
    pub json_field: String,
    pub timeout_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: "direct".to_string(),
            kind: StrategyKind::Direct,
            prefix: String::new(),
            unwrap: Unwrap::Text,
            json_field: "contents".to_string(),
            timeout_secs: 20,
        }
    }
}

impl StrategyConfig {
    pub fn direct(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            ..Self::default()
        }
    }

    pub fn relay(name: &str, prefix: &str, unwrap: Unwrap, timeout_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            kind: StrategyKind::Relay,
            prefix: prefix.to_string(),
            unwrap,
            timeout_secs,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Bodies larger than this are refused while streaming.
    pub max_body_bytes: usize,
    /// Bodies shorter than this count as a failed attempt.
    pub min_body_len: usize,
    /// Extra attempts per strategy before moving to the next one.
    pub retries: u32,
    pub retry_backoff_ms: u64,
    /// Redirects into these hosts end the fetch with an empty body.
    pub ad_hosts: Vec<String>,
    pub strategies: Vec<StrategyConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
            min_body_len: 50,
            retries: 2,
            retry_backoff_ms: 2000,
            ad_hosts: vec![
                "clvrads".to_string(),
                "rubiconproject".to_string(),
                "doubleclick".to_string(),
            ],
            strategies: vec![
                StrategyConfig::direct(20),
                StrategyConfig::relay(
                    "codetabs",
                    "https://api.codetabs.com/v1/proxy?quest=",
                    Unwrap::Text,
                    12,
                ),
                StrategyConfig::relay("corsproxy", "https://corsproxy.io/?url=", Unwrap::Text, 12),
                StrategyConfig::relay(
                    "allorigins-raw",
                    "https://api.allorigins.win/raw?url=",
                    Unwrap::Text,
                    12,
                ),
                StrategyConfig::relay(
                    "allorigins-get",
                    "https://api.allorigins.win/get?url=",
                    Unwrap::Json,
                    12,
                ),
            ],
        }
    }
}

impl FetchConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

// ============================================================================
// Feed Location
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Suffixes appended to a bare site URL, probed in order.
    pub candidates: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            candidates: ["/feed/", "/feed", "/rss", "/feed/rss/", "/atom.xml", "/rss.xml"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

// ============================================================================
// Crawl Policy
// ============================================================================

/// Where newly accepted articles go relative to the existing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    NewestFirst,
    Append,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard page ceiling per source.
    pub max_pages: u32,
    /// Consecutive empty (or failed) pages that end a source.
    pub empty_page_cutoff: u32,
    /// Pause between consecutive requests to the same origin.
    pub request_delay_ms: u64,
    /// Query parameter carrying the page number for pages after the first.
    pub page_param: String,
    /// Items older than this are skipped by policy (0 = no limit).
    pub max_age_days: u32,
    pub dedup_by_title: bool,
    pub placement: Placement,
    /// Sort the whole collection by date and renumber ids after a merge.
    pub reindex: bool,
    /// Sources crawled in parallel. Pages within one source are always sequential.
    pub concurrency: usize,
    /// How many feed-provided category labels become tags.
    pub max_feed_tags: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 15,
            empty_page_cutoff: 2,
            request_delay_ms: 800,
            page_param: "paged".to_string(),
            max_age_days: 730,
            dedup_by_title: true,
            placement: Placement::NewestFirst,
            reindex: false,
            concurrency: 1,
            max_feed_tags: 3,
        }
    }
}

impl CrawlConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

// ============================================================================
// Sources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS/Atom feed, optionally paginated.
    #[default]
    Feed,
    /// Individual article pages scraped through their Open Graph tags.
    Pages,
}

/// How an item's category is chosen when the source does not pin one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifyMode {
    #[default]
    Keywords,
    Url,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub name: String,
    /// Site or feed URL. Combined with `feed_path` when that is set.
    pub url: String,
    pub feed_path: Option<String>,
    pub kind: SourceKind,
    /// Pins every item of this source to one category.
    pub category: Option<Category>,
    pub classify: ClassifyMode,
    pub paginate: bool,
    /// Author used when an item names none. Defaults to the source label.
    pub author: Option<String>,
    /// Display name stored as `source` and used as the first tag. Defaults to `name`.
    pub label: Option<String>,
    /// Article URLs for `kind = "pages"`.
    pub pages: Vec<String>,
    pub status: Status,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            feed_path: None,
            kind: SourceKind::Feed,
            category: None,
            classify: ClassifyMode::Keywords,
            paginate: true,
            author: None,
            label: None,
            pages: Vec::new(),
            status: Status::Published,
        }
    }
}

impl SourceConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// The feed URL when it can be derived without probing.
    pub fn feed_url(&self) -> Option<String> {
        self.feed_path
            .as_ref()
            .map(|path| format!("{}{}", self.url.trim_end_matches('/'), path))
    }
}

// ============================================================================
// Top-level Configuration
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Article collection shared with the publishing layer.
    pub data_file: PathBuf,
    pub fetch: FetchConfig,
    pub locator: LocatorConfig,
    pub crawl: CrawlConfig,
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/news.json"),
            fetch: FetchConfig::default(),
            locator: LocatorConfig::default(),
            crawl: CrawlConfig::default(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = ["data_file", "fetch", "locator", "crawl", "sources"];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or blank file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown top-level keys → accepted, logged as warning
    /// - Sources with unusable URLs → dropped with a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            sources = config.sources.len(),
            strategies = config.fetch.strategies.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.fetch.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one fetch strategy is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .fetch
            .strategies
            .iter()
            .find(|s| s.kind == StrategyKind::Relay && s.prefix.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "relay strategy '{}' has no prefix",
                bad.name
            )));
        }
        if self.crawl.max_pages == 0 {
            return Err(ConfigError::Invalid("crawl.max_pages must be at least 1".to_string()));
        }

        self.sources.retain(|source| {
            if source.name.trim().is_empty() {
                tracing::warn!(url = %source.url, "Skipping source without a name");
                return false;
            }
            let urls = std::iter::once(source.url.as_str()).chain(source.pages.iter().map(String::as_str));
            for url in urls {
                if source.kind == SourceKind::Pages && url.is_empty() {
                    continue;
                }
                if let Err(e) = validate_url(url) {
                    tracing::warn!(source = %source.name, url = %url, error = %e, "Skipping source with invalid URL");
                    return false;
                }
            }
            true
        });
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
