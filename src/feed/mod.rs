//! Feed acquisition: fetching, locating and extracting RSS/Atom feeds.
//!
//! - **Fetching**: HTTP retrieval through an ordered chain of direct and relayed
//!   strategies, with per-strategy timeout and retry
//! - **Locating**: turning a bare site URL into its feed URL by probing
//!   well-known paths
//! - **Parsing**: tolerant extraction of `<item>`/`<entry>` blocks into
//!   [`RawFeedItem`](crate::storage::RawFeedItem)s
//!
//! # Architecture
//!
//! - [`fetcher`] - [`Fetcher`] and its error types
//! - [`locator`] - [`locate`] and feed-marker sniffing
//! - [`parser`] - [`parse_feed`] built on quick-xml's event reader
//!
//! # Example
//!
//! ```no_run
//! use newswire::config::FetchConfig;
//! use newswire::feed::{locate, parse_feed, Fetcher};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//! let candidates = vec!["/feed/".to_string(), "/rss".to_string()];
//! let feed_url = locate(&fetcher, &candidates, "https://example.com").await?;
//! let outcome = parse_feed(&fetcher.fetch(&feed_url).await?);
//! println!("{} items from {}", outcome.items.len(), outcome.source);
//! # Ok(())
//! # }
//! ```

pub mod fetcher;
pub mod locator;
pub mod parser;

pub use fetcher::{FetchError, FetchFailure, Fetcher};
pub use locator::{is_feed_url, locate, looks_like_feed, LocateError};
pub use parser::{parse_feed, sanitize_markup, ParseOutcome, DEFAULT_SOURCE, SUMMARY_MAX_CHARS};
