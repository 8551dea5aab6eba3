//! Single-page article extraction from Open Graph / meta tags and the main
//! content region.

mod scrape;

pub use scrape::{fetch_article, scrape_article, ScrapeError, DESCRIPTION_MAX_CHARS};
