//! News ingestion: fetch RSS/Atom feeds and article pages, classify them into a
//! fixed category taxonomy, and merge them without duplicates into a JSON
//! article collection.

pub mod classify;
pub mod config;
pub mod content;
pub mod crawl;
pub mod feed;
pub mod storage;
pub mod util;
