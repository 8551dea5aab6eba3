//! The article collection: record types, the merge/dedup step and the JSON file.

mod merge;
mod store;
mod types;

pub use merge::{merge, reindex, Admission, Candidate, Merged, Merger};
pub use store::{read_articles, Store, StoreError};
pub use types::{Article, Category, RawFeedItem, ScrapedArticle, Status, UnknownCategory};
