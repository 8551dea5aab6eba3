//! Category assignment.
//!
//! - [`rules`]: the keyword table used at import time, the URL-path variant for
//!   feeds that encode their section in article links, and tag derivation
//! - [`reclassify`]: the correction pass run over an existing collection
//!
//! Every function here is pure and deterministic: the same text always yields
//! the same [`Category`](crate::storage::Category).

pub mod reclassify;
pub mod rules;

pub use reclassify::{reclassify, Reclassification};
pub use rules::{build_tags, classification_text, classify, classify_url, Classifier, KEYWORD_RULES, URL_RULES};
