//! Utility functions shared by the extractors and the merger.
//!
//! - **Text**: markup stripping, entity decoding, truncation and slug derivation
//! - **URL validation**: refusing configured sources that point at internal hosts
//! - **Dates**: lenient parsing of the date formats found in feeds and meta tags
//!
//! # Examples
//!
//! ```
//! use newswire::util::{clean_text, slugify, validate_url};
//!
//! let url = validate_url("https://example.com/feed/").unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//! assert_eq!(slugify("Olá, Mundo"), "ola-mundo");
//! assert_eq!(clean_text("<b>Olá</b>"), "Olá");
//! ```

mod date;
mod text;
mod url_validator;

pub use date::{normalize_date, now_minute, DATE_FORMAT};
pub use text::{
    clean_text, collapse_whitespace, decode_entities, fold_accents, normalize_title, slugify,
    strip_control_chars, strip_tags, truncate_chars, unwrap_cdata, MAX_SLUG_LEN,
};
pub use url_validator::{validate_url, UrlValidationError};
