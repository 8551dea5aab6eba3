use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Category Taxonomy
// ============================================================================

/// The closed set of editorial sections every article belongs to.
///
/// Serialized as the lowercase slug used by the publishing layer (`"politica"`,
/// `"economia"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politica,
    Economia,
    Tecnologia,
    Saude,
    Esportes,
    Cultura,
    Mundo,
    Ciencia,
    Educacao,
    Opiniao,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Politica,
        Category::Economia,
        Category::Tecnologia,
        Category::Saude,
        Category::Esportes,
        Category::Cultura,
        Category::Mundo,
        Category::Ciencia,
        Category::Educacao,
        Category::Opiniao,
    ];

    /// Fallback for anything no rule recognises.
    pub const DEFAULT: Category = Category::Politica;

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Politica => "politica",
            Category::Economia => "economia",
            Category::Tecnologia => "tecnologia",
            Category::Saude => "saude",
            Category::Esportes => "esportes",
            Category::Cultura => "cultura",
            Category::Mundo => "mundo",
            Category::Ciencia => "ciencia",
            Category::Educacao => "educacao",
            Category::Opiniao => "opiniao",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_owned()))
    }
}

// ============================================================================
// Publication Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    #[default]
    Published,
    Featured,
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            "featured" => Ok(Status::Featured),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

// ============================================================================
// Persisted Article
// ============================================================================

/// One record of the persisted article collection.
///
/// Field names follow the collection file shared with the publishing layer and
/// the admin editor. Older files stored the publication date under `date` and
/// numeric ids; both are still accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub slug: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "date")]
    pub published_at: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub updated_at: String,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// ============================================================================
// Transient Extraction Records
// ============================================================================

/// An item pulled out of an RSS `<item>` or Atom `<entry>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedItem {
    pub title: String,
    /// Absolute http(s) URL; items without one never get this far.
    pub link: String,
    /// Plain text, at most 300 characters.
    pub summary: String,
    /// Sanitized markup from `content:encoded` (or Atom `<content>`).
    pub full_content: Option<String>,
    pub image: String,
    /// Empty when the feed names nobody; the caller substitutes the source name.
    pub author: String,
    /// `YYYY-MM-DDTHH:MM` UTC, or empty when the feed date could not be parsed.
    pub published_at: String,
    pub source_categories: Vec<String>,
    /// Title of the feed the item came from.
    pub source: String,
}

/// Open Graph / HTML extraction of a single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedArticle {
    pub title: String,
    pub description: String,
    pub image: String,
    pub body_html: String,
    pub author: String,
    pub published_at: String,
    pub site_name: String,
    pub source_url: String,
}
