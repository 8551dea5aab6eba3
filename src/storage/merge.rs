use super::types::{Article, Category, RawFeedItem, ScrapedArticle, Status};
use crate::config::Placement;
use crate::util::{normalize_title, now_minute, slugify};
use chrono::{SecondsFormat, Utc};
use std::collections::HashSet;
use uuid::Uuid;

// ============================================================================
// Candidate
// ============================================================================

/// An item ready to be turned into an [`Article`], whatever extractor produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub summary: String,
    pub full_content: Option<String>,
    pub image: String,
    /// Empty means "use the source label".
    pub author: String,
    /// Empty means "now".
    pub published_at: String,
    pub source_url: String,
    /// Display name of the origin, used for `source` and the attribution line.
    pub source: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub status: Status,
}

impl Candidate {
    pub fn from_feed_item(item: RawFeedItem, label: &str, category: Category, tags: Vec<String>, status: Status) -> Self {
        Self {
            title: item.title,
            summary: item.summary,
            full_content: item.full_content,
            image: item.image,
            author: item.author,
            published_at: item.published_at,
            source_url: item.link,
            source: label.to_owned(),
            category,
            tags,
            status,
        }
    }

    pub fn from_scraped(page: ScrapedArticle, category: Category, tags: Vec<String>, status: Status) -> Self {
        Self {
            title: page.title,
            summary: page.description,
            full_content: Some(page.body_html).filter(|body| !body.is_empty()),
            image: page.image,
            author: page.author,
            published_at: page.published_at,
            source_url: page.source_url,
            source: page.site_name,
            category,
            tags,
            status,
        }
    }

    fn into_article(self) -> Article {
        let content = article_content(&self);
        Article {
            id: Uuid::new_v4().simple().to_string(),
            slug: slugify(&self.title),
            subtitle: self.summary,
            content,
            image: self.image,
            author: if self.author.trim().is_empty() {
                self.source.clone()
            } else {
                self.author
            },
            tags: self.tags,
            published_at: if self.published_at.is_empty() {
                now_minute()
            } else {
                self.published_at
            },
            status: self.status,
            title: self.title,
            category: self.category,
            source: self.source,
            source_url: self.source_url,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Body markup followed by the attribution paragraph linking back to the origin.
fn article_content(candidate: &Candidate) -> String {
    let body = match candidate.full_content.as_deref().map(str::trim) {
        Some(full) if !full.is_empty() => full.to_owned(),
        _ if !candidate.summary.is_empty() => {
            format!("<p>{}</p>", html_escape::encode_text(&candidate.summary))
        }
        _ => String::new(),
    };
    let attribution = format!(
        r#"<p><em>Fonte original: <a href="{}" target="_blank" rel="noopener">{}</a></em></p>"#,
        html_escape::encode_double_quoted_attribute(&candidate.source_url),
        html_escape::encode_text(&candidate.source),
    );
    if body.is_empty() {
        attribution
    } else {
        format!("{body}\n{attribution}")
    }
}

// ============================================================================
// Merger
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Created with the given id.
    Accepted(String),
    Duplicate,
}

/// Dedup state for one batch: the existing collection plus everything accepted
/// so far, so items inside the same batch cannot duplicate each other either.
#[derive(Debug)]
pub struct Merger {
    existing: Vec<Article>,
    accepted: Vec<Article>,
    urls: HashSet<String>,
    titles: HashSet<String>,
    dedup_by_title: bool,
}

impl Merger {
    /// Seeds the dedup sets from an existing collection.
    ///
    /// # Arguments
    ///
    /// * `existing` - The collection as loaded, in stored order
    /// * `dedup_by_title` - Also treat a normalised (trimmed, case-folded) title
    ///   match as a duplicate, not just an identical `sourceUrl`
    pub fn new(existing: Vec<Article>, dedup_by_title: bool) -> Self {
        let mut merger = Self {
            urls: HashSet::with_capacity(existing.len()),
            titles: HashSet::with_capacity(existing.len()),
            existing: Vec::new(),
            accepted: Vec::new(),
            dedup_by_title,
        };
        for article in &existing {
            merger.register(&article.source_url, &article.title);
        }
        merger.existing = existing;
        merger
    }

    /// Whether an item with this URL (or, when enabled, this title) is already known.
    pub fn is_duplicate(&self, source_url: &str, title: &str) -> bool {
        let url = source_url.trim();
        if !url.is_empty() && self.urls.contains(url) {
            return true;
        }
        self.dedup_by_title && {
            let title = normalize_title(title);
            !title.is_empty() && self.titles.contains(&title)
        }
    }

    /// Offers one candidate to the collection.
    ///
    /// # Returns
    ///
    /// - [`Admission::Accepted`] with the new article's id when neither its URL
    ///   nor (if enabled) its title is known yet. The article is built at this
    ///   point and its URL and title join the dedup sets, so a later candidate
    ///   in the same batch with the same URL is a duplicate.
    /// - [`Admission::Duplicate`] otherwise. Nothing is recorded.
    pub fn admit(&mut self, candidate: Candidate) -> Admission {
        if self.is_duplicate(&candidate.source_url, &candidate.title) {
            tracing::debug!(url = %candidate.source_url, "Duplicate, skipping");
            return Admission::Duplicate;
        }
        self.register(&candidate.source_url, &candidate.title);
        let article = candidate.into_article();
        let id = article.id.clone();
        self.accepted.push(article);
        Admission::Accepted(id)
    }

    fn register(&mut self, source_url: &str, title: &str) {
        let url = source_url.trim();
        if !url.is_empty() {
            self.urls.insert(url.to_owned());
        }
        let title = normalize_title(title);
        if !title.is_empty() {
            self.titles.insert(title);
        }
    }

    /// Number of candidates accepted so far.
    pub fn added(&self) -> usize {
        self.accepted.len()
    }

    pub fn accepted(&self) -> &[Article] {
        &self.accepted
    }

    /// Consumes the merger and returns the merged collection.
    ///
    /// # Arguments
    ///
    /// * `placement` - [`Placement::NewestFirst`] puts the accepted articles
    ///   before the existing ones, [`Placement::Append`] after them
    ///
    /// # Returns
    ///
    /// Existing articles untouched and in their stored order, with the accepted
    /// block inserted as a whole in admission order. Ids are not renumbered;
    /// call [`reindex`] for that.
    pub fn finish(self, placement: Placement) -> Vec<Article> {
        let (mut first, second) = match placement {
            Placement::NewestFirst => (self.accepted, self.existing),
            Placement::Append => (self.existing, self.accepted),
        };
        first.extend(second);
        first
    }
}

/// Result of [`merge`].
#[derive(Debug)]
pub struct Merged {
    pub articles: Vec<Article>,
    pub added: usize,
    pub duplicates: usize,
}

/// One-shot merge of a batch into a collection.
pub fn merge(
    existing: Vec<Article>,
    incoming: impl IntoIterator<Item = Candidate>,
    dedup_by_title: bool,
    placement: Placement,
) -> Merged {
    let mut merger = Merger::new(existing, dedup_by_title);
    let mut duplicates = 0;
    for candidate in incoming {
        if merger.admit(candidate) == Admission::Duplicate {
            duplicates += 1;
        }
    }
    let added = merger.added();
    Merged {
        articles: merger.finish(placement),
        added,
        duplicates,
    }
}

/// Sorts by `publishedAt` descending (ties keep their order) and assigns ids
/// `"1"..="N"`. Runs over the whole collection at once.
pub fn reindex(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    for (i, article) in articles.iter_mut().enumerate() {
        article.id = (i + 1).to_string();
    }
}
