use crate::storage::{Article, Category};
use std::fmt;

/// Counters for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    /// Pages (feed pages or article pages) fetched successfully.
    pub pages: usize,
    /// Valid items extracted.
    pub seen: usize,
    pub added: usize,
    pub duplicates: usize,
    /// Dropped by policy: too old, or a video/live page.
    pub skipped: usize,
    /// Dropped for missing fields, or pages with no extractable article.
    pub invalid: usize,
    pub errors: usize,
}

impl SourceStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

/// Run-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub sources: usize,
    pub pages: usize,
    pub seen: usize,
    pub added: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub errors: usize,
}

impl RunStats {
    pub fn absorb(&mut self, source: &SourceStats) {
        self.sources += 1;
        self.pages += source.pages;
        self.seen += source.seen;
        self.added += source.added;
        self.duplicates += source.duplicates;
        self.skipped += source.skipped;
        self.invalid += source.invalid;
        self.errors += source.errors;
    }
}

/// Summary of a crawl: totals, per-source rows and the category spread of
/// the final collection.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub totals: RunStats,
    pub sources: Vec<SourceStats>,
    /// Non-empty categories, largest first.
    pub distribution: Vec<(Category, usize)>,
    pub collection_size: usize,
    pub saved: bool,
}

impl Report {
    pub fn new(sources: Vec<SourceStats>, collection: &[Article]) -> Self {
        let mut totals = RunStats::default();
        for source in &sources {
            totals.absorb(source);
        }
        Self {
            totals,
            sources,
            distribution: distribution(collection),
            collection_size: collection.len(),
            saved: false,
        }
    }

    /// Emits the totals as one structured event.
    pub fn log(&self) {
        let t = &self.totals;
        tracing::info!(
            sources = t.sources,
            pages = t.pages,
            seen = t.seen,
            added = t.added,
            duplicates = t.duplicates,
            skipped = t.skipped,
            invalid = t.invalid,
            errors = t.errors,
            total = self.collection_size,
            saved = self.saved,
            "Crawl finished"
        );
    }
}

/// Article count per category, largest first, ties in taxonomy order.
pub fn distribution(articles: &[Article]) -> Vec<(Category, usize)> {
    let mut counts: Vec<(Category, usize)> = Category::ALL
        .into_iter()
        .map(|c| (c, articles.iter().filter(|a| a.category == c).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            "source", "pages", "seen", "added", "dups", "skip", "inval", "errors"
        )?;
        writeln!(f, "{}", "-".repeat(24 + 7 * 7))?;
        for s in &self.sources {
            writeln!(
                f,
                "{:<24} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
                truncate_name(&s.name),
                s.pages,
                s.seen,
                s.added,
                s.duplicates,
                s.skipped,
                s.invalid,
                s.errors
            )?;
        }
        let t = &self.totals;
        writeln!(f, "{}", "-".repeat(24 + 7 * 7))?;
        writeln!(
            f,
            "{:<24} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            format!("total ({} sources)", t.sources),
            t.pages,
            t.seen,
            t.added,
            t.duplicates,
            t.skipped,
            t.invalid,
            t.errors
        )?;

        writeln!(f)?;
        writeln!(f, "Collection: {} articles", self.collection_size)?;
        let scale = self.distribution.first().map_or(1, |(_, n)| (*n).max(1));
        for (category, count) in &self.distribution {
            let bar = "#".repeat((count * 40).div_ceil(scale));
            writeln!(f, "  {:<12} {:>5} {}", category.as_str(), count, bar)?;
        }
        if !self.saved {
            writeln!(f, "Collection file not modified.")?;
        }
        Ok(())
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= 24 {
        name.to_owned()
    } else {
        let head: String = name.chars().take(23).collect();
        format!("{head}…")
    }
}
