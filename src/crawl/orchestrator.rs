use super::pacer::Pacer;
use super::report::{Report, SourceStats};
use crate::classify::{build_tags, classification_text, classify, classify_url};
use crate::config::{ClassifyMode, CrawlConfig, LocatorConfig, SourceConfig, SourceKind};
use crate::content::{fetch_article, ScrapeError};
use crate::feed::{locate, parse_feed, Fetcher};
use crate::storage::{reindex, Admission, Article, Candidate, Merger, RawFeedItem, Store, StoreError};
use crate::util::DATE_FORMAT;
use chrono::Utc;
use futures::stream::{self, StreamExt};

/// Everything one source produced, before deduplication.
#[derive(Debug)]
pub struct Harvest {
    pub stats: SourceStats,
    pub candidates: Vec<Candidate>,
}

/// Result of [`Orchestrator::run`].
#[derive(Debug)]
pub struct CrawlOutcome {
    pub articles: Vec<Article>,
    pub report: Report,
}

/// Drives configured sources through fetch → extract → classify → merge.
///
/// Pages of one source are fetched strictly in order, since the empty-page
/// cutoff depends on consecutive results. Requests to one origin are spaced
/// `crawl.request_delay_ms` apart across the whole run, including the jump
/// from one source to the next. Independent sources may be harvested in
/// parallel (`crawl.concurrency`); merging always happens afterwards, in
/// source order.
pub struct Orchestrator {
    fetcher: Fetcher,
    crawl: CrawlConfig,
    locator: LocatorConfig,
    pacer: Pacer,
}

impl Orchestrator {
    pub fn new(fetcher: Fetcher, crawl: CrawlConfig, locator: LocatorConfig) -> Self {
        let pacer = Pacer::new(crawl.request_delay());
        Self {
            fetcher,
            crawl,
            locator,
            pacer,
        }
    }

    /// Loads the collection, crawls, and saves only when something was added.
    ///
    /// # Errors
    ///
    /// Only store errors. Source and page failures end up in the report.
    pub async fn crawl_into(&self, store: &Store, sources: &[SourceConfig], dry_run: bool) -> Result<Report, StoreError> {
        let existing = store.load()?;
        tracing::info!(existing = existing.len(), sources = sources.len(), "Starting crawl");

        let CrawlOutcome { articles, mut report } = self.run(sources, existing).await;
        if report.totals.added == 0 {
            tracing::info!("No new articles, collection left untouched");
        } else if dry_run {
            tracing::info!(added = report.totals.added, "Dry run, not saving");
        } else {
            store.save(&articles)?;
            report.saved = true;
        }
        report.log();
        Ok(report)
    }

    /// Harvests every source and merges the results into `existing`.
    ///
    /// # Arguments
    ///
    /// * `sources` - Sources to crawl, in merge order
    /// * `existing` - The current collection; its URLs and titles seed deduplication
    ///
    /// # Returns
    ///
    /// A [`CrawlOutcome`] with the merged collection and the run [`Report`].
    /// Per-source rows in the report follow `sources` order.
    ///
    /// # Behavior
    ///
    /// - Up to `crawl.concurrency` sources are harvested at once; results are
    ///   still merged one source at a time in `sources` order, so the outcome
    ///   does not depend on which source finished first
    /// - A failing source or page is logged and counted, never fatal
    /// - With `crawl.reindex` set and at least one article added, the whole
    ///   collection is sorted newest first and renumbered `"1"..="N"`
    /// - Nothing is written to disk; see [`Orchestrator::crawl_into`]
    pub async fn run(&self, sources: &[SourceConfig], existing: Vec<Article>) -> CrawlOutcome {
        let harvests: Vec<Harvest> = stream::iter(sources)
            .map(|source| self.harvest(source))
            .buffered(self.crawl.concurrency.max(1))
            .collect()
            .await;

        let mut merger = Merger::new(existing, self.crawl.dedup_by_title);
        let mut stats = Vec::with_capacity(harvests.len());
        for Harvest { stats: mut source_stats, candidates } in harvests {
            for candidate in candidates {
                match merger.admit(candidate) {
                    Admission::Accepted(_) => source_stats.added += 1,
                    Admission::Duplicate => source_stats.duplicates += 1,
                }
            }
            tracing::info!(
                source = %source_stats.name,
                added = source_stats.added,
                duplicates = source_stats.duplicates,
                "Source merged"
            );
            stats.push(source_stats);
        }

        let added = merger.added();
        let mut articles = merger.finish(self.crawl.placement);
        if self.crawl.reindex && added > 0 {
            reindex(&mut articles);
        }
        let report = Report::new(stats, &articles);
        CrawlOutcome { articles, report }
    }

    /// Fetches and extracts one source without deduplicating.
    ///
    /// Feed sources use `feed_path`, or the locator when it is unset, then walk
    /// the paginated feed until `crawl.max_pages` or `crawl.empty_page_cutoff`
    /// consecutive empty pages. Page sources scrape each listed URL. Never fails:
    /// problems are counted in the returned [`SourceStats`].
    pub async fn harvest(&self, source: &SourceConfig) -> Harvest {
        let mut harvest = Harvest {
            stats: SourceStats::new(&source.name),
            candidates: Vec::new(),
        };
        tracing::info!(source = %source.name, kind = ?source.kind, "Crawling source");
        match source.kind {
            SourceKind::Feed => self.harvest_feed(source, &mut harvest).await,
            SourceKind::Pages => self.harvest_pages(source, &mut harvest).await,
        }
        harvest
    }

    async fn harvest_feed(&self, source: &SourceConfig, harvest: &mut Harvest) {
        let feed_url = match source.feed_url() {
            Some(url) => url,
            None => match locate(&self.fetcher, &self.locator.candidates, &source.url).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(source = %source.name, error = %e, "Could not locate feed");
                    harvest.stats.errors += 1;
                    return;
                }
            },
        };

        let max_pages = if source.paginate { self.crawl.max_pages } else { 1 };
        let cutoff = self.crawl.empty_page_cutoff.max(1);
        let oldest = self.oldest_allowed();
        let mut empty_pages = 0;

        for page in 1..=max_pages {
            let url = page_url(&feed_url, &self.crawl.page_param, page);
            self.pacer.wait(&url).await;
            tracing::debug!(source = %source.name, page, url = %url, "Fetching page");

            let found = match self.fetcher.fetch(&url).await {
                Ok(body) => {
                    harvest.stats.pages += 1;
                    let outcome = parse_feed(&body);
                    harvest.stats.invalid += outcome.skipped;
                    harvest.stats.seen += outcome.items.len();
                    let found = outcome.items.len();
                    for item in outcome.items {
                        if let Some(candidate) = self.feed_candidate(source, item, oldest.as_deref()) {
                            harvest.candidates.push(candidate);
                        } else {
                            harvest.stats.skipped += 1;
                        }
                    }
                    found
                }
                Err(e) => {
                    tracing::warn!(source = %source.name, page, error = %e, "Page failed, treating as empty");
                    harvest.stats.errors += 1;
                    0
                }
            };

            if found == 0 {
                empty_pages += 1;
                if empty_pages >= cutoff {
                    tracing::debug!(source = %source.name, page, "Empty page cutoff reached");
                    break;
                }
            } else {
                empty_pages = 0;
            }
        }
    }

    async fn harvest_pages(&self, source: &SourceConfig, harvest: &mut Harvest) {
        for url in &source.pages {
            self.pacer.wait(url).await;
            match fetch_article(&self.fetcher, url).await {
                Ok(page) => {
                    harvest.stats.pages += 1;
                    harvest.stats.seen += 1;
                    let category = source
                        .category
                        .unwrap_or_else(|| classify(&format!("{} {}", page.title, page.description)));
                    // An explicit label wins over the page's own site name.
                    let label = match &source.label {
                        Some(label) => label.clone(),
                        None if !page.site_name.is_empty() => page.site_name.clone(),
                        None => source.name.clone(),
                    };
                    let tags = build_tags(&label, category, &[], 0);
                    let mut candidate = Candidate::from_scraped(page, category, tags, source.status);
                    candidate.source = label;
                    if candidate.author.is_empty() {
                        candidate.author = source.author.clone().unwrap_or_default();
                    }
                    harvest.candidates.push(candidate);
                }
                Err(ScrapeError::NoTitle { url }) => {
                    tracing::warn!(source = %source.name, url = %url, "No article found on page");
                    harvest.stats.pages += 1;
                    harvest.stats.invalid += 1;
                }
                Err(ScrapeError::Fetch(e)) => {
                    tracing::warn!(source = %source.name, error = %e, "Article page failed");
                    harvest.stats.errors += 1;
                }
            }
        }
    }

    /// Classifies and tags one feed item; `None` when policy skips it.
    fn feed_candidate(&self, source: &SourceConfig, mut item: RawFeedItem, oldest: Option<&str>) -> Option<Candidate> {
        if let Some(oldest) = oldest {
            if !item.published_at.is_empty() && item.published_at.as_str() < oldest {
                tracing::debug!(url = %item.link, date = %item.published_at, "Too old, skipping");
                return None;
            }
        }

        let category = match (source.category, source.classify) {
            (Some(category), _) => category,
            (None, ClassifyMode::Url) => match classify_url(&item.link, &item.title) {
                Some(category) => category,
                None => {
                    tracing::debug!(url = %item.link, "Video or live page, skipping");
                    return None;
                }
            },
            (None, ClassifyMode::Keywords) => classify(&classification_text(
                &item.title,
                &item.summary,
                &item.source_categories,
            )),
        };

        let label = source.label();
        if item.author.is_empty() {
            item.author = source.author.clone().unwrap_or_default();
        }
        let tags = build_tags(label, category, &item.source_categories, self.crawl.max_feed_tags);
        Some(Candidate::from_feed_item(item, label, category, tags, source.status))
    }

    /// Oldest `publishedAt` still imported, in the stored date format.
    fn oldest_allowed(&self) -> Option<String> {
        (self.crawl.max_age_days > 0).then(|| {
            (Utc::now() - chrono::Duration::days(i64::from(self.crawl.max_age_days)))
                .format(DATE_FORMAT)
                .to_string()
        })
    }
}

/// URL of page `page` of a paginated feed. Page 1 is the feed itself.
pub fn page_url(feed_url: &str, page_param: &str, page: u32) -> String {
    if page <= 1 {
        return feed_url.to_owned();
    }
    let separator = if feed_url.contains('?') { '&' } else { '?' };
    format!("{feed_url}{separator}{page_param}={page}")
}
