//! Multi-source crawl runs and their summary report.

mod orchestrator;
mod pacer;
mod report;

pub use orchestrator::{page_url, CrawlOutcome, Harvest, Orchestrator};
pub use report::{distribution, Report, RunStats, SourceStats};
