use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use newswire::classify::{build_tags, classify, reclassify};
use newswire::config::Config;
use newswire::content::fetch_article;
use newswire::crawl::{distribution, Orchestrator};
use newswire::feed::{locate, Fetcher};
use newswire::storage::{reindex, Admission, Candidate, Category, Merger, Status, Store};
use newswire::util::validate_url;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "newswire", about = "News feed ingestion into a JSON article collection")]
struct Args {
    /// Configuration file
    #[arg(long, global = true, value_name = "FILE", default_value = "newswire.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every configured source and merge new articles into the collection
    Crawl {
        /// Collection file (overrides `data_file`)
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
        /// Only crawl the named sources
        #[arg(long = "source", value_name = "NAME")]
        sources: Vec<String>,
        /// Crawl and report, but do not write the collection
        #[arg(long)]
        dry_run: bool,
    },
    /// Find the feed URL of a site
    Locate { site: String },
    /// Extract one article page; optionally import it
    Scrape {
        url: String,
        /// Merge the article into the collection
        #[arg(long)]
        import: bool,
        /// Category for the imported article (classified from its text if omitted)
        #[arg(long, value_name = "CATEGORY")]
        category: Option<Category>,
        #[arg(long, value_name = "STATUS", default_value = "published")]
        status: Status,
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },
    /// Re-run the category correction rules over the collection and renumber it
    Reclassify {
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from '{}'", args.config.display()))?;
    let fetcher = Fetcher::new(config.fetch.clone()).context("Failed to build HTTP client")?;

    match args.command {
        Command::Crawl { data, sources, dry_run } => {
            let data = data.unwrap_or_else(|| config.data_file.clone());
            let selected: Vec<_> = config
                .sources
                .iter()
                .filter(|s| sources.is_empty() || sources.contains(&s.name))
                .cloned()
                .collect();
            if selected.is_empty() {
                tracing::warn!("No sources to crawl");
            }

            let store = Store::open(&data).context("Failed to lock the collection")?;
            let orchestrator = Orchestrator::new(fetcher, config.crawl.clone(), config.locator.clone());
            let report = orchestrator
                .crawl_into(&store, &selected, dry_run)
                .await
                .with_context(|| format!("Failed to update collection '{}'", data.display()))?;
            println!("{report}");
        }

        Command::Locate { site } => {
            validate_url(&site).with_context(|| format!("Refusing to probe '{site}'"))?;
            let feed_url = locate(&fetcher, &config.locator.candidates, &site).await?;
            println!("{feed_url}");
        }

        Command::Scrape {
            url,
            import,
            category,
            status,
            data,
        } => {
            validate_url(&url).with_context(|| format!("Refusing to fetch '{url}'"))?;
            let page = fetch_article(&fetcher, &url).await?;
            println!("Title:       {}", page.title);
            println!("Site:        {}", page.site_name);
            println!("Author:      {}", page.author);
            println!("Published:   {}", page.published_at);
            println!("Image:       {}", page.image);
            println!("Description: {}", page.description);
            println!("Body:        {} chars", page.body_html.chars().count());

            if import {
                let data = data.unwrap_or_else(|| config.data_file.clone());
                let store = Store::open(&data).context("Failed to lock the collection")?;
                let existing = store
                    .load()
                    .with_context(|| format!("Failed to read collection '{}'", data.display()))?;

                let category = category.unwrap_or_else(|| classify(&format!("{} {}", page.title, page.description)));
                let tags = build_tags(&page.site_name, category, &[], 0);
                let mut merger = Merger::new(existing, config.crawl.dedup_by_title);
                match merger.admit(Candidate::from_scraped(page, category, tags, status)) {
                    Admission::Accepted(id) => {
                        store.save(&merger.finish(config.crawl.placement))?;
                        println!("Imported as {id} ({category})");
                    }
                    Admission::Duplicate => println!("Already in the collection, nothing imported"),
                }
            }
        }

        Command::Reclassify { data, dry_run } => {
            let data = data.unwrap_or_else(|| config.data_file.clone());
            let store = Store::open(&data).context("Failed to lock the collection")?;
            let mut articles = store
                .load()
                .with_context(|| format!("Failed to read collection '{}'", data.display()))?;

            let before = distribution(&articles);
            let changes = reclassify(&mut articles);
            reindex(&mut articles);

            for change in &changes {
                let title: String = change.title.chars().take(80).collect();
                println!("[{} -> {} / {}] {}", change.from, change.to, change.rule, title);
            }
            println!("\n{} articles reclassified", changes.len());
            println!("{:<12} {:>6} {:>6}", "category", "before", "after");
            for (category, after) in distribution(&articles) {
                let before = before.iter().find(|(c, _)| *c == category).map_or(0, |(_, n)| *n);
                println!("{:<12} {:>6} {:>6}", category.as_str(), before, after);
            }

            if dry_run {
                println!("Dry run, collection not modified.");
            } else {
                store.save(&articles)?;
            }
        }
    }

    Ok(())
}
