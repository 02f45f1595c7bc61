//! # LTN News
//!
//! Command-line host for the ingestion pipeline and the article archive.
//!
//! ## Usage
//!
//! ```sh
//! ltn_news ingest -m ./markdown <URL>...
//! ltn_news list
//! ltn_news get <ID>
//! ltn_news search <KEYWORD>...
//! ```

use clap::Parser;
use ltn_news::cli::{Cli, Command};
use ltn_news::config::SiteConfig;
use ltn_news::convert::Converter;
use ltn_news::fetch::HttpFetcher;
use ltn_news::models::Article;
use ltn_news::outputs::json::JsonArchive;
use ltn_news::outputs::markdown;
use ltn_news::pipeline::ArticlePipeline;
use ltn_news::store::ArticleStore;
use ltn_news::utils::ensure_writable_dir;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let site = SiteConfig::load(args.config.as_deref())?;
    info!(domain = %site.domain, title = %site.title, "Loaded site configuration");
    let archive = JsonArchive::new(&args.archive);

    match args.command {
        Command::Ingest {
            urls,
            markdown_output_dir,
            concurrency,
        } => ingest(site, &archive, &urls, markdown_output_dir.as_deref(), concurrency).await,
        Command::List => {
            let store = ArticleStore::load(&archive).await?;
            for article in store.sorted_by_update_time() {
                print_summary(&site, article);
            }
            Ok(())
        }
        Command::Get { id } => {
            let store = ArticleStore::load(&archive).await?;
            println!("{}", store.get(&id)?.content);
            Ok(())
        }
        Command::Search { keywords } => {
            let store = ArticleStore::load(&archive).await?;
            let hits = store.search(&keywords);
            info!(count = hits.len(), "Search complete");
            for article in hits {
                print_summary(&site, article);
            }
            Ok(())
        }
    }
}

async fn ingest(
    site: SiteConfig,
    archive: &JsonArchive,
    urls: &[String],
    markdown_output_dir: Option<&str>,
    concurrency: usize,
) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();

    // Early check: ensure markdown dir is writable
    if let Some(dir) = markdown_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Markdown output directory is not writable");
            return Err(e);
        }
    }

    let fetcher = HttpFetcher::new(&site.user_agent)?;
    let converter = Converter::from_config(&site);
    let pipeline = ArticlePipeline::new(site, fetcher, converter);
    info!(timeout = ?pipeline.timeout(), "Pipeline ready");

    let report = pipeline.ingest_all(urls, concurrency).await;
    let summary = archive.upsert(&report.articles).await?;

    if let Some(dir) = markdown_output_dir {
        for article in &report.articles {
            if let Err(e) = markdown::write_article(dir, article).await {
                error!(id = %article.id, error = %e, "Failed writing article markdown");
            }
        }
    }

    for article in &report.articles {
        print_summary(pipeline.site(), article);
    }

    let elapsed = start_time.elapsed();
    info!(
        ingested = report.articles.len(),
        inserted = summary.inserted,
        replaced = summary.replaced,
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn print_summary(site: &SiteConfig, article: &Article) {
    println!(
        "{}\t{}\t{}",
        article.id,
        article.update_time.with_timezone(&site.zone()).to_rfc3339(),
        article.title
    );
}
