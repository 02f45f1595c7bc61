//! Command-line interface definitions.
//!
//! Global options can also come from environment variables.

use clap::{Parser, Subcommand};

/// Ingest Liberty Times articles and query the local archive.
///
/// # Examples
///
/// ```sh
/// # Fetch two articles, store them and write their markdown
/// ltn_news ingest -m ./markdown https://news.ltn.com.tw/news/world/breakingnews/4650001 \
///     https://news.ltn.com.tw/news/politics/breakingnews/4650002
///
/// # Query the archive
/// ltn_news list
/// ltn_news search 立法院 預算
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to the site config YAML file
    #[arg(short, long, env = "LTN_NEWS_CONFIG", global = true)]
    pub config: Option<String>,

    /// JSON archive holding ingested articles
    #[arg(
        short,
        long,
        env = "LTN_NEWS_ARCHIVE",
        default_value = "articles.json",
        global = true
    )]
    pub archive: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch articles, keep the fresh ones and upsert them into the archive
    Ingest {
        /// Article URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Also write each article's markdown to this directory
        #[arg(short, long)]
        markdown_output_dir: Option<String>,

        /// Maximum number of articles fetched at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
    /// List archived articles, oldest first
    List,
    /// Print one article's markdown by id
    Get { id: String },
    /// Search archived articles by keyword
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
}
