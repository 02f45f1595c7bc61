//! Error taxonomy for the ingestion pipeline and the article store.
//!
//! [`IngestError`] separates two kinds of "not ingested" outcomes:
//!
//! - **Skips** ([`IngestError::SkippedPost`], [`IngestError::OutOfWindow`]):
//!   the page was fetched and parsed fine, but site policy says it should not
//!   be kept. Batch callers count these and move on.
//! - **Failures**: everything else. These point at transport problems, a
//!   broken markup contract, or a misbehaving converter.
//!
//! Use [`IngestError::is_skip`] to tell them apart.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Why a post was deliberately not ingested at the metadata stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The `<title>` carries an excluded section marker such as `- 體育`.
    ExcludedSection(String),
    /// The document has no `<title>` element, or it has no text.
    MissingTitle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedSection(marker) => write!(f, "excluded section `{marker}`"),
            SkipReason::MissingTitle => f.write_str("no <title> element"),
        }
    }
}

/// Transport-level failure reported by a [`crate::fetch::Fetcher`].
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("{0}")]
    Other(String),
}

/// Failure reported by a [`crate::convert::ScriptConverter`].
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to run converter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("converter `{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("converter produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Every way a single `fetch_article` run can end without an [`crate::models::Article`].
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("skipped post {url}: {reason}")]
    SkippedPost { url: String, reason: SkipReason },

    #[error("no article:published_time meta tag in {url}")]
    MissingTimestamp { url: String },

    #[error("malformed published time `{value}`: {source}")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("article published {published} is outside the {window_days}-day window")]
    OutOfWindow {
        published: DateTime<Utc>,
        window_days: u32,
    },

    #[error("no paragraphs matched in content container of {url}")]
    NoContentMatched { url: String },

    #[error("script conversion failed: {0}")]
    Conversion(#[from] ConvertError),
}

impl IngestError {
    /// True for policy outcomes that are expected during normal crawling.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            IngestError::SkippedPost { .. } | IngestError::OutOfWindow { .. }
        )
    }
}

/// Errors from loading or querying the article collection.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no article with id: {0}")]
    NotFound(String),

    #[error("archive I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while reading the site configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_outcomes_are_skips() {
        let skipped = IngestError::SkippedPost {
            url: "https://news.ltn.com.tw/news/1".to_string(),
            reason: SkipReason::ExcludedSection("- 體育".to_string()),
        };
        let stale = IngestError::OutOfWindow {
            published: Utc::now(),
            window_days: 3,
        };
        assert!(skipped.is_skip());
        assert!(stale.is_skip());
    }

    #[test]
    fn test_failures_are_not_skips() {
        let no_content = IngestError::NoContentMatched {
            url: "https://news.ltn.com.tw/news/1".to_string(),
        };
        let missing = IngestError::MissingTimestamp {
            url: "https://news.ltn.com.tw/news/1".to_string(),
        };
        assert!(!no_content.is_skip());
        assert!(!missing.is_skip());
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::ExcludedSection("- 娛樂".to_string());
        assert_eq!(reason.to_string(), "excluded section `- 娛樂`");
        assert_eq!(SkipReason::MissingTitle.to_string(), "no <title> element");
    }
}
