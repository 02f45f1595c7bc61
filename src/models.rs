//! Data model for ingested articles.
//!
//! An [`Article`] only exists once every pipeline stage has succeeded: the
//! pipeline keeps fetch artifacts (raw bytes, parsed document) in its own
//! locals and assembles the article at the very end, so the serialized view
//! never carries transient fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use url::Url;

/// Hex-encoded SHA-256 digest of `s`.
///
/// Used for article ids (fingerprint of the requested URL string) and source
/// ids (fingerprint of the site domain).
pub fn fingerprint(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// A fully ingested article.
///
/// `id` is a pure function of the URL it was fetched from, so re-fetching the
/// same URL yields the same key and the archive can upsert on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Fingerprint of the requested URL.
    pub id: String,
    /// Cleaned, script-converted display title.
    pub title: String,
    /// Final markdown document.
    pub content: String,
    /// Fingerprint of the site domain.
    pub source_id: String,
    pub source_domain: String,
    pub source_title: String,
    /// Publication time as reported by the page, normalized to UTC.
    pub update_time: DateTime<Utc>,
    pub source_url: Url,
}

impl Article {
    /// True iff `self` was published strictly before `other`.
    pub fn updated_before(&self, other: &Article) -> bool {
        self.update_time < other.update_time
    }

    /// Ordering by publication time, oldest first.
    pub fn cmp_update_time(&self, other: &Article) -> Ordering {
        self.update_time.cmp(&other.update_time)
    }
}
