//! JSON archive of ingested articles.
//!
//! The archive is a single JSON array of [`Article`]s. It is the crate's
//! persistence collaborator: [`ArticleSource::load`] feeds the read-only
//! [`crate::store::ArticleStore`], and [`JsonArchive::upsert`] merges newly
//! ingested articles by id so re-fetching a URL replaces its old entry.

use crate::error::StoreError;
use crate::models::Article;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Anything that can produce the full article collection.
pub trait ArticleSource {
    async fn load(&self) -> Result<Vec<Article>, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone)]
pub struct JsonArchive {
    path: PathBuf,
}

impl JsonArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Merge `articles` into the archive, keyed by id. Existing order is
    /// kept; new ids are appended in the order given.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = articles.len()))]
    pub async fn upsert(&self, articles: &[Article]) -> Result<UpsertSummary, StoreError> {
        let mut current = self.load().await?;
        let mut index: HashMap<String, usize> = current
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();

        let mut summary = UpsertSummary::default();
        for article in articles {
            match index.get(&article.id) {
                Some(&i) => {
                    current[i] = article.clone();
                    summary.replaced += 1;
                }
                None => {
                    index.insert(article.id.clone(), current.len());
                    current.push(article.clone());
                    summary.inserted += 1;
                }
            }
        }

        self.save(&current).await?;
        info!(
            inserted = summary.inserted,
            replaced = summary.replaced,
            total = current.len(),
            "Updated article archive"
        );
        Ok(summary)
    }

    async fn save(&self, articles: &[Article]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(articles).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).await.map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

impl ArticleSource for JsonArchive {
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<Article>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("archive does not exist yet; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })
    }
}
