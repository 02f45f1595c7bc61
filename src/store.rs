//! Read-only queries over a loaded article collection.
//!
//! The store is filled once from an [`ArticleSource`] and never mutated;
//! writers go through the source (see [`crate::outputs::json::JsonArchive`]).

use crate::error::StoreError;
use crate::models::Article;
use crate::outputs::json::ArticleSource;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
pub struct ArticleStore {
    articles: Vec<Article>,
}

impl ArticleStore {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn load<S: ArticleSource>(source: &S) -> Result<Self, StoreError> {
        let articles = source.load().await?;
        debug!(count = articles.len(), "Loaded articles");
        Ok(Self::new(articles))
    }

    /// All articles, in load order.
    pub fn list(&self) -> &[Article] {
        &self.articles
    }

    pub fn get(&self, id: &str) -> Result<&Article, StoreError> {
        self.articles
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Keyword search across ids and text fields.
    ///
    /// Each keyword is trimmed and lowercased. An article matches a keyword
    /// on an exact `id`/`source_id` hit or a case-insensitive substring hit
    /// in `title`, `content`, `source_domain` or `source_title`.
    ///
    /// Results are not deduplicated: an article appears once per matching
    /// keyword, so `search(&["foo", "foo"])` can return the same article
    /// twice. Results are grouped by article in load order, keywords in the
    /// order given. Blank keywords match nothing.
    pub fn search<K: AsRef<str>>(&self, keywords: &[K]) -> Vec<&Article> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let mut hits = Vec::new();
        for article in &self.articles {
            for keyword in &keywords {
                if matches_keyword(article, keyword) {
                    hits.push(article);
                }
            }
        }
        hits
    }

    /// Articles ordered oldest first.
    pub fn sorted_by_update_time(&self) -> Vec<&Article> {
        let mut sorted: Vec<&Article> = self.articles.iter().collect();
        sorted.sort_by(|a, b| a.cmp_update_time(b));
        sorted
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

fn matches_keyword(article: &Article, keyword: &str) -> bool {
    article.id == keyword
        || article.source_id == keyword
        || [
            &article.title,
            &article.content,
            &article.source_domain,
            &article.source_title,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(keyword))
}
