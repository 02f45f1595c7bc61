//! Article ingestion pipeline.
//!
//! [`ArticlePipeline::fetch_article`] runs, in order and stopping at the
//! first failure:
//!
//! 1. parse the URL
//! 2. fetch the page (bounded by the configured timeout, never retried here)
//! 3. derive the article id from the requested URL
//! 4. extract and clean the title, skipping excluded sections
//! 5. read the publication time
//! 6. apply the recency window
//! 7. extract the body from the content container
//! 8. convert title and body through the [`ScriptConverter`]
//! 9. render the markdown document
//!
//! Stages 3 to 7 run synchronously between the fetch and the conversion
//! awaits, so the parsed document never lives across a suspension point. Nothing is shared between
//! runs, so different URLs can be fetched concurrently; see
//! [`ArticlePipeline::ingest_all`].

use crate::config::SiteConfig;
use crate::convert::ScriptConverter;
use crate::error::IngestError;
use crate::extract::{content, metadata};
use crate::fetch::{FetchedPage, Fetcher};
use crate::models::{Article, fingerprint};
use crate::outputs::markdown::format_article;
use crate::recency::RecencyFilter;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;

/// Turns article URLs into [`Article`]s for one configured site.
///
/// `F` retrieves pages and `C` converts the extracted text; both are
/// injected so tests can substitute fakes.
pub struct ArticlePipeline<F, C> {
    site: SiteConfig,
    fetcher: F,
    converter: C,
    timeout: Duration,
    recency: RecencyFilter,
    source_id: String,
}

/// Extracted fields awaiting script conversion.
struct Draft {
    id: String,
    title: String,
    body: String,
    update_time: DateTime<Utc>,
    url: Url,
}

/// Outcome of a batch run: what was ingested, what policy skipped, what failed.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub articles: Vec<Article>,
    pub skipped: Vec<(String, IngestError)>,
    pub failed: Vec<(String, IngestError)>,
}

impl<F, C> ArticlePipeline<F, C>
where
    F: Fetcher,
    C: ScriptConverter,
{
    pub fn new(site: SiteConfig, fetcher: F, converter: C) -> Self {
        let timeout = site.fetch_timeout();
        let recency = RecencyFilter::new(site.window_days, site.zone(), site.recency_policy);
        let source_id = site.source_id();
        Self {
            site,
            fetcher,
            converter,
            timeout,
            recency,
            source_id,
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch and fully process one article, judging recency against the current time.
    pub async fn fetch_article(&self, raw_url: &str) -> Result<Article, IngestError> {
        self.fetch_article_at(raw_url, Utc::now()).await
    }

    /// Like [`Self::fetch_article`], with an explicit "now" for the recency window.
    #[instrument(level = "info", skip_all, fields(url = %raw_url))]
    pub async fn fetch_article_at(
        &self,
        raw_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, IngestError> {
        let url = Url::parse(raw_url).map_err(|source| IngestError::InvalidUrl {
            url: raw_url.to_string(),
            source,
        })?;

        let page = self
            .fetcher
            .fetch(&url, self.timeout)
            .await
            .map_err(|source| IngestError::Fetch {
                url: raw_url.to_string(),
                source,
            })?;

        let draft = self.extract(raw_url, url, &page, now)?;

        let title = self.converter.convert(&draft.title).await?;
        let body = self.converter.convert(&draft.body).await?;
        let content = format_article(&self.site, &title, &body, draft.update_time, &draft.url);

        debug!(id = %draft.id, title = %truncate_for_log(&title, 60), bytes = content.len(), "article assembled");
        Ok(Article {
            id: draft.id,
            title,
            content,
            source_id: self.source_id.clone(),
            source_domain: self.site.domain.clone(),
            source_title: self.site.title.clone(),
            update_time: draft.update_time,
            source_url: draft.url,
        })
    }

    /// Stages 3 to 7. The parsed document is dropped before this returns.
    fn extract(
        &self,
        raw_url: &str,
        url: Url,
        page: &FetchedPage,
        now: DateTime<Utc>,
    ) -> Result<Draft, IngestError> {
        let document = page.document();
        let id = fingerprint(raw_url);

        let title = metadata::extract_title(&document, &self.site, raw_url)?;
        let update_time = metadata::extract_update_time(&document, raw_url)?;

        if !self.recency.accepts(now, update_time) {
            return Err(IngestError::OutOfWindow {
                published: update_time,
                window_days: self.recency.window_days,
            });
        }

        let body = content::extract_content(&document, &self.site.container).ok_or_else(|| {
            IngestError::NoContentMatched {
                url: raw_url.to_string(),
            }
        })?;

        Ok(Draft {
            id,
            title,
            body,
            update_time,
            url,
        })
    }

    /// Run [`Self::fetch_article`] over `urls`, at most `concurrency` at a time.
    ///
    /// Repeated URLs are fetched once. Skips are logged at `info`, failures at
    /// `error`; articles come back in completion order.
    #[instrument(level = "info", skip_all, fields(count = urls.len(), concurrency = concurrency))]
    pub async fn ingest_all(&self, urls: &[String], concurrency: usize) -> IngestReport {
        let unique: Vec<&String> = urls.iter().unique().collect();

        let results: Vec<(String, Result<Article, IngestError>)> = stream::iter(unique)
            .map(|url| async move { (url.clone(), self.fetch_article(url).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut report = IngestReport::default();
        for (url, result) in results {
            match result {
                Ok(article) => {
                    debug!(%url, id = %article.id, "Ingested article");
                    report.articles.push(article);
                }
                Err(e) if e.is_skip() => {
                    info!(%url, reason = %e, "Skipped article");
                    report.skipped.push((url, e));
                }
                Err(e) => {
                    error!(%url, error = %e, "Article ingestion failed");
                    report.failed.push((url, e));
                }
            }
        }

        info!(
            ingested = report.articles.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Batch ingestion complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConvertError, FetchError, SkipReason};
    use crate::outputs::markdown::ORIGINAL_ADDRESS_LABEL;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "https://news.ltn.com.tw/news/politics/breakingnews/4650000";

    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
        timeouts: Mutex<Vec<Duration>>,
    }

    impl FakeFetcher {
        fn with_page(url: &str, html: &str) -> Self {
            let mut pages = HashMap::new();
            pages.insert(url.to_string(), html.to_string());
            Self {
                pages,
                ..Self::default()
            }
        }
    }

    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.timeouts.lock().unwrap().push(timeout);
            self.pages
                .get(url.as_str())
                .map(|html| FetchedPage {
                    url: url.clone(),
                    raw: html.as_bytes().to_vec(),
                })
                .ok_or_else(|| FetchError::Other(format!("connection refused: {url}")))
        }
    }

    /// Maps 臺 to 台 and counts invocations.
    #[derive(Default)]
    struct CountingConverter {
        calls: AtomicUsize,
    }

    impl ScriptConverter for CountingConverter {
        async fn convert(&self, text: &str) -> Result<String, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.replace('臺', "台"))
        }
    }

    struct FailingConverter;

    impl ScriptConverter for FailingConverter {
        async fn convert(&self, _text: &str) -> Result<String, ConvertError> {
            Err(ConvertError::Exit {
                program: "opencc".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "no such config".to_string(),
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 11, 4, 0, 0).unwrap()
    }

    fn page(title: &str, published: Option<&str>, body: &str) -> String {
        let meta = published
            .map(|p| format!(r#"<meta property="article:published_time" content="{p}">"#))
            .unwrap_or_default();
        format!(
            r#"<!DOCTYPE html><html><head><title>{title}</title>{meta}</head>
            <body><div class="whitecon" data-desc="內容頁">{body}</div></body></html>"#
        )
    }

    fn pipeline<C: ScriptConverter>(html: &str, converter: C) -> ArticlePipeline<FakeFetcher, C> {
        ArticlePipeline::new(
            SiteConfig::default(),
            FakeFetcher::with_page(URL, html),
            converter,
        )
    }

    #[tokio::test]
    async fn test_end_to_end_single_paragraph() {
        let html = page(
            "臺北新聞 - 自由時報電子報",
            Some("2024-05-10T09:00:00+08:00"),
            "<p>Hello</p>",
        );
        let p = pipeline(&html, CountingConverter::default());
        let article = p.fetch_article_at(URL, now()).await.unwrap();

        assert_eq!(article.id, fingerprint(URL));
        assert_eq!(article.title, "台北新聞");
        assert_eq!(article.source_id, fingerprint("news.ltn.com.tw"));
        assert_eq!(article.source_domain, "news.ltn.com.tw");
        assert_eq!(article.source_title, "自由時報");
        assert_eq!(
            article.update_time,
            Utc.with_ymd_and_hms(2024, 5, 10, 1, 0, 0).unwrap()
        );
        assert_eq!(article.source_url.as_str(), URL);

        assert!(article.content.starts_with("# 台北新聞\n\n"));
        assert!(article.content.contains("LastUpdate: 2024-05-10T09:00:00+08:00 @ [自由時報]"));
        assert!(article.content.contains("---\nHello  \n"));
        assert!(article.content.ends_with(&format!("{ORIGINAL_ADDRESS_LABEL}[{URL}]({URL})")));
        assert_eq!(p.converter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_id_is_stable_across_runs() {
        let html = page("標題", Some("2024-05-10T09:00:00+08:00"), "<p>內容</p>");
        let p = pipeline(&html, CountingConverter::default());
        let first = p.fetch_article_at(URL, now()).await.unwrap();
        let second = p.fetch_article_at(URL, now()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(p.fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_excluded_section_skips_before_later_stages() {
        // No timestamp and no paragraphs: only the title stage may run.
        let html = page("Sample - ExcludedSection", None, "");
        let site = SiteConfig {
            excluded_sections: vec!["- ExcludedSection".to_string()],
            ..SiteConfig::default()
        };
        let p = ArticlePipeline::new(
            site,
            FakeFetcher::with_page(URL, &html),
            CountingConverter::default(),
        );
        let err = p.fetch_article_at(URL, now()).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::SkippedPost {
                reason: SkipReason::ExcludedSection(_),
                ..
            }
        ));
        assert!(err.is_skip());
        assert_eq!(p.converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_does_not_fetch() {
        let p = pipeline("", CountingConverter::default());
        let err = p.fetch_article_at("not a url", now()).await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidUrl { .. }));
        assert_eq!(p.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let p = pipeline("", CountingConverter::default());
        let err = p
            .fetch_article_at("https://news.ltn.com.tw/news/other/1", now())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Fetch { .. }));
        assert!(!err.is_skip());
    }

    #[tokio::test]
    async fn test_missing_and_malformed_timestamp() {
        let p = pipeline(&page("標題", None, "<p>x</p>"), CountingConverter::default());
        assert!(matches!(
            p.fetch_article_at(URL, now()).await,
            Err(IngestError::MissingTimestamp { .. })
        ));

        let p = pipeline(
            &page("標題", Some("yesterday"), "<p>x</p>"),
            CountingConverter::default(),
        );
        assert!(matches!(
            p.fetch_article_at(URL, now()).await,
            Err(IngestError::TimestampParse { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_article_is_out_of_window() {
        let html = page("標題", Some("2024-05-05T09:00:00+08:00"), "<p>x</p>");
        let p = pipeline(&html, CountingConverter::default());
        let err = p.fetch_article_at(URL, now()).await.unwrap_err();
        assert!(matches!(err, IngestError::OutOfWindow { window_days: 3, .. }));
        assert!(err.is_skip());
        assert_eq!(p.converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_paragraphs_is_no_content() {
        let html = page("標題", Some("2024-05-10T09:00:00+08:00"), "<div>圖片</div>");
        let p = pipeline(&html, CountingConverter::default());
        let err = p.fetch_article_at(URL, now()).await.unwrap_err();
        assert!(matches!(err, IngestError::NoContentMatched { .. }));
        assert!(!err.is_skip());
    }

    #[tokio::test]
    async fn test_conversion_error_propagates() {
        let html = page("標題", Some("2024-05-10T09:00:00+08:00"), "<p>x</p>");
        let p = pipeline(&html, FailingConverter);
        let err = p.fetch_article_at(URL, now()).await.unwrap_err();
        match err {
            IngestError::Conversion(ConvertError::Exit { stderr, .. }) => {
                assert_eq!(stderr, "no such config");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ingest_all_classifies_outcomes() {
        let fresh = chrono::Utc::now().to_rfc3339();
        let mut fetcher = FakeFetcher::default();
        let ok_url = "https://news.ltn.com.tw/news/world/breakingnews/1";
        let skip_url = "https://news.ltn.com.tw/news/sports/breakingnews/2";
        fetcher.pages.insert(
            ok_url.to_string(),
            page("國際新聞", Some(&fresh), "<p>內容</p>"),
        );
        fetcher.pages.insert(
            skip_url.to_string(),
            page("球賽 - 體育 - 自由時報電子報", Some(&fresh), "<p>比分</p>"),
        );
        let p = ArticlePipeline::new(SiteConfig::default(), fetcher, CountingConverter::default());

        let urls = vec![
            ok_url.to_string(),
            skip_url.to_string(),
            ok_url.to_string(),
            "https://news.ltn.com.tw/news/missing/3".to_string(),
        ];
        let report = p.ingest_all(&urls, 4).await;

        assert_eq!(report.articles.len(), 1);
        assert_eq!(report.articles[0].title, "國際新聞");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, skip_url);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(p.fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_receives_configured_timeout() {
        let html = page(
            "新聞 - 自由時報電子報",
            Some("2024-05-10T09:00:00+08:00"),
            "<p>x</p>",
        );
        for (raw, expected) in [("15s", Duration::from_secs(15)), ("soon", Duration::from_secs(60))] {
            let site = SiteConfig {
                timeout: raw.to_string(),
                ..SiteConfig::default()
            };
            let p = ArticlePipeline::new(
                site,
                FakeFetcher::with_page(URL, &html),
                CountingConverter::default(),
            );
            assert_eq!(p.timeout(), expected);
            p.fetch_article_at(URL, now()).await.unwrap();
            assert_eq!(*p.fetcher.timeouts.lock().unwrap(), vec![expected], "timeout {raw}");
        }
    }
}
