//! Title and publication time extraction.

use crate::config::SiteConfig;
use crate::error::{IngestError, SkipReason};
use crate::normalize::strip_illegal_chars;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static PUBLISHED_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());

/// Read and clean the page `<title>`.
///
/// Pages from excluded sections, and pages without a title, come back as
/// [`IngestError::SkippedPost`].
#[instrument(level = "debug", skip_all, fields(%url))]
pub fn extract_title(document: &Html, site: &SiteConfig, url: &str) -> Result<String, IngestError> {
    let skip = |reason| IngestError::SkippedPost {
        url: url.to_string(),
        reason,
    };

    let raw = document
        .select(&TITLE)
        .next()
        .and_then(|el| el.text().next())
        .ok_or_else(|| skip(SkipReason::MissingTitle))?;

    if let Some(marker) = site
        .excluded_sections
        .iter()
        .find(|marker| raw.contains(marker.as_str()))
    {
        debug!(title = raw, %marker, "ignoring post from excluded section");
        return Err(skip(SkipReason::ExcludedSection(marker.clone())));
    }

    let title = if site.title_suffix.is_empty() {
        raw.to_string()
    } else {
        raw.replace(&site.title_suffix, "")
    };
    Ok(strip_illegal_chars(title.trim()))
}

/// First `article:published_time` meta value, parsed as RFC 3339.
#[instrument(level = "debug", skip_all, fields(%url))]
pub fn extract_update_time(document: &Html, url: &str) -> Result<DateTime<Utc>, IngestError> {
    let values: Vec<&str> = document
        .select(&PUBLISHED_TIME)
        .filter_map(|meta| meta.value().attr("content"))
        .collect();

    let first = values.first().ok_or_else(|| IngestError::MissingTimestamp {
        url: url.to_string(),
    })?;

    DateTime::parse_from_rfc3339(first.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| IngestError::TimestampParse {
            value: first.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const URL: &str = "https://news.ltn.com.tw/news/politics/breakingnews/4650000";

    fn page(head: &str) -> Html {
        Html::parse_document(&format!("<html><head>{head}</head><body></body></html>"))
    }

    #[test]
    fn test_title_suffix_stripped() {
        let doc = page("<title> 立法院三讀通過預算 - 自由時報電子報</title>");
        let title = extract_title(&doc, &SiteConfig::default(), URL).unwrap();
        assert_eq!(title, "立法院三讀通過預算");
    }

    #[test]
    fn test_title_illegal_chars_removed() {
        let doc = page("<title>台美/日 \"峰會\"? - 自由時報電子報</title>");
        let title = extract_title(&doc, &SiteConfig::default(), URL).unwrap();
        assert_eq!(title, "台美日 峰會");
    }

    #[test]
    fn test_excluded_section_is_skipped() {
        let doc = page("<title>球賽結果 - 體育 - 自由時報電子報</title>");
        let err = extract_title(&doc, &SiteConfig::default(), URL).unwrap_err();
        match err {
            IngestError::SkippedPost { reason, .. } => {
                assert_eq!(reason, SkipReason::ExcludedSection("- 體育".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_excluded_marker() {
        let site = SiteConfig {
            excluded_sections: vec!["- ExcludedSection".to_string()],
            ..SiteConfig::default()
        };
        let doc = page("<title>Sample - ExcludedSection</title>");
        let err = extract_title(&doc, &site, URL).unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_missing_title_is_skipped() {
        let doc = page("<meta charset=\"utf-8\">");
        let err = extract_title(&doc, &SiteConfig::default(), URL).unwrap_err();
        assert!(matches!(
            err,
            IngestError::SkippedPost {
                reason: SkipReason::MissingTitle,
                ..
            }
        ));
    }

    #[test]
    fn test_update_time_first_meta_wins() {
        let doc = page(
            r#"<meta property="og:title" content="x">
               <meta property="article:published_time" content="2024-05-01T10:30:00+08:00">
               <meta property="article:published_time" content="2020-01-01T00:00:00Z">"#,
        );
        let t = extract_update_time(&doc, URL).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 2, 30, 0).unwrap());
    }

    #[test]
    fn test_update_time_missing() {
        let doc = page(r#"<meta property="article:modified_time" content="2024-05-01T10:30:00+08:00">"#);
        assert!(matches!(
            extract_update_time(&doc, URL),
            Err(IngestError::MissingTimestamp { .. })
        ));
    }

    #[test]
    fn test_update_time_malformed() {
        let doc = page(r#"<meta property="article:published_time" content="2024/05/01 10:30">"#);
        match extract_update_time(&doc, URL) {
            Err(IngestError::TimestampParse { value, .. }) => assert_eq!(value, "2024/05/01 10:30"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
