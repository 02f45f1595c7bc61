//! Markdown rendering of a single article.
//!
//! The layout is fixed; storage and search consumers rely on it:
//!
//! ```text
//! # {title}
//!
//! LastUpdate: {RFC 3339 in site zone} @ [{site title}](/list/?v={site title}): [{domain}](http://{domain})
//!
//! ---
//! {body}
//!
//! 原地址：[{unescaped url}]({unescaped url})
//! ```

use crate::config::SiteConfig;
use crate::models::Article;
use chrono::{DateTime, SecondsFormat, Utc};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Label in front of the link back to the source page.
pub const ORIGINAL_ADDRESS_LABEL: &str = "原地址：";

/// Render one article in the layout shown in the module docs.
///
/// # Arguments
///
/// * `site` - Supplies the site title, domain and display zone.
/// * `title` - Converted article title.
/// * `body` - Converted body, paragraphs already ending in hard breaks.
/// * `update_time` - Publication time, shown in the site zone.
/// * `source_url` - Page the article came from.
///
/// # Returns
///
/// The complete markdown document.
pub fn format_article(
    site: &SiteConfig,
    title: &str,
    body: &str,
    update_time: DateTime<Utc>,
    source_url: &Url,
) -> String {
    let last_update = update_time
        .with_timezone(&site.zone())
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let attribution = format!(
        " @ [{title}](/list/?v={title}): [{domain}](http://{domain})",
        title = site.title,
        domain = site.domain
    );
    let address = display_url(source_url);

    format!(
        "# {title}\n\n\
         LastUpdate: {last_update}{attribution}\n\n\
         ---\n\
         {body}\n\n\
         {ORIGINAL_ADDRESS_LABEL}[{address}]({address})"
    )
}

/// Query-unescaped form of `url` (`+` becomes a space, `%XX` is decoded).
///
/// A `%` not followed by two hex digits, or an escape sequence that decodes
/// to invalid UTF-8, is an error: the raw URL is returned with the error
/// appended.
pub fn display_url(url: &Url) -> String {
    let raw = url.as_str();
    if let Some(escape) = malformed_escape(raw) {
        return format!("{raw}\n\nunescape url error:\ninvalid URL escape {escape:?}");
    }
    match urlencoding::decode(&raw.replace('+', " ")) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => format!("{raw}\n\nunescape url error:\n{e}"),
    }
}

/// The first `%` sequence lacking two hex digits, as it appears in `raw`.
fn malformed_escape(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let valid = bytes.len() >= i + 3
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if !valid {
            let end = (i + 3).min(bytes.len());
            return Some(raw.get(i..end).unwrap_or(&raw[i..]));
        }
        i += 3;
    }
    None
}

pub fn markdown_path(dir: &str, article: &Article) -> PathBuf {
    Path::new(dir).join(format!("{}.md", article.id))
}

/// Write `article.content` to `{dir}/{id}.md`.
#[instrument(level = "info", skip_all, fields(%dir, id = %article.id))]
pub async fn write_article(dir: &str, article: &Article) -> Result<PathBuf, Box<dyn Error>> {
    let path = markdown_path(dir, article);
    fs::write(&path, &article.content).await?;
    info!(path = %path.display(), "Wrote article markdown");
    Ok(path)
}
