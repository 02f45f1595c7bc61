//! Article body extraction.
//!
//! The body lives in the first element carrying the configured marker
//! attribute (`data-desc="內容頁"` on Liberty Times). That attribute is the
//! one markup contract with the site; when it changes, extraction yields
//! nothing and the pipeline reports [`crate::error::IngestError::NoContentMatched`].
//!
//! Each `<p>` inside the container contributes its inner markup, so inline
//! tags such as `<strong>` survive. Paragraphs nested inside blocks the
//! normalizer drops (`<blockquote>`, `<script>`, `<iframe>`) are skipped.

use crate::config::ContainerMarker;
use crate::normalize::normalize;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Markdown hard line break appended to every paragraph.
pub const HARD_BREAK: &str = "  \n";

const DROPPED_BLOCKS: [&str; 3] = ["blockquote", "script", "iframe"];

/// First element, of any tag, whose marker attribute equals the marker value.
///
/// # Arguments
///
/// * `document` - The parsed article page.
/// * `marker` - Attribute name and value identifying the body container.
///
/// # Returns
///
/// The container element, or `None` when the page has no such element.
pub fn find_container<'a>(document: &'a Html, marker: &ContainerMarker) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().attr(&marker.attribute) == Some(marker.value.as_str()))
}

/// Inner markup of every paragraph in the container, in document order.
pub fn extract_paragraphs(document: &Html, marker: &ContainerMarker) -> Vec<String> {
    let Some(container) = find_container(document, marker) else {
        return Vec::new();
    };

    container
        .select(&PARAGRAPH)
        .filter(|p| !inside_dropped_block(p, &container))
        .map(|p| p.inner_html())
        .collect()
}

/// Normalized body, or `None` when no paragraph matched.
pub fn extract_content(document: &Html, marker: &ContainerMarker) -> Option<String> {
    let paragraphs = extract_paragraphs(document, marker);
    if paragraphs.is_empty() {
        return None;
    }

    let mut body = String::new();
    for p in &paragraphs {
        body.push_str(p);
        body.push_str(HARD_BREAK);
    }
    Some(normalize(&body))
}

fn inside_dropped_block(p: &ElementRef<'_>, container: &ElementRef<'_>) -> bool {
    p.ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(|node| node.value().as_element())
        .any(|el| DROPPED_BLOCKS.contains(&el.name()))
}
