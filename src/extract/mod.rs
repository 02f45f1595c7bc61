//! Structured data extraction from a fetched article page.
//!
//! - [`metadata`]: title (with section exclusion) and publication time
//! - [`content`]: article body paragraphs from the marked content container

pub mod content;
pub mod metadata;
