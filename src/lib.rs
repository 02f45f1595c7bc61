//! # LTN News
//!
//! Ingests articles from the Liberty Times (`news.ltn.com.tw`) and turns each
//! one into a normalized markdown document plus metadata for storage and
//! search.
//!
//! ## Pipeline
//!
//! 1. **Fetch**: download the page ([`fetch`])
//! 2. **Metadata**: title with section exclusion, publication time ([`extract::metadata`])
//! 3. **Recency**: drop articles outside the day window ([`recency`])
//! 4. **Content**: body paragraphs from the marked container ([`extract::content`], [`normalize`])
//! 5. **Conversion**: traditional to simplified script ([`convert`])
//! 6. **Format**: fixed markdown layout ([`outputs::markdown`])
//!
//! [`pipeline::ArticlePipeline`] ties the stages together. Ingested articles
//! go to a JSON archive ([`outputs::json`]) and are queried through
//! [`store::ArticleStore`].

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod pipeline;
pub mod recency;
pub mod store;
pub mod utils;
