//! Output generation for ingested articles.
//!
//! # Submodules
//!
//! - [`markdown`]: renders the per-article markdown document and writes it to disk
//! - [`json`]: the JSON archive holding every ingested article
//!
//! # Output Structure
//!
//! ```text
//! articles.json              # archive, upserted by article id
//! markdown_output_dir/
//! ├── 3f1c…e9.md             # one document per article id
//! └── a07b…41.md
//! ```

pub mod json;
pub mod markdown;
