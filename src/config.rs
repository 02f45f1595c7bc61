//! Site configuration.
//!
//! One [`SiteConfig`] describes the single source site this ingester talks
//! to. It is read once at startup (optionally from a YAML file) and handed
//! to [`crate::pipeline::ArticlePipeline::new`]; nothing else looks it up.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! built-in Liberty Times profile.
//!
//! ```yaml
//! domain: news.ltn.com.tw
//! title: 自由時報
//! timeout: 30s
//! window_days: 2
//! converter: opencc
//! ```

use crate::error::ConfigError;
use crate::models::fingerprint;
use crate::recency::RecencyPolicy;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{instrument, warn};

/// Fallback used when `timeout` cannot be parsed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Offset of the zone used for recency checks and the `LastUpdate` line (UTC+8).
pub const DEFAULT_ZONE_OFFSET_HOURS: i32 = 8;

/// Element attribute that marks the article body container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMarker {
    pub attribute: String,
    pub value: String,
}

impl Default for ContainerMarker {
    fn default() -> Self {
        Self {
            attribute: "data-desc".to_string(),
            value: "內容頁".to_string(),
        }
    }
}

/// Which [`crate::convert::ScriptConverter`] `main` should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverterKind {
    /// Leave text untouched.
    #[default]
    None,
    /// Pipe text through the `opencc` command-line tool.
    Opencc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Bare domain of the source site, also fingerprinted into `source_id`.
    pub domain: String,
    /// Display title of the source site.
    pub title: String,
    /// Fetch timeout as a human duration string (`"1m"`, `"45s"`).
    pub timeout: String,
    /// Trailing suffix the site appends to every `<title>`.
    pub title_suffix: String,
    /// `<title>` fragments marking sections this ingester ignores.
    pub excluded_sections: Vec<String>,
    pub container: ContainerMarker,
    /// Recency window in days.
    pub window_days: u32,
    pub zone_offset_hours: i32,
    pub recency_policy: RecencyPolicy,
    pub converter: ConverterKind,
    /// OpenCC configuration passed to `opencc -c`.
    pub opencc_config: String,
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: "news.ltn.com.tw".to_string(),
            title: "自由時報".to_string(),
            timeout: "1m".to_string(),
            title_suffix: " - 自由時報電子報".to_string(),
            excluded_sections: [
                "- 娛樂", "- 食譜", "- 地產", "- 體育", "- 地方", "- 蒐奇", "- 社會", "- 生活",
                "- 时尚", "- 健康", "- 汽車", "- 財經",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            container: ContainerMarker::default(),
            window_days: 3,
            zone_offset_hours: DEFAULT_ZONE_OFFSET_HOURS,
            recency_policy: RecencyPolicy::default(),
            converter: ConverterKind::default(),
            opencc_config: "tw2s.json".to_string(),
            user_agent: concat!("ltn_news/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SiteConfig {
    /// Load a config file, or the defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Parsed fetch timeout; falls back to one minute when unparsable.
    pub fn fetch_timeout(&self) -> Duration {
        match humantime::parse_duration(self.timeout.trim()) {
            Ok(d) => d,
            Err(e) => {
                warn!(
                    site = %self.title,
                    timeout = %self.timeout,
                    error = %e,
                    fallback = ?DEFAULT_TIMEOUT,
                    "timeout init error; using fallback"
                );
                DEFAULT_TIMEOUT
            }
        }
    }

    /// The fixed zone used for recency decisions and timestamps in output.
    pub fn zone(&self) -> FixedOffset {
        let offset = self
            .zone_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt);
        offset.unwrap_or_else(|| {
            warn!(
                zone_offset_hours = self.zone_offset_hours,
                "zone offset out of range; using UTC+8"
            );
            FixedOffset::east_opt(DEFAULT_ZONE_OFFSET_HOURS * 3600).unwrap_or(Utc.fix())
        })
    }

    /// Fingerprint of [`SiteConfig::domain`].
    pub fn source_id(&self) -> String {
        fingerprint(&self.domain)
    }
}
