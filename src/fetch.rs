//! Page retrieval.
//!
//! [`Fetcher`] is the transport seam: given a URL and a timeout it returns
//! the raw response body. Parsing into a [`scraper::Html`] document is done
//! by the caller via [`FetchedPage::document`], after the await, since the
//! parsed tree cannot be sent between threads.

use crate::error::FetchError;
use reqwest::Client;
use scraper::Html;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// A fetched response body and the URL it came from.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub raw: Vec<u8>,
}

impl FetchedPage {
    /// Parses the body as HTML, replacing invalid UTF-8.
    pub fn document(&self) -> Html {
        Html::parse_document(&String::from_utf8_lossy(&self.raw))
    }
}

/// Retrieves a page body.
///
/// # Arguments
///
/// * `url` - Page to request.
/// * `timeout` - Upper bound for the whole request. Implementations do not retry.
///
/// # Returns
///
/// The raw body on a success status, otherwise a [`FetchError`].
pub trait Fetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// [`Fetcher`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url, ?timeout))]
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let raw = response.bytes().await?.to_vec();
        debug!(
            bytes = raw.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fetched page"
        );
        Ok(FetchedPage {
            url: url.clone(),
            raw,
        })
    }
}
