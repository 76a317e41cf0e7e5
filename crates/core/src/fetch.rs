//! HTTP fetching of search pages and reference articles.
//!
//! All outbound page requests go through the [`PageFetcher`] trait so the
//! search and extraction stages can be driven by an in-process fake in
//! tests. [`HttpFetcher`] is the real implementation, built once from an
//! [`HttpConfig`] and shared by every stage of a run.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use crate::{RepriseError, Result};

/// Browser user agent; search backends reject obvious bots.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Accept header.
    pub accept: String,
    /// Accept-Language header.
    pub accept_language: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

/// Source of raw HTML for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the body of `url` as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// [`PageFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(RepriseError::Transport)?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed_url = validate_url(url)?;
        debug!(url = %parsed_url, "fetching page");

        let response = self.client.get(parsed_url).send().await.map_err(|e| {
            if e.is_timeout() { RepriseError::Timeout { timeout: self.config.timeout } } else { RepriseError::Transport(e) }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepriseError::HttpStatus { status: status.as_u16(), url: url.to_string() });
        }

        let content = response.text().await?;
        debug!(url, bytes = content.len(), "fetched page");

        Ok(content)
    }
}

/// Parses `url` and requires an http or https scheme.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| RepriseError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(RepriseError::InvalidUrl(format!("unsupported scheme {} in {}", scheme, url))),
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| RepriseError::Config(format!("invalid header value {:?}: {}", value, e)))
}
