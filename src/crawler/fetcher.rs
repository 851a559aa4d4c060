//! HTTP fetcher implementation
//!
//! This module handles all asset requests for the crawler, including:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests returning raw bytes or decoded text
//! - Retry with exponential backoff for transient failures
//! - Error classification (transient vs terminal)

use crate::config::FetcherConfig;
use crate::crawler::work::ContentKind;
use crate::{MirrorError, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Body of a fetched asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBody {
    Bytes(Vec<u8>),
    Text(String),
}

impl AssetBody {
    /// Bytes to persist
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }
}

/// Retry schedule for asset requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// The same client serves the wiki endpoints and asset downloads, so it
/// follows redirects and accepts plain `http` sites.
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(MirrorError)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|source| MirrorError::Http {
            url: String::new(),
            source,
        })
}

/// Fetches an asset, retrying transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return body |
/// | HTTP 5xx, 408, 429 | Retry with backoff |
/// | Timeout / connection / interrupted body | Retry with backoff |
/// | Other HTTP status (404, 403, ...) | Fail immediately |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The asset URL
/// * `kind` - Whether to decode the body as text
/// * `policy` - How often and how long to wait between retries
///
/// # Returns
///
/// The asset body, or the last error once retries are exhausted
pub async fn fetch_asset(
    client: &Client,
    url: &Url,
    kind: ContentKind,
    policy: &RetryPolicy,
) -> Result<AssetBody> {
    let mut retry = 0;
    loop {
        match fetch_once(client, url, kind).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_retryable() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    url = %url,
                    error = %e,
                    attempt = retry + 1,
                    "Transient failure, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_once(client: &Client, url: &Url, kind: ContentKind) -> Result<AssetBody> {
    let http_error = |source| MirrorError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url.clone()).send().await.map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    match kind {
        ContentKind::Binary => {
            let bytes = response.bytes().await.map_err(http_error)?;
            Ok(AssetBody::Bytes(bytes.to_vec()))
        }
        ContentKind::Text => {
            let bytes = response.bytes().await.map_err(http_error)?;
            Ok(decode_text(url, bytes.to_vec()))
        }
    }
}

/// Decodes a text asset, keeping the raw bytes if it is not UTF-8
fn decode_text(url: &Url, bytes: Vec<u8>) -> AssetBody {
    match String::from_utf8(bytes) {
        Ok(text) => AssetBody::Text(text),
        Err(e) => {
            tracing::debug!(url = %url, "Text asset is not UTF-8, storing it unchanged");
            AssetBody::Bytes(e.into_bytes())
        }
    }
}
