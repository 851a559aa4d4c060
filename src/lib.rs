//! Wiki-Mirror: a static snapshot exporter for MediaWiki sites
//!
//! This crate crawls every page reachable from a wiki's main page, rewrites
//! intra-site links and asset references to local files, and downloads the
//! stylesheets, scripts, images and audio those pages depend on.

pub mod config;
pub mod crawler;
pub mod naming;
pub mod output;
pub mod state;
pub mod wiki;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Wiki-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Wiki API error: {0}")]
    Api(String),

    #[error("HTML parse error for {title}: {message}")]
    HtmlParse { title: String, message: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MirrorError {
    /// Returns true if the failure is transient and the request may be retried
    ///
    /// Network-class failures (connect, timeout, interrupted body) and server-side
    /// statuses (5xx, 408, 429) are transient. Everything else, including 404, is
    /// terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request() || source.is_body()
            }
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }

    /// Builds an IO error tagged with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No base URL given on the command line or in BASE_URL")]
    MissingBaseUrl,
}

/// Result type alias for Wiki-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlReport, WorkItem};
pub use naming::{local_path_for_asset, local_path_for_page};
pub use state::ItemState;
