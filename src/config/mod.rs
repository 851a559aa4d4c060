//! Configuration module for Wiki-Mirror
//!
//! This module merges defaults, an optional TOML file, the environment and
//! command-line overrides into one validated [`Config`].
//!
//! # Example
//!
//! ```no_run
//! use wiki_mirror::config::{resolve_config, Overrides};
//!
//! let overrides = Overrides {
//!     base_url: Some("https://wiki.example.org".to_string()),
//!     ..Default::default()
//! };
//! let config = resolve_config(None, &overrides).unwrap();
//! println!("Exporting into {}", config.output.export_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FetcherConfig, OutputConfig, SiteConfig};

// Re-export parser functions
pub use parser::{
    apply_env, apply_overrides, compute_config_hash, load_config, resolve_config, Overrides,
};
pub use validation::{parse_base_url, validate};

impl Config {
    /// Returns the validated base URL of the wiki
    pub fn site_url(&self) -> crate::ConfigResult<url::Url> {
        let raw = self
            .site
            .base_url
            .as_deref()
            .ok_or(crate::ConfigError::MissingBaseUrl)?;
        parse_base_url(raw)
    }
}
