use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Wiki-Mirror
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
}

/// Target wiki configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Base URL of the wiki (the directory holding `index.php` and `api.php`)
    pub base_url: Option<String>,

    /// System message whose content is the title of the home page
    pub main_page_message: String,

    /// Home page title used when the system message cannot be read
    pub fallback_main_page: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            main_page_message: "MediaWiki:Mainpage".to_string(),
            fallback_main_page: "Main Page".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of work items processed at the same time
    pub concurrency: usize,

    /// Namespaces whose pages are never fetched (matched as `<ns>:` prefixes)
    pub excluded_namespaces: Vec<String>,

    /// File extensions of links treated as downloadable audio
    pub audio_extensions: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            excluded_namespaces: ["特殊", "Special", "檔案", "File", "模板", "Template", "MediaWiki"]
                .iter()
                .map(|ns| ns.to_string())
                .collect(),
            audio_extensions: ["mp3", "ogg", "oga", "wav", "flac", "m4a", "opus"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// HTTP behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Retries after the first attempt for transient asset failures
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry (milliseconds)
    pub retry_base_delay_ms: u64,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 500,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("wiki-mirror/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory of the exported snapshot
    pub export_dir: PathBuf,

    /// File holding the module store blob captured by the browser step
    pub module_cache_source: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("./export"),
            module_cache_source: None,
        }
    }
}
