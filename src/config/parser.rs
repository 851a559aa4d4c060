use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Values given on the command line, applied last
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
}

/// Loads and parses a configuration file from the given path
///
/// The file may omit any section; missing values keep their defaults. The
/// result is not validated here because the base URL usually arrives later
/// from the environment or the command line.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wiki_mirror::config::load_config;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// println!("Concurrency: {}", config.crawler.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Applies environment variables on top of a configuration
///
/// Recognised variables are `BASE_URL` and `EXPORT_DIR`. The lookup is
/// injected so callers (and tests) decide where values come from.
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup("BASE_URL").filter(|v| !v.trim().is_empty()) {
        config.site.base_url = Some(base_url);
    }
    if let Some(dir) = lookup("EXPORT_DIR").filter(|v| !v.trim().is_empty()) {
        config.output.export_dir = PathBuf::from(dir);
    }
}

/// Applies command-line overrides on top of a configuration
pub fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(base_url) = &overrides.base_url {
        config.site.base_url = Some(base_url.clone());
    }
    if let Some(dir) = &overrides.export_dir {
        config.output.export_dir = dir.clone();
    }
    if let Some(concurrency) = overrides.concurrency {
        config.crawler.concurrency = concurrency;
    }
}

/// Builds the effective configuration from every source
///
/// Precedence, lowest first: defaults, the TOML file, `.env` and the process
/// environment, then command-line overrides. The result is validated.
pub fn resolve_config(file: Option<&Path>, overrides: &Overrides) -> Result<Config, ConfigError> {
    let mut config = match file {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    // A missing .env file is the normal case
    let _ = dotenvy::dotenv();
    apply_env(&mut config, |key| std::env::var(key).ok());
    apply_overrides(&mut config, overrides);

    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the effective configuration
///
/// Logged at startup so two runs can be compared.
pub fn compute_config_hash(config: &Config) -> Result<String, ConfigError> {
    let content = toml::to_string(config)
        .map_err(|e| ConfigError::Validation(format!("Failed to serialize config: {}", e)))?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
