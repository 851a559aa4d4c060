//! Module store artifact
//!
//! The browser step captures the wiki's client-side module store as one raw
//! string. This module wraps it in a single statement that puts it back into
//! local storage when an exported page loads `scripts/wiki_data.js`.

use crate::naming::MODULE_CACHE_PATH;
use crate::output::ExportWriter;
use crate::{MirrorError, Result};
use std::path::Path;

/// Local storage key the wiki's module loader reads
pub const MODULE_STORE_KEY: &str = "MediaWikiModuleStore:wiki_data";

/// Builds the script that seeds the module store with `blob`
pub fn module_cache_script(blob: &str) -> Result<String> {
    let value = serde_json::to_string(blob)?;
    Ok(format!("localStorage.setItem('{}', {})", MODULE_STORE_KEY, value))
}

/// Writes the module store artifact from the captured blob at `source`
pub async fn write_module_cache(writer: &ExportWriter, source: &Path) -> Result<()> {
    let blob = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| MirrorError::io(source, e))?;

    writer
        .write(MODULE_CACHE_PATH, module_cache_script(blob.trim_end())?)
        .await?;

    tracing::info!(path = MODULE_CACHE_PATH, "Wrote module cache");
    Ok(())
}
