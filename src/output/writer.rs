//! Export tree writer
//!
//! Every file lands under one export root. Content is written to a `.part`
//! sibling first and renamed into place, so a reader never observes a
//! half-written page.

use crate::{MirrorError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Writes files below the export root
#[derive(Debug, Clone)]
pub struct ExportWriter {
    root: PathBuf,
}

impl ExportWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Export root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a path relative to the export root
    ///
    /// A `#fragment` suffix, as produced for page paths, is not part of the
    /// file name and is dropped.
    pub fn path_for(&self, local_path: &str) -> PathBuf {
        let file = local_path.split('#').next().unwrap_or(local_path);
        file.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Writes `contents` to `local_path`, replacing any existing file
    ///
    /// Parent directories are created as needed.
    pub async fn write(&self, local_path: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let target = self.path_for(local_path);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MirrorError::io(parent, e))?;
        }

        let mut part_name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("file"));
        part_name.push(".part");
        let part = target.with_file_name(part_name);

        tokio::fs::write(&part, contents.as_ref())
            .await
            .map_err(|e| MirrorError::io(&part, e))?;
        tokio::fs::rename(&part, &target)
            .await
            .map_err(|e| MirrorError::io(&target, e))?;

        tracing::trace!(path = %target.display(), "Wrote file");
        Ok(target)
    }
}
