//! Static asset copying.
//!
//! Everything under the static directory lands at the same relative path in
//! the output directory. Hidden files and directories are skipped.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies a static directory into the output directory.
#[derive(Debug, Clone)]
pub struct AssetProcessor {
    source_dir: PathBuf,
}

impl AssetProcessor {
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    /// Copy every asset into `dest_dir`, returning the number of files copied.
    ///
    /// A missing source directory copies nothing.
    pub fn copy_to(&self, dest_dir: &Path) -> Result<usize> {
        if !self.source_dir.is_dir() {
            debug!(dir = %self.source_dir.display(), "no static directory, skipping assets");
            return Ok(0);
        }

        let mut count = 0;
        let walker = WalkDir::new(&self.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|source| AssetError::Walk {
                path: self.source_dir.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.source_dir) else {
                continue;
            };
            let dest = dest_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
            debug!(src = %entry.path().display(), dest = %dest.display(), "copied asset");
            count += 1;
        }

        info!(count, "assets copied");
        Ok(count)
    }
}

pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_copy_nested_assets() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::create_dir_all(source.path().join("images")).unwrap();
        fs::write(source.path().join("favicon.ico"), b"icon").unwrap();
        fs::write(source.path().join("images/logo.svg"), "<svg/>").unwrap();

        let count = AssetProcessor::new(source.path()).copy_to(dest.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(dest.path().join("favicon.ico")).unwrap(), b"icon");
        assert!(dest.path().join("images/logo.svg").exists());
    }

    #[test]
    fn test_skips_hidden_entries() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::create_dir_all(source.path().join(".cache")).unwrap();
        fs::write(source.path().join(".cache/state"), "x").unwrap();
        fs::write(source.path().join(".DS_Store"), "x").unwrap();
        fs::write(source.path().join("robots.txt"), "User-agent: *").unwrap();

        let count = AssetProcessor::new(source.path()).copy_to(dest.path()).unwrap();

        assert_eq!(count, 1);
        assert!(!dest.path().join(".cache").exists());
        assert!(!dest.path().join(".DS_Store").exists());
    }

    #[test]
    fn test_missing_source_dir() {
        let dest = TempDir::new().unwrap();
        let count = AssetProcessor::new(dest.path().join("static"))
            .copy_to(dest.path())
            .unwrap();
        assert_eq!(count, 0);
    }
}
