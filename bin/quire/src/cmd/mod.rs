//! Command implementations.

pub mod build;
pub mod check;
pub mod new;

use std::path::{Path, PathBuf};

/// Directory that relative paths in the configuration resolve against.
pub(crate) fn site_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
