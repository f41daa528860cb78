//! Python file discovery

use crate::constants::SKIP_DIRS;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Python files under `path`
///
/// A file path is returned as-is whatever its extension. Directories are
/// walked recursively for `*.py`, skipping virtualenvs, caches, and build
/// output. Anything else yields an empty list.
pub fn find_python_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    if !path.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
        .collect();
    files.sort();

    debug!(count = files.len(), path = %path.display(), "Found Python files");
    files
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}
