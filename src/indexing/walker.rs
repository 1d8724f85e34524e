//! File system walker for discovering documents to index
//!
//! Recurses without following symlinks and yields regular files whose
//! extension is in the configured set. Traversal errors are yielded to the
//! caller instead of being skipped, so a project walk can stop at the first one.

use crate::config::IndexingConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks directories to find files to index
#[derive(Debug, Clone)]
pub struct FileWalker {
    config: IndexingConfig,
}

impl FileWalker {
    /// Create a new file walker with the given indexing settings
    pub fn new(config: IndexingConfig) -> Self {
        Self { config }
    }

    /// Walk a directory, yielding supported files or the first traversal error.
    ///
    /// Entries are visited in file-name order for reproducible indexing.
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> + '_ {
        WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Err(e) => Some(Err(e)),
                Ok(entry) if entry.file_type().is_file() && self.is_supported(entry.path()) => {
                    Some(Ok(entry.into_path()))
                }
                Ok(_) => None,
            })
    }

    /// Whether `path` has one of the configured extensions
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_supported_extension(ext))
    }

    /// Count files that would be indexed (useful for progress bars)
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).filter(Result::is_ok).count()
    }
}
