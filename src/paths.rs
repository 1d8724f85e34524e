//! Path resolution for the index file and the content root.
//!
//! The index manager never hardcodes where things live on disk. It asks a
//! [`PathResolver`] for the default persistence file and for the root
//! directory that indexed content must live under.

use crate::Settings;
use std::path::{Component, Path, PathBuf};

/// Supplies the locations the index manager depends on.
pub trait PathResolver: Send + Sync {
    /// File used by `save_index()`/`load_index()` when no explicit path is given
    fn default_index_path(&self) -> PathBuf;

    /// Directory that every indexed file is expected to live under.
    ///
    /// Chunks loaded from disk whose file is outside this directory are pruned
    /// during `init`.
    fn content_root(&self) -> PathBuf;
}

/// Resolver backed by [`Settings`], anchoring relative paths at the workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    index_path: PathBuf,
    content_root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(index_path: impl Into<PathBuf>, content_root: impl Into<PathBuf>) -> Self {
        Self {
            index_path: absolute_normalized(index_path.into()),
            content_root: absolute_normalized(content_root.into()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let anchor = |path: &Path| match &settings.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };
        Self::new(anchor(&settings.index_path), anchor(&settings.content_root))
    }
}

impl PathResolver for WorkspacePaths {
    fn default_index_path(&self) -> PathBuf {
        self.index_path.clone()
    }

    fn content_root(&self) -> PathBuf {
        self.content_root.clone()
    }
}

/// Make `path` absolute against the current directory and remove `.`/`..`
/// components lexically (no filesystem access, symlinks are not resolved).
pub fn absolute_normalized(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    lexically_normal(&absolute)
}

/// Lexical normalization equivalent to collapsing `a/./b/../c` into `a/c`.
pub fn lexically_normal(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True when `path` lies inside `dir` (or is `dir` itself), comparing whole
/// path components of the normalized absolute forms.
pub fn is_under(path: impl AsRef<Path>, dir: impl AsRef<Path>) -> bool {
    absolute_normalized(path).starts_with(absolute_normalized(dir))
}
