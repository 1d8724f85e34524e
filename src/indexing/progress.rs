//! Progress reporting and statistics for indexing operations

use crate::embedding::EmbeddingMethod;
use crate::vector::SimilarityKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Maximum number of per-file errors kept in a summary
const MAX_RECORDED_ERRORS: usize = 100;

/// What happened to one file passed to `index_file`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileIndexOutcome {
    pub path: PathBuf,
    /// Chunks committed to the index
    pub chunks_committed: usize,
    /// Candidate chunks dropped (blank, low content, failed embedding)
    pub chunks_skipped: usize,
    /// True when the whole file had to be indexed as a single chunk
    pub used_fallback: bool,
}

/// Statistics collected while indexing a directory tree
#[derive(Debug, Default, Serialize)]
pub struct ProjectIndexSummary {
    pub root: PathBuf,

    /// Number of files successfully indexed
    pub files_indexed: usize,

    /// Number of files that failed to index
    pub files_failed: usize,

    /// Chunks committed across all files
    pub chunks_added: usize,

    /// Chunks dropped before the walk because they lived under `root`
    pub chunks_removed: usize,

    /// Set when a traversal error stopped the walk early
    pub walk_aborted: bool,

    /// Time elapsed during indexing
    pub elapsed: Duration,

    /// Errors encountered (limited to first N errors)
    pub errors: Vec<(PathBuf, String)>,

    /// Start time of indexing
    #[serde(skip)]
    start_time: Option<Instant>,
}

impl ProjectIndexSummary {
    /// Create new summary and start timing
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    pub fn record_success(&mut self, outcome: &FileIndexOutcome) {
        self.files_indexed += 1;
        self.chunks_added += outcome.chunks_committed;
    }

    /// Add an error (limited to first 100 errors)
    pub fn add_error(&mut self, path: PathBuf, error: String) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push((path, error));
        }
        self.files_failed += 1;
    }
}

impl fmt::Display for ProjectIndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Indexing Complete: {}", self.root.display())?;
        writeln!(f, "  Files indexed: {}", self.files_indexed)?;
        writeln!(f, "  Files failed: {}", self.files_failed)?;
        writeln!(f, "  Chunks added: {}", self.chunks_added)?;
        if self.chunks_removed > 0 {
            writeln!(f, "  Chunks replaced: {}", self.chunks_removed)?;
        }
        write!(f, "  Time elapsed: {:.2}s", self.elapsed.as_secs_f64())?;

        if self.files_indexed > 0 && self.elapsed.as_secs_f64() > 0.0 {
            let files_per_sec = self.files_indexed as f64 / self.elapsed.as_secs_f64();
            write!(f, "\n  Performance: {files_per_sec:.0} files/second")?;
        }
        if self.walk_aborted {
            write!(f, "\n  Walk stopped early after a file system error")?;
        }

        if !self.errors.is_empty() {
            let shown = self.errors.len().min(5);
            write!(f, "\n\nErrors (showing first {shown}):")?;
            for (path, error) in self.errors.iter().take(5) {
                write!(f, "\n  {}: {}", path.display(), error)?;
            }
            if self.errors.len() > 5 {
                write!(f, "\n  ... and {} more errors", self.errors.len() - 5)?;
            }
        }
        Ok(())
    }
}

/// Point-in-time view of the index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    /// Chunks in the canonical collection
    pub chunk_count: usize,
    /// Entries in the vector store (chunks with an embedding)
    pub searchable_count: usize,
    /// Distinct chunk texts in the reverse map
    pub reverse_map_len: usize,
    /// Estimated bytes held by chunks
    pub estimated_bytes: usize,
    /// Documents recorded in the embedding corpus
    pub corpus_documents: usize,
    pub embedding_method: EmbeddingMethod,
    pub similarity: SimilarityKind,
}
