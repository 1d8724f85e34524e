//! Error types for the retrieval engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::embedding::EmbeddingError;
use crate::storage::PersistenceError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for indexing operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot index '{path}': not an existing directory")]
    InvalidRoot { path: PathBuf },

    #[error("File '{path}' is {size} bytes, above the {limit} byte limit")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// Storage errors
    #[error("Index file '{path}' could not be used: {source}")]
    Persistence {
        path: PathBuf,
        source: PersistenceError,
    },

    /// Embedding errors
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::InvalidRoot { .. } => "INVALID_ROOT",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::Embedding(_) => "EMBEDDING_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Persistence { .. } => vec![
                "Run 'ragindex clear' and re-index to rebuild the index file",
                "Check disk space and permissions in the index directory",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::InvalidRoot { .. } => vec![
                "Pass an existing directory, or use a file path to index a single file",
            ],
            Self::FileTooLarge { .. } => vec![
                "Raise indexing.max_file_size in .ragindex/settings.toml",
                "Split the file into smaller documents",
            ],
            Self::Embedding(_) => vec![
                "Check the [embedding] section of .ragindex/settings.toml",
            ],
        }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;
