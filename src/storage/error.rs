use thiserror::Error;

/// Errors raised while reading or writing the binary index file
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Invalid magic bytes: expected {expected:?}, found {found:?}\nSuggestion: The file is not a ragindex index"
    )]
    BadMagic { expected: String, found: String },

    #[error(
        "Invalid format version: expected {expected}, got {actual}\nSuggestion: Re-index with this version of ragindex"
    )]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Checksum mismatch\nSuggestion: The index file is corrupted, clear it and re-index")]
    ChecksumMismatch,

    #[error("Unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Length prefix for {field} is {length}, but only {remaining} bytes remain")]
    LengthOutOfRange {
        field: &'static str,
        length: u64,
        remaining: usize,
    },

    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("Unknown embedding method tag {0}")]
    UnknownMethod(u32),

    #[error(
        "Vocabulary size mismatch: engine uses {expected} buckets, state was written with {actual}\nSuggestion: Set embedding.vocab_size back to {actual} or re-index"
    )]
    VocabularyMismatch { expected: usize, actual: usize },

    #[error("{0} unexpected bytes after the index body")]
    TrailingData(usize),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
