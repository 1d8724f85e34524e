//! File-backed semantic retrieval: chunk files, embed the chunks, search them
//! by similarity and persist the index in a checksummed binary file.

pub mod chunking;
pub mod config;
pub mod display;
pub mod embedding;
pub mod error;
pub mod indexing;
pub mod paths;
pub mod retrieve;
pub mod storage;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use chunking::{ChunkStrategy, Chunker};
pub use config::Settings;
pub use embedding::{
    EmbeddingEngine, EmbeddingError, EmbeddingMethod, ExternalEmbedder, SharedEmbeddingEngine,
};
pub use error::{IndexError, IndexResult};
pub use indexing::{
    FileIndexOutcome, FileWalker, IndexManager, IndexStats, LoadStatus, ProjectIndexSummary,
};
pub use paths::{PathResolver, WorkspacePaths};
pub use retrieve::{ContextFormatter, limit_text};
pub use storage::{IndexPersistence, PersistenceError};
pub use types::{Chunk, ScoredChunk, SearchHit};
pub use vector::{SimilarityKind, SimilarityMetric, VectorStore};
