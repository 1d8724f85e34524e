//! Text embedding: tokenization, hashed TF-IDF/word-count vectors and the
//! corpus statistics behind them.
//!
//! The engine is shared between the vector store and the index manager through
//! [`SharedEmbeddingEngine`]. Callers holding the index lock must take the
//! index lock first and the engine lock second.

mod engine;
mod method;
mod state;
mod tokenizer;

pub use engine::{DEFAULT_VOCAB_SIZE, EmbeddingEngine};
pub use method::EmbeddingMethod;
pub use state::CorpusStats;
pub use tokenizer::{bucket, tokenize};

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Reference-counted handle to the single engine instance
pub type SharedEmbeddingEngine = Arc<Mutex<EmbeddingEngine>>;

/// Reasons an embedding is rejected
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("raw embedding is empty")]
    Empty,

    #[error("raw embedding contains NaN or infinite values")]
    NonFinite,

    #[error("raw embedding has zero norm")]
    ZeroNorm,

    #[error("external embedding provider failed: {0}")]
    External(String),
}

/// Remote or otherwise out-of-process embedding provider
pub trait ExternalEmbedder: Send + Sync {
    /// Raw (unnormalized) vector for `text`
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn name(&self) -> &str {
        "external"
    }
}
