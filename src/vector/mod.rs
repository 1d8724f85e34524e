//! Similarity scoring and the in-memory vector store.
//!
//! Search is exact brute force: every stored embedding is scored against the
//! query and a bounded min-heap keeps the best `k`, so a query costs
//! O(n log k).

mod similarity;
mod store;

pub use similarity::{
    Cosine, DotProduct, Euclidean, Jaccard, SimilarityKind, SimilarityMetric,
};
pub use store::{DEFAULT_MIN_SCORE, VectorStore};
