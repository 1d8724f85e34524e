use serde::{Deserialize, Serialize};
use std::mem::size_of;
use std::path::PathBuf;

/// One retrievable unit of source text.
///
/// Line numbers are 1-based; both are 0 when the chunk is not line-addressable
/// (size-strategy windows over plain text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Absolute, lexically normalized path of the owning file
    pub file_name: PathBuf,
    /// Enclosing symbol, empty when unknown
    pub symbol_name: String,
    pub start_line: i32,
    pub end_line: i32,
    /// Chunk text; never empty and never contains NUL once committed
    pub code: String,
    /// Embedding vector, empty if embedding failed
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(file_name: PathBuf, code: String) -> Self {
        Self {
            file_name,
            symbol_name: String::new(),
            start_line: 0,
            end_line: 0,
            code,
            embedding: Vec::new(),
        }
    }

    /// Builder-style line range setter
    pub fn with_lines(mut self, start_line: i32, end_line: i32) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    /// Builder-style symbol setter
    pub fn with_symbol(mut self, symbol_name: impl Into<String>) -> Self {
        self.symbol_name = symbol_name.into();
        self
    }

    pub fn is_line_addressable(&self) -> bool {
        self.start_line > 0
    }

    /// Whether this chunk can take part in similarity search
    pub fn is_searchable(&self) -> bool {
        !self.embedding.is_empty()
    }

    /// Estimated in-memory footprint used for budget enforcement.
    pub fn estimated_bytes(&self) -> usize {
        self.file_name.as_os_str().len()
            + self.symbol_name.len()
            + self.code.len()
            + 2 * size_of::<i32>()
            + self.embedding.len() * size_of::<f32>()
    }
}

/// Raw search hit as produced by the vector store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

impl From<(String, f32)> for SearchHit {
    fn from((text, score): (String, f32)) -> Self {
        Self { text, score }
    }
}

/// A retrieved chunk with its full metadata and similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
