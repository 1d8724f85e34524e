//! Splitting file content into retrievable chunks.
//!
//! Three strategies are available, all pure with respect to external state:
//! - paragraph: blank lines are hard boundaries (markdown)
//! - function: heuristic function-signature detection (C-like source code)
//! - size: sliding character window with overlap (prose, unknown types)
//!
//! [`Chunker::chunk`] picks a strategy from the file extension and falls back
//! to the size strategy when the chosen one fails or yields nothing. Producing
//! a last-resort whole-file chunk is left to the caller.

mod function;
mod paragraph;
mod size;

use crate::config::ChunkingConfig;
use crate::paths::absolute_normalized;
use crate::types::Chunk;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// File extensions routed to the function strategy
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx", "cs", "java", "js", "ts", "go", "rs",
];

/// Errors a chunking strategy can report instead of producing chunks
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Function signature pattern failed to compile: {0}")]
    Pattern(String),
}

/// Strategy chosen for a file, based on its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Blank-line separated paragraphs (`.md`)
    Paragraph,
    /// Size windows, then paragraphs if windows yield nothing (`.txt`)
    Text,
    /// Function-like blocks (source code)
    Function,
    /// Size windows (everything else)
    Size,
}

impl ChunkStrategy {
    pub fn for_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "md" => Self::Paragraph,
            "txt" => Self::Text,
            ext if SOURCE_EXTENSIONS.contains(&ext) => Self::Function,
            _ => Self::Size,
        }
    }
}

/// Extension-aware chunker carrying its window and heuristic parameters.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk `content` using the strategy for `file_path`'s extension.
    ///
    /// Falls back to the size strategy when the chosen strategy errors or
    /// returns no chunks. May still return an empty list.
    pub fn chunk(&self, file_path: &Path, content: &str) -> Vec<Chunk> {
        let strategy = ChunkStrategy::for_path(file_path);

        let attempt = match strategy {
            ChunkStrategy::Paragraph => Ok(self.chunk_by_paragraphs(file_path, content)),
            ChunkStrategy::Function => self.chunk_by_functions(file_path, content),
            ChunkStrategy::Size => Ok(self.chunk_by_size(file_path, content)),
            ChunkStrategy::Text => {
                let chunks = self.chunk_by_size(file_path, content);
                if chunks.is_empty() {
                    warn!(
                        file = %file_path.display(),
                        "size chunking produced nothing for text file, falling back to paragraphs"
                    );
                    Ok(self.chunk_by_paragraphs(file_path, content))
                } else {
                    Ok(chunks)
                }
            }
        };

        let chunks = match attempt {
            Ok(chunks) if !chunks.is_empty() => chunks,
            Ok(_) if strategy == ChunkStrategy::Size => Vec::new(),
            Ok(_) => {
                warn!(
                    file = %file_path.display(),
                    ?strategy,
                    "no chunks produced, forcing size-based chunking"
                );
                self.chunk_by_size(file_path, content)
            }
            Err(e) => {
                warn!(
                    file = %file_path.display(),
                    error = %e,
                    "chunking failed, falling back to size-based chunking"
                );
                self.chunk_by_size(file_path, content)
            }
        };

        debug!(file = %file_path.display(), count = chunks.len(), "chunked file");
        chunks
    }

    /// Paragraph strategy: blank (or whitespace-only) lines end a chunk.
    pub fn chunk_by_paragraphs(&self, file_path: &Path, content: &str) -> Vec<Chunk> {
        paragraph::split(&absolute_normalized(file_path), content)
    }

    /// Function strategy: a new chunk starts at every function-like line, and a
    /// chunk is flushed once it reaches `function_max_lines` lines.
    ///
    /// This is a line heuristic, not a parser. Multi-line signatures, nested
    /// braces and non-C-like syntax are split imprecisely.
    pub fn chunk_by_functions(
        &self,
        file_path: &Path,
        content: &str,
    ) -> Result<Vec<Chunk>, ChunkError> {
        function::split(
            &absolute_normalized(file_path),
            content,
            self.config.function_max_lines,
        )
    }

    /// Size strategy: overlapping windows extended to the next sentence end.
    pub fn chunk_by_size(&self, file_path: &Path, content: &str) -> Vec<Chunk> {
        size::split(&absolute_normalized(file_path), content, &self.config)
    }
}

/// Chunk with default parameters. See [`Chunker::chunk`].
pub fn chunk(file_path: &Path, content: &str) -> Vec<Chunk> {
    Chunker::default().chunk(file_path, content)
}

/// Paragraph strategy with default parameters.
pub fn chunk_by_paragraphs(file_path: &Path, content: &str) -> Vec<Chunk> {
    Chunker::default().chunk_by_paragraphs(file_path, content)
}

/// Function strategy with default parameters.
pub fn chunk_by_functions(file_path: &Path, content: &str) -> Result<Vec<Chunk>, ChunkError> {
    Chunker::default().chunk_by_functions(file_path, content)
}

/// Size strategy with default parameters.
pub fn chunk_by_size(file_path: &Path, content: &str) -> Vec<Chunk> {
    Chunker::default().chunk_by_size(file_path, content)
}

/// 1-based line number for a 0-based line index.
fn line_number(index: usize) -> i32 {
    i32::try_from(index + 1).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered_ranges(chunks: &[Chunk]) {
        for chunk in chunks {
            assert!(
                chunk.start_line <= chunk.end_line,
                "bad range {}..{}",
                chunk.start_line,
                chunk.end_line
            );
        }
        for pair in chunks.windows(2) {
            assert!(pair[0].start_line <= pair[1].start_line);
        }
    }

    #[test]
    fn test_strategy_dispatch_by_extension() {
        assert_eq!(
            ChunkStrategy::for_path(Path::new("notes.md")),
            ChunkStrategy::Paragraph
        );
        assert_eq!(
            ChunkStrategy::for_path(Path::new("novel.txt")),
            ChunkStrategy::Text
        );
        assert_eq!(
            ChunkStrategy::for_path(Path::new("main.cpp")),
            ChunkStrategy::Function
        );
        assert_eq!(
            ChunkStrategy::for_path(Path::new("api.H")),
            ChunkStrategy::Function
        );
        assert_eq!(
            ChunkStrategy::for_path(Path::new("book.pdf")),
            ChunkStrategy::Size
        );
        assert_eq!(
            ChunkStrategy::for_path(Path::new("Makefile")),
            ChunkStrategy::Size
        );
    }

    #[test]
    fn test_markdown_uses_paragraphs() {
        let content = "# Title\nintro line\n\nsecond paragraph\nmore text\n";
        let chunks = chunk(Path::new("/docs/readme.md"), content);

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 2));
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (4, 5));
        assert_ordered_ranges(&chunks);
    }

    #[test]
    fn test_short_text_falls_back_to_paragraphs() {
        // Too few alphanumerics for a size window, paragraph fallback kicks in
        let content = "tiny note\n\nsecond";
        let chunks = chunk(Path::new("/notes/short.txt"), content);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].code, "tiny note\n");
        assert_eq!(chunks[1].start_line, 3);
    }

    #[test]
    fn test_markdown_without_paragraphs_falls_back_to_size() {
        let chunks = chunk(Path::new("/docs/blank.md"), "\n\n   \n");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_source_ranges_are_consistent() {
        let content = "\
#include <vector>

int add(int a, int b) {
    return a + b;
}

void log_value(int v) {
    printf(\"%d\", v);
}
";
        let chunks = chunk(Path::new("/src/math.cpp"), content);
        assert!(chunks.len() >= 2);
        assert_ordered_ranges(&chunks);
    }

    #[test]
    fn test_chunk_paths_are_absolute() {
        let chunks = chunk(Path::new("relative/dir/../doc.md"), "hello world paragraph");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].file_name.is_absolute());
        assert!(chunks[0].file_name.ends_with("relative/doc.md"));
    }
}
