//! Rendering retrieved chunks as a context block for prompts.

use crate::indexing::IndexManager;
use crate::types::ScoredChunk;
use std::borrow::Cow;
use std::fmt::Write;

/// Characters of chunk content shown per block
pub const DEFAULT_CONTENT_LIMIT: usize = 400;

/// Rendered when a query has no hits
pub const NO_CONTEXT: &str = "[No relevant context found]";

/// Truncate `text` to at most `max_chars` bytes, preferring to cut at the last
/// whitespace at or before the limit. A cut point in the first half of the
/// limit is ignored in favor of a hard cut. Truncated text ends with `...`.
pub fn limit_text(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.len() <= max_chars {
        return Cow::Borrowed(text);
    }

    let search_end = (max_chars + 1).min(text.len());
    let cutoff = text.as_bytes()[..search_end]
        .iter()
        .rposition(|b| matches!(b, b' ' | b'\n' | b'\t'))
        .filter(|&pos| pos >= max_chars / 2)
        .unwrap_or(max_chars);

    let mut end = cutoff;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", &text[..end]))
}

/// Formats scored chunks as numbered blocks with file, symbol and line metadata.
#[derive(Debug, Clone, Copy)]
pub struct ContextFormatter {
    content_limit: usize,
}

impl Default for ContextFormatter {
    fn default() -> Self {
        Self {
            content_limit: DEFAULT_CONTENT_LIMIT,
        }
    }
}

impl ContextFormatter {
    pub fn new(content_limit: usize) -> Self {
        Self { content_limit }
    }

    pub fn format(&self, hits: &[ScoredChunk]) -> String {
        if hits.is_empty() {
            return NO_CONTEXT.to_string();
        }

        let mut out = String::new();
        for (i, hit) in hits.iter().enumerate() {
            // Writing to a String cannot fail
            let _ = self.write_block(&mut out, i + 1, hit);
        }
        out
    }

    /// Retrieve `top_k` chunks for `query` and format them.
    pub fn query(&self, manager: &IndexManager, query: &str, top_k: usize) -> String {
        self.format(&manager.retrieve_relevant(query, top_k))
    }

    fn write_block(&self, out: &mut String, ordinal: usize, hit: &ScoredChunk) -> std::fmt::Result {
        let chunk = &hit.chunk;
        writeln!(out, "=== Chunk {ordinal} (score: {:.3}) ===", hit.score)?;

        let file = chunk
            .file_name
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| chunk.file_name.to_string_lossy());
        writeln!(out, "File: {file}")?;

        if !chunk.symbol_name.is_empty() {
            writeln!(out, "Symbol: {}", chunk.symbol_name)?;
        }
        if chunk.is_line_addressable() {
            writeln!(out, "Lines: {}-{}", chunk.start_line, chunk.end_line)?;
        }
        let content = limit_text(&chunk.code, self.content_limit);
        writeln!(out, "Content:\n{content}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use std::path::PathBuf;

    #[test]
    fn test_short_text_is_borrowed() {
        assert!(matches!(limit_text("short", 400), Cow::Borrowed("short")));
    }

    #[test]
    fn test_cut_at_whitespace() {
        let text = "alpha beta gamma delta";
        assert_eq!(limit_text(text, 12), "alpha beta...");
    }

    #[test]
    fn test_hard_cut_when_whitespace_is_too_early() {
        let text = "ab cdefghijklmnopqrstuvwxyz";
        assert_eq!(limit_text(text, 10), "ab cdefghi...");
    }

    #[test]
    fn test_empty_hits_render_placeholder() {
        assert_eq!(ContextFormatter::default().format(&[]), NO_CONTEXT);
    }

    #[test]
    fn test_block_layout() {
        let code = "int add(int a, int b) {}".to_string();
        let chunk = Chunk::new(PathBuf::from("/src/math.cpp"), code)
            .with_lines(3, 5)
            .with_symbol("add");
        let plain = Chunk::new(PathBuf::from("/docs/book.txt"), "plain text window".into());
        let hits = vec![
            ScoredChunk {
                chunk,
                score: 0.91234,
            },
            ScoredChunk {
                chunk: plain,
                score: 0.5,
            },
        ];

        let text = ContextFormatter::default().format(&hits);
        let first = "=== Chunk 1 (score: 0.912) ===\nFile: math.cpp\nSymbol: add\nLines: 3-5\n";
        let last = "=== Chunk 2 (score: 0.500) ===\nFile: book.txt\nContent:\nplain text window\n";
        assert!(text.starts_with(first));
        assert!(text.contains(last));
        assert!(!text.contains("Lines: 0-0"));
    }
}
