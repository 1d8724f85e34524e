use crate::config::ChunkingConfig;
use crate::types::Chunk;
use std::path::Path;
use tracing::{debug, warn};

const SENTENCE_TERMINATORS: &[u8] = b".!?";

pub(super) fn split(file: &Path, content: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    if content.is_empty() {
        warn!(file = %file.display(), "size chunking called with empty content");
        return Vec::new();
    }

    let window = config.window_size.max(1);
    let total = content.len();

    let mut chunks = Vec::new();
    let mut pos = 0;

    loop {
        let (start, end) = window_bounds(content, pos, window);

        let text: String = content[start..end].chars().filter(|&c| c != '\0').collect();
        let word_chars = text.chars().filter(char::is_ascii_alphanumeric).count();
        if word_chars < config.min_alnum_chars {
            debug!(
                file = %file.display(),
                offset = start,
                word_chars,
                "skipping low-content window"
            );
        } else {
            chunks.push(Chunk::new(file.to_path_buf(), text));
        }

        if end >= total {
            break;
        }
        // Step back by the overlap, but always make forward progress
        pos = end.saturating_sub(config.overlap).max(start + 1);
    }

    debug!(file = %file.display(), count = chunks.len(), "size chunking complete");
    chunks
}

/// Byte range of the window starting at `pos`: `window` bytes, extended to
/// include the next sentence terminator when one exists before the end.
fn window_bounds(content: &str, pos: usize, window: usize) -> (usize, usize) {
    let bytes = content.as_bytes();
    let start = ceil_char_boundary(content, pos);
    let mut end = ceil_char_boundary(content, start.saturating_add(window));

    if let Some(offset) = bytes[end..]
        .iter()
        .position(|b| SENTENCE_TERMINATORS.contains(b))
    {
        // Terminators are ASCII, so end stays on a char boundary
        end += offset + 1;
    }
    (start, end)
}

fn ceil_char_boundary(content: &str, index: usize) -> usize {
    let mut index = index.min(content.len());
    while !content.is_char_boundary(index) {
        index += 1;
    }
    index
}
