use super::line_number;
use crate::types::Chunk;
use std::path::Path;

pub(super) fn split(file: &Path, content: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut end = 0;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            flush(file, &mut current, start, end, &mut chunks);
            continue;
        }
        if current.is_empty() {
            start = line_number(index);
        }
        current.push_str(line);
        current.push('\n');
        end = line_number(index);
    }
    flush(file, &mut current, start, end, &mut chunks);

    chunks
}

fn flush(file: &Path, current: &mut String, start: i32, end: i32, chunks: &mut Vec<Chunk>) {
    if current.is_empty() {
        return;
    }
    let text = std::mem::take(current);
    chunks.push(Chunk::new(file.to_path_buf(), text).with_lines(start, end));
}
