use super::{ChunkError, line_number};
use crate::types::Chunk;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Permissive signature shape: optional return-type/qualifier words, a name,
/// a single-line parameter list, an optional `const` and an optional `{`.
static SIGNATURE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[\w:~<>,*&]+\s+)*[*&]*([\w:~]+)\s*\([^)]*\)\s*(?:const\s*)?\{?\s*$")
});

/// Keywords whose `kw (...) {` lines look like signatures but are not.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "else", "sizeof", "do",
];

pub(super) fn split(
    file: &Path,
    content: &str,
    max_lines: usize,
) -> Result<Vec<Chunk>, ChunkError> {
    let signature = SIGNATURE
        .as_ref()
        .map_err(|e| ChunkError::Pattern(e.to_string()))?;
    let max_lines = max_lines.max(1);

    let mut chunks = Vec::new();
    let mut pending = Pending::default();

    for (index, line) in content.lines().enumerate() {
        if let Some(name) = signature_name(signature, line) {
            pending.flush(file, &mut chunks);
            pending.symbol = name.to_string();
        }

        pending.push(line, line_number(index));

        if pending.lines >= max_lines {
            pending.flush(file, &mut chunks);
        }
    }
    pending.flush(file, &mut chunks);

    Ok(chunks)
}

fn signature_name<'a>(signature: &Regex, line: &'a str) -> Option<&'a str> {
    let name = signature.captures(line)?.get(1)?.as_str();
    if CONTROL_KEYWORDS.contains(&name) {
        return None;
    }
    // `else if (x) {` captures `if` above; a leading keyword word is not a type
    let first_word = line.split_whitespace().next().unwrap_or_default();
    if CONTROL_KEYWORDS.contains(&first_word) {
        return None;
    }
    Some(name)
}

#[derive(Default)]
struct Pending {
    text: String,
    symbol: String,
    start: i32,
    end: i32,
    lines: usize,
}

impl Pending {
    fn push(&mut self, line: &str, line_no: i32) {
        if self.lines == 0 {
            self.start = line_no;
        }
        self.text.push_str(line);
        self.text.push('\n');
        self.end = line_no;
        self.lines += 1;
    }

    /// Emit the accumulated lines unless they are all whitespace.
    fn flush(&mut self, file: &Path, chunks: &mut Vec<Chunk>) {
        if self.lines == 0 {
            return;
        }
        let text = std::mem::take(&mut self.text);
        self.lines = 0;
        if text.trim().is_empty() {
            return;
        }
        chunks.push(
            Chunk::new(file.to_path_buf(), text)
                .with_lines(self.start, self.end)
                .with_symbol(self.symbol.clone()),
        );
    }
}
