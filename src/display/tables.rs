//! Table formatting for retrieval results, index statistics and indexing summaries.

use crate::indexing::{IndexStats, ProjectIndexSummary};
use crate::retrieve::limit_text;
use crate::types::ScoredChunk;
use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

/// Characters of chunk text shown in the results table
const PREVIEW_CHARS: usize = 120;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            table: styled_table(),
        }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        self.table.set_header(bold_cells(headers));
        self
    }

    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn bold_cells(headers: Vec<&str>) -> Vec<Cell> {
    headers
        .into_iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
        .collect()
}

/// Ranked retrieval hits with location and a one-line preview.
pub fn create_results_table(hits: &[ScoredChunk]) -> String {
    let mut table = styled_table();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(bold_cells(vec!["#", "Score", "File", "Lines", "Symbol", "Preview"]));

    for (i, hit) in hits.iter().enumerate() {
        let chunk = &hit.chunk;
        let lines = if chunk.is_line_addressable() {
            format!("{}-{}", chunk.start_line, chunk.end_line)
        } else {
            "-".to_string()
        };
        let preview = limit_text(chunk.code.trim(), PREVIEW_CHARS).replace(['\n', '\t'], " ");

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:.3}", hit.score)),
            Cell::new(chunk.file_name.display()),
            Cell::new(lines),
            Cell::new(&chunk.symbol_name),
            Cell::new(preview),
        ]);
    }

    table.to_string()
}

/// Two-column metric/value view of the index.
pub fn create_stats_table(stats: &IndexStats) -> String {
    let mut table = styled_table();
    table.set_header(bold_cells(vec!["Metric", "Value"]));

    table.add_row(vec!["Chunks", &stats.chunk_count.to_string()]);
    table.add_row(vec!["Searchable chunks", &stats.searchable_count.to_string()]);
    table.add_row(vec!["Distinct texts", &stats.reverse_map_len.to_string()]);
    table.add_row(vec!["Estimated memory", &format_bytes(stats.estimated_bytes)]);
    table.add_row(vec!["Corpus documents", &stats.corpus_documents.to_string()]);
    table.add_row(vec!["Embedding method", stats.embedding_method.as_str()]);
    table.add_row(vec!["Similarity", stats.similarity.as_str()]);

    let unsearchable = stats.chunk_count - stats.searchable_count.min(stats.chunk_count);
    if unsearchable > 0 {
        table.add_row(vec![
            Cell::new("Unsearchable"),
            Cell::new(format!("{unsearchable} chunks without embedding"))
                .fg(Color::Yellow)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table.to_string()
}

/// Summary of one project indexing run.
pub fn create_summary_table(summary: &ProjectIndexSummary) -> String {
    let mut table = styled_table();
    table.set_header(bold_cells(vec![
        "Root", "Files", "Failed", "Chunks", "Replaced", "Time", "Rate",
    ]));

    let secs = summary.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.files_indexed as f64 / secs
    } else {
        0.0
    };

    let failed = Cell::new(summary.files_failed);
    let failed = if summary.files_failed > 0 {
        failed.fg(Color::Red)
    } else {
        failed
    };

    table.add_row(vec![
        Cell::new(summary.root.display()),
        Cell::new(summary.files_indexed),
        failed,
        Cell::new(summary.chunks_added),
        Cell::new(summary.chunks_removed),
        Cell::new(format!("{:?}", summary.elapsed)),
        Cell::new(format!("{rate:.0}/s")),
    ]);

    table.to_string()
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
