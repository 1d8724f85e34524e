#![allow(dead_code)]

use ragindex::{EmbeddingEngine, EmbeddingMethod, IndexManager, Settings, WorkspacePaths};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Temporary workspace with a `content/` tree and an index file beside it.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("content")).expect("Failed to create content dir");
        Self { dir }
    }

    /// Write `content` to `content/<path>`, creating parent directories.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.content_root().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn content_root(&self) -> PathBuf {
        self.dir.path().join("content")
    }

    pub fn index_file(&self) -> PathBuf {
        self.dir.path().join("index.bin")
    }

    /// Settings pointing at this project, with the given embedding method.
    pub fn settings(&self, method: EmbeddingMethod) -> Settings {
        let mut settings = Settings::default();
        settings.index_path = self.index_file();
        settings.content_root = self.content_root();
        settings.workspace_root = Some(self.dir.path().to_path_buf());
        settings.embedding.method = method;
        settings
    }

    pub fn manager(&self, method: EmbeddingMethod) -> IndexManager {
        self.manager_with(&self.settings(method))
    }

    pub fn manager_with(&self, settings: &Settings) -> IndexManager {
        let engine = EmbeddingEngine::from_config(&settings.embedding).into_shared();
        let resolver = Arc::new(WorkspacePaths::from_settings(settings));
        IndexManager::with_settings(engine, resolver, settings)
    }
}

pub mod sample_content {
    pub const MARKDOWN: &str = "\
# Vector search

Embeddings turn each chunk of text into a vector of numbers that can be compared.

# Persistence

The index is written to a single binary file with a checksum at the end.
";

    pub const CPP: &str = "\
#include <vector>

int add(int a, int b) {
    return a + b;
}

double average(const std::vector<double>& values) {
    double total = 0.0;
    for (double v : values) {
        total += v;
    }
    return values.empty() ? 0.0 : total / values.size();
}

void print_report(int count) {
    printf(\"processed %d records\\n\", count);
}
";

    /// Deterministic prose of roughly `chars` characters.
    pub fn prose(chars: usize) -> String {
        const SENTENCES: &[&str] = &[
            "The retrieval engine scores every stored embedding against the query. ",
            "Chunks that score below the threshold are dropped before ranking! ",
            "Does the heap keep only the best results seen so far? ",
            "Overlapping windows keep sentences from being cut in half. ",
        ];
        let mut text = String::with_capacity(chars + 80);
        let mut i = 0;
        while text.len() < chars {
            text.push_str(SENTENCES[i % SENTENCES.len()]);
            i += 1;
        }
        text.truncate(chars);
        text
    }
}
