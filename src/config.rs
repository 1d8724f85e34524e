//! Configuration module for the retrieval engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RAGINDEX_` and use double underscores
//! to separate nested levels:
//! - `RAGINDEX_INDEXING__MAX_CHUNKS=500` sets `indexing.max_chunks`
//! - `RAGINDEX_EMBEDDING__METHOD=wordhash` sets `embedding.method`
//! - `RAGINDEX_RETRIEVAL__SIMILARITY=cosine` sets `retrieval.similarity`

use crate::embedding::EmbeddingMethod;
use crate::vector::SimilarityKind;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-workspace configuration directory
pub const WORKSPACE_DIR: &str = ".ragindex";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default index file used by save/load without an explicit path
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Root directory indexed content must live under; anything else is
    /// pruned when the index is initialized
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,

    /// Workspace root directory (where .ragindex is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Indexing limits and file selection
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Chunking parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding engine settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query-time settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Chunk count above which `enforce_memory_limits` evicts
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// Estimated byte usage above which `enforce_memory_limits` evicts
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: usize,

    /// Files larger than this are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Extensions (without the dot) picked up by project indexing
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Size-strategy window in bytes
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Bytes shared by consecutive size windows
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Size windows with fewer alphanumerics are discarded
    #[serde(default = "default_min_alnum_chars")]
    pub min_alnum_chars: usize,

    /// Function-strategy chunks are flushed at this many lines
    #[serde(default = "default_function_max_lines")]
    pub function_max_lines: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Embedding method used for chunks and queries
    #[serde(default)]
    pub method: EmbeddingMethod,

    /// Bucket count for hashed methods (TF-IDF, word hash)
    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Default number of results
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Similarity kernel used for scoring
    #[serde(default)]
    pub similarity: SimilarityKind,

    /// Hits scoring below this are discarded
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".ragindex/index.bin")
}
fn default_content_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_false() -> bool {
    false
}
fn default_max_chunks() -> usize {
    10_000
}
fn default_max_total_bytes() -> usize {
    100 * 1024 * 1024
}
fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}
fn default_extensions() -> Vec<String> {
    ["txt", "md", "epub", "pdf", "cpp", "h", "hpp", "c"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_window_size() -> usize {
    4096
}
fn default_overlap() -> usize {
    512
}
fn default_min_alnum_chars() -> usize {
    20
}
fn default_function_max_lines() -> usize {
    50
}
fn default_vocab_size() -> usize {
    10_000
}
fn default_top_k() -> usize {
    5
}
fn default_min_score() -> f32 {
    0.01
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            content_root: default_content_root(),
            workspace_root: None,
            debug: false,
            indexing: IndexingConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
            max_total_bytes: default_max_total_bytes(),
            max_file_size: default_max_file_size(),
            extensions: default_extensions(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            overlap: default_overlap(),
            min_alnum_chars: default_min_alnum_chars(),
            function_max_lines: default_function_max_lines(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            method: EmbeddingMethod::default(),
            vocab_size: default_vocab_size(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity: SimilarityKind::default(),
            min_score: default_min_score(),
        }
    }
}

impl IndexingConfig {
    /// Whether `ext` (with or without leading dot, any case) is indexed
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// `RAGINDEX_*` variables; a double underscore separates nested keys
fn env_overrides() -> Env {
    Env::prefixed("RAGINDEX_").map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .ragindex directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR).join("settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with RAGINDEX_ prefix
            // Use double underscore (__) to separate nested levels
            .merge(env_overrides())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(env_overrides())
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for a .ragindex directory,
    /// searching from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(WORKSPACE_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .ragindex is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(WORKSPACE_DIR).is_dir())
            .map(|ancestor| ancestor.to_path_buf())
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR).join("settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'ragindex init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(WORKSPACE_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, SETTINGS_TEMPLATE)?;
        Ok(config_path)
    }
}

const SETTINGS_TEMPLATE: &str = r#"# ragindex configuration

# Version of the configuration schema
version = 1

# Default index file (relative to the workspace root)
index_path = ".ragindex/index.bin"

# Indexed files must live under this directory; other chunks are pruned on load
content_root = "."

# Global debug mode
debug = false

[indexing]
# Eviction ceilings checked by `ragindex evict` and after `ragindex index`
max_chunks = 10000
max_total_bytes = 104857600

# Files larger than this many bytes are skipped
max_file_size = 10485760

# Extensions picked up when indexing a directory
extensions = ["txt", "md", "epub", "pdf", "cpp", "h", "hpp", "c"]

[chunking]
# Sliding window for prose, in bytes, and the overlap between windows
window_size = 4096
overlap = 512

# Windows with fewer alphanumeric characters are dropped
min_alnum_chars = 20

# Source-code chunks are split after this many lines
function_max_lines = 50

[embedding]
# One of: simple, tfidf, wordhash, external
method = "tfidf"

# Number of hash buckets for tfidf and wordhash
vocab_size = 10000

[retrieval]
# Default number of results
top_k = 5

# One of: cosine, euclidean, dot_product, jaccard
similarity = "dot_product"

# Results scoring below this are dropped
min_score = 0.01
"#;
