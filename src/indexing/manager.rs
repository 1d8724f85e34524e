//! The index manager: owns the chunk collection, the reverse text map and the
//! vector store, and coordinates chunking, embedding, eviction and persistence.
//!
//! # Locking
//!
//! One `RwLock` guards chunks, reverse map and store together. Queries take it
//! shared; every mutation takes it exclusively for its whole duration, so a
//! reader never sees the three structures out of step. When both locks are
//! needed the index lock is always taken before the embedding engine's.

use crate::chunking::Chunker;
use crate::config::{IndexingConfig, Settings};
use crate::embedding::{EmbeddingEngine, SharedEmbeddingEngine};
use crate::error::{IndexError, IndexResult};
use crate::indexing::progress::{FileIndexOutcome, IndexStats, ProjectIndexSummary};
use crate::indexing::walker::FileWalker;
use crate::paths::{PathResolver, WorkspacePaths, absolute_normalized, is_under};
use crate::storage::{IndexPersistence, IndexSnapshot, LoadOutcome};
use crate::types::{Chunk, ScoredChunk};
use crate::vector::{SimilarityKind, VectorStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Chunks with fewer non-whitespace characters are not committed
const MIN_NON_SPACE_CHARS: usize = 10;

/// Result of loading an index file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file was read; the count is the number of chunks loaded
    Loaded(usize),
    /// No file at the path; the in-memory index was left as it was
    Missing,
}

/// Everything the index lock protects
#[derive(Debug)]
struct IndexState {
    chunks: Vec<Chunk>,
    /// Chunk text to its position in `chunks`; last writer wins on duplicates
    text_to_index: HashMap<String, usize>,
    store: VectorStore,
    index_path: PathBuf,
}

impl IndexState {
    /// Append one embedded chunk to all three structures.
    fn commit(&mut self, chunk: Chunk) {
        let index = self.chunks.len();
        self.store
            .add_embedded(chunk.code.clone(), chunk.embedding.clone());
        self.text_to_index.insert(chunk.code.clone(), index);
        self.chunks.push(chunk);
    }

    /// Recreate the reverse map and store from `chunks`, reusing stored
    /// embeddings. Chunks without an embedding stay enumerable but unsearchable.
    fn rebuild(&mut self) {
        self.store.clear();
        self.text_to_index.clear();
        for (index, chunk) in self.chunks.iter().enumerate() {
            if chunk.is_searchable() {
                self.store
                    .add_embedded(chunk.code.clone(), chunk.embedding.clone());
                self.text_to_index.insert(chunk.code.clone(), index);
            }
        }
        debug!(
            chunks = self.chunks.len(),
            searchable = self.store.len(),
            "rebuilt vector store"
        );
    }

    fn estimated_bytes(&self) -> usize {
        self.chunks.iter().map(Chunk::estimated_bytes).sum()
    }

    /// Drop chunks whose file is under `root`; returns how many were removed.
    fn remove_under(&mut self, root: &Path) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|c| !is_under(&c.file_name, root));
        let removed = before - self.chunks.len();
        if removed > 0 {
            self.rebuild();
        }
        removed
    }
}

/// Coordinates chunking, embedding, search and persistence of one index.
pub struct IndexManager {
    state: RwLock<IndexState>,
    engine: SharedEmbeddingEngine,
    resolver: Arc<dyn PathResolver>,
    chunker: Chunker,
    walker: FileWalker,
    limits: IndexingConfig,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("chunks", &self.len())
            .field("index_path", &self.index_path())
            .field("content_root", &self.resolver.content_root())
            .finish_non_exhaustive()
    }
}

impl IndexManager {
    /// Manager with default settings around an existing engine
    pub fn new(engine: SharedEmbeddingEngine, resolver: Arc<dyn PathResolver>) -> Self {
        Self::with_settings(engine, resolver, &Settings::default())
    }

    pub fn with_settings(
        engine: SharedEmbeddingEngine,
        resolver: Arc<dyn PathResolver>,
        settings: &Settings,
    ) -> Self {
        let store = VectorStore::new(Arc::clone(&engine), settings.retrieval.similarity)
            .with_min_score(settings.retrieval.min_score);
        let index_path = resolver.default_index_path();

        Self {
            state: RwLock::new(IndexState {
                chunks: Vec::new(),
                text_to_index: HashMap::new(),
                store,
                index_path,
            }),
            engine,
            resolver,
            chunker: Chunker::new(settings.chunking.clone()),
            walker: FileWalker::new(settings.indexing.clone()),
            limits: settings.indexing.clone(),
        }
    }

    /// Build engine, resolver and manager from settings alone
    pub fn from_settings(settings: &Settings) -> Self {
        let engine = EmbeddingEngine::from_config(&settings.embedding).into_shared();
        let resolver = Arc::new(WorkspacePaths::from_settings(settings));
        Self::with_settings(engine, resolver, settings)
    }

    /// Handle to the shared embedding engine
    pub fn engine(&self) -> SharedEmbeddingEngine {
        Arc::clone(&self.engine)
    }

    /// File used by [`save_index`](Self::save_index) and [`load_index`](Self::load_index)
    pub fn index_path(&self) -> PathBuf {
        self.state.read().index_path.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().chunks.is_empty()
    }

    /// Load the index at `index_path` (or the resolver default), then prune
    /// chunks whose file is outside the content root and rebuild.
    ///
    /// Missing or unusable index files leave the index empty rather than
    /// failing. Returns the number of chunks ready afterwards.
    pub fn init(&self, index_path: Option<&Path>) -> usize {
        let path = index_path
            .map(absolute_normalized)
            .unwrap_or_else(|| self.resolver.default_index_path());

        info!(path = %path.display(), "loading index");
        let snapshot = match read_snapshot(&path) {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                info!(path = %path.display(), "no index found, starting fresh");
                None
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "index file unusable, starting fresh");
                None
            }
        };

        let root = absolute_normalized(self.resolver.content_root());
        let mut state = self.state.write();
        state.index_path = path.clone();
        if let Some(snapshot) = snapshot {
            if let Err(e) = self.apply_snapshot(&mut state, snapshot, &path) {
                error!(path = %path.display(), error = %e, "index file unusable, starting fresh");
            }
        }

        let before = state.chunks.len();
        state.chunks.retain(|c| is_under(&c.file_name, &root));
        let pruned = before - state.chunks.len();
        if pruned > 0 {
            info!(pruned, root = %root.display(), "pruned out-of-scope chunks");
        }
        state.rebuild();

        info!(chunks = state.chunks.len(), "initialization complete");
        state.chunks.len()
    }

    /// Chunk, embed and commit one file.
    ///
    /// Non-ASCII bytes are replaced by spaces before chunking. Chunks that are
    /// blank, have too little content or fail to embed are skipped; the rest
    /// are committed together under one exclusive lock.
    pub fn index_file(&self, path: &Path) -> IndexResult<FileIndexOutcome> {
        let path = absolute_normalized(path);
        let mut outcome = FileIndexOutcome {
            path: path.clone(),
            ..Default::default()
        };

        let metadata = fs::metadata(&path).map_err(|source| IndexError::FileRead {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(IndexError::FileRead {
                path,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        if metadata.len() > self.limits.max_file_size {
            return Err(IndexError::FileTooLarge {
                path,
                size: metadata.len(),
                limit: self.limits.max_file_size,
            });
        }

        let bytes = fs::read(&path).map_err(|source| IndexError::FileRead {
            path: path.clone(),
            source,
        })?;
        if bytes.is_empty() {
            warn!(file = %path.display(), "file is empty, skipping");
            return Ok(outcome);
        }
        let content = sanitize_ascii(&bytes);

        let mut candidates = self.chunker.chunk(&path, &content);
        if candidates.is_empty() {
            warn!(file = %path.display(), "no chunks produced, indexing whole file as one chunk");
            candidates.push(whole_file_chunk(&path, &content));
            outcome.used_fallback = true;
        }

        let total = candidates.len();
        let mut accepted = Vec::with_capacity(total);
        for (ordinal, mut chunk) in candidates.into_iter().enumerate() {
            if chunk.code.trim().is_empty() {
                warn!(file = %path.display(), ordinal, "skipping blank chunk");
                continue;
            }
            chunk.code.retain(|c| c != '\0');
            let non_space = chunk.code.chars().filter(|c| !c.is_whitespace()).count();
            if non_space < MIN_NON_SPACE_CHARS {
                warn!(file = %path.display(), ordinal, non_space, "skipping low-content chunk");
                continue;
            }

            match self.engine.lock().try_embed(&chunk.code) {
                Ok(embedding) => chunk.embedding = embedding,
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        ordinal,
                        error = %e,
                        "skipping chunk with unusable embedding"
                    );
                    continue;
                }
            }
            accepted.push(chunk);
        }

        outcome.chunks_committed = accepted.len();
        outcome.chunks_skipped = total - accepted.len();

        if !accepted.is_empty() {
            let mut state = self.state.write();
            for chunk in accepted {
                state.commit(chunk);
            }
        }

        debug!(
            file = %path.display(),
            committed = outcome.chunks_committed,
            requested = total,
            "indexed file"
        );
        Ok(outcome)
    }

    /// Number of files [`index_project`](Self::index_project) would visit
    pub fn count_indexable_files(&self, root: &Path) -> usize {
        self.walker.count_files(root)
    }

    /// Replace everything indexed under `root` with a fresh walk of it.
    pub fn index_project(&self, root: &Path) -> IndexResult<ProjectIndexSummary> {
        self.index_project_with(root, |_| {})
    }

    /// Like [`index_project`](Self::index_project), calling `on_file` after
    /// each visited file.
    pub fn index_project_with<F>(
        &self,
        root: &Path,
        mut on_file: F,
    ) -> IndexResult<ProjectIndexSummary>
    where
        F: FnMut(&Path),
    {
        let root = absolute_normalized(root);
        if !root.is_dir() {
            return Err(IndexError::InvalidRoot { path: root });
        }

        let mut summary = ProjectIndexSummary::new(root.clone());
        summary.chunks_removed = self.remove_chunks_from_path(&root);
        if summary.chunks_removed > 0 {
            info!(removed = summary.chunks_removed, root = %root.display(), "removed old chunks");
        }

        for entry in self.walker.walk(&root) {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    error!(root = %root.display(), error = %e, "file system error, stopping walk");
                    summary.walk_aborted = true;
                    break;
                }
            };

            match self.index_file(&file) {
                Ok(outcome) => summary.record_success(&outcome),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "failed to index file");
                    summary.add_error(file.clone(), e.to_string());
                }
            }
            on_file(&file);
        }

        summary.stop_timing();
        info!(
            root = %root.display(),
            indexed = summary.files_indexed,
            failed = summary.files_failed,
            chunks = summary.chunks_added,
            "indexed project"
        );
        Ok(summary)
    }

    /// Remove every chunk whose file lies under `root` (compared by whole path
    /// components). Returns the number removed.
    pub fn remove_chunks_from_path(&self, root: &Path) -> usize {
        let root = absolute_normalized(root);
        self.state.write().remove_under(&root)
    }

    /// Evict the oldest fifth of chunks (by insertion order) when the chunk
    /// count or estimated memory exceeds the configured ceilings.
    ///
    /// Returns the number of chunks evicted.
    pub fn enforce_memory_limits(&self) -> usize {
        let mut state = self.state.write();
        let count = state.chunks.len();
        let bytes = state.estimated_bytes();
        if count <= self.limits.max_chunks && bytes <= self.limits.max_total_bytes {
            return 0;
        }

        let evict = count / 5;
        state.chunks.drain(..evict);
        state.rebuild();
        info!(
            evicted = evict,
            remaining = state.chunks.len(),
            estimated_bytes = bytes,
            "memory limits exceeded, evicted oldest chunks"
        );
        evict
    }

    /// Raw `(text, score)` hits, best first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        self.state.read().store.retrieve(query, top_k)
    }

    /// Hits mapped back to their chunks through the reverse map.
    pub fn retrieve_relevant(&self, query: &str, top_k: usize) -> Vec<ScoredChunk> {
        let state = self.state.read();
        state
            .store
            .retrieve(query, top_k)
            .into_iter()
            .filter_map(|(text, score)| {
                let index = *state.text_to_index.get(&text)?;
                let chunk = state.chunks.get(index)?.clone();
                Some(ScoredChunk { chunk, score })
            })
            .collect()
    }

    /// Snapshot of all chunks, searchable or not
    pub fn get_chunks(&self) -> Vec<Chunk> {
        self.state.read().chunks.clone()
    }

    /// Run `f` over the chunks without cloning them
    pub fn with_chunks<R>(&self, f: impl FnOnce(&[Chunk]) -> R) -> R {
        f(&self.state.read().chunks)
    }

    /// Drop all chunks and reset the engine's corpus statistics.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.chunks.clear();
        state.text_to_index.clear();
        state.store.clear();
        self.engine.lock().reset();
        info!("cleared index");
    }

    pub fn set_similarity(&self, similarity: SimilarityKind) {
        self.state.write().store.set_similarity(similarity);
    }

    pub fn similarity(&self) -> SimilarityKind {
        self.state.read().store.similarity()
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        let engine = self.engine.lock();
        IndexStats {
            chunk_count: state.chunks.len(),
            searchable_count: state.store.len(),
            reverse_map_len: state.text_to_index.len(),
            estimated_bytes: state.estimated_bytes(),
            corpus_documents: engine.document_count(),
            embedding_method: engine.method(),
            similarity: state.store.similarity(),
        }
    }

    /// Save to the current index path
    pub fn save_index(&self) -> IndexResult<()> {
        let path = self.index_path();
        self.save_index_to(&path)
    }

    /// Write chunks and engine state to `path`, replacing it atomically.
    pub fn save_index_to(&self, path: &Path) -> IndexResult<()> {
        let state = self.state.read();
        let engine_state = self.engine.lock().to_state_bytes();

        IndexPersistence::new(path)
            .save(&state.chunks, &engine_state)
            .map_err(|source| {
                error!(path = %path.display(), error = %source, "failed to save index");
                IndexError::Persistence {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        info!(path = %path.display(), entries = state.chunks.len(), "index saved");
        Ok(())
    }

    /// Load from the current index path
    pub fn load_index(&self) -> IndexResult<LoadStatus> {
        let path = self.index_path();
        self.load_index_from(&path)
    }

    /// Replace the in-memory index with the contents of `path`.
    ///
    /// Nothing changes unless the whole file decodes: a corrupt file or an
    /// incompatible engine state returns an error and keeps the current index.
    pub fn load_index_from(&self, path: &Path) -> IndexResult<LoadStatus> {
        let Some(snapshot) = read_snapshot(path)? else {
            return Ok(LoadStatus::Missing);
        };

        let mut state = self.state.write();
        let loaded = self.apply_snapshot(&mut state, snapshot, path)?;
        state.rebuild();

        info!(path = %path.display(), entries = loaded, "index loaded");
        Ok(LoadStatus::Loaded(loaded))
    }

    /// Restore engine state and replace the chunk list; the caller rebuilds.
    /// On error `state` and the engine are untouched.
    fn apply_snapshot(
        &self,
        state: &mut IndexState,
        snapshot: IndexSnapshot,
        path: &Path,
    ) -> IndexResult<usize> {
        if !snapshot.engine_state.is_empty() {
            self.engine
                .lock()
                .restore_state_bytes(&snapshot.engine_state)
                .map_err(|source| IndexError::Persistence {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let mut chunks = snapshot.chunks;
        for chunk in &mut chunks {
            chunk.file_name = absolute_normalized(&chunk.file_name);
        }
        state.chunks = chunks;
        Ok(state.chunks.len())
    }
}

/// Decode the index file at `path`; `None` when it does not exist.
fn read_snapshot(path: &Path) -> IndexResult<Option<IndexSnapshot>> {
    match IndexPersistence::new(path).load() {
        Ok(LoadOutcome::Loaded(snapshot)) => Ok(Some(snapshot)),
        Ok(LoadOutcome::Missing) => Ok(None),
        Err(source) => Err(IndexError::Persistence {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replace every byte outside ASCII with a space.
fn sanitize_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { ' ' })
        .collect()
}

/// Last-resort chunk covering the whole file
fn whole_file_chunk(path: &Path, content: &str) -> Chunk {
    let lines = i32::try_from(content.lines().count().max(1)).unwrap_or(i32::MAX);
    Chunk::new(path.to_path_buf(), content.to_string()).with_lines(1, lines)
}
