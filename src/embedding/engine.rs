use super::state::CorpusStats;
use super::tokenizer::{bucket, tokenize};
use super::{EmbeddingError, EmbeddingMethod, ExternalEmbedder, SharedEmbeddingEngine};
use crate::config::EmbeddingConfig;
use crate::storage::{ByteReader, ByteWriter, PersistenceError, PersistenceResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default bucket count for hashed methods
pub const DEFAULT_VOCAB_SIZE: usize = 10_000;

const STATE_MAGIC: &[u8; 4] = b"REMB";
const STATE_VERSION: u32 = 1;

/// Stateful text-to-vector transformer.
///
/// Owns the corpus statistics TF-IDF needs. Every TF-IDF embedding, including
/// query embeddings, records its text in those statistics.
pub struct EmbeddingEngine {
    method: EmbeddingMethod,
    vocab_size: usize,
    corpus: CorpusStats,
    external: Option<Arc<dyn ExternalEmbedder>>,
}

impl std::fmt::Debug for EmbeddingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let external = self.external.as_ref().map(|e| e.name().to_string());
        f.debug_struct("EmbeddingEngine")
            .field("method", &self.method)
            .field("vocab_size", &self.vocab_size)
            .field("documents", &self.corpus.document_count())
            .field("external", &external)
            .finish()
    }
}

impl Default for EmbeddingEngine {
    fn default() -> Self {
        Self::new(EmbeddingMethod::default())
    }
}

impl EmbeddingEngine {
    pub fn new(method: EmbeddingMethod) -> Self {
        Self::with_vocab_size(method, DEFAULT_VOCAB_SIZE)
    }

    pub fn with_vocab_size(method: EmbeddingMethod, vocab_size: usize) -> Self {
        Self {
            method,
            vocab_size: vocab_size.max(1),
            corpus: CorpusStats::new(),
            external: None,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::with_vocab_size(config.method, config.vocab_size)
    }

    /// Attach the provider used by [`EmbeddingMethod::External`]
    pub fn with_external(mut self, external: Arc<dyn ExternalEmbedder>) -> Self {
        self.external = Some(external);
        self
    }

    /// Wrap in the shared handle used by the store and the index manager
    pub fn into_shared(self) -> SharedEmbeddingEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn set_method(&mut self, method: EmbeddingMethod) {
        self.method = method;
    }

    pub fn method(&self) -> EmbeddingMethod {
        self.method
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn corpus(&self) -> &CorpusStats {
        &self.corpus
    }

    pub fn document_count(&self) -> usize {
        self.corpus.document_count()
    }

    /// Embed `text`, returning an empty vector when embedding fails.
    ///
    /// Successful results are L2-normalized. Empty, non-finite and zero-norm
    /// raw vectors all count as failures.
    pub fn embed(&mut self, text: &str) -> Vec<f32> {
        match self.try_embed(text) {
            Ok(vector) => vector,
            Err(e) => {
                debug!(method = %self.method, error = %e, "embedding rejected");
                Vec::new()
            }
        }
    }

    /// Like [`embed`](Self::embed) but reports why a vector was rejected.
    pub fn try_embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let raw = self.raw_embedding(text)?;
        normalize(raw)
    }

    fn raw_embedding(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self.method {
            EmbeddingMethod::Simple => Ok(embed_simple(text)),
            EmbeddingMethod::TfIdf => Ok(self.embed_tfidf(text)),
            EmbeddingMethod::WordHash => Ok(self.embed_word_hash(text)),
            EmbeddingMethod::External => match &self.external {
                Some(external) => external.embed(text),
                None => Ok(embed_simple(text)),
            },
        }
    }

    fn embed_tfidf(&mut self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        self.corpus.update(text, &tokens);

        let mut vector = vec![0.0; self.vocab_size];
        if tokens.is_empty() {
            return vector;
        }

        let mut counts: HashMap<&str, usize> = HashMap::with_capacity(tokens.len());
        for token in &tokens {
            *counts.entry(token.as_str()).or_default() += 1;
        }

        let total = tokens.len() as f32;
        // Colliding terms overwrite each other; the last token in order wins
        for token in &tokens {
            let tf = counts[token.as_str()] as f32 / total;
            vector[bucket(token, self.vocab_size)] = tf * self.corpus.idf(token);
        }
        vector
    }

    fn embed_word_hash(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocab_size];
        for token in tokenize(text) {
            vector[bucket(&token, self.vocab_size)] += 1.0;
        }
        vector
    }

    /// Drop all corpus statistics
    pub fn reset(&mut self) {
        self.corpus.clear();
    }

    /// Serialize method and corpus statistics.
    pub fn to_state_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.put_raw(STATE_MAGIC);
        writer.put_u32(STATE_VERSION);
        writer.put_u32(self.method.tag());
        writer.put_len(self.vocab_size);
        self.corpus.write_to(&mut writer);
        writer.into_inner()
    }

    /// Replace method and corpus statistics with a serialized state.
    ///
    /// On error the engine is left untouched.
    pub fn restore_state_bytes(&mut self, bytes: &[u8]) -> PersistenceResult<()> {
        let mut reader = ByteReader::new(bytes);
        reader.expect_magic(STATE_MAGIC)?;
        reader.expect_version(STATE_VERSION)?;

        let tag = reader.u32()?;
        let Some(method) = EmbeddingMethod::from_tag(tag) else {
            return Err(PersistenceError::UnknownMethod(tag));
        };

        let vocab_size = reader.u64()?;
        if vocab_size != self.vocab_size as u64 {
            return Err(PersistenceError::VocabularyMismatch {
                expected: self.vocab_size,
                actual: usize::try_from(vocab_size).unwrap_or(usize::MAX),
            });
        }

        let corpus = CorpusStats::read_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(PersistenceError::TrailingData(reader.remaining()));
        }

        self.method = method;
        self.corpus = corpus;
        Ok(())
    }

    /// Write the engine state to its own file.
    pub fn save_state(&self, path: &Path) -> PersistenceResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_state_bytes())?;
        Ok(())
    }

    /// Load engine state written by [`save_state`](Self::save_state).
    pub fn load_state(&mut self, path: &Path) -> PersistenceResult<()> {
        let bytes = std::fs::read(path)?;
        self.restore_state_bytes(&bytes).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "rejected embedding state");
        })
    }
}

fn embed_simple(text: &str) -> Vec<f32> {
    text.bytes().map(f32::from).collect()
}

/// L2-normalize a raw embedding, rejecting degenerate vectors.
fn normalize(mut vector: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::Empty);
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFinite);
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(EmbeddingError::ZeroNorm);
    }

    for value in &mut vector {
        *value /= norm;
    }
    Ok(vector)
}
