//! Brute-force top-K search over parallel text/embedding arrays.

use super::similarity::{SimilarityKind, SimilarityMetric};
use crate::embedding::SharedEmbeddingEngine;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Hits scoring below this are dropped
pub const DEFAULT_MIN_SCORE: f32 = 0.01;

/// Documents and their embeddings, scored with a swappable kernel.
///
/// `documents[i]` and `embeddings[i]` always describe the same entry; a
/// document whose embedding failed is stored with an empty vector.
#[derive(Debug)]
pub struct VectorStore {
    engine: SharedEmbeddingEngine,
    metric: Box<dyn SimilarityMetric>,
    min_score: f32,
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

/// Heap entry ordered by score, then by earlier insertion
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl VectorStore {
    pub fn new(engine: SharedEmbeddingEngine, similarity: SimilarityKind) -> Self {
        Self {
            engine,
            metric: similarity.metric(),
            min_score: DEFAULT_MIN_SCORE,
            documents: Vec::new(),
            embeddings: Vec::new(),
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed `text` with the shared engine and append it.
    pub fn add_document(&mut self, text: impl Into<String>) {
        let text = text.into();
        let embedding = self.engine.lock().embed(&text);
        self.add_embedded(text, embedding);
    }

    pub fn add_documents<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            self.add_document(text);
        }
    }

    /// Append a document whose embedding was computed elsewhere.
    pub fn add_embedded(&mut self, text: impl Into<String>, embedding: Vec<f32>) {
        self.documents.push(text.into());
        self.embeddings.push(embedding);
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.embeddings.clear();
    }

    /// Swap the scoring kernel; stored embeddings are untouched.
    pub fn set_similarity(&mut self, similarity: SimilarityKind) {
        self.metric = similarity.metric();
    }

    pub fn set_metric(&mut self, metric: Box<dyn SimilarityMetric>) {
        self.metric = metric;
    }

    pub fn similarity(&self) -> SimilarityKind {
        self.metric.kind()
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Embed `query` and return up to `top_k` `(text, score)` pairs, best first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        if top_k == 0 || self.is_empty() {
            return Vec::new();
        }
        let query_embedding = self.engine.lock().embed(query);
        self.retrieve_by_embedding(&query_embedding, top_k)
    }

    /// Score every entry against an already computed query vector.
    pub fn retrieve_by_embedding(&self, query: &[f32], top_k: usize) -> Vec<(String, f32)> {
        if top_k == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(top_k + 1);
        for (index, embedding) in self.embeddings.iter().enumerate() {
            let score = self.metric.score(query, embedding);
            if score.is_nan() || score < self.min_score {
                continue;
            }
            heap.push(Reverse(Candidate { score, index }));
            if heap.len() > top_k {
                heap.pop();
            }
        }

        let mut ranked: Vec<Candidate> = heap.into_iter().map(|Reverse(c)| c).collect();
        ranked.sort_unstable_by(|a, b| b.cmp(a));
        ranked
            .into_iter()
            .map(|c| (self.documents[c.index].clone(), c.score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingEngine, EmbeddingMethod};

    fn store(kind: SimilarityKind) -> VectorStore {
        let engine = EmbeddingEngine::new(EmbeddingMethod::WordHash).into_shared();
        VectorStore::new(engine, kind)
    }

    #[test]
    fn test_documents_and_embeddings_stay_aligned() {
        let mut store = store(SimilarityKind::Cosine);
        store.add_documents(["alpha beta", "", "gamma"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.embeddings().len(), 3);
        // Failed embedding still occupies its slot
        assert!(store.embeddings()[1].is_empty());
    }

    #[test]
    fn test_retrieve_bounds_and_order() {
        let mut store = store(SimilarityKind::Cosine);
        store.add_documents([
            "rust ownership and borrowing",
            "rust traits and generics",
            "cooking pasta with garlic",
            "rust borrowing rules explained",
            "gardening in spring",
        ]);

        let results = store.retrieve("rust borrowing", 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].1 >= results[1].1);
        assert!(results.iter().all(|(_, score)| *score >= DEFAULT_MIN_SCORE));
        assert!(results.iter().all(|(text, _)| text.contains("borrowing")));
    }

    #[test]
    fn test_threshold_filters_unrelated_documents() {
        let mut store = store(SimilarityKind::Cosine);
        store.add_documents(["apples oranges", "bananas"]);
        assert!(store.retrieve("submarine", 5).is_empty());
    }

    #[test]
    fn test_zero_top_k_and_empty_store() {
        let mut store = store(SimilarityKind::DotProduct);
        assert!(store.retrieve("anything", 3).is_empty());
        store.add_document("anything at all");
        assert!(store.retrieve("anything", 0).is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = store(SimilarityKind::DotProduct);
        store.add_embedded("first", vec![1.0, 0.0]);
        store.add_embedded("second", vec![1.0, 0.0]);
        store.add_embedded("third", vec![1.0, 0.0]);

        let results = store.retrieve_by_embedding(&[1.0, 0.0], 2);
        let texts: Vec<_> = results.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_heap_keeps_best_scores() {
        let mut store = store(SimilarityKind::DotProduct);
        for (i, value) in [0.2f32, 0.9, 0.5, 0.7, 0.1].into_iter().enumerate() {
            store.add_embedded(format!("doc{i}"), vec![value]);
        }
        let results = store.retrieve_by_embedding(&[1.0], 3);
        let scores: Vec<f32> = results.iter().map(|(_, s)| *s).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_switching_similarity_keeps_embeddings() {
        let mut store = store(SimilarityKind::DotProduct);
        store.add_embedded("far", vec![10.0, 0.0]);
        store.add_embedded("near", vec![1.0, 0.1]);

        let dot = store.retrieve_by_embedding(&[1.0, 0.0], 1);
        assert_eq!(dot[0].0, "far");

        store.set_similarity(SimilarityKind::Euclidean);
        assert_eq!(store.similarity(), SimilarityKind::Euclidean);
        let euclid = store.retrieve_by_embedding(&[1.0, 0.0], 1);
        assert_eq!(euclid[0].0, "near");
        assert_eq!(store.len(), 2);
    }
}
