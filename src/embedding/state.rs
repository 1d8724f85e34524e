//! Corpus statistics backing TF-IDF weighting.

use crate::storage::{ByteReader, ByteWriter, PersistenceResult};
use std::collections::{HashMap, HashSet};

/// Global term and document frequencies plus every document ever embedded.
///
/// Grows monotonically: evicting or removing chunks does not shrink it, so IDF
/// keeps reflecting documents that may no longer be searchable. Only
/// [`CorpusStats::clear`] resets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    documents: Vec<String>,
    term_frequency: HashMap<String, f32>,
    document_frequency: HashMap<String, u64>,
}

impl CorpusStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one document and its tokens.
    pub fn update(&mut self, text: &str, tokens: &[String]) {
        let mut seen = HashSet::with_capacity(tokens.len());
        for token in tokens {
            *self.term_frequency.entry(token.clone()).or_default() += 1.0;
            if seen.insert(token.as_str()) {
                *self.document_frequency.entry(token.clone()).or_default() += 1;
            }
        }
        self.documents.push(text.to_string());
    }

    /// `ln(N / (1 + df))`, or 0 for a term never seen.
    pub fn idf(&self, term: &str) -> f32 {
        match self.document_frequency.get(term) {
            Some(&df) if df > 0 => {
                (self.documents.len() as f32 / (1.0 + df as f32)).ln()
            }
            _ => 0.0,
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn term_frequency(&self, term: &str) -> f32 {
        self.term_frequency.get(term).copied().unwrap_or(0.0)
    }

    pub fn document_frequency(&self, term: &str) -> u64 {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.document_frequency.len()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.term_frequency.clear();
        self.document_frequency.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Append the documents and both frequency maps. Map entries are written
    /// in key order so identical stats always encode to identical bytes.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_len(self.documents.len());
        for doc in &self.documents {
            writer.put_str(doc);
        }

        let mut terms: Vec<_> = self.term_frequency.iter().collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(b.0));
        writer.put_len(terms.len());
        for (term, freq) in terms {
            writer.put_str(term);
            writer.put_f32(*freq);
        }

        let mut docs: Vec<_> = self.document_frequency.iter().collect();
        docs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        writer.put_len(docs.len());
        for (term, count) in docs {
            writer.put_str(term);
            writer.put_u64(*count);
        }
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> PersistenceResult<Self> {
        let doc_count = reader.count("document count", 8)?;
        let mut documents = Vec::with_capacity(doc_count);
        for _ in 0..doc_count {
            documents.push(reader.string("document")?);
        }

        let term_count = reader.count("term frequency count", 8 + 4)?;
        let mut term_frequency = HashMap::with_capacity(term_count);
        for _ in 0..term_count {
            let term = reader.string("term")?;
            let freq = reader.f32()?;
            term_frequency.insert(term, freq);
        }

        let df_count = reader.count("document frequency count", 8 + 8)?;
        let mut document_frequency = HashMap::with_capacity(df_count);
        for _ in 0..df_count {
            let term = reader.string("term")?;
            let count = reader.u64()?;
            document_frequency.insert(term, count);
        }

        Ok(Self {
            documents,
            term_frequency,
            document_frequency,
        })
    }
}
