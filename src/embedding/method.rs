use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How text is turned into a vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMethod {
    /// One value per input byte; dimension equals input length
    Simple,
    /// Term frequency times inverse document frequency over hashed buckets
    #[default]
    TfIdf,
    /// Per-bucket term counts
    WordHash,
    /// Delegated to an [`ExternalEmbedder`](super::ExternalEmbedder)
    External,
}

impl EmbeddingMethod {
    pub const ALL: [EmbeddingMethod; 4] = [
        EmbeddingMethod::Simple,
        EmbeddingMethod::TfIdf,
        EmbeddingMethod::WordHash,
        EmbeddingMethod::External,
    ];

    /// Stable tag used in the engine state blob
    pub fn tag(self) -> u32 {
        match self {
            Self::Simple => 0,
            Self::TfIdf => 1,
            Self::WordHash => 2,
            Self::External => 3,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.tag() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::TfIdf => "tfidf",
            Self::WordHash => "wordhash",
            Self::External => "external",
        }
    }

    /// Whether vectors have the fixed bucket dimension
    pub fn is_bucketed(self) -> bool {
        matches!(self, Self::TfIdf | Self::WordHash)
    }
}

impl fmt::Display for EmbeddingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown embedding method '{s}'. Expected one of: simple, tfidf, wordhash, external"
                )
            })
    }
}
