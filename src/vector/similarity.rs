//! Interchangeable similarity kernels.
//!
//! Every kernel compares the two vectors over their shared prefix (the shorter
//! length), returns 0 when either side is empty, and scores "more similar" as
//! higher. Accumulation happens in `f64`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pure scoring function over two vectors
pub trait SimilarityMetric: Send + Sync + fmt::Debug {
    fn score(&self, a: &[f32], b: &[f32]) -> f32;

    fn kind(&self) -> SimilarityKind;
}

/// Prefix both vectors share, or `None` if either is empty
fn shared<'a>(a: &'a [f32], b: &'a [f32]) -> Option<(&'a [f32], &'a [f32])> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let len = a.len().min(b.len());
    Some((&a[..len], &b[..len]))
}

/// Normalized dot product; 0 when either vector has zero norm
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl SimilarityMetric for Cosine {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let Some((a, b)) = shared(a, b) else {
            return 0.0;
        };
        let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
        for (&x, &y) in a.iter().zip(b) {
            let (x, y) = (f64::from(x), f64::from(y));
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
    }

    fn kind(&self) -> SimilarityKind {
        SimilarityKind::Cosine
    }
}

/// `1 / (1 + L2 distance)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl SimilarityMetric for Euclidean {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let Some((a, b)) = shared(a, b) else {
            return 0.0;
        };
        let sum_sq: f64 = a
            .iter()
            .zip(b)
            .map(|(&x, &y)| {
                let diff = f64::from(x) - f64::from(y);
                diff * diff
            })
            .sum();
        (1.0 / (1.0 + sum_sq.sqrt())) as f32
    }

    fn kind(&self) -> SimilarityKind {
        SimilarityKind::Euclidean
    }
}

/// Unnormalized sum of pairwise products
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProduct;

impl SimilarityMetric for DotProduct {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let Some((a, b)) = shared(a, b) else {
            return 0.0;
        };
        a.iter()
            .zip(b)
            .map(|(&x, &y)| f64::from(x) * f64::from(y))
            .sum::<f64>() as f32
    }

    fn kind(&self) -> SimilarityKind {
        SimilarityKind::DotProduct
    }
}

/// Nonzero entries as set members: |A ∩ B| / |A ∪ B|
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl SimilarityMetric for Jaccard {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let Some((a, b)) = shared(a, b) else {
            return 0.0;
        };
        let (mut intersection, mut union) = (0usize, 0usize);
        for (&x, &y) in a.iter().zip(b) {
            let (in_a, in_b) = (x != 0.0, y != 0.0);
            if in_a || in_b {
                union += 1;
                if in_a && in_b {
                    intersection += 1;
                }
            }
        }
        if union == 0 {
            0.0
        } else {
            intersection as f32 / union as f32
        }
    }

    fn kind(&self) -> SimilarityKind {
        SimilarityKind::Jaccard
    }
}

/// Configurable selector for the kernels above
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    Cosine,
    Euclidean,
    #[default]
    DotProduct,
    Jaccard,
}

impl SimilarityKind {
    pub const ALL: [SimilarityKind; 4] = [
        SimilarityKind::Cosine,
        SimilarityKind::Euclidean,
        SimilarityKind::DotProduct,
        SimilarityKind::Jaccard,
    ];

    pub fn metric(self) -> Box<dyn SimilarityMetric> {
        match self {
            Self::Cosine => Box::new(Cosine),
            Self::Euclidean => Box::new(Euclidean),
            Self::DotProduct => Box::new(DotProduct),
            Self::Jaccard => Box::new(Jaccard),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dot_product",
            Self::Jaccard => "jaccard",
        }
    }
}

impl fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        if matches!(wanted.as_str(), "dot" | "dotproduct") {
            return Ok(Self::DotProduct);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown similarity '{s}'. Expected one of: cosine, euclidean, dot_product, jaccard"
                )
            })
    }
}
