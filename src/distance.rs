//! Similarity and distance metrics for dense vectors.
//!
//! The index ranks by *similarity* (larger is closer) while the clusterer
//! works with *distances* (smaller is closer). [`Metric`] offers both views:
//!
//! | Metric | similarity | distance |
//! |--------|------------|----------|
//! | `Cosine` | $\cos(a,b)$ | $1 - \cos(a,b)$ |
//! | `Euclidean` | $1 / (1 + \lVert a-b \rVert)$ | $\lVert a-b \rVert$ |
//!
//! Every checked function rejects slices of different length with
//! [`IndexError::DimensionMismatch`] instead of silently comparing a prefix.

use crate::error::{IndexError, Result};
use crate::simd;
use serde::{Deserialize, Serialize};

/// Metric used to compare two vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity; distance is $1 - \cos(a,b)$.
    #[default]
    Cosine,
    /// Euclidean-derived similarity $1 / (1 + d)$; distance is plain L2.
    Euclidean,
}

impl Metric {
    /// Similarity between two vectors (larger means closer).
    #[inline]
    pub fn similarity(self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_dimensions(a, b)?;
        Ok(self.similarity_unchecked(a, b))
    }

    /// Distance between two vectors (smaller means closer).
    #[inline]
    pub fn distance(self, a: &[f32], b: &[f32]) -> Result<f32> {
        check_dimensions(a, b)?;
        Ok(match self {
            Metric::Cosine => 1.0 - simd::cosine(a, b).clamp(-1.0, 1.0),
            Metric::Euclidean => simd::l2_distance(a, b),
        })
    }

    /// Similarity without the length check; used on hot paths where every
    /// stored vector was validated on insertion.
    #[inline]
    pub(crate) fn similarity_unchecked(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => simd::cosine(a, b),
            Metric::Euclidean => 1.0 / (1.0 + simd::l2_distance(a, b)),
        }
    }
}

/// Reject slices of different length.
#[inline]
pub fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(IndexError::dimension(a.len(), b.len()));
    }
    Ok(())
}

/// Reject empty vectors and vectors holding `NaN` or infinities.
pub(crate) fn check_finite(v: &[f32]) -> Result<()> {
    if v.is_empty() {
        return Err(IndexError::InvalidVector("vector is empty".to_string()));
    }
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(IndexError::InvalidVector(format!(
            "non-finite value {} at position {pos}",
            v[pos]
        )));
    }
    Ok(())
}

/// Cosine similarity $\cos(a,b)$. Zero-norm inputs give `0.0`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    Metric::Cosine.similarity(a, b)
}

/// Euclidean-derived similarity $1 / (1 + \lVert a-b \rVert)$, in `(0, 1]`.
#[inline]
pub fn euclidean_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    Metric::Euclidean.similarity(a, b)
}

/// Cosine distance $1 - \cos(a,b)$, the usual clustering distance.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    Metric::Cosine.distance(a, b)
}

/// Euclidean (L2) distance.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    Metric::Euclidean.distance(a, b)
}

/// Normalize a vector to unit L2 norm.
#[inline]
#[must_use]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = simd::norm(v);
    if n < 1e-10 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / n).collect()
}
