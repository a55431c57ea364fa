//! Bounded top-K accumulator.
//!
//! Keeps the `k` highest-scoring entries of a candidate stream, sorted
//! descending by score, without retaining the rest. Used as the result set of
//! HNSW search and of the quantizer's linear scan.
//!
//! Ties: an incoming entry is placed after existing entries with an equal
//! score, and a full accumulator only replaces its worst entry on a strictly
//! greater score. Among equal scores the earlier insertion therefore wins.

use serde::{Deserialize, Serialize};

/// An id paired with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<K> {
    pub id: K,
    pub score: f32,
}

/// Fixed-capacity, score-sorted accumulator.
#[derive(Debug, Clone)]
pub struct BoundedTopK<K> {
    capacity: usize,
    entries: Vec<Scored<K>>,
}

impl<K> BoundedTopK<K> {
    /// Create an empty accumulator holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity.min(1024)),
        }
    }

    /// Offer an entry. Returns `true` if it was kept.
    ///
    /// `NaN` scores are never kept.
    pub fn add(&mut self, id: K, score: f32) -> bool {
        if self.capacity == 0 || score.is_nan() {
            return false;
        }

        if self.entries.len() >= self.capacity {
            match self.entries.last() {
                Some(worst) if score > worst.score => {
                    self.entries.pop();
                }
                _ => return false,
            }
        }

        let pos = self.entries.partition_point(|e| e.score >= score);
        self.entries.insert(pos, Scored { id, score });
        true
    }

    /// Current entries, best first.
    #[inline]
    pub fn top_k(&self) -> &[Scored<K>] {
        &self.entries
    }

    /// Lowest retained score, if any.
    #[inline]
    pub fn worst_score(&self) -> Option<f32> {
        self.entries.last().map(|e| e.score)
    }

    /// Whether a candidate with `score` would currently be kept.
    #[inline]
    pub fn accepts(&self, score: f32) -> bool {
        !self.is_full() || self.worst_score().is_some_and(|w| score > w)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consume into the sorted entries.
    pub fn into_vec(self) -> Vec<Scored<K>> {
        self.entries
    }
}
