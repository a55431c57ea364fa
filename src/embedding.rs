//! Input records shared by every index and the clusterer.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Bound for external ids: the document store's primary key.
pub trait DocId: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> DocId for T {}

/// An `{id, vector}` pair pulled from the document store.
///
/// Every embedding passed to one index or clustering run must share the same
/// dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding<K> {
    pub id: K,
    pub vector: Vec<f32>,
}

impl<K> Embedding<K> {
    pub fn new(id: K, vector: Vec<f32>) -> Self {
        Self { id, vector }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

impl<K> From<(K, Vec<f32>)> for Embedding<K> {
    fn from((id, vector): (K, Vec<f32>)) -> Self {
        Self { id, vector }
    }
}

/// An item dropped from a batch operation, with the reason.
#[derive(Debug)]
pub struct SkippedItem<K> {
    pub id: K,
    pub error: crate::IndexError,
}
