//! HNSW best-first search.

use crate::embedding::DocId;
use crate::error::{IndexError, Result};
use crate::hnsw::graph::HnswIndex;
use crate::topk::{BoundedTopK, Scored};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Candidate node during search; the heap pops the most similar first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) handle: u32,
    pub(crate) similarity: f32,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on similarity; lower handle first on ties.
        self.similarity
            .total_cmp(&other.similarity)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dense visited bitmap over arena handles.
struct VisitedSet {
    seen: Vec<bool>,
}

impl VisitedSet {
    fn new(capacity: usize) -> Self {
        Self {
            seen: vec![false; capacity],
        }
    }

    /// Returns `true` if `handle` was not visited before.
    #[inline]
    fn insert(&mut self, handle: u32) -> bool {
        let slot = &mut self.seen[handle as usize];
        !std::mem::replace(slot, true)
    }
}

impl<K: DocId> HnswIndex<K> {
    /// Approximate k nearest neighbors of `query`, most similar first, using
    /// the index's default `ef_search`.
    ///
    /// An empty index returns an empty list.
    pub fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Scored<K>>> {
        self.search_knn_with_ef(query, k, self.params.ef_search)
    }

    /// Approximate k nearest neighbors with an explicit search breadth.
    ///
    /// Best-first expansion from the entry point over the neighbor lists of
    /// every level a node participates in. A popped candidate is expanded only
    /// while it still improves the `ef`-sized result set. `ef` is raised to at
    /// least `k` and capped at `len()`. Results hold at most `min(k, len())`
    /// distinct ids.
    pub fn search_knn_with_ef(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<Scored<K>>> {
        let Some(entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        self.check_query(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let ef = ef_search.max(k).min(self.nodes.len());
        let mut visited = VisitedSet::new(self.nodes.len());
        let mut candidates = BinaryHeap::with_capacity(ef);
        let mut results: BoundedTopK<u32> = BoundedTopK::new(ef);

        visited.insert(entry);
        candidates.push(Candidate {
            handle: entry,
            similarity: self.similarity_to(query, entry),
        });

        while let Some(current) = candidates.pop() {
            if !results.accepts(current.similarity) {
                continue;
            }
            results.add(current.handle, current.similarity);

            let node = &self.nodes[current.handle as usize];
            for layer in (0..=node.level).rev() {
                for &neighbor in node.neighbors_at(layer) {
                    if !visited.insert(neighbor) {
                        continue;
                    }
                    let similarity = self.similarity_to(query, neighbor);
                    if results.accepts(similarity) {
                        candidates.push(Candidate {
                            handle: neighbor,
                            similarity,
                        });
                    }
                }
            }
        }

        Ok(results
            .into_vec()
            .into_iter()
            .take(k)
            .map(|hit| Scored {
                id: self.nodes[hit.id as usize].id.clone(),
                score: hit.score,
            })
            .collect())
    }

    /// Beam search restricted to one level, used while linking.
    ///
    /// Returns up to `ef` handles, most similar first.
    pub(crate) fn search_layer(
        &self,
        query: &[f32],
        entry: u32,
        layer: usize,
        ef: usize,
    ) -> Vec<Scored<u32>> {
        let ef = ef.clamp(1, self.nodes.len().max(1));
        let mut visited = VisitedSet::new(self.nodes.len());
        let mut candidates = BinaryHeap::with_capacity(ef);
        let mut results: BoundedTopK<u32> = BoundedTopK::new(ef);

        let entry_similarity = self.similarity_to(query, entry);
        visited.insert(entry);
        candidates.push(Candidate {
            handle: entry,
            similarity: entry_similarity,
        });
        results.add(entry, entry_similarity);

        while let Some(current) = candidates.pop() {
            // Best unexplored candidate is worse than the worst kept result.
            if results.is_full() && results.worst_score().is_some_and(|w| current.similarity < w) {
                break;
            }
            for &neighbor in self.nodes[current.handle as usize].neighbors_at(layer) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let similarity = self.similarity_to(query, neighbor);
                if results.add(neighbor, similarity) {
                    candidates.push(Candidate {
                        handle: neighbor,
                        similarity,
                    });
                }
            }
        }

        results.into_vec()
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        crate::distance::check_finite(query)?;
        match self.dimension {
            Some(d) if d != query.len() => Err(IndexError::dimension(d, query.len())),
            _ => Ok(()),
        }
    }
}
