//! One search entry point over a dataset.
//!
//! [`VectorSearch`] carries the quantized fallback for any non-empty dataset.
//! Once the HNSW graph is built (or restored), queries go to the graph
//! instead.

use crate::distance::check_finite;
use crate::embedding::{DocId, Embedding, SkippedItem};
use crate::error::Result;
use crate::hnsw::{BuildReport, HnswIndex, HnswParams};
use crate::persistence::HnswMetadata;
use crate::progress::ProgressSink;
use crate::quantization::SbqIndex;
use crate::topk::Scored;
use std::collections::{HashMap, HashSet};

/// Which index answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// HNSW graph; scores are similarities.
    Graph,
    /// Scalar quantizer scan; scores are negated Hamming distances.
    Quantized,
}

/// Hits of one query, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults<K> {
    pub backend: Backend,
    pub hits: Vec<Scored<K>>,
}

impl<K> SearchResults<K> {
    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.hits.iter().map(|h| &h.id)
    }
}

/// Dataset plus its indexes.
#[derive(Debug)]
pub struct VectorSearch<K> {
    data: Vec<Embedding<K>>,
    params: HnswParams,
    /// `None` only for an empty dataset.
    quantized: Option<SbqIndex<K>>,
    graph: Option<HnswIndex<K>>,
}

impl<K: DocId> VectorSearch<K> {
    /// Train the quantizer over `data`. Rejected items are returned and left
    /// out of every index.
    ///
    /// An empty `data` gives a search that answers every query with no hits.
    /// Fails with `InsufficientData` if `data` is non-empty but every item is
    /// rejected.
    pub fn new(data: Vec<Embedding<K>>, params: HnswParams) -> Result<(Self, Vec<SkippedItem<K>>)> {
        if data.is_empty() {
            let search = Self {
                data,
                params,
                quantized: None,
                graph: None,
            };
            return Ok((search, Vec::new()));
        }
        let (quantized, skipped) = SbqIndex::build(data.iter().cloned())?;
        // Keep what the quantizer accepted: the first valid item per id.
        let dimension = quantized.quantizer().dimension();
        let mut seen = HashSet::new();
        let data = data
            .into_iter()
            .filter(|e| {
                e.dimension() == dimension
                    && check_finite(&e.vector).is_ok()
                    && seen.insert(e.id.clone())
            })
            .collect();
        Ok((
            Self {
                data,
                params,
                quantized: Some(quantized),
                graph: None,
            },
            skipped,
        ))
    }

    /// Build the HNSW graph over the dataset and switch queries to it.
    pub fn build_graph(&mut self, progress: &mut dyn ProgressSink) -> Result<BuildReport<K>> {
        let mut graph = HnswIndex::new(self.params.clone())?;
        let report = graph.build_index(self.data.iter().cloned(), progress);
        self.graph = Some(graph);
        Ok(report)
    }

    /// Restore the graph from persisted metadata, re-attaching this dataset's
    /// vectors by id.
    pub fn restore_graph(&mut self, metadata: HnswMetadata<K>) -> Result<()> {
        let vectors: HashMap<&K, &[f32]> = self
            .data
            .iter()
            .map(|e| (&e.id, e.vector.as_slice()))
            .collect();
        let graph = HnswIndex::restore(metadata, self.params.clone(), |id| {
            vectors.get(id).map(|v| v.to_vec())
        })?;
        self.graph = Some(graph);
        Ok(())
    }

    /// k nearest neighbors from the graph if present, else from the quantizer.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchResults<K>> {
        match &self.graph {
            Some(graph) => Ok(SearchResults {
                backend: Backend::Graph,
                hits: graph.search_knn(query, k)?,
            }),
            None => Ok(SearchResults {
                backend: Backend::Quantized,
                hits: match &self.quantized {
                    Some(quantized) => quantized.knn_search(query, k)?,
                    None => Vec::new(),
                },
            }),
        }
    }

    pub fn graph(&self) -> Option<&HnswIndex<K>> {
        self.graph.as_ref()
    }

    pub fn quantized(&self) -> Option<&SbqIndex<K>> {
        self.quantized.as_ref()
    }

    pub fn data(&self) -> &[Embedding<K>] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    fn data() -> Vec<Embedding<u32>> {
        (0..40u32)
            .map(|i| {
                let t = i as f32 * 0.15;
                Embedding::new(i, vec![t.cos(), t.sin(), 0.3, (t * 2.0).sin()])
            })
            .collect()
    }

    #[test]
    fn falls_back_to_quantizer_until_graph_exists() {
        let (mut search, skipped) = VectorSearch::new(
            data(),
            HnswParams {
                seed: Some(5),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(skipped.is_empty());

        let query = data()[7].vector.clone();
        let before = search.search(&query, 5).unwrap();
        assert_eq!(before.backend, Backend::Quantized);
        assert_eq!(before.hits.len(), 5);

        let report = search.build_graph(&mut NoProgress).unwrap();
        assert_eq!(report.inserted, 40);
        let after = search.search(&query, 5).unwrap();
        assert_eq!(after.backend, Backend::Graph);
        assert_eq!(after.hits[0].id, 7);
    }

    #[test]
    fn restored_graph_serves_queries() {
        let params = HnswParams {
            seed: Some(8),
            ..Default::default()
        };
        let (mut search, _) = VectorSearch::new(data(), params.clone()).unwrap();
        search.build_graph(&mut NoProgress).unwrap();
        let metadata = search.graph().unwrap().to_metadata();

        let (mut fresh, _) = VectorSearch::new(data(), params).unwrap();
        fresh.restore_graph(metadata).unwrap();
        let query = data()[21].vector.clone();
        let hits = fresh.search(&query, 3).unwrap();
        assert_eq!(hits.backend, Backend::Graph);
        assert_eq!(hits.ids().next(), Some(&21));
    }

    #[test]
    fn rejected_items_are_left_out() {
        let mut items = data();
        items.push(Embedding::new(99, vec![1.0, 2.0]));
        let (search, skipped) = VectorSearch::new(items, HnswParams::default()).unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(search.len(), 40);
    }

    #[test]
    fn empty_dataset_answers_with_no_hits() {
        let (mut search, skipped) =
            VectorSearch::<u32>::new(Vec::new(), HnswParams::default()).unwrap();
        assert!(skipped.is_empty());
        assert!(search.is_empty());
        assert!(search.quantized().is_none());

        let before = search.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(before.backend, Backend::Quantized);
        assert!(before.hits.is_empty());

        let report = search.build_graph(&mut NoProgress).unwrap();
        assert_eq!(report.inserted, 0);
        let after = search.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(after.backend, Backend::Graph);
        assert!(after.hits.is_empty());
    }

    #[test]
    fn repeated_ids_are_reported_once() {
        let mut items = data();
        items.push(Embedding::new(3, vec![0.0, 0.0, 1.0, 0.0]));
        let (mut search, skipped) = VectorSearch::new(items, HnswParams::default()).unwrap();
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0].error, crate::IndexError::DuplicateId(_)));
        assert_eq!(search.len(), 40);

        let report = search.build_graph(&mut NoProgress).unwrap();
        assert!(report.is_complete());
    }
}
