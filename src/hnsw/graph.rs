//! HNSW graph storage, parameters and level sampling.

use crate::config;
use crate::distance::{self, Metric};
use crate::embedding::{DocId, Embedding, SkippedItem};
use crate::error::{IndexError, Result};
use crate::progress::{self, PhaseClock, ProgressSink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Per-level adjacency list of arena handles.
pub(crate) type NeighborList = SmallVec<[u32; 16]>;

/// What to drop when a neighbor list grows past `M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the most recently appended entry (the link just added).
    MostRecent,
    /// Drop the entry least similar to the list owner.
    #[default]
    LeastSimilar,
}

/// Which nodes a new node is linked to on each shared level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStrategy {
    /// Only the closest node found by the greedy descent, on every level the
    /// two nodes share.
    Closest,
    /// Layered insertion: an `ef_construction`-wide search on every level of
    /// the new node, linking a diverse subset of at most `M` candidates, plus
    /// a pinned level-0 link to an anchor node.
    #[default]
    Beam,
}

/// Tuning parameters for an [`HnswIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Maximum neighbors per node and level. Must be at least 2.
    pub m: usize,
    /// Candidate breadth while linking ([`LinkStrategy::Beam`] only).
    pub ef_construction: usize,
    /// Default candidate breadth for [`HnswIndex::search_knn`].
    pub ef_search: usize,
    pub metric: Metric,
    pub eviction: EvictionPolicy,
    pub linking: LinkStrategy,
    /// Seed for level sampling. `None` draws one from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: config::DEFAULT_M,
            ef_construction: config::DEFAULT_EF_CONSTRUCTION,
            ef_search: config::DEFAULT_EF_SEARCH,
            metric: Metric::Cosine,
            eviction: EvictionPolicy::default(),
            linking: LinkStrategy::default(),
            seed: None,
        }
    }
}

impl HnswParams {
    fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(IndexError::InvalidParameter(format!(
                "M must be at least 2, got {}",
                self.m
            )));
        }
        if self.ef_construction == 0 || self.ef_search == 0 {
            return Err(IndexError::InvalidParameter(
                "ef_construction and ef_search must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No nodes, no entry point.
    Empty,
    /// At least one node; still receiving insertions.
    Populated,
    /// Finished by `build_index` or `restore`; ready for read-only search.
    Built,
}

/// Precomputed geometric level distribution.
///
/// `prob(i) = exp(-i / levelMult) * (1 - exp(-1 / levelMult))` with
/// `levelMult = 1 / ln(M)`, truncated once a level's probability drops below
/// [`config::LEVEL_PROBABILITY_FLOOR`].
#[derive(Debug, Clone)]
pub(crate) struct LevelTable {
    probs: Vec<f64>,
}

impl LevelTable {
    pub(crate) fn new(m: usize) -> Self {
        let level_mult = 1.0 / (m as f64).ln();
        let tail = 1.0 - (-1.0 / level_mult).exp();
        let probs = (0..)
            .map(|level: u32| (-(level as f64) / level_mult).exp() * tail)
            .take_while(|&p| p >= config::LEVEL_PROBABILITY_FLOOR)
            .collect();
        Self { probs }
    }

    /// Inverse-CDF lookup of a uniform draw `r` in `[0, 1)`.
    pub(crate) fn sample(&self, mut r: f64) -> usize {
        for (level, &p) in self.probs.iter().enumerate() {
            if r < p {
                return level;
            }
            r -= p;
        }
        self.probs.len().saturating_sub(1)
    }

    pub(crate) fn len(&self) -> usize {
        self.probs.len()
    }
}

/// One graph node. Owned by the index arena, never removed.
#[derive(Debug, Clone)]
pub(crate) struct Node<K> {
    pub(crate) id: K,
    pub(crate) level: usize,
    /// `neighbors[l]` for `l` in `0..=level`.
    pub(crate) neighbors: Vec<NeighborList>,
    /// Older node this one is permanently linked to, both ways, on level 0.
    /// Anchor links form a spanning tree, so no node can be cut off by
    /// eviction. Only set by [`LinkStrategy::Beam`].
    pub(crate) anchor: Option<u32>,
    /// Number of nodes anchored to this one.
    pub(crate) anchored: usize,
}

impl<K> Node<K> {
    pub(crate) fn new(id: K, level: usize) -> Self {
        Self {
            id,
            level,
            neighbors: vec![NeighborList::new(); level + 1],
            anchor: None,
            anchored: 0,
        }
    }

    #[inline]
    pub(crate) fn neighbors_at(&self, level: usize) -> &[u32] {
        self.neighbors.get(level).map_or(&[], |n| n.as_slice())
    }
}

/// Outcome of [`HnswIndex::build_index`].
#[derive(Debug)]
pub struct BuildReport<K> {
    pub inserted: usize,
    /// Items rejected during the build, in input order.
    pub skipped: Vec<SkippedItem<K>>,
}

impl<K> BuildReport<K> {
    /// Whether every item made it into the index.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Turn the first skipped item into an error, for callers that treat any
    /// rejection (notably a dimension mismatch) as fatal.
    pub fn into_result(self) -> Result<usize> {
        match self.skipped.into_iter().next() {
            Some(item) => Err(item.error),
            None => Ok(self.inserted),
        }
    }
}

/// HNSW index over `{id, vector}` pairs.
#[derive(Debug)]
pub struct HnswIndex<K> {
    pub(crate) params: HnswParams,
    pub(crate) dimension: Option<usize>,
    /// Dimension pinned by [`HnswIndex::with_dimension`]; survives `reset`.
    pub(crate) fixed_dimension: Option<usize>,
    pub(crate) nodes: Vec<Node<K>>,
    /// Node `h` occupies `vectors[h * d..(h + 1) * d]`.
    pub(crate) vectors: Vec<f32>,
    pub(crate) handles: HashMap<K, u32>,
    pub(crate) entry_point: Option<u32>,
    pub(crate) level_max: usize,
    pub(crate) built: bool,
    pub(crate) levels: LevelTable,
    pub(crate) rng: StdRng,
}

impl<K: DocId> HnswIndex<K> {
    /// Create an empty index. The dimension is fixed by the first vector.
    pub fn new(params: HnswParams) -> Result<Self> {
        params.validate()?;
        let levels = LevelTable::new(params.m);
        let rng = seeded_rng(params.seed);
        Ok(Self {
            params,
            dimension: None,
            fixed_dimension: None,
            nodes: Vec::new(),
            vectors: Vec::new(),
            handles: HashMap::new(),
            entry_point: None,
            level_max: 0,
            built: false,
            levels,
            rng,
        })
    }

    /// Create an empty index that only accepts `dimension`-long vectors.
    pub fn with_dimension(dimension: usize, params: HnswParams) -> Result<Self> {
        if dimension == 0 {
            return Err(IndexError::InvalidParameter(
                "dimension must be greater than 0".to_string(),
            ));
        }
        let mut index = Self::new(params)?;
        index.dimension = Some(dimension);
        index.fixed_dimension = Some(dimension);
        Ok(index)
    }

    /// Reset all state and insert `data` in order.
    ///
    /// Items that fail validation are skipped, logged and listed in the
    /// returned report; the rest of the batch still goes in. Insertion order
    /// shapes the graph, so callers wanting reproducible builds should also
    /// set [`HnswParams::seed`].
    pub fn build_index<I>(&mut self, data: I, progress: &mut dyn ProgressSink) -> BuildReport<K>
    where
        I: IntoIterator<Item = Embedding<K>>,
    {
        let data: Vec<Embedding<K>> = data.into_iter().collect();
        self.reset();

        let total = data.len();
        let clock = PhaseClock::start(1);
        let mut report = BuildReport {
            inserted: 0,
            skipped: Vec::new(),
        };

        for (i, Embedding { id, vector }) in data.into_iter().enumerate() {
            match self.add_point(id.clone(), &vector) {
                Ok(()) => report.inserted += 1,
                Err(error) => {
                    tracing::warn!(id = ?id, %error, "skipping item during index build");
                    report.skipped.push(SkippedItem { id, error });
                }
            }
            progress::deliver(
                progress,
                clock.update("Building index", 0, (i + 1) as f64 / total as f64),
            );
        }

        self.built = !self.nodes.is_empty();
        tracing::debug!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            level_max = self.level_max,
            "HNSW index built"
        );
        report
    }

    /// Drop every node and reseed the level sampler.
    pub fn reset(&mut self) {
        self.dimension = self.fixed_dimension;
        self.nodes.clear();
        self.vectors.clear();
        self.handles.clear();
        self.entry_point = None;
        self.level_max = 0;
        self.built = false;
        self.rng = seeded_rng(self.params.seed);
    }

    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vector dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Highest level assigned so far.
    pub fn level_max(&self) -> usize {
        self.level_max
    }

    /// Number of levels in the precomputed level table.
    pub fn level_table_len(&self) -> usize {
        self.levels.len()
    }

    pub fn state(&self) -> IndexState {
        match (self.entry_point, self.built) {
            (None, _) => IndexState::Empty,
            (Some(_), false) => IndexState::Populated,
            (Some(_), true) => IndexState::Built,
        }
    }

    pub fn entry_point_id(&self) -> Option<&K> {
        self.entry_point.map(|h| &self.nodes[h as usize].id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.handles.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// Stored vector for `id`.
    pub fn vector(&self, id: &K) -> Option<&[f32]> {
        self.handles.get(id).map(|&h| self.vector_at(h))
    }

    /// Level sampled for `id` at insertion.
    pub fn node_level(&self, id: &K) -> Option<usize> {
        self.handles.get(id).map(|&h| self.nodes[h as usize].level)
    }

    /// Neighbor ids of `id` on `level` (empty above the node's level).
    pub fn neighbor_ids(&self, id: &K, level: usize) -> Option<Vec<K>> {
        let &h = self.handles.get(id)?;
        Some(
            self.nodes[h as usize]
                .neighbors_at(level)
                .iter()
                .map(|&n| self.nodes[n as usize].id.clone())
                .collect(),
        )
    }

    #[inline]
    pub(crate) fn vector_at(&self, handle: u32) -> &[f32] {
        let d = self.dimension.unwrap_or(0);
        let start = handle as usize * d;
        &self.vectors[start..start + d]
    }

    #[inline]
    pub(crate) fn similarity_to(&self, query: &[f32], handle: u32) -> f32 {
        self.params
            .metric
            .similarity_unchecked(query, self.vector_at(handle))
    }

    /// Reject vectors this index cannot hold.
    pub(crate) fn validate_vector(&self, vector: &[f32]) -> Result<()> {
        distance::check_finite(vector)?;
        match self.dimension {
            Some(d) if d != vector.len() => Err(IndexError::dimension(d, vector.len())),
            _ => Ok(()),
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_is_a_truncated_geometric_distribution() {
        let table = LevelTable::new(16);
        assert!(table.len() > 1);
        let total: f64 = table.probs.iter().sum();
        assert!(total <= 1.0 + 1e-12 && total > 0.999_999);
        assert!(table.probs.windows(2).all(|w| w[0] > w[1]));
        // With M = 16 level 0 takes 15/16 of the mass.
        assert!((table.probs[0] - 15.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn level_sampling_inverts_the_cdf() {
        let table = LevelTable::new(16);
        assert_eq!(table.sample(0.0), 0);
        assert_eq!(table.sample(0.9), 0);
        assert_eq!(table.sample(0.95), 1);
        assert_eq!(table.sample(1.0), table.len() - 1);
    }

    #[test]
    fn params_reject_small_m() {
        let params = HnswParams {
            m: 1,
            ..Default::default()
        };
        assert!(matches!(
            HnswIndex::<u32>::new(params),
            Err(IndexError::InvalidParameter(_))
        ));
    }

    #[test]
    fn fresh_index_is_empty() {
        let index: HnswIndex<u32> = HnswIndex::new(HnswParams::default()).unwrap();
        assert_eq!(index.state(), IndexState::Empty);
        assert!(index.entry_point_id().is_none());
        assert_eq!(index.dimension(), None);
    }

    #[test]
    fn build_report_into_result_surfaces_first_error() {
        let report: BuildReport<u32> = BuildReport {
            inserted: 2,
            skipped: vec![SkippedItem {
                id: 7,
                error: IndexError::dimension(3, 2),
            }],
        };
        assert!(!report.is_complete());
        assert!(matches!(
            report.into_result(),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }
}
