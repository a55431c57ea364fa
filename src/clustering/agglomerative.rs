//! Agglomerative hierarchical clustering.

use crate::clustering::selection::{self, ClusterCountSelector, VariancePeak};
use crate::config;
use crate::distance::{check_finite, Metric};
use crate::embedding::{DocId, Embedding, SkippedItem};
use crate::error::{IndexError, Result};
use crate::progress::{self, CancelToken, PhaseClock, ProgressSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Pairwise distance between two items (smaller is closer).
///
/// Implemented by [`Metric`] (cosine distance `1 - cos`, or Euclidean) and by
/// any `Fn(&[f32], &[f32]) -> f64` closure. A non-finite result counts as a
/// failed comparison.
pub trait PairwiseDistance: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64>;
}

impl PairwiseDistance for Metric {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        Metric::distance(*self, a, b).map(f64::from)
    }
}

impl<F> PairwiseDistance for F
where
    F: Fn(&[f32], &[f32]) -> f64 + Send + Sync,
{
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        Ok(self(a, b))
    }
}

/// Dense symmetric `n x n` distance matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    fn zeros(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
        }
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, d: f64) {
        self.values[i * self.n + j] = d;
        self.values[j * self.n + i] = d;
    }

    /// Keep only the rows and columns in `keep`, in that order.
    fn select(&self, keep: &[usize]) -> Self {
        let mut out = Self::zeros(keep.len());
        for (a, &i) in keep.iter().enumerate() {
            for (b, &j) in keep.iter().enumerate() {
                out.values[a * out.n + b] = self.get(i, j);
            }
        }
        out
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// Distance between two clusters given as item indexes.
pub trait Linkage: Send + Sync {
    fn distance(&self, a: &[usize], b: &[usize], distances: &DistanceMatrix) -> f64;
}

/// Mean of all pairwise distances between members.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageLinkage;

impl Linkage for AverageLinkage {
    fn distance(&self, a: &[usize], b: &[usize], distances: &DistanceMatrix) -> f64 {
        let mut sum = 0.0;
        for &i in a {
            for &j in b {
                sum += distances.get(i, j);
            }
        }
        sum / a.len() as f64 / b.len() as f64
    }
}

/// Closest pair of members.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleLinkage;

impl Linkage for SingleLinkage {
    fn distance(&self, a: &[usize], b: &[usize], distances: &DistanceMatrix) -> f64 {
        a.iter()
            .flat_map(|&i| b.iter().map(move |&j| distances.get(i, j)))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Farthest pair of members.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteLinkage;

impl Linkage for CompleteLinkage {
    fn distance(&self, a: &[usize], b: &[usize], distances: &DistanceMatrix) -> f64 {
        a.iter()
            .flat_map(|&i| b.iter().map(move |&j| distances.get(i, j)))
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// One merge of the dendrogram.
///
/// Node ids `0..n` are the leaves; merge `i` creates node `n + i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    /// Linkage distance at which the two nodes were joined.
    pub height: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

/// Flat binary merge tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    leaves: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Merges in the order they happened; always `leaves - 1` of them.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Root node id.
    pub fn root(&self) -> Option<usize> {
        match self.leaves {
            0 => None,
            n => Some(n - 1 + self.merges.len()),
        }
    }

    /// Merge height of `node`; `0.0` for leaves.
    pub fn height(&self, node: usize) -> Option<f64> {
        if node < self.leaves {
            return Some(0.0);
        }
        self.merges.get(node - self.leaves).map(|m| m.height)
    }

    /// Leaves in left-to-right order under the root.
    pub fn order(&self) -> Vec<usize> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        let mut order = Vec::with_capacity(self.leaves);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node < self.leaves {
                order.push(node);
            } else {
                let merge = &self.merges[node - self.leaves];
                stack.push(merge.right);
                stack.push(merge.left);
            }
        }
        order
    }
}

/// Cluster membership of one item at the selected cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Index of the item's cluster in the partition at the selected `k`.
    pub cluster_number: usize,
    /// Position of the item in the root's leaf ordering.
    pub order: usize,
}

/// Result of [`AgglomerativeClusterer::cluster_data`].
#[derive(Debug)]
pub struct Clustering<K> {
    ids: Vec<K>,
    distances: DistanceMatrix,
    dendrogram: Dendrogram,
    clusters_given_k: Vec<Vec<Vec<usize>>>,
    skipped: Vec<SkippedItem<K>>,
}

impl<K: DocId> Clustering<K> {
    /// Ids of the clustered items; item index `i` refers to `ids()[i]`.
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    pub fn dendrogram(&self) -> &Dendrogram {
        &self.dendrogram
    }

    /// Partition snapshots indexed by cluster count; entry 0 is empty.
    pub fn clusters_given_k(&self) -> &[Vec<Vec<usize>>] {
        &self.clusters_given_k
    }

    /// The partition with exactly `k` clusters, for `k` in `1..=len()`.
    pub fn partition(&self, k: usize) -> Option<&[Vec<usize>]> {
        if k == 0 {
            return None;
        }
        self.clusters_given_k.get(k).map(Vec::as_slice)
    }

    /// Items dropped before clustering, with the reason.
    pub fn skipped(&self) -> &[SkippedItem<K>] {
        &self.skipped
    }

    /// Item indexes in the root's flattened order.
    pub fn order(&self) -> Vec<usize> {
        self.partition(1)
            .and_then(|p| p.first())
            .cloned()
            .unwrap_or_default()
    }

    /// `positions()[item]` is the item's position in [`order`](Self::order).
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.ids.len()];
        for (pos, item) in self.order().into_iter().enumerate() {
            positions[item] = pos;
        }
        positions
    }

    /// Within-cluster variance for `k = 1..len()`, element `i` holding `k = i + 1`.
    pub fn variance_curve(&self) -> Vec<f64> {
        selection::variance_curve(&self.clusters_given_k, &self.distances)
    }

    /// `{id -> {cluster_number, order}}` for the partition with `k` clusters.
    pub fn assignments(&self, k: usize) -> Result<HashMap<K, Assignment>> {
        let partition = self.partition(k).ok_or_else(|| {
            IndexError::InvalidParameter(format!(
                "cluster count {k} outside 1..={}",
                self.ids.len()
            ))
        })?;
        let positions = self.positions();
        let mut out = HashMap::with_capacity(self.ids.len());
        for (cluster_number, members) in partition.iter().enumerate() {
            for &item in members {
                out.insert(
                    self.ids[item].clone(),
                    Assignment {
                        cluster_number,
                        order: positions[item],
                    },
                );
            }
        }
        Ok(out)
    }
}

/// Clustering plus the assignments at the selected cluster count.
#[derive(Debug)]
pub struct ClusterOutcome<K> {
    /// Selected cluster count.
    pub k: usize,
    pub assignments: HashMap<K, Assignment>,
    pub clustering: Clustering<K>,
}

/// Bottom-up hierarchical clusterer.
///
/// Every run computes the full distance matrix (O(n²) comparisons) and then
/// merges the closest pair of clusters `n - 1` times, scanning every pair on
/// each merge (O(n³) linkage evaluations in the worst case). Practical inputs
/// are limited to a few thousand items.
///
/// Ties between equally distant pairs go to the first pair in row-major scan
/// order, so a fixed input order and a deterministic distance always produce
/// the same merge sequence.
#[derive(Clone)]
pub struct AgglomerativeClusterer {
    distance: Arc<dyn PairwiseDistance>,
    linkage: Arc<dyn Linkage>,
    selector: Arc<dyn ClusterCountSelector>,
}

impl Default for AgglomerativeClusterer {
    /// Cosine distance, average linkage, variance-peak selection.
    fn default() -> Self {
        Self::new(Metric::Cosine)
    }
}

impl fmt::Debug for AgglomerativeClusterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgglomerativeClusterer").finish_non_exhaustive()
    }
}

impl AgglomerativeClusterer {
    pub fn new(distance: impl PairwiseDistance + 'static) -> Self {
        Self {
            distance: Arc::new(distance),
            linkage: Arc::new(AverageLinkage),
            selector: Arc::new(VariancePeak),
        }
    }

    pub fn with_linkage(mut self, linkage: impl Linkage + 'static) -> Self {
        self.linkage = Arc::new(linkage);
        self
    }

    pub fn with_selector(mut self, selector: impl ClusterCountSelector + 'static) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    /// Build the distance matrix and dendrogram over `items`.
    ///
    /// Items with empty or non-finite vectors, a dimension different from the
    /// first valid item, or a failing distance are dropped and listed in
    /// [`Clustering::skipped`]. When a pair fails, the item involved in the
    /// most failed pairs is dropped (the later one on a tie) and its partners
    /// are kept.
    ///
    /// Progress is reported once per matrix row (0..50) and once per merge
    /// (50..100); `cancel` is checked at the same points.
    ///
    /// # Errors
    ///
    /// `InsufficientData` if fewer than two items survive validation,
    /// `Cancelled` if `cancel` fires.
    pub fn cluster_data<K: DocId>(
        &self,
        items: Vec<Embedding<K>>,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Clustering<K>> {
        let clock = PhaseClock::start(2);
        let (mut items, mut skipped) = self.validate(items);
        ensure_enough(items.len())?;

        let (distances, faulty) = self.distance_matrix(&items, &clock, progress, cancel)?;
        let distances = if faulty.is_empty() {
            distances
        } else {
            let keep: Vec<usize> = (0..items.len()).filter(|i| !faulty.contains_key(i)).collect();
            let mut errors = faulty;
            let mut kept = Vec::with_capacity(keep.len());
            for (i, item) in items.into_iter().enumerate() {
                match errors.remove(&i) {
                    Some(error) => skipped.push(SkippedItem { id: item.id, error }),
                    None => kept.push(item),
                }
            }
            items = kept;
            ensure_enough(items.len())?;
            distances.select(&keep)
        };

        let n = items.len();
        let (dendrogram, clusters_given_k) = self.merge(&distances, &clock, progress, cancel)?;

        tracing::debug!(
            items = n,
            skipped = skipped.len(),
            root_height = ?dendrogram.merges().last().map(|m| m.height),
            "clustering finished"
        );
        Ok(Clustering {
            ids: items.into_iter().map(|e| e.id).collect(),
            distances,
            dendrogram,
            clusters_given_k,
            skipped,
        })
    }

    /// Recommended cluster count for `clustering`, in `1..=len()`.
    pub fn select_optimal_clusters<K: DocId>(&self, clustering: &Clustering<K>) -> usize {
        let k = self.selector.select(&clustering.variance_curve());
        k.clamp(1, clustering.len().max(1))
    }

    /// [`cluster_data`](Self::cluster_data), then select `k` and assign every
    /// item a cluster number and order.
    pub fn cluster_and_assign<K: DocId>(
        &self,
        items: Vec<Embedding<K>>,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ClusterOutcome<K>> {
        let clustering = self.cluster_data(items, progress, cancel)?;
        let k = self.select_optimal_clusters(&clustering);
        let assignments = clustering.assignments(k)?;
        Ok(ClusterOutcome {
            k,
            assignments,
            clustering,
        })
    }

    /// Drop items that cannot take part in any comparison.
    fn validate<K: DocId>(&self, items: Vec<Embedding<K>>) -> (Vec<Embedding<K>>, Vec<SkippedItem<K>>) {
        let mut kept: Vec<Embedding<K>> = Vec::with_capacity(items.len());
        let mut skipped = Vec::new();
        for item in items {
            let checked = check_finite(&item.vector)
                .and_then(|()| match kept.first() {
                    Some(first) if first.dimension() != item.dimension() => {
                        Err(IndexError::dimension(first.dimension(), item.dimension()))
                    }
                    _ => Ok(()),
                })
                .and_then(|()| self.checked_distance(&item.vector, &item.vector));
            match checked {
                Ok(_) => kept.push(item),
                Err(error) => {
                    tracing::warn!(id = ?item.id, %error, "skipping item before clustering");
                    skipped.push(SkippedItem { id: item.id, error });
                }
            }
        }
        (kept, skipped)
    }

    fn checked_distance(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        let d = self.distance.distance(a, b)?;
        if d.is_finite() {
            Ok(d)
        } else {
            Err(IndexError::InvalidVector(format!("distance evaluated to {d}")))
        }
    }

    /// Upper triangle computed, mirrored. Returns the dropped items by index.
    fn distance_matrix<K: DocId>(
        &self,
        items: &[Embedding<K>],
        clock: &PhaseClock,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<(DistanceMatrix, HashMap<usize, IndexError>)> {
        let n = items.len();
        let mut matrix = DistanceMatrix::zeros(n);
        let mut failures = Vec::new();

        for i in 0..n {
            cancel.check()?;
            progress::deliver(
                progress,
                clock.update("Computing distances", 0, i as f64 / (n - 1) as f64),
            );
            for j in (i + 1)..n {
                match self.checked_distance(&items[i].vector, &items[j].vector) {
                    Ok(d) => matrix.set(i, j, d),
                    Err(error) => failures.push((i, j, error)),
                }
            }
        }

        let dropped = blame_failures(failures, n);
        for (&i, error) in &dropped {
            tracing::warn!(id = ?items[i].id, %error, "distance failed; dropping item");
        }
        Ok((matrix, dropped))
    }

    /// Merge loop over a validated matrix.
    fn merge(
        &self,
        distances: &DistanceMatrix,
        clock: &PhaseClock,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<(Dendrogram, Vec<Vec<Vec<usize>>>)> {
        struct Cluster {
            node: usize,
            indexes: Vec<usize>,
        }

        let n = distances.len();
        let mut clusters: Vec<Cluster> = (0..n)
            .map(|i| Cluster {
                node: i,
                indexes: vec![i],
            })
            .collect();
        let mut merges = Vec::with_capacity(n.saturating_sub(1));
        let mut snapshots = Vec::with_capacity(n + 1);

        for iteration in 0..n {
            cancel.check()?;
            progress::deliver(
                progress,
                clock.update("Clustering", 1, (iteration + 1) as f64 / n as f64),
            );

            snapshots.push(clusters.iter().map(|c| c.indexes.clone()).collect::<Vec<_>>());
            if iteration + 1 >= n {
                break;
            }

            let mut nearest = f64::INFINITY;
            let (mut row, mut col) = (0, 1);
            for r in 0..clusters.len() {
                for c in (r + 1)..clusters.len() {
                    let d = self
                        .linkage
                        .distance(&clusters[r].indexes, &clusters[c].indexes, distances);
                    if d < nearest {
                        nearest = d;
                        row = r;
                        col = c;
                    }
                }
            }

            // col > row: remove the higher position first.
            let right = clusters.remove(col);
            let left = clusters.remove(row);
            let mut indexes = left.indexes;
            indexes.extend(right.indexes);
            merges.push(Merge {
                left: left.node,
                right: right.node,
                height: nearest,
                size: indexes.len(),
            });
            clusters.push(Cluster {
                node: n + merges.len() - 1,
                indexes,
            });
        }

        snapshots.push(Vec::new());
        snapshots.reverse();
        Ok((Dendrogram { leaves: n, merges }, snapshots))
    }
}

/// Choose items to drop so that no failed pair is left.
///
/// Repeatedly drops the item with the most unresolved failed pairs, the later
/// item on a tie. One bad item then costs only itself.
fn blame_failures(
    mut failures: Vec<(usize, usize, IndexError)>,
    n: usize,
) -> HashMap<usize, IndexError> {
    let mut dropped = HashMap::new();
    while !failures.is_empty() {
        let mut counts = vec![0usize; n];
        for &(i, j, _) in &failures {
            counts[i] += 1;
            counts[j] += 1;
        }
        let Some(worst) = (0..n).max_by_key(|&i| (counts[i], i)) else {
            break;
        };
        let (hit, rest): (Vec<_>, Vec<_>) = failures
            .into_iter()
            .partition(|&(i, j, _)| i == worst || j == worst);
        failures = rest;
        if let Some((_, _, error)) = hit.into_iter().next() {
            dropped.insert(worst, error);
        }
    }
    dropped
}

fn ensure_enough(actual: usize) -> Result<()> {
    if actual < config::MIN_CLUSTER_POINTS {
        return Err(IndexError::InsufficientData {
            required: config::MIN_CLUSTER_POINTS,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    fn points(coords: &[(f32, f32)]) -> Vec<Embedding<usize>> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Embedding::new(i, vec![x, y]))
            .collect()
    }

    fn euclidean() -> AgglomerativeClusterer {
        AgglomerativeClusterer::new(Metric::Euclidean)
    }

    fn sorted(mut partition: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        for c in &mut partition {
            c.sort_unstable();
        }
        partition.sort();
        partition
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let data = points(&[(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)]);
        let c = euclidean()
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let d = c.distances();
        for i in 0..3 {
            assert_eq!(d.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(d.get(i, j), d.get(j, i));
            }
        }
        assert!((d.get(0, 1) - 5.0).abs() < 1e-6);
        assert!((d.get(0, 2) - 10.0).abs() < 1e-6);
        assert_eq!(d.row(1).len(), 3);
    }

    #[test]
    fn snapshots_are_indexed_by_cluster_count() {
        let data = points(&[(0.0, 0.0), (0.0, 1.0), (5.0, 5.0), (9.0, 9.0)]);
        let c = euclidean()
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let given_k = c.clusters_given_k();
        assert_eq!(given_k.len(), 5);
        assert!(given_k[0].is_empty());
        for (k, partition) in given_k.iter().enumerate().skip(1) {
            assert_eq!(partition.len(), k);
            let mut all: Vec<usize> = partition.iter().flatten().copied().collect();
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3]);
        }
        assert_eq!(sorted(given_k[3].clone()), vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn dendrogram_has_n_minus_one_merges_with_growing_heights() {
        let data = points(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (10.0, 10.0), (10.0, 11.0)]);
        let c = euclidean()
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let dendrogram = c.dendrogram();
        assert_eq!(dendrogram.leaves(), 5);
        assert_eq!(dendrogram.merges().len(), 4);
        assert_eq!(dendrogram.root(), Some(8));
        assert_eq!(dendrogram.merges().last().unwrap().size, 5);
        assert!(dendrogram
            .merges()
            .windows(2)
            .all(|w| w[0].height <= w[1].height));
        assert_eq!(dendrogram.height(0), Some(0.0));
        assert_eq!(dendrogram.order(), c.order());
    }

    #[test]
    fn first_merge_joins_the_closest_pair() {
        let data = points(&[(0.0, 0.0), (7.0, 0.0), (7.5, 0.0)]);
        let c = euclidean()
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let first = c.dendrogram().merges()[0];
        assert_eq!((first.left, first.right), (1, 2));
        assert!((first.height - 0.5).abs() < 1e-6);
        // Merged cluster goes to the end; its members keep row-then-column order.
        assert_eq!(c.partition(2).unwrap(), &[vec![0], vec![1, 2]]);
    }

    #[test]
    fn linkages_differ_on_chained_data() {
        let a = [1.0, 2.0, 4.0];
        let matrix = {
            let mut m = DistanceMatrix::zeros(3);
            m.set(0, 1, a[0]);
            m.set(0, 2, a[1]);
            m.set(1, 2, a[2]);
            m
        };
        assert_eq!(SingleLinkage.distance(&[0], &[1, 2], &matrix), 1.0);
        assert_eq!(CompleteLinkage.distance(&[0], &[1, 2], &matrix), 2.0);
        assert_eq!(AverageLinkage.distance(&[0], &[1, 2], &matrix), 1.5);
    }

    #[test]
    fn positions_invert_the_root_order() {
        let data = points(&[(0.0, 0.0), (10.0, 0.0), (0.5, 0.0), (10.5, 0.0)]);
        let c = euclidean()
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        let order = c.order();
        let positions = c.positions();
        for (pos, &item) in order.iter().enumerate() {
            assert_eq!(positions[item], pos);
        }
    }

    #[test]
    fn closure_distances_are_supported() {
        let manhattan = |a: &[f32], b: &[f32]| -> f64 {
            a.iter().zip(b).map(|(x, y)| f64::from((x - y).abs())).sum()
        };
        let data = points(&[(0.0, 0.0), (1.0, 1.0), (5.0, 5.0)]);
        let c = AgglomerativeClusterer::new(manhattan)
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        assert!((c.distances().get(0, 1) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn assignments_reject_out_of_range_k() {
        let data = points(&[(0.0, 0.0), (1.0, 1.0)]);
        let c = euclidean()
            .cluster_data(data, &mut NoProgress, &CancelToken::new())
            .unwrap();
        assert!(c.assignments(0).is_err());
        assert!(c.assignments(3).is_err());
        assert_eq!(c.assignments(2).unwrap().len(), 2);
    }
}
