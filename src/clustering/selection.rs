//! Cluster-count heuristics.
//!
//! Both selectors look at the within-cluster variance curve: for each cluster
//! count `k`, the sum over clusters of the mean pairwise distance between
//! members. Neither is a proven criterion; they are kept behind
//! [`ClusterCountSelector`] so other strategies can be swapped in.

use crate::clustering::agglomerative::DistanceMatrix;

/// Mean pairwise distance among `members`; `0.0` for singletons.
pub fn cluster_variance(members: &[usize], distances: &DistanceMatrix) -> f64 {
    if members.len() <= 1 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, &i) in members.iter().enumerate() {
        for &j in &members[a + 1..] {
            sum += distances.get(i, j);
            count += 1;
        }
    }
    sum / count as f64
}

/// Sum of [`cluster_variance`] over a partition.
pub fn within_cluster_variance(partition: &[Vec<usize>], distances: &DistanceMatrix) -> f64 {
    partition
        .iter()
        .map(|members| cluster_variance(members, distances))
        .sum()
}

/// Variance for `k = 1..n`, where `n = clusters_given_k.len() - 1`.
///
/// Element `i` of the result holds `k = i + 1`. The all-singletons partition
/// (`k = n`, variance 0) is not included.
pub fn variance_curve(clusters_given_k: &[Vec<Vec<usize>>], distances: &DistanceMatrix) -> Vec<f64> {
    let n = clusters_given_k.len().saturating_sub(1);
    (1..n)
        .map(|k| within_cluster_variance(&clusters_given_k[k], distances))
        .collect()
}

/// Picks a cluster count from a variance curve (`curve[i]` is `k = i + 1`).
///
/// Implementations return a count of at least 1.
pub trait ClusterCountSelector: Send + Sync {
    fn select(&self, curve: &[f64]) -> usize;
}

/// One less than the cluster count with the highest variance.
///
/// When the peak is at `k = 1` (a single cluster spread wider than any split
/// of it) there is no count before it; [`ElbowPoint`] decides instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariancePeak;

impl ClusterCountSelector for VariancePeak {
    fn select(&self, curve: &[f64]) -> usize {
        let mut peak = 0;
        for (i, &v) in curve.iter().enumerate() {
            if v > curve[peak] {
                peak = i;
            }
        }
        // `peak` is an index; the cluster count is `peak + 1`.
        if peak >= 1 {
            peak
        } else {
            ElbowPoint.select(curve)
        }
    }
}

/// Point of the curve farthest from the line joining its first and last
/// points.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElbowPoint;

impl ClusterCountSelector for ElbowPoint {
    fn select(&self, curve: &[f64]) -> usize {
        let (Some(&first), Some(&last)) = (curve.first(), curve.last()) else {
            return 1;
        };
        let (x1, y1) = (1.0, first);
        let (x2, y2) = (curve.len() as f64, last);
        let norm = (x2 - x1).hypot(y2 - y1);
        if norm == 0.0 {
            return 1;
        }

        let mut elbow = 1;
        let mut max_distance = 0.0;
        for (i, &y) in curve.iter().enumerate().skip(1) {
            let x = (i + 1) as f64;
            let distance = ((y2 - y1) * x - (x2 - x1) * y + x2 * y1 - y2 * x1).abs() / norm;
            if distance > max_distance {
                max_distance = distance;
                elbow = i + 1;
            }
        }
        elbow
    }
}
