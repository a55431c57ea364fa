//! Evaluation metrics for ANN quality.
//!
//! - Recall@k: fraction of true neighbors found
//! - Precision@k: fraction of retrieved items that are true neighbors

use crate::distance::Metric;
use crate::embedding::{DocId, Embedding};
use crate::error::Result;
use crate::topk::{BoundedTopK, Scored};
use std::collections::HashSet;

/// Compute recall@k: fraction of true k-nearest neighbors that were retrieved.
///
/// recall@k = |retrieved ∩ ground_truth| / min(k, |ground_truth|)
///
/// # Arguments
///
/// * `ground_truth` - True nearest neighbor IDs, best first
/// * `retrieved` - Retrieved neighbor IDs (may be more or fewer than k)
/// * `k` - Number of neighbors we're evaluating
///
/// # Returns
///
/// Recall value in [0.0, 1.0]
pub fn recall_at_k<K: DocId>(ground_truth: &[K], retrieved: &[K], k: usize) -> f32 {
    let denominator = k.min(ground_truth.len());
    if denominator == 0 {
        return 0.0;
    }

    let gt_set: HashSet<&K> = ground_truth.iter().take(k).collect();
    let retrieved_set: HashSet<&K> = retrieved.iter().take(k).collect();

    let intersection = gt_set.intersection(&retrieved_set).count();
    intersection as f32 / denominator as f32
}

/// Compute precision@k: fraction of retrieved items that are true neighbors.
///
/// precision@k = |retrieved ∩ ground_truth| / |retrieved|
pub fn precision_at_k<K: DocId>(ground_truth: &[K], retrieved: &[K], k: usize) -> f32 {
    let retrieved_k = &retrieved[..k.min(retrieved.len())];
    if retrieved_k.is_empty() {
        return 0.0;
    }

    let gt_set: HashSet<&K> = ground_truth.iter().take(k).collect();
    let hits = retrieved_k.iter().filter(|id| gt_set.contains(id)).count();
    hits as f32 / retrieved_k.len() as f32
}

/// Compute mean recall across multiple queries.
pub fn mean_recall<K: DocId>(ground_truths: &[Vec<K>], retrievals: &[Vec<K>], k: usize) -> f32 {
    if ground_truths.is_empty() {
        return 0.0;
    }

    let total: f32 = ground_truths
        .iter()
        .zip(retrievals.iter())
        .map(|(gt, ret)| recall_at_k(gt, ret, k))
        .sum();

    total / ground_truths.len() as f32
}

/// Exact k nearest neighbors of `query` by linear scan, most similar first.
pub fn exact_top_k<K: DocId>(
    data: &[Embedding<K>],
    query: &[f32],
    k: usize,
    metric: Metric,
) -> Result<Vec<Scored<K>>> {
    let mut top = BoundedTopK::new(k);
    for item in data {
        top.add(item.id.clone(), metric.similarity(query, &item.vector)?);
    }
    Ok(top.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_at_k() {
        let gt = vec![1, 2, 3, 4, 5];
        let retrieved = vec![1, 2, 3, 6, 7];
        assert!((recall_at_k(&gt, &retrieved, 5) - 0.6).abs() < 0.001);

        // Perfect recall
        let perfect = vec![5, 4, 3, 2, 1];
        assert!((recall_at_k(&gt, &perfect, 5) - 1.0).abs() < 0.001);

        // Zero recall
        let miss = vec![6, 7, 8, 9, 10];
        assert_eq!(recall_at_k(&gt, &miss, 5), 0.0);
    }

    #[test]
    fn recall_is_relative_to_available_ground_truth() {
        let gt = vec!["a", "b"];
        assert_eq!(recall_at_k(&gt, &["b", "a"], 10), 1.0);
        assert_eq!(recall_at_k::<&str>(&[], &["a"], 10), 0.0);
    }

    #[test]
    fn test_precision_at_k() {
        let gt = vec![1, 2, 3, 4, 5];
        let retrieved = vec![1, 2, 6, 7, 8];
        assert!((precision_at_k(&gt, &retrieved, 5) - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_mean_recall() {
        let gts = vec![vec![1, 2], vec![3, 4]];
        let rets = vec![vec![1, 2], vec![3, 9]];
        assert!((mean_recall(&gts, &rets, 2) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn exact_top_k_orders_by_similarity() {
        let data = vec![
            Embedding::new(0u32, vec![1.0, 0.0]),
            Embedding::new(1, vec![0.0, 1.0]),
            Embedding::new(2, vec![0.7, 0.7]),
        ];
        let hits = exact_top_k(&data, &[1.0, 0.1], 2, Metric::Cosine).unwrap();
        let ids: Vec<u32> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(exact_top_k(&data, &[1.0], 2, Metric::Cosine).is_err());
    }
}
