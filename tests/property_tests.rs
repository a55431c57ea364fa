//! Property-based tests for simcheck.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Distance functions are symmetric and bounded
//! - HNSW results are distinct, bounded by `min(k, n)` and sorted
//! - BoundedTopK matches a full sort
//! - Clustering is deterministic and its partitions cover every item

use proptest::prelude::*;
use simcheck::distance::{cosine_distance, cosine_similarity, euclidean_distance};
use simcheck::BoundedTopK;

prop_compose! {
    fn arb_vector(dim: usize)(vec in prop::collection::vec(-10.0f32..10.0, dim)) -> Vec<f32> {
        vec
    }
}

prop_compose! {
    fn arb_dataset(max_n: usize, dim: usize)
        (vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, dim), 1..max_n))
        -> Vec<Vec<f32>>
    {
        vectors
    }
}

mod distance_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn euclidean_is_symmetric_and_non_negative(a in arb_vector(32), b in arb_vector(32)) {
            let d_ab = euclidean_distance(&a, &b).unwrap();
            let d_ba = euclidean_distance(&b, &a).unwrap();
            prop_assert!(d_ab >= 0.0);
            prop_assert!((d_ab - d_ba).abs() < 1e-4, "{} vs {}", d_ab, d_ba);
        }

        #[test]
        fn cosine_similarity_is_bounded(a in arb_vector(16), b in arb_vector(16)) {
            let s = cosine_similarity(&a, &b).unwrap();
            prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&s), "similarity {}", s);
            let d = cosine_distance(&a, &b).unwrap();
            prop_assert!((d - (1.0 - s)).abs() < 1e-5);
        }

        #[test]
        fn mismatched_lengths_are_rejected(a in arb_vector(8), b in arb_vector(9)) {
            prop_assert!(euclidean_distance(&a, &b).is_err());
            prop_assert!(cosine_similarity(&a, &b).is_err());
        }
    }
}

mod topk_props {
    use super::*;

    proptest! {
        #[test]
        fn keeps_the_best_scores_in_order(
            scores in prop::collection::vec(-100.0f32..100.0, 0..200),
            k in 1usize..20,
        ) {
            let mut topk = BoundedTopK::new(k);
            for (i, &s) in scores.iter().enumerate() {
                topk.add(i, s);
            }

            let mut expected = scores.clone();
            expected.sort_by(|a, b| b.total_cmp(a));
            expected.truncate(k);

            let kept: Vec<f32> = topk.top_k().iter().map(|s| s.score).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}

#[cfg(feature = "hnsw")]
mod hnsw_props {
    use super::*;
    use simcheck::hnsw::{HnswIndex, HnswParams};
    use simcheck::progress::NoProgress;
    use simcheck::Embedding;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn results_are_distinct_sorted_and_bounded(
            data in arb_dataset(60, 8),
            query in prop::collection::vec(-1.0f32..1.0, 8),
            k in 1usize..40,
            seed in any::<u64>(),
        ) {
            let n = data.len();
            let mut index = HnswIndex::new(HnswParams { seed: Some(seed), ..Default::default() }).unwrap();
            index.build_index(
                data.into_iter().enumerate().map(|(i, v)| Embedding::new(i, v)),
                &mut NoProgress,
            );

            let hits = index.search_knn(&query, k).unwrap();
            prop_assert!(hits.len() <= k.min(n));
            let ids: HashSet<usize> = hits.iter().map(|h| h.id).collect();
            prop_assert_eq!(ids.len(), hits.len());
            prop_assert!(ids.iter().all(|&id| id < n));
            prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}

#[cfg(feature = "clustering")]
mod clustering_props {
    use super::*;
    use simcheck::clustering::AgglomerativeClusterer;
    use simcheck::progress::{CancelToken, NoProgress};
    use simcheck::{Embedding, Metric};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn clustering_is_deterministic_and_covering(data in arb_dataset(25, 3)) {
            prop_assume!(data.len() >= 2);
            let items: Vec<Embedding<usize>> = data
                .into_iter()
                .enumerate()
                .map(|(i, v)| Embedding::new(i, v))
                .collect();
            let n = items.len();
            let clusterer = AgglomerativeClusterer::new(Metric::Euclidean);

            let a = clusterer.cluster_data(items.clone(), &mut NoProgress, &CancelToken::new()).unwrap();
            let b = clusterer.cluster_data(items, &mut NoProgress, &CancelToken::new()).unwrap();
            prop_assert_eq!(a.dendrogram(), b.dendrogram());

            for k in 1..=n {
                let partition = a.partition(k).unwrap();
                prop_assert_eq!(partition.len(), k);
                let mut members: Vec<usize> = partition.iter().flatten().copied().collect();
                members.sort_unstable();
                prop_assert_eq!(members, (0..n).collect::<Vec<_>>());
            }

            let selected = clusterer.select_optimal_clusters(&a);
            prop_assert!((1..=n).contains(&selected));
        }
    }
}
