//! Agglomerative hierarchical clustering with automatic cluster-count selection.
//!
//! # Pipeline
//!
//! 1. Validate items and compute the full pairwise [`DistanceMatrix`].
//! 2. Start from singletons and repeatedly merge the two clusters with the
//!    smallest [`Linkage`] distance, recording each merge in a flat
//!    [`Dendrogram`] and a partition snapshot per cluster count.
//! 3. Pick a cluster count from the within-cluster variance curve with a
//!    [`ClusterCountSelector`] and label every item with its cluster number
//!    and its position in the dendrogram's leaf order.
//!
//! Long runs can be moved off the calling thread with [`ClusterWorker`].
//!
//! ```rust
//! use simcheck::clustering::AgglomerativeClusterer;
//! use simcheck::progress::{CancelToken, NoProgress};
//! use simcheck::{Embedding, Metric};
//!
//! # fn main() -> simcheck::Result<()> {
//! let items = vec![
//!     Embedding::new("a", vec![0.0, 0.0]),
//!     Embedding::new("b", vec![0.0, 1.0]),
//!     Embedding::new("c", vec![1.0, 0.0]),
//!     Embedding::new("d", vec![10.0, 10.0]),
//!     Embedding::new("e", vec![10.0, 11.0]),
//! ];
//! let outcome = AgglomerativeClusterer::new(Metric::Euclidean)
//!     .cluster_and_assign(items, &mut NoProgress, &CancelToken::new())?;
//!
//! assert_eq!(outcome.k, 2);
//! let a = outcome.assignments["a"].cluster_number;
//! let d = outcome.assignments["d"].cluster_number;
//! assert_ne!(a, d);
//! assert_eq!(outcome.assignments["e"].cluster_number, d);
//! # Ok(())
//! # }
//! ```

pub mod agglomerative;
pub mod selection;
pub mod worker;

pub use agglomerative::{
    AgglomerativeClusterer, Assignment, AverageLinkage, ClusterOutcome, Clustering,
    CompleteLinkage, Dendrogram, DistanceMatrix, Linkage, Merge, PairwiseDistance, SingleLinkage,
};
pub use selection::{ClusterCountSelector, ElbowPoint, VariancePeak};
pub use worker::{ChannelSink, ClusterJobHandle, ClusterWorker, WorkerEvent};
