//! Tuning defaults for the index and clustering engine.
//!
//! These are compile-time constants; per-index overrides go through
//! `HnswParams` and the clusterer builder.

/// Default maximum number of neighbors per node and level.
///
/// Also drives the level distribution through `levelMult = 1 / ln(M)`.
pub const DEFAULT_M: usize = 16;

/// Default candidate breadth while linking a new node during construction.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default candidate breadth during search.
///
/// Higher values improve recall at the cost of latency.
pub const DEFAULT_EF_SEARCH: usize = 100;

/// Levels whose probability falls below this value are not part of the
/// precomputed level table.
pub const LEVEL_PROBABILITY_FLOOR: f64 = 1e-9;

/// Smallest input accepted by the agglomerative clusterer.
pub const MIN_CLUSTER_POINTS: usize = 2;
