//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! # Algorithm
//!
//! Every inserted node draws a level from a geometric distribution
//! (`levelMult = 1 / ln(M)`) and keeps one neighbor list per level
//! `0..=level`, each capped at `M` entries.
//!
//! - **Insertion**: greedy descent from the entry point, level by level, always
//!   moving to the neighbor most similar to the new vector. The best node seen
//!   becomes the anchor that the new node is linked to on every shared level.
//! - **Search**: best-first expansion from the entry point over the neighbor
//!   lists of *all* levels, keeping an `efSearch`-sized [`BoundedTopK`] of the
//!   best candidates and a visited set so no node is expanded twice.
//!
//! Nodes live in a dense arena addressed by `u32` handles; external ids are
//! mapped to handles once at insertion. Vectors are stored contiguously.
//!
//! # Construction knobs
//!
//! - [`LinkStrategy::Closest`] links only the greedy anchor (the minimal
//!   scheme). [`LinkStrategy::Beam`] additionally runs an `efConstruction`-wide
//!   search around the anchor and links the `M` most similar nodes.
//! - [`EvictionPolicy::MostRecent`] drops the most recently appended neighbor
//!   when a list overflows; [`EvictionPolicy::LeastSimilar`] drops the neighbor
//!   least similar to the list owner (canonical HNSW pruning).
//!
//! Level sampling is randomized, so two builds over the same data differ
//! unless [`HnswParams::seed`] is set and insertion order is identical.
//!
//! # Concurrency
//!
//! Insertion takes `&mut self` and is strictly sequential. Search takes
//! `&self`; any number of readers may share a built index as long as no
//! insertion is in flight.
//!
//! # Usage
//!
//! ```rust
//! use simcheck::hnsw::{HnswIndex, HnswParams};
//!
//! # fn main() -> simcheck::Result<()> {
//! let mut index: HnswIndex<u32> = HnswIndex::new(HnswParams::default())?;
//! index.add_point(0, &[1.0, 0.0, 0.0])?;
//! index.add_point(1, &[0.0, 1.0, 0.0])?;
//! index.add_point(2, &[0.9, 0.1, 0.0])?;
//!
//! let hits = index.search_knn(&[1.0, 0.05, 0.0], 2)?;
//! assert_eq!(hits[0].id, 0);
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - Malkov & Yashunin (2016): "Efficient and robust approximate nearest neighbor search
//!   using Hierarchical Navigable Small World graphs"
//!
//! [`BoundedTopK`]: crate::topk::BoundedTopK

pub(crate) mod construction;
pub(crate) mod graph;
pub(crate) mod search;

pub use graph::{BuildReport, EvictionPolicy, HnswIndex, HnswParams, IndexState, LinkStrategy};
