//! simcheck: similarity search and clustering over document embeddings.
//!
//! Building blocks for semantic search and exploratory grouping of
//! `{id, vector}` pairs pulled from a document store:
//!
//! - `hnsw`: approximate nearest neighbor graph (HNSW) with metadata
//!   persistence in `persistence`
//! - `quantization`: scalar binary quantizer, a cheap fallback index
//! - `clustering`: agglomerative hierarchical clustering with an automatic
//!   cluster-count heuristic and a background worker
//! - [`topk`]: bounded, score-sorted result accumulator shared by the indexes
//!
//! # Scope
//!
//! Embedding generation, document storage and 2-D projection of cluster
//! labels are the caller's business. Indexes are approximate by design and
//! hold no locks: insertion is sequential (`&mut self`), search is read-only
//! (`&self`).
//!
//! # Ids
//!
//! Every index is generic over the external id type `K` (see
//! [`embedding::DocId`]). Internally nodes are addressed by dense `u32`
//! handles; ids only appear at the API boundary.
//!
//! # Logging
//!
//! The crate emits `tracing` events (`debug` for completed builds,
//! `warn` for skipped items and failed progress callbacks) and never installs
//! a subscriber.

pub mod benchmark;
pub mod config;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod progress;
pub mod simd;
pub mod topk;

#[cfg(feature = "hnsw")]
pub mod hnsw;

#[cfg(feature = "hnsw")]
pub mod persistence;

#[cfg(feature = "sbq")]
pub mod quantization;

#[cfg(feature = "clustering")]
pub mod clustering;

#[cfg(all(feature = "hnsw", feature = "sbq"))]
pub mod search;

// Re-exports
pub use distance::Metric;
pub use embedding::{DocId, Embedding, SkippedItem};
pub use error::{IndexError, Result};
pub use topk::{BoundedTopK, Scored};

#[cfg(feature = "hnsw")]
pub use hnsw::{HnswIndex, HnswParams};

#[cfg(feature = "sbq")]
pub use quantization::{SbqIndex, ScalarQuantizer};

#[cfg(feature = "clustering")]
pub use clustering::AgglomerativeClusterer;

#[cfg(all(feature = "hnsw", feature = "sbq"))]
pub use search::VectorSearch;
