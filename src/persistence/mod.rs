//! Graph metadata persistence.
//!
//! An index is stored next to the document store as a small JSON record:
//!
//! ```text
//! { M, efConstruction, levelMax, entryPointId,
//!   perNode: { id -> { neighbors: [[id, ...] per level] } } }
//! ```
//!
//! Vectors are not part of the record. They live in the document store and
//! are re-attached by id on [`HnswIndex::restore`](crate::hnsw::HnswIndex::restore).

pub mod hnsw;

pub use hnsw::{HnswMetadata, NodeMetadata};
