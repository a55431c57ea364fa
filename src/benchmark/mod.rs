//! Evaluation utilities for ANN quality.
//!
//! Brute-force ground truth and recall metrics, shared by the integration
//! tests and the criterion benches.

pub mod metrics;

pub use metrics::{exact_top_k, mean_recall, precision_at_k, recall_at_k};
