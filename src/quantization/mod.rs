//! Scalar binary quantization (SBQ).
//!
//! A coarse, training-based compression used as a fallback index when no
//! HNSW graph exists for a dataset.
//!
//! # Encoding
//!
//! Per dimension, a value is turned into a z-score against the training set's
//! mean and population standard deviation and bucketed into a 2-bit code:
//!
//! | z-score | code |
//! |---------|------|
//! | `z > 1` | `0b11` |
//! | `0 < z <= 1` | `0b01` |
//! | `z <= 0` | `0b00` |
//!
//! Code `0b10` is never produced. The scheme is three buckets stored in two
//! bits, not a uniform 2-bit quantizer; every stored buffer and query uses the
//! same mapping, so Hamming distances stay comparable.
//!
//! Codes are packed four per byte, most significant pair first.
//!
//! # Distance
//!
//! Dissimilarity is `popcount(a XOR b)` over the packed buffers. Search is a
//! linear scan ranking by negated distance through a
//! [`BoundedTopK`](crate::topk::BoundedTopK).
//!
//! ```rust
//! use simcheck::quantization::{pack, unpack, ScalarQuantizer};
//!
//! # fn main() -> simcheck::Result<()> {
//! let data = [vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]];
//! let sq = ScalarQuantizer::train(data.iter().map(Vec::as_slice))?;
//! let codes = sq.quantize(&[5.0, 3.0])?;
//! assert_eq!(codes, vec![0b11, 0b00]);
//! assert_eq!(unpack(&pack(&codes), 2)?, codes);
//! # Ok(())
//! # }
//! ```

mod sbq;

pub use sbq::{hamming_distance, pack, unpack, QuantizedVector, SbqIndex, ScalarQuantizer};
