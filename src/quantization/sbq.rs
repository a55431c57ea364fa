use crate::distance::check_finite;
use crate::embedding::{DocId, Embedding, SkippedItem};
use crate::error::{IndexError, Result};
use crate::topk::{BoundedTopK, Scored};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const CODE_HIGH: u8 = 0b11;
const CODE_LOW: u8 = 0b01;
const CODE_ZERO: u8 = 0b00;

/// Per-dimension statistics of a training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarQuantizer {
    means: Vec<f32>,
    stdevs: Vec<f32>,
}

impl ScalarQuantizer {
    /// Compute per-dimension mean and population standard deviation.
    ///
    /// Accumulates in `f64` (Welford). Fails on an empty set, on vectors of
    /// differing length, and on non-finite values.
    pub fn train<'a, I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut count = 0usize;
        let mut mean: Vec<f64> = Vec::new();
        let mut m2: Vec<f64> = Vec::new();

        for v in vectors {
            check_finite(v)?;
            if count == 0 {
                mean = vec![0.0; v.len()];
                m2 = vec![0.0; v.len()];
            } else if v.len() != mean.len() {
                return Err(IndexError::dimension(mean.len(), v.len()));
            }
            count += 1;
            let n = count as f64;
            for ((mu, acc), &x) in mean.iter_mut().zip(m2.iter_mut()).zip(v) {
                let x = f64::from(x);
                let delta = x - *mu;
                *mu += delta / n;
                *acc += delta * (x - *mu);
            }
        }

        if count == 0 {
            return Err(IndexError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let n = count as f64;
        Ok(Self {
            means: mean.iter().map(|&m| m as f32).collect(),
            stdevs: m2.iter().map(|&s| (s / n).sqrt() as f32).collect(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f32] {
        &self.means
    }

    pub fn stdevs(&self) -> &[f32] {
        &self.stdevs
    }

    /// One 2-bit code per dimension (unpacked, one code per byte).
    pub fn quantize(&self, vector: &[f32]) -> Result<Vec<u8>> {
        check_finite(vector)?;
        if vector.len() != self.dimension() {
            return Err(IndexError::dimension(self.dimension(), vector.len()));
        }
        Ok(vector
            .iter()
            .zip(self.means.iter().zip(&self.stdevs))
            .map(|(&x, (&mean, &stdev))| code(x, mean, stdev))
            .collect())
    }

    /// Quantize and pack.
    pub fn encode(&self, vector: &[f32]) -> Result<Vec<u8>> {
        Ok(pack(&self.quantize(vector)?))
    }
}

#[inline]
fn code(x: f32, mean: f32, stdev: f32) -> u8 {
    // A constant dimension degenerates to a sign test against the mean.
    if stdev == 0.0 {
        return if x > mean { CODE_HIGH } else { CODE_ZERO };
    }
    let z = (x - mean) / stdev;
    if z > 1.0 {
        CODE_HIGH
    } else if z > 0.0 {
        CODE_LOW
    } else {
        CODE_ZERO
    }
}

/// Pack 2-bit codes four per byte, first code in the top bits.
///
/// Only the low two bits of each code are used. The last byte is zero-padded.
pub fn pack(codes: &[u8]) -> Vec<u8> {
    codes
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &c)| byte | ((c & 0b11) << (6 - 2 * i)))
        })
        .collect()
}

/// Inverse of [`pack`] for a `dimension`-long code sequence.
pub fn unpack(packed: &[u8], dimension: usize) -> Result<Vec<u8>> {
    let needed = dimension.div_ceil(4);
    if packed.len() < needed {
        return Err(IndexError::InvalidParameter(format!(
            "{dimension} codes need {needed} bytes, got {}",
            packed.len()
        )));
    }
    Ok((0..dimension)
        .map(|i| (packed[i / 4] >> (6 - 2 * (i % 4))) & 0b11)
        .collect())
}

/// Number of differing bits between two packed buffers.
///
/// Bytes present in only one buffer are compared against zero.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let common: u32 = short
        .iter()
        .zip(long)
        .map(|(x, y)| (x ^ y).count_ones())
        .sum();
    let tail: u32 = long[short.len()..].iter().map(|x| x.count_ones()).sum();
    common + tail
}

/// A packed code buffer tagged with its id and the statistics that produced it.
#[derive(Debug, Clone)]
pub struct QuantizedVector<K> {
    id: K,
    packed: Vec<u8>,
    quantizer: Arc<ScalarQuantizer>,
}

impl<K> QuantizedVector<K> {
    pub fn new(id: K, vector: &[f32], quantizer: Arc<ScalarQuantizer>) -> Result<Self> {
        let packed = quantizer.encode(vector)?;
        Ok(Self {
            id,
            packed,
            quantizer,
        })
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn packed(&self) -> &[u8] {
        &self.packed
    }

    pub fn quantizer(&self) -> &Arc<ScalarQuantizer> {
        &self.quantizer
    }

    /// Unpacked codes.
    pub fn codes(&self) -> Vec<u8> {
        (0..self.quantizer.dimension())
            .map(|i| (self.packed[i / 4] >> (6 - 2 * (i % 4))) & 0b11)
            .collect()
    }

    pub fn distance(&self, other: &QuantizedVector<K>) -> u32 {
        hamming_distance(&self.packed, &other.packed)
    }
}

/// Linear-scan index over quantized vectors.
#[derive(Debug, Clone)]
pub struct SbqIndex<K> {
    quantizer: Arc<ScalarQuantizer>,
    entries: Vec<QuantizedVector<K>>,
    ids: HashSet<K>,
}

impl<K: DocId> SbqIndex<K> {
    /// Train on `data` and quantize every item.
    ///
    /// Items that are empty, non-finite, repeat an earlier id, or whose
    /// dimension differs from the first valid item are skipped and returned
    /// alongside the index. Fails with `InsufficientData` if nothing valid
    /// remains.
    pub fn build<I>(data: I) -> Result<(Self, Vec<SkippedItem<K>>)>
    where
        I: IntoIterator<Item = Embedding<K>>,
    {
        let mut accepted: Vec<Embedding<K>> = Vec::new();
        let mut ids = HashSet::new();
        let mut skipped = Vec::new();
        for item in data {
            let checked = check_finite(&item.vector)
                .and_then(|()| match accepted.first() {
                    Some(first) if first.dimension() != item.dimension() => {
                        Err(IndexError::dimension(first.dimension(), item.dimension()))
                    }
                    _ => Ok(()),
                })
                .and_then(|()| {
                    if ids.contains(&item.id) {
                        Err(IndexError::DuplicateId(format!("{:?}", item.id)))
                    } else {
                        Ok(())
                    }
                });
            match checked {
                Ok(()) => {
                    ids.insert(item.id.clone());
                    accepted.push(item);
                }
                Err(error) => {
                    tracing::warn!(id = ?item.id, %error, "skipping item during quantizer training");
                    skipped.push(SkippedItem { id: item.id, error });
                }
            }
        }

        let quantizer = Arc::new(ScalarQuantizer::train(
            accepted.iter().map(|e| e.vector.as_slice()),
        )?);
        let entries = accepted
            .into_iter()
            .map(|e| QuantizedVector::new(e.id, &e.vector, Arc::clone(&quantizer)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            entries = entries.len(),
            skipped = skipped.len(),
            dimension = quantizer.dimension(),
            "SBQ index built"
        );
        Ok((
            Self {
                quantizer,
                entries,
                ids,
            },
            skipped,
        ))
    }

    /// Quantize and append one vector with the existing statistics.
    ///
    /// The statistics are not updated; rebuild when the dataset changes
    /// materially. Fails with `DuplicateId` if `id` is already present.
    pub fn insert(&mut self, id: K, vector: &[f32]) -> Result<()> {
        if self.ids.contains(&id) {
            return Err(IndexError::DuplicateId(format!("{id:?}")));
        }
        let entry = QuantizedVector::new(id.clone(), vector, Arc::clone(&self.quantizer))?;
        self.entries.push(entry);
        self.ids.insert(id);
        Ok(())
    }

    /// The `k` entries with the smallest Hamming distance to `query`, scored
    /// by negated distance (best first).
    pub fn knn_search(&self, query: &[f32], k: usize) -> Result<Vec<Scored<K>>> {
        let code = self.quantizer.encode(query)?;
        let mut top = BoundedTopK::new(k);
        for entry in &self.entries {
            let distance = hamming_distance(&code, &entry.packed);
            top.add(entry.id.clone(), -(distance as f32));
        }
        Ok(top.into_vec())
    }

    /// Ids of [`knn_search`](Self::knn_search).
    pub fn knn_ids(&self, query: &[f32], k: usize) -> Result<Vec<K>> {
        Ok(self
            .knn_search(query, k)?
            .into_iter()
            .map(|hit| hit.id)
            .collect())
    }

    pub fn quantizer(&self) -> &Arc<ScalarQuantizer> {
        &self.quantizer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuantizedVector<K>> {
        self.entries.iter()
    }
}
