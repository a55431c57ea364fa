//! HNSW metadata export and restore.

use crate::distance::Metric;
use crate::embedding::DocId;
use crate::error::{IndexError, Result};
use crate::hnsw::graph::{HnswIndex, HnswParams, LevelTable, NeighborList, Node};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::io::{Read, Write};

/// Persisted neighbor lists of one node, one list per level `0..=level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "K: Serialize", deserialize = "K: Deserialize<'de>"))]
pub struct NodeMetadata<K> {
    pub neighbors: Vec<Vec<K>>,
    /// Node whose level-0 link to this one is never evicted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<K>,
}

/// Persisted graph structure of an [`HnswIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(
    serialize = "K: Serialize + Eq + Hash",
    deserialize = "K: Deserialize<'de> + Eq + Hash"
))]
pub struct HnswMetadata<K> {
    #[serde(rename = "M")]
    pub m: usize,
    pub ef_construction: usize,
    pub level_max: usize,
    pub entry_point_id: Option<K>,
    /// Absent in records written before the metric was stored; cosine then.
    #[serde(default)]
    pub metric: Metric,
    pub per_node: HashMap<K, NodeMetadata<K>>,
}

impl<K> HnswMetadata<K>
where
    K: Serialize + DeserializeOwned + Eq + Hash,
{
    /// Write the record as JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a record written by [`write_json`](Self::write_json).
    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl<K: DocId> HnswIndex<K> {
    /// Export the graph structure.
    pub fn to_metadata(&self) -> HnswMetadata<K> {
        let per_node = self
            .nodes
            .iter()
            .map(|node| (node.id.clone(), self.export_node(node)))
            .collect();
        HnswMetadata {
            m: self.params.m,
            ef_construction: self.params.ef_construction,
            level_max: self.level_max,
            entry_point_id: self.entry_point_id().cloned(),
            metric: self.params.metric,
            per_node,
        }
    }

    /// Neighbor lists of a single node, for stores that write one record per
    /// vector.
    pub fn node_metadata(&self, id: &K) -> Option<NodeMetadata<K>> {
        let &h = self.handles.get(id)?;
        Some(self.export_node(&self.nodes[h as usize]))
    }

    fn export_node(&self, node: &Node<K>) -> NodeMetadata<K> {
        NodeMetadata {
            neighbors: node
                .neighbors
                .iter()
                .map(|list| {
                    list.iter()
                        .map(|&n| self.nodes[n as usize].id.clone())
                        .collect()
                })
                .collect(),
            anchor: node.anchor.map(|a| self.nodes[a as usize].id.clone()),
        }
    }

    /// Rebuild an index from persisted metadata.
    ///
    /// `M`, `efConstruction` and the metric come from `metadata`; the other
    /// fields of `params` (search breadth, policies, seed for later
    /// insertions) are kept. `lookup` supplies each node's vector by id.
    ///
    /// Fails with `UnknownId` if `lookup` has no vector for a node or a
    /// neighbor list names an id without a record, and with `Metadata` if the
    /// record is structurally inconsistent.
    pub fn restore<F>(metadata: HnswMetadata<K>, params: HnswParams, mut lookup: F) -> Result<Self>
    where
        F: FnMut(&K) -> Option<Vec<f32>>,
    {
        let params = HnswParams {
            m: metadata.m,
            ef_construction: metadata.ef_construction,
            metric: metadata.metric,
            ..params
        };
        let mut index = Self::new(params)?;
        if metadata.per_node.is_empty() {
            if metadata.entry_point_id.is_some() {
                return Err(IndexError::Metadata(
                    "entry point set on a record without nodes".to_string(),
                ));
            }
            return Ok(index);
        }

        // First pass: assign handles and attach vectors.
        let mut records = Vec::with_capacity(metadata.per_node.len());
        for (id, node) in metadata.per_node {
            if node.neighbors.is_empty() {
                return Err(IndexError::Metadata(format!(
                    "node {id:?} has no level-0 neighbor list"
                )));
            }
            let vector = lookup(&id).ok_or_else(|| IndexError::UnknownId(format!("{id:?}")))?;
            index.validate_vector(&vector)?;
            index.dimension.get_or_insert(vector.len());

            let handle = u32::try_from(index.nodes.len())
                .map_err(|_| IndexError::InvalidParameter("index is full".to_string()))?;
            let level = node.neighbors.len() - 1;
            index.vectors.extend_from_slice(&vector);
            index.nodes.push(Node::new(id.clone(), level));
            index.handles.insert(id, handle);
            index.level_max = index.level_max.max(level);
            records.push((node.neighbors, node.anchor));
        }

        // Second pass: resolve neighbor ids to handles.
        for (handle, (levels, anchor)) in records.into_iter().enumerate() {
            if let Some(anchor) = anchor {
                let &a = index
                    .handles
                    .get(&anchor)
                    .ok_or_else(|| IndexError::UnknownId(format!("{anchor:?}")))?;
                index.nodes[handle].anchor = Some(a);
                index.nodes[a as usize].anchored += 1;
            }
            for (layer, ids) in levels.into_iter().enumerate() {
                if ids.len() > index.params.m {
                    return Err(IndexError::Metadata(format!(
                        "neighbor list longer than M = {}",
                        index.params.m
                    )));
                }
                let mut list = NeighborList::with_capacity(ids.len());
                for id in ids {
                    let &h = index
                        .handles
                        .get(&id)
                        .ok_or_else(|| IndexError::UnknownId(format!("{id:?}")))?;
                    if index.nodes[h as usize].level < layer {
                        return Err(IndexError::Metadata(format!(
                            "neighbor {id:?} linked above its level"
                        )));
                    }
                    list.push(h);
                }
                index.nodes[handle].neighbors[layer] = list;
            }
        }

        if metadata.level_max != index.level_max {
            tracing::warn!(
                recorded = metadata.level_max,
                actual = index.level_max,
                "levelMax disagrees with node levels; using node levels"
            );
        }

        let entry = metadata
            .entry_point_id
            .ok_or_else(|| IndexError::Metadata("missing entry point".to_string()))?;
        let &entry = index
            .handles
            .get(&entry)
            .ok_or_else(|| IndexError::UnknownId(format!("{entry:?}")))?;
        index.entry_point = Some(entry);
        index.levels = LevelTable::new(index.params.m);
        index.built = true;

        tracing::debug!(nodes = index.nodes.len(), level_max = index.level_max, "HNSW index restored");
        Ok(index)
    }
}
