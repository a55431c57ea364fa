//! HNSW insertion: level sampling, greedy descent and linking.

use crate::embedding::DocId;
use crate::error::{IndexError, Result};
use crate::hnsw::graph::{EvictionPolicy, HnswIndex, LinkStrategy, NeighborList, Node};
use crate::topk::Scored;
use rand::Rng;

impl<K: DocId> HnswIndex<K> {
    /// Insert one vector.
    ///
    /// Fails with `DimensionMismatch` if `vector` does not match the index
    /// dimension, `InvalidVector` for empty or non-finite input, and
    /// `DuplicateId` if `id` is already present. A failed call leaves the
    /// index untouched.
    pub fn add_point(&mut self, id: K, vector: &[f32]) -> Result<()> {
        self.validate_vector(vector)?;
        if self.handles.contains_key(&id) {
            return Err(IndexError::DuplicateId(format!("{id:?}")));
        }
        let handle = u32::try_from(self.nodes.len())
            .map_err(|_| IndexError::InvalidParameter("index is full".to_string()))?;

        let level = self.levels.sample(self.rng.random::<f64>());
        self.dimension.get_or_insert(vector.len());
        self.vectors.extend_from_slice(vector);
        self.nodes.push(Node::new(id.clone(), level));
        self.handles.insert(id, handle);
        self.level_max = self.level_max.max(level);
        self.built = false;

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(handle);
            return Ok(());
        };
        let entry_level = self.nodes[entry as usize].level;

        match self.params.linking {
            LinkStrategy::Closest => self.link_closest(vector, handle, level, entry),
            LinkStrategy::Beam => self.link_beam(vector, handle, level, entry, entry_level),
        }

        if level > entry_level {
            self.entry_point = Some(handle);
        }

        tracing::trace!(handle, level, "inserted node");
        Ok(())
    }

    /// Link `handle` to the greedy-closest node on every level both share.
    fn link_closest(&mut self, vector: &[f32], handle: u32, level: usize, entry: u32) {
        let closest = self.greedy_closest(vector, entry);
        let shared_top = level.min(self.nodes[closest as usize].level);
        for layer in 0..=shared_top {
            self.connect(closest, handle, layer);
            self.connect(handle, closest, layer);
        }
    }

    /// Layered insertion.
    ///
    /// Above the new node's level only a greedy step per level is taken. From
    /// `min(level, entry_level)` down to 0 an `ef_construction`-wide search
    /// yields candidates, a diverse subset of which is linked both ways. On
    /// level 0 the node is also pinned to an anchor.
    fn link_beam(&mut self, vector: &[f32], handle: u32, level: usize, entry: u32, entry_level: usize) {
        let mut current = entry;
        for layer in (level + 1..=entry_level).rev() {
            current = self.greedy_step(vector, current, layer);
        }

        for layer in (0..=level.min(entry_level)).rev() {
            let candidates: Vec<Scored<u32>> = self
                .search_layer(vector, current, layer, self.params.ef_construction)
                .into_iter()
                .filter(|c| c.id != handle)
                .collect();
            let Some(best) = candidates.first() else {
                continue;
            };
            current = best.id;

            let mut selected = self.select_diverse(&candidates, self.params.m);
            if layer == 0 {
                let anchor = self.pick_anchor(&candidates, handle);
                if !selected.contains(&anchor) {
                    if selected.len() >= self.params.m {
                        selected.pop();
                    }
                    selected.push(anchor);
                }
                self.nodes[handle as usize].anchor = Some(anchor);
                self.nodes[anchor as usize].anchored += 1;
            }

            for neighbor in selected {
                self.connect(neighbor, handle, layer);
                self.connect(handle, neighbor, layer);
            }
        }
    }

    /// Greedy descent from `entry`, top level first.
    ///
    /// On each level keep moving to the most similar neighbor while it beats
    /// the best node seen so far. Returns that best node.
    fn greedy_closest(&self, query: &[f32], entry: u32) -> u32 {
        let mut current = entry;
        for layer in (0..=self.level_max).rev() {
            current = self.greedy_step(query, current, layer);
        }
        current
    }

    /// Hill-climb on one level until no neighbor improves on `start`.
    fn greedy_step(&self, query: &[f32], start: u32, layer: usize) -> u32 {
        let mut current = start;
        let mut best = self.similarity_to(query, current);
        loop {
            let mut next = None;
            let mut max_similarity = f32::NEG_INFINITY;
            for &neighbor in self.nodes[current as usize].neighbors_at(layer) {
                let similarity = self.similarity_to(query, neighbor);
                if similarity > max_similarity {
                    max_similarity = similarity;
                    next = Some(neighbor);
                }
            }
            match next {
                Some(n) if max_similarity > best => {
                    current = n;
                    best = max_similarity;
                }
                _ => return current,
            }
        }
    }

    /// Neighbor selection heuristic of Malkov and Yashunin (Algorithm 4).
    ///
    /// Walks `candidates` best first and keeps one only if it is more similar
    /// to the query than to every candidate already kept.
    fn select_diverse(&self, candidates: &[Scored<u32>], m: usize) -> NeighborList {
        let mut selected = NeighborList::new();
        for candidate in candidates {
            if selected.len() >= m {
                break;
            }
            let vector = self.vector_at(candidate.id);
            if selected
                .iter()
                .all(|&kept| self.similarity_to(vector, kept) < candidate.score)
            {
                selected.push(candidate.id);
            }
        }
        selected
    }

    /// The most similar candidate that still has room for another anchored
    /// node, else the newest node, which nothing is anchored to yet.
    fn pick_anchor(&self, candidates: &[Scored<u32>], handle: u32) -> u32 {
        let limit = (self.params.m / 2).max(1);
        candidates
            .iter()
            .map(|c| c.id)
            .find(|&c| self.nodes[c as usize].anchored < limit)
            .unwrap_or(handle - 1)
    }

    /// Whether the level-0 link `owner -> target` is an anchor link.
    fn is_pinned(&self, owner: u32, target: u32, layer: usize) -> bool {
        layer == 0
            && (self.nodes[target as usize].anchor == Some(owner)
                || self.nodes[owner as usize].anchor == Some(target))
    }

    /// Append `to` to `from`'s list on `layer`, evicting one entry on overflow.
    ///
    /// Anchor links are never evicted. A list holds at most `M / 2` anchored
    /// nodes plus its own anchor, so an evictable entry always exists.
    fn connect(&mut self, from: u32, to: u32, layer: usize) {
        let m = self.params.m;
        let owner = from as usize;
        {
            let Some(list) = self.nodes[owner].neighbors.get_mut(layer) else {
                return;
            };
            if list.contains(&to) {
                return;
            }
            list.push(to);
            if list.len() <= m {
                return;
            }
        }

        let list = &self.nodes[owner].neighbors[layer];
        let victim = match self.params.eviction {
            EvictionPolicy::MostRecent => list
                .iter()
                .rposition(|&n| !self.is_pinned(from, n, layer)),
            EvictionPolicy::LeastSimilar => {
                let owner_vector = self.vector_at(from);
                list.iter()
                    .enumerate()
                    .filter(|&(_, &n)| !self.is_pinned(from, n, layer))
                    .map(|(pos, &n)| (pos, self.similarity_to(owner_vector, n)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(pos, _)| pos)
            }
        };
        let pos = victim.unwrap_or(list.len() - 1);
        self.nodes[owner].neighbors[layer].remove(pos);
    }
}
