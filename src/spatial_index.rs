//! Spatial Index Module
//!
//! R-tree over node bounding boxes so hit-testing a gesture sample stays
//! O(log n) even though it runs on every incoming sample.

use crate::types::{NodeBounds, NodeId, WorldPoint};
use rstar::{AABB, RTree, RTreeObject};
use std::collections::HashMap;

/// A spatial entry representing a node's bounding box.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub node_id: NodeId,
    /// Insertion sequence; lower means the node was added earlier.
    pub seq: u64,
    pub bounds: NodeBounds,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

impl PartialEq for SpatialEntry {
    fn eq(&self, other: &Self) -> bool {
        self.node_id == other.node_id
    }
}

/// Spatial index for diagram nodes.
///
/// Entries keep their insertion sequence across position updates so that
/// "first node under the cursor" means the same thing as iterating the node
/// list in order.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
    entries: HashMap<NodeId, SpatialEntry>,
    next_seq: u64,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from nodes given in insertion order.
    pub fn from_nodes<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (&'a NodeId, NodeBounds)>,
    {
        let mut index = Self::new();
        index.rebuild(nodes);
        index
    }

    /// Insert a new node or move an existing one, preserving its sequence.
    pub fn upsert(&mut self, node_id: &NodeId, bounds: NodeBounds) {
        let seq = match self.entries.remove(node_id) {
            Some(old) => {
                self.tree.remove(&old);
                old.seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };

        let entry = SpatialEntry {
            node_id: node_id.clone(),
            seq,
            bounds,
        };
        self.tree.insert(entry.clone());
        self.entries.insert(node_id.clone(), entry);
    }

    pub fn remove(&mut self, node_id: &NodeId) -> bool {
        if let Some(entry) = self.entries.remove(node_id) {
            self.tree.remove(&entry);
            true
        } else {
            false
        }
    }

    /// Earliest-inserted node whose bounds, grown by `padding`, contain `point`.
    pub fn first_at(&self, point: WorldPoint, padding: f64) -> Option<&NodeId> {
        let query = AABB::from_corners(
            [point.x - padding, point.y - padding],
            [point.x + padding, point.y + padding],
        );

        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter(|entry| entry.bounds.padded(padding).contains(point))
            .min_by_key(|entry| entry.seq)
            .map(|entry| &entry.node_id)
    }

    /// All nodes whose unpadded bounds contain `point`, earliest first.
    pub fn query_point(&self, point: WorldPoint) -> Vec<NodeId> {
        let mut hits: Vec<&SpatialEntry> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x, point.y]))
            .filter(|entry| entry.bounds.contains(point))
            .collect();
        hits.sort_by_key(|entry| entry.seq);
        hits.into_iter().map(|entry| entry.node_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rebuild<'a, I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = (&'a NodeId, NodeBounds)>,
    {
        let entries: Vec<SpatialEntry> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, (id, bounds))| SpatialEntry {
                node_id: id.clone(),
                seq: i as u64,
                bounds,
            })
            .collect();

        self.next_seq = entries.len() as u64;
        self.entries = entries
            .iter()
            .map(|e| (e.node_id.clone(), e.clone()))
            .collect();
        self.tree = RTree::bulk_load(entries);
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.entries.clear();
        self.next_seq = 0;
    }
}
