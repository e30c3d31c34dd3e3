//! Diagram commands.
//!
//! `DiagramController` owns the `DiagramModel` and is the only code allowed to
//! mutate it. Commands never fail: ids that no longer exist are ignored,
//! because pointer and gesture input can race node deletion.

use super::model::DiagramModel;
use crate::constants::DEFAULT_NODE_LABEL;
use crate::types::{
    ConnectionHandshake, ConnectionId, DiagramConnection, DiagramNode, DiagramState, NodeId,
    Selection,
};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

#[derive(Debug, Default)]
pub struct DiagramController {
    model: DiagramModel,
}

impl DiagramController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the model for hit-testing and rendering.
    pub fn model(&self) -> &DiagramModel {
        &self.model
    }

    /// Snapshot of the current state, by value.
    pub fn get_state(&self) -> DiagramState {
        self.model.snapshot()
    }

    // ==================== Nodes ====================

    /// Append a node with the default label, select it and return its id.
    pub fn add_node(&mut self, x: f64, y: f64) -> NodeId {
        self.add_node_with_label(x, y, DEFAULT_NODE_LABEL)
    }

    /// Non-finite coordinates are replaced by the origin on that axis.
    pub fn add_node_with_label(&mut self, x: f64, y: f64, label: impl Into<String>) -> NodeId {
        let (x, y) = if x.is_finite() && y.is_finite() {
            (x, y)
        } else {
            warn!(x, y, "non-finite node position pinned to origin");
            (finite_or_zero(x), finite_or_zero(y))
        };
        let node = DiagramNode::new(NodeId::generate(), x, y, label);
        let id = node.id.clone();
        debug!(node_id = %id, x, y, "add node");

        self.model.index.upsert(&id, node.bounds());
        self.model.nodes.push(node);
        self.model.selection = Selection::Node(id.clone());
        id
    }

    /// Remove a node together with every connection touching it.
    pub fn delete_node(&mut self, id: &NodeId) {
        let Some(pos) = self.model.nodes.iter().position(|n| &n.id == id) else {
            trace!(node_id = %id, "delete of unknown node ignored");
            return;
        };

        self.model.nodes.remove(pos);
        self.model.index.remove(id);

        let before = self.model.connections.len();
        self.model.connections.retain(|c| !c.touches(id));
        debug!(
            node_id = %id,
            removed_connections = before - self.model.connections.len(),
            "delete node"
        );

        // Only a selection of some other node survives.
        self.model.selection = match std::mem::take(&mut self.model.selection) {
            Selection::Node(sel) if &sel != id => Selection::Node(sel),
            _ => Selection::None,
        };
        if self.model.handshake.armed_node() == Some(id) {
            self.model.handshake = ConnectionHandshake::Idle;
        }
    }

    pub fn update_node_position(&mut self, id: &NodeId, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            warn!(node_id = %id, x, y, "ignoring non-finite node position");
            return;
        }
        let Some(node) = self.model.nodes.iter_mut().find(|n| &n.id == id) else {
            return;
        };
        node.x = x;
        node.y = y;
        let bounds = node.bounds();
        self.model.index.upsert(id, bounds);
    }

    pub fn update_node_label(&mut self, id: &NodeId, label: impl Into<String>) {
        if let Some(node) = self.model.nodes.iter_mut().find(|n| &n.id == id) {
            node.label = label.into();
            debug!(node_id = %id, label = %node.label, "update label");
        }
    }

    // ==================== Connections ====================

    pub fn delete_connection(&mut self, id: &ConnectionId) {
        let before = self.model.connections.len();
        self.model.connections.retain(|c| &c.id != id);
        if self.model.connections.len() == before {
            trace!(connection_id = %id, "delete of unknown connection ignored");
            return;
        }
        debug!(connection_id = %id, "delete connection");

        if self.model.selection.connection() == Some(id) {
            self.model.selection = Selection::None;
        }
    }

    /// Arm the handshake on `node_id` and select it.
    pub fn start_connection(&mut self, node_id: &NodeId) {
        if !self.model.contains_node(node_id) {
            trace!(node_id = %node_id, "start connection on unknown node ignored");
            return;
        }
        debug!(node_id = %node_id, "arm connection");
        self.model.handshake = ConnectionHandshake::Armed(node_id.clone());
        self.model.selection = Selection::Node(node_id.clone());
    }

    /// Consume the armed handshake, creating an edge to `target_id` when it
    /// is a different node and the pair is not linked yet. Returns the new
    /// connection id, if one was created.
    pub fn complete_connection(&mut self, target_id: &NodeId) -> Option<ConnectionId> {
        let ConnectionHandshake::Armed(start) = std::mem::take(&mut self.model.handshake) else {
            trace!(node_id = %target_id, "complete connection without armed start ignored");
            return None;
        };

        if &start == target_id {
            debug!(node_id = %start, "self connection rejected, handshake cleared");
            return None;
        }
        if !self.model.contains_node(target_id) {
            trace!(node_id = %target_id, "complete connection on unknown node");
            return None;
        }
        if self.model.has_edge_between(&start, target_id) {
            debug!(from = %start, to = %target_id, "connection already exists");
            return None;
        }

        let conn = DiagramConnection::new(ConnectionId::generate(), start, target_id.clone());
        let id = conn.id.clone();
        debug!(connection_id = %id, from = %conn.from, to = %conn.to, "connect");
        self.model.connections.push(conn);
        Some(id)
    }

    // ==================== Selection ====================

    /// Select a node, or clear the selection (and any armed handshake) with
    /// `None`.
    pub fn select_node(&mut self, id: Option<&NodeId>) {
        match id {
            Some(id) => {
                if !self.model.contains_node(id) {
                    trace!(node_id = %id, "select of unknown node ignored");
                    return;
                }
                self.model.selection = Selection::Node(id.clone());
            }
            None => {
                self.model.selection = Selection::None;
                self.model.handshake = ConnectionHandshake::Idle;
            }
        }
    }

    /// Select a connection, or clear the selection with `None`. Either way
    /// the handshake is cancelled.
    pub fn select_connection(&mut self, id: Option<&ConnectionId>) {
        match id {
            Some(id) => {
                if self.model.connection(id).is_none() {
                    trace!(connection_id = %id, "select of unknown connection ignored");
                    return;
                }
                self.model.selection = Selection::Connection(id.clone());
            }
            None => self.model.selection = Selection::None,
        }
        self.model.handshake = ConnectionHandshake::Idle;
    }

    // ==================== Whole Diagram ====================

    /// Replace the whole diagram, resetting selection and handshake.
    ///
    /// Input that would break the model's invariants is dropped: nodes with
    /// non-finite positions, repeated node ids (first wins), connections to
    /// missing nodes, self-loops and repeated node pairs.
    pub fn load_diagram(&mut self, nodes: Vec<DiagramNode>, connections: Vec<DiagramConnection>) {
        let mut seen = HashSet::new();
        let total_nodes = nodes.len();
        let nodes: Vec<DiagramNode> = nodes
            .into_iter()
            .filter(|n| n.x.is_finite() && n.y.is_finite() && seen.insert(n.id.clone()))
            .collect();

        let total_connections = connections.len();
        let mut kept: Vec<DiagramConnection> = Vec::with_capacity(connections.len());
        let mut seen_connections = HashSet::new();
        for conn in connections {
            let valid = conn.from != conn.to
                && seen.contains(&conn.from)
                && seen.contains(&conn.to)
                && seen_connections.insert(conn.id.clone())
                && !kept.iter().any(|k| k.links(&conn.from, &conn.to));
            if valid {
                kept.push(conn);
            }
        }

        let dropped = (total_nodes - nodes.len()) + (total_connections - kept.len());
        if dropped > 0 {
            warn!(dropped, "discarded inconsistent entries while loading diagram");
        }
        debug!(nodes = nodes.len(), connections = kept.len(), "load diagram");

        self.model.index.rebuild(nodes.iter().map(|n| (&n.id, n.bounds())));
        self.model.nodes = nodes;
        self.model.connections = kept;
        self.model.selection = Selection::None;
        self.model.handshake = ConnectionHandshake::Idle;
    }

    pub fn clear_diagram(&mut self) {
        self.load_diagram(Vec::new(), Vec::new());
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
