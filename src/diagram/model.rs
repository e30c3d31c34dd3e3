//! Canonical diagram state.
//!
//! `DiagramModel` holds nodes, connections, selection and the connection
//! handshake, plus an R-tree of node bounds for hit-testing. It exposes only
//! read access publicly; every mutation goes through `DiagramController`.

use crate::spatial_index::SpatialIndex;
use crate::types::{
    ConnectionHandshake, ConnectionId, DiagramConnection, DiagramNode, DiagramState, NodeId,
    Selection, WorldPoint,
};
use std::fmt;

#[derive(Default)]
pub struct DiagramModel {
    pub(super) nodes: Vec<DiagramNode>,
    pub(super) connections: Vec<DiagramConnection>,
    pub(super) selection: Selection,
    pub(super) handshake: ConnectionHandshake,
    pub(super) index: SpatialIndex,
}

impl fmt::Debug for DiagramModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramModel")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("selection", &self.selection)
            .field("handshake", &self.handshake)
            .finish()
    }
}

impl DiagramModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[DiagramConnection] {
        &self.connections
    }

    pub fn node(&self, id: &NodeId) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&DiagramConnection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_node_id(&self) -> Option<&NodeId> {
        self.selection.node()
    }

    pub fn selected_connection_id(&self) -> Option<&ConnectionId> {
        self.selection.connection()
    }

    pub fn handshake(&self) -> &ConnectionHandshake {
        &self.handshake
    }

    pub fn pending_connection_start_id(&self) -> Option<&NodeId> {
        self.handshake.armed_node()
    }

    /// True if an edge between `a` and `b` exists in either direction.
    pub fn has_edge_between(&self, a: &NodeId, b: &NodeId) -> bool {
        self.connections.iter().any(|c| c.links(a, b))
    }

    /// First node (in insertion order) whose bounds grown by `padding`
    /// contain `point`.
    pub fn node_at(&self, point: WorldPoint, padding: f64) -> Option<&DiagramNode> {
        if !point.is_finite() {
            return None;
        }
        let id = self.index.first_at(point, padding)?;
        self.node(id)
    }

    /// World-space anchors (node centres) of both ends of a connection.
    pub fn connection_endpoints(&self, id: &ConnectionId) -> Option<(WorldPoint, WorldPoint)> {
        let conn = self.connection(id)?;
        let from = self.node(&conn.from)?;
        let to = self.node(&conn.to)?;
        Some((from.center(), to.center()))
    }

    /// First connection whose anchor segment passes within `tolerance` of
    /// `point`.
    pub fn connection_at(&self, point: WorldPoint, tolerance: f64) -> Option<&DiagramConnection> {
        self.connections.iter().find(|conn| {
            self.connection_endpoints(&conn.id)
                .map(|(a, b)| distance_to_segment(point, a, b) <= tolerance)
                .unwrap_or(false)
        })
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> DiagramState {
        DiagramState {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            selected_node_id: self.selection.node().cloned(),
            selected_connection_id: self.selection.connection().cloned(),
            pending_connection_start_id: self.handshake.armed_node().cloned(),
        }
    }

    /// Check the structural invariants and describe the first violation.
    ///
    /// Selection exclusivity holds by construction of `Selection`; the
    /// remaining checks cover positions, references, duplicate edges and the
    /// handshake.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(node) = self.nodes.iter().find(|n| !n.x.is_finite() || !n.y.is_finite()) {
            return Err(format!("node {} has a non-finite position", node.id));
        }

        for conn in &self.connections {
            if !self.contains_node(&conn.from) || !self.contains_node(&conn.to) {
                return Err(format!("connection {} references a missing node", conn.id));
            }
        }

        for (i, a) in self.connections.iter().enumerate() {
            if let Some(b) = self.connections[i + 1..]
                .iter()
                .find(|b| b.links(&a.from, &a.to))
            {
                return Err(format!("connections {} and {} link the same pair", a.id, b.id));
            }
        }

        if let Some(start) = self.handshake.armed_node() {
            if !self.contains_node(start) {
                return Err(format!("pending connection start {start} is not a node"));
            }
        }

        match &self.selection {
            Selection::Node(id) if !self.contains_node(id) => {
                Err(format!("selected node {id} does not exist"))
            }
            Selection::Connection(id) if self.connection(id).is_none() => {
                Err(format!("selected connection {id} does not exist"))
            }
            _ => Ok(()),
        }?;

        if self.index.len() != self.nodes.len() {
            return Err(format!(
                "spatial index holds {} entries for {} nodes",
                self.index.len(),
                self.nodes.len()
            ));
        }

        Ok(())
    }
}

fn distance_to_segment(p: WorldPoint, a: WorldPoint, b: WorldPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
