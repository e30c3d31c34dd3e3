//! Core types for the diagram.
//!
//! This module defines the node/connection data model, the snapshot handed to
//! renderers, and the small geometry types shared by hit-testing and the
//! viewport.

use crate::constants::{DEFAULT_NODE_LABEL, NODE_HEIGHT, NODE_WIDTH};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque unique identifier of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

/// Opaque unique identifier of a connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(NodeId);
string_id!(ConnectionId);

// ============================================================================
// Geometry
// ============================================================================

/// A point in world (diagram) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A point in screen (pixel) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl NodeBounds {
    /// Grow the rectangle by `margin` on every side.
    pub fn padded(self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    #[inline]
    pub fn contains(&self, p: WorldPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

// ============================================================================
// Diagram Data
// ============================================================================

/// A labelled box on the diagram. `x`/`y` is the world-space top-left corner;
/// the footprint is always `NODE_WIDTH` x `NODE_HEIGHT`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl DiagramNode {
    pub fn new(id: impl Into<NodeId>, x: f64, y: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            label: label.into(),
        }
    }

    /// Node with a generated id and the default label.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(NodeId::generate(), x, y, DEFAULT_NODE_LABEL)
    }

    pub fn bounds(&self) -> NodeBounds {
        NodeBounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + NODE_WIDTH,
            max_y: self.y + NODE_HEIGHT,
        }
    }

    /// Anchor point used for connection endpoints.
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(self.x + NODE_WIDTH / 2.0, self.y + NODE_HEIGHT / 2.0)
    }
}

/// An undirected edge between two nodes. `from`/`to` only record the order in
/// which the handshake was performed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramConnection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub to: NodeId,
}

impl DiagramConnection {
    pub fn new(id: impl Into<ConnectionId>, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// True if this connection links `a` and `b` in either direction.
    pub fn links(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.from == id || &self.to == id
    }
}

// ============================================================================
// Selection & Handshake
// ============================================================================

/// What is currently selected. A node and a connection can never be selected
/// at the same time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Connection(ConnectionId),
}

impl Selection {
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<&ConnectionId> {
        match self {
            Self::Connection(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Two-step connection protocol.
///
/// ```text
/// Idle     --start(n)-------------------> Armed(n)
/// Armed(n) --complete(n)----------------> Idle      (self-target, no edge)
/// Armed(n) --complete(m), m != n -------> Idle      (edge created unless present)
/// Armed(n) --select_node(None)----------> Idle
/// Armed(n) --select_connection(_)-------> Idle
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectionHandshake {
    #[default]
    Idle,
    Armed(NodeId),
}

impl ConnectionHandshake {
    pub fn armed_node(&self) -> Option<&NodeId> {
        match self {
            Self::Armed(id) => Some(id),
            Self::Idle => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed(_))
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Value snapshot of the diagram, as handed to renderers and callers of
/// `DiagramController::get_state`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagramState {
    pub nodes: Vec<DiagramNode>,
    pub connections: Vec<DiagramConnection>,
    pub selected_node_id: Option<NodeId>,
    pub selected_connection_id: Option<ConnectionId>,
    pub pending_connection_start_id: Option<NodeId>,
}

impl DiagramState {
    pub fn node(&self, id: &NodeId) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&DiagramConnection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Selection as an enum, reconstructed from the nullable fields.
    pub fn selection(&self) -> Selection {
        match (&self.selected_node_id, &self.selected_connection_id) {
            (Some(id), _) => Selection::Node(id.clone()),
            (None, Some(id)) => Selection::Connection(id.clone()),
            (None, None) => Selection::None,
        }
    }

    pub fn handshake(&self) -> ConnectionHandshake {
        match &self.pending_connection_start_id {
            Some(id) => ConnectionHandshake::Armed(id.clone()),
            None => ConnectionHandshake::Idle,
        }
    }
}
