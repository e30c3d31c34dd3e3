//! Pointer input: selection, node dragging, panning and wheel zoom.
//!
//! The interaction mode is a single explicit state machine, so a pan and a
//! node drag can never be active at the same time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> DraggingNode   (button down on a node; the node is selected)
//! Idle -> Idle           (button down on a connection; it is selected)
//! Idle -> Panning        (button down on empty surface)
//! Any  -> Idle           (button up)
//! ```

use crate::constants::CONNECTION_HIT_TOLERANCE;
use crate::diagram::DiagramController;
use crate::profile_scope;
use crate::types::{ConnectionId, NodeId, ScreenPoint};
use crate::viewport::{SurfaceRect, ViewportTransform};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PointerState {
    #[default]
    Idle,

    /// Dragging the surface
    Panning {
        /// Last pointer position for delta calculation
        last: ScreenPoint,
    },

    /// Dragging a node
    DraggingNode {
        node_id: NodeId,
        /// World-space offset from the node's top-left to the grab point
        grab_offset: (f64, f64),
    },
}

impl PointerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, Self::Panning { .. })
    }

    pub fn dragged_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::DraggingNode { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Idle;
    }
}

/// What a button press landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    Node(NodeId),
    Connection(ConnectionId),
    Surface,
}

/// Pointer handling for one surface.
#[derive(Debug, Default)]
pub struct PointerInput {
    state: PointerState,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Primary button pressed at `screen`.
    pub fn button_down(
        &mut self,
        screen: ScreenPoint,
        surface: &SurfaceRect,
        viewport: &ViewportTransform,
        controller: &mut DiagramController,
    ) -> PointerTarget {
        let world = viewport.screen_to_world(surface, screen);
        let model = controller.model();

        // Nodes are drawn above connections and win the hit-test.
        if let Some(node) = model.node_at(world, 0.0) {
            let node_id = node.id.clone();
            let grab_offset = (world.x - node.x, world.y - node.y);
            controller.select_node(Some(&node_id));
            self.state = PointerState::DraggingNode {
                node_id: node_id.clone(),
                grab_offset,
            };
            return PointerTarget::Node(node_id);
        }

        let tolerance = CONNECTION_HIT_TOLERANCE / viewport.scale;
        if let Some(conn) = model.connection_at(world, tolerance) {
            let id = conn.id.clone();
            controller.select_connection(Some(&id));
            self.state = PointerState::Idle;
            return PointerTarget::Connection(id);
        }

        self.state = PointerState::Panning { last: screen };
        PointerTarget::Surface
    }

    /// Pointer moved to `screen`. Returns whether anything changed.
    pub fn pointer_move(
        &mut self,
        screen: ScreenPoint,
        surface: &SurfaceRect,
        viewport: &mut ViewportTransform,
        controller: &mut DiagramController,
    ) -> bool {
        profile_scope!("pointer_move");

        match &mut self.state {
            PointerState::Idle => false,
            PointerState::Panning { last } => {
                viewport.pan(screen.x - last.x, screen.y - last.y);
                *last = screen;
                true
            }
            PointerState::DraggingNode {
                node_id,
                grab_offset,
            } => {
                let world = viewport.screen_to_world(surface, screen);
                controller.update_node_position(
                    node_id,
                    world.x - grab_offset.0,
                    world.y - grab_offset.1,
                );
                true
            }
        }
    }

    pub fn button_up(&mut self) {
        self.state.reset();
    }

    /// Anchor-preserving zoom at the pointer.
    pub fn wheel(
        &mut self,
        screen: ScreenPoint,
        wheel_delta_y: f64,
        surface: &SurfaceRect,
        viewport: &mut ViewportTransform,
    ) -> bool {
        viewport.zoom_by_wheel(surface, screen, wheel_delta_y)
    }
}
