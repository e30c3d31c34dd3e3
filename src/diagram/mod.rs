//! Diagram state and its mutation surface.
//!
//! ## Modules
//!
//! - `model` - `DiagramModel`: nodes, connections, selection, handshake and
//!   the spatial index used for hit-testing (read-only outside this module)
//! - `controller` - `DiagramController`: every command that changes the model
//!
//! ## Invariants
//!
//! After every controller call:
//! - a node and a connection are never selected at the same time
//! - every connection references two existing nodes
//! - no two connections join the same unordered pair of nodes
//! - an armed handshake always points at an existing node
//! - selecting a connection, or clearing the node selection, disarms the
//!   handshake

mod controller;
mod model;

pub use controller::DiagramController;
pub use model::DiagramModel;
