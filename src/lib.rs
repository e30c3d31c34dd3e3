//! GestureFlow: a node/edge diagram editor driven by pointer and hand-gesture
//! input.
//!
//! The diagram lives in [`diagram::DiagramModel`] and is changed only through
//! [`diagram::DiagramController`]. Pointer input ([`pointer`]) and gesture
//! input ([`gesture`]) translate screen positions through
//! [`viewport::ViewportTransform`] and issue controller commands. [`editor::Editor`]
//! ties them together with files, settings and notifications.

pub mod constants;
pub mod diagram;
pub mod document;
pub mod editor;
pub mod error;
pub mod file_manager;
pub mod gesture;
pub mod logging;
pub mod notifications;
pub mod perf;
pub mod pointer;
pub mod settings;
pub mod spatial_index;
pub mod store;
pub mod types;
pub mod viewport;
