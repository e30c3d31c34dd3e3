//! Hand-gesture input.
//!
//! - `pose`: classifier labels
//! - `protocol`: pose messages in, camera frames out
//! - `cooldown`: debouncing of discrete actions
//! - `dispatcher`: samples to diagram commands
//! - `link`: transport seam to the classifier
//! - `websocket`: live classifier link
//! - `session`: link lifecycle, event pump and frame timer

mod cooldown;
mod dispatcher;
mod link;
mod pose;
mod protocol;
mod session;
mod websocket;

pub use cooldown::{ActionClock, CooldownPolicy};
pub use dispatcher::{GestureAction, GestureConfig, GestureCursor, GestureDispatcher, GestureView};
pub use link::{GestureLink, LinkEvent, ReplayLink, forward_message};
pub use pose::{Pose, PoseKind};
pub use protocol::{FrameMessage, GestureSample, NormalizedPoint, decode_pose_message};
pub use session::{FrameSource, GestureSession};
pub use websocket::WebSocketLink;
