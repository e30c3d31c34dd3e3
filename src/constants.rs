//! Application-wide constants.
//!
//! Centralizes magic numbers for geometry, input handling and the pose
//! stream so the dispatcher, hit-testing and renderers agree on them.

// ============================================================================
// Node Geometry
// ============================================================================

/// Logical width of every node in world units
pub const NODE_WIDTH: f64 = 120.0;

/// Logical height of every node in world units
pub const NODE_HEIGHT: f64 = 60.0;

/// Label given to nodes created without an explicit one
pub const DEFAULT_NODE_LABEL: &str = "New Node";

/// Margin added on every side of a node when hit-testing gesture input
pub const GESTURE_HIT_PADDING: f64 = 25.0;

/// Half-width of the invisible stroke used to pick connections with the pointer
pub const CONNECTION_HIT_TOLERANCE: f64 = 10.0;

// ============================================================================
// Zoom & Pan
// ============================================================================

/// Minimum zoom level
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum zoom level
pub const MAX_ZOOM: f64 = 5.0;

/// Default zoom level
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Scale change per unit of wheel delta (negated: scrolling up zooms in)
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;

// ============================================================================
// Gesture Input
// ============================================================================

/// Exponential smoothing factor applied to the gesture cursor
pub const CURSOR_SMOOTHING: f64 = 0.2;

/// Width of the classifier's capture frame
pub const CAPTURE_WIDTH: u32 = 640;

/// Height of the classifier's capture frame
pub const CAPTURE_HEIGHT: u32 = 480;

/// Cooldown shared by create, delete and connect actions in milliseconds
pub const ACTION_COOLDOWN_MS: u64 = 600;

/// Cooldown for the select action in milliseconds
pub const SELECT_COOLDOWN_MS: u64 = 400;

/// Interval between outbound frames in milliseconds (~10 frames/second)
pub const FRAME_INTERVAL_MS: u64 = 100;

/// JPEG quality used for outbound frames
pub const FRAME_JPEG_QUALITY: u8 = 50;

/// Read timeout of the live link socket; bounds how long a disconnect waits
pub const LINK_POLL_INTERVAL_MS: u64 = 20;

/// Reserved pose tag for "no hand visible"
pub const NO_HAND_TAG: &str = "no_hand";

// ============================================================================
// Documents & Files
// ============================================================================

/// Name given to freshly created files
pub const UNTITLED_FILE_NAME: &str = "Untitled Diagram";

/// Extension used for exported and stored documents
pub const DOCUMENT_EXTENSION: &str = "json";

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "gestureflow";

// ============================================================================
// Performance
// ============================================================================

/// Dispatch time above which a single sample is logged as slow
pub const SLOW_DISPATCH_MS: f64 = 4.0;
