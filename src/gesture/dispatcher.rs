//! Turns pose samples into diagram commands.
//!
//! ## Per-sample pipeline
//!
//! 1. "No hand" hides the cursor and stops.
//! 2. The target position is mapped to screen space (mirrored when the
//!    camera faces the user) and the cursor is moved a fixed fraction of the
//!    way towards it.
//! 3. The cursor is projected to world space using the surface rectangle and
//!    viewport passed in with the sample, never a cached copy.
//! 4. The first node whose padded bounds contain the point becomes the hover
//!    target.
//! 5. The pose decides what, if anything, happens to the diagram.
//!
//! ## Performance Notes
//!
//! Samples arrive at the classifier's cadence and every one is hit-tested,
//! so the hot path avoids cloning the diagram: hit-testing goes through the
//! model's spatial index and moves update a single node in place.

use super::cooldown::{ActionClock, CooldownPolicy};
use super::pose::Pose;
use super::protocol::GestureSample;
use crate::constants::{
    ACTION_COOLDOWN_MS, CURSOR_SMOOTHING, FRAME_INTERVAL_MS, FRAME_JPEG_QUALITY,
    GESTURE_HIT_PADDING, NODE_HEIGHT, NODE_WIDTH, SELECT_COOLDOWN_MS,
};
use crate::diagram::DiagramController;
use crate::profile_scope;
use crate::types::{ConnectionId, NodeId, ScreenPoint, WorldPoint};
use crate::viewport::{SurfaceRect, ViewportTransform};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Tuning for gesture input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Fraction of the remaining distance the cursor moves per sample
    pub smoothing: f64,
    /// Margin around nodes when hit-testing, in world units
    pub hit_padding: f64,
    /// Flip the horizontal axis (front-facing camera)
    pub mirror_x: bool,
    pub create: CooldownPolicy,
    pub delete: CooldownPolicy,
    /// Completing a connection
    pub connect: CooldownPolicy,
    /// Arming a connection
    pub connect_arm: CooldownPolicy,
    pub select: CooldownPolicy,
    /// Interval between outbound frames in milliseconds
    pub frame_interval_ms: u64,
    pub frame_quality: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            smoothing: CURSOR_SMOOTHING,
            hit_padding: GESTURE_HIT_PADDING,
            mirror_x: true,
            create: CooldownPolicy::from_millis(ACTION_COOLDOWN_MS),
            delete: CooldownPolicy::from_millis(ACTION_COOLDOWN_MS),
            connect: CooldownPolicy::from_millis(ACTION_COOLDOWN_MS),
            // Only completing a connection is debounced.
            connect_arm: CooldownPolicy::exempt(),
            select: CooldownPolicy::from_millis(SELECT_COOLDOWN_MS),
            frame_interval_ms: FRAME_INTERVAL_MS,
            frame_quality: FRAME_JPEG_QUALITY,
        }
    }
}

/// Everything about the view a sample needs, read fresh for each sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureView {
    /// Size of the screen area the normalised hand position is spread over
    pub screen_width: f64,
    pub screen_height: f64,
    pub surface: SurfaceRect,
    pub viewport: ViewportTransform,
}

impl GestureView {
    /// Surface covering the whole screen.
    pub fn full_screen(width: f64, height: f64, viewport: ViewportTransform) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            surface: SurfaceRect::at_origin(width, height),
            viewport,
        }
    }
}

/// Cursor overlay state for renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureCursor {
    pub position: ScreenPoint,
    pub pose: Pose,
}

/// What a sample did to the diagram.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureAction {
    None,
    HandLost,
    /// A discrete action was suppressed by its cooldown
    CoolingDown,
    Created(NodeId),
    Deleted(NodeId),
    Armed(NodeId),
    /// Handshake completed; `connection` is `None` if the pair was already linked
    Connected {
        from: NodeId,
        to: NodeId,
        connection: Option<ConnectionId>,
    },
    Selected(NodeId),
    Moved(NodeId),
}

pub struct GestureDispatcher {
    config: GestureConfig,
    smoothed: ScreenPoint,
    cursor: Option<GestureCursor>,
    clock: ActionClock,
    hovered: Option<NodeId>,
    pending_target: Option<NodeId>,
}

impl GestureDispatcher {
    /// Dispatcher whose cursor starts at the centre of a screen of the given
    /// size.
    pub fn new(config: GestureConfig, screen_width: f64, screen_height: f64) -> Self {
        Self {
            config,
            smoothed: ScreenPoint::new(screen_width / 2.0, screen_height / 2.0),
            cursor: None,
            clock: ActionClock::new(),
            hovered: None,
            pending_target: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn cursor(&self) -> Option<&GestureCursor> {
        self.cursor.as_ref()
    }

    pub fn hovered_node_id(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    /// Armed handshake start as of the last processed sample.
    pub fn pending_target(&self) -> Option<&NodeId> {
        self.pending_target.as_ref()
    }

    pub fn last_action_at(&self) -> Option<Instant> {
        self.clock.last_action()
    }

    pub fn hide_cursor(&mut self) {
        self.cursor = None;
        self.hovered = None;
    }

    /// Process one sample.
    pub fn handle_sample(
        &mut self,
        sample: &GestureSample,
        view: &GestureView,
        controller: &mut DiagramController,
        now: Instant,
    ) -> GestureAction {
        profile_scope!("gesture_dispatch");

        let position = match (&sample.pose, sample.position) {
            (Pose::NoHand, _) | (_, None) => {
                self.hide_cursor();
                return GestureAction::HandLost;
            }
            (_, Some(p)) => p,
        };

        let target = position.to_screen(view.screen_width, view.screen_height, self.config.mirror_x);
        if !target.x.is_finite() || !target.y.is_finite() {
            warn!(x = target.x, y = target.y, "ignoring non-finite gesture target");
            return GestureAction::None;
        }
        let k = self.config.smoothing;
        self.smoothed.x += (target.x - self.smoothed.x) * k;
        self.smoothed.y += (target.y - self.smoothed.y) * k;
        self.cursor = Some(GestureCursor {
            position: self.smoothed,
            pose: sample.pose.clone(),
        });

        let world = view.viewport.screen_to_world(&view.surface, self.smoothed);
        if !world.is_finite() {
            warn!(x = world.x, y = world.y, "gesture cursor left the finite plane");
            return GestureAction::None;
        }
        self.hovered = controller
            .model()
            .node_at(world, self.config.hit_padding)
            .map(|n| n.id.clone());

        let action = self.apply_pose(&sample.pose, world, controller, now);
        self.pending_target = controller.model().pending_connection_start_id().cloned();

        if !matches!(action, GestureAction::None | GestureAction::Moved(_)) {
            debug!(pose = %sample.pose, ?action, "gesture action");
        }
        action
    }

    fn apply_pose(
        &mut self,
        pose: &Pose,
        world: WorldPoint,
        controller: &mut DiagramController,
        now: Instant,
    ) -> GestureAction {
        let hit = self.hovered.clone();
        let top_left = (world.x - NODE_WIDTH / 2.0, world.y - NODE_HEIGHT / 2.0);

        match pose {
            Pose::Create => {
                let policy = self.config.create;
                if !self.clock.is_ready(&policy, now) {
                    return GestureAction::CoolingDown;
                }
                let id = controller.add_node(top_left.0, top_left.1);
                self.clock.settle(&policy, now, true);
                GestureAction::Created(id)
            }

            Pose::Delete => {
                let policy = self.config.delete;
                if !self.clock.is_ready(&policy, now) {
                    return GestureAction::CoolingDown;
                }
                match controller.model().selected_node_id().cloned() {
                    Some(id) => {
                        controller.delete_node(&id);
                        self.clock.settle(&policy, now, true);
                        GestureAction::Deleted(id)
                    }
                    None => {
                        self.clock.settle(&policy, now, false);
                        GestureAction::None
                    }
                }
            }

            Pose::Connect => {
                let Some(target) = hit else {
                    return GestureAction::None;
                };
                match controller.model().pending_connection_start_id().cloned() {
                    None => {
                        let policy = self.config.connect_arm;
                        if !self.clock.is_ready(&policy, now) {
                            return GestureAction::CoolingDown;
                        }
                        controller.start_connection(&target);
                        self.clock.settle(&policy, now, true);
                        GestureAction::Armed(target)
                    }
                    Some(start) if start == target => GestureAction::None,
                    Some(start) => {
                        let policy = self.config.connect;
                        if !self.clock.is_ready(&policy, now) {
                            return GestureAction::CoolingDown;
                        }
                        let connection = controller.complete_connection(&target);
                        self.clock.settle(&policy, now, true);
                        GestureAction::Connected {
                            from: start,
                            to: target,
                            connection,
                        }
                    }
                }
            }

            Pose::Move => match controller.model().selected_node_id().cloned() {
                Some(id) => {
                    controller.update_node_position(&id, top_left.0, top_left.1);
                    GestureAction::Moved(id)
                }
                None => match hit {
                    Some(target) => {
                        controller.select_node(Some(&target));
                        GestureAction::Selected(target)
                    }
                    None => GestureAction::None,
                },
            },

            Pose::Select => {
                let Some(target) = hit else {
                    return GestureAction::None;
                };
                let policy = self.config.select;
                if !self.clock.is_ready(&policy, now) {
                    return GestureAction::CoolingDown;
                }
                controller.select_node(Some(&target));
                self.clock.settle(&policy, now, true);
                GestureAction::Selected(target)
            }

            Pose::Hover | Pose::Unrecognized | Pose::Unknown(_) | Pose::NoHand => {
                GestureAction::None
            }
        }
    }
}
