//! Pan/zoom transform between screen pixels and world coordinates.
//!
//! The only state is the pan offset and the uniform scale. The rendering
//! surface's placement on screen is passed in on every call because it can
//! change between samples (window resize, layout) and must be subtracted
//! before pan and scale are applied.

use crate::constants::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_SENSITIVITY};
use crate::types::{ScreenPoint, WorldPoint};

/// Bounding rectangle of the rendering surface in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Surface placed at the screen origin.
    pub const fn at_origin(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: DEFAULT_ZOOM,
        }
    }
}

impl ViewportTransform {
    pub fn new(offset_x: f64, offset_y: f64, scale: f64) -> Self {
        Self {
            offset_x,
            offset_y,
            scale: scale.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Convert a screen position to world coordinates
    #[inline]
    pub fn screen_to_world(&self, surface: &SurfaceRect, screen: ScreenPoint) -> WorldPoint {
        WorldPoint::new(
            (screen.x - surface.left - self.offset_x) / self.scale,
            (screen.y - surface.top - self.offset_y) / self.scale,
        )
    }

    /// Convert a world position to screen coordinates
    #[inline]
    pub fn world_to_screen(&self, surface: &SurfaceRect, world: WorldPoint) -> ScreenPoint {
        ScreenPoint::new(
            world.x * self.scale + self.offset_x + surface.left,
            world.y * self.scale + self.offset_y + surface.top,
        )
    }

    /// Convert a screen-space delta to world units (for drag operations)
    #[inline]
    pub fn delta_screen_to_world(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.scale, dy / self.scale)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Change the scale by `delta_scale`, keeping the world point under
    /// `screen` fixed. The resulting scale is clamped to the zoom range.
    /// Returns true if the scale actually changed.
    pub fn zoom_at(&mut self, surface: &SurfaceRect, screen: ScreenPoint, delta_scale: f64) -> bool {
        if !delta_scale.is_finite() {
            return false;
        }
        let new_scale = (self.scale + delta_scale).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_scale == self.scale {
            return false;
        }

        let anchor = self.screen_to_world(surface, screen);
        let local_x = screen.x - surface.left;
        let local_y = screen.y - surface.top;

        self.offset_x = local_x - anchor.x * new_scale;
        self.offset_y = local_y - anchor.y * new_scale;
        self.scale = new_scale;
        true
    }

    /// Zoom in response to a wheel event: scrolling up (negative delta)
    /// zooms in.
    pub fn zoom_by_wheel(&mut self, surface: &SurfaceRect, screen: ScreenPoint, wheel_delta_y: f64) -> bool {
        self.zoom_at(surface, screen, -wheel_delta_y * WHEEL_ZOOM_SENSITIVITY)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
