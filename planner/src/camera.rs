//! Viewport transform between screen pixels and plan world units.
//!
//! Pointer input arrives in screen space and is converted here exactly once,
//! at the engine boundary. Everything below the engine works in world units.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{MAX_ZOOM, MIN_ZOOM};
use crate::geom::Point;

/// Pan/zoom state.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = one world unit per pixel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Screen pixels to world units.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new((screen.x - self.pan_x) / self.zoom, (screen.y - self.pan_y) / self.zoom)
    }

    /// World units to screen pixels; inverse of [`Camera::screen_to_world`].
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x * self.zoom + self.pan_x, world.y * self.zoom + self.pan_y)
    }

    /// Scale a length measured on screen (handle radius, hit slop) into
    /// world units.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply the zoom by `factor`, keeping the world point under
    /// `screen_pt` fixed. The result is clamped to the zoom range.
    pub fn zoom_at(&mut self, screen_pt: Point, factor: f64) {
        let anchor = self.screen_to_world(screen_pt);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan_x = screen_pt.x - anchor.x * self.zoom;
        self.pan_y = screen_pt.y - anchor.y * self.zoom;
    }
}
