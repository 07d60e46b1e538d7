//! Geometry primitives: points, segments and polygons in world space.
//!
//! Everything here is pure and allocation-free. Door and window placement,
//! hit-testing and snapping are all built from these few functions.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn sub(self, other: Point) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Result of projecting a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// The projected point, clamped to the segment.
    pub point: Point,
    /// Normalized position along the segment, clamped to `[0, 1]`.
    pub t: f64,
    /// Whether the unclamped projection fell within the segment span.
    pub on_segment: bool,
}

/// Euclidean distance between `a` and `b`.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Round `coord` to the nearest multiple of `grid_size`.
///
/// A non-positive grid size disables snapping.
#[must_use]
pub fn snap_to_grid(coord: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return coord;
    }
    (coord / grid_size).round() * grid_size
}

/// Snap both coordinates of `p` to the grid.
#[must_use]
pub fn snap_point(p: Point, grid_size: f64) -> Point {
    Point::new(snap_to_grid(p.x, grid_size), snap_to_grid(p.y, grid_size))
}

/// Orthogonal projection of `p` onto segment `ab`.
///
/// A degenerate segment (`a == b`) projects everything onto `a` with
/// `t = 0` and `on_segment = true`.
#[must_use]
pub fn project_onto_segment(p: Point, a: Point, b: Point) -> Projection {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return Projection { point: a, t: 0.0, on_segment: true };
    }
    let raw_t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    let t = raw_t.clamp(0.0, 1.0);
    Projection {
        point: Point::new(a.x + t * dx, a.y + t * dy),
        t,
        on_segment: (0.0..=1.0).contains(&raw_t),
    }
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`,
/// computed from the line equation. Returns `None` for a degenerate line.
#[must_use]
pub fn line_distance(p: Point, a: Point, b: Point) -> Option<f64> {
    let len = distance(a, b);
    if len == 0.0 {
        return None;
    }
    let cross = (b.y - a.y) * p.x - (b.x - a.x) * p.y + b.x * a.y - b.y * a.x;
    Some(cross.abs() / len)
}

/// Whether `p` lies within `tolerance` of segment `ab`.
///
/// Points beyond either endpoint fail even when inside the tolerance band;
/// the span test uses the raw dot product, not the clamped projection.
#[must_use]
pub fn point_on_segment(p: Point, a: Point, b: Point, tolerance: f64) -> bool {
    let Some(dist) = line_distance(p, a, b) else {
        return distance(p, a) < tolerance;
    };
    if dist > tolerance {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len_sq = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    (0.0..=len_sq).contains(&dot)
}

/// The point at arc length `dist` from `a` toward `b`.
///
/// Distances beyond the segment extrapolate along the same line.
#[must_use]
pub fn point_along_line(a: Point, b: Point, dist: f64) -> Point {
    let len = distance(a, b);
    if len == 0.0 {
        return a;
    }
    let ratio = dist / len;
    Point::new(a.x + ratio * (b.x - a.x), a.y + ratio * (b.y - a.y))
}

/// Ray-casting parity test. Points exactly on the boundary may land either way.
#[must_use]
pub fn point_in_polygon(p: Point, points: &[Point]) -> bool {
    let mut inside = false;
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let pi = points[i];
        let pj = points[j];
        if (pi.y > p.y) != (pj.y > p.y) {
            let cross_x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned rectangle normalized from two opposite corners.
///
/// Returns `(x, y, width, height)` with non-negative extents.
#[must_use]
pub fn rect_from_corners(a: Point, b: Point) -> (f64, f64, f64, f64) {
    (a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs())
}

/// Inclusive containment test for an axis-aligned rectangle.
#[must_use]
pub fn point_in_rect(p: Point, x: f64, y: f64, width: f64, height: f64) -> bool {
    p.x >= x && p.x <= x + width && p.y >= y && p.y <= y + height
}
