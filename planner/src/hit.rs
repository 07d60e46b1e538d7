//! Spatial queries: what is under or near a world-space point.
//!
//! Element picking follows a fixed priority so small shapes win over the
//! walls they sit on: rects, then polygons, then routes, then walls (with
//! their doors and windows resolved from the click's offset along the wall).
//! Within each class the most recently drawn element wins.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use tracing::debug;

use crate::camera::Camera;
use crate::consts::WALL_HIT_SLOP;
use crate::doc::{Element, ElementId, PlanStore, Shape, resolve_wall_child_segment};
use crate::geom::{
    Point, distance, line_distance, point_in_polygon, point_in_rect, point_on_segment, project_onto_segment,
};

/// Which part of an element was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitPart {
    Body,
    Handle(HandleKind),
}

/// Anchor position for rect resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// Whether dragging this anchor moves the left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    /// Whether dragging this anchor moves the right edge.
    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    /// Whether dragging this anchor moves the top edge.
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    /// Whether dragging this anchor moves the bottom edge.
    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }

    /// CSS cursor shown while hovering or dragging this anchor.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Nw | Self::Se => "nwse-resize",
        }
    }
}

/// Which end of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallEnd {
    P1,
    P2,
}

/// What a resize handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// A polygon vertex by index.
    Vertex(usize),
    /// Start of a door or window gap.
    GapStart,
    /// End of a door or window gap.
    GapEnd,
    /// A corner or edge midpoint of a rect.
    Rect(ResizeAnchor),
    /// A wall endpoint.
    WallEnd(WallEnd),
}

/// A resize control point in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub pos: Point,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub element_id: ElementId,
    pub part: HitPart,
}

/// The wall closest to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    pub wall_id: ElementId,
    /// Perpendicular distance from the query point to the wall's line.
    pub distance: f64,
}

/// Test what is under `world_pt`, checking the selected element's handles first.
///
/// The handle tolerance is `handle_radius_px` converted to world units, so
/// handles stay the same size on screen at every zoom level.
#[must_use]
pub fn hit_test(world_pt: Point, store: &PlanStore, camera: &Camera, selected_id: Option<ElementId>) -> Option<Hit> {
    if let Some(selected) = selected_id.and_then(|id| store.get(id)) {
        let tol = camera.screen_dist_to_world(store.config().handle_radius_px);
        if let Some(handle) = find_handle_at(store, world_pt, selected, tol) {
            return Some(Hit { element_id: selected.id, part: HitPart::Handle(handle.kind) });
        }
    }
    find_element_at(store, world_pt).map(|element_id| Hit { element_id, part: HitPart::Body })
}

/// The topmost element at `p`, by class priority then reverse draw order.
#[must_use]
pub fn find_element_at(store: &PlanStore, p: Point) -> Option<ElementId> {
    let elements = store.elements();

    let rect_hit = elements.iter().rev().find(|el| match &el.shape {
        Shape::Gear(r) | Shape::EmergencyKit(r) => point_in_rect(p, r.x, r.y, r.width, r.height),
        _ => false,
    });
    if let Some(el) = rect_hit {
        return Some(el.id);
    }

    let polygon_hit = elements.iter().rev().find(|el| match &el.shape {
        Shape::Machine(poly) | Shape::Closet(poly) => point_in_polygon(p, &poly.points),
        _ => false,
    });
    if let Some(el) = polygon_hit {
        return Some(el.id);
    }

    let tol = store.config().snap_tolerance;
    let route_hit = elements.iter().rev().find(|el| match &el.shape {
        Shape::Route(line) | Shape::EmergencyRoute(line) => {
            line.points.windows(2).any(|seg| point_on_segment(p, seg[0], seg[1], tol))
        }
        _ => false,
    });
    if let Some(el) = route_hit {
        return Some(el.id);
    }

    // Each wall is judged against its own band; the nearest qualifying one wins.
    let mut wall_hit: Option<(&Element, f64, f64)> = None;
    for el in elements.iter().rev() {
        let Some(wall) = el.as_wall() else {
            continue;
        };
        let proj = project_onto_segment(p, wall.start(), wall.end());
        let Some(dist) = line_distance(p, wall.start(), wall.end()) else {
            continue;
        };
        if !proj.on_segment || dist >= wall.thickness / 2.0 + WALL_HIT_SLOP {
            continue;
        }
        if wall_hit.is_none_or(|(_, best, _)| dist < best) {
            wall_hit = Some((el, dist, proj.t * wall.length()));
        }
    }
    if let Some((wall, _, along)) = wall_hit {
        let child = store
            .openings_on(wall.id)
            .find(|(_, o)| along >= o.distance_along_wall && along <= o.end());
        return Some(child.map_or(wall.id, |(child, _)| child.id));
    }

    debug!(x = p.x, y = p.y, "no element at point");
    None
}

/// The wall whose line passes closest to `p`, strictly within `tolerance`,
/// considering only walls that `p` projects onto.
#[must_use]
pub fn find_wall_near_point(store: &PlanStore, p: Point, tolerance: f64) -> Option<WallHit> {
    let mut best: Option<WallHit> = None;
    let mut min = tolerance;
    for el in store.elements() {
        let Some(wall) = el.as_wall() else {
            continue;
        };
        let (a, b) = (wall.start(), wall.end());
        let Some(dist) = line_distance(p, a, b) else {
            continue;
        };
        if dist < min && project_onto_segment(p, a, b).on_segment {
            min = dist;
            best = Some(WallHit { wall_id: el.id, distance: dist });
        }
    }
    best
}

/// Whether `p` lies within `tolerance` of any door's gap segment. Emergency
/// exits count as doors.
#[must_use]
pub fn is_point_near_door(store: &PlanStore, p: Point, tolerance: f64) -> bool {
    store.elements().iter().any(|el| match &el.shape {
        Shape::Door(opening) | Shape::EmergencyDoor(opening) => store
            .resolve_opening(opening)
            .is_some_and(|(a, b)| point_on_segment(p, a, b, tolerance)),
        _ => false,
    })
}

/// Whether placing `[start, start + length)` on `wall_id` would intersect a
/// sibling other than `exclude_id`.
#[must_use]
pub fn check_wall_child_overlap(
    store: &PlanStore,
    wall_id: ElementId,
    exclude_id: Option<ElementId>,
    start: f64,
    length: f64,
) -> bool {
    store.opening_overlaps(wall_id, exclude_id, start, length)
}

/// Resize handles for `element`, or `None` for kinds without handles (routes)
/// and openings whose wall is missing.
#[must_use]
pub fn resize_handles(store: &PlanStore, element: &Element) -> Option<Vec<Handle>> {
    match &element.shape {
        Shape::Machine(poly) | Shape::Closet(poly) => Some(
            poly.points
                .iter()
                .enumerate()
                .map(|(i, &pos)| Handle { kind: HandleKind::Vertex(i), pos })
                .collect(),
        ),
        Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening) => {
            let wall = store.wall(opening.wall_id)?;
            let (start, end) = resolve_wall_child_segment(wall, opening);
            Some(vec![
                Handle { kind: HandleKind::GapStart, pos: start },
                Handle { kind: HandleKind::GapEnd, pos: end },
            ])
        }
        Shape::Gear(r) | Shape::EmergencyKit(r) => {
            let (l, t, rt, b) = (r.x, r.y, r.x + r.width, r.y + r.height);
            let (cx, cy) = (r.x + r.width / 2.0, r.y + r.height / 2.0);
            let handles = [
                (ResizeAnchor::Nw, l, t),
                (ResizeAnchor::Ne, rt, t),
                (ResizeAnchor::Sw, l, b),
                (ResizeAnchor::Se, rt, b),
                (ResizeAnchor::N, cx, t),
                (ResizeAnchor::S, cx, b),
                (ResizeAnchor::W, l, cy),
                (ResizeAnchor::E, rt, cy),
            ];
            Some(
                handles
                    .into_iter()
                    .map(|(anchor, x, y)| Handle { kind: HandleKind::Rect(anchor), pos: Point::new(x, y) })
                    .collect(),
            )
        }
        Shape::Wall(wall) => Some(vec![
            Handle { kind: HandleKind::WallEnd(WallEnd::P1), pos: wall.start() },
            Handle { kind: HandleKind::WallEnd(WallEnd::P2), pos: wall.end() },
        ]),
        Shape::Route(_) | Shape::EmergencyRoute(_) => None,
    }
}

/// The first handle of `element` whose square hit box of half-size
/// `tolerance` contains `p`.
#[must_use]
pub fn find_handle_at(store: &PlanStore, p: Point, element: &Element, tolerance: f64) -> Option<Handle> {
    resize_handles(store, element)?
        .into_iter()
        .find(|h| (p.x - h.pos.x).abs() <= tolerance && (p.y - h.pos.y).abs() <= tolerance)
}

/// Offset along `wall_id` of the projection of `p`, with whether it lands
/// within the segment span.
#[must_use]
pub fn offset_along_wall(store: &PlanStore, wall_id: ElementId, p: Point) -> Option<(f64, bool)> {
    let wall = store.wall(wall_id)?;
    let proj = project_onto_segment(p, wall.start(), wall.end());
    Some((distance(wall.start(), proj.point), proj.on_segment))
}
