//! Move and resize of existing elements.
//!
//! Each operation computes a proposed new version of the element and hands it
//! to [`PlanStore::replace`], which re-validates the plan invariants. A
//! rejected edit leaves the element where it was.

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;

use tracing::debug;

use crate::consts::MIN_RECT_DIMENSION;
use crate::doc::{Element, ElementId, ElementKind, Opening, PlanStore, RectShape, Shape};
use crate::error::EditError;
use crate::geom::{Point, snap_point};
use crate::hit::{HandleKind, ResizeAnchor, WallEnd, check_wall_child_overlap, offset_along_wall};

/// Where the pointer grabbed an element, relative to the element's anchor.
///
/// Free shapes keep a 2D offset from their anchor point (first vertex, rect
/// corner or wall start). Doors and windows slide along their wall and keep
/// only the offset along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grab {
    Offset(Point),
    Along(f64),
}

fn anchor(shape: &Shape) -> Option<Point> {
    match shape {
        Shape::Wall(wall) => Some(wall.start()),
        Shape::Machine(poly) | Shape::Closet(poly) => poly.points.first().copied(),
        Shape::Route(line) | Shape::EmergencyRoute(line) => line.points.first().copied(),
        Shape::Gear(r) | Shape::EmergencyKit(r) => Some(Point::new(r.x, r.y)),
        Shape::Door(_) | Shape::EmergencyDoor(_) | Shape::Window(_) => None,
    }
}

/// Record where `cursor` grabbed element `id`.
///
/// # Errors
///
/// Returns [`EditError::NotFound`] for an unknown id, or
/// [`EditError::MissingWall`] for an opening whose wall is gone.
pub fn grab(store: &PlanStore, id: ElementId, cursor: Point) -> Result<Grab, EditError> {
    let element = store.get(id).ok_or(EditError::NotFound(id))?;
    if let Some(opening) = element.as_opening() {
        let (along, _) = offset_along_wall(store, opening.wall_id, cursor).ok_or(EditError::MissingWall(opening.wall_id))?;
        return Ok(Grab::Along(along - opening.distance_along_wall));
    }
    let origin = anchor(&element.shape).ok_or(EditError::WrongKind(element.kind()))?;
    Ok(Grab::Offset(cursor.sub(origin)))
}

/// Move element `id` so that its grab point follows `cursor`.
///
/// Polygons and routes translate every point by the first point's
/// displacement, rects move their corner, and walls move both endpoints
/// (their openings follow because they are stored relative to the wall).
/// Doors and windows slide along their wall, clamped to its length.
///
/// Returns whether the element changed.
///
/// # Errors
///
/// Returns [`EditError::Overlap`] if a sliding opening would hit a sibling,
/// or any error from [`PlanStore::replace`].
pub fn move_element(store: &mut PlanStore, id: ElementId, cursor: Point, grab: Grab) -> Result<bool, EditError> {
    let mut next = store.get(id).ok_or(EditError::NotFound(id))?.clone();
    let kind = next.kind();
    match (&mut next.shape, grab) {
        (Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening), Grab::Along(offset)) => {
            slide_opening(store, id, kind, opening, cursor, offset)?;
        }
        (shape, Grab::Offset(offset)) => {
            let origin = anchor(shape).ok_or(EditError::WrongKind(kind))?;
            let target = cursor.sub(offset);
            translate(shape, target.x - origin.x, target.y - origin.y);
        }
        (_, Grab::Along(_)) => return Err(EditError::WrongKind(kind)),
    }
    commit(store, next)
}

fn slide_opening(
    store: &PlanStore,
    id: ElementId,
    kind: ElementKind,
    opening: &mut Opening,
    cursor: Point,
    offset: f64,
) -> Result<(), EditError> {
    let wall = store.wall(opening.wall_id).ok_or(EditError::MissingWall(opening.wall_id))?;
    let max_start = (wall.length() - opening.length).max(0.0);
    let (along, _) = offset_along_wall(store, opening.wall_id, cursor).ok_or(EditError::MissingWall(opening.wall_id))?;
    let target = (along - offset).clamp(0.0, max_start);
    if check_wall_child_overlap(store, opening.wall_id, Some(id), target, opening.length) {
        return Err(EditError::Overlap { kind, wall_id: opening.wall_id });
    }
    opening.distance_along_wall = target;
    Ok(())
}

fn translate(shape: &mut Shape, dx: f64, dy: f64) {
    match shape {
        Shape::Wall(wall) => {
            wall.x1 += dx;
            wall.y1 += dy;
            wall.x2 += dx;
            wall.y2 += dy;
        }
        Shape::Machine(poly) | Shape::Closet(poly) => {
            for p in &mut poly.points {
                *p = p.offset(dx, dy);
            }
        }
        Shape::Route(line) | Shape::EmergencyRoute(line) => {
            for p in &mut line.points {
                *p = p.offset(dx, dy);
            }
        }
        Shape::Gear(r) | Shape::EmergencyKit(r) => {
            r.x += dx;
            r.y += dy;
        }
        Shape::Door(_) | Shape::EmergencyDoor(_) | Shape::Window(_) => {}
    }
}

/// Drag resize handle `handle` of element `id` to `cursor`.
///
/// Returns whether the element changed.
///
/// # Errors
///
/// Returns [`EditError::WrongKind`] if the handle does not belong to this
/// kind of element, [`EditError::TooShort`] or [`EditError::Overlap`] for a
/// rejected opening resize, or any error from [`PlanStore::replace`].
pub fn resize_element(store: &mut PlanStore, id: ElementId, handle: HandleKind, cursor: Point) -> Result<bool, EditError> {
    let mut next = store.get(id).ok_or(EditError::NotFound(id))?.clone();
    let kind = next.kind();
    match (&mut next.shape, handle) {
        (Shape::Machine(poly) | Shape::Closet(poly), HandleKind::Vertex(i)) => {
            let vertex = poly.points.get_mut(i).ok_or(EditError::WrongKind(kind))?;
            *vertex = cursor;
        }
        (
            Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening),
            HandleKind::GapStart | HandleKind::GapEnd,
        ) => {
            resize_gap(store, id, kind, opening, handle == HandleKind::GapStart, cursor)?;
        }
        (Shape::Gear(rect) | Shape::EmergencyKit(rect), HandleKind::Rect(anchor)) => {
            resize_rect(rect, anchor, cursor);
        }
        (Shape::Wall(wall), HandleKind::WallEnd(end)) => {
            let p = snap_point(cursor, store.config().grid_size);
            match end {
                WallEnd::P1 => (wall.x1, wall.y1) = (p.x, p.y),
                WallEnd::P2 => (wall.x2, wall.y2) = (p.x, p.y),
            }
        }
        _ => return Err(EditError::WrongKind(kind)),
    }
    commit(store, next)
}

/// Move one end of an opening to the cursor's offset along its wall.
///
/// A gap shorter than the minimum is lengthened by pushing the opposite
/// bound, then clamped to the wall. The resize is rejected if the result is
/// still too short or would overlap a sibling.
fn resize_gap(
    store: &PlanStore,
    id: ElementId,
    kind: ElementKind,
    opening: &mut Opening,
    moving_start: bool,
    cursor: Point,
) -> Result<(), EditError> {
    let wall = store.wall(opening.wall_id).ok_or(EditError::MissingWall(opening.wall_id))?;
    let wall_len = wall.length();
    let min = store.config().min_opening_length;
    let (along, _) = offset_along_wall(store, opening.wall_id, cursor).ok_or(EditError::MissingWall(opening.wall_id))?;
    let target = along.clamp(0.0, wall_len);

    let (mut start, mut end) = (opening.distance_along_wall, opening.end());
    if moving_start {
        start = target;
    } else {
        end = target;
    }
    let (mut lo, mut hi) = (start.min(end), start.max(end));
    if hi - lo < min {
        if moving_start {
            hi = lo + min;
        } else {
            lo = hi - min;
        }
    }
    lo = lo.max(0.0);
    hi = hi.min(wall_len);

    if hi - lo < min {
        return Err(EditError::TooShort { kind, min });
    }
    if check_wall_child_overlap(store, opening.wall_id, Some(id), lo, hi - lo) {
        return Err(EditError::Overlap { kind, wall_id: opening.wall_id });
    }
    opening.distance_along_wall = lo;
    opening.length = hi - lo;
    Ok(())
}

/// Move the rect edges named by `anchor` to the cursor, keeping the opposite
/// edges fixed and every side at least the minimum dimension.
fn resize_rect(rect: &mut RectShape, anchor: ResizeAnchor, cursor: Point) {
    let (mut left, mut top) = (rect.x, rect.y);
    let (mut right, mut bottom) = (rect.x + rect.width, rect.y + rect.height);
    if anchor.moves_left() {
        left = cursor.x.min(right - MIN_RECT_DIMENSION);
    }
    if anchor.moves_right() {
        right = cursor.x.max(left + MIN_RECT_DIMENSION);
    }
    if anchor.moves_top() {
        top = cursor.y.min(bottom - MIN_RECT_DIMENSION);
    }
    if anchor.moves_bottom() {
        bottom = cursor.y.max(top + MIN_RECT_DIMENSION);
    }
    *rect = RectShape { x: left, y: top, width: right - left, height: bottom - top };
}

fn commit(store: &mut PlanStore, next: Element) -> Result<bool, EditError> {
    if store.get(next.id) == Some(&next) {
        return Ok(false);
    }
    let id = next.id;
    store.replace(next)?;
    debug!(id, "element edited");
    Ok(true)
}
