//! Document model: floor-plan elements, their properties, and the in-memory store.
//!
//! This module defines what is on the plan (`Element`, `Shape`, `ElementKind`),
//! typed access to the free-form `properties` bag (`Properties`), the wire
//! snapshot exchanged with the server (`PlanSnapshot`), and the runtime store
//! that owns every live element (`PlanStore`).
//!
//! Doors and windows never store absolute coordinates. They carry an offset
//! and length along their parent wall, and [`resolve_wall_child_segment`]
//! derives their position on every read, so moving a wall carries its
//! openings along with no update step.
//!
//! All mutation goes through `PlanStore`, which validates the plan invariants
//! (unique ids, openings on existing walls, no overlapping openings, openings
//! within the wall, minimum sizes) and leaves the plan untouched on rejection.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::consts::OVERLAP_TOLERANCE;
use crate::error::EditError;
use crate::geom::{Point, distance, point_along_line, rect_from_corners};

/// Unique identifier for an element. Assigned monotonically, never reused.
pub type ElementId = u64;

/// The kind of an element; the `type` discriminant on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    /// Straight wall segment with a thickness.
    Wall,
    /// Door opening attached to a wall.
    Door,
    /// Emergency exit door; a door drawn and reported as an exit.
    EmergencyDoor,
    /// Window opening attached to a wall.
    Window,
    /// Machine footprint polygon.
    Machine,
    /// Safety closet footprint polygon.
    Closet,
    /// Axis-aligned gear rectangle.
    Gear,
    /// Open polyline route.
    Route,
    /// Open polyline emergency route.
    EmergencyRoute,
    /// Emergency kit marker with a fixed footprint.
    EmergencyKit,
}

impl ElementKind {
    /// The wire name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Door => "door",
            Self::EmergencyDoor => "emergency-door",
            Self::Window => "window",
            Self::Machine => "machine",
            Self::Closet => "closet",
            Self::Gear => "gear",
            Self::Route => "route",
            Self::EmergencyRoute => "emergency-route",
            Self::EmergencyKit => "emergency-kit",
        }
    }

    /// Default presentation color for new elements of this kind.
    #[must_use]
    pub fn default_color(self) -> &'static str {
        match self {
            Self::Wall => "#333",
            Self::Door => "#8B4513",
            Self::EmergencyDoor => "#FF5722",
            Self::Window => "#6495ED",
            Self::Machine => "#708090",
            Self::Closet => "#228B22",
            Self::Gear => "#FFA500",
            Self::Route => "#FF0000",
            Self::EmergencyRoute => "#28A745",
            Self::EmergencyKit => "#D9534F",
        }
    }

    /// Whether this kind attaches to a wall (door, window).
    #[must_use]
    pub fn is_opening(self) -> bool {
        matches!(self, Self::Door | Self::EmergencyDoor | Self::Window)
    }

    /// Whether this kind is a closed polygon (machine, closet).
    #[must_use]
    pub fn is_polygon(self) -> bool {
        matches!(self, Self::Machine | Self::Closet)
    }

    /// Whether this kind is an axis-aligned rect (gear, emergency kit).
    #[must_use]
    pub fn is_rect(self) -> bool {
        matches!(self, Self::Gear | Self::EmergencyKit)
    }

    /// Whether this kind is an open polyline (route, emergency route).
    #[must_use]
    pub fn is_route(self) -> bool {
        matches!(self, Self::Route | Self::EmergencyRoute)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of its wall a door swings toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum SwingDirection {
    /// Drawn from the wall start toward its end (`+1`).
    #[default]
    Forward,
    /// Drawn from the wall end toward its start (`-1`).
    Backward,
}

impl SwingDirection {
    /// `+1.0` or `-1.0`.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

impl From<SwingDirection> for i8 {
    fn from(dir: SwingDirection) -> Self {
        match dir {
            SwingDirection::Forward => 1,
            SwingDirection::Backward => -1,
        }
    }
}

impl TryFrom<i8> for SwingDirection {
    type Error = String;

    fn try_from(raw: i8) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Backward),
            other => Err(format!("swingDirection must be 1 or -1, got {other}")),
        }
    }
}

/// Wall geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Drawn thickness in world units.
    pub thickness: f64,
}

impl Wall {
    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[must_use]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        distance(self.start(), self.end())
    }
}

/// A door or window: an interval along a parent wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opening {
    /// The wall this opening is cut into.
    pub wall_id: ElementId,
    /// Arc-length offset of the opening start from the wall start.
    pub distance_along_wall: f64,
    /// Length of the opening along the wall.
    pub length: f64,
    /// Swing side, recorded from the drag direction.
    #[serde(default)]
    pub swing_direction: SwingDirection,
}

impl Opening {
    /// Arc-length offset of the opening end.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.distance_along_wall + self.length
    }
}

/// Closed polygon, implicitly closed from last point to first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Open polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
}

/// Per-kind geometry, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Shape {
    Wall(Wall),
    Door(Opening),
    EmergencyDoor(Opening),
    Window(Opening),
    Machine(Polygon),
    Closet(Polygon),
    Gear(RectShape),
    Route(Polyline),
    EmergencyRoute(Polyline),
    EmergencyKit(RectShape),
}

impl Shape {
    /// The discriminant of this shape.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Wall(_) => ElementKind::Wall,
            Self::Door(_) => ElementKind::Door,
            Self::EmergencyDoor(_) => ElementKind::EmergencyDoor,
            Self::Window(_) => ElementKind::Window,
            Self::Machine(_) => ElementKind::Machine,
            Self::Closet(_) => ElementKind::Closet,
            Self::Gear(_) => ElementKind::Gear,
            Self::Route(_) => ElementKind::Route,
            Self::EmergencyRoute(_) => ElementKind::EmergencyRoute,
            Self::EmergencyKit(_) => ElementKind::EmergencyKit,
        }
    }
}

/// An element as stored in the plan and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier for this element.
    pub id: ElementId,
    /// Presentation color as a CSS color string. Empty means the kind default.
    #[serde(default)]
    pub color: String,
    /// Free-form metadata (name, hazard level, documents, ...).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub properties: serde_json::Value,
    /// Kind-specific geometry, flattened alongside the common fields.
    #[serde(flatten)]
    pub shape: Shape,
}

impl Element {
    fn with_shape(id: ElementId, shape: Shape) -> Self {
        let kind = shape.kind();
        Self {
            id,
            color: kind.default_color().to_owned(),
            properties: default_properties(kind),
            shape,
        }
    }

    /// A wall from `p1` to `p2`.
    #[must_use]
    pub fn wall(id: ElementId, p1: Point, p2: Point, thickness: f64) -> Self {
        Self::with_shape(id, Shape::Wall(Wall { x1: p1.x, y1: p1.y, x2: p2.x, y2: p2.y, thickness }))
    }

    /// A machine or closet polygon expanded from a rectangle drag, with its
    /// four corners ordered clockwise from the top-left.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::WrongKind`] for kinds other than machine/closet.
    pub fn polygon_from_rect(id: ElementId, kind: ElementKind, a: Point, b: Point) -> Result<Self, EditError> {
        let (x, y, w, h) = rect_from_corners(a, b);
        let polygon = Polygon {
            points: vec![Point::new(x, y), Point::new(x + w, y), Point::new(x + w, y + h), Point::new(x, y + h)],
        };
        let shape = match kind {
            ElementKind::Machine => Shape::Machine(polygon),
            ElementKind::Closet => Shape::Closet(polygon),
            other => return Err(EditError::WrongKind(other)),
        };
        Ok(Self::with_shape(id, shape))
    }

    /// A gear or emergency kit rect spanning two opposite corners.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::WrongKind`] for kinds other than gear/emergency kit.
    pub fn rect(id: ElementId, kind: ElementKind, a: Point, b: Point) -> Result<Self, EditError> {
        let (x, y, width, height) = rect_from_corners(a, b);
        let rect = RectShape { x, y, width, height };
        let shape = match kind {
            ElementKind::Gear => Shape::Gear(rect),
            ElementKind::EmergencyKit => Shape::EmergencyKit(rect),
            other => return Err(EditError::WrongKind(other)),
        };
        Ok(Self::with_shape(id, shape))
    }

    /// An emergency kit of fixed footprint centered on `center`.
    #[must_use]
    pub fn kit(id: ElementId, center: Point, size: f64) -> Self {
        let half = size / 2.0;
        Self::with_shape(
            id,
            Shape::EmergencyKit(RectShape { x: center.x - half, y: center.y - half, width: size, height: size }),
        )
    }

    /// A door or window on `wall_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::WrongKind`] for kinds that are not openings.
    pub fn wall_child(
        id: ElementId,
        kind: ElementKind,
        wall_id: ElementId,
        start: f64,
        length: f64,
        swing_direction: SwingDirection,
    ) -> Result<Self, EditError> {
        let opening = Opening { wall_id, distance_along_wall: start, length, swing_direction };
        let shape = match kind {
            ElementKind::Door => Shape::Door(opening),
            ElementKind::EmergencyDoor => Shape::EmergencyDoor(opening),
            ElementKind::Window => Shape::Window(opening),
            other => return Err(EditError::WrongKind(other)),
        };
        Ok(Self::with_shape(id, shape))
    }

    /// A route or emergency route through `points`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::WrongKind`] for non-route kinds and
    /// [`EditError::TooFewPoints`] for fewer than two points.
    pub fn route(id: ElementId, kind: ElementKind, points: Vec<Point>) -> Result<Self, EditError> {
        if points.len() < 2 {
            return Err(EditError::TooFewPoints { kind, min: 2, got: points.len() });
        }
        let polyline = Polyline { points };
        let shape = match kind {
            ElementKind::Route => Shape::Route(polyline),
            ElementKind::EmergencyRoute => Shape::EmergencyRoute(polyline),
            other => return Err(EditError::WrongKind(other)),
        };
        Ok(Self::with_shape(id, shape))
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.shape.kind()
    }

    /// The element color, falling back to the kind default when unset.
    #[must_use]
    pub fn display_color(&self) -> &str {
        if self.color.is_empty() {
            self.kind().default_color()
        } else {
            &self.color
        }
    }

    /// Typed access to the properties bag.
    #[must_use]
    pub fn properties(&self) -> Properties<'_> {
        Properties::new(&self.properties)
    }

    #[must_use]
    pub fn as_wall(&self) -> Option<&Wall> {
        match &self.shape {
            Shape::Wall(wall) => Some(wall),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_opening(&self) -> Option<&Opening> {
        match &self.shape {
            Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening) => Some(opening),
            _ => None,
        }
    }

    /// Polygon or polyline vertices; empty for other kinds.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        match &self.shape {
            Shape::Machine(p) | Shape::Closet(p) => &p.points,
            Shape::Route(l) | Shape::EmergencyRoute(l) => &l.points,
            _ => &[],
        }
    }
}

fn default_properties(kind: ElementKind) -> serde_json::Value {
    match kind {
        ElementKind::Machine => serde_json::json!({
            "name": "Machine",
            "description": "Equipment description",
            "hazardLevel": 1,
        }),
        ElementKind::Closet => serde_json::json!({
            "contentType": "chemical",
            "description": "Hazardous materials storage",
        }),
        _ => serde_json::Value::Null,
    }
}

/// Absolute endpoints of an opening, derived from its wall's current position.
#[must_use]
pub fn resolve_wall_child_segment(wall: &Wall, opening: &Opening) -> (Point, Point) {
    let a = wall.start();
    let b = wall.end();
    (point_along_line(a, b, opening.distance_along_wall), point_along_line(a, b, opening.end()))
}

/// Typed access to common fields of an element's `properties` bag.
pub struct Properties<'a> {
    value: &'a serde_json::Value,
}

impl<'a> Properties<'a> {
    /// Wrap a reference to a `properties` JSON value for typed access.
    #[must_use]
    pub fn new(value: &'a serde_json::Value) -> Self {
        Self { value }
    }

    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.value.get(key).and_then(serde_json::Value::as_str)
    }

    /// Display name. Empty string when absent.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.str_field("name").unwrap_or("")
    }

    /// Free-text description. Empty string when absent.
    #[must_use]
    pub fn description(&self) -> &'a str {
        self.str_field("description").unwrap_or("")
    }

    /// Machine hazard level (1-5), if recorded.
    #[must_use]
    pub fn hazard_level(&self) -> Option<i64> {
        self.value.get("hazardLevel").and_then(serde_json::Value::as_i64)
    }

    /// Closet content category (chemical, flammable, ...), if recorded.
    #[must_use]
    pub fn content_type(&self) -> Option<&'a str> {
        self.str_field("contentType")
    }

    /// Names of attached documents. Empty when absent.
    #[must_use]
    pub fn documents(&self) -> Vec<&'a str> {
        self.value
            .get("documents")
            .and_then(serde_json::Value::as_array)
            .map(|docs| docs.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// A whole plan as exchanged with the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    /// Every element in draw order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Optional editor configuration overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// Outcome of loading a snapshot: how many elements were kept and which were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of elements now in the store.
    pub loaded: usize,
    /// Elements that violated an invariant and were dropped.
    pub rejected: Vec<(ElementId, EditError)>,
}

/// In-memory store of plan elements.
///
/// Elements are kept in draw order (first drawn first); hit-testing walks the
/// list in reverse so later elements win.
pub struct PlanStore {
    elements: Vec<Element>,
    next_id: ElementId,
    config: EditorConfig,
}

impl PlanStore {
    /// Create an empty store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Create an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: EditorConfig) -> Self {
        Self { elements: Vec::new(), next_id: 1, config }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EditorConfig) {
        self.config = config;
    }

    /// The id the next created element will receive.
    #[must_use]
    pub fn next_id(&self) -> ElementId {
        self.next_id
    }

    /// All elements in draw order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    fn position(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|el| el.id == id)
    }

    /// Wall geometry by id.
    #[must_use]
    pub fn wall(&self, id: ElementId) -> Option<&Wall> {
        self.get(id).and_then(Element::as_wall)
    }

    /// Every door and window attached to `wall_id`.
    pub fn openings_on(&self, wall_id: ElementId) -> impl Iterator<Item = (&Element, &Opening)> {
        self.elements
            .iter()
            .filter_map(|el| el.as_opening().map(|o| (el, o)))
            .filter(move |(_, o)| o.wall_id == wall_id)
    }

    /// Absolute endpoints of an opening, or `None` if its wall is gone.
    #[must_use]
    pub fn resolve_opening(&self, opening: &Opening) -> Option<(Point, Point)> {
        self.wall(opening.wall_id)
            .map(|wall| resolve_wall_child_segment(wall, opening))
    }

    /// Number of elements in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the store holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether `[start, start + length)` on `wall_id` intersects any opening
    /// other than `exclude`. Abutting intervals within the overlap tolerance
    /// do not count.
    #[must_use]
    pub fn opening_overlaps(&self, wall_id: ElementId, exclude: Option<ElementId>, start: f64, length: f64) -> bool {
        let end = start + length;
        self.openings_on(wall_id)
            .filter(|(el, _)| Some(el.id) != exclude)
            .any(|(_, o)| !(end <= o.distance_along_wall + OVERLAP_TOLERANCE || start >= o.end() - OVERLAP_TOLERANCE))
    }

    /// Create a new element with the next id.
    ///
    /// `build` receives the id to use. The id is consumed only if the element
    /// passes validation.
    ///
    /// # Errors
    ///
    /// Propagates the builder's error or the first violated invariant.
    pub fn add<F>(&mut self, build: F) -> Result<&Element, EditError>
    where
        F: FnOnce(ElementId) -> Result<Element, EditError>,
    {
        let element = build(self.next_id)?;
        if self.position(element.id).is_some() {
            return Err(EditError::DuplicateId(element.id));
        }
        let element = self.validate(element)?;
        info!(id = element.id, kind = %element.kind(), "element created");
        self.next_id = self.next_id.max(element.id + 1);
        self.elements.push(element);
        Ok(&self.elements[self.elements.len() - 1])
    }

    /// Replace an existing element with a proposed new version of itself.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`] if `element.id` is unknown,
    /// [`EditError::WrongKind`] if the kind would change, or the first
    /// violated invariant. The stored element is unchanged on error.
    pub fn replace(&mut self, element: Element) -> Result<(), EditError> {
        let idx = self.position(element.id).ok_or(EditError::NotFound(element.id))?;
        if self.elements[idx].kind() != element.kind() {
            return Err(EditError::WrongKind(element.kind()));
        }
        let element = self.validate(element)?;
        self.elements[idx] = element;
        Ok(())
    }

    /// Remove an element. Removing a wall also removes its doors and windows.
    ///
    /// Returns the removed elements, the target first.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`] if `id` is unknown.
    pub fn remove(&mut self, id: ElementId) -> Result<Vec<Element>, EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        let target = self.elements.remove(idx);
        let mut removed = vec![target];
        if removed[0].kind() == ElementKind::Wall {
            let (children, kept): (Vec<Element>, Vec<Element>) = std::mem::take(&mut self.elements)
                .into_iter()
                .partition(|el| el.as_opening().is_some_and(|o| o.wall_id == id));
            self.elements = kept;
            removed.extend(children);
        }
        info!(id, removed = removed.len(), "element deleted");
        Ok(removed)
    }

    /// Merge `patch` into an element's properties. Null values delete keys.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`] if `id` is unknown or
    /// [`EditError::WrongKind`] if `patch` is not a JSON object.
    pub fn merge_properties(&mut self, id: ElementId, patch: &serde_json::Value) -> Result<(), EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        let obj = &mut self.elements[idx];
        let Some(incoming) = patch.as_object() else {
            return Err(EditError::WrongKind(obj.kind()));
        };
        if !obj.properties.is_object() {
            obj.properties = serde_json::json!({});
        }
        if let Some(existing) = obj.properties.as_object_mut() {
            for (k, v) in incoming {
                if v.is_null() {
                    existing.remove(k);
                } else {
                    existing.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    /// Append a point to the end of a route.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`] or [`EditError::WrongKind`] for non-routes.
    pub fn append_route_point(&mut self, id: ElementId, point: Point) -> Result<(), EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        match &mut self.elements[idx].shape {
            Shape::Route(line) | Shape::EmergencyRoute(line) => {
                line.points.push(point);
                Ok(())
            }
            other => Err(EditError::WrongKind(other.kind())),
        }
    }

    /// Remove the route point at `index`, keeping at least two points.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`], [`EditError::WrongKind`] for
    /// non-routes, or [`EditError::TooFewPoints`] if the route would drop
    /// below two points or `index` is out of bounds.
    pub fn remove_route_point(&mut self, id: ElementId, index: usize) -> Result<(), EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        let shape = &mut self.elements[idx].shape;
        let kind = shape.kind();
        match shape {
            Shape::Route(line) | Shape::EmergencyRoute(line) => {
                let got = line.points.len();
                if got <= 2 || index >= got {
                    return Err(EditError::TooFewPoints { kind, min: 2, got: got.saturating_sub(1) });
                }
                line.points.remove(index);
                Ok(())
            }
            _ => Err(EditError::WrongKind(kind)),
        }
    }

    /// Replace all elements with a snapshot, dropping those that violate an
    /// invariant. Applies the snapshot's config when present.
    pub fn load(&mut self, snapshot: PlanSnapshot) -> LoadReport {
        if let Some(raw) = &snapshot.config {
            self.config = EditorConfig::from_value(raw);
        }
        let max_id = snapshot
            .elements
            .iter()
            .map(|el| el.id)
            .filter(|&id| id < ElementId::MAX)
            .max()
            .unwrap_or(0);
        self.elements.clear();

        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let (openings, others): (Vec<Element>, Vec<Element>) =
            snapshot.elements.into_iter().partition(|el| el.kind().is_opening());

        // Walls must be in place before their openings can be validated.
        for element in others.into_iter().chain(openings) {
            let id = element.id;
            let result = if seen.insert(id) {
                self.validate(element)
            } else {
                Err(EditError::DuplicateId(id))
            };
            match result {
                Ok(element) => self.elements.push(element),
                Err(e) => {
                    warn!(id, error = %e, "dropping invalid element from snapshot");
                    report.rejected.push((id, e));
                }
            }
        }

        self.next_id = self.next_id.max(max_id + 1);
        report.loaded = self.elements.len();
        info!(loaded = report.loaded, rejected = report.rejected.len(), "plan loaded");
        report
    }

    /// Snapshot of the whole plan for saving.
    #[must_use]
    pub fn snapshot(&self) -> PlanSnapshot {
        PlanSnapshot { elements: self.elements.clone(), config: None }
    }

    /// Remove every element. Ids keep counting up.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Check an element against the plan invariants, clamping openings into
    /// their wall. Returns the (possibly clamped) element.
    fn validate(&self, mut element: Element) -> Result<Element, EditError> {
        let kind = element.kind();
        let id = element.id;
        if id == ElementId::MAX {
            return Err(EditError::ReservedId(id));
        }
        match &mut element.shape {
            Shape::Wall(wall) => {
                let len = wall.length();
                if len == 0.0 {
                    return Err(EditError::TooSmall);
                }
                for (child, opening) in self.openings_on(id) {
                    if opening.end() > len + OVERLAP_TOLERANCE {
                        return Err(EditError::OutOfRange { kind: child.kind(), id: child.id, wall_id: id });
                    }
                }
            }
            Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening) => {
                let wall = self.wall(opening.wall_id).ok_or(EditError::MissingWall(opening.wall_id))?;
                let wall_len = wall.length();
                let start = opening.distance_along_wall.clamp(0.0, wall_len);
                let end = opening.end().clamp(0.0, wall_len);
                let min = self.config.min_opening_length;
                if end - start < min {
                    return Err(EditError::TooShort { kind, min });
                }
                if self.opening_overlaps(opening.wall_id, Some(id), start, end - start) {
                    return Err(EditError::Overlap { kind, wall_id: opening.wall_id });
                }
                if start != opening.distance_along_wall || end != opening.end() {
                    debug!(id, start, end, "clamped opening into wall");
                }
                opening.distance_along_wall = start;
                opening.length = end - start;
            }
            Shape::Machine(p) | Shape::Closet(p) => {
                if p.points.len() < 3 {
                    return Err(EditError::TooFewPoints { kind, min: 3, got: p.points.len() });
                }
            }
            Shape::Route(l) | Shape::EmergencyRoute(l) => {
                if l.points.len() < 2 {
                    return Err(EditError::TooFewPoints { kind, min: 2, got: l.points.len() });
                }
            }
            Shape::Gear(_) | Shape::EmergencyKit(_) => {}
        }
        Ok(element)
    }
}

impl Default for PlanStore {
    fn default() -> Self {
        Self::new()
    }
}
