//! Flattened element records for the per-element endpoint.
//!
//! `POST /element` takes one flat record per element instead of the nested
//! plan format: an `element_type`, an origin, and either a size (`width` /
//! `height`) or an end point (`x2` / `y2`). Walls, openings and routes travel
//! as lines; polygons travel as their bounding box. The record is lossy; the
//! full geometry is persisted by the whole-plan save.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use planner::doc::{Element, ElementId, PlanStore, Shape};
use planner::geom::Point;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRecord {
    /// Present when the element already exists on the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub element_type: String,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    pub fill: String,
    pub stroke: String,
}

impl ElementRecord {
    /// Flatten `element`. Openings are resolved against their wall in
    /// `store`; `None` if the wall is gone or a shape has no points.
    #[must_use]
    pub fn from_element(store: &PlanStore, element: &Element) -> Option<Self> {
        let color = element.display_color().to_owned();
        let kind = element.kind().as_str().to_owned();
        let line = |a: Point, b: Point| Self {
            id: None,
            element_type: kind.clone(),
            x: a.x,
            y: a.y,
            width: None,
            height: None,
            x2: Some(b.x),
            y2: Some(b.y),
            fill: "transparent".to_owned(),
            stroke: color.clone(),
        };
        let boxed = |x: f64, y: f64, w: f64, h: f64| Self {
            id: None,
            element_type: kind.clone(),
            x,
            y,
            width: Some(w),
            height: Some(h),
            x2: None,
            y2: None,
            fill: color.clone(),
            stroke: "black".to_owned(),
        };

        match &element.shape {
            Shape::Wall(wall) => Some(line(wall.start(), wall.end())),
            Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening) => {
                store.resolve_opening(opening).map(|(a, b)| line(a, b))
            }
            Shape::Route(polyline) | Shape::EmergencyRoute(polyline) => {
                Some(line(*polyline.points.first()?, *polyline.points.last()?))
            }
            Shape::Machine(poly) | Shape::Closet(poly) => {
                let (x, y, w, h) = bounds(&poly.points)?;
                Some(boxed(x, y, w, h))
            }
            Shape::Gear(r) | Shape::EmergencyKit(r) => Some(boxed(r.x, r.y, r.width, r.height)),
        }
    }

    /// Mark this record as an update of an existing backend element.
    #[must_use]
    pub fn with_id(mut self, id: ElementId) -> Self {
        self.id = Some(id);
        self
    }
}

fn bounds(points: &[Point]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in points {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    Some((min.x, min.y, max.x - min.x, max.y - min.y))
}
