//! Rendering: draws the floor plan to a 2D canvas context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the engine state (store, camera, selection, gesture preview) and
//! produces pixels. It never mutates anything.
//!
//! Drawing happens in world units under the camera transform, so line widths
//! and font sizes that should look constant on screen are divided by the zoom.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::{FRAC_PI_2, PI};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::camera::Camera;
use crate::doc::{Element, ElementKind, Opening, PlanStore, Shape, SwingDirection, Wall};
use crate::engine::{EngineCore, Preview};
use crate::geom::{Point, distance, point_along_line, rect_from_corners};
use crate::hit::resize_handles;

/// Arrowhead length in world units.
const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

/// Grid lines closer than this on screen are not drawn.
const MIN_GRID_SPACING_PX: f64 = 8.0;

/// Dash segment length in screen pixels for selection and previews.
const DASH_PX: f64 = 4.0;

const LABEL_FONT_PX: f64 = 11.0;
const SELECTION_COLOR: &str = "#1E90FF";
const GRID_COLOR: &str = "#e6e6e6";
const ROUTE_WIDTH: f64 = 3.0;

/// Format a world-space length as meters for dimension labels.
#[must_use]
pub fn format_length(world: f64, units_per_meter: f64) -> String {
    format!("{:.2} m", world / units_per_meter)
}

/// Arrowhead triangle `[tip, left, right]` centered on the segment `a → b`,
/// pointing toward `b`. `None` for a zero-length segment.
#[must_use]
pub fn arrowhead(a: Point, b: Point, size: f64) -> Option<[Point; 3]> {
    if distance(a, b) == 0.0 {
        return None;
    }
    let angle = (b.y - a.y).atan2(b.x - a.x);
    let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let tip = Point::new(mid.x + size / 2.0 * angle.cos(), mid.y + size / 2.0 * angle.sin());
    let wing = |side: f64| {
        let a = angle + PI + side * ARROW_ANGLE;
        Point::new(tip.x + size * a.cos(), tip.y + size * a.sin())
    };
    Some([tip, wing(-1.0), wing(1.0)])
}

/// The solid stretches of a wall of length `len` once its openings, given
/// as `(start, end)` offsets, are cut out. Gaps may arrive in any order.
#[must_use]
pub fn solid_spans(len: f64, gaps: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut gaps = gaps.to_vec();
    gaps.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut spans = Vec::new();
    let mut cursor = 0.0_f64;
    for (start, end) in gaps {
        let start = start.clamp(0.0, len);
        if start > cursor {
            spans.push((cursor, start));
        }
        cursor = cursor.max(end.clamp(0.0, len));
    }
    if cursor < len {
        spans.push((cursor, len));
    }
    spans
}

/// Draw the full scene: grid, elements, selection UI and the gesture preview.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &EngineCore) -> Result<(), JsValue> {
    let camera = core.camera;
    let (w, h) = (core.viewport_width, core.viewport_height);

    // Layer 1: clear, then switch to world space.
    ctx.set_transform(core.dpr, 0.0, 0.0, core.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_fill_style_str("#fff");
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.translate(camera.pan_x, camera.pan_y)?;
    ctx.scale(camera.zoom, camera.zoom)?;

    draw_grid(ctx, &camera, w, h, core.store.config().grid_size);

    // Layer 2: elements in draw order, openings on top of their walls.
    let store = &core.store;
    for el in store.elements() {
        if !el.kind().is_opening() {
            draw_element(ctx, store, el, camera.zoom)?;
        }
    }
    for el in store.elements() {
        if let Some(opening) = el.as_opening() {
            draw_opening(ctx, store, el, opening)?;
        }
    }

    // Layer 3: selection UI.
    if let Some(el) = core.selection().and_then(|id| store.get(id)) {
        draw_selection(ctx, store, el, camera.zoom)?;
    }

    // Layer 4: the gesture in progress.
    if let Some(preview) = core.preview() {
        draw_preview(ctx, store, preview, camera.zoom)?;
    }

    Ok(())
}

fn draw_grid(ctx: &CanvasRenderingContext2d, camera: &Camera, w: f64, h: f64, grid: f64) {
    if grid * camera.zoom < MIN_GRID_SPACING_PX {
        return;
    }
    let top_left = camera.screen_to_world(Point::new(0.0, 0.0));
    let bottom_right = camera.screen_to_world(Point::new(w, h));

    ctx.save();
    ctx.set_stroke_style_str(GRID_COLOR);
    ctx.set_line_width(1.0 / camera.zoom);
    ctx.begin_path();
    let mut x = (top_left.x / grid).floor() * grid;
    while x <= bottom_right.x {
        ctx.move_to(x, top_left.y);
        ctx.line_to(x, bottom_right.y);
        x += grid;
    }
    let mut y = (top_left.y / grid).floor() * grid;
    while y <= bottom_right.y {
        ctx.move_to(top_left.x, y);
        ctx.line_to(bottom_right.x, y);
        y += grid;
    }
    ctx.stroke();
    ctx.restore();
}

// =============================================================
// Element dispatch
// =============================================================

fn draw_element(ctx: &CanvasRenderingContext2d, store: &PlanStore, el: &Element, zoom: f64) -> Result<(), JsValue> {
    let color = el.display_color();
    match &el.shape {
        Shape::Wall(wall) => draw_wall(ctx, store, el, wall, zoom),
        Shape::Machine(poly) | Shape::Closet(poly) => {
            trace_path(ctx, &poly.points, true);
            ctx.save();
            ctx.set_global_alpha(0.35);
            ctx.set_fill_style_str(color);
            ctx.fill();
            ctx.restore();
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(2.0 / zoom);
            ctx.stroke();
            let name = el.properties().name();
            if !name.is_empty() {
                draw_label(ctx, name, centroid(&poly.points), zoom, "#222")?;
            }
            Ok(())
        }
        Shape::Gear(r) => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(r.x, r.y, r.width, r.height);
            ctx.set_stroke_style_str("#333");
            ctx.set_line_width(1.0 / zoom);
            ctx.stroke_rect(r.x, r.y, r.width, r.height);
            Ok(())
        }
        Shape::EmergencyKit(r) => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(r.x, r.y, r.width, r.height);
            // White cross, a third of the footprint wide.
            let (bar_w, bar_h) = (r.width / 3.0, r.height / 3.0);
            ctx.set_fill_style_str("#fff");
            ctx.fill_rect(r.x + bar_w, r.y + bar_h / 3.0, bar_w, r.height - 2.0 * bar_h / 3.0);
            ctx.fill_rect(r.x + bar_w / 3.0, r.y + bar_h, r.width - 2.0 * bar_w / 3.0, bar_h);
            Ok(())
        }
        Shape::Route(line) | Shape::EmergencyRoute(line) => {
            draw_route(ctx, &line.points, color);
            Ok(())
        }
        Shape::Door(_) | Shape::EmergencyDoor(_) | Shape::Window(_) => Ok(()),
    }
}

fn draw_wall(
    ctx: &CanvasRenderingContext2d,
    store: &PlanStore,
    el: &Element,
    wall: &Wall,
    zoom: f64,
) -> Result<(), JsValue> {
    let (start, end) = (wall.start(), wall.end());
    let gaps: Vec<(f64, f64)> = store
        .openings_on(el.id)
        .map(|(_, opening)| (opening.distance_along_wall, opening.end()))
        .collect();

    ctx.save();
    ctx.set_stroke_style_str(el.display_color());
    ctx.set_line_width(wall.thickness);
    ctx.set_line_cap("butt");
    ctx.begin_path();
    for (a, b) in solid_spans(wall.length(), &gaps) {
        let p = point_along_line(start, end, a);
        let q = point_along_line(start, end, b);
        ctx.move_to(p.x, p.y);
        ctx.line_to(q.x, q.y);
    }
    ctx.stroke();
    ctx.restore();

    let label = format_length(wall.length(), store.config().units_per_meter);
    draw_dimension(ctx, start, end, wall.thickness, &label, zoom)
}

fn draw_opening(
    ctx: &CanvasRenderingContext2d,
    store: &PlanStore,
    el: &Element,
    opening: &Opening,
) -> Result<(), JsValue> {
    let Some(wall) = store.wall(opening.wall_id) else {
        return Ok(());
    };
    let Some((p1, p2)) = store.resolve_opening(opening) else {
        return Ok(());
    };
    match el.kind() {
        ElementKind::Door | ElementKind::EmergencyDoor => {
            draw_door(ctx, p1, p2, opening.swing_direction, el.display_color())
        }
        _ => draw_window(ctx, p1, p2, wall.thickness, el.display_color()),
    }
}

/// Door leaf hinged at `p1`, open 90° to the swing side, with its arc.
fn draw_door(
    ctx: &CanvasRenderingContext2d,
    p1: Point,
    p2: Point,
    swing: SwingDirection,
    color: &str,
) -> Result<(), JsValue> {
    let len = distance(p1, p2);
    let angle = (p2.y - p1.y).atan2(p2.x - p1.x);
    let open = angle + swing.sign() * FRAC_PI_2;
    let leaf = Point::new(p1.x + len * open.cos(), p1.y + len * open.sin());

    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(p1.x, p1.y);
    ctx.line_to(leaf.x, leaf.y);
    ctx.stroke();

    ctx.set_line_width(1.0);
    ctx.begin_path();
    ctx.arc_with_anticlockwise(p1.x, p1.y, len, angle, open, swing == SwingDirection::Backward)?;
    ctx.stroke();
    ctx.restore();
    Ok(())
}

/// Window glazing: a hatched band across the wall thickness.
fn draw_window(
    ctx: &CanvasRenderingContext2d,
    p1: Point,
    p2: Point,
    thickness: f64,
    color: &str,
) -> Result<(), JsValue> {
    let len = distance(p1, p2);
    let half = thickness / 2.0;
    let angle = (p2.y - p1.y).atan2(p2.x - p1.x);

    ctx.save();
    ctx.translate(p1.x, p1.y)?;
    ctx.rotate(angle)?;
    ctx.set_fill_style_str("#fff");
    ctx.fill_rect(0.0, -half, len, thickness);
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(0.0, -half, len, thickness);

    ctx.begin_path();
    let step = thickness.max(2.0);
    let mut x = 0.0;
    while x + thickness <= len {
        ctx.move_to(x, half);
        ctx.line_to(x + thickness, -half);
        x += step;
    }
    ctx.stroke();
    ctx.restore();
    Ok(())
}

fn draw_route(ctx: &CanvasRenderingContext2d, points: &[Point], color: &str) {
    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_fill_style_str(color);
    ctx.set_line_width(ROUTE_WIDTH);
    ctx.set_line_join("round");
    trace_path(ctx, points, false);
    ctx.stroke();
    for seg in points.windows(2) {
        if let Some(head) = arrowhead(seg[0], seg[1], ARROW_SIZE) {
            trace_path(ctx, &head, true);
            ctx.fill();
        }
    }
    ctx.restore();
}

// =============================================================
// Labels
// =============================================================

/// Length label placed beside the segment `a → b`, clear of its thickness.
fn draw_dimension(
    ctx: &CanvasRenderingContext2d,
    a: Point,
    b: Point,
    thickness: f64,
    text: &str,
    zoom: f64,
) -> Result<(), JsValue> {
    let len = distance(a, b);
    if len == 0.0 {
        return Ok(());
    }
    let (nx, ny) = (-(b.y - a.y) / len, (b.x - a.x) / len);
    let gap = thickness / 2.0 + LABEL_FONT_PX / zoom;
    let at = Point::new((a.x + b.x) / 2.0 - nx * gap, (a.y + b.y) / 2.0 - ny * gap);
    draw_label(ctx, text, at, zoom, "#555")
}

fn draw_label(ctx: &CanvasRenderingContext2d, text: &str, at: Point, zoom: f64, color: &str) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font(&format!("{}px sans-serif", LABEL_FONT_PX / zoom));
    ctx.fill_text(text, at.x, at.y)?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection(ctx: &CanvasRenderingContext2d, store: &PlanStore, el: &Element, zoom: f64) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.5 / zoom);
    set_dash(ctx, DASH_PX / zoom)?;

    match &el.shape {
        Shape::Wall(wall) => {
            trace_path(ctx, &[wall.start(), wall.end()], false);
            ctx.stroke();
        }
        Shape::Door(opening) | Shape::EmergencyDoor(opening) | Shape::Window(opening) => {
            if let Some((p1, p2)) = store.resolve_opening(opening) {
                trace_path(ctx, &[p1, p2], false);
                ctx.stroke();
                let label = format_length(opening.length, store.config().units_per_meter);
                let thickness = store.wall(opening.wall_id).map_or(0.0, |w| w.thickness);
                draw_dimension(ctx, p1, p2, thickness, &label, zoom)?;
            }
        }
        Shape::Machine(poly) | Shape::Closet(poly) => {
            trace_path(ctx, &poly.points, true);
            ctx.stroke();
        }
        Shape::Gear(r) | Shape::EmergencyKit(r) => ctx.stroke_rect(r.x, r.y, r.width, r.height),
        Shape::Route(line) | Shape::EmergencyRoute(line) => {
            trace_path(ctx, &line.points, false);
            ctx.stroke();
        }
    }
    set_dash(ctx, 0.0)?;

    let half = store.config().handle_radius_px / zoom;
    ctx.set_fill_style_str("#fff");
    ctx.set_line_width(1.0 / zoom);
    for handle in resize_handles(store, el).unwrap_or_default() {
        let p = handle.pos;
        ctx.fill_rect(p.x - half, p.y - half, half * 2.0, half * 2.0);
        ctx.stroke_rect(p.x - half, p.y - half, half * 2.0, half * 2.0);
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Previews
// =============================================================

fn draw_preview(
    ctx: &CanvasRenderingContext2d,
    store: &PlanStore,
    preview: Preview<'_>,
    zoom: f64,
) -> Result<(), JsValue> {
    let config = store.config();
    ctx.save();
    ctx.set_global_alpha(0.6);
    match preview {
        Preview::Shape { kind: ElementKind::Wall, start, current } => {
            ctx.set_stroke_style_str(ElementKind::Wall.default_color());
            ctx.set_line_width(config.wall_thickness);
            trace_path(ctx, &[start, current], false);
            ctx.stroke();
            let label = format_length(distance(start, current), config.units_per_meter);
            draw_dimension(ctx, start, current, config.wall_thickness, &label, zoom)?;
        }
        Preview::Shape { kind, start, current } => {
            let (x, y, w, h) = rect_from_corners(start, current);
            ctx.set_stroke_style_str(kind.default_color());
            ctx.set_line_width(1.5 / zoom);
            set_dash(ctx, DASH_PX / zoom)?;
            ctx.stroke_rect(x, y, w, h);
        }
        Preview::Opening { kind, wall_id, start_dist, end_dist } => {
            if let Some(wall) = store.wall(wall_id) {
                let (lo, hi) = (start_dist.min(end_dist), start_dist.max(end_dist));
                let p1 = point_along_line(wall.start(), wall.end(), lo);
                let p2 = point_along_line(wall.start(), wall.end(), hi);
                ctx.set_stroke_style_str(kind.default_color());
                ctx.set_line_width(wall.thickness + 2.0 / zoom);
                trace_path(ctx, &[p1, p2], false);
                ctx.stroke();
                let label = format_length(hi - lo, config.units_per_meter);
                draw_dimension(ctx, p1, p2, wall.thickness, &label, zoom)?;
            }
        }
        Preview::Route { kind, points, hover } => {
            draw_route(ctx, points, kind.default_color());
            if let (Some(last), Some(hover)) = (points.last(), hover) {
                ctx.set_stroke_style_str(kind.default_color());
                ctx.set_line_width(ROUTE_WIDTH);
                set_dash(ctx, DASH_PX / zoom)?;
                trace_path(ctx, &[*last, hover], false);
                ctx.stroke();
            }
        }
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Begin a path through `points`, optionally closed.
fn trace_path(ctx: &CanvasRenderingContext2d, points: &[Point], close: bool) {
    ctx.begin_path();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        ctx.move_to(first.x, first.y);
    }
    for p in iter {
        ctx.line_to(p.x, p.y);
    }
    if close {
        ctx.close_path();
    }
}

/// Set a dash pattern of equal on/off segments; `0` restores solid lines.
fn set_dash(ctx: &CanvasRenderingContext2d, dash: f64) -> Result<(), JsValue> {
    let pattern = js_sys::Array::new();
    if dash > 0.0 {
        pattern.push(&dash.into());
        pattern.push(&dash.into());
    }
    ctx.set_line_dash(&pattern)
}

#[allow(clippy::cast_precision_loss)]
fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}
