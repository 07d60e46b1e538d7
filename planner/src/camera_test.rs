#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// =============================================================
// Conversions
// =============================================================

#[test]
fn default_camera_is_identity() {
    let cam = Camera::default();
    let p = Point::new(50.0, 75.0);
    assert!(point_approx_eq(cam.screen_to_world(p), p));
    assert!(point_approx_eq(cam.world_to_screen(p), p));
}

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let cam = Camera { pan_x: 50.0, pan_y: 30.0, zoom: 2.0 };
    let world = cam.screen_to_world(Point::new(0.0, 0.0));
    assert!(point_approx_eq(world, Point::new(-25.0, -15.0)));
}

#[test]
fn world_to_screen_with_pan_and_zoom() {
    let cam = Camera { pan_x: 20.0, pan_y: 10.0, zoom: 3.0 };
    // 5*3 + 20 = 35, 5*3 + 10 = 25
    let screen = cam.world_to_screen(Point::new(5.0, 5.0));
    assert!(point_approx_eq(screen, Point::new(35.0, 25.0)));
}

#[test]
fn round_trip_fractional_zoom() {
    let cam = Camera { pan_x: 13.7, pan_y: -42.3, zoom: 0.75 };
    let world = Point::new(333.3, -999.9);
    let back = cam.screen_to_world(cam.world_to_screen(world));
    assert!(point_approx_eq(world, back));
}

#[test]
fn screen_dist_to_world_ignores_pan() {
    let cam = Camera { pan_x: 999.0, pan_y: -999.0, zoom: 4.0 };
    assert!(approx_eq(cam.screen_dist_to_world(8.0), 2.0));
}

#[test]
fn handle_radius_shrinks_in_world_when_zoomed_in() {
    let near = Camera { zoom: 2.0, ..Camera::default() };
    let far = Camera { zoom: 0.5, ..Camera::default() };
    assert!(near.screen_dist_to_world(6.0) < far.screen_dist_to_world(6.0));
}

// =============================================================
// Pan
// =============================================================

#[test]
fn pan_by_shifts_screen_position() {
    let mut cam = Camera::default();
    cam.pan_by(10.0, -5.0);
    let screen = cam.world_to_screen(Point::new(0.0, 0.0));
    assert!(point_approx_eq(screen, Point::new(10.0, -5.0)));
}

#[test]
fn pan_by_leaves_zoom_alone() {
    let mut cam = Camera { zoom: 2.5, ..Camera::default() };
    cam.pan_by(100.0, 100.0);
    assert_eq!(cam.zoom, 2.5);
}

// =============================================================
// Zoom
// =============================================================

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut cam = Camera { pan_x: 30.0, pan_y: -20.0, zoom: 1.5 };
    let anchor = Point::new(200.0, 150.0);
    let world_before = cam.screen_to_world(anchor);
    cam.zoom_at(anchor, 1.1);
    let world_after = cam.screen_to_world(anchor);
    assert!(point_approx_eq(world_before, world_after));
    assert!(approx_eq(cam.zoom, 1.65));
}

#[test]
fn zoom_at_clamps_to_max() {
    let mut cam = Camera { zoom: 9.0, ..Camera::default() };
    cam.zoom_at(Point::new(0.0, 0.0), 5.0);
    assert_eq!(cam.zoom, MAX_ZOOM);
}

#[test]
fn zoom_at_clamps_to_min() {
    let mut cam = Camera { zoom: 0.2, ..Camera::default() };
    cam.zoom_at(Point::new(10.0, 10.0), 0.01);
    assert_eq!(cam.zoom, MIN_ZOOM);
}

#[test]
fn zoom_at_origin_with_no_pan_keeps_pan_zero() {
    let mut cam = Camera::default();
    cam.zoom_at(Point::new(0.0, 0.0), 2.0);
    assert_eq!(cam.pan_x, 0.0);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.zoom, 2.0);
}
