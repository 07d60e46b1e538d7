#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::doc::{RectShape, Shape};
use crate::input::{Button, EditMode, InputState, Key, Modifiers, Tool, WheelDelta};

// =============================================================
// Helpers
// =============================================================

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn ctrl_modifier() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn down(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_down(pt(x, y), Button::Primary, no_modifiers())
}

fn move_to(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_move(pt(x, y), no_modifiers())
}

fn up(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_up(pt(x, y), Button::Primary, no_modifiers())
}

fn click(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    let mut actions = down(core, x, y);
    actions.extend(up(core, x, y));
    actions
}

fn drag(core: &mut EngineCore, from: (f64, f64), to: (f64, f64)) -> Vec<Action> {
    down(core, from.0, from.1);
    move_to(core, to.0, to.1);
    up(core, to.0, to.1)
}

fn key(core: &mut EngineCore, name: &str) -> Vec<Action> {
    core.on_key_down(Key(name.to_owned()), no_modifiers())
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn has_render_needed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::RenderNeeded))
}

fn has_save_requested(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::SaveRequested))
}

fn created(actions: &[Action]) -> Option<&Element> {
    actions.iter().find_map(|a| match a {
        Action::ElementCreated(el) => Some(el),
        _ => None,
    })
}

fn updated(actions: &[Action]) -> Option<&Element> {
    actions.iter().find_map(|a| match a {
        Action::ElementUpdated(el) => Some(el),
        _ => None,
    })
}

fn status(actions: &[Action]) -> Option<&str> {
    actions.iter().find_map(|a| match a {
        Action::Status(msg) => Some(msg.as_str()),
        _ => None,
    })
}

fn rect_of(core: &EngineCore, id: ElementId) -> RectShape {
    match &core.element(id).unwrap().shape {
        Shape::Gear(r) | Shape::EmergencyKit(r) => r.clone(),
        other => panic!("expected rect, got {other:?}"),
    }
}

/// Core with one wall from (0,0) to (100,0).
fn core_with_wall() -> (EngineCore, ElementId) {
    let mut core = EngineCore::new();
    let wall = core
        .store
        .add(|id| Ok(Element::wall(id, pt(0.0, 0.0), pt(100.0, 0.0), 6.0)))
        .unwrap()
        .id;
    (core, wall)
}

fn add_door(core: &mut EngineCore, wall: ElementId, start: f64, len: f64) -> ElementId {
    core.store
        .add(|id| Element::wall_child(id, ElementKind::Door, wall, start, len, SwingDirection::Forward))
        .unwrap()
        .id
}

fn add_gear(core: &mut EngineCore, a: Point, b: Point) -> ElementId {
    core.store.add(|id| Element::rect(id, ElementKind::Gear, a, b)).unwrap().id
}

// =============================================================
// Construction and data inputs
// =============================================================

#[test]
fn core_defaults() {
    let core = EngineCore::new();
    assert!(core.selection().is_none());
    assert!(core.store.is_empty());
    assert_eq!(core.ui.tool, Tool::Select);
    assert_eq!(core.ui.mode, EditMode::Edit);
    assert!(core.input.is_idle());
    assert_eq!(core.camera().zoom, 1.0);
    assert!(core.preview().is_none());
}

#[test]
fn load_json_hydrates_store() {
    let mut core = EngineCore::new();
    let report = core.load_json(
        r#"{"elements":[
            {"id":4,"type":"wall","x1":0,"y1":0,"x2":100,"y2":0,"thickness":6},
            {"id":9,"type":"door","wallId":4,"distanceAlongWall":10,"length":20,"swingDirection":-1}
        ],"config":{"gridSize":10}}"#,
    );
    assert_eq!(report.loaded, 2);
    assert_eq!(core.store.config().grid_size, 10.0);
    assert_eq!(core.store.next_id(), 10);
}

#[test]
fn load_json_malformed_leaves_empty_plan() {
    let (mut core, _) = core_with_wall();
    let report = core.load_json("{ not json");
    assert_eq!(report.loaded, 0);
    assert!(core.store.is_empty());
}

#[test]
fn load_clears_selection_and_gesture() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    down(&mut core, 10.0, 10.0);
    assert_eq!(core.selection(), Some(gear));
    core.load_snapshot(PlanSnapshot::default());
    assert!(core.selection().is_none());
    assert!(core.input.is_idle());
}

#[test]
fn to_json_round_trips_through_load_json() {
    let (mut core, wall) = core_with_wall();
    add_door(&mut core, wall, 20.0, 15.0);
    let text = core.to_json().unwrap();
    let mut other = EngineCore::new();
    other.load_json(&text);
    assert_eq!(other.snapshot(), core.snapshot());
}

// =============================================================
// Tool and mode switching
// =============================================================

#[test]
fn set_tool_sets_cursor_and_clears_selection() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    core.ui.selected_id = Some(gear);
    let actions = core.set_tool(Tool::Wall);
    assert!(core.selection().is_none());
    assert!(has_action(&actions, |a| *a == Action::SetCursor("crosshair".into())));
}

#[test]
fn set_tool_discards_route_build() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Route);
    click(&mut core, 0.0, 0.0);
    click(&mut core, 50.0, 0.0);
    core.set_tool(Tool::Route);
    assert!(core.input.is_idle());
    assert!(core.store.is_empty());
}

#[test]
fn set_mode_resets_gesture() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    down(&mut core, 0.0, 0.0);
    let actions = core.set_mode(EditMode::View);
    assert!(core.input.is_idle());
    assert!(has_action(&actions, |a| *a == Action::SetCursor("pointer".into())));
}

// =============================================================
// View mode
// =============================================================

#[test]
fn view_mode_click_requests_info() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    core.set_mode(EditMode::View);
    let actions = click(&mut core, 10.0, 10.0);
    assert!(has_action(&actions, |a| *a == Action::InfoRequested { id: gear }));
    assert!(core.input.is_idle());
}

#[test]
fn view_mode_cannot_move_or_delete() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    core.set_mode(EditMode::View);
    drag(&mut core, (10.0, 10.0), (80.0, 80.0));
    assert_eq!(rect_of(&core, gear).x, 0.0);
    assert!(key(&mut core, "Delete").is_empty());
    assert!(core.element(gear).is_some());
}

#[test]
fn view_mode_click_on_empty_space_deselects() {
    let mut core = EngineCore::new();
    add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    core.set_mode(EditMode::View);
    click(&mut core, 10.0, 10.0);
    let actions = click(&mut core, 300.0, 300.0);
    assert!(core.selection().is_none());
    assert!(has_render_needed(&actions));
}

// =============================================================
// Select tool: move
// =============================================================

#[test]
fn click_on_element_selects_and_starts_move() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    let actions = down(&mut core, 20.0, 20.0);
    assert_eq!(core.selection(), Some(gear));
    assert!(matches!(core.input, InputState::Moving { id, changed: false, .. } if id == gear));
    assert!(has_render_needed(&actions));
}

#[test]
fn dragging_element_moves_and_saves_on_release() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    let actions = drag(&mut core, (20.0, 20.0), (30.0, 25.0));
    let r = rect_of(&core, gear);
    assert_eq!((r.x, r.y), (20.0, 15.0));
    assert_eq!(updated(&actions).map(|el| el.id), Some(gear));
    assert!(has_save_requested(&actions));
    assert!(core.input.is_idle());
}

#[test]
fn click_without_move_does_not_save() {
    let mut core = EngineCore::new();
    add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    let actions = click(&mut core, 20.0, 20.0);
    assert!(!has_save_requested(&actions));
    assert!(updated(&actions).is_none());
}

#[test]
fn dragging_door_slides_along_wall() {
    let (mut core, wall) = core_with_wall();
    let door = add_door(&mut core, wall, 20.0, 15.0);
    let actions = drag(&mut core, (25.0, 1.0), (65.0, 4.0));
    let el = updated(&actions).unwrap();
    assert_eq!(el.id, door);
    assert!(approx(el.as_opening().unwrap().distance_along_wall, 60.0));
}

#[test]
fn dragging_wall_keeps_door_offset() {
    let (mut core, wall) = core_with_wall();
    let door = add_door(&mut core, wall, 20.0, 15.0);
    drag(&mut core, (80.0, 0.0), (80.0, 50.0));
    let moved = core.store.wall(wall).unwrap();
    assert_eq!((moved.y1, moved.y2), (50.0, 50.0));
    let opening = core.element(door).unwrap().as_opening().unwrap();
    assert_eq!(opening.distance_along_wall, 20.0);
}

#[test]
fn escape_during_move_restores_element() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    down(&mut core, 20.0, 20.0);
    move_to(&mut core, 30.0, 25.0);
    assert_eq!(rect_of(&core, gear).x, 20.0);

    let actions = key(&mut core, "Escape");
    let r = rect_of(&core, gear);
    assert_eq!((r.x, r.y), (10.0, 10.0));
    assert!(updated(&actions).is_none());
    assert!(!has_save_requested(&actions));
    assert!(core.input.is_idle());
    assert!(!has_save_requested(&up(&mut core, 30.0, 25.0)));
}

#[test]
fn escape_during_door_slide_restores_offset() {
    let (mut core, wall) = core_with_wall();
    let door = add_door(&mut core, wall, 20.0, 15.0);
    down(&mut core, 25.0, 1.0);
    move_to(&mut core, 65.0, 4.0);
    key(&mut core, "Escape");
    let opening = core.element(door).unwrap().as_opening().unwrap();
    assert_eq!(opening.distance_along_wall, 20.0);
}

// =============================================================
// Select tool: resize
// =============================================================

#[test]
fn handle_of_selected_element_starts_resize() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    click(&mut core, 20.0, 20.0);
    let actions = down(&mut core, 31.0, 29.0);
    assert!(matches!(core.input, InputState::Resizing { id, .. } if id == gear));
    assert!(has_action(&actions, |a| *a == Action::SetCursor("nwse-resize".into())));
}

#[test]
fn resize_commits_on_release() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    click(&mut core, 20.0, 20.0);
    let actions = drag(&mut core, (30.0, 30.0), (40.0, 50.0));
    let r = rect_of(&core, gear);
    assert_eq!((r.x, r.y, r.width, r.height), (10.0, 10.0, 30.0, 40.0));
    assert!(updated(&actions).is_some());
    assert!(has_save_requested(&actions));
}

#[test]
fn rejected_gap_resize_keeps_last_valid_state() {
    let (mut core, wall) = core_with_wall();
    let door = add_door(&mut core, wall, 20.0, 15.0);
    add_door(&mut core, wall, 50.0, 15.0);
    core.ui.selected_id = Some(door);
    drag(&mut core, (35.0, 0.0), (60.0, 0.0));
    let opening = core.element(door).unwrap().as_opening().unwrap();
    assert_eq!((opening.distance_along_wall, opening.length), (20.0, 15.0));
}

// =============================================================
// Select tool: empty space, middle button, wheel
// =============================================================

#[test]
fn click_on_empty_space_deselects_and_pans() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    core.ui.selected_id = Some(gear);
    let actions = down(&mut core, 500.0, 500.0);
    assert!(core.selection().is_none());
    assert!(matches!(core.input, InputState::Panning { .. }));
    assert!(has_render_needed(&actions));

    move_to(&mut core, 510.0, 520.0);
    assert_eq!((core.camera.pan_x, core.camera.pan_y), (10.0, 20.0));
}

#[test]
fn middle_button_pans_regardless_of_tool() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    let actions = core.on_pointer_down(pt(100.0, 100.0), Button::Middle, no_modifiers());
    assert!(matches!(core.input, InputState::Panning { .. }));
    assert!(has_action(&actions, |a| matches!(a, Action::SetCursor(_))));
    move_to(&mut core, 90.0, 95.0);
    assert_eq!((core.camera.pan_x, core.camera.pan_y), (-10.0, -5.0));
    core.on_pointer_up(pt(90.0, 95.0), Button::Middle, no_modifiers());
    assert!(core.input.is_idle());
    assert!(core.store.is_empty());
}

#[test]
fn secondary_button_is_ignored() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    let actions = core.on_pointer_down(pt(0.0, 0.0), Button::Secondary, no_modifiers());
    assert!(actions.is_empty());
    assert!(core.input.is_idle());
}

#[test]
fn wheel_without_modifier_pans() {
    let mut core = EngineCore::new();
    let actions = core.on_wheel(pt(400.0, 300.0), WheelDelta { dx: 10.0, dy: 20.0 }, no_modifiers());
    assert_eq!(core.camera.pan_x, -10.0);
    assert_eq!(core.camera.pan_y, -20.0);
    assert!(has_render_needed(&actions));
}

#[test]
fn wheel_ctrl_zooms_around_pointer() {
    let mut core = EngineCore::new();
    let anchor = pt(400.0, 300.0);
    let before = core.camera.screen_to_world(anchor);
    core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -10.0 }, ctrl_modifier());
    assert!(core.camera.zoom > 1.0);
    let after = core.camera.screen_to_world(anchor);
    assert!(approx(before.x, after.x) && approx(before.y, after.y));

    core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: 10.0 }, ctrl_modifier());
    core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: 10.0 }, ctrl_modifier());
    assert!(core.camera.zoom < 1.0);
}

#[test]
fn wheel_zoom_clamps_max() {
    let mut core = EngineCore::new();
    core.camera.zoom = 9.5;
    core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: -100.0 }, ctrl_modifier());
    assert!(core.camera.zoom <= 10.0);
}

// =============================================================
// Shape tools
// =============================================================

#[test]
fn wall_tool_snaps_both_ends() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    let actions = drag(&mut core, (2.0, -3.0), (98.0, 2.0));
    let el = created(&actions).unwrap();
    let wall = el.as_wall().unwrap();
    assert_eq!((wall.x1, wall.y1, wall.x2, wall.y2), (0.0, 0.0, 100.0, 0.0));
    assert_eq!(wall.thickness, 6.0);
    assert!(has_save_requested(&actions));
}

#[test]
fn wall_snapping_to_same_point_is_cancelled() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    let actions = drag(&mut core, (1.0, 1.0), (9.0, 9.0));
    assert!(created(&actions).is_none());
    assert!(core.store.is_empty());
}

#[test]
fn tiny_gear_drag_creates_nothing() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Gear);
    let actions = drag(&mut core, (10.0, 10.0), (10.5, 10.5));
    assert!(created(&actions).is_none());
    assert!(!has_save_requested(&actions));
    assert!(core.store.is_empty());
}

#[test]
fn gear_drag_creates_rect() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Gear);
    let actions = drag(&mut core, (30.0, 40.0), (10.0, 10.0));
    let id = created(&actions).unwrap().id;
    let r = rect_of(&core, id);
    assert_eq!((r.x, r.y, r.width, r.height), (10.0, 10.0, 20.0, 30.0));
}

#[test]
fn machine_drag_creates_polygon_with_defaults() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Machine);
    let actions = drag(&mut core, (0.0, 0.0), (40.0, 20.0));
    let el = created(&actions).unwrap();
    assert_eq!(el.kind(), ElementKind::Machine);
    assert_eq!(el.points().len(), 4);
    assert_eq!(el.properties().name(), "Machine");
}

#[test]
fn drawing_converts_screen_to_world() {
    let mut core = EngineCore::new();
    core.camera.zoom = 2.0;
    core.set_tool(Tool::Gear);
    let actions = drag(&mut core, (20.0, 20.0), (60.0, 60.0));
    let id = created(&actions).unwrap().id;
    let r = rect_of(&core, id);
    assert_eq!((r.x, r.y, r.width, r.height), (10.0, 10.0, 20.0, 20.0));
}

#[test]
fn preview_tracks_shape_drawing() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    down(&mut core, 0.0, 0.0);
    move_to(&mut core, 52.0, 3.0);
    assert_eq!(
        core.preview(),
        Some(Preview::Shape { kind: ElementKind::Wall, start: pt(0.0, 0.0), current: pt(50.0, 0.0) })
    );
    assert_eq!(core.store.len(), 0);
}

#[test]
fn pointer_leave_finishes_shape_at_last_position() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    down(&mut core, 0.0, 0.0);
    move_to(&mut core, 100.0, 0.0);
    let actions = core.on_pointer_leave();
    assert!(created(&actions).is_some());
    assert!(core.input.is_idle());
}

#[test]
fn escape_cancels_drawing() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Wall);
    down(&mut core, 0.0, 0.0);
    move_to(&mut core, 100.0, 0.0);
    key(&mut core, "Escape");
    assert!(core.input.is_idle());
    up(&mut core, 100.0, 0.0);
    assert!(core.store.is_empty());
}

#[test]
fn escape_during_resize_restores_size() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(10.0, 10.0), pt(30.0, 30.0));
    click(&mut core, 20.0, 20.0);
    down(&mut core, 30.0, 30.0);
    move_to(&mut core, 40.0, 50.0);
    let actions = key(&mut core, "Escape");
    let r = rect_of(&core, gear);
    assert_eq!((r.x, r.y, r.width, r.height), (10.0, 10.0, 20.0, 20.0));
    assert!(!has_save_requested(&actions));
}

// =============================================================
// Door / window tools
// =============================================================

#[test]
fn door_click_off_wall_reports_status() {
    let (mut core, _) = core_with_wall();
    core.set_tool(Tool::Door);
    let actions = down(&mut core, 50.0, 40.0);
    assert_eq!(status(&actions), Some("must click on a wall to place a door"));
    assert!(core.input.is_idle());
}

#[test]
fn door_drag_along_wall_creates_door() {
    let (mut core, wall) = core_with_wall();
    core.set_tool(Tool::Door);
    down(&mut core, 20.0, 2.0);
    assert!(matches!(core.input, InputState::DrawingWallChild { wall_id, .. } if wall_id == wall));
    move_to(&mut core, 30.0, 2.0);
    let actions = up(&mut core, 35.0, -2.0);
    let el = created(&actions).unwrap();
    let opening = el.as_opening().unwrap();
    assert_eq!(opening.wall_id, wall);
    assert!(approx(opening.distance_along_wall, 20.0));
    assert!(approx(opening.length, 15.0));
    assert_eq!(opening.swing_direction, SwingDirection::Forward);
    assert!(has_save_requested(&actions));
}

#[test]
fn emergency_door_tool_cuts_exit_into_wall() {
    let (mut core, wall) = core_with_wall();
    core.set_tool(Tool::EmergencyDoor);
    let actions = drag(&mut core, (60.0, 1.0), (80.0, 1.0));
    let el = created(&actions).unwrap();
    assert_eq!(el.kind(), ElementKind::EmergencyDoor);
    assert_eq!(el.as_opening().unwrap().wall_id, wall);
    assert!(approx(el.as_opening().unwrap().length, 20.0));
}

#[test]
fn route_click_near_emergency_door_finishes_route() {
    let (mut core, wall) = core_with_wall();
    core.store
        .add(|id| Element::wall_child(id, ElementKind::EmergencyDoor, wall, 40.0, 20.0, SwingDirection::Forward))
        .unwrap();
    core.set_tool(Tool::EmergencyRoute);
    click(&mut core, 50.0, 100.0);
    let actions = click(&mut core, 50.0, 10.0);
    let el = created(&actions).unwrap();
    assert_eq!(el.kind(), ElementKind::EmergencyRoute);
    assert_eq!(el.points().len(), 2);
}

#[test]
fn reverse_drag_records_backward_swing() {
    let (mut core, _) = core_with_wall();
    core.set_tool(Tool::Window);
    let actions = drag(&mut core, (60.0, 0.0), (40.0, 0.0));
    let el = created(&actions).unwrap();
    assert_eq!(el.kind(), ElementKind::Window);
    let opening = el.as_opening().unwrap();
    assert!(approx(opening.distance_along_wall, 40.0));
    assert_eq!(opening.swing_direction, SwingDirection::Backward);
}

#[test]
fn short_door_is_rejected_with_status() {
    let (mut core, _) = core_with_wall();
    core.set_tool(Tool::Door);
    let actions = drag(&mut core, (20.0, 0.0), (24.0, 0.0));
    assert!(created(&actions).is_none());
    assert!(status(&actions).is_some_and(|s| s.contains("minimum length")));
    assert_eq!(core.store.len(), 1);
}

#[test]
fn overlapping_door_is_rejected_with_status() {
    let (mut core, wall) = core_with_wall();
    add_door(&mut core, wall, 20.0, 12.0);
    core.set_tool(Tool::Door);
    let actions = drag(&mut core, (25.0, 0.0), (37.0, 0.0));
    assert!(created(&actions).is_none());
    assert!(status(&actions).is_some_and(|s| s.contains("overlaps")));
    assert_eq!(core.store.len(), 2);
}

#[test]
fn opening_preview_tracks_drag() {
    let (mut core, wall) = core_with_wall();
    core.set_tool(Tool::Door);
    down(&mut core, 20.0, 0.0);
    move_to(&mut core, 150.0, 0.0);
    match core.preview() {
        Some(Preview::Opening { wall_id, start_dist, end_dist, .. }) => {
            assert_eq!(wall_id, wall);
            assert!(approx(start_dist, 20.0));
            assert!(approx(end_dist, 100.0));
        }
        other => panic!("expected opening preview, got {other:?}"),
    }
}

// =============================================================
// Route tools
// =============================================================

#[test]
fn route_builds_across_clicks_and_finishes_on_enter() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::EmergencyRoute);
    click(&mut core, 1.0, 1.0);
    click(&mut core, 49.0, 2.0);
    click(&mut core, 51.0, 74.0);
    assert!(matches!(core.input, InputState::BuildingRoute { ref points, .. } if points.len() == 3));

    let actions = key(&mut core, "Enter");
    let el = created(&actions).unwrap();
    assert_eq!(el.kind(), ElementKind::EmergencyRoute);
    assert_eq!(el.points(), &[pt(0.0, 0.0), pt(50.0, 0.0), pt(50.0, 75.0)]);
    assert!(core.input.is_idle());
}

#[test]
fn route_click_near_door_finishes_route() {
    let (mut core, wall) = core_with_wall();
    add_door(&mut core, wall, 40.0, 20.0);
    core.set_tool(Tool::Route);
    click(&mut core, 0.0, 100.0);
    click(&mut core, 50.0, 100.0);
    let actions = click(&mut core, 50.0, 10.0);
    let el = created(&actions).unwrap();
    assert_eq!(el.points(), &[pt(0.0, 100.0), pt(50.0, 100.0), pt(50.0, 0.0)]);
    assert!(core.input.is_idle());
}

#[test]
fn route_ignores_repeated_point() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Route);
    click(&mut core, 0.0, 0.0);
    click(&mut core, 2.0, 2.0);
    assert!(matches!(core.input, InputState::BuildingRoute { ref points, .. } if points.len() == 1));
}

#[test]
fn enter_with_single_point_reports_status() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Route);
    click(&mut core, 0.0, 0.0);
    let actions = key(&mut core, "Enter");
    assert!(status(&actions).is_some());
    assert!(core.store.is_empty());
    assert!(core.input.is_idle());
}

#[test]
fn pointer_leave_cancels_route() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Route);
    click(&mut core, 0.0, 0.0);
    click(&mut core, 50.0, 0.0);
    let actions = core.on_pointer_leave();
    assert_eq!(status(&actions), Some("route cancelled"));
    assert!(core.input.is_idle());
    assert!(core.store.is_empty());
}

#[test]
fn route_preview_shows_hover() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::Route);
    click(&mut core, 0.0, 0.0);
    move_to(&mut core, 26.0, 1.0);
    match core.preview() {
        Some(Preview::Route { points, hover, .. }) => {
            assert_eq!(points, &[pt(0.0, 0.0)]);
            assert_eq!(hover, Some(pt(25.0, 0.0)));
        }
        other => panic!("expected route preview, got {other:?}"),
    }
}

// =============================================================
// Emergency kit tool
// =============================================================

#[test]
fn kit_click_places_fixed_footprint() {
    let mut core = EngineCore::new();
    core.set_tool(Tool::EmergencyKit);
    let actions = click(&mut core, 50.0, 50.0);
    let id = created(&actions).unwrap().id;
    let r = rect_of(&core, id);
    assert_eq!((r.x, r.y, r.width, r.height), (40.0, 40.0, 20.0, 20.0));
    assert!(has_save_requested(&actions));
}

// =============================================================
// Delete
// =============================================================

#[test]
fn delete_tool_cascades_wall_children() {
    let (mut core, wall) = core_with_wall();
    let door = add_door(&mut core, wall, 20.0, 15.0);
    core.set_tool(Tool::Delete);
    let actions = click(&mut core, 80.0, 0.0);
    assert!(has_action(&actions, |a| *a == Action::ElementDeleted { id: wall, cascaded: vec![door] }));
    assert!(has_save_requested(&actions));
    assert!(core.store.is_empty());
}

#[test]
fn delete_tool_on_door_keeps_wall() {
    let (mut core, wall) = core_with_wall();
    let door = add_door(&mut core, wall, 20.0, 15.0);
    core.set_tool(Tool::Delete);
    let actions = click(&mut core, 25.0, 0.0);
    assert!(has_action(&actions, |a| *a == Action::ElementDeleted { id: door, cascaded: vec![] }));
    assert!(core.element(wall).is_some());
}

#[test]
fn delete_tool_on_empty_space_does_nothing() {
    let (mut core, _) = core_with_wall();
    core.set_tool(Tool::Delete);
    assert!(click(&mut core, 50.0, 50.0).is_empty());
    assert_eq!(core.store.len(), 1);
}

#[test]
fn delete_key_removes_selection() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    click(&mut core, 10.0, 10.0);
    let actions = key(&mut core, "Delete");
    assert!(has_action(&actions, |a| *a == Action::ElementDeleted { id: gear, cascaded: vec![] }));
    assert!(core.selection().is_none());
}

#[test]
fn backspace_without_selection_does_nothing() {
    let mut core = EngineCore::new();
    add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    assert!(key(&mut core, "Backspace").is_empty());
    assert_eq!(core.store.len(), 1);
}

#[test]
fn delete_key_ignored_mid_gesture() {
    let mut core = EngineCore::new();
    let gear = add_gear(&mut core, pt(0.0, 0.0), pt(20.0, 20.0));
    down(&mut core, 10.0, 10.0);
    assert!(key(&mut core, "Delete").is_empty());
    assert!(core.element(gear).is_some());
}

// =============================================================
// Properties
// =============================================================

#[test]
fn merge_properties_updates_and_saves() {
    let mut core = EngineCore::new();
    let closet = core
        .store
        .add(|id| Element::polygon_from_rect(id, ElementKind::Closet, pt(0.0, 0.0), pt(10.0, 10.0)))
        .unwrap()
        .id;
    let actions = core.merge_properties(closet, &json!({ "contentType": "flammable" }));
    let el = updated(&actions).unwrap();
    assert_eq!(el.properties().content_type(), Some("flammable"));
    assert!(has_save_requested(&actions));
}

#[test]
fn merge_properties_unknown_element_reports_status() {
    let mut core = EngineCore::new();
    let actions = core.merge_properties(77, &json!({ "name": "x" }));
    assert_eq!(status(&actions), Some("element 77 not found"));
    assert!(!has_save_requested(&actions));
}
