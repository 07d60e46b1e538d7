//! The interaction engine: pointer, wheel and key events in, [`Action`]s out.
//!
//! [`EngineCore`] holds the plan, the camera and the gesture state machine and
//! is plain Rust, so every transition is unit-tested natively. [`Engine`]
//! wraps it with the browser canvas it draws to.
//!
//! Input arrives in screen pixels and is converted to world units once, at the
//! top of each handler. Commits go through [`PlanStore`] (creation, delete) or
//! [`crate::edit`] (move, resize), which validate the plan invariants; a
//! rejected commit becomes an [`Action::Status`] message and leaves the plan
//! unchanged.

use tracing::{debug, error, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::Camera;
use crate::consts::ZOOM_STEP;
use crate::doc::{Element, ElementId, ElementKind, LoadReport, PlanSnapshot, PlanStore, SwingDirection};
use crate::edit;
use crate::error::EditError;
use crate::geom::{Point, distance, snap_point};
use crate::hit::{
    HandleKind, Hit, HitPart, check_wall_child_overlap, find_element_at, find_wall_near_point, hit_test,
    is_point_near_door, offset_along_wall,
};
use crate::input::{Button, EditMode, InputState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::render;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ElementCreated(Element),
    /// An element was moved, resized or had its properties changed.
    ElementUpdated(Element),
    /// An element was deleted, along with the openings of a deleted wall.
    ElementDeleted { id: ElementId, cascaded: Vec<ElementId> },
    /// A message for the status bar.
    Status(String),
    /// View mode click: the host should show the element's info panel.
    InfoRequested { id: ElementId },
    /// The plan changed and should be persisted.
    SaveRequested,
    SetCursor(String),
    RenderNeeded,
}

/// In-progress drawing, for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preview<'a> {
    Shape { kind: ElementKind, start: Point, current: Point },
    Opening { kind: ElementKind, wall_id: ElementId, start_dist: f64, end_dist: f64 },
    Route { kind: ElementKind, points: &'a [Point], hover: Option<Point> },
}

/// Core engine state: all logic that doesn't depend on the canvas element.
pub struct EngineCore {
    pub store: PlanStore,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    /// Last pointer position, so a pointer-leave can finish the gesture there.
    last_screen: Point,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            store: PlanStore::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            last_screen: Point::default(),
        }
    }
}

fn reject(err: EditError) -> Vec<Action> {
    warn!(error = %err, "edit rejected");
    vec![Action::Status(err.to_string()), Action::RenderNeeded]
}

fn handle_cursor(handle: HandleKind) -> &'static str {
    match handle {
        HandleKind::Rect(anchor) => anchor.cursor(),
        HandleKind::GapStart | HandleKind::GapEnd => "ew-resize",
        HandleKind::Vertex(_) | HandleKind::WallEnd(_) => "crosshair",
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Replace the plan with a server snapshot. Any gesture and selection is dropped.
    pub fn load_snapshot(&mut self, snapshot: PlanSnapshot) -> LoadReport {
        self.input = InputState::Idle;
        self.ui.selected_id = None;
        self.store.load(snapshot)
    }

    /// Replace the plan from JSON text. Malformed JSON leaves an empty plan.
    pub fn load_json(&mut self, json: &str) -> LoadReport {
        match serde_json::from_str::<PlanSnapshot>(json) {
            Ok(snapshot) => self.load_snapshot(snapshot),
            Err(e) => {
                error!(error = %e, "malformed floor plan; starting with an empty plan");
                self.load_snapshot(PlanSnapshot::default())
            }
        }
    }

    /// The whole plan for saving.
    #[must_use]
    pub fn snapshot(&self) -> PlanSnapshot {
        self.store.snapshot()
    }

    /// The whole plan as JSON text.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if an element cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    // --- Tool / mode ---

    /// Switch tools. Drops any gesture in progress and clears the selection.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.reset();
        self.ui.tool = tool;
        debug!(?tool, "tool changed");
        vec![Action::SetCursor(tool.cursor().to_owned()), Action::RenderNeeded]
    }

    /// Switch between edit and view mode. Drops any gesture in progress and
    /// clears the selection.
    pub fn set_mode(&mut self, mode: EditMode) -> Vec<Action> {
        self.reset();
        self.ui.mode = mode;
        debug!(?mode, "mode changed");
        let cursor = match mode {
            EditMode::Edit => self.ui.tool.cursor(),
            EditMode::View => "pointer",
        };
        vec![Action::SetCursor(cursor.to_owned()), Action::RenderNeeded]
    }

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
    }

    fn clear_selection(&mut self) -> Vec<Action> {
        match self.ui.selected_id.take() {
            Some(_) => vec![Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.input = InputState::Idle;
        self.ui.selected_id = None;
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        self.last_screen = screen_pt;
        match button {
            Button::Middle => {
                self.input = InputState::Panning { last_screen: screen_pt };
                return vec![Action::SetCursor("grabbing".to_owned())];
            }
            Button::Secondary => return Vec::new(),
            Button::Primary => {}
        }

        let world = self.camera.screen_to_world(screen_pt);
        if self.ui.mode == EditMode::View {
            return self.inspect_at(world);
        }
        if matches!(self.input, InputState::BuildingRoute { .. }) {
            return self.add_route_point(world);
        }

        match self.ui.tool {
            Tool::Select => self.select_at(screen_pt, world),
            Tool::Delete => match find_element_at(&self.store, world) {
                Some(id) => self.delete(id),
                None => Vec::new(),
            },
            Tool::Door => self.start_wall_child(ElementKind::Door, world),
            Tool::EmergencyDoor => self.start_wall_child(ElementKind::EmergencyDoor, world),
            Tool::Window => self.start_wall_child(ElementKind::Window, world),
            Tool::Route => self.start_route(ElementKind::Route, world),
            Tool::EmergencyRoute => self.start_route(ElementKind::EmergencyRoute, world),
            Tool::EmergencyKit => {
                let size = self.store.config().kit_size;
                self.create(|id| Ok(Element::kit(id, world, size)))
            }
            Tool::Wall => self.start_shape(ElementKind::Wall, world),
            Tool::Machine => self.start_shape(ElementKind::Machine, world),
            Tool::Closet => self.start_shape(ElementKind::Closet, world),
            Tool::Gear => self.start_shape(ElementKind::Gear, world),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        self.last_screen = screen_pt;
        let world = self.camera.screen_to_world(screen_pt);
        let grid = self.store.config().grid_size;

        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                self.camera.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::DrawingShape { kind, current, .. } => {
                *current = if *kind == ElementKind::Wall { snap_point(world, grid) } else { world };
                vec![Action::RenderNeeded]
            }
            InputState::DrawingWallChild { wall_id, end_dist, .. } => {
                if let Some((along, _)) = offset_along_wall(&self.store, *wall_id, world) {
                    *end_dist = along;
                }
                vec![Action::RenderNeeded]
            }
            InputState::BuildingRoute { hover, .. } => {
                *hover = Some(snap_point(world, grid));
                vec![Action::RenderNeeded]
            }
            InputState::Moving { id, grab, changed, .. } => {
                match edit::move_element(&mut self.store, *id, world, *grab) {
                    Ok(moved) => *changed |= moved,
                    Err(e) => debug!(id = *id, error = %e, "move step rejected"),
                }
                vec![Action::RenderNeeded]
            }
            InputState::Resizing { id, handle, changed, .. } => {
                match edit::resize_element(&mut self.store, *id, *handle, world) {
                    Ok(resized) => *changed |= resized,
                    Err(e) => debug!(id = *id, error = %e, "resize step rejected"),
                }
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        self.last_screen = screen_pt;
        let world = self.camera.screen_to_world(screen_pt);

        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { .. } => vec![Action::SetCursor(self.ui.tool.cursor().to_owned())],
            InputState::DrawingShape { kind, start, .. } => self.finish_shape(kind, start, world),
            InputState::DrawingWallChild { kind, wall_id, start_dist, .. } => {
                self.finish_wall_child(kind, wall_id, start_dist, world)
            }
            state @ InputState::BuildingRoute { .. } => {
                self.input = state;
                Vec::new()
            }
            InputState::Moving { id, changed, .. } | InputState::Resizing { id, changed, .. } => {
                self.finish_edit(id, changed)
            }
        }
    }

    /// The pointer left the canvas. A route build is discarded; any other
    /// gesture finishes at the last known pointer position.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        if self.input.is_idle() {
            return Vec::new();
        }
        if matches!(self.input, InputState::BuildingRoute { .. }) {
            self.input = InputState::Idle;
            debug!("route cancelled");
            return vec![Action::Status("route cancelled".to_owned()), Action::RenderNeeded];
        }
        self.on_pointer_up(self.last_screen, Button::Primary, Modifiers::default())
    }

    // --- Wheel / keyboard ---

    /// Plain wheel pans; Ctrl/Meta + wheel zooms around the pointer.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.zoom() {
            if delta.dy == 0.0 {
                return Vec::new();
            }
            let factor = if delta.dy < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            self.camera.zoom_at(screen_pt, factor);
        } else {
            self.camera.pan_by(-delta.dx, -delta.dy);
        }
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: Key, _modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Escape" => self.cancel(),
            "Enter" => self.finish_route(),
            "Delete" | "Backspace" if self.input.is_idle() => self.delete_selected(),
            _ => Vec::new(),
        }
    }

    // --- Commands ---

    /// Delete the selected element (cascading for walls). No-op in view mode.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        if self.ui.mode == EditMode::View {
            return Vec::new();
        }
        match self.ui.selected_id {
            Some(id) => self.delete(id),
            None => Vec::new(),
        }
    }

    /// Merge a JSON object into an element's properties.
    pub fn merge_properties(&mut self, id: ElementId, patch: &serde_json::Value) -> Vec<Action> {
        if let Err(e) = self.store.merge_properties(id, patch) {
            return reject(e);
        }
        info!(id, "element properties updated");
        match self.store.get(id) {
            Some(element) => vec![Action::ElementUpdated(element.clone()), Action::SaveRequested, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<ElementId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.store.get(id)
    }

    /// The drawing in progress, if any.
    #[must_use]
    pub fn preview(&self) -> Option<Preview<'_>> {
        match &self.input {
            InputState::DrawingShape { kind, start, current } => {
                Some(Preview::Shape { kind: *kind, start: *start, current: *current })
            }
            InputState::DrawingWallChild { kind, wall_id, start_dist, end_dist } => Some(Preview::Opening {
                kind: *kind,
                wall_id: *wall_id,
                start_dist: *start_dist,
                end_dist: *end_dist,
            }),
            InputState::BuildingRoute { kind, points, hover } => {
                Some(Preview::Route { kind: *kind, points, hover: *hover })
            }
            _ => None,
        }
    }

    // --- Gesture starts ---

    fn inspect_at(&mut self, world: Point) -> Vec<Action> {
        match find_element_at(&self.store, world) {
            Some(id) => {
                self.ui.selected_id = Some(id);
                vec![Action::InfoRequested { id }, Action::RenderNeeded]
            }
            None => self.clear_selection(),
        }
    }

    fn select_at(&mut self, screen_pt: Point, world: Point) -> Vec<Action> {
        match hit_test(world, &self.store, &self.camera, self.ui.selected_id) {
            Some(Hit { element_id, part: HitPart::Handle(handle) }) => {
                let Some(original) = self.store.get(element_id).cloned() else {
                    return reject(EditError::NotFound(element_id));
                };
                debug!(id = element_id, ?handle, "resize started");
                self.input =
                    InputState::Resizing { id: element_id, handle, changed: false, original: Box::new(original) };
                vec![Action::SetCursor(handle_cursor(handle).to_owned())]
            }
            Some(Hit { element_id, part: HitPart::Body }) => {
                let grab = match edit::grab(&self.store, element_id, world) {
                    Ok(grab) => grab,
                    Err(e) => return reject(e),
                };
                let Some(original) = self.store.get(element_id).cloned() else {
                    return reject(EditError::NotFound(element_id));
                };
                debug!(id = element_id, "move started");
                self.ui.selected_id = Some(element_id);
                self.input =
                    InputState::Moving { id: element_id, grab, changed: false, original: Box::new(original) };
                vec![Action::SetCursor("move".to_owned()), Action::RenderNeeded]
            }
            None => {
                let had_selection = self.ui.selected_id.take().is_some();
                self.input = InputState::Panning { last_screen: screen_pt };
                if had_selection { vec![Action::RenderNeeded] } else { Vec::new() }
            }
        }
    }

    fn start_wall_child(&mut self, kind: ElementKind, world: Point) -> Vec<Action> {
        let tolerance = self.store.config().wall_placement_tolerance();
        let Some(hit) = find_wall_near_point(&self.store, world, tolerance) else {
            return reject(EditError::OffWall(kind));
        };
        let Some((along, true)) = offset_along_wall(&self.store, hit.wall_id, world) else {
            return reject(EditError::OffWall(kind));
        };
        debug!(%kind, wall_id = hit.wall_id, along, "opening started");
        self.input = InputState::DrawingWallChild { kind, wall_id: hit.wall_id, start_dist: along, end_dist: along };
        vec![Action::RenderNeeded]
    }

    fn start_route(&mut self, kind: ElementKind, world: Point) -> Vec<Action> {
        let p = snap_point(world, self.store.config().grid_size);
        self.input = InputState::BuildingRoute { kind, points: vec![p], hover: None };
        vec![Action::RenderNeeded]
    }

    fn start_shape(&mut self, kind: ElementKind, world: Point) -> Vec<Action> {
        let start = if kind == ElementKind::Wall {
            snap_point(world, self.store.config().grid_size)
        } else {
            world
        };
        self.input = InputState::DrawingShape { kind, start, current: start };
        vec![Action::RenderNeeded]
    }

    /// Add a clicked point to the route being built. A click near a door
    /// adds its point and finishes the route.
    fn add_route_point(&mut self, world: Point) -> Vec<Action> {
        let config = self.store.config();
        let p = snap_point(world, config.grid_size);
        let near_door = is_point_near_door(&self.store, world, config.door_end_snap_tolerance);
        if let InputState::BuildingRoute { points, hover, .. } = &mut self.input {
            if points.last() != Some(&p) {
                points.push(p);
            }
            *hover = None;
        }
        if near_door {
            return self.finish_route();
        }
        vec![Action::RenderNeeded]
    }

    // --- Commits ---

    fn create<F>(&mut self, build: F) -> Vec<Action>
    where
        F: FnOnce(ElementId) -> Result<Element, EditError>,
    {
        match self.store.add(build).cloned() {
            Ok(element) => vec![Action::ElementCreated(element), Action::SaveRequested, Action::RenderNeeded],
            Err(e) => reject(e),
        }
    }

    fn finish_shape(&mut self, kind: ElementKind, start: Point, world: Point) -> Vec<Action> {
        let config = self.store.config();
        let end = if kind == ElementKind::Wall { snap_point(world, config.grid_size) } else { world };
        if distance(start, end) < config.min_element_size {
            debug!(%kind, "drawing cancelled (too small)");
            return vec![Action::RenderNeeded];
        }
        let thickness = config.wall_thickness;
        match kind {
            ElementKind::Wall => self.create(|id| Ok(Element::wall(id, start, end, thickness))),
            ElementKind::Machine | ElementKind::Closet => {
                self.create(|id| Element::polygon_from_rect(id, kind, start, end))
            }
            _ => self.create(|id| Element::rect(id, kind, start, end)),
        }
    }

    fn finish_wall_child(&mut self, kind: ElementKind, wall_id: ElementId, start_dist: f64, world: Point) -> Vec<Action> {
        let end_dist = offset_along_wall(&self.store, wall_id, world).map_or(start_dist, |(along, _)| along);
        let (lo, hi) = (start_dist.min(end_dist), start_dist.max(end_dist));
        let min = self.store.config().min_opening_length;
        if hi - lo < min {
            return reject(EditError::TooShort { kind, min });
        }
        if check_wall_child_overlap(&self.store, wall_id, None, lo, hi - lo) {
            return reject(EditError::Overlap { kind, wall_id });
        }
        let swing = if end_dist >= start_dist { SwingDirection::Forward } else { SwingDirection::Backward };
        self.create(|id| Element::wall_child(id, kind, wall_id, lo, hi - lo, swing))
    }

    fn finish_route(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::BuildingRoute { kind, points, .. } => {
                if points.len() < 2 {
                    return reject(EditError::TooFewPoints { kind, min: 2, got: points.len() });
                }
                self.create(|id| Element::route(id, kind, points))
            }
            other => {
                self.input = other;
                Vec::new()
            }
        }
    }

    fn finish_edit(&mut self, id: ElementId, changed: bool) -> Vec<Action> {
        let cursor = Action::SetCursor(self.ui.tool.cursor().to_owned());
        match self.store.get(id) {
            Some(element) if changed => {
                info!(id, kind = %element.kind(), "edit committed");
                vec![Action::ElementUpdated(element.clone()), Action::SaveRequested, cursor, Action::RenderNeeded]
            }
            _ => vec![cursor, Action::RenderNeeded],
        }
    }

    /// Put an element back the way it was before the gesture began. Edits
    /// never touch siblings, so the original still satisfies every invariant.
    fn revert_edit(&mut self, id: ElementId, changed: bool, original: Element) -> Vec<Action> {
        let cursor = Action::SetCursor(self.ui.tool.cursor().to_owned());
        if !changed {
            return vec![cursor, Action::RenderNeeded];
        }
        match self.store.replace(original) {
            Ok(()) => debug!(id, "edit reverted"),
            Err(e) => warn!(id, error = %e, "could not revert edit"),
        }
        vec![cursor, Action::RenderNeeded]
    }

    fn cancel(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => self.clear_selection(),
            InputState::Moving { id, changed, original, .. }
            | InputState::Resizing { id, changed, original, .. } => self.revert_edit(id, changed, *original),
            InputState::Panning { .. } => vec![Action::SetCursor(self.ui.tool.cursor().to_owned())],
            _ => {
                debug!("drawing cancelled");
                vec![Action::RenderNeeded]
            }
        }
    }

    fn delete(&mut self, id: ElementId) -> Vec<Action> {
        match self.store.remove(id) {
            Ok(removed) => {
                if self.ui.selected_id.is_some_and(|sel| removed.iter().any(|el| el.id == sel)) {
                    self.ui.selected_id = None;
                }
                let cascaded = removed.iter().skip(1).map(|el| el.id).collect();
                vec![Action::ElementDeleted { id, cascaded }, Action::SaveRequested, Action::RenderNeeded]
            }
            Err(e) => reject(e),
        }
    }
}

/// The full engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, core: EngineCore::new() }
    }

    // --- Delegated inputs ---

    pub fn load_json(&mut self, json: &str) -> LoadReport {
        self.core.load_json(json)
    }

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.core.set_tool(tool)
    }

    pub fn set_mode(&mut self, mode: EditMode) -> Vec<Action> {
        self.core.set_mode(mode)
    }

    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.core.on_pointer_leave()
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        render::draw(&ctx, &self.core)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Option<ElementId> {
        self.core.selection()
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.core.element(id)
    }
}
