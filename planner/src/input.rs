//! Input model: tools, edit mode, modifier keys, and the gesture state machine.
//!
//! `Tool` and `EditMode` capture what the user intends a click to do.
//! `InputState` is the gesture in progress between pointer-down and
//! pointer-up (or across several clicks while a route is being built),
//! carrying everything needed to preview it and to commit it on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::{Element, ElementId, ElementKind};
use crate::edit::Grab;
use crate::geom::Point;
use crate::hit::HandleKind;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Select, move and resize (default).
    #[default]
    Select,
    /// Delete the clicked element.
    Delete,
    Wall,
    Door,
    EmergencyDoor,
    Window,
    Machine,
    Closet,
    Gear,
    Route,
    EmergencyRoute,
    EmergencyKit,
}

impl Tool {
    /// The element kind this tool creates, if any.
    #[must_use]
    pub fn creates(self) -> Option<ElementKind> {
        match self {
            Self::Select | Self::Delete => None,
            Self::Wall => Some(ElementKind::Wall),
            Self::Door => Some(ElementKind::Door),
            Self::EmergencyDoor => Some(ElementKind::EmergencyDoor),
            Self::Window => Some(ElementKind::Window),
            Self::Machine => Some(ElementKind::Machine),
            Self::Closet => Some(ElementKind::Closet),
            Self::Gear => Some(ElementKind::Gear),
            Self::Route => Some(ElementKind::Route),
            Self::EmergencyRoute => Some(ElementKind::EmergencyRoute),
            Self::EmergencyKit => Some(ElementKind::EmergencyKit),
        }
    }

    /// Whether this tool is dragged out as a shape (wall, polygon or rect).
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(self, Self::Wall | Self::Machine | Self::Closet | Self::Gear)
    }

    /// Whether this tool cuts a door or window into a wall.
    #[must_use]
    pub fn is_opening(self) -> bool {
        matches!(self, Self::Door | Self::EmergencyDoor | Self::Window)
    }

    /// Whether this tool builds a polyline by successive clicks.
    #[must_use]
    pub fn is_route(self) -> bool {
        matches!(self, Self::Route | Self::EmergencyRoute)
    }

    /// CSS cursor shown while this tool is idle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Delete => "not-allowed",
            _ => "crosshair",
        }
    }
}

/// Whether the plan may be edited or only inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Edit,
    /// Clicking an element asks the host to show its info panel.
    View,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn zoom(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta in pixels.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Positive = down.
    pub dy: f64,
}

/// UI state visible to the renderer and the host.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tool: Tool,
    pub mode: EditMode,
    pub selected_id: Option<ElementId>,
}

/// The gesture in progress.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the view with the middle button or on empty space.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// A wall, polygon or rect being dragged out from `start`.
    DrawingShape { kind: ElementKind, start: Point, current: Point },
    /// A door or window being dragged along `wall_id`. Offsets are
    /// arc lengths from the wall start, in drag order.
    DrawingWallChild { kind: ElementKind, wall_id: ElementId, start_dist: f64, end_dist: f64 },
    /// A route accumulating one point per click.
    BuildingRoute {
        kind: ElementKind,
        points: Vec<Point>,
        /// Snapped pointer position for the rubber-band segment.
        hover: Option<Point>,
    },
    /// An existing element following the pointer. `changed` records whether
    /// any move was accepted, so an unmoved click does not trigger a save.
    /// `original` is the element as it was on pointer-down; Escape puts it back.
    Moving { id: ElementId, grab: Grab, changed: bool, original: Box<Element> },
    /// A resize handle of an existing element following the pointer.
    Resizing { id: ElementId, handle: HandleKind, changed: bool, original: Box<Element> },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
