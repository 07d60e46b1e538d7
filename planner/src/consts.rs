//! Shared numeric constants for the planner crate.
//!
//! Values prefixed `DEFAULT_` seed [`crate::config::EditorConfig`]; the rest
//! are fixed properties of the editor.

// ── Units and grid ──────────────────────────────────────────────

/// World units per real-world meter, used for dimension labels.
pub const DEFAULT_UNITS_PER_METER: f64 = 50.0;

/// Grid spacing in world units for wall and route snapping.
pub const DEFAULT_GRID_SIZE: f64 = 25.0;

/// Thickness of newly drawn walls.
pub const DEFAULT_WALL_THICKNESS: f64 = 6.0;

// ── Tolerances ──────────────────────────────────────────────────

/// Route hit tolerance in world units.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 10.0;

/// Distance at which a route click counts as reaching a door.
pub const DEFAULT_DOOR_END_SNAP_TOLERANCE: f64 = 15.0;

/// Wall placement tolerance as a multiple of wall thickness.
pub const WALL_PLACEMENT_FACTOR: f64 = 1.5;

/// Extra slop added to half the wall thickness when hit-testing walls.
pub const WALL_HIT_SLOP: f64 = 2.0;

/// Two openings on one wall may touch within this much without overlapping.
pub const OVERLAP_TOLERANCE: f64 = 0.1;

/// Half-size of a handle hit box in screen pixels.
pub const DEFAULT_HANDLE_RADIUS_PX: f64 = 6.0;

// ── Minimum sizes ───────────────────────────────────────────────

/// Shortest door or window that may be committed.
pub const DEFAULT_MIN_OPENING_LENGTH: f64 = 10.0;

/// Shortest drag span that creates a new wall or shape.
pub const DEFAULT_MIN_ELEMENT_SIZE: f64 = 3.0;

/// Smallest width or height a rect can be resized to.
pub const MIN_RECT_DIMENSION: f64 = 5.0;

/// Side length of an emergency kit's fixed footprint.
pub const DEFAULT_KIT_SIZE: f64 = 20.0;

// ── Camera ──────────────────────────────────────────────────────

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Zoom multiplier per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;
