//! Editor configuration: grid, tolerances and minimum sizes.
//!
//! A floor plan may ship its own `config` object alongside its elements; it is
//! merged over the defaults when the plan is loaded. Missing keys keep their
//! defaults, and nonsensical values are replaced with defaults and logged.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    DEFAULT_DOOR_END_SNAP_TOLERANCE, DEFAULT_GRID_SIZE, DEFAULT_HANDLE_RADIUS_PX, DEFAULT_KIT_SIZE,
    DEFAULT_MIN_ELEMENT_SIZE, DEFAULT_MIN_OPENING_LENGTH, DEFAULT_SNAP_TOLERANCE, DEFAULT_UNITS_PER_METER,
    DEFAULT_WALL_THICKNESS, WALL_PLACEMENT_FACTOR,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// World units per real-world meter.
    pub units_per_meter: f64,
    /// Grid spacing for snapping.
    pub grid_size: f64,
    /// Thickness of new walls.
    pub wall_thickness: f64,
    /// Route hit tolerance.
    pub snap_tolerance: f64,
    /// Route termination distance around doors.
    pub door_end_snap_tolerance: f64,
    /// Minimum door/window length.
    pub min_opening_length: f64,
    /// Minimum drag span for a new shape.
    pub min_element_size: f64,
    /// Emergency kit footprint.
    pub kit_size: f64,
    /// Handle hit box half-size in screen pixels.
    pub handle_radius_px: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            units_per_meter: DEFAULT_UNITS_PER_METER,
            grid_size: DEFAULT_GRID_SIZE,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            door_end_snap_tolerance: DEFAULT_DOOR_END_SNAP_TOLERANCE,
            min_opening_length: DEFAULT_MIN_OPENING_LENGTH,
            min_element_size: DEFAULT_MIN_ELEMENT_SIZE,
            kit_size: DEFAULT_KIT_SIZE,
            handle_radius_px: DEFAULT_HANDLE_RADIUS_PX,
        }
    }
}

impl EditorConfig {
    /// Build a config from a loose JSON object, falling back to defaults for
    /// anything missing, malformed or out of range.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                warn!(error = %e, "ignoring malformed editor config");
                Self::default()
            }
        }
    }

    /// Replace every non-finite or non-positive field with its default.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let fields: [(&str, &mut f64, f64); 9] = [
            ("unitsPerMeter", &mut self.units_per_meter, defaults.units_per_meter),
            ("gridSize", &mut self.grid_size, defaults.grid_size),
            ("wallThickness", &mut self.wall_thickness, defaults.wall_thickness),
            ("snapTolerance", &mut self.snap_tolerance, defaults.snap_tolerance),
            ("doorEndSnapTolerance", &mut self.door_end_snap_tolerance, defaults.door_end_snap_tolerance),
            ("minOpeningLength", &mut self.min_opening_length, defaults.min_opening_length),
            ("minElementSize", &mut self.min_element_size, defaults.min_element_size),
            ("kitSize", &mut self.kit_size, defaults.kit_size),
            ("handleRadiusPx", &mut self.handle_radius_px, defaults.handle_radius_px),
        ];
        for (name, value, default) in fields {
            if !value.is_finite() || *value <= 0.0 {
                warn!(field = name, value = *value, default, "config value out of range; using default");
                *value = default;
            }
        }
        self
    }

    /// How far from a wall a door/window click may land and still attach.
    #[must_use]
    pub fn wall_placement_tolerance(&self) -> f64 {
        self.wall_thickness * WALL_PLACEMENT_FACTOR
    }

    /// Convert a world-space length to meters.
    #[must_use]
    pub fn to_meters(&self, world: f64) -> f64 {
        world / self.units_per_meter
    }
}
