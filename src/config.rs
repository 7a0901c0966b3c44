//! Configuration management for the validation pipeline.
//!
//! Provides the geographic bounding box, speed ceiling, and repair policies
//! that parameterize validation. Defaults match the Portland operating region
//! the upstream feed covers.

use crate::constants::{
    DEFAULT_MAX_LATITUDE, DEFAULT_MAX_LONGITUDE, DEFAULT_MAX_SPEED, DEFAULT_MIN_LATITUDE,
    DEFAULT_MIN_LONGITUDE,
};
use serde::{Deserialize, Serialize};

/// Geographic bounding box for the operating region
///
/// Coordinates outside the box are treated as GPS glitches and repaired by
/// interpolation from neighboring samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Self {
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    /// Check whether a latitude falls inside the box
    pub fn contains_latitude(&self, latitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
    }

    /// Check whether a longitude falls inside the box
    pub fn contains_longitude(&self, longitude: f64) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_latitude: DEFAULT_MIN_LATITUDE,
            max_latitude: DEFAULT_MAX_LATITUDE,
            min_longitude: DEFAULT_MIN_LONGITUDE,
            max_longitude: DEFAULT_MAX_LONGITUDE,
        }
    }
}

/// Which row survives when duplicate (timestamp, trip_id) pairs are removed
///
/// The upstream system was ambiguous about this, so it is configuration
/// rather than a hardcoded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateTieBreak {
    /// Keep the first occurrence in acquisition order
    KeepFirst,
    /// Keep the last occurrence in acquisition order
    KeepLast,
}

/// Configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Operating region for GPS coordinate validation
    pub bounding_box: BoundingBox,

    /// Maximum plausible derived speed in meters per second
    pub max_speed: f64,

    /// Tie-break rule for duplicate (timestamp, trip_id) removal
    pub duplicate_tie_break: DuplicateTieBreak,

    /// Resolve multi-vehicle trips by keeping the majority vehicle's rows.
    /// When false, such trips fail the batch instead.
    pub resolve_multi_vehicle_trips: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::default(),
            max_speed: DEFAULT_MAX_SPEED,
            duplicate_tie_break: DuplicateTieBreak::KeepFirst,
            resolve_multi_vehicle_trips: true,
        }
    }
}

impl PipelineConfig {
    /// Create configuration with a custom operating region
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Create configuration with a custom speed ceiling (meters per second)
    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Create configuration with a custom duplicate tie-break rule
    pub fn with_duplicate_tie_break(mut self, tie_break: DuplicateTieBreak) -> Self {
        self.duplicate_tie_break = tie_break;
        self
    }

    /// Fail the batch on multi-vehicle trips instead of resolving by removal
    pub fn with_strict_referential_checks(mut self) -> Self {
        self.resolve_multi_vehicle_trips = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounding_box_covers_portland() {
        let bbox = BoundingBox::default();
        assert!(bbox.contains_latitude(45.52));
        assert!(bbox.contains_longitude(-122.68));
        assert!(!bbox.contains_latitude(44.9));
        assert!(!bbox.contains_longitude(-121.0));
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = PipelineConfig::default()
            .with_max_speed(30.0)
            .with_duplicate_tie_break(DuplicateTieBreak::KeepLast)
            .with_strict_referential_checks();

        assert_eq!(config.max_speed, 30.0);
        assert_eq!(config.duplicate_tie_break, DuplicateTieBreak::KeepLast);
        assert!(!config.resolve_multi_vehicle_trips);
    }
}
