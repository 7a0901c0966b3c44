//! Pipeline statistics and result structures
//!
//! Tracks what each stage did to the batch: rows removed (and by which
//! policy), values repaired by interpolation, and fields flagged without
//! repair. The final outcome bundles the clean projected tables with these
//! counters.

use crate::app::models::{CleanBreadcrumb, TripRecord};

/// Statistics for one pipeline run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineStats {
    /// Number of input rows
    pub total_input: usize,
    /// Rows removed because the trip id was unparsable
    pub rows_removed_structural: usize,
    /// Rows removed by the leading/trailing edge-drop ahead of interpolation
    pub rows_removed_edges: usize,
    /// Individual field values repaired by interpolation
    pub values_interpolated: usize,
    /// Direction values flagged invalid (never repaired)
    pub direction_flagged: usize,
    /// Speed values left undefined by zero or negative time deltas
    pub zero_delta_speeds: usize,
    /// Rows dropped because their trip group had a single record
    pub single_row_trips_dropped: usize,
    /// Rows removed as duplicate (timestamp, trip_id) pairs
    pub duplicates_removed: usize,
    /// Rows removed while resolving multi-vehicle trips
    pub multi_vehicle_rows_removed: usize,
    /// Number of clean output rows
    pub final_output: usize,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows removed across all stages
    pub fn rows_removed(&self) -> usize {
        self.rows_removed_structural
            + self.rows_removed_edges
            + self.single_row_trips_dropped
            + self.duplicates_removed
            + self.multi_vehicle_rows_removed
    }

    /// Fraction of input rows surviving to the output, as a percentage
    pub fn survival_rate(&self) -> f64 {
        if self.total_input == 0 {
            100.0
        } else {
            (self.final_output as f64 / self.total_input as f64) * 100.0
        }
    }

    /// Check if processing kept most of the batch (>90% survival)
    pub fn is_successful(&self) -> bool {
        self.survival_rate() > 90.0
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Pipeline summary: {} -> {} rows ({:.1}% kept) | \
             interpolated {} values | removed: {} structural, {} edge, \
             {} single-row-trip, {} duplicate, {} multi-vehicle | \
             {} direction values flagged",
            self.total_input,
            self.final_output,
            self.survival_rate(),
            self.values_interpolated,
            self.rows_removed_structural,
            self.rows_removed_edges,
            self.single_row_trips_dropped,
            self.duplicates_removed,
            self.multi_vehicle_rows_removed,
            self.direction_flagged
        )
    }
}

/// Result of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Clean breadcrumbs in the persisted schema
    pub breadcrumbs: Vec<CleanBreadcrumb>,
    /// Distinct (trip, vehicle) associations
    pub trips: Vec<TripRecord>,
    /// Processing statistics
    pub stats: PipelineStats,
}

impl PipelineOutcome {
    pub fn new(
        breadcrumbs: Vec<CleanBreadcrumb>,
        trips: Vec<TripRecord>,
        stats: PipelineStats,
    ) -> Self {
        Self {
            breadcrumbs,
            trips,
            stats,
        }
    }

    /// Number of clean breadcrumb rows
    pub fn record_count(&self) -> usize {
        self.breadcrumbs.len()
    }

    /// Summary string for logging
    pub fn summary(&self) -> String {
        self.stats.summary()
    }
}
