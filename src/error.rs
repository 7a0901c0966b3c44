//! Error handling for breadcrumb processing operations.
//!
//! Field-level invalidity is data, not control flow: validators record bad
//! values through missing sentinels and repair them in place. Only batch-level
//! unrecoverable conditions surface here, carrying the stage, field, and row
//! indices a caller needs to diagnose the failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Required column '{column}' missing from input batch")]
    MissingColumn { column: String },

    #[error("Cannot process an empty record batch")]
    EmptyBatch,

    #[error(
        "Unrepairable gap in stage {stage}: field '{field}' still missing after interpolation at rows {rows:?}"
    )]
    UnrepairableGap {
        stage: &'static str,
        field: &'static str,
        rows: Vec<usize>,
    },

    #[error(
        "Invariant violated in stage {stage}: field '{field}' failed validation at rows {rows:?}"
    )]
    InvariantViolated {
        stage: &'static str,
        field: &'static str,
        rows: Vec<usize>,
    },

    #[error("Trip {trip_id} is associated with multiple vehicles: {vehicle_ids:?}")]
    ReferentialViolation {
        trip_id: i64,
        vehicle_ids: Vec<i64>,
    },

    #[error("Record at row {row} reached projection with an unset field '{field}'")]
    IncompleteRecord { row: usize, field: &'static str },
}

impl PipelineError {
    /// Create an unrepairable-gap error from a missing-value mask
    pub fn unrepairable_gap(
        stage: &'static str,
        field: &'static str,
        rows: Vec<usize>,
    ) -> Self {
        Self::UnrepairableGap { stage, field, rows }
    }

    /// Create an invariant-violation error from an invalid-row mask
    pub fn invariant_violated(
        stage: &'static str,
        field: &'static str,
        rows: Vec<usize>,
    ) -> Self {
        Self::InvariantViolated { stage, field, rows }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
