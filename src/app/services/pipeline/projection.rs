//! Schema projection into the persisted shape
//!
//! The final rename/drop/select step. No validation happens here: the
//! orchestrator guarantees every surviving row is complete, and an unset
//! field at this point is reported as-is rather than repaired.

use crate::app::models::{BreadcrumbBatch, CleanBreadcrumb, TripRecord};
use crate::error::{PipelineError, Result};
use std::collections::HashSet;

/// Project the validated batch into clean breadcrumb rows.
///
/// Maps wire names to the persisted schema (EVENT_NO_TRIP → trip_id,
/// GPS_LATITUDE → latitude, …) and drops everything else.
pub fn project_breadcrumbs(batch: &BreadcrumbBatch) -> Result<Vec<CleanBreadcrumb>> {
    batch
        .records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            Ok(CleanBreadcrumb {
                tstamp: record.timestamp.ok_or(PipelineError::IncompleteRecord {
                    row,
                    field: "timestamp",
                })?,
                latitude: record.latitude.ok_or(PipelineError::IncompleteRecord {
                    row,
                    field: "latitude",
                })?,
                longitude: record.longitude.ok_or(PipelineError::IncompleteRecord {
                    row,
                    field: "longitude",
                })?,
                speed: record.speed.ok_or(PipelineError::IncompleteRecord {
                    row,
                    field: "speed",
                })?,
                trip_id: record.trip_id.ok_or(PipelineError::IncompleteRecord {
                    row,
                    field: "trip_id",
                })?,
            })
        })
        .collect()
}

/// Project the distinct (trip, vehicle) associations, first occurrence kept
pub fn project_trips(batch: &BreadcrumbBatch) -> Result<Vec<TripRecord>> {
    let mut seen: HashSet<i64> = HashSet::new();
    let mut trips = Vec::new();

    for (row, record) in batch.records.iter().enumerate() {
        let trip_id = record.trip_id.ok_or(PipelineError::IncompleteRecord {
            row,
            field: "trip_id",
        })?;
        if !seen.insert(trip_id) {
            continue;
        }
        trips.push(TripRecord {
            trip_id,
            vehicle_id: record.vehicle_id.ok_or(PipelineError::IncompleteRecord {
                row,
                field: "vehicle_id",
            })?,
        });
    }

    Ok(trips)
}
