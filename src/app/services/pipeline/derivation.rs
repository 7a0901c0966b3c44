//! Trip-grouped derivation of computed fields
//!
//! Partitions the batch by trip id, preserving intra-trip acquisition order,
//! and computes per group:
//! - speed from consecutive odometer/time deltas, with row 0 copying row 1
//! - the absolute timestamp from the operational date plus act_time seconds
//! - the service-day key from the operational date's weekday
//!
//! A diff is never computed across a trip boundary. Zero or negative time
//! deltas leave speed missing rather than producing infinities; those gaps
//! are filled by the speed repair in post-validation. Single-row groups have
//! no defined speed and are reported for removal.

use crate::app::models::{BreadcrumbBatch, ServiceKey};
use crate::error::{PipelineError, Result};
use chrono::{Datelike, Duration};
use std::collections::HashMap;
use tracing::debug;

use super::stats::PipelineStats;

/// What derivation could not define, for the post-validation stage to act on
#[derive(Debug, Clone, Default)]
pub struct DerivationReport {
    /// Rows whose trip group holds a single record; speed is undefined and
    /// the rows are dropped in post-validation
    pub single_row_trip_rows: Vec<usize>,
}

/// Compute speed, timestamp, and service key for every row.
///
/// Requires a clean structural pass: every trip id, odometer value,
/// act_time, and operational date must be present.
pub fn derive(batch: &mut BreadcrumbBatch, stats: &mut PipelineStats) -> Result<DerivationReport> {
    let groups = trip_groups(batch)?;
    let mut report = DerivationReport::default();

    // Snapshot the inputs so group passes can index freely
    let meters: Vec<f64> = required_column(batch, |r| r.meters, "meters")?;
    let act_times: Vec<i64> = required_column(batch, |r| r.act_time, "act_time")?;

    for (trip_id, rows) in &groups {
        if rows.len() == 1 {
            report.single_row_trip_rows.push(rows[0]);
            debug!(trip_id, row = rows[0], "Single-row trip has no defined speed");
            continue;
        }

        let mut speeds: Vec<Option<f64>> = vec![None; rows.len()];
        for k in 1..rows.len() {
            let delta_meters = meters[rows[k]] - meters[rows[k - 1]];
            let delta_time = act_times[rows[k]] - act_times[rows[k - 1]];
            if delta_time > 0 {
                speeds[k] = Some(delta_meters / delta_time as f64);
            } else {
                stats.zero_delta_speeds += 1;
            }
        }
        // The first sample has no predecessor; copy the first computed speed
        speeds[0] = speeds[1];

        for (k, &row) in rows.iter().enumerate() {
            batch.records[row].speed = speeds[k];
        }
    }
    report.single_row_trip_rows.sort_unstable();

    for (row, record) in batch.records.iter_mut().enumerate() {
        let date = record
            .opd_date
            .ok_or(PipelineError::IncompleteRecord {
                row,
                field: "opd_date",
            })?;
        let offset = record.act_time.ok_or(PipelineError::IncompleteRecord {
            row,
            field: "act_time",
        })?;
        // An offset too large to represent as a point in time fails the
        // batch; it passed the non-negative predicate but no repair applies
        let timestamp = Duration::try_seconds(offset)
            .and_then(|delta| date.checked_add_signed(delta))
            .ok_or_else(|| {
                PipelineError::invariant_violated("derivation", "act_time", vec![row])
            })?;
        record.timestamp = Some(timestamp);
        record.service_key = Some(ServiceKey::from_weekday(date.weekday()));
    }

    Ok(report)
}

/// Partition row indices by trip id, preserving first-seen trip order and
/// intra-trip acquisition order
fn trip_groups(batch: &BreadcrumbBatch) -> Result<Vec<(i64, Vec<usize>)>> {
    let mut order: Vec<i64> = Vec::new();
    let mut rows_by_trip: HashMap<i64, Vec<usize>> = HashMap::new();

    for (row, record) in batch.records.iter().enumerate() {
        let trip_id = record.trip_id.ok_or(PipelineError::IncompleteRecord {
            row,
            field: "trip_id",
        })?;
        let entry = rows_by_trip.entry(trip_id).or_default();
        if entry.is_empty() {
            order.push(trip_id);
        }
        entry.push(row);
    }

    Ok(order
        .into_iter()
        .map(|trip_id| {
            let rows = rows_by_trip.remove(&trip_id).unwrap_or_default();
            (trip_id, rows)
        })
        .collect())
}

fn required_column<T, F>(batch: &BreadcrumbBatch, get: F, field: &'static str) -> Result<Vec<T>>
where
    F: Fn(&crate::app::models::Breadcrumb) -> Option<T>,
{
    batch
        .records
        .iter()
        .enumerate()
        .map(|(row, record)| get(record).ok_or(PipelineError::IncompleteRecord { row, field }))
        .collect()
}
