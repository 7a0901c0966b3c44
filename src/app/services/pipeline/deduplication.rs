//! Uniqueness and referential checks over the derived batch
//!
//! Two global rules run after derivation: no two rows may share a
//! (timestamp, trip_id) pair, and every trip must be served by exactly one
//! vehicle. Both are resolved by documented row removal; the multi-vehicle
//! rule can instead fail the batch under strict configuration.

use crate::app::models::BreadcrumbBatch;
use crate::config::DuplicateTieBreak;
use crate::error::{PipelineError, Result};
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::stats::PipelineStats;

/// Remove rows carrying a (timestamp, trip_id) pair already claimed by
/// another row. Which occurrence survives is the configured tie-break.
///
/// Returns the number of rows removed.
pub fn remove_duplicate_pairs(
    batch: &mut BreadcrumbBatch,
    tie_break: DuplicateTieBreak,
    stats: &mut PipelineStats,
) -> Result<usize> {
    let keys = pair_keys(batch)?;

    let mut seen: HashSet<(NaiveDateTime, i64)> = HashSet::new();
    let mut losers: Vec<usize> = Vec::new();

    let rows: Vec<usize> = match tie_break {
        DuplicateTieBreak::KeepFirst => (0..keys.len()).collect(),
        DuplicateTieBreak::KeepLast => (0..keys.len()).rev().collect(),
    };
    for row in rows {
        if !seen.insert(keys[row]) {
            losers.push(row);
        }
    }

    let removed = batch.remove_rows(&losers);
    if removed > 0 {
        stats.duplicates_removed += removed;
        debug!(removed, ?tie_break, "Removed duplicate (timestamp, trip) rows");
    }
    Ok(removed)
}

/// Enforce one vehicle per trip.
///
/// When `resolve` is set, trips served by several vehicle ids keep the
/// majority vehicle's rows (first-seen wins ties) and shed the rest.
/// Otherwise the first violating trip fails the batch.
pub fn resolve_trip_vehicles(
    batch: &mut BreadcrumbBatch,
    resolve: bool,
    stats: &mut PipelineStats,
) -> Result<usize> {
    let mut trip_order: Vec<i64> = Vec::new();
    // Per trip: vehicle ids in first-seen order with their row counts
    let mut vehicles_by_trip: HashMap<i64, Vec<(i64, usize)>> = HashMap::new();

    for (row, record) in batch.records.iter().enumerate() {
        let trip_id = record.trip_id.ok_or(PipelineError::IncompleteRecord {
            row,
            field: "trip_id",
        })?;
        let vehicle_id = record.vehicle_id.ok_or(PipelineError::IncompleteRecord {
            row,
            field: "vehicle_id",
        })?;

        let vehicles = vehicles_by_trip.entry(trip_id).or_default();
        if vehicles.is_empty() {
            trip_order.push(trip_id);
        }
        match vehicles.iter_mut().find(|(id, _)| *id == vehicle_id) {
            Some((_, count)) => *count += 1,
            None => vehicles.push((vehicle_id, 1)),
        }
    }

    let mut losers: Vec<usize> = Vec::new();
    for trip_id in trip_order {
        let vehicles = &vehicles_by_trip[&trip_id];
        if vehicles.len() <= 1 {
            continue;
        }

        if !resolve {
            return Err(PipelineError::ReferentialViolation {
                trip_id,
                vehicle_ids: vehicles.iter().map(|(id, _)| *id).collect(),
            });
        }

        // Majority vehicle wins; first-seen order breaks ties
        let mut keeper = vehicles[0].0;
        let mut best = vehicles[0].1;
        for &(vehicle_id, count) in &vehicles[1..] {
            if count > best {
                keeper = vehicle_id;
                best = count;
            }
        }
        debug!(
            trip_id,
            keeper,
            vehicles = vehicles.len(),
            "Resolving multi-vehicle trip by row removal"
        );

        losers.extend(batch.records.iter().enumerate().filter_map(|(row, record)| {
            (record.trip_id == Some(trip_id) && record.vehicle_id != Some(keeper)).then_some(row)
        }));
    }

    let removed = batch.remove_rows(&losers);
    stats.multi_vehicle_rows_removed += removed;
    Ok(removed)
}

fn pair_keys(batch: &BreadcrumbBatch) -> Result<Vec<(NaiveDateTime, i64)>> {
    batch
        .records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let timestamp = record.timestamp.ok_or(PipelineError::IncompleteRecord {
                row,
                field: "timestamp",
            })?;
            let trip_id = record.trip_id.ok_or(PipelineError::IncompleteRecord {
                row,
                field: "trip_id",
            })?;
            Ok((timestamp, trip_id))
        })
        .collect()
}
