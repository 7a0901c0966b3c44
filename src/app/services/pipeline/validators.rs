//! Field validators and repair policies
//!
//! One predicate + repair pair per declared field, dispatched through an
//! explicit policy table instead of the dynamic per-field lookup the upstream
//! system used. `check` never mutates and returns an invalid-row mask;
//! `repair` marks offending values missing and fills them through the
//! interpolation engine, or removes rows where the field's policy says so.
//!
//! Repair policies:
//! - trip id: unparsable rows are removed (the record cannot be grouped),
//!   negative ids become missing and are interpolated
//! - latitude/longitude/meters: invalid leading/trailing rows are removed
//!   ahead of interpolation so interior gaps always have two neighbors
//! - operational date: pattern/parse failures become missing and are filled
//!   by time-weighted interpolation, then re-formatted to the canonical
//!   wire string
//! - direction: flagged but never repaired (known gap inherited from the
//!   upstream system)

use crate::app::models::{BreadcrumbBatch, Field};
use crate::app::services::interpolation::{interpolate, missing_indices, InterpolationKind};
use crate::config::PipelineConfig;
use crate::constants::{OPD_DATE_FORMAT, OPD_DATE_PATTERN};
use crate::error::{PipelineError, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::stats::PipelineStats;

/// How a field's invalid values are repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Remove rows where the value is unparsable, interpolate the rest
    DropRowWhenUnparsable,
    /// Mark invalid values missing and fill by linear interpolation
    Interpolate,
    /// Mark invalid values missing and fill by time-weighted interpolation,
    /// then re-format the canonical date string
    InterpolateDates,
    /// Remove invalid leading/trailing rows, then interpolate interior gaps
    EdgeDropThenInterpolate,
    /// Record the failure but leave the value untouched
    FlagOnly,
}

/// One entry of the field policy table
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    pub field: Field,
    pub strategy: RepairStrategy,
}

/// Policy table for raw input fields, in repair order.
///
/// Structural fields come first; the date is repaired after act_time because
/// time-weighted interpolation uses act_time as its axis.
pub fn raw_field_policies() -> Vec<FieldPolicy> {
    vec![
        FieldPolicy {
            field: Field::TripId,
            strategy: RepairStrategy::DropRowWhenUnparsable,
        },
        FieldPolicy {
            field: Field::StopId,
            strategy: RepairStrategy::Interpolate,
        },
        FieldPolicy {
            field: Field::VehicleId,
            strategy: RepairStrategy::Interpolate,
        },
        FieldPolicy {
            field: Field::ActTime,
            strategy: RepairStrategy::Interpolate,
        },
        FieldPolicy {
            field: Field::OpdDate,
            strategy: RepairStrategy::InterpolateDates,
        },
        FieldPolicy {
            field: Field::Latitude,
            strategy: RepairStrategy::EdgeDropThenInterpolate,
        },
        FieldPolicy {
            field: Field::Longitude,
            strategy: RepairStrategy::EdgeDropThenInterpolate,
        },
        FieldPolicy {
            field: Field::Meters,
            strategy: RepairStrategy::EdgeDropThenInterpolate,
        },
        FieldPolicy {
            field: Field::Direction,
            strategy: RepairStrategy::FlagOnly,
        },
    ]
}

/// Policy for the derived speed field, applied during post-validation
pub fn speed_policy() -> FieldPolicy {
    FieldPolicy {
        field: Field::Speed,
        strategy: RepairStrategy::Interpolate,
    }
}

fn opd_date_regex() -> &'static Regex {
    static OPD_DATE_RE: OnceLock<Regex> = OnceLock::new();
    OPD_DATE_RE.get_or_init(|| Regex::new(OPD_DATE_PATTERN).unwrap())
}

/// Parse a wire-format operational date, e.g. "08DEC2022:00:00:00".
///
/// Returns `None` when the string fails the pattern or does not name a real
/// point in time.
pub fn parse_opd_date(raw: &str) -> Option<NaiveDateTime> {
    if !opd_date_regex().is_match(raw) {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, OPD_DATE_FORMAT).ok()
}

/// Compute the invalid-row mask for one field. Never mutates the batch.
pub fn check(batch: &BreadcrumbBatch, field: Field, config: &PipelineConfig) -> Vec<bool> {
    batch
        .records
        .iter()
        .map(|record| match field {
            Field::TripId => !matches!(record.trip_id, Some(v) if v >= 0),
            Field::StopId => !matches!(record.stop_id, Some(v) if v >= 0),
            Field::VehicleId => !matches!(record.vehicle_id, Some(v) if v >= 0),
            Field::OpdDate => record.opd_date.is_none(),
            Field::ActTime => !matches!(record.act_time, Some(v) if v >= 0),
            Field::Meters => !matches!(record.meters, Some(v) if v >= 0.0),
            Field::Latitude => {
                !matches!(record.latitude, Some(v) if config.bounding_box.contains_latitude(v))
            }
            Field::Longitude => {
                !matches!(record.longitude, Some(v) if config.bounding_box.contains_longitude(v))
            }
            // Direction is optional; only values outside {0, 1} are flagged
            Field::Direction => matches!(record.direction, Some(v) if v != 0 && v != 1),
            Field::Speed => {
                !matches!(record.speed, Some(v) if (0.0..=config.max_speed).contains(&v))
            }
        })
        .collect()
}

/// Repair one field according to its policy.
///
/// Row removals performed here are the documented ones: unparsable trip ids
/// and the edge-drop ahead of interpolation. Any value the policy cannot
/// fill is an [`PipelineError::UnrepairableGap`].
pub fn repair(
    batch: &mut BreadcrumbBatch,
    policy: &FieldPolicy,
    config: &PipelineConfig,
    stats: &mut PipelineStats,
    stage: &'static str,
) -> Result<()> {
    match policy.strategy {
        RepairStrategy::DropRowWhenUnparsable => {
            let unparsable: Vec<usize> = batch
                .records
                .iter()
                .enumerate()
                .filter_map(|(index, record)| record.trip_id.is_none().then_some(index))
                .collect();
            if !unparsable.is_empty() {
                let removed = batch.remove_rows(&unparsable);
                stats.rows_removed_structural += removed;
                debug!(
                    field = policy.field.name(),
                    removed, "Removed rows with unparsable trip ids"
                );
            }

            let mask = check(batch, policy.field, config);
            interpolate_masked(batch, policy.field, &mask, stats, stage)
        }

        RepairStrategy::Interpolate => {
            let mask = check(batch, policy.field, config);
            interpolate_masked(batch, policy.field, &mask, stats, stage)
        }

        RepairStrategy::InterpolateDates => repair_dates(batch, stats, stage),

        RepairStrategy::EdgeDropThenInterpolate => {
            let mask = check(batch, policy.field, config);
            let len = mask.len();
            let leading = mask.iter().take_while(|&&invalid| invalid).count();
            if leading == len {
                // Nothing valid anywhere in the column
                return Err(PipelineError::unrepairable_gap(
                    stage,
                    policy.field.name(),
                    (0..len).collect(),
                ));
            }
            let trailing = mask.iter().rev().take_while(|&&invalid| invalid).count();

            let mut edge_rows: Vec<usize> = (0..leading).collect();
            edge_rows.extend(len - trailing..len);
            if !edge_rows.is_empty() {
                let removed = batch.remove_rows(&edge_rows);
                stats.rows_removed_edges += removed;
                debug!(
                    field = policy.field.name(),
                    removed, "Removed invalid edge rows ahead of interpolation"
                );
            }

            let mask = check(batch, policy.field, config);
            interpolate_masked(batch, policy.field, &mask, stats, stage)
        }

        RepairStrategy::FlagOnly => {
            let mask = check(batch, policy.field, config);
            let flagged = mask.iter().filter(|&&invalid| invalid).count();
            if flagged > 0 {
                stats.direction_flagged += flagged;
                debug!(
                    field = policy.field.name(),
                    flagged, "Flagged invalid values (no repair policy for this field)"
                );
            }
            Ok(())
        }
    }
}

/// Mark masked values missing and fill them by linear interpolation
fn interpolate_masked(
    batch: &mut BreadcrumbBatch,
    field: Field,
    mask: &[bool],
    stats: &mut PipelineStats,
    stage: &'static str,
) -> Result<()> {
    let invalid_count = mask.iter().filter(|&&invalid| invalid).count();
    if invalid_count == 0 {
        return Ok(());
    }

    let mut series = batch.numeric_series(field);
    for (value, &invalid) in series.iter_mut().zip(mask.iter()) {
        if invalid {
            *value = None;
        }
    }

    let filled = interpolate(&series, InterpolationKind::Linear);
    let still_missing = missing_indices(&filled);
    if !still_missing.is_empty() {
        return Err(PipelineError::unrepairable_gap(
            stage,
            field.name(),
            still_missing,
        ));
    }

    batch.set_numeric_series(field, &filled);
    stats.values_interpolated += invalid_count;
    debug!(
        field = field.name(),
        repaired = invalid_count,
        "Interpolated invalid values"
    );
    Ok(())
}

/// Parse, repair, and canonically re-format the operational date column.
///
/// Parse failures become missing and are filled by time-weighted
/// interpolation over the act_time axis. Every surviving row gets its wire
/// string rewritten in canonical form.
fn repair_dates(
    batch: &mut BreadcrumbBatch,
    stats: &mut PipelineStats,
    stage: &'static str,
) -> Result<()> {
    for record in &mut batch.records {
        if record.opd_date.is_none() {
            record.opd_date = record.opd_date_raw.as_deref().and_then(parse_opd_date);
        }
    }

    let series = batch.numeric_series(Field::OpdDate);
    let parse_failures = missing_indices(&series).len();
    if parse_failures > 0 {
        let axis = batch.numeric_series(Field::ActTime);
        let filled = interpolate(&series, InterpolationKind::TimeWeighted { seconds: &axis });
        let still_missing = missing_indices(&filled);
        if !still_missing.is_empty() {
            return Err(PipelineError::unrepairable_gap(
                stage,
                Field::OpdDate.name(),
                still_missing,
            ));
        }
        batch.set_numeric_series(Field::OpdDate, &filled);
        stats.values_interpolated += parse_failures;
        debug!(
            repaired = parse_failures,
            "Interpolated unparsable operational dates"
        );
    }

    for record in &mut batch.records {
        record.opd_date_raw = record.canonical_opd_date();
    }
    Ok(())
}
