//! Ingest of raw wire records into typed working batches
//!
//! The upstream feed delivers breadcrumbs as JSON objects whose values are a
//! mix of numbers and numeric strings. Ingest converts one batch of such
//! records into a [`BreadcrumbBatch`], checking only that the required
//! columns exist: individual unparsable values become missing sentinels for
//! the validators to handle, never errors.

use crate::app::models::{Breadcrumb, BreadcrumbBatch, RawStopEvent};
use crate::constants::{columns, stop_event_columns, REQUIRED_BREADCRUMB_COLUMNS};
use crate::error::{PipelineError, Result};
use serde_json::Value;
use tracing::debug;

/// Convert raw JSON wire records into a breadcrumb working batch.
///
/// Fails with [`PipelineError::MissingColumn`] when a required column is
/// absent from every record in the batch.
pub fn breadcrumbs_from_json(rows: &[Value]) -> Result<BreadcrumbBatch> {
    if rows.is_empty() {
        return Ok(BreadcrumbBatch::default());
    }
    require_columns(rows, REQUIRED_BREADCRUMB_COLUMNS)?;

    let records = rows
        .iter()
        .map(|row| Breadcrumb {
            trip_id: opt_i64(row, columns::TRIP_ID),
            stop_id: opt_i64(row, columns::STOP_ID),
            vehicle_id: opt_i64(row, columns::VEHICLE_ID),
            opd_date_raw: opt_string(row, columns::OPD_DATE),
            opd_date: None,
            act_time: opt_i64(row, columns::ACT_TIME),
            meters: opt_f64(row, columns::METERS),
            latitude: opt_f64(row, columns::LATITUDE),
            longitude: opt_f64(row, columns::LONGITUDE),
            direction: opt_i64(row, columns::DIRECTION),
            speed: None,
            timestamp: None,
            service_key: None,
        })
        .collect();

    let batch = BreadcrumbBatch::new(records);
    debug!(rows = batch.len(), "Ingested breadcrumb batch");
    Ok(batch)
}

/// Convert raw JSON stop-event records into working rows.
pub fn stop_events_from_json(rows: &[Value]) -> Result<Vec<RawStopEvent>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    require_columns(
        rows,
        &[
            stop_event_columns::TRIP_ID,
            stop_event_columns::VEHICLE_NUMBER,
            stop_event_columns::ROUTE_NUMBER,
            stop_event_columns::DIRECTION,
            stop_event_columns::SERVICE_KEY,
        ],
    )?;

    Ok(rows
        .iter()
        .map(|row| RawStopEvent {
            trip_id: opt_i64(row, stop_event_columns::TRIP_ID),
            vehicle_number: opt_i64(row, stop_event_columns::VEHICLE_NUMBER),
            route_number: opt_i64(row, stop_event_columns::ROUTE_NUMBER),
            direction: opt_i64(row, stop_event_columns::DIRECTION),
            service_key: opt_string(row, stop_event_columns::SERVICE_KEY),
        })
        .collect())
}

fn require_columns(rows: &[Value], required: &[&str]) -> Result<()> {
    for &column in required {
        let present = rows
            .iter()
            .any(|row| row.as_object().is_some_and(|obj| obj.contains_key(column)));
        if !present {
            return Err(PipelineError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Read an integer field, coercing numeric strings and integral floats
fn opt_i64(row: &Value, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.fract() == 0.0)
                        .map(|v| v as i64)
                })
        }
        _ => None,
    }
}

/// Read a float field, coercing numeric strings
fn opt_f64(row: &Value, key: &str) -> Option<f64> {
    match row.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read a text field, trimming whitespace
fn opt_string(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_record() -> Value {
        json!({
            "EVENT_NO_TRIP": "168552561",
            "EVENT_NO_STOP": 168552562,
            "VEHICLE_ID": "3909",
            "OPD_DATE": "08DEC2022:00:00:00",
            "ACT_TIME": "61022",
            "METERS": "not-a-number",
            "GPS_LATITUDE": "45.523456",
            "GPS_LONGITUDE": -122.676208,
            "DIRECTION": "0"
        })
    }

    #[test]
    fn ingests_mixed_string_and_number_values() {
        let batch = breadcrumbs_from_json(&[wire_record()]).unwrap();
        let record = &batch.records[0];

        assert_eq!(record.trip_id, Some(168552561));
        assert_eq!(record.stop_id, Some(168552562));
        assert_eq!(record.vehicle_id, Some(3909));
        assert_eq!(record.act_time, Some(61022));
        assert_eq!(record.latitude, Some(45.523456));
        assert_eq!(record.longitude, Some(-122.676208));
        assert_eq!(record.direction, Some(0));
        assert_eq!(record.opd_date_raw.as_deref(), Some("08DEC2022:00:00:00"));
        // Garbled odometer reading becomes a missing sentinel
        assert_eq!(record.meters, None);
        // Parsed date and derived fields start unset
        assert_eq!(record.opd_date, None);
        assert_eq!(record.speed, None);
    }

    #[test]
    fn missing_required_column_is_structural() {
        let mut row = wire_record();
        row.as_object_mut().unwrap().remove("GPS_LATITUDE");

        let error = breadcrumbs_from_json(&[row]).unwrap_err();
        assert!(matches!(
            error,
            PipelineError::MissingColumn { column } if column == "GPS_LATITUDE"
        ));
    }

    #[test]
    fn direction_is_optional() {
        let mut row = wire_record();
        row.as_object_mut().unwrap().remove("DIRECTION");

        let batch = breadcrumbs_from_json(&[row]).unwrap();
        assert_eq!(batch.records[0].direction, None);
    }

    #[test]
    fn empty_input_produces_empty_batch() {
        let batch = breadcrumbs_from_json(&[]).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn ingests_stop_events() {
        let rows = vec![json!({
            "trip_id": 168552561,
            "vehicle_number": "3909",
            "route_number": 75,
            "direction": 1,
            "service_key": "W"
        })];

        let events = stop_events_from_json(&rows).unwrap();
        assert_eq!(events[0].trip_id, Some(168552561));
        assert_eq!(events[0].vehicle_number, Some(3909));
        assert_eq!(events[0].route_number, Some(75));
        assert_eq!(events[0].direction, Some(1));
        assert_eq!(events[0].service_key.as_deref(), Some("W"));
    }
}
