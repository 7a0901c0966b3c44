//! Integration tests for the full ingest-to-projection flow
//!
//! These tests feed raw JSON wire records through ingest and the validation
//! pipeline, exercising the same path a consumer service would run per batch.

use breadcrumb_processor::app::services::ingest::{breadcrumbs_from_json, stop_events_from_json};
use breadcrumb_processor::app::services::stop_events::process_stop_events;
use breadcrumb_processor::{Pipeline, PipelineConfig, PipelineError};
use chrono::{NaiveDate, Timelike};
use serde_json::{json, Value};

/// Install the test logger so pipeline stage output is visible under
/// `cargo test -- --nocapture`. Safe to call from every test; only the
/// first installation wins.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One wire breadcrumb as the upstream feed emits it: every value a string
fn wire_crumb(trip_id: i64, act_time: i64, meters: f64) -> Value {
    json!({
        "EVENT_NO_TRIP": trip_id.to_string(),
        "EVENT_NO_STOP": (trip_id + 1).to_string(),
        "VEHICLE_ID": "3909",
        "OPD_DATE": "08DEC2022:00:00:00",
        "ACT_TIME": act_time.to_string(),
        "METERS": meters.to_string(),
        "GPS_LATITUDE": "45.523456",
        "GPS_LONGITUDE": "-122.676208",
        "DIRECTION": "0"
    })
}

/// Test the complete flow with a well-formed batch
///
/// Purpose: Validate that ingest, repair, derivation, and projection compose
/// Benefit: Catches wiring regressions no unit test sees
#[test]
fn test_clean_wire_batch_end_to_end() {
    init_logging();
    let rows: Vec<Value> = (0..6)
        .map(|i| wire_crumb(168552561, 61_000 + i * 10, (i * 50) as f64))
        .collect();

    let batch = breadcrumbs_from_json(&rows).expect("ingest should succeed");
    let outcome = Pipeline::new(PipelineConfig::default())
        .run(batch)
        .expect("pipeline should succeed");

    assert_eq!(outcome.breadcrumbs.len(), 6);
    assert_eq!(outcome.trips.len(), 1);
    assert_eq!(outcome.trips[0].trip_id, 168552561);
    assert_eq!(outcome.trips[0].vehicle_id, 3909);
    assert_eq!(outcome.stats.rows_removed(), 0);

    // Timestamps are the service date plus the act_time offset
    let first = outcome.breadcrumbs[0].tstamp;
    assert_eq!(first.date(), NaiveDate::from_ymd_opt(2022, 12, 8).unwrap());
    assert_eq!(
        first.num_seconds_from_midnight(),
        61_000
    );
    // 50 meters every 10 seconds
    assert!(outcome.breadcrumbs.iter().all(|b| b.speed == 5.0));
}

/// Test that dirty wire values are repaired rather than dropped
///
/// Purpose: Validate repair policies against realistic feed corruption
/// Benefit: Confirms survival rate stays high on messy input
#[test]
fn test_dirty_wire_batch_is_repaired() {
    init_logging();
    let mut rows: Vec<Value> = (0..8)
        .map(|i| wire_crumb(168552561, 61_000 + i * 10, (i * 50) as f64))
        .collect();
    // A GPS glitch, a garbled odometer reading, and a mangled date
    rows[2]["GPS_LATITUDE"] = json!("91.0");
    rows[4]["METERS"] = json!("n/a");
    rows[5]["OPD_DATE"] = json!("8DEC22:00:00:00");

    let batch = breadcrumbs_from_json(&rows).expect("ingest should succeed");
    let outcome = Pipeline::new(PipelineConfig::default())
        .run(batch)
        .expect("pipeline should repair the batch");

    assert_eq!(outcome.breadcrumbs.len(), 8);
    assert!(outcome.stats.is_successful());
    assert!(outcome.stats.values_interpolated >= 3);
    // The glitched coordinate was pulled back inside the operating region
    assert!((45.0..=46.0).contains(&outcome.breadcrumbs[2].latitude));
}

/// Test that a missing required column fails ingest, not the pipeline
///
/// Purpose: Validate the structural error surfaces at the boundary
/// Benefit: Misconfigured feeds are rejected with a named column
#[test]
fn test_missing_column_is_rejected_at_ingest() {
    init_logging();
    let mut row = wire_crumb(168552561, 61_000, 0.0);
    row.as_object_mut().unwrap().remove("ACT_TIME");

    let error = breadcrumbs_from_json(&[row]).unwrap_err();
    assert!(matches!(
        error,
        PipelineError::MissingColumn { column } if column == "ACT_TIME"
    ));
}

/// Test that an absurd time offset fails the batch as a result, not a crash
///
/// Purpose: Validate that unrepresentable timestamp arithmetic is a pipeline
/// error carrying the stage and field
/// Benefit: A single poisoned record cannot take down the calling service
#[test]
fn test_huge_act_time_fails_the_batch() {
    init_logging();
    let mut rows: Vec<Value> = (0..3)
        .map(|i| wire_crumb(168552561, 61_000 + i * 10, (i * 50) as f64))
        .collect();
    // Non-negative, parses as i64, but overflows date + offset arithmetic
    rows[2]["ACT_TIME"] = json!("9223372036854775000");

    let batch = breadcrumbs_from_json(&rows).expect("ingest should succeed");
    let error = Pipeline::new(PipelineConfig::default())
        .run(batch)
        .unwrap_err();

    assert!(matches!(
        error,
        PipelineError::InvariantViolated {
            stage: "derivation",
            field: "act_time",
            ..
        }
    ));
}

/// Test the stop-event companion flow from JSON to decoded rows
///
/// Purpose: Validate stop-event ingest, validation, and deduplication compose
/// Benefit: Covers the smaller feed's full path
#[test]
fn test_stop_event_flow() {
    init_logging();
    let rows = vec![
        json!({
            "trip_id": 168552561,
            "vehicle_number": 3909,
            "route_number": 75,
            "direction": 0,
            "service_key": "W"
        }),
        // Repeat of the same trip; first occurrence wins
        json!({
            "trip_id": 168552561,
            "vehicle_number": 4001,
            "route_number": 75,
            "direction": 1,
            "service_key": "W"
        }),
        // Negative route id; removed
        json!({
            "trip_id": 168552570,
            "vehicle_number": 3909,
            "route_number": -1,
            "direction": 0,
            "service_key": "S"
        }),
        json!({
            "trip_id": 168552580,
            "vehicle_number": 3910,
            "route_number": 20,
            "direction": 1,
            "service_key": "U"
        }),
    ];

    let raw = stop_events_from_json(&rows).expect("ingest should succeed");
    let (events, stats) = process_stop_events(raw);

    assert_eq!(events.len(), 2);
    assert_eq!(stats.rows_removed_invalid, 1);
    assert_eq!(stats.duplicates_removed, 1);
    assert_eq!(events[0].vehicle_id, 3909);
    assert_eq!(events[1].trip_id, 168552580);
}
