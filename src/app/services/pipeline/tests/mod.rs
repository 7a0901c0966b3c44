//! Tests for the validation pipeline
//!
//! Shared fixtures live here; per-component tests in the submodules.


use crate::app::models::{Breadcrumb, BreadcrumbBatch};
use chrono::{NaiveDate, NaiveDateTime};

/// A December 2022 service date at midnight (the 8th is a Thursday)
pub fn service_date(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 12, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// A fully valid breadcrumb, parsed date included
pub fn crumb(trip_id: i64, act_time: i64, meters: f64) -> Breadcrumb {
    let date = service_date(8);
    Breadcrumb {
        trip_id: Some(trip_id),
        stop_id: Some(trip_id + 1),
        vehicle_id: Some(3909),
        opd_date_raw: Some("08DEC2022:00:00:00".to_string()),
        opd_date: Some(date),
        act_time: Some(act_time),
        meters: Some(meters),
        latitude: Some(45.52),
        longitude: Some(-122.68),
        direction: Some(0),
        speed: None,
        timestamp: None,
        service_key: None,
    }
}

/// A batch of valid breadcrumbs for one trip, ten seconds and fifty meters
/// apart
pub fn trip_batch(trip_id: i64, rows: usize) -> BreadcrumbBatch {
    BreadcrumbBatch::new(
        (0..rows)
            .map(|i| crumb(trip_id, i as i64 * 10, i as f64 * 50.0))
            .collect(),
    )
}

/// Concatenate batches preserving row order
pub fn merge(batches: Vec<BreadcrumbBatch>) -> BreadcrumbBatch {
    BreadcrumbBatch::new(
        batches
            .into_iter()
            .flat_map(|batch| batch.records)
            .collect(),
    )
}
