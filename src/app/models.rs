//! Data models for breadcrumb processing
//!
//! Core data structures for one breadcrumb sample, the mutable working batch
//! the pipeline threads through its stages, stop events, and the clean output
//! shapes handed to the persistence collaborator.
//!
//! Every raw field on a working record is an `Option`: `None` is the missing
//! sentinel validators set when a value fails its predicate, and the
//! interpolation engine fills. Derived fields start `None` and are populated
//! by the derivation stage.

use crate::constants::OPD_DATE_FORMAT;
use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerated Field Values
// =============================================================================

/// Service-day classification of a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKey {
    Weekday,
    Saturday,
    Sunday,
}

impl ServiceKey {
    /// Classify a calendar weekday
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat => ServiceKey::Saturday,
            Weekday::Sun => ServiceKey::Sunday,
            _ => ServiceKey::Weekday,
        }
    }

    /// Decode the single-letter wire encoding used by stop events.
    /// 'M' is the MLK-day special case the upstream feed emits; it runs a
    /// weekday schedule.
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "W" | "M" => Some(ServiceKey::Weekday),
            "S" => Some(ServiceKey::Saturday),
            "U" => Some(ServiceKey::Sunday),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKey::Weekday => "Weekday",
            ServiceKey::Saturday => "Saturday",
            ServiceKey::Sunday => "Sunday",
        }
    }
}

/// Direction of travel along a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Out,
    Back,
}

impl Direction {
    /// Decode the 0/1 wire encoding
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Direction::Out),
            1 => Some(Direction::Back),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Out => "Out",
            Direction::Back => "Back",
        }
    }
}

// =============================================================================
// Field Identifiers
// =============================================================================

/// Identifies one validated field of a breadcrumb record
///
/// Used by the validator policy table and for numeric column access on the
/// working batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TripId,
    StopId,
    VehicleId,
    OpdDate,
    ActTime,
    Meters,
    Latitude,
    Longitude,
    Direction,
    Speed,
}

impl Field {
    /// Field name for diagnostics and error reporting
    pub fn name(&self) -> &'static str {
        match self {
            Field::TripId => "trip_id",
            Field::StopId => "stop_id",
            Field::VehicleId => "vehicle_id",
            Field::OpdDate => "opd_date",
            Field::ActTime => "act_time",
            Field::Meters => "meters",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Direction => "direction",
            Field::Speed => "speed",
        }
    }
}

// =============================================================================
// Working Records
// =============================================================================

/// One breadcrumb sample in the working batch
///
/// Raw fields mirror the wire columns; `speed`, `timestamp`, and
/// `service_key` are computed by the derivation stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Breadcrumb {
    pub trip_id: Option<i64>,
    pub stop_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    /// Operational date as it arrived off the wire. The date validator
    /// parses it into `opd_date` and re-formats it canonically after repair.
    pub opd_date_raw: Option<String>,
    pub opd_date: Option<NaiveDateTime>,
    /// Elapsed seconds since midnight of the operational date
    pub act_time: Option<i64>,
    /// Odometer distance traveled, meters
    pub meters: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Raw direction flag. Validated but never repaired.
    pub direction: Option<i64>,

    // Derived fields
    pub speed: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
    pub service_key: Option<ServiceKey>,
}

impl Breadcrumb {
    /// Re-format the operational date back to its canonical wire string,
    /// e.g. "08DEC2022:00:00:00"
    pub fn canonical_opd_date(&self) -> Option<String> {
        self.opd_date
            .map(|date| date.format(OPD_DATE_FORMAT).to_string().to_uppercase())
    }
}

/// The mutable working collection threaded through all pipeline stages
///
/// Row order represents acquisition order and is preserved across
/// validate/repair cycles; stages remove rows only where their contract
/// says so.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreadcrumbBatch {
    pub records: Vec<Breadcrumb>,
}

impl BreadcrumbBatch {
    pub fn new(records: Vec<Breadcrumb>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extract one field as a numeric series for the interpolation engine.
    ///
    /// Dates are represented as epoch seconds so time-weighted interpolation
    /// works on the same series type as every numeric column.
    pub fn numeric_series(&self, field: Field) -> Vec<Option<f64>> {
        self.records
            .iter()
            .map(|record| match field {
                Field::TripId => record.trip_id.map(|v| v as f64),
                Field::StopId => record.stop_id.map(|v| v as f64),
                Field::VehicleId => record.vehicle_id.map(|v| v as f64),
                Field::OpdDate => record.opd_date.map(|d| d.and_utc().timestamp() as f64),
                Field::ActTime => record.act_time.map(|v| v as f64),
                Field::Meters => record.meters,
                Field::Latitude => record.latitude,
                Field::Longitude => record.longitude,
                Field::Direction => record.direction.map(|v| v as f64),
                Field::Speed => record.speed,
            })
            .collect()
    }

    /// Write a numeric series back into the batch, rounding integer fields.
    ///
    /// Panics if the series length does not match the batch; callers always
    /// write back a series extracted from the same batch.
    pub fn set_numeric_series(&mut self, field: Field, series: &[Option<f64>]) {
        assert_eq!(series.len(), self.records.len());
        for (record, value) in self.records.iter_mut().zip(series.iter().copied()) {
            match field {
                Field::TripId => record.trip_id = value.map(|v| v.round() as i64),
                Field::StopId => record.stop_id = value.map(|v| v.round() as i64),
                Field::VehicleId => record.vehicle_id = value.map(|v| v.round() as i64),
                Field::OpdDate => {
                    record.opd_date = value
                        .and_then(|v| chrono::DateTime::from_timestamp(v.round() as i64, 0))
                        .map(|dt| dt.naive_utc());
                }
                Field::ActTime => record.act_time = value.map(|v| v.round() as i64),
                Field::Meters => record.meters = value,
                Field::Latitude => record.latitude = value,
                Field::Longitude => record.longitude = value,
                Field::Direction => record.direction = value.map(|v| v.round() as i64),
                Field::Speed => record.speed = value,
            }
        }
    }

    /// Remove rows by index, preserving the relative order of survivors.
    /// Returns the number of rows removed.
    pub fn remove_rows(&mut self, indices: &[usize]) -> usize {
        if indices.is_empty() {
            return 0;
        }
        let mut keep = vec![true; self.records.len()];
        for &index in indices {
            keep[index] = false;
        }
        let before = self.records.len();
        let mut position = 0;
        self.records.retain(|_| {
            let kept = keep[position];
            position += 1;
            kept
        });
        before - self.records.len()
    }
}

// =============================================================================
// Stop Events
// =============================================================================

/// One stop event as parsed off the wire, before validation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawStopEvent {
    pub trip_id: Option<i64>,
    pub vehicle_number: Option<i64>,
    pub route_number: Option<i64>,
    pub direction: Option<i64>,
    pub service_key: Option<String>,
}

/// A validated, schema-conformant stop event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopEvent {
    pub trip_id: i64,
    pub vehicle_id: i64,
    pub route_id: i64,
    pub direction: Direction,
    pub service_key: ServiceKey,
}

// =============================================================================
// Clean Output Shapes
// =============================================================================

/// One clean breadcrumb in the persisted schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanBreadcrumb {
    pub tstamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub trip_id: i64,
}

/// One (trip, vehicle) association in the persisted schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripRecord {
    pub trip_id: i64,
    pub vehicle_id: i64,
}
