//! Application constants for the breadcrumb processor
//!
//! Wire column names, the operational date format, and the default operating
//! region used throughout the pipeline.

// =============================================================================
// Breadcrumb Wire Columns
// =============================================================================

/// Breadcrumb wire field names, as produced by the upstream feed
pub mod columns {
    pub const TRIP_ID: &str = "EVENT_NO_TRIP";
    pub const STOP_ID: &str = "EVENT_NO_STOP";
    pub const VEHICLE_ID: &str = "VEHICLE_ID";
    pub const OPD_DATE: &str = "OPD_DATE";
    pub const ACT_TIME: &str = "ACT_TIME";
    pub const METERS: &str = "METERS";
    pub const LATITUDE: &str = "GPS_LATITUDE";
    pub const LONGITUDE: &str = "GPS_LONGITUDE";
    pub const DIRECTION: &str = "DIRECTION";
}

/// Columns that must be present in every breadcrumb batch
pub const REQUIRED_BREADCRUMB_COLUMNS: &[&str] = &[
    columns::TRIP_ID,
    columns::STOP_ID,
    columns::VEHICLE_ID,
    columns::OPD_DATE,
    columns::ACT_TIME,
    columns::METERS,
    columns::LATITUDE,
    columns::LONGITUDE,
];

/// Stop-event wire field names
pub mod stop_event_columns {
    pub const TRIP_ID: &str = "trip_id";
    pub const VEHICLE_NUMBER: &str = "vehicle_number";
    pub const ROUTE_NUMBER: &str = "route_number";
    pub const DIRECTION: &str = "direction";
    pub const SERVICE_KEY: &str = "service_key";
}

// =============================================================================
// Operational Date Format
// =============================================================================

/// Operational date pattern, e.g. "08DEC2022:00:00:00"
pub const OPD_DATE_PATTERN: &str = r"^\d{2}[A-Z]{3}\d{4}:\d{2}:\d{2}:\d{2}$";

/// chrono format string matching [`OPD_DATE_PATTERN`]
pub const OPD_DATE_FORMAT: &str = "%d%b%Y:%H:%M:%S";

// =============================================================================
// Default Operating Region (Portland metro bus network)
// =============================================================================

pub const DEFAULT_MIN_LATITUDE: f64 = 45.0;
pub const DEFAULT_MAX_LATITUDE: f64 = 46.0;
pub const DEFAULT_MIN_LONGITUDE: f64 = -124.0;
pub const DEFAULT_MAX_LONGITUDE: f64 = -122.0;

/// Default upper bound for derived speed, meters per second.
/// Comfortably above anything a bus reaches; catches odometer glitches.
pub const DEFAULT_MAX_SPEED: f64 = 45.0;
