//! Stop-event validation and transformation
//!
//! Stop events are a smaller companion feed to breadcrumbs: one row per
//! scheduled stop with trip, vehicle, route, direction, and service-key
//! fields. Unlike breadcrumbs there is nothing to interpolate; invalid rows
//! are simply removed, then the survivors are deduplicated by trip and
//! renamed into the persisted schema with the wire encodings decoded
//! (direction 0/1 → Out/Back, service-key letter → service-day enum).

use crate::app::models::{Direction, RawStopEvent, ServiceKey, StopEvent};
use std::collections::HashSet;
use tracing::{debug, info};

/// Statistics for one stop-event processing run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopEventStats {
    pub total_input: usize,
    /// Rows removed for failing a field predicate
    pub rows_removed_invalid: usize,
    /// Rows removed as repeat trip ids (first occurrence kept)
    pub duplicates_removed: usize,
    pub final_output: usize,
}

/// Validate, deduplicate, and transform a batch of raw stop events.
pub fn process_stop_events(raw: Vec<RawStopEvent>) -> (Vec<StopEvent>, StopEventStats) {
    let mut stats = StopEventStats {
        total_input: raw.len(),
        ..Default::default()
    };

    let mut seen_trips: HashSet<i64> = HashSet::new();
    let mut events = Vec::new();

    for row in &raw {
        let Some(event) = decode_stop_event(row) else {
            stats.rows_removed_invalid += 1;
            debug!(?row, "Removed invalid stop event");
            continue;
        };
        if !seen_trips.insert(event.trip_id) {
            stats.duplicates_removed += 1;
            continue;
        }
        events.push(event);
    }

    stats.final_output = events.len();
    info!(
        total = stats.total_input,
        kept = stats.final_output,
        invalid = stats.rows_removed_invalid,
        duplicate = stats.duplicates_removed,
        "Stop-event processing complete"
    );
    (events, stats)
}

/// Decode one raw stop event, or `None` when any field fails its predicate.
///
/// Ids must be non-negative integers, direction must be 0 or 1, and the
/// service key must be one of the letters the feed emits (S, U, W, M).
pub fn decode_stop_event(raw: &RawStopEvent) -> Option<StopEvent> {
    let trip_id = raw.trip_id.filter(|&id| id >= 0)?;
    let vehicle_id = raw.vehicle_number.filter(|&id| id >= 0)?;
    let route_id = raw.route_number.filter(|&id| id >= 0)?;
    let direction = raw.direction.and_then(Direction::from_raw)?;
    let service_key = raw
        .service_key
        .as_deref()
        .and_then(ServiceKey::from_letter)?;

    Some(StopEvent {
        trip_id,
        vehicle_id,
        route_id,
        direction,
        service_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_event(trip_id: i64) -> RawStopEvent {
        RawStopEvent {
            trip_id: Some(trip_id),
            vehicle_number: Some(3909),
            route_number: Some(75),
            direction: Some(0),
            service_key: Some("W".to_string()),
        }
    }

    #[test]
    fn valid_event_is_decoded_and_renamed() {
        let (events, stats) = process_stop_events(vec![raw_event(100)]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trip_id, 100);
        assert_eq!(events[0].vehicle_id, 3909);
        assert_eq!(events[0].route_id, 75);
        assert_eq!(events[0].direction, Direction::Out);
        assert_eq!(events[0].service_key, ServiceKey::Weekday);
        assert_eq!(stats.final_output, 1);
    }

    #[test]
    fn negative_ids_remove_the_row() {
        let mut bad_trip = raw_event(100);
        bad_trip.trip_id = Some(-1);
        let mut bad_route = raw_event(101);
        bad_route.route_number = Some(-75);

        let (events, stats) = process_stop_events(vec![bad_trip, raw_event(102), bad_route]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trip_id, 102);
        assert_eq!(stats.rows_removed_invalid, 2);
    }

    #[test]
    fn invalid_direction_removes_the_row() {
        let mut event = raw_event(100);
        event.direction = Some(3);

        let (events, stats) = process_stop_events(vec![event]);
        assert!(events.is_empty());
        assert_eq!(stats.rows_removed_invalid, 1);
    }

    #[test]
    fn unknown_service_key_removes_the_row() {
        let mut event = raw_event(100);
        event.service_key = Some("Q".to_string());

        let (events, _) = process_stop_events(vec![event]);
        assert!(events.is_empty());
    }

    #[test]
    fn mlk_day_letter_maps_to_weekday() {
        let mut event = raw_event(100);
        event.service_key = Some("M".to_string());

        let (events, _) = process_stop_events(vec![event]);
        assert_eq!(events[0].service_key, ServiceKey::Weekday);
    }

    #[test]
    fn repeat_trip_ids_keep_first_occurrence() {
        let mut second = raw_event(100);
        second.vehicle_number = Some(4001);

        let (events, stats) = process_stop_events(vec![raw_event(100), second, raw_event(200)]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].vehicle_id, 3909);
        assert_eq!(stats.duplicates_removed, 1);
    }
}
