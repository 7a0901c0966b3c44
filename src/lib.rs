//! Breadcrumb Processor Library
//!
//! A Rust library for cleaning transit vehicle breadcrumb data (GPS + odometer
//! samples) and stop events before durable storage and geospatial queries.
//!
//! This library provides tools for:
//! - Converting raw JSON wire records into a typed working batch
//! - Validating every field against its domain predicate
//! - Repairing bad values by interpolation or documented row removal
//! - Deriving per-trip speed, absolute timestamps, and service-day keys
//! - Enforcing uniqueness and one-vehicle-per-trip referential rules
//! - Projecting the clean batch into the persisted schema
//!
//! The pipeline is synchronous and operates on one in-memory batch at a time;
//! fetching, message-bus transport, and persistence are external collaborators.

pub mod config;
pub mod constants;
pub mod error;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod ingest;
        pub mod interpolation;
        pub mod pipeline;
        pub mod stop_events;
    }
}

// Re-export commonly used types
pub use app::models::{Breadcrumb, BreadcrumbBatch, Direction, ServiceKey};
pub use app::services::pipeline::{Pipeline, PipelineOutcome, PipelineStats};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
