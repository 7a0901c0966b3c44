//! Validation-and-repair pipeline for breadcrumb batches
//!
//! This module turns a parsed batch of breadcrumb records into a clean,
//! schema-conformant record set, repairing what it can and failing loudly on
//! what it cannot.
//!
//! # Architecture
//!
//! - [`orchestrator`] - Stage machine sequencing validate → repair →
//!   re-validate, derivation, global checks, and projection
//! - [`validators`] - Per-field predicate/repair pairs behind an explicit
//!   policy table
//! - [`derivation`] - Trip-grouped speed, timestamp, and service-key
//!   computation
//! - [`deduplication`] - Duplicate (timestamp, trip) removal and the
//!   one-vehicle-per-trip rule
//! - [`projection`] - Pure rename/drop/select into the persisted shape
//! - [`stats`] - Processing counters and the clean result bundle
//!
//! # Repair Philosophy
//!
//! Invalidity is data, not control flow. Validators record bad values as
//! missing sentinels; the interpolation engine fills them from neighboring
//! valid samples. Rows are removed only where a documented policy says so
//! (unparsable trip ids, invalid edge rows, single-row trips, duplicates,
//! multi-vehicle trips). Only batch-level unrecoverable conditions become
//! errors, each naming the stage, field, and rows involved.

pub mod deduplication;
pub mod derivation;
pub mod orchestrator;
pub mod projection;
pub mod stats;
pub mod validators;

#[cfg(test)]
mod tests;

// Re-export main types for easy access
pub use orchestrator::{Pipeline, Stage};
pub use stats::{PipelineOutcome, PipelineStats};
pub use validators::{check, parse_opd_date, raw_field_policies, FieldPolicy, RepairStrategy};
