//! Pipeline orchestration and stage sequencing
//!
//! Drives one batch through the stage machine
//! `Parsed → PreValidated → Derived → PostValidated → Projected → Done`,
//! with `Failed` reachable from any stage through an error return. Field
//! repairs run in a fixed order (structural fields before anything whose
//! repair depends on them) and every stage re-checks its work: a repair that
//! does not converge fails the batch with the invariant it could not satisfy.
//!
//! The working batch is an explicit value threaded through the stage
//! functions; stages mutate it in place and report status through `Result`.

use crate::app::models::{BreadcrumbBatch, Field};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::deduplication::{remove_duplicate_pairs, resolve_trip_vehicles};
use super::derivation::{derive, DerivationReport};
use super::projection::{project_breadcrumbs, project_trips};
use super::stats::{PipelineOutcome, PipelineStats};
use super::validators::{check, raw_field_policies, repair, speed_policy, RepairStrategy};

/// Stages of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsed,
    PreValidated,
    Derived,
    PostValidated,
    Projected,
    Done,
    Failed,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Parsed => "parsed",
            Stage::PreValidated => "pre_validation",
            Stage::Derived => "derivation",
            Stage::PostValidated => "post_validation",
            Stage::Projected => "projection",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

/// Validation pipeline for one batch of breadcrumb records
///
/// The pipeline is synchronous and owns no shared state; independent batches
/// can be processed in parallel by separate instances.
///
/// # Example
///
/// ```rust
/// use breadcrumb_processor::{Pipeline, PipelineConfig};
/// # fn example(batch: breadcrumb_processor::BreadcrumbBatch)
/// #     -> breadcrumb_processor::Result<()> {
/// let pipeline = Pipeline::new(PipelineConfig::default());
/// let outcome = pipeline.run(batch)?;
/// println!("{}", outcome.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline: repair, derive, enforce invariants, project.
    pub fn run(&self, batch: BreadcrumbBatch) -> Result<PipelineOutcome> {
        let outcome = self.run_inner(batch);
        if let Err(error) = &outcome {
            warn!(stage = Stage::Failed.name(), %error, "Pipeline failed");
        }
        outcome
    }

    fn run_inner(&self, batch: BreadcrumbBatch) -> Result<PipelineOutcome> {
        let (batch, mut stats) = self.repair(batch)?;

        let breadcrumbs = project_breadcrumbs(&batch)?;
        let trips = project_trips(&batch)?;
        debug!(
            stage = Stage::Projected.name(),
            breadcrumbs = breadcrumbs.len(),
            trips = trips.len(),
            "Projection complete"
        );

        stats.final_output = breadcrumbs.len();
        info!(stage = Stage::Done.name(), "{}", stats.summary());
        Ok(PipelineOutcome::new(breadcrumbs, trips, stats))
    }

    /// Run validation, repair, and derivation without projecting.
    ///
    /// Returns the clean working batch, suitable for feeding back into the
    /// pipeline; running it again changes nothing.
    pub fn repair(&self, mut batch: BreadcrumbBatch) -> Result<(BreadcrumbBatch, PipelineStats)> {
        let mut stats = PipelineStats::new();
        stats.total_input = batch.len();

        info!(
            stage = Stage::Parsed.name(),
            rows = stats.total_input,
            "Starting validation pipeline"
        );
        if batch.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        self.pre_validate(&mut batch, &mut stats)?;
        info!(
            stage = Stage::PreValidated.name(),
            rows = batch.len(),
            "Pre-validation complete"
        );

        let report = derive(&mut batch, &mut stats)?;
        info!(
            stage = Stage::Derived.name(),
            rows = batch.len(),
            "Derivation complete"
        );

        self.post_validate(&mut batch, report, &mut stats)?;
        info!(
            stage = Stage::PostValidated.name(),
            rows = batch.len(),
            "Post-validation complete"
        );

        Ok((batch, stats))
    }

    /// Run every raw-field check/repair pair in policy order, then re-check
    /// until the batch is structurally clean
    fn pre_validate(&self, batch: &mut BreadcrumbBatch, stats: &mut PipelineStats) -> Result<()> {
        let stage = Stage::PreValidated.name();

        for policy in raw_field_policies() {
            if batch.is_empty() {
                return Err(PipelineError::EmptyBatch);
            }
            let mask = check(batch, policy.field, &self.config);
            if mask.iter().any(|&invalid| invalid) {
                repair(batch, &policy, &self.config, stats, stage)?;
            }
        }

        // Convergence check: one repair pass must leave every structural
        // field valid. Direction is flag-only and exempt.
        for policy in raw_field_policies() {
            if policy.strategy == RepairStrategy::FlagOnly {
                continue;
            }
            let rows = invalid_rows(batch, policy.field, &self.config);
            if !rows.is_empty() {
                return Err(PipelineError::invariant_violated(
                    stage,
                    policy.field.name(),
                    rows,
                ));
            }
        }
        Ok(())
    }

    /// Validate derived fields and enforce the global uniqueness and
    /// referential rules
    fn post_validate(
        &self,
        batch: &mut BreadcrumbBatch,
        report: DerivationReport,
        stats: &mut PipelineStats,
    ) -> Result<()> {
        let stage = Stage::PostValidated.name();

        // Single-row trips have no defined speed; the rows are dropped
        // rather than assigned a made-up value
        if !report.single_row_trip_rows.is_empty() {
            let removed = batch.remove_rows(&report.single_row_trip_rows);
            stats.single_row_trips_dropped += removed;
            debug!(removed, "Dropped single-row trips with undefined speed");
        }

        let policy = speed_policy();
        let mask = check(batch, Field::Speed, &self.config);
        if mask.iter().any(|&invalid| invalid) {
            repair(batch, &policy, &self.config, stats, stage)?;
        }
        let rows = invalid_rows(batch, Field::Speed, &self.config);
        if !rows.is_empty() {
            return Err(PipelineError::invariant_violated(
                stage,
                Field::Speed.name(),
                rows,
            ));
        }

        remove_duplicate_pairs(batch, self.config.duplicate_tie_break, stats)?;
        resolve_trip_vehicles(batch, self.config.resolve_multi_vehicle_trips, stats)?;

        self.assert_exit_invariants(batch)
    }

    /// Final sweep over every invariant the output must satisfy.
    ///
    /// Nothing here should ever fire after a converged repair; a failure
    /// means a stage let a bad value through.
    fn assert_exit_invariants(&self, batch: &BreadcrumbBatch) -> Result<()> {
        let stage = Stage::PostValidated.name();

        for field in [
            Field::TripId,
            Field::StopId,
            Field::VehicleId,
            Field::OpdDate,
            Field::ActTime,
            Field::Meters,
            Field::Latitude,
            Field::Longitude,
            Field::Speed,
        ] {
            let rows = invalid_rows(batch, field, &self.config);
            if !rows.is_empty() {
                return Err(PipelineError::invariant_violated(stage, field.name(), rows));
            }
        }

        let mut seen = HashSet::new();
        let mut duplicate_rows = Vec::new();
        for (row, record) in batch.records.iter().enumerate() {
            if !seen.insert((record.timestamp, record.trip_id)) {
                duplicate_rows.push(row);
            }
        }
        if !duplicate_rows.is_empty() {
            return Err(PipelineError::invariant_violated(
                stage,
                "timestamp",
                duplicate_rows,
            ));
        }
        Ok(())
    }
}

fn invalid_rows(batch: &BreadcrumbBatch, field: Field, config: &PipelineConfig) -> Vec<usize> {
    check(batch, field, config)
        .into_iter()
        .enumerate()
        .filter_map(|(row, invalid)| invalid.then_some(row))
        .collect()
}
