//! Per-step timing and whole-run summaries.

use std::time::Duration;

use tessel_core::{Field2, StepIndex};

/// Timing collected during a single step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// The step these numbers describe.
    pub step: StepIndex,
    /// Building every halo from the current grid.
    pub halo_us: u64,
    /// From the first task submission until the last result arrived.
    pub kernel_us: u64,
    /// Scanning new chunks for divergence.
    pub check_us: u64,
    /// Publishing the successor grid.
    pub commit_us: u64,
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Number of kernel tasks submitted.
    pub chunk_count: usize,
}

/// Outcome of [`Simulation::run`](crate::Simulation::run).
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The assembled final field.
    pub field: Field2,
    /// Steps executed by this call.
    pub steps: u64,
    /// Wall-clock time of the evolution loop.
    pub elapsed: Duration,
    /// One entry per executed step, in order.
    pub metrics: Vec<StepMetrics>,
}

impl RunReport {
    /// Mean step time in microseconds, or zero for an empty run.
    pub fn mean_step_us(&self) -> f64 {
        if self.metrics.is_empty() {
            return 0.0;
        }
        let total: u64 = self.metrics.iter().map(|m| m.total_us).sum();
        total as f64 / self.metrics.len() as f64
    }
}
