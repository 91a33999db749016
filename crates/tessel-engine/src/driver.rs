//! The time-evolution driver.
//!
//! [`Simulation`] runs the step protocol:
//!
//! 1. build every halo from the published grid
//! 2. submit one kernel task per chunk to the [`Executor`]
//! 3. join all tasks (the barrier)
//! 4. scan the new chunks with the configured [`DivergenceCheck`]
//! 5. publish the successor grid and advance the step index
//!
//! Any failure in 1–4, or a cancellation observed before 5, returns an
//! error and leaves the published grid exactly as it was.
//!
//! # Ownership model
//!
//! `Simulation` is [`Send`] and all mutating methods take `&mut self`.
//! Published chunks are shared read-only with kernel tasks through
//! `Arc`; nothing a task holds can alias the grid being built.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tessel_core::{Field2, KernelError, StepError, StepIndex};
use tessel_grid::{
    build_haloed, build_haloed_with_corners, BoundaryPolicy, DomainGrid, GridError, GridSpec,
};
use tessel_stencil::{InitialCondition, Stencil};

use crate::config::{ConfigError, DivergenceCheck, SimulationConfig};
use crate::executor::{Executor, InlineExecutor, TaskLost};
use crate::metrics::{RunReport, StepMetrics};

// Compile-time assertion: Simulation is Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Simulation>();
        assert_send::<Simulation<crate::ThreadPoolExecutor>>();
    }
};

// ── CancelToken ────────────────────────────────────────────────────

/// Cooperative cancellation shared between the driver and its callers.
///
/// The driver checks the token before starting a step and again before
/// committing it. Once set it stays set.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ── DriverPhase / SimulationState ──────────────────────────────────

/// Lifecycle of a [`Simulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverPhase {
    /// Constructed; no step committed yet.
    Initialized,
    /// At least one step committed, more remain.
    Stepping,
    /// Every configured step has been committed.
    Completed,
    /// A step failed; further steps are refused.
    Failed {
        /// The step that failed.
        step: StepIndex,
    },
}

/// The published grid and the number of committed steps.
#[derive(Clone, Debug)]
pub struct SimulationState {
    grid: DomainGrid,
    step: StepIndex,
}

impl SimulationState {
    /// The published grid.
    pub fn grid(&self) -> &DomainGrid {
        &self.grid
    }

    /// Number of committed steps.
    pub fn step(&self) -> StepIndex {
        self.step
    }
}

// ── Simulation ─────────────────────────────────────────────────────

/// Drives a chunked grid through `steps` explicit time steps.
pub struct Simulation<E: Executor = InlineExecutor> {
    spec: GridSpec,
    boundary: BoundaryPolicy,
    stencil: Arc<dyn Stencil>,
    divergence: DivergenceCheck,
    steps: u64,
    progress_interval: Option<u64>,
    state: SimulationState,
    phase: DriverPhase,
    executor: E,
    cancel: CancelToken,
    last_metrics: StepMetrics,
}

impl Simulation<InlineExecutor> {
    /// Validate `config`, seed the grid from `seed`, and run chunks on
    /// the caller's thread.
    pub fn new(config: SimulationConfig, seed: &InitialCondition) -> Result<Self, ConfigError> {
        Self::with_executor(config, seed, InlineExecutor)
    }
}

impl<E: Executor> Simulation<E> {
    /// Validate `config` and seed the grid from `seed`, building chunks
    /// directly from the closed form.
    pub fn with_executor(
        config: SimulationConfig,
        seed: &InitialCondition,
        executor: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        seed.validate()
            .map_err(|reason| ConfigError::InitialCondition { reason })?;
        let (nx, ny) = config.spec.extent();
        let grid = DomainGrid::partition_with(nx, ny, config.chunk_shape, |r, c| seed.sample(r, c))?;
        Ok(Self::from_parts(config, grid, executor))
    }

    /// Validate `config` and partition an explicit initial field.
    pub fn from_field(
        config: SimulationConfig,
        field: &Field2,
        executor: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let expected = config.spec.extent();
        if field.shape() != expected {
            return Err(ConfigError::FieldShape {
                expected,
                found: field.shape(),
            });
        }
        let grid = DomainGrid::partition(field, config.chunk_shape)?;
        Ok(Self::from_parts(config, grid, executor))
    }

    /// Validate `config` and adopt a pre-built grid.
    ///
    /// `config.chunk_shape` is ignored; the grid's own layout is used.
    /// Face alignment is checked by the first halo exchange.
    pub fn from_grid(
        config: SimulationConfig,
        grid: DomainGrid,
        executor: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let expected = config.spec.extent();
        if grid.extent() != expected {
            return Err(ConfigError::FieldShape {
                expected,
                found: grid.extent(),
            });
        }
        Ok(Self::from_parts(config, grid, executor))
    }

    fn from_parts(config: SimulationConfig, grid: DomainGrid, executor: E) -> Self {
        let (rows, cols) = grid.chunk_counts();
        tracing::info!(
            nx = config.spec.nx,
            ny = config.spec.ny,
            chunk_rows = rows,
            chunk_cols = cols,
            steps = config.steps,
            boundary = %config.boundary,
            stencil = config.stencil.name(),
            "simulation initialized"
        );
        Self {
            spec: config.spec,
            boundary: config.boundary,
            stencil: config.stencil,
            divergence: config.divergence,
            steps: config.steps,
            progress_interval: config.progress_interval,
            state: SimulationState {
                grid,
                step: StepIndex(0),
            },
            phase: DriverPhase::Initialized,
            executor,
            cancel: CancelToken::new(),
            last_metrics: StepMetrics::default(),
        }
    }

    /// Replace the simulation's cancel token with one the caller
    /// already holds.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Grid extent and physical parameters.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// The published state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The published grid.
    pub fn grid(&self) -> &DomainGrid {
        &self.state.grid
    }

    /// Number of committed steps.
    pub fn step_index(&self) -> StepIndex {
        self.state.step
    }

    /// Configured number of steps.
    pub fn total_steps(&self) -> u64 {
        self.steps
    }

    /// Steps not yet committed.
    pub fn remaining_steps(&self) -> u64 {
        self.steps.saturating_sub(self.state.step.0)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// A handle that cancels this simulation.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Metrics from the most recent committed step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The executor running kernel tasks.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Assemble the published grid into the global field.
    pub fn field(&self) -> Result<Field2, GridError> {
        self.state.grid.assemble()
    }

    // ── Stepping ───────────────────────────────────────────────────

    /// Compute and commit one step.
    ///
    /// On error the published grid is unchanged. Errors other than
    /// [`StepError::Cancelled`] move the driver to
    /// [`DriverPhase::Failed`].
    pub fn advance(&mut self) -> Result<StepMetrics, StepError> {
        match self.phase {
            DriverPhase::Completed => return Err(StepError::Completed { steps: self.steps }),
            DriverPhase::Failed { step } => return Err(StepError::Halted { failed_step: step }),
            DriverPhase::Initialized | DriverPhase::Stepping => {}
        }
        if self.state.step.0 >= self.steps {
            self.phase = DriverPhase::Completed;
            return Err(StepError::Completed { steps: self.steps });
        }

        let step = self.state.step.next();
        if self.cancel.is_cancelled() {
            return Err(StepError::Cancelled { step });
        }

        let (grid, metrics) = match self.compute(step) {
            Ok(out) => out,
            Err(e @ StepError::Cancelled { .. }) => {
                tracing::info!(step = step.0, "step cancelled before commit");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(step = step.0, chunk = ?e.chunk(), error = %e, "step failed");
                self.phase = DriverPhase::Failed { step };
                return Err(e);
            }
        };

        self.state = SimulationState { grid, step };
        self.phase = if step.0 >= self.steps {
            DriverPhase::Completed
        } else {
            DriverPhase::Stepping
        };
        tracing::debug!(
            step = step.0,
            halo_us = metrics.halo_us,
            kernel_us = metrics.kernel_us,
            total_us = metrics.total_us,
            "step committed"
        );
        if let Some(every) = self.progress_interval {
            if step.0 % every == 0 {
                tracing::info!(step = step.0, of = self.steps, "progress");
            }
        }
        self.last_metrics = metrics.clone();
        Ok(metrics)
    }

    /// Run every remaining step and assemble the final field.
    ///
    /// With nothing left to run this returns the current field and an
    /// empty metrics list.
    pub fn run(&mut self) -> Result<RunReport, StepError> {
        let _span = tracing::info_span!(
            "run",
            steps = self.steps,
            chunks = self.state.grid.len()
        )
        .entered();

        let start = Instant::now();
        let mut metrics = Vec::new();
        while self.state.step.0 < self.steps {
            metrics.push(self.advance()?);
        }
        let elapsed = start.elapsed();
        if !matches!(self.phase, DriverPhase::Failed { .. }) {
            self.phase = DriverPhase::Completed;
        }

        let field = self.state.grid.assemble().map_err(|e| StepError::Assembly {
            step: self.state.step,
            reason: e.to_string(),
        })?;
        tracing::info!(
            steps = metrics.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(RunReport {
            field,
            steps: metrics.len() as u64,
            elapsed,
            metrics,
        })
    }

    /// Steps 1–4 of the protocol plus building the successor grid.
    /// Touches nothing in `self`.
    fn compute(&self, step: StepIndex) -> Result<(DomainGrid, StepMetrics), StepError> {
        let start = Instant::now();
        let grid = &self.state.grid;

        // 1. Halo exchange from the published grid.
        let halos = if self.stencil.needs_corners() {
            build_haloed_with_corners(grid, self.boundary)
        } else {
            build_haloed(grid, self.boundary)
        }
        .map_err(|source| StepError::Halo { step, source })?;
        let halo_us = start.elapsed().as_micros() as u64;

        // 2. One task per chunk.
        let kernel_start = Instant::now();
        let chunk_count = halos.len();
        let handles: Vec<_> = halos
            .into_iter()
            .map(|(coord, hc)| {
                let stencil = Arc::clone(&self.stencil);
                let spec = self.spec;
                (coord, self.executor.run(move || stencil.apply(&hc, &spec)))
            })
            .collect();

        // 3. Barrier. Every handle is joined even after a failure so no
        //    task outlives the step.
        let mut next = Vec::with_capacity(chunk_count);
        let mut failure = None;
        for (coord, handle) in handles {
            let err = match handle.join() {
                Ok(Ok(chunk)) => {
                    next.push(chunk);
                    continue;
                }
                Ok(Err(source)) => StepError::Kernel {
                    step,
                    chunk: coord,
                    source,
                },
                Err(TaskLost) => StepError::TaskLost { step, chunk: coord },
            };
            if failure.is_none() {
                failure = Some(err);
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }
        let kernel_us = kernel_start.elapsed().as_micros() as u64;

        // 4. Divergence scan, in chunk order.
        let check_start = Instant::now();
        for chunk in &next {
            if let Some(((i, j), value)) = self.divergence.first_violation(chunk.values()) {
                return Err(StepError::NumericalInstability {
                    step,
                    chunk: chunk.coord(),
                    cell: chunk.global(i, j),
                    value,
                });
            }
        }
        let check_us = check_start.elapsed().as_micros() as u64;

        if self.cancel.is_cancelled() {
            return Err(StepError::Cancelled { step });
        }

        // 5. Successor grid over the same layout.
        let commit_start = Instant::now();
        let successor = grid.with_chunks(next).map_err(|e| match e {
            GridError::LayoutChanged { chunk, reason } => StepError::Kernel {
                step,
                chunk,
                source: KernelError::Shape { reason },
            },
            other => StepError::Assembly {
                step,
                reason: other.to_string(),
            },
        })?;
        let commit_us = commit_start.elapsed().as_micros() as u64;

        Ok((
            successor,
            StepMetrics {
                step,
                halo_us,
                kernel_us,
                check_us,
                commit_us,
                total_us: start.elapsed().as_micros() as u64,
                chunk_count,
            },
        ))
    }
}

impl<E: Executor> std::fmt::Debug for Simulation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("spec", &self.spec)
            .field("boundary", &self.boundary)
            .field("stencil", &self.stencil.name())
            .field("steps", &self.steps)
            .field("step_index", &self.state.step)
            .field("phase", &self.phase)
            .finish()
    }
}
