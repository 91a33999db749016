//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the input to the [`Simulation`](crate::Simulation)
//! constructor. [`validate()`](SimulationConfig::validate) checks the grid
//! parameters, the chunk shape, and the stencil's requirements, and
//! applies the [`StabilityPolicy`] to the time step.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tessel_core::Field2;
use tessel_grid::{BoundaryPolicy, GridError, GridSpec};
use tessel_stencil::{FivePointDiffusion, SeedError, Stencil, StencilCheckError};

// ── StabilityPolicy ────────────────────────────────────────────────

/// What to do when `dt` exceeds the stencil's stable bound.
///
/// `dt` is never adjusted; the choice is between running anyway,
/// running with a warning, and refusing to start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StabilityPolicy {
    /// Run without comment.
    Ignore,
    /// Emit a `tracing` warning and run.
    #[default]
    Warn,
    /// Fail validation with [`ConfigError::UnstableTimeStep`].
    Reject,
}

// ── DivergenceCheck ────────────────────────────────────────────────

/// Per-step scan of each new chunk before it is committed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DivergenceCheck {
    /// No scan.
    Off,
    /// Reject NaN and infinities.
    #[default]
    NonFinite,
    /// Reject non-finite values and any `|v| > bound`.
    Bound(f64),
}

impl DivergenceCheck {
    /// The first offending cell of `field` in row-major order.
    pub fn first_violation(&self, field: &Field2) -> Option<((usize, usize), f64)> {
        match *self {
            Self::Off => None,
            Self::NonFinite => field.first_non_finite(),
            Self::Bound(bound) => {
                let (_, cols) = field.shape();
                field
                    .as_slice()
                    .iter()
                    .position(|v| !v.is_finite() || v.abs() > bound)
                    .map(|i| ((i / cols, i % cols), field.as_slice()[i]))
            }
        }
    }
}

// ── ExecutorConfig ─────────────────────────────────────────────────

/// Sizing for [`ThreadPoolExecutor`](crate::ThreadPoolExecutor).
#[derive(Clone, Debug, Default)]
pub struct ExecutorConfig {
    /// Number of worker threads. `None` = auto-detect
    /// (`available_parallelism`, clamped to `[1, 64]`).
    pub worker_count: Option<usize>,
}

impl ExecutorConfig {
    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`. Zero workers would
    /// leave every submitted task unserviced.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`SimulationConfig`] or
/// constructing a [`Simulation`](crate::Simulation).
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Extent, spacing, chunk shape, or initial layout is invalid.
    Grid(GridError),
    /// A scalar parameter is out of range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The stencil cannot run on this grid.
    Stencil {
        /// Stencil name.
        name: String,
        /// Why it refused.
        reason: StencilCheckError,
    },
    /// `dt` exceeds the stencil's stable bound under
    /// [`StabilityPolicy::Reject`].
    UnstableTimeStep {
        /// The configured time step.
        dt: f64,
        /// The stencil's bound.
        max_dt: f64,
    },
    /// The initial field does not match the configured extent.
    FieldShape {
        /// `(nx, ny)` from the grid spec.
        expected: (usize, usize),
        /// Shape that was supplied.
        found: (usize, usize),
    },
    /// The initial condition cannot produce a finite field.
    InitialCondition {
        /// The rejected parameter.
        reason: SeedError,
    },
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid {name}: {value}")
            }
            Self::Stencil { name, reason } => write!(f, "stencil '{name}': {reason}"),
            Self::UnstableTimeStep { dt, max_dt } => write!(
                f,
                "dt = {dt} exceeds the stability bound {max_dt} of the explicit scheme"
            ),
            Self::FieldShape { expected, found } => write!(
                f,
                "initial field is {}x{}, grid expects {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            Self::InitialCondition { reason } => write!(f, "initial condition: {reason}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Stencil { reason, .. } => Some(reason),
            Self::InitialCondition { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Complete configuration for one simulation run.
#[derive(Clone)]
pub struct SimulationConfig {
    /// Global extent and physical parameters.
    pub spec: GridSpec,
    /// Target chunk shape `(ch, cw)`; edge chunks take the remainder.
    pub chunk_shape: (usize, usize),
    /// Number of steps to run. Zero is legal.
    pub steps: u64,
    /// Ghost synthesis on the global boundary. Default: reflect.
    pub boundary: BoundaryPolicy,
    /// Update rule. Default: [`FivePointDiffusion`].
    pub stencil: Arc<dyn Stencil>,
    /// Handling of an over-large `dt`. Default: warn.
    pub stability: StabilityPolicy,
    /// Per-step scan of new chunks. Default: non-finite values.
    pub divergence: DivergenceCheck,
    /// Emit an `info` event every N steps. `None` disables progress.
    pub progress_interval: Option<u64>,
}

impl SimulationConfig {
    /// A config with the given geometry and default policies.
    pub fn new(spec: GridSpec, chunk_shape: (usize, usize), steps: u64) -> Self {
        Self {
            spec,
            chunk_shape,
            steps,
            boundary: BoundaryPolicy::default(),
            stencil: Arc::new(FivePointDiffusion),
            stability: StabilityPolicy::default(),
            divergence: DivergenceCheck::default(),
            progress_interval: Some(50),
        }
    }

    /// Validate all invariants.
    ///
    /// Under [`StabilityPolicy::Warn`] an unstable `dt` is logged here
    /// and validation still succeeds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Grid extent and physical parameters.
        self.spec.validate()?;
        // 2. Chunk shape.
        let (ch, cw) = self.chunk_shape;
        if ch == 0 || cw == 0 {
            return Err(GridError::InvalidShape {
                reason: format!("chunk shape {ch}x{cw} has a zero dimension"),
            }
            .into());
        }
        // 3. Policy parameters.
        if let BoundaryPolicy::Fixed(v) = self.boundary {
            if !v.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "boundary value",
                    value: v,
                });
            }
        }
        if let DivergenceCheck::Bound(bound) = self.divergence {
            if !bound.is_finite() || bound <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "divergence bound",
                    value: bound,
                });
            }
        }
        if self.progress_interval == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "progress interval",
                value: 0.0,
            });
        }
        // 4. Stencil requirements.
        self.stencil
            .check(&self.spec)
            .map_err(|reason| ConfigError::Stencil {
                name: self.stencil.name().to_string(),
                reason,
            })?;
        // 5. Stability bound.
        if let Some(max_dt) = self.stencil.max_dt(&self.spec) {
            let dt = self.spec.dt;
            if dt > max_dt {
                match self.stability {
                    StabilityPolicy::Ignore => {}
                    StabilityPolicy::Warn => tracing::warn!(
                        dt,
                        max_dt,
                        stencil = self.stencil.name(),
                        "time step exceeds the stability bound; the run may diverge"
                    ),
                    StabilityPolicy::Reject => {
                        return Err(ConfigError::UnstableTimeStep { dt, max_dt })
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    /// The reference scenario: 400×400 in 100×100 chunks for 300 steps.
    fn default() -> Self {
        Self::new(GridSpec::new(400, 400), (100, 100), 300)
    }
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("spec", &self.spec)
            .field("chunk_shape", &self.chunk_shape)
            .field("steps", &self.steps)
            .field("boundary", &self.boundary)
            .field("stencil", &self.stencil.name())
            .field("stability", &self.stability)
            .field("divergence", &self.divergence)
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}
