//! Error types for the Tessel stencil engine.
//!
//! Organized by the stage that detects them: field construction,
//! halo exchange, kernel application, and the per-step driver loop.
//! Every driver-level error carries the step number that failed, and
//! chunk-level errors carry the offending chunk coordinate.

use std::error::Error;
use std::fmt;

use crate::id::{ChunkCoord, Side, StepIndex};

/// A row-major buffer did not match the requested shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldShapeError {
    /// The requested `(rows, cols)`.
    pub expected: (usize, usize),
    /// The length of the supplied buffer.
    pub found_len: usize,
}

impl fmt::Display for FieldShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, c) = self.expected;
        write!(
            f,
            "buffer of length {} cannot hold a {r}x{c} field",
            self.found_len
        )
    }
}

impl Error for FieldShapeError {}

// ── HaloError ──────────────────────────────────────────────────────

/// Errors detected while building ghost borders.
///
/// Both variants indicate a partitioning bug: neighbouring chunks whose
/// shared faces do not line up. They are never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HaloError {
    /// The neighbour's adjacent edge has a different length from the
    /// chunk's own edge on that side.
    ShapeMismatch {
        /// Chunk whose halo was being built.
        chunk: ChunkCoord,
        /// Side of `chunk` facing the neighbour.
        side: Side,
        /// The neighbouring chunk.
        neighbour: ChunkCoord,
        /// Edge length of `chunk` on `side`.
        expected: usize,
        /// Edge length of the neighbour's facing side.
        found: usize,
    },
    /// Edge lengths agree but the neighbour is offset along the shared
    /// face or does not abut the chunk.
    Misaligned {
        /// Chunk whose halo was being built.
        chunk: ChunkCoord,
        /// Side of `chunk` facing the neighbour.
        side: Side,
        /// The neighbouring chunk.
        neighbour: ChunkCoord,
        /// Description of the mismatch.
        reason: String,
    },
}

impl HaloError {
    /// The chunk whose halo could not be built.
    pub fn chunk(&self) -> ChunkCoord {
        match self {
            Self::ShapeMismatch { chunk, .. } | Self::Misaligned { chunk, .. } => *chunk,
        }
    }
}

impl fmt::Display for HaloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                chunk,
                side,
                neighbour,
                expected,
                found,
            } => write!(
                f,
                "chunk {chunk} {side} edge has length {expected} but neighbour {neighbour} \
                 offers {found}"
            ),
            Self::Misaligned {
                chunk,
                side,
                neighbour,
                reason,
            } => write!(
                f,
                "chunk {chunk} {side} neighbour {neighbour} is misaligned: {reason}"
            ),
        }
    }
}

impl Error for HaloError {}

// ── KernelError ────────────────────────────────────────────────────

/// Errors from applying a stencil to a halo-augmented chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelError {
    /// The stencil reads diagonal neighbours but the halo was built
    /// without corner ghosts.
    MissingCorners {
        /// Name of the stencil.
        stencil: String,
    },
    /// The halo-augmented input is structurally inconsistent.
    Shape {
        /// Description of the inconsistency.
        reason: String,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCorners { stencil } => {
                write!(f, "stencil '{stencil}' requires corner ghosts")
            }
            Self::Shape { reason } => write!(f, "malformed haloed chunk: {reason}"),
        }
    }
}

impl Error for KernelError {}

// ── StepError ──────────────────────────────────────────────────────

/// Errors from advancing the simulation by one step.
///
/// `step` is always the number of the step being computed (the
/// committed index plus one). When any of these is returned the
/// previously committed grid is still current.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// Halo construction failed.
    Halo {
        /// Step being computed.
        step: StepIndex,
        /// The underlying halo error (carries the chunk coordinate).
        source: HaloError,
    },
    /// A stencil kernel rejected its input.
    Kernel {
        /// Step being computed.
        step: StepIndex,
        /// Chunk whose kernel failed.
        chunk: ChunkCoord,
        /// The underlying kernel error.
        source: KernelError,
    },
    /// A non-finite or out-of-bound value appeared after the kernel.
    NumericalInstability {
        /// Step being computed.
        step: StepIndex,
        /// Chunk containing the offending cell.
        chunk: ChunkCoord,
        /// Global `(row, col)` of the first offending cell.
        cell: (usize, usize),
        /// The offending value.
        value: f64,
    },
    /// A kernel task never delivered a result (it panicked or the
    /// executor shut down).
    TaskLost {
        /// Step being computed.
        step: StepIndex,
        /// Chunk whose task was lost.
        chunk: ChunkCoord,
    },
    /// The run was cancelled before the step was committed.
    Cancelled {
        /// Step that was abandoned.
        step: StepIndex,
    },
    /// All configured steps have already run.
    Completed {
        /// Number of steps that were run.
        steps: u64,
    },
    /// A previous step failed; the driver refuses to continue.
    Halted {
        /// The step that failed.
        failed_step: StepIndex,
    },
    /// The committed chunks could not be gathered into the global field.
    Assembly {
        /// Last committed step.
        step: StepIndex,
        /// Description of the coverage problem.
        reason: String,
    },
}

impl StepError {
    /// The step number this error refers to.
    pub fn step(&self) -> StepIndex {
        match self {
            Self::Halo { step, .. }
            | Self::Kernel { step, .. }
            | Self::NumericalInstability { step, .. }
            | Self::TaskLost { step, .. }
            | Self::Cancelled { step }
            | Self::Assembly { step, .. } => *step,
            Self::Completed { steps } => StepIndex(*steps),
            Self::Halted { failed_step } => *failed_step,
        }
    }

    /// The chunk this error refers to, if it is chunk-specific.
    pub fn chunk(&self) -> Option<ChunkCoord> {
        match self {
            Self::Halo { source, .. } => Some(source.chunk()),
            Self::Kernel { chunk, .. }
            | Self::NumericalInstability { chunk, .. }
            | Self::TaskLost { chunk, .. } => Some(*chunk),
            Self::Cancelled { .. }
            | Self::Completed { .. }
            | Self::Halted { .. }
            | Self::Assembly { .. } => None,
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halo { step, source } => write!(f, "step {step}: halo exchange failed: {source}"),
            Self::Kernel {
                step,
                chunk,
                source,
            } => write!(f, "step {step}: kernel failed on chunk {chunk}: {source}"),
            Self::NumericalInstability {
                step,
                chunk,
                cell,
                value,
            } => write!(
                f,
                "step {step}: numerical instability in chunk {chunk}: cell ({}, {}) = {value}",
                cell.0, cell.1
            ),
            Self::TaskLost { step, chunk } => {
                write!(f, "step {step}: task for chunk {chunk} produced no result")
            }
            Self::Cancelled { step } => write!(f, "step {step}: cancelled"),
            Self::Completed { steps } => write!(f, "all {steps} steps already run"),
            Self::Halted { failed_step } => {
                write!(f, "driver halted after step {failed_step} failed")
            }
            Self::Assembly { step, reason } => {
                write!(f, "step {step}: cannot assemble field: {reason}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Halo { source, .. } => Some(source),
            Self::Kernel { source, .. } => Some(source),
            _ => None,
        }
    }
}
