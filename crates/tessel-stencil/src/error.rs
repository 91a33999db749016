//! Setup-time errors for stencils and initial conditions.

use std::error::Error;
use std::fmt;

/// Why a stencil refuses to run on a grid.
///
/// Returned by [`Stencil::check`](crate::Stencil::check) during
/// configuration validation.
#[derive(Clone, Debug, PartialEq)]
pub enum StencilCheckError {
    /// The stencil needs `dx == dy`.
    NonSquareMesh {
        /// Spacing along rows.
        dx: f64,
        /// Spacing along columns.
        dy: f64,
    },
    /// Any other requirement a custom stencil imposes.
    Unsupported {
        /// Description of the requirement.
        reason: String,
    },
}

impl fmt::Display for StencilCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonSquareMesh { dx, dy } => {
                write!(f, "requires a square mesh, got dx = {dx} and dy = {dy}")
            }
            Self::Unsupported { reason } => write!(f, "unsupported grid: {reason}"),
        }
    }
}

impl Error for StencilCheckError {}

/// Why an [`InitialCondition`](crate::InitialCondition) cannot seed a
/// finite field.
#[derive(Clone, Debug, PartialEq)]
pub enum SeedError {
    /// A value, centre coordinate, or amplitude is NaN or infinite.
    NonFinite {
        /// Which parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The hot-spot width must be finite and positive.
    NonPositiveDecay {
        /// The rejected decay.
        decay: f64,
    },
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { parameter, value } => {
                write!(f, "{parameter} must be finite, got {value}")
            }
            Self::NonPositiveDecay { decay } => {
                write!(f, "hot spot decay must be positive, got {decay}")
            }
        }
    }
}

impl Error for SeedError {}
