//! The [`Stencil`] trait.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tessel_core::{KernelError, Side};
use tessel_grid::{Chunk, GridSpec, HaloedChunk};

use crate::error::StencilCheckError;
use crate::five_point::FivePointDiffusion;
use crate::nine_point::NinePointDiffusion;

/// A per-cell update rule applied to one haloed chunk.
///
/// # Contract
///
/// - `apply()` MUST be deterministic and read nothing but its arguments.
/// - The returned chunk has the same coordinate, origin, and shape as
///   the input interior.
/// - `&self`: stencils are stateless and shared across worker threads.
///
/// # Object safety
///
/// The driver stores the stencil as `Arc<dyn Stencil>`.
pub trait Stencil: Send + Sync + 'static {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Whether the halo must include diagonal ghosts.
    fn needs_corners(&self) -> bool {
        false
    }

    /// Largest stable `dt` for `spec`, or `None` if unbounded.
    fn max_dt(&self, spec: &GridSpec) -> Option<f64>;

    /// Reject specs the stencil cannot handle at all.
    ///
    /// Called once during configuration validation.
    fn check(&self, _spec: &GridSpec) -> Result<(), StencilCheckError> {
        Ok(())
    }

    /// Compute the next values of `hc`'s interior.
    fn apply(&self, hc: &HaloedChunk, spec: &GridSpec) -> Result<Chunk, KernelError>;
}

/// Ghost faces must match the interior they border.
pub(crate) fn check_ghosts(hc: &HaloedChunk) -> Result<(), KernelError> {
    let chunk = hc.chunk();
    for side in Side::ALL {
        let expected = chunk.face_len(side);
        let found = hc.ghost(side).values().len();
        if expected != found {
            return Err(KernelError::Shape {
                reason: format!(
                    "chunk {} {side} ghost has {found} values, face has {expected}",
                    chunk.coord()
                ),
            });
        }
    }
    Ok(())
}

/// The built-in stencils, selectable by name.
///
/// # Examples
///
/// ```
/// use tessel_stencil::StencilKind;
///
/// let kind: StencilKind = "nine-point".parse().unwrap();
/// assert_eq!(kind, StencilKind::NinePoint);
/// assert!(kind.build().needs_corners());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StencilKind {
    /// [`FivePointDiffusion`].
    #[default]
    FivePoint,
    /// [`NinePointDiffusion`].
    NinePoint,
}

impl StencilKind {
    /// Instantiate the stencil.
    pub fn build(self) -> Arc<dyn Stencil> {
        match self {
            Self::FivePoint => Arc::new(FivePointDiffusion),
            Self::NinePoint => Arc::new(NinePointDiffusion),
        }
    }
}

impl fmt::Display for StencilKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FivePoint => f.write_str("five-point"),
            Self::NinePoint => f.write_str("nine-point"),
        }
    }
}

impl FromStr for StencilKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "five-point" | "5" | "5-point" => Ok(Self::FivePoint),
            "nine-point" | "9" | "9-point" => Ok(Self::NinePoint),
            other => Err(format!(
                "unknown stencil '{other}' (expected five-point or nine-point)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_and_display() {
        for kind in [StencilKind::FivePoint, StencilKind::NinePoint] {
            assert_eq!(kind.to_string().parse::<StencilKind>(), Ok(kind));
        }
        assert_eq!("5".parse::<StencilKind>(), Ok(StencilKind::FivePoint));
        assert!("seven".parse::<StencilKind>().is_err());
    }

    #[test]
    fn built_stencils_report_their_names() {
        assert_eq!(StencilKind::FivePoint.build().name(), "five-point diffusion");
        assert_eq!(StencilKind::NinePoint.build().name(), "nine-point diffusion");
        assert!(!StencilKind::FivePoint.build().needs_corners());
    }
}
