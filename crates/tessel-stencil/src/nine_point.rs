//! Isotropic 9-point Laplacian diffusion.

use tessel_core::{Field2, KernelError};
use tessel_grid::{Chunk, GridSpec, HaloedChunk};

use crate::error::StencilCheckError;
use crate::stencil::{check_ghosts, Stencil};

/// Relative tolerance for treating `dx` and `dy` as equal.
const SPACING_TOLERANCE: f64 = 1e-12;

/// Explicit diffusion with the isotropic 9-point Laplacian
///
/// ```text
/// lap = (4(N + S + E + W) + (NE + NW + SE + SW) - 20T) / (6h²)
/// ```
///
/// Its leading error term is rotation invariant, which keeps a
/// circular hot spot circular on coarse meshes. It needs a square mesh
/// (`dx == dy == h`) and corner ghosts, and is stable for
/// `dt <= 3h² / (8α)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NinePointDiffusion;

impl NinePointDiffusion {
    /// One explicit step on a square mesh of spacing `h`.
    ///
    /// Returns [`KernelError::MissingCorners`] if `hc` was built without
    /// diagonal ghosts.
    pub fn step(hc: &HaloedChunk, alpha: f64, dt: f64, h: f64) -> Result<Chunk, KernelError> {
        if hc.corners().is_none() {
            return Err(KernelError::MissingCorners {
                stencil: "nine-point diffusion".to_string(),
            });
        }
        let (rows, cols) = hc.shape();
        let p = hc.padded();
        let coef = alpha * dt / (6.0 * h * h);
        let next = Field2::from_fn(rows, cols, |i, j| {
            let (r, c) = (i + 1, j + 1);
            let t = p[(r, c)];
            let faces = p[(r - 1, c)] + p[(r + 1, c)] + p[(r, c - 1)] + p[(r, c + 1)];
            let diagonals =
                p[(r - 1, c - 1)] + p[(r - 1, c + 1)] + p[(r + 1, c - 1)] + p[(r + 1, c + 1)];
            t + coef * (4.0 * faces + diagonals - 20.0 * t)
        });
        Ok(hc.chunk().with_values(next))
    }
}

impl Stencil for NinePointDiffusion {
    fn name(&self) -> &str {
        "nine-point diffusion"
    }

    fn needs_corners(&self) -> bool {
        true
    }

    fn max_dt(&self, spec: &GridSpec) -> Option<f64> {
        if spec.alpha <= 0.0 {
            return None;
        }
        Some(3.0 * spec.dx * spec.dx / (8.0 * spec.alpha))
    }

    fn check(&self, spec: &GridSpec) -> Result<(), StencilCheckError> {
        let scale = spec.dx.abs().max(spec.dy.abs());
        if (spec.dx - spec.dy).abs() > SPACING_TOLERANCE * scale {
            return Err(StencilCheckError::NonSquareMesh {
                dx: spec.dx,
                dy: spec.dy,
            });
        }
        Ok(())
    }

    fn apply(&self, hc: &HaloedChunk, spec: &GridSpec) -> Result<Chunk, KernelError> {
        check_ghosts(hc)?;
        Self::step(hc, spec.alpha, spec.dt, spec.dx)
    }
}
