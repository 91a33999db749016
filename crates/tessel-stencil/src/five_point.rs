//! Explicit 5-point Laplacian diffusion.
//!
//! Advances `∂T/∂t = α∇²T` by one forward-Euler step:
//!
//! ```text
//! lap[i,j]    = (T[i-1,j] + T[i+1,j] - 2T[i,j]) / dx²
//!             + (T[i,j-1] + T[i,j+1] - 2T[i,j]) / dy²
//! T_next[i,j] = T[i,j] + α·dt·lap[i,j]
//! ```
//!
//! With unit spacing and `dt = 1` this is `T + α(N + S + E + W - 4T)`.

use tessel_core::{Field2, KernelError};
use tessel_grid::{Chunk, GridSpec, HaloedChunk};

use crate::stencil::{check_ghosts, Stencil};

/// The standard explicit 5-point diffusion stencil.
///
/// Reads only face ghosts. Stable for
/// `α·dt·(1/dx² + 1/dy²) <= 1/2`.
///
/// # Examples
///
/// ```
/// use tessel_core::{ChunkCoord, Field2};
/// use tessel_grid::{build_haloed, BoundaryPolicy, DomainGrid, GridSpec};
/// use tessel_stencil::{FivePointDiffusion, Stencil};
///
/// let mut field = Field2::zeros(4, 4);
/// field[(2, 2)] = 1.0;
/// let grid = DomainGrid::partition(&field, (4, 4)).unwrap();
/// let halos = build_haloed(&grid, BoundaryPolicy::Reflect).unwrap();
/// let spec = GridSpec::new(4, 4).with_alpha(0.1).with_dt(1.0);
///
/// let next = FivePointDiffusion.apply(&halos[&ChunkCoord::new(0, 0)], &spec).unwrap();
/// assert!((next.values()[(2, 2)] - 0.6).abs() < 1e-12);
/// assert!((next.values()[(1, 2)] - 0.1).abs() < 1e-12);
/// // Row 3 is on the boundary: its reflected ghost is row 2.
/// assert!((next.values()[(3, 2)] - 0.2).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FivePointDiffusion;

impl FivePointDiffusion {
    /// One explicit step of `hc` with the given physical parameters.
    ///
    /// Assumes the ghosts match the interior; [`Stencil::apply`] checks
    /// that first.
    pub fn step(hc: &HaloedChunk, alpha: f64, dt: f64, dx: f64, dy: f64) -> Chunk {
        let (h, w) = hc.shape();
        let p = hc.padded();
        let cx = alpha * dt / (dx * dx);
        let cy = alpha * dt / (dy * dy);
        let next = Field2::from_fn(h, w, |i, j| {
            let (r, c) = (i + 1, j + 1);
            let t = p[(r, c)];
            let d_rows = p[(r - 1, c)] + p[(r + 1, c)] - 2.0 * t;
            let d_cols = p[(r, c - 1)] + p[(r, c + 1)] - 2.0 * t;
            t + cx * d_rows + cy * d_cols
        });
        hc.chunk().with_values(next)
    }
}

impl Stencil for FivePointDiffusion {
    fn name(&self) -> &str {
        "five-point diffusion"
    }

    fn max_dt(&self, spec: &GridSpec) -> Option<f64> {
        if spec.alpha <= 0.0 {
            return None;
        }
        let k = 1.0 / (spec.dx * spec.dx) + 1.0 / (spec.dy * spec.dy);
        Some(1.0 / (2.0 * spec.alpha * k))
    }

    fn apply(&self, hc: &HaloedChunk, spec: &GridSpec) -> Result<Chunk, KernelError> {
        check_ghosts(hc)?;
        Ok(Self::step(hc, spec.alpha, spec.dt, spec.dx, spec.dy))
    }
}
