//! Reusable fields, layouts, and stencils for engine testing.
//!
//! Stencil fixtures:
//!
//! - [`IdentityStencil`]: returns every chunk unchanged.
//! - [`FailingStencil`]: fails deterministically after N calls.
//! - [`PanickingStencil`]: panics on one chosen chunk.
//! - [`PoisonStencil`]: runs the 5-point kernel, then plants a value
//!   (typically NaN) at one global cell.

use std::sync::atomic::{AtomicUsize, Ordering};

use tessel_core::{ChunkCoord, Field2, KernelError};
use tessel_grid::{Chunk, GridSpec, HaloedChunk};
use tessel_stencil::{FivePointDiffusion, Stencil};

/// `value = r * ny + c`, distinct in every cell.
pub fn ramp_field(nx: usize, ny: usize) -> Field2 {
    Field2::from_fn(nx, ny, |r, c| (r * ny + c) as f64)
}

/// Zero field with a single cell set.
pub fn hot_cell_field(nx: usize, ny: usize, row: usize, col: usize, value: f64) -> Field2 {
    let mut f = Field2::zeros(nx, ny);
    f[(row, col)] = value;
    f
}

/// A smooth, non-symmetric field that exercises every stencil term.
pub fn wavy_field(nx: usize, ny: usize) -> Field2 {
    Field2::from_fn(nx, ny, |r, c| {
        let (x, y) = (r as f64, c as f64);
        (0.3 * x).sin() + (0.17 * y).cos() + 0.01 * x * y
    })
}

/// Two chunk rows whose shared face has unequal length: `(0, 0)` is
/// 2 wide and `(1, 0)` below it is 3 wide. Extent `(4, 3)`.
pub fn mismatched_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::filled(2, 2, 1.0)),
        Chunk::new(ChunkCoord::new(1, 0), (2, 0), Field2::filled(2, 3, 1.0)),
    ]
}

/// Returns each chunk unchanged.
pub struct IdentityStencil;

impl Stencil for IdentityStencil {
    fn name(&self) -> &str {
        "identity"
    }

    fn max_dt(&self, _spec: &GridSpec) -> Option<f64> {
        None
    }

    fn apply(&self, hc: &HaloedChunk, _spec: &GridSpec) -> Result<Chunk, KernelError> {
        Ok(hc.chunk().clone())
    }
}

/// Fails deterministically after a configurable number of successful
/// calls (counted per chunk, across steps).
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
pub struct FailingStencil {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingStencil {
    /// Create a stencil that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `apply()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Stencil for FailingStencil {
    fn name(&self) -> &str {
        "failing"
    }

    fn max_dt(&self, _spec: &GridSpec) -> Option<f64> {
        None
    }

    fn apply(&self, hc: &HaloedChunk, _spec: &GridSpec) -> Result<Chunk, KernelError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(KernelError::Shape {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(hc.chunk().clone())
    }
}

/// Panics whenever it is applied to `target`; identity elsewhere.
pub struct PanickingStencil {
    pub target: ChunkCoord,
}

impl Stencil for PanickingStencil {
    fn name(&self) -> &str {
        "panicking"
    }

    fn max_dt(&self, _spec: &GridSpec) -> Option<f64> {
        None
    }

    fn apply(&self, hc: &HaloedChunk, _spec: &GridSpec) -> Result<Chunk, KernelError> {
        if hc.coord() == self.target {
            panic!("deliberate panic in chunk {}", self.target);
        }
        Ok(hc.chunk().clone())
    }
}

/// 5-point diffusion that overwrites global `cell` with `value` from
/// call number `after` onward.
pub struct PoisonStencil {
    pub cell: (usize, usize),
    pub value: f64,
    pub after: usize,
    call_count: AtomicUsize,
}

impl PoisonStencil {
    pub fn new(cell: (usize, usize), value: f64, after: usize) -> Self {
        Self {
            cell,
            value,
            after,
            call_count: AtomicUsize::new(0),
        }
    }
}

impl Stencil for PoisonStencil {
    fn name(&self) -> &str {
        "poison"
    }

    fn max_dt(&self, spec: &GridSpec) -> Option<f64> {
        FivePointDiffusion.max_dt(spec)
    }

    fn apply(&self, hc: &HaloedChunk, spec: &GridSpec) -> Result<Chunk, KernelError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        let next = FivePointDiffusion.apply(hc, spec)?;
        let (row, col) = self.cell;
        if n < self.after || !next.contains(row, col) {
            return Ok(next);
        }
        let (r0, c0) = next.origin();
        let mut values = next.values().clone();
        values[(row - r0, col - c0)] = self.value;
        Ok(next.with_values(values))
    }
}
