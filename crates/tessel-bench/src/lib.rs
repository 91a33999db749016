//! Benchmark profiles for the Tessel stencil engine.
//!
//! Each profile pairs a [`SimulationConfig`] with the initial condition
//! it is meant to run from:
//!
//! - [`reference_profile`]: 400x400 plate in 100x100 chunks, 300 steps
//! - [`small_profile`]: 64x64 in 16x16 chunks, for quick iterations
//! - [`stress_profile`]: 1024x1024 in 256x256 chunks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessel_core::Field2;
use tessel_engine::SimulationConfig;
use tessel_grid::GridSpec;
use tessel_stencil::InitialCondition;

/// A runnable benchmark scenario.
#[derive(Clone, Debug)]
pub struct BenchProfile {
    /// Grid, chunking, and policies.
    pub config: SimulationConfig,
    /// Starting temperature field.
    pub seed: InitialCondition,
}

impl BenchProfile {
    /// The seed materialized over the profile's extent.
    pub fn initial_field(&self) -> Field2 {
        let (nx, ny) = self.config.spec.extent();
        self.seed.field(nx, ny)
    }

    /// The same profile with `steps` replaced.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.config.steps = steps;
        self
    }
}

fn hot_spot_profile(n: usize, chunk: usize, steps: u64) -> BenchProfile {
    let mut config = SimulationConfig::new(GridSpec::new(n, n), (chunk, chunk), steps);
    config.progress_interval = None;
    BenchProfile {
        config,
        seed: InitialCondition::hot_spot(n, n),
    }
}

/// 400x400 grid (160K cells) in a 4x4 chunk layout, 300 steps.
///
/// alpha=0.1, dt=1 (within the 5-point bound of 2.5).
pub fn reference_profile() -> BenchProfile {
    hot_spot_profile(400, 100, 300)
}

/// 64x64 grid in 16x16 chunks, 50 steps.
pub fn small_profile() -> BenchProfile {
    hot_spot_profile(64, 16, 50)
}

/// 1024x1024 grid (~1M cells) in 256x256 chunks, 50 steps.
pub fn stress_profile() -> BenchProfile {
    hot_spot_profile(1024, 256, 50)
}
