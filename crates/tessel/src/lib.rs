//! Tessel: a domain-decomposed 2D heat-equation stencil engine.
//!
//! This is the facade crate. It re-exports the public API of every
//! Tessel sub-crate, so most users only need `tessel` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use tessel::prelude::*;
//!
//! // A 64×64 plate split into 16×16 chunks, heated in the middle.
//! let spec = GridSpec::new(64, 64).with_alpha(0.1).with_dt(1.0);
//! let mut config = SimulationConfig::new(spec, (16, 16), 20);
//! config.boundary = BoundaryPolicy::Edge;
//!
//! let seed = InitialCondition::hot_spot(64, 64);
//! let initial = seed.field(64, 64).sum();
//! let mut sim = Simulation::new(config, &seed).unwrap();
//! let report = sim.run().unwrap();
//!
//! // Zero-flux walls conserve the total.
//! assert!((report.field.sum() - initial).abs() < 1e-9 * initial.abs().max(1.0));
//! assert_eq!(sim.step_index(), StepIndex(20));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessel-core` | `Field2`, chunk coordinates, sides, error types |
//! | [`grid`] | `tessel-grid` | Grid parameters, chunks, boundary policies, halo exchange |
//! | [`stencil`] | `tessel-stencil` | The `Stencil` trait, diffusion kernels, initial conditions |
//! | [`engine`] | `tessel-engine` | Configuration, executors, and the time-evolution driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core value types and errors (`tessel-core`).
///
/// Contains [`types::Field2`], [`types::ChunkCoord`], [`types::Side`],
/// and the error enums shared by every layer.
pub use tessel_core as types;

/// Chunked domains and halo exchange (`tessel-grid`).
///
/// [`grid::DomainGrid`] partitions a field into [`grid::Chunk`]s;
/// [`grid::build_haloed`] attaches ghost rows using the active
/// [`grid::BoundaryPolicy`].
pub use tessel_grid as grid;

/// Update rules (`tessel-stencil`).
///
/// The [`stencil::Stencil`] trait is the extension point for custom
/// kernels. [`stencil::FivePointDiffusion`] is the default.
pub use tessel_stencil as stencil;

/// Time evolution (`tessel-engine`).
///
/// [`engine::Simulation`] drives the grid through a fixed number of
/// steps on an [`engine::InlineExecutor`] or a
/// [`engine::ThreadPoolExecutor`].
pub use tessel_engine as engine;

/// Common imports for typical Tessel usage.
///
/// ```rust
/// use tessel::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use tessel_core::{ChunkCoord, Field2, Side, StepIndex};

    // Errors
    pub use tessel_core::{HaloError, KernelError, StepError};
    pub use tessel_grid::GridError;

    // Grid
    pub use tessel_grid::{BoundaryPolicy, Chunk, DomainGrid, GridSpec, HaloedChunk};

    // Stencils
    pub use tessel_stencil::{
        FivePointDiffusion, InitialCondition, NinePointDiffusion, SeedError, Stencil,
        StencilCheckError, StencilKind,
    };

    // Engine
    pub use tessel_engine::{
        CancelToken, ConfigError, DivergenceCheck, Executor, ExecutorConfig, InlineExecutor,
        RunReport, Simulation, SimulationConfig, StabilityPolicy, StepMetrics,
        ThreadPoolExecutor,
    };
}
