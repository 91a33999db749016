//! Stencil kernels and initial conditions for Tessel.
//!
//! A [`Stencil`] turns one [`HaloedChunk`](tessel_grid::HaloedChunk)
//! into the next step's [`Chunk`](tessel_grid::Chunk). Kernels are pure:
//! they read only the haloed input and the [`GridSpec`](tessel_grid::GridSpec),
//! so chunks of one step can be processed in any order or in parallel.
//!
//! # Kernels
//!
//! - [`FivePointDiffusion`]: the standard explicit 5-point Laplacian
//! - [`NinePointDiffusion`]: an isotropic 9-point Laplacian that reads
//!   corner ghosts
//!
//! [`InitialCondition`] provides closed-form seeds for the starting field.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod five_point;
pub mod nine_point;
pub mod seed;
pub mod stencil;

pub use error::{SeedError, StencilCheckError};
pub use five_point::FivePointDiffusion;
pub use nine_point::NinePointDiffusion;
pub use seed::InitialCondition;
pub use stencil::{Stencil, StencilKind};
