//! Chunked grid representation and halo exchange for Tessel.
//!
//! This crate owns the decomposition side of the engine:
//!
//! - [`GridSpec`]: global extent, spacing, diffusivity, and time step
//! - [`Chunk`]: an owned rectangular block with its global origin
//! - [`DomainGrid`]: the full partition, indexed by [`ChunkCoord`]
//! - [`BoundaryPolicy`]: ghost synthesis at the global domain edge
//! - [`build_haloed`]: the per-step ghost-cell exchange producing
//!   [`HaloedChunk`] views
//!
//! [`ChunkCoord`]: tessel_core::ChunkCoord

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod chunk;
pub mod domain;
pub mod error;
pub mod halo;
pub mod spec;

pub use boundary::BoundaryPolicy;
pub use chunk::Chunk;
pub use domain::DomainGrid;
pub use error::GridError;
pub use halo::{
    build_halo, build_haloed, build_haloed_with_corners, Corners, Ghost, GhostSource, HaloedChunk,
};
pub use spec::GridSpec;
