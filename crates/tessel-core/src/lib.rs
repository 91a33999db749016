//! Core types for the Tessel domain-decomposed stencil engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by every other crate in the workspace:
//! chunk and step identifiers, grid sides, the dense [`Field2`] array,
//! and the error taxonomy for halo exchange, kernels, and stepping.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;

pub use error::{FieldShapeError, HaloError, KernelError, StepError};
pub use field::Field2;
pub use id::{ChunkCoord, Side, StepIndex};
