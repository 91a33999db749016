//! Error types for grid construction, partitioning, and assembly.

use std::fmt;

use tessel_core::{ChunkCoord, FieldShapeError};

/// Errors arising from grid specs, partitioning, or chunk layouts.
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// A global extent or chunk shape has a zero dimension.
    InvalidShape {
        /// What went wrong.
        reason: String,
    },
    /// A physical parameter is NaN, infinite, or out of range.
    InvalidParameter {
        /// Parameter name (`dx`, `dt`, ...).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Caller-supplied chunks do not form a dense chunk lattice.
    ChunkLayout {
        /// What went wrong.
        reason: String,
    },
    /// Chunks do not exactly tile the global extent.
    Coverage {
        /// What went wrong.
        reason: String,
    },
    /// A next-step chunk set does not match the established layout.
    LayoutChanged {
        /// The offending chunk.
        chunk: ChunkCoord,
        /// What changed.
        reason: String,
    },
    /// A field buffer does not match the expected shape.
    FieldShape(FieldShapeError),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidShape { reason } => write!(f, "invalid shape: {reason}"),
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {name} = {value}")
            }
            Self::ChunkLayout { reason } => write!(f, "invalid chunk layout: {reason}"),
            Self::Coverage { reason } => write!(f, "chunks do not tile the domain: {reason}"),
            Self::LayoutChanged { chunk, reason } => {
                write!(f, "chunk {chunk} does not match the grid layout: {reason}")
            }
            Self::FieldShape(e) => write!(f, "field shape: {e}"),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FieldShape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldShapeError> for GridError {
    fn from(e: FieldShapeError) -> Self {
        Self::FieldShape(e)
    }
}
