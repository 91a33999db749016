//! Strongly-typed identifiers for chunks, steps, and grid sides.

use std::fmt;

/// Position of a chunk in the chunk lattice.
///
/// `ci` indexes chunk rows (global axis 0) and `cj` indexes chunk
/// columns (global axis 1). Chunk `(0, 0)` holds the global origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk row index.
    pub ci: usize,
    /// Chunk column index.
    pub cj: usize,
}

impl ChunkCoord {
    /// Construct a chunk coordinate.
    pub const fn new(ci: usize, cj: usize) -> Self {
        Self { ci, cj }
    }

    /// The coordinate one step across `side`, or `None` when that would
    /// leave the non-negative quadrant.
    ///
    /// Upper bounds are not checked here; the owning grid decides whether
    /// the result names a real chunk.
    pub fn step(self, side: Side) -> Option<Self> {
        let (di, dj) = side.offset();
        let ci = self.ci.checked_add_signed(di)?;
        let cj = self.cj.checked_add_signed(dj)?;
        Some(Self { ci, cj })
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ci, self.cj)
    }
}

impl From<(usize, usize)> for ChunkCoord {
    fn from((ci, cj): (usize, usize)) -> Self {
        Self { ci, cj }
    }
}

/// Monotonically increasing step counter.
///
/// `StepIndex(0)` is the initial state; the driver increments it once
/// per committed step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepIndex(pub u64);

impl StepIndex {
    /// The index that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// One of the four faces of a rectangular chunk.
///
/// North is towards row 0, west towards column 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Row `-1` relative to the chunk.
    North,
    /// Row `h` relative to the chunk.
    South,
    /// Column `w` relative to the chunk.
    East,
    /// Column `-1` relative to the chunk.
    West,
}

impl Side {
    /// All sides in canonical order (N, S, E, W).
    pub const ALL: [Side; 4] = [Side::North, Side::South, Side::East, Side::West];

    /// The facing side.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// `(row, col)` offset of the neighbour across this side.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::South => (1, 0),
            Self::East => (0, 1),
            Self::West => (0, -1),
        }
    }

    /// `true` for North/South, whose ghosts are rows.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::North | Self::South)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        };
        f.write_str(name)
    }
}
