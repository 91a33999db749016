//! Ghost-cell exchange between chunks.
//!
//! [`build_haloed`] is the only place where one chunk observes another
//! chunk's state. It reads a single published [`DomainGrid`] and copies
//! the border data each chunk needs into a fresh [`HaloedChunk`], so
//! every halo of a step is built from the same snapshot before any
//! kernel runs.
//!
//! Face ghosts come from the neighbouring chunk when one exists and from
//! the [`BoundaryPolicy`] otherwise. Corner ghosts (only built on
//! request, for stencils that read diagonals) resolve each axis
//! independently: a position inside the domain always reads real chunk
//! data, an axis that leaves the domain is mapped back by the policy,
//! and `Fixed` yields its constant whenever either axis leaves.

use std::sync::Arc;

use indexmap::IndexMap;
use tessel_core::{ChunkCoord, Field2, HaloError, Side};

use crate::boundary::BoundaryPolicy;
use crate::chunk::Chunk;
use crate::domain::DomainGrid;

/// Where a face ghost came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostSource {
    /// Copied from the facing edge of this neighbouring chunk.
    Neighbour(ChunkCoord),
    /// Synthesized by the boundary policy.
    Boundary,
}

/// One face of ghost cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Ghost {
    values: Vec<f64>,
    source: GhostSource,
}

impl Ghost {
    /// Ghost values along the face, in increasing row/column order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Origin of the values.
    pub fn source(&self) -> GhostSource {
        self.source
    }
}

/// The four diagonal ghost cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corners {
    /// Cell at local `(-1, -1)`.
    pub nw: f64,
    /// Cell at local `(-1, w)`.
    pub ne: f64,
    /// Cell at local `(h, -1)`.
    pub sw: f64,
    /// Cell at local `(h, w)`.
    pub se: f64,
}

/// A chunk plus a one-cell ghost border.
///
/// The interior is shared with the grid it was built from; ghosts are
/// owned copies. Built fresh each step and dropped once the kernel has
/// consumed it.
#[derive(Clone, Debug)]
pub struct HaloedChunk {
    chunk: Arc<Chunk>,
    ghosts: [Ghost; 4],
    corners: Option<Corners>,
}

fn slot(side: Side) -> usize {
    match side {
        Side::North => 0,
        Side::South => 1,
        Side::East => 2,
        Side::West => 3,
    }
}

impl HaloedChunk {
    /// The interior chunk.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Lattice position of the interior chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.chunk.coord()
    }

    /// Interior `(h, w)`.
    pub fn shape(&self) -> (usize, usize) {
        self.chunk.shape()
    }

    /// Ghost face on `side`.
    pub fn ghost(&self, side: Side) -> &Ghost {
        &self.ghosts[slot(side)]
    }

    /// Diagonal ghosts, if they were built.
    pub fn corners(&self) -> Option<&Corners> {
        self.corners.as_ref()
    }

    /// Value at local `(i, j)` with `-1 <= i <= h` and `-1 <= j <= w`.
    ///
    /// Corner positions read as NaN when corners were not built.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` lies outside the haloed rectangle.
    pub fn at(&self, i: isize, j: isize) -> f64 {
        let (h, w) = self.shape();
        let (h, w) = (h as isize, w as isize);
        assert!(
            (-1..=h).contains(&i) && (-1..=w).contains(&j),
            "({i},{j}) outside haloed {h}x{w} chunk"
        );
        let row_out = i == -1 || i == h;
        let col_out = j == -1 || j == w;
        match (row_out, col_out) {
            (false, false) => self.chunk.values()[(i as usize, j as usize)],
            (true, false) => {
                let side = if i < 0 { Side::North } else { Side::South };
                self.ghost(side).values[j as usize]
            }
            (false, true) => {
                let side = if j < 0 { Side::West } else { Side::East };
                self.ghost(side).values[i as usize]
            }
            (true, true) => match &self.corners {
                None => f64::NAN,
                Some(c) => match (i < 0, j < 0) {
                    (true, true) => c.nw,
                    (true, false) => c.ne,
                    (false, true) => c.sw,
                    (false, false) => c.se,
                },
            },
        }
    }

    /// Materialize the `(h + 2) × (w + 2)` haloed block.
    ///
    /// Local cell `(i, j)` lands at `(i + 1, j + 1)`. Corners are NaN
    /// when they were not built.
    pub fn padded(&self) -> Field2 {
        let (h, w) = self.shape();
        let mut out = Field2::filled(h + 2, w + 2, f64::NAN);
        out.write_block(1, 1, self.chunk.values());
        for (j, v) in self.ghost(Side::North).values.iter().enumerate() {
            out[(0, j + 1)] = *v;
        }
        for (j, v) in self.ghost(Side::South).values.iter().enumerate() {
            out[(h + 1, j + 1)] = *v;
        }
        for (i, v) in self.ghost(Side::West).values.iter().enumerate() {
            out[(i + 1, 0)] = *v;
        }
        for (i, v) in self.ghost(Side::East).values.iter().enumerate() {
            out[(i + 1, w + 1)] = *v;
        }
        if let Some(c) = &self.corners {
            out[(0, 0)] = c.nw;
            out[(0, w + 1)] = c.ne;
            out[(h + 1, 0)] = c.sw;
            out[(h + 1, w + 1)] = c.se;
        }
        out
    }
}

/// The facing edge of the neighbour across `side`, after checking that
/// the two faces have the same length and abut exactly.
fn neighbour_line(
    grid: &DomainGrid,
    chunk: &Chunk,
    side: Side,
) -> Result<Option<(ChunkCoord, Vec<f64>)>, HaloError> {
    let Some(n) = grid.neighbour(chunk.coord(), side) else {
        return Ok(None);
    };
    let expected = chunk.face_len(side);
    let found = n.face_len(side.opposite());
    if expected != found {
        return Err(HaloError::ShapeMismatch {
            chunk: chunk.coord(),
            side,
            neighbour: n.coord(),
            expected,
            found,
        });
    }

    let (r0, c0) = chunk.origin();
    let (h, w) = chunk.shape();
    let (nr0, nc0) = n.origin();
    let (nh, nw) = n.shape();
    let abuts = match side {
        Side::North => nc0 == c0 && nr0 + nh == r0,
        Side::South => nc0 == c0 && r0 + h == nr0,
        Side::West => nr0 == r0 && nc0 + nw == c0,
        Side::East => nr0 == r0 && c0 + w == nc0,
    };
    if !abuts {
        return Err(HaloError::Misaligned {
            chunk: chunk.coord(),
            side,
            neighbour: n.coord(),
            reason: format!(
                "origin ({r0},{c0}) shape {h}x{w} does not abut origin ({nr0},{nc0}) \
                 shape {nh}x{nw}"
            ),
        });
    }
    Ok(Some((n.coord(), n.edge(side.opposite()))))
}

fn face_ghost(
    grid: &DomainGrid,
    chunk: &Chunk,
    side: Side,
    boundary: BoundaryPolicy,
) -> Result<Ghost, HaloError> {
    if let Some((coord, values)) = neighbour_line(grid, chunk, side)? {
        return Ok(Ghost {
            values,
            source: GhostSource::Neighbour(coord),
        });
    }
    let edge = chunk.edge(side);
    // A chunk one cell deep finds the global second row in the chunk
    // behind it.
    let inner = match chunk.inner(side) {
        Some(line) => Some(line),
        None => neighbour_line(grid, chunk, side.opposite())?.map(|(_, line)| line),
    };
    Ok(Ghost {
        values: boundary.ghost_line(&edge, inner.as_deref()),
        source: GhostSource::Boundary,
    })
}

fn corner_value(
    grid: &DomainGrid,
    chunk: &Chunk,
    boundary: BoundaryPolicy,
    row: isize,
    col: isize,
) -> Result<f64, HaloError> {
    let (nx, ny) = grid.extent();
    match (
        boundary.source_index(row, nx),
        boundary.source_index(col, ny),
    ) {
        (Some(r), Some(c)) => grid.value_at(r, c).ok_or_else(|| HaloError::Misaligned {
            chunk: chunk.coord(),
            side: if row < chunk.origin().0 as isize {
                Side::North
            } else {
                Side::South
            },
            neighbour: chunk.coord(),
            reason: format!("corner source cell ({r},{c}) is not held by any chunk"),
        }),
        _ => Ok(boundary.fixed_value().unwrap_or(f64::NAN)),
    }
}

fn corners(
    grid: &DomainGrid,
    chunk: &Chunk,
    boundary: BoundaryPolicy,
) -> Result<Corners, HaloError> {
    let (r0, c0) = chunk.origin();
    let (h, w) = chunk.shape();
    let north = r0 as isize - 1;
    let south = (r0 + h) as isize;
    let west = c0 as isize - 1;
    let east = (c0 + w) as isize;
    Ok(Corners {
        nw: corner_value(grid, chunk, boundary, north, west)?,
        ne: corner_value(grid, chunk, boundary, north, east)?,
        sw: corner_value(grid, chunk, boundary, south, west)?,
        se: corner_value(grid, chunk, boundary, south, east)?,
    })
}

/// Build the halo for a single chunk of `grid`.
pub fn build_halo(
    grid: &DomainGrid,
    chunk: &Arc<Chunk>,
    boundary: BoundaryPolicy,
    with_corners: bool,
) -> Result<HaloedChunk, HaloError> {
    let ghosts = [
        face_ghost(grid, chunk, Side::North, boundary)?,
        face_ghost(grid, chunk, Side::South, boundary)?,
        face_ghost(grid, chunk, Side::East, boundary)?,
        face_ghost(grid, chunk, Side::West, boundary)?,
    ];
    let corners = if with_corners {
        Some(corners(grid, chunk, boundary)?)
    } else {
        None
    };
    Ok(HaloedChunk {
        chunk: Arc::clone(chunk),
        ghosts,
        corners,
    })
}

fn build_all(
    grid: &DomainGrid,
    boundary: BoundaryPolicy,
    with_corners: bool,
) -> Result<IndexMap<ChunkCoord, HaloedChunk>, HaloError> {
    let mut out = IndexMap::with_capacity(grid.len());
    for (coord, chunk) in grid.iter() {
        out.insert(coord, build_halo(grid, chunk, boundary, with_corners)?);
    }
    Ok(out)
}

/// Build face halos for every chunk of `grid`.
///
/// Fails on the first chunk (in row-major order) whose neighbour faces
/// do not line up.
///
/// # Examples
///
/// ```
/// use tessel_core::{ChunkCoord, Field2, Side};
/// use tessel_grid::{build_haloed, BoundaryPolicy, DomainGrid, GhostSource};
///
/// let field = Field2::from_fn(4, 4, |r, c| (r * 4 + c) as f64);
/// let grid = DomainGrid::partition(&field, (2, 2)).unwrap();
/// let halos = build_haloed(&grid, BoundaryPolicy::Edge).unwrap();
///
/// let hc = &halos[&ChunkCoord::new(0, 0)];
/// // South ghost is the first row of chunk (1, 0): global row 2.
/// assert_eq!(hc.ghost(Side::South).values(), &[8.0, 9.0]);
/// assert_eq!(hc.ghost(Side::South).source(), GhostSource::Neighbour(ChunkCoord::new(1, 0)));
/// // North lies on the domain boundary and replicates row 0.
/// assert_eq!(hc.ghost(Side::North).values(), &[0.0, 1.0]);
/// ```
pub fn build_haloed(
    grid: &DomainGrid,
    boundary: BoundaryPolicy,
) -> Result<IndexMap<ChunkCoord, HaloedChunk>, HaloError> {
    build_all(grid, boundary, false)
}

/// Build face and corner halos for every chunk of `grid`.
pub fn build_haloed_with_corners(
    grid: &DomainGrid,
    boundary: BoundaryPolicy,
) -> Result<IndexMap<ChunkCoord, HaloedChunk>, HaloError> {
    build_all(grid, boundary, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(nx: usize, ny: usize) -> Field2 {
        Field2::from_fn(nx, ny, |r, c| (r * ny + c) as f64)
    }

    #[test]
    fn interior_faces_come_from_neighbours() {
        let grid = DomainGrid::partition(&ramp(6, 6), (3, 3)).unwrap();
        let halos = build_haloed(&grid, BoundaryPolicy::Reflect).unwrap();
        let hc = &halos[&ChunkCoord::new(1, 1)];
        // North ghost: global row 2, cols 3..6
        assert_eq!(hc.ghost(Side::North).values(), &[15.0, 16.0, 17.0]);
        // West ghost: global col 2, rows 3..6
        assert_eq!(hc.ghost(Side::West).values(), &[20.0, 26.0, 32.0]);
        assert_eq!(
            hc.ghost(Side::West).source(),
            GhostSource::Neighbour(ChunkCoord::new(1, 0))
        );
        assert_eq!(hc.ghost(Side::South).source(), GhostSource::Boundary);
    }

    #[test]
    fn reflect_boundary_mirrors_second_row() {
        let grid = DomainGrid::partition(&ramp(4, 4), (2, 2)).unwrap();
        let halos = build_haloed(&grid, BoundaryPolicy::Reflect).unwrap();
        let hc = &halos[&ChunkCoord::new(0, 1)];
        // North boundary: global row 1, cols 2..4
        assert_eq!(hc.ghost(Side::North).values(), &[6.0, 7.0]);
        // East boundary: global col 2, rows 0..2
        assert_eq!(hc.ghost(Side::East).values(), &[2.0, 6.0]);
    }

    #[test]
    fn reflect_on_one_row_chunk_reads_next_chunk() {
        // Chunk height 1: the global second row lives in chunk (1, 0).
        let grid = DomainGrid::partition(&ramp(3, 2), (1, 2)).unwrap();
        let halos = build_haloed(&grid, BoundaryPolicy::Reflect).unwrap();
        let top = &halos[&ChunkCoord::new(0, 0)];
        assert_eq!(top.ghost(Side::North).values(), &[2.0, 3.0]);
        let bottom = &halos[&ChunkCoord::new(2, 0)];
        assert_eq!(bottom.ghost(Side::South).values(), &[2.0, 3.0]);
    }

    #[test]
    fn mismatched_edge_length_is_detected() {
        // Chunk (0,0) is 2 wide, chunk (1,0) below it is 3 wide.
        let chunks = vec![
            Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(2, 2)),
            Chunk::new(ChunkCoord::new(1, 0), (2, 0), Field2::zeros(2, 3)),
        ];
        let grid = DomainGrid::from_chunks((4, 3), chunks).unwrap();
        match build_haloed(&grid, BoundaryPolicy::Edge) {
            Err(HaloError::ShapeMismatch {
                chunk,
                side,
                expected,
                found,
                ..
            }) => {
                assert_eq!(chunk, ChunkCoord::new(0, 0));
                assert_eq!(side, Side::South);
                assert_eq!((expected, found), (2, 3));
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn offset_neighbour_is_misaligned() {
        let chunks = vec![
            Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(2, 2)),
            Chunk::new(ChunkCoord::new(0, 1), (1, 2), Field2::zeros(2, 2)),
        ];
        let grid = DomainGrid::from_chunks((3, 4), chunks).unwrap();
        match build_haloed(&grid, BoundaryPolicy::Edge) {
            Err(HaloError::Misaligned { chunk, side, .. }) => {
                assert_eq!(chunk, ChunkCoord::new(0, 0));
                assert_eq!(side, Side::East);
            }
            other => panic!("expected Misaligned, got {other:?}"),
        }
    }

    #[test]
    fn corners_prefer_diagonal_chunk() {
        let field = ramp(6, 6);
        let grid = DomainGrid::partition(&field, (3, 3)).unwrap();
        let halos = build_haloed_with_corners(&grid, BoundaryPolicy::Fixed(-1.0)).unwrap();
        let hc = &halos[&ChunkCoord::new(1, 1)];
        let c = hc.corners().unwrap();
        // NW corner is global (2, 2), held by the diagonal chunk (0, 0).
        assert_eq!(c.nw, field[(2, 2)]);
        // SE corner is outside the domain on both axes.
        assert_eq!(c.se, -1.0);
        // NE corner: row 2 is inside, column 6 is outside.
        assert_eq!(c.ne, -1.0);
    }

    #[test]
    fn corners_compose_policies_on_domain_edge() {
        let field = ramp(4, 4);
        let grid = DomainGrid::partition(&field, (2, 2)).unwrap();
        let halos = build_haloed_with_corners(&grid, BoundaryPolicy::Reflect).unwrap();
        let c = halos[&ChunkCoord::new(0, 0)].corners().copied().unwrap();
        // NW of the global corner reflects on both axes: (1, 1).
        assert_eq!(c.nw, field[(1, 1)]);
        // NE: row -1 reflects to 1, column 2 is real data.
        assert_eq!(c.ne, field[(1, 2)]);
        // SE: (2, 2) is inside the domain, held by chunk (1, 1).
        assert_eq!(c.se, field[(2, 2)]);
    }

    #[test]
    fn padded_and_at_agree() {
        let grid = DomainGrid::partition(&ramp(5, 4), (2, 3)).unwrap();
        let halos = build_haloed_with_corners(&grid, BoundaryPolicy::Edge).unwrap();
        for hc in halos.values() {
            let p = hc.padded();
            let (h, w) = hc.shape();
            for i in -1..=h as isize {
                for j in -1..=w as isize {
                    assert_eq!(p[((i + 1) as usize, (j + 1) as usize)], hc.at(i, j));
                }
            }
        }
    }

    #[test]
    fn missing_corners_read_as_nan() {
        let grid = DomainGrid::partition(&ramp(4, 4), (2, 2)).unwrap();
        let halos = build_haloed(&grid, BoundaryPolicy::Edge).unwrap();
        let hc = &halos[&ChunkCoord::new(0, 0)];
        assert!(hc.corners().is_none());
        assert!(hc.at(-1, -1).is_nan());
        assert!(hc.padded()[(0, 0)].is_nan());
    }
}
