//! The partitioned global field.
//!
//! A [`DomainGrid`] maps every [`ChunkCoord`] of a fixed chunk lattice to
//! a published [`Chunk`]. The lattice is established once (by
//! [`partition`](DomainGrid::partition) or
//! [`from_chunks`](DomainGrid::from_chunks)) and every later grid in a
//! run is derived from it with [`with_chunks`](DomainGrid::with_chunks),
//! which refuses to change the layout.

use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tessel_core::{ChunkCoord, Field2, Side};

use crate::chunk::Chunk;
use crate::error::GridError;

/// Split an axis of length `n` into runs of `c`, the last run taking
/// the remainder. Returns `(start, len)` pairs.
pub(crate) fn axis_splits(n: usize, c: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(n.div_ceil(c));
    let mut start = 0;
    while start < n {
        let len = c.min(n - start);
        out.push((start, len));
        start += len;
    }
    out
}

/// An ordered collection of chunks tiling an `nx × ny` field.
///
/// Chunks are held behind [`Arc`] so that halo views can share them
/// read-only with worker threads. Iteration order is row-major over
/// chunk coordinates.
///
/// # Examples
///
/// ```
/// use tessel_core::{ChunkCoord, Field2};
/// use tessel_grid::DomainGrid;
///
/// let field = Field2::from_fn(10, 7, |r, c| (r * 7 + c) as f64);
/// let grid = DomainGrid::partition(&field, (4, 4)).unwrap();
/// assert_eq!(grid.chunk_counts(), (3, 2));
/// // The last chunk row and column take the remainder.
/// assert_eq!(grid.chunk(ChunkCoord::new(2, 1)).unwrap().shape(), (2, 3));
/// assert_eq!(grid.assemble().unwrap(), field);
/// ```
#[derive(Clone, Debug)]
pub struct DomainGrid {
    extent: (usize, usize),
    counts: (usize, usize),
    chunks: IndexMap<ChunkCoord, Arc<Chunk>>,
    row_starts: Vec<usize>,
    col_starts: Vec<usize>,
}

impl DomainGrid {
    /// Partition `field` into chunks of `chunk_shape`.
    ///
    /// If the extent is not a multiple of the chunk shape, the last
    /// chunk row/column is smaller.
    pub fn partition(field: &Field2, chunk_shape: (usize, usize)) -> Result<Self, GridError> {
        let (nx, ny) = field.shape();
        Self::partition_with(nx, ny, chunk_shape, |r, c| field[(r, c)])
    }

    /// Partition an `nx × ny` domain whose initial values are given by
    /// a pure function of global `(row, col)`.
    pub fn partition_with(
        nx: usize,
        ny: usize,
        chunk_shape: (usize, usize),
        f: impl Fn(usize, usize) -> f64,
    ) -> Result<Self, GridError> {
        let (ch, cw) = chunk_shape;
        if nx == 0 || ny == 0 {
            return Err(GridError::InvalidShape {
                reason: format!("field {nx}x{ny} is empty"),
            });
        }
        if ch == 0 || cw == 0 {
            return Err(GridError::InvalidShape {
                reason: format!("chunk shape {ch}x{cw} has a zero dimension"),
            });
        }

        let row_splits = axis_splits(nx, ch);
        let col_splits = axis_splits(ny, cw);
        let mut chunks = IndexMap::with_capacity(row_splits.len() * col_splits.len());
        for (ci, &(r0, h)) in row_splits.iter().enumerate() {
            for (cj, &(c0, w)) in col_splits.iter().enumerate() {
                let coord = ChunkCoord::new(ci, cj);
                let values = Field2::from_fn(h, w, |i, j| f(r0 + i, c0 + j));
                chunks.insert(coord, Arc::new(Chunk::new(coord, (r0, c0), values)));
            }
        }

        Ok(Self {
            extent: (nx, ny),
            counts: (row_splits.len(), col_splits.len()),
            chunks,
            row_starts: row_splits.iter().map(|&(s, _)| s).collect(),
            col_starts: col_splits.iter().map(|&(s, _)| s).collect(),
        })
    }

    /// Build a grid from caller-supplied chunks.
    ///
    /// Only the lattice is validated here: coordinates must form a
    /// dense `rows × cols` rectangle with no duplicates, and every chunk
    /// must be non-empty. Whether neighbouring faces line up is checked
    /// by the halo exchanger, and exact coverage by
    /// [`assemble`](Self::assemble).
    pub fn from_chunks(extent: (usize, usize), chunks: Vec<Chunk>) -> Result<Self, GridError> {
        if chunks.is_empty() {
            return Err(GridError::ChunkLayout {
                reason: "no chunks supplied".to_string(),
            });
        }
        let max_ci = chunks.iter().map(|c| c.coord().ci).max().unwrap_or(0);
        let max_cj = chunks.iter().map(|c| c.coord().cj).max().unwrap_or(0);
        // A dense lattice holds at least one chunk per row and column.
        if max_ci >= chunks.len() || max_cj >= chunks.len() {
            return Err(GridError::ChunkLayout {
                reason: format!(
                    "{} chunks cannot reach chunk coordinate ({max_ci}, {max_cj})",
                    chunks.len()
                ),
            });
        }
        let (rows, cols) = (max_ci + 1, max_cj + 1);

        let mut sorted = chunks;
        sorted.sort_by_key(|c| c.coord());
        let mut map = IndexMap::with_capacity(sorted.len());
        for chunk in sorted {
            let coord = chunk.coord();
            let (h, w) = chunk.shape();
            if h == 0 || w == 0 {
                return Err(GridError::ChunkLayout {
                    reason: format!("chunk {coord} is empty ({h}x{w})"),
                });
            }
            if map.insert(coord, Arc::new(chunk)).is_some() {
                return Err(GridError::ChunkLayout {
                    reason: format!("duplicate chunk {coord}"),
                });
            }
        }
        if rows.checked_mul(cols) != Some(map.len()) {
            return Err(GridError::ChunkLayout {
                reason: format!(
                    "{} chunks cannot fill a {rows}x{cols} chunk lattice",
                    map.len()
                ),
            });
        }

        let row_starts = (0..rows)
            .map(|ci| map[&ChunkCoord::new(ci, 0)].origin().0)
            .collect();
        let col_starts = (0..cols)
            .map(|cj| map[&ChunkCoord::new(0, cj)].origin().1)
            .collect();

        Ok(Self {
            extent,
            counts: (rows, cols),
            chunks: map,
            row_starts,
            col_starts,
        })
    }

    /// Derive the next grid over the same layout.
    ///
    /// `next` must contain exactly one chunk per coordinate, each with
    /// the same origin and shape as the chunk it replaces. `self` is
    /// left untouched whether or not this succeeds.
    pub fn with_chunks(&self, next: impl IntoIterator<Item = Chunk>) -> Result<Self, GridError> {
        let mut incoming: IndexMap<ChunkCoord, Chunk> = IndexMap::with_capacity(self.len());
        for chunk in next {
            let coord = chunk.coord();
            let Some(prev) = self.chunks.get(&coord) else {
                return Err(GridError::LayoutChanged {
                    chunk: coord,
                    reason: "coordinate is not part of the lattice".to_string(),
                });
            };
            if prev.origin() != chunk.origin() || prev.shape() != chunk.shape() {
                return Err(GridError::LayoutChanged {
                    chunk: coord,
                    reason: format!(
                        "expected origin {:?} shape {:?}, got origin {:?} shape {:?}",
                        prev.origin(),
                        prev.shape(),
                        chunk.origin(),
                        chunk.shape()
                    ),
                });
            }
            if incoming.insert(coord, chunk).is_some() {
                return Err(GridError::LayoutChanged {
                    chunk: coord,
                    reason: "supplied twice".to_string(),
                });
            }
        }

        let mut chunks = IndexMap::with_capacity(self.len());
        for coord in self.chunks.keys() {
            let chunk = incoming
                .swap_remove(coord)
                .ok_or_else(|| GridError::LayoutChanged {
                    chunk: *coord,
                    reason: "missing from the next step".to_string(),
                })?;
            chunks.insert(*coord, Arc::new(chunk));
        }

        Ok(Self {
            extent: self.extent,
            counts: self.counts,
            chunks,
            row_starts: self.row_starts.clone(),
            col_starts: self.col_starts.clone(),
        })
    }

    /// Global `(nx, ny)`.
    pub fn extent(&self) -> (usize, usize) {
        self.extent
    }

    /// Number of chunk rows and chunk columns.
    pub fn chunk_counts(&self) -> (usize, usize) {
        self.counts
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// `true` if the grid holds no chunks (never the case for a
    /// successfully constructed grid).
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The shared handle for the chunk at `coord`.
    pub fn get(&self, coord: ChunkCoord) -> Option<&Arc<Chunk>> {
        self.chunks.get(&coord)
    }

    /// The chunk at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord).map(|c| &**c)
    }

    /// Chunks in row-major coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkCoord, &Arc<Chunk>)> {
        self.chunks.iter().map(|(k, v)| (*k, v))
    }

    /// Chunk coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// The chunk across `side` of `coord`, if one exists.
    pub fn neighbour(&self, coord: ChunkCoord, side: Side) -> Option<&Arc<Chunk>> {
        coord.step(side).and_then(|c| self.chunks.get(&c))
    }

    /// All existing neighbours of `coord` with the side they lie on.
    pub fn neighbours(&self, coord: ChunkCoord) -> SmallVec<[(Side, ChunkCoord); 4]> {
        Side::ALL
            .into_iter()
            .filter_map(|side| self.neighbour(coord, side).map(|n| (side, n.coord())))
            .collect()
    }

    /// Sides of `coord` that lie on the global domain boundary.
    pub fn boundary_sides(&self, coord: ChunkCoord) -> SmallVec<[Side; 4]> {
        Side::ALL
            .into_iter()
            .filter(|&side| self.neighbour(coord, side).is_none())
            .collect()
    }

    /// Value of the global cell `(row, col)`, or `None` if no chunk
    /// holds it.
    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.extent.0 || col >= self.extent.1 {
            return None;
        }
        let ci = self.row_starts.partition_point(|&s| s <= row).checked_sub(1)?;
        let cj = self.col_starts.partition_point(|&s| s <= col).checked_sub(1)?;
        let chunk = self.chunks.get(&ChunkCoord::new(ci, cj))?;
        if !chunk.contains(row, col) {
            return None;
        }
        let (r0, c0) = chunk.origin();
        chunk.values().get(row - r0, col - c0)
    }

    /// Sum of every cell.
    pub fn total(&self) -> f64 {
        self.chunks.values().map(|c| c.values().sum()).sum()
    }

    /// Gather all chunks into the global field.
    ///
    /// Fails if a chunk extends past the extent, two chunks overlap, or
    /// a cell is left uncovered.
    pub fn assemble(&self) -> Result<Field2, GridError> {
        let (nx, ny) = self.extent;
        let mut out = Field2::zeros(nx, ny);
        let mut covered = vec![false; nx * ny];

        for (coord, chunk) in &self.chunks {
            let (r0, c0) = chunk.origin();
            let (h, w) = chunk.shape();
            if r0 + h > nx || c0 + w > ny {
                return Err(GridError::Coverage {
                    reason: format!(
                        "chunk {coord} at ({r0},{c0}) with shape {h}x{w} exceeds extent {nx}x{ny}"
                    ),
                });
            }
            for r in r0..r0 + h {
                for c in c0..c0 + w {
                    let slot = &mut covered[r * ny + c];
                    if *slot {
                        return Err(GridError::Coverage {
                            reason: format!("cell ({r},{c}) covered twice (second by {coord})"),
                        });
                    }
                    *slot = true;
                }
            }
            out.write_block(r0, c0, chunk.values());
        }

        if let Some(gap) = covered.iter().position(|&c| !c) {
            return Err(GridError::Coverage {
                reason: format!("cell ({},{}) not covered by any chunk", gap / ny, gap % ny),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp(nx: usize, ny: usize) -> Field2 {
        Field2::from_fn(nx, ny, |r, c| (r * ny + c) as f64)
    }

    #[test]
    fn axis_splits_takes_remainder_last() {
        assert_eq!(axis_splits(10, 4), vec![(0, 4), (4, 4), (8, 2)]);
        assert_eq!(axis_splits(8, 4), vec![(0, 4), (4, 4)]);
        assert_eq!(axis_splits(3, 5), vec![(0, 3)]);
    }

    #[test]
    fn partition_covers_lattice() {
        let grid = DomainGrid::partition(&ramp(8, 8), (4, 4)).unwrap();
        assert_eq!(grid.chunk_counts(), (2, 2));
        assert_eq!(grid.len(), 4);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(
            coords,
            vec![
                ChunkCoord::new(0, 0),
                ChunkCoord::new(0, 1),
                ChunkCoord::new(1, 0),
                ChunkCoord::new(1, 1)
            ]
        );
        assert_eq!(grid.chunk(ChunkCoord::new(1, 1)).unwrap().origin(), (4, 4));
    }

    #[test]
    fn partition_rejects_zero_chunk_shape() {
        match DomainGrid::partition(&ramp(4, 4), (0, 2)) {
            Err(GridError::InvalidShape { .. }) => {}
            other => panic!("expected InvalidShape, got {other:?}"),
        }
    }

    #[test]
    fn partition_rejects_empty_field() {
        match DomainGrid::partition(&Field2::zeros(0, 4), (2, 2)) {
            Err(GridError::InvalidShape { .. }) => {}
            other => panic!("expected InvalidShape, got {other:?}"),
        }
    }

    #[test]
    fn neighbours_and_boundary_sides() {
        let grid = DomainGrid::partition(&ramp(9, 9), (3, 3)).unwrap();
        let centre = ChunkCoord::new(1, 1);
        assert_eq!(grid.neighbours(centre).len(), 4);
        assert!(grid.boundary_sides(centre).is_empty());

        let corner = ChunkCoord::new(0, 2);
        let sides = grid.boundary_sides(corner);
        assert_eq!(sides.as_slice(), &[Side::North, Side::East]);
        let nbs = grid.neighbours(corner);
        assert!(nbs.contains(&(Side::South, ChunkCoord::new(1, 2))));
        assert!(nbs.contains(&(Side::West, ChunkCoord::new(0, 1))));
    }

    #[test]
    fn value_at_reads_through_chunks() {
        let field = ramp(10, 7);
        let grid = DomainGrid::partition(&field, (4, 3)).unwrap();
        for r in 0..10 {
            for c in 0..7 {
                assert_eq!(grid.value_at(r, c), Some(field[(r, c)]));
            }
        }
        assert_eq!(grid.value_at(10, 0), None);
    }

    #[test]
    fn from_chunks_rejects_duplicate() {
        let a = Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(2, 2));
        let b = a.clone();
        match DomainGrid::from_chunks((2, 4), vec![a, b]) {
            Err(GridError::ChunkLayout { .. }) => {}
            other => panic!("expected ChunkLayout, got {other:?}"),
        }
    }

    #[test]
    fn from_chunks_rejects_sparse_lattice() {
        let a = Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(2, 2));
        let b = Chunk::new(ChunkCoord::new(1, 1), (2, 2), Field2::zeros(2, 2));
        match DomainGrid::from_chunks((4, 4), vec![a, b]) {
            Err(GridError::ChunkLayout { .. }) => {}
            other => panic!("expected ChunkLayout, got {other:?}"),
        }
    }

    #[test]
    fn from_chunks_rejects_out_of_reach_coordinates() {
        for coord in [
            ChunkCoord::new(usize::MAX, 0),
            ChunkCoord::new(0, usize::MAX),
            ChunkCoord::new(1 << 40, 1 << 40),
        ] {
            let c = Chunk::new(coord, (0, 0), Field2::zeros(1, 1));
            match DomainGrid::from_chunks((1, 1), vec![c]) {
                Err(GridError::ChunkLayout { .. }) => {}
                other => panic!("expected ChunkLayout for {coord}, got {other:?}"),
            }
        }
    }

    #[test]
    fn assemble_detects_gap() {
        let a = Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(2, 2));
        let b = Chunk::new(ChunkCoord::new(0, 1), (0, 2), Field2::zeros(2, 1));
        let grid = DomainGrid::from_chunks((2, 4), vec![a, b]).unwrap();
        match grid.assemble() {
            Err(GridError::Coverage { .. }) => {}
            other => panic!("expected Coverage, got {other:?}"),
        }
    }

    #[test]
    fn assemble_detects_overlap() {
        let a = Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(2, 3));
        let b = Chunk::new(ChunkCoord::new(0, 1), (0, 2), Field2::zeros(2, 2));
        let grid = DomainGrid::from_chunks((2, 4), vec![a, b]).unwrap();
        match grid.assemble() {
            Err(GridError::Coverage { .. }) => {}
            other => panic!("expected Coverage, got {other:?}"),
        }
    }

    #[test]
    fn with_chunks_preserves_layout() {
        let grid = DomainGrid::partition(&ramp(4, 4), (2, 2)).unwrap();
        let next: Vec<Chunk> = grid
            .iter()
            .map(|(_, c)| c.with_values(Field2::filled(2, 2, 1.0)))
            .collect();
        let next_grid = grid.with_chunks(next).unwrap();
        assert_eq!(next_grid.total(), 16.0);
        // The source grid is unchanged.
        assert_eq!(grid.total(), ramp(4, 4).sum());
    }

    #[test]
    fn with_chunks_rejects_reshaped_chunk() {
        let grid = DomainGrid::partition(&ramp(4, 4), (2, 2)).unwrap();
        let next: Vec<Chunk> = grid
            .iter()
            .map(|(coord, c)| {
                if coord == ChunkCoord::new(1, 0) {
                    c.with_values(Field2::zeros(2, 1))
                } else {
                    (**c).clone()
                }
            })
            .collect();
        match grid.with_chunks(next) {
            Err(GridError::LayoutChanged { chunk, .. }) => {
                assert_eq!(chunk, ChunkCoord::new(1, 0));
            }
            other => panic!("expected LayoutChanged, got {other:?}"),
        }
    }

    #[test]
    fn with_chunks_rejects_missing_chunk() {
        let grid = DomainGrid::partition(&ramp(4, 4), (2, 2)).unwrap();
        let next: Vec<Chunk> = grid.iter().skip(1).map(|(_, c)| (**c).clone()).collect();
        match grid.with_chunks(next) {
            Err(GridError::LayoutChanged { chunk, .. }) => {
                assert_eq!(chunk, ChunkCoord::new(0, 0));
            }
            other => panic!("expected LayoutChanged, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn partition_then_assemble_is_identity(
            nx in 1usize..20,
            ny in 1usize..20,
            ch in 1usize..25,
            cw in 1usize..25,
        ) {
            let field = ramp(nx, ny);
            let grid = DomainGrid::partition(&field, (ch, cw)).unwrap();
            prop_assert_eq!(grid.chunk_counts(), (nx.div_ceil(ch), ny.div_ceil(cw)));
            prop_assert_eq!(grid.assemble().unwrap(), field);
        }
    }
}
