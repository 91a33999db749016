//! A rectangular block of the global field.

use tessel_core::{ChunkCoord, Field2, Side};

/// An owned block of cell values positioned in the global grid.
///
/// A chunk is never mutated after it is published into a
/// [`DomainGrid`](crate::DomainGrid); each step produces a fresh chunk
/// via [`with_values`](Chunk::with_values).
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    coord: ChunkCoord,
    origin: (usize, usize),
    values: Field2,
}

impl Chunk {
    /// Create a chunk at lattice position `coord` whose top-left cell
    /// sits at global `(row0, col0)`.
    pub fn new(coord: ChunkCoord, origin: (usize, usize), values: Field2) -> Self {
        Self {
            coord,
            origin,
            values,
        }
    }

    /// Lattice position.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Global `(row0, col0)` of the top-left cell.
    pub fn origin(&self) -> (usize, usize) {
        self.origin
    }

    /// `(h, w)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Interior values.
    pub fn values(&self) -> &Field2 {
        &self.values
    }

    /// Consume the chunk and return its values.
    pub fn into_values(self) -> Field2 {
        self.values
    }

    /// A successor chunk at the same position carrying `values`.
    ///
    /// Callers are expected to preserve the shape; the grid rejects a
    /// changed shape when the successor is committed.
    pub fn with_values(&self, values: Field2) -> Self {
        Self {
            coord: self.coord,
            origin: self.origin,
            values,
        }
    }

    /// Length of the face on `side` (columns for N/S, rows for E/W).
    pub fn face_len(&self, side: Side) -> usize {
        let (h, w) = self.shape();
        if side.is_horizontal() {
            w
        } else {
            h
        }
    }

    /// Extent perpendicular to `side` (rows for N/S, columns for E/W).
    pub fn depth(&self, side: Side) -> usize {
        let (h, w) = self.shape();
        if side.is_horizontal() {
            h
        } else {
            w
        }
    }

    /// The outermost row or column on `side`.
    pub fn edge(&self, side: Side) -> Vec<f64> {
        self.line(side, 0)
    }

    /// The row or column one cell in from `side`, or `None` if the
    /// chunk is only one cell deep in that direction.
    pub fn inner(&self, side: Side) -> Option<Vec<f64>> {
        (self.depth(side) >= 2).then(|| self.line(side, 1))
    }

    /// Global position of the local cell `(i, j)`.
    pub fn global(&self, i: usize, j: usize) -> (usize, usize) {
        (self.origin.0 + i, self.origin.1 + j)
    }

    /// `true` if global `(row, col)` lies inside this chunk.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let (h, w) = self.shape();
        (self.origin.0..self.origin.0 + h).contains(&row)
            && (self.origin.1..self.origin.1 + w).contains(&col)
    }

    /// Row/column `offset` cells in from `side`.
    fn line(&self, side: Side, offset: usize) -> Vec<f64> {
        let (h, w) = self.shape();
        match side {
            Side::North => self.values.row(offset).to_vec(),
            Side::South => self.values.row(h - 1 - offset).to_vec(),
            Side::West => self.values.col(offset),
            Side::East => self.values.col(w - 1 - offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Chunk {
        // 3x4 block at global (6, 8): value = 10*i + j
        Chunk::new(
            ChunkCoord::new(2, 2),
            (6, 8),
            Field2::from_fn(3, 4, |i, j| (10 * i + j) as f64),
        )
    }

    #[test]
    fn edges_follow_sides() {
        let c = sample();
        assert_eq!(c.edge(Side::North), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(c.edge(Side::South), vec![20.0, 21.0, 22.0, 23.0]);
        assert_eq!(c.edge(Side::West), vec![0.0, 10.0, 20.0]);
        assert_eq!(c.edge(Side::East), vec![3.0, 13.0, 23.0]);
    }

    #[test]
    fn inner_lines_are_second_from_edge() {
        let c = sample();
        assert_eq!(c.inner(Side::North), Some(vec![10.0, 11.0, 12.0, 13.0]));
        assert_eq!(c.inner(Side::South), Some(vec![10.0, 11.0, 12.0, 13.0]));
        assert_eq!(c.inner(Side::West), Some(vec![1.0, 11.0, 21.0]));
        assert_eq!(c.inner(Side::East), Some(vec![2.0, 12.0, 22.0]));
    }

    #[test]
    fn single_row_chunk_has_no_inner_row() {
        let c = Chunk::new(ChunkCoord::new(0, 0), (0, 0), Field2::zeros(1, 5));
        assert_eq!(c.inner(Side::North), None);
        assert_eq!(c.inner(Side::South), None);
        assert!(c.inner(Side::East).is_some());
    }

    #[test]
    fn face_len_and_depth() {
        let c = sample();
        assert_eq!(c.face_len(Side::North), 4);
        assert_eq!(c.face_len(Side::East), 3);
        assert_eq!(c.depth(Side::North), 3);
        assert_eq!(c.depth(Side::West), 4);
    }

    #[test]
    fn global_and_contains() {
        let c = sample();
        assert_eq!(c.global(1, 2), (7, 10));
        assert!(c.contains(6, 8));
        assert!(c.contains(8, 11));
        assert!(!c.contains(9, 8));
        assert!(!c.contains(6, 12));
    }
}
