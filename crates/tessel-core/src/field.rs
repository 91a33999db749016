//! Dense row-major 2D array of `f64` cell values.

use std::ops::{Index, IndexMut};

use crate::error::FieldShapeError;

/// A dense `rows × cols` array stored in row-major order.
///
/// Used for initial conditions, chunk interiors, and the assembled
/// output field. Axis 0 is the row axis (global `nx`), axis 1 the
/// column axis (global `ny`).
#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Field2 {
    /// A field of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// A field with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// Returns `Err` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, FieldShapeError> {
        if data.len() != rows * cols {
            return Err(FieldShapeError {
                expected: (rows, cols),
                found_len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a field by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the field has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Row-major backing slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major backing slice.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the field and return its backing buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Borrow row `r`.
    ///
    /// # Panics
    ///
    /// Panics if `r >= rows`.
    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Copy column `c` into a new vector.
    ///
    /// # Panics
    ///
    /// Panics if `c >= cols`.
    pub fn col(&self, c: usize) -> Vec<f64> {
        assert!(c < self.cols, "column {c} out of range for {} cols", self.cols);
        (0..self.rows).map(|r| self.data[r * self.cols + c]).collect()
    }

    /// Copy the `h × w` block starting at `(row0, col0)`.
    ///
    /// # Panics
    ///
    /// Panics if the block extends past the field.
    pub fn block(&self, row0: usize, col0: usize, h: usize, w: usize) -> Field2 {
        assert!(
            row0 + h <= self.rows && col0 + w <= self.cols,
            "block ({row0},{col0})+({h}x{w}) exceeds field {}x{}",
            self.rows,
            self.cols
        );
        let mut data = Vec::with_capacity(h * w);
        for r in row0..row0 + h {
            let start = r * self.cols + col0;
            data.extend_from_slice(&self.data[start..start + w]);
        }
        Field2 {
            rows: h,
            cols: w,
            data,
        }
    }

    /// Overwrite the block at `(row0, col0)` with `src`.
    ///
    /// # Panics
    ///
    /// Panics if `src` extends past the field.
    pub fn write_block(&mut self, row0: usize, col0: usize, src: &Field2) {
        assert!(
            row0 + src.rows <= self.rows && col0 + src.cols <= self.cols,
            "block ({row0},{col0})+({}x{}) exceeds field {}x{}",
            src.rows,
            src.cols,
            self.rows,
            self.cols
        );
        for r in 0..src.rows {
            let dst = (row0 + r) * self.cols + col0;
            self.data[dst..dst + src.cols].copy_from_slice(src.row(r));
        }
    }

    /// Sum of all cells.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Smallest cell value (`+inf` for an empty field).
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest cell value (`-inf` for an empty field).
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Position and value of the first non-finite cell, if any.
    pub fn first_non_finite(&self) -> Option<((usize, usize), f64)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| ((i / self.cols, i % self.cols), self.data[i]))
    }

    /// Largest `|a - b|` over all cells, or `None` if the shapes differ.
    pub fn max_abs_diff(&self, other: &Field2) -> Option<f64> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }
}

impl Index<(usize, usize)> for Field2 {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        assert!(r < self.rows && c < self.cols, "index ({r},{c}) out of bounds");
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Field2 {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        assert!(r < self.rows && c < self.cols, "index ({r},{c}) out of bounds");
        &mut self.data[r * self.cols + c]
    }
}
