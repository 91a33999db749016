//! Test utilities for Tessel development.
//!
//! - [`reference`]: a monolithic stencil over the global field that
//!   never partitions, used to cross-check the chunked engine
//! - [`fixtures`]: seed fields, hand-built chunk layouts, and stencils
//!   that fail, panic, or poison their output on demand

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod reference;

pub use reference::{reference_nine_point, reference_run, reference_step};

use tessel_core::Field2;

/// Largest elementwise difference, relative to the larger magnitude of
/// the two fields (floored at 1).
pub fn relative_diff(a: &Field2, b: &Field2) -> f64 {
    assert_eq!(a.shape(), b.shape(), "fields differ in shape");
    let scale = a
        .as_slice()
        .iter()
        .chain(b.as_slice())
        .fold(1.0f64, |m, v| m.max(v.abs()));
    a.max_abs_diff(b).unwrap_or(f64::INFINITY) / scale
}

/// Panic with the first offending cell if `a` and `b` differ by more
/// than `tol` relative.
pub fn assert_fields_close(a: &Field2, b: &Field2, tol: f64) {
    let diff = relative_diff(a, b);
    if diff <= tol {
        return;
    }
    let (rows, cols) = a.shape();
    for r in 0..rows {
        for c in 0..cols {
            let (x, y) = (a[(r, c)], b[(r, c)]);
            if (x - y).abs() > tol * x.abs().max(y.abs()).max(1.0) {
                panic!("fields differ at ({r},{c}): {x} vs {y} (relative diff {diff:e})");
            }
        }
    }
    panic!("fields differ by {diff:e} relative (tolerance {tol:e})");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_fields_are_close() {
        let f = Field2::from_fn(3, 3, |r, c| (r + c) as f64);
        assert_fields_close(&f, &f.clone(), 0.0);
    }

    #[test]
    #[should_panic(expected = "fields differ at (1,2)")]
    fn differing_cell_is_reported() {
        let a = Field2::zeros(3, 3);
        let mut b = a.clone();
        b[(1, 2)] = 1.0;
        assert_fields_close(&a, &b, 1e-10);
    }
}
