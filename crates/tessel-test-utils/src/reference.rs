//! Monolithic reference stencils.
//!
//! These operate on the whole field at once and resolve every
//! out-of-domain read through [`BoundaryPolicy::source_index`], with no
//! chunks or halos involved. A chunked run must agree with them.

use tessel_core::Field2;
use tessel_grid::{BoundaryPolicy, GridSpec};

/// Read global `(r, c)` where either index may be one cell outside the
/// field.
fn read(field: &Field2, boundary: BoundaryPolicy, r: isize, c: isize) -> f64 {
    let (nx, ny) = field.shape();
    match (
        boundary.source_index(r, nx),
        boundary.source_index(c, ny),
    ) {
        (Some(r), Some(c)) => field[(r, c)],
        _ => boundary.fixed_value().unwrap_or(f64::NAN),
    }
}

/// One 5-point step over the whole field.
pub fn reference_step(field: &Field2, boundary: BoundaryPolicy, spec: &GridSpec) -> Field2 {
    let (nx, ny) = field.shape();
    let cx = spec.alpha * spec.dt / (spec.dx * spec.dx);
    let cy = spec.alpha * spec.dt / (spec.dy * spec.dy);
    Field2::from_fn(nx, ny, |i, j| {
        let (r, c) = (i as isize, j as isize);
        let t = field[(i, j)];
        let d_rows = read(field, boundary, r - 1, c) + read(field, boundary, r + 1, c) - 2.0 * t;
        let d_cols = read(field, boundary, r, c - 1) + read(field, boundary, r, c + 1) - 2.0 * t;
        t + cx * d_rows + cy * d_cols
    })
}

/// One 9-point step over the whole field (square mesh, spacing `dx`).
pub fn reference_nine_point(field: &Field2, boundary: BoundaryPolicy, spec: &GridSpec) -> Field2 {
    let (nx, ny) = field.shape();
    let coef = spec.alpha * spec.dt / (6.0 * spec.dx * spec.dx);
    Field2::from_fn(nx, ny, |i, j| {
        let (r, c) = (i as isize, j as isize);
        let at = |dr: isize, dc: isize| read(field, boundary, r + dr, c + dc);
        let t = field[(i, j)];
        let faces = at(-1, 0) + at(1, 0) + at(0, -1) + at(0, 1);
        let diagonals = at(-1, -1) + at(-1, 1) + at(1, -1) + at(1, 1);
        t + coef * (4.0 * faces + diagonals - 20.0 * t)
    })
}

/// `steps` 5-point steps from `field`.
pub fn reference_run(
    field: &Field2,
    boundary: BoundaryPolicy,
    spec: &GridSpec,
    steps: u64,
) -> Field2 {
    let mut current = field.clone();
    for _ in 0..steps {
        current = reference_step(&current, boundary, spec);
    }
    current
}
