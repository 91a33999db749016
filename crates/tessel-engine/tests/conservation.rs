//! Integration test: boundary flux accounting and steady states.

use tessel_core::{Field2, Side};
use tessel_engine::{InlineExecutor, Simulation, SimulationConfig};
use tessel_grid::{BoundaryPolicy, GridSpec};
use tessel_test_utils::fixtures::wavy_field;

fn simulation(
    spec: GridSpec,
    chunk_shape: (usize, usize),
    steps: u64,
    boundary: BoundaryPolicy,
    field: &Field2,
) -> Simulation {
    let mut cfg = SimulationConfig::new(spec, chunk_shape, steps);
    cfg.boundary = boundary;
    Simulation::from_field(cfg, field, InlineExecutor).unwrap()
}

#[test]
fn edge_boundary_conserves_total() {
    let spec = GridSpec::new(24, 17);
    let field = wavy_field(24, 17);
    let before = field.sum();
    let mut sim = simulation(spec, (5, 6), 50, BoundaryPolicy::Edge, &field);
    let report = sim.run().unwrap();
    let after = report.field.sum();
    assert!(
        (after - before).abs() <= 1e-9 * before.abs().max(1.0),
        "total drifted from {before} to {after}"
    );
}

/// `Σ_faces (ghost - edge)` weighted by the axis coefficient, where the
/// reflect ghost is the row or column one in from the edge.
fn reflect_flux(field: &Field2, spec: &GridSpec) -> f64 {
    let (nx, ny) = field.shape();
    let cx = spec.alpha * spec.dt / (spec.dx * spec.dx);
    let cy = spec.alpha * spec.dt / (spec.dy * spec.dy);
    let mut flux = 0.0;
    for side in Side::ALL {
        let (edge_line, ghost_line, coef): (Vec<f64>, Vec<f64>, f64) = match side {
            Side::North => (field.row(0).to_vec(), field.row(1).to_vec(), cx),
            Side::South => (field.row(nx - 1).to_vec(), field.row(nx - 2).to_vec(), cx),
            Side::West => (field.col(0), field.col(1), cy),
            Side::East => (field.col(ny - 1), field.col(ny - 2), cy),
        };
        let diff: f64 = ghost_line.iter().zip(&edge_line).map(|(g, e)| g - e).sum();
        flux += coef * diff;
    }
    flux
}

#[test]
fn reflect_change_equals_boundary_flux() {
    let spec = GridSpec::new(16, 12).with_spacing(1.0, 1.5).with_dt(0.8);
    let field = wavy_field(16, 12);
    let mut sim = simulation(spec, (5, 5), 10, BoundaryPolicy::Reflect, &field);
    for _ in 0..10 {
        let current = sim.field().unwrap();
        let expected = reflect_flux(&current, &spec);
        sim.advance().unwrap();
        let change = sim.field().unwrap().sum() - current.sum();
        assert!(
            (change - expected).abs() < 1e-9,
            "step {}: change {change}, flux {expected}",
            sim.step_index()
        );
    }
}

#[test]
fn uniform_field_is_a_fixed_point() {
    let spec = GridSpec::new(9, 14).with_alpha(0.2);
    let field = Field2::filled(9, 14, 3.5);
    for boundary in [
        BoundaryPolicy::Reflect,
        BoundaryPolicy::Edge,
        BoundaryPolicy::Fixed(3.5),
    ] {
        let mut sim = simulation(spec, (4, 5), 8, boundary, &field);
        let report = sim.run().unwrap();
        for &v in report.field.as_slice() {
            assert!((v - 3.5).abs() < 1e-12, "{boundary}: drifted to {v}");
        }
    }
}

#[test]
fn fixed_boundary_pulls_toward_constant() {
    let spec = GridSpec::new(10, 10);
    let field = Field2::zeros(10, 10);
    let mut sim = simulation(spec, (5, 5), 200, BoundaryPolicy::Fixed(1.0), &field);
    let report = sim.run().unwrap();
    let (lo, hi) = (report.field.min(), report.field.max());
    assert!(lo > 0.0 && hi <= 1.0 + 1e-12, "range [{lo}, {hi}]");
}

#[test]
fn hot_cell_total_under_reflect_and_edge() {
    // T[2,2] = 1 on 4x4: the two boundary neighbours see the hot cell
    // through their mirrored ghosts, so reflect adds 2 * alpha.
    let spec = GridSpec::new(4, 4).with_alpha(0.1);
    let mut field = Field2::zeros(4, 4);
    field[(2, 2)] = 1.0;

    let mut reflect = simulation(spec, (2, 2), 1, BoundaryPolicy::Reflect, &field);
    let after = reflect.run().unwrap().field.sum();
    assert!((after - 1.2).abs() < 1e-12, "reflect total {after}");

    let mut edge = simulation(spec, (2, 2), 1, BoundaryPolicy::Edge, &field);
    let after = edge.run().unwrap().field.sum();
    assert!((after - 1.0).abs() < 1e-12, "edge total {after}");
}
