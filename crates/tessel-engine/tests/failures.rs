//! Integration test: step failures leave the published grid untouched.
//!
//! Every failure path (halo mismatch, kernel error, lost task, divergence,
//! cancellation) must surface with the step number, and chunk where one
//! applies, and must not advance the committed state.

use std::sync::Arc;

use tessel_core::{ChunkCoord, Field2, HaloError, KernelError, Side, StepError, StepIndex};
use tessel_engine::{
    CancelToken, DivergenceCheck, DriverPhase, InlineExecutor, Simulation, SimulationConfig,
    StabilityPolicy, ThreadPoolExecutor,
};
use tessel_grid::{Chunk, DomainGrid, GridSpec, HaloedChunk};
use tessel_stencil::{FivePointDiffusion, InitialCondition, Stencil};
use tessel_test_utils::fixtures::{mismatched_chunks, PanickingStencil, PoisonStencil};

fn config(nx: usize, ny: usize, chunk_shape: (usize, usize), steps: u64) -> SimulationConfig {
    let mut cfg = SimulationConfig::new(GridSpec::new(nx, ny), chunk_shape, steps);
    cfg.progress_interval = None;
    cfg
}

// ── Halo exchange ────────────────────────────────────────────────────

#[test]
fn mismatched_layout_fails_at_first_halo_build() {
    let grid = DomainGrid::from_chunks((4, 3), mismatched_chunks()).unwrap();
    let mut sim = Simulation::from_grid(config(4, 3, (2, 2), 3), grid, InlineExecutor).unwrap();

    match sim.advance() {
        Err(StepError::Halo {
            step,
            source:
                HaloError::ShapeMismatch {
                    chunk,
                    side,
                    expected,
                    found,
                    ..
                },
        }) => {
            assert_eq!(step, StepIndex(1));
            assert_eq!(chunk, ChunkCoord::new(0, 0));
            assert_eq!(side, Side::South);
            assert_eq!((expected, found), (2, 3));
        }
        other => panic!("expected Halo(ShapeMismatch), got {other:?}"),
    }
    assert_eq!(sim.step_index(), StepIndex(0));
    assert_eq!(sim.phase(), DriverPhase::Failed { step: StepIndex(1) });
}

#[test]
fn grid_extent_must_match_spec() {
    let grid = DomainGrid::partition(&Field2::zeros(4, 4), (2, 2)).unwrap();
    assert!(Simulation::from_grid(config(4, 5, (2, 2), 1), grid, InlineExecutor).is_err());
}

// ── Divergence ───────────────────────────────────────────────────────

#[test]
fn nan_is_reported_with_global_cell() {
    let mut cfg = config(8, 8, (4, 4), 5);
    cfg.stencil = Arc::new(PoisonStencil::new((5, 6), f64::NAN, 0));
    let mut sim = Simulation::new(cfg, &InitialCondition::Uniform(1.0)).unwrap();

    match sim.advance() {
        Err(StepError::NumericalInstability {
            step,
            chunk,
            cell,
            value,
        }) => {
            assert_eq!(step, StepIndex(1));
            assert_eq!(chunk, ChunkCoord::new(1, 1));
            assert_eq!(cell, (5, 6));
            assert!(value.is_nan());
        }
        other => panic!("expected NumericalInstability, got {other:?}"),
    }
    assert_eq!(sim.field().unwrap(), Field2::filled(8, 8, 1.0));
}

#[test]
fn nan_on_later_step_reports_that_step() {
    // One chunk, so the stencil is called once per step.
    let mut cfg = config(6, 6, (6, 6), 5);
    cfg.stencil = Arc::new(PoisonStencil::new((0, 0), f64::INFINITY, 2));
    let mut sim = Simulation::new(cfg, &InitialCondition::hot_spot(6, 6)).unwrap();
    match sim.run() {
        Err(e @ StepError::NumericalInstability { .. }) => {
            assert_eq!(e.step(), StepIndex(3));
            assert_eq!(e.chunk(), Some(ChunkCoord::new(0, 0)));
        }
        other => panic!("expected NumericalInstability, got {other:?}"),
    }
    assert_eq!(sim.step_index(), StepIndex(2));
}

#[test]
fn divergence_check_off_lets_nan_through() {
    let mut cfg = config(4, 4, (2, 2), 1);
    cfg.stencil = Arc::new(PoisonStencil::new((0, 0), f64::NAN, 0));
    cfg.divergence = DivergenceCheck::Off;
    let report = Simulation::new(cfg, &InitialCondition::Uniform(0.0))
        .unwrap()
        .run()
        .unwrap();
    assert!(report.field[(0, 0)].is_nan());
}

#[test]
fn unstable_checkerboard_trips_bound() {
    // A checkerboard is an eigenmode of the 5-point stencil under
    // reflect with factor 1 - 8·α·dt = -7 per step.
    let spec = GridSpec::new(8, 8).with_dt(10.0);
    let mut cfg = SimulationConfig::new(spec, (4, 4), 10);
    cfg.stability = StabilityPolicy::Ignore;
    cfg.divergence = DivergenceCheck::Bound(100.0);
    cfg.progress_interval = None;
    let field = Field2::from_fn(8, 8, |r, c| if (r + c) % 2 == 0 { 1.0 } else { -1.0 });
    let mut sim = Simulation::from_field(cfg, &field, InlineExecutor).unwrap();

    assert!(sim.advance().is_ok());
    assert!(sim.advance().is_ok());
    match sim.advance() {
        Err(StepError::NumericalInstability { step, value, .. }) => {
            assert_eq!(step, StepIndex(3));
            assert!((value.abs() - 343.0).abs() < 1e-9);
        }
        other => panic!("expected NumericalInstability, got {other:?}"),
    }
}

// ── Lost tasks ───────────────────────────────────────────────────────

#[test]
fn panicking_kernel_is_task_lost_inline() {
    let mut cfg = config(6, 6, (3, 3), 2);
    cfg.stencil = Arc::new(PanickingStencil {
        target: ChunkCoord::new(1, 0),
    });
    let mut sim = Simulation::new(cfg, &InitialCondition::Uniform(2.0)).unwrap();
    match sim.advance() {
        Err(StepError::TaskLost { step, chunk }) => {
            assert_eq!(step, StepIndex(1));
            assert_eq!(chunk, ChunkCoord::new(1, 0));
        }
        other => panic!("expected TaskLost, got {other:?}"),
    }
    assert_eq!(sim.step_index(), StepIndex(0));
}

#[test]
fn panicking_kernel_is_task_lost_on_pool() {
    let mut cfg = config(6, 6, (3, 3), 2);
    cfg.stencil = Arc::new(PanickingStencil {
        target: ChunkCoord::new(0, 1),
    });
    let pool = ThreadPoolExecutor::with_workers(2).unwrap();
    let mut sim = Simulation::with_executor(cfg, &InitialCondition::Uniform(2.0), pool).unwrap();
    match sim.advance() {
        Err(StepError::TaskLost { chunk, .. }) => assert_eq!(chunk, ChunkCoord::new(0, 1)),
        other => panic!("expected TaskLost, got {other:?}"),
    }
    // The pool itself survives the panic.
    assert!(matches!(sim.advance(), Err(StepError::Halted { .. })));
    assert_eq!(sim.executor().worker_count(), 2);
}

// ── Kernel contract ──────────────────────────────────────────────────

/// Returns a chunk one column narrower than its input.
struct ShrinkingStencil;

impl Stencil for ShrinkingStencil {
    fn name(&self) -> &str {
        "shrinking"
    }

    fn max_dt(&self, _spec: &GridSpec) -> Option<f64> {
        None
    }

    fn apply(&self, hc: &HaloedChunk, _spec: &GridSpec) -> Result<Chunk, KernelError> {
        let (h, w) = hc.shape();
        let values = hc.chunk().values().block(0, 0, h, w - 1);
        Ok(hc.chunk().with_values(values))
    }
}

#[test]
fn reshaped_output_is_rejected_at_commit() {
    let mut cfg = config(4, 4, (2, 2), 1);
    cfg.stencil = Arc::new(ShrinkingStencil);
    let mut sim = Simulation::new(cfg, &InitialCondition::Uniform(0.0)).unwrap();
    match sim.advance() {
        Err(StepError::Kernel {
            step,
            chunk,
            source: KernelError::Shape { .. },
        }) => {
            assert_eq!(step, StepIndex(1));
            assert_eq!(chunk, ChunkCoord::new(0, 0));
        }
        other => panic!("expected Kernel(Shape), got {other:?}"),
    }
}

// ── Cancellation ─────────────────────────────────────────────────────

/// Requests cancellation from inside the kernel, after halos are built
/// but before the step can commit.
struct CancelInKernel {
    token: CancelToken,
}

impl Stencil for CancelInKernel {
    fn name(&self) -> &str {
        "cancel-in-kernel"
    }

    fn max_dt(&self, spec: &GridSpec) -> Option<f64> {
        FivePointDiffusion.max_dt(spec)
    }

    fn apply(&self, hc: &HaloedChunk, spec: &GridSpec) -> Result<Chunk, KernelError> {
        self.token.cancel();
        FivePointDiffusion.apply(hc, spec)
    }
}

#[test]
fn cancellation_mid_step_discards_the_step() {
    let token = CancelToken::new();
    let mut cfg = config(6, 6, (3, 3), 4);
    cfg.stencil = Arc::new(CancelInKernel {
        token: token.clone(),
    });
    let seed = InitialCondition::hot_spot(6, 6);
    let mut sim = Simulation::new(cfg, &seed).unwrap().with_cancel_token(token);

    match sim.run() {
        Err(StepError::Cancelled { step }) => assert_eq!(step, StepIndex(1)),
        other => panic!("expected Cancelled, got {other:?}"),
    }
    assert_eq!(sim.step_index(), StepIndex(0));
    assert_eq!(sim.phase(), DriverPhase::Initialized);
    assert_eq!(sim.field().unwrap(), seed.field(6, 6));
}
