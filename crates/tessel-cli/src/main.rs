//! `tessel`: run a heated-plate scenario and print a summary.
//!
//! ```text
//! tessel --rows 400 --cols 400 --chunk-rows 100 --chunk-cols 100 --steps 300 --workers 4
//! RUST_LOG=tessel_engine=debug tessel --steps 10
//! ```

use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tessel::prelude::*;
use tracing_subscriber::EnvFilter;

/// Domain-decomposed 2D heat-equation solver
#[derive(Parser, Debug)]
#[command(name = "tessel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explicit 2D heat diffusion over a chunked grid", long_about = None)]
struct Args {
    /// Grid rows
    #[arg(long, default_value_t = 400)]
    rows: usize,

    /// Grid columns
    #[arg(long, default_value_t = 400)]
    cols: usize,

    /// Target chunk rows (edge chunks take the remainder)
    #[arg(long, default_value_t = 100)]
    chunk_rows: usize,

    /// Target chunk columns
    #[arg(long, default_value_t = 100)]
    chunk_cols: usize,

    /// Number of time steps
    #[arg(short, long, default_value_t = 300)]
    steps: u64,

    /// Diffusion coefficient
    #[arg(short, long, default_value_t = 0.1)]
    alpha: f64,

    /// Time step
    #[arg(long, default_value_t = 1.0)]
    dt: f64,

    /// Spacing along rows
    #[arg(long, default_value_t = 1.0)]
    dx: f64,

    /// Spacing along columns
    #[arg(long, default_value_t = 1.0)]
    dy: f64,

    /// Boundary policy: reflect, edge, or fixed:<value>
    #[arg(short, long, default_value = "reflect")]
    boundary: BoundaryPolicy,

    /// Stencil: five-point or nine-point
    #[arg(long, default_value = "five-point")]
    stencil: StencilKind,

    /// Peak temperature of the hot spot
    #[arg(long, default_value_t = 1.0)]
    amplitude: f64,

    /// Hot-spot width parameter
    #[arg(long, default_value_t = 200.0)]
    decay: f64,

    /// Worker threads (omit to run every chunk on the main thread)
    #[arg(short, long)]
    workers: Option<usize>,

    /// What to do when dt exceeds the stability bound
    #[arg(long, value_enum, default_value_t = Stability::Warn)]
    stability: Stability,

    /// Fail the run once any |T| exceeds this bound
    #[arg(long)]
    divergence_bound: Option<f64>,

    /// Skip the per-step NaN/infinity scan
    #[arg(long, conflicts_with = "divergence_bound")]
    no_divergence_check: bool,

    /// Log progress every N steps (0 disables)
    #[arg(short, long, default_value_t = 50)]
    progress: u64,

    /// Default log level when RUST_LOG is unset
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Stability {
    Ignore,
    Warn,
    Reject,
}

impl From<Stability> for StabilityPolicy {
    fn from(s: Stability) -> Self {
        match s {
            Stability::Ignore => StabilityPolicy::Ignore,
            Stability::Warn => StabilityPolicy::Warn,
            Stability::Reject => StabilityPolicy::Reject,
        }
    }
}

impl Args {
    fn config(&self) -> SimulationConfig {
        let spec = GridSpec::new(self.rows, self.cols)
            .with_spacing(self.dx, self.dy)
            .with_alpha(self.alpha)
            .with_dt(self.dt);
        let mut config = SimulationConfig::new(spec, (self.chunk_rows, self.chunk_cols), self.steps);
        config.boundary = self.boundary;
        config.stencil = self.stencil.build();
        config.stability = self.stability.into();
        config.divergence = match (self.no_divergence_check, self.divergence_bound) {
            (true, _) => DivergenceCheck::Off,
            (false, Some(bound)) => DivergenceCheck::Bound(bound),
            (false, None) => DivergenceCheck::NonFinite,
        };
        config.progress_interval = (self.progress > 0).then_some(self.progress);
        config
    }

    fn seed(&self) -> InitialCondition {
        InitialCondition::GaussianHotSpot {
            center: ((self.rows / 2) as f64, (self.cols / 2) as f64),
            amplitude: self.amplitude,
            decay: self.decay,
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn simulate<E: Executor>(
    config: SimulationConfig,
    seed: &InitialCondition,
    executor: E,
) -> Result<RunReport, Box<dyn Error>> {
    let mut sim = Simulation::with_executor(config, seed, executor)?;
    Ok(sim.run()?)
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = args.config();
    let seed = args.seed();
    tracing::info!(
        rows = args.rows,
        cols = args.cols,
        chunk_rows = args.chunk_rows,
        chunk_cols = args.chunk_cols,
        steps = args.steps,
        boundary = %args.boundary,
        stencil = %args.stencil,
        "starting simulation"
    );

    let report = match args.workers {
        Some(n) => simulate(config, &seed, ThreadPoolExecutor::with_workers(n)?)?,
        None => simulate(config, &seed, InlineExecutor)?,
    };

    let field = &report.field;
    println!("grid      {}x{}", field.rows(), field.cols());
    println!("steps     {}", report.steps);
    println!("min       {:.6e}", field.min());
    println!("max       {:.6e}", field.max());
    println!("total     {:.6e}", field.sum());
    println!("elapsed   {:.3} s", report.elapsed.as_secs_f64());
    if report.steps > 0 {
        println!("per step  {:.1} us", report.mean_step_us());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
