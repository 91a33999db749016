//! Time-evolution driver for the Tessel stencil engine.
//!
//! [`Simulation`] owns the published [`DomainGrid`](tessel_grid::DomainGrid)
//! and advances it one step at a time: build every halo from the
//! current grid, run one kernel task per chunk on an [`Executor`], wait
//! for all of them, then publish the successor grid. A failed or
//! cancelled step never touches the current grid.
//!
//! # Quick start
//!
//! ```
//! use tessel_engine::{Simulation, SimulationConfig};
//! use tessel_grid::GridSpec;
//! use tessel_stencil::InitialCondition;
//!
//! let config = SimulationConfig::new(GridSpec::new(32, 32), (8, 8), 10);
//! let mut sim = Simulation::new(config, &InitialCondition::hot_spot(32, 32)).unwrap();
//! let report = sim.run().unwrap();
//! assert_eq!(report.steps, 10);
//! assert_eq!(report.field.shape(), (32, 32));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod executor;
pub mod metrics;

pub use config::{ConfigError, DivergenceCheck, ExecutorConfig, SimulationConfig, StabilityPolicy};
pub use driver::{CancelToken, DriverPhase, Simulation, SimulationState};
pub use executor::{Executor, InlineExecutor, TaskHandle, TaskLost, ThreadPoolExecutor};
pub use metrics::{RunReport, StepMetrics};
