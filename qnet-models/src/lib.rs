//! Queueing network topologies driven by the qnet kernel
//!
//! Three models are provided, each a [`Model`] with its own closed set of
//! events, lists, statistics and streams:
//!
//! - [`SingleQueueModel`]: one server, one optionally bounded queue.
//! - [`TandemModel`]: a line of single-server stages, stage 1 optionally bounded.
//! - [`TwoClassModel`]: two customer classes sharing one server.
//!
//! [`simulate`] runs any of them with the executor the model asks for and
//! returns the run-end report.

pub mod cli;
pub mod config;
pub mod error;
pub mod single_queue;
pub mod tandem;
pub mod two_class;

use qnet_core::{Executor, Model, Simulation, SimulationConfig};
use qnet_metrics::{Parameter, SimulationReport};

pub use config::{
    DeparturePolicy, SingleQueueConfig, TandemConfig, TwoClassConfig, Validate,
    ValidationResult, DEFAULT_QUEUE_CAPACITY, DEFAULT_TANDEM_HORIZON, DEFAULT_TANDEM_STAGES,
};
pub use error::{ConfigError, ModelError};
pub use single_queue::SingleQueueModel;
pub use tandem::{Journey, TandemModel};
pub use two_class::{Class, TwoClassModel};

/// A model that knows how to present itself in a report and when to stop.
pub trait QueueingModel: Model {
    /// First line of the report.
    fn title(&self) -> &'static str;

    /// Echoed input parameters.
    fn parameters(&self) -> Vec<Parameter>;

    /// The executor the model's termination rule calls for.
    fn executor(&self) -> Result<Executor, ModelError>;
}

/// Run `model` to completion and build its report.
pub fn simulate<M: QueueingModel>(
    model: &mut M,
    config: SimulationConfig,
) -> Result<SimulationReport, ModelError> {
    let mut sim = Simulation::new(config);
    let executor = model.executor()?;
    sim.run(model, executor)?;
    Ok(SimulationReport::from_simulation(
        model.title(),
        model.parameters(),
        &sim,
    ))
}
