//! Core discrete event simulation kernel for queueing networks.
//!
//! This crate provides the building blocks every queueing model is driven by:
//! a logical clock, a future-event calendar, named FIFO lists, statistics
//! accumulators and independent random variate streams.
//!
//! # Architecture Overview
//!
//! - [`Simulation`]: the explicit context that owns the calendar, the list
//!   registry, the accumulators and the stream table. Every handler receives it
//!   by `&mut`; there is no process-wide state.
//!
//! - [`Model`]: implemented by a topology. It names its event kinds, lists,
//!   statistics and streams with closed enums, registers them in
//!   [`Model::init`], and reacts to each dispatched event in [`Model::handle`].
//!
//! - [`Executor`]: the driver loop. Pops the earliest event, advances the clock,
//!   dispatches, and stops at a horizon or when the model says it is done.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use qnet_core::{Executor, Simulation, SimulationConfig};
//!
//! let mut model = MyModel::new(config);
//! let mut sim = Simulation::new(SimulationConfig::default());
//! sim.run(&mut model, Executor::until_finished())?;
//! println!("clock at end: {}", sim.time());
//! ```
//!
//! # Time Model
//!
//! All timing uses [`SimTime`], which represents simulation time (not wall-clock time).
//! Events at equal times are dispatched in the order they were scheduled, which
//! together with seeded streams makes every run reproducible.

pub mod dists;
pub mod error;
pub mod execute;
pub mod lists;
pub mod logging;
pub mod randomness;
pub mod scheduler;
pub mod stats;
pub mod time;
pub mod types;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

pub use dists::Variate;
pub use error::{EventError, SimError};
pub use execute::{Execute, Executor};
pub use lists::{Capacity, ListRegistry, ListRole, ListSpec, NamedList, Record, RECORD_ATTRIBUTES};
pub use logging::{
    event_span, init_detailed_simulation_logging, init_simulation_logging,
    init_simulation_logging_with_level, simulation_span,
};
pub use randomness::{RandomStream, SeedTable, StreamTable, DEFAULT_MASTER_SEED};
pub use scheduler::{Event, Scheduler, EVENT_ATTRIBUTES};
pub use stats::{Discrete, DiscreteSummary, Statistics, TimeWeighted, TimeWeightedSummary};
pub use time::SimTime;
pub use types::{EventId, Label};

/// A queueing topology driven by the kernel.
pub trait Model: Sized {
    /// Event kinds, matched exhaustively in [`Model::handle`].
    type Event: fmt::Debug + Clone + 'static;
    /// Named list ids.
    type List: Label;
    /// Discrete accumulator ids.
    type Stat: Label;
    /// Random stream ids.
    type Stream: Label;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Register lists, statistics and streams, and schedule the first events.
    fn init(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError>;

    /// React to one dispatched event. Runs to completion.
    fn handle(
        &mut self,
        event: Event<Self::Event>,
        sim: &mut Simulation<Self>,
    ) -> Result<(), SimError>;

    /// Model-specific termination condition, used by [`Executor::until_finished`].
    fn is_finished(&self, _sim: &Simulation<Self>) -> bool {
        false
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Master seed of the stream seed table.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_MASTER_SEED,
        }
    }
}

/// Simulation struct that puts the kernel together.
///
/// See the [crate-level documentation](index.html) for more information.
pub struct Simulation<M: Model> {
    scheduler: Scheduler<M::Event>,
    lists: ListRegistry<M::List>,
    stats: Statistics<M::Stat>,
    streams: StreamTable<M::Stream>,
    events_processed: u64,
}

impl<M: Model> Default for Simulation<M> {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl<M: Model> Simulation<M> {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            scheduler: Scheduler::default(),
            lists: ListRegistry::default(),
            stats: Statistics::default(),
            streams: StreamTable::new(SeedTable::new(config.seed)),
            events_processed: 0,
        }
    }

    /// Initializes `model` and runs it with `executor`.
    pub fn run<E: Execute<M>>(&mut self, model: &mut M, executor: E) -> Result<(), SimError> {
        let name = model.name().to_string();
        let span = simulation_span(&name);
        let _guard = span.enter();
        logging::events::simulation_started(&name, executor.horizon());
        let outcome = model.init(self).and_then(|()| self.execute(model, executor));
        match &outcome {
            Ok(()) => logging::events::simulation_completed(&name, self.time(), self.events_processed),
            Err(err) => logging::diagnostics::run_aborted(&name, self.time(), err),
        }
        outcome
    }

    /// Runs an already initialized model.
    ///
    /// The stopping condition and other execution details depend on the executor used.
    /// See [`Execute`] and [`Executor`] for more details.
    pub fn execute<E: Execute<M>>(&mut self, model: &mut M, executor: E) -> Result<(), SimError> {
        info!(initial_time = %self.time(), "Starting simulation execution");
        executor.execute(model, self)?;
        info!(
            final_time = %self.time(),
            events_processed = self.events_processed,
            "Simulation execution completed"
        );
        Ok(())
    }

    /// Performs one step of the simulation. Returns `true` if there was in fact an event
    /// available to process, and `false` otherwise.
    pub fn step(&mut self, model: &mut M) -> Result<bool, SimError> {
        let Some(event) = self.scheduler.pop() else {
            return Ok(false);
        };
        let span = event_span(event.id, &event.kind, event.time);
        let _guard = span.enter();
        trace!("Processing simulation step");
        model.handle(event, self)?;
        self.events_processed += 1;
        Ok(true)
    }

    // Clock and calendar

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.scheduler.time()
    }

    /// Number of events dispatched so far.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Returns the time of the next scheduled event, or None if no events are scheduled.
    pub fn peek_next_event_time(&self) -> Option<SimTime> {
        self.scheduler.peek_time()
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub(crate) fn advance_clock_to(&mut self, time: SimTime) -> Result<(), SimError> {
        if time > self.time() {
            self.scheduler.advance_to(time)?;
        }
        Ok(())
    }

    /// Schedules `kind` at the absolute time `time`.
    pub fn schedule(&mut self, time: SimTime, kind: M::Event) -> Result<EventId, SimError> {
        Ok(self.scheduler.schedule(time, kind)?)
    }

    /// Schedules `kind` with attributes at the absolute time `time`.
    pub fn schedule_with(
        &mut self,
        time: SimTime,
        kind: M::Event,
        attributes: [f64; EVENT_ATTRIBUTES],
    ) -> Result<EventId, SimError> {
        Ok(self.scheduler.schedule_with(time, kind, attributes)?)
    }

    /// Schedules `kind` to occur `delay` time units from now.
    pub fn schedule_in(&mut self, delay: f64, kind: M::Event) -> Result<EventId, SimError> {
        Ok(self.scheduler.schedule_in(delay, kind)?)
    }

    // Named lists

    pub fn register_list(&mut self, id: M::List, spec: ListSpec) -> Result<(), SimError> {
        let now = self.time();
        self.lists.register(id, spec, now)
    }

    pub fn list_size(&self, id: M::List) -> Result<usize, SimError> {
        self.lists.size(id)
    }

    pub fn would_overflow(&self, id: M::List) -> Result<bool, SimError> {
        self.lists.would_overflow(id)
    }

    pub fn append(&mut self, id: M::List, record: Record) -> Result<(), SimError> {
        let now = self.time();
        self.lists.append(id, record, now)
    }

    /// Files a record stamped with the current time.
    pub fn append_now(&mut self, id: M::List) -> Result<(), SimError> {
        self.append(id, Record::new(self.time()))
    }

    pub fn remove_front(&mut self, id: M::List) -> Result<Record, SimError> {
        let now = self.time();
        self.lists.remove_front(id, now)
    }

    pub fn lists(&self) -> &ListRegistry<M::List> {
        &self.lists
    }

    /// Time-average size of `id` from registration up to now.
    pub fn time_average(&self, id: M::List) -> Result<f64, SimError> {
        let now = self.time();
        let list = self.lists.get(id)?;
        Ok(list.summary(now).map_or(0.0, |summary| summary.time_average))
    }

    // Statistics

    pub fn register_stat(&mut self, id: M::Stat) -> Result<(), SimError> {
        self.stats.register(id)
    }

    pub fn record(&mut self, id: M::Stat, value: f64) -> Result<(), SimError> {
        self.stats.record(id, value)
    }

    pub fn summary(&self, id: M::Stat) -> Result<DiscreteSummary, SimError> {
        self.stats.summary(id)
    }

    pub fn stats(&self) -> &Statistics<M::Stat> {
        &self.stats
    }

    // Random streams

    pub fn register_stream(&mut self, id: M::Stream) -> Result<(), SimError> {
        self.streams.register(id)
    }

    /// Draws one exponential variate with the given mean from stream `id`.
    pub fn exponential(&mut self, mean: f64, id: M::Stream) -> Result<f64, SimError> {
        dists::exponential(self.streams.get_mut(id)?, mean)
    }

    /// Draws one value of `variate` from stream `id`.
    pub fn sample(&mut self, variate: &Variate, id: M::Stream) -> Result<f64, SimError> {
        variate.sample(self.streams.get_mut(id)?)
    }

    pub fn streams(&self) -> &StreamTable<M::Stream> {
        &self.streams
    }
}
