//! Single-server queue with an optionally bounded waiting line
//!
//! Customers arrive with exponential interarrival times and are served one at
//! a time in arrival order. When the server is busy and the queue already holds
//! `capacity` customers, the arrival is blocked: it records a zero delay, is
//! counted in the `Blocked` statistic and leaves. The run ends once
//! `num_delays_required` customers have begun service.

use std::fmt;

use metrics::counter;
use qnet_core::logging::events;
use qnet_core::{Capacity, Event, Executor, ListSpec, Model, SimError, Simulation};
use qnet_metrics::Parameter;
use tracing::trace;

use crate::config::SingleQueueConfig;
use crate::error::ModelError;
use crate::QueueingModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    Arrival,
    Departure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueList {
    Queue,
    Server,
}

impl fmt::Display for QueueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueList::Queue => f.write_str("Queue"),
            QueueList::Server => f.write_str("Server"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStat {
    Delays,
    Blocked,
}

impl fmt::Display for QueueStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueStat::Delays => f.write_str("Delays"),
            QueueStat::Blocked => f.write_str("Blocked"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStream {
    Interarrival,
    Service,
}

impl fmt::Display for QueueStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueStream::Interarrival => f.write_str("Interarrival"),
            QueueStream::Service => f.write_str("Service"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SingleQueueModel {
    config: SingleQueueConfig,
    num_custs_delayed: u64,
}

impl SingleQueueModel {
    pub fn new(config: SingleQueueConfig) -> Self {
        Self {
            config,
            num_custs_delayed: 0,
        }
    }

    pub fn config(&self) -> &SingleQueueConfig {
        &self.config
    }

    /// Customers that have begun service so far.
    pub fn num_custs_delayed(&self) -> u64 {
        self.num_custs_delayed
    }

    fn schedule_arrival(&self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        let delay = sim.exponential(self.config.mean_interarrival, QueueStream::Interarrival)?;
        sim.schedule_in(delay, QueueEvent::Arrival)?;
        Ok(())
    }

    fn start_service(&mut self, sim: &mut Simulation<Self>, delay: f64) -> Result<(), SimError> {
        sim.record(QueueStat::Delays, delay)?;
        self.num_custs_delayed += 1;
        sim.append_now(QueueList::Server)?;
        let service = sim.exponential(self.config.mean_service, QueueStream::Service)?;
        sim.schedule_in(service, QueueEvent::Departure)?;
        Ok(())
    }

    fn arrive(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        self.schedule_arrival(sim)?;

        if sim.list_size(QueueList::Server)? == 0 {
            return self.start_service(sim, 0.0);
        }

        if sim.would_overflow(QueueList::Queue)? {
            if let Capacity::Bounded(capacity) = self.config.capacity {
                events::arrival_blocked("Queue", sim.time(), capacity);
            }
            sim.record(QueueStat::Delays, 0.0)?;
            sim.record(QueueStat::Blocked, 0.0)?;
            counter!("qnet_blocked_arrivals", "list" => "Queue").increment(1);
            return Ok(());
        }

        sim.append_now(QueueList::Queue)
    }

    fn depart(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        sim.remove_front(QueueList::Server)?;
        if sim.list_size(QueueList::Queue)? == 0 {
            trace!(time = %sim.time(), "Server idle");
            return Ok(());
        }
        let customer = sim.remove_front(QueueList::Queue)?;
        let delay = customer.age(sim.time());
        self.start_service(sim, delay)
    }
}

impl Model for SingleQueueModel {
    type Event = QueueEvent;
    type List = QueueList;
    type Stat = QueueStat;
    type Stream = QueueStream;

    fn name(&self) -> &str {
        "single-queue"
    }

    fn init(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        self.num_custs_delayed = 0;
        sim.register_list(QueueList::Queue, ListSpec::queue().with_capacity(self.config.capacity))?;
        sim.register_list(QueueList::Server, ListSpec::server())?;
        sim.register_stat(QueueStat::Delays)?;
        sim.register_stat(QueueStat::Blocked)?;
        sim.register_stream(QueueStream::Interarrival)?;
        sim.register_stream(QueueStream::Service)?;
        self.schedule_arrival(sim)
    }

    fn handle(&mut self, event: Event<QueueEvent>, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        match event.kind {
            QueueEvent::Arrival => self.arrive(sim),
            QueueEvent::Departure => self.depart(sim),
        }
    }

    fn is_finished(&self, _sim: &Simulation<Self>) -> bool {
        self.num_custs_delayed >= self.config.num_delays_required
    }
}

impl QueueingModel for SingleQueueModel {
    fn title(&self) -> &'static str {
        "Single-server queueing system using simlib"
    }

    fn parameters(&self) -> Vec<Parameter> {
        let capacity = match self.config.capacity {
            Capacity::Bounded(n) => n.to_string(),
            Capacity::Unbounded => "unbounded".to_string(),
        };
        vec![
            Parameter::new(
                "Mean interarrival time",
                format!("{:.3} minutes", self.config.mean_interarrival),
            ),
            Parameter::new(
                "Mean service time",
                format!("{:.3} minutes", self.config.mean_service),
            ),
            Parameter::new("Queue capacity", capacity),
            Parameter::new(
                "Number of customers",
                self.config.num_delays_required.to_string(),
            ),
        ]
    }

    fn executor(&self) -> Result<Executor, ModelError> {
        Ok(Executor::until_finished())
    }
}
