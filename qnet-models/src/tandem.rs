//! Tandem line of single-server stages
//!
//! Customers enter stage 1 and flow through every stage in order. Only the
//! stage 1 queue may be bounded; an arrival that finds it full is blocked and
//! never enters the system. The run ends at a fixed time horizon.
//!
//! Each stage keeps a stage-arrival marker list holding one record per
//! customer currently at that stage, and the system-arrival marker holds one
//! record per customer in the line. Their time averages are the mean number
//! of customers per stage and in the system.
//!
//! A customer's records carry its timing in their attributes:
//!
//! | attribute | meaning                         |
//! |-----------|---------------------------------|
//! | 0         | time the customer entered stage 1 |
//! | 1         | time it entered its current stage |
//! | 2         | sum of completed stage sojourns |

use std::fmt;

use metrics::counter;
use qnet_core::logging::events;
use qnet_core::{
    Capacity, Event, Executor, ListSpec, Model, Record, SimError, SimTime, Simulation,
};
use qnet_metrics::Parameter;

use crate::config::TandemConfig;
use crate::error::ModelError;
use crate::QueueingModel;

const SYSTEM_ENTRY: usize = 0;
const STAGE_ENTRY: usize = 1;
const SOJOURN_SUM: usize = 2;

/// Stages are numbered from 0 internally and from 1 in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TandemEvent {
    /// External arrival to stage 0.
    Arrival,
    /// Service completion at a stage.
    Completion(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TandemList {
    Queue(usize),
    Server(usize),
    StageArrival(usize),
    SystemArrival,
}

impl fmt::Display for TandemList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TandemList::Queue(stage) => write!(f, "Queue {}", stage + 1),
            TandemList::Server(stage) => write!(f, "Server {}", stage + 1),
            TandemList::StageArrival(stage) => write!(f, "In stage {}", stage + 1),
            TandemList::SystemArrival => f.write_str("In system"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TandemStat {
    StageSojourn(usize),
    SystemSojourn,
    Blocked,
}

impl fmt::Display for TandemStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TandemStat::StageSojourn(stage) => write!(f, "Stage {} sojourn", stage + 1),
            TandemStat::SystemSojourn => f.write_str("System sojourn"),
            TandemStat::Blocked => f.write_str("Blocked"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TandemStream {
    Interarrival,
    Service(usize),
}

impl fmt::Display for TandemStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TandemStream::Interarrival => f.write_str("Interarrival"),
            TandemStream::Service(stage) => write!(f, "Service {}", stage + 1),
        }
    }
}

/// One customer that left the last stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Journey {
    pub entered: SimTime,
    pub left: SimTime,
    /// Sum of the sojourns recorded at each stage.
    pub stage_sojourns: f64,
    /// Sojourn recorded for the whole line.
    pub system_sojourn: f64,
}

#[derive(Debug, Clone)]
pub struct TandemModel {
    config: TandemConfig,
    completed: u64,
    journeys: Option<Vec<Journey>>,
}

impl TandemModel {
    pub fn new(config: TandemConfig) -> Self {
        Self {
            config,
            completed: 0,
            journeys: None,
        }
    }

    /// Keep a [`Journey`] for every customer that leaves the line.
    pub fn with_journey_log(mut self) -> Self {
        self.journeys = Some(Vec::new());
        self
    }

    pub fn config(&self) -> &TandemConfig {
        &self.config
    }

    /// Customers that left the last stage.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn journeys(&self) -> &[Journey] {
        self.journeys.as_deref().unwrap_or(&[])
    }

    fn last_stage(&self) -> usize {
        self.config.stages - 1
    }

    fn schedule_arrival(&self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        let delay = sim.exponential(self.config.mean_interarrival, TandemStream::Interarrival)?;
        sim.schedule_in(delay, TandemEvent::Arrival)?;
        Ok(())
    }

    fn start_service(
        &self,
        sim: &mut Simulation<Self>,
        stage: usize,
        customer: Record,
    ) -> Result<(), SimError> {
        sim.append(TandemList::Server(stage), customer)?;
        let service = sim.exponential(self.config.mean_service, TandemStream::Service(stage))?;
        sim.schedule_in(service, TandemEvent::Completion(stage))?;
        Ok(())
    }

    /// A customer reaches `stage`: it is marked present and either starts
    /// service or joins the queue.
    fn enter_stage(
        &self,
        sim: &mut Simulation<Self>,
        stage: usize,
        mut customer: Record,
    ) -> Result<(), SimError> {
        let now = sim.time();
        customer.attributes[STAGE_ENTRY] = now.as_f64();
        customer.filed_at = now;
        sim.append_now(TandemList::StageArrival(stage))?;
        if sim.list_size(TandemList::Server(stage))? == 0 {
            self.start_service(sim, stage, customer)
        } else {
            sim.append(TandemList::Queue(stage), customer)
        }
    }

    fn arrive(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        self.schedule_arrival(sim)?;

        let server_busy = sim.list_size(TandemList::Server(0))? > 0;
        if server_busy && sim.would_overflow(TandemList::Queue(0))? {
            if let Capacity::Bounded(capacity) = self.config.stage1_capacity {
                events::arrival_blocked("Queue 1", sim.time(), capacity);
            }
            sim.record(TandemStat::StageSojourn(0), 0.0)?;
            sim.record(TandemStat::Blocked, 0.0)?;
            counter!("qnet_blocked_arrivals", "list" => "Queue 1").increment(1);
            return Ok(());
        }

        let now = sim.time().as_f64();
        sim.append_now(TandemList::SystemArrival)?;
        self.enter_stage(sim, 0, Record::with_attributes(sim.time(), [now, now, 0.0]))
    }

    fn complete(&mut self, sim: &mut Simulation<Self>, stage: usize) -> Result<(), SimError> {
        let now = sim.time();
        let mut customer = sim.remove_front(TandemList::Server(stage))?;
        sim.remove_front(TandemList::StageArrival(stage))?;

        let sojourn = now.as_f64() - customer.attributes[STAGE_ENTRY];
        sim.record(TandemStat::StageSojourn(stage), sojourn)?;
        customer.attributes[SOJOURN_SUM] += sojourn;

        if sim.list_size(TandemList::Queue(stage))? > 0 {
            let next = sim.remove_front(TandemList::Queue(stage))?;
            self.start_service(sim, stage, next)?;
        }

        if stage < self.last_stage() {
            return self.enter_stage(sim, stage + 1, customer);
        }

        sim.remove_front(TandemList::SystemArrival)?;
        let system_sojourn = now.as_f64() - customer.attributes[SYSTEM_ENTRY];
        sim.record(TandemStat::SystemSojourn, system_sojourn)?;
        self.completed += 1;
        if let Some(journeys) = self.journeys.as_mut() {
            journeys.push(Journey {
                entered: SimTime::new(customer.attributes[SYSTEM_ENTRY])?,
                left: now,
                stage_sojourns: customer.attributes[SOJOURN_SUM],
                system_sojourn,
            });
        }
        Ok(())
    }
}

impl Model for TandemModel {
    type Event = TandemEvent;
    type List = TandemList;
    type Stat = TandemStat;
    type Stream = TandemStream;

    fn name(&self) -> &str {
        "tandem"
    }

    fn init(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        if self.config.stages == 0 {
            return Err(SimError::Configuration(
                "a tandem line needs at least one stage".to_string(),
            ));
        }
        self.completed = 0;
        for stage in 0..self.config.stages {
            let queue = if stage == 0 {
                ListSpec::queue().with_capacity(self.config.stage1_capacity)
            } else {
                ListSpec::queue()
            };
            sim.register_list(TandemList::Queue(stage), queue)?;
            sim.register_list(TandemList::Server(stage), ListSpec::server())?;
            sim.register_list(TandemList::StageArrival(stage), ListSpec::marker())?;
            sim.register_stat(TandemStat::StageSojourn(stage))?;
        }
        sim.register_list(TandemList::SystemArrival, ListSpec::marker())?;
        sim.register_stat(TandemStat::SystemSojourn)?;
        sim.register_stat(TandemStat::Blocked)?;

        sim.register_stream(TandemStream::Interarrival)?;
        for stage in 0..self.config.stages {
            sim.register_stream(TandemStream::Service(stage))?;
        }
        self.schedule_arrival(sim)
    }

    fn handle(&mut self, event: Event<TandemEvent>, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        match event.kind {
            TandemEvent::Arrival => self.arrive(sim),
            TandemEvent::Completion(stage) => self.complete(sim, stage),
        }
    }
}

impl QueueingModel for TandemModel {
    fn title(&self) -> &'static str {
        "Tandem queue with exponential servers using simlib"
    }

    fn parameters(&self) -> Vec<Parameter> {
        let capacity = match self.config.stage1_capacity {
            Capacity::Bounded(n) => n.to_string(),
            Capacity::Unbounded => "unbounded".to_string(),
        };
        vec![
            Parameter::new(
                "Mean interarrival time",
                format!("{:.3} minutes", self.config.mean_interarrival),
            ),
            Parameter::new(
                "Mean service time for every stage",
                format!("{:.3} minutes", self.config.mean_service),
            ),
            Parameter::new("Stages", self.config.stages.to_string()),
            Parameter::new("Stage 1 queue capacity", capacity),
            Parameter::new(
                "Number of customers",
                self.config.num_delays_required.to_string(),
            ),
            Parameter::new("Time horizon", format!("{:.3} minutes", self.config.horizon)),
        ]
    }

    fn executor(&self) -> Result<Executor, ModelError> {
        let horizon = SimTime::new(self.config.horizon).map_err(SimError::from)?;
        Ok(Executor::until(horizon))
    }
}
