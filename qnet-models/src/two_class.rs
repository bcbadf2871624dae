//! Two customer classes sharing one server
//!
//! Each class has its own arrival stream, queue and service time mean. When a
//! service completes, the [`DeparturePolicy`] chooses which class's queue is
//! served next. Delays are recorded per class, including the zero delay of a
//! customer that finds the server idle. The run ends once
//! `num_delays_required` customers have begun service.

use std::fmt;

use qnet_core::{Event, Executor, ListSpec, Model, Record, SimError, Simulation};
use qnet_metrics::Parameter;
use tracing::debug;

use crate::config::{DeparturePolicy, TwoClassConfig};
use crate::error::ModelError;
use crate::QueueingModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    One,
    Two,
}

impl Class {
    pub const ALL: [Class; 2] = [Class::One, Class::Two];

    fn index(self) -> usize {
        match self {
            Class::One => 0,
            Class::Two => 1,
        }
    }

    fn other(self) -> Class {
        match self {
            Class::One => Class::Two,
            Class::Two => Class::One,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::One => f.write_str("class I"),
            Class::Two => f.write_str("class II"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassEvent {
    Arrival(Class),
    /// Service completion of a customer of the given class.
    Departure(Class),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassList {
    Queue(Class),
    Server,
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassList::Queue(class) => write!(f, "Queue {class}"),
            ClassList::Server => f.write_str("Server"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassStat {
    Delays(Class),
}

impl fmt::Display for ClassStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassStat::Delays(class) => write!(f, "Delays {class}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassStream {
    Interarrival(Class),
    Service(Class),
}

impl fmt::Display for ClassStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassStream::Interarrival(class) => write!(f, "Interarrival {class}"),
            ClassStream::Service(class) => write!(f, "Service {class}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TwoClassModel {
    config: TwoClassConfig,
    num_custs_delayed: u64,
    service_order: Option<Vec<Class>>,
}

impl TwoClassModel {
    pub fn new(config: TwoClassConfig) -> Self {
        Self {
            config,
            num_custs_delayed: 0,
            service_order: None,
        }
    }

    /// Remember the class of every customer taken into service.
    pub fn with_service_log(mut self) -> Self {
        self.service_order = Some(Vec::new());
        self
    }

    pub fn config(&self) -> &TwoClassConfig {
        &self.config
    }

    pub fn num_custs_delayed(&self) -> u64 {
        self.num_custs_delayed
    }

    pub fn service_order(&self) -> &[Class] {
        self.service_order.as_deref().unwrap_or(&[])
    }

    /// The class served after a `finished` customer leaves, given which
    /// queues are non-empty.
    pub fn next_class(
        policy: DeparturePolicy,
        finished: Class,
        waiting: impl Fn(Class) -> bool,
    ) -> Option<Class> {
        let preferred = match policy {
            DeparturePolicy::SameClassFirst => finished,
            DeparturePolicy::StrictPriority => Class::One,
        };
        [preferred, preferred.other()]
            .into_iter()
            .find(|class| waiting(*class))
    }

    fn schedule_arrival(&self, sim: &mut Simulation<Self>, class: Class) -> Result<(), SimError> {
        let mean = self.config.mean_interarrival[class.index()];
        let delay = sim.exponential(mean, ClassStream::Interarrival(class))?;
        sim.schedule_in(delay, ClassEvent::Arrival(class))?;
        Ok(())
    }

    fn start_service(
        &mut self,
        sim: &mut Simulation<Self>,
        class: Class,
        delay: f64,
    ) -> Result<(), SimError> {
        sim.record(ClassStat::Delays(class), delay)?;
        self.num_custs_delayed += 1;
        if let Some(order) = self.service_order.as_mut() {
            order.push(class);
        }
        let mut marker = Record::new(sim.time());
        marker.attributes[0] = class.index() as f64;
        sim.append(ClassList::Server, marker)?;
        let mean = self.config.mean_service[class.index()];
        let service = sim.exponential(mean, ClassStream::Service(class))?;
        sim.schedule_in(service, ClassEvent::Departure(class))?;
        Ok(())
    }

    fn arrive(&mut self, sim: &mut Simulation<Self>, class: Class) -> Result<(), SimError> {
        self.schedule_arrival(sim, class)?;
        if sim.list_size(ClassList::Server)? == 0 {
            self.start_service(sim, class, 0.0)
        } else {
            sim.append_now(ClassList::Queue(class))
        }
    }

    fn depart(&mut self, sim: &mut Simulation<Self>, finished: Class) -> Result<(), SimError> {
        sim.remove_front(ClassList::Server)?;
        let sizes = [
            sim.list_size(ClassList::Queue(Class::One))?,
            sim.list_size(ClassList::Queue(Class::Two))?,
        ];
        let next = Self::next_class(self.config.policy, finished, |class| {
            sizes[class.index()] > 0
        });
        match next {
            None => {
                debug!(time = %sim.time(), "Server idle");
                Ok(())
            }
            Some(class) => {
                let customer = sim.remove_front(ClassList::Queue(class))?;
                let delay = customer.age(sim.time());
                self.start_service(sim, class, delay)
            }
        }
    }
}

impl Model for TwoClassModel {
    type Event = ClassEvent;
    type List = ClassList;
    type Stat = ClassStat;
    type Stream = ClassStream;

    fn name(&self) -> &str {
        "two-class"
    }

    fn init(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        self.num_custs_delayed = 0;
        for class in Class::ALL {
            sim.register_list(ClassList::Queue(class), ListSpec::queue())?;
        }
        sim.register_list(ClassList::Server, ListSpec::server())?;
        for class in Class::ALL {
            sim.register_stat(ClassStat::Delays(class))?;
        }
        for class in Class::ALL {
            sim.register_stream(ClassStream::Interarrival(class))?;
        }
        for class in Class::ALL {
            sim.register_stream(ClassStream::Service(class))?;
        }
        for class in Class::ALL {
            self.schedule_arrival(sim, class)?;
        }
        Ok(())
    }

    fn handle(&mut self, event: Event<ClassEvent>, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        match event.kind {
            ClassEvent::Arrival(class) => self.arrive(sim, class),
            ClassEvent::Departure(class) => self.depart(sim, class),
        }
    }

    fn is_finished(&self, _sim: &Simulation<Self>) -> bool {
        self.num_custs_delayed >= self.config.num_delays_required
    }
}

impl QueueingModel for TwoClassModel {
    fn title(&self) -> &'static str {
        "Single-server queueing system with two customer classes using simlib"
    }

    fn parameters(&self) -> Vec<Parameter> {
        let minutes = |value: f64| format!("{value:.3} minutes");
        vec![
            Parameter::new(
                "Mean interarrival time for class I",
                minutes(self.config.mean_interarrival[0]),
            ),
            Parameter::new(
                "Mean interarrival time for class II",
                minutes(self.config.mean_interarrival[1]),
            ),
            Parameter::new("Mean service time class I", minutes(self.config.mean_service[0])),
            Parameter::new("Mean service time class II", minutes(self.config.mean_service[1])),
            Parameter::new("Departure policy", self.config.policy.to_string()),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_class_first() {
        let policy = DeparturePolicy::SameClassFirst;
        assert_eq!(
            TwoClassModel::next_class(policy, Class::Two, |_| true),
            Some(Class::Two)
        );
        assert_eq!(
            TwoClassModel::next_class(policy, Class::Two, |class| class == Class::One),
            Some(Class::One)
        );
        assert_eq!(TwoClassModel::next_class(policy, Class::One, |_| false), None);
    }

    #[test]
    fn test_strict_priority() {
        let policy = DeparturePolicy::StrictPriority;
        assert_eq!(
            TwoClassModel::next_class(policy, Class::Two, |_| true),
            Some(Class::One)
        );
        assert_eq!(
            TwoClassModel::next_class(policy, Class::One, |class| class == Class::Two),
            Some(Class::Two)
        );
    }

    #[test]
    fn test_run_counts_every_delay() {
        let config = TwoClassConfig::new([2.0, 3.0], [0.5, 0.7], 400);
        let mut model = TwoClassModel::new(config).with_service_log();
        let mut sim = Simulation::default();
        sim.run(&mut model, Executor::until_finished()).unwrap();

        assert_eq!(model.num_custs_delayed(), 400);
        let one = sim.summary(ClassStat::Delays(Class::One)).unwrap();
        let two = sim.summary(ClassStat::Delays(Class::Two)).unwrap();
        assert_eq!(one.count + two.count, 400);
        assert!(one.count > 0 && two.count > 0);
        assert_eq!(model.service_order().len(), 400);
    }
}
