use tracing::debug;

use crate::error::SimError;
use crate::{Model, SimTime, Simulation};

/// Simulation execution trait.
pub trait Execute<M: Model> {
    /// Executes the simulation until some stopping condition is reached.
    /// The condition is implementation-specific.
    fn execute(self, model: &mut M, sim: &mut Simulation<M>) -> Result<(), SimError>;

    /// The time the run stops at, if it is bounded by one.
    fn horizon(&self) -> Option<SimTime> {
        None
    }
}

impl EndCondition {
    fn horizon(&self) -> Option<SimTime> {
        match self {
            EndCondition::Time(horizon) => Some(*horizon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCondition {
    Time(SimTime),
    ModelFinished,
    Steps(usize),
}

/// Executor drives the event loop of an entire simulation.
///
/// See the crate level documentation for examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    end_condition: EndCondition,
}

impl Executor {
    /// Dispatch every event scheduled at or before `horizon`, then move the
    /// clock to `horizon`.
    ///
    /// Running out of events before the horizon is an error.
    #[must_use]
    pub fn until(horizon: SimTime) -> Self {
        Self {
            end_condition: EndCondition::Time(horizon),
        }
    }

    /// Dispatch events until [`Model::is_finished`] holds.
    ///
    /// Running out of events first is an error.
    #[must_use]
    pub fn until_finished() -> Self {
        Self {
            end_condition: EndCondition::ModelFinished,
        }
    }

    /// Simulation will execute exactly this many steps, unless we run out of events.
    #[must_use]
    pub fn steps(steps: usize) -> Self {
        Self {
            end_condition: EndCondition::Steps(steps),
        }
    }

    /// Registers a side effect that is called _after_ each simulation step.
    #[must_use]
    pub fn side_effect<F>(self, func: F) -> ExecutorWithSideEffect<F> {
        ExecutorWithSideEffect {
            end_condition: self.end_condition,
            side_effect: func,
        }
    }
}

impl<M: Model> Execute<M> for Executor {
    fn execute(self, model: &mut M, sim: &mut Simulation<M>) -> Result<(), SimError> {
        run_with(model, sim, self.end_condition, |_, _| {})
    }

    fn horizon(&self) -> Option<SimTime> {
        self.end_condition.horizon()
    }
}

pub struct ExecutorWithSideEffect<F> {
    end_condition: EndCondition,
    side_effect: F,
}

impl<M, F> Execute<M> for ExecutorWithSideEffect<F>
where
    M: Model,
    F: FnMut(&M, &Simulation<M>),
{
    fn execute(self, model: &mut M, sim: &mut Simulation<M>) -> Result<(), SimError> {
        run_with(model, sim, self.end_condition, self.side_effect)
    }

    fn horizon(&self) -> Option<SimTime> {
        self.end_condition.horizon()
    }
}

fn run_with<M, F>(
    model: &mut M,
    sim: &mut Simulation<M>,
    end_condition: EndCondition,
    mut side_effect: F,
) -> Result<(), SimError>
where
    M: Model,
    F: FnMut(&M, &Simulation<M>),
{
    let mut step = |model: &mut M, sim: &mut Simulation<M>| -> Result<bool, SimError> {
        let result = sim.step(model)?;
        if result {
            side_effect(model, sim);
        }
        Ok(result)
    };
    match end_condition {
        EndCondition::Time(horizon) => execute_until(model, sim, horizon, &mut step),
        EndCondition::ModelFinished => execute_until_finished(model, sim, &mut step),
        EndCondition::Steps(steps) => execute_steps(model, sim, steps, &mut step),
    }
}

fn execute_until<M, F>(
    model: &mut M,
    sim: &mut Simulation<M>,
    horizon: SimTime,
    step: &mut F,
) -> Result<(), SimError>
where
    M: Model,
    F: FnMut(&mut M, &mut Simulation<M>) -> Result<bool, SimError>,
{
    loop {
        match sim.peek_next_event_time() {
            Some(time) if time <= horizon => {
                step(model, sim)?;
            }
            Some(_) => break,
            None => return Err(SimError::CalendarExhausted { time: sim.time() }),
        }
    }
    debug!(horizon = %horizon, "Horizon reached");
    sim.advance_clock_to(horizon)
}

fn execute_until_finished<M, F>(
    model: &mut M,
    sim: &mut Simulation<M>,
    step: &mut F,
) -> Result<(), SimError>
where
    M: Model,
    F: FnMut(&mut M, &mut Simulation<M>) -> Result<bool, SimError>,
{
    while !model.is_finished(sim) {
        if !step(model, sim)? {
            return Err(SimError::CalendarExhausted { time: sim.time() });
        }
    }
    Ok(())
}

fn execute_steps<M, F>(
    model: &mut M,
    sim: &mut Simulation<M>,
    steps: usize,
    step: &mut F,
) -> Result<(), SimError>
where
    M: Model,
    F: FnMut(&mut M, &mut Simulation<M>) -> Result<bool, SimError>,
{
    for _ in 0..steps {
        if !step(model, sim)? {
            break;
        }
    }
    Ok(())
}
