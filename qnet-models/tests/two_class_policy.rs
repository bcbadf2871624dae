//! Departure policies of the shared server.

use qnet_core::{Executor, Simulation, SimulationConfig};
use qnet_models::two_class::ClassStat;
use qnet_models::{Class, DeparturePolicy, TwoClassConfig, TwoClassModel};

fn run(policy: DeparturePolicy) -> (TwoClassModel, Simulation<TwoClassModel>) {
    // heavy load so both queues build up
    let config = TwoClassConfig::new([1.5, 1.5], [0.7, 0.7], 3_000).with_policy(policy);
    let mut model = TwoClassModel::new(config).with_service_log();
    let mut sim = Simulation::new(SimulationConfig { seed: 11 });
    sim.run(&mut model, Executor::until_finished()).unwrap();
    (model, sim)
}

fn average_delay(sim: &Simulation<TwoClassModel>, class: Class) -> f64 {
    sim.summary(ClassStat::Delays(class)).unwrap().average.unwrap()
}

#[test]
fn strict_priority_favours_class_one() {
    let (model, sim) = run(DeparturePolicy::StrictPriority);
    assert_eq!(model.num_custs_delayed(), 3_000);
    assert!(average_delay(&sim, Class::One) < average_delay(&sim, Class::Two));
}

#[test]
fn same_class_first_serves_runs_of_one_class() {
    let (model, sim) = run(DeparturePolicy::SameClassFirst);
    let order = model.service_order();
    assert_eq!(order.len(), 3_000);
    assert!(order.windows(2).any(|pair| pair[0] == pair[1]));

    let one = sim.summary(ClassStat::Delays(Class::One)).unwrap();
    let two = sim.summary(ClassStat::Delays(Class::Two)).unwrap();
    assert_eq!(one.count + two.count, 3_000);
}
