//! Text and JSON reports written side by side for the same run.

use std::fmt;

use qnet_core::{Event, Executor, ListSpec, Model, SimError, SimTime, Simulation};
use qnet_metrics::{export_json, load_json, Parameter, SimulationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Id {
    Queue,
    Delays,
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

struct Filler;

impl Model for Filler {
    type Event = ();
    type List = Id;
    type Stat = Id;
    type Stream = Id;

    fn init(&mut self, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        sim.register_list(Id::Queue, ListSpec::bounded_queue(7))?;
        sim.register_stat(Id::Delays)?;
        for t in 1..=4 {
            sim.schedule(SimTime::new(f64::from(t))?, ())?;
        }
        Ok(())
    }

    fn handle(&mut self, _event: Event<()>, sim: &mut Simulation<Self>) -> Result<(), SimError> {
        sim.append_now(Id::Queue)?;
        sim.record(Id::Delays, sim.time().as_f64())
    }
}

fn run() -> SimulationReport {
    let mut sim = Simulation::default();
    sim.run(&mut Filler, Executor::steps(4)).unwrap();
    SimulationReport::from_simulation("Filler", vec![Parameter::new("Arrivals", "4")], &sim)
}

#[test]
fn json_and_text_describe_the_same_run() {
    let dir = tempfile::tempdir().unwrap();
    let report = run();

    let text_path = dir.path().join("mm1smlb.out");
    let json_path = dir.path().join("mm1smlb.json");
    report.write_text(&text_path).unwrap();
    export_json(&report, &json_path, true).unwrap();

    let loaded = load_json(&json_path).unwrap();
    assert_eq!(loaded, report);
    assert_eq!(loaded.stat("Delays").unwrap().count, 4);

    let text = std::fs::read_to_string(&text_path).unwrap();
    assert!(text.contains("Queue"));
    assert!(text.contains("Delays"));
}
