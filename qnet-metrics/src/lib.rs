//! Run-end reporting for qnet simulations
//!
//! A [`SimulationReport`] is a snapshot of every accumulator and tracked list of
//! a finished run, together with the echoed model parameters. It renders as the
//! classic plain-text queueing report and serializes to JSON through
//! [`export`].

pub mod error;
pub mod export;
pub mod report;

pub use error::MetricsError;
pub use export::{export_json, load_json, ReportExporter};
pub use report::{ListEntry, Parameter, SimulationReport, StatEntry};
