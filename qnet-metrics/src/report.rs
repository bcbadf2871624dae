//! The run-end report
//!
//! Built once, after the driver loop returns, from the accumulators and
//! tracked lists of a [`Simulation`]. Entries follow registration order, so
//! two runs of the same model produce reports with the same layout.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use qnet_core::logging::diagnostics;
use qnet_core::{DiscreteSummary, Model, SimTime, Simulation, TimeWeightedSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MetricsError;

/// One echoed input parameter, already formatted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub name: String,
    pub summary: DiscreteSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub summary: TimeWeightedSummary,
}

/// Everything a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub title: String,
    pub parameters: Vec<Parameter>,
    pub stats: Vec<StatEntry>,
    pub lists: Vec<ListEntry>,
    pub final_time: SimTime,
    pub events_processed: u64,
    pub seed: u64,
}

impl SimulationReport {
    /// Snapshot every accumulator and every tracked list of `sim` at the
    /// current clock.
    pub fn from_simulation<M: Model>(
        title: impl Into<String>,
        parameters: Vec<Parameter>,
        sim: &Simulation<M>,
    ) -> Self {
        let end = sim.time();
        let stats = sim
            .stats()
            .iter()
            .map(|(id, stat)| {
                let name = id.to_string();
                if stat.count() == 0 {
                    diagnostics::empty_statistic(&name);
                }
                StatEntry {
                    name,
                    summary: stat.summary(),
                }
            })
            .collect();
        let lists = sim
            .lists()
            .iter()
            .filter_map(|list| {
                list.summary(end).map(|summary| ListEntry {
                    name: list.id().to_string(),
                    summary,
                })
            })
            .collect();

        Self {
            title: title.into(),
            parameters,
            stats,
            lists,
            final_time: end,
            events_processed: sim.events_processed(),
            seed: sim.streams().seeds().master(),
        }
    }

    pub fn stat(&self, name: &str) -> Result<&DiscreteSummary, MetricsError> {
        self.stats
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.summary)
            .ok_or_else(|| MetricsError::NotFound(name.to_string()))
    }

    pub fn list(&self, name: &str) -> Result<&TimeWeightedSummary, MetricsError> {
        self.lists
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.summary)
            .ok_or_else(|| MetricsError::NotFound(name.to_string()))
    }

    /// The human-readable report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "{}", self.title)?;
        writeln!(out)?;
        for parameter in &self.parameters {
            writeln!(out, "{:<40}{:>16}", parameter.name, parameter.value)?;
        }
        writeln!(out)?;

        if !self.stats.is_empty() {
            writeln!(out, "Discrete statistics, in minutes:")?;
            writeln!(
                out,
                "{:<20}{:>14}{:>14}{:>14}{:>14}",
                "statistic", "average", "count", "maximum", "minimum"
            )?;
            for entry in &self.stats {
                let summary = &entry.summary;
                writeln!(
                    out,
                    "{:<20}{:>14}{:>14}{:>14}{:>14}",
                    entry.name,
                    optional(summary.average),
                    summary.count,
                    optional(summary.max),
                    optional(summary.min)
                )?;
            }
            writeln!(out)?;
        }

        if !self.lists.is_empty() {
            writeln!(out, "Time-weighted list sizes:")?;
            writeln!(
                out,
                "{:<20}{:>14}{:>14}{:>14}{:>14}",
                "list", "time average", "maximum", "minimum", "current"
            )?;
            for entry in &self.lists {
                let summary = &entry.summary;
                writeln!(
                    out,
                    "{:<20}{:>14.3}{:>14.3}{:>14.3}{:>14.3}",
                    entry.name, summary.time_average, summary.max, summary.min, summary.current
                )?;
            }
            writeln!(out)?;
        }

        writeln!(
            out,
            "Time simulation ended:{:>12.3} minutes",
            self.final_time.as_f64()
        )?;
        writeln!(out, "Events processed:{:>17}", self.events_processed)
    }

    /// Write [`SimulationReport::render_text`] to `path`.
    pub fn write_text(&self, path: impl AsRef<Path>) -> Result<(), MetricsError> {
        let path = path.as_ref();
        fs::write(path, self.render_text())?;
        info!(path = %path.display(), "Text report written");
        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}
