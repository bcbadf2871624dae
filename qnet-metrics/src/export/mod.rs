//! Export functionality for run reports

pub mod json;

use std::path::Path;

use crate::error::MetricsError;
use crate::report::SimulationReport;

/// Trait for exporting reports to different formats
pub trait ReportExporter {
    /// Export a report to the configured destination
    fn export(&self, report: &SimulationReport) -> Result<(), MetricsError>;
}

/// Export a report to JSON format
///
/// # Example
/// ```no_run
/// use qnet_metrics::{export_json, SimulationReport};
///
/// # fn write(report: &SimulationReport) -> Result<(), qnet_metrics::MetricsError> {
/// export_json(report, "results/report.json", true)?;
/// # Ok(())
/// # }
/// ```
pub fn export_json(
    report: &SimulationReport,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), MetricsError> {
    let exporter = json::JsonExporter::new(path.as_ref(), pretty);
    exporter.export(report)
}

/// Read a report previously written by [`export_json`].
pub fn load_json(path: impl AsRef<Path>) -> Result<SimulationReport, MetricsError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
