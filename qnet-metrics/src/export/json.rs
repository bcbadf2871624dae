//! JSON export for run reports
//!
//! The JSON document is the serde form of [`SimulationReport`]; empty
//! accumulators keep their `null` average, min and max.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::MetricsError;
use crate::export::ReportExporter;
use crate::report::SimulationReport;

/// JSON exporter for run reports
#[derive(Debug)]
pub struct JsonExporter {
    path: PathBuf,
    pretty: bool,
}

impl JsonExporter {
    /// Create a new JSON exporter
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `pretty` - Whether to pretty-print the JSON
    pub fn new(path: &Path, pretty: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            pretty,
        }
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &SimulationReport) -> Result<(), MetricsError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;

        info!(path = %self.path.display(), "JSON report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::load_json;
    use crate::report::{Parameter, StatEntry};
    use qnet_core::{DiscreteSummary, SimTime};

    fn sample_report() -> SimulationReport {
        SimulationReport {
            title: "Single-server queueing system".to_string(),
            parameters: vec![Parameter::new("Mean interarrival time", "1.000 minutes")],
            stats: vec![
                StatEntry {
                    name: "Delays".to_string(),
                    summary: DiscreteSummary {
                        count: 3,
                        average: Some(2.0),
                        min: Some(1.0),
                        max: Some(3.0),
                    },
                },
                StatEntry {
                    name: "Blocked".to_string(),
                    summary: DiscreteSummary {
                        count: 0,
                        average: None,
                        min: None,
                        max: None,
                    },
                },
            ],
            lists: Vec::new(),
            final_time: SimTime::new(12.5).unwrap(),
            events_processed: 42,
            seed: 7,
        }
    }

    #[test]
    fn test_json_export_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        JsonExporter::new(&path, true).export(&sample_report()).unwrap();
        assert!(path.exists());

        let loaded = load_json(&path).unwrap();
        assert_eq!(loaded, sample_report());
    }

    #[test]
    fn test_compact_json_keeps_empty_summaries_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        JsonExporter::new(&path, false).export(&sample_report()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["stats"][1]["summary"]["average"], serde_json::Value::Null);
        assert_eq!(value["stats"][0]["summary"]["count"], 3);
        assert_eq!(value["events_processed"], 42);
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let err = JsonExporter::new(&path, true)
            .export(&sample_report())
            .unwrap_err();
        assert!(matches!(err, MetricsError::IoError(_)));
    }
}
