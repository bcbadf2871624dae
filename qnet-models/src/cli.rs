//! Shared entry point of the `qnet-*` binaries
//!
//! Each binary reads one input record from `mm1smlb.in` and writes the text
//! report to `mm1smlb.out` in the working directory. Environment variables
//! override the defaults:
//!
//! - `QNET_INPUT`: input record path
//! - `QNET_OUTPUT`: text report path
//! - `QNET_JSON`: also write the report as JSON to this path
//! - `QNET_SEED`: master seed of the random streams
//! - `RUST_LOG`: log filter

use std::env::{self, VarError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use qnet_core::{init_simulation_logging, SimulationConfig};
use qnet_metrics::{export_json, SimulationReport};
use tracing::{error, info};

use crate::config::{SingleQueueConfig, TandemConfig, TwoClassConfig};
use crate::error::{ConfigError, ModelError};
use crate::{simulate, SingleQueueModel, TandemModel, TwoClassModel};

pub const DEFAULT_INPUT: &str = "mm1smlb.in";
pub const DEFAULT_OUTPUT: &str = "mm1smlb.out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Single,
    Tandem,
    TwoClass,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Single => f.write_str("single"),
            ModelKind::Tandem => f.write_str("tandem"),
            ModelKind::TwoClass => f.write_str("two-class"),
        }
    }
}

/// Where a run reads its input and writes its reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub json: Option<PathBuf>,
}

impl RunPaths {
    /// The classic file names inside `dir`, without a JSON report.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            input: dir.join(DEFAULT_INPUT),
            output: dir.join(DEFAULT_OUTPUT),
            json: None,
        }
    }

    pub fn from_env() -> Self {
        Self {
            input: env::var_os("QNET_INPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT)),
            output: env::var_os("QNET_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            json: env::var_os("QNET_JSON").map(PathBuf::from),
        }
    }
}

/// Simulation settings from `QNET_SEED`, or the defaults.
pub fn simulation_config_from_env() -> Result<SimulationConfig, ConfigError> {
    seed_config(env::var("QNET_SEED"))
}

fn seed_config(var: Result<String, VarError>) -> Result<SimulationConfig, ConfigError> {
    match var {
        Ok(token) => token
            .trim()
            .parse()
            .map(|seed| SimulationConfig { seed })
            .map_err(|_| ConfigError::InvalidToken {
                field: "QNET_SEED",
                token,
            }),
        Err(VarError::NotPresent) => Ok(SimulationConfig::default()),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidToken {
            field: "QNET_SEED",
            token: raw.to_string_lossy().into_owned(),
        }),
    }
}

/// Parse `input` for `kind`, run the model and return its report.
pub fn run_model(
    kind: ModelKind,
    input: &str,
    config: SimulationConfig,
) -> Result<SimulationReport, ModelError> {
    match kind {
        ModelKind::Single => {
            let mut model = SingleQueueModel::new(SingleQueueConfig::from_input_str(input)?);
            simulate(&mut model, config)
        }
        ModelKind::Tandem => {
            let mut model = TandemModel::new(TandemConfig::from_input_str(input)?);
            simulate(&mut model, config)
        }
        ModelKind::TwoClass => {
            let mut model = TwoClassModel::new(TwoClassConfig::from_input_str(input)?);
            simulate(&mut model, config)
        }
    }
}

/// Read the input record, run, and write the reports.
pub fn run_files(
    kind: ModelKind,
    paths: &RunPaths,
    config: SimulationConfig,
) -> Result<SimulationReport, ModelError> {
    let input = std::fs::read_to_string(&paths.input).map_err(|source| ConfigError::Io {
        path: paths.input.clone(),
        source,
    })?;
    let report = run_model(kind, &input, config)?;
    report.write_text(&paths.output)?;
    if let Some(json) = &paths.json {
        export_json(&report, json, true)?;
    }
    Ok(report)
}

/// `main` of every binary.
pub fn run(kind: ModelKind) -> ExitCode {
    init_simulation_logging();

    let outcome = simulation_config_from_env()
        .map_err(ModelError::from)
        .and_then(|config| run_files(kind, &RunPaths::from_env(), config));

    match outcome {
        Ok(report) => {
            info!(
                model = %kind,
                final_time = %report.final_time,
                events_processed = report.events_processed,
                "Run finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(model = %kind, error = %err, "Run failed");
            ExitCode::FAILURE
        }
    }
}
