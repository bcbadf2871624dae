//! Structured logging for simulation runs
//!
//! The kernel logs through `tracing`; nothing is printed unless a subscriber is
//! installed. The functions here install a `tracing-subscriber` fmt layer
//! filtered by `RUST_LOG` when it is set, and by the given level otherwise.
//!
//! # Log Level Guidelines
//! - **TRACE**: every scheduled and dispatched event, every list change
//! - **DEBUG**: blocked arrivals, horizon and termination decisions
//! - **INFO**: run start and completion, report written
//! - **WARN**: unusual but recoverable conditions
//! - **ERROR**: the run aborted
//!
//! ```bash
//! RUST_LOG=qnet_core::scheduler=trace qnet-single
//! ```
//!
//! Every initializer uses `try_init`, so calling one twice (for instance from
//! several tests in the same process) is harmless.

use std::fmt::Debug;

use tracing::{debug, error, info, warn, Span};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{EventId, SimTime};

/// Initialize logging at `info` level.
pub fn init_simulation_logging() {
    init_simulation_logging_with_level("info")
}

/// Initialize logging with a specific level
///
/// # Arguments
/// * `level` - Log level: "trace", "debug", "info", "warn", or "error"
pub fn init_simulation_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{level},qnet_core::scheduler=warn").into());

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Simulation logging initialized at level: {}", level);
    }
}

/// Initialize logging with every event and list change visible.
pub fn init_detailed_simulation_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trace,qnet_core=trace,qnet_models=trace,qnet_metrics=debug".into());

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .pretty(),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Detailed simulation logging initialized");
    }
}

/// Create a span for tracking simulation execution
pub fn simulation_span(name: &str) -> Span {
    tracing::info_span!("simulation", name = name)
}

/// Create a span for tracking event processing
pub fn event_span<K: Debug>(event_id: EventId, kind: &K, time: SimTime) -> Span {
    tracing::trace_span!("event",
        id = %event_id,
        kind = ?kind,
        time = %time
    )
}

/// Logging utilities for common simulation events
pub mod events {
    use super::*;

    pub fn simulation_started(name: &str, horizon: Option<SimTime>) {
        match horizon {
            Some(end) => info!(simulation = name, horizon = %end, "Simulation started"),
            None => info!(simulation = name, "Simulation started (until finished)"),
        }
    }

    pub fn simulation_completed(name: &str, final_time: SimTime, events_processed: u64) {
        info!(
            simulation = name,
            final_time = %final_time,
            events_processed = events_processed,
            "Simulation completed"
        );
    }

    /// An arrival found a bounded queue full and left.
    pub fn arrival_blocked(list: &str, time: SimTime, capacity: usize) {
        debug!(list = list, time = %time, capacity = capacity, "Arrival blocked");
    }
}

/// Logging utilities for error conditions and warnings
pub mod diagnostics {
    use super::*;

    pub fn run_aborted(name: &str, time: SimTime, error: &dyn std::error::Error) {
        error!(simulation = name, time = %time, error = %error, "Simulation aborted");
    }

    /// A statistic that a report reads never received a sample.
    pub fn empty_statistic(stat: &str) {
        warn!(stat = stat, "Statistic has no observations");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization_is_idempotent() {
        init_simulation_logging_with_level("debug");
        init_simulation_logging();
        init_detailed_simulation_logging();
        info!("Test info message");
    }

    #[test]
    fn test_span_creation() {
        let _sim_span = simulation_span("test_simulation");
        let _event_span = event_span(EventId(1), &"Arrival", SimTime::zero());
    }

    #[test]
    fn test_event_logging() {
        events::simulation_started("test_sim", SimTime::new(10.0).ok());
        events::simulation_started("test_sim", None);
        events::arrival_blocked("Queue", SimTime::zero(), 7);
        events::simulation_completed("test_sim", SimTime::zero(), 100);
        diagnostics::empty_statistic("Delays");
    }
}
