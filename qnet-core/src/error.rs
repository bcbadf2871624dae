//! Error types for the simulation kernel

use thiserror::Error;

use crate::SimTime;

/// Top-level error type for simulation operations
///
/// Every variant except `Configuration` and `InvalidParameter` signals a wiring
/// bug in the model; the driver aborts the run when a handler returns one.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("List {list} is registered twice")]
    DuplicateList { list: String },

    #[error("Unknown list: {list}")]
    UnknownList { list: String },

    #[error("Statistic {stat} is registered twice")]
    DuplicateStat { stat: String },

    #[error("Unknown statistic: {stat}")]
    UnknownStat { stat: String },

    #[error("Random stream {stream} is registered twice")]
    DuplicateStream { stream: String },

    #[error("Unknown random stream: {stream}")]
    UnknownStream { stream: String },

    #[error("List underflow: remove from empty list {list} at time {time}")]
    ListUnderflow { list: String, time: SimTime },

    #[error("Server {list} is already busy at time {time}")]
    ServerAlreadyBusy { list: String, time: SimTime },

    #[error("Time moved backwards on {list}: last change at {last}, update at {now}")]
    NonMonotonicTime {
        list: String,
        last: SimTime,
        now: SimTime,
    },

    #[error("Event calendar exhausted at time {time} before the end condition was met")]
    CalendarExhausted { time: SimTime },
}

/// Errors related to event scheduling and handling
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid event time: {0}")]
    InvalidTime(f64),

    #[error("Event scheduling failed: cannot schedule event at {requested} before current time {now}")]
    ScheduleInPast { requested: SimTime, now: SimTime },

    #[error("Event queue is empty")]
    EmptyQueue,
}
