//! Core type definitions and newtypes for the simulation kernel

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Unique identifier for events in the simulation.
///
/// Ids are handed out in scheduling order, so they double as the tie-breaker
/// among events that share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Identifier vocabulary for lists, statistics and random streams.
///
/// Models name these with small closed enums; the `Display` form is what shows
/// up in reports and error messages.
pub trait Label: Copy + Eq + Hash + fmt::Debug + fmt::Display + 'static {}

impl<T> Label for T where T: Copy + Eq + Hash + fmt::Debug + fmt::Display + 'static {}
