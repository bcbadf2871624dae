//! Statistics accumulators
//!
//! Two kinds of collectors back every simulation report:
//!
//! - [`Discrete`]: one observation at a time (per-customer delays). Keeps count,
//!   sum, minimum and maximum.
//! - [`TimeWeighted`]: the integral of a piecewise-constant value (a list's size)
//!   over simulation time. Attached to named lists by the
//!   [`ListRegistry`](crate::lists::ListRegistry).
//!
//! Every update is mirrored to the `metrics` facade, so an installed recorder
//! sees the same samples the report is built from.

use std::collections::HashMap;

use metrics::histogram;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::types::Label;
use crate::SimTime;

/// Discrete-observation collector.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrete {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for Discrete {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Discrete {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed value.
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Snapshot for reporting; average, min and max are absent when nothing was recorded.
    pub fn summary(&self) -> DiscreteSummary {
        if self.count == 0 {
            return DiscreteSummary {
                count: 0,
                average: None,
                min: None,
                max: None,
            };
        }
        DiscreteSummary {
            count: self.count,
            average: Some(self.sum / self.count as f64),
            min: Some(self.min),
            max: Some(self.max),
        }
    }
}

/// Report view of a [`Discrete`] collector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscreteSummary {
    pub count: u64,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Time-weighted (area) collector.
///
/// Before every change of the tracked value the elapsed interval times the
/// previous value is added to the area, so the area is always exact up to
/// `last_change`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWeighted {
    area: f64,
    start: SimTime,
    last_change: SimTime,
    last_value: f64,
    min_value: f64,
    max_value: f64,
}

impl TimeWeighted {
    /// Start integrating at `start` with an initial value of zero.
    pub fn new(start: SimTime) -> Self {
        Self {
            area: 0.0,
            start,
            last_change: start,
            last_value: 0.0,
            min_value: 0.0,
            max_value: 0.0,
        }
    }

    /// Set the tracked value to `value` as of `now`.
    ///
    /// Returns `false` (and leaves the accumulator untouched) if `now` is
    /// before the previous change.
    #[must_use]
    pub fn update(&mut self, now: SimTime, value: f64) -> bool {
        if !self.accepts(now) {
            return false;
        }
        self.area += (now - self.last_change) * self.last_value;
        self.last_change = now;
        self.last_value = value;
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);
        true
    }

    /// Whether an update at `now` would be accepted.
    pub fn accepts(&self, now: SimTime) -> bool {
        now >= self.last_change
    }

    pub fn last_change(&self) -> SimTime {
        self.last_change
    }

    /// Time average over `[start, end_time]`, including the pending interval
    /// since the last change. A zero-length window averages to `0.0`.
    pub fn time_average(&self, end_time: SimTime) -> f64 {
        let elapsed = end_time - self.start;
        if elapsed <= 0.0 {
            return 0.0;
        }
        let pending = end_time.since(self.last_change) * self.last_value;
        (self.area + pending) / elapsed
    }

    pub fn summary(&self, end_time: SimTime) -> TimeWeightedSummary {
        TimeWeightedSummary {
            time_average: self.time_average(end_time),
            min: self.min_value,
            max: self.max_value,
            current: self.last_value,
        }
    }
}

/// Report view of a [`TimeWeighted`] collector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWeightedSummary {
    pub time_average: f64,
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

/// Registry of discrete accumulators keyed by the model's statistic ids.
///
/// Iteration follows registration order so reports are stable across runs.
#[derive(Debug)]
pub struct Statistics<S> {
    entries: Vec<(S, Discrete)>,
    index: HashMap<S, usize>,
}

impl<S> Default for Statistics<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: Label> Statistics<S> {
    pub fn register(&mut self, id: S) -> Result<(), SimError> {
        if self.index.contains_key(&id) {
            return Err(SimError::DuplicateStat {
                stat: id.to_string(),
            });
        }
        self.index.insert(id, self.entries.len());
        self.entries.push((id, Discrete::new()));
        Ok(())
    }

    /// Record one observation into `id`.
    pub fn record(&mut self, id: S, value: f64) -> Result<(), SimError> {
        let stat = self.get_mut(id)?;
        stat.record(value);
        histogram!("qnet_observation", "stat" => id.to_string()).record(value);
        Ok(())
    }

    pub fn get(&self, id: S) -> Result<&Discrete, SimError> {
        self.index
            .get(&id)
            .map(|&idx| &self.entries[idx].1)
            .ok_or_else(|| SimError::UnknownStat {
                stat: id.to_string(),
            })
    }

    fn get_mut(&mut self, id: S) -> Result<&mut Discrete, SimError> {
        match self.index.get(&id) {
            Some(&idx) => Ok(&mut self.entries[idx].1),
            None => Err(SimError::UnknownStat {
                stat: id.to_string(),
            }),
        }
    }

    pub fn summary(&self, id: S) -> Result<DiscreteSummary, SimError> {
        self.get(id).map(Discrete::summary)
    }

    /// All accumulators in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (S, &Discrete)> {
        self.entries.iter().map(|(id, stat)| (*id, stat))
    }
}
