//! Simulation time management

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use crate::error::EventError;

/// Logical simulation time.
///
/// SimTime is a point on the model's own time axis (minutes in the bundled
/// models), stored as a finite, non-negative `f64`. It is never tied to the
/// wall clock. Values are totally ordered so they can key the event calendar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimTime(f64);

impl SimTime {
    /// Simulation start (time zero)
    pub const fn zero() -> Self {
        SimTime(0.0)
    }

    /// Create a SimTime, rejecting negative and non-finite values.
    pub fn new(value: f64) -> Result<Self, EventError> {
        if !value.is_finite() || value < 0.0 {
            return Err(EventError::InvalidTime(value));
        }
        Ok(SimTime(value))
    }

    /// Get the raw time value
    pub const fn as_f64(&self) -> f64 {
        self.0
    }

    /// Elapsed time since an earlier instant, clamped at zero.
    pub fn since(&self, earlier: SimTime) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    /// Shift this instant forward by `delay`.
    pub fn checked_add(&self, delay: f64) -> Result<Self, EventError> {
        SimTime::new(self.0 + delay)
    }
}

impl TryFrom<f64> for SimTime {
    type Error = EventError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        SimTime::new(value)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: f64) -> Self::Output {
        SimTime(self.0 + rhs)
    }
}

impl Sub<SimTime> for SimTime {
    type Output = f64;

    fn sub(self, rhs: SimTime) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::zero()
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simtime_creation() {
        assert_eq!(SimTime::zero().as_f64(), 0.0);
        assert_eq!(SimTime::new(1.5).unwrap().as_f64(), 1.5);
        assert_eq!(SimTime::try_from(2.0).unwrap(), SimTime::new(2.0).unwrap());
    }

    #[test]
    fn test_simtime_rejects_invalid_values() {
        assert!(matches!(SimTime::new(-1.0), Err(EventError::InvalidTime(_))));
        assert!(SimTime::new(f64::NAN).is_err());
        assert!(SimTime::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_simtime_arithmetic() {
        let t1 = SimTime::new(5.0).unwrap();
        let t2 = SimTime::new(2.0).unwrap();

        assert_eq!(t1 - t2, 3.0);
        assert_eq!(t1.since(t2), 3.0);
        assert_eq!(t2.since(t1), 0.0);
        assert_eq!(t2 + 0.5, SimTime::new(2.5).unwrap());
        assert_eq!(t2.checked_add(1.0).unwrap(), SimTime::new(3.0).unwrap());
        assert!(t2.checked_add(-3.0).is_err());
    }

    #[test]
    fn test_simtime_ordering() {
        let t1 = SimTime::new(100.0).unwrap();
        let t2 = SimTime::new(200.0).unwrap();

        assert!(t1 < t2);
        assert!(t2 > t1);
        assert_eq!(t1.max(t2), t2);
    }

    #[test]
    fn test_simtime_display() {
        assert_eq!(SimTime::new(12.3456).unwrap().to_string(), "12.346");
    }
}
