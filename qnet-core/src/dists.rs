//! Random variates for interarrival and service times
//!
//! All variates are produced by inversion from a single [`RandomStream`], so one
//! call advances exactly one stream by a known number of draws.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::randomness::RandomStream;

fn positive(name: &str, value: f64) -> Result<f64, SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

/// Exponential variate with the given mean: `-mean * ln(1 - u)`.
///
/// Consumes exactly one draw from `stream`.
pub fn exponential(stream: &mut RandomStream, mean: f64) -> Result<f64, SimError> {
    let mean = positive("mean", mean)?;
    let u = stream.uniform01();
    Ok(-mean * (1.0 - u).ln())
}

/// Uniform variate on `[a, b)`.
pub fn uniform(stream: &mut RandomStream, a: f64, b: f64) -> Result<f64, SimError> {
    if !(a.is_finite() && b.is_finite() && a < b) {
        return Err(SimError::InvalidParameter(format!(
            "uniform bounds must satisfy a < b, got [{a}, {b})"
        )));
    }
    Ok(a + (b - a) * stream.uniform01())
}

/// m-Erlang variate with the given overall mean: the sum of `m` exponentials
/// of mean `mean / m`. Consumes `m` draws.
pub fn erlang(stream: &mut RandomStream, m: u32, mean: f64) -> Result<f64, SimError> {
    if m == 0 {
        return Err(SimError::InvalidParameter(
            "erlang shape must be at least 1".to_string(),
        ));
    }
    let mean_exponential = positive("mean", mean)? / f64::from(m);
    let mut sum = 0.0;
    for _ in 0..m {
        sum += exponential(stream, mean_exponential)?;
    }
    Ok(sum)
}

/// A service or interarrival time distribution a model can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Variate {
    Exponential { mean: f64 },
    Uniform { a: f64, b: f64 },
    Erlang { m: u32, mean: f64 },
    Constant(f64),
}

impl Variate {
    pub fn exponential(mean: f64) -> Self {
        Variate::Exponential { mean }
    }

    /// Draw one value from `stream`.
    pub fn sample(&self, stream: &mut RandomStream) -> Result<f64, SimError> {
        match *self {
            Variate::Exponential { mean } => exponential(stream, mean),
            Variate::Uniform { a, b } => uniform(stream, a, b),
            Variate::Erlang { m, mean } => erlang(stream, m, mean),
            Variate::Constant(value) if value.is_finite() && value >= 0.0 => Ok(value),
            Variate::Constant(value) => Err(SimError::InvalidParameter(format!(
                "constant variate must be non-negative and finite, got {value}"
            ))),
        }
    }

    /// Expected value of the distribution.
    pub fn mean(&self) -> f64 {
        match *self {
            Variate::Exponential { mean } | Variate::Erlang { mean, .. } => mean,
            Variate::Uniform { a, b } => (a + b) / 2.0,
            Variate::Constant(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_is_non_negative_with_expected_mean() {
        let mut stream = RandomStream::from_seed(11);
        let n = 200_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let x = exponential(&mut stream, 2.0).unwrap();
            assert!(x >= 0.0);
            sum += x;
        }
        let mean = sum / n as f64;
        assert!((mean - 2.0).abs() < 0.05, "sample mean {mean}");
        assert_eq!(stream.draws(), n as u64);
    }

    #[test]
    fn test_exponential_rejects_bad_mean() {
        let mut stream = RandomStream::from_seed(1);
        assert!(matches!(
            exponential(&mut stream, 0.0),
            Err(SimError::InvalidParameter(_))
        ));
        assert!(exponential(&mut stream, -1.0).is_err());
        assert!(exponential(&mut stream, f64::NAN).is_err());
        assert_eq!(stream.draws(), 0);
    }

    #[test]
    fn test_exponential_matches_inverse_cdf() {
        let mut a = RandomStream::from_seed(5);
        let mut b = RandomStream::from_seed(5);
        let u = a.uniform01();
        let x = exponential(&mut b, 3.0).unwrap();
        assert_eq!(x, -3.0 * (1.0 - u).ln());
    }

    #[test]
    fn test_uniform_bounds() {
        let mut stream = RandomStream::from_seed(3);
        for _ in 0..1000 {
            let x = uniform(&mut stream, 2.0, 4.0).unwrap();
            assert!((2.0..4.0).contains(&x));
        }
        assert!(uniform(&mut stream, 4.0, 2.0).is_err());
    }

    #[test]
    fn test_erlang_consumes_m_draws() {
        let mut stream = RandomStream::from_seed(9);
        let x = erlang(&mut stream, 3, 1.5).unwrap();
        assert!(x >= 0.0);
        assert_eq!(stream.draws(), 3);
        assert!(erlang(&mut stream, 0, 1.0).is_err());
    }

    #[test]
    fn test_variate_dispatch() {
        let mut stream = RandomStream::from_seed(2);
        assert_eq!(Variate::Constant(1.25).sample(&mut stream).unwrap(), 1.25);
        assert!(Variate::Constant(-1.0).sample(&mut stream).is_err());
        assert_eq!(Variate::exponential(4.0).mean(), 4.0);
        assert_eq!(Variate::Uniform { a: 1.0, b: 3.0 }.mean(), 2.0);
        assert!(Variate::Erlang { m: 2, mean: 1.0 }.sample(&mut stream).unwrap() >= 0.0);
    }
}
