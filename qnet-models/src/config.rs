//! Model parameters and the input record parser
//!
//! Every model reads one whitespace-delimited record. The leading fields are
//! required; trailing optional fields extend the classic layouts:
//!
//! | model     | record                                                        |
//! |-----------|---------------------------------------------------------------|
//! | single    | `mean_ia mean_service num_delays [capacity]`                   |
//! | tandem    | `mean_ia mean_service num_delays [stages [stage1_capacity]]`   |
//! | two-class | `mean_ia_1 mean_ia_2 mean_service_1 mean_service_2 num_delays [policy]` |
//!
//! A capacity is a positive integer or `unbounded`. A policy is
//! `same-class-first` or `strict-priority`.

use std::fmt;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use qnet_core::Capacity;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Queue limit of the bounded queues in the classic assignments.
pub const DEFAULT_QUEUE_CAPACITY: usize = 7;

/// Time bound of the tandem run, in minutes.
pub const DEFAULT_TANDEM_HORIZON: f64 = 100_000.0;

pub const DEFAULT_TANDEM_STAGES: usize = 2;

pub type ValidationResult<T> = Result<T, ConfigError>;

/// Trait for validating model configurations
pub trait Validate {
    /// Check that all field values are valid and consistent with each other.
    fn validate(&self) -> ValidationResult<()>;
}

/// Helper for validating that a mean or time bound is positive and finite
pub fn validate_positive(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ConstraintViolation {
            field,
            constraint: format!("positive and finite, got {value}"),
        })
    }
}

/// Helper for validating a count against a lower bound
pub fn validate_at_least(field: &'static str, value: u64, min: u64) -> ValidationResult<()> {
    if value < min {
        Err(ConfigError::ConstraintViolation {
            field,
            constraint: format!("at least {min}, got {value}"),
        })
    } else {
        Ok(())
    }
}

fn validate_capacity(field: &'static str, capacity: Capacity) -> ValidationResult<()> {
    match capacity {
        Capacity::Bounded(0) => Err(ConfigError::ConstraintViolation {
            field,
            constraint: "at least 1 or unbounded".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Cursor over the tokens of one input record.
struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            iter: input.split_whitespace(),
        }
    }

    fn required<T: FromStr>(&mut self, field: &'static str) -> ValidationResult<T> {
        self.optional(field)?
            .ok_or(ConfigError::MissingToken { field })
    }

    fn optional<T: FromStr>(&mut self, field: &'static str) -> ValidationResult<Option<T>> {
        self.iter
            .next()
            .map(|token| {
                token.parse().map_err(|_| ConfigError::InvalidToken {
                    field,
                    token: token.to_string(),
                })
            })
            .transpose()
    }

    fn capacity(&mut self, field: &'static str) -> ValidationResult<Option<Capacity>> {
        Ok(self
            .optional::<CapacityToken>(field)?
            .map(|token| token.0))
    }

    fn finish(mut self) -> ValidationResult<()> {
        match self.iter.next() {
            None => Ok(()),
            Some(token) => Err(ConfigError::TrailingInput(token.to_string())),
        }
    }
}

struct CapacityToken(Capacity);

impl FromStr for CapacityToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unbounded" | "inf" => Ok(CapacityToken(Capacity::Unbounded)),
            other => other
                .parse::<usize>()
                .map(|n| CapacityToken(Capacity::Bounded(n)))
                .map_err(|_| ()),
        }
    }
}

fn read_input(path: &Path) -> ValidationResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn default_capacity() -> Capacity {
    Capacity::Bounded(DEFAULT_QUEUE_CAPACITY)
}

fn default_stages() -> usize {
    DEFAULT_TANDEM_STAGES
}

fn default_horizon() -> f64 {
    DEFAULT_TANDEM_HORIZON
}

/// Parameters of the single-server queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleQueueConfig {
    pub mean_interarrival: f64,
    pub mean_service: f64,
    pub num_delays_required: u64,
    #[serde(default = "default_capacity")]
    pub capacity: Capacity,
}

impl SingleQueueConfig {
    pub fn new(mean_interarrival: f64, mean_service: f64, num_delays_required: u64) -> Self {
        Self {
            mean_interarrival,
            mean_service,
            num_delays_required,
            capacity: default_capacity(),
        }
    }

    pub fn with_capacity(mut self, capacity: impl Into<Capacity>) -> Self {
        self.capacity = capacity.into();
        self
    }

    pub fn from_input_str(input: &str) -> ValidationResult<Self> {
        let mut tokens = Tokens::new(input);
        let mut config = Self::new(
            tokens.required("mean_interarrival")?,
            tokens.required("mean_service")?,
            tokens.required("num_delays_required")?,
        );
        if let Some(capacity) = tokens.capacity("capacity")? {
            config.capacity = capacity;
        }
        tokens.finish()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_input_file(path: impl AsRef<Path>) -> ValidationResult<Self> {
        Self::from_input_str(&read_input(path.as_ref())?)
    }
}

impl Validate for SingleQueueConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive("mean_interarrival", self.mean_interarrival)?;
        validate_positive("mean_service", self.mean_service)?;
        validate_at_least("num_delays_required", self.num_delays_required, 1)?;
        validate_capacity("capacity", self.capacity)
    }
}

/// Parameters of the tandem line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TandemConfig {
    pub mean_interarrival: f64,
    /// Mean service time of every stage.
    pub mean_service: f64,
    /// Echoed in the report; the horizon ends the run.
    pub num_delays_required: u64,
    #[serde(default = "default_stages")]
    pub stages: usize,
    #[serde(default = "default_capacity")]
    pub stage1_capacity: Capacity,
    #[serde(default = "default_horizon")]
    pub horizon: f64,
}

impl TandemConfig {
    pub fn new(mean_interarrival: f64, mean_service: f64, num_delays_required: u64) -> Self {
        Self {
            mean_interarrival,
            mean_service,
            num_delays_required,
            stages: default_stages(),
            stage1_capacity: default_capacity(),
            horizon: default_horizon(),
        }
    }

    pub fn with_stages(mut self, stages: usize) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_stage1_capacity(mut self, capacity: impl Into<Capacity>) -> Self {
        self.stage1_capacity = capacity.into();
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn from_input_str(input: &str) -> ValidationResult<Self> {
        let mut tokens = Tokens::new(input);
        let mut config = Self::new(
            tokens.required("mean_interarrival")?,
            tokens.required("mean_service")?,
            tokens.required("num_delays_required")?,
        );
        if let Some(stages) = tokens.optional("stages")? {
            config.stages = stages;
            if let Some(capacity) = tokens.capacity("stage1_capacity")? {
                config.stage1_capacity = capacity;
                if let Some(horizon) = tokens.optional("horizon")? {
                    config.horizon = horizon;
                }
            }
        }
        tokens.finish()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_input_file(path: impl AsRef<Path>) -> ValidationResult<Self> {
        Self::from_input_str(&read_input(path.as_ref())?)
    }
}

impl Validate for TandemConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive("mean_interarrival", self.mean_interarrival)?;
        validate_positive("mean_service", self.mean_service)?;
        validate_at_least("stages", self.stages as u64, 1)?;
        validate_capacity("stage1_capacity", self.stage1_capacity)?;
        validate_positive("horizon", self.horizon)
    }
}

/// Which waiting class the shared server takes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeparturePolicy {
    /// Same class as the customer that just left, otherwise the other class.
    #[default]
    SameClassFirst,
    /// Class I whenever one is waiting.
    StrictPriority,
}

impl FromStr for DeparturePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same-class-first" => Ok(DeparturePolicy::SameClassFirst),
            "strict-priority" => Ok(DeparturePolicy::StrictPriority),
            other => Err(ConfigError::InvalidToken {
                field: "policy",
                token: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DeparturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeparturePolicy::SameClassFirst => f.write_str("same-class-first"),
            DeparturePolicy::StrictPriority => f.write_str("strict-priority"),
        }
    }
}

/// Parameters of the two-class shared server. Index 0 is class I.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoClassConfig {
    pub mean_interarrival: [f64; 2],
    pub mean_service: [f64; 2],
    pub num_delays_required: u64,
    #[serde(default)]
    pub policy: DeparturePolicy,
}

impl TwoClassConfig {
    pub fn new(mean_interarrival: [f64; 2], mean_service: [f64; 2], num_delays_required: u64) -> Self {
        Self {
            mean_interarrival,
            mean_service,
            num_delays_required,
            policy: DeparturePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DeparturePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_input_str(input: &str) -> ValidationResult<Self> {
        let mut tokens = Tokens::new(input);
        let ia_1 = tokens.required("mean_interarrival_1")?;
        let ia_2 = tokens.required("mean_interarrival_2")?;
        let service_1 = tokens.required("mean_service_1")?;
        let service_2 = tokens.required("mean_service_2")?;
        let mut config = Self::new(
            [ia_1, ia_2],
            [service_1, service_2],
            tokens.required("num_delays_required")?,
        );
        if let Some(policy) = tokens.optional("policy")? {
            config.policy = policy;
        }
        tokens.finish()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_input_file(path: impl AsRef<Path>) -> ValidationResult<Self> {
        Self::from_input_str(&read_input(path.as_ref())?)
    }
}

impl Validate for TwoClassConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive("mean_interarrival_1", self.mean_interarrival[0])?;
        validate_positive("mean_interarrival_2", self.mean_interarrival[1])?;
        validate_positive("mean_service_1", self.mean_service[0])?;
        validate_positive("mean_service_2", self.mean_service[1])?;
        validate_at_least("num_delays_required", self.num_delays_required, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_queue_classic_record() {
        let config = SingleQueueConfig::from_input_str("1.0 0.5 1000\n").unwrap();
        assert_eq!(config.mean_interarrival, 1.0);
        assert_eq!(config.mean_service, 0.5);
        assert_eq!(config.num_delays_required, 1000);
        assert_eq!(config.capacity, Capacity::Bounded(DEFAULT_QUEUE_CAPACITY));
    }

    #[test]
    fn test_single_queue_capacity_token() {
        let bounded = SingleQueueConfig::from_input_str("1 0.5 10 3").unwrap();
        assert_eq!(bounded.capacity, Capacity::Bounded(3));
        let unbounded = SingleQueueConfig::from_input_str("1 0.5 10 unbounded").unwrap();
        assert_eq!(unbounded.capacity, Capacity::Unbounded);
        assert!(matches!(
            SingleQueueConfig::from_input_str("1 0.5 10 0"),
            Err(ConfigError::ConstraintViolation { field: "capacity", .. })
        ));
    }

    #[test]
    fn test_missing_and_malformed_tokens() {
        assert!(matches!(
            SingleQueueConfig::from_input_str("1.0 0.5"),
            Err(ConfigError::MissingToken {
                field: "num_delays_required"
            })
        ));
        assert!(matches!(
            SingleQueueConfig::from_input_str("1.0 abc 10"),
            Err(ConfigError::InvalidToken {
                field: "mean_service",
                ..
            })
        ));
        assert!(matches!(
            SingleQueueConfig::from_input_str("1.0 0.5 10 7 extra"),
            Err(ConfigError::TrailingInput(_))
        ));
    }

    #[test]
    fn test_non_positive_means_are_rejected() {
        assert!(matches!(
            SingleQueueConfig::from_input_str("0 0.5 10"),
            Err(ConfigError::ConstraintViolation {
                field: "mean_interarrival",
                ..
            })
        ));
        assert!(SingleQueueConfig::from_input_str("1 -0.5 10").is_err());
        assert!(SingleQueueConfig::from_input_str("1 NaN 10").is_err());
        assert!(SingleQueueConfig::from_input_str("1 0.5 0").is_err());
    }

    #[test]
    fn test_tandem_record() {
        let config = TandemConfig::from_input_str("1.0 0.8 500").unwrap();
        assert_eq!(config.stages, DEFAULT_TANDEM_STAGES);
        assert_eq!(config.horizon, DEFAULT_TANDEM_HORIZON);

        let config = TandemConfig::from_input_str("1.0 0.8 500 4 unbounded").unwrap();
        assert_eq!(config.stages, 4);
        assert_eq!(config.stage1_capacity, Capacity::Unbounded);
        assert_eq!(config.horizon, DEFAULT_TANDEM_HORIZON);

        let config = TandemConfig::from_input_str("1.0 0.8 500 4 unbounded 500").unwrap();
        assert_eq!(config.horizon, 500.0);
        assert_eq!(config.num_delays_required, 500);

        assert!(TandemConfig::from_input_str("1.0 0.8 500 0").is_err());
        assert!(matches!(
            TandemConfig::from_input_str("1.0 0.8 500 4 7 0"),
            Err(ConfigError::ConstraintViolation { .. })
        ));
        assert!(matches!(
            TandemConfig::from_input_str("1.0 0.8 500 4 7 500 1"),
            Err(ConfigError::TrailingInput(_))
        ));
    }

    #[test]
    fn test_two_class_record() {
        let config = TwoClassConfig::from_input_str("2.0 3.0 0.5 0.7 100").unwrap();
        assert_eq!(config.mean_interarrival, [2.0, 3.0]);
        assert_eq!(config.mean_service, [0.5, 0.7]);
        assert_eq!(config.policy, DeparturePolicy::SameClassFirst);

        let config = TwoClassConfig::from_input_str("2 3 0.5 0.7 100 strict-priority").unwrap();
        assert_eq!(config.policy, DeparturePolicy::StrictPriority);

        assert!(matches!(
            TwoClassConfig::from_input_str("2 3 0.5 0.7 100 fastest"),
            Err(ConfigError::InvalidToken { field: "policy", .. })
        ));
    }

    #[test]
    fn test_from_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mm1smlb.in");
        std::fs::write(&path, "1.0 0.5 1000\n").unwrap();
        let config = SingleQueueConfig::from_input_file(&path).unwrap();
        assert_eq!(config.num_delays_required, 1000);

        let missing = dir.path().join("absent.in");
        assert!(matches!(
            SingleQueueConfig::from_input_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_serde_defaults() {
        let config: TandemConfig = serde_json::from_str(
            r#"{"mean_interarrival": 1.0, "mean_service": 0.5, "num_delays_required": 10}"#,
        )
        .unwrap();
        assert_eq!(config, TandemConfig::new(1.0, 0.5, 10));
    }
}
