//! Configuration system for probfit.
//!
//! Load fitting options from TOML or YAML files to control the inference
//! method, thresholds, update discipline, weight corrections and threshold
//! relaxation without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use probfit_config::{CorrectionKind, FittingConfig};
//! use probfit_core::InferenceMethod;
//!
//! let config = FittingConfig::from_toml_str(r#"
//!     inference_method = "mcsat"
//!     threshold = 0.005
//!     max_steps = 250
//!     max_threshold = 0.05
//!     greedy = true
//!
//!     [inference_params]
//!     max_samples = 5000
//!
//!     [adjuster]
//!     correction = "log_odds"
//!     damping = 0.5
//! "#).unwrap();
//!
//! assert_eq!(config.inference_method, InferenceMethod::Mcsat);
//! assert_eq!(config.max_steps, 250);
//! assert_eq!(config.adjuster.correction, CorrectionKind::LogOdds);
//! assert_eq!(config.inference_params.get_u64("max_samples"), Some(5000));
//! assert!(config.validate().is_ok());
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use probfit_config::FittingConfig;
//!
//! let config = FittingConfig::load("fitting.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! assert_eq!(config.threshold, 1e-3);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use probfit_core::{
    ConfigurationError, ConstraintSet, Evidence, FitError, FormulaRef, InferenceMethod,
    InferenceParams, ProbabilityRequirement,
};

/// Default convergence threshold on the aggregate error.
pub const DEFAULT_THRESHOLD: f64 = 1e-3;

/// Default step budget.
pub const DEFAULT_MAX_STEPS: u64 = 100;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),

    #[error("Invalid requirement: {0}")]
    Requirement(#[from] FitError),
}

/// Main fitting configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FittingConfig {
    /// Inference method requested from the oracle every step.
    pub inference_method: InferenceMethod,

    /// Aggregate error below which the fit counts as converged.
    pub threshold: f64,

    /// Maximum number of fitting steps.
    pub max_steps: u64,

    /// Upper bound for threshold relaxation; `None` disables relaxation.
    pub max_threshold: Option<f64>,

    /// Sequential (greedy) instead of synchronized (batch) updates.
    pub greedy: bool,

    /// Opaque parameters passed through to the oracle.
    pub inference_params: InferenceParams,

    /// Threads used for the oracle queries of a batch step.
    pub oracle_thread_count: OracleThreadCount,

    /// Weight correction configuration.
    pub adjuster: AdjusterConfig,

    /// Convergence monitor configuration.
    pub monitor: MonitorConfig,

    /// Probability requirements declared alongside the options.
    pub requirements: Vec<RequirementConfig>,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            inference_method: InferenceMethod::default(),
            threshold: DEFAULT_THRESHOLD,
            max_steps: DEFAULT_MAX_STEPS,
            max_threshold: None,
            greedy: false,
            inference_params: InferenceParams::default(),
            oracle_thread_count: OracleThreadCount::default(),
            adjuster: AdjusterConfig::default(),
            monitor: MonitorConfig::default(),
            requirements: Vec::new(),
        }
    }
}

impl FittingConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the inference method.
    pub fn with_inference_method(mut self, method: InferenceMethod) -> Self {
        self.inference_method = method;
        self
    }

    /// Sets the convergence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the step budget.
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Enables threshold relaxation up to `max_threshold`.
    pub fn with_max_threshold(mut self, max_threshold: f64) -> Self {
        self.max_threshold = Some(max_threshold);
        self
    }

    /// Selects greedy (sequential) or batch updates.
    pub fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Sets the parameters passed through to the oracle.
    pub fn with_inference_params(mut self, params: InferenceParams) -> Self {
        self.inference_params = params;
        self
    }

    /// Sets the oracle thread count for batch steps.
    pub fn with_oracle_thread_count(mut self, count: OracleThreadCount) -> Self {
        self.oracle_thread_count = count;
        self
    }

    /// Replaces the adjuster configuration.
    pub fn with_adjuster(mut self, adjuster: AdjusterConfig) -> Self {
        self.adjuster = adjuster;
        self
    }

    /// Replaces the monitor configuration.
    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Checks every option against its admissible range.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(ConfigurationError::invalid_option(
                "threshold",
                format!("must be a positive number, got {}", self.threshold),
            ));
        }
        if self.max_steps == 0 {
            return Err(ConfigurationError::invalid_option(
                "max_steps",
                "must be greater than zero",
            ));
        }
        if let Some(max) = self.max_threshold {
            // NaN fails the comparison too.
            if !(max >= self.threshold && max.is_finite()) {
                return Err(ConfigurationError::invalid_option(
                    "max_threshold",
                    format!("must be at least threshold {}, got {max}", self.threshold),
                ));
            }
        }
        if self.oracle_thread_count == OracleThreadCount::Count(0) {
            return Err(ConfigurationError::invalid_option(
                "oracle_thread_count",
                "count must be greater than zero",
            ));
        }
        self.adjuster.validate()?;
        self.monitor.validate()
    }

    /// Builds the constraint set declared in `requirements`.
    ///
    /// # Errors
    ///
    /// `FitError::Configuration` if no requirements are declared,
    /// `FitError::Validation` if a target lies outside `[0, 1]`.
    pub fn constraint_set(&self) -> Result<ConstraintSet, FitError> {
        let requirements = self
            .requirements
            .iter()
            .map(RequirementConfig::to_requirement)
            .collect::<Result<Vec<_>, _>>()?;
        ConstraintSet::new(requirements)
    }
}

/// Oracle thread count for batch steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleThreadCount {
    /// Use the global rayon pool.
    #[default]
    Auto,

    /// Query the oracle sequentially.
    None,

    /// Dedicated pool with a specific number of threads.
    Count(usize),
}

/// Weight correction formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Classic proportional fitting: `ln(t / p)`.
    #[default]
    LogRatio,

    /// Odds-ratio correction: `ln(t (1 - p) / (p (1 - t)))`.
    LogOdds,
}

/// Weight adjuster configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AdjusterConfig {
    /// Correction formula.
    pub correction: CorrectionKind,

    /// Fraction of the correction applied, in `(0, 1]`.
    pub damping: f64,

    /// Cap on the absolute correction of a single adjustment.
    pub max_step: f64,

    /// Cap on the absolute value of any adjusted weight.
    pub weight_limit: Option<f64>,
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            correction: CorrectionKind::LogRatio,
            damping: 1.0,
            max_step: 5.0,
            weight_limit: Some(30.0),
        }
    }
}

impl AdjusterConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigurationError::invalid_option(
                "adjuster.damping",
                format!("must lie in (0, 1], got {}", self.damping),
            ));
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(ConfigurationError::invalid_option(
                "adjuster.max_step",
                format!("must be a positive number, got {}", self.max_step),
            ));
        }
        if let Some(limit) = self.weight_limit {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(ConfigurationError::invalid_option(
                    "adjuster.weight_limit",
                    format!("must be a positive number, got {limit}"),
                ));
            }
        }
        Ok(())
    }
}

/// How per-requirement deviations are folded into one aggregate error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Maximum absolute deviation.
    #[default]
    Max,

    /// Sum of absolute deviations.
    Sum,

    /// Mean absolute deviation.
    Mean,
}

/// Convergence monitor configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MonitorConfig {
    /// Aggregate error policy.
    pub aggregate: AggregateKind,

    /// Number of trailing steps without improvement that count as a stall.
    pub stall_window: usize,

    /// Smallest decrease of the aggregate error that counts as improvement.
    pub min_improvement: f64,

    /// Factor applied to the active threshold when relaxing.
    pub relax_factor: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            aggregate: AggregateKind::Max,
            stall_window: 3,
            min_improvement: 0.0,
            relax_factor: 2.0,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.stall_window == 0 {
            return Err(ConfigurationError::invalid_option(
                "monitor.stall_window",
                "must be greater than zero",
            ));
        }
        if !(self.min_improvement.is_finite() && self.min_improvement >= 0.0) {
            return Err(ConfigurationError::invalid_option(
                "monitor.min_improvement",
                format!("must be a non-negative number, got {}", self.min_improvement),
            ));
        }
        if !(self.relax_factor.is_finite() && self.relax_factor > 1.0) {
            return Err(ConfigurationError::invalid_option(
                "monitor.relax_factor",
                format!("must be greater than 1, got {}", self.relax_factor),
            ));
        }
        Ok(())
    }
}

/// A probability requirement as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RequirementConfig {
    /// Query formula.
    pub query: String,

    /// Target posterior probability.
    pub target: f64,

    /// Observed atoms.
    #[serde(default)]
    pub evidence: Evidence,

    /// Formulas whose weights are corrected; defaults to the query itself.
    #[serde(default)]
    pub drives: Vec<String>,
}

impl RequirementConfig {
    pub fn to_requirement(&self) -> Result<ProbabilityRequirement, FitError> {
        let formula = FormulaRef::driving(self.query.as_str(), self.drives.iter().map(String::as_str));
        Ok(ProbabilityRequirement::new(
            formula,
            self.evidence.clone(),
            self.target,
        )?)
    }
}
