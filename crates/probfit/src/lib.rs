//! probfit - Fitting log-linear model weights to probability constraints
//!
//! Given requirements `P(query | evidence) = target` and an inference oracle
//! for the model, [`fit`] adjusts formula weights with iterative
//! proportional fitting until every requirement is met within a threshold.
//!
//! # Example
//!
//! ```rust
//! use probfit::prelude::*;
//!
//! // P(a) = sigmoid(w_a) for a single independent formula.
//! #[derive(Debug)]
//! struct Logistic;
//! impl InferenceOracle for Logistic {
//!     fn posterior(&self, q: &PosteriorQuery<'_>, w: &WeightVector) -> Result<f64, InferenceError> {
//!         Ok(1.0 / (1.0 + (-w.get(q.query.as_str()).unwrap_or(0.0)).exp()))
//!     }
//! }
//!
//! let requirements = vec![ProbabilityRequirement::unconditional("a", 0.8).unwrap()];
//! let mut weights = WeightVector::new().with("a", 0.0);
//!
//! let result = probfit::fit_requirements(requirements, &mut weights, &Logistic, &FittingConfig::default())
//!     .unwrap();
//! assert!(result.converged);
//! assert!((weights.get("a").unwrap() - 4f64.ln()).abs() < 0.01);
//! ```

pub use probfit_config::{
    AdjusterConfig, AggregateKind, ConfigError, CorrectionKind, FittingConfig, MonitorConfig,
    OracleThreadCount, RequirementConfig,
};
pub use probfit_core::{
    ConfigurationError, ConstraintSet, DegenerateProbabilityError, Evidence, FitError, FormulaId,
    FormulaRef, InferenceError, InferenceMethod, InferenceOracle, InferenceParams, ParamValue,
    PosteriorQuery, ProbabilityRequirement, RequirementId, ValidationError, WeightVector,
};
pub use probfit_fitter::{
    ChannelListener, ConstraintError, Fitter, FittingListener, FittingResult, FittingStatistics,
    IterationRecord, OracleRegistry, TerminationReason, UpdateMode, UpdateStatus, WeightAdjuster,
};

mod fit;
pub use fit::{
    fit, fit_and_query, fit_declared, fit_from_file, fit_requirements, fit_with_channel,
    load_config, Error, FittedQueries,
};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use super::{
        ConstraintSet, Evidence, FittingConfig, FittingResult, FormulaRef, InferenceError,
        InferenceMethod, InferenceOracle, PosteriorQuery, ProbabilityRequirement,
        TerminationReason, WeightVector,
    };
}
