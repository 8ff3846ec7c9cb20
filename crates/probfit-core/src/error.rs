//! Error types for probfit

use thiserror::Error;

use crate::constraint::RequirementId;
use crate::formula::FormulaId;
use crate::oracle::InferenceMethod;

/// Fatal errors raised before the fitting loop runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// The fitting problem or its options are ill-formed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A requirement or the initial weights fail validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Problems with the shape of a fitting run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Fitting is undefined without at least one probability requirement.
    #[error("constraint set is empty; IPFP-M needs at least one probability requirement")]
    EmptyConstraintSet,

    /// An option is outside its admissible range.
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },
}

impl ConfigurationError {
    pub fn invalid_option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}

/// Problems with individual requirements or weights.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Target probability outside `[0, 1]` (or not a number).
    #[error("target probability {target} is outside [0, 1]{}", fmt_requirement(*requirement))]
    TargetOutOfRange {
        requirement: Option<RequirementId>,
        target: f64,
    },

    /// A formula referenced by a requirement has no weight.
    #[error("formula `{formula}` referenced by requirement {requirement} has no weight")]
    MissingWeight {
        formula: FormulaId,
        requirement: RequirementId,
    },

    /// An initial weight is NaN or infinite.
    #[error("weight of formula `{formula}` is not finite ({weight})")]
    NonFiniteWeight { formula: FormulaId, weight: f64 },
}

fn fmt_requirement(requirement: Option<RequirementId>) -> String {
    match requirement {
        Some(id) => format!(" (requirement {id})"),
        None => String::new(),
    }
}

/// The measured probability makes a proportional correction ill-defined.
///
/// Recoverable: the fitter skips the update of this requirement for the
/// current step and records the skip in the trace.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("requirement {requirement}: measured probability {measured} admits no correction toward target {target}")]
pub struct DegenerateProbabilityError {
    pub requirement: RequirementId,
    pub measured: f64,
    pub target: f64,
}

/// Failures reported by an inference oracle.
///
/// Fatal to a fitting run; the fitter returns the partial trace together
/// with the failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// The inference algorithm did not converge.
    #[error("{method} inference did not converge: {reason}")]
    NotConverged {
        method: InferenceMethod,
        reason: String,
    },

    /// The query cannot be evaluated by the model.
    #[error("invalid query `{query}`: {reason}")]
    InvalidQuery { query: FormulaId, reason: String },

    /// The evidence is inconsistent or refers to unknown atoms.
    #[error("invalid evidence: {reason}")]
    InvalidEvidence { reason: String },

    /// No oracle is registered for the requested method.
    #[error("no inference oracle registered for method {method}")]
    UnsupportedMethod { method: InferenceMethod },

    /// The oracle returned something that is not a probability.
    #[error("oracle returned {value} for query `{query}`, which is not a probability")]
    InvalidProbability { query: FormulaId, value: f64 },

    /// Any other oracle-specific failure.
    #[error("inference failed: {0}")]
    Other(String),
}

/// Result type alias for probfit operations
pub type Result<T> = std::result::Result<T, FitError>;
