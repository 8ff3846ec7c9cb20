//! probfit Core - Core types and traits for posterior-constraint fitting
//!
//! This crate provides the fundamental abstractions for probfit:
//! - Formula identifiers and weight vectors of log-linear models
//! - Evidence assignments and probability requirements
//! - The validated, ordered constraint set
//! - The inference oracle trait consumed by the fitter
//! - The error taxonomy shared by all crates

pub mod constraint;
pub mod error;
pub mod evidence;
pub mod formula;
pub mod oracle;
pub mod weights;

pub use constraint::{ConstraintSet, ProbabilityRequirement, RequirementId};
pub use error::{
    ConfigurationError, DegenerateProbabilityError, FitError, InferenceError, Result,
    ValidationError,
};
pub use evidence::Evidence;
pub use formula::{FormulaId, FormulaRef};
pub use oracle::{InferenceMethod, InferenceOracle, InferenceParams, ParamValue, PosteriorQuery};
pub use weights::WeightVector;

#[cfg(test)]
mod weights_tests;
