//! Inference oracle interface.
//!
//! The fitter never performs inference itself. It asks an [`InferenceOracle`]
//! for `P(query | evidence)` under the current weights, naming the
//! [`InferenceMethod`] the caller configured and passing [`InferenceParams`]
//! through untouched.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::InferenceError;
use crate::evidence::Evidence;
use crate::formula::FormulaId;
use crate::weights::WeightVector;

/// Inference algorithm requested from the oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InferenceMethod {
    /// Exact inference over all possible worlds.
    #[default]
    Exact,

    /// Enumeration-ask over the ground network.
    EnumerationAsk,

    /// MC-SAT sampling.
    Mcsat,

    /// Gibbs sampling.
    Gibbs,

    /// Loopy belief propagation.
    BeliefPropagation,

    /// Any other algorithm, identified by name.
    Custom(String),
}

impl fmt::Display for InferenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::EnumerationAsk => f.write_str("enumeration_ask"),
            Self::Mcsat => f.write_str("mcsat"),
            Self::Gibbs => f.write_str("gibbs"),
            Self::BeliefPropagation => f.write_str("belief_propagation"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// A single opaque inference parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Parameters passed through to the oracle without interpretation.
///
/// # Example
///
/// ```
/// use probfit_core::{InferenceParams, ParamValue};
///
/// let params = InferenceParams::new()
///     .with("max_steps", ParamValue::Integer(5000))
///     .with("seed", ParamValue::Integer(7));
///
/// assert_eq!(params.get_u64("max_steps"), Some(5000));
/// assert_eq!(params.get_f64("max_steps"), Some(5000.0));
/// assert_eq!(params.get_bool("verbose"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct InferenceParams {
    values: BTreeMap<String, ParamValue>,
}

impl InferenceParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            ParamValue::Integer(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            ParamValue::Float(x) => Some(*x),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Overlays `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: &InferenceParams) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One posterior request: `P(query | evidence)` by `method`.
#[derive(Debug, Clone, Copy)]
pub struct PosteriorQuery<'a> {
    pub query: &'a FormulaId,
    pub evidence: &'a Evidence,
    pub method: &'a InferenceMethod,
    pub params: &'a InferenceParams,
}

/// Computes posterior probabilities of a model under given weights.
///
/// Implementations must be `Sync`: batch fitting issues the queries of one
/// step concurrently against the same frozen weight vector. The call is
/// synchronous and has no timeout; an oracle that needs cancellation should
/// enforce it itself and report [`InferenceError`].
///
/// # Example
///
/// ```
/// use probfit_core::{InferenceError, InferenceOracle, PosteriorQuery, WeightVector};
///
/// /// One independent atom per formula: P(f) = sigmoid(w_f).
/// #[derive(Debug)]
/// struct Independent;
///
/// impl InferenceOracle for Independent {
///     fn posterior(
///         &self,
///         request: &PosteriorQuery<'_>,
///         weights: &WeightVector,
///     ) -> Result<f64, InferenceError> {
///         let w = weights.get(request.query.as_str()).ok_or_else(|| InferenceError::InvalidQuery {
///             query: request.query.clone(),
///             reason: "unknown formula".to_string(),
///         })?;
///         Ok(1.0 / (1.0 + (-w).exp()))
///     }
/// }
/// ```
pub trait InferenceOracle: Send + Sync + Debug {
    /// Returns `P(request.query | request.evidence)` in `[0, 1]`.
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError>;
}

impl<O: InferenceOracle + ?Sized> InferenceOracle for &O {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        (**self).posterior(request, weights)
    }
}

impl<O: InferenceOracle + ?Sized> InferenceOracle for Box<O> {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        (**self).posterior(request, weights)
    }
}

impl<O: InferenceOracle + ?Sized> InferenceOracle for Arc<O> {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        (**self).posterior(request, weights)
    }
}
