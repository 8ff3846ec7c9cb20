//! Fitting entry points that hide the component wiring.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use probfit_config::{ConfigError, FittingConfig};
use probfit_core::{
    ConstraintSet, Evidence, FitError, FormulaId, InferenceError, InferenceOracle,
    InferenceParams, PosteriorQuery, ProbabilityRequirement, WeightVector,
};
use probfit_fitter::{checked_posterior, ChannelListener, Fitter, FittingResult, IterationRecord};

/// Errors of the file-driven and querying entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Fit(#[from] FitError),

    /// A query asked after fitting could not be answered.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// A fitting run together with the queries answered by its weights.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedQueries {
    pub fit: FittingResult,
    /// `P(query | evidence)` under the returned weights, in request order.
    pub posteriors: Vec<(FormulaId, f64)>,
}

impl FittedQueries {
    pub fn posterior(&self, query: &str) -> Option<f64> {
        self.posteriors
            .iter()
            .find(|(id, _)| id.as_str() == query)
            .map(|(_, p)| *p)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(e) => Error::Fit(FitError::Configuration(e)),
            ConfigError::Requirement(e) => Error::Fit(e),
            other => Error::Config(other),
        }
    }
}

/// Fits `weights` to `constraints` with the given options.
///
/// # Errors
///
/// `FitError::Configuration` for invalid options, `FitError::Validation`
/// if a referenced formula has no usable weight. Both are reported before
/// the oracle is queried.
pub fn fit<O: InferenceOracle + ?Sized>(
    constraints: &ConstraintSet,
    weights: &mut WeightVector,
    oracle: &O,
    config: &FittingConfig,
) -> Result<FittingResult, FitError> {
    Fitter::new(config.clone())?.fit(constraints, weights, oracle)
}

/// Like [`fit`], building the constraint set from a list of requirements.
///
/// # Errors
///
/// Additionally `ConfigurationError::EmptyConstraintSet` for an empty list.
pub fn fit_requirements<O: InferenceOracle + ?Sized>(
    requirements: Vec<ProbabilityRequirement>,
    weights: &mut WeightVector,
    oracle: &O,
    config: &FittingConfig,
) -> Result<FittingResult, FitError> {
    let constraints = ConstraintSet::new(requirements)?;
    fit(&constraints, weights, oracle, config)
}

/// Fits the requirements declared in `config` itself.
pub fn fit_declared<O: InferenceOracle + ?Sized>(
    config: &FittingConfig,
    weights: &mut WeightVector,
    oracle: &O,
) -> Result<FittingResult, FitError> {
    let constraints = config.constraint_set()?;
    fit(&constraints, weights, oracle, config)
}

/// Loads a TOML configuration with declared requirements and fits them.
///
/// # Errors
///
/// `Error::Config` if the file cannot be read or parsed; `Error::Fit` for
/// invalid options, requirements or weights.
pub fn fit_from_file<O: InferenceOracle + ?Sized>(
    path: impl AsRef<Path>,
    weights: &mut WeightVector,
    oracle: &O,
) -> Result<FittingResult, Error> {
    let config = FittingConfig::load(path)?;
    Ok(fit_declared(&config, weights, oracle)?)
}

/// Loads `path`, falling back to default options if it is absent or invalid.
pub fn load_config(path: impl AsRef<Path>) -> FittingConfig {
    let path = path.as_ref();
    FittingConfig::load(path).unwrap_or_else(|e| {
        debug!(event = "config_default", path = %path.display(), error = %e);
        FittingConfig::default()
    })
}

/// Runs [`fit`] while streaming every iteration record to `sender`.
pub fn fit_with_channel<O: InferenceOracle + ?Sized>(
    constraints: &ConstraintSet,
    weights: &mut WeightVector,
    oracle: &O,
    config: &FittingConfig,
    sender: mpsc::UnboundedSender<IterationRecord>,
) -> Result<FittingResult, FitError> {
    Fitter::new(config.clone())?
        .with_listener(Arc::new(ChannelListener::new(sender)))
        .fit(constraints, weights, oracle)
}

/// Fits `weights`, then answers `P(query | evidence)` for every query with
/// the weights the fit returned.
///
/// Queries use the configured inference method and parameters, with
/// `overrides` taking precedence key by key. They are answered whatever
/// the termination reason.
///
/// # Errors
///
/// `Error::Fit` as for [`fit`]; `Error::Inference` if a query fails.
pub fn fit_and_query<O: InferenceOracle + ?Sized>(
    constraints: &ConstraintSet,
    weights: &mut WeightVector,
    oracle: &O,
    config: &FittingConfig,
    queries: &[FormulaId],
    evidence: &Evidence,
    overrides: &InferenceParams,
) -> Result<FittedQueries, Error> {
    let fit = fit(constraints, weights, oracle, config)?;

    let mut params = config.inference_params.clone();
    params.merge(overrides);

    let mut posteriors = Vec::with_capacity(queries.len());
    for query in queries {
        let request = PosteriorQuery {
            query,
            evidence,
            method: &config.inference_method,
            params: &params,
        };
        let probability = checked_posterior(oracle, &request, weights)?;
        debug!(event = "query_answered", query = %query, probability);
        posteriors.push((query.clone(), probability));
    }

    Ok(FittedQueries { fit, posteriors })
}
