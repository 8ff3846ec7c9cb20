//! Dispatch of posterior queries by inference method.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use probfit_core::{InferenceError, InferenceMethod, InferenceOracle, PosteriorQuery, WeightVector};

/// Routes each query to the oracle registered for its method.
///
/// Lets a configuration file select the inference method by name while the
/// caller supplies the engines.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use probfit_core::{InferenceError, InferenceMethod, InferenceOracle, PosteriorQuery, WeightVector};
/// use probfit_fitter::OracleRegistry;
///
/// #[derive(Debug)]
/// struct Half;
/// impl InferenceOracle for Half {
///     fn posterior(&self, _: &PosteriorQuery<'_>, _: &WeightVector) -> Result<f64, InferenceError> {
///         Ok(0.5)
///     }
/// }
///
/// let registry = OracleRegistry::new().with(InferenceMethod::Gibbs, Arc::new(Half));
/// assert!(registry.supports(&InferenceMethod::Gibbs));
/// assert!(!registry.supports(&InferenceMethod::Exact));
/// ```
#[derive(Default, Clone)]
pub struct OracleRegistry {
    oracles: HashMap<InferenceMethod, Arc<dyn InferenceOracle>>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: InferenceMethod, oracle: Arc<dyn InferenceOracle>) -> Self {
        self.register(method, oracle);
        self
    }

    /// Registers `oracle` for `method`, returning the oracle it replaces.
    pub fn register(
        &mut self,
        method: InferenceMethod,
        oracle: Arc<dyn InferenceOracle>,
    ) -> Option<Arc<dyn InferenceOracle>> {
        self.oracles.insert(method, oracle)
    }

    pub fn get(&self, method: &InferenceMethod) -> Option<&Arc<dyn InferenceOracle>> {
        self.oracles.get(method)
    }

    pub fn supports(&self, method: &InferenceMethod) -> bool {
        self.oracles.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }
}

impl InferenceOracle for OracleRegistry {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        match self.oracles.get(request.method) {
            Some(oracle) => oracle.posterior(request, weights),
            None => Err(InferenceError::UnsupportedMethod {
                method: request.method.clone(),
            }),
        }
    }
}

impl fmt::Debug for OracleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<String> = self.oracles.keys().map(ToString::to_string).collect();
        methods.sort();
        f.debug_struct("OracleRegistry")
            .field("methods", &methods)
            .finish()
    }
}
