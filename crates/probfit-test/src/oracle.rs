//! Inference oracles for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use probfit_core::{
    FormulaId, InferenceError, InferenceMethod, InferenceOracle, PosteriorQuery, WeightVector,
};

use crate::model::PropositionalModel;

/// Exact inference by enumerating every world of a model.
///
/// Answers `Exact` and `EnumerationAsk` queries.
#[derive(Debug, Clone)]
pub struct EnumerationOracle {
    model: Arc<PropositionalModel>,
}

impl EnumerationOracle {
    pub fn new(model: PropositionalModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    pub fn model(&self) -> &PropositionalModel {
        &self.model
    }
}

impl InferenceOracle for EnumerationOracle {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        match request.method {
            InferenceMethod::Exact | InferenceMethod::EnumerationAsk => {
                self.model
                    .probability(request.query, request.evidence, weights)
            }
            other => Err(InferenceError::UnsupportedMethod {
                method: other.clone(),
            }),
        }
    }
}

/// Seeded Monte Carlo inference.
///
/// Draws worlds from the model's distribution and estimates the query by
/// rejection on the evidence. Every query restarts the generator from the
/// same seed, so answers are reproducible regardless of call order.
///
/// Recognized parameters: `samples` (default 20 000) and `seed`.
#[derive(Debug, Clone)]
pub struct SamplingOracle {
    model: Arc<PropositionalModel>,
    seed: u64,
}

impl SamplingOracle {
    pub const DEFAULT_SAMPLES: u64 = 20_000;

    pub fn new(model: PropositionalModel, seed: u64) -> Self {
        Self {
            model: Arc::new(model),
            seed,
        }
    }
}

impl InferenceOracle for SamplingOracle {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        if !matches!(request.method, InferenceMethod::Gibbs | InferenceMethod::Mcsat) {
            return Err(InferenceError::UnsupportedMethod {
                method: request.method.clone(),
            });
        }
        self.model.check_evidence(request.evidence)?;

        let samples = request
            .params
            .get_u64("samples")
            .unwrap_or(Self::DEFAULT_SAMPLES);
        let seed = request.params.get_u64("seed").unwrap_or(self.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let worlds: Vec<_> = self.model.worlds().collect();
        let mut cumulative = Vec::with_capacity(worlds.len());
        let mut total = 0.0;
        for p in self.model.distribution(weights) {
            total += p;
            cumulative.push(total);
        }

        let mut accepted = 0u64;
        let mut hits = 0u64;
        for _ in 0..samples {
            let u = rng.random::<f64>() * total;
            let index = cumulative
                .partition_point(|&c| c < u)
                .min(worlds.len() - 1);
            let world = &worlds[index];
            if !self.model.consistent(world, request.evidence) {
                continue;
            }
            accepted += 1;
            if self.model.holds(request.query, world)? {
                hits += 1;
            }
        }

        if accepted == 0 {
            return Err(InferenceError::NotConverged {
                method: request.method.clone(),
                reason: format!("no sample consistent with '{}'", request.evidence),
            });
        }
        Ok(hits as f64 / accepted as f64)
    }
}

/// Returns a fixed probability per query formula.
#[derive(Debug, Clone, Default)]
pub struct FixedOracle {
    answers: BTreeMap<FormulaId, f64>,
}

impl FixedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: impl Into<FormulaId>, probability: f64) -> Self {
        self.answers.insert(query.into(), probability);
        self
    }
}

impl InferenceOracle for FixedOracle {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        _weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        self.answers
            .get(request.query)
            .copied()
            .ok_or_else(|| InferenceError::InvalidQuery {
                query: request.query.clone(),
                reason: "no fixed answer".to_string(),
            })
    }
}

/// Counts the queries passed to the wrapped oracle.
#[derive(Debug)]
pub struct CountingOracle<O> {
    inner: O,
    calls: AtomicUsize,
}

impl<O> CountingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: InferenceOracle> InferenceOracle for CountingOracle<O> {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.posterior(request, weights)
    }
}

/// Fails every query after the first `succeed` ones.
#[derive(Debug)]
pub struct FailingOracle<O> {
    inner: O,
    succeed: usize,
    calls: AtomicUsize,
}

impl<O> FailingOracle<O> {
    pub fn after(succeed: usize, inner: O) -> Self {
        Self {
            inner,
            succeed,
            calls: AtomicUsize::new(0),
        }
    }

    /// The error every failing query returns.
    pub fn error() -> InferenceError {
        InferenceError::Other("oracle unavailable".to_string())
    }
}

impl<O: InferenceOracle> InferenceOracle for FailingOracle<O> {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.succeed {
            return Err(Self::error());
        }
        self.inner.posterior(request, weights)
    }
}
