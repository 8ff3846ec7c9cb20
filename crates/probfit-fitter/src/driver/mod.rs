//! The IPFP-M fitting loop.
//!
//! [`Fitter`] repeatedly measures every requirement through an inference
//! oracle and corrects the weights of the driven formulas until the
//! aggregate error drops below the active threshold or the step limit is
//! reached.

mod batch;
mod greedy;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use probfit_config::{FittingConfig, OracleThreadCount};
use probfit_core::{
    ConstraintSet, FitError, InferenceError, InferenceMethod, InferenceOracle, InferenceParams,
    PosteriorQuery, ProbabilityRequirement, RequirementId, WeightVector,
};

use crate::adjuster::WeightAdjuster;
use crate::builder::{AdjusterBuilder, MonitorBuilder};
use crate::event::{FittingEventSupport, FittingListener};
use crate::monitor::ConvergenceMonitor;
use crate::record::IterationRecord;
use crate::scope::{FittingScope, StepScope};
use crate::statistics::{FittingStatistics, StatisticsCollector};

/// Slack tolerated on oracle output before it counts as invalid.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Why a fitting run stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationReason {
    /// The aggregate error dropped below the active threshold.
    Converged,
    /// `max_steps` steps ran without convergence.
    StepLimit,
    /// The oracle failed during `step`; the run was aborted.
    InferenceFailed { step: u64, error: InferenceError },
}

/// Outcome of a fitting run.
#[derive(Debug, Clone, PartialEq)]
pub struct FittingResult {
    pub converged: bool,
    /// Number of completed steps; equals `trace.len()`.
    pub steps_taken: u64,
    pub termination: TerminationReason,
    /// Signed residuals `measured - target` in constraint-set order, taken
    /// from the record that matches the returned weights. Empty when no
    /// step completed.
    pub final_errors: Vec<f64>,
    /// Threshold active when the run ended, after any relaxation.
    pub final_threshold: f64,
    pub best_aggregate_error: Option<f64>,
    pub trace: Vec<IterationRecord>,
    pub statistics: FittingStatistics,
}

impl FittingResult {
    pub fn last_record(&self) -> Option<&IterationRecord> {
        self.trace.last()
    }

    pub fn inference_error(&self) -> Option<&InferenceError> {
        match &self.termination {
            TerminationReason::InferenceFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Update discipline of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// All requirements measured against one snapshot, corrections applied together.
    Batch,
    /// Requirements measured and corrected one after another.
    Greedy,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => write!(f, "batch"),
            Self::Greedy => write!(f, "greedy"),
        }
    }
}

/// How batch-step queries are dispatched.
#[derive(Debug, Clone)]
pub(crate) enum Dispatch {
    Sequential,
    GlobalPool,
    Pool(Arc<rayon::ThreadPool>),
}

impl Dispatch {
    fn from_config(count: OracleThreadCount) -> Self {
        match count {
            OracleThreadCount::None => Self::Sequential,
            OracleThreadCount::Auto => Self::GlobalPool,
            OracleThreadCount::Count(n) => {
                match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                    Ok(pool) => Self::Pool(Arc::new(pool)),
                    Err(e) => {
                        warn!(
                            event = "oracle_pool_fallback",
                            threads = n,
                            error = %e,
                        );
                        Self::GlobalPool
                    }
                }
            }
        }
    }
}

/// Everything a step needs besides the scope.
pub(crate) struct StepContext<'a, O: ?Sized> {
    pub constraints: &'a ConstraintSet,
    pub oracle: &'a O,
    pub method: &'a InferenceMethod,
    pub params: &'a InferenceParams,
    pub adjuster: &'a dyn WeightAdjuster,
    pub monitor: &'a ConvergenceMonitor,
    pub statistics: &'a StatisticsCollector,
    pub dispatch: &'a Dispatch,
}

impl<O: InferenceOracle + ?Sized> StepContext<'_, O> {
    /// Queries `P(query | evidence)` under the configured method.
    pub fn measure(
        &self,
        requirement: &ProbabilityRequirement,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        self.statistics.record_oracle_call();
        let request = PosteriorQuery {
            query: requirement.query(),
            evidence: requirement.evidence(),
            method: self.method,
            params: self.params,
        };
        checked_posterior(self.oracle, &request, weights)
    }

    pub fn requirement(&self, id: RequirementId) -> &ProbabilityRequirement {
        &self.constraints[id]
    }
}

/// Fits model weights to a set of probability requirements.
///
/// # Example
///
/// ```
/// use probfit_config::FittingConfig;
/// use probfit_core::{
///     ConstraintSet, InferenceError, InferenceOracle, PosteriorQuery, ProbabilityRequirement,
///     WeightVector,
/// };
/// use probfit_fitter::Fitter;
///
/// // A single independent formula: P(a) = sigmoid(w_a).
/// #[derive(Debug)]
/// struct Logistic;
/// impl InferenceOracle for Logistic {
///     fn posterior(&self, q: &PosteriorQuery<'_>, w: &WeightVector) -> Result<f64, InferenceError> {
///         let weight = w.get(q.query.as_str()).unwrap_or(0.0);
///         Ok(1.0 / (1.0 + (-weight).exp()))
///     }
/// }
///
/// let constraints =
///     ConstraintSet::new(vec![ProbabilityRequirement::unconditional("a", 0.5).unwrap()]).unwrap();
/// let mut weights = WeightVector::new().with("a", 0.0);
///
/// let fitter = Fitter::new(FittingConfig::default()).unwrap();
/// let result = fitter.fit(&constraints, &mut weights, &Logistic).unwrap();
/// assert!(result.converged);
/// assert_eq!(result.steps_taken, 1);
/// ```
pub struct Fitter {
    config: FittingConfig,
    adjuster: Box<dyn WeightAdjuster>,
    monitor: ConvergenceMonitor,
    events: FittingEventSupport,
    dispatch: Dispatch,
}

impl Fitter {
    /// Creates a fitter for validated options.
    ///
    /// # Errors
    ///
    /// `FitError::Configuration` if any option is out of range.
    pub fn new(config: FittingConfig) -> Result<Self, FitError> {
        config.validate()?;
        Ok(Self {
            adjuster: AdjusterBuilder::build(&config.adjuster),
            monitor: MonitorBuilder::build(&config),
            events: FittingEventSupport::new(),
            dispatch: Dispatch::from_config(config.oracle_thread_count),
            config,
        })
    }

    /// Replaces the adjuster built from configuration.
    pub fn with_adjuster(mut self, adjuster: impl WeightAdjuster + 'static) -> Self {
        self.adjuster = Box::new(adjuster);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn FittingListener>) -> Self {
        self.events.add_listener(listener);
        self
    }

    pub fn config(&self) -> &FittingConfig {
        &self.config
    }

    pub fn mode(&self) -> UpdateMode {
        if self.config.greedy {
            UpdateMode::Greedy
        } else {
            UpdateMode::Batch
        }
    }

    /// Runs the fitting loop, updating `weights` in place.
    ///
    /// Non-convergence and oracle failures are reported in the result, not
    /// as errors. Unless the run converged, `weights` hold the best snapshot
    /// on return (for an oracle failure: the weights at the start of the
    /// failing step).
    ///
    /// # Errors
    ///
    /// `FitError::Validation` if a formula referenced by the constraints
    /// has no finite weight. Nothing is queried in that case.
    pub fn fit<O: InferenceOracle + ?Sized>(
        &self,
        constraints: &ConstraintSet,
        weights: &mut WeightVector,
        oracle: &O,
    ) -> Result<FittingResult, FitError> {
        constraints.validate_weights(weights)?;

        let mode = self.mode();
        let mut scope = FittingScope::new(weights, self.config.threshold);
        scope.start_fitting();
        let statistics = Arc::clone(scope.statistics());

        info!(
            event = "fit_start",
            requirements = constraints.len(),
            mode = %mode,
            method = %self.config.inference_method,
            threshold = self.config.threshold,
            max_steps = self.config.max_steps,
        );
        self.events
            .fire_fit_started(constraints.len(), self.config.threshold);

        let ctx = StepContext {
            constraints,
            oracle,
            method: &self.config.inference_method,
            params: &self.config.inference_params,
            adjuster: self.adjuster.as_ref(),
            monitor: &self.monitor,
            statistics: &statistics,
            dispatch: &self.dispatch,
        };

        let termination = self.run_steps(&ctx, &mut scope, mode);

        let final_errors = match &termination {
            TerminationReason::Converged => scope.trace().last().map(IterationRecord::residuals),
            TerminationReason::StepLimit => {
                scope.restore_best();
                scope.best_record().map(IterationRecord::residuals)
            }
            TerminationReason::InferenceFailed { .. } => {
                scope.trace().last().map(IterationRecord::residuals)
            }
        }
        .unwrap_or_default();

        let final_threshold = scope.threshold();
        let best_aggregate_error = scope.best_aggregate_error();
        let trace = scope.into_trace();
        let result = FittingResult {
            converged: termination == TerminationReason::Converged,
            steps_taken: trace.len() as u64,
            termination,
            final_errors,
            final_threshold,
            best_aggregate_error,
            trace,
            statistics: statistics.snapshot(),
        };

        info!(
            event = "fit_end",
            converged = result.converged,
            steps = result.steps_taken,
            aggregate_error = result.last_record().map(|r| r.aggregate_error),
            final_threshold = result.final_threshold,
            oracle_calls = result.statistics.oracle_calls,
            duration_ms = duration_ms(result.statistics.total_duration),
        );
        self.events.fire_fit_ended(&result);

        Ok(result)
    }

    fn run_steps<O: InferenceOracle + ?Sized>(
        &self,
        ctx: &StepContext<'_, O>,
        scope: &mut FittingScope<'_>,
        mode: UpdateMode,
    ) -> TerminationReason {
        while scope.step_count() < self.config.max_steps {
            let step = scope.begin_step();
            let outcome = match mode {
                UpdateMode::Batch => batch::run_step(ctx, scope.weights_mut(), &step),
                UpdateMode::Greedy => greedy::run_step(ctx, scope.weights_mut(), &step),
            };

            let record = match outcome {
                Ok(record) => record,
                Err(error) => return abort(scope, step, error),
            };

            let record = scope.complete_step(step, record);
            debug!(
                event = "step",
                step = record.step,
                aggregate_error = record.aggregate_error,
                threshold = record.threshold_used,
                applied = record.applied_count(),
                accepted = record.accepted,
            );
            self.events.fire_step_ended(record);

            let verdict = self.monitor.evaluate(scope.trace());
            if verdict.converged {
                return TerminationReason::Converged;
            }
            if verdict.should_relax_threshold {
                self.relax(scope);
            }
        }
        TerminationReason::StepLimit
    }

    fn relax(&self, scope: &mut FittingScope<'_>) {
        let from = scope.threshold();
        let to = self.monitor.relaxed_threshold(from);
        if to <= from {
            return;
        }
        scope.set_threshold(to);
        scope.statistics().record_relaxation();

        let step = scope.step_count().saturating_sub(1);
        info!(event = "threshold_relaxed", step, from, to);
        self.events.fire_threshold_relaxed(step, from, to);
    }
}

impl fmt::Debug for Fitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fitter")
            .field("config", &self.config)
            .field("adjuster", &self.adjuster)
            .field("monitor", &self.monitor)
            .field("events", &self.events)
            .finish()
    }
}

/// Ends the run after an oracle failure, rolling back the failing step.
fn abort(scope: &mut FittingScope<'_>, step: StepScope, error: InferenceError) -> TerminationReason {
    warn!(
        event = "inference_failed",
        step = step.index(),
        error = %error,
    );
    let index = step.index();
    scope.weights_mut().clone_from(step.snapshot());
    TerminationReason::InferenceFailed { step: index, error }
}

/// Asks `oracle` for a posterior and checks the answer is a probability.
///
/// Values within a tiny tolerance outside `[0, 1]` are clamped; anything
/// else, including NaN, is [`InferenceError::InvalidProbability`].
pub fn checked_posterior<O: InferenceOracle + ?Sized>(
    oracle: &O,
    request: &PosteriorQuery<'_>,
    weights: &WeightVector,
) -> Result<f64, InferenceError> {
    let value = oracle.posterior(request, weights)?;
    if value.is_finite() && (-PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE).contains(&value)
    {
        Ok(value.clamp(0.0, 1.0))
    } else {
        Err(InferenceError::InvalidProbability {
            query: request.query.clone(),
            value,
        })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
