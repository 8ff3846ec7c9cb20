//! Synchronized (batch) step.
//!
//! Every requirement is measured against the same frozen weights. No weight
//! is written until all queries of the step have returned, and corrections
//! targeting the same formula are summed.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{trace, warn};

use probfit_core::{
    FormulaId, InferenceError, InferenceOracle, ProbabilityRequirement, RequirementId, WeightVector,
};

use crate::record::{ConstraintError, IterationRecord, UpdateStatus};
use crate::scope::StepScope;

use super::{Dispatch, StepContext};

pub(super) fn run_step<O: InferenceOracle + ?Sized>(
    ctx: &StepContext<'_, O>,
    weights: &mut WeightVector,
    step: &StepScope,
) -> Result<IterationRecord, InferenceError> {
    let measured = measure_all(ctx, weights)?;

    let mut errors: Vec<ConstraintError> = ctx
        .constraints
        .iter()
        .zip(&measured)
        .map(|((id, requirement), &p)| ConstraintError::new(id, p, requirement.target()))
        .collect();

    let aggregate_error = ctx.monitor.aggregate(errors.iter().map(|e| e.deviation));
    if !ctx.monitor.is_converged(aggregate_error, step.threshold()) {
        apply_corrections(ctx, weights, &mut errors);
    }

    Ok(IterationRecord {
        step: step.index(),
        errors,
        aggregate_error,
        threshold_used: step.threshold(),
        accepted: false,
    })
}

/// Measures every requirement against `weights`, in constraint-set order.
///
/// On failure the error of the lowest failing requirement is returned, so
/// the outcome does not depend on scheduling.
fn measure_all<O: InferenceOracle + ?Sized>(
    ctx: &StepContext<'_, O>,
    weights: &WeightVector,
) -> Result<Vec<f64>, InferenceError> {
    let requirements = ctx.constraints.requirements();
    let query = |requirement: &ProbabilityRequirement| ctx.measure(requirement, weights);

    let outcomes: Vec<Result<f64, InferenceError>> = match ctx.dispatch {
        Dispatch::Sequential => requirements.iter().map(query).collect(),
        Dispatch::GlobalPool => requirements.par_iter().map(query).collect(),
        Dispatch::Pool(pool) => pool.install(|| requirements.par_iter().map(query).collect()),
    };

    outcomes.into_iter().collect()
}

/// Computes every correction from the unchanged snapshot, then applies them
/// together and clamps the touched weights.
fn apply_corrections<O: InferenceOracle + ?Sized>(
    ctx: &StepContext<'_, O>,
    weights: &mut WeightVector,
    errors: &mut [ConstraintError],
) {
    let mut deltas = Vec::with_capacity(errors.len());
    for entry in errors.iter_mut() {
        let requirement = ctx.requirement(entry.requirement);
        match ctx
            .adjuster
            .adjust(entry.requirement, requirement, entry.measured, weights)
        {
            Ok(delta) => {
                trace!(
                    requirement = %entry.requirement,
                    measured = entry.measured,
                    target = entry.target,
                    correction = delta.correction(),
                );
                entry.update = UpdateStatus::Applied {
                    correction: delta.correction(),
                };
                ctx.statistics.record_correction();
                deltas.push(delta);
            }
            Err(e) => {
                skip_degenerate(entry.requirement, &e);
                entry.update = UpdateStatus::Degenerate;
                ctx.statistics.record_degenerate();
            }
        }
    }

    let mut touched: BTreeSet<FormulaId> = BTreeSet::new();
    for delta in &deltas {
        delta.apply_to(weights, None);
        touched.extend(delta.iter().map(|(formula, _)| formula.clone()));
    }

    if let Some(limit) = ctx.adjuster.weight_limit() {
        for formula in touched {
            if let Some(weight) = weights.get(formula.as_str()) {
                if weight.abs() > limit {
                    weights.insert(formula, weight.clamp(-limit, limit));
                }
            }
        }
    }
}

pub(super) fn skip_degenerate(requirement: RequirementId, error: &impl std::fmt::Display) {
    warn!(
        event = "degenerate_probability",
        requirement = %requirement,
        error = %error,
    );
}
