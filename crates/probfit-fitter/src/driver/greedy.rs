//! Sequential (greedy) step.
//!
//! The step first measures every requirement against its starting weights;
//! the record, the convergence check and the best snapshot all refer to
//! that measurement. Unless converged, requirements are then visited in
//! ascending `RequirementId` order: each one is measured against the
//! weights left by its predecessors and, unless already within the active
//! threshold, corrected immediately.

use tracing::trace;

use probfit_core::{InferenceError, InferenceOracle, WeightVector};

use crate::record::{ConstraintError, IterationRecord, UpdateStatus};
use crate::scope::StepScope;

use super::batch::skip_degenerate;
use super::StepContext;

pub(super) fn run_step<O: InferenceOracle + ?Sized>(
    ctx: &StepContext<'_, O>,
    weights: &mut WeightVector,
    step: &StepScope,
) -> Result<IterationRecord, InferenceError> {
    let threshold = step.threshold();

    let mut errors = Vec::with_capacity(ctx.constraints.len());
    for (id, requirement) in ctx.constraints.iter() {
        let measured = ctx.measure(requirement, weights)?;
        errors.push(ConstraintError::new(id, measured, requirement.target()));
    }

    let aggregate_error = ctx.monitor.aggregate(errors.iter().map(|e| e.deviation));
    if !ctx.monitor.is_converged(aggregate_error, threshold) {
        sweep(ctx, weights, threshold, &mut errors)?;
    }

    Ok(IterationRecord {
        step: step.index(),
        errors,
        aggregate_error,
        threshold_used: threshold,
        accepted: false,
    })
}

/// Corrects requirements one after another, re-measuring each once an
/// earlier correction has moved the weights.
fn sweep<O: InferenceOracle + ?Sized>(
    ctx: &StepContext<'_, O>,
    weights: &mut WeightVector,
    threshold: f64,
    errors: &mut [ConstraintError],
) -> Result<(), InferenceError> {
    let weight_limit = ctx.adjuster.weight_limit();
    let mut moved = false;

    for entry in errors.iter_mut() {
        let requirement = ctx.requirement(entry.requirement);
        let measured = if moved {
            ctx.measure(requirement, weights)?
        } else {
            entry.measured
        };

        if (measured - entry.target).abs() < threshold {
            entry.update = UpdateStatus::WithinThreshold;
            continue;
        }

        entry.update = match ctx
            .adjuster
            .adjust(entry.requirement, requirement, measured, weights)
        {
            Ok(delta) => {
                trace!(
                    requirement = %entry.requirement,
                    measured,
                    target = entry.target,
                    correction = delta.correction(),
                );
                delta.apply_to(weights, weight_limit);
                ctx.statistics.record_correction();
                moved = true;
                UpdateStatus::Applied {
                    correction: delta.correction(),
                }
            }
            Err(e) => {
                skip_degenerate(entry.requirement, &e);
                ctx.statistics.record_degenerate();
                UpdateStatus::Degenerate
            }
        };
    }
    Ok(())
}
