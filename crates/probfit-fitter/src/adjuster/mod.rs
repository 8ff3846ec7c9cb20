//! Weight adjusters for proportional fitting.
//!
//! An adjuster turns one requirement's measured probability into a
//! correction of the weights of the formulas driving that requirement.

mod bounds;
mod log_odds;
mod log_ratio;

use std::fmt::Debug;

use smallvec::SmallVec;

use probfit_core::{
    DegenerateProbabilityError, FormulaId, ProbabilityRequirement, RequirementId, WeightVector,
};

pub use bounds::CorrectionBounds;
pub use log_odds::LogOddsAdjuster;
pub use log_ratio::LogRatioAdjuster;

/// Computes weight corrections for a single requirement.
pub trait WeightAdjuster: Send + Sync + Debug {
    /// Returns the correction that moves `P(query | evidence)` from
    /// `measured` toward the requirement's target.
    ///
    /// # Errors
    ///
    /// `DegenerateProbabilityError` if `measured` admits no correction
    /// (e.g. `measured == 0` for a positive target).
    fn adjust(
        &self,
        id: RequirementId,
        requirement: &ProbabilityRequirement,
        measured: f64,
        weights: &WeightVector,
    ) -> Result<WeightDelta, DegenerateProbabilityError>;

    /// Cap on the absolute value of any adjusted weight.
    fn weight_limit(&self) -> Option<f64> {
        None
    }
}

/// Per-formula weight changes computed for one requirement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightDelta {
    correction: f64,
    changes: SmallVec<[(FormulaId, f64); 2]>,
}

impl WeightDelta {
    /// A delta that changes nothing.
    pub fn zero() -> Self {
        Self::default()
    }

    pub(crate) fn new(correction: f64, changes: SmallVec<[(FormulaId, f64); 2]>) -> Self {
        Self {
            correction,
            changes,
        }
    }

    /// The bounded correction before it was split across driven formulas.
    pub fn correction(&self) -> f64 {
        self.correction
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FormulaId, f64)> {
        self.changes.iter().map(|(id, d)| (id, *d))
    }

    pub fn is_zero(&self) -> bool {
        self.changes.iter().all(|(_, d)| *d == 0.0)
    }

    /// Largest absolute change to any single weight.
    pub fn max_abs(&self) -> f64 {
        self.changes.iter().map(|(_, d)| d.abs()).fold(0.0, f64::max)
    }

    /// Adds the changes to `weights`, clamping results to `±weight_limit`.
    pub fn apply_to(&self, weights: &mut WeightVector, weight_limit: Option<f64>) {
        for (formula, delta) in &self.changes {
            if let Some(updated) = weights.add(formula.as_str(), *delta) {
                if let Some(limit) = weight_limit {
                    if updated.abs() > limit {
                        weights.insert(formula.clone(), updated.clamp(-limit, limit));
                    }
                }
            }
        }
    }
}
