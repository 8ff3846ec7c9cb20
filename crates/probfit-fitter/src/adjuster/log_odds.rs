//! Log-odds correction.

use probfit_config::AdjusterConfig;
use probfit_core::{
    DegenerateProbabilityError, ProbabilityRequirement, RequirementId, WeightVector,
};

use super::{CorrectionBounds, WeightAdjuster, WeightDelta};

/// Adds `ln(t (1 - p) / (p (1 - t)))` to the driven weights.
///
/// For a formula that is independent of the rest of the model this lands
/// on the target in a single step. Measured probabilities of exactly zero
/// or one have no odds and are reported as degenerate.
#[derive(Debug, Clone, Default)]
pub struct LogOddsAdjuster {
    bounds: CorrectionBounds,
}

impl LogOddsAdjuster {
    pub fn new(bounds: CorrectionBounds) -> Self {
        Self { bounds }
    }

    pub fn from_config(config: &AdjusterConfig) -> Self {
        Self::new(CorrectionBounds::from_config(config))
    }
}

impl WeightAdjuster for LogOddsAdjuster {
    fn adjust(
        &self,
        id: RequirementId,
        requirement: &ProbabilityRequirement,
        measured: f64,
        weights: &WeightVector,
    ) -> Result<WeightDelta, DegenerateProbabilityError> {
        let target = requirement.target();
        if measured == target {
            return Ok(self.bounds.distribute(requirement, 0.0, weights));
        }
        if !(measured > 0.0 && measured < 1.0) {
            return Err(DegenerateProbabilityError {
                requirement: id,
                measured,
                target,
            });
        }

        // Boundary targets give ±inf, capped by the bounds.
        let raw = (target / measured).ln() + ((1.0 - measured) / (1.0 - target)).ln();
        Ok(self.bounds.distribute(requirement, raw, weights))
    }

    fn weight_limit(&self) -> Option<f64> {
        self.bounds.weight_limit
    }
}
