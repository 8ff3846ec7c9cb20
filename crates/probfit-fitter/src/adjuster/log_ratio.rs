//! Log-ratio (classic IPFP) correction.

use probfit_config::AdjusterConfig;
use probfit_core::{
    DegenerateProbabilityError, ProbabilityRequirement, RequirementId, WeightVector,
};

use super::{CorrectionBounds, WeightAdjuster, WeightDelta};

/// Adds `ln(target / measured)` to the driven weights.
///
/// This is the proportional-fitting scaling: multiplying the potential of
/// a formula by `t / p`. A measured probability of zero cannot be scaled
/// and is reported as degenerate; a target of zero yields `-inf`, which the
/// bounds cap at `-max_step`.
///
/// # Example
///
/// ```
/// use probfit_fitter::adjuster::{LogRatioAdjuster, WeightAdjuster};
/// use probfit_core::{ProbabilityRequirement, RequirementId, WeightVector};
///
/// let adjuster = LogRatioAdjuster::default();
/// let req = ProbabilityRequirement::unconditional("a", 0.8).unwrap();
/// let weights = WeightVector::new().with("a", 0.0);
///
/// let delta = adjuster.adjust(RequirementId(0), &req, 0.4, &weights).unwrap();
/// assert!((delta.correction() - 2f64.ln()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogRatioAdjuster {
    bounds: CorrectionBounds,
}

impl LogRatioAdjuster {
    pub fn new(bounds: CorrectionBounds) -> Self {
        Self { bounds }
    }

    pub fn from_config(config: &AdjusterConfig) -> Self {
        Self::new(CorrectionBounds::from_config(config))
    }
}

impl WeightAdjuster for LogRatioAdjuster {
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
        if !(measured > 0.0 && measured.is_finite()) {
            return Err(DegenerateProbabilityError {
                requirement: id,
                measured,
                target,
            });
        }

        let raw = (target / measured).ln();
        Ok(self.bounds.distribute(requirement, raw, weights))
    }

    fn weight_limit(&self) -> Option<f64> {
        self.bounds.weight_limit
    }
}
