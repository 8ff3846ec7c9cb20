//! Damping and caps shared by all proportional corrections.

use smallvec::SmallVec;

use probfit_config::AdjusterConfig;
use probfit_core::{FormulaId, ProbabilityRequirement, WeightVector};

use super::WeightDelta;

/// Bounds applied to a raw correction before it reaches the weights.
///
/// Boundary targets (`0` or `1`) produce infinite raw corrections;
/// `max_step` turns them into a finite push per step and `weight_limit`
/// keeps the weights themselves finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionBounds {
    pub damping: f64,
    pub max_step: f64,
    pub weight_limit: Option<f64>,
}

impl Default for CorrectionBounds {
    fn default() -> Self {
        Self::from_config(&AdjusterConfig::default())
    }
}

impl CorrectionBounds {
    pub fn from_config(config: &AdjusterConfig) -> Self {
        Self {
            damping: config.damping,
            max_step: config.max_step,
            weight_limit: config.weight_limit,
        }
    }

    /// Damps and caps `raw`, then splits it evenly across the driven formulas.
    pub fn distribute(
        &self,
        requirement: &ProbabilityRequirement,
        raw: f64,
        weights: &WeightVector,
    ) -> WeightDelta {
        let correction = (raw * self.damping).clamp(-self.max_step, self.max_step);
        let driven = requirement.driven();
        let share = correction / driven.len() as f64;

        let changes: SmallVec<[(FormulaId, f64); 2]> = driven
            .iter()
            .map(|formula| {
                let current = weights.get(formula.as_str()).unwrap_or(0.0);
                let delta = match self.weight_limit {
                    Some(limit) => (current + share).clamp(-limit, limit) - current,
                    None => share,
                };
                (formula.clone(), delta)
            })
            .collect();

        WeightDelta::new(correction, changes)
    }
}
