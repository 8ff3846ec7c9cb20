//! Builder module for constructing fitting components from configuration
//!
//! This module provides the wiring between configuration types and
//! the fitting implementation.

use probfit_config::{AdjusterConfig, CorrectionKind, FittingConfig};

use crate::adjuster::{LogOddsAdjuster, LogRatioAdjuster, WeightAdjuster};
use crate::monitor::ConvergenceMonitor;

/// Builder for constructing weight adjusters from configuration.
pub struct AdjusterBuilder;

impl AdjusterBuilder {
    /// Builds an adjuster from configuration.
    pub fn build(config: &AdjusterConfig) -> Box<dyn WeightAdjuster> {
        match config.correction {
            CorrectionKind::LogRatio => Box::new(LogRatioAdjuster::from_config(config)),
            CorrectionKind::LogOdds => Box::new(LogOddsAdjuster::from_config(config)),
        }
    }

    /// Creates a log-ratio adjuster with default bounds.
    pub fn log_ratio() -> LogRatioAdjuster {
        LogRatioAdjuster::default()
    }

    /// Creates a log-odds adjuster with default bounds.
    pub fn log_odds() -> LogOddsAdjuster {
        LogOddsAdjuster::default()
    }
}

/// Builder for the convergence monitor.
pub struct MonitorBuilder;

impl MonitorBuilder {
    pub fn build(config: &FittingConfig) -> ConvergenceMonitor {
        ConvergenceMonitor::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probfit_core::{ProbabilityRequirement, RequirementId, WeightVector};

    fn correction(adjuster: &dyn WeightAdjuster) -> f64 {
        let req = ProbabilityRequirement::unconditional("a", 0.8).unwrap();
        adjuster
            .adjust(RequirementId(0), &req, 0.5, &WeightVector::new().with("a", 0.0))
            .unwrap()
            .correction()
    }

    #[test]
    fn test_build_log_ratio_by_default() {
        let adjuster = AdjusterBuilder::build(&AdjusterConfig::default());
        assert!((correction(adjuster.as_ref()) - 1.6f64.ln()).abs() < 1e-12);
        assert_eq!(adjuster.weight_limit(), Some(30.0));
    }

    #[test]
    fn test_build_log_odds() {
        let config = AdjusterConfig {
            correction: CorrectionKind::LogOdds,
            weight_limit: None,
            ..AdjusterConfig::default()
        };
        let adjuster = AdjusterBuilder::build(&config);
        assert!((correction(adjuster.as_ref()) - 4f64.ln()).abs() < 1e-12);
        assert_eq!(adjuster.weight_limit(), None);
    }

    #[test]
    fn test_build_monitor_carries_max_threshold() {
        let config = FittingConfig::new().with_max_threshold(0.2);
        assert_eq!(MonitorBuilder::build(&config).max_threshold(), Some(0.2));
    }
}
