//! Convergence monitoring and threshold relaxation.
//!
//! The monitor is a pure function of the trace: it keeps no state between
//! calls. The threshold active at a step is read back from the record's
//! `threshold_used`.

use probfit_config::{AggregateKind, FittingConfig, MonitorConfig};

use crate::record::IterationRecord;

/// Decision taken after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    pub converged: bool,
    pub should_relax_threshold: bool,
}

/// Decides when fitting has converged and when the threshold may be relaxed.
///
/// # Example
///
/// ```
/// use probfit_config::FittingConfig;
/// use probfit_fitter::monitor::ConvergenceMonitor;
///
/// let monitor = ConvergenceMonitor::from_config(&FittingConfig::new().with_max_threshold(0.05));
/// assert_eq!(monitor.aggregate([0.1, 0.4, 0.2]), 0.4);
/// assert_eq!(monitor.relaxed_threshold(0.001), 0.002);
/// assert_eq!(monitor.relaxed_threshold(0.04), 0.05);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceMonitor {
    aggregate: AggregateKind,
    stall_window: usize,
    min_improvement: f64,
    relax_factor: f64,
    max_threshold: Option<f64>,
}

impl ConvergenceMonitor {
    pub fn new(config: &MonitorConfig, max_threshold: Option<f64>) -> Self {
        Self {
            aggregate: config.aggregate,
            stall_window: config.stall_window.max(1),
            min_improvement: config.min_improvement,
            relax_factor: config.relax_factor,
            max_threshold,
        }
    }

    pub fn from_config(config: &FittingConfig) -> Self {
        Self::new(&config.monitor, config.max_threshold)
    }

    /// Folds per-requirement deviations into the aggregate error.
    pub fn aggregate(&self, deviations: impl IntoIterator<Item = f64>) -> f64 {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max = 0.0f64;
        for deviation in deviations {
            count += 1;
            sum += deviation;
            max = max.max(deviation);
        }
        match self.aggregate {
            AggregateKind::Max => max,
            AggregateKind::Sum => sum,
            AggregateKind::Mean if count == 0 => 0.0,
            AggregateKind::Mean => sum / count as f64,
        }
    }

    /// Convergence test applied to every step.
    pub fn is_converged(&self, aggregate_error: f64, threshold: f64) -> bool {
        aggregate_error < threshold
    }

    /// Evaluates the latest record of `trace`.
    pub fn evaluate(&self, trace: &[IterationRecord]) -> Verdict {
        let Some(latest) = trace.last() else {
            return Verdict::default();
        };

        if self.is_converged(latest.aggregate_error, latest.threshold_used) {
            return Verdict {
                converged: true,
                should_relax_threshold: false,
            };
        }

        let can_relax = self
            .max_threshold
            .is_some_and(|max| latest.threshold_used < max);

        Verdict {
            converged: false,
            should_relax_threshold: can_relax && self.is_stalled(trace),
        }
    }

    /// True when none of the last `stall_window` steps, all run under the
    /// active threshold, improved on the step before them.
    pub fn is_stalled(&self, trace: &[IterationRecord]) -> bool {
        if trace.len() <= self.stall_window {
            return false;
        }
        let Some(latest) = trace.last() else {
            return false;
        };

        let window = &trace[trace.len() - self.stall_window..];
        if window
            .iter()
            .any(|record| record.threshold_used != latest.threshold_used)
        {
            return false;
        }

        let reference = trace[trace.len() - self.stall_window - 1].aggregate_error;
        window
            .iter()
            .all(|record| record.aggregate_error >= reference - self.min_improvement)
    }

    /// Next threshold after a relaxation, never above `max_threshold`.
    pub fn relaxed_threshold(&self, current: f64) -> f64 {
        let relaxed = current * self.relax_factor;
        match self.max_threshold {
            Some(max) => relaxed.min(max),
            None => current,
        }
    }

    pub fn max_threshold(&self) -> Option<f64> {
        self.max_threshold
    }
}

#[cfg(test)]
mod tests;
