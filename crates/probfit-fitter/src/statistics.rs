//! Fitting statistics collection and reporting.
//!
//! Counts oracle calls, applied corrections, degenerate skips and threshold
//! relaxations during a run, and records every improvement of the best
//! aggregate error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Record of a best-aggregate-error improvement.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorImprovement {
    /// Time since fitting started when the improvement occurred.
    pub time_offset: Duration,
    /// Step that produced the improvement.
    pub step: u64,
    /// The new best aggregate error.
    pub aggregate_error: f64,
}

/// Statistics of a complete fitting run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FittingStatistics {
    /// Wall-clock time of the run.
    pub total_duration: Duration,
    pub step_count: u64,
    /// Posterior queries issued to the oracle, including failed ones.
    pub oracle_calls: u64,
    /// Requirements whose correction was applied, summed over steps.
    pub corrections_applied: u64,
    /// Requirements skipped because the measured probability was degenerate.
    pub degenerate_skips: u64,
    pub threshold_relaxations: u64,
    /// History of best-aggregate-error improvements.
    pub error_history: Vec<ErrorImprovement>,
}

impl FittingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the best aggregate error reached (last in history, or None).
    pub fn best_aggregate_error(&self) -> Option<f64> {
        self.error_history.last().map(|i| i.aggregate_error)
    }

    pub fn improvement_count(&self) -> usize {
        self.error_history.len()
    }

    /// Returns the average time per step.
    pub fn avg_time_per_step(&self) -> Duration {
        match u32::try_from(self.step_count) {
            Ok(0) => Duration::ZERO,
            Ok(steps) => self.total_duration / steps,
            Err(_) => Duration::ZERO,
        }
    }
}

/// Thread-safe collector for fitting statistics.
///
/// Shared across oracle worker threads during a batch step. Call
/// `snapshot()` to read the statistics without consuming the collector.
#[derive(Debug)]
pub struct StatisticsCollector {
    start_time: Instant,
    step_count: AtomicU64,
    oracle_calls: AtomicU64,
    corrections_applied: AtomicU64,
    degenerate_skips: AtomicU64,
    threshold_relaxations: AtomicU64,
    error_history: Mutex<Vec<ErrorImprovement>>,
}

impl StatisticsCollector {
    /// Creates a new collector. The start time is recorded when this is called.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            step_count: AtomicU64::new(0),
            oracle_calls: AtomicU64::new(0),
            corrections_applied: AtomicU64::new(0),
            degenerate_skips: AtomicU64::new(0),
            threshold_relaxations: AtomicU64::new(0),
            error_history: Mutex::new(Vec::new()),
        }
    }

    pub fn record_step(&self) {
        self.step_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oracle_call(&self) {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_correction(&self) {
        self.corrections_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degenerate(&self) {
        self.degenerate_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relaxation(&self) {
        self.threshold_relaxations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a new best aggregate error.
    pub fn record_improvement(&self, step: u64, aggregate_error: f64) {
        let improvement = ErrorImprovement {
            time_offset: self.start_time.elapsed(),
            step,
            aggregate_error,
        };
        if let Ok(mut history) = self.error_history.lock() {
            history.push(improvement);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn current_step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    pub fn current_oracle_calls(&self) -> u64 {
        self.oracle_calls.load(Ordering::Relaxed)
    }

    pub fn current_corrections_applied(&self) -> u64 {
        self.corrections_applied.load(Ordering::Relaxed)
    }

    pub fn current_degenerate_skips(&self) -> u64 {
        self.degenerate_skips.load(Ordering::Relaxed)
    }

    pub fn current_threshold_relaxations(&self) -> u64 {
        self.threshold_relaxations.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of current statistics without consuming the collector.
    pub fn snapshot(&self) -> FittingStatistics {
        let error_history = match self.error_history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        FittingStatistics {
            total_duration: self.start_time.elapsed(),
            step_count: self.current_step_count(),
            oracle_calls: self.current_oracle_calls(),
            corrections_applied: self.current_corrections_applied(),
            degenerate_skips: self.current_degenerate_skips(),
            threshold_relaxations: self.current_threshold_relaxations(),
            error_history,
        }
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_counters() {
        let collector = StatisticsCollector::new();

        collector.record_step();
        collector.record_step();
        collector.record_oracle_call();
        collector.record_oracle_call();
        collector.record_oracle_call();
        collector.record_correction();
        collector.record_degenerate();
        collector.record_relaxation();

        let stats = collector.snapshot();
        assert_eq!(stats.step_count, 2);
        assert_eq!(stats.oracle_calls, 3);
        assert_eq!(stats.corrections_applied, 1);
        assert_eq!(stats.degenerate_skips, 1);
        assert_eq!(stats.threshold_relaxations, 1);
    }

    #[test]
    fn test_collector_record_improvement() {
        let collector = StatisticsCollector::new();

        collector.record_improvement(0, 0.4);
        collector.record_improvement(1, 0.1);
        collector.record_improvement(4, 0.01);

        let stats = collector.snapshot();
        assert_eq!(stats.improvement_count(), 3);
        assert_eq!(stats.best_aggregate_error(), Some(0.01));
        assert_eq!(stats.error_history[2].step, 4);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = FittingStatistics::new();
        assert_eq!(stats.best_aggregate_error(), None);
        assert_eq!(stats.avg_time_per_step(), Duration::ZERO);
    }

    #[test]
    fn test_avg_time_per_step() {
        let stats = FittingStatistics {
            total_duration: Duration::from_millis(100),
            step_count: 4,
            ..FittingStatistics::default()
        };
        assert_eq!(stats.avg_time_per_step(), Duration::from_millis(25));
    }

    #[test]
    fn test_collector_is_shared_across_threads() {
        let collector = StatisticsCollector::new();

        rayon::scope(|s| {
            for _ in 0..8 {
                s.spawn(|_| {
                    for _ in 0..100 {
                        collector.record_oracle_call();
                    }
                });
            }
        });

        assert_eq!(collector.current_oracle_calls(), 800);
    }
}
