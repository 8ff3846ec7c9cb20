//! Tests for the convergence monitor.

use super::*;
use probfit_config::{AggregateKind, MonitorConfig};

fn record(step: u64, aggregate_error: f64, threshold_used: f64) -> IterationRecord {
    IterationRecord {
        step,
        errors: Vec::new(),
        aggregate_error,
        threshold_used,
        accepted: false,
    }
}

fn monitor(max_threshold: Option<f64>) -> ConvergenceMonitor {
    ConvergenceMonitor::new(&MonitorConfig::default(), max_threshold)
}

#[test]
fn test_empty_trace_neither_converges_nor_relaxes() {
    assert_eq!(monitor(Some(0.1)).evaluate(&[]), Verdict::default());
}

#[test]
fn test_converges_below_active_threshold() {
    let trace = vec![record(0, 0.5, 0.01), record(1, 0.009, 0.01)];
    let verdict = monitor(None).evaluate(&trace);
    assert!(verdict.converged);
    assert!(!verdict.should_relax_threshold);
}

#[test]
fn test_error_equal_to_threshold_is_not_converged() {
    let trace = vec![record(0, 0.01, 0.01)];
    assert!(!monitor(None).evaluate(&trace).converged);
}

#[test]
fn test_stall_triggers_relaxation_only_with_max_threshold() {
    let trace = vec![
        record(0, 0.4, 0.001),
        record(1, 0.4, 0.001),
        record(2, 0.41, 0.001),
        record(3, 0.4, 0.001),
    ];
    assert!(monitor(None).is_stalled(&trace));
    assert!(!monitor(None).evaluate(&trace).should_relax_threshold);

    let verdict = monitor(Some(0.05)).evaluate(&trace);
    assert!(!verdict.converged);
    assert!(verdict.should_relax_threshold);
}

#[test]
fn test_short_trace_is_not_stalled() {
    let trace = vec![record(0, 0.4, 0.001), record(1, 0.4, 0.001), record(2, 0.4, 0.001)];
    assert!(!monitor(Some(0.05)).is_stalled(&trace));
}

#[test]
fn test_improvement_within_window_prevents_stall() {
    let trace = vec![
        record(0, 0.4, 0.001),
        record(1, 0.4, 0.001),
        record(2, 0.39, 0.001),
        record(3, 0.4, 0.001),
    ];
    assert!(!monitor(Some(0.05)).evaluate(&trace).should_relax_threshold);
}

#[test]
fn test_min_improvement_counts_small_gains_as_stall() {
    let config = MonitorConfig {
        min_improvement: 0.05,
        ..MonitorConfig::default()
    };
    let monitor = ConvergenceMonitor::new(&config, Some(0.1));
    let trace = vec![
        record(0, 0.40, 0.001),
        record(1, 0.39, 0.001),
        record(2, 0.38, 0.001),
        record(3, 0.37, 0.001),
    ];
    assert!(monitor.is_stalled(&trace));
}

#[test]
fn test_window_must_run_under_active_threshold() {
    // Relaxed at step 2: the window [1, 2, 3] mixes thresholds.
    let trace = vec![
        record(0, 0.4, 0.001),
        record(1, 0.4, 0.001),
        record(2, 0.4, 0.002),
        record(3, 0.4, 0.002),
    ];
    assert!(!monitor(Some(0.05)).is_stalled(&trace));
}

#[test]
fn test_no_relaxation_once_max_threshold_reached() {
    let trace = vec![
        record(0, 0.4, 0.05),
        record(1, 0.4, 0.05),
        record(2, 0.4, 0.05),
        record(3, 0.4, 0.05),
    ];
    let verdict = monitor(Some(0.05)).evaluate(&trace);
    assert!(!verdict.converged);
    assert!(!verdict.should_relax_threshold);
}

#[test]
fn test_relaxed_threshold_is_capped() {
    let monitor = monitor(Some(0.05));
    assert_eq!(monitor.relaxed_threshold(0.01), 0.02);
    assert_eq!(monitor.relaxed_threshold(0.03), 0.05);
    assert_eq!(self::monitor(None).relaxed_threshold(0.01), 0.01);
}

#[test]
fn test_aggregate_policies() {
    let deviations = [0.1, 0.3, 0.2];
    let with = |aggregate| {
        ConvergenceMonitor::new(
            &MonitorConfig {
                aggregate,
                ..MonitorConfig::default()
            },
            None,
        )
    };
    assert_eq!(with(AggregateKind::Max).aggregate(deviations), 0.3);
    assert!((with(AggregateKind::Sum).aggregate(deviations) - 0.6).abs() < 1e-12);
    assert!((with(AggregateKind::Mean).aggregate(deviations) - 0.2).abs() < 1e-12);
    assert_eq!(with(AggregateKind::Mean).aggregate([]), 0.0);
}
