//! Tests for scope types.

use super::*;
use crate::record::IterationRecord;
use probfit_core::WeightVector;

fn record(step: u64, aggregate_error: f64) -> IterationRecord {
    IterationRecord {
        step,
        errors: Vec::new(),
        aggregate_error,
        threshold_used: 0.01,
        accepted: false,
    }
}

#[test]
fn test_fitting_scope_new() {
    let mut weights = WeightVector::new().with("a", 1.0);
    let scope = FittingScope::new(&mut weights, 0.01);

    assert_eq!(scope.threshold(), 0.01);
    assert_eq!(scope.step_count(), 0);
    assert!(scope.trace().is_empty());
    assert!(scope.best_weights().is_none());
    assert!(scope.elapsed().is_none());
}

#[test]
fn test_begin_step_snapshots_weights() {
    let mut weights = WeightVector::new().with("a", 1.0);
    let mut scope = FittingScope::new(&mut weights, 0.01);

    let step = scope.begin_step();
    scope.weights_mut().insert("a", 2.0);

    assert_eq!(step.index(), 0);
    assert_eq!(step.threshold(), 0.01);
    assert_eq!(step.snapshot().get("a"), Some(1.0));
    assert_eq!(scope.weights().get("a"), Some(2.0));
}

#[test]
fn test_complete_step_tracks_best() {
    let mut weights = WeightVector::new().with("a", 0.0);
    let mut scope = FittingScope::new(&mut weights, 0.01);
    scope.start_fitting();

    let step = scope.begin_step();
    scope.weights_mut().insert("a", 1.0);
    assert!(scope.complete_step(step, record(0, 0.5)).accepted);

    let step = scope.begin_step();
    scope.weights_mut().insert("a", 2.0);
    assert!(scope.complete_step(step, record(1, 0.2)).accepted);

    let step = scope.begin_step();
    scope.weights_mut().insert("a", 3.0);
    assert!(!scope.complete_step(step, record(2, 0.2)).accepted);

    assert_eq!(scope.step_count(), 3);
    assert_eq!(scope.best_aggregate_error(), Some(0.2));
    assert_eq!(scope.best_record().map(|r| r.step), Some(1));
    assert_eq!(scope.best_weights().and_then(|w| w.get("a")), Some(1.0));
    assert_eq!(scope.statistics().snapshot().improvement_count(), 2);
    assert_eq!(scope.statistics().current_step_count(), 3);
}

#[test]
fn test_restore_best_overwrites_callers_weights() {
    let mut weights = WeightVector::new().with("a", 0.0);
    {
        let mut scope = FittingScope::new(&mut weights, 0.01);
        assert!(!scope.restore_best());

        let step = scope.begin_step();
        scope.weights_mut().insert("a", 5.0);
        scope.complete_step(step, record(0, 0.3));

        let step = scope.begin_step();
        scope.weights_mut().insert("a", 9.0);
        scope.complete_step(step, record(1, 0.4));

        assert!(scope.restore_best());
    }
    assert_eq!(weights.get("a"), Some(0.0));
}

#[test]
fn test_set_threshold() {
    let mut weights = WeightVector::new();
    let mut scope = FittingScope::new(&mut weights, 0.01);
    scope.set_threshold(0.02);
    assert_eq!(scope.begin_step().threshold(), 0.02);
}
