//! Run-level scope.

use std::sync::Arc;
use std::time::{Duration, Instant};

use probfit_core::WeightVector;

use crate::record::IterationRecord;
use crate::statistics::StatisticsCollector;

use super::StepScope;

/// Top-level scope for one fitting run.
///
/// Borrows the caller's weights mutably for the whole run; the weights are
/// updated in place and, on a non-converged exit, replaced with the best
/// snapshot.
pub struct FittingScope<'w> {
    weights: &'w mut WeightVector,
    threshold: f64,
    trace: Vec<IterationRecord>,
    best_weights: Option<WeightVector>,
    best_aggregate: Option<f64>,
    best_record: Option<usize>,
    start_time: Option<Instant>,
    statistics: Arc<StatisticsCollector>,
}

impl<'w> FittingScope<'w> {
    pub fn new(weights: &'w mut WeightVector, threshold: f64) -> Self {
        Self {
            weights,
            threshold,
            trace: Vec::new(),
            best_weights: None,
            best_aggregate: None,
            best_record: None,
            start_time: None,
            statistics: Arc::new(StatisticsCollector::new()),
        }
    }

    pub fn statistics(&self) -> &Arc<StatisticsCollector> {
        &self.statistics
    }

    pub fn start_fitting(&mut self) {
        self.start_time = Some(Instant::now());
        self.trace.clear();
        self.best_weights = None;
        self.best_aggregate = None;
        self.best_record = None;
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }

    pub fn weights(&self) -> &WeightVector {
        self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightVector {
        self.weights
    }

    /// Active convergence threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Steps recorded so far; also the index of the next step.
    pub fn step_count(&self) -> u64 {
        self.trace.len() as u64
    }

    pub fn trace(&self) -> &[IterationRecord] {
        &self.trace
    }

    /// Opens the next step, snapshotting the current weights.
    pub fn begin_step(&self) -> StepScope {
        StepScope::new(self.step_count(), self.threshold, self.weights.clone())
    }

    /// Closes `step` by appending `record` to the trace.
    ///
    /// The record is accepted when its aggregate error is strictly below
    /// the best so far; the step's starting weights then become the best
    /// snapshot. Returns the appended record.
    pub fn complete_step(&mut self, step: StepScope, mut record: IterationRecord) -> &IterationRecord {
        let improved = self
            .best_aggregate
            .map_or(true, |best| record.aggregate_error < best);
        record.accepted = improved;

        if improved {
            self.best_aggregate = Some(record.aggregate_error);
            self.best_record = Some(self.trace.len());
            self.best_weights = Some(step.into_snapshot());
            self.statistics
                .record_improvement(record.step, record.aggregate_error);
        }

        self.statistics.record_step();
        self.trace.push(record);
        &self.trace[self.trace.len() - 1]
    }

    pub fn best_aggregate_error(&self) -> Option<f64> {
        self.best_aggregate
    }

    pub fn best_record(&self) -> Option<&IterationRecord> {
        self.best_record.and_then(|i| self.trace.get(i))
    }

    pub fn best_weights(&self) -> Option<&WeightVector> {
        self.best_weights.as_ref()
    }

    /// Replaces the working weights with the best snapshot, if any.
    pub fn restore_best(&mut self) -> bool {
        match &self.best_weights {
            Some(best) => {
                self.weights.clone_from(best);
                true
            }
            None => false,
        }
    }

    pub fn into_trace(self) -> Vec<IterationRecord> {
        self.trace
    }
}
