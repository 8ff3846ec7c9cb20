//! Step-level scope.

use probfit_core::WeightVector;

/// State of a single fitting step.
#[derive(Debug, Clone)]
pub struct StepScope {
    index: u64,
    threshold: f64,
    snapshot: WeightVector,
}

impl StepScope {
    pub fn new(index: u64, threshold: f64, snapshot: WeightVector) -> Self {
        Self {
            index,
            threshold,
            snapshot,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Threshold active when the step began.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Weights as they were when the step began.
    pub fn snapshot(&self) -> &WeightVector {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> WeightVector {
        self.snapshot
    }
}
