//! Iteration records of a fitting run.

use probfit_core::RequirementId;

/// What happened to one requirement's weights during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateStatus {
    /// A correction was applied to the driven weights.
    Applied { correction: f64 },

    /// Greedy step: the deviation was already below the active threshold.
    WithinThreshold,

    /// The measured probability admitted no correction; skipped this step.
    Degenerate,

    /// The step converged before corrections were applied.
    NotApplied,
}

impl UpdateStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Measured-versus-target error of one requirement in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintError {
    pub requirement: RequirementId,
    pub measured: f64,
    pub target: f64,
    /// `|measured - target|`
    pub deviation: f64,
    pub update: UpdateStatus,
}

impl ConstraintError {
    pub fn new(requirement: RequirementId, measured: f64, target: f64) -> Self {
        Self {
            requirement,
            measured,
            target,
            deviation: (measured - target).abs(),
            update: UpdateStatus::NotApplied,
        }
    }

    /// Signed residual `measured - target`.
    pub fn residual(&self) -> f64 {
        self.measured - self.target
    }
}

/// Diagnostics of one fitting step. Never modified once appended to the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    /// Zero-based step index.
    pub step: u64,
    /// One entry per requirement, in constraint-set order.
    pub errors: Vec<ConstraintError>,
    pub aggregate_error: f64,
    /// Threshold that was active during this step.
    pub threshold_used: f64,
    /// Whether this step improved on the best aggregate error so far.
    pub accepted: bool,
}

impl IterationRecord {
    pub fn residuals(&self) -> Vec<f64> {
        self.errors.iter().map(ConstraintError::residual).collect()
    }

    pub fn applied_count(&self) -> usize {
        self.errors.iter().filter(|e| e.update.is_applied()).count()
    }

    pub fn degenerate_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.update == UpdateStatus::Degenerate)
            .count()
    }
}
