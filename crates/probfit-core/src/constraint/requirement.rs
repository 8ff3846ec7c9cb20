//! A single posterior-probability requirement.

use std::fmt;

use crate::error::ValidationError;
use crate::evidence::Evidence;
use crate::formula::{FormulaId, FormulaRef};

/// Position of a requirement in its constraint set.
///
/// Also the order in which greedy fitting visits requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequirementId(pub usize);

impl RequirementId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Requires `P(query | evidence) = target`.
///
/// Immutable once constructed.
///
/// # Example
///
/// ```
/// use probfit_core::{Evidence, ProbabilityRequirement};
///
/// let req = ProbabilityRequirement::new(
///     "cancer(anna)",
///     Evidence::new().with("smokes(anna)", true),
///     0.7,
/// ).unwrap();
/// assert_eq!(req.target(), 0.7);
///
/// assert!(ProbabilityRequirement::unconditional("cancer(anna)", 1.5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRequirement {
    formula: FormulaRef,
    evidence: Evidence,
    target: f64,
}

impl ProbabilityRequirement {
    /// Creates a requirement, rejecting targets outside `[0, 1]`.
    pub fn new(
        formula: impl Into<FormulaRef>,
        evidence: Evidence,
        target: f64,
    ) -> Result<Self, ValidationError> {
        check_target(target, None)?;
        Ok(Self {
            formula: formula.into(),
            evidence,
            target,
        })
    }

    /// A requirement on the prior probability of `formula`.
    pub fn unconditional(
        formula: impl Into<FormulaRef>,
        target: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(formula, Evidence::new(), target)
    }

    pub fn formula(&self) -> &FormulaRef {
        &self.formula
    }

    pub fn query(&self) -> &FormulaId {
        self.formula.query()
    }

    pub fn driven(&self) -> &[FormulaId] {
        self.formula.driven()
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

impl fmt::Display for ProbabilityRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.evidence.is_empty() {
            write!(f, "P({}) = {}", self.query(), self.target)
        } else {
            write!(f, "P({} | {}) = {}", self.query(), self.evidence, self.target)
        }
    }
}

pub(super) fn check_target(
    target: f64,
    requirement: Option<RequirementId>,
) -> Result<(), ValidationError> {
    // NaN fails the range check as well.
    if (0.0..=1.0).contains(&target) {
        Ok(())
    } else {
        Err(ValidationError::TargetOutOfRange {
            requirement,
            target,
        })
    }
}
