//! Probability requirements and the validated constraint set.

mod requirement;
mod set;

pub use requirement::{ProbabilityRequirement, RequirementId};
pub use set::ConstraintSet;

#[cfg(test)]
mod tests;
