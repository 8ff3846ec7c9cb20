//! Scope hierarchy for a fitting run.
//!
//! - [`FittingScope`]: Top-level, holds the caller's weights, the trace and
//!   the best weights seen so far
//! - [`StepScope`]: Per-step state

mod fitting;
mod step;

pub use fitting::FittingScope;
pub use step::StepScope;

#[cfg(test)]
mod tests;
