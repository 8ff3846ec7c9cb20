//! probfit Fitting Engine
//!
//! This crate provides the IPFP-M fitting loop including:
//! - Fitter (batch and greedy update disciplines)
//! - Weight adjusters (log-ratio and log-odds corrections)
//! - Convergence monitor with stall-triggered threshold relaxation
//! - Iteration records and fitting results
//! - Event listeners and statistics for monitoring
//! - Oracle registry for configuration-selected inference methods
//! - Configuration wiring (builder module)

pub mod adjuster;
pub mod builder;
pub mod driver;
pub mod event;
pub mod monitor;
pub mod record;
pub mod registry;
pub mod scope;
pub mod statistics;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adjuster::{LogOddsAdjuster, LogRatioAdjuster, WeightAdjuster, WeightDelta};
pub use builder::{AdjusterBuilder, MonitorBuilder};
pub use driver::{checked_posterior, Fitter, FittingResult, TerminationReason, UpdateMode};
pub use event::{ChannelListener, CountingListener, FittingEventSupport, FittingListener};
pub use monitor::{ConvergenceMonitor, Verdict};
pub use record::{ConstraintError, IterationRecord, UpdateStatus};
pub use registry::OracleRegistry;
pub use scope::{FittingScope, StepScope};
pub use statistics::{ErrorImprovement, FittingStatistics, StatisticsCollector};
