//! Test utilities for probfit-fitter
//!
//! Re-exports the shared fixtures from probfit-test and adds fitter helpers.

use probfit_config::{FittingConfig, OracleThreadCount};

use crate::driver::Fitter;

pub use probfit_test::{
    scenarios, CountingOracle, EnumerationOracle, FailingOracle, FixedOracle, PropositionalModel,
    SamplingOracle,
};

/// Default options with sequential oracle dispatch, so failure injection
/// sees queries in constraint-set order.
pub fn sequential_config() -> FittingConfig {
    FittingConfig::default().with_oracle_thread_count(OracleThreadCount::None)
}

pub fn fitter(config: FittingConfig) -> Fitter {
    Fitter::new(config).unwrap()
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
