//! Shared test fixtures for probfit crates.
//!
//! - [`model`] - Enumerable propositional log-linear models
//! - [`oracle`] - Exact, sampling, fixed, counting and failing oracles
//! - [`scenarios`] - Canned constraint sets with known outcomes
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! probfit-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use probfit_test::{scenarios, EnumerationOracle};
//! ```

pub mod model;
pub mod oracle;
pub mod scenarios;

pub use model::{PropositionalModel, World};
pub use oracle::{CountingOracle, EnumerationOracle, FailingOracle, FixedOracle, SamplingOracle};
