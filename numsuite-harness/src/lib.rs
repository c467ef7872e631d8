//! # Numsuite Test Framework
//!
//! A fixture-based regression harness for heterogeneous numeric algorithm
//! units. Each unit invokes one algorithm configuration of the wrapped
//! numerical library and returns a result value; the harness snapshots those
//! results as golden fixtures and detects behavioral drift on later runs
//! without hand-written assertions per unit.
//!
//! ## Architecture
//!
//! The framework is organized into several modules:
//! - `registry`: unit catalog, explicit registration and validation
//! - `generate`: fixture generation (snapshot capture)
//! - `store`: on-disk fixture storage keyed by (unit, setting index)
//! - `compare`: exact structural/numeric comparison with diff output
//! - `tolerance`: named-deviation aggregation against accuracy thresholds
//! - `runner`: per-pair test execution with failure isolation
//! - `reporting`: result reporting and statistics
//! - `config`: command-line configuration
//! - `seed`: explicit, per-pair deterministic random sources

pub mod compare;
pub mod config;
pub mod generate;
pub mod harness;
pub mod registry;
pub mod reporting;
pub mod runner;
pub mod seed;
pub mod store;
pub mod tolerance;
pub mod value;

// Re-exports for easier access
pub use compare::{equal, Comparison, ValueComparator};
pub use config::{Cli, Command};
pub use generate::{FixtureGenerator, GenerationFailure, GenerationSummary};
pub use harness::Harness;
pub use registry::{
    CompareMode, DeviationFn, EntryFn, InvokeError, ParameterSet, RegisteredUnit, Registry,
    RegistryDefect, TestUnit, UnitCatalog,
};
pub use reporting::{RunReport, RunStatistics};
pub use runner::{Outcome, PairResult, SuiteRunner};
pub use seed::SeedSource;
pub use store::{FixtureStore, StoreError};
pub use tolerance::{check_accuracy, max_abs_deviations, ToleranceReport};
pub use value::{NumArray, ShapeError, Value};

/// Current version of the test framework
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level framework errors
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] indicatif::style::TemplateError),
}

/// Errors raised by unit code itself: parameter access, deviation
/// computation, or the wrapped library refusing a configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("parameter {index}: expected {expected}, got {got}")]
    Parameter {
        index: usize,
        expected: &'static str,
        got: String,
    },

    #[error("values differ in structure at {path}: {detail}")]
    Structure { path: String, detail: String },

    #[error("{0}")]
    Failed(String),
}
