//! Unit registration and registry construction
//!
//! Units are registered explicitly in a catalog: a typed record mapping the
//! unit name to its entry callable, parameter sets and comparison mode.
//! `Registry::build` resolves a listing of candidate names against the
//! catalog once at startup, so a missing entry callable surfaces as a
//! recorded defect at build time instead of a call-time failure. Defective
//! units are skipped; the build itself never fails because of them.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use crate::seed::SeedSource;
use crate::value::Value;
use crate::UnitError;

/// Entry callable of one unit: the opaque surface of the wrapped library.
/// Assumed deterministic given identical parameters and seed state.
pub type EntryFn = fn(&ParameterSet, &mut SeedSource) -> Result<Value, UnitError>;

/// Deviation function for tolerance-mode units: named non-negative scalars
/// measured between the actual result and the fixture.
pub type DeviationFn =
    fn(&Value, &Value) -> Result<BTreeMap<String, f64>, UnitError>;

/// How a unit's results are compared against its fixtures. Exact structural
/// equality and approximate equality are distinct, per-unit choices.
#[derive(Debug, Clone, Copy)]
pub enum CompareMode {
    /// Structural/numeric equality, no implicit tolerance
    Exact,
    /// Named deviations judged against an accuracy threshold
    Tolerance {
        accuracy: f64,
        deviations: DeviationFn,
    },
}

/// One concrete argument tuple for a unit's entry callable
#[derive(Debug, Clone)]
pub struct ParameterSet(Vec<Value>);

impl ParameterSet {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric parameter at the given position
    pub fn real(&self, index: usize) -> Result<f64, UnitError> {
        self.get(index)?
            .as_number()
            .ok_or_else(|| self.type_error(index, "number"))
    }

    /// Integer parameter at the given position
    pub fn int(&self, index: usize) -> Result<i64, UnitError> {
        match self.get(index)? {
            Value::Int(i) => Ok(*i),
            _ => Err(self.type_error(index, "int")),
        }
    }

    /// Text parameter at the given position
    pub fn text(&self, index: usize) -> Result<&str, UnitError> {
        match self.get(index)? {
            Value::Text(t) => Ok(t),
            _ => Err(self.type_error(index, "text")),
        }
    }

    fn get(&self, index: usize) -> Result<&Value, UnitError> {
        self.0.get(index).ok_or(UnitError::Parameter {
            index,
            expected: "a value",
            got: "nothing (parameter set too short)".to_string(),
        })
    }

    fn type_error(&self, index: usize, expected: &'static str) -> UnitError {
        UnitError::Parameter {
            index,
            expected,
            got: self.0[index].kind().to_string(),
        }
    }
}

/// Registered record for one unit, before registry resolution
#[derive(Debug, Clone)]
pub struct RegisteredUnit {
    pub entry: EntryFn,
    pub parameter_sets: Vec<ParameterSet>,
    pub mode: CompareMode,
    /// Present when an optional capability of the wrapped library is
    /// unavailable; such units report SKIPPED, never OK.
    pub skip: Option<String>,
}

/// Catalog of explicitly registered units, keyed by name
#[derive(Debug, Default)]
pub struct UnitCatalog {
    units: BTreeMap<String, RegisteredUnit>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, unit: RegisteredUnit) {
        self.units.insert(name.into(), unit);
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    fn take(&mut self, name: &str) -> Option<RegisteredUnit> {
        self.units.remove(name)
    }
}

/// Authoring defects found while building the registry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryDefect {
    #[error("unit {unit}: no entry callable registered under this name")]
    MissingEntryPoint { unit: String },

    #[error("unit {unit}: empty parameter-set list")]
    NoParameterSets { unit: String },
}

/// Failure of one entry invocation
#[derive(thiserror::Error, Debug)]
pub enum InvokeError {
    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("entry callable panicked: {0}")]
    Panicked(String),
}

/// A resolved, runnable unit
#[derive(Debug, Clone)]
pub struct TestUnit {
    pub name: String,
    entry: EntryFn,
    pub parameter_sets: Vec<ParameterSet>,
    pub mode: CompareMode,
    pub skip: Option<String>,
}

impl TestUnit {
    /// Invoke the entry callable for one parameter set, with a seed source
    /// derived from (base seed, unit name, index). A panic inside the
    /// wrapped library is contained here and reported as a failure of this
    /// pair only.
    pub fn invoke(&self, index: usize, base_seed: u64) -> Result<Value, InvokeError> {
        let params = &self.parameter_sets[index];
        let mut seed = SeedSource::for_pair(base_seed, &self.name, index);
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| (self.entry)(params, &mut seed)));
        match outcome {
            Ok(result) => result.map_err(InvokeError::from),
            Err(payload) => Err(InvokeError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// The validated set of runnable units, in candidate order
#[derive(Debug, Default)]
pub struct Registry {
    units: Vec<TestUnit>,
    defects: Vec<RegistryDefect>,
}

impl Registry {
    /// Resolve candidate names against the catalog. Blacklisted names are
    /// excluded up front; unresolvable or parameterless units are recorded
    /// as defects and skipped.
    pub fn build(mut catalog: UnitCatalog, candidates: &[String], blacklist: &[&str]) -> Self {
        let mut registry = Registry::default();

        for name in candidates {
            if blacklist.contains(&name.as_str()) {
                continue;
            }

            let Some(registered) = catalog.take(name) else {
                registry.defects.push(RegistryDefect::MissingEntryPoint {
                    unit: name.clone(),
                });
                continue;
            };

            if registered.parameter_sets.is_empty() {
                registry
                    .defects
                    .push(RegistryDefect::NoParameterSets { unit: name.clone() });
                continue;
            }

            registry.units.push(TestUnit {
                name: name.clone(),
                entry: registered.entry,
                parameter_sets: registered.parameter_sets,
                mode: registered.mode,
                skip: registered.skip,
            });
        }

        registry
    }

    pub fn units(&self) -> &[TestUnit] {
        &self.units
    }

    pub fn defects(&self) -> &[RegistryDefect] {
        &self.defects
    }

    /// Units whose name contains the filter substring (all units when none)
    pub fn filtered(&self, filter: Option<&str>) -> Vec<&TestUnit> {
        self.units
            .iter()
            .filter(|u| filter.map_or(true, |f| u.name.contains(f)))
            .collect()
    }

    /// Total number of (unit, index) pairs
    pub fn pair_count(&self) -> usize {
        self.units.iter().map(|u| u.parameter_sets.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
