//! Per-pair test execution
//!
//! The runner iterates every (unit, setting index) pair sequentially,
//! invokes the entry, reads the matching fixture and applies the unit's
//! declared comparison. Each pair reaches exactly one terminal outcome;
//! an entry panic, a unit error, or a missing fixture is contained at the
//! per-pair boundary and never aborts processing of the remaining pairs.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::compare::ValueComparator;
use crate::registry::{CompareMode, TestUnit};
use crate::reporting::RunReport;
use crate::store::FixtureStore;
use crate::tolerance::check_accuracy;

/// Terminal verdict for one (unit, setting index) pair.
///
/// `Errored` means the entry callable itself failed (or its fixture was
/// unreadable); `Failed` means invocation succeeded but the comparison or
/// tolerance check did not. Both are terminal; there are no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
    Errored,
    Skipped,
}

impl Outcome {
    /// Word printed on the per-pair output line
    pub fn word(&self) -> &'static str {
        match self {
            Outcome::Passed => "OK",
            Outcome::Failed | Outcome::Errored => "ERROR",
            Outcome::Skipped => "SKIPPED",
        }
    }

    /// Skipped pairs are not OK, but they do not fail the run either
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Result of running a single pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairResult {
    pub unit: String,
    pub index: usize,
    pub outcome: Outcome,
    /// Diff, offending metrics, error cause, or skip reason
    pub detail: Option<String>,
    pub duration: Duration,
}

impl PairResult {
    fn terminal(unit: &TestUnit, index: usize, outcome: Outcome, detail: Option<String>) -> Self {
        Self {
            unit: unit.name.clone(),
            index,
            outcome,
            detail,
            duration: Duration::ZERO,
        }
    }

    pub fn passed(unit: &TestUnit, index: usize) -> Self {
        Self::terminal(unit, index, Outcome::Passed, None)
    }

    pub fn failed(unit: &TestUnit, index: usize, detail: String) -> Self {
        Self::terminal(unit, index, Outcome::Failed, Some(detail))
    }

    pub fn errored(unit: &TestUnit, index: usize, cause: String) -> Self {
        Self::terminal(unit, index, Outcome::Errored, Some(cause))
    }

    pub fn skipped(unit: &TestUnit, index: usize, reason: String) -> Self {
        Self::terminal(unit, index, Outcome::Skipped, Some(reason))
    }

    /// Pair identity as printed in reports: `<unit> setting <index>`
    pub fn identity(&self) -> String {
        format!("{} setting {}", self.unit, self.index)
    }
}

/// Sequential test runner over a fixture store
pub struct SuiteRunner<'a> {
    store: &'a FixtureStore,
    base_seed: u64,
    quiet: bool,
    comparator: ValueComparator,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(store: &'a FixtureStore, base_seed: u64) -> Self {
        Self {
            store,
            base_seed,
            quiet: false,
            comparator: ValueComparator::new(),
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run every pair of the given units, printing one line per pair
    pub fn run(&self, units: &[&TestUnit]) -> RunReport {
        let start = Instant::now();
        let mut results = Vec::new();

        for unit in units {
            for index in 0..unit.parameter_sets.len() {
                let result = self.run_pair(unit, index);
                if !self.quiet {
                    println!("{} {}", result.identity(), result.outcome.word());
                }
                results.push(result);
            }
        }

        RunReport::from_results(results, start.elapsed())
    }

    /// One pair: NOT_RUN -> RUNNING -> terminal outcome
    fn run_pair(&self, unit: &TestUnit, index: usize) -> PairResult {
        let start = Instant::now();

        if let Some(reason) = &unit.skip {
            return PairResult::skipped(unit, index, reason.clone());
        }

        let actual = match unit.invoke(index, self.base_seed) {
            Ok(value) => value,
            Err(cause) => {
                let mut r = PairResult::errored(unit, index, cause.to_string());
                r.duration = start.elapsed();
                return r;
            }
        };

        let fixture = match self.store.read(&unit.name, index) {
            Ok(value) => value,
            // A missing or unreadable fixture is an error of this pair,
            // never a silent skip or pass.
            Err(e) => {
                let mut r = PairResult::errored(unit, index, e.to_string());
                r.duration = start.elapsed();
                return r;
            }
        };

        let mut result = match &unit.mode {
            CompareMode::Exact => {
                let comparison = self.comparator.compare(&fixture, &actual);
                if comparison.matches() {
                    PairResult::passed(unit, index)
                } else {
                    PairResult::failed(unit, index, comparison.diff)
                }
            }
            CompareMode::Tolerance {
                accuracy,
                deviations,
            } => match deviations(&actual, &fixture) {
                Ok(measured) => {
                    let report = check_accuracy(*accuracy, measured);
                    if report.passed() {
                        PairResult::passed(unit, index)
                    } else {
                        PairResult::failed(unit, index, report.describe())
                    }
                }
                // Invocation succeeded; the results just disagree in
                // structure. That is a comparison failure, not an error.
                Err(e) => PairResult::failed(unit, index, e.to_string()),
            },
        };

        result.duration = start.elapsed();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{
        CompareMode, EntryFn, ParameterSet, RegisteredUnit, Registry, UnitCatalog,
    };
    use crate::seed::SeedSource;
    use crate::tolerance::max_abs_deviations;
    use crate::value::Value;
    use crate::UnitError;
    use tempfile::TempDir;

    fn square(params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
        let k = params.int(0)?;
        Ok(Value::Int(k * k))
    }

    fn raising(_params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
        Err(UnitError::Failed("capability unavailable".to_string()))
    }

    fn constant_one(_params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
        Ok(Value::Int(1))
    }

    fn near_pi(_params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
        Ok(Value::Real(3.14159265))
    }

    fn exact_unit(entry: EntryFn, sets: Vec<ParameterSet>) -> RegisteredUnit {
        RegisteredUnit {
            entry,
            parameter_sets: sets,
            mode: CompareMode::Exact,
            skip: None,
        }
    }

    fn single_set() -> Vec<ParameterSet> {
        vec![ParameterSet::new(vec![Value::Int(0)])]
    }

    fn build(catalog: UnitCatalog, names: &[&str]) -> Registry {
        let candidates: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        Registry::build(catalog, &candidates, &[])
    }

    fn outcomes(report: &RunReport) -> Vec<(String, Outcome)> {
        report
            .results
            .iter()
            .map(|r| (r.identity(), r.outcome))
            .collect()
    }

    #[test]
    fn matching_fixtures_pass_and_corrupted_ones_fail() {
        // Concrete scenarios: f(k) = k*k over settings [(3,), (4,)].
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();
        store.write("square", 0, &Value::Int(9)).unwrap();
        store.write("square", 1, &Value::Int(16)).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register(
            "square",
            exact_unit(
                square,
                vec![
                    ParameterSet::new(vec![Value::Int(3)]),
                    ParameterSet::new(vec![Value::Int(4)]),
                ],
            ),
        );
        let registry = build(catalog, &["square"]);
        let runner = SuiteRunner::new(&store, 42).quiet(true);

        let report = runner.run(&registry.filtered(None));
        assert!(report.statistics.all_ok());
        assert_eq!(
            outcomes(&report),
            vec![
                ("square setting 0".to_string(), Outcome::Passed),
                ("square setting 1".to_string(), Outcome::Passed),
            ]
        );

        // Corrupt the golden value at index 1.
        store.write("square", 1, &Value::Int(17)).unwrap();
        let report = runner.run(&registry.filtered(None));
        assert!(!report.statistics.all_ok());
        assert_eq!(report.results[0].outcome, Outcome::Passed);
        assert_eq!(report.results[1].outcome, Outcome::Failed);
        assert_eq!(report.non_ok_identities(), vec!["square setting 1"]);
    }

    #[test]
    fn one_erroring_unit_does_not_block_the_others() {
        // A errors, B matches, C mismatches; all three must be reported.
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();
        store.write("b_matching", 0, &Value::Int(1)).unwrap();
        store.write("c_mismatching", 0, &Value::Int(2)).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register("a_raising", exact_unit(raising, single_set()));
        catalog.register("b_matching", exact_unit(constant_one, single_set()));
        catalog.register("c_mismatching", exact_unit(constant_one, single_set()));
        let registry = build(catalog, &["a_raising", "b_matching", "c_mismatching"]);

        let report = SuiteRunner::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None));

        assert_eq!(
            outcomes(&report),
            vec![
                ("a_raising setting 0".to_string(), Outcome::Errored),
                ("b_matching setting 0".to_string(), Outcome::Passed),
                ("c_mismatching setting 0".to_string(), Outcome::Failed),
            ]
        );
        assert!(!report.statistics.all_ok());
        assert_eq!(
            report.non_ok_identities(),
            vec!["a_raising setting 0", "c_mismatching setting 0"]
        );
    }

    #[test]
    fn missing_fixture_is_errored_not_passed() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register("square", exact_unit(constant_one, single_set()));
        let registry = build(catalog, &["square"]);

        let report = SuiteRunner::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None));

        assert_eq!(report.results[0].outcome, Outcome::Errored);
        assert!(report.results[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("no fixture"));
    }

    #[test]
    fn tolerance_mode_admits_small_drift_and_rejects_large() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();
        store.write("pi", 0, &Value::Real(3.14159265358979)).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register(
            "pi",
            RegisteredUnit {
                entry: near_pi,
                parameter_sets: single_set(),
                mode: CompareMode::Tolerance {
                    accuracy: 1e-6,
                    deviations: max_abs_deviations,
                },
                skip: None,
            },
        );
        let candidates = vec!["pi".to_string()];
        let registry = Registry::build(catalog, &candidates, &[]);

        let report = SuiteRunner::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None));
        assert_eq!(report.results[0].outcome, Outcome::Passed);

        // The same drift under a tighter threshold fails, naming the metric.
        let mut catalog = UnitCatalog::new();
        catalog.register(
            "pi",
            RegisteredUnit {
                entry: near_pi,
                parameter_sets: single_set(),
                mode: CompareMode::Tolerance {
                    accuracy: 1e-12,
                    deviations: max_abs_deviations,
                },
                skip: None,
            },
        );
        let registry = Registry::build(catalog, &["pi".to_string()], &[]);
        let report = SuiteRunner::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None));
        assert_eq!(report.results[0].outcome, Outcome::Failed);
        assert!(report.results[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("result"));
    }

    #[test]
    fn skipped_units_report_skipped_not_ok() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();

        let mut catalog = UnitCatalog::new();
        let mut gated = exact_unit(constant_one, single_set());
        gated.skip = Some("built without extended-kernels".to_string());
        catalog.register("histogram", gated);
        let registry = build(catalog, &["histogram"]);

        let report = SuiteRunner::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None));

        assert_eq!(report.results[0].outcome, Outcome::Skipped);
        assert_eq!(report.statistics.skipped, 1);
        assert_eq!(report.statistics.passed, 0);
        assert!(report.statistics.all_ok());
    }

    #[test]
    fn repeated_runs_report_identically() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();
        store.write("b_matching", 0, &Value::Int(1)).unwrap();
        store.write("c_mismatching", 0, &Value::Int(2)).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register("b_matching", exact_unit(constant_one, single_set()));
        catalog.register("c_mismatching", exact_unit(constant_one, single_set()));
        let registry = build(catalog, &["b_matching", "c_mismatching"]);
        let runner = SuiteRunner::new(&store, 42).quiet(true);

        let first = outcomes(&runner.run(&registry.filtered(None)));
        let second = outcomes(&runner.run(&registry.filtered(None)));
        assert_eq!(first, second);
    }
}
