//! Fixture generation
//!
//! Runs every (unit, setting index) pair and snapshots the result into the
//! fixture store. Generation is a batch job with partial-failure tolerance:
//! an entry that errors or panics is recorded and the batch moves on, so a
//! single broken unit cannot block regeneration of the rest. Only a store
//! environment fault aborts the whole run.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

use crate::registry::TestUnit;
use crate::store::FixtureStore;
use crate::HarnessError;

/// One pair whose entry invocation failed during generation
#[derive(Debug, Clone)]
pub struct GenerationFailure {
    pub unit: String,
    pub index: usize,
    pub cause: String,
}

/// Batch outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Number of fixtures written
    pub written: usize,
    /// Every pair whose invocation failed
    pub failures: Vec<GenerationFailure>,
    /// Units skipped with their reasons (unavailable capabilities)
    pub skipped: Vec<(String, String)>,
    /// Fixtures on disk with no matching pair in the registry
    pub stale: Vec<(String, usize)>,
    pub duration: Duration,
}

impl GenerationSummary {
    /// True iff every pair generated successfully
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Print a styled summary listing every failed pair
    pub fn print(&self) {
        println!(
            "{} {} fixture(s) written in {:.2?}",
            style("GENERATE").bold().cyan(),
            self.written,
            self.duration
        );

        for (unit, reason) in &self.skipped {
            println!("  {} {} ({})", style("~").yellow(), unit, reason);
        }

        if !self.failures.is_empty() {
            println!("\n{}", style("FAILED PAIRS:").bold().red());
            for f in &self.failures {
                println!(
                    "  {} {} setting {}: {}",
                    style("!").red(),
                    f.unit,
                    f.index,
                    style(&f.cause).red()
                );
            }
        }

        if !self.stale.is_empty() {
            println!("\n{}", style("STALE FIXTURES:").bold().yellow());
            for (unit, index) in &self.stale {
                println!("  {} {} setting {}", style("?").yellow(), unit, index);
            }
        }
    }
}

/// Fixture generator over a fixture store
pub struct FixtureGenerator<'a> {
    store: &'a FixtureStore,
    base_seed: u64,
    quiet: bool,
}

impl<'a> FixtureGenerator<'a> {
    pub fn new(store: &'a FixtureStore, base_seed: u64) -> Self {
        Self {
            store,
            base_seed,
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Generate fixtures for every pair of `units`, in order. Staleness is
    /// judged against `live`, the full registered set, so a filtered run
    /// does not mislabel other units' fixtures as stale.
    pub fn run(
        &self,
        units: &[&TestUnit],
        live: &[TestUnit],
    ) -> Result<GenerationSummary, HarnessError> {
        let start = Instant::now();
        let mut summary = GenerationSummary::default();

        let total: usize = units
            .iter()
            .filter(|u| u.skip.is_none())
            .map(|u| u.parameter_sets.len())
            .sum();
        let progress = if self.quiet {
            None
        } else {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?);
            Some(pb)
        };

        for unit in units {
            if let Some(reason) = &unit.skip {
                summary.skipped.push((unit.name.clone(), reason.clone()));
                continue;
            }

            if let Some(pb) = &progress {
                pb.set_message(unit.name.clone());
            }

            for index in 0..unit.parameter_sets.len() {
                match unit.invoke(index, self.base_seed) {
                    Ok(result) => {
                        // Store faults are the one fatal condition here.
                        self.store.write(&unit.name, index, &result)?;
                        summary.written += 1;
                    }
                    Err(cause) => summary.failures.push(GenerationFailure {
                        unit: unit.name.clone(),
                        index,
                        cause: cause.to_string(),
                    }),
                }

                if let Some(pb) = &progress {
                    pb.inc(1);
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        summary.stale = self.find_stale(live);
        summary.duration = start.elapsed();
        Ok(summary)
    }

    /// Fixtures on disk that no registered (unit, index) pair accounts for
    fn find_stale(&self, live: &[TestUnit]) -> Vec<(String, usize)> {
        self.store
            .known_pairs()
            .into_iter()
            .filter(|(unit, index)| {
                !live
                    .iter()
                    .any(|u| u.name == *unit && *index < u.parameter_sets.len())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::equal;
    use crate::registry::{
        CompareMode, EntryFn, ParameterSet, RegisteredUnit, Registry, UnitCatalog,
    };
    use crate::seed::SeedSource;
    use crate::value::Value;
    use crate::UnitError;
    use tempfile::TempDir;

    fn square(params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
        let k = params.int(0)?;
        Ok(Value::Int(k * k))
    }

    fn noisy(_params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
        Ok(Value::Real(seed.next_real()))
    }

    fn failing(_params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
        Err(UnitError::Failed("unsupported configuration".to_string()))
    }

    fn unit(entry: EntryFn, sets: usize) -> RegisteredUnit {
        RegisteredUnit {
            entry,
            parameter_sets: (0..sets)
                .map(|k| ParameterSet::new(vec![Value::Int(k as i64 + 3)]))
                .collect(),
            mode: CompareMode::Exact,
            skip: None,
        }
    }

    fn build(names: &[&str], catalog: UnitCatalog) -> Registry {
        let candidates: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        Registry::build(catalog, &candidates, &[])
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register("broken", unit(failing, 2));
        catalog.register("square", unit(square, 2));
        let registry = build(&["broken", "square"], catalog);

        let summary = FixtureGenerator::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None), registry.units())
            .unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.failures.len(), 2);
        assert!(!summary.all_ok());
        assert!(summary.failures.iter().all(|f| f.unit == "broken"));
        assert!(store.exists("square", 0) && store.exists("square", 1));
    }

    #[test]
    fn generation_is_deterministic_under_a_fixed_seed() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let store_a = FixtureStore::open(dir_a.path()).unwrap();
        let store_b = FixtureStore::open(dir_b.path()).unwrap();

        for store in [&store_a, &store_b] {
            let mut catalog = UnitCatalog::new();
            catalog.register("noisy", unit(noisy, 3));
            let registry = build(&["noisy"], catalog);
            let summary = FixtureGenerator::new(store, 42)
                .quiet(true)
                .run(&registry.filtered(None), registry.units())
                .unwrap();
            assert!(summary.all_ok());
        }

        for index in 0..3 {
            let a = store_a.read("noisy", index).unwrap();
            let b = store_b.read("noisy", index).unwrap();
            assert!(equal(&a, &b), "setting {index} diverged");
        }
    }

    #[test]
    fn skipped_units_produce_no_fixtures() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();

        let mut catalog = UnitCatalog::new();
        let mut gated = unit(square, 1);
        gated.skip = Some("built without extended-kernels".to_string());
        catalog.register("histogram", gated);
        let registry = build(&["histogram"], catalog);

        let summary = FixtureGenerator::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None), registry.units())
            .unwrap();

        assert_eq!(summary.written, 0);
        assert_eq!(summary.skipped.len(), 1);
        assert!(!store.exists("histogram", 0));
    }

    #[test]
    fn stale_fixtures_are_reported() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();
        store.write("retired", 0, &Value::Int(1)).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register("square", unit(square, 1));
        let registry = build(&["square"], catalog);

        let summary = FixtureGenerator::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None), registry.units())
            .unwrap();

        assert_eq!(summary.stale, vec![("retired".to_string(), 0)]);
    }

    #[test]
    fn filtered_generation_keeps_other_units_fixtures_live() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::open(dir.path()).unwrap();
        store.write("retired", 0, &Value::Int(1)).unwrap();

        let mut catalog = UnitCatalog::new();
        catalog.register("square", unit(square, 2));
        catalog.register("noisy", unit(noisy, 2));
        let registry = build(&["square", "noisy"], catalog);

        FixtureGenerator::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(None), registry.units())
            .unwrap();

        // Regenerating one unit must not report the others' fixtures stale.
        let summary = FixtureGenerator::new(&store, 42)
            .quiet(true)
            .run(&registry.filtered(Some("square")), registry.units())
            .unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.stale, vec![("retired".to_string(), 0)]);
    }
}
