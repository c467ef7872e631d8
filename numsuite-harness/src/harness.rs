//! Top-level orchestration of registry, store, generator and runner

use std::path::Path;

use crate::generate::{FixtureGenerator, GenerationSummary};
use crate::registry::Registry;
use crate::reporting::RunReport;
use crate::runner::SuiteRunner;
use crate::store::FixtureStore;
use crate::HarnessError;

/// Wires a validated registry to a fixture store and drives batch runs
pub struct Harness {
    registry: Registry,
    store: FixtureStore,
    seed: u64,
    quiet: bool,
}

impl Harness {
    /// Open the fixture store and take ownership of the registry. Failing
    /// to open the store directory is the unrecoverable environment fault.
    pub fn new(registry: Registry, fixture_dir: &Path, seed: u64) -> Result<Self, HarnessError> {
        let store = FixtureStore::open(fixture_dir)?;
        Ok(Self {
            registry,
            store,
            seed,
            quiet: false,
        })
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &FixtureStore {
        &self.store
    }

    fn selected(&self, filter: Option<&str>) -> Result<Vec<&crate::registry::TestUnit>, HarnessError> {
        let units = self.registry.filtered(filter);
        if units.is_empty() {
            return Err(HarnessError::Registry(match filter {
                Some(f) => format!("no units match filter {f:?}"),
                None => "no runnable units in the registry".to_string(),
            }));
        }
        Ok(units)
    }

    /// Regenerate fixtures for all (or filtered) units
    pub fn generate(&self, filter: Option<&str>) -> Result<GenerationSummary, HarnessError> {
        let units = self.selected(filter)?;
        FixtureGenerator::new(&self.store, self.seed)
            .quiet(self.quiet)
            .run(&units, self.registry.units())
    }

    /// Run all (or filtered) units against their stored fixtures
    pub fn test(&self, filter: Option<&str>) -> Result<RunReport, HarnessError> {
        let units = self.selected(filter)?;
        Ok(SuiteRunner::new(&self.store, self.seed)
            .quiet(self.quiet)
            .run(&units))
    }
}
