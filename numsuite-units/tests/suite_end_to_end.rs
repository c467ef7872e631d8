//! End-to-end runs of the full kernel suite through the harness

use numsuite_harness::compare::equal;
use numsuite_harness::runner::Outcome;
use numsuite_harness::value::{NumArray, Value};
use numsuite_harness::{FixtureStore, Harness};
use tempfile::TempDir;

fn harness(dir: &TempDir, seed: u64) -> Harness {
    Harness::new(numsuite_units::registry(), &dir.path().join("fixtures"), seed)
        .unwrap()
        .quiet(true)
}

#[test]
fn generate_then_test_passes_the_whole_suite() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir, 42);

    let summary = h.generate(None).unwrap();
    assert!(summary.all_ok(), "generation failures: {:?}", summary.failures);
    assert!(summary.written > 0);
    assert!(summary.stale.is_empty());

    let report = h.test(None).unwrap();
    assert!(
        report.statistics.all_ok(),
        "non-OK pairs: {:?}",
        report.non_ok_identities()
    );
    assert_eq!(report.statistics.failed, 0);
    assert_eq!(report.statistics.errored, 0);

    // Without the extended-kernels capability the histogram unit must be
    // counted as skipped, never as passed.
    if !cfg!(feature = "extended-kernels") {
        assert!(report.statistics.skipped > 0);
    }
}

#[test]
fn fixture_drift_is_detected_and_attributed() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir, 42);
    h.generate(None).unwrap();

    // Corrupt one golden value behind the harness's back.
    let store = FixtureStore::open(dir.path().join("fixtures")).unwrap();
    store
        .write("linear", 1, &Value::Array(NumArray::vector(vec![1.0])))
        .unwrap();

    let report = h.test(None).unwrap();
    assert!(!report.statistics.all_ok());
    assert_eq!(report.non_ok_identities(), vec!["linear setting 1"]);

    let broken = report
        .results
        .iter()
        .find(|r| r.unit == "linear" && r.index == 1)
        .unwrap();
    assert_eq!(broken.outcome, Outcome::Failed);
    assert!(broken.detail.as_deref().unwrap().contains("--- fixture"));
}

#[test]
fn fixtures_are_reproducible_across_stores() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    harness(&dir_a, 42).generate(None).unwrap();
    harness(&dir_b, 42).generate(None).unwrap();

    let store_a = FixtureStore::open(dir_a.path().join("fixtures")).unwrap();
    let store_b = FixtureStore::open(dir_b.path().join("fixtures")).unwrap();

    let pairs = store_a.known_pairs();
    assert_eq!(pairs, store_b.known_pairs());
    assert!(!pairs.is_empty());
    for (unit, index) in pairs {
        let a = store_a.read(&unit, index).unwrap();
        let b = store_b.read(&unit, index).unwrap();
        assert!(equal(&a, &b), "{unit} setting {index} diverged");
    }
}

#[test]
fn a_different_seed_produces_different_fixtures() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    harness(&dir_a, 42).generate(Some("gaussian")).unwrap();
    harness(&dir_b, 43).generate(Some("gaussian")).unwrap();

    let a = FixtureStore::open(dir_a.path().join("fixtures"))
        .unwrap()
        .read("gaussian", 0)
        .unwrap();
    let b = FixtureStore::open(dir_b.path().join("fixtures"))
        .unwrap()
        .read("gaussian", 0)
        .unwrap();
    assert!(!equal(&a, &b));
}

#[test]
fn unit_filter_limits_both_generation_and_testing() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir, 42);

    h.generate(Some("gaussian")).unwrap();
    let report = h.test(Some("gaussian")).unwrap();
    assert!(report.statistics.all_ok());
    assert!(report.results.iter().all(|r| r.unit == "gaussian"));

    // Pairs outside the filter never got fixtures, and testing them says so.
    let full = h.test(None).unwrap();
    assert!(full.statistics.errored > 0);
    assert!(full
        .results
        .iter()
        .filter(|r| r.unit == "gaussian")
        .all(|r| r.outcome == Outcome::Passed));
}

#[test]
fn repeated_test_runs_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir, 42);
    h.generate(None).unwrap();

    let first: Vec<_> = h
        .test(None)
        .unwrap()
        .results
        .iter()
        .map(|r| (r.identity(), r.outcome))
        .collect();
    let second: Vec<_> = h
        .test(None)
        .unwrap()
        .results
        .iter()
        .map(|r| (r.identity(), r.outcome))
        .collect();
    assert_eq!(first, second);
}
