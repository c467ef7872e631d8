//! The regression unit catalog
//!
//! One unit per kernel configuration of the wrapped library. Each entry
//! draws its train/test features from the seed source it is handed, runs
//! the kernel over train x train and train x test, and returns the kernel
//! name, echoed parameters, and the two kernel matrices. Tolerance-mode
//! units carry per-kernel accuracy thresholds.

use numsuite_harness::registry::{
    CompareMode, ParameterSet, RegisteredUnit, Registry, UnitCatalog,
};
use numsuite_harness::seed::SeedSource;
use numsuite_harness::tolerance::max_abs_deviations;
use numsuite_harness::value::{NumArray, Value};
use numsuite_harness::UnitError;

use crate::dataops::{random_dna, random_features};
use crate::kernels;

const NUM_FEATS: usize = 11;
const NUM_TRAIN: usize = 11;
const NUM_TEST: usize = 17;

/// Units excluded from every run.
// LinearByte is b0rked upstream; keep it registered but never run it.
pub const BLACKLIST: &[&str] = &["linear_byte"];

fn train_test(seed: &mut SeedSource) -> (NumArray, NumArray) {
    (
        random_features(seed, NUM_FEATS, NUM_TRAIN),
        random_features(seed, NUM_FEATS, NUM_TEST),
    )
}

fn kernel_output(
    name: &str,
    params: &ParameterSet,
    km_train: NumArray,
    km_test: NumArray,
) -> Value {
    Value::Seq(vec![
        Value::Text(name.to_string()),
        Value::Seq(params.values().to_vec()),
        Value::Array(km_train),
        Value::Array(km_test),
    ])
}

fn gaussian_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let width = params.real(0)?;
    let (train, test) = train_test(seed);
    let km_train = kernels::gaussian(&train, &train, width)?;
    let km_test = kernels::gaussian(&train, &test, width)?;
    Ok(kernel_output("Gaussian", params, km_train, km_test))
}

fn linear_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let scale = params.real(0)?;
    let (train, test) = train_test(seed);
    let km_train = kernels::linear(&train, &train, scale)?;
    let km_test = kernels::linear(&train, &test, scale)?;
    Ok(kernel_output("Linear", params, km_train, km_test))
}

fn chi2_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let width = params.real(0)?;
    let (train, test) = train_test(seed);
    let km_train = kernels::chi2(&train, &train, width)?;
    let km_test = kernels::chi2(&train, &test, width)?;
    Ok(kernel_output("Chi2", params, km_train, km_test))
}

fn poly_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let degree = params.int(0)?;
    let inhomogeneous = params.int(1)? != 0;
    let (train, test) = train_test(seed);
    let km_train = kernels::poly(&train, &train, degree, inhomogeneous)?;
    let km_test = kernels::poly(&train, &test, degree, inhomogeneous)?;
    Ok(kernel_output("Poly", params, km_train, km_test))
}

fn sigmoid_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let gamma = params.real(0)?;
    let coef0 = params.real(1)?;
    let (train, test) = train_test(seed);
    let km_train = kernels::sigmoid(&train, &train, gamma, coef0)?;
    let km_test = kernels::sigmoid(&train, &test, gamma, coef0)?;
    Ok(kernel_output("Sigmoid", params, km_train, km_test))
}

fn const_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let c = params.real(0)?;
    let (train, test) = train_test(seed);
    let km_train = kernels::constant(&train, &train, c)?;
    let km_test = kernels::constant(&train, &test, c)?;
    Ok(kernel_output("Const", params, km_train, km_test))
}

fn diag_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let d = params.real(0)?;
    let (train, test) = train_test(seed);
    let km_train = kernels::diag(&train, &train, d)?;
    let km_test = kernels::diag(&train, &test, d)?;
    Ok(kernel_output("Diag", params, km_train, km_test))
}

fn match_string_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    let len = params.int(0)?;
    if len <= 0 {
        return Err(UnitError::Failed(format!(
            "string length must be positive, got {len}"
        )));
    }
    let strings = random_dna(seed, NUM_TRAIN, len as usize);

    let mut data = Vec::with_capacity(NUM_TRAIN * NUM_TRAIN);
    for a in &strings {
        for b in &strings {
            data.push(kernels::match_count(a, b));
        }
    }
    let km = NumArray::matrix(NUM_TRAIN, NUM_TRAIN, data)
        .map_err(|e| UnitError::Failed(e.to_string()))?;

    Ok(Value::Seq(vec![
        Value::Text("MatchString".to_string()),
        Value::Seq(strings.into_iter().map(Value::Text).collect()),
        Value::Array(km),
    ]))
}

fn histogram_entry(params: &ParameterSet, seed: &mut SeedSource) -> Result<Value, UnitError> {
    #[cfg(feature = "extended-kernels")]
    {
        let (train, test) = train_test(seed);
        let km_train = kernels::histogram_intersection(&train, &train)?;
        let km_test = kernels::histogram_intersection(&train, &test)?;
        Ok(kernel_output("HistogramIntersection", params, km_train, km_test))
    }
    #[cfg(not(feature = "extended-kernels"))]
    {
        let _ = (params, seed);
        Err(UnitError::Failed(
            "histogram kernel not built into this binary".to_string(),
        ))
    }
}

fn linear_byte_entry(_params: &ParameterSet, _seed: &mut SeedSource) -> Result<Value, UnitError> {
    Err(UnitError::Failed("LinearByte is b0rked".to_string()))
}

fn set(values: Vec<Value>) -> ParameterSet {
    ParameterSet::new(values)
}

fn exact(
    entry: numsuite_harness::registry::EntryFn,
    parameter_sets: Vec<ParameterSet>,
) -> RegisteredUnit {
    RegisteredUnit {
        entry,
        parameter_sets,
        mode: CompareMode::Exact,
        skip: None,
    }
}

fn tolerant(
    entry: numsuite_harness::registry::EntryFn,
    parameter_sets: Vec<ParameterSet>,
    accuracy: f64,
) -> RegisteredUnit {
    RegisteredUnit {
        entry,
        parameter_sets,
        mode: CompareMode::Tolerance {
            accuracy,
            deviations: max_abs_deviations,
        },
        skip: None,
    }
}

/// Every registered unit, keyed by name
pub fn catalog() -> UnitCatalog {
    let mut catalog = UnitCatalog::new();

    catalog.register(
        "gaussian",
        tolerant(
            gaussian_entry,
            vec![
                set(vec![Value::Real(1.9)]),
                set(vec![Value::Real(0.5)]),
            ],
            1e-8,
        ),
    );

    catalog.register(
        "linear",
        exact(
            linear_entry,
            vec![set(vec![Value::Real(1.0)]), set(vec![Value::Real(0.5)])],
        ),
    );

    catalog.register(
        "chi2",
        tolerant(chi2_entry, vec![set(vec![Value::Real(1.4)])], 1e-8),
    );

    catalog.register(
        "poly",
        tolerant(
            poly_entry,
            vec![
                set(vec![Value::Int(3), Value::Int(1)]),
                set(vec![Value::Int(2), Value::Int(0)]),
            ],
            1e-6,
        ),
    );

    catalog.register(
        "sigmoid",
        tolerant(
            sigmoid_entry,
            vec![
                set(vec![Value::Real(0.1), Value::Real(0.0)]),
                set(vec![Value::Real(1.1), Value::Real(1.3)]),
            ],
            1e-7,
        ),
    );

    catalog.register(
        "const",
        exact(const_entry, vec![set(vec![Value::Real(23.0)])]),
    );

    catalog.register(
        "diag",
        exact(diag_entry, vec![set(vec![Value::Real(23.0)])]),
    );

    catalog.register(
        "match_string",
        exact(match_string_entry, vec![set(vec![Value::Int(60)])]),
    );

    let mut histogram = tolerant(histogram_entry, vec![set(vec![])], 1e-9);
    if !cfg!(feature = "extended-kernels") {
        histogram.skip = Some("built without extended-kernels".to_string());
    }
    catalog.register("histogram", histogram);

    catalog.register(
        "linear_byte",
        exact(linear_byte_entry, vec![set(vec![Value::Real(10.0)])]),
    );

    catalog
}

/// The validated registry over the full catalog
pub fn registry() -> Registry {
    let catalog = catalog();
    let candidates = catalog.names();
    Registry::build(catalog, &candidates, BLACKLIST)
}
