//! Tolerance aggregation for units that compare approximately
//!
//! Units in tolerance mode compute one or more named scalar deviations
//! (typically the maximum absolute elementwise difference between an actual
//! and an expected matrix) and hand them to `check_accuracy` together with
//! the unit's accuracy threshold. This module never computes deviations on
//! its own; it only aggregates and judges them, and on failure it names the
//! offending metrics rather than returning an opaque boolean.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::Value;
use crate::UnitError;

/// Named deviations judged against one accuracy threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceReport {
    pub threshold: f64,
    pub deviations: BTreeMap<String, f64>,
}

impl ToleranceReport {
    /// Pass iff every deviation is at most the threshold
    pub fn passed(&self) -> bool {
        self.deviations.values().all(|d| *d <= self.threshold)
    }

    /// Metrics that exceeded the threshold, with their measured values
    pub fn offenders(&self) -> Vec<(&str, f64)> {
        self.deviations
            .iter()
            .filter(|(_, d)| **d > self.threshold)
            .map(|(name, d)| (name.as_str(), *d))
            .collect()
    }

    /// One-line description of the failure, empty when passed
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .offenders()
            .iter()
            .map(|(name, d)| format!("{name} deviates by {d:e} (accuracy {:e})", self.threshold))
            .collect();
        parts.join("; ")
    }
}

/// Judge a set of named deviations against an accuracy threshold.
pub fn check_accuracy(threshold: f64, deviations: BTreeMap<String, f64>) -> ToleranceReport {
    ToleranceReport {
        threshold,
        deviations,
    }
}

/// Maximum absolute elementwise deviations between two values of identical
/// structure, one metric per leaf. This is the deviation function most
/// tolerance-mode units register; structural disagreement is an error
/// because it cannot be expressed as a finite deviation.
pub fn max_abs_deviations(
    actual: &Value,
    expected: &Value,
) -> Result<BTreeMap<String, f64>, UnitError> {
    let mut out = BTreeMap::new();
    walk(actual, expected, "result", &mut out)?;
    Ok(out)
}

fn walk(
    actual: &Value,
    expected: &Value,
    path: &str,
    out: &mut BTreeMap<String, f64>,
) -> Result<(), UnitError> {
    let structure = |detail: String| UnitError::Structure {
        path: path.to_string(),
        detail,
    };

    match (actual, expected) {
        (Value::Array(a), Value::Array(e)) => {
            if a.shape() != e.shape() {
                return Err(structure(format!(
                    "shape {:?} vs {:?}",
                    a.shape(),
                    e.shape()
                )));
            }
            let dev = a
                .data()
                .iter()
                .zip(e.data().iter())
                .map(|(x, y)| scalar_deviation(*x, *y))
                .fold(0.0_f64, f64::max);
            out.insert(path.to_string(), dev);
        }
        (Value::Seq(a), Value::Seq(e)) => {
            if a.len() != e.len() {
                return Err(structure(format!("length {} vs {}", a.len(), e.len())));
            }
            for (i, (x, y)) in a.iter().zip(e.iter()).enumerate() {
                walk(x, y, &format!("{path}[{i}]"), out)?;
            }
        }
        (Value::Text(a), Value::Text(e)) => {
            if a != e {
                return Err(structure(format!("text {a:?} vs {e:?}")));
            }
        }
        _ => match (actual.as_number(), expected.as_number()) {
            (Some(x), Some(y)) => {
                out.insert(path.to_string(), scalar_deviation(x, y));
            }
            _ => {
                return Err(structure(format!(
                    "kind {} vs {}",
                    actual.kind(),
                    expected.kind()
                )));
            }
        },
    }
    Ok(())
}

/// Absolute difference, treating two NaNs as agreeing. Tolerance mode is the
/// comparison units opt into precisely when NaN leaves are expected.
fn scalar_deviation(x: f64, y: f64) -> f64 {
    if x.is_nan() && y.is_nan() {
        0.0
    } else {
        (x - y).abs()
    }
}
