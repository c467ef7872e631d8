//! Exact structural comparison and diff generation
//!
//! This is the exact comparator: no implicit tolerance anywhere. NaN-valued
//! leaves follow IEEE semantics (`NaN != NaN`); units whose results contain
//! NaN or accumulated floating-point noise opt into tolerance-based
//! comparison instead (see `tolerance`).

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::value::Value;

/// Recursive structural equality over the value model.
///
/// Differing kinds are unequal, except that the two numeric scalar kinds
/// compare by numeric value. Arrays require identical shape and exactly
/// equal elements; sequences require identical length and pairwise equality
/// (two empty sequences are equal).
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x == y,
        (Value::Int(x), Value::Real(y)) | (Value::Real(y), Value::Int(x)) => (*x as f64) == *y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.shape() == y.shape()
                && x.data().iter().zip(y.data().iter()).all(|(p, q)| p == q)
        }
        (Value::Seq(x), Value::Seq(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| equal(p, q))
        }
        _ => false,
    }
}

/// Result of comparing an actual value against its fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// Whether the two values were structurally equal
    pub matches: bool,
    /// Unified diff of the rendered values (empty when equal)
    pub diff: String,
    /// Number of added lines in the diff
    pub added_lines: usize,
    /// Number of removed lines in the diff
    pub removed_lines: usize,
}

impl Comparison {
    /// A comparison with no differences
    pub fn matching() -> Self {
        Self {
            matches: true,
            diff: String::new(),
            added_lines: 0,
            removed_lines: 0,
        }
    }

    pub fn matches(&self) -> bool {
        self.matches
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }
}

/// Comparison engine producing diagnosable mismatches
#[derive(Clone, Default)]
pub struct ValueComparator;

impl ValueComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare a fixture value with an actual value
    pub fn compare(&self, fixture: &Value, actual: &Value) -> Comparison {
        if equal(fixture, actual) {
            return Comparison::matching();
        }

        self.generate_diff(&fixture.render_lines(), &actual.render_lines())
    }

    /// Generate a unified diff between the rendered values
    fn generate_diff(&self, fixture: &[String], actual: &[String]) -> Comparison {
        let fixture_text = fixture.join("\n");
        let actual_text = actual.join("\n");
        let diff = TextDiff::from_lines(&fixture_text, &actual_text);

        let mut diff_output = String::new();
        let mut added_lines = 0;
        let mut removed_lines = 0;

        diff_output.push_str("--- fixture\n");
        diff_output.push_str("+++ actual\n");

        for group in diff.grouped_ops(3) {
            if let Some((first, _last)) = group.first().zip(group.last()) {
                diff_output.push_str(&format!(
                    "@@ -{},{} +{},{} @@\n",
                    first.old_range().start + 1,
                    first.old_range().len(),
                    first.new_range().start + 1,
                    first.new_range().len(),
                ));
            }

            for op in group {
                for change in diff.iter_changes(&op) {
                    let prefix = match change.tag() {
                        ChangeTag::Delete => {
                            removed_lines += 1;
                            "-"
                        }
                        ChangeTag::Insert => {
                            added_lines += 1;
                            "+"
                        }
                        ChangeTag::Equal => " ",
                    };

                    diff_output.push_str(&format!("{}{}", prefix, change));
                    if !diff_output.ends_with('\n') {
                        diff_output.push('\n');
                    }
                }
            }
        }

        Comparison {
            matches: false,
            diff: diff_output,
            added_lines,
            removed_lines,
        }
    }
}
