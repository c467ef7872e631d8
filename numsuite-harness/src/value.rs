//! The closed value model shared by units, fixtures and the comparator
//!
//! Unit results are heterogeneous: scalars, text, numeric arrays, or nested
//! sequences of these. Modeling them as one tagged variant keeps comparison
//! a plain structural match and gives fixtures a single serialized form.
//! Floating-point payloads serialize by IEEE bit pattern so that NaN and the
//! infinities survive the JSON round trip losslessly.

use serde::{Deserialize, Serialize};

/// A single result value produced by a unit's entry callable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Real(#[serde(with = "f64_bits")] f64),
    Text(String),
    Array(NumArray),
    Seq(Vec<Value>),
}

impl Value {
    /// Kind name used in error messages and diffs
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Seq(_) => "seq",
        }
    }

    /// Numeric view of a scalar, if this value is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Render the value as indented lines, used for diff generation
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.render_into(&mut lines, 0);
        lines
    }

    fn render_into(&self, lines: &mut Vec<String>, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            Value::Int(i) => lines.push(format!("{pad}int {i}")),
            Value::Real(r) => lines.push(format!("{pad}real {r}")),
            Value::Text(t) => lines.push(format!("{pad}text {t:?}")),
            Value::Array(a) => {
                let dims: Vec<String> = a.shape().iter().map(|d| d.to_string()).collect();
                lines.push(format!("{pad}array {} [", dims.join("x")));
                for row in a.rows() {
                    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    lines.push(format!("{pad}  {}", cells.join(" ")));
                }
                lines.push(format!("{pad}]"));
            }
            Value::Seq(items) => {
                lines.push(format!("{pad}seq ["));
                for item in items {
                    item.render_into(lines, depth + 1);
                }
                lines.push(format!("{pad}]"));
            }
        }
    }
}

/// A rank-N grid of numbers in row-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumArray {
    shape: Vec<usize>,
    #[serde(with = "f64_bits_vec")]
    data: Vec<f64>,
}

/// Shape/data disagreement when constructing an array
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("array data length {len} does not match shape {shape:?}")]
pub struct ShapeError {
    pub shape: Vec<usize>,
    pub len: usize,
}

impl NumArray {
    /// Create an array, validating that the data fills the shape exactly
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, ShapeError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Convenience constructor for a rank-2 grid
    pub fn matrix(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ShapeError> {
        Self::new(vec![rows, cols], data)
    }

    /// A rank-1 array
    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Number of rows when viewed as a matrix (rank-1 arrays are one row)
    pub fn row_count(&self) -> usize {
        if self.shape.len() < 2 {
            1
        } else {
            self.shape[0]
        }
    }

    /// Length of one row when viewed as a matrix
    pub fn row_len(&self) -> usize {
        match self.shape.len() {
            0 => 0,
            1 => self.shape[0],
            _ => self.data.len() / self.shape[0].max(1),
        }
    }

    /// Iterate rows as slices, flattening rank > 2 into the trailing dims
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        let width = self.row_len().max(1);
        self.data.chunks(width)
    }

    /// Element access for rank-2 arrays
    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert_eq!(self.shape.len(), 2);
        self.data[row * self.shape[1] + col]
    }
}

mod f64_bits {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(v.to_bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        u64::deserialize(d).map(f64::from_bits)
    }
}

mod f64_bits_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[f64], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter().map(|x| x.to_bits()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let bits = Vec::<u64>::deserialize(d)?;
        Ok(bits.into_iter().map(f64::from_bits).collect())
    }
}
