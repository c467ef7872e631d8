//! Kernel-matrix computations exercised by the regression units
//!
//! Feature matrices follow the convention of the wrapped library: one
//! column per vector, one row per feature. A kernel evaluates every train
//! column against every lhs/rhs column pair, producing a rank-2 grid of
//! `lhs vectors x rhs vectors`.

use numsuite_harness::value::NumArray;
use numsuite_harness::UnitError;

fn feature_dims(lhs: &NumArray, rhs: &NumArray) -> Result<(usize, usize, usize), UnitError> {
    let (l, r) = (lhs.shape(), rhs.shape());
    if l.len() != 2 || r.len() != 2 {
        return Err(UnitError::Failed(format!(
            "kernel features must be rank-2, got {l:?} and {r:?}"
        )));
    }
    if l[0] != r[0] {
        return Err(UnitError::Failed(format!(
            "feature dimension mismatch: {} vs {}",
            l[0], r[0]
        )));
    }
    Ok((l[0], l[1], r[1]))
}

fn kernel_matrix<F>(lhs: &NumArray, rhs: &NumArray, f: F) -> Result<NumArray, UnitError>
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    let (feats, nl, nr) = feature_dims(lhs, rhs)?;
    let mut data = Vec::with_capacity(nl * nr);
    let mut x = vec![0.0; feats];
    let mut y = vec![0.0; feats];

    for i in 0..nl {
        for (fi, slot) in x.iter_mut().enumerate() {
            *slot = lhs.get(fi, i);
        }
        for j in 0..nr {
            for (fi, slot) in y.iter_mut().enumerate() {
                *slot = rhs.get(fi, j);
            }
            data.push(f(&x, &y));
        }
    }

    NumArray::matrix(nl, nr, data).map_err(|e| UnitError::Failed(e.to_string()))
}

fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
}

fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Scaled inner product
pub fn linear(lhs: &NumArray, rhs: &NumArray, scale: f64) -> Result<NumArray, UnitError> {
    kernel_matrix(lhs, rhs, |x, y| scale * dot(x, y))
}

/// exp(-||x - y||^2 / width)
pub fn gaussian(lhs: &NumArray, rhs: &NumArray, width: f64) -> Result<NumArray, UnitError> {
    kernel_matrix(lhs, rhs, |x, y| (-squared_distance(x, y) / width).exp())
}

/// exp(-sum((x - y)^2 / (x + y)) / width), the chi-squared kernel for
/// non-negative features
pub fn chi2(lhs: &NumArray, rhs: &NumArray, width: f64) -> Result<NumArray, UnitError> {
    kernel_matrix(lhs, rhs, |x, y| {
        let chi: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| {
                let denom = a + b;
                if denom == 0.0 {
                    0.0
                } else {
                    (a - b) * (a - b) / denom
                }
            })
            .sum();
        (-chi / width).exp()
    })
}

/// (x . y + c)^degree, with c = 1 for the inhomogeneous variant
pub fn poly(
    lhs: &NumArray,
    rhs: &NumArray,
    degree: i64,
    inhomogeneous: bool,
) -> Result<NumArray, UnitError> {
    let degree = i32::try_from(degree).map_err(|_| {
        UnitError::Failed(format!("polynomial degree {degree} is out of range"))
    })?;
    if degree < 0 {
        return Err(UnitError::Failed(format!(
            "polynomial degree must be non-negative, got {degree}"
        )));
    }
    let shift = if inhomogeneous { 1.0 } else { 0.0 };
    kernel_matrix(lhs, rhs, |x, y| (dot(x, y) + shift).powi(degree))
}

/// tanh(gamma * x . y + coef0)
pub fn sigmoid(
    lhs: &NumArray,
    rhs: &NumArray,
    gamma: f64,
    coef0: f64,
) -> Result<NumArray, UnitError> {
    kernel_matrix(lhs, rhs, |x, y| (gamma * dot(x, y) + coef0).tanh())
}

/// The constant c for every pair
pub fn constant(lhs: &NumArray, rhs: &NumArray, c: f64) -> Result<NumArray, UnitError> {
    kernel_matrix(lhs, rhs, |_, _| c)
}

/// d on the diagonal, zero elsewhere
pub fn diag(lhs: &NumArray, rhs: &NumArray, d: f64) -> Result<NumArray, UnitError> {
    let (_, nl, nr) = feature_dims(lhs, rhs)?;
    let mut data = vec![0.0; nl * nr];
    for i in 0..nl.min(nr) {
        data[i * nr + i] = d;
    }
    NumArray::matrix(nl, nr, data).map_err(|e| UnitError::Failed(e.to_string()))
}

/// Positionwise match count between equal-length strings
pub fn match_count(a: &str, b: &str) -> f64 {
    a.chars().zip(b.chars()).filter(|(x, y)| x == y).count() as f64
}

/// min(x_i, y_i) summed, the histogram intersection kernel
#[cfg(feature = "extended-kernels")]
pub fn histogram_intersection(lhs: &NumArray, rhs: &NumArray) -> Result<NumArray, UnitError> {
    kernel_matrix(lhs, rhs, |x, y| {
        x.iter().zip(y.iter()).map(|(a, b)| a.min(*b)).sum()
    })
}
