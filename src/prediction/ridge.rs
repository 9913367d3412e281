//! Weighted ridge regression with intercept.
//!
//! Fits `min Σ wᵢ (yᵢ - b - xᵢ·β)² + α‖β‖²` by centring on the weighted means
//! and solving the normal equations. Used as the LIME surrogate and for its
//! feature selection.

use crate::core::error::{Result, XaiError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// A fitted ridge model.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    /// Coefficients, one per column
    pub coef: Array1<f64>,
    /// Intercept
    pub intercept: f64,
}

impl RidgeFit {
    /// Predictions for every row.
    pub fn predict(&self, x: &ArrayView2<'_, f64>) -> Array1<f64> {
        x.dot(&self.coef) + self.intercept
    }

    /// Prediction for a single row.
    pub fn predict_row(&self, row: &ArrayView1<'_, f64>) -> f64 {
        row.dot(&self.coef) + self.intercept
    }

    /// Weighted coefficient of determination on `(x, y)`.
    pub fn score(&self, x: &ArrayView2<'_, f64>, y: &ArrayView1<'_, f64>, w: &ArrayView1<'_, f64>) -> f64 {
        weighted_r2(y, &self.predict(x).view(), w)
    }
}

/// Weighted R². A constant target scores 1 when predicted exactly, else 0.
pub fn weighted_r2(y: &ArrayView1<'_, f64>, pred: &ArrayView1<'_, f64>, w: &ArrayView1<'_, f64>) -> f64 {
    let total_weight = w.sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let mean = (y * w).sum() / total_weight;

    let residual: f64 = y
        .iter()
        .zip(pred.iter())
        .zip(w.iter())
        .map(|((&yi, &pi), &wi)| wi * (yi - pi).powi(2))
        .sum();
    let total: f64 = y
        .iter()
        .zip(w.iter())
        .map(|(&yi, &wi)| wi * (yi - mean).powi(2))
        .sum();

    if total == 0.0 {
        return if residual == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - residual / total
}

/// Fit a weighted ridge regression with an unpenalized intercept.
pub fn fit_weighted_ridge(
    x: &ArrayView2<'_, f64>,
    y: &ArrayView1<'_, f64>,
    w: &ArrayView1<'_, f64>,
    alpha: f64,
) -> Result<RidgeFit> {
    let (n, p) = x.dim();
    if y.len() != n || w.len() != n {
        return Err(XaiError::dimension_mismatch(
            format!("{} targets and weights", n),
            format!("{} targets, {} weights", y.len(), w.len()),
        ));
    }
    if n == 0 {
        return Err(XaiError::numerical("Cannot fit ridge regression on zero rows"));
    }
    if alpha < 0.0 {
        return Err(XaiError::invalid_parameter(
            "alpha",
            alpha.to_string(),
            "must be non-negative",
        ));
    }

    let total_weight = w.sum();
    if total_weight <= 0.0 {
        return Err(XaiError::numerical("Sample weights sum to zero"));
    }

    let x_mean = x.t().dot(w) / total_weight;
    let y_mean = y.dot(w) / total_weight;

    if p == 0 {
        return Ok(RidgeFit {
            coef: Array1::zeros(0),
            intercept: y_mean,
        });
    }

    let xc = x - &x_mean.view().insert_axis(Axis(0));
    let yc = y.mapv(|v| v - y_mean);
    let xw = &xc * &w.view().insert_axis(Axis(1));

    let mut gram = xw.t().dot(&xc);
    for i in 0..p {
        gram[[i, i]] += alpha;
    }
    let rhs = xw.t().dot(&yc);

    let coef = match solve(gram.clone(), rhs.clone()) {
        Some(coef) => coef,
        None => {
            let jitter = 1e-10 * (1.0 + gram.diag().sum() / p as f64);
            log::debug!("Singular ridge system, retrying with jitter {:.3e}", jitter);
            let mut regularized = gram;
            for i in 0..p {
                regularized[[i, i]] += jitter;
            }
            solve(regularized, rhs)
                .ok_or_else(|| XaiError::numerical("Ridge normal equations are singular"))?
        }
    };

    let intercept = y_mean - x_mean.dot(&coef);
    Ok(RidgeFit { coef, intercept })
}

/// Gaussian elimination with partial pivoting. None when singular.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() <= 1e-13 * scale {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}
