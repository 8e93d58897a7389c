//! Ordinary least squares over named regressors.
//!
//! Used by the ARIMA family to fit a regression with ARIMA errors: the
//! regression removes the exogenous effect and the ARIMA process models
//! what is left.

use crate::error::{ForecastError, Result};
use std::collections::HashMap;

/// Fitted regression `y = intercept + Σ coefficient_i · x_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct OLSResult {
    /// One coefficient per regressor, in `regressor_names` order.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Regressor names, sorted.
    pub regressor_names: Vec<String>,
}

impl OLSResult {
    /// Evaluate the regression on new regressor values.
    ///
    /// Every fitted regressor must be present and all must share one length.
    pub fn predict(&self, regressors: &HashMap<String, Vec<f64>>) -> Result<Vec<f64>> {
        let columns = self.ordered_columns(regressors)?;
        let n = columns.first().map(|c| c.len()).unwrap_or(0);

        let mut predictions = vec![self.intercept; n];
        for (coef, column) in self.coefficients.iter().zip(&columns) {
            for (pred, x) in predictions.iter_mut().zip(column.iter()) {
                *pred += coef * x;
            }
        }
        Ok(predictions)
    }

    pub fn num_regressors(&self) -> usize {
        self.coefficients.len()
    }

    fn ordered_columns<'a>(
        &self,
        regressors: &'a HashMap<String, Vec<f64>>,
    ) -> Result<Vec<&'a [f64]>> {
        let mut columns = Vec::with_capacity(self.regressor_names.len());
        for name in &self.regressor_names {
            let values = regressors.get(name).ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "missing regressor '{}' in prediction data",
                    name
                ))
            })?;
            if let Some(first) = columns.first().map(|c: &&[f64]| c.len()) {
                if values.len() != first {
                    return Err(ForecastError::DimensionMismatch {
                        expected: first,
                        got: values.len(),
                    });
                }
            }
            columns.push(values.as_slice());
        }
        Ok(columns)
    }
}

/// Fit `y` on an intercept plus every regressor.
///
/// With no regressors the intercept is the mean of `y`.
pub fn ols_fit(y: &[f64], regressors: &HashMap<String, Vec<f64>>) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    let mut regressor_names: Vec<String> = regressors.keys().cloned().collect();
    regressor_names.sort();

    let mut design: Vec<Vec<f64>> = Vec::with_capacity(regressor_names.len() + 1);
    design.push(vec![1.0; n]);
    for name in &regressor_names {
        let values = &regressors[name];
        if values.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: values.len(),
            });
        }
        design.push(values.clone());
    }

    let k = design.len();
    let mut gram = vec![vec![0.0; k]; k];
    let mut rhs = vec![0.0; k];
    for i in 0..k {
        rhs[i] = dot(&design[i], y);
        for j in 0..=i {
            let v = dot(&design[i], &design[j]);
            gram[i][j] = v;
            gram[j][i] = v;
        }
    }

    // Ridge keeps all-zero or collinear columns solvable.
    let scale = (0..k).map(|i| gram[i][i]).sum::<f64>() / k as f64;
    let ridge = 1e-8 * scale.max(1.0);
    for (i, row) in gram.iter_mut().enumerate() {
        row[i] += ridge;
    }

    let beta = cholesky_solve(&gram, &rhs).ok_or_else(|| {
        ForecastError::ComputationError("OLS normal equations are not positive definite".into())
    })?;

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        regressor_names,
    })
}

/// Residuals `y - ŷ` of a fitted regression.
pub fn ols_residuals(
    y: &[f64],
    ols_result: &OLSResult,
    regressors: &HashMap<String, Vec<f64>>,
) -> Result<Vec<f64>> {
    let predictions = ols_result.predict(regressors)?;
    if predictions.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: y.len(),
            got: predictions.len(),
        });
    }
    Ok(y.iter().zip(&predictions).map(|(a, b)| a - b).collect())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solve `A x = b` for symmetric positive definite `A`.
fn cholesky_solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let partial: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            let value = a[i][j] - partial;
            if i == j {
                if value <= 0.0 || !value.is_finite() {
                    return None;
                }
                l[i][i] = value.sqrt();
            } else {
                l[i][j] = value / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let partial: f64 = (0..i).map(|k| l[i][k] * z[k]).sum();
        z[i] = (b[i] - partial) / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let partial: f64 = ((i + 1)..n).map(|k| l[k][i] * x[k]).sum();
        x[i] = (z[i] - partial) / l[i][i];
    }
    Some(x)
}
