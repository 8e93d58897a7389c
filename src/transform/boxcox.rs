//! Box-Cox power transformation and its inverse.

/// Threshold below which lambda is treated as zero (log transform).
const LAMBDA_EPS: f64 = 1e-10;

/// Apply Box-Cox with a fixed `lambda`.
///
/// `(x^λ - 1) / λ`, or `ln x` when `λ == 0`. Non-positive inputs map to `NaN`
/// unless `λ == 1`, which is a plain shift.
pub fn boxcox(series: &[f64], lambda: f64) -> Vec<f64> {
    series.iter().map(|&x| boxcox_value(x, lambda)).collect()
}

fn boxcox_value(x: f64, lambda: f64) -> f64 {
    if (lambda - 1.0).abs() < LAMBDA_EPS {
        return x - 1.0;
    }
    if x <= 0.0 {
        return f64::NAN;
    }
    if lambda.abs() < LAMBDA_EPS {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

/// Inverse Box-Cox transformation.
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| inv_boxcox_value(y, lambda))
        .collect()
}

/// Inverse of a single transformed value.
pub fn inv_boxcox_value(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_EPS {
        return y.exp();
    }
    if (lambda - 1.0).abs() < LAMBDA_EPS {
        return y + 1.0;
    }
    let base = lambda * y + 1.0;
    if base <= 0.0 {
        // Back-transform of points outside the domain clamps at zero.
        0.0
    } else {
        base.powf(1.0 / lambda)
    }
}

/// Bias-adjusted inverse for a forecast mean with variance `variance` on the
/// transformed scale.
///
/// Returns the mean (rather than the median) of the back-transformed
/// distribution under a second-order approximation.
pub fn inv_boxcox_biasadj(mean: f64, variance: f64, lambda: f64) -> f64 {
    let median = inv_boxcox_value(mean, lambda);
    if !variance.is_finite() || variance <= 0.0 {
        return median;
    }
    if lambda.abs() < LAMBDA_EPS {
        return median * (1.0 + 0.5 * variance);
    }
    let base = lambda * mean + 1.0;
    if base <= 0.0 {
        return median;
    }
    median * (1.0 + 0.5 * variance * (1.0 - lambda) / (base * base))
}
