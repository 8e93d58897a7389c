//! Differencing and lag-polynomial helpers for ARIMA models.
//!
//! Lag polynomials are stored as coefficient vectors in powers of the
//! backshift operator `B`: `[1.0, -0.5]` is `1 - 0.5B`.

/// Apply `d` regular differences to a series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `d` seasonal differences of lag `period` to a series.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result[period..]
            .iter()
            .zip(&result)
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Product of two lag polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `(1 - B)^d (1 - B^period)^cap_d`.
pub fn differencing_polynomial(d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..cap_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// `1 + sign · Σ coefs[i] B^{(i+1)·stride}`.
///
/// Use `sign = -1.0` for AR factors and `sign = 1.0` for MA factors.
pub fn lag_polynomial(coefs: &[f64], stride: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * stride] = sign * c;
    }
    poly
}

/// Apply a lag polynomial as a filter: `out_t = Σ poly[i] x_{t+k-i}` where
/// `k = poly.len() - 1`. The output is `k` points shorter than the input.
pub fn apply_polynomial(series: &[f64], poly: &[f64]) -> Vec<f64> {
    let order = poly.len().saturating_sub(1);
    if poly.is_empty() || series.len() <= order {
        return Vec::new();
    }
    (order..series.len())
        .map(|t| poly.iter().enumerate().map(|(i, c)| c * series[t - i]).sum())
        .collect()
}
