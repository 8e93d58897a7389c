//! ARIMA and seasonal ARIMA models with optional regression errors.
//!
//! Both models share one estimator. Given a series `y` and optional
//! regressors `X`, the regression part `y = β₀ + Xβ + z` is fit by OLS and the
//! error `z` follows a multiplicative seasonal ARIMA process
//!
//! ```text
//! w_t = (1 - B)^d (1 - B^s)^D z_t
//! φ(B) Φ(B^s) (w_t - μ) = θ(B) Θ(B^s) e_t
//! ```
//!
//! estimated by conditional sum of squares. The optional constant `μ` is a
//! mean when the model is undifferenced and a drift when it is differenced once.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{
    apply_polynomial, differencing_polynomial, lag_polynomial, poly_mul,
};
use crate::models::Forecaster;
use crate::utils::ols::{ols_fit, ols_residuals, OLSResult};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{interval_multiplier, mean};
use std::collections::HashMap;
use std::fmt;

/// Bound on every AR/MA coefficient during estimation.
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of ARMA coefficients.
    pub fn num_params(&self) -> usize {
        self.p + self.q
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Seasonal ARIMA specification `(p, d, q)(P, D, Q)[period]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SARIMASpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Seasonal AR order (P)
    pub cap_p: usize,
    /// Seasonal differencing order (D)
    pub cap_d: usize,
    /// Seasonal MA order (Q)
    pub cap_q: usize,
    /// Seasonal period; 1 means non-seasonal.
    pub period: usize,
}

impl SARIMASpec {
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        period: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            period: period.max(1),
        }
    }

    /// Number of ARMA coefficients, seasonal ones included.
    pub fn num_params(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    pub fn is_seasonal(&self) -> bool {
        self.period > 1 && self.cap_p + self.cap_d + self.cap_q > 0
    }

    /// Highest lag of the expanded AR polynomial.
    pub fn ar_order(&self) -> usize {
        self.p + self.cap_p * self.period
    }

    /// Highest lag of the expanded MA polynomial.
    pub fn ma_order(&self) -> usize {
        self.q + self.cap_q * self.period
    }

    /// Observations consumed by differencing.
    pub fn diff_order(&self) -> usize {
        self.d + self.cap_d * self.period
    }
}

impl From<ARIMASpec> for SARIMASpec {
    fn from(spec: ARIMASpec) -> Self {
        SARIMASpec::new(spec.p, spec.d, spec.q, 0, 0, 0, 1)
    }
}

impl fmt::Display for SARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(
                f,
                "({},{},{})[{}]",
                self.cap_p, self.cap_d, self.cap_q, self.period
            )?;
        }
        Ok(())
    }
}

/// Estimated coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
struct Coefficients {
    mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
}

impl Coefficients {
    /// Unpack an optimiser vector laid out as `[μ?, φ.., θ.., Φ.., Θ..]`.
    fn from_params(spec: &SARIMASpec, include_constant: bool, params: &[f64]) -> Self {
        let mut rest = params;
        let mut take = |k: usize| {
            let (head, tail) = rest.split_at(k);
            rest = tail;
            head.to_vec()
        };
        let mean = if include_constant { take(1)[0] } else { 0.0 };
        Self {
            mean,
            ar: take(spec.p),
            ma: take(spec.q),
            sar: take(spec.cap_p),
            sma: take(spec.cap_q),
        }
    }

    /// Expanded AR polynomial `φ(B)Φ(B^s)` and MA polynomial `θ(B)Θ(B^s)`.
    fn polynomials(&self, period: usize) -> (Vec<f64>, Vec<f64>) {
        let phi = poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.sar, period, -1.0),
        );
        let theta = poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.sma, period, 1.0),
        );
        (phi, theta)
    }
}

/// Conditional residuals of the differenced series `w`.
///
/// Residuals before the AR order are fixed at zero.
fn conditional_residuals(w: &[f64], mean: f64, phi: &[f64], theta: &[f64]) -> Vec<f64> {
    let ar_order = phi.len() - 1;
    let mut e = vec![0.0; w.len()];
    for t in ar_order..w.len() {
        let mut value = w[t] - mean;
        for (i, c) in phi.iter().enumerate().skip(1) {
            value += c * (w[t - i] - mean);
        }
        for (j, c) in theta.iter().enumerate().skip(1).take_while(|(j, _)| *j <= t) {
            value -= c * e[t - j];
        }
        e[t] = value;
    }
    e
}

fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

fn estimate(spec: &SARIMASpec, include_constant: bool, w: &[f64]) -> Coefficients {
    let n_params = spec.num_params() + usize::from(include_constant);
    let start_mean = mean(w);

    if spec.num_params() == 0 {
        return Coefficients {
            mean: if include_constant { start_mean } else { 0.0 },
            ..Default::default()
        };
    }

    let mut initial = Vec::with_capacity(n_params);
    let mut bounds = Vec::with_capacity(n_params);
    if include_constant {
        initial.push(start_mean);
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
    }
    for order in [spec.p, spec.q, spec.cap_p, spec.cap_q] {
        for i in 0..order {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
        }
    }

    let ar_order = spec.ar_order();
    let objective = |params: &[f64]| {
        let coefficients = Coefficients::from_params(spec, include_constant, params);
        let (phi, theta) = coefficients.polynomials(spec.period);
        let e = conditional_residuals(w, coefficients.mean, &phi, &theta);
        let css = sum_of_squares(&e[ar_order..]);
        if css.is_finite() {
            css
        } else {
            f64::INFINITY
        }
    };

    let config = NelderMeadConfig {
        max_iter: 500 * n_params,
        ..Default::default()
    };
    let result = nelder_mead(objective, &initial, Some(&bounds), config);
    Coefficients::from_params(spec, include_constant, &result.optimal_point)
}

/// Fitted state shared by ARIMA and SARIMA.
#[derive(Debug, Clone)]
struct FittedState {
    coefficients: Coefficients,
    /// `φ(B)Φ(B^s)`
    phi: Vec<f64>,
    /// `θ(B)Θ(B^s)`
    theta: Vec<f64>,
    /// `φ(B)Φ(B^s)(1-B)^d(1-B^s)^D`
    total: Vec<f64>,
    /// Regression errors `z`.
    errors: Vec<f64>,
    /// Innovations aligned with the input; zero during warm-up.
    residuals: Vec<f64>,
    fitted: Vec<f64>,
    sigma2: f64,
    loglik: f64,
    aic: f64,
    aicc: f64,
    bic: f64,
    n_used: usize,
}

/// Seasonal ARIMA model with optional regression errors.
///
/// # Example
///
/// ```
/// use arima_prophet::core::TimeSeries;
/// use arima_prophet::models::arima::SARIMA;
/// use arima_prophet::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..48).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..48).map(|i| 10.0 + [0.0, 3.0, 1.0, -2.0][i % 4]).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = SARIMA::new(0, 0, 0, 0, 1, 0, 4);
/// model.fit(&series).unwrap();
/// let forecast = model.predict(4).unwrap();
/// assert!((forecast.primary()[1] - 13.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    include_constant: bool,
    regression: Option<OLSResult>,
    state: Option<FittedState>,
}

impl SARIMA {
    /// Create an unfitted `(p, d, q)(P, D, Q)[period]` model without a constant.
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        period: usize,
    ) -> Self {
        Self::from_spec(SARIMASpec::new(p, d, q, cap_p, cap_d, cap_q, period))
    }

    pub fn from_spec(spec: SARIMASpec) -> Self {
        Self {
            spec,
            include_constant: false,
            regression: None,
            state: None,
        }
    }

    /// Include a mean (undifferenced) or drift (differenced once) term.
    pub fn with_constant(mut self, include_constant: bool) -> Self {
        self.include_constant = include_constant;
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn include_constant(&self) -> bool {
        self.include_constant
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        self.state.as_ref().map_or(&[], |s| &s.coefficients.ar)
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        self.state.as_ref().map_or(&[], |s| &s.coefficients.ma)
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        self.state.as_ref().map_or(&[], |s| &s.coefficients.sar)
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        self.state.as_ref().map_or(&[], |s| &s.coefficients.sma)
    }

    /// Mean or drift of the differenced errors (zero without a constant).
    pub fn constant(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.coefficients.mean)
    }

    /// Fitted regression, when the model was fit with regressors.
    pub fn regression(&self) -> Option<&OLSResult> {
        self.regression.as_ref()
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma2)
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.loglik)
    }

    pub fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic)
    }

    /// Small-sample corrected AIC; infinite when too few observations remain.
    pub fn aicc(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aicc)
    }

    pub fn bic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.bic)
    }

    /// Observations entering the conditional likelihood.
    pub fn n_used(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.n_used)
    }

    /// Fit on raw values plus named regressors (empty map for none).
    pub(crate) fn fit_values(
        &mut self,
        values: &[f64],
        regressors: &HashMap<String, Vec<f64>>,
    ) -> Result<()> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let spec = self.spec;
        if self.include_constant && spec.d + spec.cap_d > 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "a constant needs at most one difference, {spec} has {}",
                spec.d + spec.cap_d
            )));
        }

        let n_coef = spec.num_params() + usize::from(self.include_constant);
        let needed = spec.diff_order() + spec.ar_order() + n_coef + 1;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let regression = if regressors.is_empty() {
            None
        } else {
            Some(ols_fit(values, regressors)?)
        };
        let errors = match &regression {
            Some(ols) => ols_residuals(values, ols, regressors)?,
            None => values.to_vec(),
        };

        let delta = differencing_polynomial(spec.d, spec.cap_d, spec.period);
        let w = apply_polynomial(&errors, &delta);
        let coefficients = estimate(&spec, self.include_constant, &w);
        let (phi, theta) = coefficients.polynomials(spec.period);
        let total = poly_mul(&phi, &delta);

        let e = conditional_residuals(&w, coefficients.mean, &phi, &theta);
        let ar_order = spec.ar_order();
        let n_used = w.len() - ar_order;
        let sigma2 = sum_of_squares(&e[ar_order..]) / n_used as f64;

        let mut residuals = vec![0.0; values.len()];
        residuals[spec.diff_order()..].copy_from_slice(&e);
        let fitted = values.iter().zip(&residuals).map(|(y, r)| y - r).collect();

        let n_regression = regression
            .as_ref()
            .map_or(0, |ols| ols.num_regressors() + 1);
        let k = (n_coef + n_regression + 1) as f64;
        let n = n_used as f64;
        let loglik =
            -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2.max(f64::MIN_POSITIVE)).ln() + 1.0);
        let aic = -2.0 * loglik + 2.0 * k;
        let aicc = if n - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = -2.0 * loglik + k * n.ln();

        self.regression = regression;
        self.state = Some(FittedState {
            coefficients,
            phi,
            theta,
            total,
            errors,
            residuals,
            fitted,
            sigma2,
            loglik,
            aic,
            aicc,
            bic,
            n_used,
        });
        Ok(())
    }

    /// Regression contribution over the horizon.
    fn regression_forecast(
        &self,
        horizon: usize,
        future: Option<&HashMap<String, Vec<f64>>>,
    ) -> Result<Vec<f64>> {
        match (&self.regression, future) {
            (Some(ols), Some(future)) => {
                let values = ols.predict(future)?;
                if values.len() != horizon {
                    return Err(ForecastError::DimensionMismatch {
                        expected: horizon,
                        got: values.len(),
                    });
                }
                Ok(values)
            }
            (Some(_), None) => Err(ForecastError::InvalidParameter(
                "model was fit with exogenous regressors; use predict_with_exog() with future values"
                    .into(),
            )),
            (None, Some(future)) if !future.is_empty() => Err(ForecastError::InvalidParameter(
                "model was fit without exogenous regressors".into(),
            )),
            (None, _) => Ok(vec![0.0; horizon]),
        }
    }

    fn forecast(
        &self,
        horizon: usize,
        future: Option<&HashMap<String, Vec<f64>>>,
        level: Option<f64>,
    ) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        if let Some(level) = level {
            check_level(level)?;
        }
        let regression = self.regression_forecast(horizon, future)?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let constant = state.coefficients.mean * state.phi.iter().sum::<f64>();
        let n = state.errors.len();
        let mut z = state.errors.clone();
        let mut e = state.residuals.clone();
        for t in n..n + horizon {
            let mut value = constant;
            for (i, c) in state.total.iter().enumerate().skip(1) {
                value -= c * z[t - i];
            }
            for (j, c) in state.theta.iter().enumerate().skip(1) {
                if j <= t {
                    value += c * e[t - j];
                }
            }
            z.push(value);
            e.push(0.0);
        }

        let point: Vec<f64> = z[n..]
            .iter()
            .zip(&regression)
            .map(|(a, b)| a + b)
            .collect();

        let Some(level) = level else {
            return Ok(Forecast::from_values(point));
        };

        let multiplier = interval_multiplier(level);
        let psi = psi_weights(&state.total, &state.theta, horizon);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (p, w) in point.iter().zip(&psi) {
            cumulative += w * w;
            let half = multiplier * (state.sigma2 * cumulative).sqrt();
            lower.push(p - half);
            upper.push(p + half);
        }
        Ok(Forecast::from_values_with_intervals(point, lower, upper))
    }
}

/// MA(∞) weights of `θ(B) / total(B)`.
fn psi_weights(total: &[f64], theta: &[f64], horizon: usize) -> Vec<f64> {
    let mut psi = vec![0.0; horizon];
    if horizon == 0 {
        return psi;
    }
    psi[0] = 1.0;
    for j in 1..horizon {
        let mut value = theta.get(j).copied().unwrap_or(0.0);
        for (i, c) in total.iter().enumerate().skip(1).take_while(|(i, _)| *i <= j) {
            value -= c * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

fn check_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "interval level must be in (0, 1), got {level}"
        )))
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        self.fit_values(series.primary_values(), &series.all_regressors())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.forecast(horizon, None, None)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.forecast(horizon, None, Some(level))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn fitted_values_with_intervals(&self, level: f64) -> Option<Forecast> {
        let state = self.state.as_ref()?;
        check_level(level).ok()?;
        let half = interval_multiplier(level) * state.sigma2.sqrt();
        Some(Forecast::from_values_with_intervals(
            state.fitted.clone(),
            state.fitted.iter().map(|f| f - half).collect(),
            state.fitted.iter().map(|f| f + half).collect(),
        ))
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "SARIMA"
    }

    fn supports_exog(&self) -> bool {
        true
    }

    fn has_exog(&self) -> bool {
        self.regression.is_some()
    }

    fn exog_names(&self) -> Option<&[String]> {
        self.regression
            .as_ref()
            .map(|ols| ols.regressor_names.as_slice())
    }

    fn predict_with_exog(
        &self,
        horizon: usize,
        future_regressors: &HashMap<String, Vec<f64>>,
    ) -> Result<Forecast> {
        self.forecast(horizon, Some(future_regressors), None)
    }

    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future_regressors: &HashMap<String, Vec<f64>>,
        level: f64,
    ) -> Result<Forecast> {
        self.forecast(horizon, Some(future_regressors), Some(level))
    }
}

/// Non-seasonal ARIMA(p, d, q) model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
#[derive(Debug, Clone)]
pub struct ARIMA {
    inner: SARIMA,
}

impl ARIMA {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            inner: SARIMA::from_spec(ARIMASpec::new(p, d, q).into()),
        }
    }

    /// AR(p) model.
    pub fn ar(p: usize) -> Self {
        Self::new(p, 0, 0)
    }

    /// MA(q) model.
    pub fn ma(q: usize) -> Self {
        Self::new(0, 0, q)
    }

    /// Include a mean (d = 0) or drift (d = 1) term.
    pub fn with_constant(mut self, include_constant: bool) -> Self {
        self.inner = self.inner.with_constant(include_constant);
        self
    }

    pub fn spec(&self) -> ARIMASpec {
        let spec = self.inner.spec();
        ARIMASpec::new(spec.p, spec.d, spec.q)
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        self.inner.ar_coefficients()
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        self.inner.ma_coefficients()
    }

    pub fn constant(&self) -> Option<f64> {
        self.inner.constant()
    }

    pub fn sigma2(&self) -> Option<f64> {
        self.inner.sigma2()
    }

    pub fn aic(&self) -> Option<f64> {
        self.inner.aic()
    }

    pub fn aicc(&self) -> Option<f64> {
        self.inner.aicc()
    }

    pub fn bic(&self) -> Option<f64> {
        self.inner.bic()
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        let spec = ARIMASpec::default();
        Self::new(spec.p, spec.d, spec.q)
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.inner.fit(series)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.inner.predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.inner.predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.inner.fitted_values()
    }

    fn fitted_values_with_intervals(&self, level: f64) -> Option<Forecast> {
        self.inner.fitted_values_with_intervals(level)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner.residuals()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn supports_exog(&self) -> bool {
        true
    }

    fn has_exog(&self) -> bool {
        self.inner.has_exog()
    }

    fn exog_names(&self) -> Option<&[String]> {
        self.inner.exog_names()
    }

    fn predict_with_exog(
        &self,
        horizon: usize,
        future_regressors: &HashMap<String, Vec<f64>>,
    ) -> Result<Forecast> {
        self.inner.predict_with_exog(horizon, future_regressors)
    }

    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future_regressors: &HashMap<String, Vec<f64>>,
        level: f64,
    ) -> Result<Forecast> {
        self.inner
            .predict_with_exog_intervals(horizon, future_regressors, level)
    }
}
