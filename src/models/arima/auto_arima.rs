//! Automatic ARIMA and SARIMA model selection.
//!
//! Differencing orders come from unit-root and seasonal-strength tests; the
//! ARMA orders from a stepwise (Hyndman-Khandakar) or exhaustive search
//! ranked by an information criterion.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::seasonal_difference;
use crate::models::arima::model::{SARIMASpec, SARIMA};
use crate::models::Forecaster;
use crate::transform::boxcox::{boxcox, inv_boxcox_biasadj, inv_boxcox_value};
use crate::utils::ols::{ols_fit, ols_residuals};
use crate::utils::stats::{interval_multiplier, is_constant};
use crate::validation::{ndiffs, nsdiffs, SeasonalTest, UnitRootTest};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Interval level used to recover forecast variances for bias adjustment.
const BIASADJ_LEVEL: f64 = 0.8;

/// Criterion used to rank candidate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    Aic,
    #[default]
    Aicc,
    Bic,
}

impl InformationCriterion {
    fn score(self, model: &SARIMA) -> Option<f64> {
        match self {
            InformationCriterion::Aic => model.aic(),
            InformationCriterion::Aicc => model.aicc(),
            InformationCriterion::Bic => model.bic(),
        }
    }
}

/// Configuration for AutoARIMA.
///
/// Unset `d` / `cap_d` are chosen by the unit-root and seasonal tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoARIMAConfig {
    /// Fixed non-seasonal differencing order.
    pub d: Option<usize>,
    /// Fixed seasonal differencing order.
    #[serde(alias = "D")]
    pub cap_d: Option<usize>,
    pub max_p: usize,
    pub max_q: usize,
    #[serde(alias = "max_P")]
    pub max_cap_p: usize,
    #[serde(alias = "max_Q")]
    pub max_cap_q: usize,
    /// Upper bound on `p + q + P + Q`.
    pub max_order: usize,
    pub max_d: usize,
    #[serde(alias = "max_D")]
    pub max_cap_d: usize,
    pub start_p: usize,
    pub start_q: usize,
    #[serde(alias = "start_P")]
    pub start_cap_p: usize,
    #[serde(alias = "start_Q")]
    pub start_cap_q: usize,
    /// Restrict the search to stationary models (`d = D = 0`).
    pub stationary: bool,
    /// Consider seasonal terms when `seasonal_period > 1`.
    pub seasonal: bool,
    pub ic: InformationCriterion,
    /// Stepwise neighbourhood search instead of the full grid.
    pub stepwise: bool,
    /// Maximum number of models tried by the stepwise search.
    pub nmodels: usize,
    /// Log every candidate at `info` level.
    pub trace: bool,
    /// Search on the last `truncate` observations only.
    pub truncate: Option<usize>,
    pub test: UnitRootTest,
    pub seasonal_test: SeasonalTest,
    #[serde(alias = "allowdrift")]
    pub allow_drift: bool,
    #[serde(alias = "allowmean")]
    pub allow_mean: bool,
    /// Box-Cox lambda applied before fitting.
    pub blambda: Option<f64>,
    /// Back-transform point forecasts to means instead of medians.
    pub biasadj: bool,
    #[serde(alias = "period")]
    pub seasonal_period: usize,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            d: None,
            cap_d: None,
            max_p: 5,
            max_q: 5,
            max_cap_p: 2,
            max_cap_q: 2,
            max_order: 5,
            max_d: 2,
            max_cap_d: 1,
            start_p: 2,
            start_q: 2,
            start_cap_p: 1,
            start_cap_q: 1,
            stationary: false,
            seasonal: true,
            ic: InformationCriterion::Aicc,
            stepwise: true,
            nmodels: 94,
            trace: false,
            truncate: None,
            test: UnitRootTest::Kpss,
            seasonal_test: SeasonalTest::Seas,
            allow_drift: false,
            allow_mean: false,
            blambda: None,
            biasadj: false,
            seasonal_period: 1,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Fix the differencing orders instead of testing for them.
    pub fn with_differencing(mut self, d: Option<usize>, cap_d: Option<usize>) -> Self {
        self.d = d;
        self.cap_d = cap_d;
        self
    }

    pub fn with_ic(mut self, ic: InformationCriterion) -> Self {
        self.ic = ic;
        self
    }

    /// Allow a mean (undifferenced) and a drift (differenced once) term.
    pub fn with_constant_terms(mut self, allow_mean: bool, allow_drift: bool) -> Self {
        self.allow_mean = allow_mean;
        self.allow_drift = allow_drift;
        self
    }

    pub fn with_box_cox(mut self, lambda: f64, biasadj: bool) -> Self {
        self.blambda = Some(lambda);
        self.biasadj = biasadj;
        self
    }

    pub fn with_truncate(mut self, truncate: usize) -> Self {
        self.truncate = Some(truncate);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.nmodels == 0 {
            return Err(ForecastError::InvalidParameter(
                "nmodels must be at least 1".into(),
            ));
        }
        if self.seasonal_period == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be at least 1".into(),
            ));
        }
        if self.truncate == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "truncate must be positive".into(),
            ));
        }
        if let Some(lambda) = self.blambda {
            if !lambda.is_finite() {
                return Err(ForecastError::InvalidParameter(format!(
                    "Box-Cox lambda must be finite, got {lambda}"
                )));
            }
        }
        Ok(())
    }
}

/// Model order (p, d, q)(P, D, Q)\[s\] plus the constant flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelOrder {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period.
    pub s: usize,
    /// Mean or drift term.
    pub constant: bool,
}

impl ModelOrder {
    /// Check if this is a seasonal model.
    pub fn is_seasonal(&self) -> bool {
        self.spec().is_seasonal()
    }

    pub fn spec(&self) -> SARIMASpec {
        SARIMASpec::new(
            self.p, self.d, self.q, self.cap_p, self.cap_d, self.cap_q, self.s,
        )
    }

    fn arma_terms(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec())?;
        if self.constant {
            let term = if self.d + self.cap_d == 0 { "mean" } else { "drift" };
            write!(f, " with {term}")?;
        }
        Ok(())
    }
}

/// Search bounds derived from the configuration and the data.
#[derive(Debug, Clone, Copy)]
struct SearchSpace {
    d: usize,
    cap_d: usize,
    s: usize,
    max_p: usize,
    max_q: usize,
    max_cap_p: usize,
    max_cap_q: usize,
    max_order: usize,
    constant_allowed: bool,
}

impl SearchSpace {
    fn order(&self, p: usize, q: usize, cap_p: usize, cap_q: usize, constant: bool) -> ModelOrder {
        ModelOrder {
            p: p.min(self.max_p),
            d: self.d,
            q: q.min(self.max_q),
            cap_p: cap_p.min(self.max_cap_p),
            cap_d: self.cap_d,
            cap_q: cap_q.min(self.max_cap_q),
            s: self.s,
            constant: constant && self.constant_allowed,
        }
    }

    /// Start model of the stepwise search, trimmed to `max_order` terms
    /// from the seasonal side first.
    fn start_order(&self, config: &AutoARIMAConfig) -> ModelOrder {
        let mut order = self.order(
            config.start_p,
            config.start_q,
            config.start_cap_p,
            config.start_cap_q,
            true,
        );
        while order.arma_terms() > self.max_order {
            if order.cap_q > 0 {
                order.cap_q -= 1;
            } else if order.cap_p > 0 {
                order.cap_p -= 1;
            } else if order.q >= order.p {
                order.q -= 1;
            } else {
                order.p -= 1;
            }
        }
        order
    }

    fn admits(&self, order: &ModelOrder) -> bool {
        order.p <= self.max_p
            && order.q <= self.max_q
            && order.cap_p <= self.max_cap_p
            && order.cap_q <= self.max_cap_q
            && order.arma_terms() <= self.max_order
            && (!order.constant || self.constant_allowed)
    }

    /// Stepwise neighbours in the order they are tried.
    fn neighbours(&self, o: &ModelOrder) -> Vec<ModelOrder> {
        let step = |v: usize, delta: i64| -> Option<usize> {
            let next = v as i64 + delta;
            (next >= 0).then_some(next as usize)
        };
        let mut moves: Vec<(i64, i64, i64, i64)> = Vec::new();
        if self.s > 1 {
            for (dp, dq) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (-1, 1), (1, -1), (1, 1)] {
                moves.push((0, 0, dp, dq));
            }
        }
        for (dp, dq) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (-1, 1), (1, -1), (1, 1)] {
            moves.push((dp, dq, 0, 0));
        }

        let mut out = Vec::with_capacity(moves.len() + 1);
        for (dp, dq, dcp, dcq) in moves {
            let (Some(p), Some(q), Some(cap_p), Some(cap_q)) = (
                step(o.p, dp),
                step(o.q, dq),
                step(o.cap_p, dcp),
                step(o.cap_q, dcq),
            ) else {
                continue;
            };
            let candidate = ModelOrder {
                p,
                q,
                cap_p,
                cap_q,
                ..*o
            };
            if self.admits(&candidate) {
                out.push(candidate);
            }
        }
        if self.constant_allowed {
            out.push(ModelOrder {
                constant: !o.constant,
                ..*o
            });
        }
        out
    }
}

/// Candidate fits collected during a search.
struct Search<'a> {
    values: &'a [f64],
    regressors: &'a HashMap<String, Vec<f64>>,
    ic: InformationCriterion,
    trace: bool,
    nmodels: Option<usize>,
    visited: HashSet<ModelOrder>,
    scores: Vec<(ModelOrder, f64)>,
    best: Option<(ModelOrder, f64, SARIMA)>,
}

impl<'a> Search<'a> {
    /// Fit `order` unless already tried; returns whether it became the best.
    fn try_order(&mut self, order: ModelOrder) -> bool {
        if self.visited.contains(&order) {
            return false;
        }
        if let Some(limit) = self.nmodels {
            if self.visited.len() >= limit {
                return false;
            }
        }
        self.visited.insert(order);

        let mut model = SARIMA::from_spec(order.spec()).with_constant(order.constant);
        let score = match model.fit_values(self.values, self.regressors) {
            Ok(()) => self.ic.score(&model).filter(|s| s.is_finite()),
            Err(err) => {
                debug!(order = %order, error = %err, "candidate failed");
                None
            }
        };
        let Some(score) = score else {
            return false;
        };

        if self.trace {
            info!(order = %order, score, "candidate model");
        } else {
            debug!(order = %order, score, "candidate model");
        }
        self.scores.push((order, score));

        let improves = self.best.as_ref().map_or(true, |(_, best, _)| score < *best);
        if improves {
            self.best = Some((order, score, model));
        }
        improves
    }

    fn best_order(&self) -> Option<ModelOrder> {
        self.best.as_ref().map(|(order, _, _)| *order)
    }
}

/// Automatic ARIMA/SARIMA model selection.
///
/// Automatically selects the best ARIMA(p, d, q) or SARIMA(p, d, q)(P, D, Q)\[s\]
/// specification based on information criteria, optionally as a regression
/// with ARIMA errors when the series carries regressors.
///
/// # Example
///
/// ```
/// use arima_prophet::core::TimeSeries;
/// use arima_prophet::models::arima::{AutoARIMA, AutoARIMAConfig};
/// use arima_prophet::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..60).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..60).map(|i| 5.0 + 0.5 * i as f64 + (i % 3) as f64).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let config = AutoARIMAConfig::default().with_constant_terms(true, true);
/// let mut model = AutoARIMA::with_config(config);
/// model.fit(&series).unwrap();
///
/// let forecast = model.predict_with_intervals(7, 0.8).unwrap();
/// assert_eq!(forecast.horizon(), 7);
/// assert!(model.selected_full_order().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected_model: Option<SARIMA>,
    selected_order: Option<ModelOrder>,
    /// Candidate orders with their scores, best first.
    model_scores: Vec<(ModelOrder, f64)>,
    /// Fitted values and residuals on the scale of the input.
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected_model: None,
            selected_order: None,
            model_scores: Vec::new(),
            fitted: None,
            residuals: None,
        }
    }

    /// Create AutoARIMA with seasonal period.
    pub fn seasonal(period: usize) -> Self {
        Self::with_config(AutoARIMAConfig::default().with_seasonal_period(period))
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Get the selected non-seasonal order.
    pub fn selected_order(&self) -> Option<(usize, usize, usize)> {
        self.selected_order.map(|o| (o.p, o.d, o.q))
    }

    /// Get the full selected order including seasonal components.
    pub fn selected_full_order(&self) -> Option<ModelOrder> {
        self.selected_order
    }

    /// The selected model, fit on the (transformed) input.
    pub fn selected_model(&self) -> Option<&SARIMA> {
        self.selected_model.as_ref()
    }

    /// Get all model scores, best first.
    pub fn model_scores(&self) -> &[(ModelOrder, f64)] {
        &self.model_scores
    }

    /// Fit on raw values plus named regressors (empty map for none).
    pub fn fit_values(
        &mut self,
        values: &[f64],
        regressors: &HashMap<String, Vec<f64>>,
    ) -> Result<()> {
        self.config.validate()?;
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        for column in regressors.values() {
            if column.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: column.len(),
                });
            }
        }

        let x = match self.config.blambda {
            Some(lambda) => {
                let transformed = boxcox(values, lambda);
                if transformed.iter().any(|v| !v.is_finite()) {
                    return Err(ForecastError::InvalidParameter(
                        "Box-Cox transform needs strictly positive values".into(),
                    ));
                }
                transformed
            }
            None => values.to_vec(),
        };

        let n = x.len();
        let start = match self.config.truncate {
            Some(t) if t < n => n - t,
            _ => 0,
        };
        let search_x = &x[start..];
        let search_regressors: HashMap<String, Vec<f64>> = regressors
            .iter()
            .map(|(name, column)| (name.clone(), column[start..].to_vec()))
            .collect();

        let (best_order, scores, search_model) = if is_constant(search_x) {
            let order = ModelOrder {
                p: 0,
                d: 0,
                q: 0,
                cap_p: 0,
                cap_d: 0,
                cap_q: 0,
                s: 1,
                constant: true,
            };
            debug!("constant series, fitting a mean model");
            let mut model = SARIMA::from_spec(order.spec()).with_constant(true);
            model.fit_values(search_x, &search_regressors)?;
            (order, Vec::new(), model)
        } else {
            self.search(search_x, &search_regressors)?
        };

        let model = if start > 0 {
            let mut refit = SARIMA::from_spec(best_order.spec()).with_constant(best_order.constant);
            refit.fit_values(&x, regressors)?;
            refit
        } else {
            search_model
        };

        let fitted = match (self.config.blambda, model.fitted_values()) {
            (Some(lambda), Some(fitted)) => {
                let variance = model.sigma2().unwrap_or(0.0);
                fitted
                    .iter()
                    .map(|&f| self.back_transform_point(f, variance, lambda))
                    .collect()
            }
            (None, Some(fitted)) => fitted.to_vec(),
            (_, None) => return Err(ForecastError::FitRequired),
        };
        let residuals = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        info!(
            order = %best_order,
            candidates = scores.len(),
            n_obs = n,
            regressors = regressors.len(),
            "selected ARIMA model"
        );

        self.model_scores = scores;
        self.selected_order = Some(best_order);
        self.selected_model = Some(model);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    /// Choose differencing orders, then search ARMA orders.
    fn search(
        &self,
        x: &[f64],
        regressors: &HashMap<String, Vec<f64>>,
    ) -> Result<(ModelOrder, Vec<(ModelOrder, f64)>, SARIMA)> {
        let config = &self.config;
        let s = if config.seasonal { config.seasonal_period } else { 1 };

        let errors = if regressors.is_empty() {
            x.to_vec()
        } else {
            let ols = ols_fit(x, regressors)?;
            ols_residuals(x, &ols, regressors)?
        };

        let cap_d = if config.stationary || s <= 1 {
            0
        } else {
            config
                .cap_d
                .unwrap_or_else(|| nsdiffs(&errors, s, config.seasonal_test, config.max_cap_d))
        };
        let d = if config.stationary {
            0
        } else {
            config.d.unwrap_or_else(|| {
                ndiffs(
                    &seasonal_difference(&errors, cap_d, s),
                    config.test,
                    config.max_d,
                )
            })
        };
        debug!(d, cap_d, period = s, "differencing orders");

        let ic = if x.len() <= 3 {
            InformationCriterion::Aic
        } else {
            config.ic
        };
        let seasonal_terms = s > 1;
        let space = SearchSpace {
            d,
            cap_d,
            s,
            max_p: config.max_p,
            max_q: config.max_q,
            max_cap_p: if seasonal_terms { config.max_cap_p } else { 0 },
            max_cap_q: if seasonal_terms { config.max_cap_q } else { 0 },
            max_order: config.max_order,
            constant_allowed: (d + cap_d == 0 && config.allow_mean)
                || (d + cap_d == 1 && config.allow_drift),
        };

        let mut search = Search {
            values: x,
            regressors,
            ic,
            trace: config.trace,
            nmodels: config.stepwise.then_some(config.nmodels),
            visited: HashSet::new(),
            scores: Vec::new(),
            best: None,
        };

        if config.stepwise {
            Self::stepwise(&mut search, &space, config);
        } else {
            Self::exhaustive(&mut search, &space);
        }

        let mut scores = std::mem::take(&mut search.scores);
        scores.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let (order, _, model) = search.best.ok_or_else(|| {
            ForecastError::ComputationError("no ARIMA model could be fitted".into())
        })?;
        Ok((order, scores, model))
    }

    fn stepwise(search: &mut Search<'_>, space: &SearchSpace, config: &AutoARIMAConfig) {
        let seeds = [
            space.start_order(config),
            space.order(0, 0, 0, 0, true),
            space.order(1, 0, 1, 0, true),
            space.order(0, 1, 0, 1, true),
            space.order(0, 0, 0, 0, false),
        ];
        for seed in seeds {
            if space.admits(&seed) {
                search.try_order(seed);
            }
        }

        while let Some(current) = search.best_order() {
            let improved = space
                .neighbours(&current)
                .into_iter()
                .any(|candidate| search.try_order(candidate));
            if !improved {
                break;
            }
        }
    }

    fn exhaustive(search: &mut Search<'_>, space: &SearchSpace) {
        let constants: &[bool] = if space.constant_allowed {
            &[true, false]
        } else {
            &[false]
        };
        for p in 0..=space.max_p {
            for q in 0..=space.max_q {
                for cap_p in 0..=space.max_cap_p {
                    for cap_q in 0..=space.max_cap_q {
                        for &constant in constants {
                            let order = space.order(p, q, cap_p, cap_q, constant);
                            if space.admits(&order) {
                                search.try_order(order);
                            }
                        }
                    }
                }
            }
        }
    }

    fn back_transform_point(&self, value: f64, variance: f64, lambda: f64) -> f64 {
        if self.config.biasadj {
            inv_boxcox_biasadj(value, variance, lambda)
        } else {
            inv_boxcox_value(value, lambda)
        }
    }

    /// Map a transformed-scale forecast with bounds back to the data scale.
    fn back_transform(&self, forecast: &Forecast, level: f64, lambda: f64) -> Result<Forecast> {
        let lower = forecast.lower_series()?;
        let upper = forecast.upper_series()?;
        let z = interval_multiplier(level);

        let point = forecast
            .primary()
            .iter()
            .zip(lower.iter().zip(upper))
            .map(|(&p, (&lo, &hi))| {
                let sd = (hi - lo) / (2.0 * z);
                self.back_transform_point(p, sd * sd, lambda)
            })
            .collect();
        Ok(forecast
            .map_values(|v| inv_boxcox_value(v, lambda))
            .with_point(point))
    }

    fn forecast(
        &self,
        horizon: usize,
        future: Option<&HashMap<String, Vec<f64>>>,
        level: Option<f64>,
    ) -> Result<Forecast> {
        let model = self
            .selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;

        let Some(lambda) = self.config.blambda else {
            return match (future, level) {
                (Some(f), Some(l)) => model.predict_with_exog_intervals(horizon, f, l),
                (Some(f), None) => model.predict_with_exog(horizon, f),
                (None, Some(l)) => model.predict_with_intervals(horizon, l),
                (None, None) => model.predict(horizon),
            };
        };

        let band = level.unwrap_or(BIASADJ_LEVEL);
        let raw = match future {
            Some(f) => model.predict_with_exog_intervals(horizon, f, band)?,
            None => model.predict_with_intervals(horizon, band)?,
        };
        if raw.is_empty() {
            return Ok(raw);
        }
        let forecast = self.back_transform(&raw, band, lambda)?;
        Ok(match level {
            Some(_) => forecast,
            None => Forecast::from_values(forecast.primary().to_vec()),
        })
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
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
        self.fitted.as_deref()
    }

    fn fitted_values_with_intervals(&self, level: f64) -> Option<Forecast> {
        let model = self.selected_model.as_ref()?;
        let band = model.fitted_values_with_intervals(level)?;
        match self.config.blambda {
            Some(lambda) => self.back_transform(&band, level, lambda).ok(),
            None => Some(band),
        }
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        match &self.selected_order {
            Some(order) if order.is_seasonal() => "AutoARIMA (SARIMA)",
            _ => "AutoARIMA",
        }
    }

    fn supports_exog(&self) -> bool {
        true
    }

    fn has_exog(&self) -> bool {
        self.selected_model
            .as_ref()
            .is_some_and(|model| model.has_exog())
    }

    fn exog_names(&self) -> Option<&[String]> {
        self.selected_model.as_ref()?.exog_names()
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_timestamps(n: usize) -> Vec<chrono::DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::hours(i as i64)).collect()
    }

    fn lcg_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::univariate(make_timestamps(values.len()), values).unwrap()
    }

    #[test]
    fn auto_arima_selects_model() {
        let values: Vec<f64> = (0..100)
            .map(|i| 10.0 + (i as f64 * 0.2).sin())
            .zip(lcg_noise(100, 1))
            .map(|(a, b)| a + 0.2 * b)
            .collect();

        let mut model = AutoARIMA::new();
        model.fit(&series(values)).unwrap();

        assert!(model.selected_order().is_some());
        assert!(!model.model_scores().is_empty());
        assert_eq!(model.predict(5).unwrap().horizon(), 5);
        assert_eq!(model.fitted_values().unwrap().len(), 100);
    }

    #[test]
    fn auto_arima_ar_process() {
        let shocks = lcg_noise(200, 3);
        let mut values = vec![0.0];
        for i in 1..200 {
            values.push(0.8 * values[i - 1] + shocks[i]);
        }

        let config = AutoARIMAConfig::default().with_differencing(Some(0), None);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(values)).unwrap();

        let order = model.selected_full_order().unwrap();
        assert!(order.p >= 1 || order.q >= 1);
        assert_eq!(order.d, 0);
    }

    #[test]
    fn auto_arima_with_drift_continues_trend() {
        let values: Vec<f64> = (0..100)
            .zip(lcg_noise(100, 5))
            .map(|(i, e)| 10.0 + 1.5 * i as f64 + e)
            .collect();
        let last = *values.last().unwrap();

        let config = AutoARIMAConfig::default().with_constant_terms(true, true);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(values)).unwrap();

        let order = model.selected_full_order().unwrap();
        assert_eq!(order.d, 1);
        assert!(order.constant);

        let forecast = model.predict(10).unwrap();
        assert!(forecast.primary()[9] > last + 10.0);
    }

    #[test]
    fn auto_arima_exhaustive_covers_the_grid() {
        let values: Vec<f64> = (0..100)
            .zip(lcg_noise(100, 9))
            .map(|(i, e)| 10.0 + i as f64 * 0.5 + e)
            .collect();

        let config = AutoARIMAConfig::default().exhaustive().with_max_orders(2, 2, 2);
        let mut exhaustive = AutoARIMA::with_config(config);
        exhaustive.fit(&series(values)).unwrap();

        // Every (p, q) in 0..=2 with the tested d.
        assert_eq!(exhaustive.model_scores().len(), 9);
        assert_eq!(
            exhaustive.model_scores()[0].0,
            exhaustive.selected_full_order().unwrap()
        );
    }

    #[test]
    fn auto_arima_model_scores_sorted_and_bounded() {
        let values: Vec<f64> = (0..100)
            .map(|i| 10.0 + (i as f64 * 0.3).sin())
            .zip(lcg_noise(100, 11))
            .map(|(a, b)| a + 0.3 * b)
            .collect();

        let config = AutoARIMAConfig {
            nmodels: 3,
            ..Default::default()
        };
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(values)).unwrap();

        let scores = model.model_scores();
        assert!(scores.len() <= 3);
        for i in 1..scores.len() {
            assert!(scores[i].1 >= scores[i - 1].1);
        }
        assert_eq!(scores[0].0, model.selected_full_order().unwrap());
    }

    #[test]
    fn auto_arima_confidence_intervals() {
        let values: Vec<f64> = (0..100)
            .zip(lcg_noise(100, 13))
            .map(|(i, e)| 10.0 + i as f64 * 0.5 + e)
            .collect();

        let mut model = AutoARIMA::new();
        model.fit(&series(values)).unwrap();

        let forecast = model.predict_with_intervals(5, 0.95).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        for (i, p) in forecast.primary().iter().enumerate() {
            assert!(lower[i] <= *p && *p <= upper[i]);
        }

        let in_sample = model.fitted_values_with_intervals(0.8).unwrap();
        assert_eq!(in_sample.horizon(), 100);
    }

    #[test]
    fn seasonal_pattern_is_differenced() {
        let pattern = [5.0, 8.0, 2.0, 0.0, -3.0, 1.0];
        let values: Vec<f64> = (0..72)
            .zip(lcg_noise(72, 17))
            .map(|(i, e)| 20.0 + pattern[i % 6] + 0.05 * e)
            .collect();

        let mut model = AutoARIMA::seasonal(6);
        model.fit(&series(values)).unwrap();

        let order = model.selected_full_order().unwrap();
        assert_eq!(order.cap_d, 1);
        assert_eq!(model.name(), "AutoARIMA (SARIMA)");

        let forecast = model.predict(6).unwrap();
        for (h, v) in forecast.primary().iter().enumerate() {
            assert_relative_eq!(*v, 20.0 + pattern[(72 + h) % 6], epsilon = 0.5);
        }
    }

    #[test]
    fn constant_series_gets_mean_model() {
        let mut model = AutoARIMA::new();
        model.fit(&series(vec![4.0; 30])).unwrap();

        let order = model.selected_full_order().unwrap();
        assert_eq!((order.p, order.d, order.q), (0, 0, 0));
        assert!(order.constant);
        for v in model.predict(3).unwrap().primary() {
            assert_relative_eq!(*v, 4.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn two_observations_are_enough() {
        let mut model = AutoARIMA::new();
        model.fit(&series(vec![1.0, 2.0])).unwrap();
        assert_eq!(model.predict_with_intervals(2, 0.8).unwrap().horizon(), 2);
    }

    #[test]
    fn box_cox_keeps_forecasts_positive() {
        let values: Vec<f64> = (0..80)
            .zip(lcg_noise(80, 19))
            .map(|(i, e)| (0.03 * i as f64 + 0.05 * e).exp())
            .collect();

        let config = AutoARIMAConfig::default().with_box_cox(0.0, false);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(values.clone())).unwrap();

        let forecast = model.predict_with_intervals(10, 0.95).unwrap();
        assert!(forecast.lower().unwrap().iter().all(|v| *v > 0.0));
        assert!(model.fitted_values().unwrap().iter().all(|v| *v > 0.0));

        // The bias-adjusted mean sits above the back-transformed median.
        let config = AutoARIMAConfig::default().with_box_cox(0.0, true);
        let mut adjusted = AutoARIMA::with_config(config);
        adjusted.fit(&series(values)).unwrap();
        let mean = adjusted.predict(5).unwrap();
        let median = model.predict(5).unwrap();
        assert!(mean.primary()[4] > median.primary()[4]);
    }

    #[test]
    fn box_cox_rejects_non_positive_values() {
        let config = AutoARIMAConfig::default().with_box_cox(0.5, false);
        let mut model = AutoARIMA::with_config(config);
        assert!(matches!(
            model.fit(&series(vec![1.0, 0.0, 2.0, 3.0])),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn truncate_searches_the_tail_and_refits_everything() {
        let values: Vec<f64> = (0..120)
            .zip(lcg_noise(120, 23))
            .map(|(i, e)| 3.0 + 0.2 * i as f64 + e)
            .collect();

        let config = AutoARIMAConfig::default().with_truncate(40);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(values)).unwrap();

        assert_eq!(model.fitted_values().unwrap().len(), 120);
        assert_eq!(model.residuals().unwrap().len(), 120);
    }

    #[test]
    fn missing_values_are_rejected() {
        let mut model = AutoARIMA::new();
        assert!(matches!(
            model.fit(&series(vec![1.0, f64::NAN, 3.0])),
            Err(ForecastError::MissingValues)
        ));
    }

    #[test]
    fn auto_arima_requires_fit() {
        let model = AutoARIMA::new();
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert!(model.fitted_values_with_intervals(0.8).is_none());
    }

    #[test]
    fn config_deserializes_with_defaults_and_aliases() {
        let config: AutoARIMAConfig = serde_json::from_str(
            r#"{"max_p": 3, "D": 1, "ic": "bic", "allowdrift": true, "period": 7, "test": "adf"}"#,
        )
        .unwrap();
        assert_eq!(config.max_p, 3);
        assert_eq!(config.cap_d, Some(1));
        assert_eq!(config.ic, InformationCriterion::Bic);
        assert!(config.allow_drift);
        assert_eq!(config.seasonal_period, 7);
        assert_eq!(config.test, UnitRootTest::Adf);
        assert_eq!(config.nmodels, 94);

        let invalid = AutoARIMAConfig {
            nmodels: 0,
            ..Default::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn seasonal_start_model_is_trimmed_to_max_order() {
        let space = SearchSpace {
            d: 1,
            cap_d: 1,
            s: 12,
            max_p: 5,
            max_q: 5,
            max_cap_p: 2,
            max_cap_q: 2,
            max_order: 5,
            constant_allowed: false,
        };
        let start = space.start_order(&AutoARIMAConfig::default());
        assert_eq!((start.p, start.q, start.cap_p, start.cap_q), (2, 2, 1, 0));
        assert!(space.admits(&start));

        let tight = SearchSpace {
            max_order: 1,
            ..space
        };
        let start = tight.start_order(&AutoARIMAConfig::default());
        assert_eq!(start.arma_terms(), 1);
        assert!(tight.admits(&start));
    }

    #[test]
    fn seasonal_search_tries_the_start_model() {
        let pattern = [3.0, -1.0, 0.5, -2.5];
        let noise = lcg_noise(120, 29);
        let values: Vec<f64> = (0..120)
            .map(|i| 20.0 + pattern[i % 4] + 0.5 * noise[i])
            .collect();
        let config = AutoARIMAConfig::default().with_seasonal_period(4);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(values)).unwrap();

        assert!(model
            .model_scores()
            .iter()
            .any(|(o, _)| (o.p, o.q, o.cap_p, o.cap_q) == (2, 2, 1, 0)));
    }

    #[test]
    fn neighbours_respect_bounds() {
        let space = SearchSpace {
            d: 1,
            cap_d: 0,
            s: 1,
            max_p: 1,
            max_q: 1,
            max_cap_p: 0,
            max_cap_q: 0,
            max_order: 5,
            constant_allowed: true,
        };
        let origin = space.order(0, 0, 0, 0, false);
        let neighbours = space.neighbours(&origin);
        assert!(neighbours.iter().all(|o| o.p <= 1 && o.q <= 1));
        assert!(neighbours.iter().any(|o| o.constant));
        assert_eq!(neighbours.len(), 4);
    }
}
