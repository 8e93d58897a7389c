//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use std::collections::HashMap;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
/// Interval `level`s are fractions in `(0, 1)`, e.g. `0.8` for an 80% band.
pub trait Forecaster {
    /// Fit the model to the time series data.
    ///
    /// Regressors attached to the series (its `CalendarAnnotations`) are used
    /// by models that support exogenous variables.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with prediction intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Fitted values with in-sample intervals at `level`.
    fn fitted_values_with_intervals(&self, level: f64) -> Option<Forecast> {
        let _ = level;
        self.fitted_values()
            .map(|values| Forecast::from_values(values.to_vec()))
    }

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }

    /// Whether the model can use exogenous regressors at all.
    fn supports_exog(&self) -> bool {
        false
    }

    /// Whether the fitted model uses exogenous regressors.
    fn has_exog(&self) -> bool {
        false
    }

    /// Names of the regressors the model was fit with, sorted.
    fn exog_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict with future regressor values, one entry per fitted regressor.
    fn predict_with_exog(
        &self,
        horizon: usize,
        future_regressors: &HashMap<String, Vec<f64>>,
    ) -> Result<Forecast> {
        if future_regressors.is_empty() {
            self.predict(horizon)
        } else {
            Err(ForecastError::InvalidParameter(format!(
                "{} does not support exogenous regressors",
                self.name()
            )))
        }
    }

    /// Predict with future regressor values and intervals at `level`.
    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future_regressors: &HashMap<String, Vec<f64>>,
        level: f64,
    ) -> Result<Forecast> {
        if future_regressors.is_empty() {
            self.predict_with_intervals(horizon, level)
        } else {
            Err(ForecastError::InvalidParameter(format!(
                "{} does not support exogenous regressors",
                self.name()
            )))
        }
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use arima_prophet::models::arima::ARIMA;
/// use arima_prophet::models::{BoxedForecaster, Forecaster};
///
/// let model: BoxedForecaster = Box::new(ARIMA::new(1, 0, 0));
/// assert_eq!(model.name(), "ARIMA");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Last-value model relying on every default method.
    struct LastValue {
        fitted: Option<Vec<f64>>,
        residuals: Option<Vec<f64>>,
    }

    impl Forecaster for LastValue {
        fn fit(&mut self, series: &TimeSeries) -> Result<()> {
            let values = series.primary_values();
            let mut fitted = vec![values[0]];
            fitted.extend_from_slice(&values[..values.len() - 1]);
            self.residuals = Some(values.iter().zip(&fitted).map(|(a, b)| a - b).collect());
            self.fitted = Some(fitted);
            Ok(())
        }

        fn predict(&self, horizon: usize) -> Result<Forecast> {
            let fitted = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
            let last = *fitted.last().ok_or(ForecastError::EmptyData)?;
            Ok(Forecast::from_values(vec![last; horizon]))
        }

        fn fitted_values(&self) -> Option<&[f64]> {
            self.fitted.as_deref()
        }

        fn residuals(&self) -> Option<&[f64]> {
            self.residuals.as_deref()
        }

        fn name(&self) -> &str {
            "LastValue"
        }
    }

    fn make_series(n: usize) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, (0..n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn default_methods_fall_back_to_point_forecasts() {
        let mut model: BoxedForecaster = Box::new(LastValue {
            fitted: None,
            residuals: None,
        });
        assert!(!model.is_fitted());
        assert!(model.fitted_values_with_intervals(0.8).is_none());

        model.fit(&make_series(10)).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict_with_intervals(3, 0.9).unwrap();
        assert_eq!(forecast.horizon(), 3);
        assert!(!forecast.has_lower());

        let in_sample = model.fitted_values_with_intervals(0.8).unwrap();
        assert_eq!(in_sample.horizon(), 10);
    }

    #[test]
    fn default_exog_support_is_absent() {
        let mut model = LastValue {
            fitted: None,
            residuals: None,
        };
        model.fit(&make_series(5)).unwrap();

        assert!(!model.supports_exog());
        assert!(!model.has_exog());
        assert!(model.exog_names().is_none());

        let empty = HashMap::new();
        assert_eq!(model.predict_with_exog(2, &empty).unwrap().horizon(), 2);

        let mut future = HashMap::new();
        future.insert("x".to_string(), vec![1.0, 2.0]);
        assert!(matches!(
            model.predict_with_exog_intervals(2, &future, 0.8),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
