//! AutoARIMA behind a Prophet-style interface.
//!
//! The Prophet feature pipeline builds holiday and extra-regressor columns
//! (and, optionally, Fourier seasonality terms); AutoARIMA is then fit as a
//! regression with ARIMA errors on those columns.

use crate::core::{Forecast, ForecastFrame, Frame, TimeSeries, DS, Y};
use crate::error::{ForecastError, Result};
use crate::models::arima::{AutoARIMA, AutoARIMAConfig};
use crate::models::Forecaster;
use crate::prophet::{
    ComponentColumns, ComponentModes, Frequency, Prophet, ProphetConfig, SeasonalityMode,
    Standardize, ZEROS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Both halves of the adapter configuration.
///
/// # Example
///
/// ```
/// use arima_prophet::adapters::AdapterConfig;
///
/// let config = AdapterConfig::from_json(
///     r#"{"prophet": {"interval_width": 0.9}, "arima": {"max_p": 3}}"#,
/// )
/// .unwrap();
/// assert_eq!(config.prophet.interval_width, 0.9);
/// assert_eq!(config.arima.max_p, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub prophet: ProphetConfig,
    pub arima: AutoARIMAConfig,
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ForecastError::InvalidParameter(format!("invalid configuration: {e}")))
    }
}

/// Interval level handed to AutoARIMA: whole percent, rounded down.
fn interval_level(interval_width: f64) -> Result<f64> {
    let percent = (100.0 * interval_width).floor();
    if percent < 1.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "interval_width {interval_width} is below one percent"
        )));
    }
    Ok(percent / 100.0)
}

/// Prophet-compatible forecaster backed by AutoARIMA.
///
/// # Example
///
/// ```
/// use arima_prophet::adapters::AutoARIMAProphet;
/// use arima_prophet::core::Frame;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let ds: Vec<_> = (0..40).map(|i| start + Duration::days(i)).collect();
/// let y: Vec<f64> = (0..40).map(|i| 10.0 + (i % 5) as f64 + 0.1 * i as f64).collect();
///
/// let mut model = AutoARIMAProphet::default();
/// model.fit(&Frame::from_history(ds, y).unwrap(), true).unwrap();
///
/// let future = model
///     .make_future_dataframe(7, "D".parse().unwrap(), false)
///     .unwrap();
/// let forecast = model.predict(Some(&future)).unwrap();
/// assert_eq!(forecast.len(), 7);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoARIMAProphet {
    pipeline: Prophet,
    arima_config: AutoARIMAConfig,
    arima: Option<AutoARIMA>,
    xreg_cols: Vec<String>,
    component_columns: ComponentColumns,
    component_modes: ComponentModes,
}

impl AutoARIMAProphet {
    /// Create an unfitted adapter. Only the pipeline configuration is
    /// validated here; AutoARIMA checks its own at fit time.
    pub fn new(prophet: ProphetConfig, arima: AutoARIMAConfig) -> Result<Self> {
        Ok(Self {
            pipeline: Prophet::new(prophet)?,
            arima_config: arima,
            ..Default::default()
        })
    }

    pub fn from_config(config: AdapterConfig) -> Result<Self> {
        Self::new(config.prophet, config.arima)
    }

    pub fn prophet_config(&self) -> &ProphetConfig {
        self.pipeline.config()
    }

    pub fn arima_config(&self) -> &AutoARIMAConfig {
        &self.arima_config
    }

    /// The feature pipeline.
    pub fn pipeline(&self) -> &Prophet {
        &self.pipeline
    }

    /// Fitted AutoARIMA model.
    pub fn arima(&self) -> Option<&AutoARIMA> {
        self.arima.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.arima.is_some()
    }

    /// Prepared training frame (rows with an observed `y`, sorted).
    pub fn history(&self) -> Option<&Frame> {
        self.pipeline.history()
    }

    /// Distinct, sorted timestamps of the frame passed to [`fit`](Self::fit).
    pub fn history_dates(&self) -> &[DateTime<Utc>] {
        self.pipeline.history_dates()
    }

    /// Feature columns passed to AutoARIMA as regressors.
    pub fn xreg_cols(&self) -> &[String] {
        &self.xreg_cols
    }

    pub fn component_columns(&self) -> &ComponentColumns {
        &self.component_columns
    }

    pub fn component_modes(&self) -> &ComponentModes {
        &self.component_modes
    }

    pub fn add_seasonality(
        &mut self,
        name: &str,
        period: f64,
        fourier_order: usize,
        prior_scale: Option<f64>,
        mode: Option<SeasonalityMode>,
        condition_name: Option<&str>,
    ) -> Result<&mut Self> {
        self.pipeline
            .add_seasonality(name, period, fourier_order, prior_scale, mode, condition_name)?;
        Ok(self)
    }

    pub fn add_regressor(
        &mut self,
        name: &str,
        prior_scale: Option<f64>,
        standardize: Standardize,
        mode: Option<SeasonalityMode>,
    ) -> Result<&mut Self> {
        self.pipeline
            .add_regressor(name, prior_scale, standardize, mode)?;
        Ok(self)
    }

    pub fn make_future_dataframe(
        &self,
        periods: usize,
        freq: Frequency,
        include_history: bool,
    ) -> Result<Frame> {
        self.pipeline
            .make_future_dataframe(periods, freq, include_history)
    }

    /// Fit on a frame with `ds` and `y` columns plus any added regressors.
    ///
    /// Rows with a missing `y` are dropped. With `disable_seasonal_features`
    /// the Fourier columns are left out, so only holidays and extra
    /// regressors reach AutoARIMA.
    pub fn fit(&mut self, frame: &Frame, disable_seasonal_features: bool) -> Result<&mut Self> {
        if self.is_fitted() || self.pipeline.is_fitted() {
            return Err(ForecastError::AlreadyFitted);
        }
        let ds = frame.require_timestamps(DS)?;
        let y = frame.require_values(Y)?;

        let observed: Vec<bool> = y.iter().map(|v| !v.is_nan()).collect();
        let valid = frame.filter_rows(&observed)?;
        if valid.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: valid.len(),
            });
        }
        let mut history_dates = ds.to_vec();
        history_dates.sort();
        history_dates.dedup();

        let history = self.pipeline.setup_dataframe(&valid, true)?;
        self.pipeline.set_auto_seasonalities(&history)?;
        let features = self.pipeline.make_all_seasonality_features(&history)?;

        let mut matrix = features.matrix;
        if disable_seasonal_features {
            let prefixes: Vec<&str> = self
                .pipeline
                .seasonalities()
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            matrix = matrix.drop_prefixes(&prefixes);
        }
        let columns: Vec<String> = matrix
            .names()
            .iter()
            .filter(|name| name.as_str() != ZEROS)
            .cloned()
            .collect();
        let matrix = matrix.select(&columns)?;

        let series = TimeSeries::with_regressors(
            history.require_timestamps(DS)?.to_vec(),
            history.require_values(Y)?.to_vec(),
            matrix.to_regressors(),
        )?;
        let mut model = AutoARIMA::with_config(self.arima_config.clone());
        model.fit(&series)?;

        info!(
            observations = series.len(),
            regressors = columns.len(),
            order = %model
                .selected_full_order()
                .map(|o| o.to_string())
                .unwrap_or_default(),
            "fitted AutoARIMAProphet"
        );

        self.xreg_cols = columns;
        self.component_columns = features.components;
        self.component_modes = features.modes;
        self.pipeline.record_history(history, history_dates);
        self.arima = Some(model);
        Ok(self)
    }

    /// Forecast the timestamps of `frame`, or the fit history for `None`.
    ///
    /// Timestamps present in the training rows get in-sample fitted values;
    /// the rest are forecast as consecutive steps after the history. Rows
    /// come back in-sample first, each part sorted by `ds`, one row per
    /// distinct timestamp.
    pub fn predict(&self, frame: Option<&Frame>) -> Result<ForecastFrame> {
        let model = self.arima.as_ref().ok_or(ForecastError::FitRequired)?;
        let history = self.pipeline.history().ok_or(ForecastError::FitRequired)?;
        let df = match frame {
            None => history.clone(),
            Some(frame) if frame.is_empty() => return Err(ForecastError::EmptyData),
            Some(frame) => self.pipeline.transform_dataframe(frame)?,
        };

        let features = self.pipeline.make_all_seasonality_features(&df)?;
        let matrix = features.matrix.select(&self.xreg_cols)?;
        let level = interval_level(self.pipeline.config().interval_width)?;

        let requested = df.require_timestamps(DS)?;
        let trained = history.require_timestamps(DS)?;
        let mut in_sample: Vec<(DateTime<Utc>, usize)> = Vec::new();
        let mut out_of_sample: Vec<(DateTime<Utc>, usize)> = Vec::new();
        for (row, ds) in requested.iter().enumerate() {
            if row > 0 && requested[row - 1] == *ds {
                continue;
            }
            match trained.binary_search(ds) {
                Ok(position) => in_sample.push((*ds, position)),
                Err(_) => out_of_sample.push((*ds, row)),
            }
        }
        debug!(
            in_sample = in_sample.len(),
            horizon = out_of_sample.len(),
            level,
            "predicting"
        );

        let mut forecast = Forecast::new();
        if !in_sample.is_empty() {
            let fitted = model
                .fitted_values_with_intervals(level)
                .ok_or(ForecastError::FitRequired)?;
            let positions: Vec<usize> = in_sample.iter().map(|(_, p)| *p).collect();
            forecast = fitted.select(&positions)?;
        }
        if !out_of_sample.is_empty() {
            let horizon = out_of_sample.len();
            let rows: Vec<usize> = out_of_sample.iter().map(|(_, r)| *r).collect();
            let future = model.predict_with_exog_intervals(
                horizon,
                &matrix.take_rows(&rows).to_regressors(),
                level,
            )?;
            forecast = if in_sample.is_empty() {
                future
            } else {
                forecast.concat(future)
            };
        }

        let ds: Vec<DateTime<Utc>> = in_sample
            .iter()
            .chain(&out_of_sample)
            .map(|(ds, _)| *ds)
            .collect();
        ForecastFrame::new(
            ds,
            forecast.primary().to_vec(),
            forecast.lower_series()?.to_vec(),
            forecast.upper_series()?.to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prophet::{HolidayEvent, SeasonalityToggle};
    use chrono::{Duration, TimeZone};

    fn dates(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    fn noise(n: usize, seed: u64) -> Vec<f64> {
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

    fn weekly_frame(n: usize) -> Frame {
        let e = noise(n, 7);
        let y = (0..n)
            .map(|i| 20.0 + 3.0 * ((i % 7) as f64 - 3.0).abs() + e[i])
            .collect();
        Frame::from_history(dates(n), y).unwrap()
    }

    #[test]
    fn interval_level_rounds_down_to_whole_percent() {
        assert_eq!(interval_level(0.8).unwrap(), 0.8);
        assert_eq!(interval_level(0.955).unwrap(), 0.95);
        assert!(interval_level(0.005).is_err());
    }

    #[test]
    fn fit_records_state() {
        let mut model = AutoARIMAProphet::default();
        model.fit(&weekly_frame(60), true).unwrap();

        assert!(model.is_fitted());
        assert_eq!(model.history_dates().len(), 60);
        assert_eq!(model.history().unwrap().len(), 60);
        // Weekly seasonality is on but its columns are disabled.
        assert!(model.pipeline().seasonality("weekly").is_some());
        assert!(model.xreg_cols().is_empty());
        assert_eq!(model.component_columns().get("weekly").unwrap().len(), 6);
        assert!(model.arima().unwrap().selected_order().is_some());
    }

    #[test]
    fn seasonal_features_reach_arima_when_enabled() {
        let mut model = AutoARIMAProphet::default();
        model.fit(&weekly_frame(60), false).unwrap();
        assert_eq!(model.xreg_cols().len(), 6);
        assert_eq!(model.arima().unwrap().exog_names().unwrap().len(), 6);

        let future = model
            .make_future_dataframe(10, Frequency::Daily, false)
            .unwrap();
        let forecast = model.predict(Some(&future)).unwrap();
        assert_eq!(forecast.len(), 10);
        // Weekly shape carries into the forecast.
        let yhat = forecast.yhat();
        let spread = yhat.iter().cloned().fold(f64::MIN, f64::max)
            - yhat.iter().cloned().fold(f64::MAX, f64::min);
        assert!(spread > 3.0, "spread {spread}");
    }

    #[test]
    fn fit_rejects_bad_input() {
        let mut model = AutoARIMAProphet::default();
        let no_y = Frame::from_dates(dates(5)).unwrap();
        assert_eq!(
            model.fit(&no_y, true).err(),
            Some(ForecastError::MissingColumn("y".to_string()))
        );

        let one = Frame::from_history(dates(3), vec![1.0, f64::NAN, f64::NAN]).unwrap();
        assert!(matches!(
            model.fit(&one, true),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));

        let mut ds = dates(4);
        ds[3] = ds[2];
        let duplicated = Frame::from_history(ds, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(matches!(
            AutoARIMAProphet::default().fit(&duplicated, true),
            Err(ForecastError::TimestampError(_))
        ));
    }

    #[test]
    fn second_fit_fails() {
        let mut model = AutoARIMAProphet::default();
        model.fit(&weekly_frame(30), true).unwrap();
        assert_eq!(
            model.fit(&weekly_frame(30), true).err(),
            Some(ForecastError::AlreadyFitted)
        );
    }

    #[test]
    fn predict_requires_fit_and_rows() {
        let model = AutoARIMAProphet::default();
        assert_eq!(model.predict(None).err(), Some(ForecastError::FitRequired));

        let mut model = AutoARIMAProphet::default();
        model.fit(&weekly_frame(30), true).unwrap();
        let empty = Frame::from_dates(Vec::new()).unwrap();
        assert_eq!(model.predict(Some(&empty)).err(), Some(ForecastError::EmptyData));
    }

    #[test]
    fn mixed_requests_put_in_sample_first() {
        let mut model = AutoARIMAProphet::default();
        model.fit(&weekly_frame(30), true).unwrap();

        let all = dates(33);
        let request = Frame::from_dates(vec![all[31], all[5], all[30], all[5], all[32]]).unwrap();
        let forecast = model.predict(Some(&request)).unwrap();

        assert_eq!(forecast.ds(), &[all[5], all[30], all[31], all[32]]);
        let fitted = model.arima().unwrap().fitted_values().unwrap();
        assert!((forecast.yhat()[0] - fitted[5]).abs() < 1e-9);
        for row in forecast.rows() {
            assert!(row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper);
        }
    }

    #[test]
    fn holidays_and_regressors_become_xreg() {
        let n = 50;
        let launch = dates(n)[20];
        let config = ProphetConfig::default()
            .with_weekly_seasonality(SeasonalityToggle::Disabled)
            .with_holidays(vec![HolidayEvent::new("launch", launch).with_windows(0, 1)]);
        let mut model = AutoARIMAProphet::new(config, AutoARIMAConfig::default()).unwrap();
        model
            .add_regressor("price", None, Standardize::Auto, None)
            .unwrap();

        let e = noise(n, 11);
        let price: Vec<f64> = (0..n).map(|i| 5.0 + (i % 3) as f64).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| 50.0 - 2.0 * price[i] + if i == 20 || i == 21 { 8.0 } else { 0.0 } + e[i])
            .collect();
        let frame = Frame::from_history(dates(n), y)
            .unwrap()
            .with_values("price", price)
            .unwrap();
        model.fit(&frame, true).unwrap();

        assert_eq!(
            model.xreg_cols(),
            ["launch_delim_+0", "launch_delim_+1", "price"]
        );
        assert!(model.component_columns().contains("holidays"));

        // Future frames must carry the regressor.
        let future = model.make_future_dataframe(3, Frequency::Daily, false).unwrap();
        assert_eq!(
            model.predict(Some(&future)).err(),
            Some(ForecastError::MissingColumn("price".to_string()))
        );
        let future = future.with_values("price", vec![5.0, 6.0, 7.0]).unwrap();
        let forecast = model.predict(Some(&future)).unwrap();
        assert_eq!(forecast.len(), 3);
        assert!(forecast.yhat()[0] > forecast.yhat()[2]);
    }

    #[test]
    fn additions_after_fit_are_rejected() {
        let mut model = AutoARIMAProphet::default();
        model.fit(&weekly_frame(30), true).unwrap();
        assert_eq!(
            model
                .add_seasonality("monthly", 30.5, 3, None, None, None)
                .err(),
            Some(ForecastError::AlreadyFitted)
        );
    }
}
