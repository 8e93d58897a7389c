//! Prophet-style feature pipeline.
//!
//! Turns a `ds` column into seasonality, holiday and extra-regressor
//! features. The pipeline does not fit a trend; it prepares the regressors
//! that a downstream estimator consumes.
//!
//! # Example
//!
//! ```
//! use arima_prophet::core::Frame;
//! use arima_prophet::prophet::{Prophet, ProphetConfig};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
//! let ds: Vec<_> = (0..60).map(|i| start + Duration::days(i)).collect();
//! let y: Vec<f64> = (0..60).map(|i| (i % 7) as f64).collect();
//! let frame = Frame::from_history(ds, y).unwrap();
//!
//! let mut pipeline = Prophet::new(ProphetConfig::default()).unwrap();
//! let history = pipeline.setup_dataframe(&frame, true).unwrap();
//! pipeline.set_auto_seasonalities(&history).unwrap();
//! let features = pipeline.make_all_seasonality_features(&history).unwrap();
//!
//! // Weekly seasonality of order 3 gives six Fourier columns.
//! assert_eq!(features.matrix.n_columns(), 6);
//! assert_eq!(features.matrix.names()[0], "weekly_delim_1");
//! ```

mod config;
mod features;
mod future;
mod holidays;
mod regressors;
mod seasonality;

pub use config::{Growth, HolidayEvent, ProphetConfig, SeasonalityMode, SeasonalityToggle};
pub use features::{ComponentColumns, ComponentModes, FeatureMatrix, SeasonalFeatures};
pub use future::{future_dates, Frequency};
pub use holidays::{holiday_features, HolidayFeatures};
pub use regressors::{ExtraRegressor, Standardize};
pub use seasonality::{days_since_epoch, fourier_series, Seasonality};

use crate::core::{Frame, DS, Y};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use config::validate_name;
use tracing::{debug, info};

/// Name of the placeholder column used when there are no features.
pub const ZEROS: &str = "zeros";

const BUILTIN_SEASONALITIES: [&str; 3] = ["yearly", "weekly", "daily"];

/// Seasonality, holiday and regressor feature builder.
#[derive(Debug, Clone)]
pub struct Prophet {
    config: ProphetConfig,
    /// User-added seasonalities first, then the built-in ones.
    seasonalities: Vec<Seasonality>,
    extra_regressors: Vec<ExtraRegressor>,
    history: Option<Frame>,
    history_dates: Vec<DateTime<Utc>>,
}

impl Default for Prophet {
    fn default() -> Self {
        Self {
            config: ProphetConfig::default(),
            seasonalities: Vec::new(),
            extra_regressors: Vec::new(),
            history: None,
            history_dates: Vec::new(),
        }
    }
}

impl Prophet {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: ProphetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seasonalities: Vec::new(),
            extra_regressors: Vec::new(),
            history: None,
            history_dates: Vec::new(),
        })
    }

    pub fn config(&self) -> &ProphetConfig {
        &self.config
    }

    pub fn seasonalities(&self) -> &[Seasonality] {
        &self.seasonalities
    }

    pub fn seasonality(&self, name: &str) -> Option<&Seasonality> {
        self.seasonalities.iter().find(|s| s.name == name)
    }

    pub fn extra_regressors(&self) -> &[ExtraRegressor] {
        &self.extra_regressors
    }

    /// The prepared history, once fit.
    pub fn history(&self) -> Option<&Frame> {
        self.history.as_ref()
    }

    /// Distinct, sorted history timestamps.
    pub fn history_dates(&self) -> &[DateTime<Utc>] {
        &self.history_dates
    }

    pub fn is_fitted(&self) -> bool {
        self.history.is_some()
    }

    fn holiday_names(&self) -> impl Iterator<Item = &str> {
        self.config
            .holidays
            .iter()
            .flatten()
            .map(|event| event.holiday.as_str())
    }

    /// Add a custom seasonality, or replace one with the same name.
    ///
    /// `prior_scale` and `mode` default to the configured seasonality prior
    /// and mode. With `condition_name`, the terms are zero on rows where
    /// that boolean column is false.
    pub fn add_seasonality(
        &mut self,
        name: &str,
        period: f64,
        fourier_order: usize,
        prior_scale: Option<f64>,
        mode: Option<SeasonalityMode>,
        condition_name: Option<&str>,
    ) -> Result<&mut Self> {
        if self.is_fitted() {
            return Err(ForecastError::AlreadyFitted);
        }
        if !BUILTIN_SEASONALITIES.contains(&name) {
            validate_name(name)?;
            if self.holiday_names().any(|h| h == name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "name '{name}' already used for a holiday"
                )));
            }
            if self.extra_regressors.iter().any(|r| r.name == name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "name '{name}' already used for an added regressor"
                )));
            }
        }
        if let Some(condition) = condition_name {
            validate_name(condition)?;
        }
        if !(period > 0.0 && period.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonality period must be positive, got {period}"
            )));
        }
        if fourier_order == 0 {
            return Err(ForecastError::InvalidParameter(
                "fourier_order must be > 0".to_string(),
            ));
        }
        let prior_scale = prior_scale.unwrap_or(self.config.seasonality_prior_scale);
        if !(prior_scale > 0.0 && prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "prior scale must be > 0".to_string(),
            ));
        }

        let mut seasonality = Seasonality::new(name, period, fourier_order)
            .with_prior_scale(prior_scale)
            .with_mode(mode.unwrap_or(self.config.seasonality_mode));
        if let Some(condition) = condition_name {
            seasonality = seasonality.with_condition(condition);
        }
        self.upsert_seasonality(seasonality);
        Ok(self)
    }

    fn upsert_seasonality(&mut self, seasonality: Seasonality) {
        match self
            .seasonalities
            .iter_mut()
            .find(|s| s.name == seasonality.name)
        {
            Some(existing) => *existing = seasonality,
            None => self.seasonalities.push(seasonality),
        }
    }

    /// Add an extra regressor read from the frame column `name`.
    ///
    /// `prior_scale` defaults to the holidays prior scale and `mode` to the
    /// seasonality mode.
    pub fn add_regressor(
        &mut self,
        name: &str,
        prior_scale: Option<f64>,
        standardize: Standardize,
        mode: Option<SeasonalityMode>,
    ) -> Result<&mut Self> {
        if self.is_fitted() {
            return Err(ForecastError::AlreadyFitted);
        }
        validate_name(name)?;
        if self.holiday_names().any(|h| h == name) {
            return Err(ForecastError::InvalidParameter(format!(
                "name '{name}' already used for a holiday"
            )));
        }
        if self.seasonality(name).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "name '{name}' already used for a seasonality"
            )));
        }
        let prior_scale = prior_scale.unwrap_or(self.config.holidays_prior_scale);
        if !(prior_scale > 0.0 && prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "prior scale must be > 0".to_string(),
            ));
        }

        let regressor = ExtraRegressor::new(
            name,
            prior_scale,
            mode.unwrap_or(self.config.seasonality_mode),
        )
        .with_standardize(standardize);
        match self.extra_regressors.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = regressor,
            None => self.extra_regressors.push(regressor),
        }
        Ok(self)
    }

    /// Validate a frame and prepare it for feature construction.
    ///
    /// Rows are sorted by `ds` and extra regressors standardised. With
    /// `initialize_scales` the standardisation scales are learnt from this
    /// frame first.
    pub fn setup_dataframe(&mut self, frame: &Frame, initialize_scales: bool) -> Result<Frame> {
        let df = self.checked_frame(frame)?;
        if initialize_scales {
            for regressor in &mut self.extra_regressors {
                regressor.initialize_scale(df.require_values(&regressor.name)?);
            }
        }
        self.standardized(df)
    }

    /// [`Prophet::setup_dataframe`] with the scales learnt at fit time.
    pub fn transform_dataframe(&self, frame: &Frame) -> Result<Frame> {
        let df = self.checked_frame(frame)?;
        self.standardized(df)
    }

    fn checked_frame(&self, frame: &Frame) -> Result<Frame> {
        frame.require_timestamps(DS)?;
        if let Some(y) = frame.values(Y) {
            if y.iter().any(|v| v.is_infinite()) {
                return Err(ForecastError::InvalidParameter(
                    "found infinity in column y".to_string(),
                ));
            }
        }

        let mut df = frame.sorted_by_timestamp(DS)?;
        if self.config.growth == Growth::Logistic {
            df.require_values("cap")?;
            if !df.has_column("floor") {
                df.set_values("floor", vec![0.0; df.len()])?;
            }
        }
        for regressor in &self.extra_regressors {
            let values = df.require_values(&regressor.name)?;
            if values.iter().any(|v| v.is_nan()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "found NaN in column '{}'",
                    regressor.name
                )));
            }
        }
        for seasonality in &self.seasonalities {
            if let Some(condition) = &seasonality.condition_name {
                df.require_values(condition)?;
            }
        }
        Ok(df)
    }

    fn standardized(&self, mut df: Frame) -> Result<Frame> {
        for regressor in &self.extra_regressors {
            let scaled = regressor.standardize_values(df.require_values(&regressor.name)?);
            df.set_values(&regressor.name, scaled)?;
        }
        Ok(df)
    }

    /// Switch the built-in seasonalities on or off from the history span and
    /// spacing.
    pub fn set_auto_seasonalities(&mut self, history: &Frame) -> Result<()> {
        let ds = history.require_timestamps(DS)?;
        let (Some(first), Some(last)) = (ds.iter().min(), ds.iter().max()) else {
            return Err(ForecastError::EmptyData);
        };
        let span = *last - *first;
        let mut sorted = ds.to_vec();
        sorted.sort();
        let min_dt = sorted
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|dt| *dt > Duration::zero())
            .min();
        let spaced_at_least = |limit: Duration| min_dt.is_some_and(|dt| dt >= limit);

        let builtins = [
            (
                "yearly",
                self.config.yearly_seasonality,
                365.25,
                10,
                span < Duration::days(730),
            ),
            (
                "weekly",
                self.config.weekly_seasonality,
                7.0,
                3,
                span < Duration::weeks(2) || spaced_at_least(Duration::weeks(1)),
            ),
            (
                "daily",
                self.config.daily_seasonality,
                1.0,
                4,
                span < Duration::days(2) || spaced_at_least(Duration::days(1)),
            ),
        ];

        for (name, toggle, period, default_order, auto_disable) in builtins {
            if toggle == SeasonalityToggle::Auto {
                if self.seasonality(name).is_some() {
                    info!("found custom seasonality named '{name}', disabling built-in '{name}' seasonality");
                    continue;
                }
                if auto_disable {
                    info!("disabling {name} seasonality; set {name}_seasonality to enable it");
                }
            }
            let order = toggle.resolve(default_order, auto_disable);
            if order > 0 {
                self.upsert_seasonality(
                    Seasonality::new(name, period, order)
                        .with_prior_scale(self.config.seasonality_prior_scale)
                        .with_mode(self.config.seasonality_mode),
                );
            }
        }
        Ok(())
    }

    /// Build every feature column for a prepared frame.
    ///
    /// Columns come in the order seasonalities, holidays, extra regressors.
    /// With none of those, a single `zeros` column is returned.
    pub fn make_all_seasonality_features(&self, frame: &Frame) -> Result<SeasonalFeatures> {
        let dates = frame.require_timestamps(DS)?;
        let mut features = SeasonalFeatures {
            matrix: FeatureMatrix::new(dates.len()),
            ..Default::default()
        };

        for seasonality in &self.seasonalities {
            let condition = seasonality
                .condition_name
                .as_deref()
                .map(|c| frame.require_values(c))
                .transpose()?;
            let names = seasonality.column_names();
            for (name, column) in names.iter().zip(seasonality.features(dates, condition)) {
                features
                    .matrix
                    .push(name.clone(), column, seasonality.prior_scale)?;
            }
            features.components.extend(&seasonality.name, names);
            features.modes.push(seasonality.mode, &seasonality.name);
        }

        let mut holiday_names = Vec::new();
        if let Some(holidays) = self.config.holidays.as_deref().filter(|h| !h.is_empty()) {
            let hf = holiday_features(dates, holidays, self.config.holidays_prior_scale);
            for ((name, column), prior) in hf.names.iter().zip(&hf.columns).zip(&hf.prior_scales) {
                features.matrix.push(name.clone(), column.clone(), *prior)?;
            }
            for holiday in &hf.holiday_names {
                features.components.extend(holiday, hf.columns_of(holiday));
                features.modes.push(self.config.seasonality_mode, holiday);
            }
            holiday_names = hf.holiday_names;
        }

        for regressor in &self.extra_regressors {
            let column = frame.require_values(&regressor.name)?;
            features
                .matrix
                .push(regressor.name.clone(), column.to_vec(), regressor.prior_scale)?;
            features
                .components
                .extend(&regressor.name, [regressor.name.clone()]);
            features.modes.push(regressor.mode, &regressor.name);
        }

        if features.matrix.is_empty() {
            features
                .matrix
                .push(ZEROS, vec![0.0; dates.len()], 1.0)?;
        }

        features.components.add_group("holidays", &holiday_names);
        for mode in [SeasonalityMode::Additive, SeasonalityMode::Multiplicative] {
            let terms = format!("{}_terms", mode.as_str());
            let extra = format!("extra_regressors_{}", mode.as_str());
            let members = features.modes.get(mode).to_vec();
            features.components.add_group(&terms, &members);
            let by_mode: Vec<String> = self
                .extra_regressors
                .iter()
                .filter(|r| r.mode == mode)
                .map(|r| r.name.clone())
                .collect();
            features.components.add_group(&extra, &by_mode);
            features.modes.push(mode, terms);
            features.modes.push(mode, extra);
        }
        features.modes.push(self.config.seasonality_mode, "holidays");

        debug!(
            rows = dates.len(),
            columns = features.matrix.n_columns(),
            "built seasonality features"
        );
        Ok(features)
    }

    /// Store the prepared history; later additions are rejected.
    pub(crate) fn record_history(&mut self, history: Frame, dates: Vec<DateTime<Utc>>) {
        self.history = Some(history);
        self.history_dates = dates;
    }

    /// Frame of `periods` future dates after the history, optionally
    /// preceded by the history dates.
    pub fn make_future_dataframe(
        &self,
        periods: usize,
        freq: Frequency,
        include_history: bool,
    ) -> Result<Frame> {
        let last = *self.history_dates.last().ok_or(ForecastError::FitRequired)?;
        let future = future_dates(last, periods, freq)?;
        let dates = if include_history {
            let mut all = self.history_dates.clone();
            all.extend(future);
            all
        } else {
            future
        };
        Frame::from_dates(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dates(n: usize, step: Duration) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + step * i as i32).collect()
    }

    fn frame(n: usize, step: Duration) -> Frame {
        Frame::from_history(dates(n, step), (0..n).map(|i| i as f64).collect()).unwrap()
    }

    fn pipeline() -> Prophet {
        Prophet::new(ProphetConfig::default()).unwrap()
    }

    fn auto_names(history: &Frame) -> Vec<String> {
        let mut p = pipeline();
        p.set_auto_seasonalities(history).unwrap();
        p.seasonalities().iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn auto_seasonalities_follow_history_span_and_spacing() {
        assert_eq!(auto_names(&frame(10, Duration::days(1))), Vec::<String>::new());
        assert_eq!(auto_names(&frame(30, Duration::days(1))), vec!["weekly"]);
        assert_eq!(auto_names(&frame(800, Duration::days(1))), vec!["yearly", "weekly"]);
        assert_eq!(auto_names(&frame(400, Duration::hours(1))), vec!["weekly", "daily"]);
        // Weekly data has no sub-weekly seasonality.
        assert_eq!(auto_names(&frame(120, Duration::weeks(1))), vec!["yearly"]);
    }

    #[test]
    fn explicit_toggles_override_auto() {
        let config = ProphetConfig::default()
            .with_weekly_seasonality(SeasonalityToggle::Disabled)
            .with_yearly_seasonality(SeasonalityToggle::FourierOrder(2))
            .with_daily_seasonality(SeasonalityToggle::Enabled);
        let mut p = Prophet::new(config).unwrap();
        p.set_auto_seasonalities(&frame(30, Duration::days(1))).unwrap();

        assert!(p.seasonality("weekly").is_none());
        assert_eq!(p.seasonality("yearly").unwrap().fourier_order, 2);
        assert_eq!(p.seasonality("daily").unwrap().fourier_order, 4);
    }

    #[test]
    fn custom_seasonality_wins_over_auto() {
        let mut p = pipeline();
        p.add_seasonality("weekly", 7.0, 5, None, None, None).unwrap();
        p.set_auto_seasonalities(&frame(30, Duration::days(1))).unwrap();
        assert_eq!(p.seasonalities().len(), 1);
        assert_eq!(p.seasonality("weekly").unwrap().fourier_order, 5);
    }

    #[test]
    fn add_seasonality_validates_inputs() {
        let mut p = pipeline();
        assert!(p.add_seasonality("holidays", 7.0, 3, None, None, None).is_err());
        assert!(p.add_seasonality("a_delim_b", 7.0, 3, None, None, None).is_err());
        assert!(p.add_seasonality("monthly", 0.0, 3, None, None, None).is_err());
        assert!(p.add_seasonality("monthly", 30.5, 0, None, None, None).is_err());
        assert!(p.add_seasonality("monthly", 30.5, 3, Some(-1.0), None, None).is_err());

        p.add_seasonality("monthly", 30.5, 3, None, Some(SeasonalityMode::Multiplicative), None)
            .unwrap();
        let monthly = p.seasonality("monthly").unwrap();
        assert_eq!(monthly.prior_scale, 10.0);
        assert_eq!(monthly.mode, SeasonalityMode::Multiplicative);

        p.add_regressor("temp", None, Standardize::Auto, None).unwrap();
        assert!(p.add_seasonality("temp", 7.0, 1, None, None, None).is_err());
        assert!(p.add_regressor("monthly", None, Standardize::Auto, None).is_err());
    }

    #[test]
    fn additions_rejected_after_fit() {
        let mut p = pipeline();
        p.record_history(frame(10, Duration::days(1)), dates(10, Duration::days(1)));
        assert_eq!(
            p.add_seasonality("monthly", 30.5, 3, None, None, None).err(),
            Some(ForecastError::AlreadyFitted)
        );
        assert_eq!(
            p.add_regressor("x", None, Standardize::Auto, None).err(),
            Some(ForecastError::AlreadyFitted)
        );
    }

    #[test]
    fn setup_sorts_and_standardises() {
        let mut ds = dates(4, Duration::days(1));
        ds.reverse();
        let df = Frame::from_history(ds, vec![4.0, 3.0, 2.0, 1.0])
            .unwrap()
            .with_values("temp", vec![40.0, 30.0, 20.0, 10.0])
            .unwrap();

        let mut p = pipeline();
        p.add_regressor("temp", None, Standardize::Auto, None).unwrap();
        let prepared = p.setup_dataframe(&df, true).unwrap();

        assert_eq!(prepared.values(Y).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        let temp = prepared.values("temp").unwrap();
        assert!(temp[0] < 0.0 && temp[3] > 0.0);
        assert!(temp.iter().sum::<f64>().abs() < 1e-12);

        // Scales are kept from the history.
        let later = Frame::from_dates(dates(1, Duration::days(1)))
            .unwrap()
            .with_values("temp", vec![25.0])
            .unwrap();
        let prepared = p.setup_dataframe(&later, false).unwrap();
        assert!(prepared.values("temp").unwrap()[0].abs() < 1e-12);
        let transformed = p.transform_dataframe(&later).unwrap();
        assert_eq!(transformed, prepared);
    }

    #[test]
    fn setup_rejects_bad_frames() {
        let mut p = pipeline();
        assert_eq!(
            p.setup_dataframe(&Frame::new(), true).err(),
            Some(ForecastError::MissingColumn("ds".to_string()))
        );

        let infinite = Frame::from_history(dates(2, Duration::days(1)), vec![1.0, f64::INFINITY])
            .unwrap();
        assert!(p.setup_dataframe(&infinite, true).is_err());

        p.add_regressor("temp", None, Standardize::Auto, None).unwrap();
        let base = frame(3, Duration::days(1));
        assert_eq!(
            p.setup_dataframe(&base, true).err(),
            Some(ForecastError::MissingColumn("temp".to_string()))
        );
        let with_nan = base.with_values("temp", vec![1.0, f64::NAN, 2.0]).unwrap();
        assert!(matches!(
            p.setup_dataframe(&with_nan, true),
            Err(ForecastError::InvalidParameter(_))
        ));

        let mut logistic =
            Prophet::new(ProphetConfig::default().with_growth(Growth::Logistic)).unwrap();
        assert_eq!(
            logistic.setup_dataframe(&frame(3, Duration::days(1)), true).err(),
            Some(ForecastError::MissingColumn("cap".to_string()))
        );
        let capped = frame(3, Duration::days(1)).with_values("cap", vec![10.0; 3]).unwrap();
        let prepared = logistic.setup_dataframe(&capped, true).unwrap();
        assert_eq!(prepared.values("floor").unwrap(), &[0.0; 3]);
    }

    #[test]
    fn features_components_and_modes() {
        let xmas = Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap();
        let config = ProphetConfig::default()
            .with_holidays(vec![HolidayEvent::new("party", xmas).with_windows(0, 1)]);
        let mut p = Prophet::new(config).unwrap();
        p.add_regressor("promo", Some(3.0), Standardize::Auto, Some(SeasonalityMode::Multiplicative))
            .unwrap();

        let df = frame(30, Duration::days(1))
            .with_values("promo", (0..30).map(|i| (i % 2) as f64).collect())
            .unwrap();
        let history = p.setup_dataframe(&df, true).unwrap();
        p.set_auto_seasonalities(&history).unwrap();
        let features = p.make_all_seasonality_features(&history).unwrap();

        let names = features.matrix.names();
        assert_eq!(names.len(), 6 + 2 + 1);
        assert_eq!(names[6], "party_delim_+0");
        assert_eq!(names[8], "promo");
        assert_eq!(features.matrix.prior_scales()[8], 3.0);
        assert_eq!(features.matrix.column("party_delim_+0").unwrap()[4], 1.0);

        let components = &features.components;
        assert_eq!(components.get("weekly").unwrap().len(), 6);
        assert_eq!(components.get("holidays").unwrap().len(), 2);
        assert_eq!(components.get("extra_regressors_multiplicative").unwrap(), ["promo"]);
        assert_eq!(components.get("additive_terms").unwrap().len(), 8);
        assert!(!components.contains("extra_regressors_additive"));

        assert!(features.modes.additive.contains(&"weekly".to_string()));
        assert!(features.modes.additive.contains(&"holidays".to_string()));
        assert!(features.modes.multiplicative.contains(&"promo".to_string()));
    }

    #[test]
    fn zeros_placeholder_without_features() {
        let config = ProphetConfig::default()
            .with_weekly_seasonality(SeasonalityToggle::Disabled);
        let mut p = Prophet::new(config).unwrap();
        let history = p.setup_dataframe(&frame(20, Duration::days(1)), true).unwrap();
        p.set_auto_seasonalities(&history).unwrap();
        let features = p.make_all_seasonality_features(&history).unwrap();
        assert_eq!(features.matrix.names(), [ZEROS]);
        assert!(!features.components.contains(ZEROS));
    }

    #[test]
    fn conditional_seasonality_needs_its_column() {
        let mut p = pipeline();
        p.add_seasonality("on_season", 7.0, 2, None, None, Some("is_on"))
            .unwrap();
        let df = frame(10, Duration::days(1));
        assert_eq!(
            p.setup_dataframe(&df, true).err(),
            Some(ForecastError::MissingColumn("is_on".to_string()))
        );

        let flagged = df
            .with_values("is_on", (0..10).map(|i| (i < 5) as u8 as f64).collect())
            .unwrap();
        let prepared = p.setup_dataframe(&flagged, true).unwrap();
        let features = p.make_all_seasonality_features(&prepared).unwrap();
        let first = features.matrix.column("on_season_delim_2").unwrap();
        assert!(first[..5].iter().all(|v| *v != 0.0));
        assert!(first[5..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn future_dataframe_extends_history() {
        let mut p = pipeline();
        assert_eq!(
            p.make_future_dataframe(3, Frequency::Daily, false).err(),
            Some(ForecastError::FitRequired)
        );

        let ds = dates(5, Duration::days(1));
        p.record_history(frame(5, Duration::days(1)), ds.clone());
        let future = p.make_future_dataframe(3, Frequency::Daily, false).unwrap();
        assert_eq!(future.len(), 3);
        assert_eq!(future.timestamps(DS).unwrap()[0], ds[4] + Duration::days(1));

        let with_history = p.make_future_dataframe(3, Frequency::Daily, true).unwrap();
        assert_eq!(with_history.len(), 8);
        assert_eq!(with_history.timestamps(DS).unwrap()[..5], ds[..]);
    }
}
