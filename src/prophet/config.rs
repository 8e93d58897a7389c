//! Pipeline configuration: growth, seasonality toggles and holidays.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trend growth model. Stored for completeness; AutoARIMA models the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    #[default]
    Linear,
    /// Requires a `cap` column in every frame.
    Logistic,
    Flat,
}

/// How a component combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    #[default]
    Additive,
    Multiplicative,
}

impl SeasonalityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        }
    }
}

/// Setting for one of the built-in yearly, weekly and daily seasonalities.
///
/// In JSON this is `"auto"`, `true`, `false` or a Fourier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ToggleRepr", into = "ToggleRepr")]
pub enum SeasonalityToggle {
    /// Enabled when the history is long and dense enough.
    #[default]
    Auto,
    Enabled,
    Disabled,
    FourierOrder(usize),
}

impl SeasonalityToggle {
    /// Fourier order to use, given the default order and whether the
    /// history is too short for `Auto` to switch the seasonality on.
    pub(crate) fn resolve(self, default_order: usize, auto_disable: bool) -> usize {
        match self {
            SeasonalityToggle::Auto if auto_disable => 0,
            SeasonalityToggle::Auto | SeasonalityToggle::Enabled => default_order,
            SeasonalityToggle::Disabled => 0,
            SeasonalityToggle::FourierOrder(order) => order,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ToggleRepr {
    Flag(bool),
    Order(usize),
    Keyword(String),
}

impl TryFrom<ToggleRepr> for SeasonalityToggle {
    type Error = String;

    fn try_from(repr: ToggleRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ToggleRepr::Flag(true) => Ok(SeasonalityToggle::Enabled),
            ToggleRepr::Flag(false) => Ok(SeasonalityToggle::Disabled),
            ToggleRepr::Order(order) => Ok(SeasonalityToggle::FourierOrder(order)),
            ToggleRepr::Keyword(word) if word == "auto" => Ok(SeasonalityToggle::Auto),
            ToggleRepr::Keyword(word) => Err(format!(
                "expected \"auto\", a boolean or a Fourier order, got \"{word}\""
            )),
        }
    }
}

impl From<SeasonalityToggle> for ToggleRepr {
    fn from(toggle: SeasonalityToggle) -> Self {
        match toggle {
            SeasonalityToggle::Auto => ToggleRepr::Keyword("auto".to_string()),
            SeasonalityToggle::Enabled => ToggleRepr::Flag(true),
            SeasonalityToggle::Disabled => ToggleRepr::Flag(false),
            SeasonalityToggle::FourierOrder(order) => ToggleRepr::Order(order),
        }
    }
}

/// One occurrence of a holiday, with the window of days around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayEvent {
    pub holiday: String,
    pub ds: DateTime<Utc>,
    /// Days before the date that are also affected; `<= 0`.
    #[serde(default)]
    pub lower_window: i64,
    /// Days after the date that are also affected; `>= 0`.
    #[serde(default)]
    pub upper_window: i64,
    #[serde(default)]
    pub prior_scale: Option<f64>,
}

impl HolidayEvent {
    pub fn new(holiday: impl Into<String>, ds: DateTime<Utc>) -> Self {
        Self {
            holiday: holiday.into(),
            ds,
            lower_window: 0,
            upper_window: 0,
            prior_scale: None,
        }
    }

    pub fn with_windows(mut self, lower: i64, upper: i64) -> Self {
        self.lower_window = lower;
        self.upper_window = upper;
        self
    }

    pub fn with_prior_scale(mut self, prior_scale: f64) -> Self {
        self.prior_scale = Some(prior_scale);
        self
    }
}

/// Names that collide with generated columns or components.
const RESERVED_NAMES: &[&str] = &[
    "trend",
    "additive_terms",
    "daily",
    "weekly",
    "yearly",
    "holidays",
    "zeros",
    "extra_regressors_additive",
    "yhat",
    "extra_regressors_multiplicative",
    "multiplicative_terms",
];

/// Input columns that can never name a component.
const RESERVED_COLUMNS: &[&str] = &["ds", "y", "cap", "floor", "y_scaled", "cap_scaled"];

/// Separator between a component name and its column index.
pub(crate) const DELIM: &str = "_delim_";

/// Reject names that would clash with generated columns.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "name must not be empty".to_string(),
        ));
    }
    if name.contains(DELIM) {
        return Err(ForecastError::InvalidParameter(format!(
            "name '{name}' cannot contain '{DELIM}'"
        )));
    }
    let reserved = RESERVED_NAMES.iter().any(|r| {
        name == *r
            || name.strip_suffix("_lower") == Some(*r)
            || name.strip_suffix("_upper") == Some(*r)
    });
    if reserved || RESERVED_COLUMNS.contains(&name) {
        return Err(ForecastError::InvalidParameter(format!(
            "name '{name}' is reserved"
        )));
    }
    Ok(())
}

/// Configuration of the feature pipeline.
///
/// Trend, changepoint and sampling settings are accepted and validated so a
/// configuration can be shared with a full Prophet model, but the adapter
/// leaves the trend to AutoARIMA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProphetConfig {
    pub growth: Growth,
    pub changepoints: Option<Vec<DateTime<Utc>>>,
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub yearly_seasonality: SeasonalityToggle,
    pub weekly_seasonality: SeasonalityToggle,
    pub daily_seasonality: SeasonalityToggle,
    pub holidays: Option<Vec<HolidayEvent>>,
    pub seasonality_mode: SeasonalityMode,
    pub seasonality_prior_scale: f64,
    pub holidays_prior_scale: f64,
    pub changepoint_prior_scale: f64,
    pub mcmc_samples: usize,
    /// Width of the prediction intervals, in `(0, 1)`.
    pub interval_width: f64,
    pub uncertainty_samples: usize,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            growth: Growth::Linear,
            changepoints: None,
            n_changepoints: 25,
            changepoint_range: 0.8,
            yearly_seasonality: SeasonalityToggle::Auto,
            weekly_seasonality: SeasonalityToggle::Auto,
            daily_seasonality: SeasonalityToggle::Auto,
            holidays: None,
            seasonality_mode: SeasonalityMode::Additive,
            seasonality_prior_scale: 10.0,
            holidays_prior_scale: 10.0,
            changepoint_prior_scale: 0.05,
            mcmc_samples: 0,
            interval_width: 0.80,
            uncertainty_samples: 1000,
        }
    }
}

impl ProphetConfig {
    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    /// Explicit changepoints; `n_changepoints` follows their count.
    pub fn with_changepoints(mut self, changepoints: Vec<DateTime<Utc>>) -> Self {
        self.n_changepoints = changepoints.len();
        self.changepoints = Some(changepoints);
        self
    }

    pub fn with_yearly_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.yearly_seasonality = toggle;
        self
    }

    pub fn with_weekly_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.weekly_seasonality = toggle;
        self
    }

    pub fn with_daily_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.daily_seasonality = toggle;
        self
    }

    pub fn with_holidays(mut self, holidays: Vec<HolidayEvent>) -> Self {
        self.holidays = Some(holidays);
        self
    }

    pub fn with_seasonality_mode(mut self, mode: SeasonalityMode) -> Self {
        self.seasonality_mode = mode;
        self
    }

    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.seasonality_prior_scale = scale;
        self
    }

    pub fn with_holidays_prior_scale(mut self, scale: f64) -> Self {
        self.holidays_prior_scale = scale;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    /// Check every setting; called when the pipeline is created.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.changepoint_range) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in [0, 1], got {}",
                self.changepoint_range
            )));
        }
        for (name, scale) in [
            ("seasonality_prior_scale", self.seasonality_prior_scale),
            ("holidays_prior_scale", self.holidays_prior_scale),
            ("changepoint_prior_scale", self.changepoint_prior_scale),
        ] {
            if !(scale > 0.0 && scale.is_finite()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{name} must be positive, got {scale}"
                )));
            }
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if let Some(changepoints) = &self.changepoints {
            if changepoints.windows(2).any(|w| w[1] < w[0]) {
                return Err(ForecastError::InvalidParameter(
                    "changepoints must be sorted".to_string(),
                ));
            }
        }
        if let Some(holidays) = &self.holidays {
            self.validate_holidays(holidays)?;
        }
        Ok(())
    }

    fn validate_holidays(&self, holidays: &[HolidayEvent]) -> Result<()> {
        let mut priors: HashMap<&str, f64> = HashMap::new();
        for event in holidays {
            validate_name(&event.holiday)?;
            if event.lower_window > 0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "holiday '{}': lower_window should be <= 0",
                    event.holiday
                )));
            }
            if event.upper_window < 0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "holiday '{}': upper_window should be >= 0",
                    event.holiday
                )));
            }
            let prior = event.prior_scale.unwrap_or(self.holidays_prior_scale);
            if !(prior > 0.0 && prior.is_finite()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "holiday '{}': prior scale must be positive",
                    event.holiday
                )));
            }
            match priors.get(event.holiday.as_str()) {
                Some(&seen) if seen != prior => {
                    return Err(ForecastError::InvalidParameter(format!(
                        "holiday '{}' does not have a consistent prior scale",
                        event.holiday
                    )));
                }
                _ => {
                    priors.insert(&event.holiday, prior);
                }
            }
        }
        Ok(())
    }
}
