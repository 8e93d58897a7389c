//! # arima-prophet
//!
//! Prophet-compatible forecasting where the trend and noise are modelled by
//! an automatically selected ARIMA model.
//!
//! The Prophet feature pipeline turns timestamps into holiday, extra
//! regressor and (optionally) Fourier seasonality columns; AutoARIMA is fit
//! on the series as a regression with ARIMA errors on those columns.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod adapters;
pub mod core;
pub mod error;
pub mod models;
pub mod prophet;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::adapters::{AdapterConfig, AutoARIMAProphet};
    pub use crate::core::{Forecast, ForecastFrame, Frame, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::arima::{AutoARIMA, AutoARIMAConfig};
    pub use crate::models::Forecaster;
    pub use crate::prophet::{Frequency, HolidayEvent, ProphetConfig, SeasonalityMode, Standardize};
    pub use crate::utils::quantile_normal;
}
