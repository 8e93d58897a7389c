//! Core data structures for time series forecasting.

mod forecast;
mod frame;
mod time_series;

pub use forecast::Forecast;
pub use frame::{Column, ForecastFrame, ForecastRow, Frame, DS, Y};
pub use time_series::{CalendarAnnotations, TimeSeries};
