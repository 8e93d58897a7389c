//! Stationarity and seasonality tests used to choose differencing orders.
//!
//! # Example
//!
//! ```
//! use arima_prophet::validation::{kpss_test, ndiffs, UnitRootTest};
//!
//! let trend: Vec<f64> = (0..100).map(|i| i as f64).collect();
//! assert!(!kpss_test(&trend, None).is_stationary);
//! assert!(ndiffs(&trend, UnitRootTest::Kpss, 2) >= 1);
//! ```

pub mod stationarity;

pub use stationarity::{
    adf_test, is_stationary, kpss_test, ndiffs, nsdiffs, seasonal_strength, CriticalValues,
    SeasonalTest, StationarityResult, UnitRootTest, SEASONAL_STRENGTH_THRESHOLD,
};
