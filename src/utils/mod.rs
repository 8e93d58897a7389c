//! Numerical utilities shared by the models.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, ols_residuals, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{interval_multiplier, quantile_normal};
