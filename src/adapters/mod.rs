//! Adapters exposing the estimators through other forecasting interfaces.

mod prophet;

pub use prophet::{AdapterConfig, AutoARIMAProphet};
