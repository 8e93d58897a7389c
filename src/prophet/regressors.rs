//! Extra regressors supplied as frame columns.

use crate::prophet::config::SeasonalityMode;
use crate::utils::stats::{mean, variance};
use serde::{Deserialize, Serialize};

/// Whether a regressor is standardised before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standardize {
    /// Standardise unless the column is binary (only 0 and 1).
    #[default]
    Auto,
    Always,
    Never,
}

/// A user-supplied regressor column.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraRegressor {
    pub name: String,
    pub prior_scale: f64,
    pub standardize: Standardize,
    pub mode: SeasonalityMode,
    /// Centre, set from the history.
    pub mu: f64,
    /// Scale, set from the history.
    pub std: f64,
}

impl ExtraRegressor {
    pub fn new(name: impl Into<String>, prior_scale: f64, mode: SeasonalityMode) -> Self {
        Self {
            name: name.into(),
            prior_scale,
            standardize: Standardize::Auto,
            mode,
            mu: 0.0,
            std: 1.0,
        }
    }

    pub fn with_standardize(mut self, standardize: Standardize) -> Self {
        self.standardize = standardize;
        self
    }

    /// Learn `mu` and `std` from the history column.
    ///
    /// Columns with fewer than two distinct values, binary columns in
    /// `Auto` mode and `Never` keep the identity scaling.
    pub fn initialize_scale(&mut self, values: &[f64]) {
        self.mu = 0.0;
        self.std = 1.0;

        let mut distinct: Vec<f64> = values.to_vec();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        if distinct.len() < 2 {
            return;
        }
        let standardize = match self.standardize {
            Standardize::Always => true,
            Standardize::Never => false,
            Standardize::Auto => distinct != [0.0, 1.0],
        };
        if !standardize {
            return;
        }

        self.mu = mean(values);
        self.std = variance(values).sqrt();
    }

    pub fn standardize_values(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| (v - self.mu) / self.std).collect()
    }
}
