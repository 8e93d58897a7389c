//! Fourier seasonality terms.

use crate::prophet::config::SeasonalityMode;
use chrono::{DateTime, Utc};
use std::f64::consts::PI;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days since the Unix epoch, with fractional days.
pub fn days_since_epoch(ds: &DateTime<Utc>) -> f64 {
    let seconds = ds.timestamp() as f64 + f64::from(ds.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY
}

/// Fourier basis of a periodic effect.
///
/// Returns `2 * order` columns ordered `sin(1), cos(1), sin(2), cos(2), ...`
/// where `k` in `sin(k)` is the harmonic of `2πkt / period` and `t` is
/// measured in days since the Unix epoch.
///
/// # Example
///
/// ```
/// use arima_prophet::prophet::fourier_series;
/// use chrono::{TimeZone, Utc};
///
/// let dates = vec![Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()];
/// let columns = fourier_series(&dates, 7.0, 2);
/// assert_eq!(columns.len(), 4);
/// assert_eq!(columns[1][0], 1.0); // cos(0)
/// ```
pub fn fourier_series(dates: &[DateTime<Utc>], period: f64, order: usize) -> Vec<Vec<f64>> {
    let t: Vec<f64> = dates.iter().map(days_since_epoch).collect();
    let mut columns = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angles: Vec<f64> = t
            .iter()
            .map(|&day| 2.0 * PI * k as f64 * day / period)
            .collect();
        columns.push(angles.iter().map(|a| a.sin()).collect());
        columns.push(angles.iter().map(|a| a.cos()).collect());
    }
    columns
}

/// A periodic component expressed as Fourier terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: String,
    /// Period in days.
    pub period: f64,
    pub fourier_order: usize,
    pub prior_scale: f64,
    pub mode: SeasonalityMode,
    /// Boolean column; the terms are zero on rows where it is false.
    pub condition_name: Option<String>,
}

impl Seasonality {
    pub fn new(name: impl Into<String>, period: f64, fourier_order: usize) -> Self {
        Self {
            name: name.into(),
            period,
            fourier_order,
            prior_scale: 10.0,
            mode: SeasonalityMode::Additive,
            condition_name: None,
        }
    }

    pub fn with_prior_scale(mut self, prior_scale: f64) -> Self {
        self.prior_scale = prior_scale;
        self
    }

    pub fn with_mode(mut self, mode: SeasonalityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_condition(mut self, condition_name: impl Into<String>) -> Self {
        self.condition_name = Some(condition_name.into());
        self
    }

    /// Column names, `{name}_delim_{k}` for `k` in `1..=2 * order`.
    pub fn column_names(&self) -> Vec<String> {
        (1..=2 * self.fourier_order)
            .map(|k| format!("{}_delim_{}", self.name, k))
            .collect()
    }

    /// Feature columns for `dates`, zeroed where `condition` is false.
    pub fn features(&self, dates: &[DateTime<Utc>], condition: Option<&[f64]>) -> Vec<Vec<f64>> {
        let mut columns = fourier_series(dates, self.period, self.fourier_order);
        if let Some(mask) = condition {
            for column in &mut columns {
                for (value, &flag) in column.iter_mut().zip(mask) {
                    if flag == 0.0 {
                        *value = 0.0;
                    }
                }
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn daily_dates(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn days_since_epoch_counts_fractional_days() {
        let noon = Utc.with_ymd_and_hms(1970, 1, 2, 12, 0, 0).unwrap();
        assert_relative_eq!(days_since_epoch(&noon), 1.5);
    }

    #[test]
    fn fourier_columns_are_ordered_sin_cos() {
        let dates = daily_dates(14);
        let columns = fourier_series(&dates, 7.0, 3);
        assert_eq!(columns.len(), 6);

        let t = days_since_epoch(&dates[3]);
        assert_relative_eq!(columns[0][3], (2.0 * PI * t / 7.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(columns[1][3], (2.0 * PI * t / 7.0).cos(), epsilon = 1e-12);
        assert_relative_eq!(columns[4][3], (6.0 * PI * t / 7.0).sin(), epsilon = 1e-12);
    }

    #[test]
    fn fourier_terms_repeat_with_the_period() {
        let dates = daily_dates(21);
        let columns = fourier_series(&dates, 7.0, 2);
        for column in &columns {
            for i in 0..14 {
                assert_relative_eq!(column[i], column[i + 7], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn column_names_use_delimiter() {
        let season = Seasonality::new("monthly", 30.5, 2);
        assert_eq!(
            season.column_names(),
            vec!["monthly_delim_1", "monthly_delim_2", "monthly_delim_3", "monthly_delim_4"]
        );
    }

    #[test]
    fn condition_zeroes_rows() {
        let dates = daily_dates(4);
        let season = Seasonality::new("on_season", 7.0, 1).with_condition("flag");
        let mask = [1.0, 0.0, 1.0, 0.0];
        let columns = season.features(&dates, Some(&mask));
        for column in &columns {
            assert_eq!(column[1], 0.0);
            assert_eq!(column[3], 0.0);
        }
        assert!(columns[1][0] != 0.0 || columns[0][0] != 0.0);
    }
}
