//! Univariate time series with named exogenous regressors.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Named regressors aligned with a series' timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarAnnotations {
    regressors: HashMap<String, Vec<f64>>,
}

impl CalendarAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regressor(mut self, name: String, values: Vec<f64>) -> Self {
        self.regressors.insert(name, values);
        self
    }

    pub fn regressors(&self) -> &HashMap<String, Vec<f64>> {
        &self.regressors
    }

    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors.get(name).map(|v| v.as_slice())
    }

    pub fn has_regressors(&self) -> bool {
        !self.regressors.is_empty()
    }
}

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    calendar: Option<CalendarAnnotations>,
}

impl TimeSeries {
    /// Create a univariate time series.
    ///
    /// Timestamps must be strictly increasing and match `values` in length.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            timestamps,
            values,
            calendar: None,
        })
    }

    /// Create a series carrying the given regressors.
    pub fn with_regressors(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
        regressors: HashMap<String, Vec<f64>>,
    ) -> Result<Self> {
        let mut series = Self::univariate(timestamps, values)?;
        if !regressors.is_empty() {
            series.set_calendar(CalendarAnnotations { regressors })?;
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn primary_values(&self) -> &[f64] {
        &self.values
    }

    pub fn calendar(&self) -> Option<&CalendarAnnotations> {
        self.calendar.as_ref()
    }

    /// Attach regressors; each must be as long as the series.
    pub fn set_calendar(&mut self, calendar: CalendarAnnotations) -> Result<()> {
        for values in calendar.regressors.values() {
            if values.len() != self.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: self.len(),
                    got: values.len(),
                });
            }
        }
        self.calendar = Some(calendar);
        Ok(())
    }

    pub fn has_regressors(&self) -> bool {
        self.calendar.as_ref().is_some_and(|c| c.has_regressors())
    }

    /// All regressors, empty when none are attached.
    pub fn all_regressors(&self) -> HashMap<String, Vec<f64>> {
        self.calendar
            .as_ref()
            .map(|c| c.regressors.clone())
            .unwrap_or_default()
    }

    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.calendar.as_ref().and_then(|c| c.regressor(name))
    }

    /// Whether any value is NaN or infinite.
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Observations `start..end`, regressors included.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if end > self.len() || start > end {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }
        let calendar = self.calendar.as_ref().map(|c| CalendarAnnotations {
            regressors: c
                .regressors
                .iter()
                .map(|(name, values)| (name.clone(), values[start..end].to_vec()))
                .collect(),
        });
        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            calendar,
        })
    }

    /// Same timestamps and regressors, different values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        Ok(TimeSeries {
            timestamps: self.timestamps.clone(),
            values,
            calendar: self.calendar.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn rejects_unsorted_timestamps() {
        let mut ts = make_timestamps(3);
        ts.swap(0, 2);
        assert!(matches!(
            TimeSeries::univariate(ts, vec![1.0, 2.0, 3.0]),
            Err(ForecastError::TimestampError(_))
        ));
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(matches!(
            TimeSeries::univariate(make_timestamps(3), vec![1.0, 2.0]),
            Err(ForecastError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn regressors_must_match_length() {
        let mut series = TimeSeries::univariate(make_timestamps(3), vec![1.0, 2.0, 3.0]).unwrap();
        let calendar = CalendarAnnotations::new().with_regressor("x".into(), vec![1.0]);
        assert!(series.set_calendar(calendar).is_err());
        assert!(!series.has_regressors());
    }

    #[test]
    fn slice_carries_regressors() {
        let mut regressors = HashMap::new();
        regressors.insert("x".to_string(), vec![10.0, 20.0, 30.0, 40.0]);
        let series = TimeSeries::with_regressors(
            make_timestamps(4),
            vec![1.0, 2.0, 3.0, 4.0],
            regressors,
        )
        .unwrap();

        let tail = series.slice(2, 4).unwrap();
        assert_eq!(tail.primary_values(), &[3.0, 4.0]);
        assert_eq!(tail.regressor("x").unwrap(), &[30.0, 40.0]);
        assert!(series.slice(3, 5).is_err());
    }

    #[test]
    fn detects_missing_values() {
        let series =
            TimeSeries::univariate(make_timestamps(3), vec![1.0, f64::NAN, 3.0]).unwrap();
        assert!(series.has_missing_values());
    }
}
