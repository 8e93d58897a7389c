//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};

/// A univariate forecast: point predictions with optional interval bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    ///
    /// All three vectors must have the same length.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(values.len(), lower.len());
        debug_assert_eq!(values.len(), upper.len());
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Number of steps held.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    pub fn has_lower(&self) -> bool {
        self.lower.is_some()
    }

    pub fn has_upper(&self) -> bool {
        self.upper.is_some()
    }

    /// Lower interval bounds, if computed.
    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    /// Upper interval bounds, if computed.
    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Lower interval bounds, failing when the forecast has none.
    pub fn lower_series(&self) -> Result<&[f64]> {
        self.lower
            .as_deref()
            .ok_or_else(|| ForecastError::InvalidParameter("forecast has no lower bounds".into()))
    }

    /// Upper interval bounds, failing when the forecast has none.
    pub fn upper_series(&self) -> Result<&[f64]> {
        self.upper
            .as_deref()
            .ok_or_else(|| ForecastError::InvalidParameter("forecast has no upper bounds".into()))
    }

    /// Keep only the steps at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Forecast> {
        let n = self.point.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(ForecastError::IndexOutOfBounds {
                index: bad,
                size: n,
            });
        }
        let pick = |v: &Vec<f64>| indices.iter().map(|&i| v[i]).collect::<Vec<_>>();
        Ok(Forecast {
            point: pick(&self.point),
            lower: self.lower.as_ref().map(pick),
            upper: self.upper.as_ref().map(pick),
        })
    }

    /// Append `other` after `self`.
    ///
    /// Bounds survive only when both sides carry them.
    pub fn concat(mut self, other: Forecast) -> Forecast {
        self.point.extend(other.point);
        self.lower = match (self.lower, other.lower) {
            (Some(mut a), Some(b)) => {
                a.extend(b);
                Some(a)
            }
            _ => None,
        };
        self.upper = match (self.upper, other.upper) {
            (Some(mut a), Some(b)) => {
                a.extend(b);
                Some(a)
            }
            _ => None,
        };
        self
    }

    /// Apply `f` to the point predictions and both bounds.
    pub fn map_values<F>(&self, f: F) -> Forecast
    where
        F: Fn(f64) -> f64,
    {
        Forecast {
            point: self.point.iter().map(|&v| f(v)).collect(),
            lower: self
                .lower
                .as_ref()
                .map(|l| l.iter().map(|&v| f(v)).collect()),
            upper: self
                .upper
                .as_ref()
                .map(|u| u.iter().map(|&v| f(v)).collect()),
        }
    }

    /// Replace the point predictions, keeping the bounds.
    pub(crate) fn with_point(mut self, point: Vec<f64>) -> Forecast {
        self.point = point;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_point_keeps_bounds() {
        let forecast = Forecast::from_values_with_intervals(
            vec![1.0, 2.0],
            vec![0.0, 1.0],
            vec![2.0, 3.0],
        )
        .map_values(f64::exp)
        .with_point(vec![3.0, 8.0]);
        assert_eq!(forecast.primary(), &[3.0, 8.0]);
        assert_eq!(forecast.lower(), Some(&[1.0, 1.0f64.exp()][..]));
        assert_eq!(forecast.upper(), Some(&[2.0f64.exp(), 3.0f64.exp()][..]));
    }

    #[test]
    fn forecast_empty_state() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
        assert!(!forecast.has_lower());
        assert!(forecast.lower_series().is_err());
    }

    #[test]
    fn forecast_from_values_with_intervals() {
        let forecast = Forecast::from_values_with_intervals(
            vec![2.0, 3.0],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        );

        assert_eq!(forecast.primary(), &[2.0, 3.0]);
        assert_eq!(forecast.lower_series().unwrap(), &[1.0, 2.0]);
        assert_eq!(forecast.upper_series().unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn select_reorders_and_checks_bounds() {
        let forecast = Forecast::from_values_with_intervals(
            vec![1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0],
            vec![2.0, 3.0, 4.0],
        );
        let picked = forecast.select(&[2, 0]).unwrap();
        assert_eq!(picked.primary(), &[3.0, 1.0]);
        assert_eq!(picked.lower().unwrap(), &[2.0, 0.0]);
        assert_eq!(picked.upper().unwrap(), &[4.0, 2.0]);

        assert!(matches!(
            forecast.select(&[3]),
            Err(ForecastError::IndexOutOfBounds { index: 3, size: 3 })
        ));
    }

    #[test]
    fn concat_keeps_bounds_only_when_both_have_them() {
        let a = Forecast::from_values_with_intervals(vec![1.0], vec![0.0], vec![2.0]);
        let b = Forecast::from_values_with_intervals(vec![5.0], vec![4.0], vec![6.0]);
        let joined = a.clone().concat(b);
        assert_eq!(joined.primary(), &[1.0, 5.0]);
        assert_eq!(joined.lower().unwrap(), &[0.0, 4.0]);

        let joined = a.concat(Forecast::from_values(vec![7.0]));
        assert_eq!(joined.horizon(), 2);
        assert!(!joined.has_lower());
        assert!(!joined.has_upper());
    }

    #[test]
    fn map_values_transforms_everything() {
        let forecast = Forecast::from_values_with_intervals(vec![1.0], vec![0.5], vec![1.5]);
        let doubled = forecast.map_values(|v| v * 2.0);
        assert_eq!(doubled.primary(), &[2.0]);
        assert_eq!(doubled.lower().unwrap(), &[1.0]);
        assert_eq!(doubled.upper().unwrap(), &[3.0]);
    }
}
