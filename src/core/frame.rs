//! Column-oriented tables used at the adapter boundary.
//!
//! [`Frame`] is the input table (a `ds` timestamp column, a `y` value column
//! and any extra regressor columns). [`ForecastFrame`] is the fixed-schema
//! output table.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name of the timestamp column.
pub const DS: &str = "ds";
/// Name of the observed value column.
pub const Y: &str = "y";

/// A single frame column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Timestamps(Vec<DateTime<Utc>>),
    /// Numeric values; `NaN` marks a missing observation.
    Values(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Timestamps(v) => v.len(),
            Column::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Timestamps(v) => Column::Timestamps(rows.iter().map(|&i| v[i]).collect()),
            Column::Values(v) => Column::Values(rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// An ordered collection of equally long, named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the usual `ds` / `y` history table.
    pub fn from_history(ds: Vec<DateTime<Utc>>, y: Vec<f64>) -> Result<Self> {
        Self::new().with_timestamps(DS, ds)?.with_values(Y, y)
    }

    /// Build a table holding only timestamps, as used for prediction.
    pub fn from_dates(ds: Vec<DateTime<Utc>>) -> Result<Self> {
        Self::new().with_timestamps(DS, ds)
    }

    pub fn with_timestamps(mut self, name: &str, values: Vec<DateTime<Utc>>) -> Result<Self> {
        self.insert(name, Column::Timestamps(values))?;
        Ok(self)
    }

    pub fn with_values(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.insert(name, Column::Values(values))?;
        Ok(self)
    }

    /// Insert or replace a column.
    pub fn insert(&mut self, name: &str, column: Column) -> Result<()> {
        let replacing = self.columns.iter().position(|(n, _)| n == name);
        let others_len = self
            .columns
            .iter()
            .enumerate()
            .find(|(i, _)| Some(*i) != replacing)
            .map(|(_, (_, c))| c.len());
        if let Some(expected) = others_len {
            if column.len() != expected {
                return Err(ForecastError::DimensionMismatch {
                    expected,
                    got: column.len(),
                });
            }
        }
        match replacing {
            Some(i) => self.columns[i].1 = column,
            None => self.columns.push((name.to_string(), column)),
        }
        Ok(())
    }

    /// Replace (or add) a value column.
    pub fn set_values(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.insert(name, Column::Values(values))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Timestamp column by name; `None` when absent or not timestamps.
    pub fn timestamps(&self, name: &str) -> Option<&[DateTime<Utc>]> {
        match self.column(name)? {
            Column::Timestamps(v) => Some(v),
            Column::Values(_) => None,
        }
    }

    /// Value column by name; `None` when absent or not numeric.
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        match self.column(name)? {
            Column::Values(v) => Some(v),
            Column::Timestamps(_) => None,
        }
    }

    /// Timestamp column, failing with [`ForecastError::MissingColumn`].
    pub fn require_timestamps(&self, name: &str) -> Result<&[DateTime<Utc>]> {
        self.timestamps(name)
            .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
    }

    /// Value column, failing with [`ForecastError::MissingColumn`].
    pub fn require_values(&self, name: &str) -> Result<&[f64]> {
        self.values(name)
            .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
    }

    /// Rows whose mask entry is `true`.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Frame> {
        if mask.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: mask.len(),
            });
        }
        let rows: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Ok(self.take_rows(&rows))
    }

    /// Rows at `rows`, in that order.
    pub fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(rows)))
                .collect(),
        }
    }

    /// Stable sort of all rows by a timestamp column.
    pub fn sorted_by_timestamp(&self, name: &str) -> Result<Frame> {
        let ds = self.require_timestamps(name)?;
        let mut order: Vec<usize> = (0..ds.len()).collect();
        order.sort_by_key(|&i| ds[i]);
        Ok(self.take_rows(&order))
    }
}

/// One row of a [`ForecastFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub ds: DateTime<Utc>,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Forecast table with the fixed `ds`, `yhat`, `yhat_lower`, `yhat_upper` schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastFrame {
    ds: Vec<DateTime<Utc>>,
    yhat: Vec<f64>,
    yhat_lower: Vec<f64>,
    yhat_upper: Vec<f64>,
}

impl ForecastFrame {
    /// Column names in output order.
    pub const COLUMNS: [&'static str; 4] = [DS, "yhat", "yhat_lower", "yhat_upper"];

    pub fn new(
        ds: Vec<DateTime<Utc>>,
        yhat: Vec<f64>,
        yhat_lower: Vec<f64>,
        yhat_upper: Vec<f64>,
    ) -> Result<Self> {
        for got in [yhat.len(), yhat_lower.len(), yhat_upper.len()] {
            if got != ds.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: ds.len(),
                    got,
                });
            }
        }
        Ok(Self {
            ds,
            yhat,
            yhat_lower,
            yhat_upper,
        })
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    pub fn ds(&self) -> &[DateTime<Utc>] {
        &self.ds
    }

    pub fn yhat(&self) -> &[f64] {
        &self.yhat
    }

    pub fn yhat_lower(&self) -> &[f64] {
        &self.yhat_lower
    }

    pub fn yhat_upper(&self) -> &[f64] {
        &self.yhat_upper
    }

    pub fn rows(&self) -> impl Iterator<Item = ForecastRow> + '_ {
        (0..self.len()).map(move |i| ForecastRow {
            ds: self.ds[i],
            yhat: self.yhat[i],
            yhat_lower: self.yhat_lower[i],
            yhat_upper: self.yhat_upper[i],
        })
    }

    /// Convert into a generic [`Frame`] with the output column names.
    pub fn to_frame(&self) -> Result<Frame> {
        Frame::new()
            .with_timestamps(DS, self.ds.clone())?
            .with_values("yhat", self.yhat.clone())?
            .with_values("yhat_lower", self.yhat_lower.clone())?
            .with_values("yhat_upper", self.yhat_upper.clone())
    }
}
