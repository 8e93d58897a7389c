//! Feature matrix and component bookkeeping.

use crate::error::{ForecastError, Result};
use crate::prophet::config::SeasonalityMode;
use std::collections::{BTreeMap, HashMap};

/// Named feature columns with their prior scales.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    n_rows: usize,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    prior_scales: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            ..Default::default()
        }
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, column: Vec<f64>, prior_scale: f64) -> Result<()> {
        if column.len() != self.n_rows {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_rows,
                got: column.len(),
            });
        }
        self.names.push(name.into());
        self.columns.push(column);
        self.prior_scales.push(prior_scale);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Whether the matrix has no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn prior_scales(&self) -> &[f64] {
        &self.prior_scales
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Keep the columns whose name does not start with any of `prefixes`.
    pub fn drop_prefixes(&self, prefixes: &[&str]) -> FeatureMatrix {
        let keep: Vec<usize> = (0..self.names.len())
            .filter(|&i| !prefixes.iter().any(|p| self.names[i].starts_with(p)))
            .collect();
        self.subset(&keep)
    }

    /// Keep the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<FeatureMatrix> {
        let indices = names
            .iter()
            .map(|name| {
                self.names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| ForecastError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.subset(&indices))
    }

    /// Rows at `rows`, in that order.
    pub fn take_rows(&self, rows: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            n_rows: rows.len(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| rows.iter().map(|&r| column[r]).collect())
                .collect(),
            prior_scales: self.prior_scales.clone(),
        }
    }

    /// Columns keyed by name, as consumed by the regression models.
    pub fn to_regressors(&self) -> HashMap<String, Vec<f64>> {
        self.names
            .iter()
            .cloned()
            .zip(self.columns.iter().cloned())
            .collect()
    }

    fn subset(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            n_rows: self.n_rows,
            names: indices.iter().map(|&i| self.names[i].clone()).collect(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            prior_scales: indices.iter().map(|&i| self.prior_scales[i]).collect(),
        }
    }
}

/// Component name to the feature columns it is made of.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentColumns {
    components: BTreeMap<String, Vec<String>>,
}

impl ComponentColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add columns to a component, creating it if needed.
    pub fn extend(&mut self, component: &str, columns: impl IntoIterator<Item = String>) {
        self.components
            .entry(component.to_string())
            .or_default()
            .extend(columns);
    }

    /// Add a component that is the union of other components. Empty groups
    /// are skipped.
    pub fn add_group(&mut self, group: &str, members: &[String]) {
        let mut columns: Vec<String> = members
            .iter()
            .filter_map(|m| self.components.get(m))
            .flatten()
            .cloned()
            .collect();
        columns.sort();
        columns.dedup();
        if !columns.is_empty() {
            self.extend(group, columns);
        }
    }

    pub fn get(&self, component: &str) -> Option<&[String]> {
        self.components.get(component).map(|c| c.as_slice())
    }

    pub fn contains(&self, component: &str) -> bool {
        self.components.contains_key(component)
    }

    /// Component names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(|k| k.as_str())
    }
}

/// Components grouped by how they combine with the trend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentModes {
    pub additive: Vec<String>,
    pub multiplicative: Vec<String>,
}

impl ComponentModes {
    pub fn push(&mut self, mode: SeasonalityMode, component: impl Into<String>) {
        match mode {
            SeasonalityMode::Additive => self.additive.push(component.into()),
            SeasonalityMode::Multiplicative => self.multiplicative.push(component.into()),
        }
    }

    pub fn get(&self, mode: SeasonalityMode) -> &[String] {
        match mode {
            SeasonalityMode::Additive => &self.additive,
            SeasonalityMode::Multiplicative => &self.multiplicative,
        }
    }
}

/// Output of feature construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonalFeatures {
    pub matrix: FeatureMatrix,
    pub components: ComponentColumns,
    pub modes: ComponentModes,
}
