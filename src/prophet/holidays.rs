//! Holiday indicator features.

use crate::prophet::config::HolidayEvent;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Indicator columns for every holiday window offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayFeatures {
    /// Column names, sorted.
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub prior_scales: Vec<f64>,
    /// Distinct holiday names, sorted.
    pub holiday_names: Vec<String>,
}

impl HolidayFeatures {
    /// Columns belonging to one holiday.
    pub fn columns_of(&self, holiday: &str) -> Vec<String> {
        let prefix = format!("{holiday}_delim_");
        self.names
            .iter()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

fn offset_column(holiday: &str, offset: i64) -> String {
    let sign = if offset >= 0 { '+' } else { '-' };
    format!("{holiday}_delim_{sign}{}", offset.abs())
}

/// Build `{holiday}_delim_{+|-}{offset}` columns: 1.0 on rows whose calendar
/// day equals a holiday date shifted by the offset, 0.0 elsewhere.
///
/// Every window offset gets a column even when no row matches, so training
/// and prediction frames share the same layout.
pub fn holiday_features(
    dates: &[DateTime<Utc>],
    holidays: &[HolidayEvent],
    default_prior_scale: f64,
) -> HolidayFeatures {
    let days: Vec<NaiveDate> = dates.iter().map(|d| d.date_naive()).collect();
    let mut columns: BTreeMap<String, (Vec<f64>, f64)> = BTreeMap::new();
    let mut holiday_names = BTreeSet::new();

    for event in holidays {
        holiday_names.insert(event.holiday.clone());
        let prior = event.prior_scale.unwrap_or(default_prior_scale);
        let base = event.ds.date_naive();
        for offset in event.lower_window..=event.upper_window {
            let (column, _) = columns
                .entry(offset_column(&event.holiday, offset))
                .or_insert_with(|| (vec![0.0; days.len()], prior));
            let Some(target) = base.checked_add_signed(Duration::days(offset)) else {
                continue;
            };
            for (value, day) in column.iter_mut().zip(&days) {
                if *day == target {
                    *value = 1.0;
                }
            }
        }
    }

    let mut features = HolidayFeatures {
        holiday_names: holiday_names.into_iter().collect(),
        ..Default::default()
    };
    for (name, (column, prior)) in columns {
        features.names.push(name);
        features.columns.push(column);
        features.prior_scales.push(prior);
    }
    features
}
