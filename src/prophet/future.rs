//! Future date generation.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Spacing of generated future dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    #[default]
    Daily,
    Weekly,
    /// Calendar months, keeping the day of month where it exists.
    Monthly,
    Yearly,
}

impl FromStr for Frequency {
    type Err = ForecastError;

    /// Accepts pandas-style aliases (`"H"`, `"D"`, `"W"`, `"M"`/`"MS"`,
    /// `"Y"`/`"A"`) as well as the lowercase names.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "H" | "h" | "hourly" => Ok(Frequency::Hourly),
            "D" | "d" | "daily" => Ok(Frequency::Daily),
            "W" | "w" | "weekly" => Ok(Frequency::Weekly),
            "M" | "MS" | "monthly" => Ok(Frequency::Monthly),
            "Y" | "A" | "YS" | "AS" | "yearly" => Ok(Frequency::Yearly),
            other => Err(ForecastError::InvalidParameter(format!(
                "unsupported frequency '{other}'"
            ))),
        }
    }
}

impl Frequency {
    /// The date `steps` periods after `start`.
    pub fn advance(self, start: DateTime<Utc>, steps: u32) -> Result<DateTime<Utc>> {
        let shifted = match self {
            Frequency::Hourly => start.checked_add_signed(Duration::hours(i64::from(steps))),
            Frequency::Daily => start.checked_add_signed(Duration::days(i64::from(steps))),
            Frequency::Weekly => start.checked_add_signed(Duration::weeks(i64::from(steps))),
            Frequency::Monthly => start.checked_add_months(Months::new(steps)),
            Frequency::Yearly => steps
                .checked_mul(12)
                .and_then(|months| start.checked_add_months(Months::new(months))),
        };
        shifted.ok_or_else(|| {
            ForecastError::TimestampError(format!("{steps} steps after {start} is out of range"))
        })
    }
}

/// `periods` dates strictly after `last`, spaced by `freq`.
pub fn future_dates(last: DateTime<Utc>, periods: usize, freq: Frequency) -> Result<Vec<DateTime<Utc>>> {
    (1..=periods)
        .map(|step| {
            let step = u32::try_from(step).map_err(|_| {
                ForecastError::InvalidParameter(format!("too many periods: {periods}"))
            })?;
            freq.advance(last, step)
        })
        .collect()
}
