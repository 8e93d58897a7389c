//! Unit-root and seasonal-strength tests used to pick differencing orders.

use crate::utils::ols::{ols_fit, ols_residuals};
use crate::utils::stats::{is_constant, mean, variance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seasonal strength at or above which a seasonal difference is taken.
pub const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    pub statistic: f64,
    /// Approximate p-value interpolated from the critical-value table.
    pub p_value: f64,
    /// Lags used by the test.
    pub lags: usize,
    /// Decision at the 5% level.
    pub is_stationary: bool,
    pub critical_values: CriticalValues,
}

/// Critical values at the usual significance levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalValues {
    pub cv_1pct: f64,
    pub cv_5pct: f64,
    pub cv_10pct: f64,
}

/// Unit-root test used to choose the regular differencing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRootTest {
    /// Null hypothesis: the series is level-stationary.
    #[default]
    Kpss,
    /// Null hypothesis: the series has a unit root.
    Adf,
}

/// Test used to choose the seasonal differencing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalTest {
    /// Seasonal strength from a classical decomposition.
    #[default]
    Seas,
}

impl StationarityResult {
    fn undecided(lags: usize, is_stationary: bool) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary,
            critical_values: CriticalValues::default(),
        }
    }
}

/// KPSS test for level stationarity.
///
/// Uses a Bartlett-kernel long-run variance with `lags` lags
/// (default `⌊4 (n/100)^¼⌋`). Series shorter than 4 points are reported as
/// non-stationary with a `NaN` statistic.
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> StationarityResult {
    let n = series.len();
    if n < 4 {
        return StationarityResult::undecided(0, false);
    }

    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .clamp(1, n / 2);

    let m = mean(series);
    let demeaned: Vec<f64> = series.iter().map(|x| x - m).collect();

    let partial_sums: Vec<f64> = demeaned
        .iter()
        .scan(0.0, |acc, e| {
            *acc += e;
            Some(*acc)
        })
        .collect();
    let eta = partial_sums.iter().map(|s| s * s).sum::<f64>() / (n * n) as f64;

    let autocov = |lag: usize| -> f64 {
        demeaned[lag..]
            .iter()
            .zip(&demeaned)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64
    };
    let mut long_run = autocov(0);
    for lag in 1..=lags {
        long_run += 2.0 * (1.0 - lag as f64 / (lags + 1) as f64) * autocov(lag);
    }

    if long_run <= 0.0 {
        // Constant series: nothing left to difference.
        return StationarityResult::undecided(lags, true);
    }

    let statistic = eta / long_run;
    let critical_values = CriticalValues {
        cv_1pct: 0.739,
        cv_5pct: 0.463,
        cv_10pct: 0.347,
    };

    StationarityResult {
        statistic,
        p_value: kpss_p_value(statistic),
        lags,
        is_stationary: statistic < critical_values.cv_5pct,
        critical_values,
    }
}

fn kpss_p_value(stat: f64) -> f64 {
    // (statistic, p) pairs from the level-stationarity table.
    const TABLE: [(f64, f64); 4] = [(0.347, 0.10), (0.463, 0.05), (0.574, 0.025), (0.739, 0.01)];
    if stat <= TABLE[0].0 {
        return 0.10;
    }
    for pair in TABLE.windows(2) {
        let ((x0, p0), (x1, p1)) = (pair[0], pair[1]);
        if stat <= x1 {
            return p0 + (p1 - p0) * (stat - x0) / (x1 - x0);
        }
    }
    0.01
}

/// Augmented Dickey-Fuller test with a constant.
///
/// Regresses `Δy_t` on `y_{t-1}` and `lags` lagged differences (default
/// `⌊(n-1)^⅓⌋`) and reports the t-statistic of the `y_{t-1}` coefficient.
pub fn adf_test(series: &[f64], lags: Option<usize>) -> StationarityResult {
    let n = series.len();
    if n < 6 {
        return StationarityResult::undecided(0, false);
    }

    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let lags = lags
        .unwrap_or_else(|| ((n - 1) as f64).powf(1.0 / 3.0).floor() as usize)
        .min((diffs.len().saturating_sub(4)) / 2);

    // Rows t = lags..diffs.len(): response Δy_t, target regressor y_{t}
    // (the level preceding Δy_t), nuisance regressors Δy_{t-1..t-lags}.
    let rows = lags..diffs.len();
    let response: Vec<f64> = rows.clone().map(|t| diffs[t]).collect();
    let level: Vec<f64> = rows.clone().map(|t| series[t]).collect();
    let mut nuisance: HashMap<String, Vec<f64>> = HashMap::new();
    for k in 1..=lags {
        nuisance.insert(
            format!("lag{k:03}"),
            rows.clone().map(|t| diffs[t - k]).collect(),
        );
    }

    // Frisch-Waugh: partial the nuisance terms (and the constant) out of both sides.
    let partial_out = |values: &[f64]| {
        ols_fit(values, &nuisance).and_then(|fit| ols_residuals(values, &fit, &nuisance))
    };
    let (ry, rx) = match (partial_out(&response), partial_out(&level)) {
        (Ok(ry), Ok(rx)) => (ry, rx),
        _ => return StationarityResult::undecided(lags, false),
    };

    let sxx: f64 = rx.iter().map(|x| x * x).sum();
    if sxx <= 0.0 {
        return StationarityResult::undecided(lags, false);
    }
    let beta = rx.iter().zip(&ry).map(|(x, y)| x * y).sum::<f64>() / sxx;
    let rss: f64 = rx
        .iter()
        .zip(&ry)
        .map(|(x, y)| (y - beta * x).powi(2))
        .sum();
    let dof = response.len() as f64 - (lags + 2) as f64;
    if dof <= 0.0 || rss <= 0.0 {
        return StationarityResult::undecided(lags, rss <= 0.0);
    }
    let statistic = beta / (rss / dof / sxx).sqrt();

    let critical_values = CriticalValues {
        cv_1pct: -3.43,
        cv_5pct: -2.86,
        cv_10pct: -2.57,
    };

    StationarityResult {
        statistic,
        p_value: adf_p_value(statistic),
        lags,
        is_stationary: statistic < critical_values.cv_5pct,
        critical_values,
    }
}

fn adf_p_value(stat: f64) -> f64 {
    const TABLE: [(f64, f64); 5] = [
        (-3.96, 0.001),
        (-3.43, 0.01),
        (-2.86, 0.05),
        (-2.57, 0.10),
        (-0.44, 0.90),
    ];
    if stat <= TABLE[0].0 {
        return TABLE[0].1;
    }
    for pair in TABLE.windows(2) {
        let ((x0, p0), (x1, p1)) = (pair[0], pair[1]);
        if stat <= x1 {
            return p0 + (p1 - p0) * (stat - x0) / (x1 - x0);
        }
    }
    0.99
}

/// Whether `series` looks stationary under `test`.
pub fn is_stationary(series: &[f64], test: UnitRootTest) -> bool {
    match test {
        UnitRootTest::Kpss => kpss_test(series, None).is_stationary,
        UnitRootTest::Adf => adf_test(series, None).is_stationary,
    }
}

/// Number of regular differences (at most `max_d`) needed for stationarity.
pub fn ndiffs(series: &[f64], test: UnitRootTest, max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d && current.len() >= 5 && !is_constant(&current) {
        if is_stationary(&current, test) {
            break;
        }
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
        d += 1;
    }
    d
}

/// Seasonal strength in `[0, 1]` from a classical additive decomposition.
///
/// Needs at least two full periods; returns `0.0` otherwise.
pub fn seasonal_strength(series: &[f64], period: usize) -> f64 {
    let n = series.len();
    if period < 2 || n < 2 * period {
        return 0.0;
    }

    let trend = centered_moving_average(series, period);
    let detrended: Vec<Option<f64>> = series
        .iter()
        .zip(&trend)
        .map(|(x, t)| t.map(|t| x - t))
        .collect();

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, value) in detrended.iter().enumerate() {
        if let Some(v) = value {
            sums[i % period] += v;
            counts[i % period] += 1;
        }
    }
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let index_mean = mean(&indices);
    for s in &mut indices {
        *s -= index_mean;
    }

    let mut remainder = Vec::new();
    let mut seasonal_plus_remainder = Vec::new();
    for (i, value) in detrended.iter().enumerate() {
        if let Some(v) = value {
            remainder.push(v - indices[i % period]);
            seasonal_plus_remainder.push(*v);
        }
    }

    let var_sr = variance(&seasonal_plus_remainder);
    if !var_sr.is_finite() || var_sr < 1e-12 {
        return 0.0;
    }
    (1.0 - variance(&remainder) / var_sr).clamp(0.0, 1.0)
}

/// Trend estimate by a centred moving average (2×m for even periods).
fn centered_moving_average(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = series.len();
    let half = period / 2;
    let mut trend = vec![None; n];
    for (t, slot) in trend.iter_mut().enumerate() {
        if t < half || t + half >= n {
            continue;
        }
        let value = if period % 2 == 1 {
            series[t - half..=t + half].iter().sum::<f64>() / period as f64
        } else {
            let inner: f64 = series[t - half + 1..t + half].iter().sum();
            (inner + 0.5 * (series[t - half] + series[t + half])) / period as f64
        };
        *slot = Some(value);
    }
    trend
}

/// Number of seasonal differences (at most `max_cap_d`) for `period`.
pub fn nsdiffs(series: &[f64], period: usize, test: SeasonalTest, max_cap_d: usize) -> usize {
    if period < 2 {
        return 0;
    }
    let mut current = series.to_vec();
    let mut cap_d = 0;
    while cap_d < max_cap_d && current.len() > 2 * period && !is_constant(&current) {
        let needs_difference = match test {
            SeasonalTest::Seas => {
                seasonal_strength(&current, period) >= SEASONAL_STRENGTH_THRESHOLD
            }
        };
        if !needs_difference {
            break;
        }
        current = (period..current.len())
            .map(|i| current[i] - current[i - period])
            .collect();
        cap_d += 1;
    }
    cap_d
}
