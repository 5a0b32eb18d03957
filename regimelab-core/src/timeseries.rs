//! Time-series operations over most-recent-first data.
//!
//! Monthly downsampling, ratio construction, simple moving averages,
//! crossover detection, rate of change, percentile rank and rolling
//! correlation. Every "not enough data" case returns `None` (or the `None`
//! crossover kind) instead of failing, so callers can apply a default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::series::{
    MonthKey, MonthlyPoint, MonthlySeries, PricePoint, RatioPoint, RatioSeries,
    ReverseChronoSeries,
};

/// Current SMA gap (in percent) below which a no-cross series counts as converging.
pub const CONVERGING_GAP_PCT: f64 = 1.0;

/// Extra months scanned beyond the long period when searching for a cross.
pub const CROSSOVER_EXTRA_LOOKBACK: usize = 12;

/// Keep the most recent bar of each calendar month, most-recent-first.
///
/// Bars with a non-finite effective close are skipped.
pub fn downsample_to_monthly(daily: &[PricePoint]) -> MonthlySeries {
    let mut latest: HashMap<MonthKey, MonthlyPoint> = HashMap::new();

    for bar in daily {
        let close = bar.effective_close();
        if !close.is_finite() {
            continue;
        }
        let key = MonthKey::of(bar.date);
        let replace = match latest.get(&key) {
            Some(existing) => bar.date > existing.date,
            None => true,
        };
        if replace {
            latest.insert(
                key,
                MonthlyPoint {
                    date: bar.date,
                    close,
                },
            );
        }
    }

    ReverseChronoSeries::from_unordered(latest.into_values().collect())
}

/// Divide date-aligned monthly closes.
///
/// Months missing on either side, or with a zero denominator, are dropped.
/// Each ratio point takes the numerator's date.
pub fn calculate_ratio(numerator: &MonthlySeries, denominator: &MonthlySeries) -> RatioSeries {
    let denominators: HashMap<MonthKey, f64> = denominator
        .iter()
        .map(|p| (p.month_key(), p.close))
        .collect();

    let points: Vec<RatioPoint> = numerator
        .iter()
        .filter_map(|num| {
            let den = *denominators.get(&num.month_key())?;
            if den == 0.0 {
                return None;
            }
            Some(RatioPoint {
                date: num.date,
                value: num.close / den,
            })
        })
        .collect();

    ReverseChronoSeries::from_unordered(points)
}

/// Mean of the first `period` values (the most recent ones).
///
/// Returns `None` when `period` is zero or fewer than `period` values exist.
pub fn compute_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: f64 = values[..period].iter().sum();
    Some(sum / period as f64)
}

/// Crossover classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    /// Short SMA moved from at-or-below to above the long SMA.
    GoldenCross,
    /// Short SMA moved from at-or-above to below the long SMA.
    DeathCross,
    /// No cross, but the current gap is under [`CONVERGING_GAP_PCT`].
    Converging,
    None,
}

impl CrossoverKind {
    /// True for an actual cross (golden or death).
    pub fn is_cross(self) -> bool {
        matches!(self, CrossoverKind::GoldenCross | CrossoverKind::DeathCross)
    }

    pub fn label(self) -> &'static str {
        match self {
            CrossoverKind::GoldenCross => "golden cross",
            CrossoverKind::DeathCross => "death cross",
            CrossoverKind::Converging => "converging",
            CrossoverKind::None => "no crossover",
        }
    }
}

/// Result of crossover detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    #[serde(rename = "type")]
    pub kind: CrossoverKind,
    /// Months since the cross (0 = the latest month). `None` unless a cross was found.
    pub bars_ago: Option<usize>,
    /// Current gap of the short SMA over the long SMA, in percent.
    pub gap_pct: Option<f64>,
}

impl CrossoverEvent {
    /// The "nothing detected, nothing known" event.
    pub fn none() -> Self {
        Self {
            kind: CrossoverKind::None,
            bars_ago: None,
            gap_pct: None,
        }
    }
}

impl Default for CrossoverEvent {
    fn default() -> Self {
        Self::none()
    }
}

/// Find the most recent short/long SMA cross.
///
/// SMA pairs are computed at offsets 0, 1, 2, ... months back (up to
/// `long + 12` offsets, bounded by the data). Walking from the most recent
/// offset backwards, the first sign change of `short - long` is reported
/// with `bars_ago` equal to the offset at which the new side was first seen.
pub fn detect_crossover(values: &[f64], short: usize, long: usize) -> CrossoverEvent {
    let max_offsets = long + CROSSOVER_EXTRA_LOOKBACK;

    let mut diffs: Vec<f64> = Vec::with_capacity(max_offsets);
    let mut current_gap_pct = None;
    for offset in 0..max_offsets {
        if offset >= values.len() {
            break;
        }
        let window = &values[offset..];
        let (Some(s), Some(l)) = (compute_sma(window, short), compute_sma(window, long)) else {
            break;
        };
        if offset == 0 && l != 0.0 {
            current_gap_pct = Some((s - l) / l * 100.0);
        }
        diffs.push(s - l);
    }

    if diffs.is_empty() {
        return CrossoverEvent::none();
    }

    for i in 0..diffs.len().saturating_sub(1) {
        let now = diffs[i];
        let before = diffs[i + 1];
        let kind = if now > 0.0 && before <= 0.0 {
            CrossoverKind::GoldenCross
        } else if now < 0.0 && before >= 0.0 {
            CrossoverKind::DeathCross
        } else {
            continue;
        };
        return CrossoverEvent {
            kind,
            bars_ago: Some(i),
            gap_pct: current_gap_pct,
        };
    }

    match current_gap_pct {
        Some(gap) if gap.abs() < CONVERGING_GAP_PCT => CrossoverEvent {
            kind: CrossoverKind::Converging,
            bars_ago: None,
            gap_pct: Some(gap),
        },
        gap => CrossoverEvent {
            kind: CrossoverKind::None,
            bars_ago: None,
            gap_pct: gap,
        },
    }
}

/// Percent change of the latest value against the value `period` points back.
///
/// `None` if there are not more than `period` values or the reference is zero.
pub fn compute_roc(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() <= period {
        return None;
    }
    let reference = values[period];
    if reference == 0.0 {
        return None;
    }
    Some((values[0] - reference) / reference * 100.0)
}

/// Percentile rank of `current`: share of `values` strictly below it, in percent (0–100).
pub fn compute_percentile(values: &[f64], current: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let below = values.iter().filter(|&&v| v < current).count();
    Some(below as f64 / values.len() as f64 * 100.0)
}

/// Period returns from most-recent-first closes: `r[i] = c[i] / c[i+1] - 1`.
///
/// Both inputs are date-aligned. A step is dropped from both outputs when
/// either side's previous close is zero, so index `i` of each output always
/// covers the same month.
pub fn compute_paired_returns(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    a.windows(2)
        .zip(b.windows(2))
        .filter(|(wa, wb)| wa[1] != 0.0 && wb[1] != 0.0)
        .map(|(wa, wb)| (wa[0] / wa[1] - 1.0, wb[0] / wb[1] - 1.0))
        .unzip()
}

/// Pearson correlation over the first `window` points of each series.
///
/// `None` when `window < 2` or either series is shorter than `window`;
/// `Some(0.0)` when either side has zero standard deviation.
pub fn compute_rolling_correlation(a: &[f64], b: &[f64], window: usize) -> Option<f64> {
    if window < 2 || a.len() < window || b.len() < window {
        return None;
    }
    let a = &a[..window];
    let b = &b[..window];
    let n = window as f64;

    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Some(0.0);
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
