//! Transition components.
//!
//! One generic calculator turns a numerator/denominator pair of daily
//! histories into a [`ComponentOutcome`]. The six components differ only in
//! their [`ComponentSpec`]: instrument symbols, direction labels, and whether
//! the equity-bond correlation regime is folded into the score.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::direction::{classify_direction, Direction, DirectionLabels, MomentumQualifier};
use crate::series::{MonthKey, MonthlySeries, PricePoint};
use crate::timeseries::{
    calculate_ratio, compute_paired_returns, compute_percentile, compute_roc,
    compute_rolling_correlation, compute_sma, detect_crossover, downsample_to_monthly,
    CrossoverEvent, CrossoverKind,
};
use crate::transition::{breakdown, TransitionBreakdown, TransitionInputs};

/// Prefix of every unavailable component's signal text.
pub const INSUFFICIENT_DATA_PREFIX: &str = "INSUFFICIENT DATA:";

/// The six transition components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Concentration,
    YieldCurve,
    CreditConditions,
    SizeFactor,
    EquityBond,
    SectorRotation,
}

impl ComponentKind {
    /// Canonical order, used for reporting and for argmax/argmin tie-breaks.
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Concentration,
        ComponentKind::YieldCurve,
        ComponentKind::CreditConditions,
        ComponentKind::SizeFactor,
        ComponentKind::EquityBond,
        ComponentKind::SectorRotation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Concentration => "concentration",
            ComponentKind::YieldCurve => "yield_curve",
            ComponentKind::CreditConditions => "credit_conditions",
            ComponentKind::SizeFactor => "size_factor",
            ComponentKind::EquityBond => "equity_bond",
            ComponentKind::SectorRotation => "sector_rotation",
        }
    }

    /// Direction vocabulary for this component.
    pub fn labels(self) -> DirectionLabels {
        let (rising, falling) = match self {
            ComponentKind::Concentration => (Direction::Concentrating, Direction::Broadening),
            ComponentKind::YieldCurve => (Direction::Steepening, Direction::Flattening),
            ComponentKind::CreditConditions => (Direction::Easing, Direction::Tightening),
            ComponentKind::SizeFactor => (Direction::SmallCapLeading, Direction::LargeCapLeading),
            ComponentKind::EquityBond => (Direction::RiskOn, Direction::RiskOff),
            ComponentKind::SectorRotation => {
                (Direction::CyclicalLeading, Direction::DefensiveLeading)
            }
        };
        DirectionLabels {
            rising,
            falling,
            neutral: Direction::Stable,
        }
    }

    /// Default instrument pair (numerator, denominator).
    pub fn default_pair(self) -> (&'static str, &'static str) {
        match self {
            ComponentKind::Concentration => ("SPY", "RSP"),
            ComponentKind::YieldCurve => ("SHY", "TLT"),
            ComponentKind::CreditConditions => ("HYG", "LQD"),
            ComponentKind::SizeFactor => ("IWM", "SPY"),
            ComponentKind::EquityBond => ("SPY", "TLT"),
            ComponentKind::SectorRotation => ("XLY", "XLP"),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookback periods, in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPeriods {
    pub short_sma: usize,
    pub long_sma: usize,
    pub fast_roc: usize,
    pub slow_roc: usize,
    /// Minimum aligned months before a component is scored.
    pub min_months: usize,
}

impl Default for AnalysisPeriods {
    fn default() -> Self {
        Self {
            short_sma: 6,
            long_sma: 12,
            fast_roc: 3,
            slow_roc: 12,
            min_months: 12,
        }
    }
}

/// Rolling-correlation windows (in months of returns) for the correlation bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationWindows {
    pub short: usize,
    pub long: usize,
}

impl Default for CorrelationWindows {
    fn default() -> Self {
        Self { short: 6, long: 12 }
    }
}

/// Configuration record for one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub numerator: String,
    pub denominator: String,
    pub labels: DirectionLabels,
    pub periods: AnalysisPeriods,
    /// Set for equity-bond only.
    pub correlation: Option<CorrelationWindows>,
}

impl ComponentSpec {
    /// Default spec for a component kind.
    pub fn for_kind(kind: ComponentKind) -> Self {
        let (numerator, denominator) = kind.default_pair();
        Self {
            kind,
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            labels: kind.labels(),
            periods: AnalysisPeriods::default(),
            correlation: (kind == ComponentKind::EquityBond).then(CorrelationWindows::default),
        }
    }

    /// Default specs for all six components, in canonical order.
    pub fn defaults() -> Vec<Self> {
        ComponentKind::ALL.into_iter().map(Self::for_kind).collect()
    }

    pub fn with_pair(mut self, numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        self.numerator = numerator.into();
        self.denominator = denominator.into();
        self
    }

    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }
}

/// Which side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Numerator,
    Denominator,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Numerator => f.write_str("numerator"),
            Side::Denominator => f.write_str("denominator"),
        }
    }
}

/// Why a component could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum UnavailableReason {
    #[error("no price history for {side} {symbol}")]
    EmptyHistory { side: Side, symbol: String },

    #[error("only {available} aligned monthly points for {pair} (need {required})")]
    TooFewMonths {
        pair: String,
        available: usize,
        required: usize,
    },
}

/// Equity-bond correlation regime between two return windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRegime {
    /// Short-window correlation (6 months by default).
    pub corr_6m: Option<f64>,
    /// Long-window correlation (12 months by default).
    pub corr_12m: Option<f64>,
    /// The two windows disagree in sign.
    pub sign_flip: bool,
    /// Absolute difference between the two windows.
    pub divergence: Option<f64>,
    pub bonus: f64,
}

impl CorrelationRegime {
    pub const SIGN_FLIP_BONUS: f64 = 20.0;
    pub const DIVERGENCE_BONUS: f64 = 10.0;
    pub const DIVERGENCE_THRESHOLD: f64 = 0.3;

    pub fn from_correlations(corr_6m: Option<f64>, corr_12m: Option<f64>) -> Self {
        let (sign_flip, divergence) = match (corr_6m, corr_12m) {
            (Some(s), Some(l)) => (s * l < 0.0, Some((s - l).abs())),
            _ => (false, None),
        };
        let bonus = if sign_flip {
            Self::SIGN_FLIP_BONUS
        } else if divergence.is_some_and(|d| d > Self::DIVERGENCE_THRESHOLD) {
            Self::DIVERGENCE_BONUS
        } else {
            0.0
        };
        Self {
            corr_6m,
            corr_12m,
            sign_flip,
            divergence,
            bonus,
        }
    }
}

/// A scored component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub kind: ComponentKind,
    pub numerator: String,
    pub denominator: String,
    /// Computed from a configured proxy pair rather than the primary pair.
    pub proxy: bool,
    pub score: f64,
    pub breakdown: TransitionBreakdown,
    pub signal: String,
    pub direction: Direction,
    pub momentum_qualifier: MomentumQualifier,
    pub current_ratio: f64,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub roc_short: Option<f64>,
    pub roc_long: Option<f64>,
    pub percentile: Option<f64>,
    pub crossover: CrossoverEvent,
    pub monthly_points: usize,
    pub as_of: NaiveDate,
    pub correlation: Option<CorrelationRegime>,
}

/// Outcome of one component calculation.
///
/// Callers match on the variant instead of checking a `data_available`
/// flag, so an unavailable component can never be read as a real score of 0.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentOutcome {
    Available(ComponentResult),
    Unavailable {
        kind: ComponentKind,
        numerator: String,
        denominator: String,
        reason: UnavailableReason,
    },
}

impl ComponentOutcome {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentOutcome::Available(r) => r.kind,
            ComponentOutcome::Unavailable { kind, .. } => *kind,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ComponentOutcome::Available(_))
    }

    pub fn result(&self) -> Option<&ComponentResult> {
        match self {
            ComponentOutcome::Available(r) => Some(r),
            ComponentOutcome::Unavailable { .. } => None,
        }
    }

    /// Score for aggregation: the real score, or 0 when unavailable.
    pub fn score(&self) -> f64 {
        self.result().map_or(0.0, |r| r.score)
    }

    /// Direction for regime scoring: `Unknown` when unavailable.
    pub fn direction(&self) -> Direction {
        self.result().map_or(Direction::Unknown, |r| r.direction)
    }

    pub fn signal(&self) -> String {
        match self {
            ComponentOutcome::Available(r) => r.signal.clone(),
            ComponentOutcome::Unavailable { reason, .. } => {
                format!("{INSUFFICIENT_DATA_PREFIX} {reason}")
            }
        }
    }

    /// Flag a result as proxy-derived.
    pub fn into_proxy(self) -> Self {
        match self {
            ComponentOutcome::Available(mut r) => {
                r.proxy = true;
                ComponentOutcome::Available(r)
            }
            other => other,
        }
    }

    /// Flat, JSON-friendly view (the reporting shape).
    pub fn report(&self) -> ComponentReport {
        match self {
            ComponentOutcome::Available(r) => ComponentReport {
                component: r.kind,
                numerator: r.numerator.clone(),
                denominator: r.denominator.clone(),
                proxy: r.proxy,
                score: r.score,
                signal: r.signal.clone(),
                data_available: true,
                direction: r.direction,
                momentum_qualifier: r.momentum_qualifier,
                current_ratio: Some(r.current_ratio),
                sma_6m: r.sma_short,
                sma_12m: r.sma_long,
                roc_3m: r.roc_short,
                roc_12m: r.roc_long,
                percentile: r.percentile,
                crossover: r.crossover,
                monthly_points: Some(r.monthly_points),
                correlation: r.correlation,
            },
            ComponentOutcome::Unavailable {
                kind,
                numerator,
                denominator,
                ..
            } => ComponentReport {
                component: *kind,
                numerator: numerator.clone(),
                denominator: denominator.clone(),
                proxy: false,
                score: 0.0,
                signal: self.signal(),
                data_available: false,
                direction: Direction::Unknown,
                momentum_qualifier: MomentumQualifier::NotApplicable,
                current_ratio: None,
                sma_6m: None,
                sma_12m: None,
                roc_3m: None,
                roc_12m: None,
                percentile: None,
                crossover: CrossoverEvent::none(),
                monthly_points: None,
                correlation: None,
            },
        }
    }
}

impl Serialize for ComponentOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.report().serialize(serializer)
    }
}

/// Flat component view for reports.
///
/// For unavailable components: score 0, `data_available = false`, every
/// numeric field null, crossover `none`, and a signal starting with
/// `"INSUFFICIENT DATA:"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub component: ComponentKind,
    pub numerator: String,
    pub denominator: String,
    pub proxy: bool,
    pub score: f64,
    pub signal: String,
    pub data_available: bool,
    pub direction: Direction,
    pub momentum_qualifier: MomentumQualifier,
    pub current_ratio: Option<f64>,
    pub sma_6m: Option<f64>,
    pub sma_12m: Option<f64>,
    pub roc_3m: Option<f64>,
    pub roc_12m: Option<f64>,
    pub percentile: Option<f64>,
    pub crossover: CrossoverEvent,
    pub monthly_points: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correlation: Option<CorrelationRegime>,
}

/// Compute one component from its two daily histories.
pub fn compute_component(
    spec: &ComponentSpec,
    numerator: &[PricePoint],
    denominator: &[PricePoint],
) -> ComponentOutcome {
    let unavailable = |reason: UnavailableReason| {
        log::debug!("{}: unavailable ({reason})", spec.kind);
        ComponentOutcome::Unavailable {
            kind: spec.kind,
            numerator: spec.numerator.clone(),
            denominator: spec.denominator.clone(),
            reason,
        }
    };

    if numerator.is_empty() {
        return unavailable(UnavailableReason::EmptyHistory {
            side: Side::Numerator,
            symbol: spec.numerator.clone(),
        });
    }
    if denominator.is_empty() {
        return unavailable(UnavailableReason::EmptyHistory {
            side: Side::Denominator,
            symbol: spec.denominator.clone(),
        });
    }

    let num_monthly = downsample_to_monthly(numerator);
    let den_monthly = downsample_to_monthly(denominator);
    let ratio = calculate_ratio(&num_monthly, &den_monthly);

    let periods = &spec.periods;
    let required = periods.min_months.max(periods.long_sma);
    let latest = match ratio.latest() {
        Some(latest) if ratio.len() >= required => *latest,
        _ => {
            return unavailable(UnavailableReason::TooFewMonths {
                pair: spec.pair_label(),
                available: ratio.len(),
                required,
            })
        }
    };

    let values = ratio.values();
    let sma_short = compute_sma(&values, periods.short_sma);
    let sma_long = compute_sma(&values, periods.long_sma);
    let crossover = detect_crossover(&values, periods.short_sma, periods.long_sma);
    let roc_short = compute_roc(&values, periods.fast_roc);
    let roc_long = compute_roc(&values, periods.slow_roc);
    let percentile = compute_percentile(&values, latest.value);

    let sma_gap_pct = match (sma_short, sma_long) {
        (Some(s), Some(l)) if l != 0.0 => Some((s - l) / l * 100.0),
        _ => None,
    };

    let layers = breakdown(&TransitionInputs {
        crossover,
        roc_short,
        roc_long,
        sma_gap_pct,
    });
    let mut score = layers.total();

    let correlation = spec
        .correlation
        .map(|windows| correlation_regime(&num_monthly, &den_monthly, windows));
    if let Some(regime) = &correlation {
        score = (score + regime.bonus).min(100.0);
    }

    let call = classify_direction(&crossover, roc_short, &spec.labels);
    let signal = describe_signal(spec, call.direction, call.qualifier, &crossover);

    let result = ComponentResult {
        kind: spec.kind,
        numerator: spec.numerator.clone(),
        denominator: spec.denominator.clone(),
        proxy: false,
        score: round1(score),
        breakdown: layers,
        signal,
        direction: call.direction,
        momentum_qualifier: call.qualifier,
        current_ratio: latest.value,
        sma_short,
        sma_long,
        roc_short,
        roc_long,
        percentile,
        crossover,
        monthly_points: ratio.len(),
        as_of: latest.date,
        correlation,
    };
    log::debug!(
        "{}: score={:.1} direction={} qualifier={} months={}",
        result.kind,
        result.score,
        result.direction,
        result.momentum_qualifier,
        result.monthly_points
    );
    ComponentOutcome::Available(result)
}

/// Correlate monthly returns of the two legs over two windows.
fn correlation_regime(
    numerator: &MonthlySeries,
    denominator: &MonthlySeries,
    windows: CorrelationWindows,
) -> CorrelationRegime {
    let den_by_month: HashMap<MonthKey, f64> = denominator
        .iter()
        .map(|p| (p.month_key(), p.close))
        .collect();

    // Aligned closes, most-recent-first.
    let (num_closes, den_closes): (Vec<f64>, Vec<f64>) = numerator
        .iter()
        .filter_map(|p| den_by_month.get(&p.month_key()).map(|&d| (p.close, d)))
        .unzip();

    let (num_returns, den_returns) = compute_paired_returns(&num_closes, &den_closes);

    CorrelationRegime::from_correlations(
        compute_rolling_correlation(&num_returns, &den_returns, windows.short),
        compute_rolling_correlation(&num_returns, &den_returns, windows.long),
    )
}

fn describe_signal(
    spec: &ComponentSpec,
    direction: Direction,
    qualifier: MomentumQualifier,
    crossover: &CrossoverEvent,
) -> String {
    let cross = match (crossover.kind, crossover.bars_ago, crossover.gap_pct) {
        (kind, Some(ago), _) if kind.is_cross() => format!("{} {ago}mo ago", kind.label()),
        (CrossoverKind::Converging, _, Some(gap)) => format!("converging, gap {gap:+.2}%"),
        (kind, _, _) => kind.label().to_string(),
    };
    format!(
        "{} {} ({}, momentum {})",
        spec.pair_label(),
        direction,
        cross,
        qualifier
    )
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
