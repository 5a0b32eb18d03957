//! Direction classification for a ratio series.
//!
//! Resolves a qualitative direction from the crossover type and the sign of
//! short-term momentum. A crossover that happened at least
//! [`STALE_AFTER_MONTHS`] months ago loses to opposing momentum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timeseries::{CrossoverEvent, CrossoverKind};

/// A crossover this many months old (or older) is stale.
pub const STALE_AFTER_MONTHS: usize = 3;

/// Direction vocabulary shared by all components.
///
/// Each component uses three of these (rising, falling, neutral) via
/// [`DirectionLabels`]. `Unknown` marks a component without usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Concentrating,
    Broadening,
    Steepening,
    Flattening,
    Easing,
    Tightening,
    LargeCapLeading,
    SmallCapLeading,
    RiskOn,
    RiskOff,
    CyclicalLeading,
    DefensiveLeading,
    Stable,
    Unknown,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Concentrating => "concentrating",
            Direction::Broadening => "broadening",
            Direction::Steepening => "steepening",
            Direction::Flattening => "flattening",
            Direction::Easing => "easing",
            Direction::Tightening => "tightening",
            Direction::LargeCapLeading => "large_cap_leading",
            Direction::SmallCapLeading => "small_cap_leading",
            Direction::RiskOn => "risk_on",
            Direction::RiskOff => "risk_off",
            Direction::CyclicalLeading => "cyclical_leading",
            Direction::DefensiveLeading => "defensive_leading",
            Direction::Stable => "stable",
            Direction::Unknown => "unknown",
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Direction::Unknown
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three labels a component reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionLabels {
    /// Ratio rising (golden cross / positive momentum).
    pub rising: Direction,
    /// Ratio falling (death cross / negative momentum).
    pub falling: Direction,
    pub neutral: Direction,
}

/// How momentum relates to the reported direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MomentumQualifier {
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "fading")]
    Fading,
    #[serde(rename = "reversing")]
    Reversing,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl MomentumQualifier {
    pub fn as_str(self) -> &'static str {
        match self {
            MomentumQualifier::Confirmed => "confirmed",
            MomentumQualifier::Fading => "fading",
            MomentumQualifier::Reversing => "reversing",
            MomentumQualifier::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for MomentumQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Rising,
    Falling,
}

impl Trend {
    fn of_crossover(kind: CrossoverKind) -> Option<Self> {
        match kind {
            CrossoverKind::GoldenCross => Some(Trend::Rising),
            CrossoverKind::DeathCross => Some(Trend::Falling),
            CrossoverKind::Converging | CrossoverKind::None => None,
        }
    }

    /// Zero momentum counts as no momentum.
    fn of_momentum(roc: Option<f64>) -> Option<Self> {
        match roc {
            Some(v) if v > 0.0 => Some(Trend::Rising),
            Some(v) if v < 0.0 => Some(Trend::Falling),
            _ => None,
        }
    }

    fn label(self, labels: &DirectionLabels) -> Direction {
        match self {
            Trend::Rising => labels.rising,
            Trend::Falling => labels.falling,
        }
    }
}

/// Classified direction plus qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionCall {
    pub direction: Direction,
    pub qualifier: MomentumQualifier,
}

/// Resolve direction from a crossover and short-term momentum.
pub fn classify_direction(
    crossover: &CrossoverEvent,
    roc_short: Option<f64>,
    labels: &DirectionLabels,
) -> DirectionCall {
    let cross = Trend::of_crossover(crossover.kind);
    let momentum = Trend::of_momentum(roc_short);

    match (cross, momentum) {
        (Some(c), m) => {
            let stale = crossover
                .bars_ago
                .is_some_and(|ago| ago >= STALE_AFTER_MONTHS);
            match m {
                Some(m) if m != c && stale => DirectionCall {
                    direction: m.label(labels),
                    qualifier: MomentumQualifier::Reversing,
                },
                Some(m) if m != c => DirectionCall {
                    direction: c.label(labels),
                    qualifier: MomentumQualifier::Fading,
                },
                Some(_) => DirectionCall {
                    direction: c.label(labels),
                    qualifier: MomentumQualifier::Confirmed,
                },
                None => DirectionCall {
                    direction: c.label(labels),
                    qualifier: MomentumQualifier::NotApplicable,
                },
            }
        }
        (None, Some(m)) => DirectionCall {
            direction: m.label(labels),
            qualifier: MomentumQualifier::NotApplicable,
        },
        (None, None) => DirectionCall {
            direction: labels.neutral,
            qualifier: MomentumQualifier::NotApplicable,
        },
    }
}
