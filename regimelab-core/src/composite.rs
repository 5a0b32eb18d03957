//! Weighted composite of the six component scores.
//!
//! The composite is weight-preserving: an unavailable component contributes
//! its score of 0 at its fixed weight. Missing data is never imputed and the
//! weights are never renormalized; coverage only shows up in `data_quality`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{round1, ComponentKind, ComponentOutcome};

/// Score at or above which a component counts as signaling.
pub const SIGNAL_THRESHOLD: f64 = 40.0;

/// Fixed composite weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub concentration: f64,
    pub yield_curve: f64,
    pub credit_conditions: f64,
    pub size_factor: f64,
    pub equity_bond: f64,
    pub sector_rotation: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            concentration: 0.25,
            yield_curve: 0.20,
            credit_conditions: 0.15,
            size_factor: 0.15,
            equity_bond: 0.15,
            sector_rotation: 0.10,
        }
    }
}

impl CompositeWeights {
    pub fn weight(&self, kind: ComponentKind) -> f64 {
        match kind {
            ComponentKind::Concentration => self.concentration,
            ComponentKind::YieldCurve => self.yield_curve,
            ComponentKind::CreditConditions => self.credit_conditions,
            ComponentKind::SizeFactor => self.size_factor,
            ComponentKind::EquityBond => self.equity_bond,
            ComponentKind::SectorRotation => self.sector_rotation,
        }
    }

    pub fn total(&self) -> f64 {
        ComponentKind::ALL.iter().map(|&k| self.weight(k)).sum()
    }
}

/// Composite zone, a step function of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Early Signal")]
    EarlySignal,
    #[serde(rename = "Transition Zone")]
    TransitionZone,
    #[serde(rename = "Active Transition")]
    ActiveTransition,
    #[serde(rename = "Confirmed Transition")]
    ConfirmedTransition,
}

impl Zone {
    /// Closed above at 20/40/60/80: a composite of exactly 20 is still `Stable`.
    pub fn from_score(score: f64) -> Self {
        if score <= 20.0 {
            Zone::Stable
        } else if score <= 40.0 {
            Zone::EarlySignal
        } else if score <= 60.0 {
            Zone::TransitionZone
        } else if score <= 80.0 {
            Zone::ActiveTransition
        } else {
            Zone::ConfirmedTransition
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::Stable => "Stable",
            Zone::EarlySignal => "Early Signal",
            Zone::TransitionZone => "Transition Zone",
            Zone::ActiveTransition => "Active Transition",
            Zone::ConfirmedTransition => "Confirmed Transition",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Zone::Stable => {
                "Current regime intact. No structural transition signals of note."
            }
            Zone::EarlySignal => {
                "Isolated signals are appearing. Monitor, but do not reposition on this alone."
            }
            Zone::TransitionZone => {
                "Multiple signals point to a possible regime change. Review exposures and prepare contingency plans."
            }
            Zone::ActiveTransition => {
                "A regime transition is likely underway. Begin adjusting allocations toward the emerging regime."
            }
            Zone::ConfirmedTransition => {
                "Broad confirmation of a regime transition. Complete repositioning for the new regime."
            }
        }
    }

    /// Ordered action checklist.
    pub fn actions(self) -> &'static [&'static str] {
        match self {
            Zone::Stable => &[
                "Maintain current allocation",
                "Re-run the evaluation monthly",
            ],
            Zone::EarlySignal => &[
                "Identify which components are signaling",
                "Increase evaluation frequency to every two weeks",
                "Review concentration risk in current holdings",
            ],
            Zone::TransitionZone => &[
                "Review portfolio exposure against the leading regime hypothesis",
                "Prepare a rebalancing plan",
                "Tighten risk limits on the most regime-sensitive positions",
                "Re-run the evaluation weekly",
            ],
            Zone::ActiveTransition => &[
                "Begin staged rebalancing toward the emerging regime",
                "Reduce positions that depend on the prior regime",
                "Hedge tail exposure in contradicting components",
                "Re-run the evaluation weekly",
            ],
            Zone::ConfirmedTransition => &[
                "Complete repositioning for the new regime",
                "Retire hedges tied to the prior regime",
                "Document the transition and reset monitoring baselines",
            ],
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coverage label attached to the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageLabel {
    /// All six components available.
    Complete,
    /// Four or five available.
    Partial,
    /// Three or fewer available.
    Limited,
}

impl CoverageLabel {
    pub fn from_available(available: usize, total: usize) -> Self {
        if available >= total {
            CoverageLabel::Complete
        } else if available >= 4 {
            CoverageLabel::Partial
        } else {
            CoverageLabel::Limited
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub available_components: usize,
    pub total_components: usize,
    pub missing: Vec<ComponentKind>,
    pub label: CoverageLabel,
}

/// Score input for one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub score: f64,
    pub available: bool,
}

/// Six named component scores.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeInput {
    scores: BTreeMap<ComponentKind, ComponentScore>,
}

impl CompositeInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a score, available by default.
    pub fn with_score(mut self, kind: ComponentKind, score: f64) -> Self {
        self.scores.insert(
            kind,
            ComponentScore {
                score,
                available: true,
            },
        );
        self
    }

    pub fn with_availability(mut self, kind: ComponentKind, available: bool) -> Self {
        self.scores
            .entry(kind)
            .or_insert(ComponentScore {
                score: 0.0,
                available,
            })
            .available = available;
        self
    }

    pub fn from_outcomes(outcomes: &[ComponentOutcome]) -> Self {
        let mut input = Self::new();
        for outcome in outcomes {
            input.scores.insert(
                outcome.kind(),
                ComponentScore {
                    score: outcome.score(),
                    available: outcome.is_available(),
                },
            );
        }
        input
    }

    /// Score for `kind`; absent components score 0 and are unavailable.
    pub fn get(&self, kind: ComponentKind) -> ComponentScore {
        self.scores.get(&kind).copied().unwrap_or(ComponentScore {
            score: 0.0,
            available: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub composite_score: f64,
    pub zone: Zone,
    pub guidance: String,
    pub actions: Vec<String>,
    pub strongest_signal: ComponentKind,
    pub weakest_signal: ComponentKind,
    /// Threshold `signaling_components` was counted against.
    #[serde(default = "default_signal_threshold")]
    pub signal_threshold: f64,
    pub signaling_components: usize,
    pub data_quality: DataQuality,
    pub component_scores: BTreeMap<ComponentKind, f64>,
}

fn default_signal_threshold() -> f64 {
    SIGNAL_THRESHOLD
}

/// Weighted sum, rounded to one decimal.
pub fn weighted_composite(input: &CompositeInput, weights: &CompositeWeights) -> f64 {
    let raw: f64 = ComponentKind::ALL
        .iter()
        .map(|&k| input.get(k).score * weights.weight(k))
        .sum();
    round1(raw)
}

/// Score the composite. Available components scoring at or above
/// `signal_threshold` count as signaling.
pub fn score_composite(
    input: &CompositeInput,
    weights: &CompositeWeights,
    signal_threshold: f64,
) -> CompositeResult {
    let composite_score = weighted_composite(input, weights);
    let zone = Zone::from_score(composite_score);

    let component_scores: BTreeMap<ComponentKind, f64> = ComponentKind::ALL
        .iter()
        .map(|&k| (k, input.get(k).score))
        .collect();

    // First in canonical order wins ties.
    let mut strongest = ComponentKind::ALL[0];
    let mut weakest = ComponentKind::ALL[0];
    for &kind in &ComponentKind::ALL[1..] {
        let score = component_scores[&kind];
        if score > component_scores[&strongest] {
            strongest = kind;
        }
        if score < component_scores[&weakest] {
            weakest = kind;
        }
    }

    let signaling_components = ComponentKind::ALL
        .iter()
        .map(|&k| input.get(k))
        .filter(|c| c.available && c.score >= signal_threshold)
        .count();

    let missing: Vec<ComponentKind> = ComponentKind::ALL
        .iter()
        .copied()
        .filter(|&k| !input.get(k).available)
        .collect();
    let total = ComponentKind::ALL.len();
    let available = total - missing.len();
    let data_quality = DataQuality {
        available_components: available,
        total_components: total,
        missing,
        label: CoverageLabel::from_available(available, total),
    };

    CompositeResult {
        composite_score,
        zone,
        guidance: zone.guidance().to_string(),
        actions: zone.actions().iter().map(|a| a.to_string()).collect(),
        strongest_signal: strongest,
        weakest_signal: weakest,
        signal_threshold,
        signaling_components,
        data_quality,
        component_scores,
    }
}
