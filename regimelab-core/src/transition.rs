//! Transition strength scoring.
//!
//! Three additive layers, clamped to 0–100:
//! - crossover (0–40): recency of a golden/death cross, or closeness of a converging pair
//! - momentum (0–30): short-term ROC opposing long-term ROC (early reversal) or accelerating
//! - confirmation (0–30): 10 points per aligned signal

use serde::{Deserialize, Serialize};

use crate::timeseries::{CrossoverEvent, CrossoverKind, CONVERGING_GAP_PCT};

pub const MAX_CROSSOVER_POINTS: f64 = 40.0;
pub const MAX_MOMENTUM_POINTS: f64 = 30.0;
pub const MAX_CONFIRMATION_POINTS: f64 = 30.0;

/// Inputs to the transition scorer for one ratio series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionInputs {
    pub crossover: CrossoverEvent,
    pub roc_short: Option<f64>,
    pub roc_long: Option<f64>,
    /// Current short-over-long SMA gap in percent, if computable.
    pub sma_gap_pct: Option<f64>,
}

/// Per-layer breakdown of a transition score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionBreakdown {
    pub crossover: f64,
    pub momentum: f64,
    pub confirmation: f64,
}

impl TransitionBreakdown {
    /// Sum of the layers, clamped to 0–100.
    pub fn total(&self) -> f64 {
        (self.crossover + self.momentum + self.confirmation).clamp(0.0, 100.0)
    }
}

/// Score a ratio's transition strength.
pub fn score_transition(inputs: &TransitionInputs) -> f64 {
    breakdown(inputs).total()
}

/// Score each layer separately.
pub fn breakdown(inputs: &TransitionInputs) -> TransitionBreakdown {
    TransitionBreakdown {
        crossover: crossover_points(&inputs.crossover),
        momentum: momentum_points(inputs.roc_short, inputs.roc_long),
        confirmation: confirmation_points(inputs),
    }
}

fn crossover_points(crossover: &CrossoverEvent) -> f64 {
    match crossover.kind {
        CrossoverKind::GoldenCross | CrossoverKind::DeathCross => match crossover.bars_ago {
            Some(0..=2) => 40.0,
            Some(3..=5) => 30.0,
            _ => 20.0,
        },
        CrossoverKind::Converging => {
            let gap = crossover.gap_pct.map(f64::abs).unwrap_or(CONVERGING_GAP_PCT);
            25.0 * (1.0 - gap / CONVERGING_GAP_PCT).clamp(0.0, 1.0)
        }
        CrossoverKind::None => 0.0,
    }
}

fn momentum_points(roc_short: Option<f64>, roc_long: Option<f64>) -> f64 {
    let (Some(short), Some(long)) = (roc_short, roc_long) else {
        return 0.0;
    };
    if short * long < 0.0 {
        // early reversal
        MAX_MOMENTUM_POINTS * short.abs().min(5.0) / 5.0
    } else if short * long > 0.0 && short.abs() > 3.0 {
        // acceleration
        10.0
    } else {
        0.0
    }
}

fn confirmation_points(inputs: &TransitionInputs) -> f64 {
    let kind = inputs.crossover.kind;
    let mut aligned = 0u8;

    if kind.is_cross() {
        aligned += 1;
    }
    if let Some(roc) = inputs.roc_short {
        let agrees = match kind {
            CrossoverKind::GoldenCross => roc > 0.0,
            CrossoverKind::DeathCross => roc < 0.0,
            _ => false,
        };
        if agrees {
            aligned += 1;
        }
    }
    if inputs.sma_gap_pct.is_some_and(|gap| gap.abs() > 0.5) {
        aligned += 1;
    }

    (f64::from(aligned) * 10.0).min(MAX_CONFIRMATION_POINTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(kind: CrossoverKind, bars_ago: Option<usize>, gap: Option<f64>) -> CrossoverEvent {
        CrossoverEvent {
            kind,
            bars_ago,
            gap_pct: gap,
        }
    }

    fn inputs(c: CrossoverEvent, short: Option<f64>, long: Option<f64>) -> TransitionInputs {
        TransitionInputs {
            crossover: c,
            roc_short: short,
            roc_long: long,
            sma_gap_pct: c.gap_pct,
        }
    }

    #[test]
    fn crossover_recency_buckets() {
        for (bars_ago, expected) in [(0, 40.0), (2, 40.0), (3, 30.0), (5, 30.0), (6, 20.0), (20, 20.0)] {
            let c = cross(CrossoverKind::GoldenCross, Some(bars_ago), Some(0.1));
            assert_eq!(breakdown(&inputs(c, None, None)).crossover, expected, "bars_ago={bars_ago}");
        }
    }

    #[test]
    fn converging_scales_with_gap() {
        let tight = cross(CrossoverKind::Converging, None, Some(0.0));
        let loose = cross(CrossoverKind::Converging, None, Some(-0.5));
        assert_eq!(breakdown(&inputs(tight, None, None)).crossover, 25.0);
        assert_eq!(breakdown(&inputs(loose, None, None)).crossover, 12.5);
        assert_eq!(breakdown(&inputs(CrossoverEvent::none(), None, None)).crossover, 0.0);
    }

    #[test]
    fn momentum_reversal_and_acceleration() {
        let none = CrossoverEvent::none();
        assert_eq!(breakdown(&inputs(none, Some(-2.5), Some(8.0))).momentum, 15.0);
        assert_eq!(breakdown(&inputs(none, Some(-9.0), Some(8.0))).momentum, 30.0);
        assert_eq!(breakdown(&inputs(none, Some(4.0), Some(8.0))).momentum, 10.0);
        assert_eq!(breakdown(&inputs(none, Some(2.0), Some(8.0))).momentum, 0.0);
        assert_eq!(breakdown(&inputs(none, Some(2.0), None)).momentum, 0.0);
    }

    #[test]
    fn confirmation_counts_aligned_signals() {
        let golden = cross(CrossoverKind::GoldenCross, Some(1), Some(0.8));
        assert_eq!(breakdown(&inputs(golden, Some(1.0), None)).confirmation, 30.0);
        assert_eq!(breakdown(&inputs(golden, Some(-1.0), None)).confirmation, 20.0);

        let death_small_gap = cross(CrossoverKind::DeathCross, Some(1), Some(-0.2));
        assert_eq!(breakdown(&inputs(death_small_gap, Some(-1.0), None)).confirmation, 20.0);
    }

    #[test]
    fn full_score_is_clamped_and_deterministic() {
        let golden = cross(CrossoverKind::GoldenCross, Some(0), Some(2.0));
        let i = inputs(golden, Some(6.0), Some(-4.0));
        // 40 + 30 + (cross, roc agrees, gap) 30 = 100
        assert_eq!(score_transition(&i), 100.0);
        assert_eq!(score_transition(&i), score_transition(&i));
    }
}
