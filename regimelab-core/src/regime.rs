//! Regime classification from component directions.
//!
//! Four regime hypotheses are scored from fixed point tables keyed on
//! component directions. Raw component scores never enter the hypothesis
//! tables; they only drive the signaling count, the transition probability
//! and the evidence list. An `Unknown` direction matches no rule.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentKind, ComponentOutcome};
use crate::composite::SIGNAL_THRESHOLD;
use crate::direction::Direction;

/// Regime labels.
///
/// The first four are scored hypotheses; `Transitional` and `Indeterminate`
/// are outcomes of selection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Concentration,
    Broadening,
    Contraction,
    Inflationary,
    Transitional,
    Indeterminate,
}

impl Regime {
    /// Scored hypotheses in canonical (tie-break) order.
    pub const HYPOTHESES: [Regime; 4] = [
        Regime::Concentration,
        Regime::Broadening,
        Regime::Contraction,
        Regime::Inflationary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Concentration => "concentration",
            Regime::Broadening => "broadening",
            Regime::Contraction => "contraction",
            Regime::Inflationary => "inflationary",
            Regime::Transitional => "transitional",
            Regime::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence levels, ordered low to high so capping is `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl Confidence {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 4 => Confidence::High,
            3 => Confidence::Moderate,
            2 => Confidence::Low,
            _ => Confidence::VeryLow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::VeryLow => "very_low",
            Confidence::Low => "low",
            Confidence::Moderate => "moderate",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points awarded to a hypothesis when a component reports a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRule {
    pub component: ComponentKind,
    pub direction: Direction,
    pub points: i32,
}

const fn rule(component: ComponentKind, direction: Direction, points: i32) -> PointRule {
    PointRule {
        component,
        direction,
        points,
    }
}

/// Point table for one hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypothesisTable {
    pub regime: Regime,
    pub rules: Vec<PointRule>,
}

/// Directions expected of each component under a regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedDirections {
    pub regime: Regime,
    pub directions: Vec<(ComponentKind, Direction)>,
}

/// Scalar thresholds for regime selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// Component score at or above which the component is signaling.
    pub signal_threshold: f64,
    /// Leader and runner-up within this many points are tied.
    pub tie_margin: i32,
    /// A tie with the composite below this forces `transitional`.
    pub transitional_composite_ceiling: f64,
    /// Minimum hypothesis score for a regime call on its own.
    pub min_hypothesis_score: i32,
    /// Signaling components needed to call `transitional` when no hypothesis qualifies.
    pub min_signaling_for_transitional: usize,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            signal_threshold: SIGNAL_THRESHOLD,
            tie_margin: 1,
            transitional_composite_ceiling: 50.0,
            min_hypothesis_score: 3,
            min_signaling_for_transitional: 3,
        }
    }
}

/// Tables and thresholds for regime classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub thresholds: RegimeThresholds,
    pub hypotheses: Vec<HypothesisTable>,
    pub expected: Vec<ExpectedDirections>,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        use ComponentKind as C;
        use Direction as D;

        let hypotheses = vec![
            HypothesisTable {
                regime: Regime::Concentration,
                rules: vec![
                    rule(C::Concentration, D::Concentrating, 2),
                    rule(C::SizeFactor, D::LargeCapLeading, 2),
                    rule(C::CreditConditions, D::Stable, 1),
                    rule(C::CreditConditions, D::Easing, 1),
                ],
            },
            HypothesisTable {
                regime: Regime::Broadening,
                rules: vec![
                    rule(C::Concentration, D::Broadening, 2),
                    rule(C::SizeFactor, D::SmallCapLeading, 2),
                    rule(C::SectorRotation, D::CyclicalLeading, 1),
                    rule(C::CreditConditions, D::Easing, 1),
                ],
            },
            HypothesisTable {
                regime: Regime::Contraction,
                rules: vec![
                    rule(C::CreditConditions, D::Tightening, 2),
                    rule(C::EquityBond, D::RiskOff, 2),
                    rule(C::SectorRotation, D::DefensiveLeading, 1),
                    rule(C::YieldCurve, D::Flattening, 1),
                    rule(C::SizeFactor, D::SmallCapLeading, -1),
                ],
            },
            HypothesisTable {
                regime: Regime::Inflationary,
                rules: vec![
                    rule(C::YieldCurve, D::Steepening, 2),
                    rule(C::SectorRotation, D::CyclicalLeading, 2),
                    rule(C::EquityBond, D::RiskOn, 1),
                ],
            },
        ];

        let expected = vec![
            ExpectedDirections {
                regime: Regime::Concentration,
                directions: vec![
                    (C::Concentration, D::Concentrating),
                    (C::SizeFactor, D::LargeCapLeading),
                    (C::EquityBond, D::RiskOn),
                ],
            },
            ExpectedDirections {
                regime: Regime::Broadening,
                directions: vec![
                    (C::Concentration, D::Broadening),
                    (C::SizeFactor, D::SmallCapLeading),
                    (C::SectorRotation, D::CyclicalLeading),
                    (C::CreditConditions, D::Easing),
                ],
            },
            ExpectedDirections {
                regime: Regime::Contraction,
                directions: vec![
                    (C::CreditConditions, D::Tightening),
                    (C::EquityBond, D::RiskOff),
                    (C::SectorRotation, D::DefensiveLeading),
                    (C::YieldCurve, D::Flattening),
                ],
            },
            ExpectedDirections {
                regime: Regime::Inflationary,
                directions: vec![
                    (C::YieldCurve, D::Steepening),
                    (C::SectorRotation, D::CyclicalLeading),
                    (C::EquityBond, D::RiskOn),
                ],
            },
        ];

        Self {
            thresholds: RegimeThresholds::default(),
            hypotheses,
            expected,
        }
    }
}

impl RegimeConfig {
    pub fn with_thresholds(mut self, thresholds: RegimeThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    fn expected_for(&self, regime: Regime) -> &[(ComponentKind, Direction)] {
        match self.expected.iter().find(|e| e.regime == regime) {
            Some(e) => e.directions.as_slice(),
            None => &[],
        }
    }
}

/// Component directions keyed by component. Missing entries are `Unknown`.
pub type DirectionMap = BTreeMap<ComponentKind, Direction>;

/// Directions of a set of outcomes; unavailable components map to `Unknown`.
pub fn directions_of(outcomes: &[ComponentOutcome]) -> DirectionMap {
    outcomes.iter().map(|o| (o.kind(), o.direction())).collect()
}

/// Score every hypothesis from component directions.
pub fn score_hypotheses(directions: &DirectionMap, config: &RegimeConfig) -> BTreeMap<Regime, i32> {
    let mut scores: BTreeMap<Regime, i32> = Regime::HYPOTHESES.iter().map(|&r| (r, 0)).collect();

    for table in &config.hypotheses {
        let total: i32 = table
            .rules
            .iter()
            .filter(|rule| {
                let actual = directions
                    .get(&rule.component)
                    .copied()
                    .unwrap_or(Direction::Unknown);
                !actual.is_unknown() && actual == rule.direction
            })
            .map(|rule| rule.points)
            .sum();
        *scores.entry(table.regime).or_insert(0) += total;
    }

    scores
}

/// Outcome of picking a regime from hypothesis scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeSelection {
    pub regime: Regime,
    /// Score used for confidence (the signaling count when forced transitional by signals).
    pub effective_score: i32,
    /// Leader and runner-up within the tie margin.
    pub ambiguous: bool,
    pub tied_regimes: Option<Vec<Regime>>,
    pub leader: Regime,
    pub runner_up: Regime,
}

/// Rank hypotheses by score, canonical order breaking equal scores.
fn rank(scores: &BTreeMap<Regime, i32>) -> Vec<(Regime, i32)> {
    let mut ranked: Vec<(Regime, i32)> = Regime::HYPOTHESES
        .iter()
        .map(|&r| (r, scores.get(&r).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Pick the regime.
///
/// - no hypothesis reaches `min_hypothesis_score` but enough components signal →
///   `transitional`, scored by the signaling count
/// - leader and runner-up within `tie_margin` → `tied_regimes` recorded; with
///   the composite below `transitional_composite_ceiling` the call is `transitional`
/// - nothing above zero → `indeterminate`
pub fn select_regime(
    scores: &BTreeMap<Regime, i32>,
    composite_score: f64,
    signaling_components: usize,
    thresholds: &RegimeThresholds,
) -> RegimeSelection {
    let ranked = rank(scores);
    let (leader, best) = ranked[0];
    let (runner_up, second) = ranked[1];

    let ambiguous = best - second <= thresholds.tie_margin;
    let tied_regimes = (ambiguous && best > 0).then(|| {
        ranked
            .iter()
            .filter(|(_, s)| best - s <= thresholds.tie_margin)
            .map(|(r, _)| *r)
            .collect::<Vec<_>>()
    });

    let (regime, effective_score) = if best < thresholds.min_hypothesis_score
        && signaling_components >= thresholds.min_signaling_for_transitional
    {
        (Regime::Transitional, signaling_components as i32)
    } else if tied_regimes.is_some() && composite_score < thresholds.transitional_composite_ceiling
    {
        (Regime::Transitional, best)
    } else if best <= 0 {
        (Regime::Indeterminate, 0)
    } else {
        (leader, best)
    };

    RegimeSelection {
        regime,
        effective_score,
        ambiguous,
        tied_regimes,
        leader,
        runner_up,
    }
}

/// Base confidence from the effective score, capped by coverage and ambiguity.
pub fn resolve_confidence(effective_score: i32, available_components: usize, ambiguous: bool) -> Confidence {
    let mut confidence = Confidence::from_score(effective_score);
    if available_components <= 3 {
        return Confidence::VeryLow;
    }
    if available_components == 4 {
        confidence = confidence.min(Confidence::Low);
    }
    if ambiguous {
        confidence = confidence.min(Confidence::Moderate);
    }
    confidence
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityLevel {
    Minimal,
    Low,
    Moderate,
    High,
}

impl ProbabilityLevel {
    /// Indicative probability range (fractions).
    pub fn range(self) -> (f64, f64) {
        match self {
            ProbabilityLevel::Minimal => (0.0, 0.15),
            ProbabilityLevel::Low => (0.15, 0.35),
            ProbabilityLevel::Moderate => (0.35, 0.60),
            ProbabilityLevel::High => (0.60, 0.85),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProbabilityLevel::Minimal => "minimal",
            ProbabilityLevel::Low => "low",
            ProbabilityLevel::Moderate => "moderate",
            ProbabilityLevel::High => "high",
        }
    }
}

impl fmt::Display for ProbabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionProbability {
    pub level: ProbabilityLevel,
    pub range_low: f64,
    pub range_high: f64,
    pub signaling_components: usize,
    pub mean_signal_score: Option<f64>,
    pub ambiguous: bool,
    /// Only set for `high` and `moderate`.
    pub from_regime: Option<Regime>,
    pub to_regime: Option<Regime>,
}

/// Probability bucket from the signaling count and the mean signaling score.
pub fn estimate_transition_probability(
    signaling_scores: &[f64],
    ambiguous: bool,
    leader: (Regime, i32),
    runner_up: (Regime, i32),
) -> TransitionProbability {
    let n = signaling_scores.len();
    let mean = (n > 0).then(|| signaling_scores.iter().sum::<f64>() / n as f64);

    let level = match (n, mean) {
        (n, _) if n >= 4 => ProbabilityLevel::High,
        (3, Some(m)) if m >= 60.0 => ProbabilityLevel::High,
        (n, _) if n >= 2 => ProbabilityLevel::Moderate,
        (1, _) => ProbabilityLevel::Low,
        _ => ProbabilityLevel::Minimal,
    };

    let shift_known = matches!(level, ProbabilityLevel::High | ProbabilityLevel::Moderate)
        && leader.1 > 0;
    let (from_regime, to_regime) = if shift_known {
        let from = (runner_up.1 > 0).then_some(runner_up.0);
        (from, Some(leader.0))
    } else {
        (None, None)
    };

    let (range_low, range_high) = level.range();
    TransitionProbability {
        level,
        range_low,
        range_high,
        signaling_components: n,
        mean_signal_score: mean,
        ambiguous,
        from_regime,
        to_regime,
    }
}

/// A signaling component, for the human-readable evidence list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub component: ComponentKind,
    pub score: f64,
    pub signal: String,
    pub direction: Direction,
}

/// Signaling components, score-descending.
pub fn collect_evidence(outcomes: &[ComponentOutcome], threshold: f64) -> Vec<Evidence> {
    let mut evidence: Vec<Evidence> = outcomes
        .iter()
        .filter_map(ComponentOutcome::result)
        .filter(|r| r.score >= threshold)
        .map(|r| Evidence {
            component: r.kind,
            score: r.score,
            signal: r.signal.clone(),
            direction: r.direction,
        })
        .collect();
    evidence.sort_by(|a, b| b.score.total_cmp(&a.score));
    evidence
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub current_regime: Regime,
    pub confidence: Confidence,
    pub regime_scores: BTreeMap<Regime, i32>,
    pub effective_score: i32,
    pub signaling_components: usize,
    pub available_components: usize,
    pub ambiguous: bool,
    pub transition_probability: TransitionProbability,
    pub evidence: Vec<Evidence>,
    pub tied_regimes: Option<Vec<Regime>>,
}

/// Classify the regime from six component outcomes and the weighted composite.
pub fn classify_regime(
    outcomes: &[ComponentOutcome],
    composite_score: f64,
    config: &RegimeConfig,
) -> RegimeResult {
    let thresholds = &config.thresholds;
    let regime_scores = score_hypotheses(&directions_of(outcomes), config);

    let signaling_scores: Vec<f64> = outcomes
        .iter()
        .filter_map(ComponentOutcome::result)
        .map(|r| r.score)
        .filter(|&s| s >= thresholds.signal_threshold)
        .collect();
    let signaling_components = signaling_scores.len();
    let available_components = outcomes.iter().filter(|o| o.is_available()).count();

    let selection = select_regime(
        &regime_scores,
        composite_score,
        signaling_components,
        thresholds,
    );
    let confidence = resolve_confidence(
        selection.effective_score,
        available_components,
        selection.ambiguous,
    );

    let score_of = |r: Regime| regime_scores.get(&r).copied().unwrap_or(0);
    let transition_probability = estimate_transition_probability(
        &signaling_scores,
        selection.ambiguous,
        (selection.leader, score_of(selection.leader)),
        (selection.runner_up, score_of(selection.runner_up)),
    );

    log::debug!(
        "regime: {} (confidence {}, effective score {}, {} signaling, {} available)",
        selection.regime,
        confidence,
        selection.effective_score,
        signaling_components,
        available_components
    );

    RegimeResult {
        current_regime: selection.regime,
        confidence,
        regime_scores,
        effective_score: selection.effective_score,
        signaling_components,
        available_components,
        ambiguous: selection.ambiguous,
        transition_probability,
        evidence: collect_evidence(outcomes, thresholds.signal_threshold),
        tied_regimes: selection.tied_regimes,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    Consistent,
    Contradicting,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyEntry {
    pub component: ComponentKind,
    pub expected: Option<Direction>,
    pub actual: Direction,
    pub verdict: Consistency,
}

/// Label each component against the directions expected under `regime`.
///
/// Components without an expectation, or with an unknown direction, are neutral.
pub fn check_consistency(
    regime: Regime,
    outcomes: &[ComponentOutcome],
    config: &RegimeConfig,
) -> Vec<ConsistencyEntry> {
    let expected = config.expected_for(regime);
    let directions = directions_of(outcomes);

    ComponentKind::ALL
        .iter()
        .map(|&component| {
            let actual = directions
                .get(&component)
                .copied()
                .unwrap_or(Direction::Unknown);
            let want = expected
                .iter()
                .find(|(k, _)| *k == component)
                .map(|(_, d)| *d);
            let verdict = match want {
                None => Consistency::Neutral,
                Some(_) if actual.is_unknown() => Consistency::Neutral,
                Some(w) if w == actual => Consistency::Consistent,
                Some(_) => Consistency::Contradicting,
            };
            ConsistencyEntry {
                component,
                expected: want,
                actual,
                verdict,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(c: i32, b: i32, k: i32, i: i32) -> BTreeMap<Regime, i32> {
        BTreeMap::from([
            (Regime::Concentration, c),
            (Regime::Broadening, b),
            (Regime::Contraction, k),
            (Regime::Inflationary, i),
        ])
    }

    fn all_directions(pairs: &[(ComponentKind, Direction)]) -> DirectionMap {
        let mut map: DirectionMap = ComponentKind::ALL
            .iter()
            .map(|&k| (k, Direction::Stable))
            .collect();
        for &(k, d) in pairs {
            map.insert(k, d);
        }
        map
    }

    #[test]
    fn concentration_table() {
        let dirs = all_directions(&[
            (ComponentKind::Concentration, Direction::Concentrating),
            (ComponentKind::SizeFactor, Direction::LargeCapLeading),
        ]);
        let s = score_hypotheses(&dirs, &RegimeConfig::default());
        // 2 + 2 + credit stable 1
        assert_eq!(s[&Regime::Concentration], 5);
        assert_eq!(s[&Regime::Broadening], 0);
    }

    #[test]
    fn small_caps_subtract_from_contraction() {
        let dirs = all_directions(&[
            (ComponentKind::CreditConditions, Direction::Tightening),
            (ComponentKind::SizeFactor, Direction::SmallCapLeading),
        ]);
        let s = score_hypotheses(&dirs, &RegimeConfig::default());
        assert_eq!(s[&Regime::Contraction], 1);
        assert_eq!(s[&Regime::Broadening], 2);
    }

    #[test]
    fn unknown_is_neutral() {
        let config = RegimeConfig::default();
        let known = all_directions(&[(ComponentKind::SectorRotation, Direction::Stable)]);
        let unknown = all_directions(&[(ComponentKind::SectorRotation, Direction::Unknown)]);
        assert_eq!(score_hypotheses(&known, &config), score_hypotheses(&unknown, &config));

        // credit "stable" scores for concentration; unknown must not
        let stable_credit = score_hypotheses(&all_directions(&[]), &config);
        let unknown_credit = score_hypotheses(
            &all_directions(&[(ComponentKind::CreditConditions, Direction::Unknown)]),
            &config,
        );
        assert_eq!(stable_credit[&Regime::Concentration], 1);
        assert_eq!(unknown_credit[&Regime::Concentration], 0);
        assert!(score_hypotheses(&DirectionMap::new(), &config)
            .values()
            .all(|&v| v == 0));
    }

    #[test]
    fn tie_below_composite_ceiling_is_transitional() {
        let t = RegimeThresholds::default();
        let sel = select_regime(&scores(5, 4, 0, 0), 45.0, 2, &t);
        assert_eq!(sel.regime, Regime::Transitional);
        assert_eq!(
            sel.tied_regimes,
            Some(vec![Regime::Concentration, Regime::Broadening])
        );
        assert!(sel.ambiguous);
    }

    #[test]
    fn tie_at_or_above_ceiling_keeps_leader() {
        let t = RegimeThresholds::default();
        let sel = select_regime(&scores(5, 4, 0, 0), 50.0, 2, &t);
        assert_eq!(sel.regime, Regime::Concentration);
        assert_eq!(
            sel.tied_regimes,
            Some(vec![Regime::Concentration, Regime::Broadening])
        );
    }

    #[test]
    fn clear_leader() {
        let sel = select_regime(&scores(0, 0, 4, 1), 30.0, 1, &RegimeThresholds::default());
        assert_eq!(sel.regime, Regime::Contraction);
        assert_eq!(sel.effective_score, 4);
        assert!(sel.tied_regimes.is_none());
        assert!(!sel.ambiguous);
    }

    #[test]
    fn weak_hypotheses_with_many_signals_are_transitional() {
        let sel = select_regime(&scores(2, 0, 0, 0), 70.0, 4, &RegimeThresholds::default());
        assert_eq!(sel.regime, Regime::Transitional);
        assert_eq!(sel.effective_score, 4);
    }

    #[test]
    fn nothing_scores_is_indeterminate() {
        let sel = select_regime(&scores(0, 0, -1, 0), 10.0, 0, &RegimeThresholds::default());
        assert_eq!(sel.regime, Regime::Indeterminate);
        assert!(sel.tied_regimes.is_none());
    }

    #[test]
    fn confidence_caps() {
        assert_eq!(resolve_confidence(5, 6, false), Confidence::High);
        assert_eq!(resolve_confidence(3, 6, false), Confidence::Moderate);
        assert_eq!(resolve_confidence(2, 6, false), Confidence::Low);
        assert_eq!(resolve_confidence(1, 6, false), Confidence::VeryLow);
        assert_eq!(resolve_confidence(5, 3, false), Confidence::VeryLow);
        assert_eq!(resolve_confidence(5, 4, false), Confidence::Low);
        assert_eq!(resolve_confidence(5, 6, true), Confidence::Moderate);
        assert_eq!(resolve_confidence(5, 5, true), Confidence::Moderate);
    }

    #[test]
    fn probability_buckets() {
        let leader = (Regime::Broadening, 4);
        let runner = (Regime::Concentration, 1);
        let p = estimate_transition_probability(&[50.0, 45.0, 40.0, 41.0], false, leader, runner);
        assert_eq!(p.level, ProbabilityLevel::High);
        assert_eq!(p.to_regime, Some(Regime::Broadening));
        assert_eq!(p.from_regime, Some(Regime::Concentration));

        let p = estimate_transition_probability(&[70.0, 65.0, 60.0], false, leader, runner);
        assert_eq!(p.level, ProbabilityLevel::High);

        let p = estimate_transition_probability(&[45.0, 41.0, 40.0], false, leader, runner);
        assert_eq!(p.level, ProbabilityLevel::Moderate);

        let p = estimate_transition_probability(&[90.0], true, leader, runner);
        assert_eq!(p.level, ProbabilityLevel::Low);
        assert!(p.to_regime.is_none() && p.from_regime.is_none());
        assert!(p.ambiguous);

        let p = estimate_transition_probability(&[], false, leader, runner);
        assert_eq!(p.level, ProbabilityLevel::Minimal);
        assert!(p.mean_signal_score.is_none());
        assert_eq!((p.range_low, p.range_high), (0.0, 0.15));
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Confidence::VeryLow).unwrap(), "\"very_low\"");
        assert_eq!(serde_json::to_string(&Regime::Transitional).unwrap(), "\"transitional\"");
    }
}
