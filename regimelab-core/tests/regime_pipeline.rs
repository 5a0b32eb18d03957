//! End-to-end tests: component outcomes → composite → regime → consistency.

use chrono::NaiveDate;
use regimelab_core::component::{ComponentKind, ComponentOutcome, ComponentResult, UnavailableReason, Side};
use regimelab_core::composite::{
    score_composite, CompositeInput, CompositeWeights, CoverageLabel, Zone, SIGNAL_THRESHOLD,
};
use regimelab_core::direction::{Direction, MomentumQualifier};
use regimelab_core::regime::{
    check_consistency, classify_regime, Confidence, Consistency, ProbabilityLevel, Regime,
    RegimeConfig,
};
use regimelab_core::timeseries::CrossoverEvent;
use regimelab_core::transition::TransitionBreakdown;

fn available(kind: ComponentKind, score: f64, direction: Direction) -> ComponentOutcome {
    let (numerator, denominator) = kind.default_pair();
    ComponentOutcome::Available(ComponentResult {
        kind,
        numerator: numerator.into(),
        denominator: denominator.into(),
        proxy: false,
        score,
        breakdown: TransitionBreakdown::default(),
        signal: format!("{numerator}/{denominator} {direction}"),
        direction,
        momentum_qualifier: MomentumQualifier::Confirmed,
        current_ratio: 1.0,
        sma_short: Some(1.0),
        sma_long: Some(1.0),
        roc_short: Some(0.0),
        roc_long: Some(0.0),
        percentile: Some(50.0),
        crossover: CrossoverEvent::none(),
        monthly_points: 24,
        as_of: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        correlation: None,
    })
}

fn unavailable(kind: ComponentKind) -> ComponentOutcome {
    let (numerator, denominator) = kind.default_pair();
    ComponentOutcome::Unavailable {
        kind,
        numerator: numerator.into(),
        denominator: denominator.into(),
        reason: UnavailableReason::EmptyHistory {
            side: Side::Numerator,
            symbol: numerator.into(),
        },
    }
}

fn concentration_market() -> Vec<ComponentOutcome> {
    vec![
        available(ComponentKind::Concentration, 75.0, Direction::Concentrating),
        available(ComponentKind::YieldCurve, 20.0, Direction::Stable),
        available(ComponentKind::CreditConditions, 30.0, Direction::Stable),
        available(ComponentKind::SizeFactor, 65.0, Direction::LargeCapLeading),
        available(ComponentKind::EquityBond, 45.0, Direction::RiskOn),
        available(ComponentKind::SectorRotation, 12.5, Direction::Stable),
    ]
}

fn run(outcomes: &[ComponentOutcome]) -> (f64, regimelab_core::RegimeResult) {
    let composite = score_composite(
        &CompositeInput::from_outcomes(outcomes),
        &CompositeWeights::default(),
        SIGNAL_THRESHOLD,
    );
    let regime = classify_regime(outcomes, composite.composite_score, &RegimeConfig::default());
    (composite.composite_score, regime)
}

#[test]
fn clear_concentration_regime() {
    let outcomes = concentration_market();
    let (composite, regime) = run(&outcomes);

    // 75*.25 + 20*.2 + 30*.15 + 65*.15 + 45*.15 + 12.5*.1 = 45.0
    assert_eq!(composite, 45.0);
    assert_eq!(regime.current_regime, Regime::Concentration);
    assert_eq!(regime.regime_scores[&Regime::Concentration], 5);
    assert_eq!(regime.confidence, Confidence::High);
    assert!(regime.tied_regimes.is_none());
    assert_eq!(regime.signaling_components, 3);
    // three signals averaging above 60
    assert_eq!(regime.transition_probability.level, ProbabilityLevel::High);
    assert_eq!(regime.transition_probability.to_regime, Some(Regime::Concentration));
    assert_eq!(regime.transition_probability.from_regime, Some(Regime::Inflationary));

    let evidence: Vec<ComponentKind> = regime.evidence.iter().map(|e| e.component).collect();
    assert_eq!(
        evidence,
        vec![
            ComponentKind::Concentration,
            ComponentKind::SizeFactor,
            ComponentKind::EquityBond
        ]
    );
}

#[test]
fn unavailable_component_is_neutral_in_regime_scores() {
    let mut outcomes = concentration_market();
    let baseline = run(&outcomes).1.regime_scores;

    // sector rotation is "stable", which no table rewards: dropping it changes nothing
    outcomes[5] = unavailable(ComponentKind::SectorRotation);
    let (_, regime) = run(&outcomes);
    assert_eq!(regime.regime_scores, baseline);
    assert_eq!(regime.available_components, 5);
}

#[test]
fn coverage_caps_confidence_end_to_end() {
    let mut outcomes = concentration_market();
    outcomes[1] = unavailable(ComponentKind::YieldCurve);
    outcomes[5] = unavailable(ComponentKind::SectorRotation);
    let (_, regime) = run(&outcomes);
    assert_eq!(regime.available_components, 4);
    assert_eq!(regime.confidence, Confidence::Low);

    outcomes[4] = unavailable(ComponentKind::EquityBond);
    let (_, regime) = run(&outcomes);
    assert_eq!(regime.available_components, 3);
    assert_eq!(regime.confidence, Confidence::VeryLow);
}

#[test]
fn all_unavailable_is_indeterminate_and_limited() {
    let outcomes: Vec<ComponentOutcome> = ComponentKind::ALL.into_iter().map(unavailable).collect();
    let composite = score_composite(
        &CompositeInput::from_outcomes(&outcomes),
        &CompositeWeights::default(),
        SIGNAL_THRESHOLD,
    );
    assert_eq!(composite.composite_score, 0.0);
    assert_eq!(composite.zone, Zone::Stable);
    assert_eq!(composite.data_quality.label, CoverageLabel::Limited);
    assert_eq!(composite.data_quality.missing.len(), 6);

    let regime = classify_regime(&outcomes, composite.composite_score, &RegimeConfig::default());
    assert_eq!(regime.current_regime, Regime::Indeterminate);
    assert_eq!(regime.confidence, Confidence::VeryLow);
    assert_eq!(regime.transition_probability.level, ProbabilityLevel::Minimal);
    assert!(regime.evidence.is_empty());
}

#[test]
fn many_signals_without_a_story_are_transitional() {
    let outcomes = vec![
        available(ComponentKind::Concentration, 60.0, Direction::Stable),
        available(ComponentKind::YieldCurve, 55.0, Direction::Steepening),
        available(ComponentKind::CreditConditions, 70.0, Direction::Tightening),
        available(ComponentKind::SizeFactor, 45.0, Direction::SmallCapLeading),
        available(ComponentKind::EquityBond, 20.0, Direction::Stable),
        available(ComponentKind::SectorRotation, 15.0, Direction::Stable),
    ];
    let (_, regime) = run(&outcomes);
    // broadening 2, contraction 2-1 = 1, inflationary 2: nobody reaches 3
    assert_eq!(regime.current_regime, Regime::Transitional);
    assert_eq!(regime.signaling_components, 4);
    assert_eq!(regime.effective_score, 4);
    assert_eq!(regime.confidence, Confidence::Moderate);
    assert!(regime.tied_regimes.is_some());
    assert_eq!(regime.transition_probability.level, ProbabilityLevel::High);
}

#[test]
fn consistency_against_regime() {
    let outcomes = concentration_market();
    let entries = check_consistency(Regime::Concentration, &outcomes, &RegimeConfig::default());
    let verdict = |k: ComponentKind| entries.iter().find(|e| e.component == k).unwrap().verdict;

    assert_eq!(verdict(ComponentKind::Concentration), Consistency::Consistent);
    assert_eq!(verdict(ComponentKind::SizeFactor), Consistency::Consistent);
    assert_eq!(verdict(ComponentKind::EquityBond), Consistency::Consistent);
    assert_eq!(verdict(ComponentKind::YieldCurve), Consistency::Neutral);

    let entries = check_consistency(Regime::Broadening, &outcomes, &RegimeConfig::default());
    let concentration = entries
        .iter()
        .find(|e| e.component == ComponentKind::Concentration)
        .unwrap();
    assert_eq!(concentration.verdict, Consistency::Contradicting);

    let mut degraded = outcomes.clone();
    degraded[0] = unavailable(ComponentKind::Concentration);
    let entries = check_consistency(Regime::Broadening, &degraded, &RegimeConfig::default());
    assert_eq!(entries[0].verdict, Consistency::Neutral);
    assert_eq!(entries[0].actual, Direction::Unknown);

    let entries = check_consistency(Regime::Transitional, &outcomes, &RegimeConfig::default());
    assert!(entries.iter().all(|e| e.verdict == Consistency::Neutral));
}
