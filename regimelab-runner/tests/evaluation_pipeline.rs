//! Integration tests for the full evaluation pipeline.
//!
//! These tests write small monthly fixtures to a temp directory, load them
//! through the runner and check the resulting evaluation end to end.

use std::path::Path;

use chrono::{Months, NaiveDate};
use proptest::prelude::*;

use regimelab_core::component::ComponentKind;
use regimelab_core::composite::CoverageLabel;
use regimelab_core::direction::{Direction, MomentumQualifier};
use regimelab_core::regime::{Confidence, Consistency, Regime};
use regimelab_runner::data_loader::{load_history, DataSource, LoadOptions};
use regimelab_runner::report::write_artifacts;
use regimelab_runner::runner::{evaluate_dir, Evaluation};
use regimelab_runner::EvaluationConfig;

const MONTHS: usize = 36;

// ── Fixtures ─────────────────────────────────────────────────────────

fn month(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 28).unwrap() + Months::new(i as u32)
}

fn write_csv(dir: &Path, symbol: &str, price: impl Fn(usize) -> f64) {
    let mut text = String::from("date,close\n");
    for i in 0..MONTHS {
        text.push_str(&format!("{},{}\n", month(i), price(i)));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), text).unwrap();
}

fn write_json(dir: &Path, symbol: &str, price: impl Fn(usize) -> f64) {
    let rows: Vec<serde_json::Value> = (0..MONTHS)
        .map(|i| {
            serde_json::json!({
                "date": month(i).to_string(),
                "close": price(i),
                "adjClose": price(i),
            })
        })
        .collect();
    std::fs::write(
        dir.join(format!("{symbol}.json")),
        serde_json::to_string(&rows).unwrap(),
    )
    .unwrap();
}

/// Large caps trend up 2% a month while everything else is flat.
fn concentration_fixture(dir: &Path) {
    write_json(dir, "SPY", |i| 100.0 * 1.02_f64.powi(i as i32));
    for symbol in ["RSP", "SHY", "TLT", "HYG", "LQD", "IWM", "XLY", "XLP"] {
        write_csv(dir, symbol, |_| 100.0);
    }
}

fn run(dir: &Path, config: &EvaluationConfig) -> Evaluation {
    evaluate_dir(dir, config, &LoadOptions::files_only()).unwrap()
}

fn component(eval: &Evaluation, kind: ComponentKind) -> &regimelab_core::ComponentReport {
    eval.components.iter().find(|c| c.component == kind).unwrap()
}

// ── Pipeline ─────────────────────────────────────────────────────────

#[test]
fn trending_large_caps_produce_a_concentration_regime() {
    let dir = tempfile::tempdir().unwrap();
    concentration_fixture(dir.path());

    let eval = run(dir.path(), &EvaluationConfig::default());

    assert!(!eval.has_synthetic);
    assert_eq!(eval.as_of, Some(month(MONTHS - 1)));
    assert!(eval.components.iter().all(|c| c.data_available));
    assert_eq!(eval.composite.data_quality.label, CoverageLabel::Complete);

    let conc = component(&eval, ComponentKind::Concentration);
    assert_eq!(conc.direction, Direction::Concentrating);
    assert_eq!(conc.momentum_qualifier, MomentumQualifier::NotApplicable);
    assert!(conc.signal.starts_with("SPY/RSP concentrating"));

    assert_eq!(
        component(&eval, ComponentKind::SizeFactor).direction,
        Direction::LargeCapLeading
    );
    assert_eq!(
        component(&eval, ComponentKind::EquityBond).direction,
        Direction::RiskOn
    );
    assert_eq!(
        component(&eval, ComponentKind::CreditConditions).direction,
        Direction::Stable
    );

    // concentrating 2 + large caps 2 + stable credit 1
    assert_eq!(eval.regime.regime_scores[&Regime::Concentration], 5);
    assert_eq!(eval.regime.current_regime, Regime::Concentration);
    assert_eq!(eval.regime.confidence, Confidence::High);

    let consistent = eval
        .consistency
        .iter()
        .filter(|e| e.verdict == Consistency::Consistent)
        .count();
    assert_eq!(consistent, 3);
}

#[test]
fn repeated_runs_share_an_id_and_artifacts_are_written() {
    let dir = tempfile::tempdir().unwrap();
    concentration_fixture(dir.path());
    let config = EvaluationConfig::default();

    let first = run(dir.path(), &config);
    let second = run(dir.path(), &config);
    assert_eq!(first, second);

    let out = tempfile::tempdir().unwrap();
    let paths = write_artifacts(&first, out.path()).unwrap();
    assert!(paths.dir.ends_with(&first.evaluation_id[..12]));

    let markdown = std::fs::read_to_string(&paths.markdown).unwrap();
    assert!(markdown.contains("Current regime: **concentration**"));
    let json = std::fs::read_to_string(&paths.json).unwrap();
    let reloaded: Evaluation = serde_json::from_str(&json).unwrap();
    assert_eq!(reloaded.evaluation_id, first.evaluation_id);
    assert_eq!(reloaded.regime.current_regime, Regime::Concentration);
    assert_eq!(reloaded.components.len(), 6);
}

#[test]
fn changed_data_changes_the_id() {
    let dir = tempfile::tempdir().unwrap();
    concentration_fixture(dir.path());
    let before = run(dir.path(), &EvaluationConfig::default());

    write_csv(dir.path(), "XLP", |i| 100.0 + i as f64);
    let after = run(dir.path(), &EvaluationConfig::default());
    assert_ne!(before.evaluation_id, after.evaluation_id);
}

#[test]
fn empty_directory_is_indeterminate_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let eval = run(dir.path(), &EvaluationConfig::default());

    assert!(eval.components.iter().all(|c| !c.data_available));
    assert!(eval
        .components
        .iter()
        .all(|c| c.signal.starts_with("INSUFFICIENT DATA:")));
    assert_eq!(eval.composite.composite_score, 0.0);
    assert_eq!(eval.composite.data_quality.label, CoverageLabel::Limited);
    assert_eq!(eval.regime.current_regime, Regime::Indeterminate);
    assert_eq!(eval.regime.confidence, Confidence::VeryLow);
    assert_eq!(eval.as_of, None);
}

#[test]
fn short_history_is_reported_as_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    concentration_fixture(dir.path());
    // five months of RSP only
    let text: String = std::iter::once("date,close\n".to_string())
        .chain((0..5).map(|i| format!("{},100\n", month(i))))
        .collect();
    std::fs::write(dir.path().join("RSP.csv"), text).unwrap();

    let eval = run(dir.path(), &EvaluationConfig::default());
    let conc = component(&eval, ComponentKind::Concentration);
    assert!(!conc.data_available);
    assert_eq!(conc.monthly_points, None);
    assert_eq!(eval.composite.data_quality.available_components, 5);
    // large caps 2 + stable credit 1 still clear the bar on their own
    assert_eq!(eval.regime.regime_scores[&Regime::Concentration], 3);
    assert_eq!(eval.regime.current_regime, Regime::Concentration);
    assert_eq!(eval.regime.confidence, Confidence::Moderate);
}

#[test]
fn synthetic_mode_fills_every_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let opts = LoadOptions::with_synthetic(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), 3);
    let eval = evaluate_dir(dir.path(), &EvaluationConfig::default(), &opts).unwrap();

    assert!(eval.has_synthetic);
    assert!(eval.components.iter().all(|c| c.data_available));
    assert!((0.0..=100.0).contains(&eval.composite.composite_score));
}

#[test]
fn proxy_pair_from_toml_is_used() {
    let dir = tempfile::tempdir().unwrap();
    concentration_fixture(dir.path());
    std::fs::remove_file(dir.path().join("RSP.csv")).unwrap();
    write_csv(dir.path(), "QQQ", |i| 100.0 * 1.01_f64.powi(i as i32));
    write_csv(dir.path(), "QQQE", |_| 100.0);

    let config = EvaluationConfig::from_toml(
        r#"
        [components.concentration.proxy]
        numerator = "QQQ"
        denominator = "QQQE"
        "#,
    )
    .unwrap();
    let eval = run(dir.path(), &config);

    let conc = component(&eval, ComponentKind::Concentration);
    assert!(conc.data_available);
    assert!(conc.proxy);
    assert_eq!(conc.direction, Direction::Concentrating);
    assert_eq!(eval.composite.data_quality.label, CoverageLabel::Complete);
}

#[test]
fn signal_threshold_from_toml_reaches_composite_and_report() {
    let dir = tempfile::tempdir().unwrap();
    concentration_fixture(dir.path());
    let baseline = run(dir.path(), &EvaluationConfig::default());
    let mut scores: Vec<f64> = baseline.components.iter().map(|c| c.score).collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    // just above the second-highest score: at most one component signals
    let threshold = scores[1] + 0.05;

    let config =
        EvaluationConfig::from_toml(&format!("[regime]\nsignal_threshold = {threshold}\n")).unwrap();
    let eval = run(dir.path(), &config);

    assert_eq!(eval.composite.signal_threshold, threshold);
    assert_eq!(
        eval.composite.signaling_components,
        eval.regime.signaling_components
    );
    assert!(eval.regime.signaling_components <= 1);

    let markdown = regimelab_runner::render_markdown(&eval);
    assert_eq!(
        markdown.matches(" ●").count(),
        eval.regime.signaling_components
    );
}

// ── Loader ordering (proptest) ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn csv_rows_in_any_order_load_most_recent_first(
        order in Just((0..24usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut text = String::from("date,close\n");
        for &i in &order {
            text.push_str(&format!("{},{}\n", month(i), 50.0 + i as f64));
        }
        std::fs::write(dir.path().join("ABC.csv"), text).unwrap();

        let (history, source) = load_history(dir.path(), "ABC").unwrap();
        prop_assert_eq!(source, DataSource::Csv);
        prop_assert_eq!(history.len(), 24);
        prop_assert_eq!(history[0].date, month(23));
        prop_assert!(history.windows(2).all(|w| w[0].date > w[1].date));
    }
}
