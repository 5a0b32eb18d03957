//! Evaluation runner: wires together loading, components, composite and regime.
//!
//! Two entry points:
//! - `evaluate_dir()`: loads histories from a data directory, then evaluates. Used by the CLI.
//! - `evaluate()`: takes pre-loaded histories, no I/O.
//!
//! The six components are independent, so they run on the rayon pool when
//! `[evaluation] parallel` is set; the composite and regime steps wait for
//! all six.

use std::path::Path;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::component::{compute_component, ComponentOutcome, ComponentReport};
use regimelab_core::composite::{score_composite, CompositeInput, CompositeResult, CoverageLabel};
use regimelab_core::regime::{check_consistency, classify_regime, ConsistencyEntry, RegimeResult};

use crate::config::{ComponentPlan, ConfigError, EvaluationConfig};
use crate::data_loader::{load_histories, LoadError, LoadOptions, LoadedHistories};

/// Current schema version for persisted evaluations.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("failed to fingerprint evaluation: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Complete result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 over the config and every input bar.
    pub evaluation_id: String,
    /// Most recent month-end used by any available component.
    pub as_of: Option<NaiveDate>,
    pub has_synthetic: bool,
    pub dataset_hash: String,
    /// Canonical component order; unavailable components in sentinel form.
    pub components: Vec<ComponentReport>,
    pub composite: CompositeResult,
    pub regime: RegimeResult,
    pub consistency: Vec<ConsistencyEntry>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Evaluation {
    /// First 12 hex characters of the id, used for directory names.
    pub fn short_id(&self) -> &str {
        self.evaluation_id
            .get(..12)
            .unwrap_or(&self.evaluation_id)
    }
}

/// Load histories for every configured symbol from `dir`, then evaluate.
pub fn evaluate_dir(
    dir: &Path,
    config: &EvaluationConfig,
    opts: &LoadOptions,
) -> Result<Evaluation, EvaluateError> {
    config.validate()?;
    let symbols = config.required_symbols();
    let loaded = load_histories(dir, symbols.iter().map(String::as_str), opts)?;
    evaluate(&loaded, config)
}

/// Evaluate pre-loaded histories without I/O.
pub fn evaluate(
    data: &LoadedHistories,
    config: &EvaluationConfig,
) -> Result<Evaluation, EvaluateError> {
    config.validate()?;
    let evaluation_id = evaluation_id(config, &data.dataset_hash)?;

    let plans = config.component_plans();
    let outcomes = compute_outcomes(&plans, data, config.evaluation.parallel);

    let composite = score_composite(
        &CompositeInput::from_outcomes(&outcomes),
        &config.weights,
        config.regime.signal_threshold,
    );
    let regime_config = config.regime_config();
    let regime = classify_regime(&outcomes, composite.composite_score, &regime_config);
    let consistency = check_consistency(regime.current_regime, &outcomes, &regime_config);

    let as_of = outcomes.iter().filter_map(|o| o.result()).map(|r| r.as_of).max();

    if data.has_synthetic {
        warn!("evaluation uses synthetic data; results are for development only");
    }
    if composite.data_quality.label != CoverageLabel::Complete {
        warn!(
            "degraded coverage ({}/{}): missing {:?}",
            composite.data_quality.available_components,
            composite.data_quality.total_components,
            composite.data_quality.missing
        );
    }
    info!(
        "evaluation {}: composite {:.1} ({}), regime {} ({} confidence), transition probability {}",
        &evaluation_id[..12],
        composite.composite_score,
        composite.zone,
        regime.current_regime,
        regime.confidence,
        regime.transition_probability.level
    );

    Ok(Evaluation {
        schema_version: SCHEMA_VERSION,
        evaluation_id,
        as_of,
        has_synthetic: data.has_synthetic,
        dataset_hash: data.dataset_hash.clone(),
        components: outcomes.iter().map(ComponentOutcome::report).collect(),
        composite,
        regime,
        consistency,
    })
}

/// Compute every component, in canonical order.
pub fn compute_outcomes(
    plans: &[ComponentPlan],
    data: &LoadedHistories,
    parallel: bool,
) -> Vec<ComponentOutcome> {
    if parallel {
        plans.par_iter().map(|plan| compute_plan(plan, data)).collect()
    } else {
        plans.iter().map(|plan| compute_plan(plan, data)).collect()
    }
}

/// One component, falling back to its proxy pair when a primary history is
/// empty and both proxy histories are present.
fn compute_plan(plan: &ComponentPlan, data: &LoadedHistories) -> ComponentOutcome {
    let spec = &plan.spec;
    let numerator = data.history(&spec.numerator);
    let denominator = data.history(&spec.denominator);

    if let Some(proxy) = &plan.proxy {
        if numerator.is_empty() || denominator.is_empty() {
            let proxy_num = data.history(&proxy.numerator);
            let proxy_den = data.history(&proxy.denominator);
            if !proxy_num.is_empty() && !proxy_den.is_empty() {
                warn!(
                    "{}: primary pair {} has no data, using proxy {}/{}",
                    spec.kind,
                    spec.pair_label(),
                    proxy.numerator,
                    proxy.denominator
                );
                let proxy_spec = spec
                    .clone()
                    .with_pair(proxy.numerator.clone(), proxy.denominator.clone());
                return compute_component(&proxy_spec, proxy_num, proxy_den).into_proxy();
            }
            debug!("{}: proxy {}/{} has no data either", spec.kind, proxy.numerator, proxy.denominator);
        }
    }

    compute_component(spec, numerator, denominator)
}

/// Deterministic id: BLAKE3 over the serialized config and the dataset hash.
///
/// Two evaluations of the same config on the same bars share an id.
pub fn evaluation_id(config: &EvaluationConfig, dataset_hash: &str) -> Result<String, EvaluateError> {
    let json = serde_json::to_vec(config)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(&json);
    hasher.update(dataset_hash.as_bytes());
    Ok(hasher.finalize().to_hex().to_string())
}
