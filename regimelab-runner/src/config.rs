//! Evaluation configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid config that
//! reproduces the standard six components, weights and regime thresholds.
//!
//! ```toml
//! [components.concentration]
//! numerator = "SPY"
//! denominator = "RSP"
//!
//! [components.concentration.proxy]
//! numerator = "QQQ"
//! denominator = "QQQE"
//!
//! [weights]
//! concentration = 0.25
//!
//! [regime]
//! signal_threshold = 40.0
//!
//! [evaluation]
//! parallel = true
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::component::{AnalysisPeriods, ComponentKind, ComponentSpec};
use regimelab_core::composite::CompositeWeights;
use regimelab_core::regime::{RegimeConfig, RegimeThresholds};

/// Allowed distance of the weight total from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown component '{0}' (expected one of: concentration, yield_curve, credit_conditions, size_factor, equity_bond, sector_rotation)")]
    UnknownComponent(String),

    #[error("component weights must sum to 1.0, got {0}")]
    WeightsDoNotSumToOne(f64),

    #[error("weight for {component} must be a finite non-negative number, got {value}")]
    InvalidWeight { component: String, value: f64 },

    #[error("{component}: {field} must be positive")]
    NonPositivePeriod {
        component: String,
        field: &'static str,
    },

    #[error("{component}: short_period ({short}) must be below long_period ({long})")]
    PeriodOrder {
        component: String,
        short: usize,
        long: usize,
    },

    #[error("{component}: symbol must not be empty")]
    EmptySymbol { component: String },
}

/// A numerator/denominator symbol pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPair {
    pub numerator: String,
    pub denominator: String,
}

/// Per-component overrides (`[components.<name>]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Overrides the default numerator symbol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerator: Option<String>,
    /// Overrides the default denominator symbol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominator: Option<String>,
    pub short_period: usize,
    pub long_period: usize,
    pub fast_roc: usize,
    pub slow_roc: usize,
    pub min_months: usize,
    /// Pair used when a primary history is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<SymbolPair>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        let periods = AnalysisPeriods::default();
        Self {
            numerator: None,
            denominator: None,
            short_period: periods.short_sma,
            long_period: periods.long_sma,
            fast_roc: periods.fast_roc,
            slow_roc: periods.slow_roc,
            min_months: periods.min_months,
            proxy: None,
        }
    }
}

impl ComponentConfig {
    fn for_kind(kind: ComponentKind) -> Self {
        let (numerator, denominator) = kind.default_pair();
        Self {
            numerator: Some(numerator.to_string()),
            denominator: Some(denominator.to_string()),
            ..Self::default()
        }
    }

    fn periods(&self) -> AnalysisPeriods {
        AnalysisPeriods {
            short_sma: self.short_period,
            long_sma: self.long_period,
            fast_roc: self.fast_roc,
            slow_roc: self.slow_roc,
            min_months: self.min_months,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let positive = [
            ("short_period", self.short_period),
            ("long_period", self.long_period),
            ("fast_roc", self.fast_roc),
            ("slow_roc", self.slow_roc),
            ("min_months", self.min_months),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::NonPositivePeriod {
                    component: name.to_string(),
                    field,
                });
            }
        }
        if self.short_period >= self.long_period {
            return Err(ConfigError::PeriodOrder {
                component: name.to_string(),
                short: self.short_period,
                long: self.long_period,
            });
        }

        let symbols = [self.numerator.as_deref(), self.denominator.as_deref()]
            .into_iter()
            .flatten()
            .chain(
                self.proxy
                    .iter()
                    .flat_map(|p| [p.numerator.as_str(), p.denominator.as_str()]),
            );
        for symbol in symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::EmptySymbol {
                    component: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// `[evaluation]` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Compute the six components on the rayon pool.
    pub parallel: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Full evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Keyed by component name (`concentration`, `yield_curve`, ...).
    pub components: BTreeMap<String, ComponentConfig>,
    pub weights: CompositeWeights,
    pub regime: RegimeThresholds,
    pub evaluation: EvaluationOptions,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        let components = ComponentKind::ALL
            .into_iter()
            .map(|kind| (kind.as_str().to_string(), ComponentConfig::for_kind(kind)))
            .collect();
        Self {
            components,
            weights: CompositeWeights::default(),
            regime: RegimeThresholds::default(),
            evaluation: EvaluationOptions::default(),
        }
    }
}

/// One component ready to evaluate: its spec plus an optional proxy pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPlan {
    pub spec: ComponentSpec,
    pub proxy: Option<SymbolPair>,
}

fn parse_kind(name: &str) -> Result<ComponentKind, ConfigError> {
    ComponentKind::ALL
        .into_iter()
        .find(|k| k.as_str() == name)
        .ok_or_else(|| ConfigError::UnknownComponent(name.to_string()))
}

impl EvaluationConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, component) in &self.components {
            parse_kind(name)?;
            component.validate(name)?;
        }

        for kind in ComponentKind::ALL {
            let value = self.weights.weight(kind);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    component: kind.as_str().to_string(),
                    value,
                });
            }
        }
        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne(total));
        }
        Ok(())
    }

    /// Component plans in canonical order. Components missing from
    /// `[components]` use their defaults.
    pub fn component_plans(&self) -> Vec<ComponentPlan> {
        ComponentKind::ALL
            .into_iter()
            .map(|kind| {
                let base = ComponentSpec::for_kind(kind);
                match self.components.get(kind.as_str()) {
                    None => ComponentPlan {
                        spec: base,
                        proxy: None,
                    },
                    Some(overrides) => {
                        let numerator = overrides
                            .numerator
                            .clone()
                            .unwrap_or_else(|| base.numerator.clone());
                        let denominator = overrides
                            .denominator
                            .clone()
                            .unwrap_or_else(|| base.denominator.clone());
                        let mut spec = base.with_pair(numerator, denominator);
                        spec.periods = overrides.periods();
                        ComponentPlan {
                            spec,
                            proxy: overrides.proxy.clone(),
                        }
                    }
                }
            })
            .collect()
    }

    /// Every symbol the evaluation may read, proxies included, sorted.
    pub fn required_symbols(&self) -> BTreeSet<String> {
        self.component_plans()
            .into_iter()
            .flat_map(|plan| {
                let mut symbols = vec![plan.spec.numerator, plan.spec.denominator];
                if let Some(proxy) = plan.proxy {
                    symbols.push(proxy.numerator);
                    symbols.push(proxy.denominator);
                }
                symbols
            })
            .collect()
    }

    /// Regime tables with this config's thresholds.
    pub fn regime_config(&self) -> RegimeConfig {
        RegimeConfig::default().with_thresholds(self.regime)
    }
}
