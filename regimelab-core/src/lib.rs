//! RegimeLab Core: signal algorithms for market regime transitions.
//!
//! This crate contains the pure, stateless part of the system:
//! - Most-recent-first series types (`series`)
//! - Monthly downsampling, ratios, SMA, crossovers, ROC, percentile, correlation (`timeseries`)
//! - Transition strength scoring and direction classification
//! - The generic component calculator and its six component specs
//! - Weighted composite scoring and regime classification
//!
//! Nothing here performs I/O. Every function is a deterministic function of
//! its inputs, so the six components can be computed in any order or in
//! parallel before the composite and regime steps.

pub mod component;
pub mod composite;
pub mod direction;
pub mod regime;
pub mod series;
pub mod timeseries;
pub mod transition;

pub use component::{
    compute_component, AnalysisPeriods, ComponentKind, ComponentOutcome, ComponentReport,
    ComponentResult, ComponentSpec, CorrelationRegime, CorrelationWindows, Side,
    UnavailableReason, INSUFFICIENT_DATA_PREFIX,
};
pub use composite::{
    score_composite, CompositeInput, CompositeResult, CompositeWeights, CoverageLabel,
    DataQuality, Zone, SIGNAL_THRESHOLD,
};
pub use direction::{classify_direction, Direction, DirectionLabels, MomentumQualifier};
pub use regime::{
    check_consistency, classify_regime, Confidence, Consistency, ConsistencyEntry, Evidence,
    ProbabilityLevel, Regime, RegimeConfig, RegimeResult, RegimeThresholds,
    TransitionProbability,
};
pub use series::{
    DailyHistory, MonthlyPoint, MonthlySeries, PricePoint, RatioPoint, RatioSeries,
    ReverseChronoSeries,
};
pub use timeseries::{CrossoverEvent, CrossoverKind};
pub use transition::{score_transition, TransitionBreakdown, TransitionInputs};
