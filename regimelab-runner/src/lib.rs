//! RegimeLab Runner: evaluation orchestration, data loading, reporting.
//!
//! This crate builds on `regimelab-core` to provide:
//! - TOML configuration with validated weights and per-component overrides
//! - History loading from JSON/CSV files with a synthetic fallback
//! - Evaluation of the six components (parallel or sequential), composite and regime
//! - Proxy-pair substitution for components whose primary data is missing
//! - Evaluation fingerprinting and JSON/Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod report;
pub mod runner;

pub use config::{ComponentConfig, ComponentPlan, ConfigError, EvaluationConfig, SymbolPair};
pub use data_loader::{
    generate_synthetic_history, load_histories, load_history, DataSource, LoadError, LoadOptions,
    LoadedHistories,
};
pub use report::{render_markdown, write_artifacts, ArtifactPaths, ExportError};
pub use runner::{evaluate, evaluate_dir, Evaluation, EvaluateError};
