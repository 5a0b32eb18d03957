//! RegimeLab CLI: evaluate market regime transitions from local price files.
//!
//! Commands:
//! - `evaluate`: score the six components, composite and regime; write artifacts
//! - `config`: print the default TOML config, or validate a config file
//! - `symbols`: list every symbol a config needs

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use regimelab_runner::runner::evaluate_dir;
use regimelab_runner::{write_artifacts, Evaluation, EvaluationConfig, LoadOptions};

/// Years of synthetic history generated with `--synthetic`.
const SYNTHETIC_YEARS: u32 = 5;

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI, market regime transition detector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the current regime from price files in a data directory.
    Evaluate {
        /// Directory holding <SYMBOL>.json or <SYMBOL>.csv files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for evaluation.json and report.md.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Generate synthetic histories for symbols with no file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Last date of synthetic histories (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Compute components one at a time instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Print the evaluation JSON to stdout instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_write: bool,
    },
    /// Print the default config as TOML, or validate a config file.
    Config {
        /// Validate this file instead of printing defaults.
        #[arg(long)]
        check: Option<PathBuf>,
    },
    /// List the symbols a config reads, proxies included.
    Symbols {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            data_dir,
            config,
            output_dir,
            synthetic,
            as_of,
            sequential,
            json,
            no_write,
        } => run_evaluate(
            &data_dir,
            config.as_deref(),
            &output_dir,
            synthetic,
            as_of.as_deref(),
            sequential,
            json,
            no_write,
        ),
        Commands::Config { check } => run_config(check.as_deref()),
        Commands::Symbols { config } => run_symbols(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<EvaluationConfig> {
    match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            EvaluationConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(EvaluationConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_evaluate(
    data_dir: &Path,
    config_path: Option<&Path>,
    output_dir: &Path,
    synthetic: bool,
    as_of: Option<&str>,
    sequential: bool,
    json: bool,
    no_write: bool,
) -> Result<()> {
    if as_of.is_some() && !synthetic {
        bail!("--as-of only applies to synthetic data; add --synthetic");
    }
    if !synthetic && !data_dir.is_dir() {
        bail!(
            "data directory {} does not exist (use --synthetic for synthetic data)",
            data_dir.display()
        );
    }

    let mut config = load_config(config_path)?;
    if sequential {
        config.evaluation.parallel = false;
    }

    let opts = if synthetic {
        let end = as_of
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .transpose()
            .context("--as-of must be YYYY-MM-DD")?
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        LoadOptions::with_synthetic(end, SYNTHETIC_YEARS)
    } else {
        LoadOptions::files_only()
    };

    let evaluation = evaluate_dir(data_dir, &config, &opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_summary(&evaluation);
    }

    if !no_write {
        let paths = write_artifacts(&evaluation, output_dir)?;
        if !json {
            println!("Artifacts saved to: {}", paths.dir.display());
        }
    }

    Ok(())
}

fn run_config(check: Option<&Path>) -> Result<()> {
    match check {
        Some(path) => {
            let config = load_config(Some(path))?;
            println!(
                "{} is valid ({} symbols)",
                path.display(),
                config.required_symbols().len()
            );
        }
        None => print!("{}", EvaluationConfig::default().to_toml()?),
    }
    Ok(())
}

fn run_symbols(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    for symbol in config.required_symbols() {
        println!("{symbol}");
    }
    Ok(())
}

fn print_summary(evaluation: &Evaluation) {
    let composite = &evaluation.composite;
    let regime = &evaluation.regime;

    println!("\n=== Regime Evaluation ===");
    println!("ID:          {}", evaluation.short_id());
    if let Some(as_of) = evaluation.as_of {
        println!("As of:       {as_of}");
    }
    if evaluation.has_synthetic {
        println!("Data:        SYNTHETIC");
    }
    println!(
        "Composite:   {:.1} ({})",
        composite.composite_score, composite.zone
    );
    println!("Guidance:    {}", composite.guidance);
    println!(
        "Regime:      {} ({} confidence)",
        regime.current_regime, regime.confidence
    );
    println!(
        "Transition:  {} ({} signaling)",
        regime.transition_probability.level, regime.signaling_components
    );
    println!(
        "Coverage:    {}/{}",
        composite.data_quality.available_components, composite.data_quality.total_components
    );

    println!("\n--- Components ---");
    for c in &evaluation.components {
        let proxy = if c.proxy { " [proxy]" } else { "" };
        let flag = if c.data_available && c.score >= composite.signal_threshold {
            '*'
        } else {
            ' '
        };
        println!(
            "{flag} {:<18} {:>5.1}  {}{proxy}",
            c.component.as_str(),
            c.score,
            c.signal
        );
    }
}
