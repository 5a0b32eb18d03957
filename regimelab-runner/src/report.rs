//! Evaluation artifacts: pretty JSON plus a Markdown summary.
//!
//! Layout: `<output_dir>/<evaluation_id[..12]>/{evaluation.json, report.md}`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use regimelab_core::regime::Consistency;

use crate::runner::Evaluation;

/// Errors from artifact export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize evaluation: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths written by [`write_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub json: PathBuf,
    pub markdown: PathBuf,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write `evaluation.json` and `report.md` for one evaluation.
pub fn write_artifacts(evaluation: &Evaluation, output_dir: &Path) -> Result<ArtifactPaths, ExportError> {
    let dir = output_dir.join(evaluation.short_id());
    std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let json = dir.join("evaluation.json");
    std::fs::write(&json, to_json(evaluation)?).map_err(io_err(&json))?;

    let markdown = dir.join("report.md");
    std::fs::write(&markdown, render_markdown(evaluation)).map_err(io_err(&markdown))?;

    log::info!("wrote evaluation artifacts to {}", dir.display());
    Ok(ArtifactPaths {
        dir,
        json,
        markdown,
    })
}

/// Pretty-printed JSON for an evaluation.
pub fn to_json(evaluation: &Evaluation) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(evaluation)?)
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.2}{suffix}"))
}

/// Markdown report for an evaluation.
pub fn render_markdown(evaluation: &Evaluation) -> String {
    let composite = &evaluation.composite;
    let regime = &evaluation.regime;
    let as_of = evaluation
        .as_of
        .map_or_else(|| "n/a".to_string(), |d| d.to_string());

    let mut report = format!(
        "# RegimeLab Evaluation Report\n\n\
Evaluation ID: `{}`\n\
As of: {}\n\n\
## Composite\n\
- Score: {:.1} / 100\n\
- Zone: {}\n\
- Guidance: {}\n\
- Signaling components: {} (score >= {:.1})\n\
- Data coverage: {:?} ({}/{})\n",
        evaluation.evaluation_id,
        as_of,
        composite.composite_score,
        composite.zone,
        composite.guidance,
        composite.signaling_components,
        composite.signal_threshold,
        composite.data_quality.label,
        composite.data_quality.available_components,
        composite.data_quality.total_components,
    );

    if evaluation.has_synthetic {
        report.push_str("\n> **Synthetic data**: this evaluation is for development only.\n");
    }

    if !composite.actions.is_empty() {
        report.push_str("\n### Actions\n");
        for action in &composite.actions {
            report.push_str(&format!("- {action}\n"));
        }
    }

    report.push_str(&format!(
        "\n## Regime\n\
- Current regime: **{}**\n\
- Confidence: {}\n\
- Effective score: {}\n",
        regime.current_regime, regime.confidence, regime.effective_score
    ));
    if let Some(tied) = &regime.tied_regimes {
        let names: Vec<String> = tied.iter().map(|r| r.to_string()).collect();
        report.push_str(&format!("- Tied hypotheses: {}\n", names.join(", ")));
    }

    report.push_str("\n| Hypothesis | Points |\n|------------|--------|\n");
    for (hypothesis, points) in &regime.regime_scores {
        report.push_str(&format!("| {hypothesis} | {points} |\n"));
    }

    let probability = &regime.transition_probability;
    report.push_str(&format!(
        "\n## Transition Probability\n\
- Level: {} ({:.0}% to {:.0}%)\n",
        probability.level,
        probability.range_low * 100.0,
        probability.range_high * 100.0
    ));
    if let (Some(from), Some(to)) = (probability.from_regime, probability.to_regime) {
        report.push_str(&format!("- Path: {from} → {to}\n"));
    } else if let Some(to) = probability.to_regime {
        report.push_str(&format!("- Toward: {to}\n"));
    }

    report.push_str(
        "\n## Components\n\n\
| Component | Pair | Score | Direction | Momentum | ROC 3m | Percentile | Signal |\n\
|-----------|------|-------|-----------|----------|--------|------------|--------|\n",
    );
    for c in &evaluation.components {
        let pair = if c.proxy {
            format!("{}/{} (proxy)", c.numerator, c.denominator)
        } else {
            format!("{}/{}", c.numerator, c.denominator)
        };
        let percentile = c
            .percentile
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:.0}"));
        let marker = if c.data_available && c.score >= composite.signal_threshold {
            " ●"
        } else {
            ""
        };
        report.push_str(&format!(
            "| {}{} | {} | {:.1} | {} | {} | {} | {} | {} |\n",
            c.component,
            marker,
            pair,
            c.score,
            c.direction,
            c.momentum_qualifier,
            fmt_opt(c.roc_3m, "%"),
            percentile,
            c.signal
        ));
    }

    report.push_str("\n## Evidence\n");
    if regime.evidence.is_empty() {
        report.push_str("No component is signaling.\n");
    } else {
        for e in &regime.evidence {
            report.push_str(&format!("- {} ({:.1}): {}\n", e.component, e.score, e.signal));
        }
    }

    let contradicting: Vec<_> = evaluation
        .consistency
        .iter()
        .filter(|e| e.verdict == Consistency::Contradicting)
        .collect();
    if !contradicting.is_empty() {
        report.push_str(&format!("\n## Contradictions with {}\n", regime.current_regime));
        for entry in contradicting {
            let expected = entry
                .expected
                .map_or_else(|| "n/a".to_string(), |d| d.to_string());
            report.push_str(&format!(
                "- {}: expected {expected}, observed {}\n",
                entry.component, entry.actual
            ));
        }
    }

    report
}
