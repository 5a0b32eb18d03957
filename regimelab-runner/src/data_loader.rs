//! Price history loading for the runner.
//!
//! Given a data directory and a list of symbols, reads one file per symbol
//! and returns most-recent-first daily histories. Resolution per symbol:
//! 1. `<dir>/<SYMBOL>.json` (array of `{date, close, adjClose?}`)
//! 2. `<dir>/<SYMBOL>.csv` (header `date,close[,adjClose]`)
//! 3. If neither exists and `synthetic` is set → seeded random walk (tagged)
//! 4. Otherwise → empty history
//!
//! An empty history is not an error: the component that needs it reports
//! insufficient data and the rest of the evaluation proceeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::series::{DailyHistory, PricePoint};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON history '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse CSV history '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{symbol}: unparseable date '{value}'")]
    InvalidDate { symbol: String, value: String },
}

/// Where a symbol's history came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Json,
    Csv,
    Synthetic,
    InMemory,
    Missing,
}

/// Options controlling how histories are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Generate synthetic histories for symbols with no file.
    pub synthetic: bool,
    /// First date of generated synthetic histories.
    pub synthetic_start: NaiveDate,
    /// Last date of generated synthetic histories.
    pub synthetic_end: NaiveDate,
}

impl LoadOptions {
    /// Real data only.
    pub fn files_only() -> Self {
        let end = chrono::Local::now().date_naive();
        Self {
            synthetic: false,
            synthetic_start: end,
            synthetic_end: end,
        }
    }

    /// Synthetic fallback covering `years` years up to `end`.
    pub fn with_synthetic(end: NaiveDate, years: u32) -> Self {
        let start = end
            .with_year(end.year() - years as i32)
            .unwrap_or_else(|| end - chrono::Duration::days(365 * years as i64));
        Self {
            synthetic: true,
            synthetic_start: start,
            synthetic_end: end,
        }
    }
}

/// Loaded histories plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedHistories {
    /// Sorted by symbol.
    pub histories: BTreeMap<String, DailyHistory>,
    pub sources: BTreeMap<String, DataSource>,
    /// BLAKE3 over every loaded bar.
    pub dataset_hash: String,
    /// Whether any symbol used synthetic data.
    pub has_synthetic: bool,
}

impl LoadedHistories {
    /// Wrap histories that were built in memory.
    pub fn from_histories(histories: BTreeMap<String, DailyHistory>, has_synthetic: bool) -> Self {
        let source = if has_synthetic {
            DataSource::Synthetic
        } else {
            DataSource::InMemory
        };
        let sources = histories.keys().map(|s| (s.clone(), source)).collect();
        let dataset_hash = compute_dataset_hash(&histories);
        Self {
            histories,
            sources,
            dataset_hash,
            has_synthetic,
        }
    }

    /// History for a symbol; empty when the symbol was never loaded.
    pub fn history(&self, symbol: &str) -> &[PricePoint] {
        match self.histories.get(symbol) {
            Some(history) => history,
            None => &[],
        }
    }

    pub fn missing_symbols(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|(_, source)| **source == DataSource::Missing)
            .map(|(sym, _)| sym.as_str())
            .collect()
    }
}

/// One row of a history file.
#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    close: f64,
    #[serde(rename = "adjClose", alias = "adj_close", default)]
    adj_close: Option<f64>,
}

fn parse_date(symbol: &str, value: &str) -> Result<NaiveDate, LoadError> {
    let trimmed = value.trim();
    // accept full timestamps by reading only the calendar date
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| LoadError::InvalidDate {
        symbol: symbol.to_string(),
        value: value.to_string(),
    })
}

fn rows_to_history(symbol: &str, rows: Vec<RawRow>) -> Result<DailyHistory, LoadError> {
    let points = rows
        .into_iter()
        .map(|row| {
            let date = parse_date(symbol, &row.date)?;
            let point = PricePoint::new(date, row.close);
            Ok(match row.adj_close {
                Some(adj) => point.with_adj_close(adj),
                None => point,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;
    Ok(DailyHistory::from_unordered(points))
}

fn read_json(symbol: &str, path: &Path) -> Result<DailyHistory, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows: Vec<RawRow> = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })?;
    rows_to_history(symbol, rows)
}

fn read_csv(symbol: &str, path: &Path) -> Result<DailyHistory, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let rows = reader
        .deserialize::<RawRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;
    rows_to_history(symbol, rows)
}

fn history_paths(dir: &Path, symbol: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{symbol}.json")),
        dir.join(format!("{symbol}.csv")),
    )
}

/// Load one symbol's history from `dir`.
///
/// Returns the history and its source; a symbol with no file yields an
/// empty history with [`DataSource::Missing`].
pub fn load_history(dir: &Path, symbol: &str) -> Result<(DailyHistory, DataSource), LoadError> {
    let (json_path, csv_path) = history_paths(dir, symbol);
    if json_path.is_file() {
        return Ok((read_json(symbol, &json_path)?, DataSource::Json));
    }
    if csv_path.is_file() {
        return Ok((read_csv(symbol, &csv_path)?, DataSource::Csv));
    }
    Ok((DailyHistory::empty(), DataSource::Missing))
}

/// Load histories for a set of symbols, with optional synthetic fallback.
pub fn load_histories<'a>(
    dir: &Path,
    symbols: impl IntoIterator<Item = &'a str>,
    opts: &LoadOptions,
) -> Result<LoadedHistories, LoadError> {
    let mut histories = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let mut has_synthetic = false;

    for symbol in symbols {
        let (mut history, mut source) = load_history(dir, symbol)?;

        if source == DataSource::Missing && opts.synthetic {
            log::warn!("generating synthetic data for {symbol}; results will be tagged as synthetic");
            history = generate_synthetic_history(symbol, opts.synthetic_start, opts.synthetic_end);
            source = DataSource::Synthetic;
            has_synthetic = true;
        } else if source == DataSource::Missing {
            log::warn!("no history file for {symbol} in {}", dir.display());
        } else {
            log::debug!("loaded {} bars for {symbol} from {source:?}", history.len());
        }

        histories.insert(symbol.to_string(), history);
        sources.insert(symbol.to_string(), source);
    }

    let dataset_hash = compute_dataset_hash(&histories);

    Ok(LoadedHistories {
        histories,
        sources,
        dataset_hash,
        has_synthetic,
    })
}

/// Deterministic BLAKE3 hash over all bars, in sorted symbol order.
pub fn compute_dataset_hash(histories: &BTreeMap<String, DailyHistory>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, history) in histories {
        hasher.update(symbol.as_bytes());
        for bar in history {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.effective_close().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic daily history for development.
///
/// A random walk from 100.0 on weekdays, seeded from the symbol name so the
/// same symbol always produces the same series.
pub fn generate_synthetic_history(symbol: &str, start: NaiveDate, end: NaiveDate) -> DailyHistory {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.02..0.0205);
            price *= 1.0 + daily_return;
            bars.push(PricePoint::new(current, price));
        }
        current += chrono::Duration::days(1);
    }

    bars.reverse();
    DailyHistory::from_most_recent_first(bars)
}
