//! Pipeline orchestration.
//!
//! Two entry paths into the same terminal sequence:
//! - **Cached**: a previously processed panel exists in the output
//!   directory and reuse is permitted — load it and skip the
//!   clean/currency/futures stages. Existing return-series artifacts
//!   are reused the same way.
//! - **Full**: ingest the raw source, then clean → normalize to USD →
//!   smooth futures rolls.
//!
//! From either path: compute whichever return series were not reused,
//! build the dictionary, and persist every artifact. The orchestrator
//! is deterministic — identical raw input and configuration produce
//! byte-identical numeric artifacts; only the dictionary's creation
//! timestamp differs between runs. A blake3 fingerprint over the final
//! panel makes that checkable.

use crate::loader::{self, IngestError};
use crate::store::{self, StoreError};
use quantpanel_core::{
    clean, compute_returns, normalize_to_usd, smooth_futures_rolls, CleanError, DataDictionary,
    DictionaryBuilder, MarketConfig, Panel, Period, Stage, StageWarning,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options controlling one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Raw source file (CSV or Parquet). Optional when a cached panel
    /// can be reused.
    pub input: Option<PathBuf>,
    /// Directory receiving every artifact.
    pub output_dir: PathBuf,
    /// Reuse `daily_prices.parquet` (and return artifacts) if present.
    pub use_existing: bool,
}

/// Artifact locations inside the output directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub daily_prices_parquet: PathBuf,
    pub daily_prices_xlsx: PathBuf,
    pub daily_returns_parquet: PathBuf,
    pub monthly_returns_parquet: PathBuf,
    pub dictionary_xlsx: PathBuf,
    pub dictionary_json: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            daily_prices_parquet: output_dir.join("daily_prices.parquet"),
            daily_prices_xlsx: output_dir.join("daily_prices.xlsx"),
            daily_returns_parquet: output_dir.join("daily_returns.parquet"),
            monthly_returns_parquet: output_dir.join("monthly_returns.parquet"),
            dictionary_xlsx: output_dir.join("data_dictionary.xlsx"),
            dictionary_json: output_dir.join("data_dictionary.json"),
        }
    }

    /// All artifact paths, for summary printing.
    pub fn all(&self) -> [&Path; 6] {
        [
            &self.daily_prices_parquet,
            &self.daily_prices_xlsx,
            &self.daily_returns_parquet,
            &self.monthly_returns_parquet,
            &self.dictionary_xlsx,
            &self.dictionary_json,
        ]
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no input file given and no reusable panel at {0}")]
    NoInput(PathBuf),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("clean stage: {0}")]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("output directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub prices: Panel,
    pub daily_returns: Panel,
    pub monthly_returns: Panel,
    pub dictionary: DataDictionary,
    /// Stage warnings, dictionary warnings included.
    pub warnings: Vec<StageWarning>,
    /// Whether the cached panel path was taken.
    pub reused_panel: bool,
    pub reused_daily_returns: bool,
    pub reused_monthly_returns: bool,
    /// blake3 over the final panel's dates, tickers and cells.
    pub dataset_fingerprint: String,
    pub artifacts: ArtifactPaths,
}

impl PipelineRun {
    /// Warning tallies per stage, for the run summary.
    pub fn warning_counts(&self) -> BTreeMap<Stage, usize> {
        let mut counts = BTreeMap::new();
        for warning in &self.warnings {
            *counts.entry(warning.stage).or_insert(0) += 1;
        }
        counts
    }
}

/// Execute the pipeline.
pub fn run_pipeline(config: &MarketConfig, opts: &RunOptions) -> Result<PipelineRun, RunError> {
    std::fs::create_dir_all(&opts.output_dir)?;
    let artifacts = ArtifactPaths::new(&opts.output_dir);

    let mut warnings: Vec<StageWarning> = Vec::new();

    // ── Panel: cached or full path ───────────────────────────────────
    let (prices, reused_panel) = if opts.use_existing && artifacts.daily_prices_parquet.exists() {
        let panel = loader::load_panel(&artifacts.daily_prices_parquet)?;
        (panel, true)
    } else {
        let input = opts
            .input
            .as_deref()
            .ok_or_else(|| RunError::NoInput(artifacts.daily_prices_parquet.clone()))?;

        let raw = loader::load_panel(input)?;
        let cleaned = clean(&raw)?;
        let (usd, currency_warnings) = normalize_to_usd(&cleaned.panel, &config.fx);
        warnings.extend(currency_warnings);
        let (rolled, futures_warnings) = smooth_futures_rolls(&usd, &config.futures.tickers);
        warnings.extend(futures_warnings);
        (rolled, false)
    };

    // ── Return series: reuse artifacts only alongside a reused panel,
    // so cached returns can never disagree with fresh prices ─────────
    let (daily_returns, reused_daily) = load_or_compute_returns(
        &prices,
        &artifacts.daily_returns_parquet,
        Period::Daily,
        reused_panel,
    );
    let (monthly_returns, reused_monthly) = load_or_compute_returns(
        &prices,
        &artifacts.monthly_returns_parquet,
        Period::Monthly,
        reused_panel,
    );

    // ── Dictionary ───────────────────────────────────────────────────
    let dictionary =
        DictionaryBuilder::new(config).build(&prices, Some(&daily_returns), Some(&monthly_returns));
    warnings.extend(dictionary.warnings.iter().cloned());

    let dataset_fingerprint = fingerprint(&prices);

    // ── Persist ──────────────────────────────────────────────────────
    store::save_panel(&prices, &artifacts.daily_prices_parquet)?;
    store::save_panel(&prices, &artifacts.daily_prices_xlsx)?;
    store::save_panel(&daily_returns, &artifacts.daily_returns_parquet)?;
    store::save_panel(&monthly_returns, &artifacts.monthly_returns_parquet)?;
    store::save_dictionary(&dictionary, &artifacts.dictionary_xlsx)?;
    store::save_dictionary_json(&dictionary, &artifacts.dictionary_json)?;

    Ok(PipelineRun {
        prices,
        daily_returns,
        monthly_returns,
        dictionary,
        warnings,
        reused_panel,
        reused_daily_returns: reused_daily,
        reused_monthly_returns: reused_monthly,
        dataset_fingerprint,
        artifacts,
    })
}

fn load_or_compute_returns(
    prices: &Panel,
    artifact: &Path,
    period: Period,
    reuse_permitted: bool,
) -> (Panel, bool) {
    if reuse_permitted && artifact.exists() {
        match loader::load_panel(artifact) {
            Ok(panel) => return (panel, true),
            Err(e) => {
                // A stale or unreadable artifact is recomputed, not fatal.
                eprintln!(
                    "WARNING: could not reuse {} ({e}); recomputing",
                    artifact.display()
                );
            }
        }
    }
    (compute_returns(prices, period), false)
}

/// Deterministic blake3 fingerprint over the panel contents.
///
/// Covers dates, tickers and little-endian cell bytes in panel order
/// (column order is itself deterministic, preserved from the source).
fn fingerprint(panel: &Panel) -> String {
    let mut hasher = blake3::Hasher::new();
    for date in panel.dates() {
        hasher.update(date.to_string().as_bytes());
    }
    for (ticker, values) in panel.columns() {
        hasher.update(ticker.as_bytes());
        for value in values {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::synthetic_panel;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn write_sample_csv(dir: &Path) -> PathBuf {
        let tickers: Vec<String> = ["SPX Index", "NKY Index", "USDJPY Curncy", "CO1 Comdty"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let panel = synthetic_panel(&tickers, d("2024-01-01"), d("2024-06-28")).unwrap();
        let path = dir.join("raw.csv");
        store::save_panel(&panel, &path).unwrap();
        path
    }

    #[test]
    fn full_path_produces_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample_csv(dir.path());
        let config = MarketConfig::default_asian_markets();

        let run = run_pipeline(
            &config,
            &RunOptions {
                input: Some(input),
                output_dir: dir.path().join("processed"),
                use_existing: false,
            },
        )
        .unwrap();

        assert!(!run.reused_panel);
        for path in run.artifacts.all() {
            assert!(path.exists(), "missing artifact {}", path.display());
        }
        assert_eq!(run.daily_returns.n_rows(), run.prices.n_rows() - 1);
    }

    #[test]
    fn second_run_takes_the_cached_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample_csv(dir.path());
        let config = MarketConfig::default_asian_markets();
        let output_dir = dir.path().join("processed");

        let opts = RunOptions {
            input: Some(input),
            output_dir: output_dir.clone(),
            use_existing: true,
        };
        let first = run_pipeline(&config, &opts).unwrap();
        assert!(!first.reused_panel);

        // No input needed the second time around.
        let cached = run_pipeline(
            &config,
            &RunOptions {
                input: None,
                output_dir,
                use_existing: true,
            },
        )
        .unwrap();

        assert!(cached.reused_panel);
        assert!(cached.reused_daily_returns);
        assert!(cached.reused_monthly_returns);
        assert_eq!(cached.dataset_fingerprint, first.dataset_fingerprint);
    }

    #[test]
    fn missing_input_without_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = MarketConfig::default_asian_markets();

        let err = run_pipeline(
            &config,
            &RunOptions {
                input: None,
                output_dir: dir.path().to_path_buf(),
                use_existing: true,
            },
        )
        .unwrap_err();

        assert!(matches!(err, RunError::NoInput(_)));
    }

    #[test]
    fn repeated_full_runs_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample_csv(dir.path());
        let config = MarketConfig::default_asian_markets();

        let run = |out: &str| {
            run_pipeline(
                &config,
                &RunOptions {
                    input: Some(input.clone()),
                    output_dir: dir.path().join(out),
                    use_existing: false,
                },
            )
            .unwrap()
        };

        let a = run("a");
        let b = run("b");

        assert_eq!(a.dataset_fingerprint, b.dataset_fingerprint);
        assert_eq!(a.prices, b.prices);
        assert_eq!(a.daily_returns, b.daily_returns);
    }
}
