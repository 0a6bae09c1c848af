//! Data dictionary: per-ticker quality and distribution statistics plus
//! run-level metadata.
//!
//! Every ticker is evaluated independently — one entry per column, each
//! computed in isolation, so a pathological series produces placeholder
//! values and a warning instead of discarding the statistics already
//! computed for its neighbours.

pub mod stats;

use crate::config::MarketConfig;
use crate::domain::Panel;
use crate::pipeline::{Period, Stage, StageWarning};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use stats::{round2, round4};

/// Price-level statistics for one ticker (4 dp).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: f64,
    /// Sample std; absent with a single observation.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub last: f64,
}

/// Return-distribution statistics for one ticker, expressed in
/// percentage points (4 dp). Skewness is unitless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnStats {
    pub mean_pct: f64,
    pub std_dev_pct: Option<f64>,
    pub min_pct: f64,
    pub max_pct: f64,
    pub skewness: Option<f64>,
    pub annualized_vol_pct: Option<f64>,
}

/// One row of the data dictionary.
#[derive(Debug, Clone, Serialize)]
pub struct DictionaryEntry {
    pub ticker: String,
    pub asset_class: String,
    pub description: String,
    /// Always "USD": the dictionary documents the normalized panel.
    pub currency: String,
    pub original_currency: String,
    pub risk_bucket: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub data_points: usize,
    pub missing_values: usize,
    pub missing_pct: f64,
    pub completeness_pct: f64,
    pub price: Option<PriceStats>,
    pub daily_returns: Option<ReturnStats>,
    pub monthly_returns: Option<ReturnStats>,
}

/// Run-level metadata attached to the dictionary.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub created_at: NaiveDateTime,
    pub asset_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub trading_days: usize,
    /// Entry count per asset class, "Unknown" included.
    pub class_distribution: BTreeMap<String, usize>,
}

/// The complete dictionary snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DataDictionary {
    pub entries: Vec<DictionaryEntry>,
    pub metadata: RunMetadata,
    pub warnings: Vec<StageWarning>,
}

/// Builds the dictionary from the final panel and its return series.
pub struct DictionaryBuilder<'a> {
    config: &'a MarketConfig,
}

impl<'a> DictionaryBuilder<'a> {
    pub fn new(config: &'a MarketConfig) -> Self {
        Self { config }
    }

    /// Build one entry per panel column, never aborting on a bad ticker.
    pub fn build(
        &self,
        prices: &Panel,
        daily_returns: Option<&Panel>,
        monthly_returns: Option<&Panel>,
    ) -> DataDictionary {
        let mut entries = Vec::with_capacity(prices.n_cols());
        let mut warnings = Vec::new();

        for column in 0..prices.n_cols() {
            let (entry, entry_warnings) =
                self.entry_for(prices, column, daily_returns, monthly_returns);
            entries.push(entry);
            warnings.extend(entry_warnings);
        }

        let mut class_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &entries {
            *class_distribution.entry(entry.asset_class.clone()).or_insert(0) += 1;
        }

        let metadata = RunMetadata {
            created_at: chrono::Local::now().naive_local(),
            asset_count: entries.len(),
            start_date: prices.dates().first().copied(),
            end_date: prices.dates().last().copied(),
            trading_days: prices.n_rows(),
            class_distribution,
        };

        DataDictionary {
            entries,
            metadata,
            warnings,
        }
    }

    fn entry_for(
        &self,
        prices: &Panel,
        column: usize,
        daily_returns: Option<&Panel>,
        monthly_returns: Option<&Panel>,
    ) -> (DictionaryEntry, Vec<StageWarning>) {
        let ticker = &prices.tickers()[column];
        let mut warnings = Vec::new();

        let (asset_class, description, original_currency, risk_bucket) =
            match self.config.class_of(ticker) {
                Some((name, class)) => (
                    name.to_string(),
                    class.description.clone(),
                    class.currency.clone(),
                    class.risk_bucket.clone(),
                ),
                None => {
                    warnings.push(StageWarning::new(
                        Stage::Dictionary,
                        ticker.clone(),
                        "ticker not declared in any asset class".to_string(),
                    ));
                    (
                        "Unknown".to_string(),
                        String::new(),
                        "Unknown".to_string(),
                        "Unknown".to_string(),
                    )
                }
            };

        let series = prices.column_at(column);
        let total = series.len();
        let data_points = total - series.iter().filter(|v| v.is_nan()).count();
        let completeness = if total > 0 {
            data_points as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let price = match price_stats(series) {
            Ok(stats) => stats,
            Err(reason) => {
                warnings.push(StageWarning::new(
                    Stage::Dictionary,
                    ticker.clone(),
                    format!("price statistics not computable: {reason}"),
                ));
                None
            }
        };

        let mut returns_for = |panel: Option<&Panel>, period: Period| {
            let series = panel.and_then(|p| p.column(ticker))?;
            match return_stats(series, period) {
                Ok(stats) => stats,
                Err(reason) => {
                    warnings.push(StageWarning::new(
                        Stage::Dictionary,
                        ticker.clone(),
                        format!("{period} return statistics not computable: {reason}"),
                    ));
                    None
                }
            }
        };

        let daily = returns_for(daily_returns, Period::Daily);
        let monthly = returns_for(monthly_returns, Period::Monthly);

        let entry = DictionaryEntry {
            ticker: ticker.clone(),
            asset_class,
            description,
            currency: "USD".to_string(),
            original_currency,
            risk_bucket,
            start_date: prices.first_valid(column),
            end_date: prices.last_valid(column),
            data_points,
            missing_values: total - data_points,
            missing_pct: round2(100.0 - completeness),
            completeness_pct: round2(completeness),
            price,
            daily_returns: daily,
            monthly_returns: monthly,
        };

        (entry, warnings)
    }
}

/// Price statistics, `Ok(None)` for an entirely-missing series and
/// `Err` when the series defeats arithmetic (non-finite values).
fn price_stats(series: &[f64]) -> Result<Option<PriceStats>, String> {
    let Some(mean) = stats::mean(series) else {
        return Ok(None); // entirely missing → N/A, by design not a warning
    };
    if !mean.is_finite() {
        return Err("series contains non-finite values".to_string());
    }

    Ok(Some(PriceStats {
        mean: round4(mean),
        std_dev: stats::sample_std(series).map(round4),
        min: round4(stats::min(series).unwrap_or(f64::NAN)),
        max: round4(stats::max(series).unwrap_or(f64::NAN)),
        last: round4(stats::last(series).unwrap_or(f64::NAN)),
    }))
}

/// Return statistics over a percentage-change series.
fn return_stats(series: &[f64], period: Period) -> Result<Option<ReturnStats>, String> {
    let Some(mean) = stats::mean(series) else {
        return Ok(None); // no valid return observation
    };
    if !mean.is_finite() {
        return Err("return series contains non-finite values".to_string());
    }

    let std_dev = stats::sample_std(series);
    Ok(Some(ReturnStats {
        mean_pct: round4(mean * 100.0),
        std_dev_pct: std_dev.map(|s| round4(s * 100.0)),
        min_pct: round4(stats::min(series).unwrap_or(f64::NAN) * 100.0),
        max_pct: round4(stats::max(series).unwrap_or(f64::NAN) * 100.0),
        skewness: stats::skewness(series).map(round4),
        annualized_vol_pct: std_dev
            .map(|s| round4(stats::annualized_volatility(s, period.periods_per_year()) * 100.0)),
    }))
}
