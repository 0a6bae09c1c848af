//! Panel ingestion — the Loader collaborator.
//!
//! The contract: a source either becomes a Panel with a fully-parsed
//! date axis and unambiguous column identity, or ingestion fails with a
//! structured error. Nothing guessed here ever flows downstream.
//!
//! Two source formats, selected by extension:
//! - `.csv` — first column is the date axis; remaining headers are
//!   tickers (blank headers are preserved blank and dropped later by
//!   the cleaner); blank / `N/A` / `#N/A` cells become NaN.
//! - `.parquet` — a `date` column plus one f64 column per ticker, the
//!   layout the store writes.

use chrono::NaiveDate;
use polars::prelude::*;
use quantpanel_core::{Panel, PanelError};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Date spellings accepted in CSV sources, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Cell spellings treated as missing.
const MISSING_MARKERS: [&str; 4] = ["", "n/a", "#n/a", "nan"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported source format '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("source has no data rows")]
    Empty,

    #[error("source has no ticker columns")]
    NoColumns,

    #[error("row {row}: cannot interpret '{value}' as a date")]
    Date { row: usize, value: String },

    #[error("row {row}, column '{ticker}': cannot parse '{value}' as a number")]
    Value {
        row: usize,
        ticker: String,
        value: String,
    },

    #[error("source is not a valid panel: {0}")]
    Panel(#[from] PanelError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet: {0}")]
    Parquet(String),
}

/// Load a panel from a CSV or Parquet source.
pub fn load_panel(path: &Path) -> Result<Panel, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" => load_parquet(path),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

// ── CSV ──────────────────────────────────────────────────────────────

fn load_csv(path: &Path) -> Result<Panel, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(IngestError::NoColumns);
    }
    let tickers: Vec<String> = headers
        .iter()
        .skip(1)
        .map(|h| h.trim().to_string())
        .collect();

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); tickers.len()];

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 2; // 1-based, after the header line

        let date_cell = record.get(0).unwrap_or("").trim();
        let date = parse_date(date_cell).ok_or_else(|| IngestError::Date {
            row,
            value: date_cell.to_string(),
        })?;
        dates.push(date);

        for (c, ticker) in tickers.iter().enumerate() {
            let cell = record.get(c + 1).unwrap_or("").trim();
            columns[c].push(parse_cell(cell).ok_or_else(|| IngestError::Value {
                row,
                ticker: ticker.clone(),
                value: cell.to_string(),
            })?);
        }
    }

    if dates.is_empty() {
        return Err(IngestError::Empty);
    }

    let columns = tickers.into_iter().zip(columns).collect();
    Ok(Panel::new(dates, columns)?)
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

fn parse_cell(cell: &str) -> Option<f64> {
    if MISSING_MARKERS.contains(&cell.to_ascii_lowercase().as_str()) {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

// ── Parquet ──────────────────────────────────────────────────────────

fn load_parquet(path: &Path) -> Result<Panel, IngestError> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| IngestError::Parquet(format!("read: {e}")))?;
    dataframe_to_panel(&df)
}

/// Convert a DataFrame in the store's layout back to a Panel.
fn dataframe_to_panel(df: &DataFrame) -> Result<Panel, IngestError> {
    if df.height() == 0 {
        return Err(IngestError::Empty);
    }

    let date_col = df
        .column("date")
        .map_err(|e| IngestError::Parquet(format!("missing 'date' column: {e}")))?;
    let date_ca = date_col
        .date()
        .map_err(|e| IngestError::Parquet(format!("'date' column type: {e}")))?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut dates = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca.get(i).ok_or_else(|| IngestError::Date {
            row: i + 1,
            value: "null".to_string(),
        })?;
        dates.push(epoch + chrono::Duration::days(days as i64));
    }

    let mut columns = Vec::new();
    for column in df.get_columns() {
        let name = column.name().to_string();
        if name == "date" {
            continue;
        }
        let ca = column
            .f64()
            .map_err(|e| IngestError::Parquet(format!("column '{name}' type: {e}")))?;
        let values: Vec<f64> = (0..df.height())
            .map(|i| ca.get(i).unwrap_or(f64::NAN))
            .collect();
        columns.push((name, values));
    }

    if columns.is_empty() {
        return Err(IngestError::NoColumns);
    }

    Ok(Panel::new(dates, columns)?)
}
