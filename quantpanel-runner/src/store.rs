//! Artifact persistence — the counterpart of the Loader.
//!
//! Formats are selected by the destination extension:
//! `.parquet` (native table), `.xlsx` (spreadsheet for viewing),
//! `.csv` (flat text). Parquet and CSV writes are atomic: the file is
//! written to a `.tmp` sibling and renamed into place, so a crashed run
//! never leaves a half-written artifact where the cached path would
//! find it. The dictionary is persisted as a three-sheet workbook
//! (Asset Dictionary, Metadata, Asset Class Summary).

use chrono::NaiveDate;
use polars::prelude::*;
use quantpanel_core::dictionary::{DataDictionary, DictionaryEntry};
use quantpanel_core::Panel;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Persistence format, derived from the destination extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFormat {
    Parquet,
    Xlsx,
    Csv,
}

impl PanelFormat {
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "parquet" => Ok(Self::Parquet),
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(StoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported artifact format '{0}' (expected .parquet, .xlsx or .csv)")]
    UnsupportedFormat(String),

    #[error("dataframe: {0}")]
    DataFrame(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx: {0}")]
    Xlsx(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<XlsxError> for StoreError {
    fn from(e: XlsxError) -> Self {
        StoreError::Xlsx(e.to_string())
    }
}

/// Persist a panel to the format named by the destination extension.
pub fn save_panel(panel: &Panel, dest: &Path) -> Result<(), StoreError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    match PanelFormat::from_path(dest)? {
        PanelFormat::Parquet => write_parquet(panel, dest),
        PanelFormat::Csv => write_csv(panel, dest),
        PanelFormat::Xlsx => write_xlsx(panel, dest),
    }
}

// ── Parquet ──────────────────────────────────────────────────────────

/// Convert a panel to the on-disk DataFrame layout: a `date` column
/// plus one f64 column per ticker.
fn panel_to_dataframe(panel: &Panel) -> Result<DataFrame, StoreError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let dates: Vec<i32> = panel
        .dates()
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let mut columns = vec![Column::new("date".into(), dates)
        .cast(&DataType::Date)
        .map_err(|e| StoreError::DataFrame(format!("date cast: {e}")))?];
    for (ticker, values) in panel.columns() {
        columns.push(Column::new(ticker.into(), values.to_vec()));
    }

    DataFrame::new(columns).map_err(|e| StoreError::DataFrame(format!("dataframe creation: {e}")))
}

fn write_parquet(panel: &Panel, dest: &Path) -> Result<(), StoreError> {
    let df = panel_to_dataframe(panel)?;
    let tmp = dest.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp)?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| StoreError::DataFrame(format!("write parquet: {e}")))?;

    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Io(e)
    })
}

// ── CSV ──────────────────────────────────────────────────────────────

fn write_csv(panel: &Panel, dest: &Path) -> Result<(), StoreError> {
    let tmp = dest.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp)?;

    let mut header = vec!["Date".to_string()];
    header.extend(panel.tickers().iter().cloned());
    writer.write_record(&header)?;

    for (row, date) in panel.dates().iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        for c in 0..panel.n_cols() {
            let value = panel.column_at(c)[row];
            record.push(if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            });
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Io(e)
    })
}

// ── XLSX ─────────────────────────────────────────────────────────────

fn write_xlsx(panel: &Panel, dest: &Path) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Prices")?;

    sheet.write_string(0, 0, "Date")?;
    for (c, ticker) in panel.tickers().iter().enumerate() {
        sheet.write_string(0, (c + 1) as u16, ticker)?;
    }

    for (row, date) in panel.dates().iter().enumerate() {
        let r = (row + 1) as u32;
        sheet.write_string(r, 0, &date.format("%Y-%m-%d").to_string())?;
        for c in 0..panel.n_cols() {
            let value = panel.column_at(c)[row];
            if !value.is_nan() {
                sheet.write_number(r, (c + 1) as u16, value)?;
            }
        }
    }

    save_workbook(workbook, dest)
}

/// Save a workbook atomically (write to `.tmp`, rename into place).
fn save_workbook(mut workbook: Workbook, dest: &Path) -> Result<(), StoreError> {
    let tmp = dest.with_extension("xlsx.tmp");
    workbook.save(&tmp)?;
    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Io(e)
    })
}

// ── Dictionary workbook ──────────────────────────────────────────────

const DICTIONARY_HEADER: [&str; 29] = [
    "Ticker",
    "Asset Class",
    "Description",
    "Currency",
    "Original Currency",
    "Risk Bucket",
    "Start Date",
    "End Date",
    "Data Points",
    "Missing Values",
    "Missing Values (%)",
    "Completeness (%)",
    "Price Mean",
    "Price Std Dev",
    "Price Min",
    "Price Max",
    "Price Last",
    "Daily Return Mean (%)",
    "Daily Return Std Dev (%)",
    "Daily Return Min (%)",
    "Daily Return Max (%)",
    "Daily Return Skewness",
    "Annualized Volatility (%)",
    "Monthly Return Mean (%)",
    "Monthly Return Std Dev (%)",
    "Monthly Return Min (%)",
    "Monthly Return Max (%)",
    "Monthly Return Skewness",
    "Monthly Annualized Volatility (%)",
];

/// Persist the dictionary as a three-sheet XLSX workbook.
pub fn save_dictionary(dictionary: &DataDictionary, dest: &Path) -> Result<(), StoreError> {
    if PanelFormat::from_path(dest)? != PanelFormat::Xlsx {
        return Err(StoreError::UnsupportedFormat(
            "dictionary artifact must be .xlsx".to_string(),
        ));
    }
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Asset Dictionary")?;
    for (c, title) in DICTIONARY_HEADER.iter().enumerate() {
        sheet.write_string(0, c as u16, *title)?;
    }
    for (i, entry) in dictionary.entries.iter().enumerate() {
        write_entry_row(sheet, (i + 1) as u32, entry)?;
    }

    let meta = &dictionary.metadata;
    let sheet = workbook.add_worksheet();
    sheet.set_name("Metadata")?;
    let date_range = match (meta.start_date, meta.end_date) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "N/A".to_string(),
    };
    let properties: [(&str, String); 7] = [
        (
            "Creation Date",
            meta.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        ("Number of Assets", meta.asset_count.to_string()),
        ("Date Range", date_range),
        ("Number of Trading Days", meta.trading_days.to_string()),
        ("Price Data Frequency", "Daily (Business Days)".to_string()),
        ("Currency", "USD (Normalized)".to_string()),
        ("Warnings", dictionary.warnings.len().to_string()),
    ];
    sheet.write_string(0, 0, "Property")?;
    sheet.write_string(0, 1, "Value")?;
    for (i, (property, value)) in properties.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, *property)?;
        sheet.write_string(r, 1, value)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Asset Class Summary")?;
    sheet.write_string(0, 0, "Asset Class")?;
    sheet.write_string(0, 1, "Count")?;
    for (i, (class, count)) in meta.class_distribution.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, class)?;
        sheet.write_number(r, 1, *count as f64)?;
    }

    save_workbook(workbook, dest)
}

/// Persist the dictionary as pretty-printed JSON for downstream tools.
pub fn save_dictionary_json(dictionary: &DataDictionary, dest: &Path) -> Result<(), StoreError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(dictionary)?;
    let tmp = dest.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Io(e)
    })
}

fn write_entry_row(
    sheet: &mut Worksheet,
    r: u32,
    entry: &DictionaryEntry,
) -> Result<(), StoreError> {
    let texts: [&str; 6] = [
        &entry.ticker,
        &entry.asset_class,
        &entry.description,
        &entry.currency,
        &entry.original_currency,
        &entry.risk_bucket,
    ];
    for (c, value) in texts.iter().enumerate() {
        sheet.write_string(r, c as u16, *value)?;
    }
    sheet.write_string(r, 6, &date_or_na(entry.start_date))?;
    sheet.write_string(r, 7, &date_or_na(entry.end_date))?;

    sheet.write_number(r, 8, entry.data_points as f64)?;
    sheet.write_number(r, 9, entry.missing_values as f64)?;
    sheet.write_number(r, 10, entry.missing_pct)?;
    sheet.write_number(r, 11, entry.completeness_pct)?;

    let price = entry.price.as_ref();
    let daily = entry.daily_returns.as_ref();
    let monthly = entry.monthly_returns.as_ref();
    let stat_cells: [Option<f64>; 17] = [
        price.map(|p| p.mean),
        price.and_then(|p| p.std_dev),
        price.map(|p| p.min),
        price.map(|p| p.max),
        price.map(|p| p.last),
        daily.map(|s| s.mean_pct),
        daily.and_then(|s| s.std_dev_pct),
        daily.map(|s| s.min_pct),
        daily.map(|s| s.max_pct),
        daily.and_then(|s| s.skewness),
        daily.and_then(|s| s.annualized_vol_pct),
        monthly.map(|s| s.mean_pct),
        monthly.and_then(|s| s.std_dev_pct),
        monthly.map(|s| s.min_pct),
        monthly.map(|s| s.max_pct),
        monthly.and_then(|s| s.skewness),
        monthly.and_then(|s| s.annualized_vol_pct),
    ];
    for (i, cell) in stat_cells.into_iter().enumerate() {
        write_stat(sheet, r, (12 + i) as u16, cell)?;
    }

    Ok(())
}

fn write_stat(
    sheet: &mut Worksheet,
    r: u32,
    c: u16,
    value: Option<f64>,
) -> Result<(), XlsxError> {
    match value {
        Some(v) if v.is_finite() => {
            sheet.write_number(r, c, v)?;
        }
        _ => {
            sheet.write_string(r, c, "N/A")?;
        }
    }
    Ok(())
}

fn date_or_na(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
