//! The price panel: a matrix of f64 values indexed by date rows and
//! ticker columns.
//!
//! Missing cells are `f64::NAN` — absence of a value, never zero.
//! Column order is preserved from ingestion. A raw panel's date axis may
//! be unsorted or contain duplicates; the cleaner canonicalizes it, and
//! every derived panel downstream has strictly increasing, unique dates.

use chrono::NaiveDate;
use std::collections::HashSet;

/// A date-indexed, ticker-columned matrix of prices.
///
/// Stored column-major: `values[c][r]` is the cell for ticker `c` on
/// date `r`. Each column has exactly one value slot per date.
#[derive(Debug, Clone)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    values: Vec<Vec<f64>>,
}

/// Cell-wise equality where missing equals missing: two NaN cells are
/// the same absent observation, which the derive would call unequal.
impl PartialEq for Panel {
    fn eq(&self, other: &Self) -> bool {
        self.dates == other.dates
            && self.tickers == other.tickers
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| {
                    a.len() == b.len()
                        && a.iter()
                            .zip(b)
                            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
                })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("column '{ticker}' has {actual} values but the panel has {expected} dates")]
    ShapeMismatch {
        ticker: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate ticker '{0}' — column identity must be unambiguous")]
    DuplicateTicker(String),
}

impl Panel {
    /// Build a panel from a date axis and named columns.
    ///
    /// Every column must have one value per date. Duplicate non-blank
    /// tickers are rejected: downstream stages address columns by name,
    /// so ambiguous identity is never allowed past this constructor.
    /// Blank tickers may repeat — they identify nothing and the cleaner
    /// drops them wholesale.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, PanelError> {
        let n = dates.len();
        let mut seen = HashSet::new();
        let mut tickers = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (ticker, col) in columns {
            if col.len() != n {
                return Err(PanelError::ShapeMismatch {
                    ticker,
                    expected: n,
                    actual: col.len(),
                });
            }
            if !ticker.trim().is_empty() && !seen.insert(ticker.clone()) {
                return Err(PanelError::DuplicateTicker(ticker));
            }
            tickers.push(ticker);
            values.push(col);
        }

        Ok(Self {
            dates,
            tickers,
            values,
        })
    }

    /// Construct without validation.
    ///
    /// For stage code that rebuilds a panel from an already-validated
    /// one and preserves the shape invariants by construction.
    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert!(values.iter().all(|c| c.len() == dates.len()));
        Self {
            dates,
            tickers,
            values,
        }
    }

    /// Number of date rows.
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Number of ticker columns.
    pub fn n_cols(&self) -> usize {
        self.tickers.len()
    }

    /// True when the panel has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.tickers.is_empty()
    }

    /// The date axis.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names, in panel order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Position of a ticker, if present.
    pub fn column_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Values for a ticker, if present.
    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.column_index(ticker).map(|c| self.values[c].as_slice())
    }

    /// Values for the column at `index`. Panics on out-of-range index.
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    /// Iterate `(ticker, values)` pairs in panel order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Replace one column's values, producing a new panel.
    ///
    /// The replacement must match the panel's row count; this is the
    /// building block for the in-place-looking but immutable stage
    /// transformations.
    pub fn with_column_at(&self, index: usize, values: Vec<f64>) -> Result<Self, PanelError> {
        if values.len() != self.n_rows() {
            return Err(PanelError::ShapeMismatch {
                ticker: self.tickers[index].clone(),
                expected: self.n_rows(),
                actual: values.len(),
            });
        }
        let mut next = self.clone();
        next.values[index] = values;
        Ok(next)
    }

    /// True when the date axis is strictly increasing (sorted, unique).
    pub fn has_canonical_dates(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] < w[1])
    }

    /// Count of NaN cells across the whole panel.
    pub fn missing_cells(&self) -> usize {
        self.values
            .iter()
            .map(|col| col.iter().filter(|v| v.is_nan()).count())
            .sum()
    }

    /// Overall completeness: 1 − missing / total. Empty panel → 0.
    pub fn completeness(&self) -> f64 {
        let total = self.n_rows() * self.n_cols();
        if total == 0 {
            return 0.0;
        }
        1.0 - self.missing_cells() as f64 / total as f64
    }

    /// Date of the first non-NaN observation in a column.
    pub fn first_valid(&self, index: usize) -> Option<NaiveDate> {
        self.values[index]
            .iter()
            .position(|v| !v.is_nan())
            .map(|r| self.dates[r])
    }

    /// Date of the last non-NaN observation in a column.
    pub fn last_valid(&self, index: usize) -> Option<NaiveDate> {
        self.values[index]
            .iter()
            .rposition(|v| !v.is_nan())
            .map(|r| self.dates[r])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn two_col_panel() -> Panel {
        Panel::new(
            vec![d("2024-01-02"), d("2024-01-03"), d("2024-01-04")],
            vec![
                ("SPX Index".into(), vec![100.0, 101.0, 102.0]),
                ("NKY Index".into(), vec![f64::NAN, 30000.0, f64::NAN]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = Panel::new(
            vec![d("2024-01-02"), d("2024-01-03")],
            vec![("SPX Index".into(), vec![100.0])],
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::ShapeMismatch { .. }));
    }

    #[test]
    fn duplicate_ticker_rejected() {
        let err = Panel::new(
            vec![d("2024-01-02")],
            vec![
                ("SPX Index".into(), vec![100.0]),
                ("SPX Index".into(), vec![200.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::DuplicateTicker(_)));
    }

    #[test]
    fn blank_tickers_may_repeat() {
        let panel = Panel::new(
            vec![d("2024-01-02")],
            vec![
                ("".into(), vec![f64::NAN]),
                ("".into(), vec![f64::NAN]),
                ("SPX Index".into(), vec![100.0]),
            ],
        )
        .unwrap();
        assert_eq!(panel.n_cols(), 3);
    }

    #[test]
    fn completeness_counts_nan_cells() {
        let panel = two_col_panel();
        assert_eq!(panel.missing_cells(), 2);
        let expected = 1.0 - 2.0 / 6.0;
        assert!((panel.completeness() - expected).abs() < 1e-12);
    }

    #[test]
    fn first_and_last_valid_skip_nan() {
        let panel = two_col_panel();
        let nky = panel.column_index("NKY Index").unwrap();
        assert_eq!(panel.first_valid(nky), Some(d("2024-01-03")));
        assert_eq!(panel.last_valid(nky), Some(d("2024-01-03")));
    }

    #[test]
    fn all_nan_column_has_no_valid_dates() {
        let panel = Panel::new(
            vec![d("2024-01-02"), d("2024-01-03")],
            vec![("GTPHP5yr Corp".into(), vec![f64::NAN, f64::NAN])],
        )
        .unwrap();
        assert_eq!(panel.first_valid(0), None);
        assert_eq!(panel.last_valid(0), None);
    }

    #[test]
    fn with_column_at_leaves_original_untouched() {
        let panel = two_col_panel();
        let updated = panel.with_column_at(0, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(panel.column("SPX Index").unwrap()[0], 100.0);
        assert_eq!(updated.column("SPX Index").unwrap()[0], 1.0);
    }

    #[test]
    fn canonical_date_check() {
        assert!(two_col_panel().has_canonical_dates());
        let unsorted = Panel::new(
            vec![d("2024-01-03"), d("2024-01-02")],
            vec![("SPX Index".into(), vec![1.0, 2.0])],
        )
        .unwrap();
        assert!(!unsorted.has_canonical_dates());
    }
}
