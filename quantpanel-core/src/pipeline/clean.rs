//! Cleaner: business-day standardization with forward-filled holidays.
//!
//! Takes the raw panel as ingested — possibly unsorted, with duplicate
//! dates and blank placeholder columns — and produces a panel on the
//! full Monday–Friday axis between the input's first and last date.
//! Holiday gaps and missing cells carry the most recent known value
//! forward; leading gaps stay missing because forward-fill never
//! fabricates pre-history.

use crate::domain::calendar::business_days;
use crate::domain::Panel;
use std::collections::HashMap;

/// Result of the cleaning stage.
#[derive(Debug)]
pub struct Cleaned {
    pub panel: Panel,
    /// 1 − missing / total over the cleaned panel.
    pub completeness: f64,
    /// Cells that went from missing to a forward-filled value.
    pub filled_cells: usize,
    /// Blank placeholder columns discarded before reindexing.
    pub dropped_columns: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("cannot clean an empty panel: no date rows")]
    NoRows,

    #[error("cannot clean an empty panel: no identifiable columns")]
    NoColumns,

    #[error("no business days between {start} and {end}")]
    NoBusinessDays {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Reindex a panel onto the business-day calendar and forward-fill gaps.
///
/// Duplicate dates keep their first occurrence; observations on
/// non-business days (weekend rows in the raw file) are dropped by the
/// reindex, exactly as a business-day frequency conversion drops them.
/// Already-clean input comes back unchanged, so the stage is idempotent.
pub fn clean(panel: &Panel) -> Result<Cleaned, CleanError> {
    if panel.n_rows() == 0 {
        return Err(CleanError::NoRows);
    }

    let kept: Vec<usize> = (0..panel.n_cols())
        .filter(|&c| !panel.tickers()[c].trim().is_empty())
        .collect();
    let dropped_columns = panel.n_cols() - kept.len();
    if kept.is_empty() {
        return Err(CleanError::NoColumns);
    }

    // Source row per date, first occurrence wins on duplicates.
    let mut row_for_date: HashMap<chrono::NaiveDate, usize> = HashMap::new();
    for (row, &date) in panel.dates().iter().enumerate() {
        row_for_date.entry(date).or_insert(row);
    }

    let start = *panel.dates().iter().min().ok_or(CleanError::NoRows)?;
    let end = *panel.dates().iter().max().ok_or(CleanError::NoRows)?;
    let axis = business_days(start, end);
    if axis.is_empty() {
        return Err(CleanError::NoBusinessDays { start, end });
    }

    let mut filled_cells = 0usize;
    let mut tickers = Vec::with_capacity(kept.len());
    let mut values = Vec::with_capacity(kept.len());

    for &c in &kept {
        let source = panel.column_at(c);
        let mut column = Vec::with_capacity(axis.len());
        let mut last_known = f64::NAN;

        for date in &axis {
            let observed = row_for_date
                .get(date)
                .map(|&row| source[row])
                .unwrap_or(f64::NAN);

            if observed.is_nan() {
                if !last_known.is_nan() {
                    filled_cells += 1;
                }
                column.push(last_known);
            } else {
                last_known = observed;
                column.push(observed);
            }
        }

        tickers.push(panel.tickers()[c].clone());
        values.push(column);
    }

    let cleaned = Panel::from_parts(axis, tickers, values);
    let completeness = cleaned.completeness();

    Ok(Cleaned {
        panel: cleaned,
        completeness,
        filled_cells,
        dropped_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn holiday_gap_is_forward_filled() {
        // Mon, Tue, Thu — Wednesday is a holiday.
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09"), d("2024-01-11")],
            vec![("SPX Index".into(), vec![100.0, 101.0, 103.0])],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        let col = cleaned.panel.column("SPX Index").unwrap();

        assert_eq!(
            cleaned.panel.dates(),
            &[d("2024-01-08"), d("2024-01-09"), d("2024-01-10"), d("2024-01-11")]
        );
        assert_eq!(col, &[100.0, 101.0, 101.0, 103.0]);
        assert_eq!(cleaned.filled_cells, 1);
    }

    #[test]
    fn missing_cell_on_present_date_is_forward_filled() {
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09"), d("2024-01-11")],
            vec![("SPX Index".into(), vec![100.0, 101.0, f64::NAN])],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        let col = cleaned.panel.column("SPX Index").unwrap();

        // Both the Wednesday hole and the missing Thursday carry Tuesday's print.
        assert_eq!(col, &[100.0, 101.0, 101.0, 101.0]);
        assert_eq!(cleaned.filled_cells, 2);
    }

    #[test]
    fn leading_gap_stays_missing() {
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09"), d("2024-01-10")],
            vec![("NKY Index".into(), vec![f64::NAN, f64::NAN, 30000.0])],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        let col = cleaned.panel.column("NKY Index").unwrap();

        assert!(col[0].is_nan());
        assert!(col[1].is_nan());
        assert_eq!(col[2], 30000.0);
        assert_eq!(cleaned.filled_cells, 0);
    }

    #[test]
    fn unsorted_and_duplicate_dates_are_canonicalized() {
        let panel = Panel::new(
            vec![
                d("2024-01-09"),
                d("2024-01-08"),
                d("2024-01-08"), // duplicate: first occurrence (101.5) must win
            ],
            vec![("SPX Index".into(), vec![102.0, 101.5, 999.0])],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        assert!(cleaned.panel.has_canonical_dates());
        assert_eq!(
            cleaned.panel.column("SPX Index").unwrap(),
            &[101.5, 102.0]
        );
    }

    #[test]
    fn weekend_observations_are_dropped() {
        // Saturday print disappears; Monday forward-fills from Friday.
        let panel = Panel::new(
            vec![d("2024-01-05"), d("2024-01-06"), d("2024-01-08")],
            vec![("SPX Index".into(), vec![100.0, 555.0, f64::NAN])],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        assert_eq!(
            cleaned.panel.dates(),
            &[d("2024-01-05"), d("2024-01-08")]
        );
        assert_eq!(cleaned.panel.column("SPX Index").unwrap(), &[100.0, 100.0]);
    }

    #[test]
    fn blank_placeholder_columns_are_dropped() {
        let panel = Panel::new(
            vec![d("2024-01-08")],
            vec![
                ("SPX Index".into(), vec![100.0]),
                ("  ".into(), vec![f64::NAN]),
                ("".into(), vec![1.0]),
            ],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        assert_eq!(cleaned.panel.tickers(), &["SPX Index".to_string()]);
        assert_eq!(cleaned.dropped_columns, 2);
    }

    #[test]
    fn all_missing_named_column_is_kept() {
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09")],
            vec![
                ("SPX Index".into(), vec![100.0, 101.0]),
                ("GTPHP5yr Corp".into(), vec![f64::NAN, f64::NAN]),
            ],
        )
        .unwrap();

        let cleaned = clean(&panel).unwrap();
        assert!(cleaned.panel.column("GTPHP5yr Corp").is_some());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09"), d("2024-01-11")],
            vec![
                ("SPX Index".into(), vec![100.0, 101.0, 103.0]),
                ("NKY Index".into(), vec![f64::NAN, 30000.0, f64::NAN]),
            ],
        )
        .unwrap();

        let once = clean(&panel).unwrap();
        let twice = clean(&once.panel).unwrap();

        assert_eq!(once.panel, twice.panel);
        assert_eq!(twice.filled_cells, 0);
    }

    #[test]
    fn completeness_is_reported() {
        // 10 business days, first 2 cells missing → 80%.
        let dates: Vec<NaiveDate> = crate::domain::calendar::business_days(
            d("2024-01-08"),
            d("2024-01-19"),
        );
        assert_eq!(dates.len(), 10);
        let mut values = vec![f64::NAN, f64::NAN];
        values.extend((0..8).map(|i| 100.0 + i as f64));

        let panel = Panel::new(dates, vec![("SET Index".into(), values)]).unwrap();
        let cleaned = clean(&panel).unwrap();

        assert!((cleaned.completeness - 0.80).abs() < 1e-12);
    }

    #[test]
    fn empty_panel_is_fatal() {
        let no_rows = Panel::new(vec![], vec![("SPX Index".into(), vec![])]).unwrap();
        assert!(matches!(clean(&no_rows), Err(CleanError::NoRows)));

        let no_cols = Panel::new(vec![d("2024-01-08")], vec![("".into(), vec![1.0])]).unwrap();
        assert!(matches!(clean(&no_cols), Err(CleanError::NoColumns)));
    }

    #[test]
    fn weekend_only_input_is_fatal() {
        let panel = Panel::new(
            vec![d("2024-01-06"), d("2024-01-07")],
            vec![("SPX Index".into(), vec![1.0, 2.0])],
        )
        .unwrap();
        assert!(matches!(
            clean(&panel),
            Err(CleanError::NoBusinessDays { .. })
        ));
    }
}
