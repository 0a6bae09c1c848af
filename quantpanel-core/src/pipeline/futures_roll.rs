//! FuturesRollHandler: smooth roll-date discontinuities on declared
//! futures-style columns.
//!
//! The smoothing is a trailing 3-observation moving average (minimum one
//! observation in the window). This is an approximation, not futures
//! back-adjustment: historical levels are never re-spliced across roll
//! dates, so a continuous-contract basis jump is damped rather than
//! removed. Columns not declared as futures pass through untouched.

use crate::domain::Panel;
use crate::pipeline::{Stage, StageWarning};

const ROLL_WINDOW: usize = 3;

/// Apply trailing-mean smoothing to each declared futures ticker.
pub fn smooth_futures_rolls(panel: &Panel, futures: &[String]) -> (Panel, Vec<StageWarning>) {
    let mut warnings = Vec::new();
    let mut values: Vec<Vec<f64>> = (0..panel.n_cols())
        .map(|c| panel.column_at(c).to_vec())
        .collect();

    for ticker in futures {
        match panel.column_index(ticker) {
            Some(c) => values[c] = trailing_mean(panel.column_at(c), ROLL_WINDOW),
            None => warnings.push(StageWarning::new(
                Stage::FuturesRoll,
                ticker.clone(),
                "declared futures ticker not present in panel".to_string(),
            )),
        }
    }

    let panel = Panel::from_parts(
        panel.dates().to_vec(),
        panel.tickers().to_vec(),
        values,
    );
    (panel, warnings)
}

/// Trailing moving average over the last `window` rows.
///
/// NaN cells inside the window are skipped; a window with no
/// observations at all yields NaN.
fn trailing_mean(series: &[f64], window: usize) -> Vec<f64> {
    (0..series.len())
        .map(|i| {
            let lo = i.saturating_sub(window - 1);
            let obs: Vec<f64> = series[lo..=i].iter().copied().filter(|v| !v.is_nan()).collect();
            if obs.is_empty() {
                f64::NAN
            } else {
                obs.iter().sum::<f64>() / obs.len() as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn panel(columns: Vec<(String, Vec<f64>)>) -> Panel {
        let n = columns[0].1.len();
        let dates = crate::domain::calendar::business_days(
            d("2024-01-08"),
            d("2024-01-08") + chrono::Duration::days(2 * n as i64),
        )[..n]
            .to_vec();
        Panel::new(dates, columns).unwrap()
    }

    #[test]
    fn trailing_mean_warms_up_from_one_observation() {
        let p = panel(vec![("CO1 Comdty".into(), vec![80.0, 82.0, 84.0, 86.0])]);
        let (smoothed, warnings) =
            smooth_futures_rolls(&p, &["CO1 Comdty".to_string()]);

        let col = smoothed.column("CO1 Comdty").unwrap();
        assert_eq!(col[0], 80.0); // window of one
        assert_eq!(col[1], 81.0); // (80 + 82) / 2
        assert_eq!(col[2], 82.0); // (80 + 82 + 84) / 3
        assert_eq!(col[3], 84.0); // (82 + 84 + 86) / 3
        assert!(warnings.is_empty());
    }

    #[test]
    fn nan_inside_window_is_skipped() {
        let p = panel(vec![("S 1 Comdty".into(), vec![10.0, f64::NAN, 14.0])]);
        let (smoothed, _) = smooth_futures_rolls(&p, &["S 1 Comdty".to_string()]);

        let col = smoothed.column("S 1 Comdty").unwrap();
        assert_eq!(col[0], 10.0);
        assert_eq!(col[1], 10.0); // only the first print in the window
        assert_eq!(col[2], 12.0); // (10 + 14) / 2
    }

    #[test]
    fn leading_nans_stay_nan() {
        let p = panel(vec![("GOLDS Index".into(), vec![f64::NAN, f64::NAN, 2000.0])]);
        let (smoothed, _) = smooth_futures_rolls(&p, &["GOLDS Index".to_string()]);

        let col = smoothed.column("GOLDS Index").unwrap();
        assert!(col[0].is_nan());
        assert!(col[1].is_nan());
        assert_eq!(col[2], 2000.0);
    }

    #[test]
    fn undeclared_columns_pass_through() {
        let p = panel(vec![
            ("CO1 Comdty".into(), vec![80.0, 82.0]),
            ("SPX Index".into(), vec![4800.0, 4810.0]),
        ]);
        let (smoothed, _) = smooth_futures_rolls(&p, &["CO1 Comdty".to_string()]);

        assert_eq!(smoothed.column("SPX Index").unwrap(), &[4800.0, 4810.0]);
    }

    #[test]
    fn absent_declared_ticker_warns() {
        let p = panel(vec![("SPX Index".into(), vec![4800.0])]);
        let (smoothed, warnings) =
            smooth_futures_rolls(&p, &["CO1 Comdty".to_string()]);

        assert_eq!(smoothed, p);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, Stage::FuturesRoll);
    }
}
