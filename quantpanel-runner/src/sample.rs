//! Synthetic sample panels for demos and tests.
//!
//! Produces a deterministic random walk per ticker, seeded from the
//! ticker name, with occasional missing cells so the cleaning stage has
//! something to forward-fill. Clearly fake data — useful for exercising
//! the pipeline end-to-end without a real source file.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use quantpanel_core::{Panel, PanelError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a business-day random-walk panel for the given tickers.
///
/// Deterministic: the same ticker over the same range always produces
/// the same series (the RNG is seeded from blake3 of the ticker name).
/// Fails only when the requested ticker list repeats a name.
pub fn synthetic_panel(
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Panel, PanelError> {
    let columns: Vec<(String, Vec<f64>)> = tickers
        .iter()
        .map(|ticker| (ticker.clone(), synthetic_series(ticker, start, end)))
        .collect();

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current += Duration::days(1);
    }

    Panel::new(dates, columns)
}

fn synthetic_series(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<f64> {
    let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut series = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        price *= 1.0 + daily_return;

        // ~2% missing cells to exercise forward-fill downstream.
        if rng.gen_bool(0.02) {
            series.push(f64::NAN);
        } else {
            series.push(price);
        }
        current += Duration::days(1);
    }

    series
}
