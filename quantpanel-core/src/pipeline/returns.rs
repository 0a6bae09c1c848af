//! ReturnsCalculator: simple percentage-change series at daily or
//! monthly frequency.
//!
//! Daily returns compare consecutive business-day rows. Monthly returns
//! compare each calendar month's last observed value, labeled with that
//! month's last panel date. In both cases the first (undefined) row is
//! dropped and a NaN operand yields a NaN return — never an error, and
//! never a silently-dropped row elsewhere in the series.

use crate::domain::calendar::month_partitions;
use crate::domain::Panel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Return-calculation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Monthly,
}

impl Period {
    /// Observation periods per year, for volatility annualization.
    pub fn periods_per_year(self) -> f64 {
        match self {
            Period::Daily => 252.0,
            Period::Monthly => 12.0,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Daily => f.write_str("daily"),
            Period::Monthly => f.write_str("monthly"),
        }
    }
}

/// An undeclared period selector. There is no silent default.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported return period '{0}' (expected 'daily'/'D' or 'monthly'/'M')")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "daily" => Ok(Period::Daily),
            "m" | "monthly" => Ok(Period::Monthly),
            _ => Err(ParsePeriodError(s.to_string())),
        }
    }
}

/// Derive a percentage-change panel from a price panel.
///
/// The result has one fewer row than the source frequency provides
/// (first daily row, or first month, is dropped). A source with fewer
/// than two rows at the chosen frequency yields an empty return panel.
pub fn compute_returns(panel: &Panel, period: Period) -> Panel {
    match period {
        Period::Daily => daily_returns(panel),
        Period::Monthly => monthly_returns(panel),
    }
}

fn pct_change(prev: f64, current: f64) -> f64 {
    current / prev - 1.0
}

fn daily_returns(panel: &Panel) -> Panel {
    let n = panel.n_rows();
    let dates = if n > 1 {
        panel.dates()[1..].to_vec()
    } else {
        Vec::new()
    };

    let values = (0..panel.n_cols())
        .map(|c| {
            let col = panel.column_at(c);
            col.windows(2).map(|w| pct_change(w[0], w[1])).collect()
        })
        .collect();

    Panel::from_parts(dates, panel.tickers().to_vec(), values)
}

fn monthly_returns(panel: &Panel) -> Panel {
    let parts = month_partitions(panel.dates());

    // Month-end label and last observed (non-NaN) value per column.
    let labels: Vec<_> = parts
        .iter()
        .map(|(_, range)| panel.dates()[range.end - 1])
        .collect();
    let month_last: Vec<Vec<f64>> = (0..panel.n_cols())
        .map(|c| {
            let col = panel.column_at(c);
            parts
                .iter()
                .map(|(_, range)| {
                    col[range.clone()]
                        .iter()
                        .rev()
                        .copied()
                        .find(|v| !v.is_nan())
                        .unwrap_or(f64::NAN)
                })
                .collect()
        })
        .collect();

    let dates = if labels.len() > 1 {
        labels[1..].to_vec()
    } else {
        Vec::new()
    };
    let values = month_last
        .iter()
        .map(|col| col.windows(2).map(|w| pct_change(w[0], w[1])).collect())
        .collect();

    Panel::from_parts(dates, panel.tickers().to_vec(), values)
}
