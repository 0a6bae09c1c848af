//! The four transformation stages, in pipeline order:
//! clean → currency → futures roll → returns.
//!
//! Stage failures come in two severities. Structural problems (an empty
//! panel, an unparseable source) are fatal and typed as stage errors —
//! everything downstream assumes a valid panel. Per-ticker problems
//! (a missing FX counterpart, an unmapped ticker) are recoverable: the
//! stage records a [`StageWarning`], leaves that column untouched, and
//! keeps going.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod clean;
pub mod currency;
pub mod futures_roll;
pub mod returns;

pub use clean::{clean, CleanError, Cleaned};
pub use currency::normalize_to_usd;
pub use futures_roll::smooth_futures_rolls;
pub use returns::{compute_returns, ParsePeriodError, Period};

/// Pipeline stage identifier, used to attribute warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Clean,
    Currency,
    FuturesRoll,
    Returns,
    Dictionary,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Clean => "clean",
            Stage::Currency => "currency",
            Stage::FuturesRoll => "futures_roll",
            Stage::Returns => "returns",
            Stage::Dictionary => "dictionary",
        };
        f.write_str(name)
    }
}

/// A recoverable per-ticker problem.
///
/// Warnings accumulate on stage results and surface in the run summary;
/// they are also mirrored to stderr at creation time so long runs show
/// problems as they happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageWarning {
    pub stage: Stage,
    pub ticker: String,
    pub message: String,
}

impl StageWarning {
    pub fn new(stage: Stage, ticker: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            stage,
            ticker: ticker.into(),
            message: message.into(),
        };
        eprintln!("WARNING: {warning}");
        warning
    }
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.ticker, self.message)
    }
}
