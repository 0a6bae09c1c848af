//! QuantPanel Core — panel domain types, market configuration, pipeline stages.
//!
//! This crate contains the heart of the data-engineering pipeline:
//! - Domain types (date-indexed price panels, business-day calendar)
//! - Immutable market configuration (asset classes, FX table, risk budget)
//! - The four transformation stages (clean, currency, futures roll, returns)
//! - Data dictionary builder with per-ticker statistics
//!
//! Every stage is a pure function: panel in, new panel out. Missing cells
//! are `f64::NAN` throughout — never zero. The only I/O in the workspace
//! lives in `quantpanel-runner`; this crate is filesystem-free apart from
//! reading configuration files.

pub mod config;
pub mod dictionary;
pub mod domain;
pub mod pipeline;

pub use config::{AssetClass, ConfigError, FxRule, MarketConfig, QuoteConvention};
pub use dictionary::{
    DataDictionary, DictionaryBuilder, DictionaryEntry, PriceStats, ReturnStats, RunMetadata,
};
pub use domain::{Panel, PanelError};
pub use pipeline::{
    clean, compute_returns, normalize_to_usd, smooth_futures_rolls, CleanError, Cleaned,
    ParsePeriodError, Period, Stage, StageWarning,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types handed across the runner boundary
    /// are Send + Sync, so a future worker thread needs no retrofit.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Panel>();
        require_sync::<Panel>();
        require_send::<MarketConfig>();
        require_sync::<MarketConfig>();
        require_send::<DataDictionary>();
        require_sync::<DataDictionary>();
        require_send::<StageWarning>();
        require_sync::<StageWarning>();
        require_send::<Period>();
        require_sync::<Period>();
    }
}
