//! Market configuration — asset classes, FX conversion table, risk budget.
//!
//! All of it is stored in a single TOML document, loaded once at process
//! start, and passed by reference into the pipeline stages. Nothing in
//! here mutates during a run. The FX table is declarative: a ticker is
//! converted only because an entry says so, never because of how its
//! name looks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One asset class: member tickers plus descriptive metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetClass {
    pub tickers: Vec<String>,
    pub description: String,
    pub currency: String,
    pub risk_bucket: String,
    #[serde(default)]
    pub comment: String,
}

/// Which side of the FX cross the USD sits on.
///
/// `UsdBase`: the rate quotes foreign units per one USD (USDJPY = 150
/// yen per dollar), so conversion divides: `price_usd = price / rate`.
/// `ForeignBase`: the rate quotes USD per one foreign unit, so
/// conversion multiplies: `price_usd = price * rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteConvention {
    UsdBase,
    ForeignBase,
}

/// FX conversion rule for one non-USD ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxRule {
    pub fx_ticker: String,
    pub quote: QuoteConvention,
}

/// Futures-style tickers the roll handler smooths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuturesDeclaration {
    pub tickers: Vec<String>,
}

/// The complete, immutable run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub asset_classes: BTreeMap<String, AssetClass>,
    #[serde(default)]
    pub fx: BTreeMap<String, FxRule>,
    #[serde(default)]
    pub risk_budget: BTreeMap<String, f64>,
    #[serde(default)]
    pub futures: FuturesDeclaration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("ticker '{ticker}' appears in both '{first}' and '{second}' — a ticker belongs to at most one asset class")]
    TickerInMultipleClasses {
        ticker: String,
        first: String,
        second: String,
    },
}

impl MarketConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Enforce the at-most-one-class invariant.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
        for (class_name, class) in &self.asset_classes {
            for ticker in &class.tickers {
                if let Some(first) = owner.insert(ticker, class_name) {
                    return Err(ConfigError::TickerInMultipleClasses {
                        ticker: ticker.clone(),
                        first: first.to_string(),
                        second: class_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up the asset class owning a ticker.
    pub fn class_of(&self, ticker: &str) -> Option<(&str, &AssetClass)> {
        self.asset_classes
            .iter()
            .find(|(_, class)| class.tickers.iter().any(|t| t == ticker))
            .map(|(name, class)| (name.as_str(), class))
    }

    /// All declared tickers across all classes.
    pub fn all_tickers(&self) -> Vec<&str> {
        self.asset_classes
            .values()
            .flat_map(|c| c.tickers.iter().map(String::as_str))
            .collect()
    }

    /// Total declared ticker count.
    pub fn ticker_count(&self) -> usize {
        self.asset_classes.values().map(|c| c.tickers.len()).sum()
    }

    /// Serialize back to TOML (for `sample`/scaffolding commands).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The built-in Asian-markets universe the pipeline ships with.
    pub fn default_asian_markets() -> Self {
        let mut asset_classes = BTreeMap::new();

        asset_classes.insert(
            "emerging_asia_equity".into(),
            AssetClass {
                tickers: vec![
                    "MXAP Index",
                    "MXAPJ Index",
                    "MXAS Index",
                    "MXASJ Index",
                    "PCOMP Index",
                    "JCI Index",
                    "FBMKLCI Index",
                    "SET Index",
                    "STI Index",
                    "NU710465 Index",
                    "EPHE US Index",
                    "FMETF PM Equity",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
                description: "Emerging-Asia equity indices & ETF".into(),
                currency: "Mostly USD".into(),
                risk_bucket: "equities".into(),
                comment: "Regional beta + macro sensitivity".into(),
            },
        );

        asset_classes.insert(
            "commodities".into(),
            AssetClass {
                tickers: vec!["GOLDS Index", "CO1 Comdty", "S 1 Comdty"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                description: "Commodities (Gold spot, Brent front-month, generic Softs)".into(),
                currency: "USD".into(),
                risk_bucket: "commodities".into(),
                comment: "Adds inflation hedge, carry via roll".into(),
            },
        );

        asset_classes.insert(
            "developed_equity".into(),
            AssetClass {
                tickers: vec!["SPX Index", "NKY Index"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                description: "Developed-market equity benchmarks".into(),
                currency: "USD / JPY".into(),
                risk_bucket: "equities".into(),
                comment: "Good stress-test proxies".into(),
            },
        );

        asset_classes.insert(
            "fx_crosses".into(),
            AssetClass {
                tickers: vec![
                    "USDPHP Index",
                    "USDMYR Index",
                    "USDIDR Index",
                    "USDSGD Index",
                    "USDJPY Curncy",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
                description: "EM & DM FX crosses vs USD".into(),
                currency: "USD notional".into(),
                risk_bucket: "fx".into(),
                comment: "Carry + momentum rich".into(),
            },
        );

        asset_classes.insert(
            "sovereign_yields".into(),
            AssetClass {
                tickers: vec!["USGG5YR Index", "GTPHP5yr Corp", "GTUSDPH5Y Corp"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                description: "Sovereign & quasi-sovereign 5-yr yields".into(),
                currency: "USD & PHP".into(),
                risk_bucket: "rates".into(),
                comment: "Duration + EM credit risk".into(),
            },
        );

        let mut fx = BTreeMap::new();
        for (ticker, fx_ticker) in [
            ("NKY Index", "USDJPY Curncy"),
            ("PCOMP Index", "USDPHP Index"),
            ("FMETF PM Equity", "USDPHP Index"),
            ("GTPHP5yr Corp", "USDPHP Index"),
        ] {
            fx.insert(
                ticker.into(),
                FxRule {
                    fx_ticker: fx_ticker.into(),
                    quote: QuoteConvention::UsdBase,
                },
            );
        }

        let risk_budget = BTreeMap::from([
            ("equities".into(), 0.60),
            ("rates".into(), 0.20),
            ("fx".into(), 0.10),
            ("commodities".into(), 0.10),
        ]);

        let futures = FuturesDeclaration {
            tickers: vec!["CO1 Comdty", "GOLDS Index", "S 1 Comdty"]
                .into_iter()
                .map(String::from)
                .collect(),
        };

        Self {
            asset_classes,
            fx,
            risk_budget,
            futures,
        }
    }
}
