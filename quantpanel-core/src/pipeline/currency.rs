//! CurrencyNormalizer: convert declared non-USD columns to USD.
//!
//! Conversion is driven entirely by the FX table. Columns with no entry
//! are assumed USD and pass through bit-identical. A declared ticker
//! whose FX counterpart is missing from the panel stays unconverted and
//! produces a warning — the panel is still usable, just not fully
//! normalized.

use crate::config::{FxRule, QuoteConvention};
use crate::domain::Panel;
use crate::pipeline::{Stage, StageWarning};
use std::collections::BTreeMap;

/// Apply the FX conversion table to a cleaned panel.
///
/// NaN in either the price or the rate propagates NaN — a missing value
/// never becomes zero.
pub fn normalize_to_usd(
    panel: &Panel,
    fx: &BTreeMap<String, FxRule>,
) -> (Panel, Vec<StageWarning>) {
    let mut warnings = Vec::new();
    let mut values: Vec<Vec<f64>> = (0..panel.n_cols())
        .map(|c| panel.column_at(c).to_vec())
        .collect();

    for (ticker, rule) in fx {
        let Some(target) = panel.column_index(ticker) else {
            // Declared ticker absent from this panel: the table may
            // cover a wider universe than one source file.
            continue;
        };
        let Some(fx_col) = panel.column_index(&rule.fx_ticker) else {
            warnings.push(StageWarning::new(
                Stage::Currency,
                ticker.clone(),
                format!(
                    "fx ticker '{}' not present in panel; column left unconverted",
                    rule.fx_ticker
                ),
            ));
            continue;
        };

        let rates = panel.column_at(fx_col);
        for (row, value) in values[target].iter_mut().enumerate() {
            *value = match rule.quote {
                QuoteConvention::UsdBase => *value / rates[row],
                QuoteConvention::ForeignBase => *value * rates[row],
            };
        }
    }

    let panel = Panel::from_parts(
        panel.dates().to_vec(),
        panel.tickers().to_vec(),
        values,
    );
    (panel, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rule(fx_ticker: &str, quote: QuoteConvention) -> FxRule {
        FxRule {
            fx_ticker: fx_ticker.into(),
            quote,
        }
    }

    #[test]
    fn usd_base_quote_divides() {
        // NKY priced 30000 JPY, USDJPY = 150 → 200 USD.
        let panel = Panel::new(
            vec![d("2024-01-08")],
            vec![
                ("NKY Index".into(), vec![30000.0]),
                ("USDJPY Curncy".into(), vec![150.0]),
            ],
        )
        .unwrap();
        let fx = BTreeMap::from([(
            "NKY Index".to_string(),
            rule("USDJPY Curncy", QuoteConvention::UsdBase),
        )]);

        let (converted, warnings) = normalize_to_usd(&panel, &fx);

        assert_eq!(converted.column("NKY Index").unwrap(), &[200.0]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn foreign_base_quote_multiplies() {
        let panel = Panel::new(
            vec![d("2024-01-08")],
            vec![
                ("NKY Index".into(), vec![30000.0]),
                ("JPYUSD Curncy".into(), vec![1.0 / 150.0]),
            ],
        )
        .unwrap();
        let fx = BTreeMap::from([(
            "NKY Index".to_string(),
            rule("JPYUSD Curncy", QuoteConvention::ForeignBase),
        )]);

        let (converted, _) = normalize_to_usd(&panel, &fx);
        let nky = converted.column("NKY Index").unwrap()[0];
        assert!((nky - 200.0).abs() < 1e-9);
    }

    #[test]
    fn undeclared_columns_are_untouched() {
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09")],
            vec![
                ("SPX Index".into(), vec![4800.0, f64::NAN]),
                ("USDJPY Curncy".into(), vec![150.0, 151.0]),
            ],
        )
        .unwrap();

        let (converted, warnings) = normalize_to_usd(&panel, &BTreeMap::new());

        assert_eq!(converted, panel);
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_fx_column_warns_and_skips() {
        let panel = Panel::new(
            vec![d("2024-01-08")],
            vec![("PCOMP Index".into(), vec![6500.0])],
        )
        .unwrap();
        let fx = BTreeMap::from([(
            "PCOMP Index".to_string(),
            rule("USDPHP Index", QuoteConvention::UsdBase),
        )]);

        let (converted, warnings) = normalize_to_usd(&panel, &fx);

        assert_eq!(converted.column("PCOMP Index").unwrap(), &[6500.0]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, Stage::Currency);
        assert_eq!(warnings[0].ticker, "PCOMP Index");
    }

    #[test]
    fn declared_ticker_absent_from_panel_is_silently_skipped() {
        let panel = Panel::new(
            vec![d("2024-01-08")],
            vec![("SPX Index".into(), vec![4800.0])],
        )
        .unwrap();
        let fx = BTreeMap::from([(
            "NKY Index".to_string(),
            rule("USDJPY Curncy", QuoteConvention::UsdBase),
        )]);

        let (converted, warnings) = normalize_to_usd(&panel, &fx);
        assert_eq!(converted, panel);
        assert!(warnings.is_empty());
    }

    #[test]
    fn nan_propagates_through_conversion() {
        let panel = Panel::new(
            vec![d("2024-01-08"), d("2024-01-09")],
            vec![
                ("NKY Index".into(), vec![f64::NAN, 30000.0]),
                ("USDJPY Curncy".into(), vec![150.0, f64::NAN]),
            ],
        )
        .unwrap();
        let fx = BTreeMap::from([(
            "NKY Index".to_string(),
            rule("USDJPY Curncy", QuoteConvention::UsdBase),
        )]);

        let (converted, _) = normalize_to_usd(&panel, &fx);
        let nky = converted.column("NKY Index").unwrap();
        assert!(nky[0].is_nan());
        assert!(nky[1].is_nan());
    }
}
