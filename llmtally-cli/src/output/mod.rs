//! Report rendering.
//!
//! Table and total output convert every numeric amount into the target
//! currency before summing; JSON and markdown preserve each platform's own
//! currency. The unsupported sentinel always renders as `-` and never
//! participates in a sum.

mod json;
mod markdown;
mod table;

use anyhow::Result;
use llmtally_core::{convert, Amount, BalanceReport, PlatformOutcome, RateTable, TokenPackage};

use crate::OutputFormat;

/// Placeholder glyph for unsupported metrics and failed rows.
pub const PLACEHOLDER: &str = "-";

/// Renders balance outcomes in the requested format.
pub fn render_balances(
    outcomes: &[PlatformOutcome<BalanceReport>],
    format: OutputFormat,
    target_currency: &str,
    rates: &RateTable,
) -> Result<String> {
    let target = target_currency.to_uppercase();
    match format {
        OutputFormat::Table => Ok(table::balances(outcomes, &target, rates)),
        OutputFormat::Json => json::balances(outcomes),
        OutputFormat::Markdown => Ok(markdown::balances(outcomes)),
        OutputFormat::Total => Ok(table::total_line(outcomes, &target, rates)),
    }
}

/// Renders package outcomes in the requested format.
pub fn render_packages(
    outcomes: &[PlatformOutcome<Vec<TokenPackage>>],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table | OutputFormat::Total => Ok(table::packages(outcomes)),
        OutputFormat::Json => json::packages(outcomes),
        OutputFormat::Markdown => Ok(markdown::packages(outcomes)),
    }
}

/// Converts an amount into the target currency.
///
/// Returns the converted amount plus a flag marking that the original
/// currency was missing from the rate table and an implicit 1:1 rate was
/// assumed. The unsupported sentinel passes through untouched.
pub(crate) fn convert_amount(
    amount: Amount,
    from: &str,
    target: &str,
    rates: &RateTable,
) -> (Amount, bool) {
    match amount.value() {
        Some(v) => {
            let assumed = from != target && !rates.contains(from);
            (Amount::Value(convert(v, from, target, rates)), assumed)
        }
        None => (Amount::Unsupported, false),
    }
}

/// Sums the convertible balances of successful outcomes into the target
/// currency, excluding every unsupported sentinel.
pub(crate) fn balance_total(
    outcomes: &[PlatformOutcome<BalanceReport>],
    target: &str,
    rates: &RateTable,
) -> f64 {
    outcomes
        .iter()
        .filter_map(PlatformOutcome::payload)
        .filter_map(|r| {
            r.balance
                .value()
                .map(|v| convert(v, &r.currency, target, rates))
        })
        .sum()
}
