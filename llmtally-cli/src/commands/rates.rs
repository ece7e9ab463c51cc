//! The `rates` command: show the exchange rate table.

use anyhow::Result;
use llmtally_core::{RateTable, RATES_ENV_VAR};

use crate::Cli;

/// Prints the active rate table.
pub fn run(cli: &Cli) -> Result<()> {
    let rates = RateTable::from_env();

    if cli.format == crate::OutputFormat::Json {
        let map: serde_json::Map<String, serde_json::Value> = rates
            .entries()
            .map(|(code, rate)| (code.to_string(), serde_json::json!(rate)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    println!("Exchange rates (1 unit in {}):", rates.base());
    for (code, rate) in rates.entries() {
        println!("  {code:<8} {rate}");
    }
    if std::env::var(RATES_ENV_VAR).is_ok() {
        println!("(overridden via {RATES_ENV_VAR})");
    }
    Ok(())
}
