//! The `cost` command: balances and spend across platforms.

use anyhow::{bail, Result};
use llmtally_core::{FailureKind, RateTable};
use tracing::{debug, warn};

use crate::output;
use crate::Cli;

/// Runs the cost query and prints the report.
pub async fn run(cli: &Cli) -> Result<()> {
    let aggregator = super::aggregator(cli)?;
    let requested = super::selection(cli);
    let platforms = aggregator.select_balance_platforms(requested.as_deref())?;

    if platforms.is_empty() {
        bail!("no platforms enabled; run `llmtally list` and `llmtally enable <name>`");
    }
    debug!(count = platforms.len(), platforms = ?platforms, "querying balances");

    let outcomes = aggregator.check_balances(&platforms).await;
    for outcome in &outcomes {
        if let Err(failure) = &outcome.outcome {
            warn!(
                platform = %outcome.platform,
                kind = failure.kind.label(),
                "balance query failed: {}",
                failure.message
            );
        }
    }
    let rates = RateTable::from_env();
    let report = output::render_balances(&outcomes, cli.format, &cli.currency, &rates)?;
    println!("{report}");

    // Partial success is success; only a run where no platform could even
    // be resolved fails the invocation.
    let total_config_failure = outcomes.iter().all(|o| {
        matches!(&o.outcome, Err(f) if f.kind == FailureKind::Config)
    });
    if total_config_failure {
        bail!("no requested platform could be resolved");
    }
    Ok(())
}
