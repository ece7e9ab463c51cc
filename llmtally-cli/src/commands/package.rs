//! The `package` command: token packages across platforms.

use anyhow::{bail, Result};
use llmtally_core::FailureKind;
use tracing::{debug, warn};

use crate::output;
use crate::Cli;

/// Runs the package query and prints the report.
pub async fn run(cli: &Cli, model: Option<&str>) -> Result<()> {
    let aggregator = super::aggregator(cli)?;
    let requested = super::selection(cli);
    let platforms = aggregator.select_package_platforms(requested.as_deref())?;

    if platforms.is_empty() {
        bail!("no package-capable platforms enabled; run `llmtally list`");
    }
    debug!(count = platforms.len(), platforms = ?platforms, "querying packages");

    let mut outcomes = aggregator.check_packages(&platforms).await;
    for outcome in &outcomes {
        if let Err(failure) = &outcome.outcome {
            warn!(
                platform = %outcome.platform,
                kind = failure.kind.label(),
                "package query failed: {}",
                failure.message
            );
        }
    }
    if let Some(filter) = model {
        let needle = filter.to_ascii_lowercase();
        for outcome in &mut outcomes {
            if let Ok(packages) = &mut outcome.outcome {
                packages.retain(|p| p.model.to_ascii_lowercase().contains(&needle));
            }
        }
    }
    let report = output::render_packages(&outcomes, cli.format)?;
    println!("{report}");

    let total_config_failure = outcomes.iter().all(|o| {
        matches!(&o.outcome, Err(f) if f.kind == FailureKind::Config)
    });
    if total_config_failure {
        bail!("no requested platform could be resolved");
    }
    Ok(())
}
