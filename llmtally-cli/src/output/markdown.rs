//! Markdown table output, preserving per-platform currencies.

use llmtally_core::{BalanceReport, PlatformOutcome, TokenPackage};

use super::PLACEHOLDER;

/// Balance outcomes as a markdown table.
pub fn balances(outcomes: &[PlatformOutcome<BalanceReport>]) -> String {
    let mut lines = vec![
        "| Platform | Balance | Currency | Spent | Spent Currency |".to_string(),
        "|---|---:|---|---:|---|".to_string(),
    ];
    for outcome in outcomes {
        match &outcome.outcome {
            Ok(report) => lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                report.platform, report.balance, report.currency, report.spent,
                report.spent_currency
            )),
            Err(failure) => lines.push(format!(
                "| {} | {PLACEHOLDER} | {PLACEHOLDER} | {PLACEHOLDER} | {failure} |",
                outcome.platform
            )),
        }
    }
    lines.join("\n")
}

/// Package outcomes as a markdown table.
pub fn packages(outcomes: &[PlatformOutcome<Vec<TokenPackage>>]) -> String {
    let mut lines = vec![
        "| Platform | Package | Models | Total | Used | Remaining | Status |".to_string(),
        "|---|---|---|---:|---:|---:|---|".to_string(),
    ];
    for outcome in outcomes {
        match &outcome.outcome {
            Ok(packages) => {
                for pkg in packages {
                    lines.push(format!(
                        "| {} | {} | {} | {:.0} | {:.0} | {:.0} | {} |",
                        pkg.platform,
                        pkg.package,
                        pkg.model,
                        pkg.total_tokens,
                        pkg.used_tokens,
                        pkg.remaining_tokens,
                        match pkg.status {
                            llmtally_core::PackageStatus::Active => "active",
                            llmtally_core::PackageStatus::Inactive => "inactive",
                        },
                    ));
                }
            }
            Err(failure) => lines.push(format!(
                "| {} | {PLACEHOLDER} | {PLACEHOLDER} | {PLACEHOLDER} | {PLACEHOLDER} | {PLACEHOLDER} | {failure} |",
                outcome.platform
            )),
        }
    }
    lines.join("\n")
}
