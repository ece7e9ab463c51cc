//! Aligned table output.

use llmtally_core::{BalanceReport, PlatformOutcome, RateTable, TokenPackage};

use super::{balance_total, convert_amount, PLACEHOLDER};

fn fmt_amount(amount: llmtally_core::Amount, assumed_rate: bool) -> String {
    match amount.value() {
        Some(v) => {
            // `*` marks a currency the rate table does not list
            if assumed_rate {
                format!("{v:.2}*")
            } else {
                format!("{v:.2}")
            }
        }
        None => PLACEHOLDER.to_string(),
    }
}

/// Balance table, converted into the target currency, with a summed total.
pub fn balances(
    outcomes: &[PlatformOutcome<BalanceReport>],
    target: &str,
    rates: &RateTable,
) -> String {
    let mut lines = Vec::with_capacity(outcomes.len() + 3);
    lines.push(format!(
        "{:<16} {:>14} {:>14}  {}",
        "PLATFORM",
        format!("BALANCE ({target})"),
        format!("SPENT ({target})"),
        "STATUS"
    ));

    let mut any_assumed = false;
    for outcome in outcomes {
        match &outcome.outcome {
            Ok(report) => {
                let (balance, assumed_b) =
                    convert_amount(report.balance, &report.currency, target, rates);
                let (spent, assumed_s) =
                    convert_amount(report.spent, &report.spent_currency, target, rates);
                any_assumed |= assumed_b || assumed_s;
                lines.push(format!(
                    "{:<16} {:>14} {:>14}  ok",
                    report.platform,
                    fmt_amount(balance, assumed_b),
                    fmt_amount(spent, assumed_s),
                ));
            }
            Err(failure) => {
                lines.push(format!(
                    "{:<16} {:>14} {:>14}  {}",
                    outcome.platform, PLACEHOLDER, PLACEHOLDER, failure
                ));
            }
        }
    }

    lines.push(format!(
        "{:<16} {:>14.2}",
        format!("TOTAL ({target})"),
        balance_total(outcomes, target, rates)
    ));
    if any_assumed {
        lines.push("* no exchange rate listed for this currency; 1:1 assumed".to_string());
    }
    lines.join("\n")
}

/// The total-only output shape.
pub fn total_line(
    outcomes: &[PlatformOutcome<BalanceReport>],
    target: &str,
    rates: &RateTable,
) -> String {
    format!("{:.2} {target}", balance_total(outcomes, target, rates))
}

/// Token package table, one row per package, grouped as returned.
pub fn packages(outcomes: &[PlatformOutcome<Vec<TokenPackage>>]) -> String {
    let mut lines = vec![format!(
        "{:<14} {:<26} {:>14} {:>14} {:>14}  {:<8} {}",
        "PLATFORM", "PACKAGE", "TOTAL", "USED", "REMAINING", "STATUS", "EXPIRES"
    )];

    for outcome in outcomes {
        match &outcome.outcome {
            Ok(packages) if packages.is_empty() => {
                lines.push(format!(
                    "{:<14} {:<26} {:>14} {:>14} {:>14}  no packages",
                    outcome.platform, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER
                ));
            }
            Ok(packages) => {
                for pkg in packages {
                    let expires = pkg
                        .expires_at
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| PLACEHOLDER.to_string());
                    lines.push(format!(
                        "{:<14} {:<26} {:>14.0} {:>14.0} {:>14.0}  {:<8} {}",
                        pkg.platform,
                        pkg.package,
                        pkg.total_tokens,
                        pkg.used_tokens,
                        pkg.remaining_tokens,
                        match pkg.status {
                            llmtally_core::PackageStatus::Active => "active",
                            llmtally_core::PackageStatus::Inactive => "inactive",
                        },
                        expires,
                    ));
                }
            }
            Err(failure) => {
                lines.push(format!(
                    "{:<14} {:<26} {:>14} {:>14} {:>14}  {}",
                    outcome.platform, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER, PLACEHOLDER, failure
                ));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmtally_core::{Amount, FailureKind, FailureSummary};

    fn ok_report(platform: &str, balance: f64, currency: &str) -> PlatformOutcome<BalanceReport> {
        PlatformOutcome::ok(
            platform.to_lowercase(),
            BalanceReport::balance_only(platform, balance, currency, serde_json::Value::Null),
        )
    }

    #[test]
    fn table_has_one_row_per_outcome_plus_total() {
        let rates = RateTable::seeded();
        let outcomes = vec![
            ok_report("DeepSeek", 72.0, "CNY"),
            PlatformOutcome::failed(
                "zhipu",
                FailureSummary::new(FailureKind::Auth, "cookie expired"),
            ),
        ];

        let table = balances(&outcomes, "USD", &rates);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4); // header, two rows, total
        assert!(lines[1].contains("10.00"));
        assert!(lines[2].contains("auth: cookie expired"));
        assert!(lines[3].contains("10.00"));
    }

    #[test]
    fn unsupported_spend_renders_dash_not_zero() {
        let rates = RateTable::seeded();
        let outcomes = vec![ok_report("DeepSeek", 72.0, "CNY")];
        let table = balances(&outcomes, "CNY", &rates);
        let row = table.lines().nth(1).unwrap();
        assert!(row.contains('-'));
        assert!(!row.contains("0.00"));
    }

    #[test]
    fn assumed_rate_is_starred_and_footnoted() {
        let rates = RateTable::seeded();
        let outcomes = vec![ok_report("Odd", 5.0, "XYZ")];
        let table = balances(&outcomes, "CNY", &rates);
        assert!(table.contains("5.00*"));
        assert!(table.contains("1:1 assumed"));
    }

    #[test]
    fn total_line_is_bare() {
        let rates = RateTable::seeded();
        let outcomes = vec![ok_report("A", 72.0, "CNY"), ok_report("B", 10.0, "USD")];
        assert_eq!(total_line(&outcomes, "USD", &rates), "20.00 USD");
    }

    #[test]
    fn sentinel_balance_row_shows_dash() {
        let rates = RateTable::seeded();
        let mut outcome = ok_report("OpenAI", 0.0, "USD");
        if let Ok(report) = outcome.outcome.as_mut() {
            report.balance = Amount::Unsupported;
            report.spent = Amount::Value(4.75);
        }
        let table = balances(&[outcome], "USD", &rates);
        let row = table.lines().nth(1).unwrap();
        assert!(row.contains('-'));
        assert!(row.contains("4.75"));
    }
}
