//! JSON output, preserving per-platform currencies.

use anyhow::Result;
use llmtally_core::{BalanceReport, PlatformOutcome, TokenPackage};
use serde_json::json;

fn row<T: serde::Serialize>(outcome: &PlatformOutcome<T>) -> serde_json::Value {
    match &outcome.outcome {
        Ok(payload) => {
            let mut value = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
            if let Some(obj) = value.as_object_mut() {
                obj.insert("status".to_string(), json!("ok"));
            }
            value
        }
        Err(failure) => json!({
            "platform": outcome.platform,
            "status": "failed",
            "error": {"kind": failure.kind, "message": failure.message},
        }),
    }
}

/// Balance outcomes as a pretty JSON array.
pub fn balances(outcomes: &[PlatformOutcome<BalanceReport>]) -> Result<String> {
    let rows: Vec<serde_json::Value> = outcomes.iter().map(row).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Package outcomes as a pretty JSON array.
pub fn packages(outcomes: &[PlatformOutcome<Vec<TokenPackage>>]) -> Result<String> {
    let rows: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|outcome| match &outcome.outcome {
            Ok(packages) => json!({
                "platform": outcome.platform,
                "status": "ok",
                "packages": packages,
            }),
            Err(failure) => json!({
                "platform": outcome.platform,
                "status": "failed",
                "error": {"kind": failure.kind, "message": failure.message},
            }),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
