//! 88Code subscription handler.
//!
//! Console-token bearer auth against the subscription dashboard API.
//! Subscriptions carry credit counters; the balance view prices the
//! remaining credits of active plans against the cost of all plans.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use llmtally_config::{AuthMode, ResolvedConfig};
use llmtally_core::{Amount, BalanceReport, PackageStatus, TokenPackage};
use serde_json::Value;

use crate::error::HandlerError;
use crate::handler::{require_console_token, PlatformHandler};
use crate::http::{auth_failure_in_body, HttpClient};
use crate::registry::PlatformDescriptor;

use super::{number_field, BROWSER_UA};

/// Models the service fronts, for package rows.
const MODELS: &str = "claude,gpt-5,gpt-5-codex";

/// 88Code subscription handler.
#[derive(Debug)]
pub struct Code88Handler;

impl Code88Handler {
    async fn subscriptions(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<(Value, Vec<Value>), HandlerError> {
        let token = require_console_token(cfg)?;
        let headers = BTreeMap::from([(
            "Authorization".to_string(),
            format!("Bearer {token}"),
        )]);

        let body = client.fetch_json(cfg, &headers).await?;
        if let Some(message) = auth_failure_in_body(&body) {
            return Err(HandlerError::AuthRejected(message));
        }
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                HandlerError::InvalidResponse("missing subscription list".to_string())
            })?;
        Ok((body, items))
    }
}

fn plan_of(item: &Value) -> &Value {
    item.get("subscriptionPlan").unwrap_or(&Value::Null)
}

/// Plan label: features text, falling back through the name fields.
fn package_label(item: &Value) -> String {
    let plan = plan_of(item);
    let raw = plan
        .get("features")
        .and_then(Value::as_str)
        .or_else(|| item.get("subscriptionPlanName").and_then(Value::as_str))
        .or_else(|| plan.get("subscriptionName").and_then(Value::as_str))
        .unwrap_or("88Code Subscription");

    let mut label = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if label.chars().count() > 50 {
        label = label.chars().take(47).collect::<String>() + "...";
    }
    label
}

fn parse_expiry(item: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = item
        .get("expireTime")
        .or_else(|| item.get("endTime"))
        .and_then(Value::as_str)?;
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl PlatformHandler for Code88Handler {
    fn name(&self) -> &'static str {
        "code88"
    }

    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError> {
        let (body, items) = self.subscriptions(cfg, client).await?;

        // Cost of every plan ever bought; value left only in active plans,
        // prorated by unused credits.
        let mut total_cost = 0.0;
        let mut balance = 0.0;
        for item in &items {
            let cost = item.get("cost").and_then(number_field).unwrap_or(0.0);
            total_cost += cost;

            if item.get("isActive").and_then(Value::as_bool) != Some(true) {
                continue;
            }
            let limit = plan_of(item)
                .get("creditLimit")
                .and_then(number_field)
                .unwrap_or(0.0);
            let current = item
                .get("currentCredits")
                .and_then(number_field)
                .unwrap_or(0.0);
            if limit > 0.0 {
                balance += cost * (current / limit).clamp(0.0, 1.0);
            }
        }

        Ok(BalanceReport {
            platform: cfg.display_name.clone(),
            balance: Amount::Value(balance),
            currency: "CNY".to_string(),
            spent: Amount::Value(total_cost - balance),
            spent_currency: "CNY".to_string(),
            raw: body,
        })
    }

    fn supports_packages(&self) -> bool {
        true
    }

    async fn fetch_packages(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<Vec<TokenPackage>, HandlerError> {
        let (_, items) = self.subscriptions(cfg, client).await?;

        let mut packages = Vec::with_capacity(items.len());
        for item in &items {
            let limit = plan_of(item)
                .get("creditLimit")
                .and_then(number_field)
                .unwrap_or(0.0);
            let current = item
                .get("currentCredits")
                .and_then(number_field)
                .unwrap_or(0.0);
            let status = if item.get("isActive").and_then(Value::as_bool) == Some(true) {
                PackageStatus::Active
            } else {
                PackageStatus::Inactive
            };

            let mut package = TokenPackage::pay_per_use(
                cfg.display_name.clone(),
                MODELS,
                package_label(item),
                limit,
                limit - current,
                status,
            );
            package.expires_at = parse_expiry(item);
            packages.push(package);
        }

        // Fullest plans first, regardless of dashboard order
        packages.sort_by(|a, b| {
            b.remaining_tokens
                .partial_cmp(&a.remaining_tokens)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(packages)
    }
}

fn defaults() -> ResolvedConfig {
    ResolvedConfig::new(
        "code88",
        "88Code",
        "https://www.88code.org/admin-api/cc-admin/system/subscription/my",
        AuthMode::ConsoleToken,
    )
    .with_enabled(false)
    .with_header("User-Agent", BROWSER_UA)
    .with_header("Accept", "application/json")
    .with_header("Referer", "https://www.88code.org/my-subscription")
}

/// Registry descriptor for 88Code.
pub fn code88_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "code88",
        display_name: "88Code",
        supports_packages: true,
        defaults,
        build: || Arc::new(Code88Handler),
    }
}
