//! OpenAI organization costs handler.
//!
//! OpenAI has no balance endpoint; the organization costs API (admin key
//! required) reports spend buckets instead. The report therefore carries
//! spend with the balance left as the unsupported sentinel.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use llmtally_config::{AuthMode, ResolvedConfig};
use llmtally_core::{Amount, BalanceReport};
use serde_json::Value;

use crate::error::HandlerError;
use crate::handler::{require_api_key, PlatformHandler};
use crate::http::HttpClient;
use crate::registry::PlatformDescriptor;

use super::number_field;

/// How far back the costs query reaches by default.
const LOOKBACK_DAYS: i64 = 30;

/// OpenAI organization costs handler.
#[derive(Debug)]
pub struct OpenAiHandler;

/// Sums `amount.value` across every bucket's results, picking up the
/// currency from the first entry that names one.
fn sum_costs(body: &Value) -> (f64, Option<String>) {
    let mut total = 0.0;
    let mut currency = None;
    let buckets = body
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for bucket in buckets {
        let results = bucket
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for result in results {
            let Some(amount) = result.get("amount") else {
                continue;
            };
            if let Some(value) = amount.get("value").and_then(number_field) {
                total += value;
            }
            if currency.is_none() {
                currency = amount
                    .get("currency")
                    .and_then(Value::as_str)
                    .map(str::to_uppercase);
            }
        }
    }
    (total, currency)
}

#[async_trait]
impl PlatformHandler for OpenAiHandler {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError> {
        let api_key = require_api_key(cfg)?;
        let headers = BTreeMap::from([(
            "Authorization".to_string(),
            format!("Bearer {api_key}"),
        )]);

        // The costs API requires an explicit window
        let mut cfg = cfg.clone();
        cfg.params.entry("start_time".to_string()).or_insert_with(|| {
            (Utc::now() - Duration::days(LOOKBACK_DAYS))
                .timestamp()
                .to_string()
        });

        let body = client.fetch_json(&cfg, &headers).await?;
        if body.get("data").and_then(Value::as_array).is_none() {
            return Err(HandlerError::InvalidResponse(
                "missing data buckets".to_string(),
            ));
        }
        let (spent, currency) = sum_costs(&body);
        let currency = currency.unwrap_or_else(|| "USD".to_string());

        Ok(BalanceReport {
            platform: cfg.display_name.clone(),
            balance: Amount::Unsupported,
            currency: currency.clone(),
            spent: Amount::Value(spent),
            spent_currency: currency,
            raw: body,
        })
    }
}

fn defaults() -> ResolvedConfig {
    ResolvedConfig::new(
        "openai",
        "OpenAI",
        "https://api.openai.com/v1/organization/costs",
        AuthMode::BearerToken,
    )
    .with_api_key_env("OPENAI_ADMIN_KEY")
    .with_header("Accept", "application/json")
}

/// Registry descriptor for OpenAI.
pub fn openai_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "openai",
        display_name: "OpenAI",
        supports_packages: false,
        defaults,
        build: || Arc::new(OpenAiHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sums_cost_buckets_into_spend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/organization/costs"))
            .and(query_param_contains("start_time", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "page",
                "data": [
                    {"results": [{"amount": {"value": 3.5, "currency": "usd"}}]},
                    {"results": [{"amount": {"value": 1.25, "currency": "usd"}}]}
                ]
            })))
            .mount(&server)
            .await;

        let mut cfg = defaults();
        cfg.endpoint = format!("{}/v1/organization/costs", server.uri());
        cfg.credentials.api_key = Some("sk-admin".to_string());

        let report = OpenAiHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap();

        // No balance endpoint exists, so balance stays unsupported
        assert!(!report.balance.is_supported());
        assert_eq!(report.spent.value(), Some(4.75));
        assert_eq!(report.spent_currency, "USD");
    }

    #[tokio::test]
    async fn empty_page_is_zero_spend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"object": "page", "data": []})),
            )
            .mount(&server)
            .await;

        let mut cfg = defaults();
        cfg.endpoint = server.uri();
        cfg.credentials.api_key = Some("sk-admin".to_string());

        let report = OpenAiHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap();
        assert_eq!(report.spent.value(), Some(0.0));
    }

    #[test]
    fn admin_key_env_var_is_custom() {
        let cfg = defaults();
        assert_eq!(cfg.api_key_env.as_deref(), Some("OPENAI_ADMIN_KEY"));
    }
}
