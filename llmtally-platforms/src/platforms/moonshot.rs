//! Moonshot balance handler.
//!
//! `GET /v1/users/me/balance` with a bearer key. `cash_balance` is the
//! real money figure; `available_balance` also counts vouchers, so it is
//! only the fallback when no cash balance is present.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use llmtally_config::{AuthMode, ResolvedConfig};
use llmtally_core::BalanceReport;

use crate::error::HandlerError;
use crate::handler::{require_api_key, PlatformHandler};
use crate::http::HttpClient;
use crate::registry::PlatformDescriptor;

use super::{number_field, BROWSER_UA};

/// Moonshot balance handler.
#[derive(Debug)]
pub struct MoonshotHandler;

#[async_trait]
impl PlatformHandler for MoonshotHandler {
    fn name(&self) -> &'static str {
        "moonshot"
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

        let body = client.fetch_json(cfg, &headers).await?;

        let data = body
            .get("data")
            .ok_or_else(|| HandlerError::InvalidResponse("missing data".to_string()))?;

        let cash = data.get("cash_balance").and_then(number_field);
        let available = data.get("available_balance").and_then(number_field);
        let balance = match (cash, available) {
            (Some(c), _) if c > 0.0 => c,
            (_, Some(a)) => a,
            (Some(c), None) => c,
            (None, None) => {
                return Err(HandlerError::InvalidResponse(
                    "missing cash_balance and available_balance".to_string(),
                ))
            }
        };

        Ok(BalanceReport::balance_only(
            cfg.display_name.clone(),
            balance,
            "CNY",
            body,
        ))
    }
}

fn defaults() -> ResolvedConfig {
    ResolvedConfig::new(
        "moonshot",
        "Moonshot",
        "https://api.moonshot.cn/v1/users/me/balance",
        AuthMode::BearerToken,
    )
    .with_header("User-Agent", BROWSER_UA)
    .with_header("Accept", "application/json")
}

/// Registry descriptor for Moonshot.
pub fn moonshot_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "moonshot",
        display_name: "Moonshot",
        supports_packages: false,
        defaults,
        build: || Arc::new(MoonshotHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fetch(body: serde_json::Value) -> Result<BalanceReport, HandlerError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/me/balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let mut cfg = defaults();
        cfg.endpoint = format!("{}/v1/users/me/balance", server.uri());
        cfg.credentials.api_key = Some("sk-test".to_string());
        MoonshotHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
    }

    #[tokio::test]
    async fn prefers_cash_balance() {
        let report = fetch(json!({
            "code": 0,
            "data": {"available_balance": 50.0, "voucher_balance": 38.0, "cash_balance": 12.0}
        }))
        .await
        .unwrap();
        assert_eq!(report.balance.value(), Some(12.0));
        assert_eq!(report.currency, "CNY");
    }

    #[tokio::test]
    async fn falls_back_to_available_balance() {
        let report = fetch(json!({
            "code": 0,
            "data": {"available_balance": 38.0, "cash_balance": 0.0}
        }))
        .await
        .unwrap();
        assert_eq!(report.balance.value(), Some(38.0));
    }

    #[tokio::test]
    async fn missing_fields_are_a_parse_error() {
        let err = fetch(json!({"code": 0, "data": {}})).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidResponse(_)));
    }
}
