//! DeepSeek balance handler.
//!
//! `GET /v1/user/balance` with a bearer key. The balance lives in the
//! first entry of `balance_infos`.

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

/// DeepSeek balance handler.
#[derive(Debug)]
pub struct DeepSeekHandler;

#[async_trait]
impl PlatformHandler for DeepSeekHandler {
    fn name(&self) -> &'static str {
        "deepseek"
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

        let info = body
            .get("balance_infos")
            .and_then(|v| v.get(0))
            .ok_or_else(|| HandlerError::InvalidResponse("missing balance_infos".to_string()))?;

        let balance = info
            .get("total_balance")
            .and_then(number_field)
            .ok_or_else(|| HandlerError::InvalidResponse("missing total_balance".to_string()))?;
        let currency = info
            .get("currency")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("CNY")
            .to_string();

        Ok(BalanceReport::balance_only(
            cfg.display_name.clone(),
            balance,
            currency,
            body,
        ))
    }
}

fn defaults() -> ResolvedConfig {
    ResolvedConfig::new(
        "deepseek",
        "DeepSeek",
        "https://api.deepseek.com/v1/user/balance",
        AuthMode::BearerToken,
    )
    .with_header("User-Agent", BROWSER_UA)
    .with_header("Accept", "application/json")
}

/// Registry descriptor for DeepSeek.
pub fn deepseek_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "deepseek",
        display_name: "DeepSeek",
        supports_packages: false,
        defaults,
        build: || Arc::new(DeepSeekHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_cfg(endpoint: String) -> ResolvedConfig {
        let mut cfg = defaults();
        cfg.endpoint = endpoint;
        cfg.credentials.api_key = Some("sk-test".to_string());
        cfg
    }

    #[tokio::test]
    async fn parses_balance_infos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/user/balance"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_available": true,
                "balance_infos": [
                    {"currency": "CNY", "total_balance": "110.00", "granted_balance": "0.00"}
                ]
            })))
            .mount(&server)
            .await;

        let cfg = test_cfg(format!("{}/v1/user/balance", server.uri()));
        let report = DeepSeekHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert_eq!(report.platform, "DeepSeek");
        assert_eq!(report.balance.value(), Some(110.0));
        assert_eq!(report.currency, "CNY");
        assert!(!report.spent.is_supported());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let cfg = test_cfg(format!("{}/v1/user/balance", server.uri()));
        let err = DeepSeekHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::AuthRejected(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let mut cfg = defaults();
        cfg.credentials.api_key = None;
        let err = DeepSeekHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Config(_)));
    }
}
