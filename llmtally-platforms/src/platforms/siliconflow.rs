//! SiliconFlow balance handler.
//!
//! `GET /v1/user/info` with a bearer key; the balance is
//! `data.totalBalance`.

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

/// SiliconFlow balance handler.
#[derive(Debug)]
pub struct SiliconFlowHandler;

#[async_trait]
impl PlatformHandler for SiliconFlowHandler {
    fn name(&self) -> &'static str {
        "siliconflow"
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

        let balance = body
            .get("data")
            .and_then(|d| d.get("totalBalance"))
            .and_then(number_field)
            .ok_or_else(|| {
                HandlerError::InvalidResponse("missing data.totalBalance".to_string())
            })?;

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
        "siliconflow",
        "SiliconFlow",
        "https://api.siliconflow.cn/v1/user/info",
        AuthMode::BearerToken,
    )
    .with_header("User-Agent", BROWSER_UA)
    .with_header("Accept", "application/json")
}

/// Registry descriptor for SiliconFlow.
pub fn siliconflow_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "siliconflow",
        display_name: "SiliconFlow",
        supports_packages: false,
        defaults,
        build: || Arc::new(SiliconFlowHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_total_balance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/user/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 20000,
                "status": true,
                "data": {"name": "user", "balance": "0.9", "totalBalance": "14.56"}
            })))
            .mount(&server)
            .await;

        let mut cfg = defaults();
        cfg.endpoint = format!("{}/v1/user/info", server.uri());
        cfg.credentials.api_key = Some("sk-test".to_string());

        let report = SiliconFlowHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap();
        assert_eq!(report.balance.value(), Some(14.56));
        assert_eq!(report.currency, "CNY");
    }
}
