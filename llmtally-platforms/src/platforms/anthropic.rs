//! Anthropic handler.
//!
//! The API exposes no balance endpoint. A minimal `POST /v1/messages`
//! call validates the `x-api-key` credential; both metrics come back as
//! the unsupported sentinel, never a fabricated zero.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use llmtally_config::{AuthMode, HttpMethod, ResolvedConfig};
use llmtally_core::{Amount, BalanceReport};
use serde_json::json;

use crate::error::HandlerError;
use crate::handler::{require_api_key, PlatformHandler};
use crate::http::HttpClient;
use crate::registry::PlatformDescriptor;

/// Anthropic key-validation handler.
#[derive(Debug)]
pub struct AnthropicHandler;

#[async_trait]
impl PlatformHandler for AnthropicHandler {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError> {
        let api_key = require_api_key(cfg)?;
        let headers = BTreeMap::from([("x-api-key".to_string(), api_key.to_string())]);

        // A rejected key surfaces as 401 before this returns
        let body = client.fetch_json(cfg, &headers).await?;

        Ok(BalanceReport {
            platform: cfg.display_name.clone(),
            balance: Amount::Unsupported,
            currency: "USD".to_string(),
            spent: Amount::Unsupported,
            spent_currency: "USD".to_string(),
            raw: body,
        })
    }
}

fn defaults() -> ResolvedConfig {
    let mut cfg = ResolvedConfig::new(
        "anthropic",
        "Anthropic",
        "https://api.anthropic.com/v1/messages",
        AuthMode::ApiKey,
    )
    .with_header("Accept", "application/json")
    .with_header("anthropic-version", "2023-06-01")
    .with_body(json!({
        "model": "claude-3-haiku-20240307",
        "max_tokens": 1,
        "messages": [{"role": "user", "content": "ping"}]
    }));
    cfg.method = HttpMethod::Post;
    cfg
}

/// Registry descriptor for Anthropic.
pub fn anthropic_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "anthropic",
        display_name: "Anthropic",
        supports_packages: false,
        defaults,
        build: || Arc::new(AnthropicHandler),
    }
}
