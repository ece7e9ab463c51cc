//! Zhipu AI (bigmodel.cn) balance handler.
//!
//! Cookie-authenticated dashboard API. The session token hides inside the
//! cookie jar under one of several names; it doubles as the
//! `authorization` header. The balance is
//! `data.basicCustomerInfo.balance`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use llmtally_config::{AuthMode, ResolvedConfig};
use llmtally_core::BalanceReport;

use crate::error::HandlerError;
use crate::handler::{require_cookie, PlatformHandler};
use crate::http::{auth_failure_in_body, HttpClient};
use crate::registry::PlatformDescriptor;

use super::{number_field, BROWSER_UA};

/// Cookie names that may carry the session token, in preference order.
const TOKEN_COOKIE_NAMES: [&str; 4] = [
    "bigmodel_token_production",
    "token",
    "session_token",
    "auth_token",
];

/// Zhipu AI balance handler.
#[derive(Debug)]
pub struct ZhipuHandler;

/// Picks the session token out of a raw `Cookie` header value.
fn session_token(cookie: &str) -> Option<&str> {
    for name in TOKEN_COOKIE_NAMES {
        for pair in cookie.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(name) {
                if let Some(value) = parts.next() {
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
    }
    None
}

#[async_trait]
impl PlatformHandler for ZhipuHandler {
    fn name(&self) -> &'static str {
        "zhipu"
    }

    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError> {
        let cookie = require_cookie(cfg)?;
        let token = session_token(cookie).ok_or_else(|| {
            HandlerError::AuthRejected(
                "no session token found in the configured cookies".to_string(),
            )
        })?;

        let headers = BTreeMap::from([
            ("Cookie".to_string(), cookie.to_string()),
            ("authorization".to_string(), token.to_string()),
        ]);

        let body = client.fetch_json(cfg, &headers).await?;
        if let Some(message) = auth_failure_in_body(&body) {
            return Err(HandlerError::AuthRejected(message));
        }

        let balance = body
            .get("data")
            .and_then(|d| d.get("basicCustomerInfo"))
            .and_then(|c| c.get("balance"))
            .and_then(number_field)
            .ok_or_else(|| {
                HandlerError::InvalidResponse(
                    "missing data.basicCustomerInfo.balance".to_string(),
                )
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
        "zhipu",
        "Zhipu AI",
        "https://open.bigmodel.cn/api/biz/customer/detail",
        AuthMode::Cookie,
    )
    .with_cookie_domain(".bigmodel.cn")
    .with_header("User-Agent", BROWSER_UA)
    .with_header("Accept", "application/json")
}

/// Registry descriptor for Zhipu AI.
pub fn zhipu_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "zhipu",
        display_name: "Zhipu AI",
        supports_packages: false,
        defaults,
        build: || Arc::new(ZhipuHandler),
    }
}
