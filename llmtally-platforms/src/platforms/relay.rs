//! Relay platform handlers.
//!
//! new-api style resellers (DuckCoding, PackyCode, YourAPI) all expose the
//! same `GET /api/user/self` shape: session cookies plus a `new-api-user`
//! header identify the account, and quotas are token counters scaled down
//! to CNY (500 000 tokens per yuan by default). One handler covers them
//! all; the registry instantiates it per platform.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use llmtally_config::{AuthMode, ResolvedConfig};
use llmtally_core::{Amount, BalanceReport, PackageStatus, TokenPackage};
use serde_json::Value;

use crate::error::HandlerError;
use crate::handler::{require_api_user_id, require_cookie, PlatformHandler};
use crate::http::{auth_failure_in_body, HttpClient};
use crate::registry::PlatformDescriptor;

use super::{number_field, BROWSER_UA};

/// Header carrying the relay account id.
const USER_ID_HEADER: &str = "new-api-user";

/// Default token-to-CNY divisor.
const DEFAULT_QUOTA_SCALING: f64 = 500_000.0;

/// Quota counters from `data`.
struct Quota {
    quota: f64,
    bonus_quota: f64,
    used_quota: f64,
}

fn read_quota(body: &Value) -> Result<Quota, HandlerError> {
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| HandlerError::InvalidResponse("missing data object".to_string()))?;
    let field = |key: &str| data.get(key).and_then(number_field).unwrap_or(0.0);
    if !data.contains_key("quota") {
        return Err(HandlerError::InvalidResponse(
            "missing data.quota".to_string(),
        ));
    }
    Ok(Quota {
        quota: field("quota"),
        bonus_quota: field("bonus_quota"),
        used_quota: field("used_quota"),
    })
}

/// Shared handler for new-api style relay platforms.
#[derive(Debug)]
pub struct RelayHandler {
    name: &'static str,
    /// Models the relay fronts, shown in package rows.
    models: &'static str,
    /// Label for the synthesized quota package.
    package_label: &'static str,
    /// Whether this relay's quota is exposed as a token package.
    packages: bool,
}

impl RelayHandler {
    async fn query(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<Value, HandlerError> {
        let cookie = require_cookie(cfg)?;
        let user_id = require_api_user_id(cfg)?;
        let headers = BTreeMap::from([
            ("Cookie".to_string(), cookie.to_string()),
            (USER_ID_HEADER.to_string(), user_id.to_string()),
        ]);

        let body = client.fetch_json(cfg, &headers).await?;
        if let Some(message) = auth_failure_in_body(&body) {
            return Err(HandlerError::AuthRejected(message));
        }
        Ok(body)
    }
}

#[async_trait]
impl PlatformHandler for RelayHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError> {
        let body = self.query(cfg, client).await?;
        let quota = read_quota(&body)?;
        let scaling = cfg.quota_scaling.unwrap_or(DEFAULT_QUOTA_SCALING);

        Ok(BalanceReport {
            platform: cfg.display_name.clone(),
            balance: Amount::Value((quota.quota + quota.bonus_quota) / scaling),
            currency: "CNY".to_string(),
            spent: Amount::Value(quota.used_quota / scaling),
            spent_currency: "CNY".to_string(),
            raw: body,
        })
    }

    fn supports_packages(&self) -> bool {
        self.packages
    }

    async fn fetch_packages(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<Vec<TokenPackage>, HandlerError> {
        if !self.packages {
            return Err(HandlerError::Unsupported {
                platform: self.name.to_string(),
            });
        }
        let body = self.query(cfg, client).await?;
        let quota = read_quota(&body)?;

        Ok(vec![TokenPackage::pay_per_use(
            cfg.display_name.clone(),
            self.models,
            self.package_label,
            quota.quota,
            quota.used_quota,
            PackageStatus::Active,
        )])
    }
}

fn relay_defaults(
    name: &'static str,
    display_name: &'static str,
    endpoint: &'static str,
    cookie_domain: &'static str,
) -> ResolvedConfig {
    ResolvedConfig::new(name, display_name, endpoint, AuthMode::Cookie)
        // Relays stay out of default runs until explicitly enabled
        .with_enabled(false)
        .with_cookie_domain(cookie_domain)
        .with_quota_scaling(DEFAULT_QUOTA_SCALING)
        .with_header("User-Agent", BROWSER_UA)
        .with_header("Accept", "application/json")
}

/// Registry descriptor for DuckCoding (balance only).
pub fn duckcoding_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "duckcoding",
        display_name: "DuckCoding",
        supports_packages: false,
        defaults: || {
            relay_defaults(
                "duckcoding",
                "DuckCoding",
                "https://duckcoding.com/api/user/self",
                "duckcoding.com",
            )
        },
        build: || {
            Arc::new(RelayHandler {
                name: "duckcoding",
                models: "claude,codex",
                package_label: "DuckCoding Quota",
                packages: false,
            })
        },
    }
}

/// Registry descriptor for PackyCode.
pub fn packycode_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "packycode",
        display_name: "PackyCode",
        supports_packages: true,
        defaults: || {
            relay_defaults(
                "packycode",
                "PackyCode",
                "https://packyapi.com/api/user/self",
                "packyapi.com",
            )
        },
        build: || {
            Arc::new(RelayHandler {
                name: "packycode",
                models: "claude,codex",
                package_label: "PackyCode Quota",
                packages: true,
            })
        },
    }
}

/// Registry descriptor for YourAPI.
pub fn yourapi_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "yourapi",
        display_name: "YourAPI",
        supports_packages: true,
        defaults: || {
            relay_defaults(
                "yourapi",
                "YourAPI",
                "https://yourapi.cn/api/user/self",
                "yourapi.cn",
            )
        },
        build: || {
            Arc::new(RelayHandler {
                name: "yourapi",
                models: "gpt-4,gpt-3.5-turbo,claude",
                package_label: "YourAPI Quota Package",
                packages: true,
            })
        },
    }
}
