//! Volcengine balance handler.
//!
//! Signed OpenAPI request against the billing service: access/secret key
//! pair, HMAC-SHA256 request signature, `ListBill` for the current period.
//! The account total lives in `Result.TotalAmount` (falling back to
//! `AvailableAmount`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use llmtally_config::{AuthMode, ConfigError, ResolvedConfig};
use llmtally_core::BalanceReport;
use ring::{digest, hmac};
use serde_json::Value;

use crate::error::HandlerError;
use crate::handler::{require_sdk_keys, PlatformHandler};
use crate::http::HttpClient;
use crate::registry::PlatformDescriptor;

use super::number_field;

const SERVICE: &str = "billing";
const REGION: &str = "cn-north-1";
const SIGNED_HEADERS: &str = "host;x-content-sha256;x-date";

/// Volcengine balance handler.
#[derive(Debug)]
pub struct VolcengineHandler;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn sha256_hex(data: &[u8]) -> String {
    hex(digest::digest(&digest::SHA256, data).as_ref())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

/// Signature headers for a bodyless GET.
///
/// The canonical query is the sorted `k=v` join; every param this handler
/// sends is plain ASCII, so no percent-encoding step is needed.
fn signing_headers(
    host: &str,
    params: &BTreeMap<String, String>,
    access_key: &str,
    secret_key: &str,
    now: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let short_date = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(b"");

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let canonical_headers =
        format!("host:{host}\nx-content-sha256:{payload_hash}\nx-date:{date}\n");
    let canonical_request =
        format!("GET\n/\n{query}\n{canonical_headers}\n{SIGNED_HEADERS}\n{payload_hash}");

    let scope = format!("{short_date}/{REGION}/{SERVICE}/request");
    let string_to_sign = format!(
        "HMAC-SHA256\n{date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(secret_key.as_bytes(), short_date.as_bytes());
    let k_region = hmac_sha256(&k_date, REGION.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"request");
    let signature = hex(&hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    BTreeMap::from([
        ("X-Date".to_string(), date),
        ("X-Content-Sha256".to_string(), payload_hash),
        (
            "Authorization".to_string(),
            format!(
                "HMAC-SHA256 Credential={access_key}/{scope}, \
                 SignedHeaders={SIGNED_HEADERS}, Signature={signature}"
            ),
        ),
    ])
}

/// Host (with any non-default port) as it will appear on the wire.
fn request_host(endpoint: &str) -> Result<String, HandlerError> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| {
        HandlerError::Config(ConfigError::InvalidValue {
            key: "endpoint".to_string(),
            reason: e.to_string(),
        })
    })?;
    let host = url.host_str().ok_or_else(|| {
        HandlerError::Config(ConfigError::InvalidValue {
            key: "endpoint".to_string(),
            reason: "no host".to_string(),
        })
    })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[async_trait]
impl PlatformHandler for VolcengineHandler {
    fn name(&self) -> &'static str {
        "volcengine"
    }

    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError> {
        let (access_key, secret_key) = require_sdk_keys(cfg)?;

        let now = Utc::now();
        let mut signed_cfg = cfg.clone();
        signed_cfg
            .params
            .insert("BillPeriod".to_string(), now.format("%Y-%m").to_string());

        let host = request_host(&signed_cfg.endpoint)?;
        let headers = signing_headers(&host, &signed_cfg.params, access_key, secret_key, now);

        let body = client.fetch_json(&signed_cfg, &headers).await?;

        if let Some(err) = body.pointer("/ResponseMetadata/Error") {
            let message = err
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            return Err(HandlerError::AuthRejected(message));
        }

        let result = body.get("Result").unwrap_or(&Value::Null);
        let balance = result
            .get("TotalAmount")
            .and_then(number_field)
            .or_else(|| result.get("AvailableAmount").and_then(number_field))
            .ok_or_else(|| HandlerError::InvalidResponse("missing amount field".to_string()))?;
        let currency = result
            .get("Currency")
            .and_then(Value::as_str)
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
    let mut cfg = ResolvedConfig::new(
        "volcengine",
        "Volcengine",
        "https://billing.volcengineapi.com/",
        AuthMode::SdkCredentials,
    )
    .with_header("Accept", "application/json");
    cfg.params
        .insert("Action".to_string(), "ListBill".to_string());
    cfg.params
        .insert("Version".to_string(), "2022-01-01".to_string());
    cfg
}

/// Registry descriptor for Volcengine.
pub fn volcengine_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        name: "volcengine",
        display_name: "Volcengine",
        supports_packages: false,
        defaults,
        build: || Arc::new(VolcengineHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_cfg(endpoint: String) -> ResolvedConfig {
        let mut cfg = defaults();
        cfg.endpoint = endpoint;
        cfg.credentials.access_key = Some("AKTEST".to_string());
        cfg.credentials.secret_key = Some("secret".to_string());
        cfg
    }

    #[test]
    fn signature_headers_are_deterministic() {
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let params = BTreeMap::from([
            ("Action".to_string(), "ListBill".to_string()),
            ("BillPeriod".to_string(), "2026-08".to_string()),
            ("Version".to_string(), "2022-01-01".to_string()),
        ]);

        let headers = signing_headers("billing.volcengineapi.com", &params, "AKTEST", "secret", now);
        let again = signing_headers("billing.volcengineapi.com", &params, "AKTEST", "secret", now);
        assert_eq!(headers, again);

        assert_eq!(headers["X-Date"], "20260801T000000Z");
        let auth = &headers["Authorization"];
        assert!(auth.contains("Credential=AKTEST/20260801/cn-north-1/billing/request"));
        assert!(auth.contains("SignedHeaders=host;x-content-sha256;x-date"));
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_changes_with_the_secret() {
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let params = BTreeMap::from([("Action".to_string(), "ListBill".to_string())]);
        let a = signing_headers("h", &params, "AK", "secret-a", now);
        let b = signing_headers("h", &params, "AK", "secret-b", now);
        assert_ne!(a["Authorization"], b["Authorization"]);
    }

    #[tokio::test]
    async fn parses_the_billing_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("Action", "ListBill"))
            .and(query_param("Version", "2022-01-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ResponseMetadata": {"RequestId": "req-1"},
                "Result": {"TotalAmount": "5.86", "Currency": "CNY"}
            })))
            .mount(&server)
            .await;

        let cfg = test_cfg(server.uri());
        let report = VolcengineHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert_eq!(report.platform, "Volcengine");
        assert_eq!(report.balance.value(), Some(5.86));
        assert_eq!(report.currency, "CNY");
    }

    #[tokio::test]
    async fn metadata_error_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ResponseMetadata": {
                    "Error": {"Code": "InvalidAccessKey", "Message": "access key not found"}
                }
            })))
            .mount(&server)
            .await;

        let cfg = test_cfg(server.uri());
        let err = VolcengineHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::AuthRejected(_)));
    }

    #[tokio::test]
    async fn missing_keys_name_the_env_vars() {
        let mut cfg = defaults();
        cfg.credentials.access_key = None;
        let err = VolcengineHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("VOLCENGINE_ACCESS_KEY"));

        cfg.credentials.access_key = Some("AKTEST".to_string());
        cfg.credentials.secret_key = None;
        let err = VolcengineHandler
            .fetch_balance(&cfg, &HttpClient::new().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("VOLCENGINE_SECRET_KEY"));
    }
}
