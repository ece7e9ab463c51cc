//! HTTP client shared by all handlers.
//!
//! One reqwest client serves every platform; per-call timeouts come from
//! the resolved configuration so one slow backend cannot stretch another's
//! deadline.

use std::collections::BTreeMap;
use std::time::Duration;

use llmtally_config::{HttpMethod, ResolvedConfig};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::HandlerError;

/// HTTP client wrapper with status-code and timeout mapping.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates the shared client.
    pub fn new() -> Result<Self, HandlerError> {
        let inner = Client::builder()
            .user_agent(concat!("llmtally/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }

    /// Performs the configured request plus `extra_headers` and returns the
    /// JSON body.
    ///
    /// Status mapping: 401/403 become [`HandlerError::AuthRejected`], 429
    /// becomes [`HandlerError::RateLimited`], any other non-success status
    /// becomes [`HandlerError::InvalidResponse`]. A timed-out request maps
    /// to [`HandlerError::Timeout`] carrying the configured deadline.
    pub async fn fetch_json(
        &self,
        cfg: &ResolvedConfig,
        extra_headers: &BTreeMap<String, String>,
    ) -> Result<Value, HandlerError> {
        let mut request = match cfg.method {
            HttpMethod::Get => self.inner.get(&cfg.endpoint),
            HttpMethod::Post => {
                let body = cfg.body.clone().unwrap_or_else(|| serde_json::json!({}));
                self.inner.post(&cfg.endpoint).json(&body)
            }
        };
        request = request.timeout(Duration::from_secs(cfg.timeout_secs));

        if !cfg.params.is_empty() {
            request = request.query(&cfg.params);
        }
        for (name, value) in cfg.headers.iter().chain(extra_headers.iter()) {
            request = request.header(name, value);
        }

        debug!(platform = %cfg.platform, url = %cfg.endpoint, "dispatching request");

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(HandlerError::Timeout(cfg.timeout_secs)),
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(HandlerError::AuthRejected(format!(
                    "{} rejected the credentials ({})",
                    cfg.display_name, status
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(HandlerError::RateLimited { retry_after });
            }
            s if !s.is_success() => {
                return Err(HandlerError::InvalidResponse(format!(
                    "unexpected status {s}"
                )));
            }
            _ => {}
        }

        let body = match response.json::<Value>().await {
            Ok(v) => v,
            Err(e) if e.is_timeout() => return Err(HandlerError::Timeout(cfg.timeout_secs)),
            Err(e) => return Err(HandlerError::InvalidResponse(format!("not JSON: {e}"))),
        };
        Ok(body)
    }
}

/// Detects an authentication failure reported inside a 200 body.
///
/// Several backends answer HTTP 200 with an application-level envelope
/// (`code`, `success`, `message`) when the session is stale.
pub fn auth_failure_in_body(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    if let Some(code) = obj.get("code") {
        let code_num = code
            .as_i64()
            .or_else(|| code.as_str().and_then(|s| s.parse().ok()));
        if matches!(code_num, Some(401) | Some(403)) {
            return Some(envelope_message(obj).unwrap_or_else(|| "session expired".to_string()));
        }
    }

    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        return Some(envelope_message(obj).unwrap_or_else(|| "request not successful".to_string()));
    }

    None
}

fn envelope_message(obj: &serde_json::Map<String, Value>) -> Option<String> {
    for key in ["message", "msg", "error"] {
        if let Some(text) = obj.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}
