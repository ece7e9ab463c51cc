//! Resolved configuration and partial overlay types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default per-call network timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Auth Mode & Method
// ============================================================================

/// How a platform authenticates its balance API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Provider-specific API key header (e.g. `x-api-key`).
    ApiKey,
    /// `Authorization: Bearer <key>` header.
    BearerToken,
    /// Access-key / secret-key pair for SDK-style signed requests.
    SdkCredentials,
    /// Browser session cookies.
    Cookie,
    /// Console/dashboard bearer token (not an API key).
    ConsoleToken,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ApiKey => "api_key",
            Self::BearerToken => "bearer_token",
            Self::SdkCredentials => "sdk_credentials",
            Self::Cookie => "cookie",
            Self::ConsoleToken => "console_token",
        };
        f.write_str(s)
    }
}

/// HTTP method for the balance endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request with query params.
    #[default]
    Get,
    /// POST request with a JSON body.
    Post,
}

// ============================================================================
// Credentials
// ============================================================================

/// Credential values gathered from the environment or config files.
///
/// All fields are optional; which ones a handler requires depends on its
/// [`AuthMode`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// API key / bearer token.
    pub api_key: Option<String>,
    /// SDK access key id.
    pub access_key: Option<String>,
    /// SDK secret key.
    pub secret_key: Option<String>,
    /// Relay-platform user id sent as a request header.
    pub api_user_id: Option<String>,
    /// Console/dashboard token.
    pub console_token: Option<String>,
    /// Raw cookie header value for cookie-auth platforms.
    pub cookie: Option<String>,
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Fully resolved per-platform settings.
///
/// Built fresh for each invocation by [`crate::ConfigResolver`] and never
/// mutated afterwards; rebuilding is cheaper and safer than mutating a
/// value that concurrent query tasks share.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Platform key, e.g. `deepseek`.
    pub platform: String,
    /// Human-readable platform name.
    pub display_name: String,
    /// Balance endpoint URL.
    pub endpoint: String,
    /// HTTP method for the endpoint.
    pub method: HttpMethod,
    /// Authentication style.
    pub auth: AuthMode,
    /// Whether this platform participates in all-platform runs.
    pub enabled: bool,
    /// Per-call network timeout.
    pub timeout_secs: u64,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Query parameters.
    pub params: BTreeMap<String, String>,
    /// JSON body for POST endpoints.
    pub body: Option<serde_json::Value>,
    /// Cookie domain for cookie-auth platforms.
    pub cookie_domain: Option<String>,
    /// Relay token→currency divisor (e.g. 500 000 tokens per CNY).
    pub quota_scaling: Option<f64>,
    /// Custom environment variable name for the API key.
    pub api_key_env: Option<String>,
    /// Credential values resolved so far.
    pub credentials: Credentials,
}

impl ResolvedConfig {
    /// Creates a baseline config from handler-declared defaults.
    pub fn new(
        platform: impl Into<String>,
        display_name: impl Into<String>,
        endpoint: impl Into<String>,
        auth: AuthMode,
    ) -> Self {
        Self {
            platform: platform.into(),
            display_name: display_name.into(),
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            auth,
            enabled: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: None,
            cookie_domain: None,
            quota_scaling: None,
            api_key_env: None,
            credentials: Credentials::default(),
        }
    }

    /// Sets the enabled default (builder style).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the custom API-key environment variable name (builder style).
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Sets the POST body (builder style).
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the cookie domain (builder style).
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Sets the relay quota scaling divisor (builder style).
    pub fn with_quota_scaling(mut self, scaling: f64) -> Self {
        self.quota_scaling = Some(scaling);
        self
    }

    /// Adds a default request header (builder style).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

// ============================================================================
// Config Overlay
// ============================================================================

/// One partial configuration layer.
///
/// Every field is optional; [`ConfigOverlay::apply`] overwrites only the
/// keys the layer defines and merges header/param maps key-wise, so a layer
/// never wholesale-replaces the object below it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverlay {
    /// Override for the display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Override for the endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Override for the HTTP method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// Override for the auth mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthMode>,
    /// Override for the enabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Override for the per-call timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Headers merged over the existing header map.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Params merged over the existing param map.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Override for the POST body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Override for the cookie domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_domain: Option<String>,
    /// Override for the relay quota scaling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_scaling: Option<f64>,
    /// Override for the API-key env var name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// API key value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// SDK access key value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    /// SDK secret key value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Relay user id value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_user_id: Option<String>,
    /// Console token value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_token: Option<String>,
    /// Cookie header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl ConfigOverlay {
    /// Applies this layer over `cfg`, overwriting only the defined keys.
    pub fn apply(&self, cfg: &mut ResolvedConfig) {
        if let Some(v) = &self.display_name {
            cfg.display_name = v.clone();
        }
        if let Some(v) = &self.endpoint {
            cfg.endpoint = v.clone();
        }
        if let Some(v) = self.method {
            cfg.method = v;
        }
        if let Some(v) = self.auth {
            cfg.auth = v;
        }
        if let Some(v) = self.enabled {
            cfg.enabled = v;
        }
        if let Some(v) = self.timeout_secs {
            cfg.timeout_secs = v;
        }
        for (k, v) in &self.headers {
            cfg.headers.insert(k.clone(), v.clone());
        }
        for (k, v) in &self.params {
            cfg.params.insert(k.clone(), v.clone());
        }
        if let Some(v) = &self.body {
            cfg.body = Some(v.clone());
        }
        if let Some(v) = &self.cookie_domain {
            cfg.cookie_domain = Some(v.clone());
        }
        if let Some(v) = self.quota_scaling {
            cfg.quota_scaling = Some(v);
        }
        if let Some(v) = &self.api_key_env {
            cfg.api_key_env = Some(v.clone());
        }
        if let Some(v) = &self.api_key {
            cfg.credentials.api_key = Some(v.clone());
        }
        if let Some(v) = &self.access_key {
            cfg.credentials.access_key = Some(v.clone());
        }
        if let Some(v) = &self.secret_key {
            cfg.credentials.secret_key = Some(v.clone());
        }
        if let Some(v) = &self.api_user_id {
            cfg.credentials.api_user_id = Some(v.clone());
        }
        if let Some(v) = &self.console_token {
            cfg.credentials.console_token = Some(v.clone());
        }
        if let Some(v) = &self.cookie {
            cfg.credentials.cookie = Some(v.clone());
        }
    }

    /// Sets a single key from a YAML scalar, validating the key name.
    pub fn set_key(&mut self, key: &str, value: serde_yaml::Value) -> Result<(), crate::ConfigError> {
        let mut map = match serde_yaml::to_value(&*self) {
            Ok(serde_yaml::Value::Mapping(m)) => m,
            _ => serde_yaml::Mapping::new(),
        };
        map.insert(serde_yaml::Value::String(key.to_string()), value);
        match serde_yaml::from_value::<ConfigOverlay>(serde_yaml::Value::Mapping(map)) {
            Ok(updated) => {
                *self = updated;
                Ok(())
            }
            Err(e) => Err(crate::ConfigError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
