//! The uniform handler contract.
//!
//! One implementation per backend. Handlers hold no credentials; the
//! resolved configuration is passed per call, so a cached handler instance
//! always sees the current invocation's settings.

use async_trait::async_trait;
use llmtally_config::{ConfigError, ResolvedConfig};
use llmtally_core::{BalanceReport, TokenPackage};

use crate::error::HandlerError;
use crate::http::HttpClient;

/// A backend-specific query protocol behind a uniform contract.
#[async_trait]
pub trait PlatformHandler: Send + Sync + std::fmt::Debug {
    /// The platform key this handler serves (e.g. `deepseek`).
    fn name(&self) -> &'static str;

    /// Fetches the account balance and normalizes it.
    async fn fetch_balance(
        &self,
        cfg: &ResolvedConfig,
        client: &HttpClient,
    ) -> Result<BalanceReport, HandlerError>;

    /// Whether this platform exposes token package data.
    fn supports_packages(&self) -> bool {
        false
    }

    /// Fetches token packages for platforms that have them.
    async fn fetch_packages(
        &self,
        _cfg: &ResolvedConfig,
        _client: &HttpClient,
    ) -> Result<Vec<TokenPackage>, HandlerError> {
        Err(HandlerError::Unsupported {
            platform: self.name().to_string(),
        })
    }
}

// ============================================================================
// Credential helpers
// ============================================================================

/// Returns the configured API key or a missing-credential error naming the
/// environment variable that would satisfy it.
pub fn require_api_key(cfg: &ResolvedConfig) -> Result<&str, HandlerError> {
    cfg.credentials.api_key.as_deref().ok_or_else(|| {
        HandlerError::Config(ConfigError::MissingCredential {
            platform: cfg.display_name.clone(),
            field: "api_key",
            hint: llmtally_config::env::api_key_var(&cfg.platform, cfg.api_key_env.as_deref()),
        })
    })
}

/// Returns the configured access/secret key pair or a missing-credential
/// error naming whichever half is absent.
pub fn require_sdk_keys(cfg: &ResolvedConfig) -> Result<(&str, &str), HandlerError> {
    let prefix = llmtally_config::env::env_prefix(&cfg.platform);
    let access = cfg.credentials.access_key.as_deref().ok_or_else(|| {
        HandlerError::Config(ConfigError::MissingCredential {
            platform: cfg.display_name.clone(),
            field: "access_key",
            hint: format!("{prefix}_ACCESS_KEY"),
        })
    })?;
    let secret = cfg.credentials.secret_key.as_deref().ok_or_else(|| {
        HandlerError::Config(ConfigError::MissingCredential {
            platform: cfg.display_name.clone(),
            field: "secret_key",
            hint: format!("{prefix}_SECRET_KEY"),
        })
    })?;
    Ok((access, secret))
}

/// Returns the configured cookie header value or a missing-credential error.
pub fn require_cookie(cfg: &ResolvedConfig) -> Result<&str, HandlerError> {
    cfg.credentials.cookie.as_deref().ok_or_else(|| {
        HandlerError::Config(ConfigError::MissingCredential {
            platform: cfg.display_name.clone(),
            field: "cookie",
            hint: format!("{}_COOKIE", llmtally_config::env::env_prefix(&cfg.platform)),
        })
    })
}

/// Returns the configured console token or a missing-credential error.
pub fn require_console_token(cfg: &ResolvedConfig) -> Result<&str, HandlerError> {
    cfg.credentials.console_token.as_deref().ok_or_else(|| {
        HandlerError::Config(ConfigError::MissingCredential {
            platform: cfg.display_name.clone(),
            field: "console_token",
            hint: format!(
                "{}_CONSOLE_TOKEN",
                llmtally_config::env::env_prefix(&cfg.platform)
            ),
        })
    })
}

/// Returns the configured relay user id or a missing-credential error.
pub fn require_api_user_id(cfg: &ResolvedConfig) -> Result<&str, HandlerError> {
    cfg.credentials.api_user_id.as_deref().ok_or_else(|| {
        HandlerError::Config(ConfigError::MissingCredential {
            platform: cfg.display_name.clone(),
            field: "api_user_id",
            hint: format!(
                "{}_API_USER_ID",
                llmtally_config::env::env_prefix(&cfg.platform)
            ),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmtally_config::AuthMode;

    #[test]
    fn missing_key_names_the_env_var() {
        let cfg = ResolvedConfig::new(
            "deepseek",
            "DeepSeek",
            "https://api.deepseek.com/v1/user/balance",
            AuthMode::BearerToken,
        );
        let err = require_api_key(&cfg).unwrap_err();
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));

        let cfg = ResolvedConfig::new(
            "openai",
            "OpenAI",
            "https://api.openai.com/v1/organization/costs",
            AuthMode::BearerToken,
        )
        .with_api_key_env("OPENAI_ADMIN_KEY");
        let err = require_api_key(&cfg).unwrap_err();
        assert!(err.to_string().contains("OPENAI_ADMIN_KEY"));
    }
}
