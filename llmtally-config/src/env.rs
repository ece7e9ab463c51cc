//! Environment variable layer.
//!
//! The highest-precedence layer. Variable names derive from the platform
//! name uppercased with `-` mapped to `_`: `DEEPSEEK_API_KEY`,
//! `ZHIPU_COOKIE`, and so on. A handler may declare a custom key variable
//! (e.g. `OPENAI_ADMIN_KEY`) which replaces `<PLATFORM>_API_KEY`.

use tracing::debug;

use crate::overlay::ConfigOverlay;

/// Converts a platform name into its environment variable prefix.
pub fn env_prefix(platform: &str) -> String {
    platform.to_ascii_uppercase().replace('-', "_")
}

/// Name of the variable that supplies `platform`'s API key.
pub fn api_key_var(platform: &str, api_key_env: Option<&str>) -> String {
    match api_key_env {
        Some(var) => var.to_string(),
        None => format!("{}_API_KEY", env_prefix(platform)),
    }
}

fn read(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn read_bool(var: &str) -> Option<bool> {
    let raw = read(var)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            debug!(var, value = other, "unrecognized boolean, ignoring");
            None
        }
    }
}

/// Builds the environment overlay for `platform`.
///
/// Only variables that are set and non-empty produce overlay keys, so the
/// layer falls through cleanly to the file layers below it.
pub fn env_overlay(platform: &str, api_key_env: Option<&str>) -> ConfigOverlay {
    let prefix = env_prefix(platform);
    ConfigOverlay {
        api_key: read(&api_key_var(platform, api_key_env)),
        access_key: read(&format!("{prefix}_ACCESS_KEY")),
        secret_key: read(&format!("{prefix}_SECRET_KEY")),
        api_user_id: read(&format!("{prefix}_API_USER_ID")),
        console_token: read(&format!("{prefix}_CONSOLE_TOKEN")),
        cookie: read(&format!("{prefix}_COOKIE")),
        enabled: read_bool(&format!("{prefix}_ENABLED")),
        ..Default::default()
    }
}
