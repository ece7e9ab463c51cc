//! The global config file.
//!
//! `~/.llmtally/config.yaml` holds cross-platform settings plus one
//! optional overlay section per platform. A missing file is equivalent to
//! an empty one.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::overlay::ConfigOverlay;

fn default_browser() -> String {
    "chrome".to_string()
}

/// Contents of the global config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Browser whose cookie store cookie-auth platforms read from.
    #[serde(default = "default_browser")]
    pub browser: String,
    /// Per-platform overlay sections, keyed by platform name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub platforms: BTreeMap<String, ConfigOverlay>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            browser: default_browser(),
            platforms: BTreeMap::new(),
        }
    }
}

impl GlobalConfig {
    /// Loads the global config from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "global config absent, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let cfg = serde_yaml::from_str(&text)?;
        Ok(cfg)
    }

    /// Saves the global config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(self)?;
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "global config written");
        Ok(())
    }

    /// Returns the overlay section for `platform`, if present.
    pub fn overlay_for(&self, platform: &str) -> Option<&ConfigOverlay> {
        self.platforms.get(platform)
    }

    /// Marks a platform as enabled or disabled for all-platform runs.
    pub fn set_enabled(&mut self, platform: &str, enabled: bool) {
        self.platforms
            .entry(platform.to_string())
            .or_default()
            .enabled = Some(enabled);
    }

    /// Sets the cookie-source browser.
    pub fn set_browser(&mut self, browser: impl Into<String>) {
        self.browser = browser.into();
    }

    /// Sets one key in a platform's overlay section, validating the key.
    pub fn set_platform_key(
        &mut self,
        platform: &str,
        key: &str,
        value: serde_yaml::Value,
    ) -> Result<(), ConfigError> {
        self.platforms
            .entry(platform.to_string())
            .or_default()
            .set_key(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GlobalConfig::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(cfg.browser, "chrome");
        assert!(cfg.platforms.is_empty());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut cfg = GlobalConfig::default();
        cfg.set_browser("firefox");
        cfg.set_enabled("deepseek", false);
        cfg.save_to(&path).unwrap();

        let reloaded = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.browser, "firefox");
        assert_eq!(
            reloaded.overlay_for("deepseek").unwrap().enabled,
            Some(false)
        );
    }

    #[test]
    fn set_platform_key_validates() {
        let mut cfg = GlobalConfig::default();
        cfg.set_platform_key(
            "moonshot",
            "api_key",
            serde_yaml::Value::String("sk-test".into()),
        )
        .unwrap();
        assert_eq!(
            cfg.overlay_for("moonshot").unwrap().api_key.as_deref(),
            Some("sk-test")
        );

        let err = cfg
            .set_platform_key("moonshot", "bogus", serde_yaml::Value::Bool(true))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
