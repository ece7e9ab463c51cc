//! Layer merging.

use std::path::PathBuf;

use tracing::debug;

use crate::env::env_overlay;
use crate::error::ConfigError;
use crate::global::GlobalConfig;
use crate::independent;
use crate::overlay::ResolvedConfig;
use crate::paths;

/// Resolves per-platform configuration by stacking the four layers.
///
/// The resolver owns a snapshot of the global file; independent files and
/// the environment are read at resolve time so each invocation sees the
/// current state.
#[derive(Debug)]
pub struct ConfigResolver {
    global: GlobalConfig,
    config_dir: PathBuf,
}

impl ConfigResolver {
    /// Loads the resolver from the default config directory.
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = paths::config_dir();
        let global = GlobalConfig::load_from(&config_dir.join("config.yaml"))?;
        Ok(Self { global, config_dir })
    }

    /// Builds a resolver rooted at an explicit directory.
    pub fn with_dir(config_dir: PathBuf) -> Result<Self, ConfigError> {
        let global = GlobalConfig::load_from(&config_dir.join("config.yaml"))?;
        Ok(Self { global, config_dir })
    }

    /// The cookie-source browser from the global file.
    pub fn browser(&self) -> &str {
        &self.global.browser
    }

    /// The loaded global config.
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    /// Applies the global, independent, and environment layers over `base`.
    ///
    /// `base` carries the handler-declared defaults; the caller obtains it
    /// from the platform registry.
    pub fn resolve(&self, mut base: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
        let platform = base.platform.clone();

        if let Some(overlay) = self.global.overlay_for(&platform) {
            overlay.apply(&mut base);
        }

        let independent_path = self.config_dir.join(format!("{platform}.yaml"));
        if let Some(overlay) = independent::load_from(&independent_path)? {
            overlay.apply(&mut base);
        }

        env_overlay(&platform, base.api_key_env.as_deref()).apply(&mut base);

        debug!(
            platform = %platform,
            enabled = base.enabled,
            auth = %base.auth,
            "configuration resolved"
        );
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::AuthMode;

    fn base(platform: &str) -> ResolvedConfig {
        ResolvedConfig::new(
            platform,
            "Test Platform",
            "https://api.example.com/balance",
            AuthMode::BearerToken,
        )
    }

    #[test]
    fn layers_stack_in_precedence_order() {
        let dir = tempfile::tempdir().unwrap();

        // Global layer: disable + a key
        std::fs::write(
            dir.path().join("config.yaml"),
            "platforms:\n  llmtally-t-prec:\n    enabled: false\n    api_key: \"from-global\"\n",
        )
        .unwrap();
        // Independent layer: re-enable, no key
        std::fs::write(
            dir.path().join("llmtally-t-prec.yaml"),
            "enabled: true\n",
        )
        .unwrap();
        // Env layer: key only
        std::env::set_var("LLMTALLY_T_PREC_API_KEY", "from-env");

        let resolver = ConfigResolver::with_dir(dir.path().to_path_buf()).unwrap();
        let resolved = resolver.resolve(base("llmtally-t-prec")).unwrap();

        // Independent outranks global; env outranks both
        assert!(resolved.enabled);
        assert_eq!(resolved.credentials.api_key.as_deref(), Some("from-env"));

        // With the env var gone the global key shows through
        std::env::remove_var("LLMTALLY_T_PREC_API_KEY");
        let resolved = resolver.resolve(base("llmtally-t-prec")).unwrap();
        assert_eq!(resolved.credentials.api_key.as_deref(), Some("from-global"));
    }

    #[test]
    fn defaults_survive_with_no_layers() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::with_dir(dir.path().to_path_buf()).unwrap();
        let resolved = resolver.resolve(base("llmtally-t-defaults")).unwrap();
        assert!(resolved.enabled);
        assert_eq!(resolved.timeout_secs, crate::overlay::DEFAULT_TIMEOUT_SECS);
        assert_eq!(resolver.browser(), "chrome");
    }
}
