//! Platform registry.
//!
//! Static access to every platform descriptor: the name, the handler
//! constructor, and the handler-declared default configuration. The
//! registry is the single mapping from platform name to implementation.

use std::sync::{Arc, OnceLock};

use llmtally_config::{ConfigError, ResolvedConfig};

use crate::handler::PlatformHandler;
use crate::platforms::anthropic::anthropic_descriptor;
use crate::platforms::code88::code88_descriptor;
use crate::platforms::deepseek::deepseek_descriptor;
use crate::platforms::moonshot::moonshot_descriptor;
use crate::platforms::openai::openai_descriptor;
use crate::platforms::relay::{
    duckcoding_descriptor, packycode_descriptor, yourapi_descriptor,
};
use crate::platforms::siliconflow::siliconflow_descriptor;
use crate::platforms::volcengine::volcengine_descriptor;
use crate::platforms::zhipu::zhipu_descriptor;

// ============================================================================
// Descriptor
// ============================================================================

/// Static description of one platform.
pub struct PlatformDescriptor {
    /// Platform key, lowercase (e.g. `deepseek`).
    pub name: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Whether the handler implements token package queries.
    pub supports_packages: bool,
    /// Builds the handler-declared default configuration.
    pub defaults: fn() -> ResolvedConfig,
    /// Constructs the handler.
    pub build: fn() -> Arc<dyn PlatformHandler>,
}

impl std::fmt::Debug for PlatformDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformDescriptor")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("supports_packages", &self.supports_packages)
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Static storage for all platform descriptors.
static DESCRIPTORS: OnceLock<Vec<PlatformDescriptor>> = OnceLock::new();

/// First-party API platforms, then relay platforms.
fn init_descriptors() -> Vec<PlatformDescriptor> {
    vec![
        // Official provider APIs
        deepseek_descriptor(),
        moonshot_descriptor(),
        siliconflow_descriptor(),
        zhipu_descriptor(),
        openai_descriptor(),
        anthropic_descriptor(),
        volcengine_descriptor(),
        // Relay platforms
        duckcoding_descriptor(),
        packycode_descriptor(),
        yourapi_descriptor(),
        code88_descriptor(),
    ]
}

/// Global registry of all platform descriptors.
pub struct PlatformRegistry;

impl PlatformRegistry {
    /// Returns all platform descriptors.
    pub fn all() -> &'static [PlatformDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Looks up a descriptor by platform name (case-insensitive).
    pub fn get(name: &str) -> Option<&'static PlatformDescriptor> {
        let lowered = name.to_ascii_lowercase();
        Self::all().iter().find(|d| d.name == lowered)
    }

    /// Like [`Self::get`] but with the unknown-platform error.
    pub fn require(name: &str) -> Result<&'static PlatformDescriptor, ConfigError> {
        Self::get(name).ok_or_else(|| ConfigError::UnknownPlatform(name.to_string()))
    }

    /// Returns all registered platform names in registry order.
    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|d| d.name).collect()
    }

    /// Returns the number of registered platforms.
    pub fn count() -> usize {
        Self::all().len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_all_platforms() {
        assert_eq!(PlatformRegistry::count(), 11);
        for name in [
            "deepseek",
            "moonshot",
            "siliconflow",
            "zhipu",
            "openai",
            "anthropic",
            "volcengine",
            "duckcoding",
            "packycode",
            "yourapi",
            "code88",
        ] {
            let desc = PlatformRegistry::get(name);
            assert!(desc.is_some(), "missing platform {name}");
            assert_eq!(desc.unwrap().name, name);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(PlatformRegistry::get("DeepSeek").is_some());
        assert!(matches!(
            PlatformRegistry::require("nope"),
            Err(ConfigError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn defaults_carry_the_platform_name() {
        for desc in PlatformRegistry::all() {
            let cfg = (desc.defaults)();
            assert_eq!(cfg.platform, desc.name);
            assert!(!cfg.endpoint.is_empty(), "{} has no endpoint", desc.name);
        }
    }

    #[test]
    fn every_auth_mode_is_represented() {
        use llmtally_config::AuthMode;
        let modes: Vec<_> = PlatformRegistry::all()
            .iter()
            .map(|d| (d.defaults)().auth)
            .collect();
        for mode in [
            AuthMode::ApiKey,
            AuthMode::BearerToken,
            AuthMode::SdkCredentials,
            AuthMode::Cookie,
            AuthMode::ConsoleToken,
        ] {
            assert!(modes.contains(&mode), "no platform uses {mode}");
        }
    }

    #[test]
    fn relay_platforms_default_disabled() {
        for name in ["duckcoding", "packycode", "yourapi", "code88"] {
            let cfg = (PlatformRegistry::get(name).unwrap().defaults)();
            assert!(!cfg.enabled, "{name} should default disabled");
        }
        let cfg = (PlatformRegistry::get("deepseek").unwrap().defaults)();
        assert!(cfg.enabled);
    }
}
