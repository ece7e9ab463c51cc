//! Per-platform independent config files.
//!
//! Each platform may have its own flat YAML file at
//! `~/.llmtally/<name>.yaml`. The file body is a single [`ConfigOverlay`]
//! mapping; it outranks the platform's section in the global file.

use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::overlay::ConfigOverlay;

/// Loads an independent config file from `path`.
///
/// Returns `None` when the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<ConfigOverlay>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    let overlay = serde_yaml::from_str(&text)?;
    debug!(path = %path.display(), "independent config loaded");
    Ok(Some(overlay))
}

/// Sets one key in the independent file at `path`, creating it if absent.
pub fn set_key_at(path: &Path, key: &str, value: serde_yaml::Value) -> Result<(), ConfigError> {
    let mut overlay = load_from(path)?.unwrap_or_default();
    overlay.set_key(key, value)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(&overlay)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir.path().join("deepseek.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn set_key_creates_and_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zhipu.yaml");

        set_key_at(&path, "cookie", serde_yaml::Value::String("sid=abc".into())).unwrap();
        set_key_at(&path, "enabled", serde_yaml::Value::Bool(true)).unwrap();

        let overlay = load_from(&path).unwrap().unwrap();
        assert_eq!(overlay.cookie.as_deref(), Some("sid=abc"));
        assert_eq!(overlay.enabled, Some(true));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, ": : :\n").unwrap();
        assert!(matches!(
            load_from(&path).unwrap_err(),
            ConfigError::Yaml(_)
        ));
    }
}
