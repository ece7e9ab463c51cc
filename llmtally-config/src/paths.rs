//! Config directory layout.

use std::path::PathBuf;

/// Directory name under the user's home for all llmtally files.
const CONFIG_DIR_NAME: &str = ".llmtally";

/// Returns the llmtally config directory (`~/.llmtally`).
///
/// Falls back to a relative path when the home directory cannot be
/// determined, which only happens in stripped-down environments.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}
