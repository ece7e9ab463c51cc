//! CLI command implementations.

pub mod config;
pub mod cost;
pub mod package;
pub mod platforms;
pub mod rates;

use std::path::PathBuf;

use anyhow::Result;
use llmtally_config::{paths, ConfigResolver};
use llmtally_platforms::Aggregator;

use crate::Cli;

/// The config directory: `--config-dir` or the default `~/.llmtally`.
pub fn config_dir(cli: &Cli) -> PathBuf {
    cli.config_dir
        .clone()
        .unwrap_or_else(paths::config_dir)
}

/// Path of the global config file inside the active config directory.
pub fn global_config_path(cli: &Cli) -> PathBuf {
    config_dir(cli).join("config.yaml")
}

/// Loads the config resolver rooted at the active config directory.
pub fn resolver(cli: &Cli) -> Result<ConfigResolver> {
    Ok(ConfigResolver::with_dir(config_dir(cli))?)
}

/// Builds the aggregator from the on-disk configuration.
pub fn aggregator(cli: &Cli) -> Result<Aggregator> {
    Ok(Aggregator::new(resolver(cli)?)?)
}

/// Splits the `--platform a,b,c` selection, if given.
pub fn selection(cli: &Cli) -> Option<Vec<String>> {
    cli.platform.as_ref().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
