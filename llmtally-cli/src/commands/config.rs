//! The `config` and `set-browser` commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use llmtally_config::{independent, GlobalConfig};
use llmtally_platforms::PlatformRegistry;

use crate::Cli;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the resolved configuration for a platform.
    Show {
        /// Platform name.
        name: String,
        /// Show only this key instead of the whole configuration.
        key: Option<String>,
    },
    /// Set a key in a platform's config.
    Set {
        /// Platform name.
        name: String,
        /// Configuration key (e.g. `api_user_id`, `enabled`, `endpoint`).
        key: String,
        /// Value, parsed as YAML (so `true` and `5` keep their types).
        value: String,
        /// Write to the shared global file instead of the platform's
        /// independent file.
        #[arg(long)]
        global: bool,
    },
}

/// Runs a config subcommand.
pub fn run(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show { name, key } => show(cli, name, key.as_deref()),
        ConfigAction::Set {
            name,
            key,
            value,
            global,
        } => set(cli, name, key, value, *global),
    }
}

fn show(cli: &Cli, name: &str, key: Option<&str>) -> Result<()> {
    let desc = PlatformRegistry::require(name)?;
    let resolver = super::resolver(cli)?;
    let mut cfg = resolver.resolve((desc.defaults)())?;

    // Resolved output is for eyes and scripts; never echo secrets
    for secret in [
        &mut cfg.credentials.api_key,
        &mut cfg.credentials.secret_key,
        &mut cfg.credentials.console_token,
        &mut cfg.credentials.cookie,
    ] {
        if secret.is_some() {
            *secret = Some("<set>".to_string());
        }
    }

    if let Some(key) = key {
        let doc = serde_yaml::to_value(&cfg)?;
        let found = doc
            .get(key)
            .or_else(|| doc.get("credentials").and_then(|c| c.get(key)));
        match found {
            Some(value) => println!("{}", serde_yaml::to_string(value)?.trim_end()),
            None => bail!("unknown config key `{key}` for {}", desc.display_name),
        }
        return Ok(());
    }

    println!("{}", serde_yaml::to_string(&cfg)?);
    Ok(())
}

fn set(cli: &Cli, name: &str, key: &str, value: &str, global: bool) -> Result<()> {
    let desc = PlatformRegistry::require(name)?;
    let parsed: serde_yaml::Value = serde_yaml::from_str(value)?;

    let path = if global {
        let path = super::global_config_path(cli);
        let mut cfg = GlobalConfig::load_from(&path)?;
        cfg.set_platform_key(desc.name, key, parsed)?;
        cfg.save_to(&path)?;
        path
    } else {
        let path = super::config_dir(cli).join(format!("{}.yaml", desc.name));
        independent::set_key_at(&path, key, parsed)?;
        path
    };

    println!("Set {key} for {} ({})", desc.display_name, path.display());
    Ok(())
}

/// Sets the cookie-source browser in the global config file.
pub fn set_browser(cli: &Cli, browser: &str) -> Result<()> {
    const KNOWN: [&str; 6] = ["chrome", "firefox", "safari", "edge", "brave", "arc"];
    if !KNOWN.contains(&browser.to_ascii_lowercase().as_str()) {
        bail!("unknown browser `{browser}` (expected one of {KNOWN:?})");
    }

    let path = super::global_config_path(cli);
    let mut cfg = GlobalConfig::load_from(&path)?;
    cfg.set_browser(browser.to_ascii_lowercase());
    cfg.save_to(&path)?;
    println!("Browser set to {browser} ({})", path.display());
    Ok(())
}
