//! The `list`, `enable`, and `disable` commands.

use anyhow::{bail, Result};
use llmtally_config::GlobalConfig;
use llmtally_platforms::PlatformRegistry;

use crate::Cli;

/// Prints every registered platform with its resolved status.
pub fn list(cli: &Cli) -> Result<()> {
    let resolver = super::resolver(cli)?;

    if cli.format == crate::OutputFormat::Json {
        let mut rows = Vec::new();
        for desc in PlatformRegistry::all() {
            let cfg = resolver.resolve((desc.defaults)())?;
            rows.push(serde_json::json!({
                "name": desc.name,
                "display_name": desc.display_name,
                "enabled": cfg.enabled,
                "auth": cfg.auth.to_string(),
                "packages": desc.supports_packages,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<14} {:<14} {:<10} {:<16} {}",
        "NAME", "PLATFORM", "ENABLED", "AUTH", "PACKAGES"
    );
    for desc in PlatformRegistry::all() {
        let cfg = resolver.resolve((desc.defaults)())?;
        println!(
            "{:<14} {:<14} {:<10} {:<16} {}",
            desc.name,
            desc.display_name,
            if cfg.enabled { "yes" } else { "no" },
            cfg.auth.to_string(),
            if desc.supports_packages { "yes" } else { "-" },
        );
    }
    Ok(())
}

/// Flips the enabled flag for one or more platforms in the global file.
///
/// `names` is a comma-separated list of platform names, or `all`.
pub fn set_enabled(cli: &Cli, names: &str, enabled: bool) -> Result<()> {
    let targets: Vec<&'static str> = if names.eq_ignore_ascii_case("all") {
        PlatformRegistry::names()
    } else {
        names
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|n| PlatformRegistry::require(n).map(|d| d.name))
            .collect::<Result<_, _>>()?
    };
    if targets.is_empty() {
        bail!("no platform names given");
    }

    let path = super::global_config_path(cli);
    let mut global = GlobalConfig::load_from(&path)?;
    for name in &targets {
        global.set_enabled(name, enabled);
    }
    global.save_to(&path)?;

    println!(
        "{} {} ({})",
        if enabled { "Enabled" } else { "Disabled" },
        targets.join(", "),
        path.display()
    );
    Ok(())
}
