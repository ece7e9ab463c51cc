// Lint configuration for this crate
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! llmtally CLI - balance and token quota aggregation across LLM platforms.
//!
//! # Examples
//!
//! ```bash
//! # Balances for every enabled platform
//! llmtally cost
//!
//! # A specific selection, totalled in USD
//! llmtally cost --platform deepseek,moonshot --currency USD
//!
//! # Token packages as markdown
//! llmtally package --format markdown
//!
//! # Platform management
//! llmtally list
//! llmtally enable packycode
//! llmtally config set packycode api_user_id 12345
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, cost, package, platforms, rates};

// ============================================================================
// CLI Definition
// ============================================================================

/// llmtally CLI - LLM platform balance aggregation.
#[derive(Parser)]
#[command(name = "llmtally")]
#[command(about = "Aggregate balances, spend, and token quotas across LLM platforms")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'cost' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Platforms to query, comma-separated (default: all enabled).
    #[arg(long, short, global = true)]
    pub platform: Option<String>,

    /// Output format.
    #[arg(long, short = 'f', default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Target currency for table and total output.
    #[arg(long, short, default_value = "CNY", global = true)]
    pub currency: String,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Config directory to use instead of ~/.llmtally.
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<std::path::PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Query account balances and spend (default).
    #[command(visible_alias = "check")]
    Cost,

    /// Query token packages.
    #[command(visible_alias = "tokens")]
    Package {
        /// Only show packages whose model name contains this substring.
        #[arg(long)]
        model: Option<String>,
    },

    /// List registered platforms and their status.
    #[command(visible_alias = "ls")]
    List,

    /// Enable platforms for default runs.
    Enable {
        /// Platform names, comma-separated, or `all`.
        names: String,
    },

    /// Disable platforms for default runs.
    Disable {
        /// Platform names, comma-separated, or `all`.
        names: String,
    },

    /// View or edit platform configuration.
    Config(config::ConfigArgs),

    /// Show the exchange rate table.
    Rates,

    /// Set the browser whose cookies cookie-auth platforms use.
    SetBrowser {
        /// Browser name (chrome, firefox, safari, ...).
        browser: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Aligned table, converted into the target currency.
    #[default]
    Table,
    /// JSON preserving each platform's own currency.
    Json,
    /// Markdown table preserving each platform's own currency.
    Markdown,
    /// Just the converted total.
    Total,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("llmtally=debug,info")
    } else {
        EnvFilter::new("llmtally=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Cost) | None => cost::run(&cli).await,
        Some(Commands::Package { model }) => package::run(&cli, model.as_deref()).await,
        Some(Commands::List) => platforms::list(&cli),
        Some(Commands::Enable { names }) => platforms::set_enabled(&cli, names, true),
        Some(Commands::Disable { names }) => platforms::set_enabled(&cli, names, false),
        Some(Commands::Config(args)) => config::run(&cli, args),
        Some(Commands::Rates) => rates::run(&cli),
        Some(Commands::SetBrowser { browser }) => config::set_browser(&cli, browser),
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}
