// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `llmtally` Configuration
//!
//! Layered per-platform configuration resolution.
//!
//! Settings for each platform are merged from four layers, lowest to
//! highest precedence:
//!
//! 1. Handler-declared defaults (the base [`ResolvedConfig`])
//! 2. The global config file (`~/.llmtally/config.yaml`)
//! 3. The platform's independent config file (`~/.llmtally/<name>.yaml`)
//! 4. Environment variables (`<PLATFORM>_API_KEY` and friends)
//!
//! Each layer is a partial [`ConfigOverlay`]: later layers overwrite only
//! the keys they define. The resolved value is immutable; concurrent
//! readers share it freely.

pub mod env;
pub mod error;
pub mod global;
pub mod independent;
pub mod overlay;
pub mod paths;
pub mod resolver;

pub use env::env_overlay;
pub use error::ConfigError;
pub use global::GlobalConfig;
pub use overlay::{AuthMode, ConfigOverlay, Credentials, HttpMethod, ResolvedConfig};
pub use resolver::ConfigResolver;
