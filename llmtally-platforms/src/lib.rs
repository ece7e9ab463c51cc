// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `llmtally` Platforms
//!
//! The handler contract, the per-platform implementations, and the
//! concurrent aggregation orchestrator.
//!
//! Each backend implements [`PlatformHandler`] and registers itself with
//! the [`PlatformRegistry`]. The [`Aggregator`] fans out one bounded task
//! per selected platform, isolates failures into per-platform outcome
//! rows, and returns results in input order.

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod handler;
pub mod http;
pub mod platforms;
pub mod registry;

pub use aggregator::{Aggregator, DEFAULT_CONCURRENCY};
pub use cache::HandlerCache;
pub use error::HandlerError;
pub use handler::PlatformHandler;
pub use http::HttpClient;
pub use registry::{PlatformDescriptor, PlatformRegistry};
