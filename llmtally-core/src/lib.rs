// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `llmtally` Core
//!
//! Core types for the `llmtally` balance aggregator.
//!
//! This crate provides the domain model shared by all other `llmtally`
//! crates:
//!
//! - Balance and spend reports ([`BalanceReport`], [`Amount`])
//! - Token package accounting ([`TokenPackage`], [`BillingMode`])
//! - Per-platform query outcomes ([`PlatformOutcome`], [`FailureSummary`])
//! - Currency conversion ([`RateTable`], [`convert`])

pub mod currency;
pub mod models;

pub use currency::{convert, RateTable, RATES_ENV_VAR};
pub use models::{
    Amount, BalanceReport, BillingMode, FailureKind, FailureSummary, PackageStatus,
    PlatformOutcome, TokenPackage,
};
