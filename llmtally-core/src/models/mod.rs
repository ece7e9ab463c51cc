//! Domain models for `llmtally`.
//!
//! ## Submodules
//!
//! - [`balance`] - Balance/spend reporting ([`Amount`], [`BalanceReport`])
//! - [`package`] - Token package accounting ([`TokenPackage`], [`BillingMode`])
//! - [`outcome`] - Per-platform query outcomes ([`PlatformOutcome`])

mod balance;
mod outcome;
mod package;

pub use balance::{Amount, BalanceReport};
pub use outcome::{FailureKind, FailureSummary, PlatformOutcome};
pub use package::{BillingMode, PackageStatus, TokenPackage};
