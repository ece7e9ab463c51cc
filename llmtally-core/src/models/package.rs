//! Token package accounting.
//!
//! Two billing modes exist in the wild:
//!
//! - **Pay-per-use**: the backend reports literal counters and
//!   `remaining = total - used` holds.
//! - **Subscription**: quota depreciates with elapsed time regardless of
//!   consumption; remaining tokens are derived from the time window, not
//!   from usage counters.
//!
//! Which mode applies is a per-platform policy, so the constructors here own
//! the math and handlers only pick one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Status & Billing Mode
// ============================================================================

/// Whether a package is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    /// The package is live and consumable.
    Active,
    /// The package is expired, exhausted, or suspended.
    Inactive,
}

/// Discriminator between counter-based and time-depreciation accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    /// `remaining = total - used`, from literal usage counters.
    PayPerUse,
    /// `remaining = total × remaining_days / total_days`, from the
    /// subscription time window.
    Subscription,
}

// ============================================================================
// Token Package
// ============================================================================

/// One token package/plan on one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPackage {
    /// Platform display name.
    pub platform: String,
    /// Model the package applies to, or a platform-wide label.
    pub model: String,
    /// Human-readable package/plan label.
    pub package: String,
    /// Total tokens granted by the package.
    pub total_tokens: f64,
    /// Tokens consumed (or depreciated, in subscription mode).
    pub used_tokens: f64,
    /// Tokens remaining.
    pub remaining_tokens: f64,
    /// Whether the package is live.
    pub status: PackageStatus,
    /// How `remaining_tokens` was derived.
    pub billing: BillingMode,
    /// When the package expires, if the backend reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPackage {
    /// Builds a pay-per-use package from literal counters.
    ///
    /// Negative counters are clamped to zero and `remaining` is recomputed
    /// so the `remaining = total - used` invariant always holds.
    pub fn pay_per_use(
        platform: impl Into<String>,
        model: impl Into<String>,
        package: impl Into<String>,
        total_tokens: f64,
        used_tokens: f64,
        status: PackageStatus,
    ) -> Self {
        let total = total_tokens.max(0.0);
        let used = used_tokens.clamp(0.0, total);
        Self {
            platform: platform.into(),
            model: model.into(),
            package: package.into(),
            total_tokens: total,
            used_tokens: used,
            remaining_tokens: total - used,
            status,
            billing: BillingMode::PayPerUse,
            expires_at: None,
        }
    }

    /// Builds a subscription package whose quota depreciates with time.
    ///
    /// `remaining = total × remaining_days / total_days` where the ratio is
    /// computed on the `started_at..expires_at` window at `now`. A window
    /// that has fully elapsed (or is degenerate) yields zero remaining.
    pub fn subscription(
        platform: impl Into<String>,
        model: impl Into<String>,
        package: impl Into<String>,
        total_tokens: f64,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
        status: PackageStatus,
    ) -> Self {
        let total = total_tokens.max(0.0);
        let window = (expires_at - started_at).num_seconds();
        let left = (expires_at - now).num_seconds();
        let ratio = if window <= 0 || left <= 0 {
            0.0
        } else {
            (left as f64 / window as f64).min(1.0)
        };
        let remaining = total * ratio;
        Self {
            platform: platform.into(),
            model: model.into(),
            package: package.into(),
            total_tokens: total,
            used_tokens: total - remaining,
            remaining_tokens: remaining,
            status,
            billing: BillingMode::Subscription,
            expires_at: Some(expires_at),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn pay_per_use_counters_balance() {
        let pkg = TokenPackage::pay_per_use(
            "DuckCoding",
            "claude-sonnet",
            "Starter",
            1_000_000.0,
            250_000.0,
            PackageStatus::Active,
        );
        assert_eq!(pkg.remaining_tokens, 750_000.0);
        assert_eq!(
            pkg.remaining_tokens,
            pkg.total_tokens - pkg.used_tokens
        );
        assert_eq!(pkg.billing, BillingMode::PayPerUse);
    }

    #[test]
    fn pay_per_use_clamps_overdraw() {
        let pkg = TokenPackage::pay_per_use(
            "DuckCoding",
            "claude-sonnet",
            "Starter",
            100.0,
            250.0,
            PackageStatus::Inactive,
        );
        assert_eq!(pkg.used_tokens, 100.0);
        assert_eq!(pkg.remaining_tokens, 0.0);
    }

    #[test]
    fn subscription_half_elapsed_keeps_half() {
        let pkg = TokenPackage::subscription(
            "88Code",
            "claude",
            "Pro",
            1000.0,
            ts("2025-01-01 00:00:00"),
            ts("2025-01-31 00:00:00"),
            ts("2025-01-16 00:00:00"),
            PackageStatus::Active,
        );
        assert!((pkg.remaining_tokens - 500.0).abs() < 1.0);
        assert_eq!(pkg.billing, BillingMode::Subscription);
    }

    #[test]
    fn subscription_expired_window_is_empty() {
        let pkg = TokenPackage::subscription(
            "88Code",
            "claude",
            "Pro",
            1000.0,
            ts("2025-01-01 00:00:00"),
            ts("2025-01-31 00:00:00"),
            ts("2025-02-10 00:00:00"),
            PackageStatus::Inactive,
        );
        assert_eq!(pkg.remaining_tokens, 0.0);
        assert_eq!(pkg.used_tokens, 1000.0);
    }
}
