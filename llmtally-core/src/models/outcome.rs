//! Per-platform query outcomes.
//!
//! Every requested platform produces exactly one outcome: either the
//! normalized payload or an isolated failure summary. Failures never erase
//! the platform's row in the final report.

use serde::{Deserialize, Serialize};

// ============================================================================
// Failure Summary
// ============================================================================

/// Which class of failure occurred, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unknown platform or missing required configuration.
    Config,
    /// Credentials rejected by the backend.
    Auth,
    /// Timeout or connection failure.
    Transport,
    /// Unexpected response shape.
    Parse,
}

impl FailureKind {
    /// Short label for table output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Auth => "auth",
            Self::Transport => "transport",
            Self::Parse => "parse",
        }
    }
}

/// A short human-readable failure cause for one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureSummary {
    /// The failure class.
    pub kind: FailureKind,
    /// One-line cause.
    pub message: String,
}

impl FailureSummary {
    /// Creates a failure summary.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

// ============================================================================
// Platform Outcome
// ============================================================================

/// The outcome of one platform's query: payload or isolated failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformOutcome<T> {
    /// The platform name the query was submitted under.
    pub platform: String,
    /// The payload, or the failure that replaced it.
    pub outcome: Result<T, FailureSummary>,
}

impl<T> PlatformOutcome<T> {
    /// Creates a successful outcome.
    pub fn ok(platform: impl Into<String>, payload: T) -> Self {
        Self {
            platform: platform.into(),
            outcome: Ok(payload),
        }
    }

    /// Creates a failed outcome.
    pub fn failed(platform: impl Into<String>, failure: FailureSummary) -> Self {
        Self {
            platform: platform.into(),
            outcome: Err(failure),
        }
    }

    /// Returns true if the query succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the payload, if any.
    pub fn payload(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }
}
