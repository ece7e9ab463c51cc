//! Handler error types.

use llmtally_core::FailureKind;
use thiserror::Error;

/// Error type for handler operations.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Configuration resolution failed or a credential is missing.
    #[error(transparent)]
    Config(#[from] llmtally_config::ConfigError),

    /// Credentials rejected by the backend.
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if the backend said.
        retry_after: Option<u64>,
    },

    /// Request exceeded the per-platform timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an unexpected status or body shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The platform does not implement the requested query.
    #[error("{platform} does not support token package queries")]
    Unsupported {
        /// Platform name.
        platform: String,
    },
}

impl HandlerError {
    /// Maps this error into the reporting taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) | Self::Unsupported { .. } => FailureKind::Config,
            Self::AuthRejected(_) => FailureKind::Auth,
            Self::RateLimited { .. } | Self::Timeout(_) => FailureKind::Transport,
            Self::Http(e) if e.is_decode() => FailureKind::Parse,
            Self::Http(_) => FailureKind::Transport,
            Self::InvalidResponse(_) | Self::Json(_) => FailureKind::Parse,
        }
    }

    /// Converts into the failure summary carried by an outcome row.
    pub fn into_summary(self) -> llmtally_core::FailureSummary {
        llmtally_core::FailureSummary::new(self.kind(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mapping() {
        assert_eq!(
            HandlerError::AuthRejected("bad key".into()).kind(),
            FailureKind::Auth
        );
        assert_eq!(HandlerError::Timeout(10).kind(), FailureKind::Transport);
        assert_eq!(
            HandlerError::InvalidResponse("no data field".into()).kind(),
            FailureKind::Parse
        );
        assert_eq!(
            HandlerError::Unsupported {
                platform: "deepseek".into()
            }
            .kind(),
            FailureKind::Config
        );
    }
}
