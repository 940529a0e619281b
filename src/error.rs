//! Two-tier error model shared by all hooks

use thiserror::Error;

/// Result alias used throughout the crate
pub type HookResult<T> = Result<T, HookError>;

/// Error raised by a hook's execute or rollback action.
///
/// The host pipeline treats the two tiers differently: a `Failure` is a
/// well-understood, recoverable condition that stops the pipeline and
/// triggers rollback of the steps that already ran, while `Unexpected`
/// wraps a lower-level error whose cause is kept for diagnostics.
#[derive(Debug, Error)]
pub enum HookError {
    /// Recoverable failure with a user-facing message (non-zero exit code,
    /// non-2xx HTTP status, missing required parameter).
    #[error("{0}")]
    Failure(String),

    /// Unexpected lower-level error, wrapped with its original message and
    /// cause.
    #[error("{message}")]
    Unexpected {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HookError {
    /// Build a recoverable failure.
    pub fn failure(message: impl Into<String>) -> Self {
        HookError::Failure(message.into())
    }

    /// Wrap a lower-level error, keeping it as the source.
    pub fn unexpected(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        HookError::Unexpected {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Check if this is the recoverable failure tier.
    pub fn is_failure(&self) -> bool {
        matches!(self, HookError::Failure(_))
    }
}
