//! Error types for task synchronization.
//!
//! The taxonomy follows the three failure classes the client distinguishes:
//! validation failures caught before any round trip, operations attempted
//! before the session is ready, and remote call failures.

use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the task client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A task was submitted with an empty (or whitespace-only) title.
    ///
    /// Detected client-side; no remote call is attempted.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A display name was submitted empty.
    ///
    /// Detected client-side; no remote call is attempted.
    #[error("display name must not be empty")]
    EmptyDisplayName,

    /// A mutation was attempted before the session was ready.
    ///
    /// Queries in this state report "no data yet" instead; only mutations
    /// fail fast.
    #[error("task store not available")]
    Unavailable,

    /// Sign-in through the identity provider failed.
    #[error("sign-in failed: {0}")]
    SignIn(String),

    /// The remote store rejected a call or could not be reached.
    ///
    /// Cached data from a prior success is retained; the caller decides
    /// whether to retry.
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Create a store error from any displayable cause.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Whether this error was raised before any remote round trip.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyTitle | Self::EmptyDisplayName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_classified() {
        assert!(Error::EmptyTitle.is_validation());
        assert!(Error::EmptyDisplayName.is_validation());
        assert!(!Error::Unavailable.is_validation());
        assert!(!Error::store("boom").is_validation());
    }

    #[test]
    fn store_error_preserves_message() {
        assert_eq!(Error::store("timeout").to_string(), "store error: timeout");
    }
}
