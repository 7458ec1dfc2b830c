//! Error types for catalog search.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during catalog search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was missing or blank; the provider was not called.
    #[error("Search query is empty")]
    EmptyQuery,

    /// Search provider failed or is unavailable.
    #[error("Search provider failed: {reason}")]
    ProviderFailed {
        /// The reason for the provider failure
        reason: String,
    },

    /// Provider output could not be parsed.
    #[error("Parse error: {reason}")]
    ParseError {
        /// The reason for the parse error
        reason: String,
    },

    /// Provider did not answer in time.
    #[error("Search timed out after {timeout:?}")]
    Timeout {
        /// The elapsed deadline
        timeout: Duration,
    },
}

impl SearchError {
    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::EmptyQuery)
    }
}
