//! Directory operation errors
//!
//! These classify why a single bind, search or connect failed. They are
//! logged and counted, then collapsed into an absent result at the
//! authenticator boundary.

use thiserror::Error;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Connection to {server} failed: {reason}")]
    Connect { server: String, reason: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Bind rejected with result code {rc}: {message}")]
    Bind { rc: u32, message: String },

    #[error("Operation timed out")]
    Timeout,

    #[error("Search time limit exceeded")]
    SearchTimeout,

    #[error("Search failed: {0}")]
    Search(String),

    #[error("No matching directory entry")]
    NotFound,

    #[error("A non-empty secret is required for a simple bind")]
    MissingSecret,

    #[error("Session already released")]
    Released,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl DirectoryError {
    /// Stable category used in log fields and metric labels
    pub fn category(&self) -> &'static str {
        match self {
            DirectoryError::Connect { .. } => "connect_failure",
            DirectoryError::InvalidCredentials => "bind_invalid_credentials",
            DirectoryError::Bind { .. } => "bind_failure",
            DirectoryError::Timeout => "timeout",
            DirectoryError::SearchTimeout => "search_timeout",
            DirectoryError::Search(_) => "search_failure",
            DirectoryError::NotFound => "not_found",
            DirectoryError::MissingSecret => "missing_secret",
            DirectoryError::Released => "released",
            DirectoryError::Protocol(_) => "protocol_error",
        }
    }

    /// The server itself misbehaved, as opposed to rejecting the user.
    /// Only these failures may evict a server from rotation.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            DirectoryError::Connect { .. } | DirectoryError::Timeout | DirectoryError::Protocol(_)
        )
    }
}
