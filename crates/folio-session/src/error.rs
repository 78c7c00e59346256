//! Error types for session persistence.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while reading or writing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session file could not be read or written.
    #[error("session i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The session file does not follow the expected layout.
    #[error("malformed session file at line {line}: {message}")]
    Format {
        /// 1-based line number where parsing stopped.
        line: usize,
        /// What was expected.
        message: String,
    },
}
