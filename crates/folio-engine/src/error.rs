//! Error types for the script engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned to the host. Authored-content problems are diagnostics,
/// not errors; these cover requests the story cannot answer at all.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The story has no page for the noun.
    #[error("page not found: [{0}]")]
    PageNotFound(String),

    /// The page has no such verb.
    #[error("verb not found: [{noun}:{verb}]")]
    VerbNotFound {
        /// Noun whose page was searched.
        noun: String,
        /// Requested verb.
        verb: String,
    },

    /// Saving or loading the session failed.
    #[error(transparent)]
    Session(#[from] folio_session::SessionError),
}
