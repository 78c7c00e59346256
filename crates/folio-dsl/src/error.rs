use std::path::PathBuf;

/// Alias for `Result<T, DslError>`.
pub type DslResult<T> = Result<T, DslError>;

/// Failures of the story loader that are not authoring problems.
///
/// Authoring problems never surface here; they are recorded as
/// [`Diagnostic`](crate::Diagnostic)s and loading continues.
#[derive(Debug, thiserror::Error)]
pub enum DslError {
    /// The story file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path of the story file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A page with the same noun already exists in the story.
    #[error("duplicate noun: [{0}]")]
    DuplicateNoun(String),
}
