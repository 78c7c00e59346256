use crate::block::BlockId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when building values or pages.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An atom marked with `#` did not hold a valid integer.
    #[error("invalid integer literal: \"{0}\"")]
    InvalidInteger(String),

    /// A block id does not address a block of this page.
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    /// A verb with the same name is already declared on the page.
    #[error("verb already declared: \"{0}\"")]
    DuplicateVerb(String),
}
