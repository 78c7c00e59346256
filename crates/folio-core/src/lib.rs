//! Core types for Folio: the dynamic value model and the story data model.
//!
//! This crate defines what the story parser produces and what the script
//! engine consumes. It is independent of the parser: a [`Page`] can be
//! assembled programmatically or deserialized from JSON.

/// Block tree nodes stored in a per-page arena.
pub mod block;
/// Error types used throughout the crate.
pub mod error;
/// Pages, verbs and reusable verb templates.
pub mod page;
/// The dynamic value type: an ordered set of text atoms plus one integer.
pub mod properties;

/// Re-export block types.
pub use block::{Block, BlockId};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export page types.
pub use page::{Page, Pattern, Verb};
/// Re-export the value model.
pub use properties::Properties;
