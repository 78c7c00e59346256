//! Play-through state for Folio stories.
//!
//! A [`Session`] keeps the player's value overrides and active assets, and
//! records every action in a [`History`] so play can step backwards and
//! forwards, branch from the past, and be saved to a line-oriented file.

/// Session configuration.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// Append-only history logs.
pub mod history;
/// Session file reading and writing.
pub mod persist;
/// The session itself.
pub mod session;
/// Points in time across the history logs.
pub mod snapshot;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use history::History;
pub use session::Session;
pub use snapshot::Snapshot;
