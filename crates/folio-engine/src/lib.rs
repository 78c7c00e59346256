//! Script engine for Folio stories.
//!
//! Evaluates block expressions against a [`Session`](folio_session::Session),
//! walks verb block trees, and dispatches built-in functions. Anything the
//! story asks of the outside world goes through the [`Book`] trait.
//!
//! ```no_run
//! use folio_engine::{Engine, EngineConfig, NullBook};
//!
//! let loaded = folio_dsl::load_story(r#"[apple=red][:eat]?apple=red{"Crunch."}"#);
//! let mut engine = Engine::new(loaded.story, EngineConfig::default());
//! let reading = engine.act("apple", "eat", &mut NullBook).unwrap();
//! assert_eq!(reading.text, "Crunch.");
//! ```

/// Callbacks into the host application.
pub mod book;
/// Engine configuration.
pub mod config;
mod context;
/// Host-facing entry points.
pub mod engine;
/// Error types for the engine.
pub mod error;
mod eval;
mod executor;
/// The built-in function catalog.
pub mod functions;

pub use book::{Book, NullBook};
pub use config::EngineConfig;
pub use engine::{Engine, Reading};
pub use error::{EngineError, EngineResult};
pub use functions::Function;
