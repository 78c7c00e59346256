//! Configuration for a play-through session.

/// Name given to sessions created without one.
pub const DEFAULT_SESSION_NAME: &str = "untitled";

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Title written as the first line of the session file.
    pub name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Set the session name. Line breaks are folded into spaces so the name
    /// stays a single line in the session file.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into().replace(['\r', '\n'], " ");
        self
    }
}
