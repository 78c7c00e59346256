//! Configuration for the script engine.

/// Nesting limit for verbs invoking other verbs.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How deeply `noun:verb` calls may nest before a call is refused.
    pub max_depth: usize,
    /// Whether readings append runtime diagnostics to the produced text.
    pub echo_diagnostics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            echo_diagnostics: false,
        }
    }
}

impl EngineConfig {
    /// Set the nesting limit (at least 1).
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Append runtime diagnostics to readings.
    pub fn with_echo_diagnostics(mut self, echo: bool) -> Self {
        self.echo_diagnostics = echo;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_depth, 64);
        assert!(!cfg.echo_diagnostics);
    }

    #[test]
    fn builder_methods() {
        let cfg = EngineConfig::default()
            .with_max_depth(8)
            .with_echo_diagnostics(true);
        assert_eq!(cfg.max_depth, 8);
        assert!(cfg.echo_diagnostics);
    }

    #[test]
    fn depth_is_at_least_one() {
        assert_eq!(EngineConfig::default().with_max_depth(0).max_depth, 1);
    }
}
