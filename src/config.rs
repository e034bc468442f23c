//! Rewrite configuration.

/// Configuration for fixpoint rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Maximum number of passes, including the one that confirms the
    /// fixpoint, before rewriting is reported as non-terminating.
    pub max_iterations: usize,
    /// Log the tree shape after every pass.
    pub trace: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            trace: false,
        }
    }
}

impl RewriteConfig {
    /// Set the pass ceiling; at least one pass always runs.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_trace(mut self, enable: bool) -> Self {
        self.trace = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RewriteConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert!(!config.trace);
    }

    #[test]
    fn test_builder() {
        let config = RewriteConfig::default()
            .with_max_iterations(0)
            .with_trace(true);
        assert_eq!(config.max_iterations, 1);
        assert!(config.trace);
        assert_eq!(
            RewriteConfig::default().with_max_iterations(7).max_iterations,
            7
        );
    }
}
