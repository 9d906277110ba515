//! Configuration for change propagation.

/// Limits and tracing options for a model's cells.
///
/// Each model carries its own configuration; a cell always uses the
/// configuration of the model that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// How many times a computed cell may re-enter its own recompute before
    /// propagation is aborted. Convergent cycles settle well below this.
    pub max_recompute_depth: usize,

    /// Maximum nesting of computed setters within one deep-set.
    pub max_setter_depth: usize,

    /// Emit recompute traces at `debug` instead of `trace` level.
    pub trace_propagation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recompute_depth: 32,
            max_setter_depth: 64,
            trace_propagation: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight limits for catching accidental feedback loops early.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_recompute_depth: 8,
            max_setter_depth: 16,
            trace_propagation: false,
        }
    }

    /// Loose limits for deep, intentionally self-stabilizing graphs.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            max_recompute_depth: 256,
            max_setter_depth: 512,
            trace_propagation: false,
        }
    }

    /// Builder method to set the recompute depth limit.
    #[must_use]
    pub fn with_max_recompute_depth(mut self, depth: usize) -> Self {
        self.max_recompute_depth = depth;
        self
    }

    /// Builder method to set the setter depth limit.
    #[must_use]
    pub fn with_max_setter_depth(mut self, depth: usize) -> Self {
        self.max_setter_depth = depth;
        self
    }

    /// Builder method to enable/disable propagation tracing.
    #[must_use]
    pub fn with_trace_propagation(mut self, enabled: bool) -> Self {
        self.trace_propagation = enabled;
        self
    }
}
