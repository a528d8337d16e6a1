//! Options shared by the legality and lowering passes.

/// Default nesting limit for both passes.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 384;

/// Tunables for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Nesting depth at which a walk cancels instead of recursing further.
    pub max_recursion_depth: usize,
    /// Report `x = x` as a warning.
    pub warn_on_self_assignment: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            warn_on_self_assignment: true,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_self_assignment_warning(mut self, enabled: bool) -> Self {
        self.warn_on_self_assignment = enabled;
        self
    }
}
