//! Configuration options for the simulator engine.

/// Configuration options for compilation.
///
/// # Example
///
/// ```
/// use cppsim_core::api::CompileOptions;
///
/// let options = CompileOptions { max_nesting_depth: 64 };
/// ```
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Deepest expression nesting the analyzer accepts before giving up on
    /// a subtree with a diagnostic.
    ///
    /// Default: 256
    pub max_nesting_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 256,
        }
    }
}

/// Configuration options for expression execution.
///
/// These options control resource limits of a [`Simulation`](crate::evaluator::Simulation).
///
/// # Example
///
/// ```
/// use cppsim_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_stack_depth: 500,
///     max_steps: Some(10_000),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Maximum number of runtime nodes on the evaluation stack.
    ///
    /// Default: 1000
    pub max_stack_depth: usize,

    /// Maximum number of steps a single simulation may take (if Some).
    ///
    /// Set to `None` for unlimited steps.
    ///
    /// Default: Some(100_000)
    pub max_steps: Option<usize>,

    /// Largest object, in bytes, a single `new` or `new[]` may allocate.
    /// Larger requests crash the simulation.
    ///
    /// Default: 1 MiB
    pub max_allocation_bytes: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_stack_depth: 1000,
            max_steps: Some(100_000),
            max_allocation_bytes: 1 << 20,
        }
    }
}

/// Default options for an [`Engine`](super::Engine).
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Used by `Engine::compile()` and `Engine::compile_in_member()`.
    pub default_compile_options: CompileOptions,

    /// Used by `CompiledExpression::run()` and `CompiledExpression::simulate()`.
    pub default_execution_options: ExecutionOptions,
}
