//! The simulator's compilation engine.

use super::{CompileOptions, CompiledExpression, EngineOptions, EnvironmentBuilder, Error};
use crate::analyzer::{CompileContext, Note, OpaqueRegistry, analyze};
use crate::ast::Expr;
use crate::entities::LookupResult;
use crate::scope::{Scope, ScopeStack};
use crate::types::{Type, TypeManager};
use crate::{Vec, format};
use bumpalo::Bump;
use tracing::debug;

/// Compiles expressions against a fixed set of declarations.
///
/// The engine manages:
/// - Type system (TypeManager)
/// - Global declarations (variables, functions, classes) and opaque
///   implementations
/// - Default compile and execution options
///
/// # Lifetimes
///
/// - `'arena`: Lifetime of the arena holding types and entities. Compiled
///   expressions borrow from this arena.
///
/// # Example
///
/// ```ignore
/// use cppsim_core::api::{Engine, EngineOptions};
/// use cppsim_core::ast::build;
/// use cppsim_core::entities::VariableKind;
/// use bumpalo::Bump;
///
/// let arena = Bump::new();
/// let engine = Engine::new(&arena, EngineOptions::default(), |types, env| {
///     env.declare_variable(types.declare_variable("x", types.int(), VariableKind::Global))?;
///     Ok(())
/// })?;
///
/// let expr = engine.compile(&build::binary(ArithmeticOp::Add, build::ident("x"), build::int(1)))?;
/// assert_eq!(expr.ty().to_string(), "int");
/// ```
pub struct Engine<'arena> {
    type_manager: &'arena TypeManager<'arena>,
    scope: ScopeStack<'arena>,
    opaque: OpaqueRegistry<'arena>,
    options: EngineOptions,
}

impl<'arena> Engine<'arena> {
    /// Creates an engine whose declarations are made by `init`.
    ///
    /// The initialization closure receives:
    /// - `types`: The type manager for creating types and entities
    /// - `env`: The environment builder for declaring them
    pub fn new(
        arena: &'arena Bump,
        options: EngineOptions,
        init: impl FnOnce(
            &'arena TypeManager<'arena>,
            &mut EnvironmentBuilder<'arena>,
        ) -> Result<(), Error>,
    ) -> Result<Self, Error> {
        let type_manager = TypeManager::new(arena);

        let mut env_builder = EnvironmentBuilder::new(arena);
        init(type_manager, &mut env_builder)?;
        let (scope, opaque) = env_builder.build();

        Ok(Self {
            type_manager,
            scope,
            opaque,
            options,
        })
    }

    pub fn type_manager(&self) -> &'arena TypeManager<'arena> {
        self.type_manager
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolves a global name the way compiled expressions see it.
    pub fn lookup(&self, name: &str) -> LookupResult<'arena> {
        self.scope.lookup(name)
    }

    /// Compiles `expr` with the engine's default compile options.
    pub fn compile(&self, expr: &Expr) -> Result<CompiledExpression<'arena>, Error> {
        self.compile_with(&self.options.default_compile_options, None, expr)
    }

    /// Compiles `expr` as if it appeared in a member function of
    /// `receiver`'s class, so `this` and unqualified members resolve.
    pub fn compile_in_member(
        &self,
        receiver: &'arena Type<'arena>,
        expr: &Expr,
    ) -> Result<CompiledExpression<'arena>, Error> {
        if !receiver.is_class() {
            return Err(Error::Api(format!(
                "member context needs a class type, got `{}`",
                receiver
            )));
        }
        self.compile_with(&self.options.default_compile_options, Some(receiver), expr)
    }

    /// Compiles `expr` with explicit options.
    ///
    /// Fails with [`Error::Compilation`] when any note in the tree is an
    /// error. Warnings of a successful compilation are kept on the result.
    pub fn compile_with(
        &self,
        options: &CompileOptions,
        receiver: Option<&'arena Type<'arena>>,
        expr: &Expr,
    ) -> Result<CompiledExpression<'arena>, Error> {
        let ctx = CompileContext::new(self.type_manager, &self.scope, &self.opaque, options);
        let ctx = match receiver {
            Some(receiver) => ctx.with_receiver(receiver),
            None => ctx,
        };
        let construct = analyze(&ctx, expr);

        let diagnostics: Vec<_> = construct
            .all_notes()
            .into_iter()
            .map(Note::to_diagnostic)
            .collect();
        if construct.has_errors() {
            debug!(count = diagnostics.len(), "compilation failed");
            return Err(Error::Compilation { diagnostics });
        }

        Ok(CompiledExpression::new(
            construct,
            self.type_manager,
            diagnostics,
            self.options.default_execution_options.clone(),
        ))
    }
}
