//! Environment builder for declaring the names expressions can see.

use crate::analyzer::{OpaqueExpression, OpaqueRegistry};
use crate::entities::{ClassDef, FunctionEntity, VariableEntity};
use crate::scope::{DeclarationError, ScopeStack};
use bumpalo::Bump;

/// Builder for the global declarations of an [`Engine`](super::Engine).
///
/// Entities are created with the engine's
/// [`TypeManager`](crate::types::TypeManager) and declared here. Function
/// names may be declared more than once to form an overload set; any other
/// redeclaration is an error.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new(&arena, EngineOptions::default(), |types, env| {
///     let x = types.declare_variable("x", types.int(), VariableKind::Global);
///     env.declare_variable(x)?;
///     Ok(())
/// })?;
/// ```
pub struct EnvironmentBuilder<'arena> {
    scope: ScopeStack<'arena>,
    opaque: OpaqueRegistry<'arena>,
}

impl<'arena> EnvironmentBuilder<'arena> {
    pub(crate) fn new(arena: &'arena Bump) -> Self {
        Self {
            scope: ScopeStack::new(arena),
            opaque: OpaqueRegistry::new(),
        }
    }

    pub fn declare_variable(
        &mut self,
        variable: &'arena VariableEntity<'arena>,
    ) -> Result<(), DeclarationError> {
        self.scope.declare_variable(variable)
    }

    /// Adds `function` to the overload set of its name.
    pub fn declare_function(
        &mut self,
        function: &'arena FunctionEntity<'arena>,
    ) -> Result<(), DeclarationError> {
        self.scope.declare_function(function)
    }

    pub fn declare_class(
        &mut self,
        class: &'arena ClassDef<'arena>,
    ) -> Result<(), DeclarationError> {
        self.scope.declare_class(class)
    }

    /// Registers the implementation behind `opaque` nodes named `id`.
    pub fn register_opaque(
        &mut self,
        id: &str,
        implementation: impl OpaqueExpression<'arena> + 'arena,
    ) {
        self.opaque.register(id, implementation);
    }

    pub(crate) fn build(self) -> (ScopeStack<'arena>, OpaqueRegistry<'arena>) {
        (self.scope, self.opaque)
    }
}
