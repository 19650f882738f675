use super::opaque::OpaqueRegistry;
use crate::api::CompileOptions;
use crate::scope::Scope;
use crate::types::{Type, TypeManager};

/// Everything the analyzer reads while compiling one expression.
///
/// `'a` is the arena holding types and entities; `'s` borrows the host's
/// scope, registry and options for the duration of the analysis.
#[derive(Clone, Copy)]
pub struct CompileContext<'a, 's> {
    pub types: &'a TypeManager<'a>,
    pub scope: &'s dyn Scope<'a>,
    /// Class type (with the member function's qualifiers) of `*this`, when
    /// compiling inside a member function.
    pub receiver: Option<&'a Type<'a>>,
    pub opaque: &'s OpaqueRegistry<'a>,
    pub options: &'s CompileOptions,
}

impl<'a, 's> CompileContext<'a, 's> {
    pub fn new(
        types: &'a TypeManager<'a>,
        scope: &'s dyn Scope<'a>,
        opaque: &'s OpaqueRegistry<'a>,
        options: &'s CompileOptions,
    ) -> Self {
        Self {
            types,
            scope,
            receiver: None,
            opaque,
            options,
        }
    }

    /// Context for the body of a member function of `receiver`'s class.
    pub fn with_receiver(self, receiver: &'a Type<'a>) -> Self {
        debug_assert!(receiver.is_class());
        Self {
            receiver: Some(receiver),
            ..self
        }
    }
}
