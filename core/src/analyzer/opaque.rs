//! Host-provided expression implementations.
//!
//! An `opaque` AST node names an implementation by id. The analyzer looks
//! the id up in the [`OpaqueRegistry`] handed to it through the
//! [`CompileContext`](super::CompileContext); the construct keeps the
//! implementation and the evaluator calls it when the node is stepped.

use super::construct::ValueCategory;
use crate::String;
use crate::evaluator::{EvalResult, Host, HostError};
use crate::types::{Type, TypeManager};
use alloc::rc::Rc;
use hashbrown::HashMap;

pub trait OpaqueExpression<'a> {
    /// Result type of the expression.
    fn ty(&self, types: &'a TypeManager<'a>) -> &'a Type<'a>;

    fn value_category(&self) -> ValueCategory {
        ValueCategory::Prvalue
    }

    /// Computes the result. `None` is only valid for `void` expressions.
    fn evaluate(&self, host: &mut dyn Host<'a>) -> Result<Option<EvalResult<'a>>, HostError>;
}

/// Opaque implementations by id.
#[derive(Clone, Default)]
pub struct OpaqueRegistry<'a> {
    entries: HashMap<String, Rc<dyn OpaqueExpression<'a> + 'a>>,
}

impl<'a> OpaqueRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `implementation` under `id`, replacing any previous one.
    pub fn register(&mut self, id: &str, implementation: impl OpaqueExpression<'a> + 'a) {
        self.entries.insert(id.into(), Rc::new(implementation));
    }

    pub fn get(&self, id: &str) -> Option<Rc<dyn OpaqueExpression<'a> + 'a>> {
        self.entries.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
