//! Compilation of parsed expressions into typed construct trees.

mod access;
#[allow(clippy::module_inception)]
mod analyzer;
pub mod construct;
mod context;
pub mod conversions;
pub mod notes;
pub mod opaque;
mod operators;
pub mod overloads;

#[cfg(test)]
mod conversions_test;

pub use analyzer::analyze;
pub use construct::{Construct, ConstructKind, ConversionKind, MagicFunction, ValueCategory};
pub use context::CompileContext;
pub use conversions::{ConversionOptions, is_convertible};
pub use notes::{Note, NoteKind, RelatedNote};
pub use opaque::{OpaqueExpression, OpaqueRegistry};
pub use overloads::{OperatorSelection, OverloadResult, resolve_overloads};
