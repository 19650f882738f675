//! The C++ type model.
//!
//! Types are interned by [`TypeManager`]; the [`predicates`] module answers
//! the classification questions the analyzer relies on.

pub mod manager;
pub mod predicates;
mod types;


pub use manager::TypeManager;
pub use predicates::{
    is_cv_convertible, is_derived_pointer, is_reference_compatible, is_reference_related,
    peel_reference, same_type, similar_type,
};
pub use types::{ArithmeticKind, Cv, POINTER_SIZE, Type};
