//! Runtime scalar values.

mod value;

#[cfg(test)]
mod value_test;

pub use value::{RawValue, Value};
