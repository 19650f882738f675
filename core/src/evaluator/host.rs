//! The external object model a simulation runs against.
//!
//! The evaluator never owns objects. Variables, heap allocations, string
//! literals, standard streams and function bodies all live in the [`Host`];
//! runtime nodes only hold [`ObjectRef`] handles and scalar [`Value`]s.
//! Every read and write happens synchronously inside a single step.

use crate::entities::{ClassDef, FunctionEntity, VariableEntity};
use crate::types::Type;
use crate::values::Value;
use crate::{String, Vec};
use thiserror::Error;

/// Handle to an object owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u32);

/// Result of evaluating a runtime node.
#[derive(Debug, Clone, Copy)]
pub enum EvalResult<'a> {
    /// A prvalue of atomic type.
    Value(Value<'a>),
    /// An lvalue, or a class-typed prvalue living in a temporary object.
    Object(ObjectRef),
    /// A function designator, with the receiver for member functions.
    Function {
        function: &'a FunctionEntity<'a>,
        receiver: Option<ObjectRef>,
    },
}

impl<'a> EvalResult<'a> {
    pub fn as_value(&self) -> Option<Value<'a>> {
        match self {
            EvalResult::Value(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            EvalResult::Object(object) => Some(*object),
            _ => None,
        }
    }
}

/// How long an object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Static,
    Automatic,
    /// Created by `new`.
    Dynamic,
    Temporary,
}

/// Addresses an array pointer may legally hold: from the first element up
/// to one past the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayBounds {
    pub min: i64,
    pub one_past: i64,
    /// The array object itself.
    pub array: ObjectRef,
}

impl ArrayBounds {
    /// Whether `address` lies in `[min, one_past]`.
    pub fn contains(&self, address: i64) -> bool {
        (self.min..=self.one_past).contains(&address)
    }

    /// Whether `address` names an element (excludes one-past).
    pub fn contains_element(&self, address: i64) -> bool {
        (self.min..self.one_past).contains(&address)
    }
}

/// Host-side failures. These are protocol violations between the
/// evaluator and the host, not C++ runtime events.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectRef),

    #[error("variable `{0}` has no storage")]
    UnboundVariable(String),

    #[error("`{class}` has no member `{member}`")]
    NoSuchMember { class: String, member: String },

    #[error("function `{0}` has no implementation")]
    NoImplementation(String),

    #[error("cannot allocate an object of type `{0}`")]
    Allocation(String),

    #[error("{0}")]
    Other(String),
}

/// Memory, I/O and function invocation for a simulation.
///
/// All addresses are byte addresses; `0` is the null pointer.
pub trait Host<'a> {
    /// The object of the pointer's pointee type at the pointer's address,
    /// alive or not. `None` if nothing of that type was ever there.
    fn dereference(&mut self, pointer: &Value<'a>) -> Option<ObjectRef>;

    /// Current value of an atomic object. Uninitialized objects yield an
    /// invalid value.
    fn read(&self, object: ObjectRef) -> Result<Value<'a>, HostError>;

    fn write(&mut self, object: ObjectRef, value: Value<'a>) -> Result<(), HostError>;

    /// Address of an object.
    fn address_of(&self, object: ObjectRef) -> Result<i64, HostError>;

    fn object_type(&self, object: ObjectRef) -> Result<&'a Type<'a>, HostError>;

    /// Named member subobject of a class object.
    fn member_object(&mut self, object: ObjectRef, member: &str) -> Result<ObjectRef, HostError>;

    /// The base class subobject of type `base` within a class object.
    fn base_subobject(&self, object: ObjectRef, base: &ClassDef<'a>)
    -> Result<ObjectRef, HostError>;

    /// `index`th element of an array object.
    fn element_object(&mut self, array: ObjectRef, index: usize) -> Result<ObjectRef, HostError>;

    /// The object a variable names.
    fn variable_object(&mut self, variable: &'a VariableEntity<'a>) -> Result<ObjectRef, HostError>;

    /// Bounds of the array whose elements `pointer` points into or one past,
    /// if it points into one.
    fn array_bounds(&self, pointer: &Value<'a>) -> Option<ArrayBounds>;

    /// The outermost object starting at `address`, if any.
    fn complete_object_at(&self, address: i64) -> Option<ObjectRef>;

    fn storage(&self, object: ObjectRef) -> Result<Storage, HostError>;

    fn is_alive(&self, object: ObjectRef) -> bool;

    /// Creates an uninitialized object with dynamic storage.
    fn allocate(&mut self, ty: &'a Type<'a>) -> Result<ObjectRef, HostError>;

    /// Ends the lifetime of a dynamic object.
    fn delete_object(&mut self, object: ObjectRef) -> Result<(), HostError>;

    /// The static `char` array holding `text` followed by a NUL.
    fn string_literal(&mut self, text: &str, ty: &'a Type<'a>) -> Result<ObjectRef, HostError>;

    /// Runs `function`. Returns `None` for `void` functions.
    fn call_function(
        &mut self,
        function: &'a FunctionEntity<'a>,
        receiver: Option<ObjectRef>,
        args: &[EvalResult<'a>],
    ) -> Result<Option<EvalResult<'a>>, HostError>;

    /// Appends text to standard output.
    fn write_output(&mut self, text: &str);

    /// Appends text to standard input.
    fn provide_input(&mut self, text: &str);

    /// Whether `extract_input` could make progress without blocking.
    fn input_available(&self) -> bool;

    /// Extracts one value of type `ty` from standard input. `None` when the
    /// input does not parse, which puts the stream in a failed state.
    fn extract_input(&mut self, ty: &'a Type<'a>) -> Option<Value<'a>>;

    /// Whether the stream object is in a failed state.
    fn stream_failed(&self, stream: ObjectRef) -> bool;

    /// Object `this` points to in the function being simulated.
    fn this_object(&self) -> Option<ObjectRef> {
        None
    }
}

/// Reads the NUL-terminated string stored in a `char` array object.
pub(crate) fn read_c_string<'a>(
    host: &mut dyn Host<'a>,
    array: ObjectRef,
) -> Result<String, HostError> {
    let len = match host.object_type(array)? {
        Type::BoundedArray { len, .. } => *len,
        _ => return Err(HostError::Other("not a character array".into())),
    };
    let mut bytes = Vec::with_capacity(len);
    for index in 0..len {
        let elem = host.element_object(array, index)?;
        let value = host.read(elem)?;
        let byte = value.as_i64() as u8;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    Ok(bytes.iter().map(|&b| b as char).collect())
}
