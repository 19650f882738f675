//! A self-contained [`Host`] for embedders and tests.
//!
//! Memory is a flat, byte-addressed space handed out in increasing order
//! starting at `0x1000`, so addresses are never reused and a dangling
//! pointer always finds its dead object again. Every object is tracked
//! individually: arrays own one subobject per element and classes one per
//! base and member, laid out contiguously.
//!
//! Function bodies are native closures registered per [`FunctionEntity`].
//! Destructors without a registered body do nothing.

use super::host::{ArrayBounds, EvalResult, Host, HostError, ObjectRef, Storage};
use crate::entities::{ClassDef, FunctionEntity, VariableEntity};
use crate::types::{Type, TypeManager, similar_type};
use crate::values::{RawValue, Value};
use crate::{String, ToString, Vec};
use alloc::rc::Rc;
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::trace;

/// Body of a function simulated by [`SimpleHost`]. Receives the receiver
/// object for member functions and the evaluated arguments.
pub type NativeFunction<'a> =
    Rc<dyn Fn(Option<ObjectRef>, &[EvalResult<'a>]) -> CallResult<'a> + 'a>;

/// What a [`NativeFunction`] returns.
pub type CallResult<'a> = Result<Option<EvalResult<'a>>, HostError>;

const FIRST_ADDRESS: i64 = 0x1000;
const ALIGNMENT: i64 = 8;
const DEFAULT_ALLOCATION_LIMIT: usize = 16 << 20;

#[derive(Debug)]
struct ObjectData<'a> {
    ty: &'a Type<'a>,
    address: i64,
    storage: Storage,
    alive: bool,
    value: Option<Value<'a>>,
    parent: Option<ObjectRef>,
    /// Array elements in order, or base subobjects (unnamed) followed by
    /// members (named).
    children: Vec<(Option<&'a str>, ObjectRef)>,
}

pub struct SimpleHost<'a> {
    types: &'a TypeManager<'a>,
    objects: Vec<ObjectData<'a>>,
    by_address: HashMap<i64, SmallVec<[ObjectRef; 4]>>,
    variables: HashMap<*const VariableEntity<'a>, ObjectRef>,
    functions: HashMap<*const FunctionEntity<'a>, NativeFunction<'a>>,
    literals: HashMap<String, ObjectRef>,
    next_address: i64,
    this_object: Option<ObjectRef>,
    output: String,
    input: String,
    input_cursor: usize,
    input_failed: bool,
    allocation_limit: usize,
}

impl<'a> SimpleHost<'a> {
    pub fn new(types: &'a TypeManager<'a>) -> Self {
        SimpleHost {
            types,
            objects: Vec::new(),
            by_address: HashMap::new(),
            variables: HashMap::new(),
            functions: HashMap::new(),
            literals: HashMap::new(),
            next_address: FIRST_ADDRESS,
            this_object: None,
            output: String::new(),
            input: String::new(),
            input_cursor: 0,
            input_failed: false,
            allocation_limit: DEFAULT_ALLOCATION_LIMIT,
        }
    }

    /// Caps the size in bytes of a single dynamic allocation (16 MiB by
    /// default). Larger requests fail with [`HostError::Allocation`].
    pub fn with_allocation_limit(mut self, bytes: usize) -> Self {
        self.allocation_limit = bytes;
        self
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Creates static storage for `variable`. Rebinding replaces the object.
    pub fn bind_variable(&mut self, variable: &'a VariableEntity<'a>) -> ObjectRef {
        let object = self.create(variable.ty, Storage::Static, None);
        trace!(name = variable.name, ?object, "bound variable");
        self.variables.insert(variable as *const _, object);
        object
    }

    /// Binds `variable` and initializes it with `value`.
    pub fn bind_variable_with(
        &mut self,
        variable: &'a VariableEntity<'a>,
        value: Value<'a>,
    ) -> ObjectRef {
        let object = self.bind_variable(variable);
        self.objects[object.0 as usize].value = Some(value);
        object
    }

    /// Registers the body of `function`.
    pub fn define_function(
        &mut self,
        function: &'a FunctionEntity<'a>,
        body: impl Fn(Option<ObjectRef>, &[EvalResult<'a>]) -> CallResult<'a> + 'a,
    ) {
        self.functions.insert(function as *const _, Rc::new(body));
    }

    /// Sets the object `this` refers to.
    pub fn set_this_object(&mut self, object: Option<ObjectRef>) {
        self.this_object = object;
    }

    /// Everything written to standard output so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Pointer to `object`, typed as a pointer to its type.
    pub fn pointer_to(&self, object: ObjectRef) -> Result<Value<'a>, HostError> {
        let data = self.data(object)?;
        Ok(Value::pointer(self.types.pointer(data.ty), data.address))
    }

    /// Number of objects with dynamic storage that are still alive.
    pub fn live_allocations(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| o.parent.is_none() && o.storage == Storage::Dynamic && o.alive)
            .count()
    }

    // ========================================================================
    // Object bookkeeping
    // ========================================================================

    fn data(&self, object: ObjectRef) -> Result<&ObjectData<'a>, HostError> {
        self.objects
            .get(object.0 as usize)
            .ok_or(HostError::UnknownObject(object))
    }

    fn data_mut(&mut self, object: ObjectRef) -> Result<&mut ObjectData<'a>, HostError> {
        self.objects
            .get_mut(object.0 as usize)
            .ok_or(HostError::UnknownObject(object))
    }

    /// Reserves address space for a new complete object of `ty`.
    fn create(
        &mut self,
        ty: &'a Type<'a>,
        storage: Storage,
        parent: Option<ObjectRef>,
    ) -> ObjectRef {
        let size = ty.size().unwrap_or(0) as i64;
        let address = self.next_address;
        self.next_address += (size.max(1) + ALIGNMENT - 1) / ALIGNMENT * ALIGNMENT;
        self.create_at(ty, storage, parent, address)
    }

    fn create_at(
        &mut self,
        ty: &'a Type<'a>,
        storage: Storage,
        parent: Option<ObjectRef>,
        address: i64,
    ) -> ObjectRef {
        let id = ObjectRef(self.objects.len() as u32);
        self.objects.push(ObjectData {
            ty,
            address,
            storage,
            alive: true,
            value: None,
            parent,
            children: Vec::new(),
        });
        self.by_address.entry(address).or_default().push(id);

        let mut children = Vec::new();
        match ty {
            Type::BoundedArray { elem, len } => {
                let elem_size = elem.size().unwrap_or(0) as i64;
                for i in 0..*len {
                    let elem_address = address + i as i64 * elem_size;
                    let child = self.create_at(elem, storage, Some(id), elem_address);
                    children.push((None, child));
                }
            }
            Type::Class { class, .. } => {
                let mut offset = address;
                for base in class.bases {
                    let base_ty = self.types.class(base);
                    let child = self.create_at(base_ty, storage, Some(id), offset);
                    offset += base_ty.size().unwrap_or(0) as i64;
                    children.push((None, child));
                }
                if let Some(body) = class.body() {
                    for member in body.members {
                        let child = self.create_at(member.ty, storage, Some(id), offset);
                        offset += member.ty.size().unwrap_or(0) as i64;
                        children.push((Some(member.name), child));
                    }
                }
            }
            _ => {}
        }
        self.objects[id.0 as usize].children = children;
        id
    }

    fn set_alive(&mut self, object: ObjectRef, alive: bool) -> Result<(), HostError> {
        let data = self.data_mut(object)?;
        data.alive = alive;
        let children: SmallVec<[ObjectRef; 8]> = data.children.iter().map(|(_, c)| *c).collect();
        for child in children {
            self.set_alive(child, alive)?;
        }
        Ok(())
    }

    fn find_member(&self, object: ObjectRef, member: &str) -> Option<ObjectRef> {
        let data = self.objects.get(object.0 as usize)?;
        for (name, child) in &data.children {
            if *name == Some(member) {
                return Some(*child);
            }
        }
        data.children
            .iter()
            .filter(|(name, _)| name.is_none())
            .find_map(|(_, base)| self.find_member(*base, member))
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.input_cursor..];
        self.input_cursor += rest.len() - rest.trim_start().len();
    }

    /// Longest prefix of the remaining input whose chars satisfy `accept`.
    fn take_while(&mut self, accept: impl Fn(usize, char) -> bool) -> &str {
        let start = self.input_cursor;
        let len = self.input[start..]
            .char_indices()
            .find(|&(i, c)| !accept(i, c))
            .map_or(self.input.len() - start, |(i, _)| i);
        self.input_cursor += len;
        &self.input[start..start + len]
    }
}

impl<'a> Host<'a> for SimpleHost<'a> {
    fn dereference(&mut self, pointer: &Value<'a>) -> Option<ObjectRef> {
        let pointee = pointer.ty().pointee()?;
        let candidates = self.by_address.get(&pointer.address())?;
        let matching = || {
            candidates
                .iter()
                .copied()
                .filter(|o| similar_type(self.objects[o.0 as usize].ty, pointee))
        };
        matching()
            .filter(|o| self.objects[o.0 as usize].alive)
            .last()
            .or_else(|| matching().last())
    }

    fn read(&self, object: ObjectRef) -> Result<Value<'a>, HostError> {
        let data = self.data(object)?;
        if !data.ty.is_atomic() {
            return Err(HostError::Other(crate::format!(
                "cannot read a value of type `{}`",
                data.ty
            )));
        }
        Ok(data
            .value
            .unwrap_or_else(|| Value::new(RawValue::Integral(0), data.ty, false)))
    }

    fn write(&mut self, object: ObjectRef, value: Value<'a>) -> Result<(), HostError> {
        let data = self.data_mut(object)?;
        trace!(?object, %value, "write");
        data.value = Some(value);
        Ok(())
    }

    fn address_of(&self, object: ObjectRef) -> Result<i64, HostError> {
        Ok(self.data(object)?.address)
    }

    fn object_type(&self, object: ObjectRef) -> Result<&'a Type<'a>, HostError> {
        Ok(self.data(object)?.ty)
    }

    fn member_object(&mut self, object: ObjectRef, member: &str) -> Result<ObjectRef, HostError> {
        self.find_member(object, member)
            .ok_or_else(|| HostError::NoSuchMember {
                class: self
                    .objects
                    .get(object.0 as usize)
                    .map_or_else(String::new, |o| o.ty.to_string()),
                member: member.to_string(),
            })
    }

    fn base_subobject(
        &self,
        object: ObjectRef,
        base: &ClassDef<'a>,
    ) -> Result<ObjectRef, HostError> {
        let data = self.data(object)?;
        if data.ty.class_def().is_some_and(|class| core::ptr::eq(class, base)) {
            return Ok(object);
        }
        data.children
            .iter()
            .filter(|(name, _)| name.is_none())
            .find_map(|(_, child)| self.base_subobject(*child, base).ok())
            .ok_or_else(|| {
                HostError::Other(crate::format!("`{}` has no base `{}`", data.ty, base.name))
            })
    }

    fn element_object(&mut self, array: ObjectRef, index: usize) -> Result<ObjectRef, HostError> {
        let data = self.data(array)?;
        if !data.ty.is_bounded_array() {
            return Err(HostError::Other(crate::format!("`{}` is not an array", data.ty)));
        }
        data.children
            .get(index)
            .map(|(_, child)| *child)
            .ok_or_else(|| HostError::Other(crate::format!("no element {}", index)))
    }

    fn variable_object(
        &mut self,
        variable: &'a VariableEntity<'a>,
    ) -> Result<ObjectRef, HostError> {
        self.variables
            .get(&(variable as *const _))
            .copied()
            .ok_or_else(|| HostError::UnboundVariable(variable.name.to_string()))
    }

    fn array_bounds(&self, pointer: &Value<'a>) -> Option<ArrayBounds> {
        let pointee = pointer.ty().pointee()?;
        let address = pointer.address();
        let mut found: Option<ArrayBounds> = None;
        for (index, data) in self.objects.iter().enumerate() {
            let Type::BoundedArray { elem, len } = data.ty else {
                continue;
            };
            if !similar_type(elem, pointee) {
                continue;
            }
            let size = elem.size().unwrap_or(0) as i64;
            let bounds = ArrayBounds {
                min: data.address,
                one_past: data.address + size * *len as i64,
                array: ObjectRef(index as u32),
            };
            if !bounds.contains(address) {
                continue;
            }
            // An element of one array wins over one-past of another.
            if bounds.contains_element(address) && data.alive {
                return Some(bounds);
            }
            found.get_or_insert(bounds);
        }
        found
    }

    fn complete_object_at(&self, address: i64) -> Option<ObjectRef> {
        self.by_address
            .get(&address)?
            .iter()
            .copied()
            .filter(|o| self.objects[o.0 as usize].parent.is_none())
            .last()
    }

    fn storage(&self, object: ObjectRef) -> Result<Storage, HostError> {
        Ok(self.data(object)?.storage)
    }

    fn is_alive(&self, object: ObjectRef) -> bool {
        self.objects
            .get(object.0 as usize)
            .is_some_and(|data| data.alive)
    }

    fn allocate(&mut self, ty: &'a Type<'a>) -> Result<ObjectRef, HostError> {
        if !ty.size().is_some_and(|size| size <= self.allocation_limit) {
            return Err(HostError::Allocation(ty.to_string()));
        }
        let object = self.create(ty, Storage::Dynamic, None);
        trace!(%ty, ?object, "allocated");
        Ok(object)
    }

    fn delete_object(&mut self, object: ObjectRef) -> Result<(), HostError> {
        trace!(?object, "deleted");
        self.set_alive(object, false)
    }

    fn string_literal(&mut self, text: &str, ty: &'a Type<'a>) -> Result<ObjectRef, HostError> {
        if let Some(object) = self.literals.get(text) {
            return Ok(*object);
        }
        let object = self.create(ty, Storage::Static, None);
        let char_ty = self.types.char();
        let bytes = text.bytes().chain(core::iter::once(0));
        for (index, byte) in bytes.enumerate() {
            let elem = self.element_object(object, index)?;
            self.write(elem, Value::new(RawValue::Integral(byte as i8 as i64), char_ty, true))?;
        }
        self.literals.insert(text.to_string(), object);
        Ok(object)
    }

    fn call_function(
        &mut self,
        function: &'a FunctionEntity<'a>,
        receiver: Option<ObjectRef>,
        args: &[EvalResult<'a>],
    ) -> Result<Option<EvalResult<'a>>, HostError> {
        match self.functions.get(&(function as *const _)).cloned() {
            Some(body) => body(receiver, args),
            None if function.is_destructor => Ok(None),
            None => Err(HostError::NoImplementation(function.name.to_string())),
        }
    }

    fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn provide_input(&mut self, text: &str) {
        self.input.push_str(text);
    }

    fn input_available(&self) -> bool {
        !self.input[self.input_cursor..].trim_start().is_empty()
    }

    fn extract_input(&mut self, ty: &'a Type<'a>) -> Option<Value<'a>> {
        if self.input_failed {
            return None;
        }
        self.skip_whitespace();
        let ty = self.types.cv_unqualified(ty);
        let parsed = if ty.is_char() {
            let c = self.take_while(|i, _| i == 0).chars().next();
            c.map(|c| Value::new(RawValue::Integral(c as u8 as i8 as i64), ty, true))
        } else if ty.is_floating() {
            let token = self.take_while(|_, c| {
                c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')
            });
            token
                .parse::<f64>()
                .ok()
                .map(|v| Value::new(RawValue::Floating(v), ty, true))
        } else {
            let token = self.take_while(|i, c| {
                c.is_ascii_digit() || (i == 0 && matches!(c, '+' | '-'))
            });
            token
                .parse::<i64>()
                .ok()
                .map(|v| Value::new(RawValue::Integral(v), ty, true))
        };
        if parsed.is_none() {
            self.input_failed = true;
        }
        parsed
    }

    fn stream_failed(&self, _stream: ObjectRef) -> bool {
        self.input_failed
    }

    fn this_object(&self) -> Option<ObjectRef> {
        self.this_object
    }
}
