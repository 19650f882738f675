//! Runtime rules for every construct kind.
//!
//! `up_next` decides the evaluation order: which child a node pushes next
//! and when it is ready to step. `operate` performs the node's own effect
//! once its children are done, checking for undefined behavior along the
//! way.
//!
//! Order, per kind:
//! - children are evaluated left to right, except assignments, which
//!   evaluate the right operand first;
//! - `&&` and `||` push the right operand only if the left one does not
//!   decide the result;
//! - `?:` pushes exactly one branch;
//! - identifiers, parentheses, commas, `.` and `?:` finish without a step
//!   of their own.

use super::error::ExecutionError;
use super::events::SimulationEventKind;
use super::host::{EvalResult, ObjectRef, Storage, read_c_string};
use super::operators::{self, Issue};
use super::simulation::{NodeId, Operated, Simulation, Slots, UpNext};
use crate::analyzer::{ConstructKind, ConversionKind, MagicFunction};
use crate::ast::{ArithmeticOp, IncDec, LogicalOp};
use crate::entities::{Entity, FunctionEntity, VariableKind};
use crate::evaluator::host::{ArrayBounds, HostError};
use crate::types::Type;
use crate::values::{RawValue, Value};
use crate::{ToString, format};
use smallvec::{SmallVec, smallvec};

const NULL_DEREFERENCE: &str = "Ow! Your code just dereferenced a null pointer!";

type Args<'a> = SmallVec<[EvalResult<'a>; 4]>;

fn push_or_ready<'a>(pending: Slots) -> UpNext<'a> {
    if pending.is_empty() {
        UpNext::Ready
    } else {
        UpNext::Push(pending)
    }
}

/// Re-labels `value` with the static type of the node producing it.
fn retype<'a>(value: Value<'a>, ty: &'a Type<'a>) -> Value<'a> {
    Value::new(value.raw(), ty, value.is_valid())
}

impl<'m, 'a, 'h> Simulation<'m, 'a, 'h> {
    // ========================================================================
    // Up next
    // ========================================================================

    pub(super) fn up_next(&mut self, id: NodeId) -> Result<UpNext<'a>, ExecutionError> {
        let model = self.node(id).model;
        let slots = self.node(id).children.len();
        Ok(match model.kind() {
            ConstructKind::Identifier { .. } => UpNext::Immediate(self.pass_through(id)?),

            ConstructKind::Parentheses(_)
            | ConstructKind::Comma { .. }
            | ConstructKind::Dot { .. } => {
                let pending = self.pending(id, 0..slots);
                if pending.is_empty() {
                    UpNext::Immediate(self.pass_through(id)?)
                } else {
                    UpNext::Push(pending)
                }
            }

            ConstructKind::Assignment { .. } | ConstructKind::CompoundAssignment { .. } => {
                push_or_ready(self.pending(id, [1, 0]))
            }

            ConstructKind::Logical { op, .. } => {
                if !self.pending(id, [0]).is_empty() {
                    return Ok(UpNext::Push(smallvec![0]));
                }
                let left = self.child_value(id, 0)?.is_truthy();
                let decided = match op {
                    LogicalOp::And => !left,
                    LogicalOp::Or => left,
                };
                if decided {
                    UpNext::Ready
                } else {
                    push_or_ready(self.pending(id, [1]))
                }
            }

            ConstructKind::Ternary { .. } => {
                if !self.pending(id, [0]).is_empty() {
                    return Ok(UpNext::Push(smallvec![0]));
                }
                let pending = self.pending(id, [self.chosen_branch(id)?]);
                if pending.is_empty() {
                    UpNext::Immediate(self.pass_through(id)?)
                } else {
                    UpNext::Push(pending)
                }
            }

            _ => push_or_ready(self.pending(id, 0..slots)),
        })
    }

    /// Slots in `order` without a runtime node yet.
    fn pending(&self, id: NodeId, order: impl IntoIterator<Item = usize>) -> Slots {
        let children = &self.node(id).children;
        order
            .into_iter()
            .filter(|slot| children[*slot].is_none())
            .collect()
    }

    fn chosen_branch(&self, id: NodeId) -> Result<usize, ExecutionError> {
        Ok(if self.child_value(id, 0)?.is_truthy() { 1 } else { 2 })
    }

    /// Result of the kinds that only forward or look something up.
    fn pass_through(&mut self, id: NodeId) -> Result<Option<EvalResult<'a>>, ExecutionError> {
        let model = self.node(id).model;
        Ok(match model.kind() {
            ConstructKind::Identifier { entity, .. } => {
                let entity = entity.ok_or(ExecutionError::NotExecutable {
                    construct: model.kind_name(),
                })?;
                Some(self.entity_result(entity)?)
            }
            ConstructKind::Parentheses(_) => self.node_result(id, 0),
            ConstructKind::Comma { .. } => self.node_result(id, 1),
            ConstructKind::Ternary { .. } => self.node_result(id, self.chosen_branch(id)?),
            ConstructKind::Dot { entity, .. } => {
                let object = self.child_object(id, 0)?;
                Some(self.member_result(id, object, *entity)?)
            }
            _ => None,
        })
    }

    // ========================================================================
    // Child results
    // ========================================================================

    fn node_result(&self, id: NodeId, slot: usize) -> Option<EvalResult<'a>> {
        let child = self.node(id).children.get(slot).copied().flatten()?;
        self.node(child).result
    }

    fn child_result(&self, id: NodeId, slot: usize) -> Result<EvalResult<'a>, ExecutionError> {
        self.node_result(id, slot)
            .ok_or_else(|| self.unexpected(id, "a result"))
    }

    fn child_value(&self, id: NodeId, slot: usize) -> Result<Value<'a>, ExecutionError> {
        match self.node_result(id, slot) {
            Some(EvalResult::Value(value)) => Ok(value),
            _ => Err(self.unexpected(id, "a value")),
        }
    }

    fn child_object(&self, id: NodeId, slot: usize) -> Result<ObjectRef, ExecutionError> {
        match self.node_result(id, slot) {
            Some(EvalResult::Object(object)) => Ok(object),
            _ => Err(self.unexpected(id, "an object")),
        }
    }

    fn unexpected(&self, id: NodeId, expected: &'static str) -> ExecutionError {
        ExecutionError::UnexpectedResult {
            construct: self.node(id).model.kind_name(),
            expected,
        }
    }

    fn report(&mut self, id: NodeId, issue: Option<Issue>) {
        if let Some(issue) = issue {
            self.raise(id, issue.kind, issue.message);
        }
    }

    // ========================================================================
    // Step
    // ========================================================================

    pub(super) fn operate(&mut self, id: NodeId) -> Result<Operated<'a>, ExecutionError> {
        let model = self.node(id).model;
        let not_executable = ExecutionError::NotExecutable {
            construct: model.kind_name(),
        };
        let Some(ty) = model.ty() else {
            return Err(not_executable);
        };
        let types = self.types;
        let value = |v: Value<'a>| Operated::Done(Some(EvalResult::Value(retype(v, ty))));
        let object = |o: ObjectRef| Operated::Done(Some(EvalResult::Object(o)));

        Ok(match model.kind() {
            ConstructKind::NumericLiteral(literal) => value(*literal),
            ConstructKind::StringLiteral(text) => object(self.host.string_literal(text, ty)?),
            ConstructKind::Nullptr => value(Value::new(RawValue::Integral(0), ty, true)),
            ConstructKind::This => {
                let this = self
                    .host
                    .this_object()
                    .ok_or_else(|| HostError::Other("`this` has no object".into()))?;
                value(Value::pointer(ty, self.host.address_of(this)?))
            }
            ConstructKind::Opaque {
                implementation: Some(implementation),
                ..
            } => Operated::Done(implementation.evaluate(&mut *self.host)?),

            ConstructKind::Identifier { .. }
            | ConstructKind::Parentheses(_)
            | ConstructKind::Comma { .. }
            | ConstructKind::Dot { .. }
            | ConstructKind::Ternary { .. } => Operated::Done(self.pass_through(id)?),

            ConstructKind::Arithmetic { op, .. } => {
                let (left, right) = (self.child_value(id, 0)?, self.child_value(id, 1)?);
                let (result, issue) = operators::binary(*op, left, right);
                self.report(id, issue);
                value(result)
            }
            ConstructKind::Relational { op, .. } => {
                let (left, right) = (self.child_value(id, 0)?, self.child_value(id, 1)?);
                value(left.compare(&right, *op, types))
            }
            ConstructKind::Logical { .. } => {
                let decider = if self.node_result(id, 1).is_some() { 1 } else { 0 };
                let truthy = self.child_value(id, decider)?.is_truthy();
                value(Value::bool(types, truthy))
            }

            ConstructKind::PointerDifference { .. } => {
                let (left, right) = (self.child_value(id, 0)?, self.child_value(id, 1)?);
                let mut result = left.pointer_difference(&right, types);
                if !self.same_array(&left, &right) {
                    self.raise(
                        id,
                        SimulationEventKind::UndefinedBehavior,
                        "Subtracting pointers that do not point into the same array",
                    );
                    result = result.invalidated();
                }
                value(result)
            }
            ConstructKind::PointerOffset {
                op,
                pointer_on_left,
                ..
            } => {
                let (first, second) = (self.child_value(id, 0)?, self.child_value(id, 1)?);
                let (pointer, offset) = if *pointer_on_left {
                    (first, second)
                } else {
                    (second, first)
                };
                value(self.offset_pointer(id, pointer, offset, *op == ArithmeticOp::Sub))
            }
            ConstructKind::PointerComparison { op, .. } => {
                let (left, right) = (self.child_value(id, 0)?, self.child_value(id, 1)?);
                if !op.is_equality() && !self.same_array(&left, &right) {
                    self.raise(
                        id,
                        SimulationEventKind::UnspecifiedBehavior,
                        "Comparing pointers that do not point into the same array",
                    );
                }
                value(left.compare(&right, *op, types))
            }

            ConstructKind::Output { .. } => {
                let stream = self.child_object(id, 0)?;
                let text = match self.child_result(id, 1)? {
                    EvalResult::Object(array) => read_c_string(&mut *self.host, array)?,
                    EvalResult::Value(v) => v.to_string(),
                    EvalResult::Function { .. } => return Err(self.unexpected(id, "a value")),
                };
                self.host.write_output(&text);
                object(stream)
            }
            ConstructKind::Input { .. } => {
                let stream = self.child_object(id, 0)?;
                let target = self.child_object(id, 1)?;
                if !self.host.input_available() && !self.host.stream_failed(stream) {
                    return Ok(Operated::Wait);
                }
                let target_ty = self.host.object_type(target)?;
                if let Some(input) = self.host.extract_input(target_ty) {
                    self.host.write(target, input)?;
                }
                object(stream)
            }

            ConstructKind::Assignment { .. } => {
                let lhs = self.child_object(id, 0)?;
                let rhs = self.child_value(id, 1)?;
                self.host.write(lhs, rhs)?;
                object(lhs)
            }
            ConstructKind::CompoundAssignment { op, .. } => {
                let lhs = self.child_object(id, 0)?;
                let rhs = self.child_value(id, 1)?;
                let old = self.host.read(lhs)?;
                let new = if old.ty().is_pointer() {
                    self.offset_pointer(id, old, rhs, *op == ArithmeticOp::Sub)
                } else {
                    let (new, issue) = operators::compound(types, *op, old, rhs);
                    self.report(id, issue);
                    new
                };
                self.host.write(lhs, new)?;
                object(lhs)
            }

            ConstructKind::PrefixIncrement { op, .. }
            | ConstructKind::PostfixIncrement { op, .. } => {
                let target = self.child_object(id, 0)?;
                let old = self.host.read(target)?;
                let decrement = *op == IncDec::Decrement;
                let new = if old.ty().is_pointer() {
                    self.offset_pointer(id, old, Value::int(types, 1), decrement)
                } else {
                    let (new, issue) = operators::step(types, old, decrement);
                    self.report(id, issue);
                    new
                };
                self.host.write(target, new)?;
                match model.kind() {
                    ConstructKind::PrefixIncrement { .. } => object(target),
                    _ => value(old),
                }
            }

            ConstructKind::Dereference(_) => {
                let pointer = self.child_value(id, 0)?;
                match self.dereference(id, pointer, true)? {
                    Some(target) => object(target),
                    None => Operated::Halted,
                }
            }
            ConstructKind::AddressOf(_) => {
                let target = self.child_object(id, 0)?;
                value(Value::pointer(ty, self.host.address_of(target)?))
            }
            ConstructKind::UnaryMinus(_) => value(self.child_value(id, 0)?.arithmetic_negate()),
            ConstructKind::UnaryPlus(_) => value(self.child_value(id, 0)?),
            ConstructKind::LogicalNot(_) => value(self.child_value(id, 0)?.logical_not()),

            ConstructKind::Subscript { .. } => {
                let (pointer, offset) = (self.child_value(id, 0)?, self.child_value(id, 1)?);
                match self.subscript(id, pointer, offset)? {
                    Some(target) => object(target),
                    None => Operated::Halted,
                }
            }
            ConstructKind::Arrow { entity, .. } => {
                let pointer = self.child_value(id, 0)?;
                match self.dereference(id, pointer, true)? {
                    Some(target) => Operated::Done(Some(self.member_result(id, target, *entity)?)),
                    None => Operated::Halted,
                }
            }

            ConstructKind::FunctionCall { args, .. } => {
                let EvalResult::Function { function, receiver } = self.child_result(id, 0)? else {
                    return Err(self.unexpected(id, "a function"));
                };
                let args = self.collect_args(id, 1..1 + args.len())?;
                Operated::Done(self.call(function, receiver, &args, ty)?)
            }
            ConstructKind::OperatorOverload {
                receiver,
                args,
                function,
                ..
            } => {
                let (receiver, first) = match receiver {
                    Some(_) => (Some(self.child_object(id, 0)?), 1),
                    None => (None, 0),
                };
                let args = self.collect_args(id, first..first + args.len())?;
                Operated::Done(self.call(*function, receiver, &args, ty)?)
            }
            ConstructKind::MagicFunctionCall {
                function: MagicFunction::Assert,
                ..
            } => {
                if !self.child_value(id, 0)?.is_truthy() {
                    self.raise(id, SimulationEventKind::AssertionFailure, "Assertion failed");
                }
                Operated::Done(None)
            }

            ConstructKind::New { allocated, init } => {
                if !self.check_allocation(id, allocated.size()) {
                    return Ok(Operated::Halted);
                }
                let target = self.host.allocate(*allocated)?;
                if init.is_some() {
                    match self.child_result(id, 0)? {
                        EvalResult::Value(v) => self.host.write(target, v)?,
                        EvalResult::Object(source) => self.copy_object(source, target)?,
                        EvalResult::Function { .. } => return Err(self.unexpected(id, "a value")),
                    }
                }
                value(Value::pointer(ty, self.host.address_of(target)?))
            }
            ConstructKind::NewArray { elem, .. } => {
                let length = self.child_value(id, 0)?.as_i64();
                if length < 0 {
                    self.raise(
                        id,
                        SimulationEventKind::UndefinedBehavior,
                        format!("Allocating an array with negative length {}", length),
                    );
                }
                let array_ty = types.array(*elem, length.max(0) as usize);
                if !self.check_allocation(id, array_ty.size()) {
                    return Ok(Operated::Halted);
                }
                let array = self.host.allocate(array_ty)?;
                value(Value::pointer(ty, self.host.address_of(array)?))
            }
            ConstructKind::Delete { destructor, .. } => {
                let pointer = self.child_value(id, 0)?;
                self.delete(id, pointer, false, *destructor)?;
                Operated::Done(None)
            }
            ConstructKind::DeleteArray { destructor, .. } => {
                let pointer = self.child_value(id, 0)?;
                self.delete(id, pointer, true, *destructor)?;
                Operated::Done(None)
            }

            ConstructKind::ImplicitConversion { conversion, .. } => {
                value(self.convert(id, *conversion, ty)?)
            }

            ConstructKind::Opaque { .. }
            | ConstructKind::Anything
            | ConstructKind::Auxiliary
            | ConstructKind::Unsupported { .. }
            | ConstructKind::InvalidOperatorOverload { .. } => return Err(not_executable),
        })
    }

    // ========================================================================
    // Entities and calls
    // ========================================================================

    fn entity_result(&mut self, entity: Entity<'a>) -> Result<EvalResult<'a>, HostError> {
        match entity {
            Entity::Variable(var) if var.kind == VariableKind::Member => {
                let this = self.host.this_object().ok_or_else(|| {
                    HostError::Other(format!("no object for member `{}`", var.name))
                })?;
                Ok(EvalResult::Object(self.host.member_object(this, var.name)?))
            }
            Entity::Variable(var) => Ok(EvalResult::Object(self.host.variable_object(var)?)),
            Entity::Function(function) => Ok(EvalResult::Function {
                function,
                receiver: if function.is_member() {
                    self.host.this_object()
                } else {
                    None
                },
            }),
        }
    }

    fn member_result(
        &mut self,
        id: NodeId,
        object: ObjectRef,
        entity: Option<Entity<'a>>,
    ) -> Result<EvalResult<'a>, ExecutionError> {
        match entity {
            Some(Entity::Variable(var)) => {
                Ok(EvalResult::Object(self.host.member_object(object, var.name)?))
            }
            Some(Entity::Function(function)) => Ok(EvalResult::Function {
                function,
                receiver: Some(object),
            }),
            None => Err(self.unexpected(id, "a member")),
        }
    }

    fn collect_args(
        &self,
        id: NodeId,
        slots: core::ops::Range<usize>,
    ) -> Result<Args<'a>, ExecutionError> {
        slots.map(|slot| self.child_result(id, slot)).collect()
    }

    fn call(
        &mut self,
        function: &'a FunctionEntity<'a>,
        receiver: Option<ObjectRef>,
        args: &[EvalResult<'a>],
        ty: &'a Type<'a>,
    ) -> Result<Option<EvalResult<'a>>, ExecutionError> {
        let args = self.slice_arguments(function, args)?;
        let result = self.host.call_function(function, receiver, &args)?;
        if ty.is_void() {
            return Ok(None);
        }
        Ok(match result {
            Some(EvalResult::Value(v)) if ty.is_atomic() => Some(EvalResult::Value(retype(v, ty))),
            other => other,
        })
    }

    /// Replaces derived class arguments to by-value base class parameters with their base
    /// subobject.
    fn slice_arguments(
        &self,
        function: &'a FunctionEntity<'a>,
        args: &[EvalResult<'a>],
    ) -> Result<Args<'a>, HostError> {
        let params = function.params();
        args.iter()
            .enumerate()
            .map(|(index, arg)| match (arg, params.get(index).and_then(|p| p.class_def())) {
                (EvalResult::Object(object), Some(base)) => {
                    Ok(EvalResult::Object(self.host.base_subobject(*object, base)?))
                }
                _ => Ok(*arg),
            })
            .collect()
    }

    /// Copies every atomic subobject of `source` into `target`.
    fn copy_object(&mut self, source: ObjectRef, target: ObjectRef) -> Result<(), HostError> {
        let ty = self.host.object_type(source)?;
        match ty {
            Type::BoundedArray { len, .. } => {
                for index in 0..*len {
                    let from = self.host.element_object(source, index)?;
                    let to = self.host.element_object(target, index)?;
                    self.copy_object(from, to)?;
                }
            }
            Type::Class { class, .. } => {
                for base in class.bases {
                    let from = self.host.base_subobject(source, base)?;
                    let to = self.host.base_subobject(target, base)?;
                    self.copy_object(from, to)?;
                }
                let members = class.body().map_or(&[][..], |body| body.members);
                for member in members {
                    let from = self.host.member_object(source, member.name)?;
                    let to = self.host.member_object(target, member.name)?;
                    self.copy_object(from, to)?;
                }
            }
            _ if ty.is_atomic() => {
                let v = self.host.read(source)?;
                self.host.write(target, v)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Crashes the simulation when an allocation of `bytes` is over the
    /// configured limit. `None` is an overflowing size.
    fn check_allocation(&mut self, id: NodeId, bytes: Option<usize>) -> bool {
        let limit = self.options.max_allocation_bytes;
        if bytes.is_some_and(|bytes| bytes <= limit) {
            return true;
        }
        let requested = bytes.map_or_else(|| "too many".to_string(), |b| b.to_string());
        self.raise(
            id,
            SimulationEventKind::Crash,
            format!("Out of memory: cannot allocate {} bytes (limit {} bytes)", requested, limit),
        );
        false
    }

    // ========================================================================
    // Pointers
    // ========================================================================

    /// Bounds a pointer may move within: its array, or the single object it
    /// points to.
    fn pointer_bounds(&mut self, pointer: &Value<'a>) -> Option<ArrayBounds> {
        if let Some(bounds) = self.host.array_bounds(pointer) {
            return Some(bounds);
        }
        let size = pointer.ty().pointee()?.size()? as i64;
        let object = self.host.dereference(pointer)?;
        Some(ArrayBounds {
            min: pointer.address(),
            one_past: pointer.address() + size,
            array: object,
        })
    }

    /// Whether two pointers point into (or one past) the same array.
    fn same_array(&self, left: &Value<'a>, right: &Value<'a>) -> bool {
        let within = |p: &Value<'a>, q: &Value<'a>| {
            self.host
                .array_bounds(p)
                .is_some_and(|bounds| bounds.contains(q.address()))
        };
        left.address() == right.address() || within(left, right) || within(right, left)
    }

    fn offset_pointer(
        &mut self,
        id: NodeId,
        pointer: Value<'a>,
        offset: Value<'a>,
        subtract: bool,
    ) -> Value<'a> {
        let result = pointer.pointer_offset(&offset, subtract);
        if !pointer.is_valid() || offset.as_i64() == 0 {
            return result;
        }
        let in_bounds = match self.pointer_bounds(&pointer) {
            Some(bounds) => bounds.contains(result.address()),
            None => false,
        };
        if in_bounds {
            return result;
        }
        self.raise(
            id,
            SimulationEventKind::UndefinedBehavior,
            "Pointer arithmetic moved the pointer outside the bounds of its array",
        );
        result.invalidated()
    }

    /// The object `pointer` points to. Raises a crash and returns `None`
    /// when there is none.
    fn dereference(
        &mut self,
        id: NodeId,
        pointer: Value<'a>,
        check_bounds: bool,
    ) -> Result<Option<ObjectRef>, ExecutionError> {
        if !pointer.is_valid() {
            self.raise(
                id,
                SimulationEventKind::UndefinedBehavior,
                "Dereferencing a pointer whose value is invalid",
            );
        }
        let address = pointer.address();
        if address == 0 {
            self.raise(id, SimulationEventKind::Crash, NULL_DEREFERENCE);
            return Ok(None);
        }
        if address < 0 {
            self.raise(
                id,
                SimulationEventKind::Crash,
                "Ow! Your code just dereferenced a pointer to a negative address!",
            );
            return Ok(None);
        }
        if check_bounds {
            if let Some(bounds) = self.host.array_bounds(&pointer) {
                if !bounds.contains_element(address) {
                    self.raise(
                        id,
                        SimulationEventKind::UndefinedBehavior,
                        "Dereferencing a pointer one past the end of its array",
                    );
                }
            }
        }
        match self.host.dereference(&pointer) {
            Some(target) => {
                if !self.host.is_alive(target) {
                    self.raise(
                        id,
                        SimulationEventKind::UndefinedBehavior,
                        "The object this pointer points to is no longer alive",
                    );
                }
                Ok(Some(target))
            }
            None => {
                self.raise(
                    id,
                    SimulationEventKind::Crash,
                    format!("There is no object at address {:#x}", address),
                );
                Ok(None)
            }
        }
    }

    fn subscript(
        &mut self,
        id: NodeId,
        pointer: Value<'a>,
        offset: Value<'a>,
    ) -> Result<Option<ObjectRef>, ExecutionError> {
        let element = pointer.pointer_offset(&offset, false);
        let bounds = if pointer.is_valid() && pointer.address() != 0 {
            self.pointer_bounds(&pointer)
        } else {
            None
        };
        if let Some(bounds) = bounds {
            if !bounds.contains_element(element.address()) {
                let elem_size = pointer.ty().pointee().and_then(Type::size).unwrap_or(1);
                let elem_size = elem_size.max(1) as i64;
                let len = (bounds.one_past - bounds.min) / elem_size;
                self.raise(
                    id,
                    SimulationEventKind::UndefinedBehavior,
                    format!(
                        "Index {} is out of bounds for an array of {} elements",
                        offset.as_i64(),
                        len
                    ),
                );
            }
        }
        self.dereference(id, element, bounds.is_none())
    }

    fn delete(
        &mut self,
        id: NodeId,
        pointer: Value<'a>,
        array: bool,
        destructor: Option<&'a FunctionEntity<'a>>,
    ) -> Result<(), ExecutionError> {
        let undefined = SimulationEventKind::UndefinedBehavior;
        if pointer.is_valid() && pointer.address() == 0 {
            return Ok(());
        }
        let Some(target) = self.host.complete_object_at(pointer.address()) else {
            self.raise(
                id,
                undefined,
                "Invalid delete: the pointer does not point to the start of an object",
            );
            return Ok(());
        };
        if self.host.storage(target)? != Storage::Dynamic {
            self.raise(
                id,
                undefined,
                "Invalid delete: the object was not allocated with new",
            );
            return Ok(());
        }
        if !self.host.is_alive(target) {
            self.raise(
                id,
                undefined,
                "Double free: the object was already deleted",
            );
            return Ok(());
        }
        let target_ty = self.host.object_type(target)?;
        if target_ty.is_bounded_array() != array {
            let message = if array {
                "delete[] used on an object allocated with new"
            } else {
                "delete used on an array allocated with new[]"
            };
            self.raise(id, undefined, message);
            return Ok(());
        }

        if let Some(destructor) = destructor {
            if let Type::BoundedArray { len, .. } = target_ty {
                for index in (0..*len).rev() {
                    let elem = self.host.element_object(target, index)?;
                    self.host.call_function(destructor, Some(elem), &[])?;
                }
            } else {
                self.host.call_function(destructor, Some(target), &[])?;
            }
        }
        self.host.delete_object(target)?;
        Ok(())
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    fn convert(
        &mut self,
        id: NodeId,
        conversion: ConversionKind,
        ty: &'a Type<'a>,
    ) -> Result<Value<'a>, ExecutionError> {
        Ok(match conversion {
            ConversionKind::LValueToRValue => {
                let source = self.child_object(id, 0)?;
                retype(self.host.read(source)?, ty)
            }
            ConversionKind::ArrayToPointer => {
                let array = self.child_object(id, 0)?;
                Value::pointer(ty, self.host.address_of(array)?)
            }
            ConversionKind::StreamToBool => {
                let stream = self.child_object(id, 0)?;
                Value::bool(self.types, !self.host.stream_failed(stream))
            }
            ConversionKind::NullPointerConversion => Value::pointer(ty, 0),
            ConversionKind::PointerConversion => {
                let pointer = self.child_value(id, 0)?;
                self.upcast(pointer, ty)?
            }
            ConversionKind::FloatingToIntegral => {
                let (result, issue) = operators::convert(self.child_value(id, 0)?, ty);
                self.report(id, issue);
                result
            }
            ConversionKind::PointerToBoolean
            | ConversionKind::FloatingToBoolean
            | ConversionKind::IntegralToBoolean
            | ConversionKind::IntegralPromotion
            | ConversionKind::IntegralConversion
            | ConversionKind::FloatingPointPromotion
            | ConversionKind::FloatingPointConversion
            | ConversionKind::IntegralToFloating
            | ConversionKind::QualificationConversion => self.child_value(id, 0)?.convert(ty),
        })
    }

    /// Derived-to-base pointer conversion: points at the base subobject.
    fn upcast(&mut self, pointer: Value<'a>, ty: &'a Type<'a>) -> Result<Value<'a>, HostError> {
        let Some(base) = ty.pointee_class() else {
            return Ok(retype(pointer, ty));
        };
        if pointer.address() == 0 {
            return Ok(retype(pointer, ty));
        }
        let Some(derived) = self.host.dereference(&pointer) else {
            return Ok(retype(pointer, ty));
        };
        let subobject = self.host.base_subobject(derived, base)?;
        let address = self.host.address_of(subobject)?;
        Ok(Value::new(RawValue::Integral(address), ty, pointer.is_valid()))
    }
}
