use super::construct::{Construct, ConstructKind, MagicFunction, ValueCategory};
use super::context::CompileContext;
use super::conversions::{
    ConversionOptions, convert_to_prvalue, integral_promotion, standard_conversion,
};
use super::notes::{Note, NoteKind};
use super::overloads::{OverloadResult, resolve_overloads, return_category, type_name};
use crate::ast::{Expr, ExprKind, Literal, Span, TypeSpec};
use crate::entities::{Entity, FunctionEntity, LookupResult, OverloadSet, VariableKind};
use crate::types::{Type, TypeManager, peel_reference};
use crate::values::Value;
use crate::{Box, String, ToString, Vec};
use tracing::trace;

/// Compiles `expr` into a typed construct tree.
///
/// Never fails: problems are recorded as notes on the construct that found
/// them, and the rest of the tree is compiled anyway.
pub fn analyze<'a>(ctx: &CompileContext<'a, '_>, expr: &Expr) -> Construct<'a> {
    let mut analyzer = Analyzer {
        ctx: *ctx,
        depth: 0,
    };
    analyzer.analyze(expr)
}

pub(super) struct Analyzer<'a, 's> {
    pub(super) ctx: CompileContext<'a, 's>,
    depth: usize,
}

/// An entity picked by name lookup, plus a note when the choice was poor.
pub(super) struct Resolution<'a> {
    pub(super) entity: Option<Entity<'a>>,
    pub(super) note: Option<Note>,
}

impl<'a> Resolution<'a> {
    fn failed(note: Note) -> Self {
        Resolution {
            entity: None,
            note: Some(note),
        }
    }
}

impl<'a, 's> Analyzer<'a, 's> {
    pub(super) fn types(&self) -> &'a TypeManager<'a> {
        self.ctx.types
    }

    pub(super) fn analyze(&mut self, expr: &Expr) -> Construct<'a> {
        self.analyze_in_context(expr, None)
    }

    /// `call_args` holds the arguments of the call `expr` is the callee of;
    /// they pick among overloaded functions.
    pub(super) fn analyze_in_context(
        &mut self,
        expr: &Expr,
        call_args: Option<&[&Construct<'a>]>,
    ) -> Construct<'a> {
        let span = expr.span.clone();
        if self.depth >= self.ctx.options.max_nesting_depth {
            let mut construct = Construct::new(ConstructKind::Auxiliary, span);
            construct.add_note(NoteKind::NestingTooDeep);
            return construct;
        }

        self.depth += 1;
        let construct = match &expr.kind {
            ExprKind::NumericLiteral(literal) => self.analyze_literal(*literal, span),
            ExprKind::StringLiteral(text) => {
                let ty = self
                    .types()
                    .array(self.types().const_of(self.types().char()), text.len() + 1);
                Construct::typed(
                    ConstructKind::StringLiteral(text.clone()),
                    span,
                    ty,
                    ValueCategory::Lvalue,
                )
            }
            ExprKind::Nullptr => Construct::typed(
                ConstructKind::Nullptr,
                span,
                self.types().int(),
                ValueCategory::Prvalue,
            ),
            ExprKind::This => self.analyze_this(span),
            ExprKind::Parentheses(inner) => {
                let inner = self.analyze_in_context(inner, call_args);
                let typed = inner.well_typed().zip(inner.value_category());
                let mut construct =
                    Construct::new(ConstructKind::Parentheses(Box::new(inner)), span);
                if let Some((ty, category)) = typed {
                    construct.set_type(ty, category);
                }
                construct
            }
            ExprKind::Identifier(path) => self.analyze_identifier(path, span, call_args),
            ExprKind::Binary { op, left, right } => {
                let left = self.analyze(left);
                let right = self.analyze(right);
                self.analyze_binary(*op, left, right, span)
            }
            ExprKind::Assignment { lhs, rhs } => {
                let lhs = self.analyze(lhs);
                let rhs = self.analyze(rhs);
                self.analyze_assignment(lhs, rhs, span)
            }
            ExprKind::CompoundAssignment { op, lhs, rhs } => {
                let lhs = self.analyze(lhs);
                let rhs = self.analyze(rhs);
                self.analyze_compound_assignment(*op, lhs, rhs, span)
            }
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition = self.analyze(condition);
                let then_branch = self.analyze(then_expr);
                let else_branch = self.analyze(else_expr);
                self.analyze_ternary(condition, then_branch, else_branch, span)
            }
            ExprKind::Comma { left, right } => {
                let left = self.analyze(left);
                let right = self.analyze(right);
                let typed = right.well_typed().zip(right.value_category());
                let mut construct = Construct::new(
                    ConstructKind::Comma {
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                );
                if let Some((ty, category)) = typed {
                    construct.set_type(ty, category);
                }
                construct
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.analyze(operand);
                self.analyze_unary(*op, operand, span)
            }
            ExprKind::Postfix { op, operand } => {
                let operand = self.analyze(operand);
                self.analyze_increment(*op, operand, false, span)
            }
            ExprKind::Subscript { operand, offset } => {
                let operand = self.analyze(operand);
                let offset = self.analyze(offset);
                self.analyze_subscript(operand, offset, span)
            }
            ExprKind::FunctionCall { operand, args } => self.analyze_call(operand, args, span),
            ExprKind::Dot { operand, member } => {
                let operand = self.analyze(operand);
                self.analyze_dot(operand, member, call_args, span)
            }
            ExprKind::Arrow { operand, member } => {
                let operand = self.analyze(operand);
                self.analyze_arrow(operand, member, call_args, span)
            }
            ExprKind::New { ty, init } => {
                let init = init.as_deref().map(|init| self.analyze(init));
                self.analyze_new(ty, init, span)
            }
            ExprKind::NewArray { elem, length } => {
                let length = self.analyze(length);
                self.analyze_new_array(elem, length, span)
            }
            ExprKind::Delete(operand) => {
                let operand = self.analyze(operand);
                self.analyze_delete(operand, false, span)
            }
            ExprKind::DeleteArray(operand) => {
                let operand = self.analyze(operand);
                self.analyze_delete(operand, true, span)
            }
            ExprKind::Opaque(id) => self.analyze_opaque(id, span),
            ExprKind::Anything => Construct::new(ConstructKind::Anything, span),
            ExprKind::Unsupported { feature, operands } => {
                let operands = operands.iter().map(|operand| self.analyze(operand)).collect();
                let mut construct = Construct::new(
                    ConstructKind::Unsupported {
                        feature: *feature,
                        operands,
                    },
                    span,
                );
                construct.add_note(NoteKind::Unsupported {
                    feature: feature.feature_name(),
                });
                construct
            }
        };
        self.depth -= 1;

        trace!(
            construct = construct.kind_name(),
            well_typed = construct.is_well_typed(),
            "compiled"
        );
        construct
    }

    fn analyze_literal(&self, literal: Literal, span: Span) -> Construct<'a> {
        let types = self.types();
        let value = match literal {
            Literal::Int(value) => Value::int(types, value),
            Literal::Double(value) | Literal::Float(value) => Value::double(types, value),
            Literal::Bool(value) => Value::bool(types, value),
            Literal::Char(value) => Value::char(types, value),
        };
        let mut construct = Construct::typed(
            ConstructKind::NumericLiteral(value),
            span,
            value.ty(),
            ValueCategory::Prvalue,
        );
        if let Literal::Int(value) = literal
            && i32::try_from(value).is_err()
        {
            construct.add_note(NoteKind::IntegerLiteralRange { value });
        }
        construct
    }

    fn analyze_this(&self, span: Span) -> Construct<'a> {
        match self.ctx.receiver {
            Some(receiver) => Construct::typed(
                ConstructKind::This,
                span,
                self.types().pointer(receiver),
                ValueCategory::Prvalue,
            ),
            None => {
                let mut construct = Construct::new(ConstructKind::This, span);
                construct.add_note(NoteKind::ThisOutsideMember);
                construct
            }
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn analyze_identifier(
        &mut self,
        path: &[String],
        span: Span,
        call_args: Option<&[&Construct<'a>]>,
    ) -> Construct<'a> {
        let name = path.join("::");
        let lookup = match path {
            [single] => self.ctx.scope.lookup(single),
            _ => {
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                self.ctx.scope.lookup_qualified(&segments)
            }
        };

        let resolution = match lookup {
            LookupResult::NotFound => Resolution::failed(Note::new(
                NoteKind::NotFound { name: name.clone() },
                span.clone(),
            )),
            LookupResult::Class(_) => Resolution::failed(Note::new(
                NoteKind::ClassFound { name: name.clone() },
                span.clone(),
            )),
            LookupResult::Ambiguous => Resolution::failed(Note::new(
                NoteKind::AmbiguousName { name: name.clone() },
                span.clone(),
            )),
            LookupResult::Variable(var) => Resolution {
                entity: Some(Entity::Variable(var)),
                note: None,
            },
            LookupResult::Functions(set) => {
                self.resolve_function_name(&name, set, call_args, self.ctx.receiver, &span)
            }
        };

        let ty = resolution.entity.map(|entity| self.entity_type(entity, self.ctx.receiver));
        let mut construct = Construct::new(
            ConstructKind::Identifier {
                name,
                entity: resolution.entity,
            },
            span,
        );
        if let Some(note) = resolution.note {
            construct.push_note(note);
        }
        if let Some(ty) = ty {
            construct.set_type(ty, ValueCategory::Lvalue);
        }
        construct
    }

    /// Type of an expression naming `entity`.
    ///
    /// References are peeled. A non-reference data member seen through a
    /// const `receiver` is const.
    pub(super) fn entity_type(
        &self,
        entity: Entity<'a>,
        receiver: Option<&'a Type<'a>>,
    ) -> &'a Type<'a> {
        match entity {
            Entity::Variable(var) => {
                let through_const = var.kind == VariableKind::Member
                    && !var.ty.is_reference()
                    && receiver.is_some_and(|r| r.is_const());
                if through_const {
                    self.types().const_of(var.ty)
                } else {
                    peel_reference(var.ty)
                }
            }
            Entity::Function(function) => function.ty,
        }
    }

    /// Picks one function from an overload set.
    ///
    /// A single candidate is taken as is. Otherwise the arguments of the
    /// enclosing call decide; if none of the candidates fits, the closest one
    /// is kept so that the call can report precise argument diagnostics.
    pub(super) fn resolve_function_name(
        &self,
        name: &str,
        set: OverloadSet<'a>,
        call_args: Option<&[&Construct<'a>]>,
        receiver: Option<&'a Type<'a>>,
        span: &Span,
    ) -> Resolution<'a> {
        if let [single] = set.as_slice() {
            return Resolution {
                entity: Some(Entity::Function(single)),
                note: None,
            };
        }

        let Some(args) = call_args else {
            return Resolution::failed(Note::new(
                NoteKind::AmbiguousName {
                    name: name.to_string(),
                },
                span.clone(),
            ));
        };

        let result = resolve_overloads(self.types(), &set, args, receiver);
        match &result {
            OverloadResult::Selected(function) => Resolution {
                entity: Some(Entity::Function(function)),
                note: None,
            },
            OverloadResult::Ambiguous(_) => Resolution::failed(
                Note::new(
                    NoteKind::AmbiguousOverload {
                        name: name.to_string(),
                    },
                    span.clone(),
                )
                .with_related(result.related_notes()),
            ),
            OverloadResult::NoViable(_) => Resolution {
                entity: result.best_effort().map(Entity::Function),
                note: Some(
                    Note::new(
                        NoteKind::OverloadNoMatch {
                            name: name.to_string(),
                            args: argument_types(args),
                        },
                        span.clone(),
                    )
                    .with_related(result.related_notes()),
                ),
            },
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn analyze_call(&mut self, operand: &Expr, args: &[Expr], span: Span) -> Construct<'a> {
        if let ExprKind::Identifier(path) = &operand.kind {
            if let [name] = path.as_slice() {
                if let Some(magic) = MagicFunction::from_name(name) {
                    if !self.ctx.scope.lookup(name).is_found() {
                        let args = args.iter().map(|arg| self.analyze(arg)).collect();
                        return self.analyze_magic_call(magic, args, span);
                    }
                }
            }
        }

        let args: Vec<Construct<'a>> = args.iter().map(|arg| self.analyze(arg)).collect();
        let callee = {
            let arg_refs: Vec<&Construct<'a>> = args.iter().collect();
            self.analyze_in_context(operand, Some(&arg_refs))
        };

        if callee.well_typed().is_some_and(|ty| ty.is_class()) {
            let mut operands = crate::vec![callee];
            operands.extend(args);
            return self.analyze_operator_overload("()", operands, span);
        }

        let function = callee.entity().and_then(|entity| entity.as_function());
        let Some(function) = function else {
            let callee_ty = callee.well_typed();
            let mut construct = Construct::new(
                ConstructKind::FunctionCall {
                    callee: Box::new(callee),
                    args,
                    function: None,
                },
                span,
            );
            if let Some(ty) = callee_ty {
                construct.add_note(NoteKind::CallOperand { ty: ty.to_string() });
            }
            return construct;
        };

        let receiver = self.call_receiver(&callee);
        let (args, mut notes) = self.convert_arguments(function, args, receiver);
        let ret = function.return_type();
        if !function.returns_complete_type() {
            notes.push(NoteKind::CallIncompleteReturn {
                name: function.name.to_string(),
                ty: ret.to_string(),
            });
        }

        let mut construct = Construct::new(
            ConstructKind::FunctionCall {
                callee: Box::new(callee),
                args,
                function: Some(function),
            },
            span,
        );
        let well_formed = notes.is_empty();
        for note in notes {
            construct.add_note(note);
        }
        if well_formed {
            construct.set_type(peel_reference(ret), return_category(ret));
        }
        construct
    }

    /// Type of the object a member function named by `callee` is called on.
    fn call_receiver(&self, callee: &Construct<'a>) -> Option<&'a Type<'a>> {
        match callee.kind() {
            ConstructKind::Dot { operand, .. } => operand.ty(),
            ConstructKind::Arrow { operand, .. } => operand.ty().and_then(|ty| ty.pointee()),
            ConstructKind::Parentheses(inner) => self.call_receiver(inner),
            _ => self.ctx.receiver,
        }
    }

    /// Checks and converts `args` for a call to `function`.
    ///
    /// By-value arguments of scalar parameters are standard-converted; the
    /// others are left as they are. Every problem found becomes a note.
    pub(super) fn convert_arguments(
        &self,
        function: &'a FunctionEntity<'a>,
        args: Vec<Construct<'a>>,
        receiver: Option<&'a Type<'a>>,
    ) -> (Vec<Construct<'a>>, Vec<NoteKind>) {
        let reasons = {
            let arg_refs: Vec<&Construct<'a>> = args.iter().collect();
            super::overloads::check_candidate(self.types(), function, &arg_refs, receiver).reasons
        };

        let params = function.params();
        if params.len() != args.len() {
            return (args, reasons);
        }

        let args = params
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                if param.is_reference() || param.is_class() || !arg.is_well_typed() {
                    arg
                } else {
                    standard_conversion(self.types(), arg, param, ConversionOptions::default())
                }
            })
            .collect();
        (args, reasons)
    }

    fn analyze_magic_call(
        &mut self,
        function: MagicFunction,
        args: Vec<Construct<'a>>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let mut args = args;
        let mut ok = false;
        if args.len() == 1 && args[0].is_well_typed() {
            if let Some(condition) = args.pop() {
                let options = ConversionOptions::default();
                let condition = standard_conversion(types, condition, types.bool(), options);
                ok = condition.is_prvalue() && condition.ty().is_some_and(|ty| ty.is_bool());
                args.push(condition);
            }
        }

        let any_untyped = args.iter().any(|arg| !arg.is_well_typed());
        let mut construct =
            Construct::new(ConstructKind::MagicFunctionCall { function, args }, span);
        if ok {
            construct.set_type(types.void(), ValueCategory::Prvalue);
        } else if !any_untyped {
            construct.add_note(NoteKind::AssertCondition);
        }
        construct
    }

    // ========================================================================
    // Dynamic memory
    // ========================================================================

    /// Resolves a type name written inside an expression.
    fn resolve_type_spec(&self, spec: &TypeSpec) -> Result<&'a Type<'a>, NoteKind> {
        let types = self.types();
        Ok(match spec {
            TypeSpec::Void => types.void(),
            TypeSpec::Bool => types.bool(),
            TypeSpec::Char => types.char(),
            TypeSpec::Int => types.int(),
            TypeSpec::Float => types.float(),
            TypeSpec::Double => types.double(),
            TypeSpec::Named(name) => match self.ctx.scope.lookup(name) {
                LookupResult::Class(class) => types.class(class),
                _ => return Err(NoteKind::UnknownTypeName { name: name.clone() }),
            },
            TypeSpec::Const(inner) => types.const_of(self.resolve_type_spec(inner)?),
            TypeSpec::Pointer(inner) => types.pointer(self.resolve_type_spec(inner)?),
            TypeSpec::Array(inner, len) => types.array(self.resolve_type_spec(inner)?, *len),
        })
    }

    fn analyze_new(
        &mut self,
        spec: &TypeSpec,
        init: Option<Construct<'a>>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let mut notes = Vec::new();
        let allocated = match self.resolve_type_spec(spec) {
            Ok(ty) if ty.is_complete_object_type() && !ty.is_bounded_array() => Some(ty),
            Ok(ty) => {
                notes.push(NoteKind::NewType { ty: ty.to_string() });
                None
            }
            Err(note) => {
                notes.push(note);
                None
            }
        };

        let init = match (allocated, init) {
            (Some(allocated), Some(init)) if init.is_well_typed() => {
                let target = types.cv_unqualified(allocated);
                let init = if allocated.is_atomic() {
                    standard_conversion(types, init, target, ConversionOptions::default())
                } else {
                    convert_to_prvalue(types, init)
                };
                let matches = init.ty().is_some_and(|ty| {
                    if allocated.is_atomic() {
                        init.is_prvalue() && crate::types::same_type(ty, target)
                    } else {
                        crate::types::similar_type(ty, target)
                    }
                });
                if !matches {
                    notes.push(NoteKind::NewInitializer {
                        from: type_name(&init),
                        to: target.to_string(),
                    });
                }
                Some(init)
            }
            (_, init) => init,
        };

        let mut construct = Construct::new(
            ConstructKind::New {
                allocated: allocated.unwrap_or_else(|| types.void()),
                init: init.map(Box::new),
            },
            span,
        );
        let well_formed = notes.is_empty();
        for note in notes {
            construct.add_note(note);
        }
        if let (true, Some(allocated)) = (well_formed, allocated) {
            construct.set_type(types.pointer(allocated), ValueCategory::Prvalue);
        }
        construct
    }

    fn analyze_new_array(
        &mut self,
        spec: &TypeSpec,
        length: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let mut notes = Vec::new();
        let elem = match self.resolve_type_spec(spec) {
            Ok(ty) if ty.is_complete_object_type() => Some(ty),
            Ok(ty) => {
                notes.push(NoteKind::NewType { ty: ty.to_string() });
                None
            }
            Err(note) => {
                notes.push(note);
                None
            }
        };

        let length = if length.is_well_typed() {
            let length = integral_promotion(types, convert_to_prvalue(types, length));
            if !length.ty().is_some_and(|ty| ty.is_integral()) {
                notes.push(NoteKind::NewArrayLength {
                    ty: type_name(&length),
                });
            }
            length
        } else {
            length
        };

        let well_formed = notes.is_empty() && length.is_well_typed();
        let mut construct = Construct::new(
            ConstructKind::NewArray {
                elem: elem.unwrap_or_else(|| types.void()),
                length: Box::new(length),
            },
            span,
        );
        for note in notes {
            construct.add_note(note);
        }
        if let (true, Some(elem)) = (well_formed, elem) {
            construct.set_type(types.pointer(elem), ValueCategory::Prvalue);
        }
        construct
    }

    fn analyze_delete(&mut self, operand: Construct<'a>, array: bool, span: Span) -> Construct<'a> {
        let types = self.types();
        let op = if array { "delete[]" } else { "delete" };
        let mut notes = Vec::new();
        let mut destructor = None;

        let operand = if operand.is_well_typed() {
            let operand = convert_to_prvalue(types, operand);
            match operand.ty() {
                Some(ty) if ty.is_pointer_to_complete_object() => {
                    let pointee = ty.pointee().unwrap_or(ty);
                    if array && pointee.is_bounded_array() {
                        notes.push(NoteKind::DeleteArrayElement { ty: ty.to_string() });
                    }
                    if let Some(class) = pointee.class_def() {
                        destructor = class.destructor();
                        if destructor.is_none() {
                            notes.push(NoteKind::DeleteNoDestructor {
                                class: class.name.to_string(),
                            });
                        }
                    }
                }
                _ => notes.push(NoteKind::DeletePointer {
                    op,
                    ty: type_name(&operand),
                }),
            }
            operand
        } else {
            operand
        };

        let well_formed = notes.is_empty() && operand.is_well_typed();
        let operand = Box::new(operand);
        let kind = if array {
            ConstructKind::DeleteArray {
                operand,
                destructor,
            }
        } else {
            ConstructKind::Delete {
                operand,
                destructor,
            }
        };
        let mut construct = Construct::new(kind, span);
        for note in notes {
            construct.add_note(note);
        }
        if well_formed {
            construct.set_type(types.void(), ValueCategory::Prvalue);
        }
        construct
    }

    fn analyze_opaque(&self, id: &str, span: Span) -> Construct<'a> {
        match self.ctx.opaque.get(id) {
            Some(implementation) => {
                let ty = implementation.ty(self.types());
                let category = implementation.value_category();
                Construct::typed(
                    ConstructKind::Opaque {
                        id: id.to_string(),
                        implementation: Some(implementation),
                    },
                    span,
                    ty,
                    category,
                )
            }
            None => {
                let mut construct = Construct::new(
                    ConstructKind::Opaque {
                        id: id.to_string(),
                        implementation: None,
                    },
                    span,
                );
                construct.add_note(NoteKind::OpaqueNotFound { id: id.to_string() });
                construct
            }
        }
    }
}

/// `int, double*` style list of argument types for diagnostics.
pub(super) fn argument_types(args: &[&Construct<'_>]) -> String {
    let names: Vec<String> = args.iter().map(|arg| type_name(arg)).collect();
    names.join(", ")
}
