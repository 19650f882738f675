//! Diagnostics attached to constructs.
//!
//! Notes never abort analysis: the construct that detects a problem records
//! a [`Note`] and the rest of the tree is still built.

use crate::api::{Diagnostic, RelatedInfo, Severity};
use crate::ast::Span;
use crate::{String, ToString, Vec};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoteKind {
    // Names and members
    #[error("`{name}` was not declared in this scope")]
    NotFound { name: String },
    #[error("`{name}` names a class, not a value")]
    ClassFound { name: String },
    #[error("`{name}` is ambiguous")]
    AmbiguousName { name: String },
    #[error("no overload of `{name}` accepts arguments of type ({args})")]
    OverloadNoMatch { name: String, args: String },
    #[error("`this` can only be used inside a member function")]
    ThisOutsideMember,
    #[error("`{operand}` is not of class type, so `.{member}` cannot be used")]
    DotClassType { operand: String, member: String },
    #[error("`{operand}` is not a pointer to a class, so `->{member}` cannot be used")]
    ArrowClassPointer { operand: String, member: String },
    #[error("class `{class}` is incomplete, so its members cannot be accessed")]
    IncompleteClass { class: String },
    #[error("class `{class}` has no member named `{member}`")]
    MemberNotFound { class: String, member: String },
    #[error("member `{member}` is found in more than one base of `{class}`")]
    MemberAmbiguous { class: String, member: String },
    #[error("`{member}` names a nested class of `{class}`, not a member")]
    MemberClassFound { class: String, member: String },

    // Operators
    #[error("operands to `{op}` must be arithmetic, found `{left}` and `{right}`")]
    ArithmeticOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("operands to `{op}` must be integral, found `{left}` and `{right}`")]
    IntegralOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("invalid operand types `{left}` and `{right}` for `{op}`")]
    InvalidOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("pointer arithmetic requires a pointer to a complete object type, found `{ty}`")]
    PointerArithmeticIncomplete { ty: String },
    #[error("cannot subtract pointers of different types `{left}` and `{right}`")]
    PointerDifferenceTypes { left: String, right: String },
    #[error("comparison between distinct pointer types `{left}` and `{right}`")]
    PointerComparisonTypes { left: String, right: String },
    #[error("comparing an array to null: the array's address is never null")]
    NullLiteralArrayEquality,
    #[error("ordering a pointer against a null pointer constant has an unspecified result")]
    NullLiteralComparison,
    #[error("operand to `{op}` must be convertible to bool, found `{ty}`")]
    BoolOperand { op: &'static str, ty: String },
    #[error("operand to unary `{op}` must be arithmetic, found `{ty}`")]
    UnaryArithmeticOperand { op: &'static str, ty: String },
    #[error("operand to unary `+` must be arithmetic or a pointer, found `{ty}`")]
    UnaryPlusOperand { ty: String },
    #[error("operand to `{op}` must be an lvalue")]
    IncrementLvalue { op: &'static str },
    #[error("operand to `{op}` must not be const")]
    IncrementConst { op: &'static str },
    #[error(
        "operand to `{op}` must be arithmetic or a pointer to a complete object, found `{ty}`"
    )]
    IncrementOperand { op: &'static str, ty: String },
    #[error("`{op}` cannot be applied to a bool")]
    IncrementBool { op: &'static str },

    // Assignment
    #[error("the left side of an assignment must be an lvalue")]
    LhsLvalue,
    #[error("`{ty}` is const and cannot be assigned to")]
    LhsConst { ty: String },
    #[error("arrays of type `{ty}` cannot be assigned to")]
    LhsArray { ty: String },
    #[error("cannot convert `{from}` to `{to}` in assignment")]
    AssignmentConvert { from: String, to: String },

    // Ternary
    #[error("condition of `?:` must be convertible to bool, found `{ty}`")]
    TernaryCondition { ty: String },
    #[error("branches of `?:` have different types `{then_ty}` and `{else_ty}`")]
    TernarySameType { then_ty: String, else_ty: String },
    #[error("branches of `?:` have different value categories")]
    TernarySameCategory,
    #[error("branches of `?:` must not be void")]
    TernaryVoid,

    // Pointers and access
    #[error("operand to `*` must be a pointer, found `{ty}`")]
    DereferencePointer { ty: String },
    #[error("cannot dereference a pointer to the incomplete type `{ty}`")]
    DereferenceIncomplete { ty: String },
    #[error("operand to `&` must be an lvalue")]
    AddressOfLvalue,
    #[error("operand to `&` must be an object, found `{ty}`")]
    AddressOfObject { ty: String },
    #[error("subscript requires a pointer or array operand, found `{ty}`")]
    SubscriptOperand { ty: String },
    #[error("subscript offset must be integral, found `{ty}`")]
    SubscriptOffset { ty: String },

    // Calls
    #[error("`{ty}` is not a function and cannot be called")]
    CallOperand { ty: String },
    #[error("`{name}` expects {expected} argument(s), but {found} were given")]
    CallArgCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("argument {index} of `{name}`: cannot convert `{from}` to `{to}`")]
    CallParamType {
        name: String,
        index: usize,
        from: String,
        to: String,
    },
    #[error("argument {index} of `{name}`: a `{to}` must bind to a compatible lvalue")]
    CallReferenceBinding {
        name: String,
        index: usize,
        to: String,
    },
    #[error("non-const member function `{name}` cannot be called on a const object")]
    CallConstReceiver { name: String },
    #[error("`{name}` returns the incomplete type `{ty}`")]
    CallIncompleteReturn { name: String, ty: String },
    #[error("assert takes exactly one argument convertible to bool")]
    AssertCondition,

    // Overloads
    #[error("no viable `operator{op}` for operands of type ({args})")]
    NoSuchOverload { op: &'static str, args: String },
    #[error("call to `{name}` is ambiguous")]
    AmbiguousOverload { name: String },

    // Streams
    #[error("`{ty}` cannot be written to an output stream")]
    OutputOperand { ty: String },
    #[error("input must be read into an arithmetic lvalue, found `{ty}`")]
    InputOperand { ty: String },

    // Dynamic memory
    #[error("cannot allocate an object of type `{ty}`")]
    NewType { ty: String },
    #[error("unknown type name `{name}`")]
    UnknownTypeName { name: String },
    #[error("cannot initialize a `{to}` from `{from}`")]
    NewInitializer { from: String, to: String },
    #[error("array length must be integral, found `{ty}`")]
    NewArrayLength { ty: String },
    #[error("operand to `{op}` must be a pointer to a complete object type, found `{ty}`")]
    DeletePointer { op: &'static str, ty: String },
    #[error("class `{class}` has no destructor")]
    DeleteNoDestructor { class: String },
    #[error("operand to `delete[]` must point to array elements, found `{ty}`")]
    DeleteArrayElement { ty: String },

    // Miscellaneous
    #[error("integer literal `{value}` is too large for `int`")]
    IntegerLiteralRange { value: i64 },
    #[error("no opaque expression registered under `{id}`")]
    OpaqueNotFound { id: String },
    #[error("{feature} is not supported")]
    Unsupported { feature: &'static str },
    #[error("expression is nested too deeply")]
    NestingTooDeep,
}

impl NoteKind {
    /// Stable identifier, grouped by expression kind.
    pub fn code(&self) -> &'static str {
        match self {
            NoteKind::NotFound { .. } => "expr.id.not_found",
            NoteKind::ClassFound { .. } => "expr.id.class_found",
            NoteKind::AmbiguousName { .. } => "expr.id.ambiguous",
            NoteKind::OverloadNoMatch { .. } => "expr.id.overload_no_match",
            NoteKind::ThisOutsideMember => "expr.this.outside_member",
            NoteKind::DotClassType { .. } => "expr.dot.class_type",
            NoteKind::ArrowClassPointer { .. } => "expr.arrow.class_pointer",
            NoteKind::IncompleteClass { .. } => "expr.member.incomplete_class",
            NoteKind::MemberNotFound { .. } => "expr.member.not_found",
            NoteKind::MemberAmbiguous { .. } => "expr.member.ambiguous",
            NoteKind::MemberClassFound { .. } => "expr.member.class_found",
            NoteKind::ArithmeticOperands { .. } => "expr.binary.arithmetic_operands",
            NoteKind::IntegralOperands { .. } => "expr.binary.integral_operands",
            NoteKind::InvalidOperands { .. } => "expr.binary.invalid_operands",
            NoteKind::PointerArithmeticIncomplete { .. } => "expr.pointer_arithmetic.incomplete",
            NoteKind::PointerDifferenceTypes { .. } => "expr.pointer_difference.same_type",
            NoteKind::PointerComparisonTypes { .. } => "expr.pointer_comparison.same_type",
            NoteKind::NullLiteralArrayEquality => {
                "expr.pointer_comparison.null_literal_array_equality"
            }
            NoteKind::NullLiteralComparison => "expr.pointer_comparison.null_literal_comparison",
            NoteKind::BoolOperand { .. } => "expr.logical.operand_bool",
            NoteKind::UnaryArithmeticOperand { .. } => "expr.unary.arithmetic_operand",
            NoteKind::UnaryPlusOperand { .. } => "expr.unary_plus.operand",
            NoteKind::IncrementLvalue { .. } => "expr.increment.lvalue_required",
            NoteKind::IncrementConst { .. } => "expr.increment.const",
            NoteKind::IncrementOperand { .. } => "expr.increment.operand_type",
            NoteKind::IncrementBool { .. } => "expr.increment.bool",
            NoteKind::LhsLvalue => "expr.assignment.lhs_lvalue",
            NoteKind::LhsConst { .. } => "expr.assignment.lhs_const",
            NoteKind::LhsArray { .. } => "expr.assignment.lhs_array",
            NoteKind::AssignmentConvert { .. } => "expr.assignment.convert",
            NoteKind::TernaryCondition { .. } => "expr.ternary.condition_bool",
            NoteKind::TernarySameType { .. } => "expr.ternary.same_type",
            NoteKind::TernarySameCategory => "expr.ternary.same_value_category",
            NoteKind::TernaryVoid => "expr.ternary.no_void",
            NoteKind::DereferencePointer { .. } => "expr.dereference.pointer",
            NoteKind::DereferenceIncomplete { .. } => "expr.dereference.incomplete_type",
            NoteKind::AddressOfLvalue => "expr.address_of.lvalue_required",
            NoteKind::AddressOfObject { .. } => "expr.address_of.object_required",
            NoteKind::SubscriptOperand { .. } => "expr.subscript.pointer",
            NoteKind::SubscriptOffset { .. } => "expr.subscript.integral_offset",
            NoteKind::CallOperand { .. } => "expr.call.operand",
            NoteKind::CallArgCount { .. } => "expr.call.arg_count",
            NoteKind::CallParamType { .. } => "expr.call.param_type",
            NoteKind::CallReferenceBinding { .. } => "expr.call.reference_binding",
            NoteKind::CallConstReceiver { .. } => "expr.call.const_receiver",
            NoteKind::CallIncompleteReturn { .. } => "expr.call.incomplete_return_type",
            NoteKind::AssertCondition => "expr.assert.condition",
            NoteKind::NoSuchOverload { .. } => "expr.operator_overload.no_such_overload",
            NoteKind::AmbiguousOverload { .. } => "expr.overload.ambiguous",
            NoteKind::OutputOperand { .. } => "expr.output.operand",
            NoteKind::InputOperand { .. } => "expr.input.operand",
            NoteKind::NewType { .. } => "expr.new.type",
            NoteKind::UnknownTypeName { .. } => "expr.new.unknown_type",
            NoteKind::NewInitializer { .. } => "expr.new.initializer",
            NoteKind::NewArrayLength { .. } => "expr.new_array.length_integral",
            NoteKind::DeletePointer { .. } => "expr.delete.pointer",
            NoteKind::DeleteNoDestructor { .. } => "expr.delete.no_destructor",
            NoteKind::DeleteArrayElement { .. } => "expr.delete_array.element",
            NoteKind::IntegerLiteralRange { .. } => "expr.literal.out_of_range",
            NoteKind::OpaqueNotFound { .. } => "expr.opaque.not_found",
            NoteKind::Unsupported { .. } => "expr.unsupported",
            NoteKind::NestingTooDeep => "expr.nesting_too_deep",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            NoteKind::NullLiteralArrayEquality | NoteKind::NullLiteralComparison => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    pub fn help(&self) -> Option<&'static str> {
        match self {
            NoteKind::LhsConst { .. } => {
                Some("remove `const` from the declaration, or assign to something else")
            }
            NoteKind::NullLiteralComparison => Some("compare with `==` or `!=` instead"),
            NoteKind::ThisOutsideMember => {
                Some("`this` points to the object a member function was called on")
            }
            NoteKind::Unsupported { .. } => Some("this simulator implements a subset of C++"),
            _ => None,
        }
    }
}

/// A diagnostic recorded on the construct that detected it.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub kind: NoteKind,
    pub span: Span,
    /// Extra context, e.g. why each overload candidate was rejected.
    pub related: Vec<RelatedNote>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedNote {
    pub span: Span,
    pub message: String,
}

impl Note {
    pub fn new(kind: NoteKind, span: Span) -> Self {
        Note {
            kind,
            span,
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: Vec<RelatedNote>) -> Self {
        self.related = related;
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind.severity() == Severity::Error
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            severity: self.kind.severity(),
            message: self.kind.to_string(),
            span: self.span.clone(),
            related: self
                .related
                .iter()
                .map(|r| RelatedInfo {
                    span: r.span.clone(),
                    message: r.message.clone(),
                })
                .collect(),
            help: self.kind.help().map(|h| h.to_string()),
            code: Some(self.kind.code().to_string()),
        }
    }
}
