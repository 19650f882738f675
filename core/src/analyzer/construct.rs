//! Compiled expression constructs.
//!
//! A [`Construct`] is one node of the typed tree the analyzer builds from an
//! [`Expr`](crate::ast::Expr). Each node has a fixed [`ConstructKind`], owns
//! its children, and carries its result type and value category once both
//! are known. A node that could not be typed keeps them unset and records a
//! [`Note`] instead; the rest of the tree is built anyway.

use super::notes::{Note, NoteKind};
use super::opaque::OpaqueExpression;
use crate::ast::{ArithmeticOp, IncDec, LogicalOp, RelationalOp, Span, UnsupportedFeature};
use crate::entities::{Entity, FunctionEntity};
use crate::types::Type;
use crate::values::Value;
use crate::{Box, String, Vec};
use alloc::rc::Rc;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    Prvalue,
    Lvalue,
}

/// Implicit conversions the analyzer may insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    LValueToRValue,
    ArrayToPointer,
    StreamToBool,
    NullPointerConversion,
    PointerConversion,
    PointerToBoolean,
    FloatingToBoolean,
    IntegralToBoolean,
    IntegralPromotion,
    IntegralConversion,
    FloatingPointPromotion,
    FloatingPointConversion,
    IntegralToFloating,
    FloatingToIntegral,
    QualificationConversion,
}

impl ConversionKind {
    pub fn name(self) -> &'static str {
        match self {
            ConversionKind::LValueToRValue => "lvalue-to-rvalue",
            ConversionKind::ArrayToPointer => "array-to-pointer",
            ConversionKind::StreamToBool => "stream-to-bool",
            ConversionKind::NullPointerConversion => "null pointer conversion",
            ConversionKind::PointerConversion => "pointer conversion",
            ConversionKind::PointerToBoolean => "pointer-to-boolean",
            ConversionKind::FloatingToBoolean => "floating-to-boolean",
            ConversionKind::IntegralToBoolean => "integral-to-boolean",
            ConversionKind::IntegralPromotion => "integral promotion",
            ConversionKind::IntegralConversion => "integral conversion",
            ConversionKind::FloatingPointPromotion => "floating-point promotion",
            ConversionKind::FloatingPointConversion => "floating-point conversion",
            ConversionKind::IntegralToFloating => "integral-to-floating",
            ConversionKind::FloatingToIntegral => "floating-to-integral",
            ConversionKind::QualificationConversion => "qualification conversion",
        }
    }
}

/// Built-in functions compiled without a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagicFunction {
    Assert,
}

impl MagicFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "assert" => Some(MagicFunction::Assert),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MagicFunction::Assert => "assert",
        }
    }
}

#[derive(Clone)]
pub enum ConstructKind<'a> {
    NumericLiteral(Value<'a>),
    StringLiteral(String),
    Nullptr,
    This,
    Identifier {
        name: String,
        entity: Option<Entity<'a>>,
    },
    Parentheses(Box<Construct<'a>>),

    Arithmetic {
        op: ArithmeticOp,
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },
    Relational {
        op: RelationalOp,
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },
    PointerDifference {
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },
    /// `p + n`, `n + p` or `p - n`.
    PointerOffset {
        op: ArithmeticOp,
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
        pointer_on_left: bool,
    },
    PointerComparison {
        op: RelationalOp,
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },
    /// `stream << value`.
    Output {
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },
    /// `stream >> lvalue`.
    Input {
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },

    Assignment {
        lhs: Box<Construct<'a>>,
        rhs: Box<Construct<'a>>,
    },
    CompoundAssignment {
        op: ArithmeticOp,
        lhs: Box<Construct<'a>>,
        rhs: Box<Construct<'a>>,
    },
    Ternary {
        condition: Box<Construct<'a>>,
        then_branch: Box<Construct<'a>>,
        else_branch: Box<Construct<'a>>,
    },
    Comma {
        left: Box<Construct<'a>>,
        right: Box<Construct<'a>>,
    },

    PrefixIncrement {
        op: IncDec,
        operand: Box<Construct<'a>>,
    },
    PostfixIncrement {
        op: IncDec,
        operand: Box<Construct<'a>>,
    },
    Dereference(Box<Construct<'a>>),
    AddressOf(Box<Construct<'a>>),
    UnaryMinus(Box<Construct<'a>>),
    UnaryPlus(Box<Construct<'a>>),
    LogicalNot(Box<Construct<'a>>),

    Subscript {
        operand: Box<Construct<'a>>,
        offset: Box<Construct<'a>>,
    },
    Dot {
        operand: Box<Construct<'a>>,
        member: String,
        entity: Option<Entity<'a>>,
    },
    Arrow {
        operand: Box<Construct<'a>>,
        member: String,
        entity: Option<Entity<'a>>,
    },
    FunctionCall {
        callee: Box<Construct<'a>>,
        args: Vec<Construct<'a>>,
        function: Option<&'a FunctionEntity<'a>>,
    },
    MagicFunctionCall {
        function: MagicFunction,
        args: Vec<Construct<'a>>,
    },
    /// A user-defined operator. Member overloads have a `receiver`.
    OperatorOverload {
        op: &'static str,
        receiver: Option<Box<Construct<'a>>>,
        args: Vec<Construct<'a>>,
        function: &'a FunctionEntity<'a>,
    },
    /// Class operands for which no viable overload exists.
    InvalidOperatorOverload {
        op: &'static str,
        operands: Vec<Construct<'a>>,
    },

    New {
        allocated: &'a Type<'a>,
        init: Option<Box<Construct<'a>>>,
    },
    NewArray {
        elem: &'a Type<'a>,
        length: Box<Construct<'a>>,
    },
    Delete {
        operand: Box<Construct<'a>>,
        destructor: Option<&'a FunctionEntity<'a>>,
    },
    DeleteArray {
        operand: Box<Construct<'a>>,
        destructor: Option<&'a FunctionEntity<'a>>,
    },

    ImplicitConversion {
        conversion: ConversionKind,
        from: Box<Construct<'a>>,
        /// Chain length including this conversion.
        length: usize,
    },

    Opaque {
        id: String,
        implementation: Option<Rc<dyn OpaqueExpression<'a> + 'a>>,
    },
    /// Equivalence wildcard.
    Anything,
    /// A typed placeholder with no runtime meaning.
    Auxiliary,
    Unsupported {
        feature: UnsupportedFeature,
        operands: Vec<Construct<'a>>,
    },
}

impl fmt::Debug for ConstructKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ConstructKind<'_> {
    /// Snake-case tag of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            ConstructKind::NumericLiteral(_) => "numeric_literal",
            ConstructKind::StringLiteral(_) => "string_literal",
            ConstructKind::Nullptr => "nullptr",
            ConstructKind::This => "this",
            ConstructKind::Identifier { .. } => "identifier",
            ConstructKind::Parentheses(_) => "parentheses",
            ConstructKind::Arithmetic { .. } => "arithmetic",
            ConstructKind::Relational { .. } => "relational",
            ConstructKind::Logical { .. } => "logical",
            ConstructKind::PointerDifference { .. } => "pointer_difference",
            ConstructKind::PointerOffset { .. } => "pointer_offset",
            ConstructKind::PointerComparison { .. } => "pointer_comparison",
            ConstructKind::Output { .. } => "output_operator",
            ConstructKind::Input { .. } => "input_operator",
            ConstructKind::Assignment { .. } => "assignment",
            ConstructKind::CompoundAssignment { .. } => "compound_assignment",
            ConstructKind::Ternary { .. } => "ternary",
            ConstructKind::Comma { .. } => "comma",
            ConstructKind::PrefixIncrement { .. } => "prefix_increment",
            ConstructKind::PostfixIncrement { .. } => "postfix_increment",
            ConstructKind::Dereference(_) => "dereference",
            ConstructKind::AddressOf(_) => "address_of",
            ConstructKind::UnaryMinus(_) => "unary_minus",
            ConstructKind::UnaryPlus(_) => "unary_plus",
            ConstructKind::LogicalNot(_) => "logical_not",
            ConstructKind::Subscript { .. } => "subscript",
            ConstructKind::Dot { .. } => "dot",
            ConstructKind::Arrow { .. } => "arrow",
            ConstructKind::FunctionCall { .. } => "function_call",
            ConstructKind::MagicFunctionCall { .. } => "magic_function_call",
            ConstructKind::OperatorOverload { .. } => "operator_overload",
            ConstructKind::InvalidOperatorOverload { .. } => "invalid_operator_overload",
            ConstructKind::New { .. } => "new",
            ConstructKind::NewArray { .. } => "new_array",
            ConstructKind::Delete { .. } => "delete",
            ConstructKind::DeleteArray { .. } => "delete_array",
            ConstructKind::ImplicitConversion { .. } => "implicit_conversion",
            ConstructKind::Opaque { .. } => "opaque",
            ConstructKind::Anything => "anything",
            ConstructKind::Auxiliary => "auxiliary",
            ConstructKind::Unsupported { .. } => "unsupported",
        }
    }
}

#[derive(Clone)]
pub struct Construct<'a> {
    kind: ConstructKind<'a>,
    ty: Option<&'a Type<'a>>,
    category: Option<ValueCategory>,
    notes: Vec<Note>,
    span: Span,
}

impl fmt::Debug for Construct<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Construct");
        s.field("kind", &self.kind);
        if let Some(ty) = self.ty {
            s.field("ty", &format_args!("{}", ty));
        }
        s.field("category", &self.category);
        if !self.notes.is_empty() {
            s.field("notes", &self.notes);
        }
        let children = self.children();
        if !children.is_empty() {
            s.field("children", &children);
        }
        s.finish()
    }
}

impl<'a> Construct<'a> {
    pub(crate) fn new(kind: ConstructKind<'a>, span: Span) -> Self {
        Construct {
            kind,
            ty: None,
            category: None,
            notes: Vec::new(),
            span,
        }
    }

    /// A construct that is well-typed from the start.
    pub(crate) fn typed(
        kind: ConstructKind<'a>,
        span: Span,
        ty: &'a Type<'a>,
        category: ValueCategory,
    ) -> Self {
        let mut construct = Self::new(kind, span);
        construct.set_type(ty, category);
        construct
    }

    /// A type-only placeholder, used to ask "would a `ty` convert?".
    pub fn auxiliary(ty: &'a Type<'a>, category: ValueCategory) -> Self {
        Self::typed(ConstructKind::Auxiliary, Span::default(), ty, category)
    }

    /// Wraps `from` in an implicit conversion to `ty`.
    pub(crate) fn conversion(
        conversion: ConversionKind,
        from: Construct<'a>,
        ty: &'a Type<'a>,
        category: ValueCategory,
    ) -> Self {
        let length = from.conversion_length() + 1;
        let span = from.span.clone();
        Self::typed(
            ConstructKind::ImplicitConversion {
                conversion,
                from: Box::new(from),
                length,
            },
            span,
            ty,
            category,
        )
    }

    /// Sets the result type and category. Each construct is typed at most once.
    pub(crate) fn set_type(&mut self, ty: &'a Type<'a>, category: ValueCategory) {
        debug_assert!(
            self.ty.is_none() && self.category.is_none(),
            "{} typed twice",
            self.kind.name()
        );
        self.ty = Some(ty);
        self.category = Some(category);
    }

    pub(crate) fn add_note(&mut self, kind: NoteKind) {
        tracing::debug!(construct = self.kind.name(), code = kind.code(), "note");
        let note = Note::new(kind, self.span.clone());
        self.notes.push(note);
    }

    pub(crate) fn push_note(&mut self, note: Note) {
        tracing::debug!(construct = self.kind.name(), code = note.code(), "note");
        self.notes.push(note);
    }

    pub fn kind(&self) -> &ConstructKind<'a> {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn ty(&self) -> Option<&'a Type<'a>> {
        self.ty
    }

    pub fn value_category(&self) -> Option<ValueCategory> {
        self.category
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_well_typed(&self) -> bool {
        self.ty.is_some() && self.category.is_some()
    }

    pub fn is_lvalue(&self) -> bool {
        self.category == Some(ValueCategory::Lvalue)
    }

    pub fn is_prvalue(&self) -> bool {
        self.category == Some(ValueCategory::Prvalue)
    }

    /// Type if the construct is well-typed.
    pub(crate) fn well_typed(&self) -> Option<&'a Type<'a>> {
        if self.is_well_typed() { self.ty } else { None }
    }

    /// Number of chained implicit conversions ending at this node.
    pub fn conversion_length(&self) -> usize {
        match self.kind {
            ConstructKind::ImplicitConversion { length, .. } => length,
            _ => 0,
        }
    }

    /// The referenced entity for identifiers and member accesses.
    pub fn entity(&self) -> Option<Entity<'a>> {
        match &self.kind {
            ConstructKind::Identifier { entity, .. }
            | ConstructKind::Dot { entity, .. }
            | ConstructKind::Arrow { entity, .. } => *entity,
            ConstructKind::Parentheses(inner) => inner.entity(),
            _ => None,
        }
    }

    /// Children in source order.
    pub fn children(&self) -> Vec<&Construct<'a>> {
        match &self.kind {
            ConstructKind::NumericLiteral(_)
            | ConstructKind::StringLiteral(_)
            | ConstructKind::Nullptr
            | ConstructKind::This
            | ConstructKind::Identifier { .. }
            | ConstructKind::Opaque { .. }
            | ConstructKind::Anything
            | ConstructKind::Auxiliary => Vec::new(),
            ConstructKind::Parentheses(inner)
            | ConstructKind::Dereference(inner)
            | ConstructKind::AddressOf(inner)
            | ConstructKind::UnaryMinus(inner)
            | ConstructKind::UnaryPlus(inner)
            | ConstructKind::LogicalNot(inner)
            | ConstructKind::PrefixIncrement { operand: inner, .. }
            | ConstructKind::PostfixIncrement { operand: inner, .. }
            | ConstructKind::Dot { operand: inner, .. }
            | ConstructKind::Arrow { operand: inner, .. }
            | ConstructKind::NewArray { length: inner, .. }
            | ConstructKind::Delete { operand: inner, .. }
            | ConstructKind::DeleteArray { operand: inner, .. }
            | ConstructKind::ImplicitConversion { from: inner, .. } => crate::vec![&**inner],
            ConstructKind::Arithmetic { left, right, .. }
            | ConstructKind::Relational { left, right, .. }
            | ConstructKind::Logical { left, right, .. }
            | ConstructKind::PointerDifference { left, right }
            | ConstructKind::PointerOffset { left, right, .. }
            | ConstructKind::PointerComparison { left, right, .. }
            | ConstructKind::Output { left, right }
            | ConstructKind::Input { left, right }
            | ConstructKind::Comma { left, right }
            | ConstructKind::Assignment {
                lhs: left,
                rhs: right,
            }
            | ConstructKind::CompoundAssignment {
                lhs: left,
                rhs: right,
                ..
            }
            | ConstructKind::Subscript {
                operand: left,
                offset: right,
            } => crate::vec![&**left, &**right],
            ConstructKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => crate::vec![&**condition, &**then_branch, &**else_branch],
            ConstructKind::FunctionCall { callee, args, .. } => {
                let mut children = crate::vec![&**callee];
                children.extend(args.iter());
                children
            }
            ConstructKind::OperatorOverload { receiver, args, .. } => {
                let mut children: Vec<&Construct<'a>> = receiver.iter().map(|r| &**r).collect();
                children.extend(args.iter());
                children
            }
            ConstructKind::MagicFunctionCall { args: items, .. }
            | ConstructKind::InvalidOperatorOverload {
                operands: items, ..
            }
            | ConstructKind::Unsupported {
                operands: items, ..
            } => items.iter().collect(),
            ConstructKind::New { init, .. } => init.iter().map(|i| &**i).collect(),
        }
    }

    /// Whether this node or any descendant has an error note.
    pub fn has_errors(&self) -> bool {
        self.notes.iter().any(Note::is_error) || self.children().iter().any(|c| c.has_errors())
    }

    /// Every note in the tree, outermost first.
    pub fn all_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        for child in self.children() {
            notes.extend(child.all_notes());
        }
        notes
    }

    /// Whether a runtime instance can be created for this tree: no errors
    /// and no placeholder-only kinds anywhere.
    pub fn is_executable(&self) -> bool {
        let kind_ok = match &self.kind {
            ConstructKind::Anything
            | ConstructKind::Auxiliary
            | ConstructKind::Unsupported { .. }
            | ConstructKind::InvalidOperatorOverload { .. } => false,
            ConstructKind::Opaque { implementation, .. } => implementation.is_some(),
            _ => true,
        };
        kind_ok
            && self.is_well_typed()
            && !self.notes.iter().any(Note::is_error)
            && self.children().iter().all(|c| c.is_executable())
    }
}
