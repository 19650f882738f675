//! Parsed expression trees consumed by the analyzer.
//!
//! The parser lives outside this crate. Hosts hand the analyzer an immutable
//! [`Expr`] tree whose [`ExprKind`] tags form a closed set; every tag is
//! handled by the analyzer, including the handful that only produce an
//! "unsupported feature" note.
//!
//! The [`build`] module offers terse constructors for hosts that synthesize
//! trees (and for tests).

use crate::{Box, String, Vec};
use core::fmt;
use core::ops::Range;
use core::str::FromStr;

/// Byte range of a node in the original source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span(start..end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Literal payloads as written in source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Double(f64),
    /// `1.5f`. Compiled as a double literal.
    Float(f64),
    Bool(bool),
    Char(u8),
}

/// Type names appearing inside expressions (`new T`, `new T[n]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Void,
    Bool,
    Char,
    Int,
    Float,
    Double,
    Named(String),
    Const(Box<TypeSpec>),
    Pointer(Box<TypeSpec>),
    Array(Box<TypeSpec>, usize),
}

/// Syntax the analyzer recognizes but deliberately does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedFeature {
    PointerToMember,
    CStyleCast,
    BitwiseNot,
    Sizeof,
    SizeofType,
    StaticCast,
    DynamicCast,
    ReinterpretCast,
    ConstCast,
    ConstructExpression,
}

impl UnsupportedFeature {
    /// Human readable feature name used in diagnostics.
    pub fn feature_name(self) -> &'static str {
        match self {
            UnsupportedFeature::PointerToMember => "pointer-to-member",
            UnsupportedFeature::CStyleCast => "c-style cast",
            UnsupportedFeature::BitwiseNot => "bitwise not",
            UnsupportedFeature::Sizeof => "sizeof",
            UnsupportedFeature::SizeofType => "sizeof (type)",
            UnsupportedFeature::StaticCast => "static cast",
            UnsupportedFeature::DynamicCast => "dynamic cast",
            UnsupportedFeature::ReinterpretCast => "reinterpret cast",
            UnsupportedFeature::ConstCast => "const cast",
            UnsupportedFeature::ConstructExpression => "construct expression",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    NumericLiteral(Literal),
    StringLiteral(String),
    Nullptr,
    This,
    Parentheses(Box<Expr>),
    /// Plain (`x`) or qualified (`A::x`) name; one segment per component.
    Identifier(Vec<String>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    CompoundAssignment {
        op: ArithmeticOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Comma {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Postfix {
        op: IncDec,
        operand: Box<Expr>,
    },
    Subscript {
        operand: Box<Expr>,
        offset: Box<Expr>,
    },
    FunctionCall {
        operand: Box<Expr>,
        args: Vec<Expr>,
    },
    Dot {
        operand: Box<Expr>,
        member: String,
    },
    Arrow {
        operand: Box<Expr>,
        member: String,
    },
    New {
        ty: TypeSpec,
        init: Option<Box<Expr>>,
    },
    NewArray {
        elem: TypeSpec,
        length: Box<Expr>,
    },
    Delete(Box<Expr>),
    DeleteArray(Box<Expr>),
    Opaque(String),
    /// Pattern wildcard; matches anything during equivalence checking.
    Anything,
    Unsupported {
        feature: UnsupportedFeature,
        operands: Vec<Expr>,
    },
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitXor,
    BitOr,
    Shl,
    Shr,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::Rem => "%",
            ArithmeticOp::BitAnd => "&",
            ArithmeticOp::BitXor => "^",
            ArithmeticOp::BitOr => "|",
            ArithmeticOp::Shl => "<<",
            ArithmeticOp::Shr => ">>",
        }
    }

    /// Symbol of the matching compound assignment operator, e.g. `+=`.
    pub fn compound_symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+=",
            ArithmeticOp::Sub => "-=",
            ArithmeticOp::Mul => "*=",
            ArithmeticOp::Div => "/=",
            ArithmeticOp::Rem => "%=",
            ArithmeticOp::BitAnd => "&=",
            ArithmeticOp::BitXor => "^=",
            ArithmeticOp::BitOr => "|=",
            ArithmeticOp::Shl => "<<=",
            ArithmeticOp::Shr => ">>=",
        }
    }

    /// Operators that only accept integral operands.
    pub fn requires_integral(self) -> bool {
        !matches!(
            self,
            ArithmeticOp::Add | ArithmeticOp::Sub | ArithmeticOp::Mul | ArithmeticOp::Div
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, ArithmeticOp::Shl | ArithmeticOp::Shr)
    }

    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            ArithmeticOp::Add
                | ArithmeticOp::Mul
                | ArithmeticOp::BitAnd
                | ArithmeticOp::BitOr
                | ArithmeticOp::BitXor
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl RelationalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RelationalOp::Lt => "<",
            RelationalOp::Gt => ">",
            RelationalOp::Le => "<=",
            RelationalOp::Ge => ">=",
            RelationalOp::Eq => "==",
            RelationalOp::Ne => "!=",
        }
    }

    /// The operator that gives the same answer with operands swapped.
    pub fn swapped(self) -> RelationalOp {
        match self {
            RelationalOp::Lt => RelationalOp::Gt,
            RelationalOp::Gt => RelationalOp::Lt,
            RelationalOp::Le => RelationalOp::Ge,
            RelationalOp::Ge => RelationalOp::Le,
            RelationalOp::Eq => RelationalOp::Eq,
            RelationalOp::Ne => RelationalOp::Ne,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, RelationalOp::Eq | RelationalOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Arithmetic(ArithmeticOp),
    Relational(RelationalOp),
    Logical(LogicalOp),
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Arithmetic(op) => op.symbol(),
            BinaryOp::Relational(op) => op.symbol(),
            BinaryOp::Logical(op) => op.symbol(),
        }
    }
}

impl From<ArithmeticOp> for BinaryOp {
    fn from(op: ArithmeticOp) -> Self {
        BinaryOp::Arithmetic(op)
    }
}

impl From<RelationalOp> for BinaryOp {
    fn from(op: RelationalOp) -> Self {
        BinaryOp::Relational(op)
    }
}

impl From<LogicalOp> for BinaryOp {
    fn from(op: LogicalOp) -> Self {
        BinaryOp::Logical(op)
    }
}

/// Returned when a string does not name a binary operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator `{0}`")]
pub struct UnknownOperator(pub String);

impl FromStr for BinaryOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ArithmeticOp::*;
        let op = match s {
            "+" => Add.into(),
            "-" => Sub.into(),
            "*" => Mul.into(),
            "/" => Div.into(),
            "%" => Rem.into(),
            "&" => BitAnd.into(),
            "^" => BitXor.into(),
            "|" => BitOr.into(),
            "<<" => Shl.into(),
            ">>" => Shr.into(),
            "<" => RelationalOp::Lt.into(),
            ">" => RelationalOp::Gt.into(),
            "<=" => RelationalOp::Le.into(),
            ">=" => RelationalOp::Ge.into(),
            "==" => RelationalOp::Eq.into(),
            "!=" => RelationalOp::Ne.into(),
            "&&" => LogicalOp::And.into(),
            "||" => LogicalOp::Or.into(),
            other => return Err(UnknownOperator(other.into())),
        };
        Ok(op)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncDec {
    Increment,
    Decrement,
}

impl IncDec {
    pub fn symbol(self) -> &'static str {
        match self {
            IncDec::Increment => "++",
            IncDec::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Plus,
    LogicalNot,
    Dereference,
    AddressOf,
    Prefix(IncDec),
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::LogicalNot => "!",
            UnaryOp::Dereference => "*",
            UnaryOp::AddressOf => "&",
            UnaryOp::Prefix(op) => op.symbol(),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Shorthand constructors producing span-less nodes.
pub mod build {
    use super::*;
    use alloc::string::ToString;

    pub fn int(value: i64) -> Expr {
        Expr::new(ExprKind::NumericLiteral(Literal::Int(value)))
    }

    pub fn double(value: f64) -> Expr {
        Expr::new(ExprKind::NumericLiteral(Literal::Double(value)))
    }

    pub fn boolean(value: bool) -> Expr {
        Expr::new(ExprKind::NumericLiteral(Literal::Bool(value)))
    }

    pub fn character(value: u8) -> Expr {
        Expr::new(ExprKind::NumericLiteral(Literal::Char(value)))
    }

    pub fn string(text: &str) -> Expr {
        Expr::new(ExprKind::StringLiteral(text.to_string()))
    }

    pub fn nullptr() -> Expr {
        Expr::new(ExprKind::Nullptr)
    }

    pub fn this() -> Expr {
        Expr::new(ExprKind::This)
    }

    pub fn anything() -> Expr {
        Expr::new(ExprKind::Anything)
    }

    pub fn ident(name: &str) -> Expr {
        Expr::new(ExprKind::Identifier(alloc::vec![name.to_string()]))
    }

    pub fn qualified(path: &[&str]) -> Expr {
        Expr::new(ExprKind::Identifier(
            path.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn paren(inner: Expr) -> Expr {
        Expr::new(ExprKind::Parentheses(Box::new(inner)))
    }

    pub fn binary(op: impl Into<BinaryOp>, left: Expr, right: Expr) -> Expr {
        Expr::new(ExprKind::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::Assignment {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn compound_assign(op: ArithmeticOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::CompoundAssignment {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
        Expr::new(ExprKind::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    pub fn comma(left: Expr, right: Expr) -> Expr {
        Expr::new(ExprKind::Comma {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn deref(operand: Expr) -> Expr {
        unary(UnaryOp::Dereference, operand)
    }

    pub fn address_of(operand: Expr) -> Expr {
        unary(UnaryOp::AddressOf, operand)
    }

    pub fn not(operand: Expr) -> Expr {
        unary(UnaryOp::LogicalNot, operand)
    }

    pub fn pre_inc(operand: Expr) -> Expr {
        unary(UnaryOp::Prefix(IncDec::Increment), operand)
    }

    pub fn pre_dec(operand: Expr) -> Expr {
        unary(UnaryOp::Prefix(IncDec::Decrement), operand)
    }

    pub fn post_inc(operand: Expr) -> Expr {
        Expr::new(ExprKind::Postfix {
            op: IncDec::Increment,
            operand: Box::new(operand),
        })
    }

    pub fn post_dec(operand: Expr) -> Expr {
        Expr::new(ExprKind::Postfix {
            op: IncDec::Decrement,
            operand: Box::new(operand),
        })
    }

    pub fn subscript(operand: Expr, offset: Expr) -> Expr {
        Expr::new(ExprKind::Subscript {
            operand: Box::new(operand),
            offset: Box::new(offset),
        })
    }

    pub fn call(operand: Expr, args: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::FunctionCall {
            operand: Box::new(operand),
            args,
        })
    }

    pub fn dot(operand: Expr, member: &str) -> Expr {
        Expr::new(ExprKind::Dot {
            operand: Box::new(operand),
            member: member.to_string(),
        })
    }

    pub fn arrow(operand: Expr, member: &str) -> Expr {
        Expr::new(ExprKind::Arrow {
            operand: Box::new(operand),
            member: member.to_string(),
        })
    }

    pub fn new_object(ty: TypeSpec, init: Option<Expr>) -> Expr {
        Expr::new(ExprKind::New {
            ty,
            init: init.map(Box::new),
        })
    }

    pub fn new_array(elem: TypeSpec, length: Expr) -> Expr {
        Expr::new(ExprKind::NewArray {
            elem,
            length: Box::new(length),
        })
    }

    pub fn delete(operand: Expr) -> Expr {
        Expr::new(ExprKind::Delete(Box::new(operand)))
    }

    pub fn delete_array(operand: Expr) -> Expr {
        Expr::new(ExprKind::DeleteArray(Box::new(operand)))
    }

    pub fn opaque(id: &str) -> Expr {
        Expr::new(ExprKind::Opaque(id.to_string()))
    }

    pub fn unsupported(feature: UnsupportedFeature, operands: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::Unsupported { feature, operands })
    }
}
