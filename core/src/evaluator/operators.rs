//! Runtime semantics of the built-in arithmetic operators.
//!
//! These work on plain [`Value`]s and never touch the host. Anything the
//! C++ program should be told about comes back as an [`Issue`] next to the
//! result; the caller turns it into a simulation event.

use super::events::SimulationEventKind;
use crate::ast::ArithmeticOp;
use crate::types::{ArithmeticKind, Type, TypeManager};
use crate::values::Value;
use crate::{String, format};

/// Something worth reporting about an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: SimulationEventKind,
    pub message: String,
}

impl Issue {
    fn undefined(message: impl Into<String>) -> Self {
        Issue {
            kind: SimulationEventKind::UndefinedBehavior,
            message: message.into(),
        }
    }

    fn implementation_defined(message: impl Into<String>) -> Self {
        Issue {
            kind: SimulationEventKind::ImplementationDefinedBehavior,
            message: message.into(),
        }
    }
}

/// `left op right` on operands already converted to a common type.
///
/// Integer division or modulo by zero, out-of-range shift counts and
/// signed `int` overflow are undefined; the result of each is invalid.
/// Right-shifting a negative value keeps the sign but is reported as
/// implementation-defined.
pub fn binary<'a>(
    op: ArithmeticOp,
    left: Value<'a>,
    right: Value<'a>,
) -> (Value<'a>, Option<Issue>) {
    let kind = left.ty().arithmetic_kind();
    if !kind.is_some_and(ArithmeticKind::is_integral) {
        return (left.combine(&right, op), None);
    }

    let (a, b) = (left.as_i64(), right.as_i64());
    match op {
        ArithmeticOp::Div | ArithmeticOp::Rem if b == 0 => {
            let result = left.combine(&right, op).invalidated();
            return (result, Some(Issue::undefined("Division by zero")));
        }
        ArithmeticOp::Shl | ArithmeticOp::Shr => {
            let width = kind.map_or(32, ArithmeticKind::bit_width) as i64;
            if !(0..width).contains(&b) {
                let message = format!(
                    "Shifting by {} is undefined for a {}-bit operand",
                    b, width
                );
                let result = left.combine(&right, op).invalidated();
                return (result, Some(Issue::undefined(message)));
            }
            if op == ArithmeticOp::Shl && a < 0 {
                let result = left.combine(&right, op).invalidated();
                return (result, Some(Issue::undefined("Left shift of a negative value")));
            }
            if op == ArithmeticOp::Shr && a < 0 {
                let issue = Issue::implementation_defined(
                    "Right shift of a negative value; the sign bit is kept",
                );
                return (left.combine(&right, op), Some(issue));
            }
        }
        _ => {}
    }

    let result = left.combine(&right, op);
    if kind == Some(ArithmeticKind::Int) && overflows_int(op, a, b) {
        let message = format!("Signed integer overflow in {} {} {}", a, op.symbol(), b);
        return (result.invalidated(), Some(Issue::undefined(message)));
    }
    (result, None)
}

fn overflows_int(op: ArithmeticOp, a: i64, b: i64) -> bool {
    let exact = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div | ArithmeticOp::Rem if b != 0 => a / b,
        _ => return false,
    };
    i32::try_from(exact).is_err()
}

/// Converts `value` to the arithmetic or pointer type `ty`.
///
/// A floating value that does not fit an integral target is undefined.
pub fn convert<'a>(value: Value<'a>, ty: &'a Type<'a>) -> (Value<'a>, Option<Issue>) {
    let result = value.convert(ty);
    let out_of_range = value.ty().is_floating()
        && matches!(
            ty.arithmetic_kind(),
            Some(ArithmeticKind::Int | ArithmeticKind::Char)
        )
        && {
            // Truncation toward zero keeps anything strictly inside (min - 1, max + 1).
            let v = value.as_f64();
            let (min, max) = match ty.arithmetic_kind() {
                Some(ArithmeticKind::Char) => (i8::MIN as f64, i8::MAX as f64),
                _ => (i32::MIN as f64, i32::MAX as f64),
            };
            !(v > min - 1.0 && v < max + 1.0)
        };
    if out_of_range && value.is_valid() {
        let message = format!("{} does not fit in {}", value, ty);
        return (result.invalidated(), Some(Issue::undefined(message)));
    }
    (result, None)
}

/// Common type of the usual arithmetic conversions for two arithmetic
/// types.
pub fn common_type<'a>(
    types: &'a TypeManager<'a>,
    a: &'a Type<'a>,
    b: &'a Type<'a>,
) -> &'a Type<'a> {
    let rank = |ty: &Type<'_>| ty.arithmetic_kind().unwrap_or(ArithmeticKind::Int);
    match rank(a).max(rank(b)) {
        ArithmeticKind::Double => types.double(),
        ArithmeticKind::Float => types.float(),
        _ => types.int(),
    }
}

/// `lhs op= rhs` on arithmetic operands.
///
/// The operation runs in the common type of the lhs and rhs types (or the
/// promoted lhs type for shifts) and the result is converted back to the
/// lhs type.
pub fn compound<'a>(
    types: &'a TypeManager<'a>,
    op: ArithmeticOp,
    lhs: Value<'a>,
    rhs: Value<'a>,
) -> (Value<'a>, Option<Issue>) {
    let lhs_ty = types.cv_unqualified(lhs.ty());
    let (left_ty, right_ty) = if op.is_shift() {
        (common_type(types, lhs_ty, types.int()), types.int())
    } else {
        let common = common_type(types, lhs_ty, rhs.ty());
        (common, common)
    };
    let (result, issue) = binary(op, lhs.convert(left_ty), rhs.convert(right_ty));
    match issue {
        Some(issue) => (result.convert(lhs_ty), Some(issue)),
        None => convert(result, lhs_ty),
    }
}

/// `value + 1` or `value - 1` for `++` and `--`, in the operand's type.
pub fn step<'a>(
    types: &'a TypeManager<'a>,
    value: Value<'a>,
    decrement: bool,
) -> (Value<'a>, Option<Issue>) {
    let one = Value::int(types, 1);
    let op = if decrement {
        ArithmeticOp::Sub
    } else {
        ArithmeticOp::Add
    };
    compound(types, op, value, one)
}
