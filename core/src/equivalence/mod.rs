//! Semantic equivalence of compiled expressions.
//!
//! Two construct trees are equivalent when they have the same shape up to a
//! small set of algebraic rewrites:
//!
//! - operands of commutative operators may be swapped, and `a < b` matches
//!   `b > a`;
//! - `x += y` matches `x = x + y` (and `x = y + x` for commutative ops);
//! - an implicit conversion to `bool` matches an explicit `!= 0` or
//!   `!= nullptr` comparison;
//! - `arr[i]` matches `*(arr + i)` and `*(i + arr)`;
//! - `++x` matches `x++` when the result is discarded.
//!
//! Parentheses are transparent and [`ConstructKind::Anything`] matches any
//! subtree. Nothing is evaluated.
//!
//! ## Example
//!
//! ```ignore
//! let subscript = analyze(&ctx, &build::subscript(arr(), i()));
//! let offset = analyze(&ctx, &build::deref(build::binary(ArithmeticOp::Add, arr(), i())));
//! assert!(equivalence::are_equivalent(&subscript, &offset));
//! ```


use crate::analyzer::conversions::is_integer_literal_zero;
use crate::analyzer::{Construct, ConstructKind, ConversionKind};
use crate::ast::{ArithmeticOp, RelationalOp};
use crate::entities::Entity;
use crate::types::same_type;
use tracing::trace;

/// Whether `a` and `b` compute the same thing.
///
/// Both trees are taken to be full expressions, so their results are
/// discarded and prefix and postfix increments of the same operand match.
pub fn are_equivalent<'a>(a: &Construct<'a>, b: &Construct<'a>) -> bool {
    let result = equivalent(a, b, Position::Discarded);
    trace!(left = a.kind_name(), right = b.kind_name(), result, "equivalence");
    result
}

/// Whether the result of the node being compared is used.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Discarded,
    Used,
}

fn strip_parentheses<'c, 'a>(mut construct: &'c Construct<'a>) -> &'c Construct<'a> {
    while let ConstructKind::Parentheses(inner) = construct.kind() {
        construct = inner;
    }
    construct
}

fn equivalent<'a>(a: &Construct<'a>, b: &Construct<'a>, position: Position) -> bool {
    let a = strip_parentheses(a);
    let b = strip_parentheses(b);

    if matches!(a.kind(), ConstructKind::Anything) || matches!(b.kind(), ConstructKind::Anything) {
        return true;
    }

    if rewritten_equivalent(a, b) || rewritten_equivalent(b, a) {
        return true;
    }

    structurally_equivalent(a, b, position)
}

/// Operands compared pairwise with their results in use.
fn pairwise<'a>(a: &[&Construct<'a>], b: &[&Construct<'a>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equivalent(x, y, Position::Used))
}

fn same_or_swapped<'a>(
    (a_left, a_right): (&Construct<'a>, &Construct<'a>),
    (b_left, b_right): (&Construct<'a>, &Construct<'a>),
    swappable: bool,
) -> bool {
    let used = Position::Used;
    (equivalent(a_left, b_left, used) && equivalent(a_right, b_right, used))
        || (swappable && equivalent(a_left, b_right, used) && equivalent(a_right, b_left, used))
}

fn relational_equivalent<'a>(
    (a_op, a_left, a_right): (RelationalOp, &Construct<'a>, &Construct<'a>),
    (b_op, b_left, b_right): (RelationalOp, &Construct<'a>, &Construct<'a>),
) -> bool {
    let used = Position::Used;
    (a_op == b_op && equivalent(a_left, b_left, used) && equivalent(a_right, b_right, used))
        || (a_op.swapped() == b_op
            && equivalent(a_left, b_right, used)
            && equivalent(a_right, b_left, used))
}

fn entities_equivalent<'a>(a: Option<Entity<'a>>, b: Option<Entity<'a>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.is_same(&b) || (a.name() == b.name() && same_type(a.ty(), b.ty()))
        }
        _ => false,
    }
}

/// Rules relating two different construct kinds. Only tried one way round;
/// the caller tries both.
fn rewritten_equivalent<'a>(a: &Construct<'a>, b: &Construct<'a>) -> bool {
    match (a.kind(), b.kind()) {
        (ConstructKind::Assignment { .. }, ConstructKind::CompoundAssignment { .. }) => {
            assignment_equivalence(a, b)
        }
        (
            ConstructKind::ImplicitConversion {
                conversion: ConversionKind::IntegralToBoolean | ConversionKind::FloatingToBoolean,
                ..
            },
            ConstructKind::Relational { .. },
        ) => zero_equivalence(a, b),
        (
            ConstructKind::ImplicitConversion {
                conversion: ConversionKind::PointerToBoolean,
                ..
            },
            ConstructKind::PointerComparison { .. },
        ) => null_pointer_equivalence(a, b),
        (ConstructKind::Subscript { operand, offset }, ConstructKind::Dereference(inner)) => {
            match strip_parentheses(inner).kind() {
                ConstructKind::PointerOffset {
                    op: ArithmeticOp::Add,
                    left,
                    right,
                    pointer_on_left,
                } => {
                    let (pointer, integer) = if *pointer_on_left {
                        (left, right)
                    } else {
                        (right, left)
                    };
                    equivalent(operand, pointer, Position::Used)
                        && equivalent(offset, integer, Position::Used)
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn structurally_equivalent<'a>(a: &Construct<'a>, b: &Construct<'a>, position: Position) -> bool {
    use ConstructKind as K;

    match (a.kind(), b.kind()) {
        (K::NumericLiteral(x), K::NumericLiteral(y)) => {
            same_type(x.ty(), y.ty()) && x.raw() == y.raw()
        }
        (K::StringLiteral(x), K::StringLiteral(y)) => x == y,
        (K::Nullptr, K::Nullptr) | (K::This, K::This) => true,
        (K::Identifier { name: x, entity: ex }, K::Identifier { name: y, entity: ey }) => {
            if ex.is_none() && ey.is_none() {
                x == y
            } else {
                entities_equivalent(*ex, *ey)
            }
        }
        (
            K::Dot {
                operand: ox,
                member: mx,
                entity: ex,
            },
            K::Dot {
                operand: oy,
                member: my,
                entity: ey,
            },
        )
        | (
            K::Arrow {
                operand: ox,
                member: mx,
                entity: ex,
            },
            K::Arrow {
                operand: oy,
                member: my,
                entity: ey,
            },
        ) => {
            let members = if ex.is_none() && ey.is_none() {
                mx == my
            } else {
                entities_equivalent(*ex, *ey)
            };
            members && equivalent(ox, oy, Position::Used)
        }

        (
            K::Arithmetic {
                op: x,
                left: lx,
                right: rx,
            },
            K::Arithmetic {
                op: y,
                left: ly,
                right: ry,
            },
        ) => x == y && same_or_swapped((&**lx, &**rx), (&**ly, &**ry), x.is_commutative()),
        (
            K::Relational {
                op: x,
                left: lx,
                right: rx,
            },
            K::Relational {
                op: y,
                left: ly,
                right: ry,
            },
        )
        | (
            K::PointerComparison {
                op: x,
                left: lx,
                right: rx,
            },
            K::PointerComparison {
                op: y,
                left: ly,
                right: ry,
            },
        ) => relational_equivalent((*x, &**lx, &**rx), (*y, &**ly, &**ry)),
        (
            K::PointerOffset {
                op: x,
                left: lx,
                right: rx,
                pointer_on_left: px,
            },
            K::PointerOffset {
                op: y,
                left: ly,
                right: ry,
                pointer_on_left: py,
            },
        ) => {
            let (pointer_x, integer_x) = if *px { (lx, rx) } else { (rx, lx) };
            let (pointer_y, integer_y) = if *py { (ly, ry) } else { (ry, ly) };
            x == y
                && equivalent(pointer_x, pointer_y, Position::Used)
                && equivalent(integer_x, integer_y, Position::Used)
        }
        (K::Logical { op: x, .. }, K::Logical { op: y, .. }) => {
            x == y && pairwise(&a.children(), &b.children())
        }
        (K::CompoundAssignment { op: x, .. }, K::CompoundAssignment { op: y, .. }) => {
            x == y && pairwise(&a.children(), &b.children())
        }
        (K::PointerDifference { .. }, K::PointerDifference { .. })
        | (K::Output { .. }, K::Output { .. })
        | (K::Input { .. }, K::Input { .. })
        | (K::Assignment { .. }, K::Assignment { .. })
        | (K::Subscript { .. }, K::Subscript { .. })
        | (K::Dereference(_), K::Dereference(_))
        | (K::AddressOf(_), K::AddressOf(_))
        | (K::UnaryMinus(_), K::UnaryMinus(_))
        | (K::UnaryPlus(_), K::UnaryPlus(_))
        | (K::LogicalNot(_), K::LogicalNot(_))
        | (K::Delete { .. }, K::Delete { .. })
        | (K::DeleteArray { .. }, K::DeleteArray { .. }) => pairwise(&a.children(), &b.children()),

        (
            K::Comma {
                left: lx,
                right: rx,
            },
            K::Comma {
                left: ly,
                right: ry,
            },
        ) => equivalent(lx, ly, Position::Discarded) && equivalent(rx, ry, position),
        (
            K::Ternary {
                condition: cx,
                then_branch: tx,
                else_branch: ex,
            },
            K::Ternary {
                condition: cy,
                then_branch: ty,
                else_branch: ey,
            },
        ) => {
            equivalent(cx, cy, Position::Used)
                && equivalent(tx, ty, position)
                && equivalent(ex, ey, position)
        }

        (K::PrefixIncrement { op: x, operand: ox }, K::PrefixIncrement { op: y, operand: oy })
        | (
            K::PostfixIncrement { op: x, operand: ox },
            K::PostfixIncrement { op: y, operand: oy },
        ) => x == y && equivalent(ox, oy, Position::Used),
        (K::PrefixIncrement { op: x, operand: ox }, K::PostfixIncrement { op: y, operand: oy })
        | (
            K::PostfixIncrement { op: x, operand: ox },
            K::PrefixIncrement { op: y, operand: oy },
        ) => position == Position::Discarded && x == y && equivalent(ox, oy, Position::Used),

        (
            K::FunctionCall {
                callee: cx,
                function: fx,
                ..
            },
            K::FunctionCall {
                callee: cy,
                function: fy,
                ..
            },
        ) => {
            let callees = match (*fx, *fy) {
                (Some(fx), Some(fy)) => {
                    entities_equivalent(Some(Entity::Function(fx)), Some(Entity::Function(fy)))
                        && receivers_equivalent(cx, cy)
                }
                _ => equivalent(cx, cy, Position::Used),
            };
            callees && pairwise(&a.children()[1..], &b.children()[1..])
        }
        (K::MagicFunctionCall { function: x, .. }, K::MagicFunctionCall { function: y, .. }) => {
            x == y && pairwise(&a.children(), &b.children())
        }
        (
            K::OperatorOverload {
                op: x,
                function: fx,
                ..
            },
            K::OperatorOverload {
                op: y,
                function: fy,
                ..
            },
        ) => x == y && core::ptr::eq(*fx, *fy) && pairwise(&a.children(), &b.children()),
        (K::InvalidOperatorOverload { op: x, .. }, K::InvalidOperatorOverload { op: y, .. }) => {
            x == y && pairwise(&a.children(), &b.children())
        }

        (K::New { allocated: x, .. }, K::New { allocated: y, .. }) => {
            same_type(x, y) && pairwise(&a.children(), &b.children())
        }
        (K::NewArray { elem: x, .. }, K::NewArray { elem: y, .. }) => {
            same_type(x, y) && pairwise(&a.children(), &b.children())
        }

        (
            K::ImplicitConversion {
                conversion: x,
                from: fx,
                ..
            },
            K::ImplicitConversion {
                conversion: y,
                from: fy,
                ..
            },
        ) => x == y && equivalent(fx, fy, Position::Used),

        (K::Opaque { id: x, .. }, K::Opaque { id: y, .. }) => x == y,
        (K::Auxiliary, K::Auxiliary) => match (a.ty(), b.ty()) {
            (Some(x), Some(y)) => same_type(x, y),
            _ => false,
        },
        (
            K::Unsupported {
                feature: x,
                operands: ox,
            },
            K::Unsupported {
                feature: y,
                operands: oy,
            },
        ) => {
            x == y
                && ox.len() == oy.len()
                && ox.iter().zip(oy).all(|(l, r)| equivalent(l, r, Position::Used))
        }

        _ => false,
    }
}

/// Member function calls also compare the object they are called on.
fn receivers_equivalent<'a>(a: &Construct<'a>, b: &Construct<'a>) -> bool {
    let receiver = |callee: &Construct<'a>| match strip_parentheses(callee).kind() {
        ConstructKind::Dot { .. } | ConstructKind::Arrow { .. } => true,
        _ => false,
    };
    match (receiver(a), receiver(b)) {
        (true, true) => equivalent(a, b, Position::Used),
        (false, false) => true,
        _ => false,
    }
}

/// `x = x op y` (or `x = y op x` for commutative `op`) against `x op= y`.
///
/// Returns false unless `assignment` is an assignment and `compound` a
/// compound assignment.
pub fn assignment_equivalence<'a>(assignment: &Construct<'a>, compound: &Construct<'a>) -> bool {
    let (
        ConstructKind::Assignment { lhs, rhs },
        ConstructKind::CompoundAssignment {
            op,
            lhs: target,
            rhs: operand,
        },
    ) = (assignment.kind(), compound.kind())
    else {
        return false;
    };

    if !equivalent(lhs, target, Position::Used) {
        return false;
    }

    // The rhs is usually converted back to the target's type, and the
    // target is read through an lvalue-to-rvalue conversion inside it.
    let used = Position::Used;
    let is_target = |side: &Construct<'a>| equivalent(strip_conversions(side), target, used);
    match strip_conversions(rhs).kind() {
        ConstructKind::Arithmetic {
            op: binary,
            left,
            right,
        } if binary == op => {
            (is_target(left) && equivalent(right, operand, used))
                || (op.is_commutative() && is_target(right) && equivalent(left, operand, used))
        }
        ConstructKind::PointerOffset {
            op: binary,
            left,
            right,
            pointer_on_left,
        } if binary == op => {
            let (pointer, integer) = if *pointer_on_left {
                (left, right)
            } else {
                (right, left)
            };
            is_target(pointer) && equivalent(integer, operand, used)
        }
        _ => false,
    }
}

fn strip_conversions<'c, 'a>(construct: &'c Construct<'a>) -> &'c Construct<'a> {
    let mut construct = strip_parentheses(construct);
    while let ConstructKind::ImplicitConversion { from, .. } = construct.kind() {
        construct = strip_parentheses(from);
    }
    construct
}

/// A literal zero, possibly behind conversions.
fn is_equivalent_to_zero<'a>(construct: &Construct<'a>) -> bool {
    let construct = strip_parentheses(construct);
    match construct.kind() {
        ConstructKind::ImplicitConversion { from, .. } => is_equivalent_to_zero(from),
        _ => is_integer_literal_zero(construct),
    }
}

/// An arithmetic-to-`bool` conversion of `e` against `e != 0` or `0 != e`.
pub fn zero_equivalence<'a>(conversion: &Construct<'a>, comparison: &Construct<'a>) -> bool {
    let (
        ConstructKind::ImplicitConversion { from, .. },
        ConstructKind::Relational {
            op: RelationalOp::Ne,
            left,
            right,
        },
    ) = (conversion.kind(), comparison.kind())
    else {
        return false;
    };

    let matches = |operand: &Construct<'a>, other: &Construct<'a>| {
        operand_equivalent(from, operand) && is_equivalent_to_zero(other)
    };
    matches(left, right) || matches(right, left)
}

/// Compares the converted operand against one side of a comparison, which
/// may have been promoted on the way.
fn operand_equivalent<'a>(operand: &Construct<'a>, side: &Construct<'a>) -> bool {
    if equivalent(operand, side, Position::Used) {
        return true;
    }
    match strip_parentheses(side).kind() {
        ConstructKind::ImplicitConversion {
            conversion:
                ConversionKind::IntegralPromotion
                | ConversionKind::IntegralToFloating
                | ConversionKind::FloatingPointPromotion,
            from,
            ..
        } => equivalent(operand, from, Position::Used),
        _ => false,
    }
}

/// A pointer-to-`bool` conversion of `p` against `p != 0`, `p != nullptr`
/// or the same with the operands swapped.
pub fn null_pointer_equivalence<'a>(
    conversion: &Construct<'a>,
    comparison: &Construct<'a>,
) -> bool {
    let (
        ConstructKind::ImplicitConversion { from, .. },
        ConstructKind::PointerComparison {
            op: RelationalOp::Ne,
            left,
            right,
        },
    ) = (conversion.kind(), comparison.kind())
    else {
        return false;
    };

    let is_null = |side: &Construct<'a>| {
        matches!(
            strip_parentheses(side).kind(),
            ConstructKind::ImplicitConversion {
                conversion: ConversionKind::NullPointerConversion,
                ..
            }
        )
    };
    (equivalent(from, left, Position::Used) && is_null(right))
        || (equivalent(from, right, Position::Used) && is_null(left))
}
