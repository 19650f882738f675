//! Implicit conversions.
//!
//! These functions never fail. When an expression cannot be converted it is
//! returned unchanged and the caller reports a mismatch after comparing the
//! resulting type with the one it wanted.

use super::construct::{Construct, ConstructKind, ConversionKind, ValueCategory};
use crate::types::{
    Type, TypeManager, is_cv_convertible, is_derived_pointer, same_type, similar_type,
};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionOptions {
    /// Leave lvalues as lvalues (array decay still applies).
    pub suppress_ltr: bool,
}

fn wrap<'a>(conversion: ConversionKind, from: Construct<'a>, ty: &'a Type<'a>) -> Construct<'a> {
    trace!(conversion = conversion.name(), to = %ty, "inserting conversion");
    Construct::conversion(conversion, from, ty, ValueCategory::Prvalue)
}

/// Applies array-to-pointer or lvalue-to-rvalue conversion, so the result
/// is a prvalue whenever the operand is a scalar or an array.
pub fn convert_to_prvalue<'a>(types: &'a TypeManager<'a>, expr: Construct<'a>) -> Construct<'a> {
    let Some(ty) = expr.well_typed() else {
        return expr;
    };
    if !expr.is_lvalue() {
        return expr;
    }
    if let Some(elem) = ty.array_elem() {
        return wrap(ConversionKind::ArrayToPointer, expr, types.pointer(elem));
    }
    if ty.is_atomic() {
        return wrap(ConversionKind::LValueToRValue, expr, types.cv_unqualified(ty));
    }
    expr
}

/// Standard conversion sequence of `expr` towards `target`.
pub fn standard_conversion<'a>(
    types: &'a TypeManager<'a>,
    expr: Construct<'a>,
    target: &'a Type<'a>,
    options: ConversionOptions,
) -> Construct<'a> {
    let Some(ty) = expr.well_typed() else {
        return expr;
    };

    if target.is_bool() && (ty.is_class_named("istream") || ty.is_class_named("ostream")) {
        return wrap(ConversionKind::StreamToBool, expr, types.bool());
    }

    let decays = expr.is_lvalue() && ty.is_bounded_array();
    if !ty.is_atomic() && !decays {
        return expr;
    }

    let expr = if options.suppress_ltr && !decays {
        expr
    } else {
        convert_to_prvalue(types, expr)
    };
    let expr = type_conversion(types, expr, target);
    qualification_conversion(types, expr, target)
}

/// Numeric, pointer and boolean conversions of a prvalue.
///
/// The checks run in a fixed order: similar types need nothing, then null
/// pointer, derived-to-base pointer, to-bool, float-to-double, to-integral
/// and to-floating conversions are tried.
pub fn type_conversion<'a>(
    types: &'a TypeManager<'a>,
    expr: Construct<'a>,
    target: &'a Type<'a>,
) -> Construct<'a> {
    let Some(ty) = expr.well_typed() else {
        return expr;
    };
    if !expr.is_prvalue() {
        return expr;
    }

    if similar_type(ty, target) {
        return expr;
    }

    let unqualified = types.cv_unqualified(target);

    if target.is_pointer() && is_integer_literal_zero(&expr) {
        return wrap(ConversionKind::NullPointerConversion, expr, unqualified);
    }

    if is_derived_pointer(ty, target) {
        if let (Some(from_pointee), Some(to_pointee)) = (ty.pointee(), target.pointee()) {
            // Keep the source's pointee qualifiers; qualification
            // conversion adjusts them afterwards.
            let base = types.with_cv(to_pointee, from_pointee.cv());
            return wrap(ConversionKind::PointerConversion, expr, types.pointer(base));
        }
    }

    if target.is_bool() {
        let conversion = if ty.is_pointer() {
            Some(ConversionKind::PointerToBoolean)
        } else if ty.is_floating() {
            Some(ConversionKind::FloatingToBoolean)
        } else if ty.is_integral() {
            Some(ConversionKind::IntegralToBoolean)
        } else {
            None
        };
        return match conversion {
            Some(conversion) => wrap(conversion, expr, unqualified),
            None => expr,
        };
    }

    if target.is_double() && ty.is_float() {
        return wrap(ConversionKind::FloatingPointPromotion, expr, unqualified);
    }

    if target.is_integral() {
        if ty.is_integral() {
            return wrap(ConversionKind::IntegralConversion, expr, unqualified);
        }
        if ty.is_floating() {
            return wrap(ConversionKind::FloatingToIntegral, expr, unqualified);
        }
    }

    if target.is_floating() {
        if ty.is_floating() {
            return wrap(ConversionKind::FloatingPointConversion, expr, unqualified);
        }
        if ty.is_integral() {
            return wrap(ConversionKind::IntegralToFloating, expr, unqualified);
        }
    }

    expr
}

/// Adds qualifiers below the top level of a prvalue, e.g. `int*` to
/// `const int*`.
pub fn qualification_conversion<'a>(
    types: &'a TypeManager<'a>,
    expr: Construct<'a>,
    target: &'a Type<'a>,
) -> Construct<'a> {
    let Some(ty) = expr.well_typed() else {
        return expr;
    };
    if !expr.is_prvalue() {
        return expr;
    }
    let target = types.cv_unqualified(target);
    if same_type(types.cv_unqualified(ty), target) {
        return expr;
    }
    if similar_type(ty, target) && is_cv_convertible(ty, target) {
        return wrap(ConversionKind::QualificationConversion, expr, target);
    }
    expr
}

/// Promotes `bool` and `char` prvalues to `int`.
pub fn integral_promotion<'a>(types: &'a TypeManager<'a>, expr: Construct<'a>) -> Construct<'a> {
    let Some(ty) = expr.well_typed() else {
        return expr;
    };
    if expr.is_prvalue() && ty.is_integral() && !ty.is_int() {
        return wrap(ConversionKind::IntegralPromotion, expr, types.int());
    }
    expr
}

/// Brings two arithmetic operands to a common type.
///
/// Mismatched results (e.g. when an operand is not arithmetic) are left for
/// the caller to diagnose.
pub fn usual_arithmetic_conversions<'a>(
    types: &'a TypeManager<'a>,
    left: Construct<'a>,
    right: Construct<'a>,
) -> (Construct<'a>, Construct<'a>) {
    let left = convert_to_prvalue(types, left);
    let right = convert_to_prvalue(types, right);

    let (Some(lt), Some(rt)) = (left.well_typed(), right.well_typed()) else {
        return (left, right);
    };
    if !lt.is_arithmetic() || !rt.is_arithmetic() {
        return (left, right);
    }

    if lt.is_double() || rt.is_double() {
        let double = types.double();
        return (
            type_conversion(types, left, double),
            type_conversion(types, right, double),
        );
    }
    if lt.is_float() || rt.is_float() {
        let float = types.float();
        return (
            type_conversion(types, left, float),
            type_conversion(types, right, float),
        );
    }
    (
        integral_promotion(types, left),
        integral_promotion(types, right),
    )
}

/// Whether `expr` is the literal `0` (or `nullptr`), looking through
/// parentheses and implicit conversions.
pub fn is_integer_literal_zero(expr: &Construct<'_>) -> bool {
    match expr.kind() {
        ConstructKind::NumericLiteral(value) => value.ty().is_integral() && value.as_i64() == 0,
        ConstructKind::Nullptr => true,
        ConstructKind::ImplicitConversion { from, .. } => is_integer_literal_zero(from),
        ConstructKind::Parentheses(inner) => is_integer_literal_zero(inner),
        _ => false,
    }
}

/// Whether an expression of type `ty` and `category` standard-converts to
/// a prvalue of `target` (ignoring `target`'s top-level qualifiers).
pub fn is_convertible<'a>(
    types: &'a TypeManager<'a>,
    ty: &'a Type<'a>,
    category: ValueCategory,
    target: &'a Type<'a>,
) -> bool {
    let probe = Construct::auxiliary(ty, category);
    let converted = standard_conversion(types, probe, target, ConversionOptions::default());
    converted.is_prvalue()
        && converted
            .ty()
            .is_some_and(|t| same_type(types.cv_unqualified(t), types.cv_unqualified(target)))
}
