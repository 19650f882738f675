use super::construct::{Construct, ConstructKind, ConversionKind, ValueCategory};
use super::conversions::*;
use crate::ast::build as b;
use crate::testing::Fixture;
use crate::types::{ArithmeticKind, Type};
use crate::vec;
use bumpalo::Bump;
use pretty_assertions::assert_eq;

/// Conversion kinds from the outermost node inwards.
fn chain(construct: &Construct<'_>) -> crate::Vec<ConversionKind> {
    let mut kinds = vec![];
    let mut current = construct;
    while let ConstructKind::ImplicitConversion {
        conversion, from, ..
    } = current.kind()
    {
        kinds.push(*conversion);
        current = from;
    }
    kinds
}

fn lvalue<'a>(ty: &'a Type<'a>) -> Construct<'a> {
    Construct::auxiliary(ty, ValueCategory::Lvalue)
}

const ARITHMETIC: [ArithmeticKind; 5] = [
    ArithmeticKind::Bool,
    ArithmeticKind::Char,
    ArithmeticKind::Int,
    ArithmeticKind::Float,
    ArithmeticKind::Double,
];

fn prvalue<'a>(ty: &'a Type<'a>) -> Construct<'a> {
    Construct::auxiliary(ty, ValueCategory::Prvalue)
}

// ============================================================================
// Value Category Conversions
// ============================================================================

#[test]
fn test_lvalue_to_rvalue_drops_top_level_const() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let converted = convert_to_prvalue(tm, lvalue(tm.const_of(tm.int())));
    assert_eq!(chain(&converted), vec![ConversionKind::LValueToRValue]);
    assert_eq!(converted.ty().map(|t| t.to_string()).as_deref(), Some("int"));
    assert!(converted.is_prvalue());
}

#[test]
fn test_array_decays_to_pointer() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let converted = convert_to_prvalue(tm, lvalue(tm.array(tm.int(), 5)));
    assert_eq!(chain(&converted), vec![ConversionKind::ArrayToPointer]);
    assert!(converted.ty().is_some_and(|t| core::ptr::eq(t, tm.pointer(tm.int()))));
}

#[test]
fn test_class_lvalue_is_left_alone() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let converted = convert_to_prvalue(tm, lvalue(tm.class(fx.point)));
    assert!(chain(&converted).is_empty());
    assert!(converted.is_lvalue());
}

#[test]
fn test_suppressed_ltr_keeps_lvalue() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;
    let options = ConversionOptions { suppress_ltr: true };

    let converted = standard_conversion(tm, lvalue(tm.int()), tm.int(), options);
    assert!(converted.is_lvalue());
    assert!(chain(&converted).is_empty());
}

#[test]
fn test_convert_to_prvalue_is_idempotent() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let mut operand_types: crate::Vec<&Type<'_>> = ARITHMETIC
        .iter()
        .flat_map(|&kind| [tm.arithmetic(kind), tm.const_of(tm.arithmetic(kind))])
        .collect();
    operand_types.extend([
        tm.pointer(tm.int()),
        tm.array(tm.int(), 4),
        tm.array(tm.const_of(tm.char()), 6),
        tm.class(fx.point),
        tm.function(&[tm.int()], tm.void()),
    ]);

    for ty in operand_types {
        for category in [ValueCategory::Lvalue, ValueCategory::Prvalue] {
            let make = || Construct::auxiliary(ty, category);
            let once = convert_to_prvalue(tm, make());
            let twice = convert_to_prvalue(tm, convert_to_prvalue(tm, make()));
            assert_eq!(chain(&once), chain(&twice), "{ty} {category:?}");
            assert_eq!(once.value_category(), twice.value_category(), "{ty} {category:?}");
            assert!(
                matches!((once.ty(), twice.ty()), (Some(a), Some(b)) if core::ptr::eq(a, b)),
                "{ty} {category:?}"
            );
        }
    }
}

// ============================================================================
// Standard Conversion Sequences
// ============================================================================

#[test]
fn test_integral_to_floating_chain() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let options = ConversionOptions::default();
    let converted = standard_conversion(tm, lvalue(tm.int()), tm.double(), options);
    assert_eq!(
        chain(&converted),
        vec![ConversionKind::IntegralToFloating, ConversionKind::LValueToRValue]
    );
    assert_eq!(converted.conversion_length(), 2);
}

#[test]
fn test_float_promotes_to_double() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let converted = type_conversion(tm, prvalue(tm.float()), tm.double());
    assert_eq!(chain(&converted), vec![ConversionKind::FloatingPointPromotion]);

    let converted = type_conversion(tm, prvalue(tm.double()), tm.float());
    assert_eq!(chain(&converted), vec![ConversionKind::FloatingPointConversion]);
}

#[test]
fn test_conversions_to_bool() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let cases = [
        (prvalue(tm.int()), ConversionKind::IntegralToBoolean),
        (prvalue(tm.double()), ConversionKind::FloatingToBoolean),
        (prvalue(tm.pointer(tm.int())), ConversionKind::PointerToBoolean),
        (lvalue(fx.cin.ty), ConversionKind::StreamToBool),
    ];
    for (operand, expected) in cases {
        let converted = standard_conversion(tm, operand, tm.bool(), ConversionOptions::default());
        assert_eq!(chain(&converted).first(), Some(&expected));
        assert!(converted.ty().is_some_and(|t| t.is_bool()));
    }
}

#[test]
fn test_null_pointer_constant() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;
    let int_ptr = tm.pointer(tm.int());

    let zero = fx.compile(&b::int(0));
    let converted = standard_conversion(tm, zero, int_ptr, ConversionOptions::default());
    assert_eq!(chain(&converted), vec![ConversionKind::NullPointerConversion]);

    let one = fx.compile(&b::int(1));
    let converted = standard_conversion(tm, one, int_ptr, ConversionOptions::default());
    assert!(chain(&converted).is_empty());
    assert!(converted.ty().is_some_and(|t| t.is_int()));

    // A variable holding zero is not a null pointer constant.
    let variable = fx.compile(&b::ident("x"));
    let converted = standard_conversion(tm, variable, int_ptr, ConversionOptions::default());
    assert!(converted.ty().is_some_and(|t| t.is_int()));
}

#[test]
fn test_derived_to_base_pointer_keeps_pointee_qualifiers() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;
    let derived = tm.class(fx.derived);
    let base = tm.class(fx.base);

    let converted = type_conversion(tm, prvalue(tm.pointer(derived)), tm.pointer(base));
    assert_eq!(chain(&converted), vec![ConversionKind::PointerConversion]);

    let from_const = prvalue(tm.pointer(tm.const_of(derived)));
    let converted = standard_conversion(
        tm,
        from_const,
        tm.pointer(tm.const_of(base)),
        ConversionOptions::default(),
    );
    assert_eq!(chain(&converted), vec![ConversionKind::PointerConversion]);
    assert_eq!(
        converted.ty().map(|t| t.to_string()).as_deref(),
        Some("const Base*")
    );
}

#[test]
fn test_qualification_conversion() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;
    let int_ptr = tm.pointer(tm.int());
    let const_int_ptr = tm.pointer(tm.const_of(tm.int()));

    let converted = qualification_conversion(tm, prvalue(int_ptr), const_int_ptr);
    assert_eq!(chain(&converted), vec![ConversionKind::QualificationConversion]);

    let converted = qualification_conversion(tm, prvalue(const_int_ptr), int_ptr);
    assert!(chain(&converted).is_empty());
}

#[test]
fn test_integral_promotion_only_widens_small_types() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let promoted = integral_promotion(tm, prvalue(tm.bool()));
    assert_eq!(chain(&promoted), vec![ConversionKind::IntegralPromotion]);
    let promoted = integral_promotion(tm, prvalue(tm.int()));
    assert!(chain(&promoted).is_empty());
    let promoted = integral_promotion(tm, prvalue(tm.double()));
    assert!(chain(&promoted).is_empty());
}

#[test]
fn test_usual_arithmetic_conversions() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;

    let (left, right) = usual_arithmetic_conversions(tm, prvalue(tm.float()), prvalue(tm.int()));
    assert!(left.ty().is_some_and(|t| t.is_float()));
    assert_eq!(chain(&right), vec![ConversionKind::IntegralToFloating]);

    let (left, right) = usual_arithmetic_conversions(tm, prvalue(tm.char()), prvalue(tm.bool()));
    assert!(left.ty().is_some_and(|t| t.is_int()));
    assert!(right.ty().is_some_and(|t| t.is_int()));

    let (left, right) = usual_arithmetic_conversions(tm, prvalue(tm.float()), prvalue(tm.double()));
    assert_eq!(chain(&left), vec![ConversionKind::FloatingPointPromotion]);
    assert!(chain(&right).is_empty());
}

#[test]
fn test_usual_arithmetic_conversions_are_symmetric() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;
    let operand = |kind, category| Construct::auxiliary(tm.arithmetic(kind), category);

    for a in ARITHMETIC {
        for b in ARITHMETIC {
            for category in [ValueCategory::Lvalue, ValueCategory::Prvalue] {
                let (l1, r1) = usual_arithmetic_conversions(
                    tm,
                    operand(a, category),
                    operand(b, ValueCategory::Lvalue),
                );
                let (l2, r2) = usual_arithmetic_conversions(
                    tm,
                    operand(b, ValueCategory::Lvalue),
                    operand(a, category),
                );
                let common = l1.ty().map(|t| t.to_string());
                assert_eq!(r1.ty().map(|t| t.to_string()), common, "{a:?} {b:?}");
                assert_eq!(l2.ty().map(|t| t.to_string()), common, "{a:?} {b:?}");
                assert_eq!(r2.ty().map(|t| t.to_string()), common, "{a:?} {b:?}");
                assert!(l1.is_prvalue() && r1.is_prvalue() && l2.is_prvalue() && r2.is_prvalue());
            }
        }
    }
}

// ============================================================================
// Convertibility
// ============================================================================

#[test]
fn test_is_convertible() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let tm = fx.types;
    let int = tm.int();
    let lv = ValueCategory::Lvalue;

    assert!(is_convertible(tm, int, lv, tm.double()));
    assert!(is_convertible(tm, tm.pointer(int), lv, tm.bool()));
    assert!(is_convertible(tm, tm.array(int, 3), lv, tm.pointer(int)));
    assert!(is_convertible(tm, tm.pointer(int), lv, tm.pointer(tm.const_of(int))));
    assert!(is_convertible(tm, fx.derp.ty, lv, fx.bp.ty));
    assert!(is_convertible(tm, fx.cin.ty, lv, tm.bool()));
    assert!(is_convertible(tm, int, lv, tm.const_of(int)));

    assert!(!is_convertible(tm, tm.pointer(int), lv, tm.pointer(tm.double())));
    assert!(!is_convertible(tm, tm.pointer(tm.const_of(int)), lv, tm.pointer(int)));
    assert!(!is_convertible(tm, fx.bp.ty, lv, fx.derp.ty));
    assert!(!is_convertible(tm, fx.pt.ty, lv, int));
    assert!(!is_convertible(tm, int, lv, tm.pointer(int)));
}
