use crate::{
    ast::{ArithmeticOp, RelationalOp},
    types::{Cv, TypeManager},
    values::{RawValue, Value},
};
use pretty_assertions::assert_eq;

#[test]
fn test_int_wraps_to_32_bits() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let max = Value::int(types, i32::MAX as i64);
    let one = Value::int(types, 1);
    let sum = max.combine(&one, ArithmeticOp::Add);

    assert_eq!(sum.as_i64(), i32::MIN as i64);
    assert!(sum.is_valid());
}

#[test]
fn test_char_and_bool_normalization() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let c = Value::new(RawValue::Integral(300), types.char(), true);
    assert_eq!(c.as_i64(), 44);

    let b = Value::new(RawValue::Integral(42), types.bool(), true);
    assert_eq!(b.as_i64(), 1);
}

#[test]
fn test_float_rounds_to_single_precision() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let f = Value::new(RawValue::Floating(0.1), types.float(), true);
    assert_eq!(f.as_f64(), 0.1f32 as f64);
}

#[test]
fn test_integer_division_by_zero_is_invalid() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let result = Value::int(types, 7).combine(&Value::int(types, 0), ArithmeticOp::Div);
    assert!(!result.is_valid());

    let result = Value::int(types, 7).combine(&Value::int(types, 0), ArithmeticOp::Rem);
    assert!(!result.is_valid());
}

#[test]
fn test_floating_division_by_zero_is_infinite() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let result = Value::double(types, 1.0).combine(&Value::double(types, 0.0), ArithmeticOp::Div);
    assert!(result.is_valid());
    assert!(result.as_f64().is_infinite());
}

#[test]
fn test_integer_division_truncates_toward_zero() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let q = Value::int(types, -7).combine(&Value::int(types, 2), ArithmeticOp::Div);
    let r = Value::int(types, -7).combine(&Value::int(types, 2), ArithmeticOp::Rem);
    assert_eq!(q.as_i64(), -3);
    assert_eq!(r.as_i64(), -1);
}

#[test]
fn test_right_shift_keeps_sign() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let result = Value::int(types, -8).combine(&Value::int(types, 1), ArithmeticOp::Shr);
    assert_eq!(result.as_i64(), -4);
}

#[test]
fn test_compare_yields_bool() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let lt = Value::int(types, 1).compare(&Value::int(types, 2), RelationalOp::Lt, types);
    assert!(lt.ty().is_bool());
    assert!(lt.is_truthy());

    let nan = Value::double(types, f64::NAN);
    assert!(!nan.compare(&nan, RelationalOp::Eq, types).is_truthy());
    assert!(nan.compare(&nan, RelationalOp::Ne, types).is_truthy());
}

#[test]
fn test_invalid_operand_taints_result() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let bad = Value::int(types, 3).invalidated();
    let result = bad.combine(&Value::int(types, 4), ArithmeticOp::Mul);
    assert_eq!(result.as_i64(), 12);
    assert!(!result.is_valid());
}

#[test]
fn test_pointer_offset_scales_by_element_size() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let int_ptr = types.pointer(types.int());
    let p = Value::pointer(int_ptr, 1000);

    let forward = p.pointer_offset(&Value::int(types, 3), false);
    assert_eq!(forward.address(), 1012);

    let back = forward.pointer_offset(&Value::int(types, 1), true);
    assert_eq!(back.address(), 1008);

    let diff = forward.pointer_difference(&p, types);
    assert!(diff.ty().is_int());
    assert_eq!(diff.as_i64(), 3);
}

#[test]
fn test_negate_and_not() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    assert_eq!(Value::int(types, 5).arithmetic_negate().as_i64(), -5);
    assert_eq!(Value::double(types, 2.5).arithmetic_negate().as_f64(), -2.5);
    assert!(!Value::bool(types, true).logical_not().is_truthy());
}

#[test]
fn test_convert_between_kinds() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    assert_eq!(Value::double(types, 3.9).convert(types.int()).as_i64(), 3);
    assert_eq!(Value::double(types, -3.9).convert(types.int()).as_i64(), -3);
    assert_eq!(Value::double(types, 0.5).convert(types.bool()).as_i64(), 1);
    assert_eq!(Value::int(types, 2).convert(types.double()).as_f64(), 2.0);
}

#[test]
fn test_cv_qualification_keeps_payload() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    let v = Value::int(types, 9);
    let c = v.cv_qualified(types, Cv::CONST);
    assert!(c.ty().is_const());
    assert_eq!(c.as_i64(), 9);
    assert!(core::ptr::eq(c.cv_unqualified(types).ty(), types.int()));
}

#[test]
fn test_display() {
    let arena = bumpalo::Bump::new();
    let types = TypeManager::new(&arena);

    assert_eq!(Value::int(types, -12).to_string(), "-12");
    assert_eq!(Value::char(types, b'a').to_string(), "a");
    assert_eq!(Value::bool(types, true).to_string(), "1");
    assert_eq!(Value::double(types, 2.5).to_string(), "2.5");
    assert_eq!(Value::int(types, 1).invalidated().to_string(), "???");
}
