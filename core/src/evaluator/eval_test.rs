//! Unit tests for the evaluator.

use super::*;
use crate::analyzer::Construct;
use crate::ast::{ArithmeticOp, Expr, Span, TypeSpec, build as b};
use crate::testing::{Fixture, bin, read_variable};
use crate::values::Value;
use alloc::rc::Rc;
use bumpalo::Bump;
use core::cell::Cell;
use pretty_assertions::assert_eq;

fn compiled<'a>(fx: &Fixture<'a>, expr: &Expr) -> Construct<'a> {
    let construct = fx.compile(expr);
    assert!(
        construct.is_executable(),
        "not executable: {:?}",
        construct.all_notes()
    );
    construct
}

fn run<'a>(
    fx: &Fixture<'a>,
    host: &mut SimpleHost<'a>,
    expr: &Expr,
) -> (Option<EvalResult<'a>>, EventLog) {
    let construct = compiled(fx, expr);
    evaluate(fx.types, &construct, host, ExecutionOptions::default()).unwrap()
}

fn run_value<'a>(fx: &Fixture<'a>, host: &mut SimpleHost<'a>, expr: &Expr) -> Value<'a> {
    let (result, events) = run(fx, host, expr);
    assert!(events.simulation.is_empty(), "unexpected events: {:?}", events.simulation);
    result
        .and_then(|r| r.as_value())
        .expect("expression should produce a value")
}

fn messages(events: &EventLog, kind: SimulationEventKind) -> Vec<String> {
    events.of_kind(kind).map(|e| e.message.clone()).collect()
}

fn x() -> Expr {
    b::ident("x")
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_addition() {
    crate::test_utils::init_test_logging();
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let result = run_value(&fx, &mut host, &bin("+", b::int(1), b::int(2)));
    assert_eq!(result.as_i64(), 3);
    assert!(result.ty().is_int());
    assert!(result.is_valid());
}

#[test]
fn test_variables_are_read() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let result = run_value(&fx, &mut host, &bin("*", x(), b::ident("y")));
    assert_eq!(result.as_i64(), 12);
}

#[test]
fn test_mixed_arithmetic_runs_in_double() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let result = run_value(&fx, &mut host, &bin("+", x(), b::ident("d")));
    assert_eq!(result.as_f64(), 5.5);
    assert!(result.ty().is_floating());
}

#[test]
fn test_division_by_zero_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (result, events) = run(&fx, &mut host, &bin("/", x(), b::int(0)));
    let value = result.and_then(|r| r.as_value()).unwrap();
    assert!(!value.is_valid());
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["Division by zero".to_string()]
    );
}

#[test]
fn test_signed_overflow_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (result, events) = run(&fx, &mut host, &bin("*", b::int(2_000_000_000), b::int(2)));
    assert!(!result.and_then(|r| r.as_value()).unwrap().is_valid());
    assert!(events.has(SimulationEventKind::UndefinedBehavior));
}

#[test]
fn test_right_shift_of_negative_is_implementation_defined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin(">>", b::unary(crate::ast::UnaryOp::Minus, b::int(8)), b::int(1));
    let (result, events) = run(&fx, &mut host, &expr);
    assert_eq!(result.and_then(|r| r.as_value()).map(|v| v.as_i64()), Some(-4));
    assert!(events.has(SimulationEventKind::ImplementationDefinedBehavior));
    assert!(!events.has(SimulationEventKind::UndefinedBehavior));
}

// ============================================================================
// Assignment and Increment
// ============================================================================

#[test]
fn test_assignment_writes_and_yields_lvalue() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (result, events) = run(&fx, &mut host, &b::assign(x(), b::int(9)));
    assert!(events.simulation.is_empty());
    assert_eq!(result.and_then(|r| r.as_object()), Some(host.variable_object(fx.x).unwrap()));
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 9);
}

#[test]
fn test_assignment_evaluates_right_operand_first() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let lhs_span = Span::new(0, 1);
    let rhs_span = Span::new(4, 5);
    let lhs = x().with_span(lhs_span.clone());
    let expr = b::assign(lhs, b::ident("y").with_span(rhs_span.clone()));
    let (_, events) = run(&fx, &mut host, &expr);

    let position = |span: &Span| {
        events
            .lifecycle
            .iter()
            .position(|e| e.kind == LifecycleEventKind::Evaluated && &e.span == span)
            .unwrap()
    };
    assert!(position(&rhs_span) < position(&lhs_span));
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 4);
}

#[test]
fn test_compound_assignment() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);

    let mut host = fx.host();
    run(&fx, &mut host, &b::compound_assign(ArithmeticOp::Add, x(), b::int(2)));
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 5);

    let mut host = fx.host();
    run(&fx, &mut host, &b::compound_assign(ArithmeticOp::Shl, x(), b::int(2)));
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 12);

    let mut host = fx.host();
    run(&fx, &mut host, &b::compound_assign(ArithmeticOp::Mul, b::ident("d"), b::int(2)));
    assert_eq!(read_variable(&mut host, fx.d).as_f64(), 5.0);
}

#[test]
fn test_compound_assignment_converts_back_to_lhs_type() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    run(&fx, &mut host, &b::compound_assign(ArithmeticOp::Add, x(), b::ident("d")));
    let x = read_variable(&mut host, fx.x);
    assert_eq!(x.as_i64(), 5);
    assert!(x.ty().is_int());
}

#[test]
fn test_prefix_increment_yields_lvalue() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (result, _) = run(&fx, &mut host, &b::pre_inc(x()));
    assert_eq!(result.and_then(|r| r.as_object()), Some(host.variable_object(fx.x).unwrap()));
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 4);
}

#[test]
fn test_postfix_increment_yields_old_value() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let old = run_value(&fx, &mut host, &b::post_dec(x()));
    assert_eq!(old.as_i64(), 3);
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 2);
}

#[test]
fn test_pointer_increment_moves_one_element() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    run(&fx, &mut host, &b::pre_inc(b::ident("p")));
    let value = run_value(&fx, &mut host, &bin("+", b::deref(b::ident("p")), b::int(0)));
    assert_eq!(value.as_i64(), 40);
}

// ============================================================================
// Sequencing
// ============================================================================

#[test]
fn test_logical_and_short_circuits() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let types = fx.types;
    let g_calls = Rc::new(Cell::new(0));
    let counter = g_calls.clone();
    host.define_function(fx.g, move |_, _| {
        counter.set(counter.get() + 1);
        Ok(Some(EvalResult::Value(Value::bool(types, true))))
    });

    let g_span = Span::new(9, 12);
    let expr = bin(
        "&&",
        b::call(b::ident("f"), vec![]),
        b::call(b::ident("g"), vec![]).with_span(g_span.clone()),
    );
    let value = run_value(&fx, &mut host, &expr);
    assert!(!value.is_truthy());
    assert_eq!(g_calls.get(), 0);

    let (_, events) = run(&fx, &mut host, &expr);
    assert!(!events.was_evaluated(&g_span));
}

#[test]
fn test_logical_or_evaluates_right_operand_when_needed() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin("||", b::call(b::ident("f"), vec![]), b::call(b::ident("g"), vec![]));
    assert!(run_value(&fx, &mut host, &expr).is_truthy());

    let expr = bin("||", b::call(b::ident("g"), vec![]), b::call(b::ident("twice"), vec![x()]));
    let (_, events) = run(&fx, &mut host, &expr);
    assert!(!events.evaluated().contains(&"implicit_conversion"));
}

#[test]
fn test_ternary_evaluates_only_chosen_branch() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let else_span = Span::new(8, 9);
    let expr = b::ternary(b::ident("b"), x(), b::ident("y").with_span(else_span.clone()));
    let (result, events) = run(&fx, &mut host, &expr);

    assert_eq!(result.and_then(|r| r.as_object()), Some(host.variable_object(fx.x).unwrap()));
    assert!(!events.was_evaluated(&else_span));
}

#[test]
fn test_comma_yields_right_operand() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = b::comma(b::assign(x(), b::int(5)), bin("+", x(), b::int(1)));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 6);
}

// ============================================================================
// Pointers
// ============================================================================

#[test]
fn test_pointer_offset_within_bounds() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let read = bin("+", b::deref(bin("+", b::ident("p"), b::int(2))), b::int(0));
    assert_eq!(run_value(&fx, &mut host, &read).as_i64(), 50);

    // One past the end is a valid pointer value.
    let one_past = run_value(&fx, &mut host, &bin("+", b::ident("p"), b::int(3)));
    assert!(one_past.is_valid());
}

#[test]
fn test_pointer_offset_past_end_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (result, events) = run(&fx, &mut host, &bin("+", b::ident("p"), b::int(4)));
    assert!(!result.and_then(|r| r.as_value()).unwrap().is_valid());
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["Pointer arithmetic moved the pointer outside the bounds of its array".to_string()]
    );
}

#[test]
fn test_pointer_difference() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let value = run_value(&fx, &mut host, &bin("-", b::ident("p"), b::ident("q")));
    assert_eq!(value.as_i64(), 2);
}

#[test]
fn test_pointer_difference_across_objects_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin("-", b::address_of(x()), b::address_of(b::ident("y")));
    let (result, events) = run(&fx, &mut host, &expr);
    assert!(!result.and_then(|r| r.as_value()).unwrap().is_valid());
    assert!(events.has(SimulationEventKind::UndefinedBehavior));
}

#[test]
fn test_relational_comparison_across_objects_is_unspecified() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin("<", b::address_of(x()), b::address_of(b::ident("y")));
    let (_, events) = run(&fx, &mut host, &expr);
    assert!(events.has(SimulationEventKind::UnspecifiedBehavior));

    let value = run_value(&fx, &mut host, &bin(">", b::ident("p"), b::ident("q")));
    assert!(value.is_truthy());
}

#[test]
fn test_null_dereference_crashes() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = compiled(&fx, &b::deref(b::ident("dp")));
    let mut simulation =
        Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default()).unwrap();
    assert_eq!(simulation.run().unwrap(), StepOutcome::Crashed);
    assert!(simulation.is_crashed());
    assert_eq!(simulation.result().and_then(|r| r.as_object()), None);

    let crashes = messages(simulation.events(), SimulationEventKind::Crash);
    assert_eq!(crashes, vec!["Ow! Your code just dereferenced a null pointer!".to_string()]);

    // A crashed simulation stays put.
    assert_eq!(simulation.step_forward().unwrap(), StepOutcome::Crashed);
}

#[test]
fn test_subscript_reads_element() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin("*", b::subscript(b::ident("arr"), b::int(1)), b::int(2));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 40);
}

#[test]
fn test_subscript_out_of_bounds_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (_, events) = run(&fx, &mut host, &b::subscript(b::ident("arr"), b::int(5)));
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["Index 5 is out of bounds for an array of 5 elements".to_string()]
    );
}

#[test]
fn test_dangling_pointer_dereference_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let allocate = b::assign(b::ident("p"), b::new_object(TypeSpec::Int, Some(b::int(5))));
    run(&fx, &mut host, &allocate);
    run(&fx, &mut host, &b::delete(b::ident("p")));

    let (result, events) = run(&fx, &mut host, &b::deref(b::ident("p")));
    assert!(result.is_some());
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["The object this pointer points to is no longer alive".to_string()]
    );
}

// ============================================================================
// Dynamic Memory
// ============================================================================

#[test]
fn test_new_and_delete() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let allocate = b::assign(b::ident("p"), b::new_object(TypeSpec::Int, Some(b::int(5))));
    let (_, events) = run(&fx, &mut host, &allocate);
    assert!(events.simulation.is_empty());
    assert_eq!(host.live_allocations(), 1);

    let read = bin("+", b::deref(b::ident("p")), b::int(0));
    assert_eq!(run_value(&fx, &mut host, &read).as_i64(), 5);

    let (result, events) = run(&fx, &mut host, &b::delete(b::ident("p")));
    assert!(result.is_none());
    assert!(events.simulation.is_empty());
    assert_eq!(host.live_allocations(), 0);
}

#[test]
fn test_double_free_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    run(&fx, &mut host, &b::assign(b::ident("p"), b::new_object(TypeSpec::Int, None)));
    run(&fx, &mut host, &b::delete(b::ident("p")));
    let (_, events) = run(&fx, &mut host, &b::delete(b::ident("p")));
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["Double free: the object was already deleted".to_string()]
    );
}

#[test]
fn test_invalid_delete_targets() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    // q points at arr[0], which is static.
    let (_, events) = run(&fx, &mut host, &b::delete(b::ident("q")));
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["Invalid delete: the object was not allocated with new".to_string()]
    );

    // p points into the middle of arr.
    let (_, events) = run(&fx, &mut host, &b::delete(b::ident("p")));
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["Invalid delete: the pointer does not point to the start of an object".to_string()]
    );
}

#[test]
fn test_delete_form_must_match_new_form() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    run(&fx, &mut host, &b::assign(b::ident("p"), b::new_array(TypeSpec::Int, b::int(3))));
    let (_, events) = run(&fx, &mut host, &b::delete(b::ident("p")));
    assert_eq!(
        messages(&events, SimulationEventKind::UndefinedBehavior),
        vec!["delete used on an array allocated with new[]".to_string()]
    );

    let (_, events) = run(&fx, &mut host, &b::delete_array(b::ident("p")));
    assert!(events.simulation.is_empty());
    assert_eq!(host.live_allocations(), 0);
}

#[test]
fn test_delete_null_does_nothing() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (_, events) = run(&fx, &mut host, &b::delete(b::ident("dp")));
    assert!(events.simulation.is_empty());
}

#[test]
fn test_delete_runs_destructor() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let destroyed = Rc::new(Cell::new(0));
    let counter = destroyed.clone();
    host.define_function(fx.point_destructor, move |receiver, _| {
        assert!(receiver.is_some());
        counter.set(counter.get() + 1);
        Ok(None)
    });

    let point = TypeSpec::Named("Point".into());
    run(&fx, &mut host, &b::assign(b::ident("pp"), b::new_object(point.clone(), None)));
    run(&fx, &mut host, &b::delete(b::ident("pp")));
    assert_eq!(destroyed.get(), 1);

    run(&fx, &mut host, &b::assign(b::ident("pp"), b::new_array(point, b::int(3))));
    run(&fx, &mut host, &b::delete_array(b::ident("pp")));
    assert_eq!(destroyed.get(), 4);
}

#[test]
fn test_discarded_new_leaks() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let (_, events) = run(&fx, &mut host, &b::new_object(TypeSpec::Int, None));
    assert!(events.has(SimulationEventKind::MemoryLeak));

    let (_, events) = run(&fx, &mut host, &b::paren(b::new_object(TypeSpec::Int, None)));
    assert!(events.has(SimulationEventKind::MemoryLeak));

    let array = b::paren(b::paren(b::new_array(TypeSpec::Int, b::int(3))));
    let (_, events) = run(&fx, &mut host, &array);
    assert!(events.has(SimulationEventKind::MemoryLeak));

    let kept = b::assign(b::ident("p"), b::new_object(TypeSpec::Int, None));
    let (_, events) = run(&fx, &mut host, &kept);
    assert!(!events.has(SimulationEventKind::MemoryLeak));
}

#[test]
fn test_negative_array_length_is_undefined() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let length = b::unary(crate::ast::UnaryOp::Minus, b::int(1));
    let expr = b::assign(b::ident("p"), b::new_array(TypeSpec::Int, length));
    let (_, events) = run(&fx, &mut host, &expr);
    assert!(events.has(SimulationEventKind::UndefinedBehavior));
}

#[test]
fn test_oversized_array_allocation_crashes() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let huge = b::new_array(TypeSpec::Int, b::int(2_000_000_000));
    let (result, events) = run(&fx, &mut host, &b::assign(b::ident("p"), huge));
    assert!(result.is_none());
    assert_eq!(
        messages(&events, SimulationEventKind::Crash),
        vec!["Out of memory: cannot allocate 8000000000 bytes (limit 1048576 bytes)".to_string()]
    );
    assert_eq!(host.live_allocations(), 0);
}

#[test]
fn test_allocation_limit_is_configurable() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let allocate = b::assign(b::ident("p"), b::new_array(TypeSpec::Int, b::int(100)));
    let construct = compiled(&fx, &allocate);

    let tight = ExecutionOptions {
        max_allocation_bytes: 256,
        ..Default::default()
    };
    let (_, events) = evaluate(fx.types, &construct, &mut host, tight).unwrap();
    assert!(events.has(SimulationEventKind::Crash));

    let roomy = ExecutionOptions {
        max_allocation_bytes: 400,
        ..Default::default()
    };
    let (_, events) = evaluate(fx.types, &construct, &mut host, roomy).unwrap();
    assert!(events.simulation.is_empty());
    assert_eq!(host.live_allocations(), 1);
}

#[test]
fn test_host_rejects_allocations_over_its_limit() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host().with_allocation_limit(16);

    assert!(host.allocate(fx.types.array(fx.types.int(), 4)).is_ok());
    assert_eq!(
        host.allocate(fx.types.array(fx.types.int(), 5)),
        Err(HostError::Allocation("int[5]".to_string()))
    );
}

// ============================================================================
// Calls and Members
// ============================================================================

#[test]
fn test_free_function_call() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let value = run_value(&fx, &mut host, &b::call(b::ident("twice"), vec![x()]));
    assert_eq!(value.as_i64(), 6);

    // show(double) has no result.
    let (result, events) = run(&fx, &mut host, &b::call(b::ident("show"), vec![b::ident("d")]));
    assert!(result.is_none());
    assert!(events.simulation.is_empty());
}

#[test]
fn test_missing_function_body_is_host_error() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = compiled(&fx, &b::call(b::ident("pick"), vec![x()]));
    let err = evaluate(fx.types, &construct, &mut host, ExecutionOptions::default()).unwrap_err();
    assert_eq!(err, ExecutionError::Host(HostError::NoImplementation("pick".into())));
}

#[test]
fn test_member_access() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin("+", b::dot(b::ident("pt"), "x"), b::dot(b::ident("pt"), "y"));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 3);

    let expr = bin("*", b::arrow(b::ident("pp"), "y"), b::int(10));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 20);

    // Inherited member through a base pointer.
    let expr = bin("+", b::arrow(b::ident("bp"), "id"), b::int(0));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 7);
}

#[test]
fn test_member_function_receives_object() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let types = fx.types;
    let pt = host.variable_object(fx.pt).unwrap();
    host.define_function(fx.point_sum, move |receiver, args| {
        assert_eq!(receiver, Some(pt));
        assert!(args.is_empty());
        Ok(Some(EvalResult::Value(Value::int(types, 42))))
    });

    let call = b::call(b::dot(b::ident("pt"), "sum"), vec![]);
    assert_eq!(run_value(&fx, &mut host, &call).as_i64(), 42);

    let call = b::call(b::arrow(b::ident("pp"), "sum"), vec![]);
    assert_eq!(run_value(&fx, &mut host, &call).as_i64(), 42);
}

#[test]
fn test_derived_argument_is_sliced_to_base() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let types = fx.types;
    let der = host.variable_object(fx.der).unwrap();
    let base = host.base_subobject(der, fx.base).unwrap();
    host.define_function(fx.inspect, move |_, args| {
        assert!(matches!(args, [EvalResult::Object(object)] if *object == base));
        Ok(Some(EvalResult::Value(Value::int(types, 5))))
    });

    let call = b::call(b::ident("inspect"), vec![b::ident("der")]);
    assert_eq!(run_value(&fx, &mut host, &call).as_i64(), 5);
}

#[test]
fn test_this_in_member_function() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump).inside_point();
    let mut host = fx.host();
    let pt = host.variable_object(fx.pt).unwrap();
    host.set_this_object(Some(pt));

    let expr = bin("+", b::arrow(b::this(), "y"), b::int(0));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 2);
}

#[test]
fn test_member_operator_overload_returns_lvalue() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let v1 = host.variable_object(fx.v1).unwrap();
    let n = host.member_object(v1, "n").unwrap();
    host.define_function(fx.vec_index, move |receiver, _| {
        assert_eq!(receiver, Some(v1));
        Ok(Some(EvalResult::Object(n)))
    });

    let expr = b::assign(b::subscript(b::ident("v1"), b::int(0)), b::int(5));
    run(&fx, &mut host, &expr);
    assert_eq!(host.read(n).unwrap().as_i64(), 5);
}

#[test]
fn test_non_member_operator_overload() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let types = fx.types;
    host.define_function(fx.vec_eq, move |receiver, args| {
        assert_eq!(receiver, None);
        assert_eq!(args.len(), 2);
        Ok(Some(EvalResult::Value(Value::bool(types, true))))
    });

    let value = run_value(&fx, &mut host, &bin("==", b::ident("v1"), b::ident("v2")));
    assert!(value.is_truthy());
}

#[test]
fn test_assert_failure() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let failing = b::call(b::ident("assert"), vec![bin("==", x(), b::int(4))]);
    let (result, events) = run(&fx, &mut host, &failing);
    assert!(result.is_none());
    assert_eq!(
        messages(&events, SimulationEventKind::AssertionFailure),
        vec!["Assertion failed".to_string()]
    );

    let passing = b::call(b::ident("assert"), vec![bin("==", x(), b::int(3))]);
    let (_, events) = run(&fx, &mut host, &passing);
    assert!(events.simulation.is_empty());
}

// ============================================================================
// Streams
// ============================================================================

#[test]
fn test_output_chain() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let expr = bin(
        "<<",
        bin(
            "<<",
            bin("<<", bin("<<", b::ident("cout"), x()), b::character(b' ')),
            b::ident("d"),
        ),
        b::string("!"),
    );
    let (result, events) = run(&fx, &mut host, &expr);
    assert!(events.simulation.is_empty());
    assert_eq!(result.and_then(|r| r.as_object()), Some(host.variable_object(fx.cout).unwrap()));
    assert_eq!(host.output(), "3 2.5!");
}

#[test]
fn test_input_waits_for_text() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = compiled(&fx, &bin(">>", b::ident("cin"), x()));
    {
        let mut simulation =
            Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default()).unwrap();
        assert_eq!(simulation.run().unwrap(), StepOutcome::WaitingForInput);
        assert!(simulation
            .events()
            .lifecycle
            .iter()
            .any(|e| e.kind == LifecycleEventKind::Waiting));

        simulation.provide_input(" 42\n");
        assert_eq!(simulation.run().unwrap(), StepOutcome::Finished);
    }
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 42);
}

#[test]
fn test_failed_input_converts_stream_to_false() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    host.provide_input("abc");

    let read = b::paren(bin(">>", b::ident("cin"), x()));
    let expr = b::ternary(read, b::int(1), b::int(2));
    assert_eq!(run_value(&fx, &mut host, &expr).as_i64(), 2);
    assert_eq!(read_variable(&mut host, fx.x).as_i64(), 3);
}

// ============================================================================
// Driver
// ============================================================================

#[test]
fn test_lifecycle_of_binary_expression() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = compiled(&fx, &bin("+", b::int(1), b::int(2)));
    let mut simulation =
        Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default()).unwrap();
    let mut calls = 0;
    while simulation.step_forward().unwrap() == StepOutcome::Running {
        calls += 1;
    }
    assert_eq!(calls, 3);
    assert_eq!(simulation.steps(), 3);
    assert!(simulation.is_finished());

    use LifecycleEventKind::*;
    let trace: Vec<(u32, LifecycleEventKind)> = simulation
        .events()
        .lifecycle
        .iter()
        .map(|e| (e.node.0, e.kind))
        .collect();
    assert_eq!(
        trace,
        vec![
            (0, Pushed),
            (0, UpNext),
            (2, Pushed),
            (1, Pushed),
            (1, Current),
            (1, Evaluated),
            (1, Uncurrent),
            (1, Popped),
            (2, Current),
            (2, Evaluated),
            (2, Uncurrent),
            (2, Popped),
            (0, Current),
            (0, Evaluated),
            (0, Uncurrent),
            (0, Popped),
        ]
    );
}

#[test]
fn test_operands_are_pushed_together() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = compiled(&fx, &bin("*", x(), b::ident("y")));
    let mut simulation =
        Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default()).unwrap();
    simulation.step_forward().unwrap();
    // `*`, then the reads of `y` and `x`, with `x` on top about to be read.
    assert_eq!(simulation.stack_depth(), 3);
    assert_eq!(simulation.current().map(|c| c.kind_name()), Some("implicit_conversion"));

    // The short-circuit operators still push one operand at a time.
    let construct = compiled(&fx, &bin("&&", b::boolean(true), b::boolean(false)));
    let mut simulation =
        Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default()).unwrap();
    simulation.step_forward().unwrap();
    assert_eq!(simulation.stack_depth(), 2);
}

#[test]
fn test_observer_sees_every_event() {
    #[derive(Default)]
    struct Counter {
        lifecycle: usize,
        simulation: usize,
    }

    impl Observer for Counter {
        fn lifecycle(&mut self, _event: &LifecycleEvent) {
            self.lifecycle += 1;
        }

        fn simulation(&mut self, _event: &SimulationEvent) {
            self.simulation += 1;
        }
    }

    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();
    let mut counter = Counter::default();

    let construct = compiled(&fx, &bin("/", x(), b::int(0)));
    let events = {
        let mut simulation =
            Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default())
                .unwrap()
                .with_observer(&mut counter);
        simulation.run().unwrap();
        simulation.into_events()
    };
    assert_eq!(counter.lifecycle, events.lifecycle.len());
    assert_eq!(counter.simulation, 1);
}

#[test]
fn test_not_executable() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = fx.compile(&bin("+", b::ident("nope"), b::int(1)));
    let result = Simulation::new(fx.types, &construct, &mut host, ExecutionOptions::default());
    assert!(matches!(result, Err(ExecutionError::NotExecutable { .. })));
}

#[test]
fn test_step_limit() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let construct = compiled(&fx, &bin("+", bin("+", b::int(1), b::int(2)), b::int(3)));
    let options = ExecutionOptions {
        max_steps: Some(2),
        ..Default::default()
    };
    let err = evaluate(fx.types, &construct, &mut host, options).unwrap_err();
    assert_eq!(err, ExecutionError::StepLimitExceeded { max_steps: 2 });
    assert!(err.is_resource_exceeded());
}

#[test]
fn test_stack_depth_limit() {
    let bump = Bump::new();
    let fx = Fixture::new(&bump);
    let mut host = fx.host();

    let nested = bin("*", b::paren(bin("+", b::int(1), b::int(2))), b::int(3));
    let construct = compiled(&fx, &nested);
    let options = ExecutionOptions {
        max_stack_depth: 2,
        ..Default::default()
    };
    let err = evaluate(fx.types, &construct, &mut host, options).unwrap_err();
    assert_eq!(err, ExecutionError::StackOverflow { max_depth: 2 });
}
