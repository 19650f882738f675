//! End-to-end scenarios: compile with the engine, run against the
//! reference host, compare with the equivalence checker.

use bumpalo::Bump;
use cppsim::ast::{ArithmeticOp, LogicalOp, RelationalOp, Span, build};
use cppsim::entities::{FunctionEntity, LookupResult, VariableEntity, VariableKind};
use cppsim::{
    ConstructKind, ConversionKind, Engine, EngineOptions, Error, EvalResult, Host, SimpleHost,
    SimulationEventKind, ValueCategory, Value,
};
use pretty_assertions::assert_eq;

/// `int x; const int c; int arr[5]; int *p, *a, *b; bool f(); bool g();`
fn engine(arena: &Bump) -> Engine<'_> {
    Engine::new(arena, EngineOptions::default(), |types, env| {
        let int = types.int();
        let int_ptr = types.pointer(int);
        for (name, ty) in [
            ("x", int),
            ("c", types.const_of(int)),
            ("arr", types.array(int, 5)),
            ("p", int_ptr),
            ("a", int_ptr),
            ("b", int_ptr),
        ] {
            env.declare_variable(types.declare_variable(name, ty, VariableKind::Global))?;
        }
        for name in ["f", "g"] {
            env.declare_function(types.declare_function(name, types.function(&[], types.bool())))?;
        }
        Ok(())
    })
    .unwrap()
}

fn variable<'a>(engine: &Engine<'a>, name: &str) -> &'a VariableEntity<'a> {
    match engine.lookup(name) {
        LookupResult::Variable(variable) => variable,
        other => panic!("`{name}` is not a variable: {other:?}"),
    }
}

fn function<'a>(engine: &Engine<'a>, name: &str) -> &'a FunctionEntity<'a> {
    match engine.lookup(name) {
        LookupResult::Functions(overloads) => overloads[0],
        other => panic!("`{name}` is not a function: {other:?}"),
    }
}

/// A host where `arr = {10, 20, 30, 40, 50}` and `p` points at `arr[index]`.
fn host_with_pointer_at<'a>(engine: &Engine<'a>, index: usize) -> SimpleHost<'a> {
    let types = engine.type_manager();
    let mut host = SimpleHost::new(types);
    let arr = host.bind_variable(variable(engine, "arr"));
    for (i, n) in [10, 20, 30, 40, 50].into_iter().enumerate() {
        let element = host.element_object(arr, i).unwrap();
        host.write(element, Value::int(types, n)).unwrap();
    }
    let element = host.element_object(arr, index).unwrap();
    let pointer = host.pointer_to(element).unwrap();
    host.bind_variable_with(variable(engine, "p"), pointer);
    host
}

fn element_address<'a>(host: &mut SimpleHost<'a>, engine: &Engine<'a>, index: usize) -> i64 {
    let arr = host.variable_object(variable(engine, "arr")).unwrap();
    let element = host.element_object(arr, index).unwrap();
    host.address_of(element).unwrap()
}

#[test]
fn test_int_addition() {
    let arena = Bump::new();
    let engine = engine(&arena);

    let expr = engine
        .compile(&build::binary(ArithmeticOp::Add, build::int(1), build::int(2)))
        .unwrap();
    assert_eq!(expr.ty().map(|t| t.to_string()).as_deref(), Some("int"));
    assert_eq!(expr.value_category(), Some(ValueCategory::Prvalue));

    let mut host = SimpleHost::new(engine.type_manager());
    let (result, events) = expr.run(&mut host).unwrap();
    let value = result.and_then(|r| r.as_value()).unwrap();
    assert_eq!(value.as_i64(), 3);
    assert!(value.ty().is_int());
    assert!(events.simulation.is_empty());
}

#[test]
fn test_assignment_to_const() {
    let arena = Bump::new();
    let engine = engine(&arena);

    let result = engine.compile(&build::assign(build::ident("c"), build::int(5)));
    let Err(Error::Compilation { diagnostics }) = result else {
        panic!("assigning to a const must not compile");
    };
    let codes: Vec<_> = diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
    assert_eq!(codes, vec!["expr.assignment.lhs_const"]);
}

#[test]
fn test_pointer_offset_within_array() {
    let arena = Bump::new();
    let engine = engine(&arena);

    let expr = engine
        .compile(&build::binary(ArithmeticOp::Add, build::ident("p"), build::int(1)))
        .unwrap();
    assert!(matches!(
        expr.construct().kind(),
        ConstructKind::PointerOffset {
            pointer_on_left: true,
            ..
        }
    ));

    let mut host = host_with_pointer_at(&engine, 2);
    let (result, events) = expr.run(&mut host).unwrap();
    let pointer = result.and_then(|r| r.as_value()).unwrap();
    assert_eq!(pointer.address(), element_address(&mut host, &engine, 3));
    assert!(!events.has(SimulationEventKind::UndefinedBehavior));
}

#[test]
fn test_pointer_offset_past_the_end() {
    let arena = Bump::new();
    let engine = engine(&arena);

    let expr = engine
        .compile(&build::binary(ArithmeticOp::Add, build::ident("p"), build::int(3)))
        .unwrap();
    let mut host = host_with_pointer_at(&engine, 2);
    let (_, events) = expr.run(&mut host).unwrap();
    assert!(!events.has(SimulationEventKind::UndefinedBehavior));

    let mut host = host_with_pointer_at(&engine, 4);
    let (_, events) = expr.run(&mut host).unwrap();
    assert!(events.has(SimulationEventKind::UndefinedBehavior));
}

#[test]
fn test_null_pointer_comparison() {
    let arena = Bump::new();
    let engine = engine(&arena);

    let expr = engine
        .compile(&build::binary(RelationalOp::Eq, build::ident("a"), build::int(0)))
        .unwrap();
    let ConstructKind::PointerComparison { right, .. } = expr.construct().kind() else {
        panic!("expected a pointer comparison, got {}", expr.construct().kind_name());
    };
    assert!(matches!(
        right.kind(),
        ConstructKind::ImplicitConversion {
            conversion: ConversionKind::NullPointerConversion,
            ..
        }
    ));

    let not_a = engine.compile(&build::not(build::ident("a"))).unwrap();
    let compare = |name: &str| {
        let comparison = build::binary(RelationalOp::Ne, build::ident(name), build::int(0));
        engine.compile(&build::not(build::paren(comparison))).unwrap()
    };
    assert!(not_a.is_equivalent_to(&compare("a")));
    assert!(!not_a.is_equivalent_to(&compare("b")));
}

#[test]
fn test_short_circuit_skips_right_operand() {
    let arena = Bump::new();
    let engine = engine(&arena);
    let types = engine.type_manager();

    let g_span = Span::new(9, 12);
    let call = |name: &str| build::call(build::ident(name), vec![]);
    let expr = build::binary(LogicalOp::And, call("f"), call("g").with_span(g_span.clone()));
    let expr = engine.compile(&expr).unwrap();

    let mut host = SimpleHost::new(types);
    host.define_function(function(&engine, "f"), move |_, _| {
        Ok(Some(EvalResult::Value(Value::bool(types, false))))
    });
    host.define_function(function(&engine, "g"), move |_, _| {
        Ok(Some(EvalResult::Value(Value::bool(types, true))))
    });

    let (result, events) = expr.run(&mut host).unwrap();
    assert_eq!(result.and_then(|r| r.as_value()).map(|v| v.is_truthy()), Some(false));
    assert!(!events.was_evaluated(&g_span));
}

#[test]
fn test_subscript_equivalent_to_pointer_arithmetic() {
    let arena = Bump::new();
    let engine = engine(&arena);

    let subscript = engine
        .compile(&build::subscript(build::ident("arr"), build::ident("x")))
        .unwrap();
    let sum = build::binary(ArithmeticOp::Add, build::ident("arr"), build::ident("x"));
    let dereference = engine.compile(&build::deref(build::paren(sum))).unwrap();
    assert!(subscript.is_equivalent_to(&dereference));
    assert!(cppsim::are_equivalent(dereference.construct(), subscript.construct()));
}
