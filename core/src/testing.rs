//! Shared declarations for analyzer, evaluator and equivalence tests.
//!
//! [`Fixture`] declares a small translation unit:
//!
//! ```text
//! int x, y; const int c; double d; float fl; bool b; char ch;
//! int arr[5]; int *p, *q; const int *cp; double *dp;
//! struct Point { int x, y; int sum() const; void reset(); ~Point(); } pt, *pp;
//! const Point cpt;
//! struct Base { int id; }; struct Derived : Base { int extra; } der;
//! Base *bp; Derived *derp; int inspect(Base);
//! struct Incomplete; Incomplete *ip;
//! struct Vec { int n; Vec operator+(Vec) const; int& operator[](int); } v1, v2;
//! bool operator==(Vec, Vec);
//! ostream cout; istream cin;
//! int twice(int); void show(int); void show(double); void pick(int&);
//! bool f(); bool g();
//! ```

use crate::analyzer::{CompileContext, Construct, OpaqueRegistry, analyze};
use crate::api::CompileOptions;
use crate::ast::{BinaryOp, Expr, build};
use crate::entities::{ClassBody, ClassDef, FunctionEntity, VariableEntity, VariableKind};
use crate::evaluator::{EvalResult, Host, ObjectRef, SimpleHost};
use crate::scope::ScopeStack;
use crate::types::{Cv, Type, TypeManager};
use crate::values::Value;
use bumpalo::Bump;

pub struct Fixture<'a> {
    pub types: &'a TypeManager<'a>,
    pub scope: ScopeStack<'a>,
    pub opaque: OpaqueRegistry<'a>,
    pub options: CompileOptions,
    pub receiver: Option<&'a Type<'a>>,

    pub x: &'a VariableEntity<'a>,
    pub y: &'a VariableEntity<'a>,
    pub c: &'a VariableEntity<'a>,
    pub d: &'a VariableEntity<'a>,
    pub fl: &'a VariableEntity<'a>,
    pub b: &'a VariableEntity<'a>,
    pub ch: &'a VariableEntity<'a>,
    pub arr: &'a VariableEntity<'a>,
    pub p: &'a VariableEntity<'a>,
    pub q: &'a VariableEntity<'a>,
    pub cp: &'a VariableEntity<'a>,
    pub dp: &'a VariableEntity<'a>,

    pub point: &'a ClassDef<'a>,
    pub point_sum: &'a FunctionEntity<'a>,
    pub point_reset: &'a FunctionEntity<'a>,
    pub point_destructor: &'a FunctionEntity<'a>,
    pub pt: &'a VariableEntity<'a>,
    pub cpt: &'a VariableEntity<'a>,
    pub pp: &'a VariableEntity<'a>,

    pub base: &'a ClassDef<'a>,
    pub derived: &'a ClassDef<'a>,
    pub der: &'a VariableEntity<'a>,
    pub bp: &'a VariableEntity<'a>,
    pub derp: &'a VariableEntity<'a>,
    pub inspect: &'a FunctionEntity<'a>,

    pub incomplete: &'a ClassDef<'a>,
    pub ip: &'a VariableEntity<'a>,

    pub vec: &'a ClassDef<'a>,
    pub vec_plus: &'a FunctionEntity<'a>,
    pub vec_index: &'a FunctionEntity<'a>,
    pub vec_eq: &'a FunctionEntity<'a>,
    pub v1: &'a VariableEntity<'a>,
    pub v2: &'a VariableEntity<'a>,

    pub cout: &'a VariableEntity<'a>,
    pub cin: &'a VariableEntity<'a>,

    pub twice: &'a FunctionEntity<'a>,
    pub show_int: &'a FunctionEntity<'a>,
    pub show_double: &'a FunctionEntity<'a>,
    pub pick: &'a FunctionEntity<'a>,
    pub f: &'a FunctionEntity<'a>,
    pub g: &'a FunctionEntity<'a>,
}

impl<'a> Fixture<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        let tm = TypeManager::new(arena);
        let mut scope = ScopeStack::new(arena);
        let int = tm.int();
        let global = |name: &str, ty| tm.declare_variable(name, ty, VariableKind::Global);

        let x = global("x", int);
        let y = global("y", int);
        let c = global("c", tm.const_of(int));
        let d = global("d", tm.double());
        let fl = global("fl", tm.float());
        let b = global("b", tm.bool());
        let ch = global("ch", tm.char());
        let arr = global("arr", tm.array(int, 5));
        let p = global("p", tm.pointer(int));
        let q = global("q", tm.pointer(int));
        let cp = global("cp", tm.pointer(tm.const_of(int)));
        let dp = global("dp", tm.pointer(tm.double()));

        // Point
        let point = tm.declare_class("Point", &[]);
        let point_ty = tm.class(point);
        let point_sum =
            tm.declare_member_function(point, "sum", tm.member_function(&[], int, Cv::CONST));
        let point_reset = tm.declare_member_function(
            point,
            "reset",
            tm.member_function(&[], tm.void(), Cv::empty()),
        );
        let point_destructor = tm.declare_destructor(point);
        point
            .define(ClassBody {
                members: tm.alloc_slice(&[
                    tm.declare_member_variable(point, "x", int),
                    tm.declare_member_variable(point, "y", int),
                ]),
                functions: tm.alloc_slice(&[point_sum, point_reset]),
                destructor: Some(point_destructor),
            })
            .unwrap();
        let pt = global("pt", point_ty);
        let cpt = global("cpt", tm.const_of(point_ty));
        let pp = global("pp", tm.pointer(point_ty));

        // Base and Derived
        let base = tm.declare_class("Base", &[]);
        base.define(ClassBody {
            members: tm.alloc_slice(&[tm.declare_member_variable(base, "id", int)]),
            ..Default::default()
        })
        .unwrap();
        let derived = tm.declare_class("Derived", &[base]);
        derived
            .define(ClassBody {
                members: tm.alloc_slice(&[tm.declare_member_variable(derived, "extra", int)]),
                ..Default::default()
            })
            .unwrap();
        let der = global("der", tm.class(derived));
        let bp = global("bp", tm.pointer(tm.class(base)));
        let derp = global("derp", tm.pointer(tm.class(derived)));
        let inspect = tm.declare_function("inspect", tm.function(&[tm.class(base)], int));

        let incomplete = tm.declare_class("Incomplete", &[]);
        let ip = global("ip", tm.pointer(tm.class(incomplete)));

        // Vec with member and non-member operators
        let vec = tm.declare_class("Vec", &[]);
        let vec_ty = tm.class(vec);
        let vec_plus = tm.declare_member_function(
            vec,
            "operator+",
            tm.member_function(&[vec_ty], vec_ty, Cv::CONST),
        );
        let vec_index = tm.declare_member_function(
            vec,
            "operator[]",
            tm.member_function(&[int], tm.reference(int), Cv::empty()),
        );
        vec.define(ClassBody {
            members: tm.alloc_slice(&[tm.declare_member_variable(vec, "n", int)]),
            functions: tm.alloc_slice(&[vec_plus, vec_index]),
            destructor: None,
        })
        .unwrap();
        let vec_eq = tm.declare_function("operator==", tm.function(&[vec_ty, vec_ty], tm.bool()));
        let v1 = global("v1", vec_ty);
        let v2 = global("v2", vec_ty);

        // Streams
        let ostream = tm.declare_class("ostream", &[]);
        ostream.define(ClassBody::default()).unwrap();
        let istream = tm.declare_class("istream", &[]);
        istream.define(ClassBody::default()).unwrap();
        let cout = global("cout", tm.class(ostream));
        let cin = global("cin", tm.class(istream));

        // Free functions
        let twice = tm.declare_function("twice", tm.function(&[int], int));
        let show_int = tm.declare_function("show", tm.function(&[int], tm.void()));
        let show_double = tm.declare_function("show", tm.function(&[tm.double()], tm.void()));
        let pick = tm.declare_function("pick", tm.function(&[tm.reference(int)], tm.void()));
        let f = tm.declare_function("f", tm.function(&[], tm.bool()));
        let g = tm.declare_function("g", tm.function(&[], tm.bool()));

        for var in [
            x, y, c, d, fl, b, ch, arr, p, q, cp, dp, pt, cpt, pp, der, bp, derp, ip, v1, v2, cout,
            cin,
        ] {
            scope.declare_variable(var).unwrap();
        }
        for class in [point, base, derived, incomplete, vec, ostream, istream] {
            scope.declare_class(class).unwrap();
        }
        for func in [twice, show_int, show_double, pick, f, g, vec_eq, inspect] {
            scope.declare_function(func).unwrap();
        }

        Fixture {
            types: tm,
            scope,
            opaque: OpaqueRegistry::new(),
            options: CompileOptions::default(),
            receiver: None,
            x,
            y,
            c,
            d,
            fl,
            b,
            ch,
            arr,
            p,
            q,
            cp,
            dp,
            point,
            point_sum,
            point_reset,
            point_destructor,
            pt,
            cpt,
            pp,
            base,
            derived,
            der,
            bp,
            derp,
            inspect,
            incomplete,
            ip,
            vec,
            vec_plus,
            vec_index,
            vec_eq,
            v1,
            v2,
            cout,
            cin,
            twice,
            show_int,
            show_double,
            pick,
            f,
            g,
        }
    }

    /// Compiles inside a member function of `Point` (non-const `this`).
    pub fn inside_point(mut self) -> Self {
        self.receiver = Some(self.types.class(self.point));
        self
    }

    pub fn context(&self) -> CompileContext<'a, '_> {
        let ctx = CompileContext::new(self.types, &self.scope, &self.opaque, &self.options);
        match self.receiver {
            Some(receiver) => ctx.with_receiver(receiver),
            None => ctx,
        }
    }

    pub fn compile(&self, expr: &Expr) -> Construct<'a> {
        analyze(&self.context(), expr)
    }

    /// A host with every variable bound and initialized:
    ///
    /// `x = 3, y = 4, c = 10, d = 2.5, fl = 1.5, b = true, ch = 'a'`,
    /// `arr = {10, 20, 30, 40, 50}, p = &arr[2], q = &arr[0]`,
    /// `pt = {1, 2}, pp = &pt, der = {7, 8}, bp = derp = &der`,
    /// every other pointer null. `twice` doubles its argument, `f` returns
    /// false and `g` true.
    pub fn host(&self) -> SimpleHost<'a> {
        let tm = self.types;
        let mut host = SimpleHost::new(tm);
        host.bind_variable_with(self.x, Value::int(tm, 3));
        host.bind_variable_with(self.y, Value::int(tm, 4));
        host.bind_variable_with(self.c, Value::int(tm, 10));
        host.bind_variable_with(self.d, Value::double(tm, 2.5));
        host.bind_variable_with(self.fl, Value::float(tm, 1.5));
        host.bind_variable_with(self.b, Value::bool(tm, true));
        host.bind_variable_with(self.ch, Value::char(tm, b'a'));

        let arr = host.bind_variable(self.arr);
        for (i, n) in [10, 20, 30, 40, 50].into_iter().enumerate() {
            let elem = host.element_object(arr, i).unwrap();
            host.write(elem, Value::int(tm, n)).unwrap();
        }
        let first = host.element_object(arr, 0).unwrap();
        let third = host.element_object(arr, 2).unwrap();
        let to_third = host.pointer_to(third).unwrap();
        let to_first = host.pointer_to(first).unwrap();
        host.bind_variable_with(self.p, to_third);
        host.bind_variable_with(self.q, to_first);
        host.bind_variable_with(self.cp, Value::pointer(self.cp.ty, 0));
        host.bind_variable_with(self.dp, Value::pointer(self.dp.ty, 0));

        let pt = host.bind_variable(self.pt);
        write_member(&mut host, pt, "x", Value::int(tm, 1));
        write_member(&mut host, pt, "y", Value::int(tm, 2));
        let cpt = host.bind_variable(self.cpt);
        write_member(&mut host, cpt, "x", Value::int(tm, 3));
        write_member(&mut host, cpt, "y", Value::int(tm, 4));
        let to_pt = host.pointer_to(pt).unwrap();
        host.bind_variable_with(self.pp, to_pt);

        let der = host.bind_variable(self.der);
        write_member(&mut host, der, "id", Value::int(tm, 7));
        write_member(&mut host, der, "extra", Value::int(tm, 8));
        let base = host.base_subobject(der, self.base).unwrap();
        let to_base = host.pointer_to(base).unwrap();
        let to_der = host.pointer_to(der).unwrap();
        host.bind_variable_with(self.bp, to_base);
        host.bind_variable_with(self.derp, to_der);
        host.bind_variable_with(self.ip, Value::pointer(self.ip.ty, 0));

        let v1 = host.bind_variable(self.v1);
        write_member(&mut host, v1, "n", Value::int(tm, 1));
        let v2 = host.bind_variable(self.v2);
        write_member(&mut host, v2, "n", Value::int(tm, 2));

        host.bind_variable(self.cout);
        host.bind_variable(self.cin);

        host.define_function(self.twice, move |_, args| {
            let n = args[0].as_value().map_or(0, |v| v.as_i64());
            Ok(Some(EvalResult::Value(Value::int(tm, n * 2))))
        });
        host.define_function(self.show_int, |_, _| Ok(None));
        host.define_function(self.show_double, |_, _| Ok(None));
        host.define_function(self.f, move |_, _| {
            Ok(Some(EvalResult::Value(Value::bool(tm, false))))
        });
        host.define_function(self.g, move |_, _| {
            Ok(Some(EvalResult::Value(Value::bool(tm, true))))
        });
        host
    }
}

fn write_member<'a>(host: &mut SimpleHost<'a>, object: ObjectRef, member: &str, value: Value<'a>) {
    let member = host.member_object(object, member).unwrap();
    host.write(member, value).unwrap();
}

/// Reads the current value of `variable`.
pub fn read_variable<'a>(host: &mut SimpleHost<'a>, variable: &'a VariableEntity<'a>) -> Value<'a> {
    let object = host.variable_object(variable).unwrap();
    host.read(object).unwrap()
}

/// `left op right` with the operator given by its symbol.
pub fn bin(op: &str, left: Expr, right: Expr) -> Expr {
    let op: BinaryOp = op.parse().unwrap();
    build::binary(op, left, right)
}
