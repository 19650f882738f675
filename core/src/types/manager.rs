use crate::{
    entities::{ClassDef, FunctionEntity, VariableEntity, VariableKind},
    types::types::{ArithmeticKind, Cv, Type},
};
use bumpalo::Bump;
use core::cell::RefCell;
use hashbrown::{DefaultHashBuilder, HashMap};
use tracing::trace;

/// Owns every type, class and entity declared for one program.
///
/// Types are hash-consed: asking twice for `const int*` yields the same
/// reference, so identity comparison is type equality.
#[derive(Debug)]
pub struct TypeManager<'a> {
    // Arena holding all types from this TypeManager.
    arena: &'a Bump,
    interned_strs: RefCell<HashMap<&'a str, &'a str, DefaultHashBuilder, &'a Bump>>,
    interned: RefCell<HashMap<Type<'a>, &'a Type<'a>, DefaultHashBuilder, &'a Bump>>,
}

impl<'a> TypeManager<'a> {
    pub fn new(arena: &'a Bump) -> &'a Self {
        arena.alloc(Self {
            arena,
            interned_strs: RefCell::new(HashMap::new_in(arena)),
            interned: RefCell::new(HashMap::new_in(arena)),
        })
    }

    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    pub fn intern_str(&self, s: &str) -> &'a str {
        if let Some(&interned_str) = self.interned_strs.borrow().get(s) {
            return interned_str;
        }
        let arena_str = self.arena.alloc_str(s);
        self.interned_strs.borrow_mut().insert(arena_str, arena_str);
        arena_str
    }

    fn intern(&self, ty: Type<'a>) -> &'a Type<'a> {
        if let Some(&interned_ty) = self.interned.borrow().get(&ty) {
            return interned_ty;
        }
        let arena_ty = self.arena.alloc(ty);
        self.interned.borrow_mut().insert(ty, arena_ty);
        arena_ty
    }

    // Factory methods for types.
    pub fn void(&self) -> &'a Type<'a> {
        self.intern(Type::Void { cv: Cv::empty() })
    }

    pub fn arithmetic(&self, kind: ArithmeticKind) -> &'a Type<'a> {
        self.intern(Type::Arithmetic {
            kind,
            cv: Cv::empty(),
        })
    }

    pub fn bool(&self) -> &'a Type<'a> {
        self.arithmetic(ArithmeticKind::Bool)
    }
    pub fn char(&self) -> &'a Type<'a> {
        self.arithmetic(ArithmeticKind::Char)
    }
    pub fn int(&self) -> &'a Type<'a> {
        self.arithmetic(ArithmeticKind::Int)
    }
    pub fn float(&self) -> &'a Type<'a> {
        self.arithmetic(ArithmeticKind::Float)
    }
    pub fn double(&self) -> &'a Type<'a> {
        self.arithmetic(ArithmeticKind::Double)
    }

    pub fn pointer(&self, pointee: &'a Type<'a>) -> &'a Type<'a> {
        self.intern(Type::Pointer {
            pointee,
            cv: Cv::empty(),
        })
    }

    pub fn array(&self, elem: &'a Type<'a>, len: usize) -> &'a Type<'a> {
        self.intern(Type::BoundedArray { elem, len })
    }

    pub fn reference(&self, referent: &'a Type<'a>) -> &'a Type<'a> {
        self.intern(Type::Reference { referent })
    }

    pub fn class(&self, class: &'a ClassDef<'a>) -> &'a Type<'a> {
        self.intern(Type::Class {
            class,
            cv: Cv::empty(),
        })
    }

    pub fn function(&self, params: &[&'a Type<'a>], ret: &'a Type<'a>) -> &'a Type<'a> {
        self.function_with_receiver(params, ret, None)
    }

    /// Type of a member function; `receiver` holds the qualifiers of `*this`.
    pub fn member_function(
        &self,
        params: &[&'a Type<'a>],
        ret: &'a Type<'a>,
        receiver: Cv,
    ) -> &'a Type<'a> {
        self.function_with_receiver(params, ret, Some(receiver))
    }

    fn function_with_receiver(
        &self,
        params: &[&'a Type<'a>],
        ret: &'a Type<'a>,
        receiver: Option<Cv>,
    ) -> &'a Type<'a> {
        let params = self.arena.alloc_slice_copy(params);
        self.intern(Type::Function {
            params,
            ret,
            receiver,
        })
    }

    /// Replaces the top-level qualifiers of `ty`.
    ///
    /// Arrays carry their qualifiers on the element type; functions and
    /// references have none and are returned unchanged.
    pub fn with_cv(&self, ty: &'a Type<'a>, cv: Cv) -> &'a Type<'a> {
        match *ty {
            Type::Void { .. } => self.intern(Type::Void { cv }),
            Type::Arithmetic { kind, .. } => self.intern(Type::Arithmetic { kind, cv }),
            Type::Pointer { pointee, .. } => self.intern(Type::Pointer { pointee, cv }),
            Type::Class { class, .. } => self.intern(Type::Class { class, cv }),
            Type::BoundedArray { elem, len } => {
                let elem = self.with_cv(elem, cv);
                self.intern(Type::BoundedArray { elem, len })
            }
            Type::Function { .. } | Type::Reference { .. } => ty,
        }
    }

    /// Adds qualifiers on top of whatever `ty` already has.
    pub fn cv_qualified(&self, ty: &'a Type<'a>, cv: Cv) -> &'a Type<'a> {
        self.with_cv(ty, ty.cv() | cv)
    }

    pub fn cv_unqualified(&self, ty: &'a Type<'a>) -> &'a Type<'a> {
        self.with_cv(ty, Cv::empty())
    }

    pub fn const_of(&self, ty: &'a Type<'a>) -> &'a Type<'a> {
        self.cv_qualified(ty, Cv::CONST)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Declares a (still incomplete) class deriving from `bases`.
    pub fn declare_class(&self, name: &str, bases: &[&'a ClassDef<'a>]) -> &'a ClassDef<'a> {
        trace!(class = name, "declaring class");
        let name = self.intern_str(name);
        let bases = self.arena.alloc_slice_copy(bases);
        self.arena.alloc(ClassDef::new(name, bases))
    }

    pub fn declare_variable(
        &self,
        name: &str,
        ty: &'a Type<'a>,
        kind: VariableKind,
    ) -> &'a VariableEntity<'a> {
        let name = self.intern_str(name);
        self.arena.alloc(VariableEntity {
            name,
            ty,
            kind,
            class: None,
        })
    }

    pub fn declare_member_variable(
        &self,
        class: &'a ClassDef<'a>,
        name: &str,
        ty: &'a Type<'a>,
    ) -> &'a VariableEntity<'a> {
        let name = self.intern_str(name);
        self.arena.alloc(VariableEntity {
            name,
            ty,
            kind: VariableKind::Member,
            class: Some(class),
        })
    }

    /// Declares a free function. `ty` must be a function type.
    pub fn declare_function(&self, name: &str, ty: &'a Type<'a>) -> &'a FunctionEntity<'a> {
        debug_assert!(ty.is_function(), "function entity requires a function type");
        let name = self.intern_str(name);
        self.arena.alloc(FunctionEntity {
            name,
            ty,
            class: None,
            is_destructor: false,
        })
    }

    /// Declares a member function of `class`. `ty` should come from
    /// [`TypeManager::member_function`].
    pub fn declare_member_function(
        &self,
        class: &'a ClassDef<'a>,
        name: &str,
        ty: &'a Type<'a>,
    ) -> &'a FunctionEntity<'a> {
        debug_assert!(ty.is_function(), "function entity requires a function type");
        let name = self.intern_str(name);
        self.arena.alloc(FunctionEntity {
            name,
            ty,
            class: Some(class),
            is_destructor: false,
        })
    }

    pub fn declare_destructor(&self, class: &'a ClassDef<'a>) -> &'a FunctionEntity<'a> {
        let mut name = crate::String::from("~");
        name.push_str(class.name);
        let ty = self.member_function(&[], self.void(), Cv::empty());
        self.arena.alloc(FunctionEntity {
            name: self.intern_str(&name),
            ty,
            class: Some(class),
            is_destructor: true,
        })
    }

    /// Copies a list of entities into the arena (for class bodies).
    pub fn alloc_slice<T: Copy>(&self, items: &[T]) -> &'a [T] {
        self.arena.alloc_slice_copy(items)
    }
}
