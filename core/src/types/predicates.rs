//! Capability predicates over [`Type`].
//!
//! The analyzer narrows an untyped construct by asking these questions
//! (is it arithmetic? a pointer to a complete object? a class?) before
//! choosing which rule applies. Everything here is a pure function of the
//! interned type graph.

use super::types::{ArithmeticKind, Cv, POINTER_SIZE, Type};
use crate::entities::ClassDef;

impl<'a> Type<'a> {
    pub fn cv(&self) -> Cv {
        match self {
            Type::Void { cv }
            | Type::Arithmetic { cv, .. }
            | Type::Pointer { cv, .. }
            | Type::Class { cv, .. } => *cv,
            Type::BoundedArray { elem, .. } => elem.cv(),
            Type::Function { .. } | Type::Reference { .. } => Cv::empty(),
        }
    }

    pub fn is_const(&self) -> bool {
        self.cv().is_const()
    }

    pub fn is_volatile(&self) -> bool {
        self.cv().is_volatile()
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void { .. })
    }

    pub fn arithmetic_kind(&self) -> Option<ArithmeticKind> {
        match self {
            Type::Arithmetic { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        self.arithmetic_kind().is_some()
    }

    pub fn is_integral(&self) -> bool {
        self.arithmetic_kind().is_some_and(ArithmeticKind::is_integral)
    }

    pub fn is_floating(&self) -> bool {
        self.arithmetic_kind().is_some_and(ArithmeticKind::is_floating)
    }

    pub fn is_bool(&self) -> bool {
        self.arithmetic_kind() == Some(ArithmeticKind::Bool)
    }

    pub fn is_char(&self) -> bool {
        self.arithmetic_kind() == Some(ArithmeticKind::Char)
    }

    pub fn is_int(&self) -> bool {
        self.arithmetic_kind() == Some(ArithmeticKind::Int)
    }

    pub fn is_float(&self) -> bool {
        self.arithmetic_kind() == Some(ArithmeticKind::Float)
    }

    pub fn is_double(&self) -> bool {
        self.arithmetic_kind() == Some(ArithmeticKind::Double)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    pub fn pointee(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::Pointer { pointee, .. } => Some(*pointee),
            _ => None,
        }
    }

    pub fn is_bounded_array(&self) -> bool {
        matches!(self, Type::BoundedArray { .. })
    }

    pub fn array_elem(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::BoundedArray { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class { .. })
    }

    pub fn class_def(&self) -> Option<&'a ClassDef<'a>> {
        match self {
            Type::Class { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn is_complete_class(&self) -> bool {
        self.class_def().is_some_and(ClassDef::is_complete)
    }

    /// Class named `name`, complete or not.
    pub fn is_class_named(&self, name: &str) -> bool {
        self.class_def().is_some_and(|class| class.name == name)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference { .. })
    }

    pub fn referent(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::Reference { referent } => Some(*referent),
            _ => None,
        }
    }

    /// Arithmetic and pointer types: the ones a `Value` can hold.
    pub fn is_atomic(&self) -> bool {
        self.is_arithmetic() || self.is_pointer()
    }

    /// Object types exclude functions, references and `void`.
    pub fn is_object_type(&self) -> bool {
        !matches!(
            self,
            Type::Void { .. } | Type::Function { .. } | Type::Reference { .. }
        )
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Type::Arithmetic { .. } | Type::Pointer { .. } => true,
            Type::BoundedArray { elem, .. } => elem.is_complete(),
            Type::Class { class, .. } => class.is_complete(),
            Type::Void { .. } | Type::Function { .. } | Type::Reference { .. } => false,
        }
    }

    pub fn is_complete_object_type(&self) -> bool {
        self.is_object_type() && self.is_complete()
    }

    pub fn is_pointer_to_complete_object(&self) -> bool {
        self.pointee()
            .is_some_and(|pointee| pointee.is_complete_object_type())
    }

    /// Pointer whose pointee is a class type (complete or not).
    pub fn pointee_class(&self) -> Option<&'a ClassDef<'a>> {
        self.pointee().and_then(|pointee| pointee.class_def())
    }

    /// Return types a call may produce: `void`, references, or complete objects.
    pub fn is_complete_return_type(&self) -> bool {
        match self {
            Type::Void { .. } | Type::Reference { .. } => true,
            Type::BoundedArray { .. } | Type::Function { .. } => false,
            _ => self.is_complete(),
        }
    }

    /// Storage size in bytes, if the type is a complete object type.
    pub fn size(&self) -> Option<usize> {
        match self {
            Type::Arithmetic { kind, .. } => Some(kind.size()),
            Type::Pointer { .. } => Some(POINTER_SIZE),
            Type::BoundedArray { elem, len } => elem.size().and_then(|size| size.checked_mul(*len)),
            Type::Class { class, .. } => class.size(),
            Type::Void { .. } | Type::Function { .. } | Type::Reference { .. } => None,
        }
    }

    /// The type one level down in a compound type, used to walk
    /// cv-qualification signatures.
    pub(crate) fn compound_next(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::Pointer { pointee, .. } => Some(*pointee),
            Type::BoundedArray { elem, .. } => Some(*elem),
            Type::Reference { referent } => Some(*referent),
            _ => None,
        }
    }
}

/// Exactly the same type, including all qualifiers.
pub fn same_type<'a>(a: &Type<'a>, b: &Type<'a>) -> bool {
    core::ptr::eq(a, b) || a == b
}

/// The same type once cv-qualifiers are ignored at every level.
pub fn similar_type<'a>(a: &Type<'a>, b: &Type<'a>) -> bool {
    match (a, b) {
        (Type::Void { .. }, Type::Void { .. }) => true,
        (Type::Arithmetic { kind: k1, .. }, Type::Arithmetic { kind: k2, .. }) => k1 == k2,
        (Type::Pointer { pointee: p1, .. }, Type::Pointer { pointee: p2, .. }) => {
            similar_type(p1, p2)
        }
        (Type::BoundedArray { elem: e1, len: l1 }, Type::BoundedArray { elem: e2, len: l2 }) => {
            l1 == l2 && similar_type(e1, e2)
        }
        (Type::Class { class: c1, .. }, Type::Class { class: c2, .. }) => core::ptr::eq(*c1, *c2),
        (Type::Reference { referent: r1 }, Type::Reference { referent: r2 }) => {
            similar_type(r1, r2)
        }
        (Type::Function { .. }, Type::Function { .. }) => same_type(a, b),
        _ => false,
    }
}

/// Whether a prvalue of type `from` may be qualification-converted to `to`.
///
/// The types must be similar. Top-level qualifiers are ignored (the result
/// is a copy). Below that, `to` must be const wherever `from` is, and once
/// the two signatures differ every enclosing level of `to` must be const.
pub fn is_cv_convertible<'a>(from: &Type<'a>, to: &Type<'a>) -> bool {
    if !similar_type(from, to) {
        return false;
    }

    let mut t1 = from.compound_next();
    let mut t2 = to.compound_next();
    let mut to_all_const = true;
    while let (Some(a), Some(b)) = (t1, t2) {
        if a.is_const() && !b.is_const() {
            return false;
        }
        if !a.is_const() && b.is_const() && !to_all_const {
            return false;
        }
        to_all_const = to_all_const && b.is_const();
        t1 = a.compound_next();
        t2 = b.compound_next();
    }
    true
}

/// `a` and `b` name the same type once top-level qualifiers are stripped,
/// or `a` is a class derived from `b`.
pub fn is_reference_related<'a>(a: &Type<'a>, b: &Type<'a>) -> bool {
    if let (Some(derived), Some(base)) = (a.class_def(), b.class_def()) {
        return core::ptr::eq(derived, base) || derived.is_derived_from(base);
    }
    similar_top_level(a, b)
}

/// A reference to `to` can bind to an lvalue of type `from`.
pub fn is_reference_compatible<'a>(from: &Type<'a>, to: &Type<'a>) -> bool {
    is_reference_related(from, to)
        && (to.is_const() || !from.is_const())
        && (to.is_volatile() || !from.is_volatile())
}

fn similar_top_level<'a>(a: &Type<'a>, b: &Type<'a>) -> bool {
    match (a, b) {
        (Type::Void { .. }, Type::Void { .. }) => true,
        (Type::Arithmetic { kind: k1, .. }, Type::Arithmetic { kind: k2, .. }) => k1 == k2,
        (Type::Pointer { pointee: p1, .. }, Type::Pointer { pointee: p2, .. }) => {
            same_type(p1, p2)
        }
        (Type::Class { class: c1, .. }, Type::Class { class: c2, .. }) => core::ptr::eq(*c1, *c2),
        _ => same_type(a, b),
    }
}

/// Strips one reference layer, if any.
pub fn peel_reference<'a>(ty: &'a Type<'a>) -> &'a Type<'a> {
    ty.referent().unwrap_or(ty)
}

/// Pointer-to-class conversion from `from` to `to` is a derived-to-base one.
pub fn is_derived_pointer<'a>(from: &Type<'a>, to: &Type<'a>) -> bool {
    match (from.pointee_class(), to.pointee_class()) {
        (Some(derived), Some(base)) => derived.is_derived_from(base),
        _ => false,
    }
}
