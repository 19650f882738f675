use crate::entities::ClassDef;
use bitflags::bitflags;
use core::fmt::{self, Display};
use core::hash::{Hash, Hasher};

bitflags! {
    /// cv-qualifiers attached to a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Cv: u8 {
        const CONST = 0b01;
        const VOLATILE = 0b10;
    }
}

impl Cv {
    pub fn is_const(self) -> bool {
        self.contains(Cv::CONST)
    }

    pub fn is_volatile(self) -> bool {
        self.contains(Cv::VOLATILE)
    }

    fn prefix(self) -> &'static str {
        match (self.is_const(), self.is_volatile()) {
            (true, true) => "const volatile ",
            (true, false) => "const ",
            (false, true) => "volatile ",
            (false, false) => "",
        }
    }

    fn suffix(self) -> &'static str {
        match (self.is_const(), self.is_volatile()) {
            (true, true) => " const volatile",
            (true, false) => " const",
            (false, true) => " volatile",
            (false, false) => "",
        }
    }
}

/// Fundamental arithmetic types, ordered by conversion rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArithmeticKind {
    Bool,
    Char,
    Int,
    Float,
    Double,
}

impl ArithmeticKind {
    pub fn name(self) -> &'static str {
        match self {
            ArithmeticKind::Bool => "bool",
            ArithmeticKind::Char => "char",
            ArithmeticKind::Int => "int",
            ArithmeticKind::Float => "float",
            ArithmeticKind::Double => "double",
        }
    }

    pub fn size(self) -> usize {
        match self {
            ArithmeticKind::Bool | ArithmeticKind::Char => 1,
            ArithmeticKind::Int | ArithmeticKind::Float => 4,
            ArithmeticKind::Double => 8,
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            ArithmeticKind::Bool | ArithmeticKind::Char | ArithmeticKind::Int
        )
    }

    pub fn is_floating(self) -> bool {
        !self.is_integral()
    }

    /// Number of value bits for integral kinds.
    pub fn bit_width(self) -> u32 {
        match self {
            ArithmeticKind::Bool => 1,
            ArithmeticKind::Char => 8,
            ArithmeticKind::Int => 32,
            ArithmeticKind::Float => 32,
            ArithmeticKind::Double => 64,
        }
    }
}

/// Size of every pointer type.
pub const POINTER_SIZE: usize = 8;

/// A C++ type. Always interned by a [`TypeManager`](super::manager::TypeManager):
/// children are compared by address, so two `&Type` are the same type exactly
/// when they are the same reference.
#[derive(Debug, Clone, Copy)]
pub enum Type<'a> {
    Void {
        cv: Cv,
    },
    Arithmetic {
        kind: ArithmeticKind,
        cv: Cv,
    },
    Pointer {
        pointee: &'a Type<'a>,
        cv: Cv,
    },
    /// `elem[len]`. Qualifiers live on the element type.
    BoundedArray {
        elem: &'a Type<'a>,
        len: usize,
    },
    Class {
        class: &'a ClassDef<'a>,
        cv: Cv,
    },
    Function {
        params: &'a [&'a Type<'a>],
        ret: &'a Type<'a>,
        /// Qualifiers of the implicit object parameter; `None` for non-members.
        receiver: Option<Cv>,
    },
    Reference {
        referent: &'a Type<'a>,
    },
}

impl PartialEq for Type<'_> {
    fn eq(&self, other: &Self) -> bool {
        use core::ptr::eq as same;
        match (self, other) {
            (Type::Void { cv: a }, Type::Void { cv: b }) => a == b,
            (
                Type::Arithmetic { kind: k1, cv: c1 },
                Type::Arithmetic { kind: k2, cv: c2 },
            ) => k1 == k2 && c1 == c2,
            (
                Type::Pointer {
                    pointee: p1,
                    cv: c1,
                },
                Type::Pointer {
                    pointee: p2,
                    cv: c2,
                },
            ) => same(*p1, *p2) && c1 == c2,
            (
                Type::BoundedArray { elem: e1, len: l1 },
                Type::BoundedArray { elem: e2, len: l2 },
            ) => same(*e1, *e2) && l1 == l2,
            (Type::Class { class: a, cv: c1 }, Type::Class { class: b, cv: c2 }) => {
                same(*a, *b) && c1 == c2
            }
            (
                Type::Function {
                    params: p1,
                    ret: r1,
                    receiver: rc1,
                },
                Type::Function {
                    params: p2,
                    ret: r2,
                    receiver: rc2,
                },
            ) => {
                p1.len() == p2.len()
                    && p1.iter().zip(p2.iter()).all(|(a, b)| same(*a, *b))
                    && same(*r1, *r2)
                    && rc1 == rc2
            }
            (Type::Reference { referent: a }, Type::Reference { referent: b }) => same(*a, *b),
            _ => false,
        }
    }
}

impl Eq for Type<'_> {}

impl Hash for Type<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Type::Void { cv } => cv.hash(state),
            Type::Arithmetic { kind, cv } => {
                kind.hash(state);
                cv.hash(state);
            }
            Type::Pointer { pointee, cv } => {
                core::ptr::hash(*pointee, state);
                cv.hash(state);
            }
            Type::BoundedArray { elem, len } => {
                core::ptr::hash(*elem, state);
                len.hash(state);
            }
            Type::Class { class, cv } => {
                core::ptr::hash(*class, state);
                cv.hash(state);
            }
            Type::Function {
                params,
                ret,
                receiver,
            } => {
                params.len().hash(state);
                for param in params.iter() {
                    core::ptr::hash(*param, state);
                }
                core::ptr::hash(*ret, state);
                receiver.hash(state);
            }
            Type::Reference { referent } => core::ptr::hash(*referent, state),
        }
    }
}

impl Display for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void { cv } => write!(f, "{}void", cv.prefix()),
            Type::Arithmetic { kind, cv } => write!(f, "{}{}", cv.prefix(), kind.name()),
            Type::Pointer { pointee, cv } => match pointee {
                Type::BoundedArray { elem, len } => {
                    write!(f, "{}(*{})[{}]", elem, cv.suffix(), len)
                }
                Type::Function { params, ret, .. } => {
                    write!(f, "{}(*{})(", ret, cv.suffix())?;
                    write_params(f, params)?;
                    f.write_str(")")
                }
                _ => write!(f, "{}*{}", pointee, cv.suffix()),
            },
            Type::BoundedArray { elem, len } => write!(f, "{}[{}]", elem, len),
            Type::Class { class, cv } => write!(f, "{}{}", cv.prefix(), class.name),
            Type::Function {
                params,
                ret,
                receiver,
            } => {
                write!(f, "{}(", ret)?;
                write_params(f, params)?;
                f.write_str(")")?;
                if let Some(cv) = receiver {
                    f.write_str(cv.suffix())?;
                }
                Ok(())
            }
            Type::Reference { referent } => write!(f, "{}&", referent),
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[&Type<'_>]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", param)?;
    }
    Ok(())
}
