//! Named things an expression can refer to.
//!
//! Declarations themselves are processed outside this crate; the analyzer
//! only needs resolved entities and class scopes, which hosts create through
//! the [`TypeManager`](crate::types::TypeManager) declaration methods.

use crate::types::Type;
use core::cell::OnceCell;
use core::fmt;
use smallvec::SmallVec;
use thiserror::Error;

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Global,
    Local,
    Parameter,
    Member,
}

#[derive(Debug)]
pub struct VariableEntity<'a> {
    pub name: &'a str,
    pub ty: &'a Type<'a>,
    pub kind: VariableKind,
    /// Owning class for members.
    pub class: Option<&'a ClassDef<'a>>,
}

#[derive(Debug)]
pub struct FunctionEntity<'a> {
    pub name: &'a str,
    /// Always a `Type::Function`.
    pub ty: &'a Type<'a>,
    pub class: Option<&'a ClassDef<'a>>,
    pub is_destructor: bool,
}

impl<'a> FunctionEntity<'a> {
    pub fn params(&self) -> &'a [&'a Type<'a>] {
        match self.ty {
            Type::Function { params, .. } => params,
            _ => &[],
        }
    }

    pub fn return_type(&self) -> &'a Type<'a> {
        match self.ty {
            Type::Function { ret, .. } => ret,
            other => other,
        }
    }

    pub fn is_member(&self) -> bool {
        self.class.is_some()
    }

    /// Whether the implicit object parameter is `const`.
    pub fn has_const_receiver(&self) -> bool {
        matches!(self.ty, Type::Function { receiver: Some(cv), .. } if cv.is_const())
    }

    pub fn returns_complete_type(&self) -> bool {
        self.return_type().is_complete_return_type()
    }
}

/// A variable or a single function (after overload selection).
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Variable(&'a VariableEntity<'a>),
    Function(&'a FunctionEntity<'a>),
}

impl<'a> Entity<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Entity::Variable(var) => var.name,
            Entity::Function(func) => func.name,
        }
    }

    pub fn ty(&self) -> &'a Type<'a> {
        match self {
            Entity::Variable(var) => var.ty,
            Entity::Function(func) => func.ty,
        }
    }

    pub fn as_function(&self) -> Option<&'a FunctionEntity<'a>> {
        match self {
            Entity::Function(func) => Some(func),
            Entity::Variable(_) => None,
        }
    }

    pub fn as_variable(&self) -> Option<&'a VariableEntity<'a>> {
        match self {
            Entity::Variable(var) => Some(var),
            Entity::Function(_) => None,
        }
    }

    /// Same declaration.
    pub fn is_same(&self, other: &Entity<'a>) -> bool {
        match (self, other) {
            (Entity::Variable(a), Entity::Variable(b)) => core::ptr::eq(*a, *b),
            (Entity::Function(a), Entity::Function(b)) => core::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Functions sharing one name in one scope.
pub type OverloadSet<'a> = SmallVec<[&'a FunctionEntity<'a>; 4]>;

/// Outcome of looking a name up in a scope.
#[derive(Debug, Clone)]
pub enum LookupResult<'a> {
    NotFound,
    Variable(&'a VariableEntity<'a>),
    Functions(OverloadSet<'a>),
    Class(&'a ClassDef<'a>),
    /// The name is declared in more than one base class.
    Ambiguous,
}

impl LookupResult<'_> {
    pub fn is_found(&self) -> bool {
        !matches!(self, LookupResult::NotFound)
    }
}

/// Members of a class, fixed once the class is defined.
#[derive(Debug, Default)]
pub struct ClassBody<'a> {
    pub members: &'a [&'a VariableEntity<'a>],
    pub functions: &'a [&'a FunctionEntity<'a>],
    pub destructor: Option<&'a FunctionEntity<'a>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassDefinitionError {
    #[error("class `{0}` is already defined")]
    AlreadyDefined(crate::String),
}

pub struct ClassDef<'a> {
    pub name: &'a str,
    pub bases: &'a [&'a ClassDef<'a>],
    body: OnceCell<ClassBody<'a>>,
}

impl fmt::Debug for ClassDef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl<'a> ClassDef<'a> {
    pub(crate) fn new(name: &'a str, bases: &'a [&'a ClassDef<'a>]) -> Self {
        ClassDef {
            name,
            bases,
            body: OnceCell::new(),
        }
    }

    /// Completes the class. A class can be defined only once.
    pub fn define(&self, body: ClassBody<'a>) -> Result<(), ClassDefinitionError> {
        self.body
            .set(body)
            .map_err(|_| ClassDefinitionError::AlreadyDefined(self.name.into()))
    }

    pub fn is_complete(&self) -> bool {
        self.body.get().is_some()
    }

    pub fn body(&self) -> Option<&ClassBody<'a>> {
        self.body.get()
    }

    pub fn destructor(&self) -> Option<&'a FunctionEntity<'a>> {
        self.body.get().and_then(|body| body.destructor)
    }

    /// Sum of base and member sizes; `None` while incomplete.
    pub fn size(&self) -> Option<usize> {
        let body = self.body.get()?;
        let mut size = 0;
        for base in self.bases {
            size += base.size()?;
        }
        for member in body.members {
            size += member.ty.size()?;
        }
        Some(size)
    }

    /// Transitively derived from `base` (a class is not derived from itself).
    pub fn is_derived_from(&self, base: &ClassDef<'a>) -> bool {
        self.bases
            .iter()
            .any(|b| core::ptr::eq(*b, base) || b.is_derived_from(base))
    }

    /// Member name lookup: this class first, then every base.
    ///
    /// A name visible through two different bases is ambiguous unless both
    /// paths lead to the same declaration.
    pub fn lookup_member(&self, name: &str) -> LookupResult<'a> {
        if let Some(body) = self.body.get() {
            if let Some(var) = body.members.iter().find(|m| m.name == name) {
                return LookupResult::Variable(*var);
            }
            let functions: OverloadSet<'a> = body
                .functions
                .iter()
                .copied()
                .filter(|func| func.name == name)
                .collect();
            if !functions.is_empty() {
                return LookupResult::Functions(functions);
            }
        }

        let mut found = LookupResult::NotFound;
        for base in self.bases {
            let result = base.lookup_member(name);
            found = match (found, result) {
                (prior, LookupResult::NotFound) => prior,
                (LookupResult::NotFound, result) => result,
                (LookupResult::Variable(a), LookupResult::Variable(b)) if core::ptr::eq(a, b) => {
                    LookupResult::Variable(a)
                }
                _ => LookupResult::Ambiguous,
            };
        }
        found
    }
}
