//! Name lookup for identifiers.
//!
//! The analyzer only ever asks a [`Scope`] to resolve names; declaring them
//! is the host's business. Two implementations ship here:
//! - [`DeclarationScope`]: a single block of declarations.
//! - [`ScopeStack`]: nested blocks searched innermost first, so inner
//!   declarations shadow outer ones.
//!
//! Class scopes ([`ClassDef`]) implement the same trait for `A::b` lookups.

use crate::entities::{ClassDef, FunctionEntity, LookupResult, OverloadSet, VariableEntity};
use crate::{String, ToString, Vec};
use bumpalo::Bump;
use hashbrown::{DefaultHashBuilder, HashMap};
use thiserror::Error;

/// Something names can be resolved in.
pub trait Scope<'a> {
    fn lookup(&self, name: &str) -> LookupResult<'a>;

    /// Resolves `A::B::c` by walking class scopes. An empty first segment
    /// (`::x`) is treated like an unqualified lookup.
    fn lookup_qualified(&self, path: &[&str]) -> LookupResult<'a> {
        let Some((first, rest)) = path.split_first() else {
            return LookupResult::NotFound;
        };
        if first.is_empty() {
            return self.lookup_qualified(rest);
        }
        lookup_members(self.lookup(first), rest)
    }
}

/// Continues a qualified lookup from `start` through nested class scopes.
fn lookup_members<'a>(start: LookupResult<'a>, rest: &[&str]) -> LookupResult<'a> {
    let mut current = start;
    for segment in rest {
        current = match current {
            LookupResult::Class(class) => class.lookup_member(segment),
            LookupResult::Ambiguous => return LookupResult::Ambiguous,
            _ => return LookupResult::NotFound,
        };
    }
    current
}

impl<'a> Scope<'a> for ClassDef<'a> {
    fn lookup(&self, name: &str) -> LookupResult<'a> {
        self.lookup_member(name)
    }
}

/// A scope with nothing in it.
pub struct EmptyScope;

impl<'a> Scope<'a> for EmptyScope {
    fn lookup(&self, _name: &str) -> LookupResult<'a> {
        LookupResult::NotFound
    }
}

#[derive(Debug, Clone)]
enum Declaration<'a> {
    Variable(&'a VariableEntity<'a>),
    Functions(OverloadSet<'a>),
    Class(&'a ClassDef<'a>),
}

/// Error when declaring a name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("no scope to declare `{0}` in")]
    NoScope(String),
    #[error("`{0}` is already declared in this scope")]
    Redeclared(String),
}

/// Error when trying to pop a scope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PopError {
    #[error("cannot pop from empty scope stack")]
    EmptyStack,
}

/// One block of declarations.
///
/// Functions with the same name accumulate into an overload set; any other
/// redeclaration is an error.
pub struct DeclarationScope<'a> {
    entries: HashMap<&'a str, Declaration<'a>, DefaultHashBuilder, &'a Bump>,
}

impl<'a> DeclarationScope<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            entries: HashMap::new_in(arena),
        }
    }

    pub fn declare_variable(
        &mut self,
        var: &'a VariableEntity<'a>,
    ) -> Result<(), DeclarationError> {
        self.insert_unique(var.name, Declaration::Variable(var))
    }

    pub fn declare_class(&mut self, class: &'a ClassDef<'a>) -> Result<(), DeclarationError> {
        self.insert_unique(class.name, Declaration::Class(class))
    }

    pub fn declare_function(
        &mut self,
        func: &'a FunctionEntity<'a>,
    ) -> Result<(), DeclarationError> {
        match self.entries.get_mut(func.name) {
            Some(Declaration::Functions(overloads)) => {
                overloads.push(func);
                Ok(())
            }
            Some(_) => Err(DeclarationError::Redeclared(func.name.to_string())),
            None => {
                let mut overloads = OverloadSet::new();
                overloads.push(func);
                self.entries.insert(func.name, Declaration::Functions(overloads));
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn insert_unique(
        &mut self,
        name: &'a str,
        declaration: Declaration<'a>,
    ) -> Result<(), DeclarationError> {
        if self.entries.contains_key(name) {
            return Err(DeclarationError::Redeclared(name.to_string()));
        }
        self.entries.insert(name, declaration);
        Ok(())
    }
}

impl<'a> Scope<'a> for DeclarationScope<'a> {
    fn lookup(&self, name: &str) -> LookupResult<'a> {
        match self.entries.get(name) {
            None => LookupResult::NotFound,
            Some(Declaration::Variable(var)) => LookupResult::Variable(*var),
            Some(Declaration::Functions(overloads)) => LookupResult::Functions(overloads.clone()),
            Some(Declaration::Class(class)) => LookupResult::Class(*class),
        }
    }
}

/// Nested block scopes, searched from innermost to outermost.
pub struct ScopeStack<'a> {
    arena: &'a Bump,
    scopes: Vec<DeclarationScope<'a>>,
}

impl<'a> ScopeStack<'a> {
    /// Creates a stack holding only the global scope.
    pub fn new(arena: &'a Bump) -> Self {
        let mut scopes = Vec::new();
        scopes.push(DeclarationScope::new(arena));
        Self { arena, scopes }
    }

    pub fn push_block(&mut self) {
        self.scopes.push(DeclarationScope::new(self.arena));
    }

    pub fn pop(&mut self) -> Result<(), PopError> {
        self.scopes.pop().ok_or(PopError::EmptyStack)?;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current(&mut self, name: &str) -> Result<&mut DeclarationScope<'a>, DeclarationError> {
        self.scopes
            .last_mut()
            .ok_or_else(|| DeclarationError::NoScope(name.to_string()))
    }

    pub fn declare_variable(
        &mut self,
        var: &'a VariableEntity<'a>,
    ) -> Result<(), DeclarationError> {
        self.current(var.name)?.declare_variable(var)
    }

    pub fn declare_function(
        &mut self,
        func: &'a FunctionEntity<'a>,
    ) -> Result<(), DeclarationError> {
        self.current(func.name)?.declare_function(func)
    }

    pub fn declare_class(&mut self, class: &'a ClassDef<'a>) -> Result<(), DeclarationError> {
        self.current(class.name)?.declare_class(class)
    }
}

impl<'a> Scope<'a> for ScopeStack<'a> {
    fn lookup(&self, name: &str) -> LookupResult<'a> {
        for scope in self.scopes.iter().rev() {
            let result = scope.lookup(name);
            if result.is_found() {
                return result;
            }
        }
        LookupResult::NotFound
    }

    fn lookup_qualified(&self, path: &[&str]) -> LookupResult<'a> {
        // `::x` names the global scope only.
        match path.split_first() {
            Some((first, rest)) if first.is_empty() => match self.scopes.first() {
                Some(global) => global.lookup_qualified(rest),
                None => LookupResult::NotFound,
            },
            Some((first, rest)) => lookup_members(self.lookup(first), rest),
            None => LookupResult::NotFound,
        }
    }
}
