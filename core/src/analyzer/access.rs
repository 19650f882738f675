//! Pointer, subscript and member access.

use super::analyzer::{Analyzer, Resolution};
use super::construct::{Construct, ConstructKind, ValueCategory};
use super::conversions::{convert_to_prvalue, integral_promotion};
use super::notes::{Note, NoteKind};
use super::operators::finish;
use super::overloads::type_name;
use crate::ast::Span;
use crate::entities::{ClassDef, Entity, LookupResult};
use crate::types::Type;
use crate::{Box, String, ToString, Vec, vec};

/// Which member access operator is being compiled.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Dot,
    Arrow,
}

impl<'a, 's> Analyzer<'a, 's> {
    pub(super) fn analyze_dereference(&self, operand: Construct<'a>, span: Span) -> Construct<'a> {
        let types = self.types();
        if !operand.is_well_typed() {
            return Construct::new(ConstructKind::Dereference(Box::new(operand)), span);
        }
        let operand = convert_to_prvalue(types, operand);
        let mut notes = Vec::new();
        let pointee = operand.ty().and_then(|ty| ty.pointee());
        match pointee {
            None => notes.push(NoteKind::DereferencePointer {
                ty: type_name(&operand),
            }),
            Some(pointee) if !pointee.is_complete_object_type() => {
                notes.push(NoteKind::DereferenceIncomplete {
                    ty: pointee.to_string(),
                })
            }
            Some(_) => {}
        }
        let construct = Construct::new(ConstructKind::Dereference(Box::new(operand)), span);
        finish(
            construct,
            notes,
            pointee.map(|ty| (ty, ValueCategory::Lvalue)),
        )
    }

    pub(super) fn analyze_address_of(&self, operand: Construct<'a>, span: Span) -> Construct<'a> {
        let types = self.types();
        let Some(ty) = operand.well_typed() else {
            return Construct::new(ConstructKind::AddressOf(Box::new(operand)), span);
        };
        let mut notes = Vec::new();
        if ty.is_function() {
            notes.push(NoteKind::Unsupported {
                feature: "taking the address of a function",
            });
        } else if !operand.is_lvalue() {
            notes.push(NoteKind::AddressOfLvalue);
        } else if !ty.is_object_type() {
            notes.push(NoteKind::AddressOfObject { ty: ty.to_string() });
        }
        let construct = Construct::new(ConstructKind::AddressOf(Box::new(operand)), span);
        finish(
            construct,
            notes,
            Some((types.pointer(ty), ValueCategory::Prvalue)),
        )
    }

    pub(super) fn analyze_subscript(
        &mut self,
        operand: Construct<'a>,
        offset: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        if !operand.is_well_typed() || !offset.is_well_typed() {
            return Construct::new(
                ConstructKind::Subscript {
                    operand: Box::new(operand),
                    offset: Box::new(offset),
                },
                span,
            );
        }

        if operand.well_typed().is_some_and(|ty| ty.is_class()) {
            return self.analyze_operator_overload("[]", vec![operand, offset], span);
        }

        let operand = convert_to_prvalue(types, operand);
        let offset = integral_promotion(types, convert_to_prvalue(types, offset));
        let mut notes = Vec::new();
        let elem = operand
            .ty()
            .filter(|ty| ty.is_pointer_to_complete_object())
            .and_then(|ty| ty.pointee());
        if elem.is_none() {
            notes.push(NoteKind::SubscriptOperand {
                ty: type_name(&operand),
            });
        }
        if !offset.ty().is_some_and(|ty| ty.is_integral()) {
            notes.push(NoteKind::SubscriptOffset {
                ty: type_name(&offset),
            });
        }

        let construct = Construct::new(
            ConstructKind::Subscript {
                operand: Box::new(operand),
                offset: Box::new(offset),
            },
            span,
        );
        finish(construct, notes, elem.map(|ty| (ty, ValueCategory::Lvalue)))
    }

    pub(super) fn analyze_dot(
        &mut self,
        operand: Construct<'a>,
        member: &str,
        call_args: Option<&[&Construct<'a>]>,
        span: Span,
    ) -> Construct<'a> {
        self.analyze_member_access(Access::Dot, operand, member, call_args, span)
    }

    pub(super) fn analyze_arrow(
        &mut self,
        operand: Construct<'a>,
        member: &str,
        call_args: Option<&[&Construct<'a>]>,
        span: Span,
    ) -> Construct<'a> {
        let operand = if operand.is_well_typed() {
            convert_to_prvalue(self.types(), operand)
        } else {
            operand
        };
        self.analyze_member_access(Access::Arrow, operand, member, call_args, span)
    }

    fn analyze_member_access(
        &mut self,
        access: Access,
        operand: Construct<'a>,
        member: &str,
        call_args: Option<&[&Construct<'a>]>,
        span: Span,
    ) -> Construct<'a> {
        let resolution = match operand.well_typed() {
            Some(ty) => {
                let receiver = match access {
                    Access::Dot => Some(ty).filter(|ty| ty.is_class()),
                    Access::Arrow => ty.pointee().filter(|ty| ty.is_class()),
                };
                match receiver {
                    Some(receiver) => self.resolve_member(receiver, member, call_args, &span),
                    None => {
                        let operand = ty.to_string();
                        let member = member.to_string();
                        let kind = match access {
                            Access::Dot => NoteKind::DotClassType { operand, member },
                            Access::Arrow => NoteKind::ArrowClassPointer { operand, member },
                        };
                        Some(Resolution {
                            entity: None,
                            note: Some(Note::new(kind, span.clone())),
                        })
                    }
                }
            }
            None => None,
        };

        let receiver = operand.ty().and_then(|ty| match access {
            Access::Dot => Some(ty),
            Access::Arrow => ty.pointee(),
        });
        let entity = resolution.as_ref().and_then(|r| r.entity);
        let ty = entity.map(|entity| self.entity_type(entity, receiver));

        let operand = Box::new(operand);
        let member = String::from(member);
        let kind = match access {
            Access::Dot => ConstructKind::Dot {
                operand,
                member,
                entity,
            },
            Access::Arrow => ConstructKind::Arrow {
                operand,
                member,
                entity,
            },
        };
        let mut construct = Construct::new(kind, span);
        if let Some(note) = resolution.and_then(|r| r.note) {
            construct.push_note(note);
        }
        if let Some(ty) = ty {
            construct.set_type(ty, ValueCategory::Lvalue);
        }
        construct
    }

    /// Looks `member` up in the class of `receiver`.
    fn resolve_member(
        &self,
        receiver: &'a Type<'a>,
        member: &str,
        call_args: Option<&[&Construct<'a>]>,
        span: &Span,
    ) -> Option<Resolution<'a>> {
        let class: &'a ClassDef<'a> = receiver.class_def()?;
        let failed = |kind: NoteKind| Resolution {
            entity: None,
            note: Some(Note::new(kind, span.clone())),
        };
        let class_name = || class.name.to_string();

        if !class.is_complete() {
            return Some(failed(NoteKind::IncompleteClass {
                class: class_name(),
            }));
        }

        Some(match class.lookup_member(member) {
            LookupResult::NotFound => failed(NoteKind::MemberNotFound {
                class: class_name(),
                member: member.to_string(),
            }),
            LookupResult::Ambiguous => failed(NoteKind::MemberAmbiguous {
                class: class_name(),
                member: member.to_string(),
            }),
            LookupResult::Class(_) => failed(NoteKind::MemberClassFound {
                class: class_name(),
                member: member.to_string(),
            }),
            LookupResult::Variable(var) => Resolution {
                entity: Some(Entity::Variable(var)),
                note: None,
            },
            LookupResult::Functions(set) => {
                self.resolve_function_name(member, set, call_args, Some(receiver), span)
            }
        })
    }
}
