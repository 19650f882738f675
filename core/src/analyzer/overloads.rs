//! Overload resolution.
//!
//! Candidates are ranked by the total length of the implicit conversion
//! chains their arguments need. The shortest viable candidate wins; a tie
//! at the minimum is ambiguous.

use super::construct::{Construct, ValueCategory};
use super::context::CompileContext;
use super::conversions::{ConversionOptions, standard_conversion};
use super::notes::{NoteKind, RelatedNote};
use crate::entities::{FunctionEntity, LookupResult};
use crate::types::{Type, TypeManager, is_reference_compatible, same_type};
use crate::{String, ToString, Vec, format};
use smallvec::SmallVec;
use tracing::debug;

/// A candidate and why it was rejected (empty when viable).
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub function: &'a FunctionEntity<'a>,
    pub reasons: Vec<NoteKind>,
    pub cost: usize,
}

impl Candidate<'_> {
    pub fn is_viable(&self) -> bool {
        self.reasons.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum OverloadResult<'a> {
    Selected(&'a FunctionEntity<'a>),
    Ambiguous(Vec<&'a FunctionEntity<'a>>),
    NoViable(Vec<Candidate<'a>>),
}

impl<'a> OverloadResult<'a> {
    pub fn selected(&self) -> Option<&'a FunctionEntity<'a>> {
        match self {
            OverloadResult::Selected(function) => Some(function),
            _ => None,
        }
    }

    /// The selected function, else the closest candidate so that a call can
    /// still be compiled and report precise argument diagnostics.
    pub fn best_effort(&self) -> Option<&'a FunctionEntity<'a>> {
        match self {
            OverloadResult::Selected(function) => Some(function),
            OverloadResult::Ambiguous(viable) => viable.first().copied(),
            OverloadResult::NoViable(candidates) => candidates
                .iter()
                .min_by_key(|c| c.reasons.len())
                .map(|c| c.function),
        }
    }

    /// One related note per rejected candidate.
    pub fn related_notes(&self) -> Vec<RelatedNote> {
        match self {
            OverloadResult::Selected(_) => Vec::new(),
            OverloadResult::Ambiguous(viable) => viable
                .iter()
                .map(|f| RelatedNote {
                    span: Default::default(),
                    message: format!("candidate: {} {}", f.name, f.ty),
                })
                .collect(),
            OverloadResult::NoViable(candidates) => candidates
                .iter()
                .flat_map(|c| {
                    c.reasons.iter().map(move |reason| RelatedNote {
                        span: Default::default(),
                        message: format!(
                            "candidate {} {}: {}",
                            c.function.name, c.function.ty, reason
                        ),
                    })
                })
                .collect(),
        }
    }
}

/// Checks one candidate against the arguments.
///
/// `receiver` is the type of the object a member function would be called
/// on; it is ignored for non-members.
pub fn check_candidate<'a>(
    types: &'a TypeManager<'a>,
    function: &'a FunctionEntity<'a>,
    args: &[&Construct<'a>],
    receiver: Option<&'a Type<'a>>,
) -> Candidate<'a> {
    let mut reasons = Vec::new();
    let mut cost = 0;
    let params = function.params();

    if params.len() != args.len() {
        reasons.push(NoteKind::CallArgCount {
            name: function.name.to_string(),
            expected: params.len(),
            found: args.len(),
        });
        return Candidate {
            function,
            reasons,
            cost,
        };
    }

    if function.is_member()
        && receiver.is_some_and(|r| r.is_const())
        && !function.has_const_receiver()
    {
        reasons.push(NoteKind::CallConstReceiver {
            name: function.name.to_string(),
        });
    }

    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        match check_argument(types, param, arg) {
            Ok(length) => cost += length,
            Err(reason) => reasons.push(argument_reason(function, index, param, arg, reason)),
        }
    }

    Candidate {
        function,
        reasons,
        cost,
    }
}

enum ArgumentProblem {
    Conversion,
    ReferenceBinding,
}

/// Conversion length needed to pass `arg` for `param`.
fn check_argument<'a>(
    types: &'a TypeManager<'a>,
    param: &'a Type<'a>,
    arg: &Construct<'a>,
) -> Result<usize, ArgumentProblem> {
    let Some(arg_ty) = arg.well_typed() else {
        return Err(ArgumentProblem::Conversion);
    };

    if let Some(referent) = param.referent() {
        return if arg.is_lvalue() && is_reference_compatible(arg_ty, referent) {
            Ok(0)
        } else {
            Err(ArgumentProblem::ReferenceBinding)
        };
    }

    if let Some(param_class) = param.class_def() {
        return match arg_ty.class_def() {
            Some(arg_class) if core::ptr::eq(arg_class, param_class) => Ok(0),
            Some(arg_class) if arg_class.is_derived_from(param_class) => Ok(1),
            _ => Err(ArgumentProblem::Conversion),
        };
    }

    let converted = standard_conversion(types, arg.clone(), param, ConversionOptions::default());
    let reaches = converted.is_prvalue()
        && converted
            .ty()
            .is_some_and(|t| same_type(types.cv_unqualified(t), types.cv_unqualified(param)));
    if reaches {
        Ok(converted.conversion_length())
    } else {
        Err(ArgumentProblem::Conversion)
    }
}

fn argument_reason<'a>(
    function: &'a FunctionEntity<'a>,
    index: usize,
    param: &'a Type<'a>,
    arg: &Construct<'a>,
    problem: ArgumentProblem,
) -> NoteKind {
    let name = function.name.to_string();
    match problem {
        ArgumentProblem::ReferenceBinding => NoteKind::CallReferenceBinding {
            name,
            index: index + 1,
            to: param.to_string(),
        },
        ArgumentProblem::Conversion => NoteKind::CallParamType {
            name,
            index: index + 1,
            from: type_name(arg),
            to: param.to_string(),
        },
    }
}

pub(crate) fn type_name(construct: &Construct<'_>) -> String {
    construct
        .ty()
        .map_or_else(|| "<error-type>".to_string(), |t| t.to_string())
}

/// Chooses among `candidates` for the given arguments.
pub fn resolve_overloads<'a>(
    types: &'a TypeManager<'a>,
    candidates: &[&'a FunctionEntity<'a>],
    args: &[&Construct<'a>],
    receiver: Option<&'a Type<'a>>,
) -> OverloadResult<'a> {
    let checked: Vec<Candidate<'a>> = candidates
        .iter()
        .map(|function| check_candidate(types, function, args, receiver))
        .collect();

    let best_cost = checked.iter().filter(|c| c.is_viable()).map(|c| c.cost).min();
    let Some(best_cost) = best_cost else {
        debug!(candidates = checked.len(), "no viable overload");
        return OverloadResult::NoViable(checked);
    };

    let best: SmallVec<[&'a FunctionEntity<'a>; 4]> = checked
        .iter()
        .filter(|c| c.is_viable() && c.cost == best_cost)
        .map(|c| c.function)
        .collect();

    match best.as_slice() {
        [single] => {
            debug!(function = single.name, ty = %single.ty, cost = best_cost, "selected overload");
            OverloadResult::Selected(single)
        }
        _ => {
            debug!(tied = best.len(), cost = best_cost, "ambiguous overload");
            OverloadResult::Ambiguous(best.into_iter().collect())
        }
    }
}

/// Outcome of looking for a user-defined operator.
#[derive(Debug, Clone)]
pub enum OperatorSelection<'a> {
    /// `operands[0].operator@(operands[1..])`.
    Member(&'a FunctionEntity<'a>),
    /// `operator@(operands...)`.
    NonMember(&'a FunctionEntity<'a>),
    /// No candidate set was found, or none was a unique best match.
    NoOverload(Option<OverloadResult<'a>>),
}

/// Looks for `operator<op>` first as a member of the leftmost operand's
/// class, then in the enclosing scope.
pub fn select_operator_overload<'a>(
    ctx: &CompileContext<'a, '_>,
    op: &'static str,
    operands: &[&Construct<'a>],
) -> OperatorSelection<'a> {
    let name = format!("operator{}", op);
    let mut failure = None;

    if let Some((first, rest)) = operands.split_first() {
        if let Some(class) = first.well_typed().and_then(|t| t.class_def()) {
            if let LookupResult::Functions(candidates) = class.lookup_member(&name) {
                let result = resolve_overloads(ctx.types, &candidates, rest, first.ty());
                if let Some(function) = result.selected() {
                    return OperatorSelection::Member(function);
                }
                failure = Some(result);
            }
        }
    }

    if let LookupResult::Functions(candidates) = ctx.scope.lookup(&name) {
        let free: SmallVec<[&'a FunctionEntity<'a>; 4]> =
            candidates.into_iter().filter(|f| !f.is_member()).collect();
        if !free.is_empty() {
            let result = resolve_overloads(ctx.types, &free, operands, None);
            if let Some(function) = result.selected() {
                return OperatorSelection::NonMember(function);
            }
            failure = Some(result);
        }
    }

    OperatorSelection::NoOverload(failure)
}

/// Category of a call's result given the callee's return type.
pub(crate) fn return_category(ret: &Type<'_>) -> ValueCategory {
    if ret.is_reference() {
        ValueCategory::Lvalue
    } else {
        ValueCategory::Prvalue
    }
}
