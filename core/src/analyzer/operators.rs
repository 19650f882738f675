//! Operator expressions: arithmetic, relational, logical, assignment and
//! the unary operators.
//!
//! Class-typed operands divert to user-defined operator selection before
//! any built-in rule runs. Pointer and stream operands are rewritten into
//! their dedicated construct kinds.

use super::analyzer::Analyzer;
use super::construct::{Construct, ConstructKind, ValueCategory};
use super::conversions::{
    ConversionOptions, convert_to_prvalue, integral_promotion, is_integer_literal_zero,
    standard_conversion, usual_arithmetic_conversions,
};
use super::notes::{Note, NoteKind};
use super::overloads::{
    OperatorSelection, return_category, select_operator_overload, type_name,
};
use crate::api::Severity;
use crate::ast::{ArithmeticOp, BinaryOp, IncDec, LogicalOp, RelationalOp, Span, UnaryOp};
use crate::types::{Type, is_derived_pointer, peel_reference, same_type, similar_type};
use crate::{Box, ToString, Vec, vec};

/// Attaches `notes` and, when there are no errors among them, the type.
pub(super) fn finish<'a>(
    mut construct: Construct<'a>,
    notes: Vec<NoteKind>,
    typed: Option<(&'a Type<'a>, ValueCategory)>,
) -> Construct<'a> {
    let has_errors = notes.iter().any(|note| note.severity() == Severity::Error);
    for note in notes {
        construct.add_note(note);
    }
    if let (false, Some((ty, category))) = (has_errors, typed) {
        construct.set_type(ty, category);
    }
    construct
}

fn is_stream(construct: &Construct<'_>, name: &str) -> bool {
    construct
        .well_typed()
        .is_some_and(|ty| ty.is_class_named(name))
}

impl<'a, 's> Analyzer<'a, 's> {
    pub(super) fn analyze_binary(
        &mut self,
        op: BinaryOp,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        match op {
            BinaryOp::Arithmetic(op) => self.analyze_arithmetic(op, left, right, span),
            BinaryOp::Relational(op) => self.analyze_relational(op, left, right, span),
            BinaryOp::Logical(op) => self.analyze_logical(op, left, right, span),
        }
    }

    // ========================================================================
    // Operator overloads
    // ========================================================================

    /// Selects and builds a user-defined operator call, or an invalid
    /// overload construct when none fits.
    pub(super) fn analyze_operator_overload(
        &self,
        op: &'static str,
        operands: Vec<Construct<'a>>,
        span: Span,
    ) -> Construct<'a> {
        let selection = {
            let refs: Vec<&Construct<'a>> = operands.iter().collect();
            select_operator_overload(&self.ctx, op, &refs)
        };
        self.build_operator_overload(op, selection, operands, span)
    }

    fn build_operator_overload(
        &self,
        op: &'static str,
        selection: OperatorSelection<'a>,
        mut operands: Vec<Construct<'a>>,
        span: Span,
    ) -> Construct<'a> {
        let (function, receiver) = match selection {
            OperatorSelection::Member(function) if !operands.is_empty() => {
                let receiver = operands.remove(0);
                (function, Some(receiver))
            }
            OperatorSelection::NonMember(function) => (function, None),
            OperatorSelection::Member(_) | OperatorSelection::NoOverload(None) => {
                return self.invalid_operator_overload(op, operands, Vec::new(), span);
            }
            OperatorSelection::NoOverload(Some(result)) => {
                return self.invalid_operator_overload(op, operands, result.related_notes(), span);
            }
        };

        let receiver_ty = receiver.as_ref().and_then(|r| r.ty());
        let (args, notes) = self.convert_arguments(function, operands, receiver_ty);
        let ret = function.return_type();
        let construct = Construct::new(
            ConstructKind::OperatorOverload {
                op,
                receiver: receiver.map(Box::new),
                args,
                function,
            },
            span,
        );
        finish(
            construct,
            notes,
            Some((peel_reference(ret), return_category(ret))),
        )
    }

    fn invalid_operator_overload(
        &self,
        op: &'static str,
        operands: Vec<Construct<'a>>,
        related: Vec<super::notes::RelatedNote>,
        span: Span,
    ) -> Construct<'a> {
        let refs: Vec<&Construct<'a>> = operands.iter().collect();
        let args = super::analyzer::argument_types(&refs);
        let mut construct = Construct::new(
            ConstructKind::InvalidOperatorOverload { op, operands },
            span.clone(),
        );
        let note = Note::new(NoteKind::NoSuchOverload { op, args }, span);
        construct.push_note(note.with_related(related));
        construct
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    fn analyze_arithmetic(
        &mut self,
        op: ArithmeticOp,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let (Some(lt), Some(rt)) = (left.well_typed(), right.well_typed()) else {
            return Construct::new(
                ConstructKind::Arithmetic {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        };

        if lt.is_class() || rt.is_class() {
            let selection = select_operator_overload(&self.ctx, op.symbol(), &[&left, &right]);
            if let OperatorSelection::NoOverload(_) = selection {
                if op == ArithmeticOp::Shl && is_stream(&left, "ostream") {
                    return self.analyze_output(left, right, span);
                }
                if op == ArithmeticOp::Shr && is_stream(&left, "istream") {
                    return self.analyze_input(left, right, span);
                }
            }
            return self.build_operator_overload(op.symbol(), selection, vec![left, right], span);
        }

        let pointer_like = |ty: &Type<'_>| ty.is_pointer() || ty.is_bounded_array();
        if pointer_like(lt) || pointer_like(rt) {
            return self.analyze_pointer_arithmetic(op, left, right, span);
        }

        let types = self.types();
        let mut notes = Vec::new();
        if !lt.is_arithmetic() || !rt.is_arithmetic() {
            notes.push(NoteKind::ArithmeticOperands {
                op: op.symbol(),
                left: lt.to_string(),
                right: rt.to_string(),
            });
        } else if op.requires_integral() && !(lt.is_integral() && rt.is_integral()) {
            notes.push(NoteKind::IntegralOperands {
                op: op.symbol(),
                left: lt.to_string(),
                right: rt.to_string(),
            });
        }

        let (left, right) = if !notes.is_empty() {
            (left, right)
        } else if op.is_shift() {
            (
                integral_promotion(types, convert_to_prvalue(types, left)),
                integral_promotion(types, convert_to_prvalue(types, right)),
            )
        } else {
            usual_arithmetic_conversions(types, left, right)
        };

        let result_ty = match (left.ty(), right.ty()) {
            (Some(l), _) if op.is_shift() => Some(l),
            (Some(l), Some(r)) if same_type(l, r) => Some(l),
            _ => None,
        };
        if notes.is_empty() && result_ty.is_none() {
            notes.push(NoteKind::InvalidOperands {
                op: op.symbol(),
                left: type_name(&left),
                right: type_name(&right),
            });
        }

        let construct = Construct::new(
            ConstructKind::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
        finish(
            construct,
            notes,
            result_ty.map(|ty| (ty, ValueCategory::Prvalue)),
        )
    }

    /// `p + n`, `n + p`, `p - n` and `p - q`. Arrays decay first.
    fn analyze_pointer_arithmetic(
        &mut self,
        op: ArithmeticOp,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let left = convert_to_prvalue(types, left);
        let right = convert_to_prvalue(types, right);
        let (Some(lt), Some(rt)) = (left.ty(), right.ty()) else {
            return Construct::new(
                ConstructKind::Arithmetic {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        };

        match (lt.is_pointer(), rt.is_pointer(), op) {
            (true, true, ArithmeticOp::Sub) => {
                let mut notes = Vec::new();
                if !similar_type(lt, rt) {
                    notes.push(NoteKind::PointerDifferenceTypes {
                        left: lt.to_string(),
                        right: rt.to_string(),
                    });
                } else if !lt.is_pointer_to_complete_object() {
                    notes.push(NoteKind::PointerArithmeticIncomplete { ty: lt.to_string() });
                }
                let construct = Construct::new(
                    ConstructKind::PointerDifference {
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                );
                finish(
                    construct,
                    notes,
                    Some((types.int(), ValueCategory::Prvalue)),
                )
            }
            (true, false, ArithmeticOp::Add | ArithmeticOp::Sub) if rt.is_integral() => {
                let right = integral_promotion(types, right);
                self.pointer_offset(op, left, right, true, span)
            }
            (false, true, ArithmeticOp::Add) if lt.is_integral() => {
                let left = integral_promotion(types, left);
                self.pointer_offset(op, left, right, false, span)
            }
            _ => {
                let note = NoteKind::InvalidOperands {
                    op: op.symbol(),
                    left: lt.to_string(),
                    right: rt.to_string(),
                };
                let construct = Construct::new(
                    ConstructKind::Arithmetic {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                );
                finish(construct, vec![note], None)
            }
        }
    }

    fn pointer_offset(
        &self,
        op: ArithmeticOp,
        left: Construct<'a>,
        right: Construct<'a>,
        pointer_on_left: bool,
        span: Span,
    ) -> Construct<'a> {
        let pointer = if pointer_on_left { &left } else { &right };
        let pointer_ty = pointer.ty();
        let mut notes = Vec::new();
        if let Some(ty) = pointer_ty {
            if !ty.is_pointer_to_complete_object() {
                notes.push(NoteKind::PointerArithmeticIncomplete { ty: ty.to_string() });
            }
        }
        let construct = Construct::new(
            ConstructKind::PointerOffset {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pointer_on_left,
            },
            span,
        );
        finish(
            construct,
            notes,
            pointer_ty.map(|ty| (ty, ValueCategory::Prvalue)),
        )
    }

    // ========================================================================
    // Streams
    // ========================================================================

    fn analyze_output(
        &self,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let stream_ty = left.ty();
        let mut notes = Vec::new();

        let is_char_array = right.is_lvalue()
            && right
                .ty()
                .and_then(|ty| ty.array_elem())
                .is_some_and(|elem| elem.is_char());
        let right = if is_char_array {
            right
        } else {
            let right = convert_to_prvalue(types, right);
            if !right.ty().is_some_and(|ty| ty.is_atomic()) {
                notes.push(NoteKind::OutputOperand {
                    ty: type_name(&right),
                });
            }
            right
        };

        let construct = Construct::new(
            ConstructKind::Output {
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
        finish(
            construct,
            notes,
            stream_ty.map(|ty| (ty, ValueCategory::Lvalue)),
        )
    }

    fn analyze_input(
        &self,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let stream_ty = left.ty();
        let mut notes = Vec::new();
        let readable = right.is_lvalue()
            && right
                .ty()
                .is_some_and(|ty| ty.is_arithmetic() && !ty.is_const());
        if !readable {
            notes.push(NoteKind::InputOperand {
                ty: type_name(&right),
            });
        }
        let construct = Construct::new(
            ConstructKind::Input {
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
        finish(
            construct,
            notes,
            stream_ty.map(|ty| (ty, ValueCategory::Lvalue)),
        )
    }

    // ========================================================================
    // Comparisons
    // ========================================================================

    fn analyze_relational(
        &mut self,
        op: RelationalOp,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let (Some(lt), Some(rt)) = (left.well_typed(), right.well_typed()) else {
            return Construct::new(
                ConstructKind::Relational {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        };

        if lt.is_class() || rt.is_class() {
            return self.analyze_operator_overload(op.symbol(), vec![left, right], span);
        }

        let left_was_array = left.is_lvalue() && lt.is_bounded_array();
        let right_was_array = right.is_lvalue() && rt.is_bounded_array();
        let left = convert_to_prvalue(types, left);
        let right = convert_to_prvalue(types, right);
        let (lt, rt) = match (left.ty(), right.ty()) {
            (Some(lt), Some(rt)) => (lt, rt),
            _ => (lt, rt),
        };

        if lt.is_pointer() || rt.is_pointer() {
            return self.analyze_pointer_comparison(
                op,
                left,
                right,
                left_was_array || right_was_array,
                span,
            );
        }

        let mut notes = Vec::new();
        let (left, right) = if lt.is_arithmetic() && rt.is_arithmetic() {
            usual_arithmetic_conversions(types, left, right)
        } else {
            notes.push(NoteKind::InvalidOperands {
                op: op.symbol(),
                left: lt.to_string(),
                right: rt.to_string(),
            });
            (left, right)
        };
        let common = matches!((left.ty(), right.ty()), (Some(l), Some(r)) if same_type(l, r));
        if notes.is_empty() && !common {
            notes.push(NoteKind::InvalidOperands {
                op: op.symbol(),
                left: type_name(&left),
                right: type_name(&right),
            });
        }

        let construct = Construct::new(
            ConstructKind::Relational {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
        finish(
            construct,
            notes,
            Some((types.bool(), ValueCategory::Prvalue)),
        )
    }

    /// Both operands are prvalues and at least one is a pointer.
    fn analyze_pointer_comparison(
        &mut self,
        op: RelationalOp,
        left: Construct<'a>,
        right: Construct<'a>,
        from_array: bool,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let mut notes = Vec::new();
        let (lt, rt) = match (left.ty(), right.ty()) {
            (Some(lt), Some(rt)) => (lt, rt),
            _ => (types.void(), types.void()),
        };

        let null_warning = |notes: &mut Vec<NoteKind>| {
            if !op.is_equality() {
                notes.push(NoteKind::NullLiteralComparison);
            } else if from_array {
                notes.push(NoteKind::NullLiteralArrayEquality);
            }
        };

        let (left, right) = if lt.is_pointer() && rt.is_pointer() {
            if similar_type(lt, rt) {
                (left, right)
            } else if is_derived_pointer(lt, rt) {
                let left = standard_conversion(types, left, rt, ConversionOptions::default());
                (left, right)
            } else if is_derived_pointer(rt, lt) {
                let right = standard_conversion(types, right, lt, ConversionOptions::default());
                (left, right)
            } else {
                notes.push(NoteKind::PointerComparisonTypes {
                    left: lt.to_string(),
                    right: rt.to_string(),
                });
                (left, right)
            }
        } else if lt.is_pointer() && is_integer_literal_zero(&right) {
            null_warning(&mut notes);
            let right = standard_conversion(types, right, lt, ConversionOptions::default());
            (left, right)
        } else if rt.is_pointer() && is_integer_literal_zero(&left) {
            null_warning(&mut notes);
            let left = standard_conversion(types, left, rt, ConversionOptions::default());
            (left, right)
        } else {
            notes.push(NoteKind::InvalidOperands {
                op: op.symbol(),
                left: lt.to_string(),
                right: rt.to_string(),
            });
            (left, right)
        };

        let construct = Construct::new(
            ConstructKind::PointerComparison {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
        finish(
            construct,
            notes,
            Some((types.bool(), ValueCategory::Prvalue)),
        )
    }

    // ========================================================================
    // Logical operators
    // ========================================================================

    /// Converts `operand` to `bool`, recording a note when it cannot be.
    fn to_bool_operand(
        &self,
        op: &'static str,
        operand: Construct<'a>,
        notes: &mut Vec<NoteKind>,
    ) -> Construct<'a> {
        let types = self.types();
        let Some(ty) = operand.well_typed() else {
            return operand;
        };
        let options = ConversionOptions::default();
        let converted = standard_conversion(types, operand, types.bool(), options);
        let ok = converted.is_prvalue() && converted.ty().is_some_and(|t| t.is_bool());
        if !ok {
            notes.push(NoteKind::BoolOperand {
                op,
                ty: ty.to_string(),
            });
        }
        converted
    }

    fn analyze_logical(
        &mut self,
        op: LogicalOp,
        left: Construct<'a>,
        right: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let well_typed = left.is_well_typed() && right.is_well_typed();
        let mut notes = Vec::new();
        let left = self.to_bool_operand(op.symbol(), left, &mut notes);
        let right = self.to_bool_operand(op.symbol(), right, &mut notes);
        let construct = Construct::new(
            ConstructKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        );
        finish(
            construct,
            notes,
            well_typed.then(|| (types.bool(), ValueCategory::Prvalue)),
        )
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Problems that make `lhs` unassignable.
    fn check_assignable(&self, lhs: &Construct<'a>, notes: &mut Vec<NoteKind>) {
        let Some(ty) = lhs.well_typed() else {
            return;
        };
        if !lhs.is_lvalue() {
            notes.push(NoteKind::LhsLvalue);
        }
        if ty.is_bounded_array() {
            notes.push(NoteKind::LhsArray { ty: ty.to_string() });
        } else if ty.is_const() {
            notes.push(NoteKind::LhsConst { ty: ty.to_string() });
        }
    }

    pub(super) fn analyze_assignment(
        &mut self,
        lhs: Construct<'a>,
        rhs: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let (Some(lt), true) = (lhs.well_typed(), rhs.is_well_typed()) else {
            return Construct::new(
                ConstructKind::Assignment {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        };

        if lt.is_class() {
            return self.analyze_operator_overload("=", vec![lhs, rhs], span);
        }

        let mut notes = Vec::new();
        self.check_assignable(&lhs, &mut notes);

        let target = types.cv_unqualified(lt);
        let rhs = standard_conversion(types, rhs, target, ConversionOptions::default());
        let converted = rhs.is_prvalue() && rhs.ty().is_some_and(|ty| same_type(ty, target));
        if !converted && !lt.is_bounded_array() {
            notes.push(NoteKind::AssignmentConvert {
                from: type_name(&rhs),
                to: target.to_string(),
            });
        }

        let construct = Construct::new(
            ConstructKind::Assignment {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
        finish(construct, notes, Some((lt, ValueCategory::Lvalue)))
    }

    pub(super) fn analyze_compound_assignment(
        &mut self,
        op: ArithmeticOp,
        lhs: Construct<'a>,
        rhs: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let (Some(lt), Some(rt)) = (lhs.well_typed(), rhs.well_typed()) else {
            return Construct::new(
                ConstructKind::CompoundAssignment {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        };

        if lt.is_class() {
            return self.analyze_operator_overload(op.compound_symbol(), vec![lhs, rhs], span);
        }

        let mut notes = Vec::new();
        self.check_assignable(&lhs, &mut notes);

        let rhs = if lt.is_pointer() && matches!(op, ArithmeticOp::Add | ArithmeticOp::Sub) {
            let rhs = integral_promotion(types, convert_to_prvalue(types, rhs));
            if !rhs.ty().is_some_and(|ty| ty.is_integral()) {
                notes.push(NoteKind::InvalidOperands {
                    op: op.compound_symbol(),
                    left: lt.to_string(),
                    right: rt.to_string(),
                });
            } else if !lt.is_pointer_to_complete_object() {
                notes.push(NoteKind::PointerArithmeticIncomplete { ty: lt.to_string() });
            }
            rhs
        } else if lt.is_arithmetic() && rt.is_arithmetic() {
            if op.requires_integral() && !(lt.is_integral() && rt.is_integral()) {
                notes.push(NoteKind::IntegralOperands {
                    op: op.compound_symbol(),
                    left: lt.to_string(),
                    right: rt.to_string(),
                });
            }
            // The operation runs in the common type of both sides and the
            // result is converted back to the left side's type.
            convert_to_prvalue(types, rhs)
        } else {
            notes.push(NoteKind::InvalidOperands {
                op: op.compound_symbol(),
                left: lt.to_string(),
                right: rt.to_string(),
            });
            rhs
        };

        let construct = Construct::new(
            ConstructKind::CompoundAssignment {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
        finish(construct, notes, Some((lt, ValueCategory::Lvalue)))
    }

    // ========================================================================
    // Ternary
    // ========================================================================

    pub(super) fn analyze_ternary(
        &mut self,
        condition: Construct<'a>,
        then_branch: Construct<'a>,
        else_branch: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let mut notes = Vec::new();

        let condition = match condition.well_typed() {
            Some(ty) => {
                let options = ConversionOptions::default();
                let condition = standard_conversion(types, condition, types.bool(), options);
                if !condition.ty().is_some_and(|t| t.is_bool()) {
                    notes.push(NoteKind::TernaryCondition { ty: ty.to_string() });
                }
                condition
            }
            None => condition,
        };

        let both_typed = then_branch.is_well_typed() && else_branch.is_well_typed();
        let (then_branch, else_branch) = if both_typed {
            let (then_branch, else_branch) = if then_branch.is_prvalue() && else_branch.is_lvalue()
            {
                (then_branch, convert_to_prvalue(types, else_branch))
            } else if else_branch.is_prvalue() && then_branch.is_lvalue() {
                (convert_to_prvalue(types, then_branch), else_branch)
            } else {
                (then_branch, else_branch)
            };
            if let (Some(t), Some(e)) = (then_branch.ty(), else_branch.ty()) {
                if !same_type(t, e) {
                    notes.push(NoteKind::TernarySameType {
                        then_ty: t.to_string(),
                        else_ty: e.to_string(),
                    });
                }
                if t.is_void() || e.is_void() {
                    notes.push(NoteKind::TernaryVoid);
                }
            }
            if then_branch.value_category() != else_branch.value_category() {
                notes.push(NoteKind::TernarySameCategory);
            }
            (then_branch, else_branch)
        } else {
            (then_branch, else_branch)
        };

        let typed = match (
            then_branch.well_typed(),
            else_branch.well_typed(),
            then_branch.value_category(),
        ) {
            (Some(t), Some(e), Some(category))
                if same_type(t, e) && Some(category) == else_branch.value_category() =>
            {
                Some((t, category))
            }
            _ => None,
        };

        let construct = Construct::new(
            ConstructKind::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        );
        finish(construct, notes, typed)
    }

    // ========================================================================
    // Unary operators
    // ========================================================================

    pub(super) fn analyze_unary(
        &mut self,
        op: UnaryOp,
        operand: Construct<'a>,
        span: Span,
    ) -> Construct<'a> {
        match op {
            UnaryOp::Minus => self.analyze_unary_minus(operand, span),
            UnaryOp::Plus => self.analyze_unary_plus(operand, span),
            UnaryOp::LogicalNot => {
                let types = self.types();
                let well_typed = operand.is_well_typed();
                let mut notes = Vec::new();
                let operand = self.to_bool_operand("!", operand, &mut notes);
                let construct = Construct::new(ConstructKind::LogicalNot(Box::new(operand)), span);
                finish(
                    construct,
                    notes,
                    well_typed.then(|| (types.bool(), ValueCategory::Prvalue)),
                )
            }
            UnaryOp::Dereference => self.analyze_dereference(operand, span),
            UnaryOp::AddressOf => self.analyze_address_of(operand, span),
            UnaryOp::Prefix(op) => self.analyze_increment(op, operand, true, span),
        }
    }

    fn analyze_unary_minus(&self, operand: Construct<'a>, span: Span) -> Construct<'a> {
        let types = self.types();
        let Some(ty) = operand.well_typed() else {
            return Construct::new(ConstructKind::UnaryMinus(Box::new(operand)), span);
        };
        let mut notes = Vec::new();
        let operand = if ty.is_arithmetic() {
            integral_promotion(types, convert_to_prvalue(types, operand))
        } else {
            notes.push(NoteKind::UnaryArithmeticOperand {
                op: "-",
                ty: ty.to_string(),
            });
            operand
        };
        let result = operand.ty();
        let construct = Construct::new(ConstructKind::UnaryMinus(Box::new(operand)), span);
        finish(
            construct,
            notes,
            result.map(|ty| (ty, ValueCategory::Prvalue)),
        )
    }

    fn analyze_unary_plus(&self, operand: Construct<'a>, span: Span) -> Construct<'a> {
        let types = self.types();
        if !operand.is_well_typed() {
            return Construct::new(ConstructKind::UnaryPlus(Box::new(operand)), span);
        }
        let operand = integral_promotion(types, convert_to_prvalue(types, operand));
        let mut notes = Vec::new();
        let result = operand.ty();
        if !result.is_some_and(|ty| ty.is_arithmetic() || ty.is_pointer()) {
            notes.push(NoteKind::UnaryPlusOperand {
                ty: type_name(&operand),
            });
        }
        let construct = Construct::new(ConstructKind::UnaryPlus(Box::new(operand)), span);
        finish(
            construct,
            notes,
            result.map(|ty| (ty, ValueCategory::Prvalue)),
        )
    }

    pub(super) fn analyze_increment(
        &mut self,
        op: IncDec,
        operand: Construct<'a>,
        prefix: bool,
        span: Span,
    ) -> Construct<'a> {
        let types = self.types();
        let symbol = op.symbol();
        let mut notes = Vec::new();
        let ty = operand.well_typed();
        if let Some(ty) = ty {
            if !operand.is_lvalue() {
                notes.push(NoteKind::IncrementLvalue { op: symbol });
            }
            if ty.is_const() {
                notes.push(NoteKind::IncrementConst { op: symbol });
            }
            if ty.is_bool() {
                notes.push(NoteKind::IncrementBool { op: symbol });
            } else if !(ty.is_arithmetic() || ty.is_pointer_to_complete_object()) {
                notes.push(NoteKind::IncrementOperand {
                    op: symbol,
                    ty: ty.to_string(),
                });
            }
        }

        let operand = Box::new(operand);
        let (kind, typed) = if prefix {
            (
                ConstructKind::PrefixIncrement { op, operand },
                ty.map(|ty| (ty, ValueCategory::Lvalue)),
            )
        } else {
            (
                ConstructKind::PostfixIncrement { op, operand },
                ty.map(|ty| (types.cv_unqualified(ty), ValueCategory::Prvalue)),
            )
        };
        finish(Construct::new(kind, span), notes, typed)
    }
}
