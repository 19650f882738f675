use crate::{
    ast::{ArithmeticOp, RelationalOp},
    types::{ArithmeticKind, Cv, Type, TypeManager, similar_type},
};
use core::fmt;

/// Numeric payload of a [`Value`]. Pointers store their address as
/// `Integral`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Integral(i64),
    Floating(f64),
}

impl RawValue {
    pub fn as_i64(self) -> i64 {
        match self {
            RawValue::Integral(v) => v,
            RawValue::Floating(v) => v as i64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            RawValue::Integral(v) => v as f64,
            RawValue::Floating(v) => v,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            RawValue::Integral(v) => v == 0,
            RawValue::Floating(v) => v == 0.0,
        }
    }
}

/// An immutable scalar: arithmetic or pointer.
///
/// Every operation returns a new value. Binary operations expect operands
/// of similar types; anything else is an analyzer bug and trips a debug
/// assertion. The result of an operation is valid only if all of its
/// operands were.
#[derive(Debug, Clone, Copy)]
pub struct Value<'a> {
    raw: RawValue,
    ty: &'a Type<'a>,
    valid: bool,
}

impl<'a> Value<'a> {
    /// Builds a value, wrapping the payload to the width of `ty`.
    pub fn new(raw: RawValue, ty: &'a Type<'a>, valid: bool) -> Self {
        debug_assert!(ty.is_atomic(), "values hold atomic types only, got {}", ty);
        Value {
            raw: normalize(raw, ty),
            ty,
            valid,
        }
    }

    pub fn int(types: &'a TypeManager<'a>, value: i64) -> Self {
        Self::new(RawValue::Integral(value), types.int(), true)
    }

    pub fn bool(types: &'a TypeManager<'a>, value: bool) -> Self {
        Self::new(RawValue::Integral(value as i64), types.bool(), true)
    }

    pub fn char(types: &'a TypeManager<'a>, value: u8) -> Self {
        Self::new(RawValue::Integral(value as i8 as i64), types.char(), true)
    }

    pub fn double(types: &'a TypeManager<'a>, value: f64) -> Self {
        Self::new(RawValue::Floating(value), types.double(), true)
    }

    pub fn float(types: &'a TypeManager<'a>, value: f32) -> Self {
        Self::new(RawValue::Floating(value as f64), types.float(), true)
    }

    /// A pointer holding `address`.
    pub fn pointer(ty: &'a Type<'a>, address: i64) -> Self {
        debug_assert!(ty.is_pointer());
        Self::new(RawValue::Integral(address), ty, true)
    }

    pub fn raw(&self) -> RawValue {
        self.raw
    }

    pub fn ty(&self) -> &'a Type<'a> {
        self.ty
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn as_i64(&self) -> i64 {
        self.raw.as_i64()
    }

    pub fn as_f64(&self) -> f64 {
        self.raw.as_f64()
    }

    /// Address held by a pointer value.
    pub fn address(&self) -> i64 {
        self.raw.as_i64()
    }

    /// C++ truthiness: anything non-zero.
    pub fn is_truthy(&self) -> bool {
        !self.raw.is_zero()
    }

    /// Same type and same payload (validity ignored).
    pub fn equals(&self, other: &Value<'a>) -> bool {
        core::ptr::eq(self.ty, other.ty) && self.raw == other.raw
    }

    pub fn invalidated(&self) -> Self {
        Value {
            valid: false,
            ..*self
        }
    }

    /// Applies `f` to the payload, keeping type and validity.
    pub fn modify(&self, f: impl FnOnce(RawValue) -> RawValue) -> Self {
        Self::new(f(self.raw), self.ty, self.valid)
    }

    /// Reinterprets the payload as `ty`, converting between numeric kinds.
    pub fn convert(&self, ty: &'a Type<'a>) -> Self {
        let raw = match ty.arithmetic_kind() {
            Some(ArithmeticKind::Bool) => RawValue::Integral(!self.raw.is_zero() as i64),
            Some(kind) if kind.is_integral() => RawValue::Integral(self.raw.as_i64()),
            Some(_) => RawValue::Floating(self.raw.as_f64()),
            None => RawValue::Integral(self.raw.as_i64()),
        };
        Self::new(raw, ty, self.valid)
    }

    pub fn cv_qualified(&self, types: &'a TypeManager<'a>, cv: Cv) -> Self {
        Value {
            ty: types.cv_qualified(self.ty, cv),
            ..*self
        }
    }

    pub fn cv_unqualified(&self, types: &'a TypeManager<'a>) -> Self {
        Value {
            ty: types.cv_unqualified(self.ty),
            ..*self
        }
    }

    fn check_similar(&self, other: &Value<'a>) {
        debug_assert!(
            similar_type(self.ty, other.ty),
            "operands must have similar types: {} vs {}",
            self.ty,
            other.ty
        );
    }

    /// Arithmetic and bitwise operators.
    ///
    /// Integer division by zero yields an invalid zero; the evaluator
    /// reports the undefined behavior separately. `>>` on a signed operand
    /// keeps the sign.
    pub fn combine(&self, other: &Value<'a>, op: ArithmeticOp) -> Self {
        self.check_similar(other);
        let valid = self.valid && other.valid;
        match (self.raw, other.raw) {
            (RawValue::Integral(a), RawValue::Integral(b)) => {
                let (raw, ok) = combine_integral(a, b, op);
                Self::new(RawValue::Integral(raw), self.ty, valid && ok)
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let raw = match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Sub => a - b,
                    ArithmeticOp::Mul => a * b,
                    ArithmeticOp::Div => a / b,
                    _ => {
                        debug_assert!(false, "{} is not defined on floating values", op.symbol());
                        return Self::new(RawValue::Floating(0.0), self.ty, false);
                    }
                };
                Self::new(RawValue::Floating(raw), self.ty, valid)
            }
        }
    }

    /// Relational operators, producing a `bool`.
    pub fn compare(
        &self,
        other: &Value<'a>,
        op: RelationalOp,
        types: &'a TypeManager<'a>,
    ) -> Self {
        self.check_similar(other);
        let ordering = match (self.raw, other.raw) {
            (RawValue::Integral(a), RawValue::Integral(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        };
        let result = match ordering {
            None => op == RelationalOp::Ne,
            Some(ord) => match op {
                RelationalOp::Lt => ord.is_lt(),
                RelationalOp::Gt => ord.is_gt(),
                RelationalOp::Le => ord.is_le(),
                RelationalOp::Ge => ord.is_ge(),
                RelationalOp::Eq => ord.is_eq(),
                RelationalOp::Ne => ord.is_ne(),
            },
        };
        Self::new(
            RawValue::Integral(result as i64),
            types.bool(),
            self.valid && other.valid,
        )
    }

    /// Moves a pointer by `offset` elements (backwards when `subtract`).
    pub fn pointer_offset(&self, offset: &Value<'a>, subtract: bool) -> Self {
        debug_assert!(self.ty.is_pointer() && offset.ty.is_integral());
        let elem_size = self.element_size();
        let delta = offset.as_i64().wrapping_mul(elem_size);
        let address = if subtract {
            self.address().wrapping_sub(delta)
        } else {
            self.address().wrapping_add(delta)
        };
        Self::new(
            RawValue::Integral(address),
            self.ty,
            self.valid && offset.valid,
        )
    }

    /// Number of elements between two pointers, as an `int`.
    pub fn pointer_difference(&self, other: &Value<'a>, types: &'a TypeManager<'a>) -> Self {
        self.check_similar(other);
        let elem_size = self.element_size();
        let diff = self.address().wrapping_sub(other.address()) / elem_size;
        Self::new(
            RawValue::Integral(diff),
            types.int(),
            self.valid && other.valid,
        )
    }

    fn element_size(&self) -> i64 {
        self.ty
            .pointee()
            .and_then(|pointee| pointee.size())
            .map_or(1, |size| size.max(1) as i64)
    }

    pub fn arithmetic_negate(&self) -> Self {
        self.modify(|raw| match raw {
            RawValue::Integral(v) => RawValue::Integral(v.wrapping_neg()),
            RawValue::Floating(v) => RawValue::Floating(-v),
        })
    }

    /// `!v` on a `bool`.
    pub fn logical_not(&self) -> Self {
        debug_assert!(self.ty.is_bool());
        self.modify(|raw| RawValue::Integral(raw.is_zero() as i64))
    }
}

fn combine_integral(a: i64, b: i64, op: ArithmeticOp) -> (i64, bool) {
    match op {
        ArithmeticOp::Add => (a.wrapping_add(b), true),
        ArithmeticOp::Sub => (a.wrapping_sub(b), true),
        ArithmeticOp::Mul => (a.wrapping_mul(b), true),
        ArithmeticOp::Div if b == 0 => (0, false),
        ArithmeticOp::Div => (a.wrapping_div(b), true),
        ArithmeticOp::Rem if b == 0 => (0, false),
        ArithmeticOp::Rem => (a.wrapping_rem(b), true),
        ArithmeticOp::BitAnd => (a & b, true),
        ArithmeticOp::BitXor => (a ^ b, true),
        ArithmeticOp::BitOr => (a | b, true),
        ArithmeticOp::Shl => (a.wrapping_shl(b as u32), (0..64).contains(&b)),
        ArithmeticOp::Shr => (a.wrapping_shr(b as u32), (0..64).contains(&b)),
    }
}

/// Wraps a payload to the storage width of `ty`.
fn normalize(raw: RawValue, ty: &Type<'_>) -> RawValue {
    match ty.arithmetic_kind() {
        Some(ArithmeticKind::Bool) => RawValue::Integral(!raw.is_zero() as i64),
        Some(ArithmeticKind::Char) => RawValue::Integral(raw.as_i64() as i8 as i64),
        Some(ArithmeticKind::Int) => RawValue::Integral(raw.as_i64() as i32 as i64),
        Some(ArithmeticKind::Float) => RawValue::Floating(raw.as_f64() as f32 as f64),
        Some(ArithmeticKind::Double) => RawValue::Floating(raw.as_f64()),
        None => RawValue::Integral(raw.as_i64()),
    }
}

impl fmt::Display for Value<'_> {
    /// Formats the way `cout <<` would print the value; invalid values
    /// print as `???`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return f.write_str("???");
        }
        match self.ty.arithmetic_kind() {
            Some(ArithmeticKind::Char) => write!(f, "{}", self.as_i64() as u8 as char),
            Some(ArithmeticKind::Bool | ArithmeticKind::Int) => write!(f, "{}", self.as_i64()),
            Some(ArithmeticKind::Float) => write!(f, "{}", self.as_f64() as f32),
            Some(ArithmeticKind::Double) => write!(f, "{}", self.as_f64()),
            None => write!(f, "{:#x}", self.address()),
        }
    }
}
