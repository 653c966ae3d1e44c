//! Runtime values that flow into generated SQL.
//!
//! [`Value`] is the plain (not yet escaped) side of the visitor's intermediate
//! results. Every `Value` that reaches a statement passes through
//! [`Dialect::quoted_value`](crate::dialect::Dialect::quoted_value) or becomes a
//! bound parameter.
//!
//! This module also holds the client-side evaluator used when both operands of
//! an expression are plain values: the subtree is computed here and replaced by
//! its result instead of being translated to SQL.

use crate::error::{OrmError, OrmResult};
use crate::expr::{BinaryOp, UnaryOp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A value of an enum-typed field.
///
/// Carries both the variant name and its ordinal so a dialect can render
/// whichever form the column stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    pub variant: String,
    pub ordinal: i64,
}

impl EnumValue {
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>, ordinal: i64) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
            ordinal,
        }
    }
}

/// A plain runtime value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Bytes(Vec<u8>),
    Enum(EnumValue),
    /// A collection, used by `IN (...)` lists.
    List(Vec<Value>),
}

impl Value {
    /// Create a binary value.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Guid(_) => "guid",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Enum(e) => Some(e.ordinal),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Flatten nested collections into a single list of scalars.
    pub fn flatten(&self) -> Vec<Value> {
        let mut out = Vec::new();
        flatten_into(self, &mut out);
        out
    }

    /// Render the value as display text, as a `ToString()` of the source value would.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Text(s) => s.clone(),
            Value::Guid(g) => g.to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.3f").to_string(),
            Value::Bytes(b) => b.iter().map(|x| format!("{x:02x}")).collect(),
            Value::Enum(e) => e.variant.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Compare two values, coercing between numeric kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Decimal(a), Int(b)) => Some(a.cmp(&rust_decimal::Decimal::from(*b))),
            (Int(a), Decimal(b)) => Some(rust_decimal::Decimal::from(*a).cmp(b)),
            (Decimal(a), Float(b)) => a.to_f64().and_then(|a| a.partial_cmp(b)),
            (Float(a), Decimal(b)) => b.to_f64().and_then(|b| a.partial_cmp(&b)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Guid(a), Guid(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Time(a), Time(b)) => Some(a.cmp(b)),
            (Enum(a), Enum(b)) if a.type_name == b.type_name => Some(a.ordinal.cmp(&b.ordinal)),
            (Enum(a), Int(b)) => Some(a.ordinal.cmp(b)),
            (Int(a), Enum(b)) => Some(a.cmp(&b.ordinal)),
            (Null, Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Evaluate `self <op> rhs` client-side.
    pub fn binary(&self, op: BinaryOp, rhs: &Value) -> OrmResult<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let (Some(a), Some(b)) = (self.as_bool(), rhs.as_bool()) else {
                    return Err(mismatch(op, self, rhs));
                };
                Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b }))
            }
            BinaryOp::Eq => Ok(Value::Bool(self.loose_eq(rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!self.loose_eq(rhs))),
            BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le => {
                let ord = self.compare(rhs).ok_or_else(|| mismatch(op, self, rhs))?;
                Ok(Value::Bool(match op {
                    BinaryOp::Gt => ord == Ordering::Greater,
                    BinaryOp::Ge => ord != Ordering::Less,
                    BinaryOp::Lt => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                }))
            }
            BinaryOp::Coalesce => Ok(if self.is_null() {
                rhs.clone()
            } else {
                self.clone()
            }),
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod => arithmetic(op, self, rhs),
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::Shl
            | BinaryOp::Shr => bitwise(op, self, rhs),
        }
    }

    /// Evaluate a unary operator client-side.
    pub fn unary(&self, op: UnaryOp) -> OrmResult<Value> {
        match (op, self) {
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Not, Value::Int(v)) => Ok(Value::Int(!v)),
            (UnaryOp::Neg, Value::Int(v)) => v
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| OrmError::evaluation("attempt to negate with overflow")),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Neg, Value::Decimal(d)) => Ok(Value::Decimal(-*d)),
            (_, Value::Null) => Ok(Value::Null),
            (op, v) => Err(OrmError::evaluation(format!(
                "cannot apply {op:?} to a {} value",
                v.kind()
            ))),
        }
    }

    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Enum(a), Value::Text(b)) | (Value::Text(b), Value::Enum(a)) => &a.variant == b,
            _ => self.compare(other) == Some(Ordering::Equal) || self == other,
        }
    }
}

fn flatten_into(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::List(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        other => out.push(other.clone()),
    }
}

fn mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> OrmError {
    OrmError::evaluation(format!(
        "cannot apply {op:?} to {} and {} values",
        lhs.kind(),
        rhs.kind()
    ))
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> OrmResult<Value> {
    use Value::*;
    match (lhs, rhs) {
        (Null, _) | (_, Null) => Ok(Null),
        (Int(a), Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(OrmError::evaluation("attempt to divide by zero"));
                    }
                    a.checked_div(b)
                }
                _ => {
                    if b == 0 {
                        return Err(OrmError::evaluation(
                            "attempt to calculate the remainder with a divisor of zero",
                        ));
                    }
                    a.checked_rem(b)
                }
            };
            result
                .map(Int)
                .ok_or_else(|| OrmError::evaluation(format!("integer overflow in {op:?}")))
        }
        (Decimal(_), _) | (_, Decimal(_)) => {
            let a = to_decimal(lhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
            let b = to_decimal(rhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => {
                    if b.is_zero() {
                        return Err(OrmError::evaluation("attempt to divide by zero"));
                    }
                    a.checked_div(b)
                }
                _ => {
                    if b.is_zero() {
                        return Err(OrmError::evaluation(
                            "attempt to calculate the remainder with a divisor of zero",
                        ));
                    }
                    a.checked_rem(b)
                }
            };
            result
                .map(Decimal)
                .ok_or_else(|| OrmError::evaluation(format!("decimal overflow in {op:?}")))
        }
        (Int(_) | Float(_), Int(_) | Float(_)) => {
            let a = to_f64(lhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
            let b = to_f64(rhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
            Ok(Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }
        (Text(a), Text(b)) if op == BinaryOp::Add => Ok(Text(format!("{a}{b}"))),
        (Text(a), other) if op == BinaryOp::Add => Ok(Text(format!("{a}{}", other.to_text()))),
        _ => Err(mismatch(op, lhs, rhs)),
    }
}

fn bitwise(op: BinaryOp, lhs: &Value, rhs: &Value) -> OrmResult<Value> {
    let (Value::Int(a), Value::Int(b)) = (lhs, rhs) else {
        return Err(mismatch(op, lhs, rhs));
    };
    let (a, b) = (*a, *b);
    let result = match op {
        BinaryOp::BitAnd => Some(a & b),
        BinaryOp::BitOr => Some(a | b),
        BinaryOp::BitXor => Some(a ^ b),
        BinaryOp::Shl => u32::try_from(b).ok().and_then(|b| a.checked_shl(b)),
        _ => u32::try_from(b).ok().and_then(|b| a.checked_shr(b)),
    };
    result
        .map(Value::Int)
        .ok_or_else(|| OrmError::evaluation(format!("shift amount {b} out of range")))
}

fn to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Decimal(d) => Some(*d),
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Float(f) => Decimal::from_f64(*f),
        _ => None,
    }
}

fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        _ => None,
    }
}

// ==================== Conversions ====================

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}
