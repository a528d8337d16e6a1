//! Compile-time constant values carried by literals and folded operators.

use ordered_float::OrderedFloat;
use std::fmt;

/// A constant value. Integral constants are stored widened; the node's type
/// says what width they actually have.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
}

impl ConstantValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ConstantValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConstantValue::Int(v) => Some(*v),
            ConstantValue::UInt(v) => i64::try_from(*v).ok(),
            ConstantValue::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ConstantValue {
    fn from(value: bool) -> Self {
        ConstantValue::Bool(value)
    }
}

impl From<i32> for ConstantValue {
    fn from(value: i32) -> Self {
        ConstantValue::Int(value as i64)
    }
}

impl From<i64> for ConstantValue {
    fn from(value: i64) -> Self {
        ConstantValue::Int(value)
    }
}

impl From<f64> for ConstantValue {
    fn from(value: f64) -> Self {
        ConstantValue::Double(OrderedFloat(value))
    }
}

impl From<&str> for ConstantValue {
    fn from(value: &str) -> Self {
        ConstantValue::String(value.to_string())
    }
}

impl From<String> for ConstantValue {
    fn from(value: String) -> Self {
        ConstantValue::String(value)
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Bool(b) => write!(f, "{b}"),
            ConstantValue::Char(c) => write!(f, "'{c}'"),
            ConstantValue::Int(v) => write!(f, "{v}"),
            ConstantValue::UInt(v) => write!(f, "{v}u"),
            ConstantValue::Float(v) => write!(f, "{}f", v.0),
            ConstantValue::Double(v) => write!(f, "{}", v.0),
            ConstantValue::String(s) => write!(f, "{s:?}"),
        }
    }
}
