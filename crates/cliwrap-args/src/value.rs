// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declared slot types, zero values and rendering.

use std::fmt;

use serde_json::Value;

/// Declared type of a value parameter.
///
/// A supplied value whose kind is not assignable to the declared type
/// produces no output. `null` is assignable to every type and is always a
/// zero value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParamType {
    /// Any value. Only `null` is zero.
    #[default]
    Any,
    /// `true`/`false`. `false` is zero.
    Bool,
    /// Integral numbers. `0` is zero.
    Integer,
    /// Any number. `0.0` is zero.
    Float,
    /// Strings. `""` is zero.
    Text,
    /// The inner type or `null`. Only `null` is zero.
    Optional(Box<ParamType>),
}

impl ParamType {
    /// Wrap in [`ParamType::Optional`].
    #[must_use]
    pub fn optional(self) -> Self {
        match self {
            Self::Optional(_) => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Infer the type of a default value: `5.0` is a float, `"x"` text.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::Text,
            Value::Null | Value::Array(_) | Value::Object(_) => Self::Any,
        }
    }

    /// Returns `true` if `value` may be supplied for this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Any, _) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::Text, Value::String(_)) => true,
            (Self::Optional(inner), v) => inner.accepts(v),
            _ => false,
        }
    }

    /// Returns `true` if `value` is this type's zero value.
    pub fn is_zero(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Any | Self::Optional(_), _) => false,
            (Self::Bool, Value::Bool(b)) => !b,
            (Self::Integer | Self::Float, Value::Number(n)) => n.as_f64() == Some(0.0),
            (Self::Text, Value::String(s)) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Text => f.write_str("text"),
            Self::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

/// Render a value as it appears on the command line.
///
/// Strings are emitted verbatim, numbers in their shortest form (`5.0`
/// renders as `5`), arrays as comma-separated elements and objects as JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => f.to_string(),
            (None, None, None) => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// JSON kind name, for diagnostics.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
