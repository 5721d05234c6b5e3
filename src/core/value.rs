// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dynamic value tree.
//!
//! [`Value`] mirrors the token vocabulary one-to-one: every tree can be
//! streamed through a [`Source`](crate::protocol::Source) and every
//! well-formed token stream can be collected into a tree. Struct fields keep
//! their insertion order so that field order survives a round trip.

use serde::{Deserialize, Serialize};

use super::token::At;

/// Dynamic structured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    // Absent value
    #[default]
    Null,

    Boolean(bool),

    // 32-bit and 64-bit integers are distinct tokens
    Int(i32),
    Long(i64),

    Double(f64),

    String(String),

    Array(Vec<Value>),

    // Ordered (name, value) pairs
    Struct(Vec<(String, Value)>),
}

impl Value {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Build a struct value from (name, value) pairs, keeping their order.
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array value.
    pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Array(items.into_iter().collect())
    }

    // ========================================================================
    // Type Checking Predicates
    // ========================================================================

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a number (int, long or double).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Long(_) | Value::Double(_))
    }

    /// Check if this value is a container type (array or struct).
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Struct(_))
    }

    /// The tag a source reports when positioned at this value.
    pub fn at(&self) -> At {
        match self {
            Value::Null => At::Null,
            Value::Boolean(_) => At::Boolean,
            Value::Int(_) => At::Int,
            Value::Long(_) => At::Long,
            Value::Double(_) => At::Double,
            Value::String(_) => At::String,
            Value::Array(_) => At::ArrayStart,
            Value::Struct(_) => At::StructStart,
        }
    }

    // ========================================================================
    // Type Conversion Methods
    // ========================================================================

    /// Try to convert this value to i64 (integers only).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to convert this value to f64 (numbers only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get this value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a struct field by name (first match).
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Get a human-readable type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
