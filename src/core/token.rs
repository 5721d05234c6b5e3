// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Token vocabulary shared by every backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the cursor of a [`Source`](crate::protocol::Source) currently points at.
///
/// Struct and array regions are bracketed (`StructStart`/`StructEnd`,
/// `ArrayStart`/`ArrayEnd`) and a `Field` always precedes each value inside
/// a struct region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum At {
    Null,
    Int,
    Long,
    Double,
    Boolean,
    String,
    StructStart,
    StructEnd,
    Field,
    ArrayStart,
    ArrayEnd,
    Eof,
}

impl At {
    /// Scalar tags, including `Null`.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            At::Null | At::Int | At::Long | At::Double | At::Boolean | At::String
        )
    }

    /// Tags that can start a value.
    pub fn starts_value(self) -> bool {
        self.is_scalar() || matches!(self, At::StructStart | At::ArrayStart)
    }

    /// Tags that only close a region or mark a field.
    pub fn is_structural(self) -> bool {
        !self.starts_value()
    }

    /// Convert to string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            At::Null => "Null",
            At::Int => "Int",
            At::Long => "Long",
            At::Double => "Double",
            At::Boolean => "Boolean",
            At::String => "String",
            At::StructStart => "StructStart",
            At::StructEnd => "StructEnd",
            At::Field => "Field",
            At::ArrayStart => "ArrayStart",
            At::ArrayEnd => "ArrayEnd",
            At::Eof => "Eof",
        }
    }
}

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded token. Field markers carry the field name so a recorded
/// stream can be replayed against a different field index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    Null,
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    StructStart,
    StructEnd,
    Field(String),
    ArrayStart,
    ArrayEnd,
}

impl Token {
    /// The tag a source reports when positioned at this token.
    pub fn at(&self) -> At {
        match self {
            Token::Null => At::Null,
            Token::Int(_) => At::Int,
            Token::Long(_) => At::Long,
            Token::Double(_) => At::Double,
            Token::Boolean(_) => At::Boolean,
            Token::String(_) => At::String,
            Token::StructStart => At::StructStart,
            Token::StructEnd => At::StructEnd,
            Token::Field(_) => At::Field,
            Token::ArrayStart => At::ArrayStart,
            Token::ArrayEnd => At::ArrayEnd,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(v) => write!(f, "Int({v})"),
            Token::Long(v) => write!(f, "Long({v})"),
            Token::Double(v) => write!(f, "Double({v})"),
            Token::Boolean(v) => write!(f, "Boolean({v})"),
            Token::String(v) => write!(f, "String({v:?})"),
            Token::Field(name) => write!(f, "Field({name:?})"),
            other => f.write_str(other.at().as_str()),
        }
    }
}
