// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common fixtures for integration tests.

#![allow(dead_code)]

use structcodec::backend::{BufferSink, TokenBuffer};
use structcodec::{
    Case, CodecRef, Feature, RecordMetadata, Reflect, Result, Slots, Token, TypeInfo,
    UnionMetadata,
};

// ============================================================================
// Records
// ============================================================================

/// Person with a required name and an optional, omittable age.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: Option<i32>,
}

impl Reflect for Person {
    fn type_info() -> TypeInfo {
        TypeInfo::record::<Self>()
    }
}

impl RecordMetadata for Person {
    fn features() -> Vec<Feature<Self>> {
        vec![
            Feature::required("name", |p: &Person| &p.name),
            Feature::nullable("age", |p: &Person| &p.age).omittable(),
        ]
    }

    fn assemble(slots: &mut Slots) -> Result<Self> {
        Ok(Person {
            name: slots.take("name")?,
            age: slots.take("age")?,
        })
    }

    fn verify(slots: &Slots) -> Vec<String> {
        match slots.get::<Option<i32>>("age") {
            Some(Some(age)) if *age < 0 => vec![format!("age must not be negative, got {age}")],
            _ => Vec::new(),
        }
    }
}

/// Recursive tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub label: String,
    pub children: Vec<Node>,
}

impl Reflect for Node {
    fn type_info() -> TypeInfo {
        TypeInfo::record::<Self>()
    }
}

impl RecordMetadata for Node {
    fn features() -> Vec<Feature<Self>> {
        vec![
            Feature::required("label", |n: &Node| &n.label),
            Feature::required("children", |n: &Node| &n.children).omittable(),
        ]
    }

    fn assemble(slots: &mut Slots) -> Result<Self> {
        Ok(Node {
            label: slots.take("label")?,
            children: slots.take_or_default("children")?,
        })
    }
}

// ============================================================================
// Union
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    pub side: f64,
}

/// Shape union discriminated by `@case`.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Square(Square),
}

impl Reflect for Circle {
    fn type_info() -> TypeInfo {
        TypeInfo::record::<Self>()
    }
}

impl RecordMetadata for Circle {
    fn features() -> Vec<Feature<Self>> {
        vec![Feature::required("radius", |c: &Circle| &c.radius)]
    }

    fn assemble(slots: &mut Slots) -> Result<Self> {
        Ok(Circle {
            radius: slots.take("radius")?,
        })
    }
}

impl Reflect for Square {
    fn type_info() -> TypeInfo {
        TypeInfo::record::<Self>()
    }
}

impl RecordMetadata for Square {
    fn features() -> Vec<Feature<Self>> {
        vec![Feature::required("side", |s: &Square| &s.side)]
    }

    fn assemble(slots: &mut Slots) -> Result<Self> {
        Ok(Square {
            side: slots.take("side")?,
        })
    }
}

impl Reflect for Shape {
    fn type_info() -> TypeInfo {
        TypeInfo::union::<Self>()
    }
}

impl UnionMetadata for Shape {
    fn cases() -> Vec<Case<Self>> {
        vec![
            Case::new("circle", Shape::Circle, |s| match s {
                Shape::Circle(c) => Some(c),
                _ => None,
            }),
            Case::new("square", Shape::Square, |s| match s {
                Shape::Square(q) => Some(q),
                _ => None,
            }),
        ]
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Field marker token.
pub fn field(name: &str) -> Token {
    Token::Field(name.to_string())
}

/// String token.
pub fn string(value: &str) -> Token {
    Token::String(value.to_string())
}

/// Encode `value` into a token buffer.
pub fn encode_tokens<T: 'static>(codec: &CodecRef<T>, value: &T) -> Vec<Token> {
    let mut sink = BufferSink::new();
    codec.encode(&mut sink, value).unwrap();
    sink.finish().unwrap().into_tokens()
}

/// Token buffer holding `tokens`.
pub fn buffer(tokens: Vec<Token>) -> TokenBuffer {
    TokenBuffer::from_tokens(tokens)
}
