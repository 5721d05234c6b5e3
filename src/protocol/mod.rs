// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Token protocol.
//!
//! Backends plug into the framework by implementing [`Source`] (pull side)
//! and [`Sink`] (push side) over their native representation. Codecs only
//! ever talk to these traits.
//!
//! ## Contract
//!
//! - [`Source::peek`] is idempotent and never advances the cursor.
//! - Every `take_*` call requires `peek` to report the matching tag and fails
//!   with a structural violation otherwise; values are never coerced.
//! - [`Source::skip`] discards exactly one logical value.
//! - `begin_struct` receives the [`FieldIndex`] used to translate names for
//!   that struct region; the same instance must be handed to `end_struct`.
//!
//! ## Example flow for `{ name: "Ann", tags: ["a"] }`
//!
//! ```ignore
//! sink.begin_struct(fields.clone())?;
//! sink.put_field(0)?;          // name
//! sink.put_string("Ann")?;
//! sink.put_field(1)?;          // tags
//! sink.begin_array()?;
//! sink.put_string("a")?;
//! sink.end_array()?;
//! sink.end_struct(&fields)?;
//! ```

pub mod cursor;
pub mod field_index;

use std::any::Any;

use crate::core::{At, CodecError, Diagnostic, Result};

pub use cursor::Cursor;
pub use field_index::{
    placeholder_name, same_index, DynamicFields, FieldIndex, FieldIndexRef, IndexCache,
    KnownFields, UNKNOWN_FIELD,
};

/// Pull side of the token protocol.
pub trait Source {
    /// Tag of the token under the cursor.
    fn peek(&mut self) -> Result<At>;

    /// Consume a `Null` token.
    fn take_null(&mut self) -> Result<()>;

    /// Consume an `Int` token.
    fn take_int(&mut self) -> Result<i32>;

    /// Consume a `Long` token.
    fn take_long(&mut self) -> Result<i64>;

    /// Consume a `Double` token.
    fn take_double(&mut self) -> Result<f64>;

    /// Consume a `Boolean` token.
    fn take_boolean(&mut self) -> Result<bool>;

    /// Consume a `String` token.
    fn take_string(&mut self) -> Result<String>;

    /// Enter an array region.
    fn begin_array(&mut self) -> Result<()>;

    /// Leave an array region; `peek` must report `ArrayEnd`.
    fn end_array(&mut self) -> Result<()>;

    /// Enter a struct region, translating field names through `fields`.
    fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()>;

    /// Consume a field marker and return its index in the current field
    /// index, or [`UNKNOWN_FIELD`] when the name is not part of it.
    fn take_field(&mut self) -> Result<usize>;

    /// Leave a struct region; `fields` must be the instance passed to `begin_struct`.
    fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()>;

    /// Discard exactly one value (scalar, or a whole array/struct subtree).
    fn skip(&mut self) -> Result<()> {
        skip_value(self)
    }

    /// Human-readable cursor location, e.g. `$.items[2].name`.
    fn path(&self) -> String;

    /// Record a recoverable problem. The default implementation only logs it.
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            path = %diagnostic.path,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
    }

    /// Backend-native handle for backend-specific optimizations.
    ///
    /// Generic code must never depend on this.
    fn adapts(&mut self) -> Option<&mut dyn Any> {
        None
    }

    /// Fail with a structural violation at the current path unless `condition` holds.
    fn expect(&self, condition: bool, message: &str) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(self.unexpected(message))
        }
    }

    /// Structural violation at the current path.
    fn unexpected(&self, message: &str) -> CodecError {
        CodecError::structural(self.path(), message)
    }
}

/// Push side of the token protocol.
pub trait Sink {
    /// Emit a `Null` value.
    fn put_null(&mut self) -> Result<()>;

    /// Emit an `Int` value.
    fn put_int(&mut self, value: i32) -> Result<()>;

    /// Emit a `Long` value.
    fn put_long(&mut self, value: i64) -> Result<()>;

    /// Emit a `Double` value.
    fn put_double(&mut self, value: f64) -> Result<()>;

    /// Emit a `Boolean` value.
    fn put_boolean(&mut self, value: bool) -> Result<()>;

    /// Emit a `String` value.
    fn put_string(&mut self, value: &str) -> Result<()>;

    /// Open an array region.
    fn begin_array(&mut self) -> Result<()>;

    /// Close the innermost array region.
    fn end_array(&mut self) -> Result<()>;

    /// Open a struct region whose field markers are indices into `fields`.
    fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()>;

    /// Emit a field marker; a value must follow.
    fn put_field(&mut self, index: usize) -> Result<()>;

    /// Close the innermost struct region; `fields` must match `begin_struct`.
    fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()>;

    /// Human-readable cursor location.
    fn path(&self) -> String;

    /// Backend-native handle for backend-specific optimizations.
    fn adapts(&mut self) -> Option<&mut dyn Any> {
        None
    }

    /// Fail with a structural violation at the current path unless `condition` holds.
    fn expect(&self, condition: bool, message: &str) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(self.unexpected(message))
        }
    }

    /// Structural violation at the current path.
    fn unexpected(&self, message: &str) -> CodecError {
        CodecError::structural(self.path(), message)
    }
}

/// Discard one value from `source` using only the protocol calls.
///
/// Struct regions are entered with a throwaway [`DynamicFields`].
pub fn skip_value<S: Source + ?Sized>(source: &mut S) -> Result<()> {
    match source.peek()? {
        At::Null => source.take_null(),
        At::Int => source.take_int().map(drop),
        At::Long => source.take_long().map(drop),
        At::Double => source.take_double().map(drop),
        At::Boolean => source.take_boolean().map(drop),
        At::String => source.take_string().map(drop),
        At::ArrayStart => {
            source.begin_array()?;
            while source.peek()? != At::ArrayEnd {
                skip_value(source)?;
            }
            source.end_array()
        }
        At::StructStart => {
            let fields = DynamicFields::new_ref();
            source.begin_struct(fields.clone())?;
            loop {
                match source.peek()? {
                    At::Field => {
                        source.take_field()?;
                        skip_value(source)?;
                    }
                    At::StructEnd => break,
                    other => {
                        return Err(source.unexpected(&format!(
                            "expected a field or the end of the struct, found {other}"
                        )))
                    }
                }
            }
            source.end_struct(&fields)
        }
        other => Err(source.unexpected(&format!("cannot skip at {other}, no value here"))),
    }
}
