// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Grammar and path tracking shared by the in-crate backends.
//!
//! A [`Cursor`] enforces the token grammar
//! (`scalar | Array(value*) | Struct((Field value)*)`) for one traversal and
//! renders the current location as a path such as `$.items[2].name`.
//!
//! The cursor owns the traversal's field-index stack: `open_struct` pushes
//! the index handed to `begin_struct`, `close_struct` checks that the same
//! instance is handed back and pops it.

use std::fmt::Write as _;

use crate::core::{CodecError, Result, DEFAULT_MAX_DEPTH};

use super::field_index::{same_index, FieldIndex, FieldIndexRef, UNKNOWN_FIELD};

/// Root path segment.
pub const ROOT_PATH: &str = "$";

#[derive(Debug)]
enum Frame {
    Array {
        index: usize,
    },
    Struct {
        fields: FieldIndexRef,
        name: Option<String>,
        awaiting_value: bool,
    },
}

/// Names of a known field index in index order, compiled once per index
/// and kept in its cache slot.
#[derive(Debug)]
struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    fn compile(fields: &dyn FieldIndex) -> Self {
        Self {
            names: (0..fields.count()).map(|i| fields.index_to_name(i)).collect(),
        }
    }
}

/// Grammar checker and path tracker for one traversal.
#[derive(Debug)]
pub struct Cursor {
    base: String,
    frames: Vec<Frame>,
    max_depth: usize,
    complete: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

impl Cursor {
    /// Create a cursor rooted at `$`.
    pub fn new() -> Self {
        Self::with_base(ROOT_PATH, DEFAULT_MAX_DEPTH)
    }

    /// Create a cursor rooted at `$` with a nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::with_base(ROOT_PATH, max_depth)
    }

    /// Create a cursor whose paths are reported relative to `base`.
    ///
    /// Used when a buffered sub-document is replayed so that diagnostics
    /// still point into the enclosing document.
    pub fn with_base(base: impl Into<String>, max_depth: usize) -> Self {
        Self {
            base: base.into(),
            frames: Vec::new(),
            max_depth: max_depth.max(1),
            complete: false,
        }
    }

    /// Human-readable location of the cursor.
    pub fn path(&self) -> String {
        let mut path = self.base.clone();
        for frame in &self.frames {
            match frame {
                Frame::Array { index } => {
                    let _ = write!(path, "[{index}]");
                }
                Frame::Struct {
                    name: Some(name), ..
                } => {
                    path.push('.');
                    path.push_str(name);
                }
                Frame::Struct { name: None, .. } => {}
            }
        }
        path
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether one complete top-level value has been traversed.
    pub fn is_complete(&self) -> bool {
        self.complete && self.frames.is_empty()
    }

    /// Field index of the innermost open struct.
    pub fn current_fields(&self) -> Option<&FieldIndexRef> {
        match self.frames.last() {
            Some(Frame::Struct { fields, .. }) => Some(fields),
            _ => None,
        }
    }

    /// Structural violation at the current path.
    pub fn violation(&self, message: impl Into<String>) -> CodecError {
        CodecError::structural(self.path(), message)
    }

    /// Record a scalar value (including null).
    pub fn scalar(&mut self) -> Result<()> {
        self.check_value_position()?;
        self.value_done();
        Ok(())
    }

    /// Record the start of an array.
    pub fn open_array(&mut self) -> Result<()> {
        self.check_value_position()?;
        self.check_depth()?;
        self.frames.push(Frame::Array { index: 0 });
        Ok(())
    }

    /// Record the end of an array.
    pub fn close_array(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Array { .. }) => {
                self.frames.pop();
                self.value_done();
                Ok(())
            }
            _ => Err(self.violation("end of array without a matching array start")),
        }
    }

    /// Record the start of a struct, pushing its field index.
    pub fn open_struct(&mut self, fields: FieldIndexRef) -> Result<()> {
        self.check_value_position()?;
        self.check_depth()?;
        self.frames.push(Frame::Struct {
            fields,
            name: None,
            awaiting_value: false,
        });
        Ok(())
    }

    /// Record the end of a struct; `fields` must be the instance it was opened with.
    pub fn close_struct(&mut self, fields: &FieldIndexRef) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Struct {
                awaiting_value: true,
                ..
            }) => Err(self.violation("end of struct while a field value is pending")),
            Some(Frame::Struct { fields: open, .. }) if !same_index(open, fields) => {
                Err(self.violation("end of struct with a different field index than its start"))
            }
            Some(Frame::Struct { .. }) => {
                self.frames.pop();
                self.value_done();
                Ok(())
            }
            _ => Err(self.violation("end of struct without a matching struct start")),
        }
    }

    /// Record a field marker by index (sink side). Returns the field name.
    pub fn field(&mut self, index: usize) -> Result<String> {
        let fields = self.open_fields()?;
        if !fields.contains_index(index) {
            return Err(self.violation(format!(
                "field index #{index} is not part of the current field index"
            )));
        }
        let name = if fields.is_dynamic() {
            fields.index_to_name(index)
        } else {
            let table = fields
                .cache()
                .get_or_insert_with(|| NameTable::compile(fields.as_ref()));
            match table.names.get(index) {
                Some(name) => name.clone(),
                None => fields.index_to_name(index),
            }
        };
        self.mark_field(name.clone());
        Ok(name)
    }

    /// Record a field marker by name (source side). Returns the field index,
    /// or [`UNKNOWN_FIELD`] when the current field index does not know the name.
    pub fn field_named(&mut self, name: &str) -> Result<usize> {
        let fields = self.open_fields()?;
        let index = fields.name_to_index(name).unwrap_or(UNKNOWN_FIELD);
        self.mark_field(name.to_string());
        Ok(index)
    }

    fn open_fields(&self) -> Result<FieldIndexRef> {
        match self.frames.last() {
            Some(Frame::Struct {
                awaiting_value: true,
                ..
            }) => Err(self.violation("field marker while the previous field has no value")),
            Some(Frame::Struct { fields, .. }) => Ok(fields.clone()),
            _ => Err(self.violation("field marker outside of a struct")),
        }
    }

    fn mark_field(&mut self, field: String) {
        if let Some(Frame::Struct {
            name,
            awaiting_value,
            ..
        }) = self.frames.last_mut()
        {
            *name = Some(field);
            *awaiting_value = true;
        }
    }

    fn check_value_position(&self) -> Result<()> {
        match self.frames.last() {
            None if self.complete => Err(self.violation("a top-level value was already traversed")),
            None | Some(Frame::Array { .. }) => Ok(()),
            Some(Frame::Struct {
                awaiting_value: true,
                ..
            }) => Ok(()),
            Some(Frame::Struct { .. }) => {
                Err(self.violation("a field marker must precede each value inside a struct"))
            }
        }
    }

    fn check_depth(&self) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            return Err(self.violation(format!(
                "maximum nesting depth {} exceeded",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn value_done(&mut self) {
        match self.frames.last_mut() {
            None => self.complete = true,
            Some(Frame::Array { index }) => *index += 1,
            Some(Frame::Struct {
                name,
                awaiting_value,
                ..
            }) => {
                *name = None;
                *awaiting_value = false;
            }
        }
    }
}
