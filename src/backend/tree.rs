// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Source and sink over in-memory document trees.
//!
//! Any tree type that can be viewed as nulls, scalars, arrays and
//! string-keyed structs plugs in by implementing [`TreeNode`] (read) and
//! [`TreeBuild`] (write). The dynamic [`Value`](crate::core::Value) and
//! `serde_json::Value` are the two in-crate instances.

use tracing::warn;

use crate::core::{At, CodecError, Diagnostic, Result, DEFAULT_MAX_DEPTH};
use crate::protocol::{Cursor, FieldIndexRef, Sink, Source};

/// Borrowed view of one tree node.
#[derive(Debug)]
pub enum NodeView<'a, N> {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(&'a str),
    Array(&'a [N]),
    /// Entries in document order
    Struct(Vec<(&'a str, &'a N)>),
}

/// Readable document tree.
pub trait TreeNode: Sized {
    /// Backend name for logs and errors.
    const BACKEND: &'static str;

    /// Token tag of this node.
    fn at(&self) -> At;

    /// View of this node.
    fn view(&self) -> NodeView<'_, Self>;
}

/// Buildable document tree.
pub trait TreeBuild: Sized {
    fn null() -> Self;

    fn boolean(value: bool) -> Self;

    fn int(value: i32) -> Self;

    fn long(value: i64) -> Self;

    /// Fails when the tree cannot represent `value` (e.g. NaN in JSON).
    fn double(value: f64) -> Result<Self>;

    fn string(value: String) -> Self;

    fn array(items: Vec<Self>) -> Self;

    /// Repeated names keep the last value.
    fn structure(entries: Vec<(String, Self)>) -> Self;
}

// =============================================================================
// Source
// =============================================================================

enum Level<'a, N> {
    Array {
        items: &'a [N],
        next: usize,
    },
    Struct {
        entries: Vec<(&'a str, &'a N)>,
        next: usize,
        in_value: bool,
    },
}

enum Position<'a, N> {
    Node(&'a N),
    Field(&'a str),
    ArrayEnd,
    StructEnd,
    Eof,
}

/// Source walking a borrowed tree depth-first.
pub struct TreeSource<'a, N> {
    root: Option<&'a N>,
    stack: Vec<Level<'a, N>>,
    cursor: Cursor,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, N: TreeNode> TreeSource<'a, N> {
    /// Walk `root`.
    pub fn new(root: &'a N) -> Self {
        Self::with_max_depth(root, DEFAULT_MAX_DEPTH)
    }

    /// Walk `root` with a nesting limit.
    pub fn with_max_depth(root: &'a N, max_depth: usize) -> Self {
        Self {
            root: Some(root),
            stack: Vec::new(),
            cursor: Cursor::with_max_depth(max_depth),
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics reported so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain reported diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn position(&self) -> Position<'a, N> {
        match self.stack.last() {
            None => self.root.map_or(Position::Eof, Position::Node),
            Some(&Level::Array { items, next }) => match items.get(next) {
                Some(item) => Position::Node(item),
                None => Position::ArrayEnd,
            },
            Some(Level::Struct {
                entries,
                next,
                in_value,
            }) => match entries.get(*next) {
                Some(&(_, value)) if *in_value => Position::Node(value),
                Some(&(name, _)) => Position::Field(name),
                None => Position::StructEnd,
            },
        }
    }

    fn value_consumed(&mut self) {
        match self.stack.last_mut() {
            None => self.root = None,
            Some(Level::Array { next, .. }) => *next += 1,
            Some(Level::Struct { next, in_value, .. }) => {
                *in_value = false;
                *next += 1;
            }
        }
    }

    fn mismatch(&self, expected: At, found: At) -> CodecError {
        self.cursor
            .violation(format!("expected {expected}, found {found}"))
    }

    fn node(&mut self, expected: At) -> Result<&'a N> {
        match self.position() {
            Position::Node(node) if node.at() == expected => Ok(node),
            _ => {
                let found = self.peek()?;
                Err(self.mismatch(expected, found))
            }
        }
    }

    fn scalar(&mut self, expected: At) -> Result<NodeView<'a, N>> {
        let node = self.node(expected)?;
        self.cursor.scalar()?;
        self.value_consumed();
        Ok(node.view())
    }

    fn corrupt(&self, expected: At) -> CodecError {
        CodecError::backend(
            N::BACKEND,
            format!("node at {} reports {expected} but holds another value", self.cursor.path()),
        )
    }
}

impl<N: TreeNode> Source for TreeSource<'_, N> {
    fn peek(&mut self) -> Result<At> {
        Ok(match self.position() {
            Position::Node(node) => node.at(),
            Position::Field(_) => At::Field,
            Position::ArrayEnd => At::ArrayEnd,
            Position::StructEnd => At::StructEnd,
            Position::Eof => At::Eof,
        })
    }

    fn take_null(&mut self) -> Result<()> {
        match self.scalar(At::Null)? {
            NodeView::Null => Ok(()),
            _ => Err(self.corrupt(At::Null)),
        }
    }

    fn take_int(&mut self) -> Result<i32> {
        match self.scalar(At::Int)? {
            NodeView::Int(v) => Ok(v),
            _ => Err(self.corrupt(At::Int)),
        }
    }

    fn take_long(&mut self) -> Result<i64> {
        match self.scalar(At::Long)? {
            NodeView::Long(v) => Ok(v),
            _ => Err(self.corrupt(At::Long)),
        }
    }

    fn take_double(&mut self) -> Result<f64> {
        match self.scalar(At::Double)? {
            NodeView::Double(v) => Ok(v),
            _ => Err(self.corrupt(At::Double)),
        }
    }

    fn take_boolean(&mut self) -> Result<bool> {
        match self.scalar(At::Boolean)? {
            NodeView::Boolean(v) => Ok(v),
            _ => Err(self.corrupt(At::Boolean)),
        }
    }

    fn take_string(&mut self) -> Result<String> {
        match self.scalar(At::String)? {
            NodeView::String(v) => Ok(v.to_string()),
            _ => Err(self.corrupt(At::String)),
        }
    }

    fn begin_array(&mut self) -> Result<()> {
        let node = self.node(At::ArrayStart)?;
        let items = match node.view() {
            NodeView::Array(items) => items,
            _ => return Err(self.corrupt(At::ArrayStart)),
        };
        self.cursor.open_array()?;
        self.stack.push(Level::Array { items, next: 0 });
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        match self.position() {
            Position::ArrayEnd => {
                self.cursor.close_array()?;
                self.stack.pop();
                self.value_consumed();
                Ok(())
            }
            _ => {
                let found = self.peek()?;
                Err(self.mismatch(At::ArrayEnd, found))
            }
        }
    }

    fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()> {
        let node = self.node(At::StructStart)?;
        let entries = match node.view() {
            NodeView::Struct(entries) => entries,
            _ => return Err(self.corrupt(At::StructStart)),
        };
        self.cursor.open_struct(fields)?;
        self.stack.push(Level::Struct {
            entries,
            next: 0,
            in_value: false,
        });
        Ok(())
    }

    fn take_field(&mut self) -> Result<usize> {
        let name = match self.position() {
            Position::Field(name) => name,
            _ => {
                let found = self.peek()?;
                return Err(self.mismatch(At::Field, found));
            }
        };
        let index = self.cursor.field_named(name)?;
        if let Some(Level::Struct { in_value, .. }) = self.stack.last_mut() {
            *in_value = true;
        }
        Ok(index)
    }

    fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()> {
        match self.position() {
            Position::StructEnd => {
                self.cursor.close_struct(fields)?;
                self.stack.pop();
                self.value_consumed();
                Ok(())
            }
            _ => {
                let found = self.peek()?;
                Err(self.mismatch(At::StructEnd, found))
            }
        }
    }

    fn path(&self) -> String {
        self.cursor.path()
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(
            backend = N::BACKEND,
            path = %diagnostic.path,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }
}

// =============================================================================
// Sink
// =============================================================================

enum Partial<N> {
    Array(Vec<N>),
    Struct {
        entries: Vec<(String, N)>,
        pending: Option<String>,
    },
}

/// Sink building an owned tree.
pub struct TreeSink<N> {
    stack: Vec<Partial<N>>,
    done: Option<N>,
    cursor: Cursor,
}

impl<N: TreeBuild> Default for TreeSink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeBuild> TreeSink<N> {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create an empty sink with a nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            done: None,
            cursor: Cursor::with_max_depth(max_depth),
        }
    }

    /// Take the finished tree.
    ///
    /// # Errors
    ///
    /// Returns a structural violation if no complete value was written.
    pub fn finish(self) -> Result<N> {
        if !self.cursor.is_complete() {
            return Err(self
                .cursor
                .violation("sink finished before the value was complete"));
        }
        self.done
            .ok_or_else(|| CodecError::invariant_violation("complete tree sink holds no value"))
    }

    fn put_scalar(&mut self, node: N) -> Result<()> {
        self.cursor.scalar()?;
        self.attach(node)
    }

    fn attach(&mut self, node: N) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                self.done = Some(node);
                Ok(())
            }
            Some(Partial::Array(items)) => {
                items.push(node);
                Ok(())
            }
            Some(Partial::Struct { entries, pending }) => match pending.take() {
                Some(name) => {
                    entries.push((name, node));
                    Ok(())
                }
                None => Err(CodecError::invariant_violation(
                    "tree sink got a struct value without a field name",
                )),
            },
        }
    }
}

impl<N: TreeBuild> Sink for TreeSink<N> {
    fn put_null(&mut self) -> Result<()> {
        self.put_scalar(N::null())
    }

    fn put_int(&mut self, value: i32) -> Result<()> {
        self.put_scalar(N::int(value))
    }

    fn put_long(&mut self, value: i64) -> Result<()> {
        self.put_scalar(N::long(value))
    }

    fn put_double(&mut self, value: f64) -> Result<()> {
        let node = N::double(value)?;
        self.put_scalar(node)
    }

    fn put_boolean(&mut self, value: bool) -> Result<()> {
        self.put_scalar(N::boolean(value))
    }

    fn put_string(&mut self, value: &str) -> Result<()> {
        self.put_scalar(N::string(value.to_string()))
    }

    fn begin_array(&mut self) -> Result<()> {
        self.cursor.open_array()?;
        self.stack.push(Partial::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.cursor.close_array()?;
        match self.stack.pop() {
            Some(Partial::Array(items)) => self.attach(N::array(items)),
            _ => Err(CodecError::invariant_violation(
                "tree sink closed an array it did not open",
            )),
        }
    }

    fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()> {
        self.cursor.open_struct(fields)?;
        self.stack.push(Partial::Struct {
            entries: Vec::new(),
            pending: None,
        });
        Ok(())
    }

    fn put_field(&mut self, index: usize) -> Result<()> {
        let name = self.cursor.field(index)?;
        if let Some(Partial::Struct { pending, .. }) = self.stack.last_mut() {
            *pending = Some(name);
        }
        Ok(())
    }

    fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()> {
        self.cursor.close_struct(fields)?;
        match self.stack.pop() {
            Some(Partial::Struct { entries, .. }) => self.attach(N::structure(entries)),
            _ => Err(CodecError::invariant_violation(
                "tree sink closed a struct it did not open",
            )),
        }
    }

    fn path(&self) -> String {
        self.cursor.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::protocol::{DynamicFields, KnownFields};
    use crate::transcode::transcode;

    fn sample() -> Value {
        Value::structure([
            ("id", Value::Long(9)),
            (
                "tags",
                Value::array([Value::from("a"), Value::Null, Value::Boolean(true)]),
            ),
            ("inner", Value::structure([("x", Value::Double(0.5))])),
        ])
    }

    #[test]
    fn test_walk_struct_by_known_fields() {
        let value = sample();
        let mut source = TreeSource::new(&value);
        let fields = KnownFields::new_ref(["id", "tags"]).unwrap();

        assert_eq!(source.peek().unwrap(), At::StructStart);
        source.begin_struct(fields.clone()).unwrap();
        assert_eq!(source.take_field().unwrap(), 0);
        assert_eq!(source.path(), "$.id");
        assert_eq!(source.take_long().unwrap(), 9);
        assert_eq!(source.take_field().unwrap(), 1);
        source.skip().unwrap();
        assert_eq!(source.take_field().unwrap(), crate::protocol::UNKNOWN_FIELD);
        assert_eq!(source.path(), "$.inner");
        source.skip().unwrap();
        source.end_struct(&fields).unwrap();
        assert_eq!(source.peek().unwrap(), At::Eof);
    }

    #[test]
    fn test_mismatched_take() {
        let value = Value::array([Value::Int(1)]);
        let mut source = TreeSource::new(&value);
        source.begin_array().unwrap();
        let err = source.take_string().unwrap_err();
        assert_eq!(
            err.to_string(),
            "structural violation at $[0]: expected String, found Int"
        );
        assert_eq!(source.take_int().unwrap(), 1);
        source.end_array().unwrap();
    }

    #[test]
    fn test_tree_copy_preserves_order() {
        let value = sample();
        let mut source = TreeSource::new(&value);
        let mut sink = TreeSink::<Value>::new();
        transcode(&mut source, &mut sink).unwrap();
        assert_eq!(sink.finish().unwrap(), value);
    }

    #[test]
    fn test_sink_requires_complete_value() {
        let mut sink = TreeSink::<Value>::new();
        let fields = DynamicFields::new_ref();
        sink.begin_struct(fields).unwrap();
        assert!(sink.finish().is_err());
    }

    #[test]
    fn test_sink_depth_limit() {
        let mut sink = TreeSink::<Value>::with_max_depth(1);
        sink.begin_array().unwrap();
        assert!(sink.begin_array().is_err());
    }

    #[test]
    fn test_reported_diagnostics_are_kept() {
        let value = Value::Null;
        let mut source = TreeSource::new(&value);
        source.report(Diagnostic::validation("$", "odd"));
        assert_eq!(source.diagnostics().len(), 1);
        assert_eq!(source.take_diagnostics().len(), 1);
        assert!(source.diagnostics().is_empty());
    }
}
