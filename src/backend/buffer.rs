// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory token recording and replay.
//!
//! [`BufferSink`] records a token stream, storing field markers by name so
//! that the recording can be replayed through [`BufferSource`] against a
//! different field index than the one it was recorded with. Union decoding
//! relies on this to re-stream a struct once its case is known.

use std::any::Any;

use crate::core::{At, Diagnostic, Result, Token};
use crate::protocol::{Cursor, FieldIndexRef, Sink, Source};

/// A recorded, well-formed token stream holding one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
}

impl TokenBuffer {
    /// Wrap tokens that are known to form one value.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Recorded tokens.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Replay the recording.
    pub fn source(&self) -> BufferSource<'_> {
        BufferSource::new(&self.tokens)
    }

    /// Replay the recording with paths reported relative to `base`, nesting
    /// at most `max_depth` levels below it.
    pub fn source_at(&self, base: &str, max_depth: usize) -> BufferSource<'_> {
        BufferSource::with_cursor(&self.tokens, Cursor::with_base(base, max_depth))
    }

    /// Consume the buffer, returning its tokens.
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

// =============================================================================
// Recording sink
// =============================================================================

/// Sink that records tokens in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    tokens: Vec<Token>,
    cursor: Cursor,
}

impl BufferSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder with a nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            tokens: Vec::new(),
            cursor: Cursor::with_max_depth(max_depth),
        }
    }

    /// Tokens recorded so far.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Finish recording.
    ///
    /// # Errors
    ///
    /// Returns a structural violation if no complete value was recorded.
    pub fn finish(self) -> Result<TokenBuffer> {
        if !self.cursor.is_complete() {
            return Err(self.cursor.violation("recording ended before the value was complete"));
        }
        Ok(TokenBuffer {
            tokens: self.tokens,
        })
    }

    fn push_scalar(&mut self, token: Token) -> Result<()> {
        self.cursor.scalar()?;
        self.tokens.push(token);
        Ok(())
    }
}

impl Sink for BufferSink {
    fn put_null(&mut self) -> Result<()> {
        self.push_scalar(Token::Null)
    }

    fn put_int(&mut self, value: i32) -> Result<()> {
        self.push_scalar(Token::Int(value))
    }

    fn put_long(&mut self, value: i64) -> Result<()> {
        self.push_scalar(Token::Long(value))
    }

    fn put_double(&mut self, value: f64) -> Result<()> {
        self.push_scalar(Token::Double(value))
    }

    fn put_boolean(&mut self, value: bool) -> Result<()> {
        self.push_scalar(Token::Boolean(value))
    }

    fn put_string(&mut self, value: &str) -> Result<()> {
        self.push_scalar(Token::String(value.to_string()))
    }

    fn begin_array(&mut self) -> Result<()> {
        self.cursor.open_array()?;
        self.tokens.push(Token::ArrayStart);
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.cursor.close_array()?;
        self.tokens.push(Token::ArrayEnd);
        Ok(())
    }

    fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()> {
        self.cursor.open_struct(fields)?;
        self.tokens.push(Token::StructStart);
        Ok(())
    }

    fn put_field(&mut self, index: usize) -> Result<()> {
        let name = self.cursor.field(index)?;
        self.tokens.push(Token::Field(name));
        Ok(())
    }

    fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()> {
        self.cursor.close_struct(fields)?;
        self.tokens.push(Token::StructEnd);
        Ok(())
    }

    fn path(&self) -> String {
        self.cursor.path()
    }

    fn adapts(&mut self) -> Option<&mut dyn Any> {
        Some(&mut self.tokens)
    }
}

// =============================================================================
// Replaying source
// =============================================================================

/// Source that replays recorded tokens.
#[derive(Debug)]
pub struct BufferSource<'a> {
    tokens: &'a [Token],
    position: usize,
    cursor: Cursor,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> BufferSource<'a> {
    /// Replay `tokens` from the start.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self::with_cursor(tokens, Cursor::new())
    }

    fn with_cursor(tokens: &'a [Token], cursor: Cursor) -> Self {
        Self {
            tokens,
            position: 0,
            cursor,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics reported during the replay.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain reported diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Whether every token was consumed.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn take(&mut self, at: At) -> Result<&'a Token> {
        let found = self.current().map_or(At::Eof, Token::at);
        if found != at {
            return Err(self
                .cursor
                .violation(format!("expected {at}, found {found}")));
        }
        let token = &self.tokens[self.position];
        self.position += 1;
        Ok(token)
    }

    fn take_scalar(&mut self, at: At) -> Result<&'a Token> {
        let found = self.current().map_or(At::Eof, Token::at);
        if found != at {
            return Err(self
                .cursor
                .violation(format!("expected {at}, found {found}")));
        }
        self.cursor.scalar()?;
        self.take(at)
    }
}

impl Source for BufferSource<'_> {
    fn peek(&mut self) -> Result<At> {
        Ok(self.current().map_or(At::Eof, Token::at))
    }

    fn take_null(&mut self) -> Result<()> {
        self.take_scalar(At::Null).map(drop)
    }

    fn take_int(&mut self) -> Result<i32> {
        match self.take_scalar(At::Int)? {
            Token::Int(v) => Ok(*v),
            other => Err(self.cursor.violation(format!("corrupt token {other}"))),
        }
    }

    fn take_long(&mut self) -> Result<i64> {
        match self.take_scalar(At::Long)? {
            Token::Long(v) => Ok(*v),
            other => Err(self.cursor.violation(format!("corrupt token {other}"))),
        }
    }

    fn take_double(&mut self) -> Result<f64> {
        match self.take_scalar(At::Double)? {
            Token::Double(v) => Ok(*v),
            other => Err(self.cursor.violation(format!("corrupt token {other}"))),
        }
    }

    fn take_boolean(&mut self) -> Result<bool> {
        match self.take_scalar(At::Boolean)? {
            Token::Boolean(v) => Ok(*v),
            other => Err(self.cursor.violation(format!("corrupt token {other}"))),
        }
    }

    fn take_string(&mut self) -> Result<String> {
        match self.take_scalar(At::String)? {
            Token::String(v) => Ok(v.clone()),
            other => Err(self.cursor.violation(format!("corrupt token {other}"))),
        }
    }

    fn begin_array(&mut self) -> Result<()> {
        if self.peek()? != At::ArrayStart {
            self.take(At::ArrayStart)?;
        }
        self.cursor.open_array()?;
        self.position += 1;
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.take(At::ArrayEnd)?;
        self.cursor.close_array()
    }

    fn begin_struct(&mut self, fields: FieldIndexRef) -> Result<()> {
        if self.peek()? != At::StructStart {
            self.take(At::StructStart)?;
        }
        self.cursor.open_struct(fields)?;
        self.position += 1;
        Ok(())
    }

    fn take_field(&mut self) -> Result<usize> {
        match self.take(At::Field)? {
            Token::Field(name) => self.cursor.field_named(name),
            other => Err(self.cursor.violation(format!("corrupt token {other}"))),
        }
    }

    fn end_struct(&mut self, fields: &FieldIndexRef) -> Result<()> {
        if self.peek()? != At::StructEnd {
            self.take(At::StructEnd)?;
        }
        self.cursor.close_struct(fields)?;
        self.position += 1;
        Ok(())
    }

    fn path(&self) -> String {
        self.cursor.path()
    }

    // Replays are nested inside another traversal that logs what it forwards.
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
